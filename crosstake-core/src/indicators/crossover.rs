//! Moving-average crossover signal over three SMAs.
//!
//! The signal compares the fast average against the mid average. The
//! fast/mid difference is tracked from the first bar where both are valid.
//! The slow average only gates emission: nothing is emitted before its window
//! is full, so with 7/14/38 the first bar that can carry a cross is bar 38,
//! compared against the difference carried from bar 37.
//!
//! A flat stretch (`fast == mid`) does not reset the comparison: the last
//! non-zero difference is carried forward, so touching and then moving away
//! in the same direction is not a cross.

use super::sma::SmaWindow;
use serde::{Deserialize, Serialize};

/// Ternary crossover value for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// Fast crossed from above to below the mid average.
    Down,
    /// Fast crossed from below to above the mid average.
    Up,
    None,
}

impl Signal {
    /// -1 / +1 / 0, matching the conventional crossover indicator output.
    pub fn value(&self) -> i8 {
        match self {
            Signal::Down => -1,
            Signal::Up => 1,
            Signal::None => 0,
        }
    }
}

/// Pure crossover step.
///
/// `prev_nonzero_diff` is the last non-zero `fast - mid` difference seen
/// before this bar.
pub fn crossover(prev_nonzero_diff: f64, fast: f64, mid: f64) -> Signal {
    if prev_nonzero_diff > 0.0 && fast < mid {
        Signal::Down
    } else if prev_nonzero_diff < 0.0 && fast > mid {
        Signal::Up
    } else {
        Signal::None
    }
}

/// Window lengths for the three averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossoverWindows {
    pub fast: usize,
    pub mid: usize,
    pub slow: usize,
}

impl Default for CrossoverWindows {
    fn default() -> Self {
        Self {
            fast: 7,
            mid: 14,
            slow: 38,
        }
    }
}

impl CrossoverWindows {
    pub fn validate(&self) -> Result<(), String> {
        if self.fast == 0 {
            return Err("fast window must be >= 1".into());
        }
        if !(self.fast < self.mid && self.mid <= self.slow) {
            return Err(format!(
                "windows must satisfy fast < mid <= slow (got {}/{}/{})",
                self.fast, self.mid, self.slow
            ));
        }
        Ok(())
    }

    /// Bars consumed before the first bar that can carry a signal. A cross
    /// needs a previous fast/mid difference, so `slow == mid` costs one more.
    pub fn warmup_bars(&self) -> usize {
        self.slow.max(self.mid + 1) - 1
    }
}

/// Averages seen on the most recent bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Averages {
    pub fast: f64,
    pub mid: f64,
    pub slow: f64,
}

/// Streams closes through the three averages and emits a crossover signal
/// per bar.
#[derive(Debug, Clone)]
pub struct CrossoverTracker {
    fast: SmaWindow,
    mid: SmaWindow,
    slow: SmaWindow,
    last_nonzero_diff: Option<f64>,
    averages: Option<Averages>,
}

impl CrossoverTracker {
    pub fn new(windows: CrossoverWindows) -> Self {
        Self {
            fast: SmaWindow::new(windows.fast),
            mid: SmaWindow::new(windows.mid),
            slow: SmaWindow::new(windows.slow),
            last_nonzero_diff: None,
            averages: None,
        }
    }

    /// Feed the next close and return this bar's signal.
    pub fn update(&mut self, close: f64) -> Signal {
        let fast = self.fast.push(close);
        let mid = self.mid.push(close);
        let slow = self.slow.push(close);

        let (Some(fast), Some(mid)) = (fast, mid) else {
            return Signal::None;
        };

        let prev = self.last_nonzero_diff;
        let diff = fast - mid;
        // The first valid difference seeds the carry even when it is zero.
        if diff != 0.0 || prev.is_none() {
            self.last_nonzero_diff = Some(diff);
        }

        let Some(slow) = slow else {
            return Signal::None;
        };
        self.averages = Some(Averages { fast, mid, slow });

        match prev {
            Some(prev) => crossover(prev, fast, mid),
            None => Signal::None,
        }
    }

    /// Averages as of the last update, `None` until the slow window is full.
    pub fn averages(&self) -> Option<Averages> {
        self.averages
    }
}
