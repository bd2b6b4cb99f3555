//! Simple Moving Average (SMA), streamed one close at a time.
//!
//! The value is valid once `period` closes have been pushed; the first valid
//! value is therefore produced by the `period`-th push.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SmaWindow {
    period: usize,
    window: VecDeque<f64>,
}

impl SmaWindow {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            window: VecDeque::with_capacity(period),
        }
    }

    /// Push the next close and return the average if the window is full.
    pub fn push(&mut self, close: f64) -> Option<f64> {
        if self.window.len() == self.period {
            self.window.pop_front();
        }
        self.window.push_back(close);
        self.value()
    }

    /// Current average, `None` during warm-up.
    ///
    /// Summed from the window on every call so long runs do not accumulate
    /// rolling-sum drift.
    pub fn value(&self) -> Option<f64> {
        if self.window.len() < self.period {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / self.period as f64)
    }
}
