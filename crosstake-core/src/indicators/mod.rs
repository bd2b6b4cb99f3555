//! Indicators feeding the crossover rule.
//!
//! Both are streaming: closes are pushed one bar at a time in date order, so
//! the engine never looks ahead.

pub mod crossover;
pub mod sma;

pub use crossover::{crossover, Averages, CrossoverTracker, CrossoverWindows, Signal};
pub use sma::SmaWindow;

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
