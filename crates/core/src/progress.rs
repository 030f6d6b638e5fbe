//! Progress notifications emitted by long-running stages.

use serde::{Deserialize, Serialize};

/// A human-readable progress update with a completion percentage in `0..=100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub message: String,
    pub percent: f64,
}

impl Progress {
    /// Create a progress update. The percentage is clamped to `0..=100`.
    pub fn new(message: impl Into<String>, percent: f64) -> Self {
        let percent = if percent.is_nan() { 0.0 } else { percent.clamp(0.0, 100.0) };
        Self {
            message: message.into(),
            percent,
        }
    }

    /// Progress for `done` out of `total` items.
    pub fn fraction(message: impl Into<String>, done: usize, total: usize) -> Self {
        let percent = if total == 0 {
            100.0
        } else {
            done as f64 / total as f64 * 100.0
        };
        Self::new(message, percent)
    }
}
