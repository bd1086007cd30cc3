//! Lumen error types

use crate::viewport::RegionId;
use thiserror::Error;

/// Precondition failures reported when a component is set up
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LumenError {
    /// Visibility target is not registered with the source
    #[error("Target region not found: {0:?}")]
    TargetNotFound(RegionId),

    /// Tween duration or tick interval is zero
    #[error("Invalid duration: {duration_ms}ms with a tick interval of {tick_interval_ms}ms")]
    InvalidDuration {
        duration_ms: u32,
        tick_interval_ms: u32,
    },

    /// Rate limiter window is zero
    #[error("Invalid rate limit window: must be greater than zero")]
    InvalidWindow,

    /// Ratio or probability outside [0, 1]
    #[error("Invalid threshold {0}: must be within [0, 1]")]
    InvalidThreshold(f32),

    /// The scheduler behind a handle has been dropped
    #[error("Scheduler has been dropped")]
    SchedulerGone,
}

/// Result type for lumen operations
pub type Result<T> = std::result::Result<T, LumenError>;

/// Reject ratios, thresholds and probabilities outside `[0, 1]`, including NaN
pub fn check_unit_interval(value: f32) -> Result<f32> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(LumenError::InvalidThreshold(value))
    }
}
