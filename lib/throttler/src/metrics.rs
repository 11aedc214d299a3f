use std::time::Duration;

use crate::strategy::StrategyKind;

/// Receives the internal state of the PID strategy after every recomputation.
///
/// Attach one with `PidStrategy::set_metrics`; without it the strategy reports
/// nothing.
pub trait PidMetrics: Send + Sync {
    /// `error` is the de-normalized error, i.e. the number of bytes above the
    /// threshold.
    fn record_controller_state(&self, error: f64, integral: f64, derivative: f64);

    /// Time spent computing the new intensity.
    fn record_response_time(&self, elapsed: Duration);
}

/// Receives the throttle state published by the host service.
pub trait ThrottleMetrics: Send + Sync {
    fn record_intensity(&self, intensity: f64, kind: StrategyKind);

    /// `0` means unlimited for either dimension.
    fn record_params(&self, max_item_size: u64, max_batch_size: u64);

    fn record_controller_type(&self, kind: StrategyKind);
}
