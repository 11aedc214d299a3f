use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;

use crate::params::{ThrottleConfig, ThrottleParams};
use crate::strategy::{Strategy, StrategyKind};

/// The published result of an update, the kind is stored together with the
/// params so readers can never see one without the other.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub kind: StrategyKind,
    pub params: ThrottleParams,
}

/// Owns a strategy and converts its intensity into concrete size limits.
///
/// Writers (`update`, `reset` and `set_strategy`) are serialized, while `load`
/// only waits for the snapshot write itself.
#[derive(Debug)]
pub struct Controller {
    config: ThrottleConfig,
    strategy: Mutex<Arc<Strategy>>,
    current: RwLock<Snapshot>,
}

impl Controller {
    pub fn new(strategy: impl Into<Arc<Strategy>>, config: ThrottleConfig) -> Self {
        let strategy = strategy.into();
        let current = Snapshot {
            kind: strategy.kind(),
            params: config.inactive_params(),
        };

        Self {
            config,
            strategy: Mutex::new(strategy),
            current: RwLock::new(current),
        }
    }

    #[inline]
    pub const fn config(&self) -> &ThrottleConfig {
        &self.config
    }

    /// Feeds the current backlog to the strategy, publishes and returns the
    /// resulting limits.
    pub fn update(&self, pending_bytes: u64) -> ThrottleParams {
        let strategy = self.strategy.lock();

        let kind = strategy.kind();
        let intensity = strategy.update(pending_bytes);
        let params = intensity_to_params(kind, intensity, &self.config);

        *self.current.write() = Snapshot { kind, params };

        trace!(
            message = "Throttle params updated",
            %kind,
            pending_bytes,
            intensity = params.intensity,
            max_item_size = params.max_item_size,
            max_batch_size = params.max_batch_size,
        );

        params
    }

    /// Returns the kind of the current strategy and the last published params.
    pub fn load(&self) -> (StrategyKind, ThrottleParams) {
        let snapshot = *self.current.read();
        (snapshot.kind, snapshot.params)
    }

    pub fn snapshot(&self) -> Snapshot {
        *self.current.read()
    }

    /// Clears the strategy memory and goes back to the inactive limits.
    pub fn reset(&self) {
        let strategy = self.strategy.lock();
        strategy.reset();

        *self.current.write() = Snapshot {
            kind: strategy.kind(),
            params: self.config.inactive_params(),
        };
    }

    /// Replaces the strategy and publishes `reset_params` in the same step.
    ///
    /// The previous strategy is left untouched, callers holding it can still
    /// inspect it.
    pub fn set_strategy(&self, strategy: impl Into<Arc<Strategy>>, reset_params: ThrottleParams) {
        let strategy = strategy.into();
        let mut current = self.strategy.lock();

        let from = current.kind();
        let kind = strategy.kind();
        *current = strategy;
        *self.current.write() = Snapshot {
            kind,
            params: reset_params,
        };

        debug!(message = "Throttle strategy replaced", %from, to = %kind);
    }

    pub fn kind(&self) -> StrategyKind {
        self.current.read().kind
    }

    /// The strategy currently in charge.
    pub fn strategy(&self) -> Arc<Strategy> {
        self.strategy.lock().clone()
    }
}

/// Interpolates intensity into limits. Both dimensions use the size domain, no
/// matter how the strategy shaped the intensity, except for the step strategy
/// which jumps straight to the lower limits.
fn intensity_to_params(
    kind: StrategyKind,
    mut intensity: f64,
    config: &ThrottleConfig,
) -> ThrottleParams {
    if intensity > 1.0 {
        warn!(
            message = "Intensity above maximum, it will be clamped",
            intensity,
            %kind,
        );
        intensity = 1.0;
    }

    if intensity < 0.0 || intensity.is_nan() {
        warn!(
            message = "Intensity below minimum, it will be clamped",
            intensity,
            %kind,
        );
        intensity = 0.0;
    }

    ThrottleParams {
        max_item_size: interpolate(
            kind,
            intensity,
            config.item_size_lower_limit,
            config.item_size_upper_limit,
            // items are not limited at all while throttling is inactive
            0,
        ),
        max_batch_size: interpolate(
            kind,
            intensity,
            config.batch_size_lower_limit,
            config.batch_size_upper_limit,
            config.batch_size_upper_limit,
        ),
        intensity,
    }
}

fn interpolate(kind: StrategyKind, intensity: f64, lower: u64, upper: u64, inactive: u64) -> u64 {
    if lower == 0 {
        return 0;
    }

    if intensity == 0.0 {
        return inactive;
    }

    match kind {
        StrategyKind::Step => lower,
        _ => (upper as f64 - intensity * upper.saturating_sub(lower) as f64) as u64,
    }
}
