use std::sync::Arc;

use serde::Serialize;
use throttler::strategy::StepStrategy;
use throttler::{
    Controller, PidConfig, PidMetrics, Strategy, StrategyKind, ThrottleMetrics, ThrottleParams,
    create_controller, create_strategy,
};

use crate::{Config, Error};

/// What the administrative API reports about the running controller.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ControllerInfo {
    pub controller_type: StrategyKind,
    pub lower_threshold: u64,
    pub upper_threshold: u64,
    pub current_load: u64,
    pub intensity: f64,
    pub max_item_size: u64,
    pub max_batch_size: u64,
}

struct Metrics {
    throttle: Arc<dyn ThrottleMetrics>,
    pid: Arc<dyn PidMetrics>,
}

/// Handle to the throttle controller of a running service.
///
/// Construct it when the service starts and drop it when the service stops.
/// The poller drives it through `update` or a clone of `controller()`, while
/// the administrative API calls `info`, `set_controller_type` and `reset`
/// concurrently.
pub struct Throttler {
    config: Config,
    controller: Arc<Controller>,
    metrics: Option<Metrics>,
}

impl Throttler {
    /// Builds the configured controller. When throttling is disabled by a zero
    /// `lower_threshold` the configured strategy is not built at all, the
    /// controller runs a step strategy that never fires instead.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let controller = if config.enabled() {
            create_controller(
                Some(config.controller_type),
                &config.settings(),
                Some(&config.pid),
            )?
        } else {
            warn!(
                message = "Throttling is DISABLED due to 0 lower_threshold, this should not be disabled in production",
                controller_type = %config.controller_type,
            );

            Controller::new(Strategy::from(StepStrategy::new(u64::MAX)), config.limits())
        };

        info!(
            message = "Throttle controller created",
            controller_type = %controller.kind(),
            lower_threshold = config.lower_threshold,
            upper_threshold = config.upper_threshold,
        );

        Ok(Throttler {
            config,
            controller: Arc::new(controller),
            metrics: None,
        })
    }

    /// Reports the throttle state to `metrics` from now on, including the
    /// internals of PID strategies.
    pub fn with_metrics<M>(mut self, metrics: Arc<M>) -> Self
    where
        M: ThrottleMetrics + PidMetrics + 'static,
    {
        let throttle: Arc<dyn ThrottleMetrics> = Arc::clone(&metrics) as _;
        let pid: Arc<dyn PidMetrics> = metrics;
        self.metrics = Some(Metrics { throttle, pid });

        self.attach_metrics(&self.controller.strategy());

        let (kind, params) = self.controller.load();
        if let Some(metrics) = &self.metrics {
            metrics.throttle.record_controller_type(kind);
        }
        self.record(kind, &params);

        self
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The shared controller, for pollers that outlive a borrow of the handle.
    pub fn controller(&self) -> Arc<Controller> {
        Arc::clone(&self.controller)
    }

    pub fn update(&self, pending_bytes: u64) -> ThrottleParams {
        let was_throttling = self.controller.load().1.is_throttling();
        let params = self.controller.update(pending_bytes);
        self.record(self.controller.kind(), &params);

        match (was_throttling, params.is_throttling()) {
            (false, true) => warn!(
                message = "Pending bytes above threshold, throttling started",
                pending_bytes,
                intensity = params.intensity,
                max_item_size = params.max_item_size,
                max_batch_size = params.max_batch_size,
            ),
            (true, false) => info!(
                message = "Pending bytes back under threshold, throttling stopped",
                pending_bytes,
            ),
            _ => {}
        }

        params
    }

    pub fn load(&self) -> (StrategyKind, ThrottleParams) {
        self.controller.load()
    }

    /// Reports the current controller, `current_load` is the backlog as
    /// measured by the caller.
    pub fn info(&self, current_load: u64) -> ControllerInfo {
        let (controller_type, params) = self.controller.load();

        ControllerInfo {
            controller_type,
            lower_threshold: self.config.lower_threshold,
            upper_threshold: self.config.upper_threshold,
            current_load,
            intensity: params.intensity,
            max_item_size: params.max_item_size,
            max_batch_size: params.max_batch_size,
        }
    }

    /// Switches to another strategy at runtime. `None` falls back to the step
    /// strategy, and the configured PID tuning is used when `pid` is not
    /// provided.
    ///
    /// The new strategy is fully validated before it replaces the current
    /// one, a rejected request leaves the controller untouched.
    pub fn set_controller_type(
        &self,
        kind: Option<StrategyKind>,
        pid: Option<PidConfig>,
    ) -> Result<(), Error> {
        let kind = kind.unwrap_or_else(|| {
            info!(message = "No controller type provided, falling back to step controller");
            StrategyKind::Step
        });
        let pid = pid.unwrap_or(self.config.pid);
        let from = self.controller.kind();

        info!(message = "Changing throttle controller", %from, to = %kind);

        let strategy = create_strategy(Some(kind), &self.config.settings(), Some(&pid))
            .inspect_err(|err| {
                error!(message = "Failed to create new throttle controller", %err, %kind);
            })?;
        let strategy = Arc::new(strategy);
        self.attach_metrics(&strategy);

        let params = self.config.limits().inactive_params();
        self.controller.set_strategy(strategy, params);

        if let Some(metrics) = &self.metrics {
            metrics.throttle.record_controller_type(kind);
        }
        self.record(kind, &params);

        info!(message = "Throttle controller changed", %from, to = %kind);

        Ok(())
    }

    pub fn reset(&self) {
        let kind = self.controller.kind();
        info!(
            message = "Resetting throttle controller state",
            controller_type = %kind
        );

        self.controller.reset();
        self.record(kind, &self.config.limits().inactive_params());
    }

    fn attach_metrics(&self, strategy: &Strategy) {
        if let (Some(pid), Some(metrics)) = (strategy.as_pid(), self.metrics.as_ref()) {
            pid.set_metrics(Arc::clone(&metrics.pid));
            debug!(message = "PID metrics attached");
        }
    }

    fn record(&self, kind: StrategyKind, params: &ThrottleParams) {
        if let Some(metrics) = &self.metrics {
            metrics.throttle.record_intensity(params.intensity, kind);
            metrics
                .throttle
                .record_params(params.max_item_size, params.max_batch_size);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use throttler::{Error as ThrottleError, ThrottleConfig};

    use super::*;

    fn config(controller_type: StrategyKind) -> Config {
        Config {
            controller_type,
            lower_threshold: 1_000_000,
            upper_threshold: 2_000_000,
            item_size_lower_limit: 5_000,
            item_size_upper_limit: 10_000,
            batch_size_lower_limit: 21_000,
            batch_size_upper_limit: 130_000,
            pid: PidConfig {
                sample_time: Duration::from_millis(10),
                ..Default::default()
            },
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = Config {
            upper_threshold: 0,
            ..config(StrategyKind::Linear)
        };

        assert!(Throttler::new(config).is_err());
    }

    #[test]
    fn info() {
        let throttler = Throttler::new(config(StrategyKind::Linear)).unwrap();
        throttler.update(1_500_000);

        assert_eq!(
            throttler.info(1_500_000),
            ControllerInfo {
                controller_type: StrategyKind::Linear,
                lower_threshold: 1_000_000,
                upper_threshold: 2_000_000,
                current_load: 1_500_000,
                intensity: 0.5,
                max_item_size: 7_500,
                max_batch_size: 75_500,
            }
        );
    }

    #[test]
    fn set_controller_type() {
        let throttler = Throttler::new(config(StrategyKind::Quadratic)).unwrap();
        let controller = throttler.controller();
        throttler.update(3_000_000);
        assert!(controller.load().1.is_throttling());

        throttler
            .set_controller_type(Some(StrategyKind::Step), None)
            .unwrap();

        // the poller's handle observes the swap
        assert_eq!(
            controller.load(),
            (
                StrategyKind::Step,
                ThrottleParams {
                    max_item_size: 0,
                    max_batch_size: 130_000,
                    intensity: 0.0,
                }
            )
        );

        assert_eq!(
            throttler.update(1_000_001),
            ThrottleParams {
                max_item_size: 5_000,
                max_batch_size: 21_000,
                intensity: 1.0,
            }
        );
    }

    #[test]
    fn set_controller_type_defaults_to_step() {
        let throttler = Throttler::new(config(StrategyKind::Linear)).unwrap();

        throttler.set_controller_type(None, None).unwrap();
        assert_eq!(throttler.load().0, StrategyKind::Step);
    }

    #[test]
    fn rejected_change_leaves_controller_untouched() {
        let throttler = Throttler::new(config(StrategyKind::Linear)).unwrap();
        let before = throttler.update(1_250_000);
        let strategy = throttler.controller().strategy();

        let invalid = PidConfig {
            output_max: 0.0,
            ..Default::default()
        };
        assert!(
            throttler
                .set_controller_type(Some(StrategyKind::Pid), Some(invalid))
                .is_err()
        );

        assert_eq!(throttler.load(), (StrategyKind::Linear, before));
        assert!(Arc::ptr_eq(&strategy, &throttler.controller().strategy()));
    }

    #[test]
    fn step_allows_unordered_item_limits() {
        let config = Config {
            item_size_lower_limit: 20_000,
            item_size_upper_limit: 150,
            ..config(StrategyKind::Step)
        };
        let throttler = Throttler::new(config).unwrap();

        // switching to a gradual strategy must validate the item limits
        let err = throttler
            .set_controller_type(Some(StrategyKind::Quadratic), None)
            .unwrap_err();
        assert!(
            matches!(
                err,
                Error::Throttle(ThrottleError::InvalidItemSizeLimits { .. })
            ),
            "{err}"
        );
        assert_eq!(throttler.load().0, StrategyKind::Step);
    }

    #[test]
    fn reset() {
        let throttler = Throttler::new(config(StrategyKind::Quadratic)).unwrap();
        throttler.update(5_000_000);

        throttler.reset();

        let limits: ThrottleConfig = throttler.config().limits();
        assert_eq!(
            throttler.load(),
            (StrategyKind::Quadratic, limits.inactive_params())
        );
    }

    #[test]
    fn disabled_builds_for_every_kind() {
        for kind in StrategyKind::ALL {
            let config = Config {
                lower_threshold: 0,
                upper_threshold: 0,
                ..config(kind)
            };
            assert!(!config.enabled());

            let throttler = Throttler::new(config).unwrap();
            let inactive = throttler.config().limits().inactive_params();

            // nothing is ever throttled, whatever the backlog
            assert_eq!(throttler.update(u64::MAX), inactive);
            assert_eq!(throttler.load(), (StrategyKind::Step, inactive));
        }
    }
}
