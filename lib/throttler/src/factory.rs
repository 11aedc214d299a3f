use crate::Error;
use crate::controller::Controller;
use crate::params::ThrottleConfig;
use crate::strategy::{
    LinearStrategy, PidConfig, PidStrategy, QuadraticStrategy, StepStrategy, Strategy,
    StrategyKind,
};

/// Everything needed to build a controller, besides the PID tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ThrottleSettings {
    /// Backlog above which throttling starts.
    pub lower_threshold: u64,
    /// Backlog at which gradual strategies reach the maximum intensity.
    pub upper_threshold: u64,
    pub limits: ThrottleConfig,
}

/// Builds the strategy described by `kind`, validating the configuration on
/// the way. `None` falls back to the step strategy.
pub fn create_strategy(
    kind: Option<StrategyKind>,
    settings: &ThrottleSettings,
    pid: Option<&PidConfig>,
) -> Result<Strategy, Error> {
    let kind = kind.unwrap_or_default();

    settings.limits.validate(kind != StrategyKind::Step)?;

    let strategy: Strategy = match kind {
        StrategyKind::Step => StepStrategy::new(settings.lower_threshold).into(),
        StrategyKind::Linear => {
            LinearStrategy::new(settings.lower_threshold, settings.upper_threshold)?.into()
        }
        StrategyKind::Quadratic => {
            QuadraticStrategy::new(settings.lower_threshold, settings.upper_threshold)?.into()
        }
        StrategyKind::Pid => {
            warn!(
                "PID controller is an EXPERIMENTAL feature, it requires careful tuning and improper configuration can lead to instability"
            );

            let config = pid.ok_or(Error::MissingPidConfig)?;
            PidStrategy::new(settings.lower_threshold, *config)?.into()
        }
    };

    Ok(strategy)
}

/// Validates the configuration and returns a controller wired to the
/// requested strategy. Nothing is returned when any check fails.
pub fn create_controller(
    kind: Option<StrategyKind>,
    settings: &ThrottleSettings,
    pid: Option<&PidConfig>,
) -> Result<Controller, Error> {
    let strategy = create_strategy(kind, settings, pid)?;

    Ok(Controller::new(strategy, settings.limits))
}
