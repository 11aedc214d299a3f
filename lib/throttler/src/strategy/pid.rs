use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::Error;
use crate::metrics::PidMetrics;

const fn default_kp() -> f64 {
    0.33
}

const fn default_ki() -> f64 {
    0.01
}

const fn default_kd() -> f64 {
    0.05
}

const fn default_integral_max() -> f64 {
    1000.0
}

const fn default_output_max() -> f64 {
    1.0
}

const fn default_sample_time() -> Duration {
    Duration::from_secs(2)
}

/// Tuning of the PID strategy.
///
/// This is an experimental feature, a badly tuned controller oscillates or
/// reacts too late. Prefer the quadratic strategy unless you know what
/// you are doing.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PidConfig {
    /// Proportional gain.
    #[serde(default = "default_kp")]
    pub kp: f64,

    /// Integral gain.
    #[serde(default = "default_ki")]
    pub ki: f64,

    /// Derivative gain.
    #[serde(default = "default_kd")]
    pub kd: f64,

    /// Upper bound of the accumulated integral, protects against windup.
    #[serde(default = "default_integral_max")]
    pub integral_max: f64,

    /// Upper bound of the output intensity, in `(0, 1]`.
    #[serde(default = "default_output_max")]
    pub output_max: f64,

    /// Minimum time between two recomputations.
    #[serde(default = "default_sample_time", with = "humanize::duration::serde")]
    pub sample_time: Duration,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: default_kp(),
            ki: default_ki(),
            kd: default_kd(),
            integral_max: default_integral_max(),
            output_max: default_output_max(),
            sample_time: default_sample_time(),
        }
    }
}

impl PidConfig {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, value) in [("kp", self.kp), ("ki", self.ki), ("kd", self.kd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidGain { name, value });
            }
        }

        if !self.integral_max.is_finite() || self.integral_max <= 0.0 {
            return Err(Error::InvalidIntegralMax(self.integral_max));
        }

        if !self.output_max.is_finite() || self.output_max <= 0.0 || self.output_max > 1.0 {
            return Err(Error::InvalidOutputMax(self.output_max));
        }

        if self.sample_time.is_zero() {
            return Err(Error::InvalidSampleTime(self.sample_time));
        }

        Ok(())
    }
}

#[derive(Debug, Default)]
struct State {
    intensity: f64,
    last_error: f64,
    integral: f64,
    last_update: Option<Instant>,
}

impl State {
    fn clear(&mut self) {
        *self = State::default();
    }
}

/// Closed-loop feedback controller driving the normalized distance between the
/// backlog and the threshold towards zero.
pub struct PidStrategy {
    threshold: u64,
    config: PidConfig,
    state: RwLock<State>,
    metrics: RwLock<Option<Arc<dyn PidMetrics>>>,
}

impl std::fmt::Debug for PidStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidStrategy")
            .field("threshold", &self.threshold)
            .field("config", &self.config)
            .field("state", &*self.state.read())
            .finish_non_exhaustive()
    }
}

impl PidStrategy {
    pub fn new(threshold: u64, config: PidConfig) -> Result<Self, Error> {
        if threshold == 0 {
            return Err(Error::ZeroThreshold);
        }
        config.validate()?;

        Ok(Self {
            threshold,
            config,
            state: RwLock::new(State::default()),
            metrics: RwLock::new(None),
        })
    }

    #[inline]
    pub const fn threshold(&self) -> u64 {
        self.threshold
    }

    #[inline]
    pub const fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn set_metrics(&self, metrics: Arc<dyn PidMetrics>) {
        *self.metrics.write() = Some(metrics);
    }

    /// Recomputes the intensity, at most once per `sample_time`.
    ///
    /// A backlog at or below the threshold clears the whole state, so the
    /// first overload after a healthy stretch is answered like the very first
    /// one, proportionally, instead of integrating the healthy gap.
    pub fn update(&self, pending_bytes: u64) -> f64 {
        let start = Instant::now();
        let mut state = self.state.write();

        // anti-windup, nothing accumulates while healthy
        if pending_bytes <= self.threshold {
            state.clear();
            return 0.0;
        }

        let error = (pending_bytes - self.threshold) as f64 / self.threshold as f64;

        let dt = match state.last_update {
            None => 0.0,
            Some(last) => {
                let elapsed = start.saturating_duration_since(last);
                if elapsed < self.config.sample_time {
                    return state.intensity;
                }

                elapsed.as_secs_f64()
            }
        };

        let derivative = if dt > 0.0 {
            state.integral =
                (state.integral + error * dt).clamp(0.0, self.config.integral_max);
            (error - state.last_error) / dt
        } else {
            0.0
        };

        let output =
            self.config.kp * error + self.config.ki * state.integral + self.config.kd * derivative;
        let intensity = output.clamp(0.0, self.config.output_max);

        state.intensity = intensity;
        state.last_error = error;
        state.last_update = Some(start);

        let integral = state.integral;
        drop(state);

        trace!(
            message = "Pid strategy recomputed",
            error,
            integral,
            derivative,
            intensity,
        );

        if let Some(metrics) = self.metrics.read().as_ref() {
            metrics.record_controller_state(error * self.threshold as f64, integral, derivative);
            metrics.record_response_time(start.elapsed());
        }

        intensity
    }

    pub fn reset(&self) {
        self.state.write().clear();
    }

    pub fn load(&self) -> f64 {
        self.state.read().intensity
    }

    /// Current value of the integral term accumulator.
    pub fn integral(&self) -> f64 {
        self.state.read().integral
    }

    /// Whether the strategy has recomputed since construction or the last reset.
    pub fn initialized(&self) -> bool {
        self.state.read().last_update.is_some()
    }
}
