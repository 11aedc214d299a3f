use std::path::Path;

use serde::{Deserialize, Serialize};
use throttler::{PidConfig, StrategyKind, ThrottleConfig, ThrottleSettings};

use crate::Error;

const fn default_controller_type() -> StrategyKind {
    StrategyKind::Quadratic
}

// allows for 4x 6-blob channels at ~131KB per blob
const fn default_lower_threshold() -> u64 {
    3_200_000
}

const fn default_upper_threshold() -> u64 {
    default_lower_threshold() * 4
}

const fn default_item_size_lower_limit() -> u64 {
    150
}

const fn default_item_size_upper_limit() -> u64 {
    20_000
}

const fn default_batch_size_lower_limit() -> u64 {
    2_000
}

const fn default_batch_size_upper_limit() -> u64 {
    130_000
}

/// Throttling configuration of the batch submitter.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Strategy used to compute the throttle intensity, `step`, `linear`,
    /// `quadratic` or `pid`. `pid` is EXPERIMENTAL, use with caution.
    #[serde(default = "default_controller_type")]
    pub controller_type: StrategyKind,

    /// The backlog in bytes beyond which throttling starts. Zero disables
    /// throttling.
    #[serde(default = "default_lower_threshold")]
    pub lower_threshold: u64,

    /// The backlog in bytes at which throttling has the maximum intensity
    /// (linear and quadratic strategies only).
    #[serde(default = "default_upper_threshold")]
    pub upper_threshold: u64,

    /// The limit on the size of items at maximum throttle intensity. 0 means
    /// no limit will ever be applied, so 1 is the smallest effective limit.
    #[serde(default = "default_item_size_lower_limit")]
    pub item_size_lower_limit: u64,

    /// The limit on the size of items as the intensity approaches 0 from
    /// positive values. Not applied when throttling is inactive.
    #[serde(default = "default_item_size_upper_limit")]
    pub item_size_upper_limit: u64,

    /// The limit on the size of batches at maximum throttle intensity. 0
    /// means no limit will ever be applied, so 1 is the smallest effective
    /// limit.
    #[serde(default = "default_batch_size_lower_limit")]
    pub batch_size_lower_limit: u64,

    /// The limit on the size of batches when throttling is inactive.
    #[serde(default = "default_batch_size_upper_limit")]
    pub batch_size_upper_limit: u64,

    /// Tuning of the PID strategy, only used when `controller_type` is `pid`.
    #[serde(default)]
    pub pid: PidConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller_type: default_controller_type(),
            lower_threshold: default_lower_threshold(),
            upper_threshold: default_upper_threshold(),
            item_size_lower_limit: default_item_size_lower_limit(),
            item_size_upper_limit: default_item_size_upper_limit(),
            batch_size_lower_limit: default_batch_size_lower_limit(),
            batch_size_upper_limit: default_batch_size_upper_limit(),
            pid: PidConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_str(text: &str) -> Result<Config, Error> {
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| Error::Io {
            path: path.to_path_buf(),
            err,
        })?;

        Self::load_from_str(&text)
    }

    /// Throttling is disabled when the lower threshold is zero, and the
    /// throttling loop should not be started at all.
    #[inline]
    pub const fn enabled(&self) -> bool {
        self.lower_threshold > 0
    }

    pub const fn limits(&self) -> ThrottleConfig {
        ThrottleConfig {
            item_size_lower_limit: self.item_size_lower_limit,
            item_size_upper_limit: self.item_size_upper_limit,
            batch_size_lower_limit: self.batch_size_lower_limit,
            batch_size_upper_limit: self.batch_size_upper_limit,
        }
    }

    pub const fn settings(&self) -> ThrottleSettings {
        ThrottleSettings {
            lower_threshold: self.lower_threshold,
            upper_threshold: self.upper_threshold,
            limits: self.limits(),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.lower_threshold != 0 && self.upper_threshold <= self.lower_threshold {
            return Err(format!(
                "upper_threshold({}) must be greater than lower_threshold({})",
                self.upper_threshold, self.lower_threshold
            )
            .into());
        }

        self.limits()
            .validate(self.controller_type != StrategyKind::Step)?;

        if self.controller_type == StrategyKind::Pid {
            self.pid.validate()?;
        }

        Ok(())
    }
}
