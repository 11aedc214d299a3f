mod linear;
mod pid;
mod quadratic;
mod step;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use linear::LinearStrategy;
pub use pid::{PidConfig, PidStrategy};
pub use quadratic::QuadraticStrategy;
pub use step::StepStrategy;

use crate::Error;

/// The policy used to turn a backlog into an intensity.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    Step,
    Linear,
    Quadratic,
    Pid,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::Step,
        StrategyKind::Linear,
        StrategyKind::Quadratic,
        StrategyKind::Pid,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Step => "step",
            StrategyKind::Linear => "linear",
            StrategyKind::Quadratic => "quadratic",
            StrategyKind::Pid => "pid",
        }
    }
}

impl Display for StrategyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step" => Ok(StrategyKind::Step),
            "linear" => Ok(StrategyKind::Linear),
            "quadratic" => Ok(StrategyKind::Quadratic),
            "pid" => Ok(StrategyKind::Pid),
            _ => Err(Error::UnknownStrategy(s.to_string())),
        }
    }
}

/// A throttle strategy, owned by a `Controller`.
///
/// Every variant keeps its memory behind a lock, so all methods take `&self`
/// and are safe to call from multiple threads.
#[derive(Debug)]
pub enum Strategy {
    Step(StepStrategy),
    Linear(LinearStrategy),
    Quadratic(QuadraticStrategy),
    Pid(PidStrategy),
}

impl Strategy {
    /// Computes, stores and returns the intensity for the current backlog.
    pub fn update(&self, pending_bytes: u64) -> f64 {
        match self {
            Strategy::Step(s) => s.update(pending_bytes),
            Strategy::Linear(s) => s.update(pending_bytes),
            Strategy::Quadratic(s) => s.update(pending_bytes),
            Strategy::Pid(s) => s.update(pending_bytes),
        }
    }

    pub fn reset(&self) {
        match self {
            Strategy::Step(s) => s.reset(),
            Strategy::Linear(s) => s.reset(),
            Strategy::Quadratic(s) => s.reset(),
            Strategy::Pid(s) => s.reset(),
        }
    }

    pub const fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Step(_) => StrategyKind::Step,
            Strategy::Linear(_) => StrategyKind::Linear,
            Strategy::Quadratic(_) => StrategyKind::Quadratic,
            Strategy::Pid(_) => StrategyKind::Pid,
        }
    }

    /// Returns the last computed intensity without recomputing it.
    pub fn load(&self) -> (StrategyKind, f64) {
        let intensity = match self {
            Strategy::Step(s) => s.load(),
            Strategy::Linear(s) => s.load(),
            Strategy::Quadratic(s) => s.load(),
            Strategy::Pid(s) => s.load(),
        };

        (self.kind(), intensity)
    }

    pub fn as_pid(&self) -> Option<&PidStrategy> {
        match self {
            Strategy::Pid(s) => Some(s),
            _ => None,
        }
    }
}

impl From<StepStrategy> for Strategy {
    fn from(s: StepStrategy) -> Self {
        Strategy::Step(s)
    }
}

impl From<LinearStrategy> for Strategy {
    fn from(s: LinearStrategy) -> Self {
        Strategy::Linear(s)
    }
}

impl From<QuadraticStrategy> for Strategy {
    fn from(s: QuadraticStrategy) -> Self {
        Strategy::Quadratic(s)
    }
}

impl From<PidStrategy> for Strategy {
    fn from(s: PidStrategy) -> Self {
        Strategy::Pid(s)
    }
}

/// Position of `pending` between the two thresholds, in `[0, 1]`.
fn ratio(lower: u64, upper: u64, pending: u64) -> f64 {
    if pending <= lower {
        return 0.0;
    }
    if pending >= upper {
        return 1.0;
    }

    (pending - lower) as f64 / (upper - lower) as f64
}
