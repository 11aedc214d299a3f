//! Adaptive throttling of data-availability backlog.
//!
//! A [`Controller`] feeds the current backlog (pending bytes) to one of the
//! [`Strategy`] variants, turns the resulting intensity into size limits and
//! publishes them as an immutable snapshot.

mod controller;
mod error;
mod factory;
mod metrics;
mod params;
pub mod strategy;

pub use controller::{Controller, Snapshot};
pub use error::Error;
pub use factory::{ThrottleSettings, create_controller, create_strategy};
pub use metrics::{PidMetrics, ThrottleMetrics};
pub use params::{ThrottleConfig, ThrottleParams};
pub use strategy::{PidConfig, Strategy, StrategyKind};

#[macro_use]
extern crate tracing;
