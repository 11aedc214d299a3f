//! Throttling of the batch submitter when the data-availability backlog
//! grows, configured from YAML and adjustable at runtime.

mod admin;
mod config;
mod error;

pub use admin::{ControllerInfo, Throttler};
pub use config::Config;
pub use error::Error;
pub use throttler;

#[macro_use]
extern crate tracing;
