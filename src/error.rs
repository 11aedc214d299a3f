use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid throttle config, {0}")]
    Config(String),

    #[error("read config file {path:?} failed, {err}")]
    Io { path: PathBuf, err: std::io::Error },

    #[error("parse throttle config failed, {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Throttle(#[from] throttler::Error),
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Config(value)
    }
}
