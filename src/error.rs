// SPDX-License-Identifier: MPL-2.0
use thiserror::Error;

use crate::logging::LoggerError;
use crate::report::{ExportError, FilterError};

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Logger Error: {0}")]
    Logger(#[from] LoggerError),

    #[error("Export Error: {0}")]
    Export(#[from] ExportError),

    #[error("Filter Error: {0}")]
    Filter(#[from] FilterError),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
