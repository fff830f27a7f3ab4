use thiserror::Error;

use super::{ClientError, ConfigError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("CLI error: {source}")]
    Clap {
        #[from]
        source: clap::Error,
    },
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

pub type AppResult<T> = Result<T, AppError>;
