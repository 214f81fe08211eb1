use thiserror::Error;

use crate::services::{AuthError, FetchError};
use crate::sync::SyncError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Pocket API error: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type Result<T> = std::result::Result<T, AppError>;
