use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Remote(RemoteError),
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse config: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("remote request failed: {0}")]
    Http(String),
    #[error("remote returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("remote auth: {0}")]
    Auth(String),
    #[error("remote {0}")]
    Invalid(String),
    #[error("remote storage {path}: {source}")]
    Storage { path: String, source: io::Error },
}

pub type Result<T> = std::result::Result<T, BackupError>;

impl BackupError {
    pub fn message(msg: impl Into<String>) -> Self {
        BackupError::Message(msg.into())
    }
}

impl From<ConfigError> for BackupError {
    fn from(err: ConfigError) -> Self {
        BackupError::Config(err)
    }
}

impl From<RemoteError> for BackupError {
    fn from(err: RemoteError) -> Self {
        BackupError::Remote(err)
    }
}

impl RemoteError {
    pub fn storage(path: &std::path::Path, source: io::Error) -> Self {
        RemoteError::Storage {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        RemoteError::Http(err.to_string())
    }
}
