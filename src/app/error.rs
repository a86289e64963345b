use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Terminal outcome of a fetch call, after retries have been spent or skipped.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request [{url}] could not be sent: {reason}")]
    Request { url: String, reason: String },

    #[error("HTTP request [{url}] failed with status code {status}")]
    Status {
        url: String,
        status: u16,
        body: Vec<u8>,
    },

    #[error("HTTP request [{url}] failed after {attempts} attempts: {last_error}")]
    AttemptsExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// Raw response bytes that accompanied the failure, if any.
    pub fn body(&self) -> &[u8] {
        match self {
            FetchError::Status { body, .. } => body,
            _ => &[],
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Cursor to resume from after this failure. Fetch errors never carry one,
    /// so a failed page ends its feed.
    pub fn next_cursor(&self) -> Option<String> {
        None
    }
}

/// A single record could not be extracted from a page.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("error parsing JSON page: {0}")]
    Page(#[source] serde_json::Error),

    #[error("record has no string identity field `{field}`")]
    MissingIdentity { field: String },
}
