use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Main error type for lumen operations
#[derive(Error, Debug)]
pub enum LumenError {
    #[error("Failed to open index at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Write aborted: {0}")]
    Write(#[source] io::Error),

    #[error("Another writer holds the index lock")]
    WriterBusy,

    #[error("Query parse error near '{fragment}': {message}")]
    QueryParse { fragment: String, message: String },

    #[error("Delete aborted: {0}")]
    Delete(#[source] io::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for lumen operations
pub type Result<T> = std::result::Result<T, LumenError>;

impl LumenError {
    pub(crate) fn query_parse(fragment: impl Into<String>, message: impl Into<String>) -> Self {
        LumenError::QueryParse {
            fragment: fragment.into(),
            message: message.into(),
        }
    }

    /// Check if this error indicates a transient failure that could be retried
    pub fn is_retriable(&self) -> bool {
        matches!(self, LumenError::WriterBusy)
    }
}
