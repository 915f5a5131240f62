use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while persisting a conversation snapshot.
///
/// Logging is best-effort: callers record these and carry on.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("failed to prepare conversation log directory {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write conversation log {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode conversation snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("no free file name for conversation log in {path:?}")]
    Exhausted { path: PathBuf },
}
