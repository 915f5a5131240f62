use crate::error::LogError;
use crate::turn::Turn;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

const FILE_PREFIX: &str = "conversation";
const MAX_NAME_ATTEMPTS: u32 = 100;

/// Persists full conversation snapshots.
#[async_trait]
pub trait ConversationLogger: Send + Sync {
    async fn persist(&self, snapshot: &[Turn]) -> Result<(), LogError>;
}

/// Writes one pretty-printed JSON file per snapshot into a directory.
///
/// Files are named `conversation_<YYYYmmdd_HHMMSS>_<micros>.json` and are
/// created with create-new semantics, so an existing record is never
/// overwritten.
#[derive(Debug, Clone)]
pub struct FileConversationLogger {
    dir: PathBuf,
}

impl FileConversationLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn candidate(&self, stamp: &DateTime<Local>, attempt: u32) -> PathBuf {
        let base = format!(
            "{FILE_PREFIX}_{}_{:06}",
            stamp.format("%Y%m%d_%H%M%S"),
            stamp.timestamp_subsec_micros()
        );
        let name = if attempt == 0 {
            format!("{base}.json")
        } else {
            format!("{base}-{attempt}.json")
        };
        self.dir.join(name)
    }
}

#[async_trait]
impl ConversationLogger for FileConversationLogger {
    async fn persist(&self, snapshot: &[Turn]) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| LogError::Directory {
                path: self.dir.clone(),
                source,
            })?;

        let body = serde_json::to_vec_pretty(snapshot)?;
        let stamp = Local::now();

        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.candidate(&stamp, attempt);
            let mut file = match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(LogError::Write { path, source }),
            };

            let written = async {
                file.write_all(&body).await?;
                file.flush().await
            }
            .await;
            if let Err(source) = written {
                return Err(LogError::Write { path, source });
            }

            debug!(path = %path.display(), turns = snapshot.len(), "Logged conversation");
            return Ok(());
        }

        Err(LogError::Exhausted {
            path: self.dir.clone(),
        })
    }
}

/// Keeps snapshots in memory. Useful wherever files are unwanted.
#[derive(Debug, Default)]
pub struct MemoryConversationLogger {
    snapshots: Mutex<Vec<Vec<Turn>>>,
}

impl MemoryConversationLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn snapshots(&self) -> Vec<Vec<Turn>> {
        self.snapshots.lock().await.clone()
    }
}

#[async_trait]
impl ConversationLogger for MemoryConversationLogger {
    async fn persist(&self, snapshot: &[Turn]) -> Result<(), LogError> {
        self.snapshots.lock().await.push(snapshot.to_vec());
        Ok(())
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopConversationLogger;

#[async_trait]
impl ConversationLogger for NoopConversationLogger {
    async fn persist(&self, _snapshot: &[Turn]) -> Result<(), LogError> {
        Ok(())
    }
}
