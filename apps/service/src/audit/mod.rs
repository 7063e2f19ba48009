//! Per-check audit logs.
//!
//! Every probe appends one JSON line to `<dir>/<check_id>.log`. Rotation
//! compresses a log into `<dir>/<check_id>-<millis>.gz.b64` and truncates the
//! live file in place. Appends and rotations of the same file are serialized
//! through a per-file lock so a rotation never loses a concurrent append.

pub mod archive;

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::monitoring::types::LogEntry;
use archive::ARCHIVE_EXTENSION;

const LOG_EXTENSION: &str = "log";

#[derive(Debug, Error)]
pub enum LogError {
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize log entry: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("archive is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("archive {0} already exists")]
    ArchiveExists(String),
    #[error("archive {0} not found")]
    ArchiveNotFound(String),
}

/// What happened to one log during rotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rotation {
    /// Contents moved into the named archive
    Archived(String),
    /// Nothing to archive
    Empty,
}

/// Append-only audit logs, one file per check
pub struct AuditLog {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), locks: Mutex::new(HashMap::new()) }
    }

    fn log_path(&self, check_id: &str) -> PathBuf {
        self.dir.join(format!("{check_id}.{LOG_EXTENSION}"))
    }

    fn archive_path(&self, archive_id: &str) -> PathBuf {
        self.dir.join(format!("{archive_id}.{ARCHIVE_EXTENSION}"))
    }

    async fn file_lock(&self, check_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(check_id.to_string()).or_default().clone()
    }

    /// Append one entry to the check's log, creating the file if needed
    pub async fn append(&self, check_id: &str, entry: &LogEntry) -> Result<(), LogError> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');

        let lock = self.file_lock(check_id).await;
        let _guard = lock.lock().await;

        fs::create_dir_all(&self.dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(check_id))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    /// Ids of live logs, plus archive ids when `include_archives` is set
    pub async fn list(&self, include_archives: bool) -> Result<Vec<String>, LogError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let live_suffix = format!(".{LOG_EXTENSION}");
        let archive_suffix = format!(".{ARCHIVE_EXTENSION}");

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };

            if let Some(id) = name.strip_suffix(&live_suffix) {
                ids.push(id.to_string());
            } else if include_archives {
                if let Some(id) = name.strip_suffix(&archive_suffix) {
                    ids.push(id.to_string());
                }
            }
        }

        ids.sort();
        Ok(ids)
    }

    /// Archive the check's log contents and truncate it to zero length.
    ///
    /// The live file keeps its path so later appends continue against it.
    pub async fn rotate(&self, check_id: &str, rotated_at: i64) -> Result<Rotation, LogError> {
        let lock = self.file_lock(check_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.rotate_locked(check_id, rotated_at).await
        };
        self.release_lock(check_id, lock).await;
        result
    }

    /// Drop the map's lock for `check_id` unless another task still holds it
    async fn release_lock(&self, check_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // One reference in the map, one in `lock`
        if Arc::strong_count(&lock) == 2 {
            locks.remove(check_id);
        }
    }

    async fn rotate_locked(&self, check_id: &str, rotated_at: i64) -> Result<Rotation, LogError> {
        let log_path = self.log_path(check_id);
        let contents = match fs::read(&log_path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Rotation::Empty),
            Err(e) => return Err(e.into()),
        };
        if contents.is_empty() {
            return Ok(Rotation::Empty);
        }

        let archive_id = archive::archive_id(check_id, rotated_at);
        let encoded = archive::compress(&contents)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.archive_path(&archive_id))
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    LogError::ArchiveExists(archive_id.clone())
                } else {
                    LogError::Io(e)
                }
            })?;
        file.write_all(encoded.as_bytes()).await?;
        file.flush().await?;

        OpenOptions::new().write(true).open(&log_path).await?.set_len(0).await?;

        debug!(check_id, archive = %archive_id, bytes = contents.len(), "Log rotated");
        Ok(Rotation::Archived(archive_id))
    }

    /// Recover the original contents of an archive
    pub async fn decompress(&self, archive_id: &str) -> Result<Vec<u8>, LogError> {
        let encoded = fs::read_to_string(self.archive_path(archive_id)).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                LogError::ArchiveNotFound(archive_id.to_string())
            } else {
                LogError::Io(e)
            }
        })?;

        archive::decompress(&encoded)
    }
}
