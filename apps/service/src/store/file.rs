use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{Store, StoreError};

const RECORD_EXTENSION: &str = "json";

/// File-backed store: one JSON document per record at
/// `<base_dir>/<collection>/<id>.json`
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    fn record_path(&self, collection: &str, id: &str) -> PathBuf {
        self.base_dir.join(collection).join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn map_missing(err: std::io::Error, collection: &str, id: &str) -> StoreError {
        if err.kind() == ErrorKind::NotFound {
            StoreError::NotFound { collection: collection.to_string(), id: id.to_string() }
        } else {
            StoreError::Io(err)
        }
    }
}

#[async_trait]
impl Store for FileStore {
    async fn list(&self, collection: &str) -> Result<BTreeSet<String>, StoreError> {
        let dir = self.base_dir.join(collection);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeSet::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = BTreeSet::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.insert(stem.to_string());
                }
            }
        }

        Ok(ids)
    }

    async fn read(&self, collection: &str, id: &str) -> Result<Value, StoreError> {
        let raw = fs::read_to_string(self.record_path(collection, id))
            .await
            .map_err(|e| Self::map_missing(e, collection, id))?;

        // Unparseable documents read as an empty object and fail validation
        // downstream instead of aborting the caller.
        Ok(serde_json::from_str(&raw).unwrap_or_else(|_| Value::Object(Default::default())))
    }

    async fn create(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let body = serde_json::to_vec(record)?;
        fs::create_dir_all(self.base_dir.join(collection)).await?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.record_path(collection, id))
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::AlreadyExists {
                    StoreError::AlreadyExists {
                        collection: collection.to_string(),
                        id: id.to_string(),
                    }
                } else {
                    StoreError::Io(e)
                }
            })?;

        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, record: &Value) -> Result<(), StoreError> {
        let body = serde_json::to_vec(record)?;

        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(self.record_path(collection, id))
            .await
            .map_err(|e| Self::map_missing(e, collection, id))?;

        file.write_all(&body).await?;
        file.flush().await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        fs::remove_file(self.record_path(collection, id))
            .await
            .map_err(|e| Self::map_missing(e, collection, id))
    }
}
