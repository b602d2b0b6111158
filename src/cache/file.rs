use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::fs;

use super::{RawSnapshot, SnapshotBackend};
use crate::catalog::CatalogRecord;
use crate::error::CacheError;

pub const CACHE_FILE_NAME: &str = "distro_cache.json";

/// Snapshot kept as a pretty-printed JSON array; the file's mtime is the write time.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(CACHE_FILE_NAME),
        }
    }
}

#[async_trait::async_trait]
impl SnapshotBackend for FileBackend {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Option<RawSnapshot>, CacheError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let records: Vec<CatalogRecord> = serde_json::from_slice(&bytes)?;
        let modified = fs::metadata(&self.path).await?.modified()?;
        Ok(Some(RawSnapshot {
            records,
            written_at: DateTime::<Utc>::from(modified),
        }))
    }

    async fn store(&self, records: &[CatalogRecord], _ttl: Duration) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(records)?;
        // Readers never observe a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &body).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn remove(&self) -> Result<(), CacheError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
