use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::{
    db::store::{CacheKey, CacheStore},
    error::CacheResult,
    models::{CacheEnvelope, TrendingAggregate},
};

/// Durable cache tier backed by JSON files in one directory
///
/// Each key maps to one file holding the bare aggregate; the file's
/// modification time is the envelope's `stored_at`. Writes go through a
/// temporary file and a rename so readers never observe a partial document.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }
}

#[async_trait::async_trait]
impl CacheStore for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &CacheKey) -> CacheResult<Option<CacheEnvelope>> {
        let path = self.path(key);

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored_at: DateTime<Utc> = metadata.modified()?.into();

        let contents = tokio::fs::read(&path).await?;
        let data: TrendingAggregate = serde_json::from_slice(&contents)?;

        Ok(Some(CacheEnvelope::new(data, stored_at)))
    }

    /// `envelope.stored_at` is not persisted; the write itself sets the mtime
    async fn set(&self, key: &CacheKey, envelope: &CacheEnvelope) -> CacheResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(&envelope.data)?;

        tokio::fs::write(&tmp_path, json).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        tracing::debug!(path = %path.display(), "Durable cache written");
        Ok(())
    }

    async fn remove(&self, key: &CacheKey) -> CacheResult<()> {
        match tokio::fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
