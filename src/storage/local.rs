// src/storage/local.rs

//! Local filesystem profile store.
//!
//! One JSON file per identifier under the root directory, named by the
//! cache key (`parkrun:123456.json`). Writes are atomic: temp file, then
//! rename.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{AthleteId, CachedProfile};
use crate::storage::ProfileStore;

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalProfileStore {
    root_dir: PathBuf,
}

impl LocalProfileStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path_for(&self, athlete: &AthleteId) -> PathBuf {
        self.root_dir.join(format!("{}.json", athlete.cache_key()))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, path: &PathBuf, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    async fn read_json<T: DeserializeOwned>(&self, path: &PathBuf) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl ProfileStore for LocalProfileStore {
    async fn get(&self, athlete: &AthleteId) -> Result<Option<CachedProfile>> {
        self.read_json(&self.path_for(athlete)).await
    }

    async fn put(&self, profile: &CachedProfile) -> Result<()> {
        let path = self.path_for(&profile.athlete);
        self.write_json(&path, profile).await?;
        log::debug!("Stored profile for {}", profile.athlete);
        Ok(())
    }
}
