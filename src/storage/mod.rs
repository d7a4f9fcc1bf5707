// src/storage/mod.rs

//! Storage abstractions for cached athlete profiles.
//!
//! The pipeline reads and writes whole [`CachedProfile`] records keyed by
//! athlete identifier; it never partially updates a stored record. Backends
//! only need get/put with read-after-write consistency inside one process.

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{AthleteId, CachedProfile};

pub use local::LocalProfileStore;

/// Trait for profile cache backends.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load the cached profile for an identifier, if one exists.
    async fn get(&self, athlete: &AthleteId) -> Result<Option<CachedProfile>>;

    /// Store a profile, replacing any previous record for the identifier.
    async fn put(&self, profile: &CachedProfile) -> Result<()>;
}

/// In-memory store for tests and single-run invocations.
#[derive(Default)]
pub struct MemoryProfileStore {
    records: tokio::sync::RwLock<std::collections::HashMap<String, CachedProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, athlete: &AthleteId) -> Result<Option<CachedProfile>> {
        Ok(self.records.read().await.get(&athlete.cache_key()).cloned())
    }

    async fn put(&self, profile: &CachedProfile) -> Result<()> {
        self.records
            .write()
            .await
            .insert(profile.athlete.cache_key(), profile.clone());
        Ok(())
    }
}
