//! Storage for planners' ad hoc composite presets.
//!
//! Temporary presets live behind [`TemporaryPresetStore`] so the seven-day
//! expiry can run against any backend. [`InMemoryPresetStore`] serves tests and
//! single-process setups; the database crate provides a PostgreSQL store.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::errors::{ShiftError, ShiftResult};
use crate::models::preset::TemporaryPreset;

/// Age after which a temporary preset is discarded.
pub fn temporary_preset_ttl() -> Duration {
    Duration::days(7)
}

#[async_trait]
pub trait TemporaryPresetStore: Send + Sync {
    async fn get(&self, key: &str) -> ShiftResult<Option<TemporaryPreset>>;

    async fn set(&self, key: &str, preset: TemporaryPreset) -> ShiftResult<()>;

    /// Returns whether a value was removed.
    async fn delete(&self, key: &str) -> ShiftResult<bool>;

    async fn list(&self) -> ShiftResult<Vec<(String, TemporaryPreset)>>;

    /// Keys of presets created at or before `cutoff`.
    async fn list_expired(&self, cutoff: DateTime<Utc>) -> ShiftResult<Vec<String>>;
}

/// Deletes every preset older than the TTL and returns the removed keys.
pub async fn collect_garbage<S>(store: &S, now: DateTime<Utc>) -> ShiftResult<Vec<String>>
where
    S: TemporaryPresetStore + ?Sized,
{
    let expired = store.list_expired(now - temporary_preset_ttl()).await?;
    for key in &expired {
        store.delete(key).await?;
    }
    Ok(expired)
}

#[derive(Debug, Default)]
pub struct InMemoryPresetStore {
    entries: Mutex<HashMap<String, TemporaryPreset>>,
}

impl InMemoryPresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ShiftResult<std::sync::MutexGuard<'_, HashMap<String, TemporaryPreset>>> {
        self.entries
            .lock()
            .map_err(|_| ShiftError::Internal("temporary preset store lock poisoned".into()))
    }
}

#[async_trait]
impl TemporaryPresetStore for InMemoryPresetStore {
    async fn get(&self, key: &str) -> ShiftResult<Option<TemporaryPreset>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, preset: TemporaryPreset) -> ShiftResult<()> {
        self.lock()?.insert(key.to_string(), preset);
        Ok(())
    }

    async fn delete(&self, key: &str) -> ShiftResult<bool> {
        Ok(self.lock()?.remove(key).is_some())
    }

    async fn list(&self) -> ShiftResult<Vec<(String, TemporaryPreset)>> {
        let mut all: Vec<_> = self
            .lock()?
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        all.sort_by(|a, b| a.1.created_at.cmp(&b.1.created_at));
        Ok(all)
    }

    async fn list_expired(&self, cutoff: DateTime<Utc>) -> ShiftResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .lock()?
            .iter()
            .filter(|(_, v)| v.created_at <= cutoff)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
