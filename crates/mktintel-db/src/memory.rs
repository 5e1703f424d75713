//! Process-local cache store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktintel_core::{Artifact, ArtifactKind, CacheEntry, CacheStatus};
use tokio::sync::RwLock;

use crate::cache::{is_servable, CacheError, CacheKey, CacheStore};

type Slot = (CacheKey, ArtifactKind);

/// In-memory [`CacheStore`]. Entries for a slot are kept oldest first.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<Slot, Vec<CacheEntry>>>,
}

impl MemoryCacheStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn demote(entries: &mut [CacheEntry]) -> u64 {
        let mut demoted = 0;
        for entry in entries.iter_mut().filter(|e| e.status.is_current()) {
            entry.status = CacheStatus::Stale;
            demoted += 1;
        }
        demoted
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get_fresh(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        min_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let entries = self.entries.read().await;
        let latest = entries
            .get(&(key.clone(), kind))
            .and_then(|slot| slot.iter().rev().find(|e| e.status.is_current()));

        Ok(latest
            .filter(|entry| is_servable(entry, min_count, now))
            .cloned())
    }

    async fn save(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        artifacts: Vec<Artifact>,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry::new_fresh(&key.partition, &key.fingerprint, kind, artifacts, now);

        let mut entries = self.entries.write().await;
        let slot = entries.entry((key.clone(), kind)).or_default();
        let demoted = Self::demote(slot);
        slot.push(entry.clone());

        tracing::debug!(
            key = %key,
            kind = %kind,
            demoted,
            count = entry.artifacts.len(),
            "cache entry saved"
        );
        Ok(entry)
    }

    async fn invalidate(&self, key: &CacheKey, kind: ArtifactKind) -> Result<u64, CacheError> {
        let mut entries = self.entries.write().await;
        Ok(entries
            .get_mut(&(key.clone(), kind))
            .map_or(0, |slot| Self::demote(slot)))
    }

    async fn mark_viewed(&self, key: &CacheKey, kind: ArtifactKind) -> Result<bool, CacheError> {
        let mut entries = self.entries.write().await;
        let fresh = entries
            .get_mut(&(key.clone(), kind))
            .and_then(|slot| {
                slot.iter_mut()
                    .rev()
                    .find(|e| e.status == CacheStatus::Fresh)
            });

        Ok(match fresh {
            Some(entry) => {
                entry.status = CacheStatus::Viewed;
                true
            }
            None => false,
        })
    }

    async fn history(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
    ) -> Result<Vec<CacheEntry>, CacheError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(key.clone(), kind))
            .map(|slot| slot.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
