//! The cache store abstraction shared by all backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktintel_core::{Artifact, ArtifactKind, BusinessContext, CacheEntry};
use thiserror::Error;

use crate::DbError;

/// Identifies one cache partition slot: a user's partition and the
/// fingerprint of the profile the artifacts were generated for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub partition: String,
    pub fingerprint: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(partition: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            fingerprint: fingerprint.into(),
        }
    }

    /// Key for `context`, computing its fingerprint.
    #[must_use]
    pub fn for_context(context: &BusinessContext) -> Self {
        Self::new(
            context.user_id.clone(),
            mktintel_core::fingerprint(context),
        )
    }
}

impl From<&BusinessContext> for CacheKey {
    fn from(context: &BusinessContext) -> Self {
        Self::for_context(context)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.partition, self.fingerprint)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("failed to encode artifacts: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("cache row {id} is corrupt: {reason}")]
    CorruptRow { id: String, reason: String },
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::Db(DbError::Sqlx(e))
    }
}

/// Storage for generated artifact sets.
///
/// Entries are never deleted: `save` and `invalidate` demote current
/// (`fresh`/`viewed`) entries to `stale`. Expiry is evaluated lazily against
/// the caller-supplied `now`.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Most recent current entry for `key`/`kind`, provided it has not
    /// expired at `now` and holds at least `min_count` artifacts.
    async fn get_fresh(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        min_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError>;

    /// Demote current entries and insert a new `fresh` one generated at `now`.
    async fn save(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        artifacts: Vec<Artifact>,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, CacheError>;

    /// Demote current entries without a replacement. Returns how many were demoted.
    async fn invalidate(&self, key: &CacheKey, kind: ArtifactKind) -> Result<u64, CacheError>;

    /// Move the current `fresh` entry to `viewed`. Returns whether one existed.
    async fn mark_viewed(&self, key: &CacheKey, kind: ArtifactKind) -> Result<bool, CacheError>;

    /// Every entry for `key`/`kind`, newest first, whatever its status.
    async fn history(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
    ) -> Result<Vec<CacheEntry>, CacheError>;
}

/// Shared `get_fresh` acceptance rule so backends agree on it.
pub(crate) fn is_servable(
    entry: &CacheEntry,
    min_count: usize,
    now: DateTime<Utc>,
) -> bool {
    entry.status.is_current() && !entry.is_expired(now) && entry.artifacts.len() >= min_count
}
