//! PostgreSQL-backed cache store over `artifact_cache_entries`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktintel_core::{Artifact, ArtifactKind, CacheEntry, CacheStatus};
use sqlx::PgPool;
use uuid::Uuid;

use crate::cache::{is_servable, CacheError, CacheKey, CacheStore};

const SELECT_COLUMNS: &str = "id, partition_key, fingerprint, kind, artifacts, status, \
                              generated_at, expires_at";

/// A row from the `artifact_cache_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CacheEntryRow {
    pub id: Uuid,
    pub partition_key: String,
    pub fingerprint: String,
    pub kind: String,
    pub artifacts: serde_json::Value,
    pub status: String,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<CacheEntryRow> for CacheEntry {
    type Error = CacheError;

    fn try_from(row: CacheEntryRow) -> Result<Self, Self::Error> {
        let corrupt = |reason: String| CacheError::CorruptRow {
            id: row.id.to_string(),
            reason,
        };

        let kind: ArtifactKind = row.kind.parse().map_err(corrupt)?;
        let status: CacheStatus = row.status.parse().map_err(corrupt)?;
        let artifacts: Vec<Artifact> = serde_json::from_value(row.artifacts)
            .map_err(|e| corrupt(format!("artifacts: {e}")))?;

        Ok(CacheEntry {
            id: row.id,
            partition: row.partition_key,
            fingerprint: row.fingerprint,
            kind,
            artifacts,
            generated_at: row.generated_at,
            expires_at: row.expires_at,
            status,
        })
    }
}

/// [`CacheStore`] persisted in PostgreSQL. Run migrations before use.
#[derive(Debug, Clone)]
pub struct PgCacheStore {
    pool: PgPool,
}

impl PgCacheStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CacheStore for PgCacheStore {
    async fn get_fresh(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        min_count: usize,
        now: DateTime<Utc>,
    ) -> Result<Option<CacheEntry>, CacheError> {
        let min_rows = i32::try_from(min_count).unwrap_or(i32::MAX);
        let row = sqlx::query_as::<_, CacheEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM artifact_cache_entries \
             WHERE partition_key = $1 AND fingerprint = $2 AND kind = $3 \
               AND status IN ('fresh', 'viewed') \
               AND artifact_count >= $4 \
             ORDER BY generated_at DESC, created_at DESC \
             LIMIT 1"
        ))
        .bind(&key.partition)
        .bind(&key.fingerprint)
        .bind(kind.as_str())
        .bind(min_rows)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let entry = CacheEntry::try_from(row)?;
        Ok(is_servable(&entry, min_count, now).then_some(entry))
    }

    async fn save(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        artifacts: Vec<Artifact>,
        now: DateTime<Utc>,
    ) -> Result<CacheEntry, CacheError> {
        let entry = CacheEntry::new_fresh(&key.partition, &key.fingerprint, kind, artifacts, now);
        let payload = serde_json::to_value(&entry.artifacts).map_err(CacheError::Encode)?;
        let count = i32::try_from(entry.artifacts.len()).unwrap_or(i32::MAX);

        let mut tx = self.pool.begin().await?;

        let demoted = sqlx::query(
            "UPDATE artifact_cache_entries \
             SET status = 'stale', updated_at = NOW() \
             WHERE partition_key = $1 AND fingerprint = $2 AND kind = $3 \
               AND status IN ('fresh', 'viewed')",
        )
        .bind(&key.partition)
        .bind(&key.fingerprint)
        .bind(kind.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            "INSERT INTO artifact_cache_entries \
                 (id, partition_key, fingerprint, kind, artifacts, artifact_count, \
                  status, generated_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'fresh', $7, $8)",
        )
        .bind(entry.id)
        .bind(&entry.partition)
        .bind(&entry.fingerprint)
        .bind(kind.as_str())
        .bind(payload)
        .bind(count)
        .bind(entry.generated_at)
        .bind(entry.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(key = %key, kind = %kind, demoted, count, "cache entry saved");
        Ok(entry)
    }

    async fn invalidate(&self, key: &CacheKey, kind: ArtifactKind) -> Result<u64, CacheError> {
        let result = sqlx::query(
            "UPDATE artifact_cache_entries \
             SET status = 'stale', updated_at = NOW() \
             WHERE partition_key = $1 AND fingerprint = $2 AND kind = $3 \
               AND status IN ('fresh', 'viewed')",
        )
        .bind(&key.partition)
        .bind(&key.fingerprint)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_viewed(&self, key: &CacheKey, kind: ArtifactKind) -> Result<bool, CacheError> {
        let result = sqlx::query(
            "UPDATE artifact_cache_entries \
             SET status = 'viewed', updated_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM artifact_cache_entries \
                 WHERE partition_key = $1 AND fingerprint = $2 AND kind = $3 \
                   AND status = 'fresh' \
                 ORDER BY generated_at DESC, created_at DESC \
                 LIMIT 1)",
        )
        .bind(&key.partition)
        .bind(&key.fingerprint)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn history(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
    ) -> Result<Vec<CacheEntry>, CacheError> {
        let rows = sqlx::query_as::<_, CacheEntryRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM artifact_cache_entries \
             WHERE partition_key = $1 AND fingerprint = $2 AND kind = $3 \
             ORDER BY generated_at DESC, created_at DESC"
        ))
        .bind(&key.partition)
        .bind(&key.fingerprint)
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CacheEntry::try_from).collect()
    }
}
