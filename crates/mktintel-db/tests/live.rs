//! Live tests for `PgCacheStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness; they need `DATABASE_URL` and are ignored by default
//! (`cargo test -- --ignored`).

use chrono::{Duration, TimeZone, Utc};
use mktintel_core::{Artifact, ArtifactKind, CacheStatus, CampaignIdea};
use mktintel_db::{CacheKey, CacheStore, PgCacheStore};

fn key() -> CacheKey {
    CacheKey::new("user-live", "00112233aabbccdd")
}

fn ideas(n: usize) -> Vec<Artifact> {
    (0..n)
        .map(|i| {
            Artifact::Campaign(CampaignIdea {
                title: format!("Live idea {i}"),
                summary: "summary".to_string(),
                channel: Some("instagram".to_string()),
                goal: None,
                call_to_action: None,
                content_formats: vec!["reel".to_string()],
            })
        })
        .collect()
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn save_then_get_fresh_respects_ttl(pool: sqlx::PgPool) {
    let store = PgCacheStore::new(pool);
    let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let kind = ArtifactKind::Campaigns;

    store.save(&key(), kind, ideas(3), t0).await.unwrap();

    let hit = store
        .get_fresh(&key(), kind, 3, t0 + kind.ttl() - Duration::seconds(1))
        .await
        .unwrap();
    assert_eq!(hit.unwrap().artifacts.len(), 3);

    let miss = store
        .get_fresh(&key(), kind, 1, t0 + kind.ttl() + Duration::seconds(1))
        .await
        .unwrap();
    assert!(miss.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn get_fresh_filters_on_stored_artifact_count(pool: sqlx::PgPool) {
    let store = PgCacheStore::new(pool.clone());
    let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let kind = ArtifactKind::Campaigns;

    store.save(&key(), kind, ideas(2), t0).await.unwrap();
    let (stored,): (i32,) =
        sqlx::query_as("SELECT artifact_count FROM artifact_cache_entries WHERE status = 'fresh'")
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored, 2);

    let short = store.get_fresh(&key(), kind, 3, t0).await.unwrap();
    assert!(short.is_none());

    // the column, not the decoded payload, decides the match
    sqlx::query("UPDATE artifact_cache_entries SET artifact_count = 0")
        .execute(&pool)
        .await
        .unwrap();
    let hidden = store.get_fresh(&key(), kind, 1, t0).await.unwrap();
    assert!(hidden.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn second_save_keeps_first_as_stale(pool: sqlx::PgPool) {
    let store = PgCacheStore::new(pool);
    let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let kind = ArtifactKind::Competitors;

    let first = store.save(&key(), kind, ideas(1), t0).await.unwrap();
    let second = store
        .save(&key(), kind, ideas(2), t0 + Duration::minutes(1))
        .await
        .unwrap();

    let history = store.history(&key(), kind).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.id);
    assert_eq!(history[1].id, first.id);
    assert_eq!(history[1].status, CacheStatus::Stale);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn mark_viewed_and_invalidate(pool: sqlx::PgPool) {
    let store = PgCacheStore::new(pool);
    let t0 = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let kind = ArtifactKind::Influencers;

    store.save(&key(), kind, ideas(2), t0).await.unwrap();
    assert!(store.mark_viewed(&key(), kind).await.unwrap());

    let viewed = store.get_fresh(&key(), kind, 1, t0).await.unwrap().unwrap();
    assert_eq!(viewed.status, CacheStatus::Viewed);

    assert_eq!(store.invalidate(&key(), kind).await.unwrap(), 1);
    assert!(store.get_fresh(&key(), kind, 1, t0).await.unwrap().is_none());
}
