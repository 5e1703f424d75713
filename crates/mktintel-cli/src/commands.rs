//! Subcommand handlers. Results go to stdout as JSON.

use mktintel_core::{ArtifactKind, BusinessContext, CacheEntry, Platform};
use mktintel_discovery::DiscoveryEngine;
use serde_json::json;

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn run_fingerprint(context: &BusinessContext) -> anyhow::Result<()> {
    print_json(&json!({
        "user_id": context.user_id,
        "fingerprint": mktintel_core::fingerprint(context),
    }))
}

/// Run one discovery request.
///
/// # Errors
///
/// Only output encoding can fail; provider failures are part of the result.
pub(crate) async fn run_discover(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    kind: ArtifactKind,
    limit: usize,
    force_refresh: bool,
) -> anyhow::Result<()> {
    let result = engine.discover(context, kind, limit, force_refresh).await;
    if !result.errors.is_empty() {
        tracing::warn!(
            kind = %kind,
            errors = result.errors.len(),
            "discovery finished with errors"
        );
    }
    print_json(&result)
}

pub(crate) async fn run_stream(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    kind: ArtifactKind,
    count: usize,
    force_refresh: bool,
) -> anyhow::Result<()> {
    let mut events = engine.stream(context, kind, count, force_refresh);
    while let Some(event) = events.recv().await {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

pub(crate) async fn run_invalidate(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    kind: ArtifactKind,
) -> anyhow::Result<()> {
    let demoted = engine.invalidate(context, kind).await?;
    print_json(&json!({ "kind": kind, "demoted": demoted }))
}

pub(crate) async fn run_history(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    kind: ArtifactKind,
) -> anyhow::Result<()> {
    let entries = engine.history(context, kind).await?;
    if entries.is_empty() {
        eprintln!("no {kind} entries cached for this profile; run `discover` first");
    }
    let rows: Vec<serde_json::Value> = entries.iter().map(history_row).collect();
    print_json(&rows)
}

pub(crate) async fn run_viewed(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    kind: ArtifactKind,
) -> anyhow::Result<()> {
    let marked = engine.mark_viewed(context, kind).await?;
    print_json(&json!({ "kind": kind, "marked_viewed": marked }))
}

pub(crate) async fn run_activity(
    engine: &DiscoveryEngine,
    context: &BusinessContext,
    handles: Vec<String>,
    platform: Option<Platform>,
    posts_per_handle: usize,
) -> anyhow::Result<()> {
    let handles = if handles.is_empty() {
        context.competitors.clone()
    } else {
        handles
    };
    if handles.is_empty() {
        anyhow::bail!("no handles given and the profile lists no competitors");
    }

    let report = match platform {
        Some(platform) => {
            engine
                .competitor_activity_on(platform, &handles, posts_per_handle)
                .await
        }
        None => {
            engine
                .competitor_activity(context, &handles, posts_per_handle)
                .await
        }
    };
    print_json(&report)
}

/// Summary line for one cache entry; artifacts are counted, not printed.
pub(crate) fn history_row(entry: &CacheEntry) -> serde_json::Value {
    json!({
        "id": entry.id,
        "status": entry.status,
        "artifact_count": entry.artifacts.len(),
        "generated_at": entry.generated_at,
        "expires_at": entry.expires_at,
    })
}
