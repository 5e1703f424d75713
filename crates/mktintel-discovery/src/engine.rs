//! Request-level orchestration: cache lookup, discovery, scoring, persistence
//! and streaming.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use mktintel_core::{
    fingerprint, Artifact, ArtifactKind, BusinessContext, CacheEntry, Candidate, KeywordTable,
    Platform, ScoredCandidate,
};
use mktintel_db::{CacheKey, CacheStore};
use mktintel_providers::bounded;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::activity::{self, ActivityReport};
use crate::campaigns::CampaignGenerator;
use crate::config::{EngineSettings, ProviderSet};
use crate::error::DiscoveryError;
use crate::fallback::FallbackOrchestrator;
use crate::merge::merge;
use crate::planner::plan_dimensions;
use crate::scorer::RelevanceScorer;
use crate::stream::{self as emit, StreamEmitter, StreamEvent, STREAM_CHANNEL_CAPACITY};

/// Outcome of [`DiscoveryEngine::discover`].
#[derive(Debug, Clone, Serialize)]
pub struct DiscoverResult {
    pub artifacts: Vec<Artifact>,
    /// Whether the artifacts were served from the cache.
    pub cached: bool,
    /// Non-fatal failures collected while generating.
    pub errors: Vec<String>,
    pub fingerprint: String,
}

/// Entry point for all discovery and caching operations.
///
/// Cloning is cheap; clones share providers and the cache store.
#[derive(Clone)]
pub struct DiscoveryEngine {
    providers: ProviderSet,
    cache: Arc<dyn CacheStore>,
    keywords: Arc<KeywordTable>,
    settings: EngineSettings,
}

impl DiscoveryEngine {
    #[must_use]
    pub fn new(
        providers: ProviderSet,
        cache: Arc<dyn CacheStore>,
        keywords: KeywordTable,
        settings: EngineSettings,
    ) -> Self {
        Self {
            providers,
            cache,
            keywords: Arc::new(keywords),
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Cache fingerprint of `context`.
    #[must_use]
    pub fn fingerprint(&self, context: &BusinessContext) -> String {
        fingerprint(context)
    }

    fn scorer(&self) -> RelevanceScorer {
        RelevanceScorer::new(
            self.providers.generator.clone(),
            Arc::clone(&self.keywords),
            self.settings.provider_timeout,
            self.settings.scoring_concurrency,
        )
    }

    fn campaign_generator(&self) -> CampaignGenerator {
        CampaignGenerator::new(
            self.providers.generator.clone(),
            self.settings.provider_timeout,
        )
    }

    fn deadline(&self) -> Instant {
        Instant::now() + self.settings.request_deadline
    }

    /// Return up to `limit` artifacts of `kind` for `context`.
    ///
    /// Serves a current cache entry holding at least `limit` artifacts when
    /// one exists (unless `force_refresh`), otherwise generates, persists and
    /// returns a new set. Provider failures never fail the call; they are
    /// reported in [`DiscoverResult::errors`].
    pub async fn discover(
        &self,
        context: &BusinessContext,
        kind: ArtifactKind,
        limit: usize,
        force_refresh: bool,
    ) -> DiscoverResult {
        let key = CacheKey::for_context(context);
        let fingerprint = key.fingerprint.clone();

        if limit == 0 {
            return DiscoverResult {
                artifacts: Vec::new(),
                cached: false,
                errors: Vec::new(),
                fingerprint,
            };
        }

        if let Some(entry) = self.cached_entry(&key, kind, limit, force_refresh).await {
            let mut artifacts = entry.artifacts;
            artifacts.truncate(limit);
            tracing::info!(
                key = %key,
                kind = %kind,
                count = artifacts.len(),
                "serving cached artifacts"
            );
            return DiscoverResult {
                artifacts,
                cached: true,
                errors: Vec::new(),
                fingerprint,
            };
        }

        let deadline = self.deadline();
        let (artifacts, errors) = match kind {
            ArtifactKind::Campaigns => self.generate_campaigns(context, limit, deadline).await,
            ArtifactKind::Competitors | ArtifactKind::Influencers => {
                let (candidates, errors) = self.discover_candidates(context, kind, limit, deadline).await;
                let scored = self
                    .scorer()
                    .score_all(candidates, context, kind, deadline)
                    .await;
                (rank(scored), errors)
            }
        };

        if artifacts.is_empty() {
            tracing::info!(
                key = %key,
                kind = %kind,
                errors = errors.len(),
                "{}",
                DiscoveryError::NoCandidatesFound { kind }
            );
        } else {
            self.persist(&key, kind, artifacts.clone()).await;
        }

        tracing::info!(
            key = %key,
            kind = %kind,
            count = artifacts.len(),
            errors = errors.len(),
            "discovery finished"
        );
        DiscoverResult {
            artifacts,
            cached: false,
            errors,
            fingerprint,
        }
    }

    /// Stream up to `count` artifacts of `kind`.
    ///
    /// The work runs on a spawned task and stops as soon as the returned
    /// receiver is dropped.
    #[must_use]
    pub fn stream(
        &self,
        context: &BusinessContext,
        kind: ArtifactKind,
        count: usize,
        force_refresh: bool,
    ) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(STREAM_CHANNEL_CAPACITY);
        let engine = self.clone();
        let context = context.clone();
        tokio::spawn(async move {
            engine
                .run_stream(&context, kind, count, force_refresh, StreamEmitter::new(tx))
                .await;
        });
        rx
    }

    async fn run_stream(
        &self,
        context: &BusinessContext,
        kind: ArtifactKind,
        count: usize,
        force_refresh: bool,
        mut emitter: StreamEmitter,
    ) {
        let key = CacheKey::for_context(context);
        let deadline = self.deadline();

        if count > 0 {
            if let Some(entry) = self.cached_entry(&key, kind, count, force_refresh).await {
                let mut artifacts = entry.artifacts;
                artifacts.truncate(count);
                emit::replay(emitter, artifacts, self.settings.stream_pacing, deadline).await;
                return;
            }
        }

        let delivered = match kind {
            ArtifactKind::Campaigns => {
                self.stream_campaigns(context, count, deadline, &mut emitter)
                    .await
            }
            ArtifactKind::Competitors | ArtifactKind::Influencers => {
                self.stream_candidates(context, kind, count, deadline, &mut emitter)
                    .await
            }
        };

        let Some(artifacts) = delivered else {
            // receiver dropped mid-stream
            return;
        };
        if !artifacts.is_empty() {
            self.persist(&key, kind, artifacts).await;
        }
        emitter.complete().await;
    }

    /// Returns the generated artifacts, or `None` if the receiver went away.
    async fn stream_campaigns(
        &self,
        context: &BusinessContext,
        count: usize,
        deadline: Instant,
        emitter: &mut StreamEmitter,
    ) -> Option<Vec<Artifact>> {
        if !emitter.start(count).await {
            return None;
        }
        let generator = self.campaign_generator();
        let mut titles: Vec<String> = Vec::new();
        let mut artifacts = Vec::new();

        for index in 0..count {
            let sent = match generator
                .generate(context, index, count, &titles, deadline)
                .await
            {
                Ok(idea) => {
                    titles.push(idea.title.clone());
                    let artifact = Artifact::Campaign(idea);
                    artifacts.push(artifact.clone());
                    emitter.item(index, artifact).await
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "campaign idea generation failed");
                    emitter.item_error(index, e.to_string()).await
                }
            };
            if !sent {
                return None;
            }
        }
        Some(artifacts)
    }

    async fn stream_candidates(
        &self,
        context: &BusinessContext,
        kind: ArtifactKind,
        count: usize,
        deadline: Instant,
        emitter: &mut StreamEmitter,
    ) -> Option<Vec<Artifact>> {
        let (candidates, errors) = self.discover_candidates(context, kind, count, deadline).await;
        for error in &errors {
            tracing::warn!(kind = %kind, error = %error, "dimension exhausted");
        }
        if !emitter.start(candidates.len()).await {
            return None;
        }

        // Items go out in index order as soon as each score is ready; the
        // cached copy is ranked like a `discover` result.
        let scorer = self.scorer();
        let scorer = &scorer;
        let mut pending = stream::iter(candidates.into_iter().enumerate())
            .map(|(index, candidate)| async move {
                let relevance = match tokio::time::timeout_at(
                    deadline,
                    scorer.score(&candidate, context, kind),
                )
                .await
                {
                    Ok(score) => score,
                    Err(_) => scorer.heuristic(&candidate, context),
                };
                (index, ScoredCandidate { candidate, relevance })
            })
            .buffered(self.settings.scoring_concurrency.max(1));

        let mut scored = Vec::new();
        while let Some((index, item)) = pending.next().await {
            if !emitter.item(index, Artifact::Candidate(item.clone())).await {
                return None;
            }
            scored.push(item);
        }
        Some(rank(scored))
    }

    /// Invalidate current entries for a context or an explicit key.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Cache`] if the store fails.
    pub async fn invalidate(
        &self,
        target: impl Into<CacheKey>,
        kind: ArtifactKind,
    ) -> Result<u64, DiscoveryError> {
        let key = target.into();
        let demoted = self.cache.invalidate(&key, kind).await?;
        tracing::info!(key = %key, kind = %kind, demoted, "cache invalidated");
        Ok(demoted)
    }

    /// All entries ever generated for a key, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Cache`] if the store fails.
    pub async fn history(
        &self,
        target: impl Into<CacheKey>,
        kind: ArtifactKind,
    ) -> Result<Vec<CacheEntry>, DiscoveryError> {
        Ok(self.cache.history(&target.into(), kind).await?)
    }

    /// Record that the user has seen the current entry.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Cache`] if the store fails.
    pub async fn mark_viewed(
        &self,
        target: impl Into<CacheKey>,
        kind: ArtifactKind,
    ) -> Result<bool, DiscoveryError> {
        Ok(self.cache.mark_viewed(&target.into(), kind).await?)
    }

    /// Summarise recent posts of known competitor handles on the industry's
    /// primary platform.
    pub async fn competitor_activity(
        &self,
        context: &BusinessContext,
        handles: &[String],
        posts_per_handle: usize,
    ) -> ActivityReport {
        let platform = self
            .keywords
            .lookup(context.industry_or_empty())
            .platforms
            .first()
            .copied()
            .unwrap_or(Platform::Instagram);
        self.competitor_activity_on(platform, handles, posts_per_handle)
            .await
    }

    /// [`Self::competitor_activity`] with an explicit platform.
    pub async fn competitor_activity_on(
        &self,
        platform: Platform,
        handles: &[String],
        posts_per_handle: usize,
    ) -> ActivityReport {
        let handles = activity::unique_handles(handles);
        let mut errors = Vec::new();

        let posts = match self.providers.posts.as_ref() {
            None => {
                errors.push(
                    DiscoveryError::NotConfigured {
                        capability: "post fetching",
                    }
                    .to_string(),
                );
                Vec::new()
            }
            Some(_) if handles.is_empty() => Vec::new(),
            Some(provider) => {
                let call = bounded(
                    provider.name(),
                    self.settings.provider_timeout,
                    provider.fetch_recent_posts(platform, &handles, posts_per_handle),
                );
                match tokio::time::timeout_at(self.deadline(), call).await {
                    Ok(Ok(posts)) => posts,
                    Ok(Err(e)) => {
                        tracing::warn!(platform = %platform, error = %e, "post fetch failed");
                        errors.push(DiscoveryError::from(e).to_string());
                        Vec::new()
                    }
                    Err(_) => {
                        errors.push(DiscoveryError::DeadlineExceeded.to_string());
                        Vec::new()
                    }
                }
            }
        };

        ActivityReport {
            platform,
            handles: activity::summarise(&handles, posts, posts_per_handle),
            errors,
        }
    }

    async fn cached_entry(
        &self,
        key: &CacheKey,
        kind: ArtifactKind,
        min_count: usize,
        force_refresh: bool,
    ) -> Option<CacheEntry> {
        if force_refresh {
            if let Err(e) = self.cache.invalidate(key, kind).await {
                tracing::warn!(key = %key, kind = %kind, error = %e, "cache invalidation failed");
            }
            return None;
        }
        match self.cache.get_fresh(key, kind, min_count, Utc::now()).await {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %key, kind = %kind, error = %e, "cache lookup failed");
                None
            }
        }
    }

    async fn persist(&self, key: &CacheKey, kind: ArtifactKind, artifacts: Vec<Artifact>) {
        if let Err(e) = self.cache.save(key, kind, artifacts, Utc::now()).await {
            tracing::warn!(key = %key, kind = %kind, error = %e, "cache save failed");
        }
    }

    async fn discover_candidates(
        &self,
        context: &BusinessContext,
        kind: ArtifactKind,
        limit: usize,
        deadline: Instant,
    ) -> (Vec<Candidate>, Vec<String>) {
        let dimensions = plan_dimensions(context, kind, &self.keywords);
        tracing::debug!(
            fingerprint = %fingerprint(context),
            kind = %kind,
            dimensions = dimensions.len(),
            "running discovery"
        );

        let outcomes = FallbackOrchestrator::new(&self.providers, self.settings.provider_timeout)
            .run_all(context, dimensions, limit, deadline)
            .await;

        let errors = outcomes
            .iter()
            .filter_map(crate::fallback::DimensionOutcome::error_message)
            .collect();
        let candidates = merge(outcomes.into_iter().map(|o| o.candidates), limit);
        (candidates, errors)
    }

    async fn generate_campaigns(
        &self,
        context: &BusinessContext,
        count: usize,
        deadline: Instant,
    ) -> (Vec<Artifact>, Vec<String>) {
        let generator = self.campaign_generator();
        let mut titles = Vec::new();
        let mut artifacts = Vec::new();
        let mut errors = Vec::new();

        for index in 0..count {
            match generator
                .generate(context, index, count, &titles, deadline)
                .await
            {
                Ok(idea) => {
                    titles.push(idea.title.clone());
                    artifacts.push(Artifact::Campaign(idea));
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "campaign idea generation failed");
                    errors.push(format!("idea {index}: {e}"));
                }
            }
        }
        (artifacts, errors)
    }
}

/// Order scored candidates by relevance, highest first. Ties keep the
/// audience-size order produced by the merge.
fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<Artifact> {
    scored.sort_by(|a, b| b.relevance.score.cmp(&a.relevance.score));
    scored.into_iter().map(Artifact::Candidate).collect()
}
