//! Per-dimension provider fallback.
//!
//! Each dimension walks the tier chain scrape → web search → synthesis and
//! stops at the first tier that yields at least one candidate. The walk is a
//! small explicit state machine ([`transition`]) so the ordering rules can be
//! tested without any providers. Dimensions run concurrently and never fail
//! the request: an exhausted dimension contributes no candidates and exactly
//! one error message.

use std::time::Duration;

use futures::future::join_all;
use mktintel_core::{BusinessContext, Candidate};
use mktintel_providers::bounded;
use tokio::time::Instant;

use crate::config::ProviderSet;
use crate::error::DiscoveryError;
use crate::planner::Dimension;
use crate::synthesis;
use crate::web::candidates_from_results;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Scrape,
    WebSearch,
    Synthesis,
}

impl Tier {
    pub const CHAIN: [Tier; 3] = [Tier::Scrape, Tier::WebSearch, Tier::Synthesis];

    #[must_use]
    pub fn next(self) -> Option<Tier> {
        match self {
            Tier::Scrape => Some(Tier::WebSearch),
            Tier::WebSearch => Some(Tier::Synthesis),
            Tier::Synthesis => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Scrape => "scrape",
            Tier::WebSearch => "web_search",
            Tier::Synthesis => "synthesis",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimensionState {
    Pending,
    Trying(Tier),
    Succeeded(Tier),
    Exhausted,
}

impl DimensionState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DimensionState::Succeeded(_) | DimensionState::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierEvent {
    Start,
    /// The current tier produced at least one candidate.
    Found,
    /// The current tier errored, timed out, was not configured or found nothing.
    Failed,
}

/// Pure transition function of the fallback state machine.
#[must_use]
pub fn transition(state: DimensionState, event: TierEvent) -> DimensionState {
    match (state, event) {
        (DimensionState::Pending, TierEvent::Start) => DimensionState::Trying(Tier::Scrape),
        (DimensionState::Trying(tier), TierEvent::Found) => DimensionState::Succeeded(tier),
        (DimensionState::Trying(tier), TierEvent::Failed) => {
            tier.next().map_or(DimensionState::Exhausted, DimensionState::Trying)
        }
        (state, _) => state,
    }
}

/// Result of running one dimension to a terminal state.
#[derive(Debug, Clone)]
pub struct DimensionOutcome {
    pub dimension: Dimension,
    pub state: DimensionState,
    pub candidates: Vec<Candidate>,
    /// `(tier, reason)` for every tier that failed, in order.
    pub failures: Vec<(Tier, String)>,
}

impl DimensionOutcome {
    /// The single error message an exhausted dimension contributes.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        if self.state != DimensionState::Exhausted {
            return None;
        }
        let detail = if self.failures.is_empty() {
            DiscoveryError::DeadlineExceeded.to_string()
        } else {
            self.failures
                .iter()
                .map(|(tier, reason)| format!("{tier}: {reason}"))
                .collect::<Vec<_>>()
                .join("; ")
        };
        Some(format!(
            "{}: all providers failed ({detail})",
            self.dimension.label()
        ))
    }
}

/// Runs dimensions against a [`ProviderSet`].
pub struct FallbackOrchestrator<'a> {
    providers: &'a ProviderSet,
    provider_timeout: Duration,
}

impl<'a> FallbackOrchestrator<'a> {
    #[must_use]
    pub fn new(providers: &'a ProviderSet, provider_timeout: Duration) -> Self {
        Self {
            providers,
            provider_timeout,
        }
    }

    /// Run every dimension concurrently, each bounded by `deadline`.
    ///
    /// Outcomes are returned in `dimensions` order regardless of completion
    /// order. A dimension still running at the deadline is reported exhausted.
    pub async fn run_all(
        &self,
        context: &BusinessContext,
        dimensions: Vec<Dimension>,
        limit: usize,
        deadline: Instant,
    ) -> Vec<DimensionOutcome> {
        let tasks = dimensions.into_iter().map(|dimension| async move {
            let fallback = dimension.clone();
            match tokio::time::timeout_at(deadline, self.run_dimension(context, dimension, limit))
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::warn!(
                        dimension = %fallback.label(),
                        "request deadline reached before dimension finished"
                    );
                    DimensionOutcome {
                        dimension: fallback,
                        state: DimensionState::Exhausted,
                        candidates: Vec::new(),
                        failures: Vec::new(),
                    }
                }
            }
        });
        join_all(tasks).await
    }

    /// Walk the tier chain for one dimension.
    pub async fn run_dimension(
        &self,
        context: &BusinessContext,
        dimension: Dimension,
        limit: usize,
    ) -> DimensionOutcome {
        let label = dimension.label();
        let mut state = transition(DimensionState::Pending, TierEvent::Start);
        let mut failures = Vec::new();
        let mut candidates = Vec::new();

        while let DimensionState::Trying(tier) = state {
            match self.run_tier(tier, context, &dimension, limit).await {
                Ok(found) if !found.is_empty() => {
                    tracing::debug!(
                        dimension = %label,
                        tier = %tier,
                        count = found.len(),
                        "tier produced candidates"
                    );
                    candidates = found
                        .into_iter()
                        .map(|mut c| {
                            c.provenance.tier = tier.as_str().to_string();
                            c.provenance.dimension.clone_from(&label);
                            c
                        })
                        .collect();
                    state = transition(state, TierEvent::Found);
                }
                Ok(_) => {
                    tracing::debug!(dimension = %label, tier = %tier, "tier returned no candidates");
                    failures.push((tier, "no candidates".to_string()));
                    state = transition(state, TierEvent::Failed);
                }
                Err(e) => {
                    tracing::warn!(dimension = %label, tier = %tier, error = %e, "tier failed");
                    failures.push((tier, e.to_string()));
                    state = transition(state, TierEvent::Failed);
                }
            }
        }

        DimensionOutcome {
            dimension,
            state,
            candidates,
            failures,
        }
    }

    async fn run_tier(
        &self,
        tier: Tier,
        context: &BusinessContext,
        dimension: &Dimension,
        limit: usize,
    ) -> Result<Vec<Candidate>, DiscoveryError> {
        match tier {
            Tier::Scrape => {
                let provider = self
                    .providers
                    .profiles
                    .as_ref()
                    .ok_or(DiscoveryError::NotConfigured {
                        capability: "profile discovery",
                    })?;
                let found = bounded(
                    provider.name(),
                    self.provider_timeout,
                    provider.discover_profiles(&dimension.keyword, dimension.platform, limit),
                )
                .await?;
                Ok(found)
            }
            Tier::WebSearch => {
                let provider = self
                    .providers
                    .search
                    .as_ref()
                    .ok_or(DiscoveryError::NotConfigured {
                        capability: "web search",
                    })?;
                let query = dimension.web_query(context.location_label().as_deref());
                let results = bounded(
                    provider.name(),
                    self.provider_timeout,
                    provider.search_web(&query, limit),
                )
                .await?;
                let mut found = candidates_from_results(&results, dimension.platform, provider.name());
                found.truncate(limit);
                Ok(found)
            }
            Tier::Synthesis => {
                let provider = self
                    .providers
                    .generator
                    .as_ref()
                    .ok_or(DiscoveryError::NotConfigured {
                        capability: "text generation",
                    })?;
                let prompt = synthesis::build_prompt(context, dimension, limit);
                let text = bounded(
                    provider.name(),
                    self.provider_timeout,
                    provider.generate_text(&prompt, synthesis::SYNTHESIS_MAX_TOKENS),
                )
                .await?;
                synthesis::parse_candidates(&text, dimension, provider.name(), limit)
            }
        }
    }
}
