//! Relevance scoring for discovered candidates.
//!
//! The generation provider is asked for per-factor scores first. Any failure
//! (no provider, timeout, error, unparseable or incomplete payload) falls
//! back to a deterministic heuristic, so every candidate always gets a score.
//! The two paths are never blended.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use mktintel_core::{
    Affinity, ArtifactKind, BusinessContext, Candidate, InfluencerTier, KeywordTable,
    RelevanceScore, ScoredCandidate, ScoringMethod,
};
use mktintel_providers::{bounded, TextGenerator};
use serde_json::Value;
use tokio::time::Instant;

use crate::json_extract::extract_json;

pub const ENGAGEMENT_QUALITY: &str = "engagement_quality";
pub const REACH_POTENTIAL: &str = "reach_potential";
pub const AUDIENCE_ALIGNMENT: &str = "audience_alignment";
pub const CONTENT_RELEVANCE: &str = "content_relevance";
pub const VALUE_FOR_INVESTMENT: &str = "value_for_investment";

/// Named factors and their maxima. The maxima sum to 100.
pub const FACTORS: [(&str, f64); 5] = [
    (ENGAGEMENT_QUALITY, 25.0),
    (REACH_POTENTIAL, 20.0),
    (AUDIENCE_ALIGNMENT, 25.0),
    (CONTENT_RELEVANCE, 20.0),
    (VALUE_FOR_INVESTMENT, 10.0),
];

const SCORING_MAX_TOKENS: u32 = 400;

/// Engagement rate (percent) at which the engagement factor maxes out.
const STRONG_ENGAGEMENT: f64 = 6.0;
/// Above this rate engagement is more likely bought than earned.
const SUSPICIOUS_ENGAGEMENT: f64 = 20.0;

pub struct RelevanceScorer {
    generator: Option<Arc<dyn TextGenerator>>,
    table: Arc<KeywordTable>,
    provider_timeout: Duration,
    concurrency: usize,
}

impl RelevanceScorer {
    #[must_use]
    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        table: Arc<KeywordTable>,
        provider_timeout: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            generator,
            table,
            provider_timeout,
            concurrency: concurrency.max(1),
        }
    }

    #[must_use]
    pub fn heuristic(&self, candidate: &Candidate, context: &BusinessContext) -> RelevanceScore {
        heuristic_score(candidate, context, &self.table)
    }

    /// Score one candidate, AI first with heuristic fallback.
    pub async fn score(
        &self,
        candidate: &Candidate,
        context: &BusinessContext,
        kind: ArtifactKind,
    ) -> RelevanceScore {
        let Some(generator) = self.generator.as_ref() else {
            return self.heuristic(candidate, context);
        };

        let prompt = build_prompt(candidate, context, kind);
        let text = match bounded(
            generator.name(),
            self.provider_timeout,
            generator.generate_text(&prompt, SCORING_MAX_TOKENS),
        )
        .await
        {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    candidate = %candidate.identifier,
                    error = %e,
                    "AI scoring failed, using heuristic"
                );
                return self.heuristic(candidate, context);
            }
        };

        match extract_json(&text).as_ref().and_then(parse_ai_score) {
            Some(score) => score,
            None => {
                tracing::warn!(
                    candidate = %candidate.identifier,
                    "AI score payload unusable, using heuristic"
                );
                self.heuristic(candidate, context)
            }
        }
    }

    /// Score `candidates` concurrently, preserving input order.
    ///
    /// A candidate whose AI call is still pending at `deadline` is scored
    /// heuristically.
    pub async fn score_all(
        &self,
        candidates: Vec<Candidate>,
        context: &BusinessContext,
        kind: ArtifactKind,
        deadline: Instant,
    ) -> Vec<ScoredCandidate> {
        stream::iter(candidates)
            .map(|candidate| async move {
                let relevance =
                    match tokio::time::timeout_at(deadline, self.score(&candidate, context, kind))
                        .await
                    {
                        Ok(score) => score,
                        Err(_) => self.heuristic(&candidate, context),
                    };
                ScoredCandidate {
                    candidate,
                    relevance,
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}

fn build_prompt(candidate: &Candidate, context: &BusinessContext, kind: ArtifactKind) -> String {
    let role = if kind == ArtifactKind::Competitors {
        "competitor"
    } else {
        "influencer partner"
    };
    let factors = FACTORS
        .iter()
        .map(|(name, max)| format!("\"{name}\" (0-{max})"))
        .collect::<Vec<_>>()
        .join(", ");
    let engagement = candidate
        .engagement_rate
        .map_or_else(|| "unknown".to_string(), |r| format!("{r:.2}%"));

    format!(
        "Rate how relevant this {role} is for {company} (industry: {industry}; niche: {niche}; \
         audience: {audience}).\n\
         Account: {platform} @{handle} \"{name}\", {followers} followers, engagement {engagement}, \
         verified: {verified}. Bio: {bio}\n\
         Reply with JSON only: an object with numeric keys {factors} and a short \"reason\".",
        company = context.company_name,
        industry = context.industry_or_empty(),
        niche = context.niche.as_deref().unwrap_or("n/a"),
        audience = context.target_audience.as_deref().unwrap_or("n/a"),
        platform = candidate.platform,
        handle = candidate.identifier,
        name = candidate.display_name,
        followers = candidate.followers,
        verified = candidate.verified,
        bio = candidate.bio.as_deref().unwrap_or(""),
    )
}

/// Accept an AI payload only when every factor is present as a number.
///
/// Factors may sit at the top level or under a `factors` object. Values are
/// clamped into `[0, max]` and the overall score is recomputed from them; any
/// overall score the model supplied is ignored.
#[must_use]
pub fn parse_ai_score(value: &Value) -> Option<RelevanceScore> {
    let object = value.as_object()?;
    let factors = object
        .get("factors")
        .and_then(Value::as_object)
        .unwrap_or(object);

    let mut triples = Vec::with_capacity(FACTORS.len());
    for (name, max) in FACTORS {
        let achieved = factors.get(name)?.as_f64()?;
        triples.push((name, achieved, max));
    }

    let reason = object
        .get("reason")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("AI relevance assessment");

    Some(RelevanceScore::from_factors(
        &triples,
        reason,
        ScoringMethod::Ai,
    ))
}

/// Deterministic fallback score built only from candidate metadata.
#[must_use]
pub fn heuristic_score(
    candidate: &Candidate,
    context: &BusinessContext,
    table: &KeywordTable,
) -> RelevanceScore {
    let text = candidate_text(candidate);
    let audience_matches = context
        .audience_terms()
        .iter()
        .filter(|term| text.contains(term.as_str()))
        .count();

    let engagement = engagement_quality(candidate.engagement_rate);
    let reach = reach_potential(candidate.followers, candidate.verified);
    let alignment = audience_alignment(context, candidate, audience_matches);
    let relevance = content_relevance(candidate, context, table, &text);
    let value = value_for_investment(candidate.tier());

    let engagement_note = candidate
        .engagement_rate
        .map_or_else(|| "unknown engagement".to_string(), |r| format!("{r:.1}% engagement"));
    let reason = format!(
        "{tier:?} {platform} account with {followers} followers, {engagement_note}, \
         {audience_matches} audience term match(es)",
        tier = candidate.tier(),
        platform = candidate.platform,
        followers = candidate.followers,
    )
    .to_lowercase();

    RelevanceScore::from_factors(
        &[
            (ENGAGEMENT_QUALITY, engagement, 25.0),
            (REACH_POTENTIAL, reach, 20.0),
            (AUDIENCE_ALIGNMENT, alignment, 25.0),
            (CONTENT_RELEVANCE, relevance, 20.0),
            (VALUE_FOR_INVESTMENT, value, 10.0),
        ],
        reason,
        ScoringMethod::Heuristic,
    )
}

fn candidate_text(candidate: &Candidate) -> String {
    format!(
        "{} {} {}",
        candidate.identifier,
        candidate.display_name,
        candidate.bio.as_deref().unwrap_or("")
    )
    .to_lowercase()
}

fn engagement_quality(rate: Option<f64>) -> f64 {
    match rate {
        None => 10.0,
        Some(r) if !r.is_finite() || r <= 0.0 => 0.0,
        Some(r) if r > SUSPICIOUS_ENGAGEMENT => 15.0,
        Some(r) => (r.min(STRONG_ENGAGEMENT) / STRONG_ENGAGEMENT) * 25.0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn reach_potential(followers: u64, verified: bool) -> f64 {
    let base = if followers == 0 {
        0.0
    } else {
        // 1M followers reaches the cap
        ((followers as f64).log10() / 6.0 * 20.0).min(20.0)
    };
    let bonus = if verified { 2.0 } else { 0.0 };
    (base + bonus).min(20.0)
}

#[allow(clippy::cast_precision_loss)]
fn audience_alignment(context: &BusinessContext, candidate: &Candidate, matches: usize) -> f64 {
    if context.audience_terms().is_empty() {
        return 12.5;
    }
    if candidate.bio.as_deref().is_none_or(|b| b.trim().is_empty()) && matches == 0 {
        return 6.0;
    }
    5.0 + 20.0 * (matches.min(3) as f64 / 3.0)
}

fn content_relevance(
    candidate: &Candidate,
    context: &BusinessContext,
    table: &KeywordTable,
    text: &str,
) -> f64 {
    let platform_fit = match table.affinity(context.industry_or_empty(), candidate.platform) {
        Affinity::Primary => 12.0,
        Affinity::Secondary => 8.0,
        Affinity::Other => 3.0,
    };
    let keyword_hit = table
        .keywords_for(context)
        .iter()
        .any(|k| text.contains(&k.to_lowercase()));
    platform_fit + if keyword_hit { 8.0 } else { 0.0 }
}

fn value_for_investment(tier: InfluencerTier) -> f64 {
    match tier {
        InfluencerTier::Micro => 10.0,
        InfluencerTier::Mid => 8.0,
        InfluencerTier::Nano => 7.0,
        InfluencerTier::Macro => 5.0,
        InfluencerTier::Mega => 3.0,
    }
}

#[cfg(test)]
#[path = "scorer_test.rs"]
mod tests;
