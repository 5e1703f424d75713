//! Campaign idea generation.
//!
//! Ideas are generated one index at a time. Titles already produced are fed
//! back into the next prompt so the model does not repeat itself.

use std::sync::Arc;
use std::time::Duration;

use mktintel_core::{BusinessContext, CampaignIdea};
use mktintel_providers::{bounded, TextGenerator};
use serde::Deserialize;
use tokio::time::Instant;

use crate::error::DiscoveryError;
use crate::json_extract::extract_json;

const CAMPAIGN_MAX_TOKENS: u32 = 700;

#[derive(Debug, Deserialize)]
struct GeneratedIdea {
    #[serde(default, alias = "name")]
    title: String,
    #[serde(default, alias = "description")]
    summary: String,
    #[serde(default, alias = "platform")]
    channel: Option<String>,
    #[serde(default, alias = "objective")]
    goal: Option<String>,
    #[serde(default, alias = "cta")]
    call_to_action: Option<String>,
    #[serde(default, alias = "formats")]
    content_formats: Vec<String>,
}

pub struct CampaignGenerator {
    generator: Option<Arc<dyn TextGenerator>>,
    provider_timeout: Duration,
}

impl CampaignGenerator {
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, provider_timeout: Duration) -> Self {
        Self {
            generator,
            provider_timeout,
        }
    }

    /// Generate the idea at `index` of `total`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NotConfigured`] without a text generator,
    /// [`DiscoveryError::DeadlineExceeded`] when `deadline` passes first, or
    /// the provider / parsing error for this index.
    pub async fn generate(
        &self,
        context: &BusinessContext,
        index: usize,
        total: usize,
        previous_titles: &[String],
        deadline: Instant,
    ) -> Result<CampaignIdea, DiscoveryError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or(DiscoveryError::NotConfigured {
                capability: "text generation",
            })?;

        let prompt = build_prompt(context, index, total, previous_titles);
        let call = bounded(
            generator.name(),
            self.provider_timeout,
            generator.generate_text(&prompt, CAMPAIGN_MAX_TOKENS),
        );
        let text = tokio::time::timeout_at(deadline, call)
            .await
            .map_err(|_| DiscoveryError::DeadlineExceeded)??;

        let mut idea = parse_idea(&text, generator.name())?;
        if idea.goal.is_none() {
            idea.goal = goal_for(context, index).map(str::to_string);
        }
        Ok(idea)
    }
}

fn goal_for(context: &BusinessContext, index: usize) -> Option<&str> {
    if context.goals.is_empty() {
        None
    } else {
        Some(context.goals[index % context.goals.len()].as_str())
    }
}

fn build_prompt(
    context: &BusinessContext,
    index: usize,
    total: usize,
    previous_titles: &[String],
) -> String {
    let mut prompt = format!(
        "Create marketing campaign idea {} of {total} for {} (industry: {}).",
        index + 1,
        context.company_name,
        context.industry_or_empty()
    );
    if let Some(niche) = context.niche.as_deref() {
        prompt.push_str(&format!(" Niche: {niche}."));
    }
    if let Some(audience) = context.target_audience.as_deref() {
        prompt.push_str(&format!(" Target audience: {audience}."));
    }
    if let Some(voice) = context.brand_voice.as_deref() {
        prompt.push_str(&format!(" Brand voice: {voice}."));
    }
    if let Some(location) = context.location_label() {
        prompt.push_str(&format!(" Location: {location}."));
    }
    if let Some(goal) = goal_for(context, index) {
        prompt.push_str(&format!(" This campaign should serve the goal: {goal}."));
    }
    if !previous_titles.is_empty() {
        prompt.push_str(&format!(
            " Do not repeat these existing ideas: {}.",
            previous_titles.join("; ")
        ));
    }
    prompt.push_str(
        " Reply with a JSON object with keys: title, summary, channel, goal, \
         call_to_action, content_formats (array of strings).",
    );
    prompt
}

/// Parse one generated campaign idea.
///
/// # Errors
///
/// Returns [`DiscoveryError::MalformedResponse`] when no JSON object with a
/// non-empty title and summary can be recovered.
pub fn parse_idea(text: &str, provider: &str) -> Result<CampaignIdea, DiscoveryError> {
    let value = extract_json(text)
        .ok_or_else(|| DiscoveryError::malformed(provider, "no JSON in generated text"))?;
    // a single-element array is tolerated
    let value = match value {
        serde_json::Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    let idea: GeneratedIdea = serde_json::from_value(value)
        .map_err(|e| DiscoveryError::malformed(provider, e.to_string()))?;

    let title = idea.title.trim();
    let summary = idea.summary.trim();
    if title.is_empty() || summary.is_empty() {
        return Err(DiscoveryError::malformed(
            provider,
            "campaign idea without title or summary",
        ));
    }

    let non_blank = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    Ok(CampaignIdea {
        title: title.to_string(),
        summary: summary.to_string(),
        channel: non_blank(idea.channel),
        goal: non_blank(idea.goal),
        call_to_action: non_blank(idea.call_to_action),
        content_formats: idea
            .content_formats
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect(),
    })
}
