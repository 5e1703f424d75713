//! Last-resort tier: ask the text generator to propose candidates.

use mktintel_core::{ArtifactKind, BusinessContext, Candidate, Platform, Provenance};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DiscoveryError;
use crate::json_extract::extract_json;
use crate::planner::Dimension;

/// Token budget for one synthesis call.
pub(crate) const SYNTHESIS_MAX_TOKENS: u32 = 1_200;

#[derive(Debug, Deserialize)]
struct SynthesizedCandidate {
    #[serde(alias = "handle", alias = "username", alias = "domain")]
    identifier: Option<String>,
    #[serde(alias = "name")]
    display_name: Option<String>,
    #[serde(default)]
    platform: Option<String>,
    #[serde(default, alias = "description")]
    bio: Option<String>,
    #[serde(default, alias = "follower_count", alias = "audience_size")]
    followers: Option<f64>,
    #[serde(default)]
    engagement_rate: Option<f64>,
    #[serde(default, alias = "url")]
    profile_url: Option<String>,
}

pub(crate) fn build_prompt(context: &BusinessContext, dimension: &Dimension, limit: usize) -> String {
    let subject = match dimension.kind {
        ArtifactKind::Influencers => format!(
            "{limit} {} influencers who create content about \"{}\"",
            dimension.platform, dimension.keyword
        ),
        _ => match &dimension.competitor {
            Some(name) => format!("the {} presence of the competitor \"{name}\"", dimension.platform),
            None => format!(
                "{limit} competing businesses in \"{}\" active on {}",
                dimension.keyword, dimension.platform
            ),
        },
    };

    let mut prompt = format!(
        "Suggest {subject} relevant to {} ({}).",
        context.company_name,
        context.industry_or_empty()
    );
    if let Some(audience) = context.target_audience.as_deref() {
        prompt.push_str(&format!(" Their target audience: {audience}."));
    }
    if let Some(location) = context.location_label() {
        prompt.push_str(&format!(" Prefer accounts relevant to {location}."));
    }
    prompt.push_str(
        " Reply with a JSON array of objects with keys: handle, display_name, platform, \
         bio, followers, engagement_rate, profile_url. Only include real, verifiable accounts.",
    );
    prompt
}

/// Parse generated text into candidates for `dimension`.
///
/// # Errors
///
/// Returns [`DiscoveryError::MalformedResponse`] when no JSON array of
/// candidates can be recovered from the text.
pub(crate) fn parse_candidates(
    text: &str,
    dimension: &Dimension,
    provider: &str,
    limit: usize,
) -> Result<Vec<Candidate>, DiscoveryError> {
    let value = extract_json(text)
        .ok_or_else(|| DiscoveryError::malformed(provider, "no JSON in generated text"))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => ["candidates", "influencers", "competitors", "results"]
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .ok_or_else(|| DiscoveryError::malformed(provider, "object without a candidate list"))?,
        _ => return Err(DiscoveryError::malformed(provider, "expected a JSON array")),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SynthesizedCandidate>(item).ok())
        .filter_map(|item| into_candidate(item, dimension, provider))
        .take(limit)
        .collect())
}

fn into_candidate(
    item: SynthesizedCandidate,
    dimension: &Dimension,
    provider: &str,
) -> Option<Candidate> {
    let identifier = item
        .identifier
        .map(|i| i.trim().trim_start_matches('@').to_string())
        .filter(|i| !i.is_empty())?;

    // a mismatched platform label is ignored rather than trusted
    let platform = item
        .platform
        .as_deref()
        .and_then(|p| p.parse::<Platform>().ok())
        .filter(|p| *p == dimension.platform)
        .unwrap_or(dimension.platform);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let followers = item
        .followers
        .filter(|f| f.is_finite() && *f > 0.0)
        .map_or(0, |f| f as u64);

    Some(Candidate {
        platform,
        display_name: item
            .display_name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| identifier.clone()),
        identifier,
        bio: item.bio.filter(|b| !b.trim().is_empty()),
        followers,
        engagement_rate: item.engagement_rate.filter(|r| r.is_finite() && *r >= 0.0),
        verified: false,
        profile_url: item.profile_url,
        provenance: Provenance {
            provider: provider.to_string(),
            tier: String::new(),
            dimension: String::new(),
        },
    })
}
