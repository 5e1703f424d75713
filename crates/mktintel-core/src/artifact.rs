use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::candidate::Candidate;
use crate::score::RelevanceScore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Competitors,
    Influencers,
    Campaigns,
}

impl ArtifactKind {
    /// Freshness window for entries of this kind.
    #[must_use]
    pub fn ttl(self) -> Duration {
        match self {
            ArtifactKind::Campaigns => Duration::hours(24),
            ArtifactKind::Competitors | ArtifactKind::Influencers => Duration::hours(6),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Competitors => "competitors",
            ArtifactKind::Influencers => "influencers",
            ArtifactKind::Campaigns => "campaigns",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "competitors" => Ok(ArtifactKind::Competitors),
            "influencers" => Ok(ArtifactKind::Influencers),
            "campaigns" => Ok(ArtifactKind::Campaigns),
            other => Err(format!("unknown artifact kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Fresh,
    Viewed,
    Stale,
}

impl CacheStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Fresh => "fresh",
            CacheStatus::Viewed => "viewed",
            CacheStatus::Stale => "stale",
        }
    }

    /// Fresh and viewed entries are both served; stale ones are history only.
    #[must_use]
    pub fn is_current(self) -> bool {
        matches!(self, CacheStatus::Fresh | CacheStatus::Viewed)
    }
}

impl std::str::FromStr for CacheStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fresh" => Ok(CacheStatus::Fresh),
            "viewed" => Ok(CacheStatus::Viewed),
            "stale" => Ok(CacheStatus::Stale),
            other => Err(format!("unknown cache status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub relevance: RelevanceScore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignIdea {
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub content_formats: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Candidate(ScoredCandidate),
    Campaign(CampaignIdea),
}

impl Artifact {
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Artifact::Candidate(scored) => &scored.candidate.display_name,
            Artifact::Campaign(idea) => &idea.title,
        }
    }
}

/// One generation of artifacts for a fingerprint and kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub id: Uuid,
    pub partition: String,
    pub fingerprint: String,
    pub kind: ArtifactKind,
    pub artifacts: Vec<Artifact>,
    pub generated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub status: CacheStatus,
}

impl CacheEntry {
    /// Create a new `fresh` entry generated at `now`.
    #[must_use]
    pub fn new_fresh(
        partition: &str,
        fingerprint: &str,
        kind: ArtifactKind,
        artifacts: Vec<Artifact>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            partition: partition.to_string(),
            fingerprint: fingerprint.to_string(),
            kind,
            artifacts,
            generated_at: now,
            expires_at: now + kind.ttl(),
            status: CacheStatus::Fresh,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
