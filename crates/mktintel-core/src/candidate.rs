use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Tiktok,
    Youtube,
    Twitter,
    Linkedin,
    Facebook,
    /// Companies found on the open web rather than a social network.
    Web,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Instagram,
        Platform::Tiktok,
        Platform::Youtube,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Facebook,
        Platform::Web,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
            Platform::Twitter => "twitter",
            Platform::Linkedin => "linkedin",
            Platform::Facebook => "facebook",
            Platform::Web => "web",
        }
    }

    /// Hostnames whose profile URLs belong to this platform.
    #[must_use]
    pub fn hosts(self) -> &'static [&'static str] {
        match self {
            Platform::Instagram => &["instagram.com"],
            Platform::Tiktok => &["tiktok.com"],
            Platform::Youtube => &["youtube.com"],
            Platform::Twitter => &["twitter.com", "x.com"],
            Platform::Linkedin => &["linkedin.com"],
            Platform::Facebook => &["facebook.com"],
            Platform::Web => &[],
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" => Ok(Platform::Instagram),
            "tiktok" => Ok(Platform::Tiktok),
            "youtube" => Ok(Platform::Youtube),
            "twitter" | "x" => Ok(Platform::Twitter),
            "linkedin" => Ok(Platform::Linkedin),
            "facebook" => Ok(Platform::Facebook),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform '{other}'")),
        }
    }
}

/// Audience-size band used when judging value for investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfluencerTier {
    Nano,
    Micro,
    Mid,
    Macro,
    Mega,
}

impl InfluencerTier {
    #[must_use]
    pub fn from_followers(followers: u64) -> Self {
        match followers {
            0..=9_999 => InfluencerTier::Nano,
            10_000..=99_999 => InfluencerTier::Micro,
            100_000..=499_999 => InfluencerTier::Mid,
            500_000..=999_999 => InfluencerTier::Macro,
            _ => InfluencerTier::Mega,
        }
    }
}

/// Which provider, fallback tier and query dimension produced a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: String,
    pub tier: String,
    pub dimension: String,
}

/// A discovered competitor or influencer before scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub platform: Platform,
    /// Handle, username or domain as reported by the source.
    pub identifier: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub followers: u64,
    /// Engagement rate in percent (e.g. `3.2` for 3.2 %).
    #[serde(default)]
    pub engagement_rate: Option<f64>,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub profile_url: Option<String>,
    pub provenance: Provenance,
}

impl Candidate {
    /// Dedup key: platform plus the case-normalized identifier without a leading `@`.
    #[must_use]
    pub fn dedup_key(&self) -> (Platform, String) {
        (
            self.platform,
            self.identifier.trim().trim_start_matches('@').to_lowercase(),
        )
    }

    #[must_use]
    pub fn tier(&self) -> InfluencerTier {
        InfluencerTier::from_followers(self.followers)
    }
}

/// A recent post by a tracked account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub platform: Platform,
    pub handle: String,
    pub post_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}
