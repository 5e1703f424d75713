//! Shared domain types and configuration for the marketing intelligence engine.

pub mod app_config;
pub mod artifact;
pub mod candidate;
pub mod config;
pub mod context;
pub mod error;
pub mod fingerprint;
pub mod keywords;
pub mod score;

pub use app_config::{AppConfig, Environment};
pub use artifact::{Artifact, ArtifactKind, CacheEntry, CacheStatus, CampaignIdea, ScoredCandidate};
pub use candidate::{Candidate, InfluencerTier, Platform, Post, Provenance, SearchResult};
pub use config::{load_app_config, load_app_config_from_env};
pub use context::{BusinessContext, Geography};
pub use error::ConfigError;
pub use fingerprint::fingerprint;
pub use keywords::{load_keyword_table, Affinity, IndustryProfile, KeywordTable};
pub use score::{RelevanceScore, ScoreFactor, ScoringMethod};
