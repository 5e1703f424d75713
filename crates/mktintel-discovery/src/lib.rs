//! Discovery and caching orchestration.
//!
//! [`DiscoveryEngine`] is the entry point. It fingerprints a business
//! context, serves current cache entries, and otherwise plans discovery
//! dimensions, walks each one down the provider fallback chain, merges and
//! scores the candidates, and persists the result.

pub mod activity;
pub mod campaigns;
pub mod config;
pub mod engine;
pub mod error;
pub mod fallback;
pub mod json_extract;
pub mod merge;
pub mod planner;
pub mod scorer;
pub mod stream;
pub mod web;

mod synthesis;

pub use activity::{ActivityReport, HandleActivity};
pub use config::{EngineSettings, ProviderSet};
pub use engine::{DiscoverResult, DiscoveryEngine};
pub use error::DiscoveryError;
pub use fallback::{DimensionOutcome, DimensionState, FallbackOrchestrator, Tier};
pub use planner::{plan_dimensions, Dimension};
pub use scorer::RelevanceScorer;
pub use stream::{StreamEmitter, StreamEvent};
