//! Provider adapters: one capability trait per external source kind, plus
//! HTTP-backed implementations.
//!
//! Adapters never retry. Every call is time-bounded and returns an explicit
//! `Result` so callers can tell "empty" from "failed" without peeking inside.

pub mod apify;
pub mod error;
pub mod openai;
pub mod tavily;
pub mod timeout;
pub mod traits;

mod http;

pub use apify::ApifyClient;
pub use error::ProviderError;
pub use openai::OpenAiClient;
pub use tavily::TavilyClient;
pub use timeout::bounded;
pub use traits::{PostFetcher, ProfileDiscovery, TextGenerator, WebSearch};
