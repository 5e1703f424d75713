//! Social profile and post scraping through Apify actors.
//!
//! Uses the synchronous `run-sync-get-dataset-items` endpoint so each call is
//! a single request/response. Actor output differs per platform, so dataset
//! items are decoded leniently: ordered key lists cover the common actors and
//! items without a usable handle are skipped rather than failing the batch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktintel_core::{Candidate, Platform, Post, Provenance};
use reqwest::Client;
use serde_json::{json, Map, Value};

use crate::error::ProviderError;
use crate::http::{build_client, normalise_base_url, send_json};
use crate::timeout::bounded;
use crate::traits::{PostFetcher, ProfileDiscovery};

const DEFAULT_BASE_URL: &str = "https://api.apify.com/v2";
const PROVIDER: &str = "apify";

/// Client for Apify actor runs.
///
/// Use [`ApifyClient::new`] for production or [`ApifyClient::with_base_url`]
/// to point at a mock server in tests.
pub struct ApifyClient {
    client: Client,
    token: String,
    base_url: String,
    timeout: Duration,
}

impl ApifyClient {
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn new(token: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Self::with_base_url(token, timeout, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        token: &str,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: build_client(PROVIDER, timeout)?,
            token: token.to_owned(),
            base_url: normalise_base_url(base_url),
            timeout,
        })
    }

    /// Actor that searches profiles on `platform`.
    fn profile_actor(platform: Platform) -> Option<&'static str> {
        match platform {
            Platform::Instagram => Some("apify~instagram-search-scraper"),
            Platform::Tiktok => Some("clockworks~tiktok-user-search-scraper"),
            Platform::Youtube => Some("streamers~youtube-channel-scraper"),
            Platform::Twitter => Some("apidojo~twitter-user-scraper"),
            Platform::Linkedin | Platform::Facebook | Platform::Web => None,
        }
    }

    /// Actor that returns recent posts for handles on `platform`.
    fn posts_actor(platform: Platform) -> Option<&'static str> {
        match platform {
            Platform::Instagram => Some("apify~instagram-post-scraper"),
            Platform::Tiktok => Some("clockworks~tiktok-scraper"),
            Platform::Twitter => Some("apidojo~tweet-scraper"),
            Platform::Facebook => Some("apify~facebook-posts-scraper"),
            Platform::Youtube | Platform::Linkedin | Platform::Web => None,
        }
    }

    async fn run_actor(&self, actor: &str, input: &Value) -> Result<Vec<Value>, ProviderError> {
        let url = format!("{}/acts/{actor}/run-sync-get-dataset-items", self.base_url);
        tracing::debug!(actor, "apify actor run");

        let request = self
            .client
            .post(&url)
            .query(&[("token", self.token.as_str())])
            .json(input);

        send_json::<Vec<Value>>(PROVIDER, self.timeout, request).await
    }
}

/// One dataset item. Actors disagree on field names and some emit several
/// names for the same field, so values are looked up by an ordered key list.
type Item = Map<String, Value>;

const HANDLE_KEYS: &[&str] = &["username", "handle", "uniqueId", "userName", "channelUsername"];
const DISPLAY_NAME_KEYS: &[&str] = &["fullName", "nickname", "channelName", "name"];
const BIO_KEYS: &[&str] = &["biography", "signature", "channelDescription", "description", "bio"];
const FOLLOWER_KEYS: &[&str] = &[
    "followersCount",
    "followerCount",
    "numberOfSubscribers",
    "fans",
    "followers",
];
const ENGAGEMENT_KEYS: &[&str] = &["engagementRate", "engagement_rate"];
const VERIFIED_KEYS: &[&str] = &["verified", "isVerified"];
const PROFILE_URL_KEYS: &[&str] = &["url", "profileUrl", "channelUrl"];

const POST_ID_KEYS: &[&str] = &["id", "shortCode", "postId"];
const OWNER_KEYS: &[&str] = &["ownerUsername", "author", "username"];
const POST_TEXT_KEYS: &[&str] = &["caption", "text", "title", "message"];
const POST_URL_KEYS: &[&str] = &["url", "postUrl", "webVideoUrl"];
const LIKE_KEYS: &[&str] = &["likesCount", "diggCount", "likeCount", "likes"];
const COMMENT_KEYS: &[&str] = &["commentsCount", "commentCount", "replyCount", "comments"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "createTimeISO", "createdAt", "time"];

/// First non-null value among `keys`, in key order.
fn first<'a>(item: &'a Item, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .find(|value| !value.is_null())
}

/// First non-blank string among `keys`.
fn first_str(item: &Item, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

fn first_f64(item: &Item, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| item.get(*key).and_then(Value::as_f64))
}

fn first_bool(item: &Item, keys: &[&str]) -> Option<bool> {
    keys.iter().find_map(|key| item.get(*key).and_then(Value::as_bool))
}

fn into_item(value: Value) -> Option<Item> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: Option<f64>) -> u64 {
    value
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v as u64)
}

fn profile_to_candidate(item: &Item, platform: Platform) -> Option<Candidate> {
    let identifier = first_str(item, HANDLE_KEYS)
        .map(|u| u.trim_start_matches('@').to_string())
        .filter(|u| !u.is_empty())?;

    Some(Candidate {
        platform,
        display_name: first_str(item, DISPLAY_NAME_KEYS).unwrap_or_else(|| identifier.clone()),
        identifier,
        bio: first_str(item, BIO_KEYS),
        followers: as_count(first_f64(item, FOLLOWER_KEYS)),
        engagement_rate: first_f64(item, ENGAGEMENT_KEYS).filter(|r| r.is_finite() && *r >= 0.0),
        verified: first_bool(item, VERIFIED_KEYS).unwrap_or(false),
        profile_url: first_str(item, PROFILE_URL_KEYS),
        provenance: Provenance {
            provider: PROVIDER.to_string(),
            tier: String::new(),
            dimension: String::new(),
        },
    })
}

fn post_item_to_post(item: &Item, platform: Platform, fallback_handle: &str) -> Option<Post> {
    let post_id = match first(item, POST_ID_KEYS)? {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    Some(Post {
        platform,
        handle: first_str(item, OWNER_KEYS).unwrap_or_else(|| fallback_handle.to_string()),
        post_id,
        text: first_str(item, POST_TEXT_KEYS).unwrap_or_default(),
        url: first_str(item, POST_URL_KEYS),
        likes: as_count(first_f64(item, LIKE_KEYS)),
        comments: as_count(first_f64(item, COMMENT_KEYS)),
        published_at: first_str(item, TIMESTAMP_KEYS).as_deref().and_then(parse_timestamp),
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl ProfileDiscovery for ApifyClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn discover_profiles(
        &self,
        keyword: &str,
        platform: Platform,
        limit: usize,
    ) -> Result<Vec<Candidate>, ProviderError> {
        let actor = Self::profile_actor(platform).ok_or_else(|| ProviderError::Unsupported {
            provider: PROVIDER.to_string(),
            what: format!("{platform} profile search"),
        })?;

        let input = json!({
            "search": keyword,
            "searchType": "user",
            "resultsLimit": limit,
        });

        let items = bounded(PROVIDER, self.timeout, self.run_actor(actor, &input)).await?;

        let candidates: Vec<Candidate> = items
            .into_iter()
            .filter_map(into_item)
            .filter_map(|item| profile_to_candidate(&item, platform))
            .take(limit)
            .collect();

        tracing::debug!(
            platform = %platform,
            keyword,
            count = candidates.len(),
            "apify profile search finished"
        );
        Ok(candidates)
    }
}

#[async_trait]
impl PostFetcher for ApifyClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn fetch_recent_posts(
        &self,
        platform: Platform,
        handles: &[String],
        limit: usize,
    ) -> Result<Vec<Post>, ProviderError> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }
        let actor = Self::posts_actor(platform).ok_or_else(|| ProviderError::Unsupported {
            provider: PROVIDER.to_string(),
            what: format!("{platform} post fetching"),
        })?;

        let input = json!({
            "username": handles,
            "resultsLimit": limit,
        });

        let items = bounded(PROVIDER, self.timeout, self.run_actor(actor, &input)).await?;
        let fallback_handle = if handles.len() == 1 { handles[0].as_str() } else { "" };

        Ok(items
            .into_iter()
            .filter_map(into_item)
            .filter_map(|item| post_item_to_post(&item, platform, fallback_handle))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(value: Value) -> Item {
        into_item(value).unwrap()
    }

    #[test]
    fn profile_item_accepts_tiktok_field_names() {
        let item = item(json!({
            "uniqueId": "@fitwithana",
            "nickname": "Ana",
            "signature": "Home workouts",
            "fans": 48200,
            "verified": true
        }));
        let candidate = profile_to_candidate(&item, Platform::Tiktok).unwrap();
        assert_eq!(candidate.identifier, "fitwithana");
        assert_eq!(candidate.display_name, "Ana");
        assert_eq!(candidate.followers, 48_200);
        assert!(candidate.verified);
        assert_eq!(candidate.provenance.provider, "apify");
    }

    #[test]
    fn profile_item_with_repeated_field_names_is_kept() {
        let item = item(json!({
            "uniqueId": "ana",
            "name": "Ana T",
            "fullName": "Ana Torres",
            "verified": false,
            "isVerified": true,
            "followersCount": 900,
            "followers": 12
        }));
        let candidate = profile_to_candidate(&item, Platform::Tiktok).unwrap();
        assert_eq!(candidate.identifier, "ana");
        assert_eq!(candidate.display_name, "Ana Torres");
        assert!(!candidate.verified);
        assert_eq!(candidate.followers, 900);
    }

    #[test]
    fn profile_without_handle_is_skipped() {
        let item = item(json!({ "fullName": "No Handle" }));
        assert!(profile_to_candidate(&item, Platform::Instagram).is_none());
    }

    #[test]
    fn display_name_defaults_to_handle() {
        let item = item(json!({ "username": "coach_lee", "fullName": "  " }));
        let candidate = profile_to_candidate(&item, Platform::Instagram).unwrap();
        assert_eq!(candidate.display_name, "coach_lee");
    }

    #[test]
    fn non_object_items_are_skipped() {
        assert!(into_item(json!("text")).is_none());
        assert!(into_item(json!([1, 2])).is_none());
    }

    #[test]
    fn negative_counts_become_zero() {
        assert_eq!(as_count(Some(-3.0)), 0);
        assert_eq!(as_count(Some(f64::NAN)), 0);
        assert_eq!(as_count(None), 0);
        assert_eq!(as_count(Some(1234.9)), 1234);
    }

    #[test]
    fn post_item_with_numeric_id() {
        let item = item(json!({
            "id": 998877,
            "text": "New class schedule",
            "likeCount": 12,
            "createdAt": "2025-03-01T10:00:00Z"
        }));
        let post = post_item_to_post(&item, Platform::Twitter, "ironworks").unwrap();
        assert_eq!(post.post_id, "998877");
        assert_eq!(post.handle, "ironworks");
        assert_eq!(post.likes, 12);
        assert!(post.published_at.is_some());
    }

    #[test]
    fn instagram_post_with_id_and_short_code_is_kept() {
        let item = item(json!({
            "id": "3412345678901234567",
            "shortCode": "Cx1",
            "ownerUsername": "ironworks_gym",
            "caption": "Summer challenge",
            "likesCount": 320,
            "commentsCount": 41,
            "url": "https://www.instagram.com/p/Cx1/"
        }));
        let post = post_item_to_post(&item, Platform::Instagram, "").unwrap();
        assert_eq!(post.post_id, "3412345678901234567");
        assert_eq!(post.handle, "ironworks_gym");
        assert_eq!(post.likes, 320);
    }

    #[test]
    fn unsupported_platforms_have_no_actor() {
        assert!(ApifyClient::profile_actor(Platform::Web).is_none());
        assert!(ApifyClient::posts_actor(Platform::Youtube).is_none());
    }
}
