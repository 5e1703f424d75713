//! Turns web search results into candidates for the web-search tier.

use std::collections::HashSet;
use std::sync::LazyLock;

use mktintel_core::{Candidate, Platform, Provenance, SearchResult};
use regex::Regex;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.|m\.|mobile\.)?([a-z0-9.-]+)(?:/([^?#]*))?")
        .expect("valid profile url regex")
});

static AUDIENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*([kmb])?\+?\s+(?:followers|subscribers|fans)")
        .expect("valid audience regex")
});

/// Path segments that never name an account.
const RESERVED_SEGMENTS: &[&str] = &[
    "p", "reel", "reels", "explore", "tags", "tag", "hashtag", "search", "watch", "status",
    "video", "videos", "share", "login", "about", "stories", "discover", "results", "shorts",
    "posts", "pages", "groups", "events", "i", "intent", "home",
];

/// Segments followed by the real handle (`/c/name`, `/in/name`, ...).
const PREFIX_SEGMENTS: &[&str] = &["c", "user", "channel", "in", "company", "pg"];

/// Convert search hits into candidates on `platform`.
///
/// Hits that do not link to an account on that platform are skipped. For
/// [`Platform::Web`] the site domain is the identifier.
#[must_use]
pub fn candidates_from_results(
    results: &[SearchResult],
    platform: Platform,
    provider: &str,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter_map(|result| {
            let identifier = identifier_from_url(&result.url, platform)?;
            if !seen.insert(identifier.to_lowercase()) {
                return None;
            }
            let text = format!("{} {}", result.title, result.snippet);
            Some(Candidate {
                platform,
                display_name: display_name_from_title(&result.title)
                    .unwrap_or_else(|| identifier.clone()),
                identifier,
                bio: Some(result.snippet.trim().to_string()).filter(|s| !s.is_empty()),
                followers: parse_audience(&text).unwrap_or(0),
                engagement_rate: None,
                verified: false,
                profile_url: Some(result.url.clone()),
                provenance: Provenance {
                    provider: provider.to_string(),
                    tier: String::new(),
                    dimension: String::new(),
                },
            })
        })
        .collect()
}

/// Account handle (or domain, for the web) referenced by `url`.
#[must_use]
pub fn identifier_from_url(url: &str, platform: Platform) -> Option<String> {
    let caps = URL_RE.captures(url.trim())?;
    let host = caps.get(1)?.as_str().to_lowercase();

    if platform == Platform::Web {
        let is_social = Platform::ALL
            .iter()
            .any(|p| p.hosts().iter().any(|h| host_matches(&host, h)));
        return (!is_social).then_some(host);
    }

    if !platform.hosts().iter().any(|h| host_matches(&host, h)) {
        return None;
    }

    let mut segments = caps
        .get(2)
        .map_or("", |m| m.as_str())
        .split('/')
        .filter(|s| !s.is_empty());

    let mut first = segments.next()?;
    if PREFIX_SEGMENTS.contains(&first.to_lowercase().as_str()) {
        first = segments.next()?;
    }
    let handle = first.trim_start_matches('@');
    if handle.is_empty() || RESERVED_SEGMENTS.contains(&handle.to_lowercase().as_str()) {
        return None;
    }
    Some(handle.to_string())
}

fn host_matches(host: &str, platform_host: &str) -> bool {
    host == platform_host || host.ends_with(&format!(".{platform_host}"))
}

/// Leading name part of titles like `Ana Torres (@fitwithana) • Instagram`.
fn display_name_from_title(title: &str) -> Option<String> {
    let cut = title
        .find(['(', '|', '•', '·'])
        .or_else(|| title.find(" - "))
        .unwrap_or(title.len());
    let name = title[..cut].trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Audience size from snippets like `12.3K Followers` or `1,204 subscribers`.
#[must_use]
pub fn parse_audience(text: &str) -> Option<u64> {
    let caps = AUDIENCE_RE.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', "").parse().ok()?;
    let suffix = caps.get(2).map(|m| m.as_str().to_ascii_lowercase());
    let multiplier = match suffix.as_deref() {
        Some("k") => 1_000.0,
        Some("m") => 1_000_000.0,
        Some("b") => 1_000_000_000.0,
        _ => 1.0,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some((number * multiplier).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    #[test]
    fn instagram_profile_url() {
        assert_eq!(
            identifier_from_url("https://www.instagram.com/fitwithana/", Platform::Instagram),
            Some("fitwithana".to_string())
        );
    }

    #[test]
    fn post_urls_are_not_profiles() {
        assert_eq!(
            identifier_from_url("https://www.instagram.com/p/Cx123/", Platform::Instagram),
            None
        );
        assert_eq!(
            identifier_from_url("https://x.com/search?q=gym", Platform::Twitter),
            None
        );
    }

    #[test]
    fn prefixed_and_at_handles() {
        assert_eq!(
            identifier_from_url("https://www.youtube.com/@HomeWorkouts", Platform::Youtube),
            Some("HomeWorkouts".to_string())
        );
        assert_eq!(
            identifier_from_url("https://youtube.com/c/AthleanX/videos", Platform::Youtube),
            Some("AthleanX".to_string())
        );
        assert_eq!(
            identifier_from_url("https://www.linkedin.com/company/acme-saas", Platform::Linkedin),
            Some("acme-saas".to_string())
        );
    }

    #[test]
    fn other_platform_hosts_are_rejected() {
        assert_eq!(
            identifier_from_url("https://www.tiktok.com/@fitwithana", Platform::Instagram),
            None
        );
    }

    #[test]
    fn web_platform_uses_domain_and_skips_social_sites() {
        assert_eq!(
            identifier_from_url("https://www.orangetheory.com/en-us", Platform::Web),
            Some("orangetheory.com".to_string())
        );
        assert_eq!(
            identifier_from_url("https://instagram.com/orangetheory", Platform::Web),
            None
        );
    }

    #[test]
    fn audience_parsing() {
        assert_eq!(parse_audience("48.2K Followers, 310 Following"), Some(48_200));
        assert_eq!(parse_audience("1,204 subscribers"), Some(1_204));
        assert_eq!(parse_audience("2M followers"), Some(2_000_000));
        assert_eq!(parse_audience("no numbers"), None);
    }

    #[test]
    fn results_become_deduplicated_candidates() {
        let results = vec![
            result(
                "Ana Torres (@fitwithana) • Instagram photos and videos",
                "https://www.instagram.com/fitwithana/",
                "48.2K Followers, 310 Following, 900 Posts",
            ),
            result(
                "Ana again",
                "https://instagram.com/FitWithAna",
                "duplicate",
            ),
            result("A blog", "https://example.com/top-10", "listicle"),
        ];
        let candidates = candidates_from_results(&results, Platform::Instagram, "tavily");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].display_name, "Ana Torres");
        assert_eq!(candidates[0].followers, 48_200);
        assert_eq!(candidates[0].provenance.provider, "tavily");
    }
}
