//! Recent-activity summaries for known competitor accounts.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use mktintel_core::{Platform, Post};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandleActivity {
    pub handle: String,
    pub post_count: usize,
    pub avg_likes: f64,
    pub avg_comments: f64,
    pub latest_post_at: Option<DateTime<Utc>>,
    /// Post with the most likes plus comments.
    pub top_post: Option<Post>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityReport {
    pub platform: Platform,
    pub handles: Vec<HandleActivity>,
    pub errors: Vec<String>,
}

pub(crate) fn normalise_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').to_lowercase()
}

/// Trimmed handles without a leading '@', dropping blanks and repeats of an
/// earlier handle that normalises to the same account.
#[must_use]
pub fn unique_handles(handles: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    handles
        .iter()
        .map(|h| h.trim().trim_start_matches('@').to_string())
        .filter(|h| !h.is_empty() && seen.insert(normalise_handle(h)))
        .collect()
}

/// Group `posts` by handle and summarise each requested handle, in request
/// order. Handles without posts get an empty summary. At most
/// `posts_per_handle` of the newest posts count towards each summary.
#[must_use]
pub fn summarise(handles: &[String], posts: Vec<Post>, posts_per_handle: usize) -> Vec<HandleActivity> {
    let mut grouped: HashMap<String, Vec<Post>> = HashMap::new();
    for post in posts {
        grouped
            .entry(normalise_handle(&post.handle))
            .or_default()
            .push(post);
    }

    handles
        .iter()
        .map(|handle| {
            let mut posts = grouped
                .get(&normalise_handle(handle))
                .cloned()
                .unwrap_or_default();
            // newest first; undated posts last
            posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
            posts.truncate(posts_per_handle);
            summarise_handle(handle, posts)
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn summarise_handle(handle: &str, posts: Vec<Post>) -> HandleActivity {
    let count = posts.len();
    let (likes, comments) = posts
        .iter()
        .fold((0u64, 0u64), |(l, c), p| {
            (l.saturating_add(p.likes), c.saturating_add(p.comments))
        });
    let average = |total: u64| {
        if count == 0 {
            0.0
        } else {
            ((total as f64 / count as f64) * 10.0).round() / 10.0
        }
    };

    HandleActivity {
        handle: handle.trim().trim_start_matches('@').to_string(),
        post_count: count,
        avg_likes: average(likes),
        avg_comments: average(comments),
        latest_post_at: posts.iter().filter_map(|p| p.published_at).max(),
        top_post: posts
            .iter()
            .max_by_key(|p| p.likes.saturating_add(p.comments))
            .cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(handle: &str, id: &str, likes: u64, comments: u64, day: u32) -> Post {
        Post {
            platform: Platform::Instagram,
            handle: handle.to_string(),
            post_id: id.to_string(),
            text: String::new(),
            url: None,
            likes,
            comments,
            published_at: Some(Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn summarises_per_handle_in_request_order() {
        let posts = vec![
            post("rival_gym", "1", 100, 10, 1),
            post("Rival_Gym", "2", 300, 30, 3),
            post("other", "3", 5, 0, 2),
        ];
        let handles = vec!["@rival_gym".to_string(), "missing".to_string()];
        let summary = summarise(&handles, posts, 10);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].handle, "rival_gym");
        assert_eq!(summary[0].post_count, 2);
        assert!((summary[0].avg_likes - 200.0).abs() < f64::EPSILON);
        assert!((summary[0].avg_comments - 20.0).abs() < f64::EPSILON);
        assert_eq!(summary[0].top_post.as_ref().unwrap().post_id, "2");
        assert_eq!(
            summary[0].latest_post_at,
            Some(Utc.with_ymd_and_hms(2025, 6, 3, 12, 0, 0).unwrap())
        );

        assert_eq!(summary[1].post_count, 0);
        assert!(summary[1].top_post.is_none());
    }

    #[test]
    fn only_newest_posts_count() {
        let posts = vec![
            post("a", "old", 1_000, 0, 1),
            post("a", "new", 10, 0, 5),
        ];
        let summary = summarise(&["a".to_string()], posts, 1);
        assert_eq!(summary[0].post_count, 1);
        assert_eq!(summary[0].top_post.as_ref().unwrap().post_id, "new");
    }

    #[test]
    fn repeated_handle_keeps_its_posts() {
        let posts = vec![post("ironworks", "1", 40, 4, 2)];
        let handles = vec!["ironworks".to_string(), "@IronWorks".to_string()];
        let summary = summarise(&handles, posts, 5);

        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].post_count, 1);
        assert_eq!(summary[1].post_count, 1);
        assert_eq!(summary[1].handle, "IronWorks");
    }

    #[test]
    fn unique_handles_drops_equivalent_repeats() {
        let handles = vec![
            "ironworks".to_string(),
            " @IronWorks ".to_string(),
            "@".to_string(),
            "rival_gym".to_string(),
        ];
        assert_eq!(unique_handles(&handles), vec!["ironworks", "rival_gym"]);
    }

    #[test]
    fn huge_counts_do_not_overflow() {
        let posts = vec![
            post("viral", "1", u64::MAX, u64::MAX, 1),
            post("viral", "2", u64::MAX, 1, 2),
        ];
        let summary = summarise(&["viral".to_string()], posts, 5);
        assert_eq!(summary[0].post_count, 2);
        assert!(summary[0].avg_likes > 0.0);
        assert!(summary[0].top_post.is_some());
    }
}
