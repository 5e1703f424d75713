//! Candidate deduplication across dimensions and tiers.

use std::collections::HashSet;

use mktintel_core::Candidate;

/// Collapse `lists` into a unique, ranked set of at most `limit` candidates.
///
/// The first occurrence of a `(platform, identifier)` key wins, so the result
/// depends only on input order, never on task completion order. Candidates
/// are ordered by audience size descending; ties keep first-seen order.
#[must_use]
pub fn merge<I>(lists: I, limit: usize) -> Vec<Candidate>
where
    I: IntoIterator,
    I::Item: IntoIterator<Item = Candidate>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<Candidate> = lists
        .into_iter()
        .flatten()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect();

    // sort_by is stable
    merged.sort_by(|a, b| b.followers.cmp(&a.followers));
    merged.truncate(limit);
    merged
}
