//! Content-derived cache partition key for a business profile.

use sha2::{Digest, Sha256};

use crate::context::BusinessContext;

/// Number of hex characters kept from the digest.
const FINGERPRINT_LEN: usize = 16;

/// Separates projected fields so that `("ab", "c")` and `("a", "bc")` differ.
const FIELD_SEPARATOR: char = '\u{1f}';

/// Derive the fingerprint of the profile fields that influence generated content.
///
/// The projection is: company name, industry, niche, target audience, brand
/// voice and the sorted goal list. Absent fields hash as empty strings. The
/// user id, geography and declared competitors are not part of the projection.
#[must_use]
pub fn fingerprint(context: &BusinessContext) -> String {
    let mut goals: Vec<&str> = context.goals.iter().map(String::as_str).collect();
    goals.sort_unstable();

    let fields = [
        context.company_name.as_str(),
        context.industry.as_deref().unwrap_or(""),
        context.niche.as_deref().unwrap_or(""),
        context.target_audience.as_deref().unwrap_or(""),
        context.brand_voice.as_deref().unwrap_or(""),
    ];

    let mut canonical = String::new();
    for field in fields {
        canonical.push_str(field);
        canonical.push(FIELD_SEPARATOR);
    }
    // Goals get their own separator so an empty list differs from `[""]`.
    canonical.push_str(&goals.len().to_string());
    for goal in goals {
        canonical.push(FIELD_SEPARATOR);
        canonical.push_str(goal);
    }

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = format!("{digest:x}");
    hex.truncate(FINGERPRINT_LEN);
    hex
}
