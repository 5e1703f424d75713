//! Splits a discovery request into independent query dimensions.

use std::collections::HashSet;

use mktintel_core::{ArtifactKind, BusinessContext, KeywordTable, Platform};

/// Influencer searches cover at most this many platforms.
const MAX_INFLUENCER_PLATFORMS: usize = 3;
/// Competitor searches cover at most this many terms.
const MAX_COMPETITOR_DIMENSIONS: usize = 3;

/// One independent unit of discovery work: a search term on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub kind: ArtifactKind,
    pub keyword: String,
    pub platform: Platform,
    /// Set when the term is a declared competitor name.
    pub competitor: Option<String>,
}

impl Dimension {
    /// Stable label used in provenance tags and error messages.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}:{}:{}", self.kind, self.platform, self.keyword)
    }

    /// Query sent to the web-search tier.
    #[must_use]
    pub fn web_query(&self, location: Option<&str>) -> String {
        let mut query = match (self.kind, &self.competitor) {
            (_, Some(name)) => format!("{name} {} official", self.platform),
            (ArtifactKind::Influencers, None) => {
                format!("{} influencers on {}", self.keyword, self.platform)
            }
            _ => format!("top {} brands on {}", self.keyword, self.platform),
        };
        if let Some(location) = location {
            query.push_str(" in ");
            query.push_str(location);
        }
        query
    }
}

/// Plan the dimensions for `kind`. Campaigns have no dimensions.
#[must_use]
pub fn plan_dimensions(
    context: &BusinessContext,
    kind: ArtifactKind,
    table: &KeywordTable,
) -> Vec<Dimension> {
    match kind {
        ArtifactKind::Influencers => influencer_dimensions(context, table),
        ArtifactKind::Competitors => competitor_dimensions(context, table),
        ArtifactKind::Campaigns => Vec::new(),
    }
}

fn influencer_dimensions(context: &BusinessContext, table: &KeywordTable) -> Vec<Dimension> {
    let profile = table.lookup(context.industry_or_empty());
    let base = profile
        .keywords
        .iter()
        .map(|k| k.trim())
        .find(|k| !k.is_empty())
        .or_else(|| table.generic.keywords.first().map(String::as_str))
        .unwrap_or("marketing");

    let keyword = match context.niche.as_deref().map(str::trim) {
        Some(niche) if !niche.is_empty() && !niche.eq_ignore_ascii_case(base) => {
            format!("{niche} {base}")
        }
        _ => base.to_string(),
    };

    let mut platforms: Vec<Platform> = profile
        .platforms
        .iter()
        .copied()
        .filter(|p| *p != Platform::Web)
        .take(MAX_INFLUENCER_PLATFORMS)
        .collect();
    if platforms.is_empty() {
        platforms.push(Platform::Instagram);
    }

    platforms
        .into_iter()
        .map(|platform| Dimension {
            kind: ArtifactKind::Influencers,
            keyword: keyword.clone(),
            platform,
            competitor: None,
        })
        .collect()
}

fn competitor_dimensions(context: &BusinessContext, table: &KeywordTable) -> Vec<Dimension> {
    let profile = table.lookup(context.industry_or_empty());
    let platform = profile
        .platforms
        .first()
        .copied()
        .unwrap_or(Platform::Instagram);

    let mut seen = HashSet::new();
    let mut dimensions = Vec::new();

    let named = context
        .competitors
        .iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .map(|c| (c.to_string(), true));
    let keywords = table
        .keywords_for(context)
        .into_iter()
        .map(|k| (k, false));

    for (term, is_competitor) in named.chain(keywords) {
        if dimensions.len() == MAX_COMPETITOR_DIMENSIONS {
            break;
        }
        if !seen.insert(term.to_lowercase()) {
            continue;
        }
        dimensions.push(Dimension {
            kind: ArtifactKind::Competitors,
            competitor: is_competitor.then(|| term.clone()),
            keyword: term,
            platform,
        });
    }
    dimensions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitness() -> BusinessContext {
        BusinessContext {
            user_id: "u1".to_string(),
            company_name: "Iron Works Gym".to_string(),
            industry: Some("Fitness".to_string()),
            ..BusinessContext::default()
        }
    }

    #[test]
    fn influencers_cover_top_three_platforms() {
        let dims = plan_dimensions(&fitness(), ArtifactKind::Influencers, &KeywordTable::default());
        let platforms: Vec<Platform> = dims.iter().map(|d| d.platform).collect();
        assert_eq!(
            platforms,
            vec![Platform::Instagram, Platform::Tiktok, Platform::Youtube]
        );
        assert!(dims.iter().all(|d| d.keyword == dims[0].keyword));
    }

    #[test]
    fn influencer_keyword_includes_niche() {
        let ctx = BusinessContext {
            niche: Some("kettlebell".to_string()),
            ..fitness()
        };
        let dims = plan_dimensions(&ctx, ArtifactKind::Influencers, &KeywordTable::default());
        assert!(dims[0].keyword.starts_with("kettlebell "));
    }

    #[test]
    fn competitors_start_with_declared_names_and_cap_at_three() {
        let ctx = BusinessContext {
            competitors: vec![
                "Planet Fitness".to_string(),
                "  ".to_string(),
                "Orangetheory".to_string(),
            ],
            ..fitness()
        };
        let dims = plan_dimensions(&ctx, ArtifactKind::Competitors, &KeywordTable::default());
        assert_eq!(dims.len(), 3);
        assert_eq!(dims[0].competitor.as_deref(), Some("Planet Fitness"));
        assert_eq!(dims[1].competitor.as_deref(), Some("Orangetheory"));
        assert!(dims[2].competitor.is_none());
        assert!(dims.iter().all(|d| d.platform == Platform::Instagram));
    }

    #[test]
    fn unknown_industry_still_plans_dimensions() {
        let ctx = BusinessContext {
            industry: Some("underwater basket weaving".to_string()),
            ..BusinessContext::default()
        };
        let table = KeywordTable::default();
        assert!(!plan_dimensions(&ctx, ArtifactKind::Competitors, &table).is_empty());
        assert!(!plan_dimensions(&ctx, ArtifactKind::Influencers, &table).is_empty());
    }

    #[test]
    fn campaigns_have_no_dimensions() {
        let dims = plan_dimensions(&fitness(), ArtifactKind::Campaigns, &KeywordTable::default());
        assert!(dims.is_empty());
    }

    #[test]
    fn web_query_mentions_platform_and_location() {
        let dim = Dimension {
            kind: ArtifactKind::Influencers,
            keyword: "fitness".to_string(),
            platform: Platform::Tiktok,
            competitor: None,
        };
        assert_eq!(
            dim.web_query(Some("Austin, Texas")),
            "fitness influencers on tiktok in Austin, Texas"
        );
    }
}
