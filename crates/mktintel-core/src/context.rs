use serde::{Deserialize, Serialize};

/// Where the business operates. Every level is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geography {
    pub region: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// The caller's business profile for one request.
///
/// The engine only ever borrows this value; it is never modified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessContext {
    /// Owner of the cache partition. Not part of the fingerprint.
    #[serde(default)]
    pub user_id: String,
    pub company_name: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub niche: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub brand_voice: Option<String>,
    #[serde(default)]
    pub geography: Geography,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default)]
    pub competitors: Vec<String>,
}

impl BusinessContext {
    #[must_use]
    pub fn industry_or_empty(&self) -> &str {
        self.industry.as_deref().unwrap_or("")
    }

    /// Human-readable location string, most specific first.
    #[must_use]
    pub fn location_label(&self) -> Option<String> {
        let parts: Vec<&str> = [
            self.geography.city.as_deref(),
            self.geography.region.as_deref(),
            self.geography.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }

    /// Lowercase words from the audience, niche and industry descriptions,
    /// used for simple text-overlap matching.
    #[must_use]
    pub fn audience_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = [
            self.target_audience.as_deref(),
            self.niche.as_deref(),
            self.industry.as_deref(),
        ]
        .into_iter()
        .flatten()
        .flat_map(str::split_whitespace)
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| w.len() > 3)
        .collect();
        terms.sort();
        terms.dedup();
        terms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_label_skips_missing_parts() {
        let ctx = BusinessContext {
            geography: Geography {
                region: None,
                country: Some("USA".to_string()),
                city: Some("Austin".to_string()),
            },
            ..BusinessContext::default()
        };
        assert_eq!(ctx.location_label().as_deref(), Some("Austin, USA"));
    }

    #[test]
    fn location_label_none_when_empty() {
        assert!(BusinessContext::default().location_label().is_none());
    }

    #[test]
    fn audience_terms_are_lowercase_and_deduped() {
        let ctx = BusinessContext {
            target_audience: Some("Busy parents, busy professionals".to_string()),
            niche: Some("Home workouts".to_string()),
            industry: Some("Fitness".to_string()),
            ..BusinessContext::default()
        };
        let terms = ctx.audience_terms();
        assert_eq!(
            terms,
            vec!["busy", "fitness", "home", "parents", "professionals", "workouts"]
        );
    }

    #[test]
    fn deserializes_minimal_yaml_profile() {
        let yaml = "company_name: Peak Gym\nindustry: fitness\ngoals: [Brand Awareness]\n";
        let ctx: BusinessContext = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(ctx.company_name, "Peak Gym");
        assert_eq!(ctx.goals, vec!["Brand Awareness"]);
        assert!(ctx.competitors.is_empty());
        assert!(ctx.user_id.is_empty());
    }
}
