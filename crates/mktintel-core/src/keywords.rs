//! Industry keyword and platform-affinity lookup table.
//!
//! Used to build search terms for each discovery dimension and to weight
//! platforms during heuristic scoring. Unknown industries resolve to a generic
//! profile, so a lookup always yields at least one keyword and one platform.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::candidate::Platform;
use crate::context::BusinessContext;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryProfile {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub keywords: Vec<String>,
    /// Platforms ordered from strongest to weakest affinity.
    pub platforms: Vec<Platform>,
}

impl IndustryProfile {
    fn matches(&self, industry: &str) -> bool {
        let industry = industry.to_lowercase();
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .any(|term| industry.contains(&term.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Primary,
    Secondary,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordTable {
    pub industries: Vec<IndustryProfile>,
    pub generic: IndustryProfile,
}

impl Default for KeywordTable {
    fn default() -> Self {
        use Platform::{Facebook, Instagram, Linkedin, Tiktok, Twitter, Youtube};

        let profile = |name: &str, aliases: &[&str], keywords: &[&str], platforms: &[Platform]| {
            IndustryProfile {
                name: name.to_string(),
                aliases: aliases.iter().map(|s| (*s).to_string()).collect(),
                keywords: keywords.iter().map(|s| (*s).to_string()).collect(),
                platforms: platforms.to_vec(),
            }
        };

        Self {
            industries: vec![
                profile(
                    "fitness",
                    &["gym", "workout", "sport"],
                    &["fitness", "workout", "personal trainer", "gym"],
                    &[Instagram, Tiktok, Youtube],
                ),
                profile(
                    "beauty",
                    &["cosmetic", "skincare", "makeup"],
                    &["beauty", "skincare", "makeup", "cosmetics"],
                    &[Instagram, Tiktok, Youtube],
                ),
                profile(
                    "food",
                    &["restaurant", "beverage", "cafe", "bakery"],
                    &["food", "recipes", "foodie", "restaurant"],
                    &[Instagram, Tiktok, Facebook],
                ),
                profile(
                    "fashion",
                    &["apparel", "clothing", "jewelry"],
                    &["fashion", "style", "outfit", "streetwear"],
                    &[Instagram, Tiktok, Youtube],
                ),
                profile(
                    "technology",
                    &["saas", "software", "tech"],
                    &["saas", "software", "startup", "productivity"],
                    &[Linkedin, Twitter, Youtube],
                ),
                profile(
                    "travel",
                    &["hospitality", "hotel", "tourism"],
                    &["travel", "hotel", "wanderlust", "tourism"],
                    &[Instagram, Youtube, Tiktok],
                ),
                profile(
                    "finance",
                    &["fintech", "banking", "insurance", "investing"],
                    &["personal finance", "investing", "fintech", "money tips"],
                    &[Linkedin, Youtube, Twitter],
                ),
                profile(
                    "wellness",
                    &["health", "nutrition", "yoga", "mental"],
                    &["wellness", "nutrition", "mindfulness", "healthy living"],
                    &[Instagram, Youtube, Tiktok],
                ),
                profile(
                    "gaming",
                    &["esports", "games"],
                    &["gaming", "gamer", "esports", "streamer"],
                    &[Youtube, Twitter, Tiktok],
                ),
                profile(
                    "education",
                    &["edtech", "learning", "coaching", "courses"],
                    &["education", "online courses", "learning", "study tips"],
                    &[Youtube, Linkedin, Instagram],
                ),
                profile(
                    "real estate",
                    &["property", "realtor", "mortgage"],
                    &["real estate", "realtor", "home buying", "property"],
                    &[Instagram, Facebook, Youtube],
                ),
            ],
            generic: profile(
                "general",
                &[],
                &["small business", "marketing", "local business"],
                &[Instagram, Facebook, Linkedin],
            ),
        }
    }
}

impl KeywordTable {
    /// Industry profile for `industry`, or the generic profile when nothing matches.
    #[must_use]
    pub fn lookup(&self, industry: &str) -> &IndustryProfile {
        if industry.trim().is_empty() {
            return &self.generic;
        }
        self.industries
            .iter()
            .find(|p| p.matches(industry))
            .unwrap_or(&self.generic)
    }

    /// Search keywords for a business. Never empty.
    ///
    /// The niche (when present) leads, followed by the industry keywords.
    #[must_use]
    pub fn keywords_for(&self, context: &BusinessContext) -> Vec<String> {
        let profile = self.lookup(context.industry_or_empty());
        let mut seen = HashSet::new();
        let mut keywords = Vec::new();

        let niche = context
            .niche
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        for keyword in niche
            .into_iter()
            .chain(profile.keywords.iter().map(String::as_str))
        {
            if seen.insert(keyword.to_lowercase()) {
                keywords.push(keyword.to_string());
            }
        }

        if keywords.is_empty() {
            keywords.extend(self.generic.keywords.iter().cloned());
        }
        keywords
    }

    /// How well `platform` suits the given industry.
    #[must_use]
    pub fn affinity(&self, industry: &str, platform: Platform) -> Affinity {
        let profile = self.lookup(industry);
        match profile.platforms.iter().position(|p| *p == platform) {
            Some(0) => Affinity::Primary,
            Some(_) => Affinity::Secondary,
            None => Affinity::Other,
        }
    }
}

/// Load and validate a keyword table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_keyword_table(path: &Path) -> Result<KeywordTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::KeywordsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let table: KeywordTable =
        serde_yaml::from_str(&content).map_err(ConfigError::KeywordsFileParse)?;

    validate_table(&table)?;

    Ok(table)
}

fn validate_table(table: &KeywordTable) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();

    for profile in table.industries.iter().chain(std::iter::once(&table.generic)) {
        if profile.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "industry name must be non-empty".to_string(),
            ));
        }
        if profile.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(format!(
                "industry '{}' has no keywords",
                profile.name
            )));
        }
        if profile.platforms.is_empty() {
            return Err(ConfigError::Validation(format!(
                "industry '{}' has no platforms",
                profile.name
            )));
        }
        if !seen_names.insert(profile.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate industry: '{}'",
                profile.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(industry: Option<&str>, niche: Option<&str>) -> BusinessContext {
        BusinessContext {
            company_name: "Acme".to_string(),
            industry: industry.map(str::to_string),
            niche: niche.map(str::to_string),
            ..BusinessContext::default()
        }
    }

    #[test]
    fn default_table_is_valid() {
        assert!(validate_table(&KeywordTable::default()).is_ok());
    }

    #[test]
    fn lookup_matches_name_and_alias() {
        let table = KeywordTable::default();
        assert_eq!(table.lookup("Fitness").name, "fitness");
        assert_eq!(table.lookup("Boutique Gym").name, "fitness");
        assert_eq!(table.lookup("B2B SaaS").name, "technology");
    }

    #[test]
    fn unknown_industry_falls_back_to_generic() {
        let table = KeywordTable::default();
        assert_eq!(table.lookup("underwater basket weaving").name, "general");
        assert_eq!(table.lookup("").name, "general");
    }

    #[test]
    fn keywords_never_empty() {
        let table = KeywordTable::default();
        let keywords = table.keywords_for(&context(None, None));
        assert!(!keywords.is_empty());
        assert_eq!(keywords[0], "small business");
    }

    #[test]
    fn niche_leads_and_duplicates_are_removed() {
        let table = KeywordTable::default();
        let keywords = table.keywords_for(&context(Some("fitness"), Some("Workout")));
        assert_eq!(keywords[0], "Workout");
        assert_eq!(
            keywords
                .iter()
                .filter(|k| k.eq_ignore_ascii_case("workout"))
                .count(),
            1
        );
    }

    #[test]
    fn affinity_reflects_platform_order() {
        let table = KeywordTable::default();
        assert_eq!(
            table.affinity("fitness", Platform::Instagram),
            Affinity::Primary
        );
        assert_eq!(
            table.affinity("fitness", Platform::Youtube),
            Affinity::Secondary
        );
        assert_eq!(
            table.affinity("fitness", Platform::Linkedin),
            Affinity::Other
        );
    }

    #[test]
    fn validation_rejects_industry_without_keywords() {
        let mut table = KeywordTable::default();
        table.industries[0].keywords = vec![" ".to_string()];
        assert!(matches!(
            validate_table(&table),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validation_rejects_duplicate_industries() {
        let mut table = KeywordTable::default();
        let copy = table.industries[0].clone();
        table.industries.push(copy);
        assert!(matches!(
            validate_table(&table),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn parses_yaml_table() {
        let yaml = r"
industries:
  - name: pets
    aliases: [dog, cat]
    keywords: [pets, dog training]
    platforms: [instagram, tiktok]
generic:
  name: general
  keywords: [business]
  platforms: [facebook]
";
        let table: KeywordTable = serde_yaml::from_str(yaml).unwrap();
        assert!(validate_table(&table).is_ok());
        assert_eq!(table.lookup("Dog grooming").name, "pets");
        assert_eq!(table.lookup("plumbing").keywords, vec!["business"]);
    }
}
