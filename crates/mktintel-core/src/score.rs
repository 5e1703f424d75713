//! Relevance score value type.
//!
//! A score is built only through [`RelevanceScore::from_factors`], which clamps
//! every factor into `[0, max]` and derives the overall score from the factor
//! sum, so the two can never disagree.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMethod {
    Ai,
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactor {
    pub name: String,
    pub value: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    /// Overall score in `[0, 100]`.
    pub score: u8,
    pub reason: String,
    pub factors: Vec<ScoreFactor>,
    pub method: ScoringMethod,
}

impl RelevanceScore {
    /// Build a score from `(name, achieved, max)` triples.
    ///
    /// Achieved values are rounded to one decimal and clamped into `[0, max]`;
    /// non-finite values count as zero.
    #[must_use]
    pub fn from_factors(
        factors: &[(&str, f64, f64)],
        reason: impl Into<String>,
        method: ScoringMethod,
    ) -> Self {
        let factors: Vec<ScoreFactor> = factors
            .iter()
            .map(|&(name, value, max)| {
                let value = if value.is_finite() { value } else { 0.0 };
                ScoreFactor {
                    name: name.to_string(),
                    value: ((value * 10.0).round() / 10.0).clamp(0.0, max),
                    max,
                }
            })
            .collect();

        let total: f64 = factors.iter().map(|f| f.value).sum();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let score = total.round().clamp(0.0, 100.0) as u8;

        Self {
            score,
            reason: reason.into(),
            factors,
            method,
        }
    }

    #[must_use]
    pub fn factor(&self, name: &str) -> Option<&ScoreFactor> {
        self.factors.iter().find(|f| f.name == name)
    }
}
