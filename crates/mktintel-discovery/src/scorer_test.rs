use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use mktintel_core::{Platform, Provenance};
use mktintel_providers::ProviderError;
use serde_json::json;

use super::*;

struct ScriptedGenerator {
    reply: Result<String, ()>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_text(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().map_err(|()| ProviderError::Api {
            provider: "scripted".to_string(),
            status: 503,
            message: "unavailable".to_string(),
        })
    }
}

fn context() -> BusinessContext {
    BusinessContext {
        user_id: "u1".to_string(),
        company_name: "Iron Works Gym".to_string(),
        industry: Some("fitness".to_string()),
        niche: Some("strength training".to_string()),
        target_audience: Some("busy parents wanting strength workouts".to_string()),
        ..BusinessContext::default()
    }
}

fn candidate(identifier: &str, followers: u64, rate: Option<f64>, bio: Option<&str>) -> Candidate {
    Candidate {
        platform: Platform::Instagram,
        identifier: identifier.to_string(),
        display_name: identifier.to_string(),
        bio: bio.map(str::to_string),
        followers,
        engagement_rate: rate,
        verified: false,
        profile_url: None,
        provenance: Provenance {
            provider: "test".to_string(),
            tier: "scrape".to_string(),
            dimension: "d".to_string(),
        },
    }
}

fn assert_invariants(score: &RelevanceScore) {
    assert!(score.score <= 100);
    assert_eq!(score.factors.len(), FACTORS.len());
    let mut total = 0.0;
    for (factor, (name, max)) in score.factors.iter().zip(FACTORS) {
        assert_eq!(factor.name, name);
        assert!((factor.max - max).abs() < f64::EPSILON);
        assert!(factor.value >= 0.0 && factor.value <= factor.max, "{factor:?}");
        total += factor.value;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = total.round() as u8;
    assert_eq!(score.score, rounded);
}

fn scorer(generator: Option<Arc<dyn TextGenerator>>) -> RelevanceScorer {
    RelevanceScorer::new(
        generator,
        Arc::new(KeywordTable::default()),
        Duration::from_secs(5),
        3,
    )
}

#[test]
fn factor_maxima_sum_to_one_hundred() {
    let sum: f64 = FACTORS.iter().map(|(_, max)| max).sum();
    assert!((sum - 100.0).abs() < f64::EPSILON);
}

#[test]
fn heuristic_scores_stay_within_bounds() {
    let table = KeywordTable::default();
    let cases = [
        candidate("empty", 0, None, None),
        candidate("tiny", 150, Some(0.0), Some("")),
        candidate("micro", 45_000, Some(4.5), Some("Strength workouts for busy parents")),
        candidate("mega", 25_000_000, Some(1.1), Some("celebrity")),
        candidate("botted", 80_000, Some(55.0), Some("fitness")),
        candidate("weird", u64::MAX, Some(f64::NAN), None),
    ];
    for c in &cases {
        let score = heuristic_score(c, &context(), &table);
        assert_eq!(score.method, ScoringMethod::Heuristic);
        assert_invariants(&score);
    }
}

#[test]
fn aligned_micro_influencer_outscores_unrelated_mega_account() {
    let table = KeywordTable::default();
    let aligned = candidate(
        "strongparents",
        45_000,
        Some(5.0),
        Some("Strength training for busy parents. Fitness coach."),
    );
    let unrelated = candidate("celebrity", 30_000_000, Some(0.4), Some("Actor and musician"));

    let a = heuristic_score(&aligned, &context(), &table);
    let b = heuristic_score(&unrelated, &context(), &table);
    assert!(a.score > b.score, "{} vs {}", a.score, b.score);
}

#[test]
fn heuristic_is_deterministic() {
    let table = KeywordTable::default();
    let c = candidate("x", 12_345, Some(2.2), Some("gym life"));
    assert_eq!(
        heuristic_score(&c, &context(), &table),
        heuristic_score(&c, &context(), &table)
    );
}

#[test]
fn ai_payload_with_all_factors_is_accepted_and_recomputed() {
    let payload = json!({
        "engagement_quality": 20,
        "reach_potential": 15.5,
        "audience_alignment": 40,
        "content_relevance": -3,
        "value_for_investment": 8,
        "score": 99,
        "reason": "Strong niche fit"
    });
    let score = parse_ai_score(&payload).unwrap();
    assert_eq!(score.method, ScoringMethod::Ai);
    assert_eq!(score.reason, "Strong niche fit");
    // 20 + 15.5 + 25 (clamped) + 0 (clamped) + 8
    assert_eq!(score.score, 69);
    assert_invariants(&score);
}

#[test]
fn ai_payload_may_nest_factors() {
    let payload = json!({
        "factors": {
            "engagement_quality": 10,
            "reach_potential": 10,
            "audience_alignment": 10,
            "content_relevance": 10,
            "value_for_investment": 5
        }
    });
    let score = parse_ai_score(&payload).unwrap();
    assert_eq!(score.score, 45);
}

#[test]
fn ai_payload_missing_or_non_numeric_factor_is_rejected() {
    let missing = json!({
        "engagement_quality": 10,
        "reach_potential": 10,
        "audience_alignment": 10,
        "content_relevance": 10
    });
    assert!(parse_ai_score(&missing).is_none());

    let textual = json!({
        "engagement_quality": "high",
        "reach_potential": 10,
        "audience_alignment": 10,
        "content_relevance": 10,
        "value_for_investment": 5
    });
    assert!(parse_ai_score(&textual).is_none());
    assert!(parse_ai_score(&json!([1, 2, 3])).is_none());
}

#[tokio::test]
async fn generator_reply_is_used_when_valid() {
    let generator = ScriptedGenerator::replying(
        "Here is my assessment:\n```json\n{\"engagement_quality\": 25, \"reach_potential\": 20, \
         \"audience_alignment\": 25, \"content_relevance\": 20, \"value_for_investment\": 10, \
         \"reason\": \"perfect\"}\n```",
    );
    let scorer = scorer(Some(generator.clone()));
    let score = scorer
        .score(&candidate("a", 1_000, None, None), &context(), ArtifactKind::Influencers)
        .await;
    assert_eq!(score.method, ScoringMethod::Ai);
    assert_eq!(score.score, 100);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generator_failure_falls_back_to_heuristic() {
    let scorer = scorer(Some(ScriptedGenerator::failing()));
    let c = candidate("a", 1_000, Some(3.0), None);
    let score = scorer.score(&c, &context(), ArtifactKind::Influencers).await;
    assert_eq!(score.method, ScoringMethod::Heuristic);
    assert_eq!(score, scorer.heuristic(&c, &context()));
}

#[tokio::test]
async fn unparseable_reply_falls_back_to_heuristic() {
    let scorer = scorer(Some(ScriptedGenerator::replying("I'd rate them highly!")));
    let score = scorer
        .score(&candidate("a", 1_000, None, None), &context(), ArtifactKind::Competitors)
        .await;
    assert_eq!(score.method, ScoringMethod::Heuristic);
}

#[tokio::test]
async fn score_all_preserves_input_order() {
    let scorer = scorer(None);
    let candidates: Vec<Candidate> = (0..7)
        .map(|i| candidate(&format!("c{i}"), 1_000 * (7 - i), None, None))
        .collect();
    let deadline = Instant::now() + Duration::from_secs(5);
    let scored = scorer
        .score_all(candidates, &context(), ArtifactKind::Influencers, deadline)
        .await;
    let ids: Vec<&str> = scored.iter().map(|s| s.candidate.identifier.as_str()).collect();
    assert_eq!(ids, vec!["c0", "c1", "c2", "c3", "c4", "c5", "c6"]);
}

#[tokio::test(start_paused = true)]
async fn slow_ai_past_deadline_takes_heuristic_path() {
    let generator = Arc::new(ScriptedGenerator {
        reply: Ok("{}".to_string()),
        delay: Duration::from_secs(60),
        calls: AtomicUsize::new(0),
    });
    let scorer = RelevanceScorer::new(
        Some(generator),
        Arc::new(KeywordTable::default()),
        Duration::from_secs(120),
        2,
    );
    let deadline = Instant::now() + Duration::from_secs(1);
    let scored = scorer
        .score_all(
            vec![candidate("a", 10, None, None), candidate("b", 20, None, None)],
            &context(),
            ArtifactKind::Influencers,
            deadline,
        )
        .await;
    assert_eq!(scored.len(), 2);
    assert!(scored
        .iter()
        .all(|s| s.relevance.method == ScoringMethod::Heuristic));
}
