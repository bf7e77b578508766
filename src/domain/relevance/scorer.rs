//! Related-content ranking
//!
//! Scores candidates against a current document with TF-IDF cosine
//! similarity, a category match and an exponential recency decay, then
//! ranks them by the weighted sum.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::Document;
use super::keywords::{extract_keywords, inverse_document_frequency};
use super::vector::KeywordVector;
use crate::domain::DomainError;

/// Decay constant applied per half-life; kept at three decimals so scores
/// are reproducible
pub const DECAY_CONSTANT: f64 = 0.693;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Weights of the composite score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default = "default_similarity_weight")]
    pub similarity: f64,
    #[serde(default = "default_category_weight")]
    pub category: f64,
    #[serde(default = "default_recency_weight")]
    pub recency: f64,
}

fn default_similarity_weight() -> f64 {
    0.6
}

fn default_category_weight() -> f64 {
    0.3
}

fn default_recency_weight() -> f64 {
    0.1
}

fn default_half_life_days() -> f64 {
    180.0
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            similarity: default_similarity_weight(),
            category: default_category_weight(),
            recency: default_recency_weight(),
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default)]
    pub weights: ScoringWeights,
    /// Days after which the recency term halves
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            half_life_days: default_half_life_days(),
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), DomainError> {
        let weights = [
            self.weights.similarity,
            self.weights.category,
            self.weights.recency,
        ];

        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(DomainError::configuration(
                "Relevance weights must be finite and non-negative",
            ));
        }

        if !self.half_life_days.is_finite() || self.half_life_days <= 0.0 {
            return Err(DomainError::configuration(
                "Relevance half-life must be a positive number of days",
            ));
        }

        Ok(())
    }
}

/// The three terms of a candidate's score and their weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub similarity: f64,
    pub category_match: f64,
    pub recency: f64,
    pub score: f64,
}

/// A candidate with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    #[serde(flatten)]
    pub breakdown: ScoreBreakdown,
}

impl ScoredDocument {
    pub fn score(&self) -> f64 {
        self.breakdown.score
    }
}

/// Ranks related content; stateless apart from its configuration
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScoringConfig,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Ranks candidates as of the current wall-clock time
    pub fn rank(
        &self,
        current: &Document,
        candidates: &[Document],
        keywords: Option<&[String]>,
    ) -> Vec<ScoredDocument> {
        self.rank_at(current, candidates, keywords, Utc::now())
    }

    /// Ranks candidates by descending composite score as of `now`
    ///
    /// When `keywords` is `None` the universe is extracted from the current
    /// document. Equal scores keep the order of `candidates`.
    pub fn rank_at(
        &self,
        current: &Document,
        candidates: &[Document],
        keywords: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Vec<ScoredDocument> {
        if candidates.is_empty() {
            return Vec::new();
        }

        let universe: Vec<String> = match keywords {
            Some(keywords) => keywords.iter().map(|k| k.to_lowercase()).collect(),
            None => extract_keywords(&current.text),
        };

        let corpus: Vec<String> = std::iter::once(current)
            .chain(candidates.iter())
            .map(|d| d.text.to_lowercase())
            .collect();

        let idf: Vec<f64> = universe
            .iter()
            .map(|keyword| inverse_document_frequency(keyword, &corpus))
            .collect();

        let current_vector = KeywordVector::build(&universe, &corpus[0], &idf);

        let mut scored: Vec<ScoredDocument> = candidates
            .iter()
            .zip(&corpus[1..])
            .map(|(candidate, text)| {
                let vector = KeywordVector::build(&universe, text, &idf);
                let similarity = current_vector.cosine_similarity(&vector);

                ScoredDocument {
                    document: candidate.clone(),
                    breakdown: self.breakdown(current, candidate, similarity, now),
                }
            })
            .collect();

        // sort_by is stable
        scored.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(Ordering::Equal));

        tracing::debug!(
            current = %current.id,
            candidates = candidates.len(),
            keywords = universe.len(),
            "Ranked related content"
        );

        scored
    }

    /// The `n` best candidates as of the current wall-clock time
    pub fn top(
        &self,
        current: &Document,
        candidates: &[Document],
        keywords: Option<&[String]>,
        n: usize,
    ) -> Vec<ScoredDocument> {
        let mut ranked = self.rank(current, candidates, keywords);
        ranked.truncate(n);
        ranked
    }

    fn breakdown(
        &self,
        current: &Document,
        candidate: &Document,
        similarity: f64,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let category_match = if current.same_category(candidate) { 1.0 } else { 0.0 };
        let recency = recency(candidate.published_at, now, self.config.half_life_days);
        let weights = &self.config.weights;

        ScoreBreakdown {
            similarity,
            category_match,
            recency,
            score: weights.similarity * similarity
                + weights.category * category_match
                + weights.recency * recency,
        }
    }
}

/// `exp(-0.693 * days / half_life)`; documents dated in the future count
/// as published now
pub fn recency(published_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    let days = ((now - published_at).num_milliseconds() as f64 / MILLIS_PER_DAY).max(0.0);

    (-DECAY_CONSTANT * days / half_life_days).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 9, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        now() - Duration::days(days)
    }

    fn current() -> Document {
        Document::new(
            "yoga-lesson",
            "Lezione di yoga per la respirazione profonda",
            days_ago(2),
        )
        .with_category("yoga")
    }

    fn pool() -> Vec<Document> {
        vec![
            Document::new("pilates", "Corso di pilates per il core", days_ago(10))
                .with_category("pilates"),
            Document::new(
                "yoga-breath",
                "Yoga e respirazione profonda al mattino",
                days_ago(30),
            )
            .with_category("yoga"),
            Document::new(
                "crossfit",
                "Allenamento crossfit ad alta intensità",
                days_ago(5),
            )
            .with_category("crossfit"),
            Document::new("nutrition", "Consigli di nutrizione sportiva", days_ago(60))
                .with_category("nutrizione"),
        ]
    }

    fn ids(scored: &[ScoredDocument]) -> Vec<&str> {
        scored.iter().map(|s| s.document.id.as_str()).collect()
    }

    #[test]
    fn test_ranks_by_composite_score() {
        let scorer = RelevanceScorer::default();
        let ranked = scorer.rank_at(&current(), &pool(), None, now());

        assert_eq!(ids(&ranked), vec!["yoga-breath", "crossfit", "pilates", "nutrition"]);

        let top = &ranked[0].breakdown;
        assert!((top.similarity - 0.6946).abs() < 1e-3);
        assert_eq!(top.category_match, 1.0);
        assert!((top.score - 0.806).abs() < 1e-3);

        for unrelated in &ranked[1..] {
            assert_eq!(unrelated.breakdown.similarity, 0.0);
            assert_eq!(unrelated.breakdown.category_match, 0.0);
        }
    }

    #[test]
    fn test_empty_pool() {
        let scorer = RelevanceScorer::default();
        assert!(scorer.rank_at(&current(), &[], None, now()).is_empty());
    }

    #[test]
    fn test_top_truncates() {
        let scorer = RelevanceScorer::default();

        let best = scorer.top(&current(), &pool(), None, 2);

        assert_eq!(ids(&best), vec!["yoga-breath", "crossfit"]);
        assert_eq!(scorer.top(&current(), &pool(), None, 10).len(), 4);
    }

    #[test]
    fn test_deterministic() {
        let scorer = RelevanceScorer::default();

        let first = scorer.rank_at(&current(), &pool(), None, now());
        let second = scorer.rank_at(&current(), &pool(), None, now());

        assert_eq!(first, second);
    }

    #[test]
    fn test_self_match() {
        let scorer = RelevanceScorer::default();
        let twin = Document::new("twin", current().text, days_ago(45)).with_category("yoga");

        let ranked = scorer.rank_at(&current(), &[twin], None, now());
        let breakdown = ranked[0].breakdown;

        assert!((breakdown.similarity - 1.0).abs() < 1e-9);
        assert_eq!(breakdown.category_match, 1.0);
        let expected = 0.6 + 0.3 + 0.1 * breakdown.recency;
        assert!((breakdown.score - expected).abs() < 1e-9);
    }

    #[test]
    fn test_identical_candidate_ranks_first() {
        let scorer = RelevanceScorer::default();
        let mut candidates = pool();
        candidates.push(Document::new("twin", current().text, days_ago(300)).with_category("yoga"));

        let ranked = scorer.rank_at(&current(), &candidates, None, now());

        assert_eq!(ranked[0].document.id, "twin");
    }

    #[test]
    fn test_recency_halves_every_half_life() {
        let scorer = RelevanceScorer::default();
        let fresh = Document::new("fresh", "Orari della palestra", now());
        let old = Document::new("old", "Orari della palestra", days_ago(180));

        let ranked = scorer.rank_at(&current(), &[fresh, old], None, now());
        let fresh_recency = ranked[0].breakdown.recency;
        let old_recency = ranked[1].breakdown.recency;

        assert_eq!(fresh_recency, 1.0);
        let ratio = old_recency / fresh_recency;
        assert!((ratio - (-0.693f64).exp()).abs() < 1e-9);
        assert!((ratio - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_ties_keep_pool_order() {
        let scorer = RelevanceScorer::default();
        let first = Document::new("first", "Parcheggio gratuito", days_ago(7));
        let second = Document::new("second", "Parcheggio gratuito", days_ago(7));

        let ranked = scorer.rank_at(&current(), &[first, second], None, now());

        assert_eq!(ids(&ranked), vec!["first", "second"]);
        assert_eq!(ranked[0].score(), ranked[1].score());
    }

    #[test]
    fn test_supplied_keyword_universe() {
        let scorer = RelevanceScorer::default();
        let keywords = vec!["PILATES".to_string()];
        let current = Document::new("c", "Pilates reformer per principianti", days_ago(1));

        let ranked = scorer.rank_at(&current, &pool(), Some(&keywords), now());

        assert_eq!(ranked[0].document.id, "pilates");
        assert!(ranked[0].breakdown.similarity > 0.99);
    }

    #[test]
    fn test_future_publish_date_counts_as_now() {
        assert_eq!(recency(now() + Duration::days(3), now(), 180.0), 1.0);
    }

    #[test]
    fn test_custom_weights() {
        let config = ScoringConfig {
            weights: ScoringWeights {
                similarity: 0.0,
                category: 0.0,
                recency: 1.0,
            },
            half_life_days: 180.0,
        };
        let scorer = RelevanceScorer::new(config);

        let ranked = scorer.rank_at(&current(), &pool(), None, now());

        assert_eq!(ids(&ranked), vec!["crossfit", "pilates", "yoga-breath", "nutrition"]);
    }

    #[test]
    fn test_config_validation() {
        assert!(ScoringConfig::default().validate().is_ok());

        let negative = ScoringConfig {
            weights: ScoringWeights {
                similarity: -0.1,
                ..ScoringWeights::default()
            },
            ..ScoringConfig::default()
        };
        assert!(negative.validate().is_err());

        let zero_half_life = ScoringConfig {
            half_life_days: 0.0,
            ..ScoringConfig::default()
        };
        assert!(zero_half_life.validate().is_err());
    }
}
