//! Relevance domain - ranking related content by keyword similarity,
//! category and recency

mod document;
mod keywords;
mod scorer;
mod vector;

pub use document::Document;
pub use keywords::{extract_keywords, inverse_document_frequency, is_stop_word, term_frequency};
pub use scorer::{
    recency, RelevanceScorer, ScoreBreakdown, ScoredDocument, ScoringConfig, ScoringWeights,
    DECAY_CONSTANT,
};
pub use vector::{cosine_similarity, KeywordVector};
