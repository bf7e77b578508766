//! Keyword vectors and cosine similarity

use super::keywords::term_frequency;

/// TF-IDF weights of one document over a fixed keyword universe
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordVector {
    weights: Vec<f64>,
}

impl KeywordVector {
    /// Weighs each keyword of `universe` by its term frequency in `text`
    /// times the matching entry of `idf`
    pub fn build(universe: &[String], text: &str, idf: &[f64]) -> Self {
        let weights = universe
            .iter()
            .zip(idf)
            .map(|(keyword, idf)| term_frequency(keyword, text) * idf)
            .collect();

        Self { weights }
    }

    pub fn from_weights(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn cosine_similarity(&self, other: &KeywordVector) -> f64 {
        cosine_similarity(&self.weights, &other.weights)
    }
}

/// Calculate cosine similarity between two vectors; 0 when either is empty,
/// of zero magnitude, or the lengths differ
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
