//! Ranking primitives shared by knowledge search, vector search and memory recall.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Weight of the vector score in a hybrid score; the rest is keyword.
pub const VECTOR_WEIGHT: f64 = 0.5;

static TOKEN: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"[\p{L}\p{N}]+").ok());

/// Lowercased word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    match TOKEN.as_ref() {
        Some(re) => re
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect(),
        None => text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect(),
    }
}

/// Fraction of distinct query terms that occur in `text`.
pub fn keyword_score(query: &str, text: &str) -> f64 {
    let terms: HashSet<String> = tokenize(query).into_iter().collect();
    if terms.is_empty() {
        return 0.0;
    }
    let words: HashSet<String> = tokenize(text).into_iter().collect();
    terms.intersection(&words).count() as f64 / terms.len() as f64
}

/// Cosine similarity; 0 for mismatched or zero vectors.
pub fn cosine(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (norm_a * norm_b))
}

/// Weighted blend of keyword and vector scores, in [0, 1].
pub fn hybrid_score(keyword: f64, vector: f64) -> f64 {
    (VECTOR_WEIGHT * vector.max(0.0) + (1.0 - VECTOR_WEIGHT) * keyword).clamp(0.0, 1.0)
}
