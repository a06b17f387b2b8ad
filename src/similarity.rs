//! Overlap scoring between two value sets.
//!
//! `score = |A ∩ B| / min(|A|, |B|)`. Normalising by the smaller set makes a
//! column fully contained in another score `1.0`, which is how a filtered ID
//! list is recognised against its unfiltered source. An empty side scores
//! `0.0`.

use serde::Serialize;

use crate::{error::MatchError, pairs::CandidatePair, profile::ValueSet};

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.5;

pub fn score(left: &ValueSet, right: &ValueSet) -> f64 {
    let denom = left.len().min(right.len());
    if denom == 0 {
        return 0.0;
    }
    left.intersection_len(right) as f64 / denom as f64
}

pub fn is_similar(score: f64, threshold: f64) -> bool {
    score >= threshold
}

pub fn validate_threshold(threshold: f64) -> Result<f64, MatchError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(MatchError::InvalidConfig(format!(
            "Similarity threshold must be between 0 and 1 (got {threshold})"
        )))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub pair: CandidatePair,
    pub score: f64,
}
