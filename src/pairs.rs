//! Candidate pair generation: the full cross product of the two files'
//! columns, filtered to pairs whose inferred types are equal.

use itertools::Itertools;
use serde::Serialize;

use crate::{classify::TypeLabel, profile::FileProfile};

/// Two same-typed columns, one from each file. Identity is the pair of
/// column positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CandidatePair {
    pub left_index: usize,
    pub right_index: usize,
    pub left: String,
    pub right: String,
    pub label: TypeLabel,
}

impl CandidatePair {
    pub fn new(
        left_index: usize,
        left: impl Into<String>,
        right_index: usize,
        right: impl Into<String>,
        label: TypeLabel,
    ) -> Self {
        Self {
            left_index,
            right_index,
            left: left.into(),
            right: right.into(),
            label,
        }
    }

    pub fn key(&self) -> (usize, usize) {
        (self.left_index, self.right_index)
    }
}

/// Pairs in left-column order, then right-column order.
pub fn generate(left: &[(&str, TypeLabel)], right: &[(&str, TypeLabel)]) -> Vec<CandidatePair> {
    left.iter()
        .enumerate()
        .cartesian_product(right.iter().enumerate())
        .filter(|((_, (_, left_label)), (_, (_, right_label)))| left_label == right_label)
        .map(|((li, (lname, label)), (ri, (rname, _)))| {
            CandidatePair::new(li, *lname, ri, *rname, *label)
        })
        .collect()
}

pub fn generate_for_profiles(left: &FileProfile, right: &FileProfile) -> Vec<CandidatePair> {
    generate(&left.labels(), &right.labels())
}
