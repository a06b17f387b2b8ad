//! Per-file column profiles.
//!
//! One pass over a [`RowSource`] yields, for every column, its inferred
//! [`TypeLabel`] and (when requested) the [`ValueSet`] of distinct trimmed
//! non-empty values. Profiles are read-only once built, so the scheduler
//! can share them across worker threads without locking.
//!
//! Column identity is the header name. Duplicate names are not merged: the
//! columns stay distinct by position, name lookups return the first one,
//! and a warning is logged.

use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use log::{debug, warn};
use serde::Serialize;

use crate::{
    classify::{TypeCandidate, TypeClassifier, TypeLabel},
    error::MatchError,
    rows::RowSource,
};

/// Distinct, trimmed, non-empty values observed in one column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueSet {
    values: HashSet<String>,
}

impl ValueSet {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn intersection_len(&self, other: &ValueSet) -> usize {
        let (smaller, larger) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        smaller
            .values
            .iter()
            .filter(|value| larger.values.contains(value.as_str()))
            .count()
    }

    fn insert(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if trimmed.is_empty() || self.values.contains(trimmed) {
            return;
        }
        self.values.insert(trimmed.to_string());
    }
}

impl<S: AsRef<str>> FromIterator<S> for ValueSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = ValueSet::default();
        for value in iter {
            set.insert(value.as_ref());
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileOptions {
    /// Rows fed to type inference; 0 scans the whole column.
    pub sample_rows: usize,
    pub collect_values: bool,
}

impl Default for ProfileOptions {
    fn default() -> Self {
        Self {
            sample_rows: 0,
            collect_values: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    pub label: TypeLabel,
    pub non_empty: usize,
    #[serde(skip)]
    values: Option<Arc<ValueSet>>,
}

impl ColumnProfile {
    pub fn values(&self) -> Option<&ValueSet> {
        self.values.as_deref()
    }

    /// Shared handle to the value set, for work that may outlive the borrow.
    pub fn shared_values(&self) -> Option<Arc<ValueSet>> {
        self.values.clone()
    }

    pub fn distinct_values(&self) -> Option<usize> {
        self.values().map(ValueSet::len)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileProfile {
    pub source: String,
    pub rows_read: usize,
    pub columns: Vec<ColumnProfile>,
}

impl FileProfile {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn type_of(&self, name: &str) -> Option<TypeLabel> {
        self.column(name).map(|c| c.label)
    }

    /// Column name → label. With duplicate names the first column wins.
    pub fn types(&self) -> BTreeMap<&str, TypeLabel> {
        let mut types = BTreeMap::new();
        for column in &self.columns {
            types.entry(column.name.as_str()).or_insert(column.label);
        }
        types
    }

    pub fn labels(&self) -> Vec<(&str, TypeLabel)> {
        self.columns
            .iter()
            .map(|c| (c.name.as_str(), c.label))
            .collect()
    }

    pub fn values(&self, index: usize) -> Option<&ValueSet> {
        self.columns.get(index).and_then(ColumnProfile::values)
    }

    pub fn shared_values(&self, index: usize) -> Option<Arc<ValueSet>> {
        self.columns.get(index).and_then(ColumnProfile::shared_values)
    }

    pub fn has_values(&self) -> bool {
        self.columns.iter().all(|c| c.values.is_some())
    }
}

pub fn build_profile<R>(
    source: &mut R,
    classifier: &TypeClassifier,
    options: &ProfileOptions,
) -> Result<FileProfile, MatchError>
where
    R: RowSource + ?Sized,
{
    let identity = source.identity().to_string();
    let headers = source.headers().to_vec();
    warn_on_duplicate_headers(&identity, &headers);

    let mut candidates = vec![TypeCandidate::new(); headers.len()];
    let mut value_sets = if options.collect_values {
        vec![ValueSet::default(); headers.len()]
    } else {
        Vec::new()
    };

    let mut rows_read = 0usize;
    while let Some(row) = source.next_row()? {
        let sampling = options.sample_rows == 0 || rows_read < options.sample_rows;
        if !sampling && !options.collect_values {
            break;
        }
        for (idx, value) in row.iter().enumerate().take(headers.len()) {
            if sampling {
                classifier.observe(&mut candidates[idx], value);
            }
            if let Some(set) = value_sets.get_mut(idx) {
                set.insert(value);
            }
        }
        rows_read += 1;
    }

    let mut value_sets = value_sets.into_iter();
    let columns = headers
        .into_iter()
        .zip(candidates)
        .map(|(name, candidate)| ColumnProfile {
            name,
            label: candidate.decide(),
            non_empty: candidate.non_empty(),
            values: value_sets.next().map(Arc::new),
        })
        .collect::<Vec<_>>();

    debug!(
        "Profiled {} column(s) over {} row(s) from {}",
        columns.len(),
        rows_read,
        identity
    );
    Ok(FileProfile {
        source: identity,
        rows_read,
        columns,
    })
}

fn warn_on_duplicate_headers(identity: &str, headers: &[String]) {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            warn!(
                "Duplicate column '{header}' in {identity}; lookups by name use the first occurrence"
            );
        }
    }
}
