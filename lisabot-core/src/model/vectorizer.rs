// File: lisabot-core/src/model/vectorizer.rs

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{SparseVector, TextVectorizer};

/// Words of two or more word characters.
static TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").expect("valid token pattern"));

pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN_PATTERN.find_iter(text).map(|m| m.as_str().to_lowercase())
}

/// Bag-of-words counts over a fixed vocabulary. Tokens outside the vocabulary are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    pub fn from_vocabulary(vocabulary: BTreeMap<String, usize>) -> Self {
        Self { vocabulary }
    }

    /// Learns a vocabulary from `docs`; indices follow the sorted token order.
    pub fn fit<'a>(docs: impl IntoIterator<Item = &'a str>) -> Self {
        let mut tokens: Vec<String> = docs.into_iter().flat_map(tokenize).collect();
        tokens.sort_unstable();
        tokens.dedup();
        let vocabulary = tokens.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &BTreeMap<String, usize> {
        &self.vocabulary
    }

    /// Every vocabulary index must be unique and below the vocabulary size.
    pub fn is_consistent(&self) -> bool {
        let mut seen = vec![false; self.vocabulary.len()];
        self.vocabulary.values().all(|&i| {
            i < seen.len() && !std::mem::replace(&mut seen[i], true)
        })
    }
}

impl TextVectorizer for CountVectorizer {
    fn transform(&self, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }
        counts.into_iter().collect()
    }

    fn n_features(&self) -> usize {
        self.vocabulary.len()
    }
}
