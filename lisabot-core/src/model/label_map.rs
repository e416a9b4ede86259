use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Placeholder for a label index the map does not know.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Classifier label index to emoji name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMap {
    labels: BTreeMap<usize, String>,
}

impl LabelMap {
    pub fn new(labels: BTreeMap<usize, String>) -> Self {
        Self { labels }
    }

    /// Index `i` maps to the `i`-th name.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { labels: names.into_iter().map(Into::into).enumerate().collect() }
    }

    pub fn decode(&self, index: usize) -> &str {
        self.labels.get(&index).map(String::as_str).unwrap_or(UNKNOWN_LABEL)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn max_index(&self) -> Option<usize> {
        self.labels.keys().next_back().copied()
    }
}
