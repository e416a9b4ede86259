// File: lisabot-core/src/model/bundle.rs

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::model::{FeatureTransform, LabelMap, ProbabilityEstimator, TextVectorizer};

/// Indices whose probability is strictly above `threshold`, in index order.
pub fn select_labels(probabilities: &[f64], threshold: f64) -> Vec<usize> {
    probabilities
        .iter()
        .enumerate()
        .filter(|&(_, &p)| p > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// The four artifacts that together classify text. Never mutated; replaced whole.
pub struct ModelBundle {
    pub vectorizer: Box<dyn TextVectorizer>,
    pub transformer: Box<dyn FeatureTransform>,
    pub classifier: Box<dyn ProbabilityEstimator>,
    pub label_map: LabelMap,
    pub trained_at: Option<DateTime<Utc>>,
}

impl ModelBundle {
    pub fn new(
        vectorizer: Box<dyn TextVectorizer>,
        transformer: Box<dyn FeatureTransform>,
        classifier: Box<dyn ProbabilityEstimator>,
        label_map: LabelMap,
    ) -> Self {
        Self { vectorizer, transformer, classifier, label_map, trained_at: None }
    }

    pub fn with_trained_at(mut self, trained_at: DateTime<Utc>) -> Self {
        self.trained_at = Some(trained_at);
        self
    }

    pub fn probabilities(&self, text: &str) -> Vec<f64> {
        let counts = self.vectorizer.transform(text);
        let weighted = self.transformer.transform(counts);
        self.classifier.predict_proba(&weighted)
    }

    /// Emoji names for every label above `threshold`. Indices missing from the label
    /// map come back as the `Unknown` placeholder.
    pub fn predict(&self, text: &str, threshold: f64) -> Vec<String> {
        select_labels(&self.probabilities(text), threshold)
            .into_iter()
            .map(|i| self.label_map.decode(i).to_string())
            .collect()
    }
}

impl fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelBundle")
            .field("features", &self.vectorizer.n_features())
            .field("labels", &self.classifier.n_labels())
            .field("label_map", &self.label_map.len())
            .field("trained_at", &self.trained_at)
            .finish()
    }
}

/// The active bundle. Readers take a snapshot `Arc` and keep using it even if a new
/// bundle is published meanwhile; the write lock is held only for the pointer swap.
#[derive(Debug)]
pub struct ModelHandle {
    current: RwLock<Arc<ModelBundle>>,
    generation: AtomicU64,
}

impl ModelHandle {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { current: RwLock::new(Arc::new(bundle)), generation: AtomicU64::new(0) }
    }

    pub fn current(&self) -> Arc<ModelBundle> {
        self.current.read().clone()
    }

    /// Replaces the active bundle and returns its generation number (startup bundle is 0).
    pub fn publish(&self, bundle: ModelBundle) -> u64 {
        let next = Arc::new(bundle);
        let mut guard = self.current.write();
        *guard = next;
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }
}
