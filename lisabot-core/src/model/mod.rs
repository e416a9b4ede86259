//! The emoji model: four artifacts that turn text into emoji labels, the handle that
//! swaps them as one unit, and the code that loads, stores and fits them.

pub mod bundle;
pub mod classifier;
pub mod label_map;
pub mod predictor;
pub mod store;
pub mod tfidf;
pub mod training;
pub mod vectorizer;

pub use bundle::{select_labels, ModelBundle, ModelHandle};
pub use classifier::OneVsRestLogistic;
pub use label_map::{LabelMap, UNKNOWN_LABEL};
pub use predictor::{EmojiClassifier, EmojiPredictor};
pub use store::{ArtifactStore, TrainedModel};
pub use tfidf::TfidfTransformer;
pub use training::{CorpusRetrainer, Retrainer, TrainingOptions};
pub use vectorizer::CountVectorizer;

/// Sparse feature row: `(feature index, value)` pairs sorted by index, zeros omitted.
pub type SparseVector = Vec<(usize, f64)>;

/// Text to sparse features.
pub trait TextVectorizer: Send + Sync {
    fn transform(&self, text: &str) -> SparseVector;
    fn n_features(&self) -> usize;
}

/// Feature reweighting applied after vectorizing.
pub trait FeatureTransform: Send + Sync {
    fn transform(&self, features: SparseVector) -> SparseVector;
    fn n_features(&self) -> usize;
}

/// Independent per-label probabilities for one feature row.
pub trait ProbabilityEstimator: Send + Sync {
    fn predict_proba(&self, features: &SparseVector) -> Vec<f64>;
    fn n_labels(&self) -> usize;
}
