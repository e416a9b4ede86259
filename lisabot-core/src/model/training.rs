// File: lisabot-core/src/model/training.rs

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};
use lisabot_common::models::corpus::CorpusRecord;

use crate::model::classifier::sigmoid;
use crate::model::{
    ArtifactStore, CountVectorizer, FeatureTransform, LabelMap, ModelBundle, OneVsRestLogistic,
    SparseVector, TextVectorizer, TfidfTransformer, TrainedModel,
};
use crate::Error;

/// Produces a fresh bundle from whatever the bot has learned so far.
/// Blocking: callers on the async runtime should go through `spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait Retrainer: Send + Sync {
    fn retrain(&self) -> Result<ModelBundle, Error>;
}

#[derive(Debug, Clone)]
pub struct TrainingOptions {
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty applied to weights (not biases).
    pub l2: f64,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        Self { epochs: 300, learning_rate: 0.5, l2: 1e-4 }
    }
}

/// Training text in the same shape the classifier sees at prediction time.
pub fn training_text(record: &CorpusRecord) -> String {
    let author = record.author.strip_prefix('@').unwrap_or(&record.author);
    format!("{} {}", author, record.content)
}

/// Reads a JSONL corpus. Blank lines are ignored; lines that fail to parse (e.g. a
/// write cut short) are skipped with a warning.
pub fn read_corpus(path: &Path) -> Result<Vec<CorpusRecord>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<CorpusRecord>(&line) {
            Ok(rec) => records.push(rec),
            Err(e) => warn!("Skipping corpus line {} in {}: {}", lineno + 1, path.display(), e),
        }
    }
    Ok(records)
}

/// Fits vectorizer, tf-idf and a one-vs-rest logistic model on `records`.
/// Deterministic: zero-initialised weights, full-batch gradient descent.
pub fn fit(records: &[CorpusRecord], options: &TrainingOptions) -> Result<TrainedModel, Error> {
    if records.len() < 2 {
        return Err(Error::InsufficientCorpus(format!(
            "need at least 2 records, have {}",
            records.len()
        )));
    }
    let label_names: Vec<String> = records
        .iter()
        .flat_map(|r| r.emojis.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    if label_names.is_empty() {
        return Err(Error::InsufficientCorpus("no record carries an emoji label".into()));
    }

    let texts: Vec<String> = records.iter().map(training_text).collect();
    let vectorizer = CountVectorizer::fit(texts.iter().map(String::as_str));
    let n_features = vectorizer.n_features();
    if n_features == 0 {
        return Err(Error::InsufficientCorpus("corpus has no usable tokens".into()));
    }

    let counts: Vec<SparseVector> = texts.iter().map(|t| vectorizer.transform(t)).collect();
    let transformer = TfidfTransformer::fit(&counts, n_features);
    let rows: Vec<SparseVector> = counts.into_iter().map(|c| transformer.transform(c)).collect();

    let mut weights = Vec::with_capacity(label_names.len());
    let mut biases = Vec::with_capacity(label_names.len());
    for name in &label_names {
        let targets: Vec<f64> = records
            .iter()
            .map(|r| if r.emojis.iter().any(|e| e == name) { 1.0 } else { 0.0 })
            .collect();
        let (w, b) = fit_binary(&rows, &targets, n_features, options)?;
        weights.push(w);
        biases.push(b);
    }

    let model = TrainedModel {
        vectorizer,
        transformer,
        classifier: OneVsRestLogistic::new(n_features, weights, biases),
        label_map: LabelMap::from_names(label_names),
        trained_at: Utc::now(),
    };
    model.validate()?;
    Ok(model)
}

fn fit_binary(
    rows: &[SparseVector],
    targets: &[f64],
    n_features: usize,
    options: &TrainingOptions,
) -> Result<(Vec<f64>, f64), Error> {
    let n = rows.len() as f64;
    let mut w = vec![0.0; n_features];
    let mut b = 0.0;
    let mut grad = vec![0.0; n_features];

    for _ in 0..options.epochs {
        grad.iter_mut().for_each(|g| *g = 0.0);
        let mut grad_b = 0.0;
        for (row, &y) in rows.iter().zip(targets) {
            let z = row.iter().map(|&(i, v)| w[i] * v).sum::<f64>() + b;
            let err = sigmoid(z) - y;
            for &(i, v) in row {
                grad[i] += err * v;
            }
            grad_b += err;
        }
        for (wi, gi) in w.iter_mut().zip(&grad) {
            *wi -= options.learning_rate * (gi / n + options.l2 * *wi);
        }
        b -= options.learning_rate * grad_b / n;
    }

    if w.iter().any(|x| !x.is_finite()) || !b.is_finite() {
        return Err(Error::Training("gradient descent diverged".into()));
    }
    Ok((w, b))
}

/// Retrains from the recorder's JSONL corpus and persists the result to the store.
#[derive(Debug, Clone)]
pub struct CorpusRetrainer {
    corpus_path: PathBuf,
    store: ArtifactStore,
    options: TrainingOptions,
}

impl CorpusRetrainer {
    pub fn new(corpus_path: impl Into<PathBuf>, store: ArtifactStore) -> Self {
        Self { corpus_path: corpus_path.into(), store, options: TrainingOptions::default() }
    }

    pub fn with_options(mut self, options: TrainingOptions) -> Self {
        self.options = options;
        self
    }

    /// Fits and saves, returning the concrete artifacts.
    pub fn train(&self) -> Result<TrainedModel, Error> {
        let records = read_corpus(&self.corpus_path)?;
        info!("Retraining on {} corpus records from {}", records.len(), self.corpus_path.display());
        let model = fit(&records, &self.options)?;
        self.store.save(&model)?;
        Ok(model)
    }
}

impl Retrainer for CorpusRetrainer {
    fn retrain(&self) -> Result<ModelBundle, Error> {
        Ok(self.train()?.into_bundle())
    }
}
