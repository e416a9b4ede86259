// File: lisabot-core/tests/model_tests.rs

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use chrono::Utc;
use lisabot_common::models::corpus::CorpusRecord;
use lisabot_core::model::{
    ArtifactStore, CorpusRetrainer, EmojiClassifier, EmojiPredictor, FeatureTransform, LabelMap,
    ModelBundle, ModelHandle, ProbabilityEstimator, Retrainer, SparseVector, TextVectorizer,
    UNKNOWN_LABEL,
};
use lisabot_core::Error;

struct ConstVectorizer;

impl TextVectorizer for ConstVectorizer {
    fn transform(&self, _text: &str) -> SparseVector {
        vec![(0, 1.0)]
    }

    fn n_features(&self) -> usize {
        1
    }
}

struct Passthrough;

impl FeatureTransform for Passthrough {
    fn transform(&self, features: SparseVector) -> SparseVector {
        features
    }

    fn n_features(&self) -> usize {
        1
    }
}

/// Returns the same probability vector for any input.
struct FixedEstimator(Vec<f64>);

impl ProbabilityEstimator for FixedEstimator {
    fn predict_proba(&self, _features: &SparseVector) -> Vec<f64> {
        self.0.clone()
    }

    fn n_labels(&self) -> usize {
        self.0.len()
    }
}

fn fixed_bundle(probabilities: Vec<f64>, labels: LabelMap) -> ModelBundle {
    ModelBundle::new(
        Box::new(ConstVectorizer),
        Box::new(Passthrough),
        Box::new(FixedEstimator(probabilities)),
        labels,
    )
}

#[test]
fn threshold_boundary_excludes_equal_probability() {
    let bundle = fixed_bundle(vec![0.099, 0.100, 0.101], LabelMap::from_names(["a", "b", "c"]));
    assert_eq!(bundle.predict("anything", 0.10), vec!["c"]);
}

#[test]
fn unknown_index_becomes_placeholder() {
    let bundle = fixed_bundle(vec![0.9, 0.9], LabelMap::from_names(["only"]));
    assert_eq!(bundle.predict("anything", 0.10), vec!["only".to_string(), UNKNOWN_LABEL.to_string()]);
}

#[test]
fn several_labels_may_fire_at_once() {
    let bundle = fixed_bundle(vec![0.5, 0.0, 0.3], LabelMap::from_names(["a", "b", "c"]));
    assert_eq!(bundle.predict("anything", 0.10), vec!["a", "c"]);
}

/// A bundle whose classifier only ever fires label `index`, and whose label map only
/// knows `index`. Mixing artifacts from two such bundles decodes to `Unknown`.
fn tagged_bundle(index: usize, name: &str) -> ModelBundle {
    let mut probabilities = vec![0.0; 2];
    probabilities[index] = 1.0;
    let labels = LabelMap::new([(index, name.to_string())].into_iter().collect());
    fixed_bundle(probabilities, labels)
}

#[test]
fn readers_never_see_a_torn_bundle() {
    let models = Arc::new(ModelHandle::new(tagged_bundle(0, "old")));
    let classifier = EmojiClassifier::new(models.clone(), 0.10);
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let classifier = classifier.clone();
            let stop = stop.clone();
            thread::spawn(move || {
                let mut seen = 0usize;
                while !stop.load(Ordering::Relaxed) {
                    let labels = classifier.predict("hello");
                    assert!(
                        labels == ["old"] || labels == ["new"],
                        "torn bundle observed: {labels:?}"
                    );
                    seen += 1;
                }
                seen
            })
        })
        .collect();

    for i in 0..2_000 {
        let bundle = if i % 2 == 0 { tagged_bundle(1, "new") } else { tagged_bundle(0, "old") };
        models.publish(bundle);
    }
    stop.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().expect("reader panicked") > 0);
    }
    assert_eq!(models.generation(), 2_000);
}

fn write_corpus(path: &std::path::Path, records: &[(&str, &str, &[&str])]) {
    let mut file = std::fs::File::create(path).unwrap();
    for (author, content, emojis) in records {
        let rec = CorpusRecord {
            author: author.to_string(),
            content: content.to_string(),
            emojis: emojis.iter().map(|e| e.to_string()).collect(),
            recorded_at: Utc::now(),
        };
        writeln!(file, "{}", serde_json::to_string(&rec).unwrap()).unwrap();
    }
    // A torn trailing write must not poison the corpus.
    write!(file, "{{\"author\":\"lisa").unwrap();
}

#[test]
fn retrained_bundle_survives_store_round_trip() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let corpus = dir.path().join("corpus.jsonl");
    write_corpus(
        &corpus,
        &[
            ("lisa38", "pizza pizza yum", &["pizzaparty"]),
            ("lisa38", "pizza tonight", &["pizzaparty"]),
            ("lisa38", "so sad crying", &["lisacry"]),
            ("lisa38", "sad day", &["lisacry"]),
        ],
    );
    let store = ArtifactStore::new(dir.path().join("models"));
    let retrainer = CorpusRetrainer::new(&corpus, store.clone());

    let trained = retrainer.retrain()?;
    let loaded = store.load_bundle()?;

    for text in ["lisa38 pizza", "lisa38 sad", "lisa38 unrelated words"] {
        let (a, b) = (trained.probabilities(text), loaded.probabilities(text));
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| (x - y).abs() < 1e-9), "{a:?} vs {b:?}");
        // Same bundle, same input, same answer.
        assert_eq!(loaded.predict(text, 0.10), loaded.predict(text, 0.10));
    }
    assert_eq!(loaded.predict("lisa38 pizza", 0.5), vec!["pizzaparty"]);
    Ok(())
}

#[test]
fn retraining_without_corpus_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let retrainer = CorpusRetrainer::new(dir.path().join("missing.jsonl"), ArtifactStore::new(dir.path()));
    assert!(matches!(retrainer.retrain(), Err(Error::Io(_))));
}
