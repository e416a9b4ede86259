// File: lisabot-core/src/model/store.rs

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::model::{CountVectorizer, LabelMap, ModelBundle, OneVsRestLogistic, TfidfTransformer};
use crate::Error;

pub const ARTIFACT_FORMAT_VERSION: u32 = 2;

const VECTORIZER_FILE: &str = "vectorizer.json";
const TRANSFORMER_FILE: &str = "transformer.json";
const CLASSIFIER_FILE: &str = "classifier.json";
const LABEL_MAP_FILE: &str = "label_map.json";

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    format_version: u32,
    kind: String,
    /// Shared by the four files of one save; a mismatch means a torn write.
    generation: u64,
    trained_at: DateTime<Utc>,
    payload: T,
}

/// What every envelope of one saved set must agree on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Stamp {
    generation: u64,
    trained_at: DateTime<Utc>,
}

/// Concrete fitted artifacts, as produced by training and persisted by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub vectorizer: CountVectorizer,
    pub transformer: TfidfTransformer,
    pub classifier: OneVsRestLogistic,
    pub label_map: LabelMap,
    pub trained_at: DateTime<Utc>,
}

impl TrainedModel {
    /// Checks that the four artifacts fit together.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.vectorizer.is_consistent() {
            return Err(Error::Model("vectorizer vocabulary has duplicate or out-of-range indices".into()));
        }
        if !self.classifier.is_consistent() {
            return Err(Error::Model("classifier weights do not match its feature count".into()));
        }
        let features = self.vectorizer.vocabulary().len();
        if self.transformer.idf().len() != features {
            return Err(Error::Model(format!(
                "transformer expects {} features, vectorizer produces {}",
                self.transformer.idf().len(),
                features
            )));
        }
        if self.classifier.weights().iter().any(|w| w.len() != features) {
            return Err(Error::Model("classifier feature width differs from vectorizer".into()));
        }
        let labels = self.classifier.weights().len();
        if self.label_map.len() != labels || self.label_map.max_index().is_some_and(|m| m >= labels) {
            return Err(Error::Model(format!(
                "label map has {} entries for {} classifier labels",
                self.label_map.len(),
                labels
            )));
        }
        Ok(())
    }

    pub fn into_bundle(self) -> ModelBundle {
        ModelBundle::new(
            Box::new(self.vectorizer),
            Box::new(self.transformer),
            Box::new(self.classifier),
            self.label_map,
        )
        .with_trained_at(self.trained_at)
    }
}

/// Directory holding the four serialized artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads and cross-checks all four artifacts. Any missing, unreadable or
    /// inconsistent artifact is an error; there is no partial load. Files written
    /// by different saves are rejected even when their dimensions happen to agree.
    pub fn load(&self) -> Result<TrainedModel, Error> {
        let (vectorizer, stamp) = self.read_artifact::<CountVectorizer>(VECTORIZER_FILE, "vectorizer")?;
        let (transformer, t) = self.read_artifact::<TfidfTransformer>(TRANSFORMER_FILE, "transformer")?;
        self.check_stamp(TRANSFORMER_FILE, stamp, t)?;
        let (classifier, c) = self.read_artifact::<OneVsRestLogistic>(CLASSIFIER_FILE, "classifier")?;
        self.check_stamp(CLASSIFIER_FILE, stamp, c)?;
        let (label_map, l) = self.read_artifact::<LabelMap>(LABEL_MAP_FILE, "label_map")?;
        self.check_stamp(LABEL_MAP_FILE, stamp, l)?;

        let trained_at = stamp.trained_at;
        let model = TrainedModel { vectorizer, transformer, classifier, label_map, trained_at };
        model.validate()?;
        info!(
            "Loaded model artifacts from {} ({} features, {} labels, trained {})",
            self.dir.display(),
            model.vectorizer.vocabulary().len(),
            model.label_map.len(),
            model.trained_at
        );
        Ok(model)
    }

    pub fn load_bundle(&self) -> Result<ModelBundle, Error> {
        Ok(self.load()?.into_bundle())
    }

    /// Serializes all four artifacts into temp files first and only then renames them
    /// into place. Every file carries the same generation, so a set left mixed by a
    /// failure between renames is refused by [`ArtifactStore::load`].
    pub fn save(&self, model: &TrainedModel) -> Result<(), Error> {
        model.validate()?;
        fs::create_dir_all(&self.dir)?;
        let stamp = Stamp { generation: rand::random(), trained_at: model.trained_at };
        let staged = [
            (VECTORIZER_FILE, self.stage_artifact("vectorizer", stamp, &model.vectorizer)?),
            (TRANSFORMER_FILE, self.stage_artifact("transformer", stamp, &model.transformer)?),
            (CLASSIFIER_FILE, self.stage_artifact("classifier", stamp, &model.classifier)?),
            (LABEL_MAP_FILE, self.stage_artifact("label_map", stamp, &model.label_map)?),
        ];
        for (file, tmp) in staged {
            tmp.persist(self.dir.join(file)).map_err(|e| Error::Io(e.error))?;
        }
        info!("Saved model artifacts to {} (generation {:016x})", self.dir.display(), stamp.generation);
        Ok(())
    }

    fn check_stamp(&self, file: &str, expected: Stamp, found: Stamp) -> Result<(), Error> {
        if found != expected {
            return Err(Error::Model(format!(
                "{} belongs to a different save than {} (generation {:016x} vs {:016x})",
                self.dir.join(file).display(),
                VECTORIZER_FILE,
                found.generation,
                expected.generation
            )));
        }
        Ok(())
    }

    fn read_artifact<T: DeserializeOwned>(
        &self,
        file: &str,
        kind: &str,
    ) -> Result<(T, Stamp), Error> {
        let path = self.dir.join(file);
        let raw = fs::read(&path)
            .map_err(|e| Error::Model(format!("cannot read {}: {e}", path.display())))?;
        let envelope: Envelope<T> = serde_json::from_slice(&raw)
            .map_err(|e| Error::Model(format!("corrupt artifact {}: {e}", path.display())))?;
        if envelope.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(Error::Model(format!(
                "{} has format version {}, expected {}",
                path.display(),
                envelope.format_version,
                ARTIFACT_FORMAT_VERSION
            )));
        }
        if envelope.kind != kind {
            return Err(Error::Model(format!(
                "{} holds a '{}' artifact, expected '{}'",
                path.display(),
                envelope.kind,
                kind
            )));
        }
        debug!("Read artifact {}", path.display());
        let stamp = Stamp { generation: envelope.generation, trained_at: envelope.trained_at };
        Ok((envelope.payload, stamp))
    }

    fn stage_artifact<T: Serialize>(&self, kind: &str, stamp: Stamp, payload: &T) -> Result<NamedTempFile, Error> {
        let envelope = Envelope {
            format_version: ARTIFACT_FORMAT_VERSION,
            kind: kind.to_string(),
            generation: stamp.generation,
            trained_at: stamp.trained_at,
            payload,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, &envelope)?;
        tmp.flush()?;
        Ok(tmp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> TrainedModel {
        let vectorizer = CountVectorizer::fit(["pizza good"]);
        TrainedModel {
            transformer: TfidfTransformer::from_idf(vec![1.0, 1.0]),
            classifier: OneVsRestLogistic::new(2, vec![vec![1.0, 2.0]], vec![0.5]),
            label_map: LabelMap::from_names(["pog"]),
            vectorizer,
            trained_at: Utc::now(),
        }
    }

    #[test]
    fn save_then_load_gives_same_model() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let model = tiny_model();
        store.save(&model).unwrap();
        assert_eq!(store.load().unwrap(), model);
    }

    #[test]
    fn missing_directory_is_a_model_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("nope"));
        assert!(matches!(store.load(), Err(Error::Model(_))));
    }

    #[test]
    fn corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&tiny_model()).unwrap();
        fs::write(dir.path().join(CLASSIFIER_FILE), b"{not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Model(_))));
    }

    #[test]
    fn artifacts_from_different_saves_are_rejected() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(first.path());
        let model = tiny_model();
        store.save(&model).unwrap();

        // Same dimensions, same timestamp, different vocabulary.
        let other = TrainedModel { vectorizer: CountVectorizer::fit(["sad day"]), ..model.clone() };
        ArtifactStore::new(second.path()).save(&other).unwrap();

        // Only the vectorizer of the second save made it into place.
        fs::copy(second.path().join(VECTORIZER_FILE), first.path().join(VECTORIZER_FILE)).unwrap();
        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::Model(ref m) if m.contains("different save")), "{err:?}");
    }

    #[test]
    fn old_format_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&tiny_model()).unwrap();
        let path = dir.path().join(LABEL_MAP_FILE);
        let mut raw: serde_json::Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        raw["format_version"] = serde_json::json!(1);
        fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();
        assert!(matches!(store.load(), Err(Error::Model(_))));
    }

    #[test]
    fn mismatched_dimensions_are_rejected() {
        let mut model = tiny_model();
        model.label_map = LabelMap::from_names(["pog", "extra"]);
        assert!(matches!(model.validate(), Err(Error::Model(_))));
    }
}
