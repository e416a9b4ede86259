use std::sync::Arc;

use tracing::trace;

use crate::model::ModelHandle;

/// Text in, emoji names out.
#[cfg_attr(test, mockall::automock)]
pub trait EmojiPredictor: Send + Sync {
    fn predict(&self, text: &str) -> Vec<String>;
}

/// Classifies against whatever bundle is active at call time.
#[derive(Debug, Clone)]
pub struct EmojiClassifier {
    models: Arc<ModelHandle>,
    threshold: f64,
}

impl EmojiClassifier {
    pub fn new(models: Arc<ModelHandle>, threshold: f64) -> Self {
        Self { models, threshold }
    }
}

impl EmojiPredictor for EmojiClassifier {
    fn predict(&self, text: &str) -> Vec<String> {
        let bundle = self.models.current();
        let labels = bundle.predict(text, self.threshold);
        trace!("Classified {:?} => {:?}", text, labels);
        labels
    }
}
