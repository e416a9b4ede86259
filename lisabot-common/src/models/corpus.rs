use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the training corpus: what the training source said and which guild
/// emojis they used while saying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusRecord {
    pub author: String,
    /// Message text with custom emoji tokens removed.
    pub content: String,
    /// Names of the custom emojis found in the original text, in order of appearance.
    #[serde(default)]
    pub emojis: Vec<String>,
    pub recorded_at: DateTime<Utc>,
}
