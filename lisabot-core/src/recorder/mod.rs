//! Corpus recording: appends the training source's messages to a JSONL file that the
//! retrainer reads back.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use lisabot_common::models::corpus::CorpusRecord;
use lisabot_common::models::emoji::GuildEmoji;
use lisabot_common::models::message::ChatMessage;
use lisabot_common::traits::recorder_traits::Recorder;

use crate::Error;

/// `<:name:id>` or `<a:name:id>`.
static CUSTOM_EMOJI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<a?:(\w+):\d+>").expect("valid custom emoji pattern"));

/// Splits message text into plain content and the names of installed custom emojis it
/// used. Emoji tokens are removed from the content whether or not they are installed.
pub fn extract_emojis(content: &str, guild_emojis: &[GuildEmoji]) -> (String, Vec<String>) {
    let names = CUSTOM_EMOJI
        .captures_iter(content)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|name| guild_emojis.iter().any(|e| e.name == *name))
        .map(str::to_string)
        .collect();
    let stripped = CUSTOM_EMOJI.replace_all(content, " ");
    let text = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    (text, names)
}

pub fn corpus_record(message: &ChatMessage, guild_emojis: &[GuildEmoji]) -> CorpusRecord {
    let (content, emojis) = extract_emojis(&message.content, guild_emojis);
    CorpusRecord {
        author: message.author_tag().to_string(),
        content,
        emojis,
        recorded_at: Utc::now(),
    }
}

#[derive(Debug, Clone)]
pub struct JsonlCorpusRecorder {
    path: PathBuf,
}

impl JsonlCorpusRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Recorder for JsonlCorpusRecorder {
    async fn record(&self, message: &ChatMessage, guild_emojis: &[GuildEmoji]) -> Result<(), Error> {
        let record = corpus_record(message, guild_emojis);
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        debug!("Recorded message {} with {} emoji(s)", message.message_id, record.emojis.len());
        Ok(())
    }
}
