use async_trait::async_trait;

use crate::error::Error;
use crate::models::emoji::GuildEmoji;
use crate::models::message::ChatMessage;

/// Persists messages from the training source so the next retrain can learn from them.
/// Callers treat this as fire-and-forget: an error is logged, never propagated.
#[async_trait]
pub trait Recorder: Send + Sync {
    async fn record(&self, message: &ChatMessage, guild_emojis: &[GuildEmoji]) -> Result<(), Error>;
}
