use async_trait::async_trait;

use crate::error::Error;
use crate::models::message::ChatMessage;

/// The two outbound actions a chat platform must offer the bot.
#[async_trait]
pub trait ChatOutbound: Send + Sync {
    /// Reply to `message`, threading the response under it.
    async fn reply_to(&self, message: &ChatMessage, text: &str) -> Result<(), Error>;

    /// Post a fresh message in `channel_id`.
    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<(), Error>;
}
