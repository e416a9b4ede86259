use crate::models::emoji::GuildEmoji;

/// One chat message as seen by the decision pipeline.
///
/// Ids are the platform's numeric snowflakes. The record is never mutated once built;
/// the echo tracker keeps its own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub message_id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub author_name: String,
    pub author_is_bot: bool,
    pub content: String,
}

impl ChatMessage {
    /// Identifier prepended to classifier input. A leading `@` is dropped so that
    /// `@lisa38` and `lisa38` land on the same token.
    pub fn author_tag(&self) -> &str {
        self.author_name.strip_prefix('@').unwrap_or(&self.author_name)
    }
}

/// A message together with the custom emoji catalog of the guild it was posted in.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message: ChatMessage,
    pub guild_emojis: Vec<GuildEmoji>,
}
