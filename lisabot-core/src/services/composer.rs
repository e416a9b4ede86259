// File: lisabot-core/src/services/composer.rs

use lisabot_common::models::emoji::GuildEmoji;

use crate::random::RandomSource;

/// What the bot should do in the channel for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Reply threaded under the triggering message.
    Reply(String),
    /// Post a fresh message in the same channel.
    Post(String),
}

impl OutboundAction {
    pub fn text(&self) -> &str {
        match self {
            OutboundAction::Reply(t) | OutboundAction::Post(t) => t,
        }
    }
}

pub const FILLER_CONFUSED: &str = "HUH";
pub const FILLER_QUESTION: &str = "??";

/// Maps classifier labels onto the guild's installed custom emojis. Labels with no
/// installed counterpart are dropped.
pub fn resolve_emojis(labels: &[String], guild_emojis: &[GuildEmoji]) -> Vec<String> {
    labels
        .iter()
        .flat_map(|label| {
            guild_emojis
                .iter()
                .filter(move |emoji| emoji.matches_label(label))
                .map(GuildEmoji::token)
        })
        .collect()
}

/// Builds the outbound action from the Likert answer and resolved emoji tokens.
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn compose(
        &self,
        likert_answer: Option<&str>,
        emoji_tokens: &[String],
        rng: &mut dyn RandomSource,
    ) -> Option<OutboundAction> {
        let likert = likert_answer.unwrap_or_default();
        if !likert.is_empty() || !emoji_tokens.is_empty() {
            let text = format!("{} {}", likert, emoji_tokens.concat()).trim().to_string();
            return Some(if rng.roll(2) == 1 {
                OutboundAction::Reply(text)
            } else {
                OutboundAction::Post(text)
            });
        }

        match rng.roll(4) {
            1 => Some(OutboundAction::Post(FILLER_CONFUSED.to_string())),
            2 => Some(OutboundAction::Post(FILLER_QUESTION.to_string())),
            _ => None,
        }
    }
}
