// File: lisabot-core/src/state/activity.rs

use std::sync::atomic::{AtomicI64, Ordering};

use tracing::debug;
use lisabot_common::models::message::ChatMessage;

/// The bot's "mood": how willing it is to chime in unprompted.
///
/// Shared between the dispatcher and the refresh task. Updates are plain atomic adds;
/// there is no floor, the value may go negative.
#[derive(Debug)]
pub struct ActivityCounter {
    value: AtomicI64,
}

impl ActivityCounter {
    pub fn new(baseline: i64) -> Self {
        Self { value: AtomicI64::new(baseline) }
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Adds `amount` and returns the new value.
    pub fn bump(&self, amount: i64) -> i64 {
        self.value.fetch_add(amount, Ordering::Relaxed) + amount
    }

    /// Subtracts one and returns the new value.
    pub fn decay(&self) -> i64 {
        self.value.fetch_sub(1, Ordering::Relaxed) - 1
    }

    pub fn is_awake(&self) -> bool {
        self.get() > 0
    }
}

/// What the echo tracker remembers about the previous message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviousMessage {
    /// Nothing seen since startup.
    #[default]
    Unset,
    Holding(ChatMessage),
    /// The held message was just echoed; it cannot trigger another echo.
    Consumed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EchoOutcome {
    /// Repeat this text into the channel and stop processing the message.
    Echo(String),
    Continue,
}

/// Detects the "everyone posts the same thing" pattern.
#[derive(Debug, Default)]
pub struct EchoTracker {
    previous: PreviousMessage,
}

impl EchoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn previous(&self) -> &PreviousMessage {
        &self.previous
    }

    /// Compares `message` to the held one. A repeat of the same text by a different author
    /// echoes and consumes the held message; anything else becomes the new held message.
    /// Blank text (attachment-only messages) never echoes.
    pub fn observe(&mut self, message: &ChatMessage) -> EchoOutcome {
        if let PreviousMessage::Holding(prev) = &self.previous {
            if prev.content == message.content
                && prev.author_id != message.author_id
                && !message.content.trim().is_empty()
            {
                debug!(
                    "Echo: author {} repeated message from author {}",
                    message.author_id, prev.author_id
                );
                let text = message.content.clone();
                self.previous = PreviousMessage::Consumed;
                return EchoOutcome::Echo(text);
            }
        }
        self.previous = PreviousMessage::Holding(message.clone());
        EchoOutcome::Continue
    }
}
