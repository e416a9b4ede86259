// File: lisabot-core/src/services/message_service.rs

use std::sync::Arc;

use tracing::debug;
use lisabot_common::models::emoji::GuildEmoji;
use lisabot_common::models::message::ChatMessage;

use crate::config::BotConfig;
use crate::model::EmojiPredictor;
use crate::random::RandomSource;
use crate::services::activation::ActivationGate;
use crate::services::composer::{resolve_emojis, OutboundAction, ResponseComposer};
use crate::services::mention_service::{LikertResponder, MentionDetector};
use crate::services::trigger_service::TriggerTable;
use crate::state::{ActivityCounter, EchoOutcome, EchoTracker};

/// Per-message decision logic. Holds no I/O; the dispatcher executes whatever action
/// comes back. Messages must be fed one at a time, in arrival order.
pub struct MessagePipeline {
    echo: EchoTracker,
    triggers: TriggerTable,
    mentions: MentionDetector,
    likert: LikertResponder,
    gate: ActivationGate,
    composer: ResponseComposer,
    predictor: Arc<dyn EmojiPredictor>,
    activity: Arc<ActivityCounter>,
    rng: Box<dyn RandomSource>,
    mention_boost: i64,
}

impl MessagePipeline {
    pub fn new(
        config: &BotConfig,
        bot_id: u64,
        triggers: TriggerTable,
        predictor: Arc<dyn EmojiPredictor>,
        activity: Arc<ActivityCounter>,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        Self {
            echo: EchoTracker::new(),
            triggers,
            mentions: MentionDetector::new(bot_id),
            likert: LikertResponder,
            gate: ActivationGate::new(config.activation_odds),
            composer: ResponseComposer,
            predictor,
            activity,
            rng,
            mention_boost: config.mention_boost,
        }
    }

    pub fn activity(&self) -> &ActivityCounter {
        &self.activity
    }

    pub fn echo_tracker(&self) -> &EchoTracker {
        &self.echo
    }

    /// Runs one message through echo, trigger, mention, gate, classifier and composer,
    /// stopping at the first stage that settles the outcome.
    pub fn handle(&mut self, message: &ChatMessage, guild_emojis: &[GuildEmoji]) -> Option<OutboundAction> {
        if let EchoOutcome::Echo(text) = self.echo.observe(message) {
            return Some(OutboundAction::Post(text));
        }

        if let Some(reply) = self.triggers.respond_to(&message.content) {
            return Some(OutboundAction::Reply(reply));
        }

        let addressing = self.mentions.inspect(&message.content);
        let likert_answer = if addressing.mentioned {
            let level = self.activity.bump(self.mention_boost);
            debug!("Mentioned by {}; activity now {}", message.author_id, level);
            self.likert.answer(&addressing.operative_text, self.rng.as_mut())
        } else {
            None
        };

        if !self.gate.should_classify(addressing.mentioned, &self.activity, self.rng.as_mut()) {
            return None;
        }

        let input = format!("{} {}", message.author_tag(), addressing.operative_text);
        let labels = self.predictor.predict(&input);
        let tokens = resolve_emojis(&labels, guild_emojis);
        debug!("Classifier labels {:?}, resolved {} emoji(s)", labels, tokens.len());

        let action = self.composer.compose(likert_answer.as_deref(), &tokens, self.rng.as_mut());
        self.activity.decay();
        action
    }
}
