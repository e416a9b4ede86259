// File: lisabot-core/src/services/dispatcher.rs

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, error, info, warn};

use lisabot_common::models::message::{ChatMessage, InboundMessage};
use lisabot_common::traits::platform_traits::ChatOutbound;
use lisabot_common::traits::recorder_traits::Recorder;

use crate::services::composer::OutboundAction;
use crate::services::message_service::MessagePipeline;
use crate::Error;

/// Feeds inbound messages through the pipeline, one at a time, and carries out the
/// resulting actions on the platform.
pub struct MessageDispatcher {
    pipeline: MessagePipeline,
    outbound: Arc<dyn ChatOutbound>,
    recorder: Option<Arc<dyn Recorder>>,
    training_source: String,
}

impl MessageDispatcher {
    pub fn new(pipeline: MessagePipeline, outbound: Arc<dyn ChatOutbound>) -> Self {
        Self { pipeline, outbound, recorder: None, training_source: String::new() }
    }

    /// Messages from `training_source` are handed to `recorder` before anything else.
    pub fn with_recorder(mut self, recorder: Arc<dyn Recorder>, training_source: impl Into<String>) -> Self {
        self.recorder = Some(recorder);
        self.training_source = training_source.into();
        self
    }

    pub fn pipeline(&self) -> &MessagePipeline {
        &self.pipeline
    }

    /// Handles a single message. Recording failures are logged and swallowed; a failed
    /// send is returned to the caller.
    pub async fn dispatch(&mut self, inbound: InboundMessage) -> Result<Option<OutboundAction>, Error> {
        let InboundMessage { message, guild_emojis } = inbound;
        if message.author_is_bot {
            debug!("Ignoring bot message from {}", message.author_name);
            return Ok(None);
        }

        if let Some(recorder) = &self.recorder {
            if message.author_tag() == self.training_source {
                if let Err(e) = recorder.record(&message, &guild_emojis).await {
                    warn!("Failed to record message {}: {:?}", message.message_id, e);
                }
            }
        }

        let Some(action) = self.pipeline.handle(&message, &guild_emojis) else {
            return Ok(None);
        };
        self.deliver(&message, &action).await?;
        Ok(Some(action))
    }

    async fn deliver(&self, message: &ChatMessage, action: &OutboundAction) -> Result<(), Error> {
        match action {
            OutboundAction::Reply(text) => self.outbound.reply_to(message, text).await,
            OutboundAction::Post(text) => self.outbound.send_to_channel(message.channel_id, text).await,
        }
    }

    /// Drains `rx` until every sender is gone. A failure on one message never stops the loop.
    pub async fn run(mut self, mut rx: UnboundedReceiver<InboundMessage>) {
        info!("Message dispatcher started.");
        while let Some(inbound) = rx.recv().await {
            let message_id = inbound.message.message_id;
            if let Err(e) = self.dispatch(inbound).await {
                error!("Failed to respond to message {}: {:?}", message_id, e);
            }
        }
        info!("Message dispatcher stopped: inbound channel closed.");
    }
}
