use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{CloseFrame, Event, EventTypeFlags, Intents, MessageSender, Shard, ShardId, StreamExt};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::channel::Message;
use twilight_model::id::marker::{ChannelMarker, GuildMarker, MessageMarker};
use twilight_model::id::Id;

use lisabot_common::models::emoji::GuildEmoji;
use lisabot_common::models::message::{ChatMessage, InboundMessage};
use lisabot_common::traits::platform_traits::ChatOutbound;

use crate::Error;

fn to_chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        message_id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        guild_id: msg.guild_id.map(|g| g.get()),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
        content: msg.content.clone(),
    }
}

/// The guild's custom emoji catalog. Fetched per message so newly added emojis are
/// picked up; a failed fetch just means nothing resolves for that message.
async fn fetch_guild_emojis(http: &HttpClient, guild_id: Option<Id<GuildMarker>>) -> Vec<GuildEmoji> {
    let Some(guild_id) = guild_id else {
        return Vec::new();
    };
    let emojis = match http.emojis(guild_id).await {
        Ok(resp) => resp.models().await,
        Err(e) => {
            warn!("Error fetching emojis for guild {guild_id} => {e:?}");
            return Vec::new();
        }
    };
    match emojis {
        Ok(list) => list
            .into_iter()
            .map(|e| GuildEmoji { id: e.id.get(), name: e.name, animated: e.animated })
            .collect(),
        Err(e) => {
            warn!("Error parsing emojis for guild {guild_id} => {e:?}");
            Vec::new()
        }
    }
}

/// Reads gateway events and forwards every message, paired with its guild's emoji
/// catalog, to `tx`. Bot-authored messages are dropped here already.
async fn shard_runner(mut shard: Shard, tx: UnboundedSender<InboundMessage>, http: Arc<HttpClient>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::READY | EventTypeFlags::MESSAGE_CREATE).await {
        match item {
            Ok(Event::Ready(ready)) => {
                info!("Shard {shard_id} => READY as {} (ID={})", ready.user.name, ready.user.id);
            }
            Ok(Event::MessageCreate(msg)) => {
                if msg.author.bot {
                    debug!("Ignoring bot message from {}", msg.author.name);
                    continue;
                }
                let guild_emojis = fetch_guild_emojis(&http, msg.guild_id).await;
                let inbound = InboundMessage { message: to_chat_message(&msg), guild_emojis };
                if tx.send(inbound).is_err() {
                    warn!("Shard {shard_id} => dispatcher is gone; stopping.");
                    break;
                }
            }
            Ok(other) => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

fn channel_id(raw: u64) -> Result<Id<ChannelMarker>, Error> {
    Id::new_checked(raw).ok_or_else(|| Error::Platform(format!("Invalid channel ID: {raw}")))
}

fn message_id(raw: u64) -> Result<Id<MessageMarker>, Error> {
    Id::new_checked(raw).ok_or_else(|| Error::Platform(format!("Invalid message ID: {raw}")))
}

/// Sends the bot's replies and posts through the Discord REST API.
#[derive(Clone)]
pub struct DiscordOutbound {
    http: Arc<HttpClient>,
}

impl DiscordOutbound {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChatOutbound for DiscordOutbound {
    async fn reply_to(&self, message: &ChatMessage, text: &str) -> Result<(), Error> {
        let channel = channel_id(message.channel_id)?;
        let reply_to = message_id(message.message_id)?;
        self.http
            .create_message(channel)
            .content(text)
            .reply(reply_to)
            .await
            .map_err(|e| Error::Platform(format!("Error replying on Discord: {e:?}")))?;
        Ok(())
    }

    async fn send_to_channel(&self, channel: u64, text: &str) -> Result<(), Error> {
        self.http
            .create_message(channel_id(channel)?)
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;
        Ok(())
    }
}

/// Gateway connection plus REST client for one bot token.
pub struct DiscordRuntime {
    token: String,
    http: Arc<HttpClient>,
    shard_task: Option<JoinHandle<()>>,
    shard_sender: Option<MessageSender>,
}

impl DiscordRuntime {
    pub fn new(token: String) -> Self {
        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        Self { token, http, shard_task: None, shard_sender: None }
    }

    pub fn outbound(&self) -> DiscordOutbound {
        DiscordOutbound::new(self.http.clone())
    }

    /// The bot's own user id, needed to recognise mentions.
    pub async fn current_user_id(&self) -> Result<u64, Error> {
        let user = self
            .http
            .current_user()
            .await
            .map_err(|e| Error::Platform(format!("Error fetching current user: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing current user: {e:?}")))?;
        info!("(DiscordRuntime) Logged in as {} (ID={})", user.name, user.id);
        Ok(user.id.get())
    }

    /// Opens the gateway and starts forwarding messages to `tx`.
    pub fn start(&mut self, tx: UnboundedSender<InboundMessage>) -> Result<(), Error> {
        if self.token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }
        if self.shard_task.is_some() {
            info!("(DiscordRuntime) Already connected => skipping");
            return Ok(());
        }

        let shard = Shard::new(
            ShardId::ONE,
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT,
        );
        self.shard_sender = Some(shard.sender());

        let http = self.http.clone();
        self.shard_task = Some(tokio::spawn(async move {
            shard_runner(shard, tx, http).await;
        }));
        Ok(())
    }

    /// Closes the gateway and waits briefly for the shard runner to finish.
    pub async fn shutdown(&mut self) {
        if let Some(sender) = self.shard_sender.take() {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        if let Some(mut task) = self.shard_task.take() {
            if tokio::time::timeout(Duration::from_secs(5), &mut task).await.is_err() {
                warn!("(DiscordRuntime) Shard runner did not stop in time; aborting.");
                task.abort();
            }
        }
    }
}
