//! Outgoing side of the Discord adapter.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serenity::builder::CreateScheduledEvent;
use serenity::http::Http;
use serenity::model::guild::ScheduledEventType;
use serenity::model::id::{ChannelId, GuildId};
use serenity::model::Timestamp;
use tracing::{debug, error};

use crate::common::error::{ChatError, ChatResult};
use crate::common::messages::ScheduledEvent;
use crate::discord::outbox::{pack_messages, split_message, Outbox, MESSAGE_LIMIT};
use crate::events::format::escape_markdown;

/// Scheduled event location shown on Discord.
const EVENT_LOCATION: &str = "Minewind";

/// Discord caps scheduled event names at 100 characters.
const EVENT_NAME_LIMIT: usize = 100;

/// Where the relay loops post chat-side messages.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Post `text` to a channel right away, markdown-escaped when `escape`.
    async fn send(&self, text: &str, channel_id: u64, escape: bool) -> ChatResult<()>;

    /// Buffer `text` for the next [`ChatSink::flush_all`].
    fn queue(&self, text: String, channel_id: u64);

    /// Send everything queued, channel by channel. Failures are logged.
    async fn flush_all(&self);

    async fn create_scheduled_event(&self, event: &ScheduledEvent) -> ChatResult<()>;
}

/// [`ChatSink`] backed by the Discord REST API.
pub struct DiscordSink {
    http: Arc<Http>,
    guild_id: u64,
    outbox: Mutex<Outbox>,
}

impl DiscordSink {
    pub fn new(http: Arc<Http>, guild_id: u64) -> Self {
        Self {
            http,
            guild_id,
            outbox: Mutex::new(Outbox::new()),
        }
    }

    async fn say(&self, channel_id: u64, content: String) -> ChatResult<()> {
        ChannelId::new(channel_id).say(&self.http, content).await?;
        Ok(())
    }
}

fn event_name(name: &str) -> String {
    name.chars().take(EVENT_NAME_LIMIT).collect()
}

fn timestamp(time: i64) -> ChatResult<Timestamp> {
    // Out-of-range values make serenity overflow instead of erroring
    DateTime::<Utc>::from_timestamp(time, 0)
        .ok_or(ChatError::InvalidTimestamp { time })
        .and_then(|_| {
            Timestamp::from_unix_timestamp(time).map_err(|_| ChatError::InvalidTimestamp { time })
        })
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send(&self, text: &str, channel_id: u64, escape: bool) -> ChatResult<()> {
        let content = if escape {
            escape_markdown(text)
        } else {
            text.to_string()
        };
        for chunk in split_message(&content, MESSAGE_LIMIT) {
            self.say(channel_id, chunk).await?;
        }
        Ok(())
    }

    fn queue(&self, text: String, channel_id: u64) {
        let mut outbox = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        outbox.push(channel_id, text);
    }

    async fn flush_all(&self) {
        let pending = {
            let mut outbox = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
            outbox.drain()
        };

        for (channel_id, messages) in pending {
            let chunks = pack_messages(&messages, MESSAGE_LIMIT);
            debug!(
                channel_id,
                messages = messages.len(),
                chunks = chunks.len(),
                "Flushing queued messages"
            );
            for chunk in chunks {
                if let Err(e) = self.say(channel_id, chunk).await {
                    error!(channel_id, "Failed to send queued message: {}", e);
                }
            }
        }
    }

    async fn create_scheduled_event(&self, event: &ScheduledEvent) -> ChatResult<()> {
        let start = timestamp(event.time)?;
        let end_time = event
            .time
            .checked_add(i64::from(event.duration_min) * 60)
            .ok_or(ChatError::InvalidTimestamp { time: event.time })?;
        let end = timestamp(end_time)?;

        let builder = CreateScheduledEvent::new(
            ScheduledEventType::External,
            event_name(&event.name),
            start,
        )
        .end_time(end)
        .location(EVENT_LOCATION);

        GuildId::new(self.guild_id)
            .create_scheduled_event(&self.http, builder)
            .await?;
        Ok(())
    }
}
