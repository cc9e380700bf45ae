//! Chat -> game relay loop.
//!
//! Delivers one queued Discord message at a time, changing the in-game
//! nickname to the author's for the duration of the message.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::common::messages::OutboundChatEntry;
use crate::config::types::Config;
use crate::discord::ChatSink;
use crate::events::format::break_links;
use crate::game::GameLink;
use crate::relay::{Cursor, ReadResult, RelayQueue};

/// Longest nickname the server accepts.
pub const NICKNAME_LIMIT: usize = 16;

/// Make relayed text safe to say in game: links are broken and no slash
/// can start a command.
pub fn sanitize(message: &str) -> String {
    break_links(message).trim().replace('/', "./")
}

/// Prefix the author onto a message whose nickname change failed.
fn tag_author(author: &str, text: &str) -> String {
    let body = text.strip_prefix("[DC] ").unwrap_or(text);
    format!("[DC] {}: {}", author, body)
}

/// Chat -> game direction state.
pub struct ChatToGame {
    queue: RelayQueue<OutboundChatEntry>,
    cursor: Cursor,
    game: Arc<dyn GameLink>,
    sink: Arc<dyn ChatSink>,
    debug_channel: u64,
    default_nickname: String,
    nickname_revert: Duration,
    idle_poll: Duration,
    delivered_poll: Duration,
}

impl ChatToGame {
    pub fn new(
        config: &Config,
        queue: RelayQueue<OutboundChatEntry>,
        cursor: Cursor,
        game: Arc<dyn GameLink>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        Self {
            queue,
            cursor,
            game,
            sink,
            debug_channel: config.discord.channels.debug.channel_id,
            default_nickname: config.game.default_nickname.clone(),
            nickname_revert: Duration::from_millis(config.relay.nickname_revert_ms),
            idle_poll: Duration::from_millis(config.relay.chat_idle_poll_ms),
            delivered_poll: Duration::from_millis(config.relay.chat_delivered_poll_ms),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(stream = self.queue.stream(), position = %self.cursor.position(), "Chat -> game relay started");
        loop {
            let delay = self.poll_once().await;
            tokio::select! {
                _ = sleep(delay) => {}
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Chat -> game relay stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Deliver at most one entry. Returns how long to wait before the next poll.
    pub async fn poll_once(&mut self) -> Duration {
        let entry = match self.queue.read(self.cursor.position(), 1).await {
            Ok(ReadResult::NoNewEntries) => return self.idle_poll,
            Ok(ReadResult::Entries(entries)) => match entries.into_iter().next() {
                Some(entry) => entry,
                None => return self.idle_poll,
            },
            Err(e) => {
                warn!(stream = self.queue.stream(), position = %self.cursor.position(), "Skipping poll: {}", e);
                return self.idle_poll;
            }
        };

        let renamed = self.deliver(&entry.payload).await;
        self.cursor.advance(entry.id).await;

        if renamed {
            sleep(self.nickname_revert).await;
            if self.game.send_command("nick", &self.default_nickname).await {
                warn!(nickname = %self.default_nickname, "Failed to restore nickname");
            }
        }
        self.delivered_poll
    }

    /// Say one entry in game. Returns `true` when the nickname was changed
    /// and needs restoring.
    async fn deliver(&self, entry: &OutboundChatEntry) -> bool {
        let mut text = sanitize(&entry.message);
        let mut renamed = false;

        if let Some(proposed) = entry.proposed_nickname.as_deref().filter(|n| !n.trim().is_empty()) {
            let nickname: String = proposed.chars().take(NICKNAME_LIMIT).collect();
            if self.game.send_command("nick", &nickname).await {
                warn!(nickname = %nickname, "Nickname change failed");
                let notice = format!("Unable to change nickname to {}...", nickname);
                if let Err(e) = self.sink.send(&notice, self.debug_channel, true).await {
                    warn!(channel_id = self.debug_channel, "Failed to report nickname failure: {}", e);
                }
                let author = entry.author.as_deref().unwrap_or(&nickname);
                text = tag_author(author, &text);
            } else {
                renamed = true;
            }
        }

        debug!("Chat -> game: {}", text);
        if let Err(e) = self.game.send_line(&text).await {
            warn!("Failed to send chat message to game: {}", e);
        }
        renamed
    }
}
