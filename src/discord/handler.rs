//! Discord message handling.
//!
//! Messages posted in the relay chat channel are cleaned and queued for
//! the game, or sent straight through for the owner.

use std::sync::Arc;

use serde_json::json;
use serenity::model::channel::Message;
use serenity::model::id::UserId;
use serenity::prelude::*;
use tracing::{debug, info, warn};

use crate::common::messages::OutboundChatEntry;
use crate::config::types::DiscordConfig;
use crate::game::GameLink;
use crate::relay::RelayQueue;

/// Printable punctuation kept when cleaning chat-side text.
const ALLOWED_PUNCTUATION: &str = " _'\":;+?-*,.!@#$%^&()[]\\/{}<>";

/// Keep only characters the game chat accepts.
pub fn clean_allowed(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric() || ALLOWED_PUNCTUATION.contains(*c))
        .collect()
}

/// What to do with one chat-side message.
#[derive(Debug, Clone, PartialEq)]
pub enum Relay {
    /// Send straight to the game.
    Direct(String),
    /// Queue for the chat -> game loop.
    Queue(OutboundChatEntry),
    /// Nothing left to relay after cleaning.
    Skip,
}

/// Decide how to relay a message.
///
/// `display_name` is the author's account display name and `nickname` their
/// guild nickname, if any.
pub fn plan_relay(display_name: &str, nickname: Option<&str>, content: &str, bypass: bool) -> Relay {
    if bypass {
        return Relay::Direct(content.replacen(';', "/", 1));
    }

    let text = clean_allowed(content);
    if text.trim().is_empty() {
        return Relay::Skip;
    }

    let author = clean_allowed(nickname.unwrap_or(display_name));
    let raw = json!({
        "displayName": display_name,
        "member_nickname": nickname,
        "message": content,
    });

    Relay::Queue(OutboundChatEntry {
        message: format!("[DC] {}", text),
        proposed_nickname: Some(format!("DC {}", author)),
        author: Some(author),
        raw: Some(raw.to_string()),
    })
}

/// Relays the chat channel into the game.
pub struct ChatIngest {
    chat_channel_id: u64,
    owner_id: u64,
    bypass_role_id: Option<u64>,
    queue: RelayQueue<OutboundChatEntry>,
    game: Arc<dyn GameLink>,
    bot_user_id: Option<UserId>,
}

impl ChatIngest {
    pub fn new(
        config: &DiscordConfig,
        queue: RelayQueue<OutboundChatEntry>,
        game: Arc<dyn GameLink>,
    ) -> Self {
        Self {
            chat_channel_id: config.channels.chat.channel_id,
            owner_id: config.owner_id,
            bypass_role_id: config.bypass_role_id,
            queue,
            game,
            bot_user_id: None,
        }
    }

    pub fn set_bot_user(&mut self, user_id: Option<UserId>) {
        self.bot_user_id = user_id;
    }

    fn has_bypass(&self, author_id: u64, roles: &[u64]) -> bool {
        match self.bypass_role_id {
            Some(role) => author_id == self.owner_id && roles.contains(&role),
            None => false,
        }
    }

    /// Carry out a relay decision. Returns `true` when the message was relayed.
    pub async fn dispatch(&self, relay: Relay) -> bool {
        match relay {
            Relay::Direct(text) => {
                info!("Owner bypass -> game: {}", text);
                match self.game.send_line(&text).await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("Failed to send bypass message: {}", e);
                        false
                    }
                }
            }
            Relay::Queue(entry) => match self.queue.append(&entry).await {
                Ok(id) => {
                    debug!(%id, stream = self.queue.stream(), "Queued chat message");
                    true
                }
                Err(e) => {
                    warn!("Failed to queue chat message: {}", e);
                    false
                }
            },
            Relay::Skip => false,
        }
    }

    pub async fn handle_message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || Some(msg.author.id) == self.bot_user_id {
            return;
        }
        if msg.channel_id.get() != self.chat_channel_id {
            return;
        }

        let nickname = msg.member.as_ref().and_then(|m| m.nick.clone());
        let roles: Vec<u64> = msg
            .member
            .as_ref()
            .map(|m| m.roles.iter().map(|r| r.get()).collect())
            .unwrap_or_default();
        let bypass = self.has_bypass(msg.author.id.get(), &roles);

        let relay = plan_relay(msg.author.display_name(), nickname.as_deref(), &msg.content, bypass);
        if !self.dispatch(relay).await {
            return;
        }

        if let Err(e) = msg.delete(&ctx.http).await {
            warn!(message_id = msg.id.get(), "Failed to delete relayed message: {}", e);
        }
    }
}
