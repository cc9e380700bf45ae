//! Canonical message types for relay communication.
//!
//! These are the payload shapes carried by the two durable streams and
//! the requests handed to the chat-system adapter.

use serde::{Deserialize, Serialize};

/// Entry on the game -> chat stream: one cleaned game chat line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLineEntry {
    /// The raw line, formatting codes already stripped.
    pub message: String,
    /// JSON encoding of the line as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// Producer tag (always "chat" for lines written by the ingestion path).
    #[serde(
        rename = "messageType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub message_type: Option<String>,
}

impl GameLineEntry {
    pub fn chat(line: &str) -> Self {
        Self {
            message: line.to_string(),
            raw: serde_json::to_string(line).ok(),
            message_type: Some("chat".to_string()),
        }
    }
}

/// Entry on the chat -> game stream: one message to say in game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundChatEntry {
    /// Text to send in game.
    pub message: String,
    /// Display name to adopt in game while the message is sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_nickname: Option<String>,
    /// Chat-side author, used as a source tag if the name change fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// JSON snapshot of the original chat-side message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl OutboundChatEntry {
    /// A message with no identity change attached.
    pub fn plain(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            proposed_nickname: None,
            author: None,
            raw: None,
        }
    }
}

/// A calendar reminder created on the chat side.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledEvent {
    pub name: String,
    /// Start time, unix seconds.
    pub time: i64,
    pub duration_min: u32,
}
