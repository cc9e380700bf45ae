//! Discord integration.
//!
//! This module provides the gateway client that relays the chat channel
//! into the game, the sink the relay loops post through, and the REST
//! lifecycle notices.

pub mod client;
pub mod handler;
pub mod notify;
pub mod outbox;
#[cfg(test)]
pub mod recording;
pub mod sink;

// Re-export main types for external use
pub use client::{build_http, DiscordBot};
pub use handler::ChatIngest;
pub use notify::{Notice, Notifier};
pub use sink::{ChatSink, DiscordSink};
