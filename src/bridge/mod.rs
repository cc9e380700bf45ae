//! Relay loops tying the game and Discord adapters to the durable queues.
//!
//! ## Module Structure
//!
//! - `ingest`: game chat lines into the game -> chat stream
//! - `game_to_chat`: classification and dispatch to Discord channels
//! - `chat_to_game`: queued Discord messages said in game

pub mod chat_to_game;
pub mod game_to_chat;
pub mod ingest;

pub use chat_to_game::ChatToGame;
pub use game_to_chat::GameToChat;
pub use ingest::GameIngest;
