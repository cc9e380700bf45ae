//! Game-side adapter.
//!
//! This module contains:
//! - Proxy frame codec and chat component cleaning
//! - Duplicate welcome suppression
//! - The reconnecting proxy client behind the `GameLink` interface

pub mod client;
pub mod codec;
pub mod greetings;
pub mod link;
#[cfg(test)]
pub mod scripted;
pub mod text;

// Re-export commonly used types
pub use client::GameClient;
pub use link::GameLink;
