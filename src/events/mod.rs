//! Game line taxonomy.

pub mod chat;
pub mod classify;
pub mod format;
pub mod rules;
pub mod timed;

pub use classify::{render_plain, SocialKind, Taxonomy, Variant};
pub use timed::{TimedEvent, TimedKind};
