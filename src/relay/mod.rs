//! Durable relay queues.
//!
//! Each direction of the bridge is one stream plus one persisted cursor.

pub mod cursor;
#[cfg(test)]
pub mod memory;
pub mod queue;
pub mod redis_store;
pub mod store;

pub use cursor::Cursor;
pub use queue::{ReadResult, RelayQueue};
pub use redis_store::RedisStore;
