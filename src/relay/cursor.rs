//! Persisted read position for one relay direction.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::common::error::StoreResult;
use crate::relay::store::{EntryId, KvStore};

/// Last delivered entry id, mirrored to a durable key.
pub struct Cursor {
    store: Arc<dyn KvStore>,
    key: String,
    position: EntryId,
}

impl Cursor {
    /// Resume from the persisted position, or from the start when none exists.
    ///
    /// A store failure is returned to the caller: starting over from the
    /// beginning would re-deliver the whole retained window. An unreadable
    /// stored value is logged and treated as the start.
    pub async fn load(store: Arc<dyn KvStore>, key: impl Into<String>) -> StoreResult<Self> {
        let key = key.into();
        let position = match store.get(&key).await? {
            None => EntryId::ZERO,
            Some(stored) => stored.parse().unwrap_or_else(|e| {
                error!(key = %key, value = %stored, "Discarding unreadable cursor: {}", e);
                EntryId::ZERO
            }),
        };
        debug!(key = %key, position = %position, "Loaded cursor");
        Ok(Self { store, key, position })
    }

    pub fn position(&self) -> EntryId {
        self.position
    }

    /// Move forward to `id` and persist it.
    ///
    /// Never moves backward; a stale `id` is ignored and `false` returned.
    /// A failed write keeps the in-memory position, so at worst the next
    /// process start re-reads entries already forwarded.
    pub async fn advance(&mut self, id: EntryId) -> bool {
        if id <= self.position {
            warn!(key = %self.key, position = %self.position, id = %id, "Ignoring backward cursor move");
            return false;
        }
        self.position = id;
        if let Err(e) = self.store.set(&self.key, &id.to_string()).await {
            warn!(key = %self.key, id = %id, "Failed to persist cursor: {}", e);
        }
        true
    }
}
