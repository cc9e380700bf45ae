//! Typed relay queue over a durable stream.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::common::error::{PayloadError, RelayResult};
use crate::relay::store::{EntryId, RawEntry, StreamStore};

/// A validated entry.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry<P> {
    pub id: EntryId,
    pub payload: P,
}

/// Outcome of a read. An empty read is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult<P> {
    NoNewEntries,
    Entries(Vec<QueueEntry<P>>),
}

/// One direction of the relay: a named stream carrying payloads of type `P`.
pub struct RelayQueue<P> {
    store: Arc<dyn StreamStore>,
    stream: String,
    max_len: usize,
    _payload: PhantomData<fn() -> P>,
}

impl<P> Clone for RelayQueue<P> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            stream: self.stream.clone(),
            max_len: self.max_len,
            _payload: PhantomData,
        }
    }
}

impl<P> RelayQueue<P>
where
    P: Serialize + DeserializeOwned,
{
    pub fn new(store: Arc<dyn StreamStore>, stream: impl Into<String>, max_len: usize) -> Self {
        Self {
            store,
            stream: stream.into(),
            max_len,
            _payload: PhantomData,
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Append one payload as a flat string map.
    pub async fn append(&self, payload: &P) -> RelayResult<EntryId> {
        let fields = flatten(payload)?;
        let id = self.store.append(&self.stream, &fields, self.max_len).await?;
        Ok(id)
    }

    /// Read up to `count` entries strictly after `after`, oldest first.
    ///
    /// The batch is validated as a whole: one malformed or out-of-order
    /// entry rejects the read so the caller retries from the same cursor.
    pub async fn read(&self, after: EntryId, count: usize) -> RelayResult<ReadResult<P>> {
        let raw = self.store.read_after(&self.stream, after, count).await?;
        if raw.is_empty() {
            return Ok(ReadResult::NoNewEntries);
        }
        debug!(stream = %self.stream, count = raw.len(), after = %after, "Read entries");

        let mut last = after;
        let mut entries = Vec::with_capacity(raw.len());
        for entry in raw {
            if entry.id <= last {
                return Err(PayloadError::OutOfOrder {
                    id: entry.id.to_string(),
                    after: last.to_string(),
                }
                .into());
            }
            last = entry.id;
            entries.push(QueueEntry {
                id: entry.id,
                payload: decode(&entry)?,
            });
        }
        Ok(ReadResult::Entries(entries))
    }
}

fn flatten<P: Serialize>(payload: &P) -> Result<Vec<(String, String)>, PayloadError> {
    let value = serde_json::to_value(payload)?;
    let Value::Object(map) = value else {
        return Err(PayloadError::Shape {
            id: "*".to_string(),
            message: "payload must serialize to an object".to_string(),
        });
    };
    Ok(map
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::Null => None,
            Value::String(text) => Some((key, text)),
            other => Some((key, other.to_string())),
        })
        .collect())
}

fn decode<P: DeserializeOwned>(entry: &RawEntry) -> Result<P, PayloadError> {
    let map: Map<String, Value> = entry
        .fields
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    serde_json::from_value(Value::Object(map)).map_err(|e| PayloadError::Shape {
        id: entry.id.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::RelayError;
    use crate::common::messages::{GameLineEntry, OutboundChatEntry};
    use crate::relay::memory::MemoryStore;

    fn game_queue(store: &Arc<MemoryStore>) -> RelayQueue<GameLineEntry> {
        RelayQueue::new(store.clone(), "chat", 4000)
    }

    #[tokio::test]
    async fn test_empty_stream_reports_no_entries() {
        let store = Arc::new(MemoryStore::new());
        let queue = game_queue(&store);
        assert_eq!(queue.read(EntryId::ZERO, 5).await.unwrap(), ReadResult::NoNewEntries);
    }

    #[tokio::test]
    async fn test_append_then_read_in_order() {
        let store = Arc::new(MemoryStore::new());
        let queue = game_queue(&store);
        let first = queue.append(&GameLineEntry::chat("one")).await.unwrap();
        let second = queue.append(&GameLineEntry::chat("two")).await.unwrap();
        assert!(first < second);

        let ReadResult::Entries(entries) = queue.read(EntryId::ZERO, 5).await.unwrap() else {
            panic!("expected entries");
        };
        let lines: Vec<_> = entries.iter().map(|e| e.payload.message.as_str()).collect();
        assert_eq!(lines, ["one", "two"]);
        assert_eq!(entries[0].payload.message_type.as_deref(), Some("chat"));
        assert_eq!(entries[0].payload.raw.as_deref(), Some("\"one\""));
    }

    #[tokio::test]
    async fn test_read_strictly_after_cursor_and_bounded() {
        let store = Arc::new(MemoryStore::new());
        let queue = game_queue(&store);
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(queue.append(&GameLineEntry::chat(&format!("line {}", i))).await.unwrap());
        }
        let ReadResult::Entries(entries) = queue.read(ids[0], 2).await.unwrap() else {
            panic!("expected entries");
        };
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, ids[1]);
        assert_eq!(entries[1].id, ids[2]);
        assert_eq!(queue.read(ids[3], 5).await.unwrap(), ReadResult::NoNewEntries);
    }

    #[tokio::test]
    async fn test_append_trims_to_max_len() {
        let store = Arc::new(MemoryStore::new());
        let queue: RelayQueue<GameLineEntry> = RelayQueue::new(store.clone(), "chat", 3);
        for i in 0..10 {
            queue.append(&GameLineEntry::chat(&format!("{}", i))).await.unwrap();
        }
        assert_eq!(store.len("chat"), 3);
    }

    #[tokio::test]
    async fn test_optional_fields_are_omitted() {
        let store = Arc::new(MemoryStore::new());
        let queue: RelayQueue<OutboundChatEntry> = RelayQueue::new(store.clone(), "dc-to-mw-chat", 1000);
        queue.append(&OutboundChatEntry::plain("[DC] hi")).await.unwrap();
        let ReadResult::Entries(entries) = queue.read(EntryId::ZERO, 1).await.unwrap() else {
            panic!("expected entries");
        };
        assert_eq!(entries[0].payload, OutboundChatEntry::plain("[DC] hi"));
    }

    #[tokio::test]
    async fn test_malformed_entry_rejects_batch() {
        let store = Arc::new(MemoryStore::new());
        store.push_raw("chat", EntryId::new(1, 0), &[("message", "ok")]);
        store.push_raw("chat", EntryId::new(2, 0), &[("text", "wrong field")]);
        let queue = game_queue(&store);

        let err = queue.read(EntryId::ZERO, 5).await.unwrap_err();
        assert!(matches!(err, RelayError::Payload(PayloadError::Shape { ref id, .. }) if id == "2-0"));
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_offline(true);
        let queue = game_queue(&store);
        assert!(matches!(
            queue.read(EntryId::ZERO, 5).await,
            Err(RelayError::Store(_))
        ));
    }
}
