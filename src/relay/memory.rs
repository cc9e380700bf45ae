//! In-memory store used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::common::error::{StoreError, StoreResult};
use crate::relay::store::{EntryId, KvStore, RawEntry, StreamStore};

#[derive(Default)]
pub struct MemoryStore {
    streams: Mutex<HashMap<String, Vec<RawEntry>>>,
    values: Mutex<HashMap<String, String>>,
    next_ms: Mutex<u64>,
    offline: AtomicBool,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Key-value writes fail; reads keep working.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Insert an entry with an explicit id and arbitrary fields.
    pub fn push_raw(&self, stream: &str, id: EntryId, fields: &[(&str, &str)]) {
        let entry = RawEntry {
            id,
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };
        let mut streams = self.streams.lock().unwrap();
        let entries = streams.entry(stream.to_string()).or_default();
        entries.push(entry);
        entries.sort_by_key(|e| e.id);
        let mut next = self.next_ms.lock().unwrap();
        *next = (*next).max(id.ms + 1);
    }

    pub fn len(&self, stream: &str) -> usize {
        self.streams
            .lock()
            .unwrap()
            .get(stream)
            .map_or(0, |entries| entries.len())
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }

    pub fn put_value(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "memory store is offline".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StreamStore for MemoryStore {
    async fn append(
        &self,
        stream: &str,
        fields: &[(String, String)],
        max_len: usize,
    ) -> StoreResult<EntryId> {
        self.check_online()?;
        let id = {
            let mut next = self.next_ms.lock().unwrap();
            *next += 1;
            EntryId::new(*next, 0)
        };
        let mut streams = self.streams.lock().unwrap();
        let entries = streams.entry(stream.to_string()).or_default();
        entries.push(RawEntry {
            id,
            fields: fields.iter().cloned().collect(),
        });
        if entries.len() > max_len {
            let excess = entries.len() - max_len;
            entries.drain(..excess);
        }
        Ok(id)
    }

    async fn read_after(&self, stream: &str, after: EntryId, count: usize) -> StoreResult<Vec<RawEntry>> {
        self.check_online()?;
        let streams = self.streams.lock().unwrap();
        Ok(streams
            .get(stream)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.id > after)
                    .take(count)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.check_online()?;
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.check_online()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                message: "memory store rejects writes".to_string(),
            });
        }
        self.put_value(key, value);
        Ok(())
    }
}
