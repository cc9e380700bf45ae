//! Durable store interfaces.
//!
//! Streams are append-only logs of flat string maps with ordered ids; the
//! key-value side holds cursors and the lifecycle title.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;

use crate::common::error::{StoreError, StoreResult};

/// Stream entry id, `<millis>-<sequence>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId {
    pub ms: u64,
    pub seq: u64,
}

impl EntryId {
    /// The "from the start" sentinel.
    pub const ZERO: EntryId = EntryId { ms: 0, seq: 0 };

    pub fn new(ms: u64, seq: u64) -> Self {
        Self { ms, seq }
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

impl FromStr for EntryId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StoreError::InvalidId { id: s.to_string() };
        let (ms, seq) = s.split_once('-').ok_or_else(invalid)?;
        Ok(Self {
            ms: ms.parse().map_err(|_| invalid())?,
            seq: seq.parse().map_err(|_| invalid())?,
        })
    }
}

/// One entry as stored, before schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub id: EntryId,
    pub fields: HashMap<String, String>,
}

/// Append-only ordered streams.
#[async_trait]
pub trait StreamStore: Send + Sync {
    /// Append one entry, approximately trimming the stream to `max_len`.
    async fn append(
        &self,
        stream: &str,
        fields: &[(String, String)],
        max_len: usize,
    ) -> StoreResult<EntryId>;

    /// Up to `count` entries with ids strictly greater than `after`, oldest first.
    async fn read_after(&self, stream: &str, after: EntryId, count: usize) -> StoreResult<Vec<RawEntry>>;
}

/// String key-value storage.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_parse_and_display() {
        let id: EntryId = "1700000000000-3".parse().unwrap();
        assert_eq!(id, EntryId::new(1_700_000_000_000, 3));
        assert_eq!(id.to_string(), "1700000000000-3");
        assert_eq!("0-0".parse::<EntryId>().unwrap(), EntryId::ZERO);
    }

    #[test]
    fn test_entry_id_rejects_garbage() {
        for bad in ["", "12", "a-b", "1-", "-1", "1-2-3"] {
            assert!(bad.parse::<EntryId>().is_err(), "{}", bad);
        }
    }

    #[test]
    fn test_entry_id_ordering() {
        assert!(EntryId::new(1, 5) < EntryId::new(2, 0));
        assert!(EntryId::new(2, 0) < EntryId::new(2, 1));
        assert!(EntryId::ZERO < EntryId::new(0, 1));
    }
}
