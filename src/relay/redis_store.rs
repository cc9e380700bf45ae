//! Redis-backed durable store.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info, warn};

use crate::common::error::StoreResult;
use crate::relay::store::{EntryId, KvStore, RawEntry, StreamStore};

/// Streams and keys on one Redis server. Cheap to clone.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        info!("Connected to Redis");
        Ok(Self { connection })
    }
}

#[async_trait]
impl StreamStore for RedisStore {
    async fn append(
        &self,
        stream: &str,
        fields: &[(String, String)],
        max_len: usize,
    ) -> StoreResult<EntryId> {
        let mut connection = self.connection.clone();
        let id: String = connection
            .xadd_maxlen(stream, StreamMaxlen::Approx(max_len), "*", fields)
            .await?;
        debug!(stream = %stream, id = %id, "Appended entry");
        id.parse()
    }

    async fn read_after(&self, stream: &str, after: EntryId, count: usize) -> StoreResult<Vec<RawEntry>> {
        let mut connection = self.connection.clone();
        let options = StreamReadOptions::default().count(count);
        let reply: Option<StreamReadReply> = connection
            .xread_options(&[stream], &[after.to_string()], &options)
            .await?;

        let mut entries = Vec::new();
        for key in reply.into_iter().flat_map(|r| r.keys) {
            for stream_id in key.ids {
                let mut fields = HashMap::with_capacity(stream_id.map.len());
                for (name, value) in &stream_id.map {
                    match redis::from_redis_value::<String>(value) {
                        Ok(text) => {
                            fields.insert(name.clone(), text);
                        }
                        Err(e) => {
                            warn!(stream = %stream, id = %stream_id.id, field = %name, "Non-string field: {}", e);
                        }
                    }
                }
                entries.push(RawEntry {
                    id: stream_id.id.parse()?,
                    fields,
                });
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut connection = self.connection.clone();
        Ok(connection.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut connection = self.connection.clone();
        connection.set::<_, _, ()>(key, value).await?;
        Ok(())
    }
}
