//! In-process [`ChatSink`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::common::error::ChatResult;
use crate::common::messages::ScheduledEvent;
use crate::discord::outbox::Outbox;
use crate::discord::sink::ChatSink;

/// Records sends, flushes and scheduled events.
#[derive(Default)]
pub struct RecordingSink {
    outbox: Mutex<Outbox>,
    sent: Mutex<Vec<(u64, String)>>,
    flushed: Mutex<Vec<(u64, Vec<String>)>>,
    events: Mutex<Vec<ScheduledEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct sends, in order.
    pub fn sent(&self) -> Vec<(u64, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Flushed messages per channel, in flush order.
    pub fn flushed(&self) -> Vec<(u64, Vec<String>)> {
        self.flushed.lock().unwrap().clone()
    }

    /// All flushed messages for one channel.
    pub fn flushed_to(&self, channel_id: u64) -> Vec<String> {
        self.flushed()
            .into_iter()
            .filter(|(id, _)| *id == channel_id)
            .flat_map(|(_, messages)| messages)
            .collect()
    }

    pub fn pending(&self) -> bool {
        !self.outbox.lock().unwrap().is_empty()
    }

    pub fn events(&self) -> Vec<ScheduledEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send(&self, text: &str, channel_id: u64, _escape: bool) -> ChatResult<()> {
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(())
    }

    fn queue(&self, text: String, channel_id: u64) {
        self.outbox.lock().unwrap().push(channel_id, text);
    }

    async fn flush_all(&self) {
        let drained = self.outbox.lock().unwrap().drain();
        self.flushed.lock().unwrap().extend(drained);
    }

    async fn create_scheduled_event(&self, event: &ScheduledEvent) -> ChatResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
