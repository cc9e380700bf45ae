//! Game chat lines into the game -> chat stream.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::common::messages::GameLineEntry;
use crate::game::GameLink;
use crate::relay::RelayQueue;

pub struct GameIngest {
    lines_rx: broadcast::Receiver<String>,
    queue: RelayQueue<GameLineEntry>,
}

impl GameIngest {
    /// Subscribes right away so no line emitted after construction is missed.
    pub fn new(game: &Arc<dyn GameLink>, queue: RelayQueue<GameLineEntry>) -> Self {
        Self {
            lines_rx: game.subscribe(),
            queue,
        }
    }

    async fn ingest_line(&self, line: &str) {
        match self.queue.append(&GameLineEntry::chat(line)).await {
            Ok(id) => debug!(%id, "Ingested: {}", line),
            Err(e) => warn!(stream = self.queue.stream(), "Failed to ingest game line: {}", e),
        }
    }

    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(stream = self.queue.stream(), "Game ingestion started");
        loop {
            tokio::select! {
                line = self.lines_rx.recv() => {
                    match line {
                        Ok(line) => self.ingest_line(&line).await,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Game ingestion lagged behind");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("Game line channel closed");
                            break;
                        }
                    }
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Game ingestion stopping");
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::scripted::ScriptedGame;
    use crate::relay::memory::MemoryStore;
    use crate::relay::store::EntryId;
    use crate::relay::ReadResult;
    use std::time::Duration;

    #[tokio::test]
    async fn test_lines_are_appended_until_shutdown() {
        let store = Arc::new(MemoryStore::new());
        let scripted = Arc::new(ScriptedGame::new());
        let game: Arc<dyn GameLink> = scripted.clone();
        let queue: RelayQueue<GameLineEntry> = RelayQueue::new(store.clone(), "chat", 4000);
        let ingest = GameIngest::new(&game, queue.clone());

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(ingest.run(shutdown_rx));

        scripted.emit("Steve died");
        scripted.emit("Welcome Alex!");

        for _ in 0..50 {
            if store.len("chat") == 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let ReadResult::Entries(entries) = queue.read(EntryId::ZERO, 10).await.unwrap() else {
            panic!("expected entries");
        };
        let lines: Vec<_> = entries.iter().map(|e| e.payload.message.as_str()).collect();
        assert_eq!(lines, vec!["Steve died", "Welcome Alex!"]);
        assert_eq!(entries[0].payload.message_type.as_deref(), Some("chat"));
        assert_eq!(entries[0].payload.raw.as_deref(), Some("\"Steve died\""));

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_store_failure_does_not_stop_ingestion() {
        let store = Arc::new(MemoryStore::new());
        let scripted = Arc::new(ScriptedGame::new());
        let game: Arc<dyn GameLink> = scripted.clone();
        let ingest = GameIngest::new(&game, RelayQueue::new(store.clone(), "chat", 4000));

        store.set_offline(true);
        ingest.ingest_line("lost").await;
        store.set_offline(false);
        ingest.ingest_line("kept").await;

        assert_eq!(store.len("chat"), 1);
    }
}
