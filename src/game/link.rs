//! Game-side interface used by the relay loops.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::common::error::GameError;

#[async_trait]
pub trait GameLink: Send + Sync {
    /// Receiver of cleaned chat lines, one per game chat emission.
    fn subscribe(&self) -> broadcast::Receiver<String>;

    /// Say `text` in game chat, truncated to the maximum line length.
    async fn send_line(&self, text: &str) -> Result<(), GameError>;

    /// Run `/command args`. Returns `true` when the command failed.
    async fn send_command(&self, command: &str, args: &str) -> bool;

    /// Online players, sorted case-insensitively.
    fn player_list(&self) -> Vec<String>;

    /// Current player-list header, empty when unknown.
    fn status_header(&self) -> String;
}
