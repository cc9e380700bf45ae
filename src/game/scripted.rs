//! In-process [`GameLink`] for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::common::error::GameError;
use crate::game::link::GameLink;

#[derive(Default)]
struct Script {
    lines: Vec<String>,
    commands: Vec<(String, String)>,
    failing: Vec<String>,
    header: String,
    players: Vec<String>,
    offline: bool,
}

/// Records everything sent and plays back a configured status.
pub struct ScriptedGame {
    script: Mutex<Script>,
    lines_tx: broadcast::Sender<String>,
}

impl ScriptedGame {
    pub fn new() -> Self {
        let (lines_tx, _) = broadcast::channel(64);
        Self {
            script: Mutex::new(Script::default()),
            lines_tx,
        }
    }

    /// Make `command` report failure.
    pub fn fail_command(&self, command: &str) {
        self.script.lock().unwrap().failing.push(command.to_string());
    }

    pub fn set_header(&self, header: &str) {
        self.script.lock().unwrap().header = header.to_string();
    }

    pub fn set_offline(&self, offline: bool) {
        self.script.lock().unwrap().offline = offline;
    }

    /// Emit a chat line to subscribers.
    pub fn emit(&self, line: &str) {
        let _ = self.lines_tx.send(line.to_string());
    }

    pub fn sent_lines(&self) -> Vec<String> {
        self.script.lock().unwrap().lines.clone()
    }

    pub fn commands(&self) -> Vec<(String, String)> {
        self.script.lock().unwrap().commands.clone()
    }
}

#[async_trait]
impl GameLink for ScriptedGame {
    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.lines_tx.subscribe()
    }

    async fn send_line(&self, text: &str) -> Result<(), GameError> {
        let mut script = self.script.lock().unwrap();
        if script.offline {
            return Err(GameError::NotConnected);
        }
        script.lines.push(text.to_string());
        Ok(())
    }

    async fn send_command(&self, command: &str, args: &str) -> bool {
        let mut script = self.script.lock().unwrap();
        script.commands.push((command.to_string(), args.to_string()));
        script.offline || script.failing.iter().any(|c| c == command)
    }

    fn player_list(&self) -> Vec<String> {
        self.script.lock().unwrap().players.clone()
    }

    fn status_header(&self) -> String {
        self.script.lock().unwrap().header.clone()
    }
}
