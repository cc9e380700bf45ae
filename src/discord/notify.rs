//! Process lifecycle notices sent over plain REST.
//!
//! These bypass the gateway client so they still go out while the bot is
//! starting up or after its tasks have stopped.

use std::time::Duration;

use serde_json::json;
use tracing::{info, warn};

use crate::common::error::{ChatError, ChatResult};
use crate::config::types::DiscordConfig;
use crate::events::format::ping_user;

const API_BASE: &str = "https://discord.com/api";

/// Which lifecycle point a notice marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Started,
    Stopped,
    Crashed,
}

impl Notice {
    /// Text for the logging channel.
    pub fn logging_text(&self, owner_id: u64) -> String {
        match self {
            Self::Started => "Bot is started".to_string(),
            Self::Stopped => format!("Bot manually stopped {}", ping_user(owner_id)),
            Self::Crashed => format!("Exiting due to uncaught exception {}", ping_user(owner_id)),
        }
    }

    /// Text for the public chat channel.
    pub fn chat_text(&self) -> &'static str {
        match self {
            Self::Started => "Bot has started",
            Self::Stopped | Self::Crashed => "Bot has stopped",
        }
    }
}

pub struct Notifier {
    client: reqwest::Client,
    token: String,
    owner_id: u64,
    logging_channel: u64,
    chat_channel: u64,
}

impl Notifier {
    pub fn new(config: &DiscordConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            token: config.token.clone(),
            owner_id: config.owner_id,
            logging_channel: config.channels.logging.channel_id,
            chat_channel: config.channels.chat.channel_id,
        })
    }

    /// Post `content` to a channel.
    pub async fn post(&self, channel_id: u64, content: &str) -> ChatResult<()> {
        let body = json!({ "content": content }).to_string();
        let response = self
            .client
            .post(format!("{}/channels/{}/messages", API_BASE, channel_id))
            .header("Authorization", format!("Bot {}", self.token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status {
                status: status.as_u16(),
                channel_id,
            });
        }
        Ok(())
    }

    /// Send a lifecycle notice to the logging and chat channels.
    pub async fn announce(&self, notice: Notice) {
        info!(?notice, "Sending lifecycle notice");
        let logging = notice.logging_text(self.owner_id);
        if let Err(e) = self.post(self.logging_channel, &logging).await {
            warn!(channel_id = self.logging_channel, "Failed to send notice: {}", e);
        }
        if let Err(e) = self.post(self.chat_channel, notice.chat_text()).await {
            warn!(channel_id = self.chat_channel, "Failed to send notice: {}", e);
        }
    }
}
