//! Discord gateway client.
//!
//! Runs the serenity client with reconnect backoff and feeds gateway events
//! to the chat-channel handler.

use std::time::Duration;

use serenity::async_trait;
use serenity::http::{Http, HttpBuilder};
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use serenity::Client;

use backon::BackoffBuilder;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::discord::handler::ChatIngest;

const MAX_DELAY: Duration = Duration::from_secs(300);

#[derive(Debug, Clone)]
pub enum DiscordBotEvent {
    /// Bot connected and ready.
    Ready(Ready),
    /// Message received.
    Message { context: Context, message: Message },
    Disconnected,
}

struct DiscordBotEvents {
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
}

#[async_trait]
impl EventHandler for DiscordBotEvents {
    async fn ready(&self, _context: Context, ready: Ready) {
        if let Err(error) = self.discord_events_tx.send(DiscordBotEvent::Ready(ready)) {
            warn!("Failed to process discord event: {}", error);
        }
    }

    async fn message(&self, context: Context, message: Message) {
        if let Err(error) = self.discord_events_tx.send(DiscordBotEvent::Message { context, message }) {
            warn!("Failed to process discord event: {}", error);
        }
    }
}

/// Build a REST client with our timeout settings.
pub fn build_http(token: &str) -> anyhow::Result<Http> {
    let reqwest_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    Ok(HttpBuilder::new(token).client(reqwest_client).build())
}

async fn build_client(token: &str, discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>) -> anyhow::Result<Client> {
    let intents = GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS;

    let http = build_http(token)?;
    let events = DiscordBotEvents { discord_events_tx };
    let client = serenity::client::ClientBuilder::new_with_http(http, intents)
        .event_handler(events)
        .await?;
    Ok(client)
}

/// Exponential backoff for Discord reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn discord_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(MAX_DELAY)
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

pub struct DiscordBot {
    client: Option<Client>,
    token: String,
    ingest: ChatIngest,
    discord_events_rx: mpsc::UnboundedReceiver<DiscordBotEvent>,
    discord_events_tx: mpsc::UnboundedSender<DiscordBotEvent>,
    shutdown_rx: watch::Receiver<bool>,
}

impl DiscordBot {
    pub async fn new(token: String, ingest: ChatIngest, shutdown_rx: watch::Receiver<bool>) -> anyhow::Result<Self> {
        let (discord_events_tx, discord_events_rx) = mpsc::unbounded_channel::<DiscordBotEvent>();
        let client = build_client(&token, discord_events_tx.clone()).await?;
        Ok(Self {
            client: Some(client),
            token,
            ingest,
            discord_events_rx,
            discord_events_tx,
            shutdown_rx,
        })
    }

    pub async fn run(self) {
        let Self {
            mut client,
            token,
            mut ingest,
            mut discord_events_rx,
            discord_events_tx,
            shutdown_rx,
        } = self;

        let shard_manager = client.as_ref().map(|c| c.shard_manager.clone());
        let mut events_shutdown_rx = shutdown_rx.clone();
        let mut shutdown_rx = shutdown_rx;

        tokio::select! {
            _ = Self::run_connection(&mut client, &token, &discord_events_tx) => {},
            _ = Self::process_events(&mut discord_events_rx, &mut ingest, &mut events_shutdown_rx) => {},
            _ = async {
                loop {
                    if shutdown_rx.changed().await.is_err() || *shutdown_rx.borrow() {
                        break;
                    }
                }
                // Gracefully shutdown Discord gateway
                if let Some(ref manager) = shard_manager {
                    info!("Initiating graceful Discord shutdown...");
                    manager.shutdown_all().await;
                    info!("Discord shutdown complete");
                }
            } => {}
        }
        info!("Discord task ended");
    }

    async fn run_connection(
        client: &mut Option<Client>,
        token: &str,
        discord_events_tx: &mpsc::UnboundedSender<DiscordBotEvent>,
    ) {
        let mut backoff = discord_backoff();

        loop {
            info!("Connecting to Discord...");

            let mut client = match client.take() {
                Some(client) => client,
                None => {
                    // serenity mostly handles reconnections itself.
                    match build_client(token, discord_events_tx.clone()).await {
                        Ok(client) => {
                            backoff = discord_backoff();
                            client
                        }
                        Err(e) => {
                            error!("Failed to rebuild Discord client: {}", e);
                            let delay = backoff.next().unwrap_or(MAX_DELAY);
                            warn!("Retrying in {:.1}s...", delay.as_secs_f64());
                            sleep(delay).await;
                            continue;
                        }
                    }
                }
            };

            match client.start().await {
                Ok(()) => {
                    info!("Discord client disconnected normally");
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    break;
                }
                Err(e) => {
                    error!("Discord client error: {}", e);
                    let delay = backoff.next().unwrap_or(MAX_DELAY);
                    warn!(
                        "Discord disconnected. Reconnecting in {:.1}s...",
                        delay.as_secs_f64(),
                    );
                    if let Err(error) = discord_events_tx.send(DiscordBotEvent::Disconnected) {
                        warn!("Failed to process discord event: {}", error);
                    }
                    sleep(delay).await;
                }
            }
        }
    }

    async fn process_events(
        discord_events_rx: &mut mpsc::UnboundedReceiver<DiscordBotEvent>,
        ingest: &mut ChatIngest,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = discord_events_rx.recv() => {
                    match event {
                        Some(DiscordBotEvent::Ready(ready)) => {
                            info!("Discord bot connected as {}", ready.user.name);
                            ingest.set_bot_user(Some(ready.user.id));
                        }
                        Some(DiscordBotEvent::Message { context, message }) => {
                            ingest.handle_message(context, message).await;
                        }
                        Some(DiscordBotEvent::Disconnected) => {
                            ingest.set_bot_user(None);
                        }
                        None => {
                            debug!("Discord events channel closed.");
                            break;
                        }
                    }
                }

                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping event processing");
                        break;
                    }
                }
            }
        }
    }
}
