//! Minewind bridge - game chat and event pings for Discord
//!
//! Relays Minewind chat into Discord channels by category, pings event
//! roles for world events, and relays a Discord channel back into the game.

mod bridge;
mod common;
mod config;
mod discord;
mod events;
mod game;
mod lifecycle;
mod relay;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use bridge::{ChatToGame, GameIngest, GameToChat};
use common::{GameLineEntry, OutboundChatEntry};
use config::{env::get_config_path, load_and_validate, Config};
use discord::{build_http, ChatIngest, ChatSink, DiscordBot, DiscordSink, Notice, Notifier};
use game::{GameClient, GameLink};
use lifecycle::LifecycleTracker;
use relay::{Cursor, RedisStore, RelayQueue};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Minewind bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_path = get_config_path();
    info!("Loading configuration from {}...", config_path);

    let config = load_and_validate(&config_path).map_err(|e| {
        error!("Failed to load configuration: {}", e);
        error!("Please ensure {} exists and is properly formatted.", config_path);
        e
    })?;

    info!("Configuration loaded successfully");
    info!("  Game proxy: {}:{}", config.game.host, config.game.port);
    info!("  Guild: {}", config.discord.guild_id);

    let notifier = Notifier::new(&config.discord)?;

    match run(config, &notifier).await {
        Ok(true) => {
            notifier.announce(Notice::Stopped).await;
            info!("Exiting...");
            Ok(())
        }
        Ok(false) => {
            notifier.announce(Notice::Crashed).await;
            std::process::exit(1);
        }
        Err(e) => {
            error!("Fatal error: {:#}", e);
            notifier.announce(Notice::Crashed).await;
            std::process::exit(1);
        }
    }
}

/// Run every task until a shutdown signal or until one of them stops.
///
/// Returns `true` for a signalled shutdown.
async fn run(config: Config, notifier: &Notifier) -> Result<bool> {
    let schedule = config.schedule.resolve()?;

    // ============================================================
    // Durable state
    // ============================================================
    info!("Connecting to Redis...");
    let store = Arc::new(RedisStore::connect(&config.redis.url).await?);

    let tracker = LifecycleTracker::new(store.clone(), config.relay.lifecycle_key.as_str());
    tracker.init().await;

    let game_cursor = Cursor::load(store.clone(), config.relay.game_cursor_key.as_str()).await?;
    let chat_cursor = Cursor::load(store.clone(), config.relay.chat_cursor_key.as_str()).await?;

    let game_queue: RelayQueue<GameLineEntry> = RelayQueue::new(
        store.clone(),
        config.relay.game_stream.as_str(),
        config.relay.game_stream_max_len,
    );
    let chat_queue: RelayQueue<OutboundChatEntry> = RelayQueue::new(
        store.clone(),
        config.relay.chat_stream.as_str(),
        config.relay.chat_stream_max_len,
    );

    // ============================================================
    // Adapters
    // ============================================================
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let (game_client, outbound_rx) = GameClient::new(config.game.clone());
    let game: Arc<dyn GameLink> = Arc::new(game_client.clone());
    let ingest = GameIngest::new(&game, game_queue.clone());

    let http = Arc::new(build_http(&config.discord.token)?);
    let sink: Arc<dyn ChatSink> = Arc::new(DiscordSink::new(http, config.discord.guild_id));

    let chat_ingest = ChatIngest::new(&config.discord, chat_queue.clone(), game.clone());
    let discord_bot = DiscordBot::new(config.discord.token.clone(), chat_ingest, shutdown_rx.clone()).await?;

    let game_to_chat = GameToChat::new(
        &config,
        schedule,
        tracker,
        game_queue,
        game_cursor,
        sink.clone(),
        game.clone(),
    );
    let chat_to_game = ChatToGame::new(&config, chat_queue, chat_cursor, game, sink);

    // ============================================================
    // Spawn tasks
    // ============================================================
    let mut tasks = JoinSet::new();
    {
        let shutdown_rx = shutdown_rx.clone();
        tasks.spawn(async move {
            game_client.run(outbound_rx, shutdown_rx).await;
            "game client"
        });
    }
    tasks.spawn(async move {
        discord_bot.run().await;
        "discord"
    });
    tasks.spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            ingest.run(shutdown_rx).await;
            "game ingestion"
        }
    });
    tasks.spawn({
        let shutdown_rx = shutdown_rx.clone();
        async move {
            game_to_chat.run(shutdown_rx).await;
            "game -> chat relay"
        }
    });
    tasks.spawn(async move {
        chat_to_game.run(shutdown_rx).await;
        "chat -> game relay"
    });

    notifier.announce(Notice::Started).await;

    let signalled = tokio::select! {
        biased;
        _ = shutdown_signal() => {
            info!("Shutdown signal received - stopping tasks...");
            true
        }
        finished = tasks.join_next() => {
            match finished {
                Some(Ok(name)) => error!("The {} task stopped unexpectedly", name),
                Some(Err(e)) => error!("A task failed: {}", e),
                None => error!("No tasks were running"),
            }
            false
        }
    };

    // Fire-and-forget: receivers may already be gone
    let _ = shutdown_tx.send(true);

    let drain = async {
        while let Some(finished) = tasks.join_next().await {
            match finished {
                Ok(name) => info!("The {} task stopped", name),
                Err(e) => warn!("Task failed during shutdown: {}", e),
            }
        }
    };
    if tokio::time::timeout(Duration::from_secs(5), drain).await.is_err() {
        warn!("Timed out waiting for tasks to stop");
        tasks.abort_all();
    }

    Ok(signalled)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
