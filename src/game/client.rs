use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use backon::BackoffBuilder;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::common::error::GameError;
use crate::config::GameConfig;
use crate::game::codec::{new_proxy_connection, InboundFrame, OutboundFrame};
use crate::game::greetings::RecentGreetings;
use crate::game::link::GameLink;
use crate::game::text::{clean_component, strip_format_codes};

/// Capacity of the line fan-out; slow subscribers lose the oldest lines.
const LINE_BUFFER: usize = 256;

/// Create an exponential backoff iterator for proxy reconnection.
/// 5s initial, 5min max, factor 1.1, with jitter, unlimited retries.
fn game_backoff() -> impl Iterator<Item = Duration> {
    backon::ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(5))
        .with_max_delay(Duration::from_secs(300))
        .with_factor(1.1)
        .with_jitter()
        .without_max_times()
        .build()
}

#[derive(Debug, Default)]
struct ProxyState {
    header: String,
    players: Vec<String>,
}

struct Shared {
    config: GameConfig,
    outbound_tx: mpsc::UnboundedSender<OutboundFrame>,
    lines_tx: broadcast::Sender<String>,
    state: RwLock<ProxyState>,
    connected: AtomicBool,
}

/// Handle to the game proxy connection. Clones share one connection.
#[derive(Clone)]
pub struct GameClient {
    shared: Arc<Shared>,
}

impl GameClient {
    /// Create the client and the outbound queue its connection loop drains.
    pub fn new(config: GameConfig) -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (lines_tx, _) = broadcast::channel(LINE_BUFFER);
        let client = Self {
            shared: Arc::new(Shared {
                config,
                outbound_tx,
                lines_tx,
                state: RwLock::new(ProxyState::default()),
                connected: AtomicBool::new(false),
            }),
        };
        (client, outbound_rx)
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::SeqCst)
    }

    /// Keep a proxy connection up until shutdown, reconnecting with backoff.
    pub async fn run(
        &self,
        mut outbound_rx: mpsc::UnboundedReceiver<OutboundFrame>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        let mut backoff = game_backoff();
        let mut greetings = RecentGreetings::default();
        let host = self.shared.config.host.clone();
        let port = self.shared.config.port;

        loop {
            if *shutdown_rx.borrow() {
                info!("Shutdown signal detected, stopping reconnection loop");
                break;
            }

            info!("Connecting to game proxy at {}:{}...", host, port);
            match TcpStream::connect((host.as_str(), port)).await {
                Ok(stream) => {
                    backoff = game_backoff(); // Reset backoff on successful connection
                    match self
                        .handle_connection(stream, &mut outbound_rx, &mut shutdown_rx, &mut greetings)
                        .await
                    {
                        Ok(()) => info!("Game proxy disconnected"),
                        Err(e) => error!("Game proxy error: {}", e),
                    }
                }
                Err(source) => {
                    let e = GameError::ConnectFailed {
                        host: host.clone(),
                        port,
                        source,
                    };
                    error!("{}", e);
                }
            }

            if *shutdown_rx.borrow() {
                break;
            }

            let delay = backoff.next().unwrap_or(Duration::from_secs(300));
            info!("Reconnecting in {:.1} seconds...", delay.as_secs_f64());

            // Wait for delay OR shutdown signal
            tokio::select! {
                _ = tokio::time::sleep(delay) => {},
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received during backoff");
                        break;
                    }
                }
            }
        }
    }

    /// Drive one connection until it closes, fails, or shutdown is signalled.
    pub async fn handle_connection<S>(
        &self,
        stream: S,
        outbound_rx: &mut mpsc::UnboundedReceiver<OutboundFrame>,
        shutdown_rx: &mut watch::Receiver<bool>,
        greetings: &mut RecentGreetings,
    ) -> Result<(), GameError>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let mut connection = new_proxy_connection(stream);
        self.shared.connected.store(true, Ordering::SeqCst);
        info!("Game proxy connection established");

        let result = loop {
            tokio::select! {
                frame = connection.next() => {
                    match frame {
                        Some(Ok(frame)) => {
                            if let Err(e) = self.handle_frame(frame, greetings) {
                                break Err(e);
                            }
                        }
                        Some(Err(e)) => break Err(e),
                        None => break Ok(()), // Connection closed
                    }
                }

                Some(outgoing) = outbound_rx.recv() => {
                    if let Err(e) = connection.send(outgoing).await {
                        break Err(e);
                    }
                }

                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Closing game proxy connection for shutdown");
                        break Ok(());
                    }
                }
            }
        };

        self.shared.connected.store(false, Ordering::SeqCst);
        self.update_state(|state| *state = ProxyState::default());
        result
    }

    fn handle_frame(&self, frame: InboundFrame, greetings: &mut RecentGreetings) -> Result<(), GameError> {
        match frame {
            InboundFrame::Chat { json } => {
                let line = clean_component(&json);
                if line.is_empty() {
                    return Ok(());
                }
                debug!("Game line: {}", line);
                if !greetings.admit(&line) {
                    debug!(remembered = greetings.len(), "Suppressed duplicate welcome: {}", line);
                    return Ok(());
                }
                if self.shared.lines_tx.send(line).is_err() {
                    debug!("No line subscribers");
                }
            }
            InboundFrame::TabHeader { text } => {
                let header = strip_format_codes(&text).trim().to_string();
                self.update_state(|state| state.header = header);
            }
            InboundFrame::Players { mut names } => {
                names.sort_by_key(|name| name.to_lowercase());
                self.update_state(|state| state.players = names);
            }
            InboundFrame::Kicked { reason } => {
                warn!("Kicked from the server: {}", reason);
                return Err(GameError::Kicked { reason });
            }
            InboundFrame::Unknown => {
                debug!("Ignoring unknown proxy frame");
            }
        }
        Ok(())
    }

    fn send_frame(&self, text: String) -> Result<(), GameError> {
        if !self.is_connected() {
            return Err(GameError::NotConnected);
        }
        self.shared
            .outbound_tx
            .send(OutboundFrame::Chat { text })
            .map_err(|_| GameError::NotConnected)
    }

    fn update_state(&self, apply: impl FnOnce(&mut ProxyState)) {
        match self.shared.state.write() {
            Ok(mut guard) => apply(&mut guard),
            Err(poisoned) => apply(&mut poisoned.into_inner()),
        }
    }

    fn read_state<T>(&self, read: impl FnOnce(&ProxyState) -> T) -> T {
        match self.shared.state.read() {
            Ok(guard) => read(&guard),
            Err(poisoned) => read(&poisoned.into_inner()),
        }
    }
}

#[async_trait]
impl GameLink for GameClient {
    fn subscribe(&self) -> broadcast::Receiver<String> {
        self.shared.lines_tx.subscribe()
    }

    async fn send_line(&self, text: &str) -> Result<(), GameError> {
        let max = self.shared.config.max_line_length;
        let text: String = text.chars().take(max).collect();
        debug!("Sending to game: {}", text);
        self.send_frame(text)
    }

    async fn send_command(&self, command: &str, args: &str) -> bool {
        // Subscribe before sending so the reply cannot slip past
        let mut lines = self.subscribe();
        let text = if args.is_empty() {
            format!("/{}", command)
        } else {
            format!("/{} {}", command, args)
        };
        if let Err(e) = self.send_frame(text) {
            warn!(command = %command, "Failed to send command: {}", e);
            return true;
        }

        let phrases = &self.shared.config.failure_phrases;
        let watch_failure = async {
            loop {
                match lines.recv().await {
                    Ok(line) => {
                        if phrases.iter().any(|phrase| line == *phrase) {
                            return true;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return false,
                }
            }
        };

        let window = Duration::from_millis(self.shared.config.command_window_ms);
        let failed = tokio::time::timeout(window, watch_failure)
            .await
            .unwrap_or(false);
        if failed {
            warn!(command = %command, args = %args, "Game rejected command");
        }
        failed
    }

    fn player_list(&self) -> Vec<String> {
        self.read_state(|state| state.players.clone())
    }

    fn status_header(&self) -> String {
        self.read_state(|state| state.header.clone())
    }
}
