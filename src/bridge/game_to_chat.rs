//! Game -> chat relay loop.
//!
//! Polls the game stream in batches, classifies each line and routes it to
//! its Discord channel. Queued sends are flushed before the cursor moves.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, Utc};
use tokio::sync::watch;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::common::messages::{GameLineEntry, ScheduledEvent};
use crate::config::types::{Config, EventChannelConfig, EventChannels, Schedule};
use crate::discord::ChatSink;
use crate::events::{render_plain, SocialKind, Taxonomy, TimedEvent, TimedKind, Variant};
use crate::game::GameLink;
use crate::lifecycle::{predict, time_string_to_unix, LifecycleTracker};
use crate::relay::{Cursor, ReadResult, RelayQueue};

/// Channel a timed event is announced in.
pub fn event_channel(channels: &EventChannels, kind: TimedKind) -> &EventChannelConfig {
    match kind {
        TimedKind::Snovasion => &channels.snovasion,
        TimedKind::Beef => &channels.beef,
        TimedKind::Labyrinth => &channels.labyrinth,
        TimedKind::Abyssal => &channels.abyssal,
        TimedKind::AttackOnGiant => &channels.attack_on_giant,
        TimedKind::Fox => &channels.fox,
        TimedKind::Bait => &channels.bait,
        TimedKind::FreeForAll => &channels.free_for_all,
        TimedKind::TeamDeathmatch => &channels.team_deathmatch,
        TimedKind::Castle => &channels.castle,
    }
}

fn social_channel(channels: &EventChannels, kind: SocialKind) -> u64 {
    match kind {
        SocialKind::Vote => channels.vote.channel_id,
        SocialKind::Welcome => channels.welcome.channel_id,
        SocialKind::Sharpening => channels.sharpening.channel_id,
    }
}

/// Recomputes the upcoming event and announces it in game.
#[derive(Clone)]
pub struct UpcomingBroadcast {
    game: Arc<dyn GameLink>,
    sink: Arc<dyn ChatSink>,
    tracker: LifecycleTracker,
    schedule: Schedule,
    duration_min: u32,
}

impl UpcomingBroadcast {
    pub fn new(
        game: Arc<dyn GameLink>,
        sink: Arc<dyn ChatSink>,
        tracker: LifecycleTracker,
        schedule: Schedule,
        duration_min: u32,
    ) -> Self {
        Self {
            game,
            sink,
            tracker,
            schedule,
            duration_min,
        }
    }

    /// Send the prediction to game chat and create a reminder when it
    /// resolves to an absolute time.
    pub async fn run(&self) {
        let header = self.game.status_header();
        let last_title = self.tracker.get();
        let upcoming = predict(&header, last_title.as_deref(), Local::now().naive_local(), &self.schedule);
        let text = upcoming.display();
        info!("Upcoming: {}", text);

        if let Err(e) = self.game.send_line(&text).await {
            warn!("Failed to send upcoming event: {}", e);
        }

        let (Some(name), Some(time_string)) = (upcoming.event_name(), upcoming.time_string()) else {
            return;
        };
        let Some(time) = time_string_to_unix(time_string, Utc::now().timestamp()) else {
            debug!("No reminder for '{}'", time_string);
            return;
        };
        let event = ScheduledEvent {
            name: name.to_string(),
            time,
            duration_min: self.duration_min,
        };
        if let Err(e) = self.sink.create_scheduled_event(&event).await {
            warn!(name = %event.name, "Failed to create scheduled event: {}", e);
        }
    }
}

/// Game -> chat direction state.
pub struct GameToChat {
    taxonomy: Taxonomy,
    tracker: LifecycleTracker,
    queue: RelayQueue<GameLineEntry>,
    cursor: Cursor,
    sink: Arc<dyn ChatSink>,
    channels: EventChannels,
    upcoming: UpcomingBroadcast,
    batch_size: usize,
    poll_interval: Duration,
    upcoming_delay: Duration,
}

impl GameToChat {
    pub fn new(
        config: &Config,
        schedule: Schedule,
        tracker: LifecycleTracker,
        queue: RelayQueue<GameLineEntry>,
        cursor: Cursor,
        sink: Arc<dyn ChatSink>,
        game: Arc<dyn GameLink>,
    ) -> Self {
        let upcoming = UpcomingBroadcast::new(
            game,
            sink.clone(),
            tracker.clone(),
            schedule,
            config.relay.reminder_duration_min,
        );
        Self {
            taxonomy: Taxonomy::new(),
            tracker,
            queue,
            cursor,
            sink,
            channels: config.discord.channels.clone(),
            upcoming,
            batch_size: config.relay.batch_size,
            poll_interval: Duration::from_millis(config.relay.game_poll_ms),
            upcoming_delay: Duration::from_millis(config.relay.upcoming_delay_ms),
        }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(stream = self.queue.stream(), position = %self.cursor.position(), "Game -> chat relay started");
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll_once().await;
                }
                result = shutdown_rx.changed() => {
                    if result.is_err() || *shutdown_rx.borrow() {
                        info!("Game -> chat relay stopping");
                        break;
                    }
                }
            }
        }
    }

    /// Forward one batch. Returns the number of entries handled.
    pub async fn poll_once(&mut self) -> usize {
        let entries = match self.queue.read(self.cursor.position(), self.batch_size).await {
            Ok(ReadResult::NoNewEntries) => return 0,
            Ok(ReadResult::Entries(entries)) => entries,
            Err(e) => {
                warn!(stream = self.queue.stream(), position = %self.cursor.position(), "Skipping poll: {}", e);
                return 0;
            }
        };

        let now_unix = Utc::now().timestamp();
        for entry in &entries {
            self.route(&entry.payload.message, now_unix).await;
        }
        self.sink.flush_all().await;

        if let Some(last) = entries.last() {
            self.cursor.advance(last.id).await;
        }
        entries.len()
    }

    async fn route(&self, line: &str, now_unix: i64) {
        let variant = self.taxonomy.classify(line);
        debug!(variant = variant.name(), "{}", line);

        match variant {
            Variant::Social { kind, line, .. } => {
                self.sink
                    .queue(render_plain(&line), social_channel(&self.channels, kind));
            }
            Variant::Timed(event) => self.route_timed(&event, now_unix).await,
            Variant::System(line) => {
                debug!("System message: {}", line);
            }
            Variant::Death(line) => {
                self.sink.queue(render_plain(&line), self.channels.death.channel_id);
            }
            Variant::Chat(chat) => {
                self.sink.queue(chat.render(), self.channels.chat.channel_id);
            }
            Variant::Debug(line) => {
                self.sink.queue(render_plain(&line), self.channels.debug.channel_id);
            }
        }
    }

    async fn route_timed(&self, event: &TimedEvent<'_>, now_unix: i64) {
        if event.is_begin_transition() {
            if let Some(title) = event.title() {
                self.tracker.set(title).await;
            }
        }

        let channel = event_channel(&self.channels, event.kind());
        if event.should_notify() {
            let pings: Vec<u64> = [channel.ping_group, self.channels.general.ping_group]
                .into_iter()
                .flatten()
                .collect();
            self.sink.queue(event.render(&pings, now_unix), channel.channel_id);
        } else {
            debug!(event = event.kind().name(), "Suppressed: {}", event.line());
        }

        if event.is_end_message() {
            let upcoming = self.upcoming.clone();
            let delay = self.upcoming_delay;
            tokio::spawn(async move {
                sleep(delay).await;
                upcoming.run().await;
            });
        }
    }
}
