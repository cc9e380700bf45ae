//! Configuration type definitions.

use chrono::{NaiveTime, Weekday};
use serde::Deserialize;

use crate::common::error::ConfigError;

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub discord: DiscordConfig,
    pub game: GameConfig,
    pub redis: RedisConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    pub guild_id: u64,
    /// User pinged on shutdown and allowed to bypass the relay queue.
    pub owner_id: u64,
    /// Role the owner must hold for the bypass to apply.
    pub bypass_role_id: Option<u64>,
    pub channels: EventChannels,
}

/// A Discord channel plus the role pinged for announcements in it.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct EventChannelConfig {
    pub channel_id: u64,
    pub ping_group: Option<u64>,
}

/// Every Discord channel the bridge posts to, by purpose.
#[derive(Debug, Clone, Deserialize)]
pub struct EventChannels {
    pub vote: EventChannelConfig,
    pub welcome: EventChannelConfig,
    pub sharpening: EventChannelConfig,
    pub death: EventChannelConfig,
    pub chat: EventChannelConfig,
    pub debug: EventChannelConfig,
    pub logging: EventChannelConfig,
    /// Shared audience pinged alongside every event announcement.
    pub general: EventChannelConfig,
    pub snovasion: EventChannelConfig,
    pub labyrinth: EventChannelConfig,
    pub beef: EventChannelConfig,
    pub abyssal: EventChannelConfig,
    pub attack_on_giant: EventChannelConfig,
    pub fox: EventChannelConfig,
    pub bait: EventChannelConfig,
    pub castle: EventChannelConfig,
    pub team_deathmatch: EventChannelConfig,
    pub free_for_all: EventChannelConfig,
}

impl EventChannels {
    /// All configured channels with their config path, for validation.
    pub fn named(&self) -> Vec<(&'static str, &EventChannelConfig)> {
        vec![
            ("vote", &self.vote),
            ("welcome", &self.welcome),
            ("sharpening", &self.sharpening),
            ("death", &self.death),
            ("chat", &self.chat),
            ("debug", &self.debug),
            ("logging", &self.logging),
            ("general", &self.general),
            ("snovasion", &self.snovasion),
            ("labyrinth", &self.labyrinth),
            ("beef", &self.beef),
            ("abyssal", &self.abyssal),
            ("attack_on_giant", &self.attack_on_giant),
            ("fox", &self.fox),
            ("bait", &self.bait),
            ("castle", &self.castle),
            ("team_deathmatch", &self.team_deathmatch),
            ("free_for_all", &self.free_for_all),
        ]
    }
}

/// Game-side proxy connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GameConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// Name restored after a relayed message was sent under another name.
    #[serde(default = "default_nickname")]
    pub default_nickname: String,
    /// How long to watch for a command failure reply.
    #[serde(default = "default_command_window_ms")]
    pub command_window_ms: u64,
    /// Replies that mark a command as rejected, matched against whole lines.
    #[serde(default = "default_failure_phrases")]
    pub failure_phrases: Vec<String>,
}

/// Redis connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// Relay queue and polling configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub game_stream: String,
    pub chat_stream: String,
    pub game_stream_max_len: usize,
    pub chat_stream_max_len: usize,
    pub game_cursor_key: String,
    pub chat_cursor_key: String,
    pub lifecycle_key: String,
    pub batch_size: usize,
    pub game_poll_ms: u64,
    pub chat_idle_poll_ms: u64,
    pub chat_delivered_poll_ms: u64,
    pub nickname_revert_ms: u64,
    pub upcoming_delay_ms: u64,
    pub reminder_duration_min: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            game_stream: "chat".to_string(),
            chat_stream: "dc-to-mw-chat".to_string(),
            game_stream_max_len: 4000,
            chat_stream_max_len: 1000,
            game_cursor_key: "prevId".to_string(),
            chat_cursor_key: "prevDCToMWId".to_string(),
            lifecycle_key: "mostRecentEvent".to_string(),
            batch_size: 5,
            game_poll_ms: 2000,
            chat_idle_poll_ms: 1000,
            chat_delivered_poll_ms: 5000,
            nickname_revert_ms: 400,
            upcoming_delay_ms: 1000,
            reminder_duration_min: 15,
        }
    }
}

/// Server reset schedule used for upcoming-event guesses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Reset time on ordinary days, `HH:MM:SS` local time.
    pub daily_reset: String,
    /// Reset time on the weekly castle day, `HH:MM:SS` local time.
    pub castle_reset: String,
    /// Weekday of the castle siege, e.g. "Saturday".
    pub castle_day: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_reset: "17:30:00".to_string(),
            castle_reset: "19:00:00".to_string(),
            castle_day: "Saturday".to_string(),
        }
    }
}

/// Parsed reset schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub daily_reset: NaiveTime,
    pub castle_reset: NaiveTime,
    pub castle_day: Weekday,
}

impl Schedule {
    /// Reset time that applies on the given weekday.
    pub fn reset_on(&self, day: Weekday) -> NaiveTime {
        if day == self.castle_day {
            self.castle_reset
        } else {
            self.daily_reset
        }
    }
}

impl ScheduleConfig {
    pub fn resolve(&self) -> Result<Schedule, ConfigError> {
        Ok(Schedule {
            daily_reset: parse_time("schedule.daily_reset", &self.daily_reset)?,
            castle_reset: parse_time("schedule.castle_reset", &self.castle_reset)?,
            castle_day: self
                .castle_day
                .parse::<Weekday>()
                .map_err(|_| ConfigError::InvalidValue {
                    field: "schedule.castle_day".to_string(),
                    message: format!("'{}' is not a weekday", self.castle_day),
                })?,
        })
    }
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S").map_err(|e| ConfigError::InvalidValue {
        field: field.to_string(),
        message: format!("'{}' is not HH:MM:SS ({})", value, e),
    })
}

fn default_max_line_length() -> usize {
    256
}

fn default_nickname() -> String {
    "DebugMenu".to_string()
}

fn default_command_window_ms() -> u64 {
    400
}

fn default_failure_phrases() -> Vec<String> {
    vec![
        "Unknown command. Type \"/help\" for help.".to_string(),
        "Nick is already taken".to_string(),
    ]
}
