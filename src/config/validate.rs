//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    // Discord
    if config.discord.token.is_empty() {
        errors.push("discord.token is required".to_string());
    }
    if config.discord.token == "YOUR_DISCORD_TOKEN_HERE" {
        errors.push("discord.token has not been configured (still using placeholder)".to_string());
    }
    if config.discord.guild_id == 0 {
        errors.push("discord.guild_id must be non-zero".to_string());
    }
    for (name, channel) in config.discord.channels.named() {
        if channel.channel_id == 0 {
            errors.push(format!("discord.channels.{}.channel_id must be non-zero", name));
        }
        if channel.ping_group == Some(0) {
            errors.push(format!("discord.channels.{}.ping_group must be non-zero", name));
        }
    }

    // Game proxy
    if config.game.host.is_empty() {
        errors.push("game.host is required".to_string());
    }
    if config.game.port == 0 {
        errors.push("game.port must be non-zero".to_string());
    }
    if config.game.max_line_length == 0 {
        errors.push("game.max_line_length must be non-zero".to_string());
    }

    if config.redis.url.is_empty() {
        errors.push("redis.url is required".to_string());
    }

    // Relay
    let relay = &config.relay;
    if relay.batch_size == 0 {
        errors.push("relay.batch_size must be non-zero".to_string());
    }
    for (name, value) in [
        ("relay.game_poll_ms", relay.game_poll_ms),
        ("relay.chat_idle_poll_ms", relay.chat_idle_poll_ms),
        ("relay.chat_delivered_poll_ms", relay.chat_delivered_poll_ms),
    ] {
        if value == 0 {
            errors.push(format!("{} must be non-zero", name));
        }
    }
    if relay.game_stream == relay.chat_stream {
        errors.push("relay.game_stream and relay.chat_stream must differ".to_string());
    }
    if relay.game_cursor_key == relay.chat_cursor_key {
        errors.push("relay.game_cursor_key and relay.chat_cursor_key must differ".to_string());
    }

    // Schedule
    if let Err(e) = config.schedule.resolve() {
        errors.push(e.to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
