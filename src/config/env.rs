//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `MWBRIDGE_DISCORD_TOKEN` - Discord bot token
//! - `MWBRIDGE_REDIS_URL` - Redis connection URL
//! - `MWBRIDGE_GAME_HOST` - Game proxy host
//! - `MWBRIDGE_GAME_PORT` - Game proxy port

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "MWBRIDGE";

/// Apply environment variable overrides to a config.
///
/// Secrets like the bot token can be kept out of the config file.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(token) = env::var(format!("{}_DISCORD_TOKEN", ENV_PREFIX)) {
        config.discord.token = token;
    }
    if let Ok(url) = env::var(format!("{}_REDIS_URL", ENV_PREFIX)) {
        config.redis.url = url;
    }
    if let Ok(host) = env::var(format!("{}_GAME_HOST", ENV_PREFIX)) {
        config.game.host = host;
    }
    if let Ok(port) = env::var(format!("{}_GAME_PORT", ENV_PREFIX)) {
        if let Ok(port) = port.parse() {
            config.game.port = port;
        }
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `MWBRIDGE_CONFIG`, otherwise returns "minewind-bridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX))
        .unwrap_or_else(|_| "minewind-bridge.conf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::{load_config_str, SAMPLE_CONFIG};

    #[test]
    fn test_env_prefix() {
        assert_eq!(ENV_PREFIX, "MWBRIDGE");
    }

    #[test]
    fn test_apply_env_overrides() {
        env::set_var("MWBRIDGE_REDIS_URL", "redis://override/");
        env::set_var("MWBRIDGE_GAME_PORT", "not-a-port");

        let config = load_config_str(SAMPLE_CONFIG).unwrap();
        let result = apply_env_overrides(config);

        assert_eq!(result.redis.url, "redis://override/");
        // Unparseable port is ignored
        assert_eq!(result.game.port, 25580);

        env::remove_var("MWBRIDGE_REDIS_URL");
        env::remove_var("MWBRIDGE_GAME_PORT");
    }
}
