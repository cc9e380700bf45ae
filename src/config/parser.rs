//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    HoconLoader::new()
        .load_file(path)
        .map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}

#[cfg(test)]
pub(crate) const SAMPLE_CONFIG: &str = r#"
discord {
  token = "abc.def"
  guild_id = 100
  owner_id = 7
  bypass_role_id = 8
  channels {
    vote { channel_id = 1 }
    welcome { channel_id = 2 }
    sharpening { channel_id = 3 }
    death { channel_id = 4 }
    chat { channel_id = 5 }
    debug { channel_id = 6 }
    logging { channel_id = 9 }
    general { channel_id = 10, ping_group = 1000 }
    snovasion { channel_id = 11, ping_group = 1011 }
    labyrinth { channel_id = 12, ping_group = 1012 }
    beef { channel_id = 13, ping_group = 1013 }
    abyssal { channel_id = 14, ping_group = 1014 }
    attack_on_giant { channel_id = 15, ping_group = 1015 }
    fox { channel_id = 16, ping_group = 1016 }
    bait { channel_id = 17, ping_group = 1017 }
    castle { channel_id = 18, ping_group = 1018 }
    team_deathmatch { channel_id = 19, ping_group = 1019 }
    free_for_all { channel_id = 20, ping_group = 1020 }
  }
}
game {
  host = "127.0.0.1"
  port = 25580
}
redis {
  url = "redis://127.0.0.1/"
}
relay {
  batch_size = 10
}
"#;
