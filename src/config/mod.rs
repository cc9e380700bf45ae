//! Configuration parsing, validation and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

pub use types::*;

use crate::common::error::ConfigError;

/// Load a config file, apply environment overrides, then validate.
pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    let config = env::apply_env_overrides(parser::load_config(path)?);
    validate::validate_config(&config)?;
    Ok(config)
}
