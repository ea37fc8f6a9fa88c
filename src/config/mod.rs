//! Configuration management for the pushback strategy.
//!
//! This module handles loading configuration from an optional TOML file
//! and `POSEIDON__`-prefixed environment variables.

use std::env;
use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat, Source};
use config::builder::{ConfigBuilder as Builder, DefaultState};
use dotenv::dotenv;
use thiserror::Error;
use crate::models::{Config, DEFAULT_ALERT_NAME};

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Configuration source error: {0}")]
    Source(#[from] ConfigError),
    #[error("Invalid strategy configuration: {0}")]
    Invalid(String),
}

fn with_defaults() -> Result<Builder<DefaultState>, ConfigError> {
    ConfigBuilder::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("strategy.distributed", false)?
        .set_default("strategy.scale", 0.5)?
        .set_default("strategy.omega", 3.0)?
        .set_default("strategy.rho", 0.125)?
        .set_default("strategy.alert_name", DEFAULT_ALERT_NAME)?
        .set_default("strategy.window_ms", 10_000)?
        .set_default("strategy.wait_time_ms", 60)
}

fn finish(builder: Builder<DefaultState>) -> Result<Config, ConfigLoadError> {
    let config: Config = builder.build()?.try_deserialize()?;
    config.strategy.validate().map_err(ConfigLoadError::Invalid)?;
    Ok(config)
}

/// Load configuration from the config file and environment variables
pub fn load_config() -> Result<Config, ConfigLoadError> {
    dotenv().ok();
    let config_file = env::var("POSEIDON_CONFIG_FILE").unwrap_or_else(|_| "config/poseidon.toml".to_string());

    load_layered(File::with_name(&config_file).required(false), environment())
}

fn environment() -> Environment {
    Environment::with_prefix("POSEIDON").separator("__").try_parsing(true)
}

/// Defaults, then `file`, then `env`; later layers win
fn load_layered<F>(file: F, env: Environment) -> Result<Config, ConfigLoadError>
where
    F: Source + Send + Sync + 'static,
{
    finish(with_defaults()?.add_source(file).add_source(env))
}

/// Load configuration from an in-memory TOML document layered over the defaults
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigLoadError> {
    finish(with_defaults()?.add_source(File::from_str(toml, FileFormat::Toml)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::Map;

    #[test]
    fn empty_document_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn overrides_strategy_fields() {
        let config = load_config_from_str(
            r#"
            [strategy]
            distributed = true
            omega = 4.5
            wait_time_ms = 120
            "#,
        )
        .unwrap();

        assert!(config.strategy.distributed);
        assert_eq!(config.strategy.omega, 4.5);
        assert_eq!(config.strategy.wait_time_ms, 120);
        assert_eq!(config.strategy.rho, 0.125);
    }

    #[test]
    fn environment_overrides_file() {
        let file = File::from_str("[strategy]\nomega = 4.5\nrho = 0.25\n", FileFormat::Toml);
        let vars = Map::from([
            ("POSEIDON__STRATEGY__OMEGA".to_string(), "6.0".to_string()),
            ("POSEIDON__SERVER__PORT".to_string(), "9090".to_string()),
            ("UNRELATED__STRATEGY__RHO".to_string(), "0.5".to_string()),
        ]);

        let config = load_layered(file, environment().source(Some(vars))).unwrap();
        assert_eq!(config.strategy.omega, 6.0);
        assert_eq!(config.strategy.rho, 0.25);
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn environment_values_are_validated() {
        let vars = Map::from([("POSEIDON__STRATEGY__SCALE".to_string(), "0".to_string())]);
        let err = load_layered(File::from_str("", FileFormat::Toml), environment().source(Some(vars))).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(_)));
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let file = File::with_name("config/does-not-exist").required(false);
        let config = load_layered(file, environment().source(Some(Map::new()))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn rejects_invalid_scale() {
        let err = load_config_from_str("[strategy]\nscale = 2.0\n").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Invalid(_)));
    }
}
