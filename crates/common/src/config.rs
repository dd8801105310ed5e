//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Mutation API configuration.
    pub api: ApiConfig,
    /// Live store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Session persistence configuration.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Mutation API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST backend, e.g. `https://api.example.com`.
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Live store configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Capacity of the per-collection broadcast channel. Slow subscribers
    /// that fall further behind than this skip ahead to newer snapshots.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

/// Session persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Path of the JSON file holding the signed-in session.
    #[serde(default = "default_session_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

const fn default_channel_capacity() -> usize {
    256
}

fn default_session_path() -> String {
    "./.vigia/session.json".to_string()
}

const fn default_request_timeout_secs() -> u64 {
    30
}

const fn default_connect_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `VIGIA_ENV`)
    /// 3. Environment variables with `VIGIA_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("VIGIA_ENV").unwrap_or_else(|_| "development".to_string());
        tracing::debug!(environment = %env, "loading configuration");

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("VIGIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("VIGIA")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
