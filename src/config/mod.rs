//! Configuration for the billing service.
//!
//! Layers, lowest first: built-in defaults, an optional TOML file, then
//! `BILLING_*` environment variables. The result is validated before use.

use crate::fulfillment::RetryPolicy;
use serde::Deserialize;
use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

mod error;

pub use error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub store: StoreConfig,
    pub messaging: MessagingConfig,
    pub fulfillment: FulfillmentConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,

    /// Time given to sessions to close on shutdown.
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset (trace, debug, info, warn, error).
    pub level: String,

    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Request queue length of each store actor.
    pub actor_buffer: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Prefixed to numbers that have exactly `local_number_len` digits.
    pub country_code: String,
    pub local_number_len: usize,

    #[serde(with = "humantime_serde")]
    pub send_timeout: Duration,

    /// Root directory of the outbox transport.
    pub outbox_dir: PathBuf,

    /// Outbox transport accepts its own pairing challenge.
    pub auto_pair: bool,

    #[serde(with = "humantime_serde")]
    pub pairing_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FulfillmentConfig {
    pub queue_capacity: usize,
    pub max_concurrent_jobs: usize,

    /// How long a job waits for the tenant's session to connect.
    #[serde(with = "humantime_serde")]
    pub ready_timeout: Duration,

    pub retry: RetryPolicy,

    /// Delivered or failed job records kept on the board.
    pub retain_finished: usize,

    /// Time in-flight jobs get to finish once the queue closes.
    #[serde(with = "humantime_serde")]
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            shutdown_grace: Duration::from_secs(5),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { actor_buffer: 64 }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            country_code: "91".to_string(),
            local_number_len: 10,
            send_timeout: Duration::from_secs(30),
            outbox_dir: PathBuf::from("./outbox"),
            auto_pair: true,
            pairing_delay: Duration::from_secs(2),
        }
    }
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_concurrent_jobs: 8,
            ready_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            retain_finished: crate::fulfillment::DEFAULT_RETAINED_JOBS,
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{key}={raw}: {e}")))
}

impl Config {
    /// Defaults, then `path` (if given), then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML file. Missing sections and keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Applies `BILLING_*` overrides read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(addr) = lookup("BILLING_BIND_ADDRESS") {
            self.server.bind_address = parse_var("BILLING_BIND_ADDRESS", &addr)?;
        }
        if let Some(level) = lookup("BILLING_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("BILLING_LOG_JSON") {
            self.logging.json = parse_var("BILLING_LOG_JSON", &json)?;
        }
        if let Some(code) = lookup("BILLING_COUNTRY_CODE") {
            self.messaging.country_code = code;
        }
        if let Some(dir) = lookup("BILLING_OUTBOX_DIR") {
            self.messaging.outbox_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        if self.store.actor_buffer == 0 {
            return Err(ConfigError::ValidationFailed(
                "store.actor_buffer must be greater than 0".to_string(),
            ));
        }

        let code = &self.messaging.country_code;
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::ValidationFailed(format!(
                "messaging.country_code must be digits, got {code:?}"
            )));
        }
        if self.messaging.local_number_len == 0 {
            return Err(ConfigError::ValidationFailed(
                "messaging.local_number_len must be greater than 0".to_string(),
            ));
        }
        if self.messaging.send_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "messaging.send_timeout must be greater than 0".to_string(),
            ));
        }

        let fulfillment = &self.fulfillment;
        if fulfillment.queue_capacity == 0 || fulfillment.max_concurrent_jobs == 0 {
            return Err(ConfigError::ValidationFailed(
                "fulfillment queue_capacity and max_concurrent_jobs must be greater than 0"
                    .to_string(),
            ));
        }
        if fulfillment.retain_finished == 0 {
            return Err(ConfigError::ValidationFailed(
                "fulfillment.retain_finished must be greater than 0".to_string(),
            ));
        }
        if fulfillment.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "fulfillment.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if fulfillment.retry.base_delay > fulfillment.retry.max_delay {
            return Err(ConfigError::ValidationFailed(
                "fulfillment.retry.base_delay exceeds max_delay".to_string(),
            ));
        }

        Ok(())
    }
}
