//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerSettings,
    /// Email transport configuration (optional; email channel is disabled when absent).
    #[serde(default)]
    pub email: Option<EmailSettings>,
    /// Push gateway configuration (optional; push channel is disabled when absent).
    #[serde(default)]
    pub push: Option<PushSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Scheduler timing configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// Trigger sweep interval in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Deferred-queue sweep interval in seconds.
    #[serde(default = "default_queue_interval_secs")]
    pub queue_interval_secs: u64,
    /// Window (hours) of domain activity that makes a user "active" for sweeps.
    #[serde(default = "default_activity_window_hours")]
    pub activity_window_hours: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            queue_interval_secs: default_queue_interval_secs(),
            activity_window_hours: default_activity_window_hours(),
        }
    }
}

/// SMTP email transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailSettings {
    /// SMTP host.
    pub smtp_host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
    /// From address for outgoing mail.
    pub from_address: String,
    /// From display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

/// Push gateway configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    /// Gateway endpoint that fans out to device push providers.
    pub gateway_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_push_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_sweep_interval_secs() -> u64 {
    900
}

const fn default_queue_interval_secs() -> u64 {
    60
}

const fn default_activity_window_hours() -> u64 {
    24
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Pulse".to_string()
}

const fn default_push_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `PULSE_ENV`)
    /// 3. Environment variables with `PULSE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("PULSE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("PULSE")
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
                config::Environment::with_prefix("PULSE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheduler_settings_defaults() {
        let settings = SchedulerSettings::default();
        assert_eq!(settings.sweep_interval_secs, 900);
        assert_eq!(settings.queue_interval_secs, 60);
        assert_eq!(settings.activity_window_hours, 24);
    }

    #[test]
    fn test_default_pool_sizes() {
        assert_eq!(default_max_connections(), 20);
        assert_eq!(default_min_connections(), 2);
        assert_eq!(default_port(), 3000);
    }
}
