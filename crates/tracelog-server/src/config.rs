//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use tracelog_core::{ActionWhitelist, IntegrityHasher, TracingOptions, WhitelistError};
use tracelog_types::{Identity, DEFAULT_ACTIONS};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Storage backend selection.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Audit log settings.
    #[serde(default)]
    pub tracing: TracingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// SQLite busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Maximum pooled connections.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Where services and log entries are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// The SQLite database at `database.path`.
    #[default]
    Sqlite,
    /// Process memory; everything is lost on shutdown.
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid(format!(
                "unknown storage backend '{other}', expected 'sqlite' or 'memory'"
            ))),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Storage backend.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "tracelog_core=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Audit log configuration, fixed for the lifetime of a deployment.
#[derive(Debug, Clone, Deserialize)]
pub struct TracingConfig {
    /// The identity allowed to register services.
    #[serde(default)]
    pub controller: String,

    /// Key for the composite hash. Changing it orphans every stored hash.
    #[serde(default)]
    pub integrity_key: String,

    /// Permitted actions.
    #[serde(default = "default_actions")]
    pub actions: Vec<String>,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "tracelog.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_actions() -> Vec<String> {
    DEFAULT_ACTIONS.iter().map(|a| a.to_string()).collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            controller: String::new(),
            integrity_key: String::new(),
            actions: default_actions(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// The action whitelist is unusable.
    #[error("invalid tracing.actions: {0}")]
    Whitelist(#[from] WhitelistError),

    /// A value is present but unusable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Checks values serde cannot: a controller must be set and the
    /// whitelist must be usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` or `ConfigError::Whitelist`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracing.controller.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "tracing.controller must be set (or TRACELOG_CONTROLLER)".to_string(),
            ));
        }
        ActionWhitelist::new(&self.tracing.actions)?;
        Ok(())
    }

    /// Builds the core service options from the `[tracing]` section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if [`Config::validate`] would fail.
    pub fn tracing_options(&self) -> Result<TracingOptions, ConfigError> {
        self.validate()?;
        if self.tracing.integrity_key.is_empty() {
            tracing::warn!("tracing.integrity_key is empty; composite hashes are unkeyed");
        }
        Ok(TracingOptions {
            controller: Identity::new(self.tracing.controller.trim()),
            whitelist: ActionWhitelist::new(&self.tracing.actions)?,
            hasher: IntegrityHasher::new(self.tracing.integrity_key.as_bytes()),
        })
    }
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `TRACELOG_HOST` overrides `server.host`
/// - `TRACELOG_PORT` overrides `server.port`
/// - `TRACELOG_DB_PATH` overrides `database.path`
/// - `TRACELOG_STORAGE_BACKEND` overrides `storage.backend`
/// - `TRACELOG_LOG_LEVEL` overrides `logging.level`
/// - `TRACELOG_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `TRACELOG_CONTROLLER` overrides `tracing.controller`
/// - `TRACELOG_INTEGRITY_KEY` overrides `tracing.integrity_key`
/// - `TRACELOG_ACTIONS` overrides `tracing.actions` (comma-separated)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed,
/// or if an override names an unknown storage backend.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Applies `TRACELOG_*` overrides read through `lookup`.
pub(crate) fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup("TRACELOG_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("TRACELOG_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = lookup("TRACELOG_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(backend) = lookup("TRACELOG_STORAGE_BACKEND") {
        config.storage.backend = backend.parse()?;
    }
    if let Some(level) = lookup("TRACELOG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("TRACELOG_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(controller) = lookup("TRACELOG_CONTROLLER") {
        config.tracing.controller = controller;
    }
    if let Some(key) = lookup("TRACELOG_INTEGRITY_KEY") {
        config.tracing.integrity_key = key;
    }
    if let Some(actions) = lookup("TRACELOG_ACTIONS") {
        config.tracing.actions = actions.split(',').map(str::to_string).collect();
    }
    Ok(())
}
