//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `sensor-hub.toml`.
//!     loads configuration from file or falls back to defaults, then applies
//!     SENSOR_HUB_* environment overrides.
//!
//! structure:
//!     - ServerConfig: bind host and port.
//!     - StoreConfig: where the csv log lives.
//!     - LoggingConfig: default log level and sensor data verbosity.
//!     - DashboardConfig: optional html page served at `/`.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub const CONFIG_ENV: &str = "SENSOR_HUB_CONFIG";
pub const HOST_ENV: &str = "SENSOR_HUB_HOST";
pub const PORT_ENV: &str = "SENSOR_HUB_PORT";
pub const STORE_ENV: &str = "SENSOR_HUB_STORE";

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// file this config was read from, `None` for built-in defaults
    #[serde(skip)]
    pub source: Option<PathBuf>,
    /// override variables that were set but unusable
    #[serde(skip)]
    pub rejected_overrides: Vec<&'static str>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// log every saved record at info instead of debug
    pub show_sensor_data: bool,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub index_page: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 5000 }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: PathBuf::from("sensor_data.csv") }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), show_sensor_data: true }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TelemetryConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: TelemetryConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load from $SENSOR_HUB_CONFIG, the usual locations, or defaults
    ///
    /// a file that exists but does not parse is an error, not a silent fallback.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let mut config = match std::env::var_os(CONFIG_ENV) {
            Some(explicit) => Self::load(PathBuf::from(explicit))?,
            None => {
                let paths = [
                    PathBuf::from("config").join("sensor-hub.toml"),
                    PathBuf::from("..").join("config").join("sensor-hub.toml"),
                ];
                match paths.iter().find(|p| p.exists()) {
                    Some(path) => Self::load(path)?,
                    None => Self::default(),
                }
            }
        };

        config.rejected_overrides = config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply SENSOR_HUB_* overrides through `lookup`
    ///
    /// returns the names of variables that were present but unusable.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut rejected = Vec::new();

        if let Some(host) = lookup(HOST_ENV).filter(|h| !h.trim().is_empty()) {
            self.server.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => rejected.push(PORT_ENV),
            }
        }
        if let Some(store) = lookup(STORE_ENV).filter(|s| !s.trim().is_empty()) {
            self.store.path = PathBuf::from(store.trim());
        }

        rejected
    }

    /// Log configuration summary
    pub fn log_summary(&self) {
        match &self.source {
            Some(path) => tracing::info!(path = %path.display(), "configuration loaded"),
            None => tracing::warn!("no config file found - using defaults"),
        }
        for var in &self.rejected_overrides {
            tracing::warn!(var = %var, "ignoring invalid environment override");
        }
        tracing::info!(
            bind = %self.server.bind_addr(),
            store = %self.store.path.display(),
            log_level = %self.logging.level,
            index_page = ?self.dashboard.index_page,
            "host configuration"
        );
    }
}
