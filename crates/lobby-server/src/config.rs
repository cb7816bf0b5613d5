//! Configuration loading for the lobby server.
//!
//! The canonical configuration lives in `lobby-config.yaml` at the project
//! root. Every field has a default, so a missing file or a partial file is
//! valid.
//!
//! Environment variables override the YAML:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LOBBY_PORT` | `server.port` |
//! | `DRAGONFLY_URL` | `store.url` (and selects the `dragonfly` backend) |
//! | `USER_DAILY_VBUCKS` | `economy.daily_grant` |
//! | `CATALOG_PATH` | `economy.catalog_path` |

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Why `lobby-config.yaml` or its environment overrides were rejected.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The lobby YAML did not match the `server`/`store`/`economy`/`logging`
    /// layout.
    #[error("invalid lobby config: {0}")]
    Layout(#[from] serde_yml::Error),

    /// `LOBBY_PORT` or `USER_DAILY_VBUCKS` held a value that is not a number
    /// of the right width.
    #[error("{var}={value:?} is not a valid number")]
    Override {
        /// Environment variable name.
        var: &'static str,
        /// Raw value found.
        value: String,
    },
}

/// Top-level lobby configuration, mirroring `lobby-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LobbyConfig {
    /// Listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Economy parameters.
    #[serde(default)]
    pub economy: EconomyConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LobbyConfig {
    /// Load configuration from a YAML file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise defaults with overrides applied.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides()?;
            Ok(config)
        }
    }

    /// Override fields from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Override fields from `lookup`, which maps a variable name to its value.
    ///
    /// `DRAGONFLY_URL` also switches the backend to `dragonfly`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(port) = lookup("LOBBY_PORT") {
            self.server.port = parse_override("LOBBY_PORT", port)?;
        }
        if let Some(url) = lookup("DRAGONFLY_URL") {
            self.store.backend = StoreBackend::Dragonfly;
            self.store.url = url;
        }
        if let Some(amount) = lookup("USER_DAILY_VBUCKS") {
            self.economy.daily_grant = parse_override("USER_DAILY_VBUCKS", amount)?;
        }
        if let Some(path) = lookup("CATALOG_PATH") {
            self.economy.catalog_path = Some(PathBuf::from(path));
        }
        Ok(())
    }
}

fn parse_override<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    match value.trim().parse() {
        Ok(parsed) => Ok(parsed),
        Err(_) => Err(ConfigError::Override { var, value }),
    }
}

/// Listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which document store backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local store; state is lost on restart.
    #[default]
    Memory,
    /// `Dragonfly` (Redis protocol).
    Dragonfly,
}

/// Document store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Backend selection.
    #[serde(default)]
    pub backend: StoreBackend,
    /// Connection URL for the `dragonfly` backend.
    #[serde(default = "default_dragonfly_url")]
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            url: default_dragonfly_url(),
        }
    }
}

/// Economy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Currency granted by the daily login reward.
    #[serde(default = "default_daily_grant")]
    pub daily_grant: u64,
    /// Balance of a newly provisioned account.
    #[serde(default)]
    pub starting_balance: u64,
    /// Season number stamped into athena profiles.
    #[serde(default = "default_season")]
    pub season: u32,
    /// JSON file of catalog offers. No file means an empty catalog.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            daily_grant: default_daily_grant(),
            starting_balance: 0,
            season: default_season(),
            catalog_path: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_dragonfly_url() -> String {
    "redis://localhost:6379".to_owned()
}

const fn default_daily_grant() -> u64 {
    50
}

const fn default_season() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_owned()
}
