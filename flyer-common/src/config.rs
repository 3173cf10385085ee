//! Bootstrap configuration loading and data folder resolution
//!
//! Bootstrap settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Runtime settings (validation schedule) live in the database `settings`
//! table instead; see [`crate::db::settings`].

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "FLYER_DATA_FOLDER";

/// Environment variable holding the API shared secret
pub const API_SECRET_ENV: &str = "FLYER_API_SECRET";

/// SQLite database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "flyer.db";

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5780;

/// Contents of the TOML bootstrap file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    #[serde(default)]
    pub bind: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Shared secret for protected API routes; empty disables the check
    #[serde(default)]
    pub api_secret: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_folder: Option<PathBuf>,
    pub bind: Option<String>,
    pub port: Option<u16>,
    pub api_secret: Option<String>,
}

/// Fully resolved bootstrap configuration
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    pub data_folder: PathBuf,
    pub database_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub api_secret: Option<String>,
    pub log_level: String,
}

impl BootstrapConfig {
    /// Merge CLI overrides, environment and TOML file into one configuration
    pub fn resolve(cli: &CliOverrides, toml: TomlConfig) -> Self {
        let data_folder = resolve_data_folder(cli.data_folder.as_deref(), &toml);
        let database_path = data_folder.join(DATABASE_FILE_NAME);

        let api_secret = cli
            .api_secret
            .clone()
            .or_else(|| std::env::var(API_SECRET_ENV).ok())
            .or(toml.api_secret)
            .filter(|secret| !secret.trim().is_empty());

        Self {
            data_folder,
            database_path,
            bind: cli
                .bind
                .clone()
                .or(toml.bind)
                .unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port: cli.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            api_secret,
            log_level: toml.logging.level,
        }
    }
}

/// Resolve the data folder: CLI > environment > TOML > compiled default
pub fn resolve_data_folder(cli_arg: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATA_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// Load the TOML bootstrap file.
///
/// An explicitly requested file must exist and parse. Without one, the
/// platform default location is tried; a missing default file is not an
/// error and yields the built-in defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) => path,
            None => {
                info!("No config file found, using built-in defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = parse_toml_config(&content).map_err(|e| {
        warn!("Failed to parse {}: {}", path.display(), e);
        e
    })?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Parse TOML bootstrap configuration from a string
pub fn parse_toml_config(content: &str) -> Result<TomlConfig> {
    toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
}

/// First existing config file among the platform locations
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("flyer").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(unix) {
        let system_config = PathBuf::from("/etc/flyer/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("flyer"))
        .unwrap_or_else(|| PathBuf::from("./flyer_data"))
}
