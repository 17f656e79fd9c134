//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error; the service starts on defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_DATABASE_PATH: &str = "EDT_DATABASE_PATH";
pub const ENV_BIND_ADDRESS: &str = "EDT_BIND_ADDRESS";
pub const ENV_PORT: &str = "EDT_PORT";
pub const ENV_CORS_ORIGIN: &str = "EDT_CORS_ORIGIN";
pub const ENV_LOG_LEVEL: &str = "EDT_LOG_LEVEL";

pub const DEFAULT_PORT: u16 = 5780;
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_LOG_LEVEL: &str = "info";
const DATABASE_FILE_NAME: &str = "edt.db";

/// Values used when nothing else is configured
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDefaults {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            database_path: default_data_folder().join(DATABASE_FILE_NAME),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// On-disk TOML configuration; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub cors_origin: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub cors_origin: Option<String>,
    pub log_level: Option<String>,
}

/// Fully resolved server configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    /// `None` allows any origin
    pub cors_origin: Option<String>,
    pub log_level: String,
}

impl ServerConfig {
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

/// Resolves [`ServerConfig`] from CLI, environment, TOML and defaults
pub struct ConfigResolver {
    cli: CliOverrides,
    defaults: CompiledDefaults,
}

impl ConfigResolver {
    pub fn new(cli: CliOverrides) -> Self {
        Self {
            cli,
            defaults: CompiledDefaults::for_current_platform(),
        }
    }

    pub fn resolve(self) -> Result<ServerConfig> {
        let toml = self.load_toml()?;
        let cli = self.cli;
        let defaults = self.defaults;

        let env_port = match env_var(ENV_PORT) {
            Some(value) => Some(value.parse::<u16>().map_err(|e| {
                Error::Config(format!("{} is not a valid port ({}): {}", ENV_PORT, value, e))
            })?),
            None => None,
        };

        Ok(ServerConfig {
            database_path: cli
                .database_path
                .or_else(|| env_var(ENV_DATABASE_PATH).map(PathBuf::from))
                .or(toml.database_path)
                .unwrap_or(defaults.database_path),
            bind_address: cli
                .bind_address
                .or_else(|| env_var(ENV_BIND_ADDRESS))
                .or(toml.bind_address)
                .unwrap_or(defaults.bind_address),
            port: cli.port.or(env_port).or(toml.port).unwrap_or(defaults.port),
            cors_origin: cli
                .cors_origin
                .or_else(|| env_var(ENV_CORS_ORIGIN))
                .or(toml.cors_origin),
            log_level: cli
                .log_level
                .or_else(|| env_var(ENV_LOG_LEVEL))
                .or(toml.logging.level)
                .unwrap_or(defaults.log_level),
        })
    }

    fn load_toml(&self) -> Result<TomlConfig> {
        if let Some(path) = &self.cli.config_file {
            // An explicitly named file must exist
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            return load_toml_config(path);
        }

        match find_config_file() {
            Some(path) => load_toml_config(&path),
            None => {
                debug!("No config file found, using environment and defaults");
                Ok(TomlConfig::default())
            }
        }
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// First existing config file among the platform locations
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("edt").join("config.toml"));
    let system_config = if cfg!(unix) {
        Some(PathBuf::from("/etc/edt/config.toml"))
    } else {
        None
    };

    [user_config, system_config]
        .into_iter()
        .flatten()
        .find(|path| path.exists())
}

/// OS-dependent default data folder
fn default_data_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/edt (or /var/lib/edt for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("edt"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/edt"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/edt
        dirs::data_dir()
            .map(|d| d.join("edt"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/edt"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\edt
        dirs::data_local_dir()
            .map(|d| d.join("edt"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\edt"))
    } else {
        PathBuf::from("./edt_data")
    }
}

/// Non-empty environment variable
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
