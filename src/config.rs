//! Configuration module for the fixture.
//!
//! Supports both command-line arguments and a TOML configuration file.
//! CLI arguments take precedence over config file values.

use crate::behavior::Options;
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "break-a-client")]
#[command(author = "break-a-client authors")]
#[command(version = "0.1.0")]
#[command(about = "A fault-injection TCP fixture", long_about = None)]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base port; each behavior binds the next consecutive port
    pub port: Option<u16>,

    /// Behavior names to launch (default: every registered behavior)
    pub behaviors: Vec<String>,

    /// Address to bind listeners on (e.g., 0.0.0.0)
    #[arg(long)]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// TOML configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct TomlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-behavior option tables: `[options.SlowResponse]` etc.
    #[serde(default)]
    pub options: BTreeMap<String, toml::value::Table>,
}

/// Server-related configuration
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address to bind listeners on
    #[serde(default = "default_host")]
    pub host: String,
    /// Base port
    pub base_port: Option<u16>,
    /// Behavior names to launch
    #[serde(default)]
    pub behaviors: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            base_port: None,
            behaviors: Vec::new(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level
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

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Final resolved configuration
#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub base_port: u16,
    pub behaviors: Vec<String>,
    pub behavior_options: BTreeMap<String, Options>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from CLI args and optional TOML file.
    /// CLI arguments take precedence over TOML file values.
    pub fn load() -> Result<Self, ConfigError> {
        let cli = CliArgs::parse();

        // Load TOML config if specified
        let toml_config = if let Some(ref config_path) = cli.config {
            let contents = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::FileRead(config_path.clone(), e))?;
            toml::from_str(&contents)
                .map_err(|e| ConfigError::TomlParse(config_path.clone(), e))?
        } else {
            TomlConfig::default()
        };

        Self::resolve(cli, toml_config)
    }

    /// Merge CLI args with TOML config (CLI takes precedence).
    fn resolve(cli: CliArgs, toml_config: TomlConfig) -> Result<Self, ConfigError> {
        let base_port = cli
            .port
            .or(toml_config.server.base_port)
            .ok_or(ConfigError::MissingPort)?;

        let behaviors = if cli.behaviors.is_empty() {
            toml_config.server.behaviors
        } else {
            cli.behaviors
        };

        let behavior_options = toml_config
            .options
            .into_iter()
            .map(|(name, table)| (name, Options::from_table(table)))
            .collect();

        Ok(Config {
            host: cli.host.unwrap_or(toml_config.server.host),
            base_port,
            behaviors,
            behavior_options,
            log_level: if cli.log_level != "info" {
                cli.log_level
            } else {
                toml_config.logging.level
            },
        })
    }
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
    FileRead(PathBuf, std::io::Error),
    TomlParse(PathBuf, toml::de::Error),
    MissingPort,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileRead(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::TomlParse(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::MissingPort => {
                write!(f, "A base port is required (argument or config file)")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
