//! Configuration management for kelvin.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)
//!
//! The resulting [`Config`] is immutable for the life of the process and is
//! passed by reference into every request-handling call; nothing reads
//! deployment state from ambient globals.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{KelvinError, Result};

/// Command-line arguments for kelvin
#[derive(Parser, Debug)]
#[command(name = "kelvin")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the HAPI home directory (capabilities.json, catalog.json,
    /// info/, data/)
    pub hapi_home: PathBuf,

    /// Host address to bind to
    #[arg(short = 'H', long, env = "KELVIN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "KELVIN_PORT", default_value = "8000")]
    pub port: u16,

    /// Path to JSON configuration file
    #[arg(short, long, env = "KELVIN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend reader serving this deployment (csv)
    #[arg(short, long, env = "KELVIN_BACKEND")]
    pub backend: Option<String>,

    /// Stream data per storage unit instead of buffering the full response
    #[arg(long, env = "KELVIN_STREAM")]
    pub stream: Option<bool>,

    /// Tag segments allowed before the hapi path root, comma-separated
    #[arg(long, env = "KELVIN_TAGS", value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Server title shown on the introduction page
    #[arg(long, env = "KELVIN_TITLE")]
    pub title: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KELVIN_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// HAPI deployment configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HapiConfig {
    /// Server title shown on the introduction page
    #[serde(default = "default_title")]
    pub title: String,

    /// Backend reader serving this deployment
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Tag segments allowed before the hapi path root
    #[serde(default)]
    pub tags_allowed: Vec<String>,

    /// Stream data per storage unit instead of buffering
    #[serde(default = "default_stream")]
    pub stream: bool,
}

/// Complete configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// HAPI deployment configuration
    #[serde(default)]
    pub hapi: HapiConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence.
    ///
    /// Returns the merged config and the HAPI home directory (a required
    /// positional argument, never sourced from the config file).
    pub fn load() -> Result<(Self, PathBuf)> {
        let args = Args::parse();

        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        config.server.host = args.host;
        config.server.port = args.port;
        if let Some(backend) = args.backend {
            config.hapi.backend = backend;
        }
        if let Some(stream) = args.stream {
            config.hapi.stream = stream;
        }
        if let Some(tags) = args.tags {
            config.hapi.tags_allowed = tags;
        }
        if let Some(title) = args.title {
            config.hapi.title = title;
        }
        config.log_level = args.log_level;

        Ok((config, args.hapi_home))
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.server = other.server;
        self.hapi = other.hapi;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            return Err(KelvinError::Config {
                message: "Server host cannot be empty".to_string(),
            });
        }

        if self.server.port == 0 {
            return Err(KelvinError::Config {
                message: "Server port cannot be 0".to_string(),
            });
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(KelvinError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        match self.hapi.backend.as_str() {
            "csv" => {}
            _ => {
                return Err(KelvinError::Config {
                    message: format!(
                        "Unknown backend: {}. Must be one of: csv",
                        self.hapi.backend
                    ),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            hapi: HapiConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for HapiConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            backend: default_backend(),
            tags_allowed: Vec::new(),
            stream: default_stream(),
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_title() -> String {
    "kelvin HAPI server".to_string()
}

fn default_backend() -> String {
    "csv".to_string()
}

fn default_stream() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
