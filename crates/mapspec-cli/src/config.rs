//! Configuration management for the CLI
//!
//! This module handles loading configuration from:
//! - Default values
//! - Configuration files (YAML/JSON)
//! - Command-line arguments and their environment variables

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::logging::LogFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding mapping specifications
    pub mappings_dir: PathBuf,

    /// Profile applied by `run` when none is given
    pub default_profile: Option<String>,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colored output by default
    pub color: bool,

    /// Include the audit log in `run` output
    pub show_log: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no `-v` flag is given
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mappings_dir: PathBuf::from("mappings"),
            default_profile: None,
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "human".to_string(),
            color: true,
            show_log: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;

        let config: Config = if is_yaml(path) {
            serde_yaml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        eprintln!("Warning: Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        match file {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".mapspec.yaml"),
            PathBuf::from(".mapspec.json"),
        ];

        // ~/.config/mapspec on Linux
        if let Some(config_dir) = dirs::config_dir() {
            let mapspec_dir = config_dir.join("mapspec");
            paths.push(mapspec_dir.join("config.yaml"));
            paths.push(mapspec_dir.join("config.json"));
        }

        paths
    }

    /// Check the string-typed settings
    pub fn validate(&self) -> Result<()> {
        self.output_format()?;
        self.log_format()?;
        Ok(())
    }

    /// Configured output format
    pub fn output_format(&self) -> Result<OutputFormat> {
        OutputFormat::from_name(&self.output.format).ok_or_else(|| {
            Error::config(format!(
                "unknown output format '{}' (expected human, json, json-pretty or yaml)",
                self.output.format
            ))
        })
    }

    /// Configured log format
    pub fn log_format(&self) -> Result<LogFormat> {
        LogFormat::from_name(&self.logging.format).ok_or_else(|| {
            Error::config(format!(
                "unknown log format '{}' (expected compact, full or json)",
                self.logging.format
            ))
        })
    }

    /// Mappings directory, preferring the command-line value
    pub fn mappings_dir_or(&self, cli_dir: Option<&Path>) -> PathBuf {
        cli_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.mappings_dir.clone())
    }
}

/// Whether a path names a YAML document
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.eq_ignore_ascii_case("yaml") || s.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}
