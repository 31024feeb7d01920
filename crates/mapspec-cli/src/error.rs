//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from mapspec-core library
    #[error("{0}")]
    Core(#[from] mapspec_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid file format
    #[error("Invalid file format for {}: expected {} ({})", path.display(), expected, message)]
    InvalidFormat {
        path: PathBuf,
        expected: String,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No specification with this name in the mappings directory
    #[error("Mapping '{}' not found in {}", name, dir.display())]
    MappingNotFound { name: String, dir: PathBuf },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(_) => 2,
            Self::FileNotFound { .. } => 3,
            Self::InvalidFormat { .. } => 4,
            Self::Config(_) => 5,
            Self::MappingNotFound { .. } => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }

    /// Short machine-readable kind, used in JSON error reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io(_) => "Io",
            Self::Core(core) => core.kind(),
            Self::FileNotFound { .. } => "FileNotFound",
            Self::InvalidFormat { .. } => "InvalidFormat",
            Self::Config(_) => "Config",
            Self::MappingNotFound { .. } => "MappingNotFound",
            Self::Json(_) => "Json",
            Self::Yaml(_) => "Yaml",
            Self::Other { .. } => "Other",
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct() {
        let errors = [
            Error::Io(io::Error::new(io::ErrorKind::Other, "boom")),
            Error::Core(mapspec_core::Error::MissingMappingTree),
            Error::FileNotFound { path: PathBuf::from("a.json") },
            Error::InvalidFormat {
                path: PathBuf::from("a.json"),
                expected: "JSON".to_string(),
                message: "eof".to_string(),
            },
            Error::config("bad"),
            Error::MappingNotFound {
                name: "pricing".to_string(),
                dir: PathBuf::from("mappings"),
            },
            Error::other("misc"),
        ];
        let mut codes: Vec<i32> = errors.iter().map(Error::exit_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_core_errors_keep_their_kind() {
        let error = Error::from(mapspec_core::Error::invalid_spec("enums must be an object"));
        assert_eq!(error.kind(), "InvalidSpec");
        assert_eq!(
            error.to_string(),
            "Invalid mapping specification: enums must be an object"
        );
    }

    #[test]
    fn test_format_error_without_color() {
        let error = Error::MappingNotFound {
            name: "pricing".to_string(),
            dir: PathBuf::from("mappings"),
        };
        assert_eq!(
            format_error(&error, false),
            "Error: Mapping 'pricing' not found in mappings"
        );
    }
}
