//! Logging utilities for the Mapspec CLI
//!
//! This module provides:
//! - Structured logging setup on stderr (stdout carries command output)
//! - Session request IDs
//! - Performance timing spans
//! - Redaction of sensitive values before documents are logged

use crate::error::{Error, Result};
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global request ID for the current session
static REQUEST_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Emit ANSI colors
    pub ansi: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for production
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    /// Parse a format name, ignoring case
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            ansi: true,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    ///
    /// `base_level` applies when no `-v` flag was given.
    pub fn from_verbosity(verbosity: u8, base_level: &str) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {
                config.level = base_level.to_string();
            }
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply `RUST_LOG` and `MAPSPEC_LOG_FORMAT` overrides
    pub fn merge_with_env(&mut self) {
        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            self.level = rust_log;
        }

        if let Ok(format) = std::env::var("MAPSPEC_LOG_FORMAT") {
            match LogFormat::from_name(&format) {
                Some(parsed) => self.format = parsed,
                None => eprintln!("Warning: invalid MAPSPEC_LOG_FORMAT '{}', using default", format),
            }
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::other(format!("Invalid log filter '{}': {}", config.level, e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Each format yields a distinct subscriber type
    let installed = match config.format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            builder.with_ansi(config.ansi).compact().finish(),
        ),
        LogFormat::Full => {
            tracing::subscriber::set_global_default(builder.with_ansi(config.ansi).finish())
        }
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let request_id = REQUEST_ID.get_or_init(generate_request_id);

    tracing::info!(
        request_id = %request_id,
        level = %config.level,
        format = ?config.format,
        "Logging system initialized"
    );

    Ok(())
}

/// Generate a unique request ID for this session
pub fn generate_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Get the current request ID
pub fn current_request_id() -> Option<&'static str> {
    REQUEST_ID.get().map(|s| s.as_str())
}

/// Create a span with request ID and timing
pub fn create_operation_span(operation: &str, details: Option<&str>) -> Span {
    tracing::info_span!(
        "operation",
        operation = operation,
        request_id = current_request_id().unwrap_or("unknown"),
        details = details.unwrap_or(""),
        duration_ms = field::Empty,
    )
}

/// Sensitive data redaction utilities
///
/// Input documents routinely carry borrower identifiers, so anything logged
/// from them goes through here first.
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    const MASK: &str = "***";

    fn patterns() -> &'static [(Regex, &'static str)] {
        static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
        PATTERNS.get_or_init(|| {
            [
                // key=value and key: value pairs
                (
                    r#"(?i)(api[_-]?key|token|bearer|password|passwd|secret)[=:\s]+['"]?[^\s'",]{3,}['"]?"#,
                    "$1=***",
                ),
                // US social security numbers
                (r"\b\d{3}-\d{2}-\d{4}\b", "***-**-****"),
            ]
            .into_iter()
            .filter_map(|(pattern, replacement)| {
                Regex::new(pattern).ok().map(|regex| (regex, replacement))
            })
            .collect()
        })
    }

    /// Redact sensitive information from a string
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();
        for (regex, replacement) in patterns() {
            result = regex.replace_all(&result, *replacement).into_owned();
        }
        result
    }

    /// Redact sensitive information from JSON values
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) && !val.is_null() {
                        *val = Value::String(MASK.to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    redact_json_value(item);
                }
            }
            Value::String(s) => {
                *s = redact_sensitive(s);
            }
            _ => {}
        }
    }

    /// Check if a JSON key names sensitive information
    fn is_sensitive_key(key: &str) -> bool {
        let key = key.to_ascii_lowercase();
        [
            "ssn",
            "taxid",
            "tax_id",
            "password",
            "secret",
            "token",
            "apikey",
            "api_key",
            "accountnumber",
            "account_number",
            "dateofbirth",
            "dob",
        ]
        .iter()
        .any(|needle| key.contains(needle))
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs its duration when dropped
    pub struct Timer {
        start: Instant,
        span: Span,
        operation: String,
    }

    impl Timer {
        pub fn new(operation: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, None),
                operation: operation.to_string(),
            }
        }

        pub fn with_details(operation: &str, details: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_operation_span(operation, Some(details)),
                operation: operation.to_string(),
            }
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);

            tracing::debug!(
                operation = %self.operation,
                duration_ms = duration.as_millis() as u64,
                "Operation completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_redaction() {
        let input = "api_key=sk-1234567890abcdef password=secret123 ssn 123-45-6789";
        let redacted = redaction::redact_sensitive(input);
        assert!(redacted.contains("api_key=***"));
        assert!(redacted.contains("password=***"));
        assert!(redacted.contains("***-**-****"));
        assert!(!redacted.contains("sk-1234567890abcdef"));
        assert!(!redacted.contains("secret123"));
        assert!(!redacted.contains("123-45-6789"));
    }

    #[test]
    fn test_json_redaction() {
        let mut value = json!({
            "borrower": {
                "firstName": "Grace",
                "ssn": "123-45-6789",
                "taxId": null,
                "notes": ["call back, ssn 987-65-4321"]
            },
            "loan": { "amount": 320000 }
        });

        redaction::redact_json_value(&mut value);

        assert_eq!(value["borrower"]["firstName"], "Grace");
        assert_eq!(value["borrower"]["ssn"], "***");
        assert_eq!(value["borrower"]["taxId"], serde_json::Value::Null);
        assert_eq!(value["borrower"]["notes"][0], "call back, ssn ***-**-****");
        assert_eq!(value["loan"]["amount"], 320000);
    }

    #[test]
    fn test_logging_config_from_verbosity() {
        let config = LoggingConfig::from_verbosity(0, "error");
        assert_eq!(config.level, "error");
        assert!(!config.source_location);

        let config = LoggingConfig::from_verbosity(2, "warn");
        assert_eq!(config.level, "debug");
        assert!(config.source_location);

        let config = LoggingConfig::from_verbosity(3, "warn");
        assert_eq!(config.level, "trace");
        assert_eq!(config.format, LogFormat::Full);
        assert!(config.thread_ids);
    }

    #[test]
    fn test_request_ids_are_unique() {
        let first = generate_request_id();
        let second = generate_request_id();
        assert!(first.starts_with("req_"));
        assert_ne!(first, second);
    }

    #[test]
    fn test_log_format_names() {
        assert_eq!(LogFormat::from_name("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_name("full"), Some(LogFormat::Full));
        assert_eq!(LogFormat::from_name("pretty"), None);
    }
}
