//! Error types for the Mapspec core library
//!
//! Only specification-level problems are errors. Field-level resolution gaps
//! (unresolved paths, unknown enum keys, unknown converters, unmatched `when`
//! branches, failing `compute` expressions) degrade to undefined values and are
//! recorded in the audit log instead.

use crate::expression::ExpressionError;
use thiserror::Error;

/// Main error type for Mapspec operations
#[derive(Error, Debug)]
pub enum Error {
    /// The mapping specification is missing, not an object, or has a malformed section
    #[error("Invalid mapping specification: {message}")]
    InvalidSpec { message: String },

    /// The specification has no usable `mapping` template tree
    #[error("Mapping specification has no `mapping` object")]
    MissingMappingTree,

    /// A rule in the template tree has a malformed shape
    #[error("Invalid rule at {path}: {message}")]
    InvalidRule { path: String, message: String },

    /// A `compute` expression could not be parsed or evaluated
    #[error("Expression error in `{expression}`: {message}")]
    Expression {
        message: String,
        expression: String,
        #[source]
        source: Option<ExpressionError>,
    },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Generic internal error with context
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid specification error
    pub fn invalid_spec(message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            message: message.into(),
        }
    }

    /// Create an invalid rule error for the given template field path
    pub fn invalid_rule(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidRule {
            path: display_path(path).to_string(),
            message: message.into(),
        }
    }

    /// Wrap an expression error together with the expression text
    pub fn expression(source: &str, err: ExpressionError) -> Self {
        Self::Expression {
            message: err.to_string(),
            expression: source.to_string(),
            source: Some(err),
        }
    }

    /// Short machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidSpec { .. } => "InvalidSpec",
            Error::MissingMappingTree => "MissingMappingTree",
            Error::InvalidRule { .. } => "InvalidRule",
            Error::Expression { .. } => "Expression",
            Error::Json { .. } => "Json",
            Error::Internal { .. } => "Internal",
        }
    }
}

/// Render a template field path, using `<root>` for the empty path
pub(crate) fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Internal {
            message: err.to_string(),
            source: err,
        }
    }
}
