//! Error types for compute expressions
//!
//! Parse errors carry the byte offset where the parser gave up; evaluation
//! errors describe the failing operation.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use thiserror::Error;

/// Errors raised while parsing or evaluating a compute expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Malformed expression text
    #[error("Parse error at position {position}: {message}")]
    Parse {
        message: String,
        position: usize,
        input: String,
    },

    /// Unexpected token with the set of tokens that would have been accepted
    #[error("Syntax error at position {position}: {message} (found {found})")]
    Syntax {
        message: String,
        position: usize,
        expected: Vec<String>,
        found: String,
    },

    /// Identifier outside the bounded scope
    #[error("Unknown identifier `{name}` at position {position}")]
    UnknownIdentifier { name: String, position: usize },

    /// Call of something that is not a registered function
    #[error("`{name}` is not a callable function")]
    NotCallable { name: String },

    /// Wrong number of arguments for a registered function
    #[error("Function {function}() expects {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },

    /// Expression exceeds the length or nesting limits
    #[error("Expression limit exceeded: {message}")]
    Limit { message: String },

    /// Member access on undefined or null
    #[error("Cannot read property `{property}` of {target}")]
    NullAccess { property: String, target: String },
}

impl ExpressionError {
    /// Create a parse error at a position
    pub fn parse(message: impl Into<String>, position: usize, input: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            position,
            input: input.into(),
        }
    }

    /// Create a syntax error with the accepted alternatives
    pub fn syntax(
        message: impl Into<String>,
        position: usize,
        expected: Vec<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            expected,
            found: found.into(),
        }
    }

    /// Whether this error was raised before evaluation began
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::Parse { .. }
                | Self::Syntax { .. }
                | Self::UnknownIdentifier { .. }
                | Self::NotCallable { .. }
                | Self::Arity { .. }
                | Self::Limit { .. }
        )
    }
}
