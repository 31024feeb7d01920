//! Sandboxed `compute` expression language
//!
//! Expressions are parsed once into an [`Expr`] tree and interpreted
//! directly. The grammar covers arithmetic, comparison, logical and
//! conditional operators, member access and calls of registered functions;
//! every identifier must belong to the bounded scope (`src`, `borrower`,
//! `loan`, `property`, `get` and the built-in converters).
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::Expr;
pub use error::ExpressionError;
pub use evaluator::{Evaluator, Scope};
pub use parser::{Parser, MAX_EXPRESSION_LENGTH, MAX_NESTING_DEPTH, MAX_TREE_DEPTH};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::mapping::alias::Aliases;
use serde_json::Value;
use std::fmt;

/// A parsed expression together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    expr: Expr,
}

impl CompiledExpression {
    /// Parse an expression
    pub fn parse(source: &str) -> std::result::Result<Self, ExpressionError> {
        let expr = Parser::new(source)?.parse()?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    /// Evaluate against a scope; `Ok(None)` is an undefined result
    pub fn evaluate(&self, scope: Scope<'_>) -> std::result::Result<Option<Value>, ExpressionError> {
        Evaluator::new(scope).evaluate(&self.expr)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.expr
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parse and evaluate an expression in one step
pub fn evaluate(source: &str, root: &Value, aliases: &Aliases, clock: &dyn Clock) -> Result<Option<Value>> {
    let compiled = CompiledExpression::parse(source).map_err(|e| Error::expression(source, e))?;
    compiled
        .evaluate(Scope::new(root, aliases, clock))
        .map_err(|e| Error::expression(source, e))
}
