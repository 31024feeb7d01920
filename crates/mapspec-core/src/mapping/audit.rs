//! Audit trail of resolution decisions
//!
//! Lines are appended while the template is walked, so their order is the
//! pre-order, depth-first visiting order of the rules.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use crate::error::display_path;
use crate::value::render;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use tracing::trace;

/// Ordered audit lines for one mapping run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AuditLog {
    lines: Vec<String>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolution step as `"<field>: <description> → <result>"`
    pub fn record(&mut self, field_path: &str, description: impl fmt::Display, result: Option<&Value>) {
        let line = format!("{}: {} → {}", display_path(field_path), description, render(result));
        self.push(line);
    }

    /// Record a run-level line such as the start marker
    pub fn note(&mut self, line: impl Into<String>) {
        self.push(line.into());
    }

    fn push(&mut self, line: String) {
        trace!(target: "mapspec::audit", "{}", line);
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}
