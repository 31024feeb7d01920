//! Per-run mapping state
//!
//! Everything mutable during a run lives here and is created fresh for each
//! run: the audit log and the list of fields that resolved to undefined. The
//! input document and tables are borrowed read-only.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::alias::Aliases;
use super::audit::AuditLog;
use super::converter::ConverterRegistry;
use super::path;
use crate::clock::Clock;
use crate::expression::Scope;
use crate::spec::EnumTables;
use serde_json::Value;

/// State for one mapping run
pub struct MappingContext<'a> {
    /// Input document
    pub src: &'a Value,
    /// Effective enum tables after profile composition
    pub enums: &'a EnumTables,
    pub aliases: &'a Aliases,
    pub converters: ConverterRegistry<'a>,
    pub clock: &'a dyn Clock,
    pub log: AuditLog,
    /// Field paths whose value resolved to undefined
    pub unresolved: Vec<String>,
}

impl<'a> MappingContext<'a> {
    pub fn new(
        src: &'a Value,
        enums: &'a EnumTables,
        aliases: &'a Aliases,
        converters: ConverterRegistry<'a>,
        clock: &'a dyn Clock,
        log: AuditLog,
    ) -> Self {
        Self {
            src,
            enums,
            aliases,
            converters,
            clock,
            log,
            unresolved: Vec::new(),
        }
    }

    /// Alias-aware path lookup against the input document
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        path::resolve_aliased(self.src, path, self.aliases)
    }

    /// Scope for `compute` expressions
    pub fn scope(&self) -> Scope<'a> {
        Scope::new(self.src, self.aliases, self.clock)
    }

    /// Hand back the audit log and unresolved fields
    pub fn finish(self) -> (AuditLog, Vec<String>) {
        (self.log, self.unresolved)
    }
}
