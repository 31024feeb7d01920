//! Mapping execution engine
//!
//! This module wires the pieces of a mapping run together: profile
//! selection, the per-run context, the template walk and rule resolution.
//! Each run owns all of its mutable state, so any number of runs over the
//! same [`MappingSpec`] may proceed concurrently.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

pub mod alias;
pub mod audit;
pub mod context;
pub mod converter;
pub mod overrides;
pub mod path;
pub mod resolver;
pub mod tree;

pub use alias::Aliases;
pub use audit::AuditLog;
pub use context::MappingContext;
pub use converter::{BuiltinConverter, ConverterFn, ConverterRegistry, CustomConverters};
pub use overrides::{Composition, OverrideComposer};
pub use resolver::resolve_rule;
pub use tree::map_template;

use crate::clock::{Clock, SystemClock};
use crate::spec::MappingSpec;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Per-run options
#[derive(Clone)]
pub struct ExecuteOptions {
    /// Profile whose overrides apply to this run
    pub profile: Option<String>,
    /// Extra converters; built-ins win on a name collision
    pub custom_converters: CustomConverters,
    pub clock: Arc<dyn Clock>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            profile: None,
            custom_converters: CustomConverters::new(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    /// Register a custom converter
    pub fn with_converter<F>(mut self, name: impl Into<String>, converter: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.custom_converters.insert(name.into(), Arc::new(converter));
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}

impl fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut converters: Vec<_> = self.custom_converters.keys().collect();
        converters.sort();
        f.debug_struct("ExecuteOptions")
            .field("profile", &self.profile)
            .field("custom_converters", &converters)
            .field("clock", &self.clock)
            .finish()
    }
}

/// Result of one mapping run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingOutcome {
    /// Output document; fields that resolved to undefined are absent
    pub result: Value,
    /// Audit trail in resolution order
    pub log: Vec<String>,
    /// Field paths that resolved to undefined
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
    /// Profile that was applied, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Runs a parsed specification against input documents
#[derive(Debug, Clone, Copy)]
pub struct MappingExecutor<'s> {
    spec: &'s MappingSpec,
}

impl<'s> MappingExecutor<'s> {
    pub fn new(spec: &'s MappingSpec) -> Self {
        Self { spec }
    }

    /// Map `input` through the specification
    pub fn run(&self, input: &Value, options: &ExecuteOptions) -> MappingOutcome {
        let started = Instant::now();
        let mut log = AuditLog::new();
        log.note(format!("[start] mapping run at {}", options.clock.now_iso()));
        debug!(
            profile = options.profile.as_deref(),
            custom_converters = options.custom_converters.len(),
            "starting mapping run"
        );

        let composition = OverrideComposer::compose(self.spec, options.profile.as_deref(), &mut log);

        let mut ctx = MappingContext::new(
            input,
            composition.enums,
            self.spec.aliases(),
            ConverterRegistry::new(&options.custom_converters),
            options.clock.as_ref(),
            log,
        );
        let result = map_template(composition.mapping, &mut ctx, "");
        let (mut log, mut unresolved) = ctx.finish();

        let result = match result {
            Some(result) => result,
            None => {
                unresolved.push(crate::error::display_path("").to_string());
                Value::Null
            }
        };
        log.note("[done] mapping complete");

        debug!(
            lines = log.len(),
            unresolved = unresolved.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "mapping run finished"
        );

        MappingOutcome {
            result,
            log: log.into_lines(),
            unresolved,
            profile: composition.profile.map(str::to_string),
        }
    }
}

/// Parse `spec` and map `input` through it
///
/// # Errors
///
/// Returns [`Error::InvalidSpec`](crate::Error::InvalidSpec) when `spec` is
/// not an object, [`Error::MissingMappingTree`](crate::Error::MissingMappingTree)
/// when it has no `mapping` object, and
/// [`Error::InvalidRule`](crate::Error::InvalidRule) for malformed rules. No
/// audit lines are produced in any of these cases.
pub fn execute(spec: &Value, input: &Value, options: &ExecuteOptions) -> Result<MappingOutcome> {
    let spec = MappingSpec::from_value(spec)?;
    Ok(MappingExecutor::new(&spec).run(input, options))
}
