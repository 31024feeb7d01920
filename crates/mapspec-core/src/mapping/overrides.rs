//! Profile selection
//!
//! Profiles are composed when the specification is parsed; selecting one here
//! only picks the precomposed tables and writes the override lines.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::audit::AuditLog;
use crate::spec::{EnumTables, MappingSpec, Template};
use tracing::{debug, warn};

/// Effective tables for one run
#[derive(Debug, Clone, Copy)]
pub struct Composition<'s> {
    pub mapping: &'s Template,
    pub enums: &'s EnumTables,
    /// Name of the profile that was applied
    pub profile: Option<&'s str>,
}

/// Selects the effective mapping and enum tables for a profile
pub struct OverrideComposer;

impl OverrideComposer {
    /// Compose the tables for `profile`
    ///
    /// With no profile, or a profile the specification does not define, the
    /// base tables are used unchanged. Each override category the profile
    /// applies writes one line to `log`.
    pub fn compose<'s>(spec: &'s MappingSpec, profile: Option<&str>, log: &mut AuditLog) -> Composition<'s> {
        let base = Composition {
            mapping: spec.mapping(),
            enums: spec.enums(),
            profile: None,
        };

        let Some(name) = profile else {
            return base;
        };

        let Some(selected) = spec.profile(name) else {
            warn!(profile = name, "unknown profile, using base mapping");
            return base;
        };

        let mut composition = Composition {
            profile: Some(selected.name.as_str()),
            ..base
        };

        if let Some(enums) = &selected.enums {
            log.note(format!(
                "[override] profile '{}': enums {}",
                selected.name,
                selected.enum_overrides.join(", ")
            ));
            composition.enums = enums;
        }

        if let Some(mapping) = &selected.mapping {
            log.note(format!(
                "[override] profile '{}': mapping {}",
                selected.name,
                selected.mapping_overrides.join(", ")
            ));
            composition.mapping = mapping;
        }

        debug!(
            profile = name,
            enum_tables = selected.enum_overrides.len(),
            mapping_keys = selected.mapping_overrides.len(),
            "profile overrides applied"
        );
        composition
    }
}
