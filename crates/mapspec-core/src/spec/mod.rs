//! Mapping specification model
//!
//! A [`MappingSpec`] is parsed once from raw JSON: the template tree becomes
//! a typed [`Template`], the enum and alias tables are validated, and every
//! profile's composed mapping and enum tables are built up front so a run
//! never reparses anything.

pub mod template;

pub use template::{FromPaths, Rule, Template, WhenBranch, RULE_KEYS};

use crate::error::{Error, Result};
use crate::mapping::alias::Aliases;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Source value (in its string form) -> target value
pub type EnumTable = Map<String, Value>;

/// Enum tables by name
pub type EnumTables = BTreeMap<String, EnumTable>;

/// A named variant of a specification
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    /// Enum table names the profile overrides, in document order
    pub enum_overrides: Vec<String>,
    /// Top-level mapping keys the profile overrides, in document order
    pub mapping_overrides: Vec<String>,
    /// Base enum tables with the overrides applied, when the profile has `enums`
    pub enums: Option<EnumTables>,
    /// Base mapping with the overrides applied, when the profile has `mapping`
    pub mapping: Option<Template>,
}

/// A parsed mapping specification
#[derive(Debug, Clone, PartialEq)]
pub struct MappingSpec {
    mapping: Template,
    enums: EnumTables,
    aliases: Aliases,
    profiles: BTreeMap<String, Profile>,
}

/// Counts reported by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecSummary {
    pub fields: usize,
    pub rules: usize,
    pub enums: usize,
    pub aliases: usize,
    pub profiles: usize,
}

impl MappingSpec {
    /// Parse and validate a raw specification
    pub fn from_value(spec: &Value) -> Result<Self> {
        let root = spec
            .as_object()
            .ok_or_else(|| Error::invalid_spec("specification must be a JSON object"))?;

        let raw_mapping = match root.get("mapping") {
            Some(Value::Object(map)) => map,
            _ => return Err(Error::MissingMappingTree),
        };

        let mapping = Template::parse(&Value::Object(raw_mapping.clone()), "")?;
        let enums = parse_enums(root.get("enums"), "enums")?;
        let aliases = parse_aliases(root.get("paths"))?;

        let mut profiles = BTreeMap::new();
        for (name, overrides) in object_section(root.get("overrides"), "overrides")? {
            let profile = compose_profile(name, overrides, raw_mapping, &enums)?;
            profiles.insert(name.clone(), profile);
        }

        Ok(Self {
            mapping,
            enums,
            aliases,
            profiles,
        })
    }

    /// Parse a specification from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn mapping(&self) -> &Template {
        &self.mapping
    }

    pub fn enums(&self) -> &EnumTables {
        &self.enums
    }

    pub fn aliases(&self) -> &Aliases {
        &self.aliases
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Profile names, sorted
    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn summary(&self) -> SpecSummary {
        SpecSummary {
            fields: self.mapping.field_count(),
            rules: self.mapping.rule_count(),
            enums: self.enums.len(),
            aliases: self.aliases.len(),
            profiles: self.profiles.len(),
        }
    }
}

/// An optional object section; absent or null is empty
fn object_section<'a>(value: Option<&'a Value>, section: &str) -> Result<Vec<(&'a String, &'a Value)>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(map)) => Ok(map.iter().collect()),
        Some(_) => Err(Error::invalid_spec(format!("`{}` must be an object", section))),
    }
}

fn parse_enums(value: Option<&Value>, section: &str) -> Result<EnumTables> {
    object_section(value, section)?
        .into_iter()
        .map(|(name, table)| match table {
            Value::Object(entries) => Ok((name.clone(), entries.clone())),
            _ => Err(Error::invalid_spec(format!(
                "enum table `{}` in `{}` must be an object",
                name, section
            ))),
        })
        .collect()
}

fn parse_aliases(value: Option<&Value>) -> Result<Aliases> {
    let pairs = object_section(value, "paths")?
        .into_iter()
        .map(|(name, target)| match target {
            Value::String(target) => Ok((name.clone(), target.clone())),
            _ => Err(Error::invalid_spec(format!("alias `{}` in `paths` must be a string", name))),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Aliases::from_pairs(pairs))
}

/// Apply one profile's overrides to the base tables
///
/// Both merges are shallow: an overridden enum table or top-level mapping key
/// replaces the original wholesale, keeping its position; new keys append.
fn compose_profile(
    name: &str,
    overrides: &Value,
    base_mapping: &Map<String, Value>,
    base_enums: &EnumTables,
) -> Result<Profile> {
    let overrides = overrides
        .as_object()
        .ok_or_else(|| Error::invalid_spec(format!("profile `{}` in `overrides` must be an object", name)))?;

    let mut profile = Profile {
        name: name.to_string(),
        enum_overrides: Vec::new(),
        mapping_overrides: Vec::new(),
        enums: None,
        mapping: None,
    };

    match overrides.get("enums") {
        None | Some(Value::Null) => {}
        Some(value) => {
            let section = format!("overrides.{}.enums", name);
            let tables = object_section(Some(value), &section)?;
            let mut enums = base_enums.clone();
            for (table, entries) in tables {
                let entries = entries.as_object().ok_or_else(|| {
                    Error::invalid_spec(format!("enum table `{}` in `{}` must be an object", table, section))
                })?;
                profile.enum_overrides.push(table.clone());
                enums.insert(table.clone(), entries.clone());
            }
            profile.enums = Some(enums);
        }
    }

    match overrides.get("mapping") {
        None | Some(Value::Null) => {}
        Some(Value::Object(fields)) => {
            let mut mapping = base_mapping.clone();
            for (key, subtree) in fields {
                profile.mapping_overrides.push(key.clone());
                mapping.insert(key.clone(), subtree.clone());
            }
            profile.mapping = Some(Template::parse(&Value::Object(mapping), "")?);
        }
        Some(_) => {
            return Err(Error::invalid_spec(format!(
                "`overrides.{}.mapping` must be an object",
                name
            )))
        }
    }

    Ok(profile)
}
