//! Template tree model
//!
//! A template is parsed once into a sum type. Objects carrying at least one of
//! the seven rule keys become rules, every other object is a container whose
//! fields are mapped recursively, and anything else is a literal.

use crate::error::{Error, Result};
use crate::expression::CompiledExpression;
use serde_json::{Map, Value};

/// Keys that make an object a rule
pub const RULE_KEYS: [&str; 7] = ["from", "static", "compute", "when", "default", "convert", "enum"];

/// A node of the template tree
#[derive(Debug, Clone, PartialEq)]
pub enum Template {
    /// Object without rule keys; fields in document order
    Container(Vec<(String, Template)>),
    /// Object with at least one rule key
    Rule(Box<Rule>),
    /// Any non-object value, returned as is
    Literal(Value),
}

/// Source path(s) of a `from` rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FromPaths {
    Single(String),
    /// Tried in order until one resolves to a defined, non-null value
    Sequence(Vec<String>),
}

/// One branch of a `when` list
#[derive(Debug, Clone, PartialEq)]
pub enum WhenBranch {
    /// `{ "if": { "exists": path }, "then": ... }`
    Exists { path: String, then: Template },
    /// `{ "else": ... }`
    Else(Template),
}

/// A template leaf
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Rule {
    pub from: Option<FromPaths>,
    pub static_value: Option<Value>,
    pub compute: Option<CompiledExpression>,
    pub when: Option<Vec<WhenBranch>>,
    pub enum_table: Option<String>,
    pub convert: Option<String>,
    pub default: Option<Value>,
}

/// Whether an object is a rule rather than a container
pub fn is_rule_object(map: &Map<String, Value>) -> bool {
    RULE_KEYS.iter().any(|key| map.contains_key(*key))
}

/// Extend a field path with a key; the root path is empty
pub fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

impl Template {
    /// Parse a raw template value found at `path`
    pub fn parse(value: &Value, path: &str) -> Result<Self> {
        match value {
            Value::Object(map) if is_rule_object(map) => Ok(Template::Rule(Box::new(Rule::parse(map, path)?))),
            Value::Object(map) => {
                let mut fields = Vec::with_capacity(map.len());
                for (key, child) in map {
                    fields.push((key.clone(), Template::parse(child, &child_path(path, key))?));
                }
                Ok(Template::Container(fields))
            }
            other => Ok(Template::Literal(other.clone())),
        }
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, Template::Rule(_))
    }

    /// Number of container fields in the tree
    pub fn field_count(&self) -> usize {
        match self {
            Template::Container(fields) => fields.iter().map(|(_, child)| 1 + child.field_count()).sum(),
            _ => 0,
        }
    }

    /// Number of rules reachable through containers
    pub fn rule_count(&self) -> usize {
        match self {
            Template::Container(fields) => fields.iter().map(|(_, child)| child.rule_count()).sum(),
            Template::Rule(_) => 1,
            Template::Literal(_) => 0,
        }
    }
}

impl Rule {
    /// Parse a rule object; malformed keys are rejected with the field path
    pub fn parse(map: &Map<String, Value>, path: &str) -> Result<Self> {
        Ok(Rule {
            from: parse_from(map.get("from"), path)?,
            static_value: map.get("static").cloned(),
            compute: parse_compute(map.get("compute"), path)?,
            when: parse_when(map.get("when"), path)?,
            enum_table: parse_name(map.get("enum"), "enum", path)?,
            convert: parse_name(map.get("convert"), "convert", path)?,
            default: map.get("default").cloned(),
        })
    }
}

fn parse_from(value: Option<&Value>, path: &str) -> Result<Option<FromPaths>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(FromPaths::Single(s.clone()))),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| Error::invalid_rule(path, "`from` sequence entries must be strings"))
            })
            .collect::<Result<Vec<_>>>()
            .map(|paths| Some(FromPaths::Sequence(paths))),
        Some(_) => Err(Error::invalid_rule(
            path,
            "`from` must be a path string or an array of path strings",
        )),
    }
}

fn parse_compute(value: Option<&Value>, path: &str) -> Result<Option<CompiledExpression>> {
    match value {
        Some(Value::String(source)) => CompiledExpression::parse(source)
            .map(Some)
            .map_err(|e| Error::invalid_rule(path, format!("`compute` expression \"{}\": {}", source, e))),
        _ => Ok(None),
    }
}

fn parse_name(value: Option<&Value>, key: &str, path: &str) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(Error::invalid_rule(path, format!("`{}` must be a string", key))),
    }
}

fn parse_when(value: Option<&Value>, path: &str) -> Result<Option<Vec<WhenBranch>>> {
    let items = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(Error::invalid_rule(path, "`when` must be an array of branches")),
    };

    items
        .iter()
        .enumerate()
        .map(|(i, item)| parse_branch(item, i, path))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn parse_branch(item: &Value, index: usize, path: &str) -> Result<WhenBranch> {
    let branch = item
        .as_object()
        .ok_or_else(|| Error::invalid_rule(path, format!("when[{}] must be an object", index)))?;

    match (branch.get("if"), branch.get("else")) {
        (Some(_), Some(_)) => Err(Error::invalid_rule(
            path,
            format!("when[{}] has both `if` and `else`", index),
        )),
        (None, Some(fallback)) => Ok(WhenBranch::Else(Template::parse(fallback, path)?)),
        (Some(condition), None) => {
            let exists = condition
                .get("exists")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    Error::invalid_rule(path, format!("when[{}].if needs an `exists` path string", index))
                })?;
            let then = branch
                .get("then")
                .ok_or_else(|| Error::invalid_rule(path, format!("when[{}] has `if` without `then`", index)))?;
            Ok(WhenBranch::Exists {
                path: exists.to_string(),
                then: Template::parse(then, path)?,
            })
        }
        (None, None) => Err(Error::invalid_rule(
            path,
            format!("when[{}] needs `if`/`then` or `else`", index),
        )),
    }
}
