//! Template tree walk
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::context::MappingContext;
use super::resolver::resolve_rule;
use crate::spec::template::child_path;
use crate::spec::Template;
use serde_json::{Map, Value};

/// Map one template node at `field_path`
///
/// Rules resolve through [`resolve_rule`], literals pass through unchanged and
/// containers are rebuilt field by field in template order. A container field
/// whose value resolves to undefined is left out of the rebuilt object and its
/// path is recorded as unresolved.
pub fn map_template(node: &Template, ctx: &mut MappingContext<'_>, field_path: &str) -> Option<Value> {
    match node {
        Template::Rule(rule) => resolve_rule(rule, ctx, field_path),
        Template::Literal(value) => Some(value.clone()),
        Template::Container(fields) => {
            let mut output = Map::new();
            for (key, child) in fields {
                let path = child_path(field_path, key);
                match map_template(child, ctx, &path) {
                    Some(value) => {
                        output.insert(key.clone(), value);
                    }
                    None => ctx.unresolved.push(path),
                }
            }
            Some(Value::Object(output))
        }
    }
}
