//! Rule resolution
//!
//! A rule resolves through a fixed sequence of steps: `when`, `static`,
//! `compute`, `from`, `enum`, `convert`, `default`. `when` returns as soon as
//! a branch matches and `static` always returns; the later steps refine a
//! working value under their own guards. Every step that fires writes one
//! audit line.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::context::MappingContext;
use super::tree::map_template;
use crate::error::display_path;
use crate::spec::{FromPaths, Rule, WhenBranch};
use crate::value::{is_blank, is_present, to_display_string};
use serde_json::Value;
use tracing::warn;

/// Resolve one rule at `field_path`; `None` is undefined
pub fn resolve_rule(rule: &Rule, ctx: &mut MappingContext<'_>, field_path: &str) -> Option<Value> {
    if let Some(branches) = &rule.when {
        if let Some(result) = resolve_when(branches, ctx, field_path) {
            return result;
        }
    }

    if let Some(value) = &rule.static_value {
        ctx.log.record(field_path, "static", Some(value));
        return Some(value.clone());
    }

    let mut value = None;

    if let Some(compute) = &rule.compute {
        match compute.evaluate(ctx.scope()) {
            Ok(computed) => {
                ctx.log
                    .record(field_path, format_args!("compute \"{}\"", compute.source()), computed.as_ref());
                value = computed;
            }
            Err(err) => {
                warn!(
                    field = display_path(field_path),
                    expression = compute.source(),
                    error = %err,
                    "compute expression failed"
                );
                ctx.log.record(
                    field_path,
                    format_args!("compute \"{}\" failed ({})", compute.source(), err),
                    None,
                );
            }
        }
    }

    if value.is_none() {
        value = resolve_from(rule.from.as_ref(), ctx, field_path);
    }

    if let (Some(table_name), true) = (&rule.enum_table, is_present(value.as_ref())) {
        match ctx.enums.get(table_name) {
            Some(table) => {
                let key = to_display_string(value.as_ref());
                match table.get(&key) {
                    Some(mapped) => {
                        value = Some(mapped.clone());
                        ctx.log
                            .record(field_path, format_args!("enum {}[{}]", table_name, key), value.as_ref());
                    }
                    None => ctx.log.record(
                        field_path,
                        format_args!("enum {}[{}] (no match, unchanged)", table_name, key),
                        value.as_ref(),
                    ),
                }
            }
            None => warn!(
                field = display_path(field_path),
                table = table_name.as_str(),
                "unknown enum table"
            ),
        }
    }

    if let (Some(name), Some(current)) = (&rule.convert, &value) {
        match ctx.converters.lookup(name) {
            Some(converter) => {
                let converted = converter.apply(current, ctx.clock);
                ctx.log
                    .record(field_path, format_args!("convert {}", name), converted.as_ref());
                value = converted;
            }
            None => ctx.log.record(
                field_path,
                format_args!("convert {} (not found, unchanged)", name),
                Some(current),
            ),
        }
    }

    if let (Some(default), true) = (&rule.default, is_blank(value.as_ref())) {
        value = Some(default.clone());
        ctx.log.record(field_path, "default", value.as_ref());
    }

    value
}

/// First matching branch's result, or `None` when no branch applies
fn resolve_when(
    branches: &[WhenBranch],
    ctx: &mut MappingContext<'_>,
    field_path: &str,
) -> Option<Option<Value>> {
    for (index, branch) in branches.iter().enumerate() {
        match branch {
            WhenBranch::Exists { path, then } => {
                if !is_present(ctx.lookup(path)) {
                    continue;
                }
                let result = map_template(then, ctx, field_path);
                ctx.log.record(
                    field_path,
                    format_args!("when[{}] matched exists({})", index, path),
                    result.as_ref(),
                );
                return Some(result);
            }
            WhenBranch::Else(fallback) => {
                let result = map_template(fallback, ctx, field_path);
                ctx.log
                    .record(field_path, format_args!("when[{}] else", index), result.as_ref());
                return Some(result);
            }
        }
    }
    None
}

/// The `from` step; runs whenever no value has been computed
fn resolve_from(from: Option<&FromPaths>, ctx: &mut MappingContext<'_>, field_path: &str) -> Option<Value> {
    match from {
        Some(FromPaths::Single(path)) => {
            let value = ctx.lookup(path).cloned();
            ctx.log
                .record(field_path, format_args!("from {}", path), value.as_ref());
            value
        }
        Some(FromPaths::Sequence(paths)) => {
            let matched = paths
                .iter()
                .find_map(|path| ctx.lookup(path).filter(|v| !v.is_null()).map(|v| (path, v)));
            let listed = paths.join(", ");
            match matched {
                Some((path, found)) => {
                    ctx.log.record(
                        field_path,
                        format_args!("from [{}] (matched {})", listed, path),
                        Some(found),
                    );
                    Some(found.clone())
                }
                None => {
                    ctx.log
                        .record(field_path, format_args!("from [{}]", listed), None);
                    None
                }
            }
        }
        None => {
            ctx.log.record(field_path, "from <none>", None);
            None
        }
    }
}
