//! Dotted path resolution over JSON documents
//!
//! Paths are plain dot-separated segments. Array elements are addressed by
//! their index rendered as a segment, so `prices.0.amount` reads the `amount`
//! of the first price.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::alias::Aliases;
use serde_json::Value;

/// Resolve a dotted path against `root`
///
/// Returns `None` for an empty path, or as soon as a segment cannot be
/// followed: a missing key, an out of range or non-numeric array index, or a
/// scalar/null intermediate value.
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Rewrite `path` through the alias table, then resolve it
pub fn resolve_aliased<'a>(root: &'a Value, path: &str, aliases: &Aliases) -> Option<&'a Value> {
    resolve(root, &aliases.rewrite(path))
}
