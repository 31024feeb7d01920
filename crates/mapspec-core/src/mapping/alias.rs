//! Path alias table
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Ordered table of alias name -> real path prefix
///
/// An empty target strips the alias from the path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aliases {
    entries: Vec<(String, String)>,
}

impl Aliases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from pairs, keeping their order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(name, target)| (name.into(), target.into()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, t)| (n.as_str(), t.as_str()))
    }

    /// Rewrite `path` through the first matching alias
    ///
    /// An alias matches when it equals the path, or is a prefix of it followed
    /// by `.`. Aliases are tried in table order and at most one applies.
    pub fn rewrite<'p>(&self, path: &'p str) -> Cow<'p, str> {
        for (name, target) in &self.entries {
            if path == name {
                return Cow::Owned(target.clone());
            }

            let suffix = match path.strip_prefix(name.as_str()).and_then(|rest| rest.strip_prefix('.')) {
                Some(suffix) => suffix,
                None => continue,
            };

            if target.is_empty() {
                return Cow::Owned(suffix.to_string());
            }
            return Cow::Owned(format!("{}.{}", target, suffix));
        }

        Cow::Borrowed(path)
    }
}
