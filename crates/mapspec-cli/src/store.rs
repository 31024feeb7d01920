//! Mapping specifications stored as files in a directory
//!
//! A specification's name is its file stem: `pricing.json`, `pricing.yaml`
//! and `pricing.yml` all answer to `pricing`, tried in that order.

use crate::config::is_yaml;
use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

/// Directory of named mapping specifications
#[derive(Debug, Clone)]
pub struct MappingStore {
    dir: PathBuf,
}

impl MappingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of all specifications, sorted and deduplicated
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Err(Error::FileNotFound {
                path: self.dir.clone(),
            });
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_spec_extension(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        names.dedup();

        debug!(dir = %self.dir.display(), count = names.len(), "Listed mapping specifications");
        Ok(names)
    }

    /// File backing the named specification
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        let not_found = || Error::MappingNotFound {
            name: name.to_string(),
            dir: self.dir.clone(),
        };

        // Names are bare stems; anything path-like could escape the directory
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(not_found());
        }

        EXTENSIONS
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .ok_or_else(not_found)
    }

    /// Load the named specification as a raw JSON value
    pub fn load(&self, name: &str) -> Result<Value> {
        let path = self.locate(name)?;
        debug!(name, path = %path.display(), "Loading mapping specification");
        read_document(&path)
    }
}

/// Read a JSON or YAML document, choosing the parser by extension
pub fn read_document(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    parse_document(&content, path)
}

/// Parse document text; `origin` names it in errors and selects the format
pub fn parse_document(content: &str, origin: &Path) -> Result<Value> {
    if is_yaml(origin) {
        serde_yaml::from_str(content).map_err(|e| Error::InvalidFormat {
            path: origin.to_path_buf(),
            expected: "YAML".to_string(),
            message: e.to_string(),
        })
    } else {
        serde_json::from_str(content).map_err(|e| Error::InvalidFormat {
            path: origin.to_path_buf(),
            expected: "JSON".to_string(),
            message: e.to_string(),
        })
    }
}

fn has_spec_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
