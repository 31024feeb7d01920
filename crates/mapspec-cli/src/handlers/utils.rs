//! Shared utilities for command handlers

use crate::config::Config;
use crate::error::Result;
use crate::store::{self, MappingStore};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Store for the effective mappings directory
pub fn open_store(cli_dir: Option<&Path>, config: &Config) -> MappingStore {
    MappingStore::new(config.mappings_dir_or(cli_dir))
}

/// Read the input document from a file, or from `stdin` when the source is
/// absent or `-`
pub fn read_input(source: Option<&Path>, mut stdin: impl Read) -> Result<Value> {
    match source {
        Some(path) if path != Path::new("-") => store::read_document(path),
        _ => {
            let mut content = String::new();
            stdin.read_to_string(&mut content)?;
            store::parse_document(&content, Path::new("<stdin>"))
        }
    }
}
