//! List command handler

use crate::cli::ListArgs;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use crate::store::MappingStore;
use mapspec_core::{MappingSpec, SpecSummary};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// One row of `list --details`
#[derive(Debug, Serialize)]
struct ListEntry {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SpecSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Handle the list command
#[instrument(skip_all, fields(dir = %store.dir().display()))]
pub fn handle_list(args: ListArgs, store: &MappingStore, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::new("list_command");
    let names = store.list()?;
    info!(count = names.len(), "Found mapping specifications");

    if !args.details {
        if output.format().is_machine() {
            return output.data(&names);
        }
        if names.is_empty() {
            return output.info(&format!(
                "No mapping specifications in {}",
                store.dir().display()
            ));
        }
        for name in &names {
            output.writeln(name)?;
        }
        return Ok(());
    }

    let entries: Vec<ListEntry> = names.into_iter().map(|name| describe(store, name)).collect();

    if output.format().is_machine() {
        return output.data(&entries);
    }

    let rows = entries
        .iter()
        .map(|entry| match (&entry.summary, &entry.error) {
            (Some(summary), _) => vec![
                entry.name.clone(),
                summary.fields.to_string(),
                summary.rules.to_string(),
                summary.profiles.to_string(),
                "ok".to_string(),
            ],
            (None, error) => vec![
                entry.name.clone(),
                "-".to_string(),
                "-".to_string(),
                "-".to_string(),
                error.clone().unwrap_or_default(),
            ],
        })
        .collect();
    output.table(&["Name", "Fields", "Rules", "Profiles", "Status"], rows)
}

fn describe(store: &MappingStore, name: String) -> ListEntry {
    let parsed = store
        .load(&name)
        .and_then(|raw| MappingSpec::from_value(&raw).map_err(Into::into));

    match parsed {
        Ok(spec) => ListEntry {
            name,
            summary: Some(spec.summary()),
            error: None,
        },
        Err(e) => {
            warn!(name = %name, error = %e, "Specification failed to load");
            ListEntry {
                name,
                summary: None,
                error: Some(e.to_string()),
            }
        }
    }
}
