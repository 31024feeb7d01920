//! Validate command handler

use crate::cli::ValidateArgs;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use crate::store;
use mapspec_core::{MappingSpec, SpecSummary};
use serde::Serialize;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Machine-readable validation result
#[derive(Debug, Serialize)]
struct ValidationReport<'a> {
    valid: bool,
    file: &'a Path,
    summary: SpecSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    profiles: Vec<ProfileReport<'a>>,
}

#[derive(Debug, Serialize)]
struct ProfileReport<'a> {
    name: &'a str,
    enums: &'a [String],
    mapping: &'a [String],
}

/// Handle the validate command
#[instrument(skip_all, fields(file = %args.file.display()))]
pub fn handle_validate(args: ValidateArgs, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &args.file.display().to_string());
    output.info(&format!("Validating specification: {}", args.file.display()))?;

    let raw = store::read_document(&args.file)?;
    let spec = match MappingSpec::from_value(&raw) {
        Ok(spec) => spec,
        Err(e) => {
            warn!(kind = e.kind(), "Specification is invalid");
            output.error("✗ Specification is invalid")?;
            return Err(e.into());
        }
    };

    let summary = spec.summary();
    info!(?summary, "Specification is valid");

    let profiles: Vec<ProfileReport> = if args.detailed {
        spec.profile_names()
            .filter_map(|name| spec.profile(name))
            .map(|profile| ProfileReport {
                name: &profile.name,
                enums: &profile.enum_overrides,
                mapping: &profile.mapping_overrides,
            })
            .collect()
    } else {
        Vec::new()
    };

    if output.format().is_machine() {
        return output.data(&ValidationReport {
            valid: true,
            file: &args.file,
            summary,
            profiles,
        });
    }

    output.success("✓ Specification is valid")?;
    output.table(
        &["Fields", "Rules", "Enums", "Aliases", "Profiles"],
        vec![vec![
            summary.fields.to_string(),
            summary.rules.to_string(),
            summary.enums.to_string(),
            summary.aliases.to_string(),
            summary.profiles.to_string(),
        ]],
    )?;

    if !profiles.is_empty() {
        output.section("Profiles")?;
        let rows = profiles
            .iter()
            .map(|p| vec![p.name.to_string(), list_or_dash(p.enums), list_or_dash(p.mapping)])
            .collect();
        output.table(&["Profile", "Enums", "Mapping"], rows)?;
    }

    Ok(())
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
