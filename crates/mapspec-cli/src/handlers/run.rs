//! Run command handler

use super::utils::read_input;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::logging::{redaction, timing::Timer};
use crate::output::OutputWriter;
use crate::store::MappingStore;
use mapspec_core::{ExecuteOptions, MappingExecutor, MappingSpec};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::io::Read;
use tracing::{debug, info, instrument, trace};

/// What `run` prints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport<'a> {
    mapping_used: &'a str,
    result: &'a Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a [String]>,
}

/// Handle the run command
#[instrument(skip_all, fields(name = %args.name, profile = ?args.profile))]
pub fn handle_run(
    args: RunArgs,
    config: &Config,
    store: &MappingStore,
    stdin: impl Read,
    output: &mut OutputWriter,
) -> Result<()> {
    let _timer = Timer::with_details("run_command", &args.name);

    let spec = {
        let _load_timer = Timer::new("spec_loading");
        let raw = store.load(&args.name)?;
        MappingSpec::from_value(&raw)?
    };
    let input = read_input(args.input.as_deref(), stdin)?;

    if tracing::enabled!(tracing::Level::TRACE) {
        let mut logged = input.clone();
        redaction::redact_json_value(&mut logged);
        trace!(input = %logged, "Input document");
    }

    let mut options = ExecuteOptions::new();
    let profile = args.profile.or_else(|| config.default_profile.clone());
    if let Some(profile) = &profile {
        options = options.with_profile(profile.as_str());
    }

    let outcome = {
        let _map_timer = Timer::new("mapping_execution");
        MappingExecutor::new(&spec).run(&input, &options)
    };
    info!(
        log_lines = outcome.log.len(),
        unresolved = outcome.unresolved.len(),
        "Mapping run finished"
    );

    if let Some(requested) = &profile {
        if outcome.profile.is_none() {
            let known: Vec<&str> = spec.profile_names().collect();
            output.warning(&format!(
                "Profile '{}' not found in '{}' (available: {}); used the base mapping",
                requested,
                args.name,
                if known.is_empty() { "none".to_string() } else { known.join(", ") }
            ))?;
        }
    }

    let show_log = args.show_log || config.output.show_log;
    let report = RunReport {
        mapping_used: &args.name,
        result: &outcome.result,
        log: show_log.then_some(outcome.log.as_slice()),
    };

    if let Some(path) = &args.save_to {
        debug!("Writing report to {}", path.display());
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        output.success(&format!("✓ Report saved to {}", path.display()))?;
    }

    if output.format().is_machine() {
        return output.data(&report);
    }

    output.section(&format!("Result ({})", args.name))?;
    output.data(&outcome.result)?;

    if !outcome.unresolved.is_empty() {
        output.warning(&format!(
            "{} field(s) resolved to nothing and were omitted: {}",
            outcome.unresolved.len(),
            outcome.unresolved.join(", ")
        ))?;
    }

    if show_log {
        output.section("Audit Log")?;
        for line in &outcome.log {
            output.writeln(line)?;
        }
    }

    Ok(())
}
