// Handler tests against a temporary mappings directory

use super::*;
use crate::cli::{ListArgs, OutputFormat, RunArgs, ShowArgs, ValidateArgs};
use crate::config::Config;
use crate::error::Error;
use crate::output::tests::capture;
use crate::store::MappingStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use tempfile::TempDir;

const PRICING: &str = r#"{
    "mapping": {
        "amount": { "from": "loan.amount", "convert": "toDecimal" },
        "occupancy": { "from": "property.occupancy", "enum": "occupancy" },
        "channel": { "static": "RETAIL" }
    },
    "enums": { "occupancy": { "Primary": "PRIMARY_RESIDENCE" } },
    "overrides": {
        "wholesale": { "mapping": { "channel": { "static": "WHOLESALE" } } }
    }
}"#;

const INPUT: &str = r#"{"loan": {"amount": 250000.5}, "property": {"occupancy": "Primary"}}"#;

fn mappings() -> (TempDir, MappingStore) {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("pricing.json"), PRICING).unwrap();
    fs::write(dir.path().join("broken.yaml"), "mapping: [1, 2]\n").unwrap();
    let store = MappingStore::new(dir.path());
    (dir, store)
}

fn run_args(name: &str) -> RunArgs {
    RunArgs {
        name: name.to_string(),
        input: None,
        profile: None,
        show_log: false,
        save_to: None,
    }
}

#[test]
fn test_run_prints_report() {
    let (_dir, store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Json);

    handle_run(run_args("pricing"), &Config::default(), &store, INPUT.as_bytes(), &mut output).unwrap();

    let report: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(
        report,
        json!({
            "mappingUsed": "pricing",
            "result": {
                "amount": "250000.5",
                "occupancy": "PRIMARY_RESIDENCE",
                "channel": "RETAIL"
            }
        })
    );
}

#[test]
fn test_run_with_profile_and_log() {
    let (_dir, store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Json);
    let args = RunArgs {
        profile: Some("wholesale".to_string()),
        show_log: true,
        ..run_args("pricing")
    };

    handle_run(args, &Config::default(), &store, INPUT.as_bytes(), &mut output).unwrap();

    let report: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(report["result"]["channel"], "WHOLESALE");
    let log: Vec<&str> = report["log"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line.as_str().unwrap())
        .collect();
    assert!(log[0].starts_with("[start] mapping run at "));
    assert_eq!(log[1], "[override] profile 'wholesale': mapping channel");
    assert_eq!(log.last(), Some(&"[done] mapping complete"));
}

#[test]
fn test_run_uses_configured_default_profile() {
    let (_dir, store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Json);
    let config = Config {
        default_profile: Some("wholesale".to_string()),
        ..Config::default()
    };

    handle_run(run_args("pricing"), &config, &store, INPUT.as_bytes(), &mut output).unwrap();

    let report: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(report["result"]["channel"], "WHOLESALE");
}

#[test]
fn test_run_human_output_warns_about_unknown_profile() {
    let (_dir, store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Human);
    let args = RunArgs {
        profile: Some("retail".to_string()),
        ..run_args("pricing")
    };

    handle_run(args, &Config::default(), &store, INPUT.as_bytes(), &mut output).unwrap();

    let text = buffer.contents();
    assert!(text.contains("WARNING: Profile 'retail' not found in 'pricing' (available: wholesale)"));
    assert!(text.contains("=== Result (pricing) ==="));
    assert!(text.contains("\"channel\": \"RETAIL\""));
}

#[test]
fn test_run_saves_report() {
    let (dir, store) = mappings();
    let (mut output, _buffer) = capture(OutputFormat::Json);
    let target = dir.path().join("out").with_extension("json");
    let args = RunArgs {
        save_to: Some(target.clone()),
        ..run_args("pricing")
    };

    handle_run(args, &Config::default(), &store, INPUT.as_bytes(), &mut output).unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(target).unwrap()).unwrap();
    assert_eq!(saved["mappingUsed"], "pricing");
    assert!(saved.get("log").is_none());
}

#[test]
fn test_run_unknown_mapping() {
    let (_dir, store) = mappings();
    let (mut output, _buffer) = capture(OutputFormat::Json);

    let err = handle_run(run_args("escrow"), &Config::default(), &store, INPUT.as_bytes(), &mut output)
        .unwrap_err();
    assert!(matches!(err, Error::MappingNotFound { ref name, .. } if name == "escrow"));
}

#[test]
fn test_run_invalid_spec_is_a_core_error() {
    let (_dir, store) = mappings();
    let (mut output, _buffer) = capture(OutputFormat::Json);

    let err = handle_run(run_args("broken"), &Config::default(), &store, INPUT.as_bytes(), &mut output)
        .unwrap_err();
    assert_eq!(err.kind(), "MissingMappingTree");
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn test_list_and_show() {
    let (_dir, store) = mappings();

    let (mut output, buffer) = capture(OutputFormat::Json);
    handle_list(ListArgs { details: false }, &store, &mut output).unwrap();
    assert_eq!(buffer.contents(), "[\"broken\",\"pricing\"]\n");

    let (mut output, buffer) = capture(OutputFormat::Json);
    handle_show(ShowArgs { name: "pricing".to_string() }, &store, &mut output).unwrap();
    let shown: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(shown, serde_json::from_str::<Value>(PRICING).unwrap());
}

#[test]
fn test_list_details_reports_broken_specs() {
    let (_dir, store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Json);

    handle_list(ListArgs { details: true }, &store, &mut output).unwrap();

    let entries: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(entries[0]["name"], "broken");
    assert!(entries[0]["error"].as_str().unwrap().contains("no `mapping` object"));
    assert_eq!(entries[1]["name"], "pricing");
    assert_eq!(entries[1]["summary"]["profiles"], 1);
}

#[test]
fn test_validate_reports_summary() {
    let (dir, _store) = mappings();
    let (mut output, buffer) = capture(OutputFormat::Json);
    let args = ValidateArgs {
        file: dir.path().join("pricing.json"),
        detailed: true,
    };

    handle_validate(args, &mut output).unwrap();

    let report: Value = serde_json::from_str(&buffer.contents()).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(
        report["summary"],
        json!({"fields": 3, "rules": 3, "enums": 1, "aliases": 0, "profiles": 1})
    );
    assert_eq!(
        report["profiles"],
        json!([{"name": "wholesale", "enums": [], "mapping": ["channel"]}])
    );
}

#[test]
fn test_validate_rejects_malformed_rule() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, r#"{"mapping": {"a": {"from": 42}}}"#).unwrap();
    let (mut output, _buffer) = capture(OutputFormat::Human);

    let err = handle_validate(ValidateArgs { file: path, detailed: false }, &mut output).unwrap_err();
    assert_eq!(err.kind(), "InvalidRule");
}
