//! Runs the `mapspec` binary against temporary mapping directories

use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

const PRICING: &str = r#"{
    "mapping": {
        "loan": {
            "amount": { "from": "loan.amount", "convert": "toDecimal" },
            "purpose": { "from": "loan.purpose", "convert": "pascalToScreaming" }
        },
        "channel": { "static": "RETAIL" }
    },
    "overrides": { "wholesale": { "mapping": { "channel": { "static": "WHOLESALE" } } } }
}"#;

/// A mappings directory plus an empty config file so host settings never leak in
fn workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    let mappings = dir.path().join("mappings");
    fs::create_dir(&mappings).unwrap();
    fs::write(mappings.join("pricing.json"), PRICING).unwrap();
    fs::write(mappings.join("fees.yaml"), "mapping:\n  fee:\n    static: 25\n").unwrap();
    fs::write(dir.path().join("config.yaml"), "{}\n").unwrap();
    dir
}

fn mapspec(dir: &Path, args: &[&str], stdin: Option<&str>) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mapspec"))
        .arg("--config")
        .arg(dir.join("config.yaml"))
        .arg("--mappings-dir")
        .arg(dir.join("mappings"))
        .args(args)
        .env_remove("MAPSPEC_PROFILE")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    {
        let mut pipe = child.stdin.take().unwrap();
        if let Some(text) = stdin {
            pipe.write_all(text.as_bytes()).unwrap();
        }
    }
    child.wait_with_output().unwrap()
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_list() {
    let dir = workspace();
    let output = mapspec(dir.path(), &["--output", "json", "list"], None);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!(["fees", "pricing"]));
}

#[test]
fn test_show_yaml_spec_as_json() {
    let dir = workspace();
    let output = mapspec(dir.path(), &["--output", "json", "show", "fees"], None);
    assert!(output.status.success());
    assert_eq!(stdout_json(&output), json!({"mapping": {"fee": {"static": 25}}}));
}

#[test]
fn test_run_from_stdin() {
    let dir = workspace();
    let output = mapspec(
        dir.path(),
        &["--output", "json", "run", "pricing", "--profile", "wholesale"],
        Some(r#"{"loan": {"amount": 320000, "purpose": "cashOutRefinance"}}"#),
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout_json(&output),
        json!({
            "mappingUsed": "pricing",
            "result": {
                "loan": { "amount": "320000", "purpose": "CASH_OUT_REFINANCE" },
                "channel": "WHOLESALE"
            }
        })
    );
}

#[test]
fn test_run_from_file_with_log() {
    let dir = workspace();
    let input = dir.path().join("input.json");
    fs::write(&input, r#"{"loan": {"amount": 1000.25}}"#).unwrap();

    let output = mapspec(
        dir.path(),
        &["--output", "json", "run", "pricing", "--input", input.to_str().unwrap(), "--show-log"],
        None,
    );
    assert!(output.status.success());
    let report = stdout_json(&output);
    assert_eq!(report["result"]["loan"]["amount"], "1000.25");
    assert!(report["log"]
        .as_array()
        .unwrap()
        .contains(&json!("loan.amount: convert toDecimal → \"1000.25\"")));
}

#[test]
fn test_missing_mapping_prints_error_document() {
    let dir = workspace();
    let output = mapspec(dir.path(), &["--output", "json", "run", "escrow"], Some("{}"));
    assert_eq!(output.status.code(), Some(6));
    let report = stdout_json(&output);
    assert_eq!(report["error"]["kind"], "MappingNotFound");
}

#[test]
fn test_invalid_input_exit_code() {
    let dir = workspace();
    let output = mapspec(dir.path(), &["run", "pricing"], Some("not json"));
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid file format for <stdin>"));
}

#[test]
fn test_validate_invalid_spec() {
    let dir = workspace();
    let bad = dir.path().join("bad.json");
    fs::write(&bad, r#"{"mapping": {"x": {"compute": "loan.amount +"}}}"#).unwrap();

    let output = mapspec(dir.path(), &["--output", "json", "validate", bad.to_str().unwrap()], None);
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stdout_json(&output)["error"]["kind"], "InvalidRule");
}
