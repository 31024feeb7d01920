//! End-to-end mapping runs


use mapspec_core::{execute, Error, ExecuteOptions, MappingExecutor, MappingSpec};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread;
use test_support::{options, pricing_input, pricing_spec};

#[test]
fn test_pricing_request_mapping() {
    let outcome = execute(&pricing_spec(), &pricing_input(), &options()).unwrap();

    assert_eq!(
        outcome.result,
        json!({
            "loan": {
                "amount": "320000",
                "purpose": "CASH_OUT_REFINANCE",
                "program": "FHA",
                "ltv": "80",
                "term": 180,
                "currency": "USD"
            },
            "borrower": {
                "fullName": "Grace Hopper",
                "fico": 742,
                "selfEmployed": false
            },
            "property": {
                "state": "CA",
                "occupancy": "PRIMARY_RESIDENCE",
                "units": 1
            },
            "channel": "RETAIL"
        })
    );
    assert!(outcome.unresolved.is_empty());
    assert_eq!(outcome.log.first().unwrap(), "[start] mapping run at 2025-01-15T08:00:00.000Z");
    assert_eq!(outcome.log.last().unwrap(), "[done] mapping complete");
    assert!(outcome
        .log
        .contains(&"loan.term: from [loan.termMonths, li.term] (matched li.term) → 180".to_string()));
    assert!(outcome
        .log
        .contains(&"loan.ltv: compute \"loan.amount / property.value * 100\" → 80".to_string()));
}

#[test]
fn test_output_key_order_matches_template() {
    let outcome = execute(&pricing_spec(), &pricing_input(), &options()).unwrap();
    let text = serde_json::to_string(&outcome.result).unwrap();
    assert!(text.starts_with(r#"{"loan":{"amount":"320000","purpose""#));
}

#[test]
fn test_determinism() {
    let first = execute(&pricing_spec(), &pricing_input(), &options()).unwrap();
    let second = execute(&pricing_spec(), &pricing_input(), &options()).unwrap();
    assert_eq!(
        serde_json::to_string(&first.result).unwrap(),
        serde_json::to_string(&second.result).unwrap()
    );
    assert_eq!(first.log, second.log);
}

#[test]
fn test_static_precedence() {
    let spec = json!({"mapping": {"x": {"static": 7, "from": "a", "compute": "1", "default": 3}}});
    let outcome = execute(&spec, &json!({"a": 1}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"x": 7}));
    assert_eq!(&outcome.log[1..outcome.log.len() - 1], &["x: static → 7".to_string()]);
}

#[test]
fn test_from_fallback_order() {
    let spec = json!({"mapping": {"x": {"from": ["a.b", "c.d"]}}});
    let outcome = execute(&spec, &json!({"c": {"d": 5}}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"x": 5}));
    assert_eq!(outcome.log[1], "x: from [a.b, c.d] (matched c.d) → 5");
}

#[test]
fn test_when_short_circuit() {
    let spec = json!({"mapping": {"x": {"when": [
        {"if": {"exists": "x"}, "then": {"static": 1}},
        {"else": {"static": 2}}
    ]}}});

    for present in [json!(0), json!(false), json!("value")] {
        let outcome = execute(&spec, &json!({"x": present}), &options()).unwrap();
        assert_eq!(outcome.result, json!({"x": 1}));
    }
    for input in [json!({}), json!({"x": null})] {
        let outcome = execute(&spec, &input, &options()).unwrap();
        assert_eq!(outcome.result, json!({"x": 2}));
    }
}

#[test]
fn test_default_applies_only_to_empty_values() {
    let spec = json!({"mapping": {"x": {"from": "a", "default": "Z"}}});
    let run = |input: Value| execute(&spec, &input, &options()).unwrap().result;

    assert_eq!(run(json!({"a": ""})), json!({"x": "Z"}));
    assert_eq!(run(json!({})), json!({"x": "Z"}));
    assert_eq!(run(json!({"a": 0})), json!({"x": 0}));
}

#[test]
fn test_builtin_converter_wins_over_custom() {
    let spec = json!({"mapping": {"x": {"from": "a", "convert": "toDecimal"}}});
    let options = options().with_converter("toDecimal", |_: &Value| Some(json!("custom")));
    let outcome = execute(&spec, &json!({"a": 12.5}), &options).unwrap();
    assert_eq!(outcome.result, json!({"x": "12.5"}));
}

#[test]
fn test_alias_prefix_rewrite() {
    let spec = json!({
        "mapping": {"amount": {"from": "loan.amount"}},
        "paths": {"loan": "data.loanInfo"}
    });
    let outcome = execute(&spec, &json!({"data": {"loanInfo": {"amount": 250000}}}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"amount": 250000}));
}

#[test]
fn test_to_decimal_through_rules() {
    let spec = json!({"mapping": {
        "a": {"from": "a", "convert": "toDecimal"},
        "b": {"from": "b", "convert": "toDecimal"},
        "c": {"from": "c", "convert": "toDecimal"},
        "d": {"from": "d", "convert": "toDecimal"}
    }});
    let outcome = execute(&spec, &json!({"a": 12.5, "b": 12, "c": "", "d": "abc"}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"a": "12.5", "b": "12"}));
    assert_eq!(outcome.unresolved, vec!["c", "d"]);
}

#[test]
fn test_to_decimal_rounds_ties_up() {
    let spec = json!({"mapping": {
        "a": {"from": "a", "convert": "toDecimal"},
        "b": {"compute": "toDecimal(src.b)"}
    }});
    let outcome = execute(&spec, &json!({"a": 101.03125, "b": 6.28125}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"a": "101.0313", "b": "6.2813"}));
}

#[test]
fn test_profile_override_isolation() {
    let base = execute(&pricing_spec(), &pricing_input(), &options()).unwrap();
    let wholesale = execute(
        &pricing_spec(),
        &pricing_input(),
        &options().with_profile("wholesale"),
    )
    .unwrap();

    assert_eq!(wholesale.result["channel"], json!("WHOLESALE"));
    assert_eq!(wholesale.profile.as_deref(), Some("wholesale"));
    for key in ["loan", "borrower", "property"] {
        assert_eq!(base.result[key], wholesale.result[key]);
    }
    assert_eq!(wholesale.log[1], "[override] profile 'wholesale': mapping channel");
}

#[test]
fn test_enum_profile_override() {
    let outcome = execute(&pricing_spec(), &pricing_input(), &options().with_profile("legacy")).unwrap();
    assert_eq!(outcome.result["property"]["occupancy"], json!("OWNER_OCCUPIED"));
    assert_eq!(outcome.log[1], "[override] profile 'legacy': enums occupancy");
}

#[test]
fn test_unknown_profile_runs_base_mapping() {
    let outcome = execute(&pricing_spec(), &pricing_input(), &options().with_profile("nope")).unwrap();
    assert_eq!(outcome.result["channel"], json!("RETAIL"));
    assert_eq!(outcome.profile, None);
    assert!(!outcome.log.iter().any(|line| line.starts_with("[override]")));
}

#[test]
fn test_fatal_validation_before_any_log() {
    assert!(matches!(
        execute(&Value::Null, &json!({}), &options()),
        Err(Error::InvalidSpec { .. })
    ));
    assert!(matches!(
        execute(&json!({}), &json!({}), &options()),
        Err(Error::MissingMappingTree)
    ));
}

#[test]
fn test_compute_failure_does_not_abort_run() {
    let spec = json!({"mapping": {
        "bad": {"compute": "borrower.employer.name", "default": "UNKNOWN"},
        "good": {"from": "a"}
    }});
    let outcome = execute(&spec, &json!({"a": 1}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"bad": "UNKNOWN", "good": 1}));
    assert!(outcome.log[1].contains("failed (Cannot read property `name` of undefined)"));
}

#[test]
fn test_oversized_compute_chain_is_rejected_at_load() {
    let sum = vec!["1"; 400].join("+");
    let spec = json!({"mapping": {"x": {"compute": sum}}});
    let err = execute(&spec, &json!({}), &options()).unwrap_err();
    assert!(matches!(err, Error::InvalidRule { ref path, .. } if path == "x"));

    let members = format!("src{}", ".a".repeat(2000));
    let spec = json!({"mapping": {"y": {"compute": members}}});
    assert!(matches!(
        execute(&spec, &json!({}), &options()),
        Err(Error::InvalidRule { .. })
    ));
}

#[test]
fn test_compute_chain_within_bound_evaluates() {
    let sum = vec!["1"; 100].join("+");
    let spec = json!({"mapping": {"x": {"compute": sum}}});
    let outcome = execute(&spec, &json!({}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"x": 100}));
}

#[test]
fn test_unresolved_fields_are_reported() {
    let spec = json!({"mapping": {"a": {"from": "missing"}, "b": {"nested": {"from": "gone"}}}});
    let outcome = execute(&spec, &json!({}), &options()).unwrap();
    assert_eq!(outcome.result, json!({"b": {}}));
    assert_eq!(outcome.unresolved, vec!["a", "b.nested"]);
}

#[test]
fn test_concurrent_runs_share_a_spec() {
    let spec = Arc::new(MappingSpec::from_value(&pricing_spec()).unwrap());
    let expected = MappingExecutor::new(&spec).run(&pricing_input(), &options());

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let spec = Arc::clone(&spec);
            thread::spawn(move || {
                let options = if i % 2 == 0 {
                    options()
                } else {
                    options().with_profile("wholesale")
                };
                (i, MappingExecutor::new(&spec).run(&pricing_input(), &options))
            })
        })
        .collect();

    for handle in handles {
        let (i, outcome) = handle.join().unwrap();
        if i % 2 == 0 {
            assert_eq!(outcome, expected);
        } else {
            assert_eq!(outcome.result["channel"], json!("WHOLESALE"));
        }
    }
}

#[test]
fn test_default_options_use_system_clock() {
    let spec = json!({"mapping": {"at": {"compute": "now()"}}});
    let outcome = execute(&spec, &json!({}), &ExecuteOptions::default()).unwrap();
    let stamp = outcome.result["at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
}
