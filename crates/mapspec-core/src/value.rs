//! Value helpers shared by the resolver, converters and expression evaluator
//!
//! Resolved values are `Option<Value>`: `None` is "undefined", which JSON has
//! no spelling for. The coercions here follow the loose scripting semantics
//! mapping specifications are written against.

use serde_json::{Number, Value};

/// Largest integer an f64 represents exactly
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Render a resolved value for the audit log
pub fn render(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(v) => v.to_string(),
    }
}

/// Undefined, null, or the empty string
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Defined and not null
pub fn is_present(value: Option<&Value>) -> bool {
    !matches!(value, None | Some(Value::Null))
}

/// Truthiness: undefined, null, false, 0, NaN and "" are false
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// String form of a value, as used for enum lookups and string concatenation
pub fn to_display_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => number_to_string(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => to_display_string(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn number_to_string(n: &Number) -> String {
    let exact_integer = n
        .as_i64()
        .map(|i| i.unsigned_abs() <= MAX_SAFE_INTEGER as u64)
        .unwrap_or(false);
    if exact_integer {
        return n.to_string();
    }
    n.as_f64().map(format_number).unwrap_or_else(|| n.to_string())
}

/// Format an f64 the way it prints in scripts
///
/// Integral values print without a fraction; magnitudes below `1e-6` or
/// from `1e21` up print in exponent form (`1e+21`, `1.5e-7`).
pub fn format_number(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{}Infinity", sign)
    } else if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        format!("{}", f as i64)
    } else if f.abs() >= 1e21 || f.abs() < 1e-6 {
        exponent_form(f)
    } else {
        format!("{}", f)
    }
}

fn exponent_form(f: f64) -> String {
    let formatted = format!("{:e}", f);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => formatted,
    }
}

/// Numeric coercion; NaN when the value has no numeric reading
pub fn to_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_number(s).unwrap_or(f64::NAN),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// Parse a numeric string; surrounding whitespace is ignored and a blank string reads as 0
pub fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(0.0);
    }
    match trimmed {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // Rust's float grammar also accepts "inf" and "nan", which are not numbers here
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Build a JSON number from an f64; non-finite results become null
pub fn number_value(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() <= MAX_SAFE_INTEGER {
        return Value::from(f as i64);
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Name of a value's type for diagnostics
pub fn type_name(value: Option<&Value>) -> &'static str {
    match value {
        None => "undefined",
        Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
