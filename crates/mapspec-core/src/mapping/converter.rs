//! Named value converters
//!
//! Built-in converters are pure and total: they never fail, they degrade to
//! undefined or null. Callers may add their own converters per run; a
//! built-in always wins over a custom converter of the same name.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use crate::clock::Clock;
use crate::value;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A caller-supplied converter; returning `None` yields undefined
pub type ConverterFn = Arc<dyn Fn(&Value) -> Option<Value> + Send + Sync>;

/// Caller-supplied converters keyed by name
pub type CustomConverters = HashMap<String, ConverterFn>;

/// Converters every run has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinConverter {
    /// Number or numeric string to a 4-decimal string with trailing zeros stripped
    ToDecimal,
    /// Like `ToDecimal`, but blank input becomes null and other values are stringified
    ToDecimalStringOrNull,
    /// `fooBar2Baz` to `FOO_BAR2_BAZ`
    PascalToScreaming,
    /// Current timestamp as an ISO-8601 string
    Now,
}

impl BuiltinConverter {
    pub const ALL: [BuiltinConverter; 4] = [
        BuiltinConverter::ToDecimal,
        BuiltinConverter::ToDecimalStringOrNull,
        BuiltinConverter::PascalToScreaming,
        BuiltinConverter::Now,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ToDecimal => "toDecimal",
            Self::ToDecimalStringOrNull => "toDecimalStringOrNull",
            Self::PascalToScreaming => "pascalToScreaming",
            Self::Now => "now",
        }
    }

    /// Apply the converter; `None` input is undefined
    pub fn apply(&self, input: Option<&Value>, clock: &dyn Clock) -> Option<Value> {
        match self {
            Self::ToDecimal => to_decimal(input).map(Value::String),
            Self::ToDecimalStringOrNull => Some(to_decimal_string_or_null(input)),
            Self::PascalToScreaming => Some(pascal_to_screaming(input)),
            Self::Now => Some(Value::String(clock.now_iso())),
        }
    }
}

/// A converter found by name
pub enum Converter<'a> {
    Builtin(BuiltinConverter),
    Custom(&'a ConverterFn),
}

impl Converter<'_> {
    pub fn apply(&self, input: &Value, clock: &dyn Clock) -> Option<Value> {
        match self {
            Converter::Builtin(builtin) => builtin.apply(Some(input), clock),
            Converter::Custom(f) => f(input),
        }
    }
}

/// Lookup over the built-ins followed by one run's custom converters
#[derive(Clone, Copy)]
pub struct ConverterRegistry<'a> {
    custom: &'a CustomConverters,
}

impl<'a> ConverterRegistry<'a> {
    pub fn new(custom: &'a CustomConverters) -> Self {
        Self { custom }
    }

    pub fn lookup(&self, name: &str) -> Option<Converter<'a>> {
        if let Some(builtin) = BuiltinConverter::from_name(name) {
            return Some(Converter::Builtin(builtin));
        }
        self.custom.get(name).map(Converter::Custom)
    }
}

/// Numeric reading of a converter input, `None` when there is none
fn numeric_input(input: &Value) -> Option<f64> {
    let number = match input {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => value::parse_number(s)?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => return None,
    };
    number.is_finite().then_some(number)
}

/// Four decimal places with trailing zeros and a trailing point removed
///
/// Exact ties round away from zero. Magnitudes from `1e21` up keep their
/// exponent form.
pub fn format_decimal(number: f64) -> String {
    if number.abs() >= 1e21 {
        return value::format_number(number);
    }
    let fixed = to_fixed(number, 4);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Fixed-point form of a finite number with `places` fraction digits
fn to_fixed(number: f64, places: usize) -> String {
    // Thirty extra digits separate an exact tie from the nearest double beside it
    let exact = format!("{:.*}", places + 30, number.abs());
    let (integer, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let (kept, dropped) = fraction.split_at(places.min(fraction.len()));

    let mut digits: Vec<char> = integer.chars().chain(kept.chars()).collect();
    if dropped.starts_with(['5', '6', '7', '8', '9']) {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == '9' {
                *digit = '0';
            } else {
                *digit = char::from(*digit as u8 + 1);
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, '1');
        }
    }

    let point = digits.len() - kept.len();
    let mut out = String::with_capacity(digits.len() + 2);
    if number.is_sign_negative() {
        out.push('-');
    }
    out.extend(&digits[..point]);
    if point < digits.len() {
        out.push('.');
        out.extend(&digits[point..]);
    }
    out
}

/// `toDecimal`: blank or non-numeric input is undefined
pub fn to_decimal(input: Option<&Value>) -> Option<String> {
    if value::is_blank(input) {
        return None;
    }
    input.and_then(numeric_input).map(format_decimal)
}

/// `toDecimalStringOrNull`: blank input is null, non-numeric input is stringified
pub fn to_decimal_string_or_null(input: Option<&Value>) -> Value {
    let input = match input {
        Some(v) if !value::is_blank(Some(v)) => v,
        _ => return Value::Null,
    };

    match input {
        Value::Number(_) | Value::String(_) => match numeric_input(input) {
            Some(number) => Value::String(format_decimal(number)),
            None => Value::String(value::to_display_string(Some(input))),
        },
        other => Value::String(value::to_display_string(Some(other))),
    }
}

/// `pascalToScreaming`: `_` before every upper-case letter that follows a lower-case letter or digit
pub fn pascal_to_screaming(input: Option<&Value>) -> Value {
    let text = match input {
        None | Some(Value::Null) => return Value::Null,
        Some(Value::String(s)) => s.clone(),
        Some(other) => value::to_display_string(Some(other)),
    };

    let mut out = String::with_capacity(text.len() + 4);
    let mut previous: Option<char> = None;
    for ch in text.chars() {
        if ch.is_ascii_uppercase()
            && previous.map(|p| p.is_ascii_lowercase() || p.is_ascii_digit()).unwrap_or(false)
        {
            out.push('_');
        }
        out.push(ch);
        previous = Some(ch);
    }

    Value::String(out.to_uppercase())
}
