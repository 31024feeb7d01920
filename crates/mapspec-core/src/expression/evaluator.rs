//! Compute expression evaluation
//!
//! Interprets an [`Expr`] tree directly against the bounded scope. Values
//! follow loose scripting semantics: `+` concatenates when either side is
//! textual, logical operators short-circuit and return an operand, and
//! non-finite arithmetic results come out as `null`.
//!
//! Copyright (c) 2025 Mapspec Team
//! Licensed under the Apache-2.0 license

use super::ast::*;
use super::error::ExpressionError;
use crate::clock::Clock;
use crate::mapping::alias::Aliases;
use crate::mapping::path;
use crate::value::{self, is_present, is_truthy, number_value, to_display_string, to_number};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

type EvalResult = std::result::Result<Option<Value>, ExpressionError>;

/// Intermediate result; values read from the input stay borrowed
type Evaluated<'a> = std::result::Result<Option<Cow<'a, Value>>, ExpressionError>;

/// Everything an expression can see
#[derive(Clone, Copy)]
pub struct Scope<'a> {
    /// The input document (`src`)
    pub root: &'a Value,
    /// Alias table used by `get()`
    pub aliases: &'a Aliases,
    /// Time source for `now()`
    pub clock: &'a dyn Clock,
}

impl<'a> Scope<'a> {
    pub fn new(root: &'a Value, aliases: &'a Aliases, clock: &'a dyn Clock) -> Self {
        Self {
            root,
            aliases,
            clock,
        }
    }

    /// `src.<name>`, or an empty object when it is undefined or null
    fn shortcut(&self, name: &str) -> Cow<'a, Value> {
        match self.root.get(name) {
            Some(v) if !v.is_null() => Cow::Borrowed(v),
            _ => Cow::Owned(Value::Object(Map::new())),
        }
    }
}

/// Tree-walking interpreter over one scope
pub struct Evaluator<'a> {
    scope: Scope<'a>,
}

impl<'a> Evaluator<'a> {
    pub fn new(scope: Scope<'a>) -> Self {
        Self { scope }
    }

    /// Evaluate an expression; `Ok(None)` is a legal undefined result
    pub fn evaluate(&self, expr: &Expr) -> EvalResult {
        Ok(self.eval(expr)?.map(Cow::into_owned))
    }

    fn eval(&self, expr: &Expr) -> Evaluated<'a> {
        match expr {
            Expr::Literal(literal) => Ok(literal_value(literal).map(Cow::Owned)),
            Expr::Variable(variable) => Ok(Some(self.variable(*variable))),
            Expr::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.evaluate(item)?.unwrap_or(Value::Null));
                }
                Ok(Some(Cow::Owned(Value::Array(values))))
            }
            Expr::Member {
                base,
                property,
                optional,
            } => {
                let base_value = self.eval(base)?;
                if !is_present(base_value.as_deref()) {
                    if *optional {
                        return Ok(None);
                    }
                    return Err(null_access(property, base_value.as_deref()));
                }
                Ok(base_value.and_then(|base| member(base, property)))
            }
            Expr::Index { base, index } => {
                let base_value = self.eval(base)?;
                let key = to_display_string(self.eval(index)?.as_deref());
                if !is_present(base_value.as_deref()) {
                    return Err(null_access(&key, base_value.as_deref()));
                }
                Ok(base_value.and_then(|base| member(base, &key)))
            }
            Expr::Call { function, args } => self.evaluate_call(*function, args),
            Expr::Unary { operator, operand } => {
                let operand = self.eval(operand)?;
                let result = match operator {
                    UnaryOperator::Not => Value::Bool(!is_truthy(operand.as_deref())),
                    UnaryOperator::Negate => number_value(-to_number(operand.as_deref())),
                };
                Ok(Some(Cow::Owned(result)))
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, *operator, right),
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if is_truthy(self.eval(test)?.as_deref()) {
                    self.eval(consequent)
                } else {
                    self.eval(alternate)
                }
            }
        }
    }

    fn variable(&self, variable: ScopeVariable) -> Cow<'a, Value> {
        match variable {
            ScopeVariable::Src => Cow::Borrowed(self.scope.root),
            ScopeVariable::Borrower => self.scope.shortcut("borrower"),
            ScopeVariable::Loan => self.scope.shortcut("loan"),
            ScopeVariable::Property => self.scope.shortcut("property"),
        }
    }

    fn evaluate_call(&self, function: Function, args: &[Expr]) -> Evaluated<'a> {
        let argument = match args.first() {
            Some(arg) => self.eval(arg)?,
            None => None,
        };

        match function {
            Function::Get => Ok(argument
                .as_deref()
                .and_then(Value::as_str)
                .and_then(|p| path::resolve_aliased(self.scope.root, p, self.scope.aliases))
                .map(Cow::Borrowed)),
            Function::Converter(converter) => Ok(converter
                .apply(argument.as_deref(), self.scope.clock)
                .map(Cow::Owned)),
        }
    }

    /// Evaluate binary operation with short-circuit evaluation
    fn evaluate_binary(&self, left: &Expr, operator: BinaryOperator, right: &Expr) -> Evaluated<'a> {
        let left_value = self.eval(left)?;

        match operator {
            BinaryOperator::And => {
                if !is_truthy(left_value.as_deref()) {
                    return Ok(left_value);
                }
                self.eval(right)
            }
            BinaryOperator::Or => {
                if is_truthy(left_value.as_deref()) {
                    return Ok(left_value);
                }
                self.eval(right)
            }
            BinaryOperator::Nullish => {
                if is_present(left_value.as_deref()) {
                    return Ok(left_value);
                }
                self.eval(right)
            }
            _ => {
                let right_value = self.eval(right)?;
                Ok(Some(Cow::Owned(apply_binary_operator(
                    left_value.as_deref(),
                    operator,
                    right_value.as_deref(),
                ))))
            }
        }
    }
}

fn literal_value(literal: &Literal) -> Option<Value> {
    match literal {
        Literal::Undefined => None,
        Literal::Null => Some(Value::Null),
        Literal::Boolean(b) => Some(Value::Bool(*b)),
        Literal::Number(n) => Some(number_value(*n)),
        Literal::String(s) => Some(Value::String(s.clone())),
    }
}

fn null_access(property: &str, target: Option<&Value>) -> ExpressionError {
    ExpressionError::NullAccess {
        property: property.to_string(),
        target: value::type_name(target).to_string(),
    }
}

/// Property read that stays borrowed while the base is
fn member<'a>(base: Cow<'a, Value>, property: &str) -> Option<Cow<'a, Value>> {
    match base {
        Cow::Borrowed(value) => get_property(value, property),
        Cow::Owned(value) => get_property(&value, property).map(|v| Cow::Owned(v.into_owned())),
    }
}

/// Property read on a defined, non-null value
fn get_property<'v>(base: &'v Value, property: &str) -> Option<Cow<'v, Value>> {
    match base {
        Value::Object(map) => map.get(property).map(Cow::Borrowed),
        Value::Array(items) => {
            if property == "length" {
                return Some(Cow::Owned(Value::from(items.len())));
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .map(Cow::Borrowed)
        }
        Value::String(s) => {
            if property == "length" {
                return Some(Cow::Owned(Value::from(s.encode_utf16().count())));
            }
            property
                .parse::<usize>()
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|c| Cow::Owned(Value::String(c.to_string())))
        }
        _ => None,
    }
}

/// Operands that concatenate under `+`
fn is_textual(value: Option<&Value>) -> bool {
    matches!(
        value,
        Some(Value::String(_)) | Some(Value::Array(_)) | Some(Value::Object(_))
    )
}

/// Apply a non-short-circuiting binary operator
fn apply_binary_operator(left: Option<&Value>, operator: BinaryOperator, right: Option<&Value>) -> Value {
    match operator {
        BinaryOperator::Add => {
            if is_textual(left) || is_textual(right) {
                Value::String(format!("{}{}", to_display_string(left), to_display_string(right)))
            } else {
                number_value(to_number(left) + to_number(right))
            }
        }
        BinaryOperator::Subtract => number_value(to_number(left) - to_number(right)),
        BinaryOperator::Multiply => number_value(to_number(left) * to_number(right)),
        BinaryOperator::Divide => number_value(to_number(left) / to_number(right)),
        BinaryOperator::Remainder => number_value(to_number(left) % to_number(right)),
        BinaryOperator::Equal => Value::Bool(loose_equal(left, right)),
        BinaryOperator::NotEqual => Value::Bool(!loose_equal(left, right)),
        BinaryOperator::StrictEqual => Value::Bool(strict_equal(left, right)),
        BinaryOperator::StrictNotEqual => Value::Bool(!strict_equal(left, right)),
        BinaryOperator::LessThan => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOperator::LessThanOrEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less) | Some(Ordering::Equal)
        )),
        BinaryOperator::GreaterThan => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOperator::GreaterThanOrEqual => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        )),
        // Short-circuiting operators never reach here
        BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Nullish => Value::Null,
    }
}

/// `===`: same type and same value; numbers compare numerically
fn strict_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    match (left, right) {
        (None, None) => true,
        (Some(Value::Number(a)), Some(Value::Number(b))) => a.as_f64() == b.as_f64(),
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// `==`: null and undefined equal each other, mixed primitives compare as numbers
fn loose_equal(left: Option<&Value>, right: Option<&Value>) -> bool {
    let (a, b) = match (left, right) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => (a, b),
        _ => return !is_present(left) && !is_present(right),
    };

    match (a, b) {
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(_) | Value::Object(_), _) | (_, Value::Array(_) | Value::Object(_)) => {
            if std::mem::discriminant(a) == std::mem::discriminant(b) {
                a == b
            } else {
                to_display_string(Some(a)) == to_display_string(Some(b))
            }
        }
        _ => to_number(Some(a)) == to_number(Some(b)),
    }
}

/// Relational ordering: strings lexicographically, everything else numerically
fn compare(left: Option<&Value>, right: Option<&Value>) -> Option<Ordering> {
    match (left, right) {
        (Some(Value::String(a)), Some(Value::String(b))) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::expression::parser::Parser;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn eval_with(source: &str, root: &Value, aliases: &Aliases) -> EvalResult {
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap());
        let expr = Parser::new(source).unwrap().parse().unwrap();
        Evaluator::new(Scope::new(root, aliases, &clock)).evaluate(&expr)
    }

    fn eval(source: &str, root: &Value) -> Option<Value> {
        eval_with(source, root, &Aliases::new()).unwrap()
    }

    fn loan_doc() -> Value {
        json!({
            "borrower": {"firstName": "Ada", "lastName": "Lovelace", "income": 120000},
            "loan": {"amount": 250000, "rate": 6.5, "type": "FHA", "tags": ["a", "b"]},
            "data": {"loanInfo": {"term": 360}}
        })
    }

    #[test]
    fn test_arithmetic() {
        let doc = loan_doc();
        assert_eq!(eval("1 + 2 * 3", &doc), Some(json!(7)));
        assert_eq!(eval("(1 + 2) * 3", &doc), Some(json!(9)));
        assert_eq!(eval("loan.amount / 1000", &doc), Some(json!(250)));
        assert_eq!(eval("loan.rate * 2", &doc), Some(json!(13)));
        assert_eq!(eval("7 % 4", &doc), Some(json!(3)));
        assert_eq!(eval("-loan.amount", &doc), Some(json!(-250000)));
    }

    #[test]
    fn test_non_finite_results_are_null() {
        let doc = loan_doc();
        assert_eq!(eval("1 / 0", &doc), Some(Value::Null));
        assert_eq!(eval("loan.missing * 2", &doc), Some(Value::Null));
    }

    #[test]
    fn test_string_concatenation() {
        let doc = loan_doc();
        assert_eq!(
            eval("borrower.firstName + ' ' + borrower.lastName", &doc),
            Some(json!("Ada Lovelace"))
        );
        assert_eq!(eval("'n=' + 5", &doc), Some(json!("n=5")));
        assert_eq!(eval("'x' + loan.missing", &doc), Some(json!("xundefined")));
    }

    #[test]
    fn test_logical_operators_return_operands() {
        let doc = loan_doc();
        assert_eq!(eval("loan.missing || 'fallback'", &doc), Some(json!("fallback")));
        assert_eq!(eval("loan.type && loan.amount", &doc), Some(json!(250000)));
        assert_eq!(eval("0 ?? 5", &doc), Some(json!(0)));
        assert_eq!(eval("null ?? 5", &doc), Some(json!(5)));
        assert_eq!(eval("!loan.missing", &doc), Some(json!(true)));
    }

    #[test]
    fn test_short_circuit_skips_failing_operand() {
        let doc = loan_doc();
        assert_eq!(eval("false && loan.missing.deep", &doc), Some(json!(false)));
        assert_eq!(eval("loan.type || loan.missing.deep", &doc), Some(json!("FHA")));
    }

    #[test]
    fn test_comparisons_and_equality() {
        let doc = loan_doc();
        assert_eq!(eval("loan.amount > 100000", &doc), Some(json!(true)));
        assert_eq!(eval("loan.type === 'FHA'", &doc), Some(json!(true)));
        assert_eq!(eval("loan.type !== 'VA'", &doc), Some(json!(true)));
        assert_eq!(eval("'5' == 5", &doc), Some(json!(true)));
        assert_eq!(eval("'5' === 5", &doc), Some(json!(false)));
        assert_eq!(eval("null == undefined", &doc), Some(json!(true)));
        assert_eq!(eval("null === undefined", &doc), Some(json!(false)));
        assert_eq!(eval("'abc' < 'abd'", &doc), Some(json!(true)));
        assert_eq!(eval("loan.missing < 1", &doc), Some(json!(false)));
    }

    #[test]
    fn test_conditional() {
        let doc = loan_doc();
        assert_eq!(
            eval("loan.amount > 200000 ? 'JUMBO' : 'CONFORMING'", &doc),
            Some(json!("JUMBO"))
        );
    }

    #[test]
    fn test_member_and_index_access() {
        let doc = loan_doc();
        assert_eq!(eval("loan.tags[1]", &doc), Some(json!("b")));
        assert_eq!(eval("loan.tags.length", &doc), Some(json!(2)));
        assert_eq!(eval("loan['type']", &doc), Some(json!("FHA")));
        assert_eq!(eval("loan.type.length", &doc), Some(json!(3)));
        assert_eq!(eval("src.data.loanInfo.term", &doc), Some(json!(360)));
        assert_eq!(eval("loan.missing", &doc), None);
    }

    #[test]
    fn test_shortcuts_default_to_empty_object() {
        let doc = json!({"loan": null});
        assert_eq!(eval("property", &doc), Some(json!({})));
        assert_eq!(eval("loan.amount", &doc), None);
    }

    #[test]
    fn test_null_access_is_runtime_error() {
        let doc = loan_doc();
        let err = eval_with("loan.missing.amount", &doc, &Aliases::new()).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::NullAccess {
                property: "amount".to_string(),
                target: "undefined".to_string(),
            }
        );
        assert_eq!(eval("loan.missing?.amount", &doc), None);
    }

    #[test]
    fn test_get_uses_aliases() {
        let doc = loan_doc();
        let aliases = Aliases::from_pairs([("li", "data.loanInfo")]);
        assert_eq!(
            eval_with("get('li.term')", &doc, &aliases).unwrap(),
            Some(json!(360))
        );
        assert_eq!(eval("get(42)", &doc), None);
    }

    #[test]
    fn test_converters_are_callable() {
        let doc = loan_doc();
        assert_eq!(eval("toDecimal(loan.rate)", &doc), Some(json!("6.5")));
        assert_eq!(eval("toDecimal('')", &doc), None);
        assert_eq!(eval("pascalToScreaming('fixedRate')", &doc), Some(json!("FIXED_RATE")));
        assert_eq!(eval("now()", &doc), Some(json!("2025-01-15T08:00:00.000Z")));
    }

    #[test]
    fn test_member_reads_borrow_from_input() {
        let doc = loan_doc();
        let aliases = Aliases::new();
        let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap());
        let evaluator = Evaluator::new(Scope::new(&doc, &aliases, &clock));
        let eval_ref = |source: &str| {
            let expr = Parser::new(source).unwrap().parse().unwrap();
            evaluator.eval(&expr).unwrap()
        };

        match eval_ref("src.loan.tags") {
            Some(Cow::Borrowed(tags)) => assert!(std::ptr::eq(tags, &doc["loan"]["tags"])),
            other => panic!("expected a borrowed value, got {:?}", other),
        }
        assert!(matches!(eval_ref("loan.tags[1]"), Some(Cow::Borrowed(_))));
        assert!(matches!(eval_ref("get('data.loanInfo')"), Some(Cow::Borrowed(_))));
        assert!(matches!(eval_ref("loan.missing ?? borrower"), Some(Cow::Borrowed(_))));
        assert!(matches!(eval_ref("loan.tags.length"), Some(Cow::Owned(_))));
        assert!(matches!(eval_ref("property"), Some(Cow::Owned(_))));
    }

    #[test]
    fn test_long_chains_within_bound_evaluate() {
        let doc = json!({"a": {"a": {"a": {"a": 7}}}});
        let sum = vec!["1"; 120].join(" + ");
        assert_eq!(eval(&sum, &doc), Some(json!(120)));
        let lookups = vec!["src.a.a.a.a"; 20].join(" * 0 + ");
        assert_eq!(eval(&lookups, &doc), Some(json!(7)));
    }

    #[test]
    fn test_array_literal() {
        let doc = loan_doc();
        assert_eq!(eval("[loan.type, undefined, 1]", &doc), Some(json!(["FHA", null, 1])));
    }
}
