// SPDX-License-Identifier: MIT

//! Condition expression evaluator

use super::ast::{is_truthy, Expression};
use serde_json::Value;

/// Evaluate a condition expression against a node's input payload
pub fn evaluate(expr: &Expression, payload: &Value) -> bool {
    match expr {
        Expression::True => true,
        Expression::False => false,
        Expression::Compare { field, op, right } => {
            let left = lookup_path(payload, field).unwrap_or(&Value::Null);
            op.apply(left, &right.to_value())
        }
        Expression::Field(field) => lookup_path(payload, field).is_some_and(is_truthy),
        Expression::And(left, right) => evaluate(left, payload) && evaluate(right, payload),
        Expression::Or(left, right) => evaluate(left, payload) || evaluate(right, payload),
        Expression::Not(inner) => !evaluate(inner, payload),
    }
}

/// Resolve a dot-separated path inside a JSON value
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| match current {
        Value::Array(items) => part.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => current.get(part),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::workflow::condition::parser::parse;
    use serde_json::json;

    fn eval(condition: &str, payload: Value) -> bool {
        evaluate(&parse(condition).unwrap(), &payload)
    }

    #[test]
    fn test_numeric_conditions() {
        let payload = json!({"price": 105.5, "rsi": 28});
        assert!(eval("price > 100", payload.clone()));
        assert!(!eval("price > 110", payload.clone()));
        assert!(eval("rsi <= 30", payload.clone()));
        assert!(eval("price > 100 and rsi < 30", payload));
    }

    #[test]
    fn test_numeric_strings_compare_as_numbers() {
        assert!(eval("price >= 100", json!({"price": "100"})));
    }

    #[test]
    fn test_string_conditions() {
        let payload = json!({"signal": "oversold", "pair": "BTC/USDT"});
        assert!(eval("signal == 'oversold'", payload.clone()));
        assert!(eval("signal != 'overbought'", payload.clone()));
        assert!(eval("pair contains 'USDT'", payload));
    }

    #[test]
    fn test_missing_field_is_null() {
        assert!(eval("missing == null", json!({})));
        assert!(!eval("missing > 0", json!({})));
        assert!(!eval("missing", json!({})));
    }

    #[test]
    fn test_field_truthiness_and_not() {
        let payload = json!({"triggered": true, "passed": false});
        assert!(eval("triggered", payload.clone()));
        assert!(eval("not passed", payload.clone()));
        assert!(eval("triggered or passed", payload.clone()));
        assert!(!eval("triggered and passed", payload));
    }

    #[test]
    fn test_nested_paths() {
        let payload = json!({"data": {"price": 42, "levels": [10, 20]}});
        assert!(eval("data.price == 42", payload.clone()));
        assert!(eval("data.levels.1 == 20", payload.clone()));
        assert_eq!(lookup_path(&payload, "data.levels.5"), None);
        assert_eq!(lookup_path(&payload, "data.nothing"), None);
    }
}
