// SPDX-License-Identifier: MIT

//! Condition behaviors, including the two branch selectors

use serde_json::{json, Value};

use super::{number_from, number_prop, number_value, string_prop, value_as_string};
use crate::runtime::error::BehaviorError;
use crate::strategy::workflow::condition::{self, is_truthy, lookup_path, CompareOp};
use crate::strategy::workflow::graph::Node;

/// Boolean fields upstream nodes use to report their verdict
const SIGNAL_FIELDS: [&str; 4] = ["triggered", "passed", "allowed", "result"];

/// Operators the `compare` node accepts; `if` conditions allow more
const COMPARE_OPERATORS: [&str; 6] = ["==", "!=", ">", "<", ">=", "<="];

/// Switch cases in output-index order
const SWITCH_CASES: [&str; 3] = ["case1", "case2", "case3"];

fn signals(node: &Node, input: &Value) -> Vec<bool> {
    let from_input = SIGNAL_FIELDS
        .iter()
        .filter_map(|key| input.get(*key).and_then(Value::as_bool));
    let from_props = ["input1", "input2"]
        .iter()
        .filter_map(|key| node.property(key).map(is_truthy));
    from_input.chain(from_props).collect()
}

pub(super) fn all_of(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let signals = signals(node, input);
    let passed = !signals.is_empty() && signals.iter().all(|s| *s);
    Ok(json!({ "passed": passed, "result": passed, "signals": signals }))
}

pub(super) fn any_of(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let signals = signals(node, input);
    let passed = signals.iter().any(|s| *s);
    Ok(json!({ "passed": passed, "result": passed, "signals": signals }))
}

pub(super) fn compare(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let operand = |key: &str| -> Result<Value, BehaviorError> {
        node.property(key)
            .filter(|v| !v.is_null())
            .or_else(|| input.get(key))
            .cloned()
            .ok_or_else(|| BehaviorError::missing(key))
    };

    let value1 = operand("value1")?;
    let value2 = operand("value2")?;
    let operator = string_prop(node, "operator").unwrap_or_else(|| "==".to_string());
    if !COMPARE_OPERATORS.contains(&operator.trim()) {
        return Err(BehaviorError::invalid(
            "operator",
            format!("expected one of {}, got '{}'", COMPARE_OPERATORS.join(" "), operator),
        ));
    }
    let op: CompareOp = operator.parse()?;

    Ok(json!({
        "passed": op.apply(&value1, &value2),
        "value1": value1,
        "value2": value2,
        "operator": op.symbol(),
    }))
}

pub(super) fn threshold(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let value = match number_from(node, input, "value")? {
        Some(v) => v,
        None => number_from(node, input, "price")?.ok_or_else(|| BehaviorError::missing("value"))?,
    };
    let min = number_prop(node, "min")?;
    let max = number_prop(node, "max")?;

    let passed = min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m);

    Ok(json!({
        "passed": passed,
        "value": number_value(value),
        "min": min.map(number_value),
        "max": max.map(number_value),
    }))
}

/// Binary branch: output 0 on true, output 1 on false
pub(super) fn if_branch(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let expression = string_prop(node, "condition");
    let result = match &expression {
        Some(text) => condition::evaluate(&condition::parse(text)?, input),
        None => SIGNAL_FIELDS
            .iter()
            .find_map(|key| input.get(*key))
            .is_some_and(is_truthy),
    };

    let (true_path, false_path) = if result {
        (input.clone(), Value::Null)
    } else {
        (Value::Null, input.clone())
    };

    Ok(json!({
        "branch": if result { "true" } else { "false" },
        "result": result,
        "condition": expression,
        "truePath": true_path,
        "falsePath": false_path,
    }))
}

/// Multi-way branch: case1..case3 map to outputs 0..2, default to output 3
pub(super) fn switch_branch(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let field = string_prop(node, "field").unwrap_or_else(|| "value".to_string());
    let value = node
        .property("value")
        .filter(|v| !v.is_null())
        .or_else(|| lookup_path(input, &field))
        .cloned()
        .unwrap_or(Value::Null);
    let text = value_as_string(&value);

    let branch = SWITCH_CASES
        .iter()
        .find(|case| text.is_some() && string_prop(node, case) == text)
        .copied()
        .unwrap_or("default");

    Ok(json!({
        "branch": branch,
        "value": value,
        "field": field,
        "matched": branch != "default",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::workflow::graph::Category;

    fn condition_node(node_type: &str) -> Node {
        Node::new("c", Category::Conditions, node_type)
    }

    #[test]
    fn test_and_or() {
        let input = json!({"triggered": true, "passed": false});
        assert_eq!(all_of(&condition_node("and"), &input).unwrap()["passed"], false);
        assert_eq!(any_of(&condition_node("or"), &input).unwrap()["passed"], true);

        let input = json!({"triggered": true, "allowed": true});
        assert_eq!(all_of(&condition_node("and"), &input).unwrap()["passed"], true);

        let node = condition_node("and").with_property("input1", false);
        assert_eq!(all_of(&node, &input).unwrap()["passed"], false);
    }

    #[test]
    fn test_and_without_signals_fails() {
        let out = all_of(&condition_node("and"), &json!({"price": 1})).unwrap();
        assert_eq!(out["passed"], false);
        let out = any_of(&condition_node("or"), &json!({})).unwrap();
        assert_eq!(out["passed"], false);
    }

    #[test]
    fn test_compare_from_properties() {
        let node = condition_node("compare")
            .with_property("value1", 10)
            .with_property("operator", ">")
            .with_property("value2", 5);
        let out = compare(&node, &json!({})).unwrap();
        assert_eq!(
            out,
            json!({"passed": true, "value1": 10, "value2": 5, "operator": ">"})
        );
    }

    #[test]
    fn test_compare_reads_missing_operand_from_input() {
        let node = condition_node("compare")
            .with_property("operator", "<=")
            .with_property("value2", "100");
        let out = compare(&node, &json!({"value1": 99.5})).unwrap();
        assert_eq!(out["passed"], true);

        assert!(matches!(
            compare(&node, &json!({})),
            Err(BehaviorError::MissingValue(_))
        ));
    }

    #[test]
    fn test_compare_rejects_unknown_operator() {
        for operator in ["=~", "contains", "===", "!=="] {
            let node = condition_node("compare")
                .with_property("value1", 1)
                .with_property("value2", 1)
                .with_property("operator", operator);
            assert!(
                matches!(
                    compare(&node, &json!({})),
                    Err(BehaviorError::InvalidProperty { .. })
                ),
                "operator {} should be rejected",
                operator
            );
        }
    }

    #[test]
    fn test_compare_accepts_each_operator() {
        let expected = [
            ("==", false),
            ("!=", true),
            (">", true),
            ("<", false),
            (">=", true),
            ("<=", false),
        ];
        for (operator, passed) in expected {
            let node = condition_node("compare")
                .with_property("value1", 3)
                .with_property("value2", 2)
                .with_property("operator", operator);
            assert_eq!(compare(&node, &json!({})).unwrap()["passed"], passed);
        }
    }

    #[test]
    fn test_threshold_inclusive_bounds() {
        let node = condition_node("threshold")
            .with_property("min", 10)
            .with_property("max", 20);
        assert_eq!(threshold(&node, &json!({"value": 10})).unwrap()["passed"], true);
        assert_eq!(threshold(&node, &json!({"value": 20})).unwrap()["passed"], true);
        assert_eq!(threshold(&node, &json!({"value": 20.01})).unwrap()["passed"], false);
        assert_eq!(threshold(&node, &json!({"price": 15})).unwrap()["passed"], true);
        assert!(threshold(&node, &json!({})).is_err());
    }

    #[test]
    fn test_if_with_condition() {
        let node = condition_node("if").with_property("condition", "price > 100");
        let input = json!({"price": 120});
        let out = if_branch(&node, &input).unwrap();
        assert_eq!(out["branch"], "true");
        assert_eq!(out["truePath"], input);
        assert!(out["falsePath"].is_null());

        let out = if_branch(&node, &json!({"price": 80})).unwrap();
        assert_eq!(out["branch"], "false");
        assert_eq!(out["falsePath"], json!({"price": 80}));
    }

    #[test]
    fn test_if_without_condition_uses_signal() {
        let node = condition_node("if");
        assert_eq!(if_branch(&node, &json!({"passed": true})).unwrap()["branch"], "true");
        assert_eq!(if_branch(&node, &json!({"passed": false})).unwrap()["branch"], "false");
        assert_eq!(if_branch(&node, &json!({})).unwrap()["branch"], "false");
    }

    #[test]
    fn test_if_with_bad_condition_fails() {
        let node = condition_node("if").with_property("condition", "price >");
        assert!(if_branch(&node, &json!({})).is_err());
    }

    #[test]
    fn test_switch_cases() {
        let node = condition_node("switch")
            .with_property("field", "signal")
            .with_property("case1", "buy")
            .with_property("case2", "sell")
            .with_property("case3", "hold");

        assert_eq!(
            switch_branch(&node, &json!({"signal": "sell"})).unwrap()["branch"],
            "case2"
        );
        let out = switch_branch(&node, &json!({"signal": "panic"})).unwrap();
        assert_eq!(out["branch"], "default");
        assert_eq!(out["matched"], false);
        assert_eq!(switch_branch(&node, &json!({})).unwrap()["branch"], "default");
    }

    #[test]
    fn test_switch_matches_numbers_as_text() {
        let node = condition_node("switch")
            .with_property("case1", "1")
            .with_property("case3", 3);
        assert_eq!(switch_branch(&node, &json!({"value": 3})).unwrap()["branch"], "case3");
        assert_eq!(switch_branch(&node, &json!({"value": "1"})).unwrap()["branch"], "case1");
    }
}
