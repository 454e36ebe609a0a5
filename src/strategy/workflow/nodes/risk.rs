// SPDX-License-Identifier: MIT

//! Risk-control behaviors

use serde_json::{json, Value};

use super::{number_from, number_prop, number_value, NodeContext};
use crate::runtime::error::BehaviorError;
use crate::runtime::sink::EventLevel;
use crate::strategy::workflow::condition::as_number;
use crate::strategy::workflow::graph::Node;

/// Run variable holding the number of trades approved so far
pub const TRADE_COUNT_VAR: &str = "tradeCount";

fn entry_price(node: &Node, input: &Value) -> Result<f64, BehaviorError> {
    if let Some(price) = number_from(node, input, "entryPrice")? {
        return Ok(price);
    }
    input
        .get("price")
        .and_then(as_number)
        .ok_or_else(|| BehaviorError::missing("entryPrice"))
}

fn percentage(node: &Node, default: f64) -> Result<f64, BehaviorError> {
    let pct = number_prop(node, "percentage")?.unwrap_or(default);
    if pct < 0.0 {
        return Err(BehaviorError::invalid(
            "percentage",
            format!("must not be negative, got {}", pct),
        ));
    }
    Ok(pct)
}

pub(super) fn stop_loss(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let entry = entry_price(node, input)?;
    let pct = percentage(node, 2.0)?;
    let stop_price = entry * (1.0 - pct / 100.0);
    let current = input.get("currentPrice").and_then(as_number);

    Ok(json!({
        "entryPrice": number_value(entry),
        "percentage": number_value(pct),
        "stopLossPrice": number_value(stop_price),
        "triggered": current.is_some_and(|p| p <= stop_price),
    }))
}

pub(super) fn take_profit(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let entry = entry_price(node, input)?;
    let pct = percentage(node, 5.0)?;
    let target_price = entry * (1.0 + pct / 100.0);
    let current = input.get("currentPrice").and_then(as_number);

    Ok(json!({
        "entryPrice": number_value(entry),
        "percentage": number_value(pct),
        "takeProfitPrice": number_value(target_price),
        "triggered": current.is_some_and(|p| p >= target_price),
    }))
}

pub(super) fn position_size(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let capital = number_from(node, input, "capital")?.unwrap_or(10_000.0);
    let risk_pct = number_from(node, input, "riskPercentage")?.unwrap_or(1.0);
    let size = capital * risk_pct / 100.0;
    let units = number_from(node, input, "price")?
        .filter(|p| *p > 0.0)
        .map(|p| number_value(size / p));

    Ok(json!({
        "capital": number_value(capital),
        "riskPercentage": number_value(risk_pct),
        "positionSize": number_value(size),
        "units": units,
    }))
}

/// Approve trades until the run-scoped counter reaches `maxTrades`
pub(super) fn max_trades(node: &Node, ctx: &mut NodeContext<'_>) -> Result<Value, BehaviorError> {
    let limit = number_prop(node, "maxTrades")?.unwrap_or(10.0);
    let count = ctx
        .variable(TRADE_COUNT_VAR)
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let allowed = (count as f64) < limit;
    let count = if allowed {
        ctx.set_variable(TRADE_COUNT_VAR, json!(count + 1));
        count + 1
    } else {
        ctx.log(
            EventLevel::Warning,
            &format!("max trades reached ({}/{})", count, limit),
        );
        count
    };

    Ok(json!({
        "allowed": allowed,
        "tradeCount": count,
        "maxTrades": number_value(limit),
    }))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::run_kind;
    use super::super::NodeKind;
    use super::*;
    use crate::strategy::workflow::graph::Category;
    use crate::strategy::workflow::state::RunState;

    fn risk(node_type: &str) -> Node {
        Node::new("r", Category::Risk, node_type)
    }

    fn approx(value: &Value, expected: f64) -> bool {
        value.as_f64().is_some_and(|v| (v - expected).abs() < 1e-9)
    }

    #[test]
    fn test_stop_loss() {
        let node = risk("stop_loss").with_property("percentage", 5);
        let out = stop_loss(&node, &json!({"price": 200, "currentPrice": 189})).unwrap();
        assert!(approx(&out["stopLossPrice"], 190.0));
        assert_eq!(out["triggered"], true);

        let out = stop_loss(&risk("stop_loss"), &json!({"entryPrice": 100})).unwrap();
        assert!(approx(&out["stopLossPrice"], 98.0));
        assert_eq!(out["triggered"], false);
    }

    #[test]
    fn test_take_profit() {
        let node = risk("take_profit").with_property("entryPrice", 100);
        let out = take_profit(&node, &json!({"currentPrice": 106})).unwrap();
        assert!(approx(&out["takeProfitPrice"], 105.0));
        assert_eq!(out["triggered"], true);
    }

    #[test]
    fn test_missing_entry_price_fails() {
        assert!(matches!(
            stop_loss(&risk("stop_loss"), &json!({})),
            Err(BehaviorError::MissingValue(_))
        ));
        let node = risk("take_profit")
            .with_property("entryPrice", 1)
            .with_property("percentage", -1);
        assert!(take_profit(&node, &json!({})).is_err());
    }

    #[test]
    fn test_position_size() {
        let node = risk("position_size")
            .with_property("capital", 5000)
            .with_property("riskPercentage", 2);
        let out = position_size(&node, &json!({"price": 50})).unwrap();
        assert!(approx(&out["positionSize"], 100.0));
        assert!(approx(&out["units"], 2.0));

        let out = position_size(&risk("position_size"), &json!({})).unwrap();
        assert!(approx(&out["positionSize"], 100.0));
        assert!(out["units"].is_null());
    }

    #[tokio::test]
    async fn test_max_trades_counts_and_denies() {
        let node = risk("max_trades").with_property("maxTrades", 2);
        let mut state = RunState::new();

        let first = run_kind(NodeKind::MaxTrades, &node, json!({}), &mut state)
            .await
            .unwrap();
        let second = run_kind(NodeKind::MaxTrades, &node, json!({}), &mut state)
            .await
            .unwrap();
        let third = run_kind(NodeKind::MaxTrades, &node, json!({}), &mut state)
            .await
            .unwrap();

        assert_eq!(first["allowed"], true);
        assert_eq!(second["allowed"], true);
        assert_eq!(third["allowed"], false);
        assert_eq!(third["tradeCount"], 2);
        assert_eq!(state.variable(TRADE_COUNT_VAR), Some(&json!(2)));
    }
}
