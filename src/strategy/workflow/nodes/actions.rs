// SPDX-License-Identifier: MIT

//! Action behaviors
//!
//! Actions describe what should happen rather than doing it: each returns an
//! intent object with a synthetic order id. Routing intents to a venue is the
//! caller's job.

use serde_json::{json, Value};
use uuid::Uuid;

use super::{number_from, number_prop, number_value, string_prop, timestamp, value_as_string, NodeContext};
use crate::runtime::error::BehaviorError;
use crate::runtime::sink::EventLevel;
use crate::strategy::workflow::graph::Node;

pub(super) async fn place_order(
    side: &str,
    node: &Node,
    input: &Value,
    ctx: &mut NodeContext<'_>,
) -> Result<Value, BehaviorError> {
    let amount = number_prop(node, "amount")?.unwrap_or(1.0);
    if amount <= 0.0 {
        return Err(BehaviorError::invalid(
            "amount",
            format!("must be positive, got {}", amount),
        ));
    }

    // Keep the authored value when it is already a JSON number
    let amount_value = match node.property("amount") {
        Some(v @ Value::Number(_)) => v.clone(),
        _ => number_value(amount),
    };
    let price = number_from(node, input, "price")?;
    let symbol = string_prop(node, "symbol").or_else(|| input.get("symbol").and_then(value_as_string));
    let order_type = string_prop(node, "orderType").unwrap_or_else(|| "market".to_string());
    let order_id = format!("order_{}", Uuid::new_v4().simple());

    ctx.log(
        EventLevel::Success,
        &format!(
            "{} intent {} x{} ({})",
            side,
            symbol.as_deref().unwrap_or("?"),
            amount,
            order_id
        ),
    );

    Ok(json!({
        "action": side,
        "amount": amount_value,
        "symbol": symbol,
        "price": price.map(number_value),
        "orderType": order_type,
        "executed": true,
        "orderId": order_id,
        "timestamp": timestamp(),
    }))
}

pub(super) async fn cancel(
    node: &Node,
    input: &Value,
    ctx: &mut NodeContext<'_>,
) -> Result<Value, BehaviorError> {
    let order_id = string_prop(node, "orderId")
        .or_else(|| input.get("orderId").and_then(value_as_string))
        .ok_or_else(|| BehaviorError::missing("orderId"))?;

    ctx.log(EventLevel::Info, &format!("cancel intent for {}", order_id));

    Ok(json!({
        "action": "cancel",
        "orderId": order_id,
        "cancelled": true,
        "timestamp": timestamp(),
    }))
}

pub(super) async fn notify(
    node: &Node,
    input: &Value,
    ctx: &mut NodeContext<'_>,
) -> Result<Value, BehaviorError> {
    let message = string_prop(node, "message")
        .or_else(|| input.get("message").and_then(value_as_string))
        .unwrap_or_else(|| "Strategy notification".to_string());
    let channel = string_prop(node, "channel").unwrap_or_else(|| "log".to_string());

    ctx.log(EventLevel::Info, &format!("[{}] {}", channel, message));

    Ok(json!({
        "action": "notify",
        "message": message,
        "channel": channel,
        "sent": true,
        "timestamp": timestamp(),
    }))
}
