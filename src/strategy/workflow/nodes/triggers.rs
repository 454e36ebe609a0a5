// SPDX-License-Identifier: MIT

//! Trigger behaviors
//!
//! Triggers inspect market-like fields of the incoming payload and report
//! whether they fired. A trigger that did not fire still passes its output
//! downstream; it is up to conditions to gate on `triggered`.

use serde_json::{json, Value};

use super::{number_from, number_prop, number_value, string_prop, timestamp, value_as_string};
use crate::runtime::error::BehaviorError;
use crate::strategy::workflow::condition::as_number;
use crate::strategy::workflow::graph::Node;

pub(super) fn price_cross(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let threshold = number_prop(node, "threshold")?.ok_or_else(|| BehaviorError::missing("threshold"))?;
    let price = number_from(node, input, "price")?.ok_or_else(|| BehaviorError::missing("price"))?;
    let direction = string_prop(node, "direction").unwrap_or_else(|| "above".to_string());

    let triggered = match direction.as_str() {
        "above" => price > threshold,
        "below" => price < threshold,
        other => {
            return Err(BehaviorError::invalid(
                "direction",
                format!("expected 'above' or 'below', got '{}'", other),
            ))
        }
    };

    Ok(json!({
        "triggered": triggered,
        "price": number_value(price),
        "threshold": number_value(threshold),
        "direction": direction,
    }))
}

pub(super) fn volume_spike(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let multiplier = number_prop(node, "multiplier")?.unwrap_or(2.0);
    let volume = number_from(node, input, "volume")?.unwrap_or(0.0);
    let average = number_from(node, input, "averageVolume")?.unwrap_or(0.0);

    let triggered = average > 0.0 && volume >= average * multiplier;

    Ok(json!({
        "triggered": triggered,
        "volume": number_value(volume),
        "averageVolume": number_value(average),
        "multiplier": number_value(multiplier),
    }))
}

pub(super) fn time_trigger(node: &Node) -> Result<Value, BehaviorError> {
    Ok(json!({
        "triggered": true,
        "time": timestamp(),
        "interval": string_prop(node, "interval"),
        "schedule": string_prop(node, "schedule"),
    }))
}

pub(super) fn rsi_signal(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let overbought = number_prop(node, "overbought")?.unwrap_or(70.0);
    let oversold = number_prop(node, "oversold")?.unwrap_or(30.0);
    let rsi = input.get("rsi").and_then(as_number).unwrap_or(50.0);

    let signal = if rsi >= overbought {
        "overbought"
    } else if rsi <= oversold {
        "oversold"
    } else {
        "neutral"
    };

    Ok(json!({
        "triggered": signal != "neutral",
        "rsi": number_value(rsi),
        "signal": signal,
        "overbought": number_value(overbought),
        "oversold": number_value(oversold),
    }))
}

pub(super) fn webhook(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    Ok(json!({
        "triggered": true,
        "webhook": true,
        "path": string_prop(node, "path"),
        "data": input,
        "timestamp": timestamp(),
    }))
}

pub(super) fn event_listener(node: &Node, input: &Value) -> Result<Value, BehaviorError> {
    let expected = string_prop(node, "eventType");
    let received = input
        .get("event")
        .or_else(|| input.get("eventType"))
        .and_then(value_as_string);

    let triggered = match (&expected, &received) {
        (None, _) => true,
        (Some(expected), Some(received)) => expected == received,
        (Some(_), None) => false,
    };

    Ok(json!({
        "triggered": triggered,
        "eventType": expected,
        "event": received,
        "data": input,
    }))
}

pub(super) fn manual_trigger(input: &Value) -> Result<Value, BehaviorError> {
    Ok(json!({
        "triggered": true,
        "manual": true,
        "timestamp": timestamp(),
        "data": input,
    }))
}
