// SPDX-License-Identifier: MIT

//! Node behaviors
//!
//! Every supported `(category, type)` pair is a variant of [`NodeKind`].
//! Behaviors receive the node, its input payload and a [`NodeContext`]; they
//! never see the graph or the execution history.

mod actions;
mod conditions;
mod risk;
mod triggers;

use chrono::Utc;
use serde_json::Value;

use crate::runtime::error::BehaviorError;
use crate::runtime::sink::{EventLevel, EventSink};
use crate::strategy::workflow::condition::as_number;
use crate::strategy::workflow::graph::{Category, Node};
use crate::strategy::workflow::state::RunState;

/// Facilities a behavior may use while it runs
pub struct NodeContext<'a> {
    state: &'a mut RunState,
    sink: &'a dyn EventSink,
}

impl<'a> NodeContext<'a> {
    pub fn new(state: &'a mut RunState, sink: &'a dyn EventSink) -> Self {
        Self { state, sink }
    }

    pub fn log(&self, level: EventLevel, message: &str) {
        self.sink.emit(level, message);
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.state.variable(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.state.set_variable(name, value);
    }
}

/// Closed set of node behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    // triggers
    PriceCross,
    VolumeSpike,
    TimeTrigger,
    RsiSignal,
    Webhook,
    EventListener,
    ManualTrigger,
    // conditions
    And,
    Or,
    Compare,
    Threshold,
    If,
    Switch,
    // actions
    Buy,
    Sell,
    Cancel,
    Notify,
    // risk
    StopLoss,
    TakeProfit,
    PositionSize,
    MaxTrades,
}

impl NodeKind {
    pub const ALL: [NodeKind; 21] = [
        NodeKind::PriceCross,
        NodeKind::VolumeSpike,
        NodeKind::TimeTrigger,
        NodeKind::RsiSignal,
        NodeKind::Webhook,
        NodeKind::EventListener,
        NodeKind::ManualTrigger,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Compare,
        NodeKind::Threshold,
        NodeKind::If,
        NodeKind::Switch,
        NodeKind::Buy,
        NodeKind::Sell,
        NodeKind::Cancel,
        NodeKind::Notify,
        NodeKind::StopLoss,
        NodeKind::TakeProfit,
        NodeKind::PositionSize,
        NodeKind::MaxTrades,
    ];

    pub fn category(&self) -> Category {
        use NodeKind::*;
        match self {
            PriceCross | VolumeSpike | TimeTrigger | RsiSignal | Webhook | EventListener
            | ManualTrigger => Category::Triggers,
            And | Or | Compare | Threshold | If | Switch => Category::Conditions,
            Buy | Sell | Cancel | Notify => Category::Actions,
            StopLoss | TakeProfit | PositionSize | MaxTrades => Category::Risk,
        }
    }

    /// The `type` string used in graph definitions
    pub fn type_name(&self) -> &'static str {
        use NodeKind::*;
        match self {
            PriceCross => "price_cross",
            VolumeSpike => "volume_spike",
            TimeTrigger => "time_trigger",
            RsiSignal => "rsi_signal",
            Webhook => "webhook",
            EventListener => "event_listener",
            ManualTrigger => "manual_trigger",
            And => "and",
            Or => "or",
            Compare => "compare",
            Threshold => "threshold",
            If => "if",
            Switch => "switch",
            Buy => "buy",
            Sell => "sell",
            Cancel => "cancel",
            Notify => "notify",
            StopLoss => "stop_loss",
            TakeProfit => "take_profit",
            PositionSize => "position_size",
            MaxTrades => "max_trades",
        }
    }

    /// Run the behavior
    pub async fn execute(
        &self,
        node: &Node,
        input: &Value,
        ctx: &mut NodeContext<'_>,
    ) -> Result<Value, BehaviorError> {
        use NodeKind::*;
        match self {
            PriceCross => triggers::price_cross(node, input),
            VolumeSpike => triggers::volume_spike(node, input),
            TimeTrigger => triggers::time_trigger(node),
            RsiSignal => triggers::rsi_signal(node, input),
            Webhook => triggers::webhook(node, input),
            EventListener => triggers::event_listener(node, input),
            ManualTrigger => triggers::manual_trigger(input),
            And => conditions::all_of(node, input),
            Or => conditions::any_of(node, input),
            Compare => conditions::compare(node, input),
            Threshold => conditions::threshold(node, input),
            If => conditions::if_branch(node, input),
            Switch => conditions::switch_branch(node, input),
            Buy => actions::place_order("buy", node, input, ctx).await,
            Sell => actions::place_order("sell", node, input, ctx).await,
            Cancel => actions::cancel(node, input, ctx).await,
            Notify => actions::notify(node, input, ctx).await,
            StopLoss => risk::stop_loss(node, input),
            TakeProfit => risk::take_profit(node, input),
            PositionSize => risk::position_size(node, input),
            MaxTrades => risk::max_trades(node, ctx),
        }
    }
}

/// Numeric property; `Ok(None)` when absent, null or blank
pub(crate) fn number_prop(node: &Node, key: &str) -> Result<Option<f64>, BehaviorError> {
    match node.property(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(value) => as_number(value)
            .map(Some)
            .ok_or_else(|| BehaviorError::invalid(key, format!("expected a number, got {}", value))),
    }
}

/// Numeric value from the property, falling back to the input field
pub(crate) fn number_from(node: &Node, input: &Value, key: &str) -> Result<Option<f64>, BehaviorError> {
    if let Some(n) = number_prop(node, key)? {
        return Ok(Some(n));
    }
    Ok(input.get(key).and_then(as_number))
}

/// String property; numbers and booleans are rendered as text
pub(crate) fn string_prop(node: &Node, key: &str) -> Option<String> {
    node.property(key).and_then(value_as_string)
}

pub(crate) fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// JSON number from an f64 (NaN and infinities become null)
pub(crate) fn number_value(n: f64) -> Value {
    serde_json::Number::from_f64(n)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

pub(crate) fn timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339())
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_all_kinds_have_unique_keys() {
        let keys: HashSet<_> = NodeKind::ALL
            .iter()
            .map(|k| (k.category(), k.type_name()))
            .collect();
        assert_eq!(keys.len(), NodeKind::ALL.len());
    }

    #[test]
    fn test_number_prop() {
        let node = Node::new("n", Category::Risk, "stop_loss")
            .with_property("a", 2.5)
            .with_property("b", "7")
            .with_property("c", "seven")
            .with_property("d", "");

        assert_eq!(number_prop(&node, "a").unwrap(), Some(2.5));
        assert_eq!(number_prop(&node, "b").unwrap(), Some(7.0));
        assert!(number_prop(&node, "c").is_err());
        assert_eq!(number_prop(&node, "d").unwrap(), None);
        assert_eq!(number_prop(&node, "missing").unwrap(), None);
    }

    #[test]
    fn test_number_from_falls_back_to_input() {
        let node = Node::new("n", Category::Risk, "stop_loss");
        let input = json!({"price": 99});
        assert_eq!(number_from(&node, &input, "price").unwrap(), Some(99.0));
        assert_eq!(number_from(&node, &input, "volume").unwrap(), None);
    }
}
