// SPDX-License-Identifier: MIT

//! Execution records and bounded run history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

use crate::runtime::config::DEFAULT_HISTORY_CAPACITY;
use crate::strategy::workflow::graph::Node;

/// Lifecycle status of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Error,
    /// Abandoned after `stop()`
    Stopped,
}

/// Outcome of one node execution
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeResult {
    pub node_id: String,
    pub node_name: String,
    pub node_type: String,
    pub input: Value,
    pub output: Value,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

/// A failure recorded during a run
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeError {
    pub node_id: String,
    pub node_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Record of one engine invocation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<f64>,
    pub status: ExecutionStatus,
    pub trigger_payload: Value,
    pub results: Vec<NodeResult>,
    pub errors: Vec<NodeError>,
    /// Terminal error message when the run did not complete
    pub error: Option<String>,
    /// Latest output per node at the end of the run
    #[serde(default)]
    pub node_outputs: BTreeMap<String, Value>,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    /// Outputs of executed nodes that have no outgoing connections
    #[serde(default)]
    pub final_outputs: BTreeMap<String, Value>,
}

impl Execution {
    pub fn new(trigger_payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            ended_at: None,
            duration_ms: None,
            status: ExecutionStatus::Running,
            trigger_payload,
            results: Vec::new(),
            errors: Vec::new(),
            error: None,
            node_outputs: BTreeMap::new(),
            variables: BTreeMap::new(),
            final_outputs: BTreeMap::new(),
        }
    }

    pub fn record_result(&mut self, node: &Node, input: Value, output: Value, elapsed: Duration) {
        self.results.push(NodeResult {
            node_id: node.id.clone(),
            node_name: node.display_name().to_string(),
            node_type: node.node_type.clone(),
            input,
            output,
            duration_ms: elapsed.as_secs_f64() * 1000.0,
            timestamp: Utc::now(),
        });
    }

    pub fn record_error(&mut self, node_id: &str, node_name: &str, message: impl Into<String>) {
        self.errors.push(NodeError {
            node_id: node_id.to_string(),
            node_name: node_name.to_string(),
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// Stamp the end of the run
    pub fn finish(&mut self, status: ExecutionStatus, error: Option<String>) {
        let ended_at = Utc::now();
        self.duration_ms = Some(
            (ended_at - self.started_at)
                .to_std()
                .map(|d| d.as_secs_f64() * 1000.0)
                .unwrap_or(0.0),
        );
        self.ended_at = Some(ended_at);
        self.status = status;
        self.error = error;
    }

    /// Results for a node, in execution order
    pub fn results_for<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a NodeResult> {
        self.results.iter().filter(move |r| r.node_id == node_id)
    }

    /// Node ids in the order they executed
    pub fn executed_node_ids(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.node_id.as_str()).collect()
    }
}

/// Fixed-capacity ring buffer of finished executions
///
/// Slots are allocated once; when full, the oldest entry is overwritten.
#[derive(Debug, Clone)]
pub struct ExecutionHistory {
    slots: Vec<Option<Execution>>,
    /// Index the next push writes to
    head: usize,
    len: usize,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append, evicting the oldest entry when at capacity
    pub fn push(&mut self, execution: Execution) {
        let capacity = self.capacity();
        self.slots[self.head] = Some(execution);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
    }

    /// Executions from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Execution> {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |i| self.slots[(start + i) % capacity].as_ref())
    }

    pub fn to_vec(&self) -> Vec<Execution> {
        self.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }

    pub fn statistics(&self) -> ExecutionStats {
        let mut stats = ExecutionStats::default();
        let mut total_duration = 0.0;

        for execution in self.iter() {
            stats.total_executions += 1;
            match execution.status {
                ExecutionStatus::Completed => stats.successful_executions += 1,
                ExecutionStatus::Error => stats.failed_executions += 1,
                ExecutionStatus::Stopped => stats.stopped_executions += 1,
                ExecutionStatus::Running => {}
            }
            total_duration += execution.duration_ms.unwrap_or(0.0);
        }

        if stats.total_executions > 0 {
            let total = stats.total_executions as f64;
            stats.success_rate = stats.successful_executions as f64 / total;
            stats.avg_duration_ms = total_duration / total;
        }
        stats
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

/// Aggregates over the retained history
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionStats {
    pub total_executions: usize,
    pub successful_executions: usize,
    pub failed_executions: usize,
    pub stopped_executions: usize,
    pub success_rate: f64,
    pub avg_duration_ms: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::workflow::graph::Category;
    use serde_json::json;

    fn finished(status: ExecutionStatus) -> Execution {
        let mut execution = Execution::new(json!({}));
        execution.finish(status, None);
        execution
    }

    #[test]
    fn test_record_result_uses_display_name() {
        let node = Node::new("b1", Category::Actions, "buy").with_name("Buy BTC");
        let mut execution = Execution::new(json!({"price": 1}));
        execution.record_result(
            &node,
            json!({}),
            json!({"executed": true}),
            Duration::from_millis(3),
        );

        let result = &execution.results[0];
        assert_eq!(result.node_name, "Buy BTC");
        assert_eq!(result.node_type, "buy");
        assert!(result.duration_ms >= 3.0);
        assert_eq!(execution.executed_node_ids(), vec!["b1"]);
    }

    #[test]
    fn test_finish_stamps_end() {
        let mut execution = Execution::new(json!({}));
        assert_eq!(execution.status, ExecutionStatus::Running);
        execution.finish(ExecutionStatus::Error, Some("boom".to_string()));

        assert_eq!(execution.status, ExecutionStatus::Error);
        assert!(execution.ended_at.is_some());
        assert!(execution.duration_ms.is_some());
        assert_eq!(execution.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_serializes_camel_case() {
        let execution = finished(ExecutionStatus::Completed);
        let value = serde_json::to_value(&execution).unwrap();
        assert_eq!(value["status"], "completed");
        assert!(value.get("triggerPayload").is_some());
        assert!(value.get("startedAt").is_some());
    }

    #[test]
    fn test_ring_buffer_evicts_oldest() {
        let mut history = ExecutionHistory::new(3);
        let runs: Vec<_> = (0..5).map(|_| finished(ExecutionStatus::Completed)).collect();
        for run in &runs {
            history.push(run.clone());
        }

        assert_eq!(history.len(), 3);
        let ids: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![runs[2].id, runs[3].id, runs[4].id]);
        assert!(history.iter().all(|e| e.id != runs[0].id));
    }

    #[test]
    fn test_partial_fill_keeps_order() {
        let mut history = ExecutionHistory::new(4);
        let a = finished(ExecutionStatus::Completed);
        let b = finished(ExecutionStatus::Error);
        history.push(a.clone());
        history.push(b.clone());

        let ids: Vec<_> = history.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![a.id, b.id]);
    }

    #[test]
    fn test_clear() {
        let mut history = ExecutionHistory::default();
        history.push(finished(ExecutionStatus::Completed));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.capacity(), DEFAULT_HISTORY_CAPACITY);
        assert_eq!(history.iter().count(), 0);
    }

    #[test]
    fn test_statistics() {
        let mut history = ExecutionHistory::new(10);
        assert_eq!(history.statistics(), ExecutionStats::default());

        history.push(finished(ExecutionStatus::Completed));
        history.push(finished(ExecutionStatus::Completed));
        history.push(finished(ExecutionStatus::Error));
        history.push(finished(ExecutionStatus::Stopped));

        let stats = history.statistics();
        assert_eq!(stats.total_executions, 4);
        assert_eq!(stats.successful_executions, 2);
        assert_eq!(stats.failed_executions, 1);
        assert_eq!(stats.stopped_executions, 1);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
    }
}
