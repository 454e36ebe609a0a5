// SPDX-License-Identifier: MIT

//! Run-scoped state storage

use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// State owned by a single workflow run
///
/// Holds the latest output of every executed node and the free-form
/// variables node behaviors share (for example the trade counter). A new
/// instance is created for every run, so nothing leaks between runs.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    node_outputs: HashMap<String, Value>,
    variables: HashMap<String, Value>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node's output, replacing any earlier output of the same node
    pub fn set_output(&mut self, node_id: &str, output: Value) {
        self.node_outputs.insert(node_id.to_string(), output);
    }

    pub fn output(&self, node_id: &str) -> Option<&Value> {
        self.node_outputs.get(node_id)
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// Sorted copy of node outputs
    pub fn outputs_snapshot(&self) -> BTreeMap<String, Value> {
        self.node_outputs
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Sorted copy of variables
    pub fn variables_snapshot(&self) -> BTreeMap<String, Value> {
        self.variables
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
