// SPDX-License-Identifier: MIT

//! Graph model type definitions
//!
//! Graphs are authored externally (usually in a visual editor) and handed to
//! the engine as plain data. Nothing here is mutated during a run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Node category; selects the family of behaviors a node belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Triggers,
    Conditions,
    Actions,
    Risk,
    /// Any category the engine does not know about
    #[serde(untagged)]
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Triggers => "triggers",
            Category::Conditions => "conditions",
            Category::Actions => "actions",
            Category::Risk => "risk",
            Category::Other(name) => name,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named input or output slot on a node
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Port {
    pub name: String,
}

impl Port {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A node in the strategy graph
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique identifier within the graph
    pub id: String,
    /// Display name, defaults to the node type
    #[serde(default)]
    pub name: Option<String>,
    pub category: Category,
    /// Behavior selector within the category
    #[serde(rename = "type")]
    pub node_type: String,
    /// Node configuration; values are primitives
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

impl Node {
    pub fn new(id: impl Into<String>, category: Category, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            category,
            node_type: node_type.into(),
            properties: Map::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.node_type)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    pub fn is_trigger(&self) -> bool {
        self.category == Category::Triggers
    }
}

/// Directed edge from an output slot to an input slot
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from_node_id: String,
    /// Output slot of the source node; drives branch selection
    pub from_output_index: usize,
    pub to_node_id: String,
    #[serde(default)]
    pub to_input_index: usize,
}

impl Connection {
    pub fn new(
        from_node_id: impl Into<String>,
        from_output_index: usize,
        to_node_id: impl Into<String>,
        to_input_index: usize,
    ) -> Self {
        Self {
            from_node_id: from_node_id.into(),
            from_output_index,
            to_node_id: to_node_id.into(),
            to_input_index,
        }
    }
}

/// A complete strategy graph
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Self {
        Self { nodes, connections }
    }

    /// Trigger nodes in graph order
    pub fn trigger_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_trigger())
    }

    /// All connections leaving `node_id`, in insertion order
    pub fn outgoing(&self, node_id: &str) -> impl Iterator<Item = &Connection> + '_ {
        let node_id = node_id.to_string();
        self.connections
            .iter()
            .filter(move |c| c.from_node_id == node_id)
    }

    /// Connections leaving a specific output slot of `node_id`
    pub fn outgoing_from<'a>(
        &'a self,
        node_id: &'a str,
        output_index: usize,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections
            .iter()
            .filter(move |c| c.from_node_id == node_id && c.from_output_index == output_index)
    }

    /// Nodes with no outgoing connections
    pub fn terminal_node_ids(&self) -> HashSet<&str> {
        let with_outgoing: HashSet<&str> = self
            .connections
            .iter()
            .map(|c| c.from_node_id.as_str())
            .collect();
        self.nodes
            .iter()
            .map(|n| n.id.as_str())
            .filter(|id| !with_outgoing.contains(id))
            .collect()
    }

    /// Structural checks; the engine tolerates everything reported here
    pub fn validate(&self) -> GraphReport {
        let mut report = GraphReport::default();

        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.id.as_str()) {
                report.duplicate_ids.push(node.id.clone());
            }
        }

        for conn in &self.connections {
            if !seen.contains(conn.from_node_id.as_str()) || !seen.contains(conn.to_node_id.as_str())
            {
                report.dangling_connections.push(conn.clone());
            }
        }

        report.cycle = self.find_cycle();
        report
    }

    /// Returns the node ids along a cycle if one exists
    ///
    /// Iterative depth-first search; graph depth does not grow the call stack.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        for conn in &self.connections {
            adjacency
                .entry(conn.from_node_id.as_str())
                .or_default()
                .push(conn.to_node_id.as_str());
        }

        // Fully explored nodes; nodes on the current path live in `on_path`
        let mut done: HashSet<&str> = HashSet::new();
        for node in &self.nodes {
            let root = node.id.as_str();
            if done.contains(root) {
                continue;
            }

            // (node, index of the next successor to explore)
            let mut path: Vec<(&str, usize)> = vec![(root, 0)];
            let mut on_path: HashSet<&str> = HashSet::from([root]);

            while let Some(top) = path.len().checked_sub(1) {
                let (id, next_index) = path[top];
                path[top].1 += 1;

                match adjacency.get(id).and_then(|targets| targets.get(next_index)) {
                    Some(&next) if on_path.contains(next) => {
                        let start = path.iter().position(|(p, _)| *p == next).unwrap_or(0);
                        return Some(path[start..].iter().map(|(p, _)| p.to_string()).collect());
                    }
                    Some(&next) => {
                        if !done.contains(next) {
                            on_path.insert(next);
                            path.push((next, 0));
                        }
                    }
                    None => {
                        on_path.remove(id);
                        done.insert(id);
                        path.pop();
                    }
                }
            }
        }
        None
    }

    /// Id-to-node lookup; the first node wins when ids are duplicated
    pub fn node_index(&self) -> HashMap<&str, &Node> {
        let mut index = HashMap::with_capacity(self.nodes.len());
        for node in &self.nodes {
            index.entry(node.id.as_str()).or_insert(node);
        }
        index
    }
}

/// Result of `Graph::validate`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphReport {
    pub duplicate_ids: Vec<String>,
    pub dangling_connections: Vec<Connection>,
    pub cycle: Option<Vec<String>>,
}

impl GraphReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_ids.is_empty() && self.dangling_connections.is_empty() && self.cycle.is_none()
    }

    /// Human-readable warnings
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for id in &self.duplicate_ids {
            warnings.push(format!("duplicate node id '{}'", id));
        }
        for conn in &self.dangling_connections {
            warnings.push(format!(
                "dangling connection {}[{}] -> {}[{}]",
                conn.from_node_id, conn.from_output_index, conn.to_node_id, conn.to_input_index
            ));
        }
        if let Some(cycle) = &self.cycle {
            warnings.push(format!("cycle through {}", cycle.join(" -> ")));
        }
        warnings
    }
}
