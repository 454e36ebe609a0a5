// SPDX-License-Identifier: MIT

//! Graph loader - YAML/JSON file loading and parsing
//!
//! Graphs exported by the strategy editor are JSON; hand-written graphs are
//! usually YAML. The file extension picks the parser, YAML being the default.

use std::fs;
use std::path::Path;

use crate::runtime::config::EngineConfig;
use crate::runtime::error::LoaderError;
use crate::strategy::workflow::graph::Graph;

/// Loads strategy graphs and engine settings from files
pub struct GraphLoader;

impl GraphLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a graph from a `.json`, `.yaml` or `.yml` file
    pub fn load_graph<P: AsRef<Path>>(&self, path: P) -> Result<Graph, LoaderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let graph = if is_json(path) {
            Self::parse_json(&content)?
        } else {
            Self::parse_yaml(&content)?
        };
        log::info!(
            "Loaded graph from {}: {} nodes, {} connections",
            path.display(),
            graph.nodes.len(),
            graph.connections.len()
        );
        Ok(graph)
    }

    /// Load engine settings from a YAML (or JSON) file
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<EngineConfig, LoaderError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        if is_json(path) {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Parse a graph from a YAML string
    pub fn parse_yaml(content: &str) -> Result<Graph, LoaderError> {
        let graph: Graph = serde_yaml::from_str(content)?;
        Ok(graph)
    }

    /// Parse a graph from a JSON string
    pub fn parse_json(content: &str) -> Result<Graph, LoaderError> {
        let graph: Graph = serde_json::from_str(content)?;
        Ok(graph)
    }
}

impl Default for GraphLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
