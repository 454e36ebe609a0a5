// SPDX-License-Identifier: MIT

//! Engine configuration
//!
//! Configuration can be embedded in YAML/JSON (all fields optional) or read
//! from `STRATEGY_FLOW_*` environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of executions kept in history
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default cap on node executions per run of a cyclic graph
pub const DEFAULT_MAX_NODE_EXECUTIONS: usize = 1000;

/// Upper bound for the cosmetic pacing delay
pub const MAX_PACING_DELAY_MS: u64 = 2000;

/// Tunables for a `WorkflowEngine`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Soft limit on run duration; exceeding it stops further scheduling
    pub max_run_duration_ms: Option<u64>,
    /// Delay after "node active" notifications, only applied when a hook is set
    pub pacing_delay_ms: u64,
    /// Number of executions retained in history
    pub history_capacity: usize,
    /// Cap on node executions per run, enforced for cyclic graphs only
    pub max_node_executions: usize,
    /// Verbose tracing of node inputs and outputs
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_run_duration_ms: None,
            pacing_delay_ms: 0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            max_node_executions: DEFAULT_MAX_NODE_EXECUTIONS,
            debug: false,
        }
    }
}

impl EngineConfig {
    /// Build a config from `STRATEGY_FLOW_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "STRATEGY_FLOW_MAX_RUN_MS") {
            config.max_run_duration_ms = Some(ms);
        }
        if let Some(ms) = parse_var::<u64>(&lookup, "STRATEGY_FLOW_PACING_MS") {
            config.pacing_delay_ms = ms;
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, "STRATEGY_FLOW_HISTORY_CAPACITY") {
            config.history_capacity = capacity;
        }
        if let Some(limit) = parse_var::<usize>(&lookup, "STRATEGY_FLOW_MAX_NODE_EXECUTIONS") {
            config.max_node_executions = limit;
        }
        if let Some(debug) = parse_var::<bool>(&lookup, "STRATEGY_FLOW_DEBUG") {
            config.debug = debug;
        }

        config
    }

    /// Pacing delay clamped to `MAX_PACING_DELAY_MS`
    pub fn pacing_delay(&self) -> Option<Duration> {
        match self.pacing_delay_ms.min(MAX_PACING_DELAY_MS) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    pub fn max_run_duration(&self) -> Option<Duration> {
        self.max_run_duration_ms.map(Duration::from_millis)
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring invalid value for {}: '{}'", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.max_node_executions, 1000);
        assert!(config.max_run_duration().is_none());
        assert!(config.pacing_delay().is_none());
        assert!(!config.debug);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STRATEGY_FLOW_MAX_RUN_MS", "2500"),
            ("STRATEGY_FLOW_PACING_MS", "120"),
            ("STRATEGY_FLOW_DEBUG", "true"),
        ]);
        let config = EngineConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.max_run_duration_ms, Some(2500));
        assert_eq!(config.pacing_delay(), Some(Duration::from_millis(120)));
        assert!(config.debug);
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = EngineConfig::from_lookup(|k| match k {
            "STRATEGY_FLOW_HISTORY_CAPACITY" => Some("lots".to_string()),
            _ => None,
        });
        assert_eq!(config.history_capacity, DEFAULT_HISTORY_CAPACITY);
    }

    #[test]
    fn test_pacing_is_clamped() {
        let config = EngineConfig {
            pacing_delay_ms: 60_000,
            ..Default::default()
        };
        assert_eq!(
            config.pacing_delay(),
            Some(Duration::from_millis(MAX_PACING_DELAY_MS))
        );
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = r#"
maxRunDurationMs: 500
historyCapacity: 5
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.max_run_duration_ms, Some(500));
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.max_node_executions, DEFAULT_MAX_NODE_EXECUTIONS);
    }
}
