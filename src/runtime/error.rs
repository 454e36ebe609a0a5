// SPDX-License-Identifier: MIT

//! Typed error handling for strategy-flow
//!
//! Errors are split by layer: `EngineError` is what the traversal engine
//! reports, `BehaviorError` is raised by individual node behaviors, and
//! `LoaderError` covers reading graph files.

use thiserror::Error;

use crate::strategy::workflow::condition::ConditionError;

/// Top-level error type for the workflow engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// A run is already active on this engine instance
    #[error("A workflow run is already in progress")]
    AlreadyRunning,

    /// The graph has no node in the `triggers` category
    #[error("Graph contains no trigger nodes")]
    NoTriggerNodes,

    /// No behavior is registered for this category/type pair
    #[error("Unknown node type: {category}/{node_type}")]
    UnknownNodeType { category: String, node_type: String },

    /// A node behavior failed for domain reasons
    #[error("Node '{node_id}' failed: {source}")]
    NodeExecutionFailure {
        node_id: String,
        #[source]
        source: BehaviorError,
    },

    /// The soft run-duration limit was exceeded
    #[error("Run exceeded max duration of {limit_ms}ms")]
    ExceededMaxDuration { limit_ms: u64 },

    /// The run was abandoned after `stop()` was requested
    #[error("Run stopped by request")]
    Stopped,

    /// Too many node executions in a single run (usually a cyclic graph)
    #[error("Node execution budget of {limit} exhausted")]
    NodeBudgetExhausted { limit: usize },
}

impl EngineError {
    pub fn unknown_node_type(category: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            category: category.into(),
            node_type: node_type.into(),
        }
    }
}

/// Errors raised by node behaviors
#[derive(Debug, Error)]
pub enum BehaviorError {
    /// A property is present but malformed
    #[error("Invalid property '{name}': {reason}")]
    InvalidProperty { name: String, reason: String },

    /// A required value was found neither in properties nor in the input
    #[error("Missing value '{0}'")]
    MissingValue(String),

    /// The `if` node condition could not be parsed
    #[error(transparent)]
    Condition(#[from] ConditionError),
}

impl BehaviorError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingValue(name.into())
    }
}

/// Errors raised while loading graph definitions
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::unknown_node_type("actions", "teleport");
        assert_eq!(err.to_string(), "Unknown node type: actions/teleport");

        let err = EngineError::NodeExecutionFailure {
            node_id: "buy-1".to_string(),
            source: BehaviorError::invalid("amount", "must be positive"),
        };
        assert_eq!(
            err.to_string(),
            "Node 'buy-1' failed: Invalid property 'amount': must be positive"
        );
    }
}
