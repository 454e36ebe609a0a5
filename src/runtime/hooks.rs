// SPDX-License-Identifier: MIT

//! Visualization hook interface
//!
//! A hook receives two notifications per node execution so that an editor can
//! highlight the active node and animate data flowing along connections.

use async_trait::async_trait;

use crate::strategy::workflow::graph::Connection;

/// Callbacks invoked by the engine around every node execution
#[async_trait]
pub trait VisualizationHook: Send + Sync {
    /// The node is about to execute
    async fn on_node_active(&self, node_id: &str);

    /// The node finished; `outgoing` holds the connections data will flow along
    async fn on_node_finished(&self, node_id: &str, outgoing: &[Connection]);
}
