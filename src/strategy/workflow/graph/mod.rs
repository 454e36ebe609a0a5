// SPDX-License-Identifier: MIT

//! Graph-based strategy execution
//!
//! This module provides the graph model and the engine that walks it
//! from trigger nodes through conditions, actions and risk controls.

pub mod executor;
pub mod types;

pub use executor::{EngineState, WorkflowEngine};
pub use types::{Category, Connection, Graph, GraphReport, Node, Port};
