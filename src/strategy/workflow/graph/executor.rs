// SPDX-License-Identifier: MIT

//! Graph workflow executor
//!
//! Walks a strategy graph depth-first from its trigger nodes. Each node's
//! output is recorded before any of its successors start; branch nodes
//! (`if`, `switch`) only follow the connections wired to the selected
//! output index.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use super::types::{Connection, Graph, Node};
use crate::runtime::config::EngineConfig;
use crate::runtime::error::EngineError;
use crate::runtime::hooks::VisualizationHook;
use crate::runtime::sink::{EventLevel, EventSink, LogSink};
use crate::strategy::workflow::history::{
    Execution, ExecutionHistory, ExecutionStats, ExecutionStatus,
};
use crate::strategy::workflow::nodes::{NodeContext, NodeKind};
use crate::strategy::workflow::registry::NodeRegistry;
use crate::strategy::workflow::state::RunState;

/// Engine lifecycle; only one run may be `Running` at a time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EngineState {
    Idle = 0,
    Running = 1,
    Completed = 2,
    Errored = 3,
    Stopped = 4,
}

impl EngineState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EngineState::Running,
            2 => EngineState::Completed,
            3 => EngineState::Errored,
            4 => EngineState::Stopped,
            _ => EngineState::Idle,
        }
    }
}

/// Holds the `Running` state; leaving scope always releases it
struct RunGuard<'a> {
    state: &'a AtomicU8,
    release_to: EngineState,
}

impl<'a> RunGuard<'a> {
    fn acquire(state: &'a AtomicU8) -> Result<Self, EngineError> {
        let mut current = state.load(Ordering::SeqCst);
        loop {
            if current == EngineState::Running as u8 {
                return Err(EngineError::AlreadyRunning);
            }
            match state.compare_exchange(
                current,
                EngineState::Running as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => {
                    return Ok(Self {
                        state,
                        release_to: EngineState::from_u8(current),
                    })
                }
                Err(actual) => current = actual,
            }
        }
    }

    fn finish(mut self, terminal: EngineState) {
        self.release_to = terminal;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.release_to as u8, Ordering::SeqCst);
    }
}

/// Why traversal ended early, and at which node
struct Abort<'g> {
    node: Option<&'g Node>,
    error: EngineError,
}

/// Executes strategy graphs and keeps a bounded history of runs
pub struct WorkflowEngine {
    registry: NodeRegistry,
    config: EngineConfig,
    sink: Arc<dyn EventSink>,
    hook: RwLock<Option<Arc<dyn VisualizationHook>>>,
    history: RwLock<ExecutionHistory>,
    state: AtomicU8,
    stop_requested: AtomicBool,
    debug: AtomicBool,
}

impl WorkflowEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            registry: NodeRegistry::builtin(),
            history: RwLock::new(ExecutionHistory::new(config.history_capacity)),
            debug: AtomicBool::new(config.debug),
            config,
            sink: Arc::new(LogSink),
            hook: RwLock::new(None),
            state: AtomicU8::new(EngineState::Idle as u8),
            stop_requested: AtomicBool::new(false),
        }
    }

    pub fn with_registry(mut self, registry: NodeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn VisualizationHook>) -> Self {
        self.hook = RwLock::new(Some(hook));
        self
    }

    /// Replace or remove the visualization hook for subsequent runs
    pub async fn set_visualization_hook(&self, hook: Option<Arc<dyn VisualizationHook>>) {
        *self.hook.write().await = hook;
    }

    pub fn set_debug_mode(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::SeqCst);
    }

    pub fn debug_mode(&self) -> bool {
        self.debug.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        EngineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }

    /// True once `stop()` was requested, until the next run starts
    pub fn is_stopped(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    /// Request cooperative cancellation of the active run
    ///
    /// The node currently executing still completes; no further nodes are
    /// scheduled afterwards.
    pub fn stop(&self) {
        if !self.is_running() {
            return;
        }
        self.stop_requested.store(true, Ordering::SeqCst);
        self.sink
            .emit(EventLevel::Warning, "Workflow execution stop requested");
    }

    /// Executions from oldest to newest
    pub async fn history(&self) -> Vec<Execution> {
        self.history.read().await.to_vec()
    }

    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }

    pub async fn statistics(&self) -> ExecutionStats {
        self.history.read().await.statistics()
    }

    /// Run `graph` once with `payload` as the input of every trigger node
    ///
    /// Only `AlreadyRunning` and `NoTriggerNodes` are returned as errors;
    /// failures during the run are recorded on the returned `Execution`.
    pub async fn execute(&self, graph: &Graph, payload: Value) -> Result<Execution, EngineError> {
        let guard = RunGuard::acquire(&self.state)?;

        let triggers: Vec<&Node> = graph.trigger_nodes().collect();
        if triggers.is_empty() {
            return Err(EngineError::NoTriggerNodes);
        }

        self.stop_requested.store(false, Ordering::SeqCst);
        let hook = self.hook.read().await.clone();
        let mut execution = Execution::new(payload.clone());
        let mut state = RunState::new();

        let report = graph.validate();
        for warning in report.warnings() {
            log::warn!("Graph warning: {}", warning);
        }
        // Only cyclic graphs are budgeted
        let budget = report
            .cycle
            .is_some()
            .then_some(self.config.max_node_executions);
        self.sink.emit(
            EventLevel::Info,
            &format!(
                "Starting execution {} with {} trigger node(s)",
                execution.id,
                triggers.len()
            ),
        );

        let outcome = self
            .traverse(
                graph,
                &triggers,
                payload,
                &mut execution,
                &mut state,
                hook.as_deref(),
                budget,
            )
            .await;

        execution.node_outputs = state.outputs_snapshot();
        execution.variables = state.variables_snapshot();
        execution.final_outputs = final_outputs(graph, &execution.node_outputs);

        let terminal = match outcome {
            Ok(()) if self.is_stopped() => self.abandon(&mut execution),
            Ok(()) => {
                execution.finish(ExecutionStatus::Completed, None);
                self.sink.emit(
                    EventLevel::Success,
                    &format!(
                        "Execution {} completed: {} node(s) in {:.1}ms",
                        execution.id,
                        execution.results.len(),
                        execution.duration_ms.unwrap_or(0.0)
                    ),
                );
                EngineState::Completed
            }
            Err(Abort {
                error: EngineError::Stopped,
                ..
            }) => self.abandon(&mut execution),
            Err(Abort { node, error }) => {
                let message = error.to_string();
                if let Some(node) = node {
                    execution.record_error(&node.id, node.display_name(), message.clone());
                }
                self.sink.emit(
                    EventLevel::Error,
                    &format!("Execution {} failed: {}", execution.id, message),
                );
                execution.finish(ExecutionStatus::Error, Some(message));
                EngineState::Errored
            }
        };

        self.history.write().await.push(execution.clone());
        guard.finish(terminal);
        Ok(execution)
    }

    fn abandon(&self, execution: &mut Execution) -> EngineState {
        self.sink.emit(
            EventLevel::Warning,
            &format!("Execution {} stopped", execution.id),
        );
        execution.finish(
            ExecutionStatus::Stopped,
            Some(EngineError::Stopped.to_string()),
        );
        EngineState::Stopped
    }

    async fn traverse<'g>(
        &self,
        graph: &'g Graph,
        triggers: &[&'g Node],
        payload: Value,
        execution: &mut Execution,
        state: &mut RunState,
        hook: Option<&dyn VisualizationHook>,
        budget: Option<usize>,
    ) -> Result<(), Abort<'g>> {
        let started = Instant::now();
        let debug = self.debug_mode();
        let nodes = graph.node_index();

        // Depth-first with an explicit stack; reversed pushes keep graph order
        let mut stack: Vec<(&'g Node, Value)> = triggers
            .iter()
            .rev()
            .map(|node| (*node, payload.clone()))
            .collect();
        let mut executed = 0usize;

        while let Some((node, input)) = stack.pop() {
            self.check_schedulable(started, executed, budget)
                .map_err(|error| Abort {
                    node: Some(node),
                    error,
                })?;
            executed += 1;

            if let Some(hook) = hook {
                hook.on_node_active(&node.id).await;
                if let Some(delay) = self.config.pacing_delay() {
                    tokio::time::sleep(delay).await;
                }
            }

            let node_started = Instant::now();
            let result = self.run_node(node, &input, state).await;
            let (kind, output) = match result {
                Ok(done) => done,
                Err(error) => {
                    if let Some(hook) = hook {
                        hook.on_node_finished(&node.id, &[]).await;
                    }
                    return Err(Abort {
                        node: Some(node),
                        error,
                    });
                }
            };

            if debug {
                log::debug!("Node {} input: {}", node.id, input);
                self.sink.emit(
                    EventLevel::Info,
                    &format!("[debug] {} ({}) -> {}", node.id, node.node_type, output),
                );
            }

            execution.record_result(node, input, output.clone(), node_started.elapsed());
            state.set_output(&node.id, output.clone());

            let successors = select_successors(graph, node, kind, &output);
            if let Some(hook) = hook {
                let flowing: Vec<Connection> =
                    successors.iter().map(|(conn, _)| (*conn).clone()).collect();
                hook.on_node_finished(&node.id, &flowing).await;
            }

            for (conn, next_input) in successors.into_iter().rev() {
                match nodes.get(conn.to_node_id.as_str()) {
                    Some(target) => stack.push((*target, next_input)),
                    None => log::warn!(
                        "Skipping connection from {} to missing node {}",
                        conn.from_node_id,
                        conn.to_node_id
                    ),
                }
            }
        }

        Ok(())
    }

    async fn run_node(
        &self,
        node: &Node,
        input: &Value,
        state: &mut RunState,
    ) -> Result<(NodeKind, Value), EngineError> {
        log::info!("Executing node: {} ({}/{})", node.id, node.category, node.node_type);

        let kind = self.registry.resolve(node)?;
        let mut ctx = NodeContext::new(state, self.sink.as_ref());
        let output = kind
            .execute(node, input, &mut ctx)
            .await
            .map_err(|source| EngineError::NodeExecutionFailure {
                node_id: node.id.clone(),
                source,
            })?;

        Ok((kind, output))
    }

    /// Refuse to start another node once stopped, out of time or out of budget
    fn check_schedulable(
        &self,
        started: Instant,
        executed: usize,
        budget: Option<usize>,
    ) -> Result<(), EngineError> {
        if self.is_stopped() {
            return Err(EngineError::Stopped);
        }
        if let Some(limit) = self.config.max_run_duration() {
            if started.elapsed() > limit {
                return Err(EngineError::ExceededMaxDuration {
                    limit_ms: limit.as_millis() as u64,
                });
            }
        }
        if let Some(limit) = budget {
            if executed >= limit {
                return Err(EngineError::NodeBudgetExhausted { limit });
            }
        }
        Ok(())
    }
}

impl Default for WorkflowEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Output index selected by a branch node, if any
fn branch_index(kind: NodeKind, output: &Value) -> Option<usize> {
    let branch = output.get("branch")?.as_str()?;
    match (kind, branch) {
        (NodeKind::If, "true") => Some(0),
        (NodeKind::If, "false") => Some(1),
        (NodeKind::Switch, "case1") => Some(0),
        (NodeKind::Switch, "case2") => Some(1),
        (NodeKind::Switch, "case3") => Some(2),
        (NodeKind::Switch, "default") => Some(3),
        _ => None,
    }
}

/// Connections to follow after `node` produced `output`, with each target's input
fn select_successors<'g>(
    graph: &'g Graph,
    node: &'g Node,
    kind: NodeKind,
    output: &Value,
) -> Vec<(&'g Connection, Value)> {
    match kind {
        NodeKind::If => {
            let Some(index) = branch_index(kind, output) else {
                return Vec::new();
            };
            let path_key = if index == 0 { "truePath" } else { "falsePath" };
            let payload = output.get(path_key).cloned().unwrap_or(Value::Null);
            graph
                .outgoing_from(&node.id, index)
                .map(|conn| (conn, payload.clone()))
                .collect()
        }
        NodeKind::Switch => match branch_index(kind, output) {
            Some(index) => graph
                .outgoing_from(&node.id, index)
                .map(|conn| (conn, output.clone()))
                .collect(),
            None => Vec::new(),
        },
        _ => graph
            .outgoing(&node.id)
            .map(|conn| (conn, output.clone()))
            .collect(),
    }
}

fn final_outputs(graph: &Graph, outputs: &BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let terminals = graph.terminal_node_ids();
    outputs
        .iter()
        .filter(|(id, _)| terminals.contains(id.as_str()))
        .map(|(id, value)| (id.clone(), value.clone()))
        .collect()
}
