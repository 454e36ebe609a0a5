// SPDX-License-Identifier: MIT

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use serde_json::Value;

use strategy_flow::runtime::config::EngineConfig;
use strategy_flow::strategy::workflow::graph::WorkflowEngine;
use strategy_flow::strategy::workflow::history::ExecutionStatus;
use strategy_flow::strategy::workflow::loader::GraphLoader;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a strategy graph once
    Run {
        /// Path to the graph file (YAML or JSON)
        #[arg(short, long)]
        graph: String,

        /// Trigger payload as a JSON document
        #[arg(short, long, default_value = "{}")]
        payload: String,

        /// Engine settings file; overrides STRATEGY_FLOW_* variables
        #[arg(short, long)]
        config: Option<String>,

        /// Trace every node input and output
        #[arg(short, long)]
        debug: bool,
    },
    /// Check a strategy graph without running it
    Validate {
        /// Path to the graph file (YAML or JSON)
        #[arg(short, long)]
        graph: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let loader = GraphLoader::new();

    match args.command {
        Commands::Run {
            graph,
            payload,
            config,
            debug,
        } => {
            let graph = loader
                .load_graph(&graph)
                .with_context(|| format!("Failed to load graph from {}", graph))?;
            let payload: Value =
                serde_json::from_str(&payload).context("Payload is not valid JSON")?;

            let mut engine_config = match config {
                Some(path) => loader
                    .load_config(&path)
                    .with_context(|| format!("Failed to load config from {}", path))?,
                None => EngineConfig::from_env(),
            };
            engine_config.debug |= debug;
            log::info!("Engine config: {:?}", engine_config);

            let engine = WorkflowEngine::new(engine_config);
            let execution = engine.execute(&graph, payload).await?;
            println!("{}", serde_json::to_string_pretty(&execution)?);

            if execution.status != ExecutionStatus::Completed {
                bail!(
                    "Execution {} ended with status {:?}",
                    execution.id,
                    execution.status
                );
            }
        }
        Commands::Validate { graph: path } => {
            let graph = loader
                .load_graph(&path)
                .with_context(|| format!("Failed to load graph from {}", path))?;

            let triggers: Vec<&str> = graph.trigger_nodes().map(|n| n.id.as_str()).collect();
            println!("Graph: {}", path);
            println!("  Nodes: {}", graph.nodes.len());
            println!("  Connections: {}", graph.connections.len());
            println!("  Triggers: {}", triggers.join(", "));

            let report = graph.validate();
            for warning in report.warnings() {
                println!("  Warning: {}", warning);
            }
            if triggers.is_empty() {
                bail!("Graph has no trigger nodes");
            }
            if report.is_clean() {
                println!("  OK");
            }
        }
    }

    Ok(())
}
