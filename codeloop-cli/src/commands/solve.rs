//! Solve command - Run the coder/tester loop on a problem
//!
//! Stages:
//! 1. Coding: the coder agent writes the function
//! 2. TestGenerating: the test generator agent writes pytest tests
//! 3. Testing: the tests are judged (pytest or the tester agent)
//! 4. Documenting: the doc agent documents a passing implementation
//!
//! Failing tests send the run back to Coding until retries run out.

use std::path::{Path, PathBuf};

use clap::Args;
use codeloop_core::stages::CoderStage;
use codeloop_core::workflow::{CompiledWorkflow, Edge, Route, SOLUTION_FILE, TEST_FILE};
use codeloop_core::{
    standard_handlers, AgentFactory, Config, RetryController, WorkflowGraph, WorkflowState,
};

/// File the documentation is written to
const DOC_FILE: &str = "README.md";

/// Arguments for the solve command
#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Problem statement for the coder
    #[arg(required = true)]
    pub problem: String,

    /// Name of the function to implement
    #[arg(long)]
    pub func_name: String,

    /// Working directory for the agents (defaults to current directory)
    #[arg(short = 'd', long, default_value = ".")]
    pub workdir: PathBuf,

    /// Directory to write solution.py, test_solution.py and README.md into
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print the final state as JSON
    #[arg(long)]
    pub json: bool,

    /// Dry run - show the workflow and first prompt without running agents
    #[arg(long)]
    pub dry_run: bool,
}

impl SolveArgs {
    /// Execute the solve command
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        // Resolve to absolute path
        let workdir = if self.workdir.is_absolute() {
            self.workdir.clone()
        } else {
            std::env::current_dir()?.join(&self.workdir)
        };

        if verbose {
            tracing::info!(
                func_name = %self.func_name,
                workdir = %workdir.display(),
                max_retries = config.workflow.max_retries,
                tester = ?config.workflow.tester,
                "Starting solve"
            );
        }

        let factory = AgentFactory::with_config(&config.agent, &workdir);
        let controller = RetryController::new(config.workflow.max_retries);
        let workflow =
            WorkflowGraph::standard(standard_handlers(&factory, &config.workflow), controller)?;
        let state = WorkflowState::new(&self.problem, &self.func_name);

        if !self.json {
            println!("Codeloop Solve");
            println!("==============");
            println!();
            println!("Function: {}", self.func_name);
            println!("Backend: {}", factory.backend_name());
            println!("Tester: {:?}", config.workflow.tester);
            println!("Max retries: {}", controller.max_retries());
            if let Some(ref model) = config.agent.model {
                println!("Model: {}", model);
            }
            println!();
        }

        if self.dry_run {
            show_plan(&workflow, &state);
            return Ok(());
        }

        let state = workflow.invoke(state).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&state)?);
        } else {
            show_state(&state);
        }

        if let Some(ref out) = self.out {
            for path in write_artifacts(out, &state)? {
                if !self.json {
                    println!("Wrote {}", path.display());
                }
            }
        }

        if !state.succeeded() {
            anyhow::bail!(
                "{} did not pass its tests after {} retries",
                self.func_name,
                state.retries
            );
        }

        Ok(())
    }
}

fn show_plan(workflow: &CompiledWorkflow, state: &WorkflowState) {
    println!("[Dry run] Would run the following workflow:");
    println!();
    println!("Entry: {}", workflow.entry());
    for (stage, edge) in workflow.edges() {
        let targets = match edge {
            Edge::Fixed(route) => route.to_string(),
            Edge::Conditional(router) => router
                .targets()
                .iter()
                .map(Route::to_string)
                .collect::<Vec<_>>()
                .join(" | "),
        };
        println!("  {} ({}) -> {}", stage, stage.description(), targets);
    }
    println!();
    println!("First prompt ({}):", workflow.entry().label());
    println!("{}", CoderStage::prompt(state));
}

fn show_state(state: &WorkflowState) {
    let verdict = match state.tests_passed {
        Some(true) => "passed",
        Some(false) => "failed",
        None => "unknown",
    };

    println!("Retries: {}", state.retries);
    println!("Tests: {}", verdict);
    println!("Output: {}", state.output);

    if let Some(ref code) = state.code {
        println!();
        println!("--- {} ---", SOLUTION_FILE);
        println!("{}", code);
    }
    if let Some(ref tests) = state.tests {
        println!();
        println!("--- {} ---", TEST_FILE);
        println!("{}", tests);
    }
    if let Some(ref docs) = state.documentation {
        println!();
        println!("--- {} ---", DOC_FILE);
        println!("{}", docs);
    }
    println!();
}

/// Write whichever artifacts the run produced into `dir`
fn write_artifacts(dir: &Path, state: &WorkflowState) -> std::io::Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let artifacts = [
        (SOLUTION_FILE, &state.code),
        (TEST_FILE, &state.tests),
        (DOC_FILE, &state.documentation),
    ];

    let mut written = Vec::new();
    for (name, content) in artifacts {
        if let Some(content) = content {
            let path = dir.join(name);
            std::fs::write(&path, format!("{}\n", content))?;
            written.push(path);
        }
    }
    Ok(written)
}
