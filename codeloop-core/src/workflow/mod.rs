//! Workflow module: the stage graph and its retry loop
//!
//! The standard workflow runs Coding → TestGenerating → Testing, then lets a
//! [`RetryController`] send it back to Coding, on to Documenting, or to the end.

mod graph;
mod retry;
mod stage;
mod state;
mod test_runner;

pub use graph::{
    CompiledWorkflow, Edge, Router, StageHandler, StageHandlers, WorkflowGraph,
};
pub use retry::RetryController;
pub use stage::{Route, Stage};
pub use state::{StageTransition, WorkflowState, OUTPUT_SEPARATOR};
pub use test_runner::{write_sources, TestResults, TestRunner, SOLUTION_FILE, TEST_FILE};
