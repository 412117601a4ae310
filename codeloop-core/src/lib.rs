//! Codeloop Core - agent workflow that writes, tests and documents a Python function
//!
//! A coder agent implements a function from a problem statement, a test
//! generator agent writes pytest tests for it, and the tests are judged.
//! Failures loop back to the coder a bounded number of times; a passing
//! implementation is handed to a doc agent.

pub mod agent;
pub mod code;
pub mod config;
pub mod error;
pub mod stages;
pub mod workflow;

pub use agent::{AgentFactory, AgentType, Backend, TypedAgent};
pub use config::{Config, TesterMode};
pub use error::{Error, Result};
pub use stages::standard_handlers;
pub use workflow::{CompiledWorkflow, RetryController, Stage, WorkflowGraph, WorkflowState};
