//! Workflow stages and routes between them

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::agent::AgentType;

/// One named processing step of the workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Generate (or regenerate) the implementation
    Coding,
    /// Generate tests for the implementation
    TestGenerating,
    /// Decide whether the implementation passes its tests
    Testing,
    /// Document the passing implementation
    Documenting,
}

impl Stage {
    /// All stages in their nominal order
    pub fn all() -> &'static [Stage] {
        &[
            Stage::Coding,
            Stage::TestGenerating,
            Stage::Testing,
            Stage::Documenting,
        ]
    }

    /// Node label used in logs and the output field
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Coding => "CoderAgent",
            Stage::TestGenerating => "TestGeneratorAgent",
            Stage::Testing => "TesterAgent",
            Stage::Documenting => "DocAgent",
        }
    }

    /// The agent responsible for this stage
    pub fn agent_type(&self) -> AgentType {
        match self {
            Stage::Coding => AgentType::Coder,
            Stage::TestGenerating => AgentType::TestGenerator,
            Stage::Testing => AgentType::Tester,
            Stage::Documenting => AgentType::Doc,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Stage::Coding => "Writing the implementation",
            Stage::TestGenerating => "Writing tests",
            Stage::Testing => "Running tests",
            Stage::Documenting => "Writing documentation",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Destination of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Continue with a stage
    To(Stage),
    /// Stop the workflow
    End,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::To(stage) => write!(f, "{}", stage),
            Route::End => write!(f, "END"),
        }
    }
}
