//! Agent type definitions for codeloop
//!
//! Each workflow stage is driven by one kind of agent:
//! - Coder: writes the function implementation
//! - TestGenerator: writes pytest tests for the function
//! - Tester: judges whether the implementation passes its tests
//! - Doc: documents the finished function

use serde::{Deserialize, Serialize};
use std::fmt;

/// The type of agent to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    /// Coder agent - writes the implementation
    #[default]
    Coder,
    /// Test generator agent - writes tests for the implementation
    TestGenerator,
    /// Tester agent - decides whether the tests pass
    Tester,
    /// Doc agent - writes documentation
    Doc,
}

impl AgentType {
    /// Get all available agent types
    pub fn all() -> &'static [AgentType] {
        &[
            AgentType::Coder,
            AgentType::TestGenerator,
            AgentType::Tester,
            AgentType::Doc,
        ]
    }

    /// Get the short name for this agent type
    pub fn name(&self) -> &'static str {
        match self {
            AgentType::Coder => "coder",
            AgentType::TestGenerator => "test_generator",
            AgentType::Tester => "tester",
            AgentType::Doc => "doc",
        }
    }

    /// Get a description of what this agent type does
    pub fn description(&self) -> &'static str {
        match self {
            AgentType::Coder => "Writes the requested function",
            AgentType::TestGenerator => "Writes pytest tests for the function",
            AgentType::Tester => "Judges whether the function passes its tests",
            AgentType::Doc => "Documents the finished function",
        }
    }

    /// Whether the reply of this agent is source code to be cleaned
    pub fn produces_code(&self) -> bool {
        matches!(self, AgentType::Coder | AgentType::TestGenerator)
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coder" | "code" | "c" => Ok(AgentType::Coder),
            "test_generator" | "test-generator" | "testgen" | "g" => Ok(AgentType::TestGenerator),
            "tester" | "t" => Ok(AgentType::Tester),
            "doc" | "docs" | "d" => Ok(AgentType::Doc),
            _ => Err(format!("Unknown agent type: {}", s)),
        }
    }
}
