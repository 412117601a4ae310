//! State threaded through every stage of a workflow run

use serde::{Deserialize, Serialize};

use super::stage::{Route, Stage};

/// Separator between segments of the output log
pub const OUTPUT_SEPARATOR: &str = " | ";

/// A transition taken by the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Stage that just finished
    pub from: Stage,
    /// Where the graph went next
    pub to: Route,
    /// Retry count after the transition was decided
    pub retries: u32,
}

/// Workflow state for one invocation
///
/// Owned by the running graph and lent to one stage (or router) at a time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Free text description of the problem
    pub problem: String,
    /// Name of the function to implement
    pub func_name: String,
    /// Number of times the coder was sent back after failing tests
    #[serde(default)]
    pub retries: u32,
    /// Outcome of the last Testing stage; `None` when unknown
    #[serde(default)]
    pub tests_passed: Option<bool>,
    /// Accumulated human-readable log
    #[serde(default)]
    pub output: String,
    /// Latest cleaned implementation
    #[serde(default)]
    pub code: Option<String>,
    /// Latest cleaned tests
    #[serde(default)]
    pub tests: Option<String>,
    /// Report from the last Testing stage
    #[serde(default)]
    pub test_report: Option<String>,
    /// Documentation produced by the Documenting stage
    #[serde(default)]
    pub documentation: Option<String>,
    /// Transitions taken so far, in order
    #[serde(default)]
    pub history: Vec<StageTransition>,
}

impl WorkflowState {
    /// Create the initial state for a problem
    pub fn new(problem: impl Into<String>, func_name: impl Into<String>) -> Self {
        Self {
            problem: problem.into(),
            func_name: func_name.into(),
            ..Default::default()
        }
    }

    /// Append a segment to the output log
    pub fn log(&mut self, segment: impl AsRef<str>) {
        if !self.output.is_empty() {
            self.output.push_str(OUTPUT_SEPARATOR);
        }
        self.output.push_str(segment.as_ref());
    }

    /// Whether the last Testing stage reported success
    pub fn succeeded(&self) -> bool {
        self.tests_passed == Some(true)
    }

    /// Stages run so far, in order
    pub fn visited(&self) -> Vec<Stage> {
        self.history.iter().map(|t| t.from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_defaults() {
        let state = WorkflowState::new("Implement gcd", "gcd");
        assert_eq!(state.problem, "Implement gcd");
        assert_eq!(state.func_name, "gcd");
        assert_eq!(state.retries, 0);
        assert_eq!(state.tests_passed, None);
        assert!(state.output.is_empty());
        assert!(!state.succeeded());
    }

    #[test]
    fn test_log_joins_segments() {
        let mut state = WorkflowState::new("p", "f");
        state.log("CoderAgent: wrote f");
        state.log("TesterAgent: 3 passed");
        assert_eq!(state.output, "CoderAgent: wrote f | TesterAgent: 3 passed");
    }

    #[test]
    fn test_deserialize_minimal_state() {
        let state: WorkflowState =
            serde_json::from_str(r#"{"problem":"p","func_name":"f"}"#).unwrap();
        assert_eq!(state, WorkflowState::new("p", "f"));
    }
}
