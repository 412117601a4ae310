//! Bounded retry decision taken after every Testing stage
//!
//! Rules, evaluated in order:
//! 1. tests passed → Documenting, retries untouched
//! 2. retries left → bump `retries`, back to Coding
//! 3. otherwise → note the exhaustion in `output` and end
//!
//! An unknown result (`tests_passed == None`) counts as a failure.

use super::graph::Router;
use super::stage::{Route, Stage};
use super::state::WorkflowState;
use crate::config::DEFAULT_MAX_RETRIES;

/// Decides where the workflow goes after testing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryController {
    max_retries: u32,
}

impl Default for RetryController {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

impl RetryController {
    /// Create a controller allowing `max_retries` trips back to Coding
    pub fn new(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// The configured limit
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Message appended to `output` when retries run out
    pub fn exhausted_message(&self) -> String {
        format!(" | Max retries ({}) reached.", self.max_retries)
    }

    /// Pick the next route, updating `retries` or `output` in place
    pub fn decide(&self, state: &mut WorkflowState) -> Route {
        if state.tests_passed == Some(true) {
            tracing::info!(retries = state.retries, "Tests passed, moving to documentation");
            return Route::To(Stage::Documenting);
        }

        if state.retries < self.max_retries {
            state.retries += 1;
            tracing::info!(
                retries = state.retries,
                max_retries = self.max_retries,
                tests_passed = ?state.tests_passed,
                "Tests not passing, retrying implementation"
            );
            return Route::To(Stage::Coding);
        }

        tracing::warn!(max_retries = self.max_retries, "Max retries reached, stopping");
        state.output.push_str(&self.exhausted_message());
        Route::End
    }
}

impl Router for RetryController {
    fn route(&self, state: &mut WorkflowState) -> Route {
        self.decide(state)
    }

    fn targets(&self) -> Vec<Route> {
        vec![Route::To(Stage::Documenting), Route::To(Stage::Coding), Route::End]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_state() -> WorkflowState {
        let mut state = WorkflowState::new("p", "f");
        state.tests_passed = Some(false);
        state
    }

    #[test]
    fn test_success_goes_to_documenting() {
        let controller = RetryController::default();
        for retries in 0..=controller.max_retries() {
            let mut state = WorkflowState::new("p", "f");
            state.tests_passed = Some(true);
            state.retries = retries;
            assert_eq!(controller.decide(&mut state), Route::To(Stage::Documenting));
            assert_eq!(state.retries, retries);
            assert!(state.output.is_empty());
        }
    }

    #[test]
    fn test_failure_retries_then_terminates() {
        let controller = RetryController::default();
        let mut state = failing_state();

        for expected in 1..=5 {
            let before = state.retries;
            assert_eq!(controller.decide(&mut state), Route::To(Stage::Coding));
            assert_eq!(state.retries, before + 1);
            assert_eq!(state.retries, expected);
        }

        assert_eq!(controller.decide(&mut state), Route::End);
        assert_eq!(state.retries, 5);
        assert!(state.output.contains("Max retries (5) reached."));
    }

    #[test]
    fn test_exhaustion_message_appended_to_existing_output() {
        let controller = RetryController::new(0);
        let mut state = failing_state();
        state.output = "TesterAgent: 1 failed".to_string();

        assert_eq!(controller.decide(&mut state), Route::End);
        assert_eq!(state.output, "TesterAgent: 1 failed | Max retries (0) reached.");
    }

    #[test]
    fn test_exhaustion_message_on_empty_output() {
        let controller = RetryController::new(2);
        let mut state = failing_state();
        state.retries = 2;

        assert_eq!(controller.decide(&mut state), Route::End);
        assert_eq!(state.output, " | Max retries (2) reached.");
    }

    #[test]
    fn test_unknown_result_counts_as_failure() {
        let controller = RetryController::new(1);
        let mut state = WorkflowState::new("p", "f");
        assert_eq!(state.tests_passed, None);

        assert_eq!(controller.decide(&mut state), Route::To(Stage::Coding));
        assert_eq!(state.retries, 1);
        assert_eq!(controller.decide(&mut state), Route::End);
    }

    #[test]
    fn test_success_after_exhausted_retries() {
        let controller = RetryController::new(3);
        let mut state = failing_state();
        state.retries = 3;
        state.tests_passed = Some(true);
        assert_eq!(controller.decide(&mut state), Route::To(Stage::Documenting));
    }

    #[test]
    fn test_retries_never_decrease() {
        let controller = RetryController::new(4);
        let mut state = failing_state();
        let mut last = state.retries;
        for _ in 0..10 {
            controller.decide(&mut state);
            assert!(state.retries >= last);
            assert!(state.retries <= controller.max_retries());
            last = state.retries;
        }
    }
}
