//! Testing stage: decide whether the implementation passes its tests
//!
//! Sets `tests_passed` to `Some(true)`, `Some(false)`, or `None` when the
//! outcome could not be determined.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::agent::{AgentType, PromptBuilder, TypedAgent};
use crate::code::has_function;
use crate::workflow::{Stage, StageHandler, TestRunner, WorkflowState};
use crate::Result;

/// Lines of pytest output kept in the report handed back to the coder
const REPORT_OUTPUT_LINES: usize = 40;

fn missing_function(state: &WorkflowState) -> bool {
    !has_function(state.code.as_deref().unwrap_or_default(), &state.func_name)
}

fn record(state: &mut WorkflowState, passed: Option<bool>, report: String, summary: &str) {
    state.tests_passed = passed;
    state.test_report = Some(report);
    state.log(format!("{}: {}", Stage::Testing.label(), summary));
}

/// Executes the generated tests with pytest
#[derive(Debug, Clone)]
pub struct PytestTester {
    runner: TestRunner,
}

impl PytestTester {
    pub fn new(runner: TestRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl StageHandler for PytestTester {
    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if missing_function(state) {
            let summary = format!("implementation does not define {}", state.func_name);
            record(state, Some(false), summary.clone(), &summary);
            return Ok(());
        }

        let code = state.code.as_deref().unwrap_or_default();
        let tests = state.tests.as_deref().unwrap_or_default();
        let results = self.runner.run(code, tests).await?;

        tracing::info!(summary = %results.summary(), "Tests finished");
        let summary = results.summary();
        record(
            state,
            results.verdict(),
            results.report(REPORT_OUTPUT_LINES),
            &summary,
        );
        Ok(())
    }
}

fn verdict_pattern() -> &'static Regex {
    static VERDICT: OnceLock<Regex> = OnceLock::new();
    VERDICT.get_or_init(|| {
        Regex::new(r"(?im)^\W*VERDICT\W*:?\W*(PASS|FAIL)\b").expect("verdict pattern is valid")
    })
}

/// Last `VERDICT: PASS|FAIL` line of a tester reply
pub fn parse_verdict(reply: &str) -> Option<bool> {
    verdict_pattern()
        .captures_iter(reply)
        .last()
        .map(|caps| caps[1].eq_ignore_ascii_case("PASS"))
}

/// Asks the tester agent to judge the tests
#[derive(Debug, Clone)]
pub struct ModelTester {
    agent: TypedAgent,
}

impl ModelTester {
    pub fn new(agent: TypedAgent) -> Self {
        debug_assert_eq!(agent.agent_type(), AgentType::Tester);
        Self { agent }
    }

    pub fn prompt(state: &WorkflowState) -> String {
        PromptBuilder::new(AgentType::Tester)
            .problem(&state.problem)
            .func_name(&state.func_name)
            .code(state.code.as_deref().unwrap_or_default())
            .tests(state.tests.as_deref().unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl StageHandler for ModelTester {
    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        if missing_function(state) {
            let summary = format!("implementation does not define {}", state.func_name);
            record(state, Some(false), summary.clone(), &summary);
            return Ok(());
        }

        let reply = self.agent.ask(&Self::prompt(state)).await?;
        let verdict = parse_verdict(&reply);
        let summary = match verdict {
            Some(true) => "verdict PASS",
            Some(false) => "verdict FAIL",
            None => "no verdict given",
        };
        record(state, verdict, reply, summary);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::testing::canned_agent;

    fn state_with_code(code: &str) -> WorkflowState {
        let mut state = WorkflowState::new("gcd", "gcd");
        state.code = Some(code.to_string());
        state.tests = Some("from solution import gcd\n\ndef test_gcd():\n    assert gcd(4, 6) == 2".to_string());
        state
    }

    #[test]
    fn test_parse_verdict() {
        assert_eq!(parse_verdict("all good\nVERDICT: PASS"), Some(true));
        assert_eq!(parse_verdict("test_gcd fails\nVERDICT: FAIL\n"), Some(false));
        assert_eq!(parse_verdict("**Verdict: pass**"), Some(true));
        assert_eq!(parse_verdict("VERDICT: PASS\n...\nVERDICT: FAIL"), Some(false));
        assert_eq!(parse_verdict("Looks fine to me"), None);
        assert_eq!(parse_verdict("VERDICT: PASSABLE"), None);
    }

    #[tokio::test]
    async fn test_pytest_tester_short_circuits_missing_function() {
        let tester = PytestTester::new(TestRunner::new("/nonexistent/python"));
        let mut state = state_with_code("def lcm(a, b):\n    return a * b");

        tester.run(&mut state).await.unwrap();

        assert_eq!(state.tests_passed, Some(false));
        assert_eq!(state.output, "TesterAgent: implementation does not define gcd");
    }

    #[tokio::test]
    async fn test_pytest_tester_unknown_when_interpreter_missing() {
        let tester = PytestTester::new(TestRunner::new("/nonexistent/python"));
        let mut state = state_with_code("def gcd(a, b):\n    return 2");

        tester.run(&mut state).await.unwrap();

        assert_eq!(state.tests_passed, None);
        assert!(state.output.starts_with("TesterAgent: Execution error"));
    }

    #[tokio::test]
    async fn test_model_tester_pass() {
        let tester = ModelTester::new(canned_agent(AgentType::Tester, "test_gcd passes.\nVERDICT: PASS"));
        let mut state = state_with_code("def gcd(a, b):\n    return 2");

        tester.run(&mut state).await.unwrap();

        assert_eq!(state.tests_passed, Some(true));
        assert!(state.test_report.as_deref().unwrap().contains("test_gcd passes"));
        assert_eq!(state.output, "TesterAgent: verdict PASS");
    }

    #[tokio::test]
    async fn test_model_tester_without_verdict() {
        let tester = ModelTester::new(canned_agent(AgentType::Tester, "I am not sure."));
        let mut state = state_with_code("def gcd(a, b):\n    return 2");

        tester.run(&mut state).await.unwrap();
        assert_eq!(state.tests_passed, None);
    }
}
