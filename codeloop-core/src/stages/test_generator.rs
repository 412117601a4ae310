//! Test generation stage: ask for pytest tests against the current code

use async_trait::async_trait;

use crate::agent::{AgentType, PromptBuilder, TypedAgent};
use crate::workflow::{Stage, StageHandler, WorkflowState};
use crate::Result;

/// Generates `state.tests` for the current implementation
#[derive(Debug, Clone)]
pub struct TestGeneratorStage {
    agent: TypedAgent,
}

impl TestGeneratorStage {
    pub fn new(agent: TypedAgent) -> Self {
        debug_assert_eq!(agent.agent_type(), AgentType::TestGenerator);
        Self { agent }
    }

    pub fn prompt(state: &WorkflowState) -> String {
        PromptBuilder::new(AgentType::TestGenerator)
            .problem(&state.problem)
            .func_name(&state.func_name)
            .code(state.code.as_deref().unwrap_or_default())
            .build()
    }
}

/// Number of `test_*` functions in generated test code
fn count_tests(tests: &str) -> usize {
    tests
        .lines()
        .filter(|line| line.trim_start().starts_with("def test_"))
        .count()
}

#[async_trait]
impl StageHandler for TestGeneratorStage {
    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let tests = self.agent.ask(&Self::prompt(state)).await?;
        let count = count_tests(&tests);

        tracing::info!(count, "Generated tests");
        state.tests = Some(tests);
        state.log(format!("{}: wrote {} tests", Stage::TestGenerating.label(), count));
        Ok(())
    }
}
