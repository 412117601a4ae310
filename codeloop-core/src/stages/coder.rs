//! Coding stage: ask the coder agent for an implementation

use async_trait::async_trait;

use crate::agent::{AgentType, PromptBuilder, TypedAgent};
use crate::code::has_function;
use crate::workflow::{Stage, StageHandler, WorkflowState};
use crate::Result;

/// Generates (or regenerates) `state.code`
#[derive(Debug, Clone)]
pub struct CoderStage {
    agent: TypedAgent,
}

impl CoderStage {
    pub fn new(agent: TypedAgent) -> Self {
        debug_assert_eq!(agent.agent_type(), AgentType::Coder);
        Self { agent }
    }

    /// Prompt for the current attempt; retries carry the failed attempt and
    /// its test report
    pub fn prompt(state: &WorkflowState) -> String {
        let mut builder = PromptBuilder::new(AgentType::Coder)
            .problem(&state.problem)
            .func_name(&state.func_name);

        if state.retries > 0 {
            if let Some(ref code) = state.code {
                builder = builder.previous_code(code);
            }
            if let Some(ref report) = state.test_report {
                builder = builder.test_report(report);
            }
        }

        builder.build()
    }
}

#[async_trait]
impl StageHandler for CoderStage {
    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let code = self.agent.ask(&Self::prompt(state)).await?;
        let attempt = state.retries + 1;

        let message = if has_function(&code, &state.func_name) {
            format!("attempt {} defines {}", attempt, state.func_name)
        } else {
            tracing::warn!(func_name = %state.func_name, attempt, "Generated code is missing the target function");
            format!("attempt {} does not define {}", attempt, state.func_name)
        };

        state.code = Some(code);
        state.tests_passed = None;
        state.log(format!("{}: {}", Stage::Coding.label(), message));
        Ok(())
    }
}
