//! Documenting stage

use async_trait::async_trait;

use crate::agent::{AgentType, PromptBuilder, TypedAgent};
use crate::workflow::{Stage, StageHandler, WorkflowState};
use crate::Result;

/// Writes `state.documentation` for the passing implementation
#[derive(Debug, Clone)]
pub struct DocStage {
    agent: TypedAgent,
}

impl DocStage {
    pub fn new(agent: TypedAgent) -> Self {
        debug_assert_eq!(agent.agent_type(), AgentType::Doc);
        Self { agent }
    }

    pub fn prompt(state: &WorkflowState) -> String {
        PromptBuilder::new(AgentType::Doc)
            .problem(&state.problem)
            .func_name(&state.func_name)
            .code(state.code.as_deref().unwrap_or_default())
            .build()
    }
}

#[async_trait]
impl StageHandler for DocStage {
    async fn run(&self, state: &mut WorkflowState) -> Result<()> {
        let docs = self.agent.ask(&Self::prompt(state)).await?;
        state.documentation = Some(docs);
        state.log(format!("{}: documented {}", Stage::Documenting.label(), state.func_name));
        Ok(())
    }
}
