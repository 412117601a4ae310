//! Stage handlers backed by agents
//!
//! [`standard_handlers`] assembles the four handlers the standard workflow
//! graph expects, according to the workflow configuration.

mod coder;
mod doc;
mod test_generator;
mod tester;

use std::sync::Arc;

pub use coder::CoderStage;
pub use doc::DocStage;
pub use test_generator::TestGeneratorStage;
pub use tester::{parse_verdict, ModelTester, PytestTester};

use crate::agent::{AgentFactory, AgentType};
use crate::config::{TesterMode, WorkflowConfig};
use crate::workflow::{StageHandler, StageHandlers, TestRunner};

/// Build the coder, test generator, tester and doc handlers
pub fn standard_handlers(factory: &AgentFactory, config: &WorkflowConfig) -> StageHandlers {
    let tester: Arc<dyn StageHandler> = match config.tester {
        TesterMode::Pytest => Arc::new(PytestTester::new(
            TestRunner::new(&config.python).with_timeout(config.test_timeout),
        )),
        TesterMode::Model => Arc::new(ModelTester::new(factory.create(AgentType::Tester))),
    };

    StageHandlers {
        coder: Arc::new(CoderStage::new(factory.create(AgentType::Coder))),
        test_generator: Arc::new(TestGeneratorStage::new(
            factory.create(AgentType::TestGenerator),
        )),
        tester,
        doc: Arc::new(DocStage::new(factory.create(AgentType::Doc))),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Agents with scripted replies

    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::process::Command;

    use crate::agent::{AgentFactory, AgentHandle, AgentType, Backend, TypedAgent};
    use crate::Result;

    /// Backend replying from a script, one entry per call; the last entry repeats
    pub struct ScriptedBackend {
        replies: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        pub fn new(replies: &[&str]) -> Arc<Self> {
            let mut replies: Vec<String> = replies.iter().map(|r| r.to_string()).collect();
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Backend for ScriptedBackend {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn build_command(&self, _workdir: &Path) -> Command {
            Command::new("true")
        }

        async fn spawn(&self, _prompt: &str, _workdir: &Path) -> Result<AgentHandle> {
            unreachable!("complete is overridden")
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn complete(&self, prompt: &str, _workdir: &Path) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let mut replies = self.replies.lock().unwrap();
            let reply = if replies.len() > 1 {
                replies.pop().unwrap_or_default()
            } else {
                replies.last().cloned().unwrap_or_default()
            };
            Ok(reply)
        }
    }

    pub fn canned_agent(agent_type: AgentType, reply: &str) -> TypedAgent {
        AgentFactory::new(ScriptedBackend::new(&[reply]), "/tmp").create(agent_type)
    }
}
