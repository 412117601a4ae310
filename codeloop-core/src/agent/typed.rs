//! Typed agents for codeloop
//!
//! A typed agent binds an [`AgentType`] to a backend and a working
//! directory. Replies from code-producing agents are cleaned before they are
//! handed back.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::backends::{self, Backend};
use crate::agent::AgentType;
use crate::code::clean_code;
use crate::config::AgentConfig;
use crate::Result;

/// An agent of a specific type running on a backend
#[derive(Clone)]
pub struct TypedAgent {
    agent_type: AgentType,
    backend: Arc<dyn Backend>,
    workdir: PathBuf,
}

impl fmt::Debug for TypedAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedAgent")
            .field("agent_type", &self.agent_type)
            .field("backend", &self.backend.name())
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl TypedAgent {
    /// Create a typed agent on the given backend
    pub fn new(agent_type: AgentType, backend: Arc<dyn Backend>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            agent_type,
            backend,
            workdir: workdir.into(),
        }
    }

    /// Get the agent type
    pub fn agent_type(&self) -> AgentType {
        self.agent_type
    }

    /// Directory the agent process runs in
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Send a rendered prompt and return the reply.
    ///
    /// Coder and test generator replies come back as cleaned code.
    pub async fn ask(&self, prompt: &str) -> Result<String> {
        tracing::info!(agent = %self.agent_type, backend = self.backend.name(), "Asking agent");
        let reply = self.backend.complete(prompt, &self.workdir).await?;

        if self.agent_type.produces_code() {
            Ok(clean_code(&reply))
        } else {
            Ok(reply.trim().to_string())
        }
    }
}

/// Factory for creating typed agents sharing one backend
#[derive(Clone)]
pub struct AgentFactory {
    backend: Arc<dyn Backend>,
    workdir: PathBuf,
}

impl fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentFactory")
            .field("backend", &self.backend.name())
            .field("workdir", &self.workdir)
            .finish()
    }
}

impl AgentFactory {
    /// Create a factory over an existing backend
    pub fn new(backend: Arc<dyn Backend>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            workdir: workdir.into(),
        }
    }

    /// Create a factory for the backend selected in the configuration
    pub fn with_config(config: &AgentConfig, workdir: impl Into<PathBuf>) -> Self {
        Self::new(backends::from_config(config), workdir)
    }

    /// Create an agent of the given type
    pub fn create(&self, agent_type: AgentType) -> TypedAgent {
        TypedAgent::new(agent_type, Arc::clone(&self.backend), self.workdir.clone())
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
