//! Backend abstraction for agent CLIs

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::process::Command;

use crate::config::{AgentConfig, Backend as BackendType};
use crate::{Error, Result};

use super::spawn::AgentHandle;

mod claude;
mod cursor;

pub use claude::ClaudeBackend;
pub use cursor::CursorBackend;

/// Trait for agent CLI backends
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Build the command to spawn this backend
    fn build_command(&self, workdir: &Path) -> Command;

    /// Spawn an agent with a prompt
    async fn spawn(&self, prompt: &str, workdir: &Path) -> Result<AgentHandle>;

    /// Check if this backend is available on the system
    fn is_available(&self) -> bool;

    /// Run a prompt to completion and return the reply text
    async fn complete(&self, prompt: &str, workdir: &Path) -> Result<String> {
        tracing::debug!(backend = self.name(), prompt_len = prompt.len(), "Running agent");
        let handle = self.spawn(prompt, workdir).await?;
        handle.collect_reply().await
    }
}

/// Build the backend selected by the agent configuration
pub fn from_config(config: &AgentConfig) -> Arc<dyn Backend> {
    match config.backend {
        BackendType::Claude => {
            let mut backend = ClaudeBackend::new().with_path(&config.claude_path);
            if let Some(ref model) = config.model {
                backend = backend.with_model(model);
            }
            Arc::new(backend)
        }
        BackendType::Cursor => {
            let mut backend = CursorBackend::new().with_path(&config.cursor_path);
            if let Some(ref model) = config.model {
                backend = backend.with_model(model);
            }
            Arc::new(backend)
        }
    }
}

/// Spawn a prepared backend command inside `workdir`
pub(crate) fn spawn_in(
    mut cmd: Command,
    prompt: &str,
    workdir: &Path,
    executable: &str,
) -> Result<AgentHandle> {
    let workdir_str = workdir
        .to_str()
        .ok_or_else(|| Error::Agent("Invalid working directory path".to_string()))?
        .to_string();

    if !workdir.exists() {
        return Err(Error::Agent(format!(
            "Working directory does not exist: {}",
            workdir_str
        )));
    }

    let child = cmd.spawn().map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::Agent(format!(
                "Agent executable not found at '{}'. Is it installed?",
                executable
            ))
        } else {
            Error::Io(e)
        }
    })?;

    Ok(AgentHandle::new(child, prompt.to_string(), workdir_str))
}

/// Registry of available backends
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl BackendRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            backends: HashMap::new(),
        }
    }

    /// Create a registry with default backends
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClaudeBackend::new()));
        registry.register(Arc::new(CursorBackend::new()));
        registry
    }

    /// Create a registry with every backend at its configured path
    pub fn with_config(config: &AgentConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ClaudeBackend::new().with_path(&config.claude_path)));
        registry.register(Arc::new(CursorBackend::new().with_path(&config.cursor_path)));
        registry
    }

    /// Register a backend
    pub fn register(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.name().to_string(), backend);
    }

    /// Get a backend by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    /// Registered backend names, sorted, with whether each is installed
    pub fn availability(&self) -> Vec<(&str, bool)> {
        let mut entries: Vec<(&str, bool)> = self
            .backends
            .iter()
            .map(|(name, backend)| (name.as_str(), backend.is_available()))
            .collect();
        entries.sort_unstable_by_key(|(name, _)| *name);
        entries
    }

    /// Names of the installed backends, sorted
    pub fn list_available(&self) -> Vec<&str> {
        self.availability()
            .into_iter()
            .filter_map(|(name, available)| available.then_some(name))
            .collect()
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
