//! Claude Code backend implementation

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::Result;

use super::super::spawn::AgentHandle;
use super::{spawn_in, Backend};

/// Claude Code backend implementation
#[derive(Debug, Clone)]
pub struct ClaudeBackend {
    pub claude_path: String,
    pub model: Option<String>,
}

impl ClaudeBackend {
    /// Create a new Claude backend with default settings
    pub fn new() -> Self {
        Self {
            claude_path: "claude".to_string(),
            model: None,
        }
    }

    /// Create a Claude backend with custom path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.claude_path = path.into();
        self
    }

    /// Create a Claude backend with a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for ClaudeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for ClaudeBackend {
    fn name(&self) -> &'static str {
        "claude"
    }

    fn build_command(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.claude_path);
        // Agents only answer with text; no tools are granted.
        cmd.arg("--print")
            .arg("--verbose")
            .arg("--output-format")
            .arg("stream-json");

        if let Some(ref model) = self.model {
            cmd.arg("--model").arg(model);
        }

        cmd.current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        cmd
    }

    async fn spawn(&self, prompt: &str, workdir: &Path) -> Result<AgentHandle> {
        let mut cmd = self.build_command(workdir);
        cmd.arg(prompt);
        spawn_in(cmd, prompt, workdir, &self.claude_path)
    }

    fn is_available(&self) -> bool {
        std::process::Command::new(&self.claude_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}
