//! Cursor agent backend implementation

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::Result;

use super::super::spawn::AgentHandle;
use super::{spawn_in, Backend};

/// Cursor backend implementation
#[derive(Debug, Clone)]
pub struct CursorBackend {
    cursor_path: String,
    model: Option<String>,
}

impl CursorBackend {
    /// Create a new Cursor backend with default settings
    pub fn new() -> Self {
        Self {
            cursor_path: "cursor-agent".to_string(),
            model: None,
        }
    }

    /// Create a Cursor backend with custom path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.cursor_path = path.into();
        self
    }

    /// Create a Cursor backend with a specific model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Default for CursorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for CursorBackend {
    fn name(&self) -> &'static str {
        "cursor"
    }

    fn build_command(&self, workdir: &Path) -> Command {
        let mut cmd = Command::new(&self.cursor_path);
        cmd.arg("--print").arg("--output-format").arg("stream-json");

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
        cmd.arg("-p").arg(prompt);
        spawn_in(cmd, prompt, workdir, &self.cursor_path)
    }

    fn is_available(&self) -> bool {
        std::process::Command::new(&self.cursor_path)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}
