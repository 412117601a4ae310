//! Handles to running agent processes

use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::Child;

use super::output::{CollectHandler, OutputStreamer};
use crate::{Error, Result};

/// Handle to a running agent process
pub struct AgentHandle {
    child: Child,
    /// The prompt that was given to the agent
    prompt: String,
    /// Working directory for the agent
    workdir: String,
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("prompt", &self.prompt)
            .field("workdir", &self.workdir)
            .field("child", &"<Child>")
            .finish()
    }
}

impl AgentHandle {
    /// Wrap a spawned child process
    pub fn new(child: Child, prompt: String, workdir: String) -> Self {
        Self {
            child,
            prompt,
            workdir,
        }
    }

    /// Get the prompt this agent is working on
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Get the working directory
    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    /// Get mutable access to the child process for output streaming
    pub fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }

    /// Wait for the process to complete and return the exit status
    pub async fn wait(&mut self) -> Result<std::process::ExitStatus> {
        self.child.wait().await.map_err(Error::Io)
    }

    /// Kill the agent process
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(Error::Io)
    }

    /// Stream the agent's output to completion and return its reply text.
    ///
    /// Fails if the process exits unsuccessfully.
    pub async fn collect_reply(mut self) -> Result<String> {
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or_else(|| Error::Agent("Failed to capture agent stdout".to_string()))?;
        // Drain stderr concurrently so a chatty agent cannot block on a full pipe.
        let stderr_task = self.child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut detail = String::new();
                let _ = stderr.read_to_string(&mut detail).await;
                detail
            })
        });

        let mut streamer = OutputStreamer::new(BufReader::new(stdout));
        let mut handler = CollectHandler::new();
        streamer.stream(&mut handler).await?;

        let status = self.wait().await?;
        let detail = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            return Err(Error::Agent(format!(
                "Agent exited with status {}: {}",
                status,
                detail.trim()
            )));
        }

        Ok(handler.into_reply())
    }
}
