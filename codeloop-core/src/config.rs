//! Configuration management for codeloop
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (CODELOOP_*)
//! 3. Config file (~/.config/codeloop/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default number of times the coder is sent back after failing tests
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Which agent CLI drives the model-backed stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Claude Code (`claude`)
    #[default]
    Claude,
    /// Cursor agent (`cursor-agent`)
    Cursor,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "claude" => Ok(Backend::Claude),
            "cursor" => Ok(Backend::Cursor),
            _ => Err(Error::Config(format!("Unknown backend: {}", s))),
        }
    }
}

/// How the Testing stage decides whether the tests passed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TesterMode {
    /// Execute the generated tests with pytest
    #[default]
    Pytest,
    /// Ask the tester agent for a verdict
    Model,
}

impl FromStr for TesterMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pytest" => Ok(TesterMode::Pytest),
            "model" => Ok(TesterMode::Model),
            _ => Err(Error::Config(format!("Unknown tester mode: {}", s))),
        }
    }
}

/// Agent-related configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Backend used for all agents
    pub backend: Backend,

    /// Path to the claude executable
    pub claude_path: String,

    /// Path to the cursor-agent executable
    pub cursor_path: String,

    /// Model to use
    pub model: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Claude,
            claude_path: "claude".to_string(),
            cursor_path: "cursor-agent".to_string(),
            model: None, // Let the backend use its default
        }
    }
}

/// Retry loop and test execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Maximum number of Testing -> Coding retries
    pub max_retries: u32,

    /// How the Testing stage decides pass/fail
    pub tester: TesterMode,

    /// Python interpreter used to run pytest
    pub python: String,

    /// Time limit for one pytest run
    #[serde(with = "humantime_serde")]
    pub test_timeout: Duration,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            tester: TesterMode::Pytest,
            python: "python3".to_string(),
            test_timeout: Duration::from_secs(60),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Agent configuration
    pub agent: AgentConfig,

    /// Workflow configuration
    pub workflow: WorkflowConfig,
}

/// Overrides taken from command line flags
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend: Option<Backend>,
    pub claude_path: Option<String>,
    pub model: Option<String>,
    pub max_retries: Option<u32>,
    pub tester: Option<TesterMode>,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/codeloop/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("codeloop").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - CODELOOP_BACKEND: claude or cursor
    /// - CODELOOP_CLAUDE_PATH: Path to claude executable
    /// - CODELOOP_MODEL: Model to use
    /// - CODELOOP_MAX_RETRIES: Retry limit
    /// - CODELOOP_PYTHON: Python interpreter for pytest
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(backend) = lookup("CODELOOP_BACKEND") {
            self.agent.backend = backend.parse()?;
        }

        if let Some(claude_path) = lookup("CODELOOP_CLAUDE_PATH") {
            self.agent.claude_path = claude_path;
        }

        if let Some(model) = lookup("CODELOOP_MODEL") {
            self.agent.model = Some(model);
        }

        if let Some(retries) = lookup("CODELOOP_MAX_RETRIES") {
            self.workflow.max_retries = retries.trim().parse().map_err(|_| {
                Error::Config(format!("CODELOOP_MAX_RETRIES is not a number: {}", retries))
            })?;
        }

        if let Some(python) = lookup("CODELOOP_PYTHON") {
            self.workflow.python = python;
        }

        Ok(self)
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, overrides: CliOverrides) -> Self {
        if let Some(backend) = overrides.backend {
            self.agent.backend = backend;
        }

        if let Some(path) = overrides.claude_path {
            self.agent.claude_path = path;
        }

        if let Some(m) = overrides.model {
            self.agent.model = Some(m);
        }

        if let Some(retries) = overrides.max_retries {
            self.workflow.max_retries = retries;
        }

        if let Some(tester) = overrides.tester {
            self.workflow.tester = tester;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(overrides: CliOverrides) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()?
            .with_cli_overrides(overrides))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.agent.backend, Backend::Claude);
        assert_eq!(config.agent.claude_path, "claude");
        assert!(config.agent.model.is_none());
        assert_eq!(config.workflow.max_retries, 5);
        assert_eq!(config.workflow.tester, TesterMode::Pytest);
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::default().with_cli_overrides(CliOverrides {
            claude_path: Some("/custom/claude".to_string()),
            model: Some("opus".to_string()),
            max_retries: Some(2),
            ..Default::default()
        });

        assert_eq!(config.agent.claude_path, "/custom/claude");
        assert_eq!(config.agent.model, Some("opus".to_string()));
        assert_eq!(config.workflow.max_retries, 2);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CODELOOP_BACKEND", "cursor"),
            ("CODELOOP_MAX_RETRIES", "7"),
            ("CODELOOP_PYTHON", "/usr/bin/python3.12"),
        ]
        .into_iter()
        .collect();

        let config = Config::default()
            .with_overrides_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.agent.backend, Backend::Cursor);
        assert_eq!(config.workflow.max_retries, 7);
        assert_eq!(config.workflow.python, "/usr/bin/python3.12");
    }

    #[test]
    fn test_env_override_bad_retries() {
        let result = Config::default().with_overrides_from(|k| {
            (k == "CODELOOP_MAX_RETRIES").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[agent]
backend = "cursor"
model = "gpt-5"

[workflow]
max_retries = 3
tester = "model"
test_timeout = "2m"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.agent.backend, Backend::Cursor);
        assert_eq!(config.agent.model, Some("gpt-5".to_string()));
        assert_eq!(config.workflow.max_retries, 3);
        assert_eq!(config.workflow.tester, TesterMode::Model);
        assert_eq!(config.workflow.test_timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_partial_toml() {
        let toml = r#"
[agent]
model = "opus"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        // everything else falls back to defaults
        assert_eq!(config.agent.claude_path, "claude");
        assert_eq!(config.agent.model, Some("opus".to_string()));
        assert_eq!(config.workflow.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[workflow]\nmax_retries = 1\n").unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.workflow.max_retries, 1);
    }

    #[test]
    fn test_backend_from_str() {
        assert_eq!("Claude".parse::<Backend>().unwrap(), Backend::Claude);
        assert_eq!("cursor".parse::<Backend>().unwrap(), Backend::Cursor);
        assert!("copilot".parse::<Backend>().is_err());
    }
}
