//! Agent prompt templates
//!
//! This module provides embedded prompt templates for each agent type.
//! Templates use `{{VARIABLE}}` placeholders that are rendered with context.

use crate::agent::AgentType;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Embedded prompt templates for each agent type
const CODER_PROMPT: &str = include_str!("prompts/coder.md");
const TEST_GENERATOR_PROMPT: &str = include_str!("prompts/test_generator.md");
const TESTER_PROMPT: &str = include_str!("prompts/tester.md");
const DOC_PROMPT: &str = include_str!("prompts/doc.md");

/// Get the raw prompt template for an agent type
pub fn get_template(agent_type: AgentType) -> &'static str {
    match agent_type {
        AgentType::Coder => CODER_PROMPT,
        AgentType::TestGenerator => TEST_GENERATOR_PROMPT,
        AgentType::Tester => TESTER_PROMPT,
        AgentType::Doc => DOC_PROMPT,
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("placeholder pattern is valid"))
}

/// Context for rendering a prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    /// Variable substitutions
    variables: HashMap<String, String>,
}

impl PromptContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Set a variable value (builder pattern)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set the problem description
    pub fn with_problem(self, problem: impl Into<String>) -> Self {
        self.with("PROBLEM", problem)
    }

    /// Set the target function name
    pub fn with_func_name(self, name: impl Into<String>) -> Self {
        self.with("FUNC_NAME", name)
    }

    /// Set the implementation under test, as a fenced block
    pub fn with_code(self, code: &str) -> Self {
        self.with("CODE", fenced(code))
    }

    /// Set the generated tests, as a fenced block
    pub fn with_tests(self, tests: &str) -> Self {
        self.with("TESTS", fenced(tests))
    }

    /// Set the code from a failed attempt
    pub fn with_previous_code(self, code: &str) -> Self {
        self.with("PREVIOUS_CODE", fenced(code))
    }

    /// Set the report explaining why the last attempt failed
    pub fn with_test_report(self, report: impl Into<String>) -> Self {
        self.with("TEST_REPORT", report)
    }
}

fn fenced(code: &str) -> String {
    format!("```python\n{}\n```", code)
}

/// Render a prompt template with the given context
pub fn render(agent_type: AgentType, context: &PromptContext) -> String {
    render_template(get_template(agent_type), context)
}

/// Render a template string with variable substitution
///
/// Unset placeholders become "(not specified)". Substituted values are not
/// rescanned, so code containing `{{...}}` is left intact.
fn render_template(template: &str, context: &PromptContext) -> String {
    placeholder_pattern()
        .replace_all(template, |caps: &Captures| {
            context
                .variables
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| "(not specified)".to_string())
        })
        .into_owned()
}

/// Build a complete prompt for an agent
pub struct PromptBuilder {
    agent_type: AgentType,
    context: PromptContext,
}

impl PromptBuilder {
    /// Create a new prompt builder for the given agent type
    pub fn new(agent_type: AgentType) -> Self {
        Self {
            agent_type,
            context: PromptContext::new(),
        }
    }

    /// Set the problem description
    pub fn problem(mut self, problem: impl Into<String>) -> Self {
        self.context = self.context.with_problem(problem);
        self
    }

    /// Set the target function name
    pub fn func_name(mut self, name: impl Into<String>) -> Self {
        self.context = self.context.with_func_name(name);
        self
    }

    /// Set the implementation
    pub fn code(mut self, code: &str) -> Self {
        self.context = self.context.with_code(code);
        self
    }

    /// Set the generated tests
    pub fn tests(mut self, tests: &str) -> Self {
        self.context = self.context.with_tests(tests);
        self
    }

    /// Set the previous failed attempt
    pub fn previous_code(mut self, code: &str) -> Self {
        self.context = self.context.with_previous_code(code);
        self
    }

    /// Set the failure report
    pub fn test_report(mut self, report: impl Into<String>) -> Self {
        self.context = self.context.with_test_report(report);
        self
    }

    /// Set a custom variable
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context = self.context.with(key, value);
        self
    }

    /// Build the final prompt
    pub fn build(self) -> String {
        render(self.agent_type, &self.context)
    }
}
