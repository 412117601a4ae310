//! Agent module for running coding agents through CLI backends

pub mod backends;
mod output;
mod prompts;
mod spawn;
mod typed;
mod types;

pub use backends::{Backend, BackendRegistry, ClaudeBackend, CursorBackend};
pub use output::{CollectHandler, CostInfo, OutputStreamer, StreamHandler, StreamMessage};
pub use prompts::{get_template, render, PromptBuilder, PromptContext};
pub use spawn::AgentHandle;
pub use typed::{AgentFactory, TypedAgent};
pub use types::AgentType;
