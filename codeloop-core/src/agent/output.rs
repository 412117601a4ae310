//! Output streaming and parsing for agent stream-json output

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::Result;

/// A message from the stream-json output
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// System message at the start
    System {
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        session_id: Option<String>,
    },

    /// Assistant text output
    Assistant {
        #[serde(default)]
        message: AssistantMessage,
    },

    /// Tool usage by the assistant
    ToolUse {
        tool: String,
        #[serde(default)]
        input: serde_json::Value,
    },

    /// Result from tool execution
    ToolResult {
        #[serde(default)]
        output: String,
        #[serde(default)]
        is_error: bool,
    },

    /// Final result with the complete reply and cost information
    Result {
        #[serde(default)]
        result: Option<String>,
        #[serde(default)]
        is_error: bool,
        #[serde(default)]
        cost: Option<CostInfo>,
        #[serde(default)]
        duration_ms: Option<u64>,
    },
}

/// Assistant message content
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssistantMessage {
    #[serde(default)]
    pub content: MessageContent,
}

/// Content is either a plain string or a list of typed blocks
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Concatenated text of all text blocks
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::Other => None,
                })
                .collect(),
        }
    }
}

/// A single content block; only text matters here
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

/// Cost information from the result
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CostInfo {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

/// Handler for processing stream messages
pub trait StreamHandler: Send {
    /// Called when a system message is received
    fn on_system(&mut self, _subtype: Option<&str>, _session_id: Option<&str>) {}

    /// Called when assistant text is received
    fn on_assistant_text(&mut self, text: &str);

    /// Called when the assistant uses a tool
    fn on_tool_use(&mut self, _tool: &str, _input: &serde_json::Value) {}

    /// Called when a tool returns a result
    fn on_tool_result(&mut self, _output: &str, _is_error: bool) {}

    /// Called when the stream completes
    fn on_complete(
        &mut self,
        _result: Option<&str>,
        _cost: Option<&CostInfo>,
        _duration_ms: Option<u64>,
    ) {
    }

    /// Called when a parse error occurs (allows handler to skip malformed lines)
    fn on_parse_error(&mut self, _line: &str, _error: &serde_json::Error) {}
}

/// Handler that collects the agent's reply text
#[derive(Debug, Default)]
pub struct CollectHandler {
    text: String,
    result: Option<String>,
}

impl CollectHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reply: the final result if one was reported, otherwise the
    /// concatenated assistant text
    pub fn into_reply(self) -> String {
        match self.result {
            Some(result) if !result.trim().is_empty() => result,
            _ => self.text,
        }
    }
}

impl StreamHandler for CollectHandler {
    fn on_system(&mut self, subtype: Option<&str>, session_id: Option<&str>) {
        tracing::debug!(subtype = ?subtype, session_id = ?session_id, "Agent session started");
    }

    fn on_assistant_text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn on_tool_use(&mut self, tool: &str, _input: &serde_json::Value) {
        tracing::debug!(tool, "Agent used tool");
    }

    fn on_complete(
        &mut self,
        result: Option<&str>,
        cost: Option<&CostInfo>,
        duration_ms: Option<u64>,
    ) {
        self.result = result.map(str::to_string);
        if let Some(c) = cost {
            tracing::debug!(
                input_tokens = c.input_tokens,
                output_tokens = c.output_tokens,
                duration_ms = ?duration_ms,
                "Agent finished"
            );
        }
    }

    fn on_parse_error(&mut self, line: &str, error: &serde_json::Error) {
        tracing::trace!(line, error = %error, "Skipping unparseable stream line");
    }
}

/// Stream output from an agent process
pub struct OutputStreamer<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> OutputStreamer<R> {
    /// Create a new output streamer over a buffered reader (usually the
    /// child's stdout)
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Stream output, calling the handler for each message
    ///
    /// Returns when the stream ends (process closes stdout)
    pub async fn stream<H: StreamHandler>(&mut self, handler: &mut H) -> Result<()> {
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = self.reader.read_line(&mut line).await?;

            if bytes_read == 0 {
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<StreamMessage>(trimmed) {
                Ok(msg) => dispatch_message(handler, msg),
                Err(e) => handler.on_parse_error(trimmed, &e),
            }
        }

        Ok(())
    }
}

fn dispatch_message<H: StreamHandler>(handler: &mut H, msg: StreamMessage) {
    match msg {
        StreamMessage::System {
            subtype,
            session_id,
        } => {
            handler.on_system(subtype.as_deref(), session_id.as_deref());
        }
        StreamMessage::Assistant { message } => {
            handler.on_assistant_text(&message.content.text());
        }
        StreamMessage::ToolUse { tool, input } => {
            handler.on_tool_use(&tool, &input);
        }
        StreamMessage::ToolResult { output, is_error } => {
            handler.on_tool_result(&output, is_error);
        }
        StreamMessage::Result {
            result,
            cost,
            duration_ms,
            ..
        } => {
            handler.on_complete(result.as_deref(), cost.as_ref(), duration_ms);
        }
    }
}
