//! Completion service abstraction for Lektor.
//!
//! Requests and replies are modelled as block-structured conversation turns:
//! an assistant turn may carry text and tool-call blocks, and the following
//! user turn carries the matching tool-result blocks.

mod anthropic;
mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::config::{CompletionProvider, Settings};
use crate::error::Result;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One block of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text.
    Text { text: String },

    /// A tool invocation requested by the completion service.
    #[serde(rename = "tool_use")]
    ToolCall {
        id: String,
        name: String,
        input: Value,
    },

    /// The outcome of a tool invocation, paired by `tool_use_id`.
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "is_false")]
        is_error: bool,
    },
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl ContentBlock {
    /// Create a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// Create a tool-result block.
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>, is_error: bool) -> Self {
        ContentBlock::ToolResult {
            tool_use_id: tool_use_id.into(),
            content: content.into(),
            is_error,
        }
    }
}

/// Content of a turn: either plain text or an ordered list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

impl Message {
    /// A user turn with plain text.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Text(text.into()),
        }
    }

    /// An assistant turn carrying the raw reply blocks.
    pub fn assistant(blocks: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content: MessageContent::Blocks(blocks),
        }
    }

    /// A user turn carrying tool results.
    pub fn tool_results(results: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content: MessageContent::Blocks(results),
        }
    }

    /// Blocks of this turn; empty for plain text turns.
    pub fn blocks(&self) -> &[ContentBlock] {
        match &self.content {
            MessageContent::Blocks(blocks) => blocks,
            MessageContent::Text(_) => &[],
        }
    }
}

/// Why the completion service stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The reply is complete.
    Natural,
    /// The reply asks for one or more tool invocations.
    ToolRequested,
    /// The reply hit the response-length cap.
    Truncated,
}

/// Tool-selection mode sent alongside tool definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolChoice {
    Auto,
}

/// A single request to the completion service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Instruction text.
    pub system: String,
    /// Conversation turns, oldest first.
    pub messages: Vec<Message>,
    /// Tool definitions offered for this request.
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool-selection mode, set whenever tools are offered.
    pub tool_choice: Option<ToolChoice>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Whether tool definitions are attached.
    pub fn offers_tools(&self) -> bool {
        self.tools.is_some()
    }
}

/// A tool invocation extracted from a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// A reply from the completion service.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionReply {
    pub stop_reason: StopReason,
    pub content: Vec<ContentBlock>,
}

impl CompletionReply {
    /// A natural reply with a single text block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            stop_reason: StopReason::Natural,
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Content of the first text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Tool invocations in the order they appear.
    pub fn tool_calls(&self) -> Vec<ToolCallRequest> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolCall { id, name, input } => Some(ToolCallRequest {
                    id: id.clone(),
                    name: name.clone(),
                    arguments: input.clone(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Whether the reply asks for tool use.
    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolRequested
    }
}

/// Trait for completion service clients.
///
/// Errors returned here are transport or service failures; they are fatal to
/// the query that issued the request.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one request and wait for the full reply.
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply>;

    /// Short provider name for logging.
    fn name(&self) -> &str;
}

/// Create the completion client selected in the settings.
pub fn create_client(settings: &Settings) -> Result<Arc<dyn CompletionClient>> {
    let api_key = settings.api_key()?;
    let model = settings.completion.model();
    let base_url = settings.completion.base_url.as_deref();
    let timeout = Duration::from_secs(settings.completion.timeout_secs);

    let client: Arc<dyn CompletionClient> = match settings.completion.provider {
        CompletionProvider::Anthropic => {
            Arc::new(AnthropicClient::new(&api_key, &model, base_url, timeout)?)
        }
        CompletionProvider::OpenAi => {
            Arc::new(OpenAiClient::new(&api_key, &model, base_url, timeout)?)
        }
    };

    Ok(client)
}
