//! Anthropic Messages API client.

use super::{
    CompletionClient, CompletionReply, CompletionRequest, ContentBlock, Message, StopReason,
    ToolChoice,
};
use crate::error::{LektorError, Result};
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Completion client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "str::is_empty")]
    system: &'a str,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [ToolDefinition]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<Value>,
    stop_reason: Option<String>,
}

impl AnthropicClient {
    /// Create a new client with the given request timeout.
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
        })
    }

    fn build_body(&self, request: &CompletionRequest) -> Result<Value> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
            tools: request.tools.as_deref(),
            tool_choice: request.tools.as_ref().and(request.tool_choice),
        };
        Ok(serde_json::to_value(&body)?)
    }
}

/// Map the wire stop reason onto the engine's termination signal.
fn stop_reason_from_wire(reason: Option<&str>) -> StopReason {
    match reason {
        Some("tool_use") => StopReason::ToolRequested,
        Some("max_tokens") => StopReason::Truncated,
        _ => StopReason::Natural,
    }
}

fn parse_response(response: MessagesResponse) -> CompletionReply {
    let content = response
        .content
        .into_iter()
        .filter_map(|block| match serde_json::from_value::<ContentBlock>(block.clone()) {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                debug!(block_type = ?block.get("type"), "skipping unsupported content block");
                None
            }
        })
        .collect();

    CompletionReply {
        stop_reason: stop_reason_from_wire(response.stop_reason.as_deref()),
        content,
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply> {
        let body = self.build_body(request)?;
        let url = format!("{}/v1/messages", self.base_url);

        info!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.offers_tools(),
            "calling Anthropic API"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LektorError::Completion(format!(
                "Anthropic API error (HTTP {}): {}",
                status, body
            )));
        }

        let parsed: MessagesResponse = response.json().await?;
        let reply = parse_response(parsed);

        debug!(
            stop_reason = ?reply.stop_reason,
            blocks = reply.content.len(),
            "Anthropic reply received"
        );

        Ok(reply)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
