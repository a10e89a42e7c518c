//! OpenAI chat-completions client.
//!
//! Translates block-structured turns into chat messages: an assistant turn's
//! tool-call blocks become `tool_calls`, and each tool-result block becomes a
//! separate `tool` message.

use super::{CompletionClient, CompletionReply, CompletionRequest, ContentBlock, Message, MessageContent, Role, StopReason};
use crate::error::{LektorError, Result};
use crate::tools::ToolDefinition;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, ChatCompletionToolChoiceOption, ChatCompletionToolType,
    CreateChatCompletionRequestArgs, FinishReason, FunctionCall, FunctionObject,
};
use async_openai::Client;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Completion client for OpenAI-compatible chat completions.
pub struct OpenAiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiClient {
    /// Create a new client with the given request timeout.
    pub fn new(api_key: &str, model: &str, base_url: Option<&str>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(url) = base_url {
            config = config.with_api_base(url);
        }

        Ok(Self {
            client: Client::with_config(config).with_http_client(http_client),
            model: model.to_string(),
        })
    }
}

fn builder_error(e: impl std::fmt::Display) -> LektorError {
    LektorError::OpenAI(e.to_string())
}

/// Convert the instruction text and turns into chat messages.
fn build_messages(system: &str, turns: &[Message]) -> Result<Vec<ChatCompletionRequestMessage>> {
    let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(turns.len() + 1);

    if !system.is_empty() {
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(builder_error)?
                .into(),
        );
    }

    for turn in turns {
        match (&turn.role, &turn.content) {
            (Role::User, MessageContent::Text(text)) => {
                messages.push(user_message(text)?);
            }
            (Role::User, MessageContent::Blocks(blocks)) => {
                for block in blocks {
                    match block {
                        ContentBlock::ToolResult {
                            tool_use_id,
                            content,
                            ..
                        } => {
                            messages.push(
                                ChatCompletionRequestToolMessageArgs::default()
                                    .tool_call_id(tool_use_id)
                                    .content(content.clone())
                                    .build()
                                    .map_err(builder_error)?
                                    .into(),
                            );
                        }
                        ContentBlock::Text { text } => messages.push(user_message(text)?),
                        ContentBlock::ToolCall { .. } => {
                            warn!("ignoring tool call block in a user turn");
                        }
                    }
                }
            }
            (Role::Assistant, MessageContent::Text(text)) => {
                messages.push(
                    ChatCompletionRequestAssistantMessageArgs::default()
                        .content(text.clone())
                        .build()
                        .map_err(builder_error)?
                        .into(),
                );
            }
            (Role::Assistant, MessageContent::Blocks(blocks)) => {
                messages.push(assistant_blocks_message(blocks)?);
            }
        }
    }

    Ok(messages)
}

fn user_message(text: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(text)
        .build()
        .map_err(builder_error)?
        .into())
}

fn assistant_blocks_message(blocks: &[ContentBlock]) -> Result<ChatCompletionRequestMessage> {
    let text = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    let tool_calls: Vec<ChatCompletionMessageToolCall> = blocks
        .iter()
        .filter_map(|block| match block {
            ContentBlock::ToolCall { id, name, input } => Some(ChatCompletionMessageToolCall {
                id: id.clone(),
                r#type: ChatCompletionToolType::Function,
                function: FunctionCall {
                    name: name.clone(),
                    arguments: input.to_string(),
                },
            }),
            _ => None,
        })
        .collect();

    let mut args = ChatCompletionRequestAssistantMessageArgs::default();
    if !text.is_empty() || tool_calls.is_empty() {
        args.content(text);
    }
    if !tool_calls.is_empty() {
        args.tool_calls(tool_calls);
    }

    Ok(args.build().map_err(builder_error)?.into())
}

fn build_tools(definitions: &[ToolDefinition]) -> Result<Vec<ChatCompletionTool>> {
    definitions
        .iter()
        .map(|definition| {
            Ok(ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: definition.name.clone(),
                    description: Some(definition.description.clone()),
                    parameters: Some(serde_json::to_value(&definition.input_schema)?),
                    strict: None,
                },
            })
        })
        .collect()
}

/// Map a finish reason onto the engine's termination signal.
fn stop_reason_from_finish(finish: Option<FinishReason>, has_tool_calls: bool) -> StopReason {
    match finish {
        Some(FinishReason::ToolCalls) | Some(FinishReason::FunctionCall) => StopReason::ToolRequested,
        Some(FinishReason::Length) => StopReason::Truncated,
        _ if has_tool_calls => StopReason::ToolRequested,
        _ => StopReason::Natural,
    }
}

/// Parse tool-call arguments. Unparseable JSON is passed through as a string so
/// the tool reports it as an invalid invocation.
fn parse_arguments(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionReply> {
        let messages = build_messages(&request.system, &request.messages)?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(messages)
            .temperature(request.temperature)
            .max_completion_tokens(request.max_tokens);

        if let Some(definitions) = &request.tools {
            args.tools(build_tools(definitions)?)
                .tool_choice(ChatCompletionToolChoiceOption::Auto);
        }

        let chat_request = args.build().map_err(builder_error)?;

        info!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.offers_tools(),
            "calling OpenAI API"
        );

        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e| LektorError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LektorError::Completion("No choices in response".to_string()))?;

        let mut content = Vec::new();
        if let Some(text) = choice.message.content.filter(|t| !t.is_empty()) {
            content.push(ContentBlock::Text { text });
        }

        let calls = choice.message.tool_calls.unwrap_or_default();
        let has_tool_calls = !calls.is_empty();
        for call in calls {
            content.push(ContentBlock::ToolCall {
                id: call.id,
                name: call.function.name,
                input: parse_arguments(&call.function.arguments),
            });
        }

        let stop_reason = stop_reason_from_finish(choice.finish_reason, has_tool_calls);
        debug!(?stop_reason, blocks = content.len(), "OpenAI reply received");

        Ok(CompletionReply {
            stop_reason,
            content,
        })
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_messages_pairs_tool_results() {
        let turns = vec![
            Message::user("Outline of MCP?"),
            Message::assistant(vec![
                ContentBlock::text("Looking it up."),
                ContentBlock::ToolCall {
                    id: "call_1".to_string(),
                    name: "get_course_outline".to_string(),
                    input: json!({"course_name": "MCP"}),
                },
                ContentBlock::ToolCall {
                    id: "call_2".to_string(),
                    name: "search_course_content".to_string(),
                    input: json!({"query": "servers"}),
                },
            ]),
            Message::tool_results(vec![
                ContentBlock::tool_result("call_1", "outline", false),
                ContentBlock::tool_result("call_2", "passages", false),
            ]),
        ];

        let messages = build_messages("Be brief.", &turns).unwrap();

        assert_eq!(messages.len(), 5);
        assert!(matches!(messages[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(messages[1], ChatCompletionRequestMessage::User(_)));
        match &messages[2] {
            ChatCompletionRequestMessage::Assistant(assistant) => {
                let calls = assistant.tool_calls.as_ref().unwrap();
                assert_eq!(calls.len(), 2);
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[1].function.name, "search_course_content");
            }
            other => panic!("Expected assistant message, got {:?}", other),
        }
        match &messages[4] {
            ChatCompletionRequestMessage::Tool(tool) => assert_eq!(tool.tool_call_id, "call_2"),
            other => panic!("Expected tool message, got {:?}", other),
        }
    }

    #[test]
    fn test_build_tools_keeps_schema() {
        use crate::tools::{InputSchema, ParameterType};

        let definition = ToolDefinition::new(
            "lookup",
            "Look something up",
            InputSchema::new().required("query", ParameterType::String, "What to look up"),
        );
        let tools = build_tools(&[definition]).unwrap();

        assert_eq!(tools[0].function.name, "lookup");
        let parameters = tools[0].function.parameters.as_ref().unwrap();
        assert_eq!(parameters["properties"]["query"]["type"], "string");
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(
            stop_reason_from_finish(Some(FinishReason::ToolCalls), true),
            StopReason::ToolRequested
        );
        assert_eq!(stop_reason_from_finish(Some(FinishReason::Length), false), StopReason::Truncated);
        assert_eq!(stop_reason_from_finish(Some(FinishReason::Stop), false), StopReason::Natural);
        assert_eq!(stop_reason_from_finish(Some(FinishReason::Stop), true), StopReason::ToolRequested);
        assert_eq!(stop_reason_from_finish(None, false), StopReason::Natural);
    }

    #[test]
    fn test_parse_arguments() {
        assert_eq!(parse_arguments(r#"{"query": "x"}"#), json!({"query": "x"}));
        assert_eq!(parse_arguments("{not json"), json!("{not json"));
    }
}
