//! Round-budgeted tool orchestration.
//!
//! One call to [`Engine::generate`] drives a bounded conversation with the
//! completion service:
//!
//! 1. The question is sent with tool definitions attached.
//! 2. While the reply asks for tools and fewer than `max_rounds` rounds have
//!    run, the reply is appended as an assistant turn, every tool call in it is
//!    dispatched in order, and the results are appended as one user turn.
//!    The follow-up request carries tool definitions only while the round
//!    count is still below the budget.
//! 3. A failed dispatch ends tool negotiation: one final request is sent
//!    without tools and its reply is the answer.
//! 4. If the budget is spent and the service still asks for tools, that
//!    request is served once more and a final tool-free request is sent.
//!
//! A query therefore issues at most `max_rounds + 2` requests.

use crate::completion::{
    CompletionClient, CompletionReply, CompletionRequest, ContentBlock, Message, ToolChoice,
};
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::tools::{SourceRecord, ToolDefinition, ToolRegistry};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Default number of tool rounds per query.
pub const DEFAULT_MAX_ROUNDS: usize = 2;

/// Default response length cap.
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Drives the completion service and tool registry for a single query.
pub struct Engine {
    client: Arc<dyn CompletionClient>,
    registry: Option<Arc<ToolRegistry>>,
    system_prompt: String,
    max_rounds: usize,
    temperature: f32,
    max_tokens: u32,
}

/// Per-query conversation state. Dropped once the answer is built.
struct OrchestrationState {
    round: usize,
    calls: usize,
    messages: Vec<Message>,
    sources: Vec<SourceRecord>,
    tool_calls: Vec<ToolCallRecord>,
}

impl OrchestrationState {
    fn new(query: &str) -> Self {
        Self {
            round: 0,
            calls: 0,
            messages: vec![Message::user(query)],
            sources: Vec::new(),
            tool_calls: Vec::new(),
        }
    }

    fn finish(self, reply: CompletionReply) -> Answer {
        let text = match reply.first_text() {
            Some(text) => text.to_string(),
            None => {
                warn!(stop_reason = ?reply.stop_reason, "final reply has no text block");
                String::new()
            }
        };

        Answer {
            text,
            sources: self.sources,
            tool_calls: self.tool_calls,
            rounds: self.round,
            calls: self.calls,
        }
    }
}

impl Engine {
    /// Create an engine with default prompt and limits and no tools.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            registry: None,
            system_prompt: Prompts::default().system(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            temperature: 0.0,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Create an engine configured from settings and prompts.
    pub fn from_settings(client: Arc<dyn CompletionClient>, settings: &Settings, prompts: &Prompts) -> Self {
        Self::new(client)
            .with_system_prompt(&prompts.system())
            .with_max_rounds(settings.agent.max_tool_rounds)
            .with_temperature(settings.completion.temperature)
            .with_max_tokens(settings.completion.max_tokens)
    }

    /// Attach the tool registry.
    pub fn with_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the instruction text.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set the tool round budget.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the response length cap.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Answer a question, optionally in the context of a prior-conversation summary.
    ///
    /// Completion service failures are returned as errors. Tool failures are
    /// reported to the service as tool results and never abort the query.
    #[instrument(skip(self, history), fields(max_rounds = self.max_rounds))]
    pub async fn generate(&self, query: &str, history: Option<&str>) -> Result<Answer> {
        let system = self.system_content(history);
        let definitions = self
            .registry
            .as_ref()
            .map(|registry| registry.definitions())
            .filter(|definitions| !definitions.is_empty());

        let mut state = OrchestrationState::new(query);
        let mut reply = self.send(&system, &mut state, &definitions).await?;

        let registry = match &self.registry {
            Some(registry) if reply.requests_tools() => registry,
            _ => return Ok(state.finish(reply)),
        };

        let mut failed = false;
        while state.round < self.max_rounds && reply.requests_tools() {
            state.round += 1;
            info!(round = state.round, "starting tool round");

            if !self.run_tool_round(registry, &reply, &mut state).await {
                failed = true;
                break;
            }

            reply = self.send(&system, &mut state, &definitions).await?;
        }

        if failed {
            warn!(round = state.round, "tool execution failed, requesting final answer");
            reply = self.send(&system, &mut state, &None).await?;
        } else if reply.requests_tools() {
            info!(round = state.round, "round budget reached with pending tool calls");
            self.run_tool_round(registry, &reply, &mut state).await;
            reply = self.send(&system, &mut state, &None).await?;
        }

        info!(rounds = state.round, calls = state.calls, "query complete");
        Ok(state.finish(reply))
    }

    fn system_content(&self, history: Option<&str>) -> String {
        let mut vars = HashMap::new();
        vars.insert("max_rounds".to_string(), self.max_rounds.to_string());
        let instructions = Prompts::render(&self.system_prompt, &vars);

        match history.filter(|h| !h.trim().is_empty()) {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", instructions, history),
            None => instructions,
        }
    }

    /// Send the accumulated conversation. Definitions are attached only while
    /// the round count is below the budget.
    async fn send(
        &self,
        system: &str,
        state: &mut OrchestrationState,
        definitions: &Option<Vec<ToolDefinition>>,
    ) -> Result<CompletionReply> {
        let tools = if state.round < self.max_rounds {
            definitions.clone()
        } else {
            None
        };
        let tool_choice = tools.as_ref().map(|_| ToolChoice::Auto);

        let request = CompletionRequest {
            system: system.to_string(),
            messages: state.messages.clone(),
            tools,
            tool_choice,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        state.calls += 1;
        debug!(
            call = state.calls,
            client = self.client.name(),
            messages = request.messages.len(),
            tools = request.offers_tools(),
            "sending completion request"
        );

        self.client.complete(&request).await
    }

    /// Append the reply, dispatch its tool calls in order and append the
    /// results. Returns false if any dispatch failed.
    async fn run_tool_round(
        &self,
        registry: &ToolRegistry,
        reply: &CompletionReply,
        state: &mut OrchestrationState,
    ) -> bool {
        state.messages.push(Message::assistant(reply.content.clone()));

        let calls = reply.tool_calls();
        if calls.is_empty() {
            warn!(round = state.round, "reply requested tools without any tool calls");
        }

        let mut results = Vec::with_capacity(calls.len());
        let mut succeeded = true;

        for call in calls {
            let (text, is_error) = match registry.dispatch(&call.name, &call.arguments).await {
                Ok(output) => {
                    if let Some(sources) = output.sources {
                        state.sources = sources;
                    }
                    (output.text, false)
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "tool execution failed");
                    succeeded = false;
                    (format!("Tool execution failed: {}", e), true)
                }
            };

            state.tool_calls.push(ToolCallRecord {
                name: call.name,
                arguments: call.arguments.to_string(),
                result: text.clone(),
            });
            results.push(ContentBlock::tool_result(call.id, text, is_error));
        }

        if !results.is_empty() {
            state.messages.push(Message::tool_results(results));
        }

        succeeded
    }
}

/// Final outcome of a query.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Text of the terminal reply.
    pub text: String,
    /// Sources from the most recent tool execution that produced any.
    pub sources: Vec<SourceRecord>,
    /// Every tool call executed, in order.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tool rounds run within the budget.
    pub rounds: usize,
    /// Requests sent to the completion service.
    pub calls: usize,
}

/// Record of a tool call made during a query.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Text returned to the completion service.
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
