//! Query orchestration over the completion service and tool registry.
//!
//! The [`Engine`] sends a question to the completion service, serves the tool
//! calls it asks for within a fixed round budget and returns the final text
//! together with the sources the tools produced.

mod engine;

pub use engine::{Answer, Engine, ToolCallRecord, DEFAULT_MAX_ROUNDS, DEFAULT_MAX_TOKENS};
