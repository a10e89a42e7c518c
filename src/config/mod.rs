//! Configuration module for Lektor.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{AgentPrompts, Prompts};
pub use settings::{
    AgentSettings, ChatSettings, CompletionProvider, CompletionSettings, GeneralSettings,
    PromptSettings, Settings, StoreSettings,
};
