//! Lektor - Course Materials Assistant
//!
//! Answers questions about indexed course material by letting a language model
//! call a small set of read-only tools across a bounded number of rounds.
//!
//! The name "Lektor" is the Norwegian word for a lecturer.
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `completion` - Completion service contract and its Anthropic/OpenAI clients
//! - `store` - Course retrieval contract and an in-memory catalog
//! - `tools` - Tool contract, registry, content search and outline tools
//! - `agent` - Round-budgeted orchestration engine
//! - `cli` - Command-line front end
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lektor::agent::Engine;
//! use lektor::completion::create_client;
//! use lektor::config::Settings;
//! use lektor::store::MemoryCourseStore;
//! use lektor::tools::{ContentSearchTool, OutlineTool, ToolRegistry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let store = Arc::new(MemoryCourseStore::from_json_file(&settings.catalog_path())?);
//!
//!     let mut registry = ToolRegistry::new();
//!     registry.register(Arc::new(ContentSearchTool::new(store.clone())))?;
//!     registry.register(Arc::new(OutlineTool::new(store)))?;
//!
//!     let engine = Engine::new(create_client(&settings)?).with_registry(Arc::new(registry));
//!     let answer = engine.generate("What does lesson 2 of the MCP course cover?", None).await?;
//!     println!("{}", answer.text);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod completion;
pub mod config;
pub mod error;
pub mod store;
pub mod tools;

pub use error::{LektorError, Result};
