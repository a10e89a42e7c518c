//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod outline;
mod tools;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use outline::run_outline;
pub use tools::run_tools;

use crate::agent::{Answer, Engine};
use crate::completion::create_client;
use crate::config::{Prompts, Settings};
use crate::error::Result;
use crate::store::{CourseStore, MemoryCourseStore};
use crate::tools::{ContentSearchTool, OutlineTool, ToolRegistry};
use std::sync::Arc;

/// Register the course tools against a store.
pub(crate) fn course_tools(store: Arc<dyn CourseStore>) -> Result<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ContentSearchTool::new(store.clone())))?;
    registry.register(Arc::new(OutlineTool::new(store)))?;
    Ok(registry)
}

/// Load the configured catalog.
pub(crate) fn open_store(settings: &Settings) -> Result<Arc<MemoryCourseStore>> {
    let store = MemoryCourseStore::from_json_file(&settings.catalog_path())?
        .with_max_results(settings.store.max_results);
    Ok(Arc::new(store))
}

/// Engine, registry and prompts for answering queries.
pub(crate) struct Session {
    engine: Engine,
    registry: Arc<ToolRegistry>,
    prompts: Prompts,
}

impl Session {
    pub(crate) fn open(settings: &Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let registry = Arc::new(course_tools(open_store(settings)?)?);
        let engine = Engine::from_settings(create_client(settings)?, settings, &prompts)
            .with_registry(registry.clone());

        Ok(Self {
            engine,
            registry,
            prompts,
        })
    }

    /// Answer one question. Retained sources are cleared first.
    pub(crate) async fn ask(&self, question: &str, history: Option<&str>) -> Result<Answer> {
        self.registry.clear_sources();
        self.engine.generate(&self.prompts.query(question), history).await
    }
}
