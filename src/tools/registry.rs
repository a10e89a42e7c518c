//! Tool registry: registration, definitions and dispatch by name.

use super::{SourceRecord, Tool, ToolDefinition, ToolOutput};
use crate::error::{LektorError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    /// Sources from this tool's most recent execution.
    last_sources: Mutex<Vec<SourceRecord>>,
}

impl RegisteredTool {
    fn new(tool: Arc<dyn Tool>) -> Self {
        Self {
            tool,
            last_sources: Mutex::new(Vec::new()),
        }
    }
}

/// Holds registered tools in registration order.
///
/// `dispatch` returns sources together with the text. The registry also keeps
/// each tool's latest sources for `pull_sources`/`clear_sources`; that slot is
/// shared by every caller, so one registry should serve one query at a time
/// when it is used.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name in its definition.
    ///
    /// A tool registered under an existing name replaces the previous one and
    /// keeps its position.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;
        if name.trim().is_empty() {
            return Err(LektorError::ToolDefinition(
                "Tool must have a 'name' in its definition".to_string(),
            ));
        }

        match self.index.get(&name) {
            Some(&position) => {
                debug!(tool = %name, "replacing registered tool");
                self.tools[position] = RegisteredTool::new(tool);
            }
            None => {
                debug!(tool = %name, "registering tool");
                self.index.insert(name, self.tools.len());
                self.tools.push(RegisteredTool::new(tool));
            }
        }

        Ok(())
    }

    /// Definitions of all registered tools, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|entry| entry.tool.definition()).collect()
    }

    /// Whether a tool is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are registered.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the named tool.
    ///
    /// An unknown name is reported as ordinary output text. Errors from the
    /// tool itself are returned unchanged.
    pub async fn dispatch(&self, name: &str, arguments: &Value) -> Result<ToolOutput> {
        let Some(&position) = self.index.get(name) else {
            info!(tool = %name, "unknown tool requested");
            return Ok(ToolOutput::text(format!("Tool '{}' not found", name)));
        };

        let entry = &self.tools[position];
        info!(tool = %name, args = %arguments, "executing tool");

        let output = entry.tool.execute(arguments).await?;

        if let Some(sources) = &output.sources {
            let mut slot = entry
                .last_sources
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *slot = sources.clone();
        }

        Ok(output)
    }

    /// Sources from the first tool, in registration order, that has any.
    pub fn pull_sources(&self) -> Vec<SourceRecord> {
        self.tools
            .iter()
            .map(|entry| {
                entry
                    .last_sources
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone()
            })
            .find(|sources| !sources.is_empty())
            .unwrap_or_default()
    }

    /// Forget the sources retained by every tool.
    pub fn clear_sources(&self) {
        for entry in &self.tools {
            entry
                .last_sources
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ChunkMetadata, SearchResults};
    use crate::tools::testing::ScriptedStore;
    use crate::tools::{ContentSearchTool, InputSchema, OutlineTool, ParameterType};
    use async_trait::async_trait;
    use serde_json::json;

    struct NamedTool {
        name: &'static str,
        reply: &'static str,
    }

    #[async_trait]
    impl Tool for NamedTool {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(
                self.name,
                self.reply,
                InputSchema::new().required("input", ParameterType::String, "Anything"),
            )
        }

        async fn execute(&self, _arguments: &Value) -> Result<ToolOutput> {
            Ok(ToolOutput::text(self.reply))
        }
    }

    fn search_store() -> Arc<ScriptedStore> {
        Arc::new(ScriptedStore::with_results(SearchResults {
            documents: vec!["Test content".to_string()],
            metadata: vec![ChunkMetadata {
                course_title: Some("Test Course".to_string()),
                lesson_number: Some(1),
            }],
            error: None,
        }))
    }

    #[test]
    fn test_definitions_follow_registration_order() {
        let store = search_store();
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ContentSearchTool::new(store.clone()))).unwrap();
        registry.register(Arc::new(OutlineTool::new(store))).unwrap();

        let names: Vec<_> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["search_course_content", "get_course_outline"]);
        assert_eq!(registry.definitions(), registry.definitions());
    }

    #[tokio::test]
    async fn test_same_name_replaces_previous_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NamedTool { name: "a", reply: "first" })).unwrap();
        registry.register(Arc::new(NamedTool { name: "b", reply: "other" })).unwrap();
        registry.register(Arc::new(NamedTool { name: "a", reply: "second" })).unwrap();

        assert_eq!(registry.len(), 2);
        let definitions = registry.definitions();
        assert_eq!(definitions[0].name, "a");
        assert_eq!(definitions[0].description, "second");
        assert_eq!(definitions[1].name, "b");

        let output = registry.dispatch("a", &json!({"input": "x"})).await.unwrap();
        assert_eq!(output.text, "second");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register(Arc::new(NamedTool { name: "", reply: "nameless" }))
            .unwrap_err();
        assert!(matches!(err, LektorError::ToolDefinition(_)));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_plain_text() {
        let registry = ToolRegistry::new();
        let output = registry.dispatch("nonexistent_tool", &json!({})).await.unwrap();
        assert_eq!(output.text, "Tool 'nonexistent_tool' not found");
        assert_eq!(output.sources, None);
    }

    #[tokio::test]
    async fn test_tool_errors_propagate() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(ContentSearchTool::new(search_store()))).unwrap();

        let err = registry.dispatch("search_course_content", &json!({})).await.unwrap_err();
        assert!(matches!(err, LektorError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_source_side_channel() {
        let store = search_store();
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(OutlineTool::new(store.clone()))).unwrap();
        registry.register(Arc::new(ContentSearchTool::new(store))).unwrap();

        assert!(registry.pull_sources().is_empty());

        let output = registry
            .dispatch("search_course_content", &json!({"query": "test"}))
            .await
            .unwrap();
        let returned = output.sources.unwrap();
        assert_eq!(returned[0].text, "Test Course - Lesson 1");

        assert_eq!(registry.pull_sources(), returned);
        assert_eq!(registry.pull_sources(), returned);

        registry.clear_sources();
        assert!(registry.pull_sources().is_empty());
    }
}
