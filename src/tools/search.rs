//! Course content search tool.

use super::{parse_arguments, InputSchema, ParameterType, SourceRecord, Tool, ToolDefinition, ToolOutput};
use crate::error::Result;
use crate::store::{CourseStore, SearchResults};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::debug;

/// Name under which the search tool is offered.
pub const SEARCH_TOOL_NAME: &str = "search_course_content";

/// Placeholder for chunks without course metadata.
const UNKNOWN_COURSE: &str = "unknown";

#[derive(Debug, Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default)]
    course_name: Option<String>,
    #[serde(default, deserialize_with = "whole_number")]
    lesson_number: Option<i64>,
}

/// Accept integers and whole-valued floats such as `2.0`.
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };

    number
        .as_i64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|n| n.is_finite() && n.fract() == 0.0)
                .map(|n| n as i64)
        })
        .map(Some)
        .ok_or_else(|| {
            serde::de::Error::custom(format!("expected a whole lesson number, got {}", number))
        })
}

/// Searches course content, optionally filtered by course and lesson.
pub struct ContentSearchTool {
    store: Arc<dyn CourseStore>,
}

impl ContentSearchTool {
    /// Create a search tool backed by the given store.
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    /// Format results as headed passages and collect one source per passage.
    async fn format_results(&self, results: &SearchResults) -> Result<ToolOutput> {
        let mut passages = Vec::with_capacity(results.len());
        let mut sources = Vec::with_capacity(results.len());

        for (document, metadata) in results.documents.iter().zip(&results.metadata) {
            let course_title = metadata.course_title.as_deref().unwrap_or(UNKNOWN_COURSE);

            let label = match metadata.lesson_number {
                Some(lesson) => format!("{} - Lesson {}", course_title, lesson),
                None => course_title.to_string(),
            };

            let link = match metadata.lesson_number {
                Some(lesson) => self.store.lesson_link(course_title, lesson).await?,
                None => None,
            };

            passages.push(format!("[{}]\n{}", label, document));
            sources.push(SourceRecord { text: label, link });
        }

        Ok(ToolOutput::with_sources(passages.join("\n\n"), sources))
    }
}

/// Message for an empty result set, naming any active filters.
fn no_results_message(course_name: Option<&str>, lesson_number: Option<i64>) -> String {
    let mut filters = String::new();
    if let Some(course) = course_name {
        filters.push_str(&format!(" in course '{}'", course));
    }
    if let Some(lesson) = lesson_number {
        filters.push_str(&format!(" in lesson {}", lesson));
    }
    format!("No relevant content found{}.", filters)
}

#[async_trait]
impl Tool for ContentSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            SEARCH_TOOL_NAME,
            "Search course materials with smart course name matching and lesson filtering",
            InputSchema::new()
                .required(
                    "query",
                    ParameterType::String,
                    "What to search for in the course content",
                )
                .optional(
                    "course_name",
                    ParameterType::String,
                    "Course title (partial matches work, e.g. 'MCP', 'Introduction')",
                )
                .optional(
                    "lesson_number",
                    ParameterType::Integer,
                    "Specific lesson number to search within (e.g. 1, 2, 3)",
                ),
        )
    }

    async fn execute(&self, arguments: &Value) -> Result<ToolOutput> {
        let args: SearchArgs = parse_arguments(SEARCH_TOOL_NAME, arguments)?;

        // A blank course name means no course filter.
        let course_name = args.course_name.as_deref().filter(|name| !name.trim().is_empty());

        let results = self
            .store
            .search(&args.query, course_name, args.lesson_number)
            .await?;

        if let Some(error) = results.error {
            return Ok(ToolOutput::with_sources(error, Vec::new()));
        }

        if results.is_empty() {
            let message = no_results_message(course_name, args.lesson_number);
            return Ok(ToolOutput::with_sources(message, Vec::new()));
        }

        debug!(query = %args.query, hits = results.len(), "content search");
        self.format_results(&results).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LektorError;
    use crate::store::{Catalog, ChunkMetadata, MemoryCourseStore};
    use crate::tools::testing::{ScriptedStore, SearchCall};
    use serde_json::json;

    fn results(items: &[(&str, Option<&str>, Option<i64>)]) -> SearchResults {
        SearchResults {
            documents: items.iter().map(|(doc, _, _)| doc.to_string()).collect(),
            metadata: items
                .iter()
                .map(|(_, title, lesson)| ChunkMetadata {
                    course_title: title.map(str::to_string),
                    lesson_number: *lesson,
                })
                .collect(),
            error: None,
        }
    }

    #[test]
    fn test_definition_schema() {
        let tool = ContentSearchTool::new(Arc::new(ScriptedStore::default()));
        let definition = tool.definition();

        assert_eq!(definition.name, SEARCH_TOOL_NAME);
        assert_eq!(definition.input_schema.required_names(), ["query"]);
        let kinds: Vec<_> = definition
            .input_schema
            .parameters()
            .iter()
            .map(|p| (p.name.as_str(), p.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("query", ParameterType::String),
                ("course_name", ParameterType::String),
                ("lesson_number", ParameterType::Integer),
            ]
        );
    }

    #[tokio::test]
    async fn test_passes_filters_to_store() {
        let store = Arc::new(ScriptedStore::with_results(results(&[(
            "Filtered content",
            Some("Filtered Course"),
            Some(5),
        )])));
        let tool = ContentSearchTool::new(store.clone());

        let output = tool
            .execute(&json!({"query": "topic", "course_name": "Filtered", "lesson_number": 5}))
            .await
            .unwrap();

        assert_eq!(
            store.last_search(),
            Some(SearchCall {
                query: "topic".to_string(),
                course_name: Some("Filtered".to_string()),
                lesson_number: Some(5),
            })
        );
        assert_eq!(output.text, "[Filtered Course - Lesson 5]\nFiltered content");
    }

    #[tokio::test]
    async fn test_empty_results_name_filters() {
        let tool = ContentSearchTool::new(Arc::new(ScriptedStore::default()));

        let output = tool
            .execute(&json!({"query": "anything", "course_name": "Nonexistent Course"}))
            .await
            .unwrap();
        assert_eq!(output.text, "No relevant content found in course 'Nonexistent Course'.");
        assert_eq!(output.sources, Some(Vec::new()));

        let output = tool
            .execute(&json!({"query": "anything", "course_name": "Test Course", "lesson_number": 99}))
            .await
            .unwrap();
        assert_eq!(
            output.text,
            "No relevant content found in course 'Test Course' in lesson 99."
        );

        let output = tool.execute(&json!({"query": ""})).await.unwrap();
        assert_eq!(output.text, "No relevant content found.");
    }

    #[tokio::test]
    async fn test_blank_course_name_is_no_filter() {
        let store = Arc::new(ScriptedStore::default());
        let tool = ContentSearchTool::new(store.clone());

        let output = tool
            .execute(&json!({"query": "x", "course_name": ""}))
            .await
            .unwrap();

        assert_eq!(output.text, "No relevant content found.");
        assert_eq!(store.last_search().unwrap().course_name, None);

        let output = tool
            .execute(&json!({"query": "x", "course_name": "  ", "lesson_number": 2}))
            .await
            .unwrap();
        assert_eq!(output.text, "No relevant content found in lesson 2.");
    }

    #[tokio::test]
    async fn test_blank_course_name_searches_whole_catalog() {
        let catalog: Catalog = serde_json::from_value(json!({
            "courses": [{
                "title": "MCP Fundamentals",
                "lessons": [{
                    "lesson_number": 1,
                    "lesson_title": "Servers",
                    "content": "Servers expose tools to clients."
                }]
            }]
        }))
        .unwrap();
        let tool = ContentSearchTool::new(Arc::new(MemoryCourseStore::from_catalog(catalog)));

        let output = tool
            .execute(&json!({"query": "servers", "course_name": ""}))
            .await
            .unwrap();

        assert_eq!(output.text, "[MCP Fundamentals - Lesson 1]\nServers expose tools to clients.");
    }

    #[tokio::test]
    async fn test_whole_float_lesson_number_is_accepted() {
        let store = Arc::new(ScriptedStore::default());
        let tool = ContentSearchTool::new(store.clone());

        tool.execute(&json!({"query": "x", "lesson_number": 2.0}))
            .await
            .unwrap();
        assert_eq!(store.last_search().unwrap().lesson_number, Some(2));

        let err = tool
            .execute(&json!({"query": "x", "lesson_number": 2.5}))
            .await
            .unwrap_err();
        assert!(matches!(err, LektorError::InvalidArguments(_)));

        tool.execute(&json!({"query": "x", "lesson_number": null}))
            .await
            .unwrap();
        assert_eq!(store.last_search().unwrap().lesson_number, None);
    }

    #[tokio::test]
    async fn test_upstream_error_payload_is_returned_as_text() {
        let tool = ContentSearchTool::new(Arc::new(ScriptedStore::with_results(
            SearchResults::from_error("Vector store connection failed"),
        )));

        let output = tool.execute(&json!({"query": "x"})).await.unwrap();
        assert_eq!(output.text, "Vector store connection failed");
    }

    #[tokio::test]
    async fn test_two_courses_produce_ordered_sources() {
        let mut store = ScriptedStore::with_results(results(&[
            ("First result content", Some("Course A"), Some(1)),
            ("Second result content", Some("Course B"), Some(2)),
        ]));
        store
            .links
            .insert(("Course A".to_string(), 1), "https://example.com/a/1".to_string());
        let tool = ContentSearchTool::new(Arc::new(store));

        let output = tool.execute(&json!({"query": "compare"})).await.unwrap();

        assert_eq!(
            output.text,
            "[Course A - Lesson 1]\nFirst result content\n\n[Course B - Lesson 2]\nSecond result content"
        );
        assert_eq!(
            output.sources,
            Some(vec![
                SourceRecord {
                    text: "Course A - Lesson 1".to_string(),
                    link: Some("https://example.com/a/1".to_string()),
                },
                SourceRecord {
                    text: "Course B - Lesson 2".to_string(),
                    link: None,
                },
            ])
        );
    }

    #[tokio::test]
    async fn test_missing_metadata_renders_placeholders() {
        let tool = ContentSearchTool::new(Arc::new(ScriptedStore::with_results(results(&[
            ("Content with missing metadata", None, None),
            ("Course content without lesson", Some("Course Only"), None),
        ]))));

        let output = tool.execute(&json!({"query": "x"})).await.unwrap();

        assert!(output.text.starts_with("[unknown]\nContent with missing metadata"));
        assert!(output.text.contains("[Course Only]\nCourse content without lesson"));
        let sources = output.sources.unwrap();
        assert_eq!(sources[1].text, "Course Only");
        assert_eq!(sources[1].link, None);
    }

    #[tokio::test]
    async fn test_missing_query_propagates() {
        let tool = ContentSearchTool::new(Arc::new(ScriptedStore::default()));

        let err = tool.execute(&json!({"course_name": "MCP"})).await.unwrap_err();
        assert!(matches!(err, LektorError::InvalidArguments(_)));

        let err = tool
            .execute(&json!({"query": "x", "lesson_number": "three"}))
            .await
            .unwrap_err();
        assert!(matches!(err, LektorError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = ScriptedStore {
            fail_search: true,
            ..ScriptedStore::default()
        };
        let tool = ContentSearchTool::new(Arc::new(store));

        let err = tool.execute(&json!({"query": "x"})).await.unwrap_err();
        assert!(matches!(err, LektorError::Store(_)));
    }
}
