//! Tools the completion service can ask to run.
//!
//! Every tool describes itself with a [`ToolDefinition`] and executes against
//! JSON arguments. Expected domain outcomes ("no results", "no such course",
//! an upstream error payload) come back as ordinary text; malformed
//! invocations are returned as [`LektorError::InvalidArguments`] and are never
//! converted to text by the tool itself.

mod outline;
mod registry;
mod search;

pub use outline::{OutlineTool, OUTLINE_TOOL_NAME};
pub use registry::ToolRegistry;
pub use search::{ContentSearchTool, SEARCH_TOOL_NAME};

use crate::error::{LektorError, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;

/// JSON type of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    String,
    Integer,
    Number,
    Boolean,
}

/// A single named parameter in a tool's input schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterType,
    pub description: String,
}

/// Object schema for tool input, with parameters kept in declaration order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputSchema {
    properties: Vec<Parameter>,
    required: Vec<String>,
}

impl InputSchema {
    /// Create an empty object schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &str, kind: ParameterType, description: &str) -> Self {
        self.required.push(name.to_string());
        self.optional(name, kind, description)
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &str, kind: ParameterType, description: &str) -> Self {
        self.properties.push(Parameter {
            name: name.to_string(),
            kind,
            description: description.to_string(),
        });
        self
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.properties
    }

    /// Names of required parameters.
    pub fn required_names(&self) -> &[String] {
        &self.required
    }
}

#[derive(Serialize)]
struct PropertySpec<'a> {
    #[serde(rename = "type")]
    kind: ParameterType,
    description: &'a str,
}

struct Properties<'a>(&'a [Parameter]);

impl Serialize for Properties<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for parameter in self.0 {
            map.serialize_entry(
                &parameter.name,
                &PropertySpec {
                    kind: parameter.kind,
                    description: &parameter.description,
                },
            )?;
        }
        map.end()
    }
}

impl Serialize for InputSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "object")?;
        map.serialize_entry("properties", &Properties(&self.properties))?;
        map.serialize_entry("required", &self.required)?;
        map.end()
    }
}

/// Machine-readable description of a tool, as offered to the completion service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: InputSchema,
}

impl ToolDefinition {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: InputSchema) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// A citation surfaced to the end user outside the answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    /// Display text, e.g. "Course Title - Lesson 2".
    pub text: String,
    /// Link to the lesson, when known.
    pub link: Option<String>,
}

/// Result of executing a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text handed back to the completion service.
    pub text: String,
    /// Sources produced by this execution. `None` for tools that do not track
    /// sources; `Some` replaces whatever the tool produced before.
    pub sources: Option<Vec<SourceRecord>>,
}

impl ToolOutput {
    /// Plain text output without sources.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sources: None,
        }
    }

    /// Text output together with the sources it was built from.
    pub fn with_sources(text: impl Into<String>, sources: Vec<SourceRecord>) -> Self {
        Self {
            text: text.into(),
            sources: Some(sources),
        }
    }
}

/// Trait implemented by every tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Describe the tool. Must be deterministic and free of side effects.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool with the arguments supplied by the completion service.
    async fn execute(&self, arguments: &Value) -> Result<ToolOutput>;
}

/// Deserialize tool arguments into a typed request.
pub(crate) fn parse_arguments<T: DeserializeOwned>(tool: &str, arguments: &Value) -> Result<T> {
    serde_json::from_value(arguments.clone())
        .map_err(|e| LektorError::InvalidArguments(format!("{}: {}", tool, e)))
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_serializes_in_declaration_order() {
        let schema = InputSchema::new()
            .required("query", ParameterType::String, "What to search for")
            .optional("course_name", ParameterType::String, "Course filter")
            .optional("lesson_number", ParameterType::Integer, "Lesson filter");

        let text = serde_json::to_string(&schema).unwrap();
        let query_at = text.find("\"query\"").unwrap();
        let course_at = text.find("\"course_name\"").unwrap();
        let lesson_at = text.find("\"lesson_number\"").unwrap();
        assert!(query_at < course_at && course_at < lesson_at);

        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["type"], "object");
        assert_eq!(value["required"], json!(["query"]));
        assert_eq!(value["properties"]["lesson_number"]["type"], "integer");
    }

    #[test]
    fn test_definition_wire_shape() {
        let definition = ToolDefinition::new(
            "get_course_outline",
            "Outline a course",
            InputSchema::new().required("course_name", ParameterType::String, "Course title"),
        );

        assert_eq!(
            serde_json::to_value(&definition).unwrap(),
            json!({
                "name": "get_course_outline",
                "description": "Outline a course",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "course_name": {"type": "string", "description": "Course title"}
                    },
                    "required": ["course_name"]
                }
            })
        );
    }

    #[test]
    fn test_parse_arguments_reports_tool_name() {
        #[derive(serde::Deserialize, Debug)]
        struct Args {
            #[allow(dead_code)]
            query: String,
        }

        let err = parse_arguments::<Args>("lookup", &json!({})).unwrap_err();
        match err {
            LektorError::InvalidArguments(msg) => {
                assert!(msg.starts_with("lookup:"));
                assert!(msg.contains("query"));
            }
            other => panic!("Expected InvalidArguments, got {:?}", other),
        }
    }
}
