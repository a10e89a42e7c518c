//! Course outline tool.

use super::{parse_arguments, InputSchema, ParameterType, Tool, ToolDefinition, ToolOutput};
use crate::error::Result;
use crate::store::{CourseMetadata, CourseStore};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Name under which the outline tool is offered.
pub const OUTLINE_TOOL_NAME: &str = "get_course_outline";

#[derive(Debug, Deserialize)]
struct OutlineArgs {
    course_name: String,
}

/// Returns a course's title, link and lesson list.
pub struct OutlineTool {
    store: Arc<dyn CourseStore>,
}

impl OutlineTool {
    /// Create an outline tool backed by the given store.
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }
}

fn format_outline(course: &CourseMetadata) -> String {
    let mut lines = vec![
        format!("**{}**", course.title),
        format!(
            "Course Link: {}",
            course.course_link.as_deref().unwrap_or("No link available")
        ),
        String::new(),
    ];

    if course.lessons.is_empty() {
        lines.push("No lessons found for this course.".to_string());
    } else {
        lines.push("**Lessons:**".to_string());
        for lesson in &course.lessons {
            lines.push(format!("{}. {}", lesson.lesson_number, lesson.lesson_title));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl Tool for OutlineTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            OUTLINE_TOOL_NAME,
            "Get a complete course outline including course title, course link, and all lessons",
            InputSchema::new().required(
                "course_name",
                ParameterType::String,
                "Course title to get outline for (partial matches work, e.g. 'MCP', 'Introduction')",
            ),
        )
    }

    async fn execute(&self, arguments: &Value) -> Result<ToolOutput> {
        let args: OutlineArgs = parse_arguments(OUTLINE_TOOL_NAME, arguments)?;

        let Some(title) = self.store.resolve_course_name(&args.course_name).await? else {
            return Ok(ToolOutput::text(format!(
                "No course found matching '{}'",
                args.course_name
            )));
        };

        let courses = self.store.all_courses().await?;
        match courses.iter().find(|course| course.title == title) {
            Some(course) => Ok(ToolOutput::text(format_outline(course))),
            None => Ok(ToolOutput::text(format!(
                "Course metadata not found for '{}'",
                title
            ))),
        }
    }
}
