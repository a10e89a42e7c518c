//! Course retrieval abstraction for Lektor.
//!
//! Tools reach course content only through the [`CourseStore`] trait. How
//! content is ranked or persisted is up to the implementation.

mod memory;

pub use memory::{Catalog, CatalogCourse, CatalogLesson, MemoryCourseStore};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Metadata attached to a retrieved chunk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Title of the course the chunk belongs to.
    pub course_title: Option<String>,
    /// Lesson number within the course.
    pub lesson_number: Option<i64>,
}

/// Outcome of a content search.
///
/// `documents` and `metadata` are parallel lists. `error` carries an upstream
/// error payload that should be shown to the model instead of results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub documents: Vec<String>,
    pub metadata: Vec<ChunkMetadata>,
    pub error: Option<String>,
}

impl SearchResults {
    /// Results carrying only an error payload.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether no documents were found.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of documents found.
    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// A lesson entry in course metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonMetadata {
    pub lesson_number: i64,
    pub lesson_title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
}

/// Descriptive metadata for a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMetadata {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<LessonMetadata>,
}

/// Trait for course retrieval backends.
#[async_trait]
pub trait CourseStore: Send + Sync {
    /// Search course content, optionally restricted to a course (partial name)
    /// and/or a lesson number.
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> Result<SearchResults>;

    /// Resolve a partial course name to a canonical course title.
    async fn resolve_course_name(&self, partial: &str) -> Result<Option<String>>;

    /// Metadata for every known course.
    async fn all_courses(&self) -> Result<Vec<CourseMetadata>>;

    /// Link for a specific lesson, if one is known.
    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>>;
}
