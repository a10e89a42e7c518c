//! In-memory course store.
//!
//! Loads a JSON catalog of courses and answers searches by term overlap.
//! Useful for testing, demos and small catalogs.

use super::{ChunkMetadata, CourseMetadata, CourseStore, LessonMetadata, SearchResults};
use crate::error::{LektorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// On-disk catalog format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub courses: Vec<CatalogCourse>,
}

/// A course entry in the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogCourse {
    pub title: String,
    #[serde(default)]
    pub course_link: Option<String>,
    #[serde(default)]
    pub instructor: Option<String>,
    #[serde(default)]
    pub lessons: Vec<CatalogLesson>,
}

/// A lesson entry in the catalog file. `content` is split into chunks on blank lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogLesson {
    pub lesson_number: i64,
    pub lesson_title: String,
    #[serde(default)]
    pub lesson_link: Option<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone)]
struct Chunk {
    lesson_number: i64,
    content: String,
    terms: HashSet<String>,
}

#[derive(Debug, Clone)]
struct CourseRecord {
    metadata: CourseMetadata,
    chunks: Vec<Chunk>,
}

impl From<CatalogCourse> for CourseRecord {
    fn from(course: CatalogCourse) -> Self {
        let chunks = course
            .lessons
            .iter()
            .flat_map(|lesson| {
                lesson
                    .content
                    .split("\n\n")
                    .map(str::trim)
                    .filter(|paragraph| !paragraph.is_empty())
                    .map(|paragraph| Chunk {
                        lesson_number: lesson.lesson_number,
                        content: paragraph.to_string(),
                        terms: terms(paragraph),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        let metadata = CourseMetadata {
            title: course.title,
            course_link: course.course_link,
            instructor: course.instructor,
            lessons: course
                .lessons
                .into_iter()
                .map(|lesson| LessonMetadata {
                    lesson_number: lesson.lesson_number,
                    lesson_title: lesson.lesson_title,
                    lesson_link: lesson.lesson_link,
                })
                .collect(),
        };

        Self { metadata, chunks }
    }
}

/// Lowercased alphanumeric words of at least two characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// In-memory course store.
pub struct MemoryCourseStore {
    courses: Vec<CourseRecord>,
    max_results: usize,
}

impl MemoryCourseStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            courses: Vec::new(),
            max_results: 5,
        }
    }

    /// Set the maximum number of chunks returned per search.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Build a store from a parsed catalog.
    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            courses: catalog.courses.into_iter().map(CourseRecord::from).collect(),
            max_results: 5,
        }
    }

    /// Load a store from a JSON catalog file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LektorError::Store(format!(
                "Course catalog not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let catalog: Catalog = serde_json::from_str(&content)?;
        Ok(Self::from_catalog(catalog))
    }

    /// Number of courses in the store.
    pub fn course_count(&self) -> usize {
        self.courses.len()
    }

    fn resolve(courses: &[CourseRecord], partial: &str) -> Option<String> {
        let needle = partial.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(course) = courses.iter().find(|c| c.metadata.title.to_lowercase() == needle) {
            return Some(course.metadata.title.clone());
        }

        if let Some(course) = courses
            .iter()
            .find(|c| c.metadata.title.to_lowercase().contains(&needle))
        {
            return Some(course.metadata.title.clone());
        }

        // Fall back to the title sharing the most words; earlier courses win ties.
        let wanted = terms(&needle);
        let mut best: Option<(usize, &CourseRecord)> = None;
        for course in courses {
            let overlap = terms(&course.metadata.title).intersection(&wanted).count();
            if overlap > 0 && best.map_or(true, |(top, _)| overlap > top) {
                best = Some((overlap, course));
            }
        }
        best.map(|(_, course)| course.metadata.title.clone())
    }
}

impl Default for MemoryCourseStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<i64>,
    ) -> Result<SearchResults> {
        let course_title = match course_name {
            Some(name) => match Self::resolve(&self.courses, name) {
                Some(title) => Some(title),
                None => {
                    return Ok(SearchResults::from_error(format!(
                        "No course found matching '{}'",
                        name
                    )))
                }
            },
            None => None,
        };

        let wanted = terms(query);
        let mut scored: Vec<(usize, &CourseRecord, &Chunk)> = self
            .courses
            .iter()
            .filter(|c| course_title.as_ref().map_or(true, |t| &c.metadata.title == t))
            .flat_map(|c| c.chunks.iter().map(move |chunk| (c, chunk)))
            .filter(|(_, chunk)| lesson_number.map_or(true, |n| chunk.lesson_number == n))
            .map(|(c, chunk)| (chunk.terms.intersection(&wanted).count(), c, chunk))
            .filter(|(score, _, _)| *score > 0)
            .collect();

        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(self.max_results);

        debug!(query, hits = scored.len(), "memory store search");

        let mut results = SearchResults::default();
        for (_, course, chunk) in scored {
            results.documents.push(chunk.content.clone());
            results.metadata.push(ChunkMetadata {
                course_title: Some(course.metadata.title.clone()),
                lesson_number: Some(chunk.lesson_number),
            });
        }

        Ok(results)
    }

    async fn resolve_course_name(&self, partial: &str) -> Result<Option<String>> {
        Ok(Self::resolve(&self.courses, partial))
    }

    async fn all_courses(&self) -> Result<Vec<CourseMetadata>> {
        Ok(self.courses.iter().map(|c| c.metadata.clone()).collect())
    }

    async fn lesson_link(&self, course_title: &str, lesson_number: i64) -> Result<Option<String>> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.metadata.title == course_title)
            .and_then(|c| {
                c.metadata
                    .lessons
                    .iter()
                    .find(|l| l.lesson_number == lesson_number)
            })
            .and_then(|l| l.lesson_link.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        serde_json::from_str(
            r#"{
                "courses": [
                    {
                        "title": "MCP: Build Rich-Context AI Apps",
                        "course_link": "https://example.com/mcp",
                        "instructor": "Elie",
                        "lessons": [
                            {
                                "lesson_number": 1,
                                "lesson_title": "Why MCP",
                                "lesson_link": "https://example.com/mcp/1",
                                "content": "MCP standardizes how applications provide context.\n\nServers expose tools and resources."
                            },
                            {
                                "lesson_number": 2,
                                "lesson_title": "Building a server",
                                "content": "A server registers tools with typed schemas."
                            }
                        ]
                    },
                    {
                        "title": "Retrieval Basics",
                        "lessons": [
                            {
                                "lesson_number": 1,
                                "lesson_title": "Embeddings",
                                "content": "Embeddings map text to vectors for retrieval."
                            }
                        ]
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_search_ranks_by_overlap() {
        let store = MemoryCourseStore::from_catalog(catalog());

        let results = store.search("server tools", None, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.documents[0], "A server registers tools with typed schemas.");
        assert_eq!(results.metadata[0].lesson_number, Some(2));
        assert!(results.error.is_none());
    }

    #[tokio::test]
    async fn test_search_filters() {
        let store = MemoryCourseStore::from_catalog(catalog());

        let results = store.search("tools", Some("mcp"), Some(1)).await.unwrap();
        assert_eq!(results.documents, vec!["Servers expose tools and resources."]);
        assert_eq!(
            results.metadata[0].course_title.as_deref(),
            Some("MCP: Build Rich-Context AI Apps")
        );

        let missing = store.search("tools", Some("Nonexistent Course"), None).await.unwrap();
        assert!(missing.is_empty());
        assert_eq!(
            missing.error.as_deref(),
            Some("No course found matching 'Nonexistent Course'")
        );
    }

    #[tokio::test]
    async fn test_search_respects_max_results() {
        let store = MemoryCourseStore::from_catalog(catalog()).with_max_results(1);
        let results = store.search("tools server retrieval", None, None).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_course_name() {
        let store = MemoryCourseStore::from_catalog(catalog());

        assert_eq!(
            store.resolve_course_name("retrieval basics").await.unwrap().as_deref(),
            Some("Retrieval Basics")
        );
        assert_eq!(
            store.resolve_course_name("MCP").await.unwrap().as_deref(),
            Some("MCP: Build Rich-Context AI Apps")
        );
        assert_eq!(
            store.resolve_course_name("context apps").await.unwrap().as_deref(),
            Some("MCP: Build Rich-Context AI Apps")
        );
        assert_eq!(store.resolve_course_name("Quantum Cooking").await.unwrap(), None);
        assert_eq!(store.resolve_course_name("  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_metadata_and_links() {
        let store = MemoryCourseStore::from_catalog(catalog());

        let courses = store.all_courses().await.unwrap();
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0].lessons.len(), 2);
        assert_eq!(courses[1].course_link, None);

        let title = "MCP: Build Rich-Context AI Apps";
        assert_eq!(
            store.lesson_link(title, 1).await.unwrap().as_deref(),
            Some("https://example.com/mcp/1")
        );
        assert_eq!(store.lesson_link(title, 2).await.unwrap(), None);
        assert_eq!(store.lesson_link("Unknown", 1).await.unwrap(), None);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, serde_json::to_string(&catalog()).unwrap()).unwrap();

        let store = MemoryCourseStore::from_json_file(&path).unwrap();
        assert_eq!(store.course_count(), 2);

        let missing = MemoryCourseStore::from_json_file(&dir.path().join("absent.json"));
        assert!(matches!(missing, Err(LektorError::Store(_))));
    }
}
