//! Tools command: print the definitions offered to the model.

use super::course_tools;
use crate::store::MemoryCourseStore;
use anyhow::Result;
use std::sync::Arc;

/// Run the tools command.
pub fn run_tools() -> Result<()> {
    let registry = course_tools(Arc::new(MemoryCourseStore::new()))?;
    let json = serde_json::to_string_pretty(&registry.definitions())?;
    println!("{}", json);
    Ok(())
}
