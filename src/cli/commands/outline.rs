//! Outline command: run the outline tool directly.

use super::open_store;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::tools::{OutlineTool, Tool};
use anyhow::Result;
use serde_json::json;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Outline, &settings) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let tool = OutlineTool::new(open_store(&settings)?);
    let output = tool.execute(&json!({ "course_name": course })).await?;

    println!("\n{}\n", output.text);
    Ok(())
}
