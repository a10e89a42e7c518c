//! CLI output formatting utilities.

use crate::agent::ToolCallRecord;
use crate::tools::SourceRecord;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a numbered source with its link.
    pub fn source(index: usize, source: &SourceRecord) {
        match &source.link {
            Some(link) => println!(
                "  {} {} {}",
                style(format!("{}.", index)).cyan(),
                style(&source.text).bold(),
                style(link).dim()
            ),
            None => println!("  {} {}", style(format!("{}.", index)).cyan(), style(&source.text).bold()),
        }
    }

    /// Print the tool calls made while answering.
    pub fn tool_calls(calls: &[ToolCallRecord]) {
        for call in calls {
            println!("  {} {}", style("*").cyan(), style(call.to_string()).dim());
        }
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(template);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
