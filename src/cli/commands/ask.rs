//! Ask command implementation.

use super::Session;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use tracing::debug;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    history: Option<String>,
    rounds: Option<usize>,
    model: Option<String>,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lektor config path' to find the configuration file.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.completion.model = model;
    }
    if let Some(rounds) = rounds {
        settings.agent.max_tool_rounds = rounds;
    }

    let session = Session::open(&settings)?;
    let spinner = Output::spinner("Searching course materials...");

    match session.ask(question, history.as_deref()).await {
        Ok(answer) => {
            spinner.finish_and_clear();
            debug!(rounds = answer.rounds, calls = answer.calls, "answer ready");

            if answer.text.is_empty() {
                Output::warning("The model returned no text.");
            } else {
                println!("\n{}\n", answer.text);
            }

            if !answer.tool_calls.is_empty() {
                Output::header("Tool calls");
                Output::tool_calls(&answer.tool_calls);
            }

            if !answer.sources.is_empty() {
                Output::header("Sources");
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
