//! Interactive chat command.

use super::Session;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, mut settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'lektor config path' to find the configuration file.");
        return Err(e.into());
    }

    if let Some(model) = model {
        settings.completion.model = model;
    }

    let session = Session::open(&settings)?;
    let mut history = ChatHistory::new(settings.chat.max_history);

    println!("\n{}", style("Lektor Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about your courses, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            history.clear();
            Output::info("Conversation history cleared.");
            continue;
        }

        let summary = history.summary();
        match session.ask(input, summary.as_deref()).await {
            Ok(answer) => {
                debug!(rounds = answer.rounds, calls = answer.calls, "chat answer");
                println!("\n{} {}\n", style("Lektor:").cyan().bold(), answer.text);
                for (i, source) in answer.sources.iter().enumerate() {
                    Output::source(i + 1, source);
                }
                if !answer.sources.is_empty() {
                    println!();
                }
                history.push(input, &answer.text);
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}

/// The most recent exchanges of a chat, rendered as a plain-text summary.
#[derive(Debug)]
struct ChatHistory {
    exchanges: VecDeque<(String, String)>,
    max_exchanges: usize,
}

impl ChatHistory {
    fn new(max_exchanges: usize) -> Self {
        Self {
            exchanges: VecDeque::new(),
            max_exchanges,
        }
    }

    fn push(&mut self, question: &str, answer: &str) {
        if self.max_exchanges == 0 {
            return;
        }
        self.exchanges.push_back((question.to_string(), answer.to_string()));
        while self.exchanges.len() > self.max_exchanges {
            self.exchanges.pop_front();
        }
    }

    fn clear(&mut self) {
        self.exchanges.clear();
    }

    fn summary(&self) -> Option<String> {
        if self.exchanges.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .exchanges
            .iter()
            .map(|(question, answer)| format!("User: {}\nAssistant: {}", question, answer))
            .collect();
        Some(lines.join("\n"))
    }
}
