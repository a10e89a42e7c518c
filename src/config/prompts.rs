//! Prompt templates for Lektor.
//!
//! Prompts can be customized by placing an `agent.toml` file in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub agent: AgentPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for the tool-calling assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPrompts {
    /// Instruction text sent with every request.
    pub system: String,
    /// Wrapper applied to the user's question. Uses `{{query}}`.
    pub query: String,
}

impl Default for AgentPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant for course materials and educational content. You can call tools to look up course information.

Tools:
1. `search_course_content` finds specific passages in course lessons.
2. `get_course_outline` returns a course title, its link and the full lesson list.

How to use them:
- Questions about structure, lesson lists or what a course covers: use the outline tool.
- Questions about a concept or detail inside a course: use the content search tool.
- You may call tools in up to {{max_rounds}} sequential rounds, for example an outline first and then a targeted search.
- When comparing courses or lessons, gather each side before answering.
- If the tools return nothing useful, say so plainly.

Answering:
- General knowledge questions can be answered without tools.
- For outline questions, give the course title, course link and every lesson with its number and title.
- Do not describe your reasoning or mention the tools or search results.
- Be brief, accurate and instructive. Include a short example when it helps understanding.
"#
            .to_string(),

            query: "Answer this question about course materials: {{query}}".to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let agent_path = custom_path.join("agent.toml");
            if agent_path.exists() {
                let content = std::fs::read_to_string(&agent_path)?;
                prompts.agent = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Rendered instruction text for the assistant. `{{max_rounds}}` is left
    /// for the engine to fill in.
    pub fn system(&self) -> String {
        self.render_with_custom(&self.agent.system, &HashMap::new())
    }

    /// Wrap a user question in the query template.
    pub fn query(&self, question: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("query".to_string(), question.to_string());
        self.render_with_custom(&self.agent.query, &vars)
    }
}
