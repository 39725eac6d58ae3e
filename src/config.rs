use crate::tools::summarize::DEFAULT_CHAR_LIMIT;

/// Chat assistant configuration.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub model: String,
    pub max_tokens: u32,
    pub max_turns: usize,
    /// Prepended to the generated system prompt.
    pub system_prompt: Option<String>,
    /// How much extracted page text the summarizer sends to the model.
    pub summary_char_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".into(),
            max_tokens: 4096,
            max_turns: 20,
            system_prompt: None,
            summary_char_limit: DEFAULT_CHAR_LIMIT,
        }
    }
}
