use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use super::html::{strip_markup, truncate_chars};
use super::outcome::SummaryResult;
use super::Tool;
use crate::completion::{CompletionRequest, TextGenerator};

pub const SUMMARIZE_URL: &str = "summarizeUrl";

/// Page text beyond this many characters is not sent to the model.
pub const DEFAULT_CHAR_LIMIT: usize = 4000;

#[derive(Debug, Deserialize)]
pub struct SummarizeInput {
    pub url: Url,
}

/// Every way a summary can fail. The display strings are what the model and
/// the user see.
#[derive(Debug, thiserror::Error)]
enum SummarizeError {
    #[error("Network error when fetching the page: {0}")]
    Network(String),
    #[error("Failed to fetch page: HTTP status {0}")]
    HttpStatus(u16),
    #[error("Content is not HTML (type: {0}). Cannot summarize.")]
    NotHtml(String),
    #[error("No text content found on the page to summarize.")]
    EmptyContent,
    #[error("AI summarization failed: {0}")]
    Model(String),
}

/// Fetches a page, strips it to text and asks the model for a summary.
/// One GET, at most one completion, no retries.
pub struct SummarizeUrlTool {
    client: reqwest::Client,
    generator: Arc<dyn TextGenerator>,
    model: String,
    char_limit: usize,
}

impl SummarizeUrlTool {
    pub fn new(generator: Arc<dyn TextGenerator>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            generator,
            model: model.into(),
            char_limit: DEFAULT_CHAR_LIMIT,
        }
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    async fn fetch_text(&self, url: &Url) -> Result<String, SummarizeError> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SummarizeError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SummarizeError::HttpStatus(status.as_u16()));
        }

        if let Some(content_type) = resp.headers().get(CONTENT_TYPE) {
            let content_type = String::from_utf8_lossy(content_type.as_bytes()).into_owned();
            let lower = content_type.to_ascii_lowercase();
            if !lower.contains("text/html") && !lower.contains("application/xhtml+xml") {
                return Err(SummarizeError::NotHtml(content_type));
            }
        }

        let body = resp
            .text()
            .await
            .map_err(|e| SummarizeError::Network(e.to_string()))?;

        let text = strip_markup(&body);
        if text.is_empty() {
            return Err(SummarizeError::EmptyContent);
        }
        Ok(text)
    }

    async fn summarize(&self, url: &Url) -> Result<String, SummarizeError> {
        let text = self.fetch_text(url).await?;
        let excerpt = truncate_chars(&text, self.char_limit);
        debug!(%url, chars = excerpt.chars().count(), "summarizing page text");

        let completion = self
            .generator
            .generate(CompletionRequest {
                model: self.model.clone(),
                prompt: summary_prompt(url, excerpt),
            })
            .await
            .map_err(|e| SummarizeError::Model(e.to_string()))?;

        Ok(completion.text().to_string())
    }
}

fn summary_prompt(url: &Url, text: &str) -> String {
    format!(
        "Summarize the following text extracted from the web page at {url}. \
         Focus on the main points and keep it to a few short paragraphs.\n\n{text}"
    )
}

#[async_trait]
impl Tool for SummarizeUrlTool {
    const NAME: &'static str = SUMMARIZE_URL;

    type Input = SummarizeInput;
    type Output = SummaryResult;

    fn description(&self) -> &'static str {
        "Fetch a web page by URL and return a short summary of its text content."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "format": "uri",
                    "description": "Absolute URL of the page to summarize"
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, input: SummarizeInput) -> SummaryResult {
        match self.summarize(&input.url).await {
            Ok(summary) => {
                info!(url = %input.url, "page summarized");
                SummaryResult::Success { summary }
            }
            Err(e) => {
                warn!(url = %input.url, error = %e, "page summary failed");
                SummaryResult::Failure {
                    error: e.to_string(),
                }
            }
        }
    }
}
