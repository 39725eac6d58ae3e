pub mod completion;
pub mod config;
pub mod conversation;
pub mod error;
pub mod events;
pub mod inference;
pub mod language;
pub mod message;
pub mod render;
pub mod tools;
pub mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub use completion::{Completion, CompletionRequest, ProviderGenerator, TextGenerator};
pub use config::ChatConfig;
pub use conversation::Conversation;
pub use error::{ChatError, InferenceError, ToolError};
pub use events::ChatEvent;
pub use inference::{AnthropicProvider, InferenceProvider, OpenAiProvider};
pub use language::{LanguagePreference, LanguageSelection, LANGUAGES, SOURCE_LANGUAGE};
pub use message::{MessagePart, Role, TranslatedMessage, UiMessage};
pub use render::{render, ToolView};
pub use tools::{
    SummarizeUrlTool, Tool, ToolCall, ToolHandler, ToolInvocation, ToolOutcome, ToolPipeline,
    ToolRegistry, TranslateTextTool,
};
pub use types::{ContentBlock, InferenceRequest, InferenceResponse, StopReason, Usage};

/// What one `send` produced.
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// The assistant message, already showing the translation if there is one.
    pub message: UiMessage,
    pub translation: Option<TranslatedMessage>,
    pub turns: usize,
    pub usage: Usage,
}

impl ChatReply {
    /// The text shown to the user.
    pub fn text(&self) -> &str {
        &self.message.content
    }
}

/// The chat assistant. Wire up a provider and go; the summarize and
/// translate tools complete through the same provider.
pub struct ChatAssistant {
    provider: Arc<dyn InferenceProvider>,
    conversation: Conversation,
    tools: ToolPipeline,
    config: ChatConfig,
}

impl ChatAssistant {
    pub fn new(provider: Arc<dyn InferenceProvider>, config: ChatConfig) -> Self {
        let generator: Arc<dyn TextGenerator> = Arc::new(
            ProviderGenerator::new(provider.clone()).with_max_tokens(config.max_tokens),
        );
        let registry = ToolRegistry::with_defaults(generator, &config);
        Self::with_registry(provider, registry, config)
    }

    /// Use a custom tool set instead of the defaults.
    pub fn with_registry(
        provider: Arc<dyn InferenceProvider>,
        registry: ToolRegistry,
        config: ChatConfig,
    ) -> Self {
        let mut conversation =
            Conversation::new(&config.model, config.max_tokens).with_tools(registry.schemas());
        if let Some(system) = &config.system_prompt {
            conversation = conversation.with_system(system);
        }
        Self {
            provider,
            conversation,
            tools: ToolPipeline::new(registry),
            config,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn tools(&self) -> &ToolPipeline {
        &self.tools
    }

    /// Runs until the model stops or max turns is reached.
    pub async fn send(
        &mut self,
        prompt: &str,
        language: &LanguageSelection,
    ) -> Result<ChatReply, ChatError> {
        self.conversation.add_prompt(prompt);
        self.run_loop(language, None, None).await
    }

    /// Cancellation is honored between turns and while waiting on the
    /// model. Tool calls already started run to completion.
    pub async fn send_with_cancel(
        &mut self,
        prompt: &str,
        language: &LanguageSelection,
        cancel: CancellationToken,
    ) -> Result<ChatReply, ChatError> {
        self.conversation.add_prompt(prompt);
        self.run_loop(language, Some(cancel), None).await
    }

    /// Like [`send`](Self::send), reporting progress on `tx`.
    pub async fn send_streaming(
        &mut self,
        prompt: &str,
        language: &LanguageSelection,
        tx: mpsc::Sender<ChatEvent>,
    ) -> Result<ChatReply, ChatError> {
        self.conversation.add_prompt(prompt);
        self.run_loop(language, None, Some(tx)).await
    }

    async fn run_loop(
        &mut self,
        language: &LanguageSelection,
        cancel: Option<CancellationToken>,
        tx: Option<mpsc::Sender<ChatEvent>>,
    ) -> Result<ChatReply, ChatError> {
        let mut total_usage = Usage::default();
        let mut final_text = String::new();
        let mut parts = Vec::new();

        for turn in 0..self.config.max_turns {
            if let Some(ref cancel) = cancel {
                if cancel.is_cancelled() {
                    info!(turn, "chat cancelled");
                    return Err(ChatError::Cancelled);
                }
            }

            if let Some(ref tx) = tx {
                let _ = tx.send(ChatEvent::TurnStart { turn }).await;
            }

            info!(turn, language = %language.code, "chat turn");

            let request = self.conversation.build_request(language);
            let result = if let Some(ref cancel) = cancel {
                tokio::select! {
                    result = self.provider.infer(request) => result,
                    _ = cancel.cancelled() => {
                        info!(turn, "chat cancelled during inference");
                        return Err(ChatError::Cancelled);
                    }
                }
            } else {
                self.provider.infer(request).await
            };

            let response = match result {
                Ok(response) => response,
                Err(e) => {
                    if let Some(ref tx) = tx {
                        let _ = tx
                            .send(ChatEvent::Error {
                                message: e.to_string(),
                            })
                            .await;
                    }
                    return Err(e.into());
                }
            };

            total_usage.accumulate(&response.usage);
            self.conversation.record_response(&response);

            let text = response.text();
            if !text.is_empty() {
                if let Some(ref tx) = tx {
                    let _ = tx
                        .send(ChatEvent::Text {
                            content: text.clone(),
                        })
                        .await;
                }
                parts.push(MessagePart::Text { text: text.clone() });
                final_text = text;
            }

            match response.stop_reason {
                StopReason::EndTurn => {
                    info!(turns = turn + 1, "chat finished");
                    return Ok(self
                        .finish(language, final_text, parts, turn + 1, total_usage, tx.as_ref())
                        .await);
                }
                StopReason::ToolUse => {
                    let calls: Vec<ToolCall> = response
                        .content
                        .into_iter()
                        .filter_map(|block| match block {
                            ContentBlock::ToolUse { id, name, input } => {
                                Some(ToolCall { id, name, input })
                            }
                            ContentBlock::Text(_) => None,
                        })
                        .collect();

                    if calls.is_empty() {
                        warn!(turn, "tool use without tool calls, stopping");
                        return Ok(self
                            .finish(language, final_text, parts, turn + 1, total_usage, tx.as_ref())
                            .await);
                    }

                    for invocation in self.tools.run(calls, tx.as_ref()).await {
                        if let Some(outcome) = invocation.outcome() {
                            self.conversation.record_tool_result(
                                &invocation.call_id,
                                &outcome.to_value().to_string(),
                                outcome.is_error(),
                            );
                        }
                        parts.push(MessagePart::ToolInvocation(invocation));
                    }
                }
                StopReason::MaxTokens => {
                    info!(turn, "response truncated, continuing");
                }
                StopReason::ContentFilter | StopReason::Other(_) => {
                    warn!(turn, reason = %response.stop_reason, "model stopped early");
                    return Ok(self
                        .finish(language, final_text, parts, turn + 1, total_usage, tx.as_ref())
                        .await);
                }
            }
        }

        warn!(max_turns = self.config.max_turns, "chat hit max turns limit");
        let turns = self.config.max_turns;
        Ok(self
            .finish(language, final_text, parts, turns, total_usage, tx.as_ref())
            .await)
    }

    async fn finish(
        &self,
        language: &LanguageSelection,
        final_text: String,
        parts: Vec<MessagePart>,
        turns: usize,
        usage: Usage,
        tx: Option<&mpsc::Sender<ChatEvent>>,
    ) -> ChatReply {
        let translation = self.translate_reply(&final_text, language).await;

        let mut message = UiMessage::assistant(final_text, parts);
        if let Some(ref translation) = translation {
            message.apply_translation(translation);
            if let Some(tx) = tx {
                if !translation.is_passthrough() {
                    let _ = tx.send(ChatEvent::Translation(translation.clone())).await;
                }
            }
        }

        if let Some(tx) = tx {
            let _ = tx.send(ChatEvent::Finished { turns }).await;
        }

        ChatReply {
            message,
            translation,
            turns,
            usage,
        }
    }

    /// Run the reply through the translate tool when the user reads another
    /// language. Empty replies have nothing to translate.
    async fn translate_reply(
        &self,
        text: &str,
        language: &LanguageSelection,
    ) -> Option<TranslatedMessage> {
        if text.trim().is_empty() {
            return None;
        }
        if language.is_source() {
            return Some(TranslatedMessage::passthrough(text, &language.code));
        }

        let input = json!({"text": text, "targetLanguage": language.code});
        let outcome = self.tools.execute(tools::TRANSLATE_TEXT, &input).await;
        if let Some(error) = outcome.error() {
            warn!(language = %language.code, error, "reply translation failed");
        }
        Some(TranslatedMessage::from_outcome(text, &language.code, &outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::find_language;
    use crate::test_support::MockProvider;
    use crate::tools::TranslationResult;
    use serde_json::json;

    fn text_response(text: &str) -> InferenceResponse {
        InferenceResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![ContentBlock::Text(text.into())],
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        }
    }

    fn tool_response(id: &str, name: &str, input: serde_json::Value) -> InferenceResponse {
        InferenceResponse {
            stop_reason: StopReason::ToolUse,
            content: vec![ContentBlock::ToolUse {
                id: id.into(),
                name: name.into(),
                input,
            }],
            usage: Usage::default(),
        }
    }

    fn selection(code: &str) -> LanguageSelection {
        find_language(code).map(LanguageSelection::from).unwrap()
    }

    fn config() -> ChatConfig {
        ChatConfig {
            model: "test-model".into(),
            max_tokens: 1024,
            ..ChatConfig::default()
        }
    }

    fn assistant(provider: &Arc<MockProvider>) -> ChatAssistant {
        ChatAssistant::new(provider.clone(), config())
    }

    #[tokio::test]
    async fn english_reply_is_not_translated() {
        let provider = Arc::new(MockProvider::new(vec![text_response("Hello!")]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Say hello", &LanguageSelection::default()).await.unwrap();
        assert_eq!(reply.text(), "Hello!");
        assert_eq!(reply.turns, 1);
        assert_eq!(reply.usage.input_tokens, 10);
        assert!(reply.translation.unwrap().is_passthrough());
        assert!(reply.message.original_text.is_none());
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn reply_translated_into_selected_language() {
        let provider = Arc::new(MockProvider::new(vec![
            text_response("Hello there"),
            text_response("Hola"),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Greet me", &selection("es")).await.unwrap();
        assert_eq!(reply.text(), "Hola");
        assert_eq!(reply.message.original_text.as_deref(), Some("Hello there"));
        assert_eq!(reply.message.target_language.as_deref(), Some("es"));
        assert!(reply.message.translation_error.is_none());

        let requests = provider.requests();
        assert!(requests[0].system.as_deref().unwrap().contains("Spanish (es)"));
        // the translation goes out as a bare completion
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].messages.len(), 1);
        assert!(requests[1].messages[0]["content"]
            .as_str()
            .unwrap()
            .contains("Hello there"));
    }

    #[tokio::test]
    async fn echoed_translation_keeps_original_and_reports_error() {
        let provider = Arc::new(MockProvider::new(vec![
            text_response("Hello"),
            text_response("hello"),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Greet me", &selection("fr")).await.unwrap();
        assert_eq!(reply.text(), "Hello");
        let error = reply.message.translation_error.unwrap();
        assert!(error.starts_with("Translation to fr might have failed"));
    }

    #[tokio::test]
    async fn empty_reply_skips_translation() {
        let provider = Arc::new(MockProvider::new(vec![InferenceResponse {
            stop_reason: StopReason::EndTurn,
            content: vec![],
            usage: Usage::default(),
        }]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Do nothing", &selection("de")).await.unwrap();
        assert_eq!(reply.text(), "");
        assert!(reply.translation.is_none());
        assert_eq!(provider.requests().len(), 1);
    }

    #[tokio::test]
    async fn tool_call_result_recorded_and_returned_as_part() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response("call_1", "translateText", json!({"text": "Hello", "targetLanguage": "de"})),
            text_response("Hallo"),
            text_response("It is \"Hallo\"."),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat
            .send("Translate Hello to German", &LanguageSelection::default())
            .await
            .unwrap();
        assert_eq!(reply.turns, 2);
        assert_eq!(reply.text(), "It is \"Hallo\".");

        let invocations: Vec<_> = reply.message.tool_invocations().collect();
        assert_eq!(invocations.len(), 1);
        assert_eq!(
            invocations[0].outcome(),
            Some(&ToolOutcome::Translate(TranslationResult::Success {
                translated_text: "Hallo".into()
            }))
        );

        let history = chat.conversation().messages();
        let tool_result = &history[2]["content"][0];
        assert_eq!(tool_result["type"], "tool_result");
        assert_eq!(tool_result["tool_use_id"], "call_1");
        assert_eq!(tool_result["content"], r#"{"translatedText":"Hallo"}"#);
        assert!(tool_result.get("tool_name").is_none());
    }

    #[tokio::test]
    async fn invalid_tool_input_resolves_as_error_without_aborting() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response("call_1", "translateText", json!({"text": "Hi", "targetLanguage": "x"})),
            text_response("Sorry, that language code is too short."),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Translate", &LanguageSelection::default()).await.unwrap();
        assert_eq!(reply.turns, 2);
        let invocation = reply.message.tool_invocations().next().unwrap();
        assert!(matches!(invocation.outcome(), Some(ToolOutcome::Rejected { .. })));

        let tool_result = &chat.conversation().messages()[2]["content"][0];
        assert_eq!(tool_result["is_error"], true);
        // the rejected call never reached the model
        assert_eq!(provider.requests().len(), 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_back() {
        let provider = Arc::new(MockProvider::new(vec![
            tool_response("call_1", "weather", json!({})),
            text_response("I can't check the weather."),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Weather?", &LanguageSelection::default()).await.unwrap();
        let view = render(reply.message.tool_invocations().next().unwrap());
        assert_eq!(view.to_string(), "Error running weather: unknown tool: weather");
    }

    #[tokio::test]
    async fn max_turns_enforcement() {
        let responses = (0..3)
            .map(|i| InferenceResponse {
                stop_reason: StopReason::ToolUse,
                content: vec![
                    ContentBlock::Text(format!("turn {i}")),
                    ContentBlock::ToolUse {
                        id: format!("call_{i}"),
                        name: "weather".into(),
                        input: json!({}),
                    },
                ],
                usage: Usage::default(),
            })
            .collect();
        let provider = Arc::new(MockProvider::new(responses));
        let mut chat = ChatAssistant::new(
            provider.clone(),
            ChatConfig {
                max_turns: 3,
                ..config()
            },
        );

        let reply = chat.send("Keep going", &LanguageSelection::default()).await.unwrap();
        assert_eq!(reply.turns, 3);
        assert_eq!(reply.text(), "turn 2");
    }

    #[tokio::test]
    async fn max_tokens_continues_to_next_turn() {
        let provider = Arc::new(MockProvider::new(vec![
            InferenceResponse {
                stop_reason: StopReason::MaxTokens,
                content: vec![ContentBlock::Text("partial".into())],
                usage: Usage::default(),
            },
            text_response("complete"),
        ]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Write a lot", &LanguageSelection::default()).await.unwrap();
        assert_eq!(reply.text(), "complete");
        assert_eq!(reply.turns, 2);
    }

    #[tokio::test]
    async fn content_filter_stops_the_loop() {
        let provider = Arc::new(MockProvider::new(vec![InferenceResponse {
            stop_reason: StopReason::ContentFilter,
            content: vec![ContentBlock::Text("I can't help with that.".into())],
            usage: Usage::default(),
        }]));
        let mut chat = assistant(&provider);

        let reply = chat.send("Something", &LanguageSelection::default()).await.unwrap();
        assert_eq!(reply.turns, 1);
        assert_eq!(reply.text(), "I can't help with that.");
    }

    #[tokio::test]
    async fn cancellation_before_first_turn() {
        let provider = Arc::new(MockProvider::new(vec![text_response("should not reach")]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut chat = assistant(&provider);
        let err = chat
            .send_with_cancel("anything", &LanguageSelection::default(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Cancelled));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn api_error_propagates_and_is_streamed() {
        let provider = Arc::new(MockProvider::with_error(
            vec![],
            InferenceError::ApiError {
                status: 429,
                body: "rate limited".into(),
            },
        ));
        let mut chat = assistant(&provider);
        let (tx, mut rx) = mpsc::channel(32);

        let err = chat
            .send_streaming("anything", &LanguageSelection::default(), tx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("429"));

        let mut saw_error = false;
        while let Ok(event) = rx.try_recv() {
            if let ChatEvent::Error { message } = event {
                saw_error = message.contains("rate limited");
            }
        }
        assert!(saw_error);
    }

    #[tokio::test]
    async fn streaming_emits_events_in_order() {
        let provider = Arc::new(MockProvider::new(vec![
            InferenceResponse {
                stop_reason: StopReason::ToolUse,
                content: vec![
                    ContentBlock::Text("Working...".into()),
                    ContentBlock::ToolUse {
                        id: "call_1".into(),
                        name: "translateText".into(),
                        input: json!({"text": "Good night", "targetLanguage": "it"}),
                    },
                ],
                usage: Usage::default(),
            },
            text_response("Buona notte"),
            text_response("Done!"),
            text_response("Fatto!"),
        ]));
        let mut chat = assistant(&provider);
        let (tx, mut rx) = mpsc::channel(32);

        let reply = chat.send_streaming("Test", &selection("it"), tx).await.unwrap();
        assert_eq!(reply.text(), "Fatto!");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }

        assert_eq!(events.len(), 8, "got {events:?}");
        assert!(matches!(events[0], ChatEvent::TurnStart { turn: 0 }));
        assert!(matches!(events[1], ChatEvent::Text { .. }));
        assert!(matches!(&events[2], ChatEvent::ToolInvocation(inv) if inv.is_pending()));
        assert!(matches!(&events[3], ChatEvent::ToolInvocation(inv) if !inv.is_pending()));
        assert!(matches!(events[4], ChatEvent::TurnStart { turn: 1 }));
        assert!(matches!(events[5], ChatEvent::Text { .. }));
        assert!(matches!(&events[6], ChatEvent::Translation(t) if t.displayed_text() == "Fatto!"));
        assert!(matches!(events[7], ChatEvent::Finished { turns: 2 }));
    }

    #[tokio::test]
    async fn custom_registry_replaces_defaults() {
        let provider = Arc::new(MockProvider::new(vec![text_response("Hi")]));
        let mut chat = ChatAssistant::with_registry(
            provider.clone(),
            ToolRegistry::new(),
            ChatConfig {
                system_prompt: Some("You are terse.".into()),
                ..config()
            },
        );
        assert!(chat.tools().is_empty());

        chat.send("Hello", &LanguageSelection::default()).await.unwrap();
        let request = &provider.requests()[0];
        assert!(request.tools.is_empty());
        assert!(request.system.as_deref().unwrap().starts_with("You are terse."));
    }
}
