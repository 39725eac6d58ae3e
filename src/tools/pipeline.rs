use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::invocation::{ToolCall, ToolInvocation};
use super::outcome::ToolOutcome;
use super::registry::ToolRegistry;
use crate::events::ChatEvent;

/// Runs a turn's tool calls and reports their lifecycle.
///
/// All calls are announced as pending before any of them starts. They then
/// run concurrently on the current task; each result is reported as soon as
/// it is ready. Nothing is retried and nothing is cancelled once started.
pub struct ToolPipeline {
    registry: ToolRegistry,
}

impl ToolPipeline {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Run one tool. Calls that cannot start (unknown tool, invalid input)
    /// become [`ToolOutcome::Rejected`].
    pub async fn execute(&self, name: &str, input: &Value) -> ToolOutcome {
        match self.registry.execute(name, input).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(tool = name, error = %e, "tool call rejected");
                ToolOutcome::Rejected {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Run a batch of calls. Returns the resolved invocations in call order.
    pub async fn run(
        &self,
        calls: Vec<ToolCall>,
        tx: Option<&mpsc::Sender<ChatEvent>>,
    ) -> Vec<ToolInvocation> {
        let pending: Vec<ToolInvocation> = calls.into_iter().map(ToolInvocation::pending).collect();

        if let Some(tx) = tx {
            for invocation in &pending {
                let _ = tx.send(ChatEvent::ToolInvocation(invocation.clone())).await;
            }
        }

        let mut resolved: Vec<Option<ToolInvocation>> = (0..pending.len()).map(|_| None).collect();

        let mut running: FuturesUnordered<_> = pending
            .into_iter()
            .enumerate()
            .map(|(idx, invocation)| async move {
                info!(tool = %invocation.tool_name, call_id = %invocation.call_id, "tool call started");
                let outcome = self.execute(&invocation.tool_name, &invocation.args).await;
                (idx, invocation, outcome)
            })
            .collect();

        while let Some((idx, invocation, outcome)) = running.next().await {
            let call_id = invocation.call_id.clone();
            match invocation.resolve(outcome) {
                Ok(done) => {
                    info!(
                        tool = %done.tool_name,
                        call_id = %call_id,
                        is_error = done.outcome().is_some_and(ToolOutcome::is_error),
                        "tool call finished"
                    );
                    if let Some(tx) = tx {
                        let _ = tx.send(ChatEvent::ToolInvocation(done.clone())).await;
                    }
                    resolved[idx] = Some(done);
                }
                Err(e) => warn!(call_id = %call_id, error = %e, "dropping tool result"),
            }
        }

        resolved.into_iter().flatten().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Access the underlying registry.
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tools::handler::{ToolDefinition, ToolHandler};
    use crate::tools::outcome::TranslationResult;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Sleeps for `args.delay_ms`, then echoes `args.text` as a translation.
    struct Delayed;

    #[async_trait]
    impl ToolHandler for Delayed {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "delayed".into(),
                description: "test".into(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn call(&self, input: &Value) -> Result<ToolOutcome, ToolError> {
            let delay = input["delay_ms"].as_u64().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok(TranslationResult::Success {
                translated_text: input["text"].as_str().unwrap_or("").to_string(),
            }
            .into())
        }
    }

    fn call(id: &str, name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    fn pipeline() -> ToolPipeline {
        ToolPipeline::new(ToolRegistry::new().add(Delayed))
    }

    #[tokio::test]
    async fn pending_precedes_result_for_every_call() {
        let (tx, mut rx) = mpsc::channel(32);
        let calls = vec![
            call("slow", "delayed", json!({"delay_ms": 60, "text": "a"})),
            call("fast", "delayed", json!({"delay_ms": 0, "text": "b"})),
        ];

        let resolved = pipeline().run(calls, Some(&tx)).await;
        drop(tx);

        let mut events = Vec::new();
        while let Some(ChatEvent::ToolInvocation(inv)) = rx.recv().await {
            events.push((inv.call_id.clone(), inv.is_pending()));
        }

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], ("slow".to_string(), true));
        assert_eq!(events[1], ("fast".to_string(), true));

        let mut first_seen: HashMap<String, bool> = HashMap::new();
        for (id, pending) in &events {
            if let Some(was_pending) = first_seen.get(id) {
                assert!(*was_pending && !pending, "{id} resolved before pending");
            } else {
                first_seen.insert(id.clone(), *pending);
            }
        }

        // the fast call finishes first, but results come back in call order
        assert_eq!(events[2].0, "fast");
        assert_eq!(resolved[0].call_id, "slow");
        assert_eq!(resolved[1].call_id, "fast");
        assert!(resolved.iter().all(|inv| !inv.is_pending()));
    }

    #[tokio::test]
    async fn unknown_tool_resolves_as_rejected() {
        let resolved = pipeline()
            .run(vec![call("c1", "weather", json!({}))], None)
            .await;
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved[0].outcome(),
            Some(&ToolOutcome::Rejected {
                error: "unknown tool: weather".into()
            })
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_affect_others() {
        use crate::completion::Completion;
        use crate::config::ChatConfig;
        use crate::test_support::ScriptedGenerator;
        use std::sync::Arc;

        let generator = Arc::new(ScriptedGenerator::replying(Completion::Text("Hallo".into())));
        let pipeline = ToolPipeline::new(ToolRegistry::with_defaults(
            generator.clone(),
            &ChatConfig::default(),
        ));

        let resolved = pipeline
            .run(
                vec![
                    call("bad", "summarizeUrl", json!({"url": "not a url"})),
                    call("good", "translateText", json!({"text": "Hello", "targetLanguage": "de"})),
                ],
                None,
            )
            .await;

        assert!(matches!(resolved[0].outcome(), Some(ToolOutcome::Rejected { .. })));
        assert_eq!(
            resolved[1].outcome(),
            Some(&ToolOutcome::Translate(TranslationResult::Success {
                translated_text: "Hallo".into()
            }))
        );
        // only the translation reached the model
        assert_eq!(generator.calls(), 1);
    }
}
