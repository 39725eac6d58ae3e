//! Scripted stand-ins for the model, shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::{Completion, CompletionRequest, TextGenerator};
use crate::error::InferenceError;
use crate::inference::InferenceProvider;
use crate::types::{InferenceRequest, InferenceResponse};

/// Answers every completion with the same reply and records the prompts.
pub struct ScriptedGenerator {
    reply: Result<Completion, String>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn replying(completion: Completion) -> Self {
        Self {
            reply: Ok(completion),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: CompletionRequest) -> Result<Completion, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);
        self.reply.clone().map_err(InferenceError::Request)
    }
}

/// Plays back queued inference responses in order.
pub struct MockProvider {
    responses: Mutex<VecDeque<Result<InferenceResponse, InferenceError>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl MockProvider {
    pub fn new(responses: Vec<InferenceResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_error(responses: Vec<InferenceResponse>, error: InferenceError) -> Self {
        let provider = Self::new(responses);
        provider.responses.lock().unwrap().push_back(Err(error));
        provider
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceProvider for MockProvider {
    async fn infer(&self, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(InferenceError::Request("no more mock responses".into())))
    }
}
