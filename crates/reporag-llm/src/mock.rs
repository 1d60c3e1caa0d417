//! Test-only mock LLM provider.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::provider::{LlmProvider, Message};

/// Scripted provider. Clones share their queues and counters, so a test can
/// hand a clone to the pipeline and inspect the original afterwards.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<String>>>,
    embeddings: Arc<Mutex<VecDeque<Vec<f32>>>>,
    seen: Arc<Mutex<Vec<Vec<Message>>>>,
    embedded: Arc<Mutex<Vec<String>>>,
    chat_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
    /// HTTP status to fail with, keyed by 1-based chat call number.
    chat_statuses: Arc<Mutex<HashMap<usize, u16>>>,
    /// Reject any chat whose messages exceed this many bytes with a 400.
    pub max_prompt_bytes: Option<usize>,
    pub default_response: String,
    /// Returned once the scripted embedding queue is drained.
    pub embedding: Vec<f32>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::default(),
            embeddings: Arc::default(),
            seen: Arc::default(),
            embedded: Arc::default(),
            chat_calls: Arc::default(),
            embed_calls: Arc::default(),
            chat_statuses: Arc::default(),
            max_prompt_bytes: None,
            default_response: "mock response".into(),
            embedding: vec![0.0; 1536],
            supports_embeddings: true,
            fail_chat: false,
            fail_embed: false,
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Self::default()
        }
    }

    /// Queue embeddings to be returned in order, one per `embed` call.
    #[must_use]
    pub fn with_embeddings(mut self, embeddings: Vec<Vec<f32>>) -> Self {
        if let Some(first) = embeddings.first() {
            self.embedding = vec![0.0; first.len()];
        }
        self.embeddings = Arc::new(Mutex::new(embeddings.into()));
        self
    }

    /// Make the `call`-th chat request (1-based) fail with `status`.
    #[must_use]
    pub fn with_chat_status(self, call: usize, status: u16) -> Self {
        self.chat_statuses.lock().unwrap().insert(call, status);
        self
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Every message list passed to `chat`, oldest first.
    #[must_use]
    pub fn chat_history(&self) -> Vec<Vec<Message>> {
        self.seen.lock().unwrap().clone()
    }

    /// Every text passed to `embed`, oldest first.
    #[must_use]
    pub fn embedded_texts(&self) -> Vec<String> {
        self.embedded.lock().unwrap().clone()
    }
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, crate::LlmError> {
        let call = self.chat_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        if let Some(&status) = self.chat_statuses.lock().unwrap().get(&call) {
            return Err(status_error(status));
        }
        if let Some(max) = self.max_prompt_bytes
            && messages.iter().map(|m| m.content.len()).sum::<usize>() > max
        {
            return Err(status_error(400));
        }
        let mut responses = self.responses.lock().unwrap();
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| self.default_response.clone()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        self.embedded.lock().unwrap().push(text.to_owned());
        if !self.supports_embeddings {
            return Err(crate::LlmError::EmbedUnsupported { provider: "mock" });
        }
        if self.fail_embed {
            return Err(crate::LlmError::Other("mock embedding error".into()));
        }
        let mut queued = self.embeddings.lock().unwrap();
        Ok(queued.pop_front().unwrap_or_else(|| self.embedding.clone()))
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }
}

fn status_error(status: u16) -> crate::LlmError {
    if status == 429 {
        crate::LlmError::RateLimited { provider: "mock" }
    } else {
        crate::LlmError::Status {
            provider: "mock",
            status,
        }
    }
}
