//! Plain-language chunk explanations from a chat-completion model.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use reporag_llm::{LlmProvider, Message};

use crate::error::Result;

const SYSTEM_INSTRUCTIONS: [&str; 5] = [
    "Add general context to code segments to make them more understandable.",
    "Please provide a brief description of what the code does.",
    "Don\u{2019}t include code in your answer.",
    "Provide a comprehensive explanation.",
    "Limit your response to maximum 80 words.",
];

/// Explanation attached to a chunk as its stored `context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub file_name: String,
    pub explanation: String,
}

pub struct Annotator<P: LlmProvider> {
    provider: Arc<P>,
}

impl<P: LlmProvider> Annotator<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    /// Ask the model for a short code-free explanation of `chunk_text`.
    /// The ~80 word cap is left to the model.
    ///
    /// # Errors
    ///
    /// Returns [`crate::IndexError::Llm`] if the chat call fails.
    pub async fn annotate(&self, chunk_text: &str, file_name: &str) -> Result<Annotation> {
        let explanation = self.provider.chat(&annotation_messages(chunk_text)).await?;
        Ok(Annotation {
            file_name: file_name.to_owned(),
            explanation: explanation.trim().to_owned(),
        })
    }
}

fn annotation_messages(chunk_text: &str) -> Vec<Message> {
    let mut messages: Vec<Message> = SYSTEM_INSTRUCTIONS
        .iter()
        .map(|s| Message::system(*s))
        .collect();
    messages.push(Message::user(format!("Here is the code segment: {chunk_text}.")));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use reporag_llm::Role;
    use reporag_llm::mock::MockProvider;

    #[test]
    fn messages_are_five_system_then_user() {
        let msgs = annotation_messages("fn main() {}");
        assert_eq!(msgs.len(), 6);
        assert!(msgs[..5].iter().all(|m| m.role == Role::System));
        assert_eq!(msgs[4].content, "Limit your response to maximum 80 words.");
        assert_eq!(msgs[5].role, Role::User);
        assert_eq!(msgs[5].content, "Here is the code segment: fn main() {}.");
    }

    #[tokio::test]
    async fn annotate_wraps_trimmed_response() {
        let mock = MockProvider::with_responses(vec!["  Prints a greeting.\n".into()]);
        let annotator = Annotator::new(Arc::new(mock.clone()));
        let a = annotator.annotate("print('hi')", "hello.py").await.unwrap();
        assert_eq!(a.file_name, "hello.py");
        assert_eq!(a.explanation, "Prints a greeting.");
        assert_eq!(mock.chat_calls(), 1);
        assert!(mock.chat_history()[0][5].content.contains("print('hi')"));
    }

    #[tokio::test]
    async fn chat_failure_propagates() {
        let annotator = Annotator::new(Arc::new(MockProvider::failing()));
        let err = annotator.annotate("x", "a.py").await.unwrap_err();
        assert!(matches!(err, crate::IndexError::Llm(_)));
    }
}
