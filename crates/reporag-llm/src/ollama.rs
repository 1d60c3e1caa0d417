use ollama_rs::Ollama;
use ollama_rs::generation::chat::ChatMessage;
use ollama_rs::generation::chat::request::ChatMessageRequest;
use ollama_rs::generation::embeddings::request::{EmbeddingsInput, GenerateEmbeddingsRequest};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message, Role};

const DEFAULT_PORT: u16 = 11434;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Ollama,
    model: String,
    embedding_model: String,
}

impl OllamaProvider {
    #[must_use]
    pub fn new(base_url: &str, model: String, embedding_model: String) -> Self {
        let (host, port) = parse_host_port(base_url);
        Self {
            client: Ollama::new(host, port),
            model,
            embedding_model,
        }
    }
}

impl LlmProvider for OllamaProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        let ollama_messages: Vec<ChatMessage> = messages.iter().map(convert_message).collect();
        let request = ChatMessageRequest::new(self.model.clone(), ollama_messages);

        let response = self.client.send_chat_messages(request).await?;

        if response.message.content.is_empty() {
            return Err(LlmError::EmptyResponse { provider: "ollama" });
        }
        Ok(response.message.content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let request = GenerateEmbeddingsRequest::new(
            self.embedding_model.clone(),
            EmbeddingsInput::from(text),
        );

        let response = self.client.generate_embeddings(request).await?;

        response
            .embeddings
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse { provider: "ollama" })
    }

    fn supports_embeddings(&self) -> bool {
        !self.embedding_model.is_empty()
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "ollama"
    }
}

fn convert_message(msg: &Message) -> ChatMessage {
    let text = msg.content.clone();
    match msg.role {
        Role::System => ChatMessage::system(text),
        Role::User => ChatMessage::user(text),
        Role::Assistant => ChatMessage::assistant(text),
    }
}

fn parse_host_port(url: &str) -> (String, u16) {
    let url = url.trim_end_matches('/');
    if let Some(colon_pos) = url.rfind(':') {
        let port_str = &url[colon_pos + 1..];
        if let Ok(port) = port_str.parse::<u16>() {
            return (url[..colon_pos].to_string(), port);
        }
    }
    (url.to_string(), DEFAULT_PORT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_port_with_port() {
        let (host, port) = parse_host_port("http://localhost:11500/");
        assert_eq!(host, "http://localhost");
        assert_eq!(port, 11500);
    }

    #[test]
    fn parse_host_port_without_port() {
        let (host, port) = parse_host_port("http://ollama.internal");
        assert_eq!(host, "http://ollama.internal");
        assert_eq!(port, DEFAULT_PORT);
    }

    #[test]
    fn convert_message_keeps_role_and_text() {
        let converted = convert_message(&Message::system("be terse"));
        assert_eq!(
            converted.role,
            ollama_rs::generation::chat::MessageRole::System
        );
        assert_eq!(converted.content, "be terse");

        let converted = convert_message(&Message::user("what does main do?"));
        assert_eq!(converted.role, ollama_rs::generation::chat::MessageRole::User);
    }

    #[test]
    fn supports_embeddings_when_model_set() {
        let p = OllamaProvider::new("http://localhost:11434", "llama3".into(), "nomic".into());
        assert!(p.supports_embeddings());
        assert_eq!(p.name(), "ollama");

        let p = OllamaProvider::new("http://localhost:11434", "llama3".into(), String::new());
        assert!(!p.supports_embeddings());
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_failure() {
        let p = OllamaProvider::new("http://127.0.0.1:1", "m".into(), "e".into());
        let err = p.chat(&[Message::user("hi")]).await.unwrap_err();
        assert!(err.to_string().contains("Ollama request failed"));
        assert!(err.is_transport());

        let err = p.embed("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Ollama(_)));
        assert!(err.is_transport());
    }
}
