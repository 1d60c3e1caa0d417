use ollama_rs::error::OllamaError;

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rate limited by {provider}")]
    RateLimited { provider: &'static str },

    #[error("{provider} API request failed (status {status})")]
    Status { provider: &'static str, status: u16 },

    #[error("empty response from {provider}")]
    EmptyResponse { provider: &'static str },

    #[error("embedding not supported by {provider}")]
    EmbedUnsupported { provider: &'static str },

    #[error("Ollama request failed: {0}")]
    Ollama(#[from] OllamaError),

    #[error("{0}")]
    Other(String),
}

impl LlmError {
    /// Whether the failure came from the transport or the remote service as a
    /// whole, so that every following request would fail the same way.
    ///
    /// Request-specific rejections (400, 404, 413, 422, ...) are not transport
    /// failures: another input may well succeed.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_decode(),
            Self::RateLimited { .. } => true,
            Self::Status { status, .. } => is_transport_status(*status),
            Self::Ollama(OllamaError::ReqwestError(e)) => !e.is_decode(),
            _ => false,
        }
    }
}

fn is_transport_status(status: u16) -> bool {
    matches!(status, 401 | 403 | 407 | 408 | 429) || status >= 500
}

pub type Result<T> = std::result::Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_names_provider() {
        let err = LlmError::Status {
            provider: "openai",
            status: 500,
        };
        assert_eq!(err.to_string(), "openai API request failed (status 500)");
        assert!(err.is_transport());
    }

    #[test]
    fn empty_response_is_not_transport() {
        let err = LlmError::EmptyResponse { provider: "ollama" };
        assert!(!err.is_transport());
    }

    #[test]
    fn request_specific_statuses_are_not_transport() {
        for status in [400, 404, 413, 422] {
            let err = LlmError::Status {
                provider: "openai",
                status,
            };
            assert!(!err.is_transport(), "status {status}");
        }
    }

    #[test]
    fn service_wide_statuses_are_transport() {
        for status in [401, 403, 408, 429, 500, 502, 503] {
            let err = LlmError::Status {
                provider: "azure-openai",
                status,
            };
            assert!(err.is_transport(), "status {status}");
        }
    }

    #[test]
    fn ollama_service_error_is_not_transport() {
        let err = LlmError::Ollama(OllamaError::Other("model not found".into()));
        assert!(!err.is_transport());
    }
}
