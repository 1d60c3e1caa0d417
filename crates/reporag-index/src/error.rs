//! Error types for reporag-index.

use reporag_store::StoreError;

/// Errors raised by the chunking, embedding and retrieval pipeline.
///
/// An unknown file extension is not an error: the splitter falls back to a
/// generic strategy and reports it through [`crate::splitter::SplitStrategy`].
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A chat-completion or embedding call failed.
    #[error("LLM error: {0}")]
    Llm(#[from] reporag_llm::LlmError),

    /// Chunk store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The token encoding could not be loaded.
    #[error("tokenizer unavailable: {0}")]
    Tokenizer(String),

    /// Tree-sitter parsing error.
    #[error("parse failed: {0}")]
    Parse(String),

    /// A vector does not have the expected number of dimensions.
    #[error("vector has {actual} dimensions, expected {expected}")]
    Dimension { expected: usize, actual: usize },

    /// Invalid chunking or pipeline configuration.
    #[error("invalid config: {0}")]
    Config(String),
}

impl IndexError {
    /// Failures of the network or the backing store, as opposed to failures
    /// confined to one chunk's content.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Llm(e) => e.is_transport(),
            Self::Store(StoreError::Sqlite(_) | StoreError::Migration(_)) => true,
            #[cfg(feature = "qdrant")]
            Self::Store(StoreError::Qdrant(_)) => true,
            _ => false,
        }
    }
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
