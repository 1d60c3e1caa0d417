//! Fixed-dimensionality embeddings of annotated chunks and queries.

use std::sync::Arc;

use reporag_llm::LlmProvider;

use crate::annotator::Annotation;
use crate::error::{IndexError, Result};

pub const DEFAULT_DIMENSIONS: usize = 1536;

pub struct Embedder<P: LlmProvider> {
    provider: Arc<P>,
    dimensions: usize,
}

impl<P: LlmProvider> Embedder<P> {
    #[must_use]
    pub fn new(provider: Arc<P>, dimensions: usize) -> Self {
        Self {
            provider,
            dimensions,
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// One embedding call; the result must have exactly [`Self::dimensions`] entries.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Llm`] if the call fails and [`IndexError::Dimension`]
    /// if the model returns a vector of another length.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.provider.embed(text).await?;
        if vector.len() != self.dimensions {
            return Err(IndexError::Dimension {
                expected: self.dimensions,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }
}

/// Text embedded for a stored chunk: the annotation first, then the chunk itself.
#[must_use]
pub fn embedding_input(annotation: &Annotation, chunk_text: &str) -> String {
    format!(
        "Context: Filename: {}. Explanation: {} Chunk: {chunk_text}",
        annotation.file_name, annotation.explanation
    )
}
