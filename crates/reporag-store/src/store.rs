use std::future::Future;
use std::pin::Pin;

use crate::error::{Result, StoreError};
use crate::types::{ChunkId, NewTextChunk, Scope, TextChunk};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Append-only chunk persistence with `(repository, branch)` scoped reads.
///
/// Implementations are shared between concurrent ingestion and retrieval
/// requests, so every method takes `&self`.
pub trait ChunkStore: Send + Sync {
    /// Embedding dimensionality every stored chunk must have.
    fn dimensions(&self) -> usize;

    /// Append one chunk and return its store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Dimension`] if the embedding is empty or of the wrong
    /// length, or a backend error if the store is unavailable.
    fn put(&self, chunk: NewTextChunk) -> BoxFuture<'_, Result<ChunkId>>;

    /// Every chunk whose scope equals `scope`. Empty when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store is unavailable.
    fn query(&self, scope: &Scope) -> BoxFuture<'_, Result<Vec<TextChunk>>>;

    /// Total number of chunks across all scopes.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store is unavailable.
    fn count_all(&self) -> BoxFuture<'_, Result<u64>>;

    fn name(&self) -> &'static str;
}

/// Reject empty embeddings and embeddings of the wrong length.
///
/// # Errors
///
/// Returns [`StoreError::Dimension`] on mismatch.
pub fn validate_embedding(expected: usize, embedding: &[f32]) -> Result<()> {
    if embedding.is_empty() || embedding.len() != expected {
        return Err(StoreError::Dimension {
            expected,
            actual: embedding.len(),
        });
    }
    Ok(())
}
