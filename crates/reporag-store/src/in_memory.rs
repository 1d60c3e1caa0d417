use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::store::{BoxFuture, ChunkStore, validate_embedding};
use crate::types::{ChunkId, NewTextChunk, Scope, TextChunk};

/// Process-local store. Chunks are kept in insertion order; ids are sequential.
pub struct InMemoryChunkStore {
    dimensions: usize,
    chunks: RwLock<Vec<TextChunk>>,
}

impl InMemoryChunkStore {
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            chunks: RwLock::new(Vec::new()),
        }
    }
}

impl std::fmt::Debug for InMemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryChunkStore")
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl ChunkStore for InMemoryChunkStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn put(&self, chunk: NewTextChunk) -> BoxFuture<'_, Result<ChunkId>> {
        Box::pin(async move {
            validate_embedding(self.dimensions, &chunk.embedding)?;
            let mut chunks = self
                .chunks
                .write()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            let id = ChunkId((chunks.len() + 1).to_string());
            chunks.push(chunk.with_id(id.clone()));
            Ok(id)
        })
    }

    fn query(&self, scope: &Scope) -> BoxFuture<'_, Result<Vec<TextChunk>>> {
        let scope = scope.clone();
        Box::pin(async move {
            let chunks = self
                .chunks
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            Ok(chunks.iter().filter(|c| c.scope == scope).cloned().collect())
        })
    }

    fn count_all(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let chunks = self
                .chunks
                .read()
                .map_err(|e| StoreError::Lock(e.to_string()))?;
            Ok(u64::try_from(chunks.len())?)
        })
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
