//! Chunk persistence scoped by repository name and branch.

pub mod error;
pub mod in_memory;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod sqlite;
pub mod store;
pub mod types;

pub use error::StoreError;
pub use in_memory::InMemoryChunkStore;
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantChunkStore;
pub use sqlite::SqliteChunkStore;
pub use store::ChunkStore;
pub use types::{ChunkId, NewTextChunk, Scope, TextChunk};
