use std::fmt;

use serde::{Deserialize, Serialize};

/// Store-assigned opaque chunk identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub String);

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ChunkId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// The `(repository_name, repository_branch)` pair that partitions chunks.
///
/// Two chunks are comparable in a search only when their scopes are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub repository_name: String,
    pub repository_branch: String,
}

impl Scope {
    #[must_use]
    pub fn new(repository_name: impl Into<String>, repository_branch: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            repository_branch: repository_branch.into(),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.repository_name, self.repository_branch)
    }
}

/// A chunk ready to be persisted. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTextChunk {
    pub scope: Scope,
    pub file_name: String,
    pub path: String,
    /// Short natural-language explanation of the chunk.
    pub context: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl NewTextChunk {
    #[must_use]
    pub fn with_id(self, id: ChunkId) -> TextChunk {
        TextChunk {
            id,
            scope: self.scope,
            file_name: self.file_name,
            path: self.path,
            context: self.context,
            text: self.text,
            embedding: self.embedding,
        }
    }
}

/// A persisted chunk. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: ChunkId,
    pub scope: Scope,
    pub file_name: String,
    pub path: String,
    pub context: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display() {
        assert_eq!(Scope::new("repoA", "main").to_string(), "repoA@main");
    }

    #[test]
    fn chunk_id_from_row_id() {
        assert_eq!(ChunkId::from(42).to_string(), "42");
    }

    #[test]
    fn with_id_keeps_fields() {
        let chunk = NewTextChunk {
            scope: Scope::new("r", "b"),
            file_name: "lib.rs".into(),
            path: "src/lib.rs".into(),
            context: "ctx".into(),
            text: "fn a() {}".into(),
            embedding: vec![1.0, 2.0],
        }
        .with_id(ChunkId("7".into()));
        assert_eq!(chunk.id.0, "7");
        assert_eq!(chunk.path, "src/lib.rs");
        assert_eq!(chunk.embedding, vec![1.0, 2.0]);
    }
}
