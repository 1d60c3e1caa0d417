//! Remote vector store backend.

use std::collections::HashMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::vector_output::Vector;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder,
    Distance, FieldType, Filter, PointId, PointStruct, RetrievedPoint, ScrollPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder, value::Kind,
};

use crate::error::{Result, StoreError};
use crate::store::{BoxFuture, ChunkStore, validate_embedding};
use crate::types::{ChunkId, NewTextChunk, Scope, TextChunk};

const SCROLL_PAGE: u32 = 256;

/// Chunk store over a `Qdrant` collection.
///
/// The collection uses Euclidean distance so the stored index agrees with the
/// L2 metric used at query time.
#[derive(Clone)]
pub struct QdrantChunkStore {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl std::fmt::Debug for QdrantChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantChunkStore")
            .field("collection", &self.collection)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

impl QdrantChunkStore {
    /// # Errors
    ///
    /// Returns an error if the `Qdrant` client cannot be created.
    pub fn new(url: &str, collection: impl Into<String>, dimensions: usize) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Box::new)?;
        Ok(Self {
            client,
            collection: collection.into(),
            dimensions,
        })
    }

    /// Create the collection and its scope indexes if missing. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if `Qdrant` cannot be reached or collection creation fails.
    pub async fn ensure_collection(&self) -> Result<()> {
        if self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(Box::new)?
        {
            return Ok(());
        }

        let size = u64::try_from(self.dimensions)?;
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(size, Distance::Euclid)),
            )
            .await
            .map_err(Box::new)?;

        for field in ["repository_name", "repository_branch"] {
            self.client
                .create_field_index(CreateFieldIndexCollectionBuilder::new(
                    &self.collection,
                    field,
                    FieldType::Keyword,
                ))
                .await
                .map_err(Box::new)?;
        }

        tracing::info!(collection = %self.collection, size, "created qdrant collection");
        Ok(())
    }
}

fn scope_filter(scope: &Scope) -> Filter {
    Filter::must([
        Condition::matches("repository_name", scope.repository_name.clone()),
        Condition::matches("repository_branch", scope.repository_branch.clone()),
    ])
}

fn payload_str(payload: &HashMap<String, qdrant_client::qdrant::Value>, key: &str) -> Option<String> {
    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    }
}

fn point_id_string(id: Option<&PointId>) -> String {
    use qdrant_client::qdrant::point_id::PointIdOptions;
    match id.and_then(|p| p.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(u)) => u.clone(),
        Some(PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn point_to_chunk(point: RetrievedPoint) -> Result<TextChunk> {
    let id = point_id_string(point.id.as_ref());
    let corrupt = |reason: &str| StoreError::Corrupt {
        id: id.clone(),
        reason: reason.to_owned(),
    };

    let field = |key: &str| payload_str(&point.payload, key).ok_or_else(|| corrupt(key));

    let embedding = match point.vectors.as_ref().and_then(|v| v.get_vector()) {
        Some(Vector::Dense(dense)) => dense.data,
        _ => return Err(corrupt("missing dense vector")),
    };

    Ok(TextChunk {
        id: ChunkId(id.clone()),
        scope: Scope {
            repository_name: field("repository_name")?,
            repository_branch: field("repository_branch")?,
        },
        file_name: field("file_name")?,
        path: field("path")?,
        context: field("context")?,
        text: field("text")?,
        embedding,
    })
}

impl ChunkStore for QdrantChunkStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn put(&self, chunk: NewTextChunk) -> BoxFuture<'_, Result<ChunkId>> {
        Box::pin(async move {
            validate_embedding(self.dimensions, &chunk.embedding)?;
            let point_id = uuid::Uuid::new_v4().to_string();

            let payload: HashMap<String, qdrant_client::qdrant::Value> =
                serde_json::from_value(serde_json::json!({
                    "repository_name": chunk.scope.repository_name,
                    "repository_branch": chunk.scope.repository_branch,
                    "file_name": chunk.file_name,
                    "path": chunk.path,
                    "context": chunk.context,
                    "text": chunk.text,
                }))?;

            self.client
                .upsert_points(
                    UpsertPointsBuilder::new(
                        &self.collection,
                        vec![PointStruct::new(point_id.clone(), chunk.embedding, payload)],
                    )
                    .wait(true),
                )
                .await
                .map_err(Box::new)?;

            Ok(ChunkId(point_id))
        })
    }

    fn query(&self, scope: &Scope) -> BoxFuture<'_, Result<Vec<TextChunk>>> {
        let filter = scope_filter(scope);
        Box::pin(async move {
            let mut chunks = Vec::new();
            let mut offset: Option<PointId> = None;

            loop {
                let mut builder = ScrollPointsBuilder::new(&self.collection)
                    .filter(filter.clone())
                    .with_payload(true)
                    .with_vectors(true)
                    .limit(SCROLL_PAGE);

                if let Some(ref off) = offset {
                    builder = builder.offset(off.clone());
                }

                let response = self.client.scroll(builder).await.map_err(Box::new)?;
                for point in response.result {
                    chunks.push(point_to_chunk(point)?);
                }

                match response.next_page_offset {
                    Some(next) => offset = Some(next),
                    None => break,
                }
            }

            Ok(chunks)
        })
    }

    fn count_all(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let response = self
                .client
                .count(CountPointsBuilder::new(&self.collection).exact(true))
                .await
                .map_err(Box::new)?;
            Ok(response.result.map_or(0, |r| r.count))
        })
    }

    fn name(&self) -> &'static str {
        "qdrant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_str_reads_string_values() {
        let payload: HashMap<String, qdrant_client::qdrant::Value> =
            serde_json::from_value(serde_json::json!({"path": "src/a.go", "n": 3})).unwrap();
        assert_eq!(payload_str(&payload, "path").as_deref(), Some("src/a.go"));
        assert!(payload_str(&payload, "n").is_none());
        assert!(payload_str(&payload, "missing").is_none());
    }

    #[test]
    fn point_id_string_formats_both_kinds() {
        assert_eq!(point_id_string(Some(&PointId::from(7u64))), "7");
        assert_eq!(
            point_id_string(Some(&PointId::from("a0b1".to_string()))),
            "a0b1"
        );
        assert_eq!(point_id_string(None), "");
    }

    #[tokio::test]
    async fn debug_hides_client() {
        let store = QdrantChunkStore::new("http://localhost:6334", "chunks", 1536).unwrap();
        let dbg = format!("{store:?}");
        assert!(dbg.contains("chunks"));
        assert!(dbg.contains("1536"));
    }
}
