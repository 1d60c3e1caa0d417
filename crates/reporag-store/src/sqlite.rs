use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::error::{Result, StoreError};
use crate::store::{BoxFuture, ChunkStore, validate_embedding};
use crate::types::{ChunkId, NewTextChunk, Scope, TextChunk};

type ChunkRow = (i64, String, String, String, String, String, String, Vec<u8>);

/// Durable embedded store. Embeddings are stored as little-endian `f32` blobs.
#[derive(Debug, Clone)]
pub struct SqliteChunkStore {
    pool: SqlitePool,
    dimensions: usize,
}

impl SqliteChunkStore {
    /// Open (or create) the `SQLite` database and run migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened, migrations fail, or
    /// it already holds embeddings of a different dimensionality.
    pub async fn new(path: &str, dimensions: usize) -> Result<Self> {
        let (url, max_connections) = if path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            (format!("sqlite:{path}?mode=rwc"), 5)
        };

        let opts = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        let stored: Option<(i64,)> =
            sqlx::query_as("SELECT dimensions FROM text_chunks WHERE dimensions != ? LIMIT 1")
                .bind(i64::try_from(dimensions)?)
                .fetch_optional(&pool)
                .await?;
        if let Some((actual,)) = stored {
            return Err(StoreError::Dimension {
                expected: dimensions,
                actual: usize::try_from(actual)?,
            });
        }

        Ok(Self { pool, dimensions })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_embedding(id: i64, bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(StoreError::Corrupt {
            id: id.to_string(),
            reason: format!("embedding blob of {} bytes", bytes.len()),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn row_to_chunk(row: ChunkRow) -> Result<TextChunk> {
    let (id, repository_name, repository_branch, file_name, path, context, text, blob) = row;
    Ok(TextChunk {
        embedding: decode_embedding(id, &blob)?,
        id: ChunkId::from(id),
        scope: Scope {
            repository_name,
            repository_branch,
        },
        file_name,
        path,
        context,
        text,
    })
}

impl ChunkStore for SqliteChunkStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn put(&self, chunk: NewTextChunk) -> BoxFuture<'_, Result<ChunkId>> {
        Box::pin(async move {
            validate_embedding(self.dimensions, &chunk.embedding)?;
            let dimensions = i64::try_from(chunk.embedding.len())?;

            let row: (i64,) = sqlx::query_as(
                "INSERT INTO text_chunks \
                 (repository_name, repository_branch, file_name, path, context, text, embedding, dimensions) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
            )
            .bind(&chunk.scope.repository_name)
            .bind(&chunk.scope.repository_branch)
            .bind(&chunk.file_name)
            .bind(&chunk.path)
            .bind(&chunk.context)
            .bind(&chunk.text)
            .bind(encode_embedding(&chunk.embedding))
            .bind(dimensions)
            .fetch_one(&self.pool)
            .await?;

            Ok(ChunkId::from(row.0))
        })
    }

    fn query(&self, scope: &Scope) -> BoxFuture<'_, Result<Vec<TextChunk>>> {
        let scope = scope.clone();
        Box::pin(async move {
            let rows: Vec<ChunkRow> = sqlx::query_as(
                "SELECT id, repository_name, repository_branch, file_name, path, context, text, embedding \
                 FROM text_chunks WHERE repository_name = ? AND repository_branch = ? ORDER BY id",
            )
            .bind(&scope.repository_name)
            .bind(&scope.repository_branch)
            .fetch_all(&self.pool)
            .await?;

            rows.into_iter().map(row_to_chunk).collect()
        })
    }

    fn count_all(&self) -> BoxFuture<'_, Result<u64>> {
        Box::pin(async move {
            let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM text_chunks")
                .fetch_one(&self.pool)
                .await?;
            Ok(u64::try_from(row.0)?)
        })
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
