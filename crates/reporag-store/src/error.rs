#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[cfg(feature = "qdrant")]
    #[error("Qdrant error: {0}")]
    Qdrant(#[from] Box<qdrant_client::QdrantError>),

    #[cfg(feature = "qdrant")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("integer conversion: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),

    #[error("embedding has {actual} dimensions, store expects {expected}")]
    Dimension { expected: usize, actual: usize },

    #[error("corrupt chunk record {id}: {reason}")]
    Corrupt { id: String, reason: String },

    #[error("store lock poisoned: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
