//! Write path: split → annotate → embed → store.

use std::ops::Range;
use std::sync::Arc;

use reporag_llm::LlmProvider;
use reporag_store::{ChunkId, ChunkStore, NewTextChunk, Scope};

use crate::annotator::Annotator;
use crate::embedder::{Embedder, embedding_input};
use crate::error::Result;
use crate::source::{FileSource, SourceFile};
use crate::splitter::{Chunk, SplitStrategy, Splitter};

#[derive(Debug)]
pub enum ChunkOutcome {
    Stored(ChunkId),
    /// Annotation, embedding or validation failed for this chunk only.
    Failed(crate::IndexError),
}

#[derive(Debug)]
pub struct ChunkReport {
    pub index: usize,
    pub byte_range: Range<usize>,
    pub outcome: ChunkOutcome,
}

#[derive(Debug)]
pub enum FileOutcome {
    Split {
        strategy: SplitStrategy,
        chunks: Vec<ChunkReport>,
    },
    /// Splitting failed; nothing from this file was stored.
    Failed(crate::IndexError),
}

#[derive(Debug)]
pub struct FileReport {
    pub path: String,
    pub outcome: FileOutcome,
}

impl FileReport {
    #[must_use]
    pub fn stored(&self) -> usize {
        self.count(|o| matches!(o, ChunkOutcome::Stored(_)))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ChunkOutcome::Failed(_)))
    }

    fn count(&self, pred: impl Fn(&ChunkOutcome) -> bool) -> usize {
        match &self.outcome {
            FileOutcome::Split { chunks, .. } => chunks.iter().filter(|c| pred(&c.outcome)).count(),
            FileOutcome::Failed(_) => 0,
        }
    }
}

/// Summary of one ingestion run over a file source.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub files: Vec<FileReport>,
    pub chunks_stored: usize,
    pub chunks_failed: usize,
    pub files_failed: usize,
    pub duration_ms: u64,
}

pub struct Ingestor<P: LlmProvider> {
    splitter: Splitter,
    annotator: Annotator<P>,
    embedder: Embedder<P>,
    store: Arc<dyn ChunkStore>,
}

impl<P: LlmProvider> Ingestor<P> {
    /// Embeddings are validated against the store's dimensionality.
    #[must_use]
    pub fn new(provider: Arc<P>, store: Arc<dyn ChunkStore>, splitter: Splitter) -> Self {
        Self {
            splitter,
            annotator: Annotator::new(Arc::clone(&provider)),
            embedder: Embedder::new(provider, store.dimensions()),
            store,
        }
    }

    /// Ingest one file into `scope`. Every chunk is annotated and embedded,
    /// whichever strategy split it.
    ///
    /// Chunk failures are recorded in the report without stopping sibling
    /// chunks. Chunks stored before an error stay stored.
    ///
    /// # Errors
    ///
    /// Returns the first transport failure (HTTP, rate limit, store I/O).
    pub async fn ingest_file(&self, scope: &Scope, file: &SourceFile) -> Result<FileReport> {
        let split = match self.splitter.split(file) {
            Ok(split) => split,
            Err(e) => {
                tracing::warn!(file = %file.path, "split failed: {e}");
                return Ok(FileReport {
                    path: file.path.clone(),
                    outcome: FileOutcome::Failed(e),
                });
            }
        };

        let mut chunks = Vec::with_capacity(split.chunks.len());
        for (index, chunk) in split.chunks.into_iter().enumerate() {
            let byte_range = chunk.byte_range.clone();
            let outcome = match self.store_chunk(scope, file, chunk).await {
                Ok(id) => {
                    tracing::debug!(file = %file.path, index, %id, "chunk stored");
                    ChunkOutcome::Stored(id)
                }
                Err(e) if e.is_transport() => return Err(e),
                Err(e) => {
                    tracing::warn!(file = %file.path, index, "chunk failed: {e}");
                    ChunkOutcome::Failed(e)
                }
            };
            chunks.push(ChunkReport {
                index,
                byte_range,
                outcome,
            });
        }

        Ok(FileReport {
            path: file.path.clone(),
            outcome: FileOutcome::Split {
                strategy: split.strategy,
                chunks,
            },
        })
    }

    /// Ingest every file of `source` into `scope`.
    ///
    /// # Errors
    ///
    /// Returns an error if the source cannot be listed or a transport failure
    /// aborts the run.
    pub async fn ingest_source<S: FileSource>(
        &self,
        scope: &Scope,
        source: &S,
    ) -> Result<IngestReport> {
        let start = std::time::Instant::now();
        let mut report = IngestReport::default();

        let files = source.files().await?;
        let total = files.len();
        tracing::info!(total, %scope, "ingestion started");

        for (i, file) in files.iter().enumerate() {
            let file_report = self.ingest_file(scope, file).await?;
            let stored = file_report.stored();
            let failed = file_report.failed();
            report.chunks_stored += stored;
            report.chunks_failed += failed;
            if matches!(file_report.outcome, FileOutcome::Failed(_)) {
                report.files_failed += 1;
            }
            tracing::info!(
                file = %file.path,
                progress = format_args!("{}/{total}", i + 1),
                stored,
                failed,
            );
            report.files.push(file_report);
        }

        report.duration_ms = start.elapsed().as_millis().try_into().unwrap_or(u64::MAX);
        tracing::info!(
            stored = report.chunks_stored,
            failed = report.chunks_failed,
            duration_ms = report.duration_ms,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn store_chunk(&self, scope: &Scope, file: &SourceFile, chunk: Chunk) -> Result<ChunkId> {
        let annotation = self.annotator.annotate(&chunk.text, &file.name).await?;
        let embedding = self
            .embedder
            .embed(&embedding_input(&annotation, &chunk.text))
            .await?;
        let id = self
            .store
            .put(NewTextChunk {
                scope: scope.clone(),
                file_name: file.name.clone(),
                path: file.path.clone(),
                context: annotation.explanation,
                text: chunk.text,
                embedding,
            })
            .await?;
        Ok(id)
    }
}
