//! Repository retrieval pipeline.
//!
//! Source files are split into token-budgeted chunks (tree-sitter boundaries for
//! known languages, paragraphs otherwise), annotated with a short explanation,
//! embedded and stored per `(repository, branch)` scope. A prompt is answered from
//! the single nearest chunk in its scope by Euclidean distance.

pub mod annotator;
pub mod embedder;
pub mod error;
pub mod ingest;
pub mod languages;
pub mod retriever;
pub mod search;
pub mod source;
pub mod splitter;
pub(crate) mod syntax;
pub mod tokens;

pub use error::{IndexError, Result};
pub use ingest::{ChunkOutcome, FileOutcome, FileReport, IngestReport, Ingestor};
pub use retriever::{NoMatchReason, Retrieval, Retriever};
pub use source::{FileSource, LocalFileSource, SourceFile};
pub use splitter::{SplitStrategy, Splitter, SplitterConfig};
pub use tokens::count_tokens;
