//! Providers of `(name, content, path)` triples for ingestion.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A text file ready for splitting. Any transport encoding has been undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Last path component; its extension selects the split strategy.
    pub name: String,
    pub content: String,
    /// Repository-relative path with `/` separators.
    pub path: String,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_owned();
        Self {
            name,
            content: content.into(),
            path,
        }
    }
}

pub trait FileSource: Send + Sync {
    /// Every file to ingest, in a stable order.
    fn files(&self) -> impl Future<Output = Result<Vec<SourceFile>>> + Send;
}

impl FileSource for Vec<SourceFile> {
    async fn files(&self) -> Result<Vec<SourceFile>> {
        Ok(self.clone())
    }
}

pub const DEFAULT_MAX_FILE_BYTES: u64 = 1024 * 1024;

/// A checked-out repository on disk. Honors `.gitignore` and skips hidden entries.
#[derive(Debug, Clone)]
pub struct LocalFileSource {
    root: PathBuf,
    max_file_bytes: u64,
}

impl LocalFileSource {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    #[must_use]
    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileSource for LocalFileSource {
    async fn files(&self) -> Result<Vec<SourceFile>> {
        // fail fast on a missing root instead of walking nothing
        tokio::fs::metadata(&self.root).await?;

        let walker = ignore::WalkBuilder::new(&self.root)
            .hidden(true)
            .git_ignore(true)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let rel_path = relative_path(&self.root, entry.path());
            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if size > self.max_file_bytes {
                tracing::warn!(file = %rel_path, size, max = self.max_file_bytes, "skipping oversized file");
                continue;
            }

            if let Some(file) = read_source(entry.path(), rel_path).await {
                files.push(file);
            }
        }

        tracing::debug!(root = %self.root.display(), files = files.len(), "collected source files");
        Ok(files)
    }
}

/// `None` for files that vanished, cannot be read, or are not UTF-8.
async fn read_source(path: &Path, rel_path: String) -> Option<SourceFile> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(file = %rel_path, "skipping unreadable file: {e}");
            return None;
        }
    };
    let Ok(content) = String::from_utf8(bytes) else {
        tracing::debug!(file = %rel_path, "skipping non-UTF-8 file");
        return None;
    };
    Some(SourceFile::new(rel_path, content))
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
