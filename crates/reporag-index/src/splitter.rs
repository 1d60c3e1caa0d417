//! Token-budgeted splitting of source files into overlapping chunks.
//!
//! Known languages are cut at AST entity boundaries first, then at language
//! separators, then at paragraph, line and word breaks, and finally between
//! characters. Pieces that fit the budget are merged greedily; the tail of each
//! emitted chunk is carried into the next one as overlap. Every chunk is a
//! contiguous byte span of the input.

use std::collections::VecDeque;
use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::languages::{Lang, detect_language};
use crate::source::SourceFile;
use crate::syntax;
use crate::tokens::TokenCounter;

/// Token budgets for both splitting paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Maximum tokens per chunk for known languages.
    pub chunk_tokens: usize,
    /// Tokens carried over between consecutive language chunks.
    pub chunk_overlap: usize,
    /// Unknown-extension files below this many tokens stay whole.
    pub whole_file_tokens: usize,
    /// Maximum tokens per chunk for unknown extensions.
    pub generic_chunk_tokens: usize,
    pub generic_chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_tokens: 900,
            chunk_overlap: 100,
            whole_file_tokens: 1500,
            generic_chunk_tokens: 1500,
            generic_chunk_overlap: 100,
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns [`IndexError::Config`] when a budget is zero or an overlap is not
    /// smaller than its chunk size.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_tokens == 0 || self.generic_chunk_tokens == 0 {
            return Err(IndexError::Config("chunk size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_tokens {
            return Err(IndexError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_tokens ({})",
                self.chunk_overlap, self.chunk_tokens
            )));
        }
        if self.generic_chunk_overlap >= self.generic_chunk_tokens {
            return Err(IndexError::Config(format!(
                "generic_chunk_overlap ({}) must be smaller than generic_chunk_tokens ({})",
                self.generic_chunk_overlap, self.generic_chunk_tokens
            )));
        }
        Ok(())
    }
}

/// How a file was split. Falling back for an unknown extension is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    Language(Lang),
    WholeFile,
    Generic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Byte span of `text` inside the original content.
    pub byte_range: Range<usize>,
    /// Number of leading bytes shared with the previous chunk.
    pub overlap: usize,
}

#[derive(Debug, Clone)]
pub struct SplitOutput {
    pub strategy: SplitStrategy,
    pub chunks: Vec<Chunk>,
}

impl SplitOutput {
    /// Rebuild the original content by dropping each chunk's overlap prefix.
    #[must_use]
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for chunk in &self.chunks {
            out.push_str(&chunk.text[chunk.overlap..]);
        }
        out
    }
}

#[derive(Debug, Clone)]
enum Level {
    Offsets(Vec<usize>),
    Separator(&'static str),
    Chars,
}

impl Level {
    /// Cut `range` into contiguous pieces. Separators stay at the start of the
    /// piece that follows them.
    fn cut(&self, text: &str, range: &Range<usize>) -> Vec<Range<usize>> {
        let cuts: Vec<usize> = match self {
            Self::Offsets(offsets) => offsets
                .iter()
                .copied()
                .filter(|&o| o > range.start && o < range.end)
                .collect(),
            Self::Separator(sep) => text[range.clone()]
                .match_indices(sep)
                .map(|(i, _)| range.start + i)
                .filter(|&o| o > range.start)
                .collect(),
            Self::Chars => text[range.clone()]
                .char_indices()
                .map(|(i, _)| range.start + i)
                .filter(|&o| o > range.start)
                .collect(),
        };

        let mut pieces = Vec::with_capacity(cuts.len() + 1);
        let mut start = range.start;
        for cut in cuts {
            pieces.push(start..cut);
            start = cut;
        }
        pieces.push(start..range.end);
        pieces
    }
}

struct Budget {
    size: usize,
    overlap: usize,
}

pub struct Splitter {
    config: SplitterConfig,
    tokens: TokenCounter,
}

impl std::fmt::Debug for Splitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Splitter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Splitter {
    /// # Errors
    ///
    /// Returns an error if the config is invalid or the tokenizer cannot load.
    pub fn new(config: SplitterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            tokens: TokenCounter::cl100k()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one source file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Parse`] if the language grammar fails on the content.
    pub fn split(&self, file: &SourceFile) -> Result<SplitOutput> {
        self.split_text(&file.name, &file.content)
    }

    /// Split `content`, choosing the strategy from the extension of `file_name`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Parse`] if the language grammar fails on the content.
    pub fn split_text(&self, file_name: &str, content: &str) -> Result<SplitOutput> {
        let lang = detect_language(Path::new(file_name));

        let output = match lang {
            Some(lang) => SplitOutput {
                strategy: SplitStrategy::Language(lang),
                chunks: self.split_language(content, lang)?,
            },
            None if content.trim().is_empty() => SplitOutput {
                strategy: SplitStrategy::WholeFile,
                chunks: Vec::new(),
            },
            None if self.tokens.count(content) < self.config.whole_file_tokens => SplitOutput {
                strategy: SplitStrategy::WholeFile,
                chunks: into_chunks(content, vec![0..content.len()]),
            },
            None => {
                let budget = Budget {
                    size: self.config.generic_chunk_tokens,
                    overlap: self.config.generic_chunk_overlap,
                };
                let mut ranges = Vec::new();
                self.split_range(
                    content,
                    0..content.len(),
                    &[Level::Separator("\n\n")],
                    &budget,
                    &mut ranges,
                );
                SplitOutput {
                    strategy: SplitStrategy::Generic,
                    chunks: into_chunks(content, ranges),
                }
            }
        };

        tracing::debug!(
            file = file_name,
            strategy = ?output.strategy,
            chunks = output.chunks.len(),
            "split file"
        );
        Ok(output)
    }

    fn split_language(&self, content: &str, lang: Lang) -> Result<Vec<Chunk>> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        if self.tokens.count(content) <= self.config.chunk_tokens {
            return Ok(into_chunks(content, vec![0..content.len()]));
        }

        let mut levels = Vec::new();
        if let Some(b) = syntax::boundaries(content, lang)? {
            for offsets in [b.top, b.nested] {
                if !offsets.is_empty() {
                    levels.push(Level::Offsets(offsets));
                }
            }
        }
        levels.extend(lang.separator_hierarchy().map(Level::Separator));
        levels.push(Level::Chars);

        let budget = Budget {
            size: self.config.chunk_tokens,
            overlap: self.config.chunk_overlap,
        };
        let mut ranges = Vec::new();
        self.split_range(content, 0..content.len(), &levels, &budget, &mut ranges);
        Ok(into_chunks(content, ranges))
    }

    /// Split `range` at the first level that yields more than one piece; pieces
    /// still over budget recurse into the remaining levels.
    fn split_range(
        &self,
        text: &str,
        range: Range<usize>,
        levels: &[Level],
        budget: &Budget,
        out: &mut Vec<Range<usize>>,
    ) {
        for (i, level) in levels.iter().enumerate() {
            let pieces = level.cut(text, &range);
            if pieces.len() < 2 {
                continue;
            }

            let rest = &levels[i + 1..];
            let mut fitting: Vec<(Range<usize>, usize)> = Vec::new();
            for piece in pieces {
                let n = self.tokens.count(&text[piece.clone()]);
                if n <= budget.size {
                    fitting.push((piece, n));
                } else {
                    merge_pieces(&fitting, budget, out);
                    fitting.clear();
                    self.split_range(text, piece, rest, budget, out);
                }
            }
            merge_pieces(&fitting, budget, out);
            return;
        }

        tracing::warn!(
            bytes = range.len(),
            budget = budget.size,
            "no split point inside oversized segment, emitting it whole"
        );
        out.push(range);
    }
}

/// Greedily merge contiguous pieces into chunks of at most `budget.size` tokens,
/// retaining up to `budget.overlap` tokens of trailing pieces as the next chunk's head.
fn merge_pieces(pieces: &[(Range<usize>, usize)], budget: &Budget, out: &mut Vec<Range<usize>>) {
    let mut window: VecDeque<&(Range<usize>, usize)> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = piece.1;
        if total + len > budget.size
            && let Some(range) = window_span(&window)
        {
            out.push(range);
            while total > budget.overlap || (total + len > budget.size && total > 0) {
                let Some(dropped) = window.pop_front() else {
                    break;
                };
                total -= dropped.1;
            }
        }
        window.push_back(piece);
        total += len;
    }

    if let Some(range) = window_span(&window) {
        out.push(range);
    }
}

fn window_span(window: &VecDeque<&(Range<usize>, usize)>) -> Option<Range<usize>> {
    Some(window.front()?.0.start..window.back()?.0.end)
}

fn into_chunks(content: &str, ranges: Vec<Range<usize>>) -> Vec<Chunk> {
    let mut prev_end = 0usize;
    ranges
        .into_iter()
        .map(|range| {
            let overlap = prev_end.saturating_sub(range.start);
            prev_end = range.end;
            Chunk {
                text: content[range.clone()].to_owned(),
                byte_range: range,
                overlap,
            }
        })
        .collect()
}
