//! Token counting over the `cl100k_base` encoding.

use std::sync::LazyLock;

use tiktoken_rs::CoreBPE;

use crate::error::{IndexError, Result};

static CL100K: LazyLock<std::result::Result<CoreBPE, String>> =
    LazyLock::new(|| tiktoken_rs::cl100k_base().map_err(|e| e.to_string()));

/// Counts tokens with the process-wide `cl100k_base` encoder.
///
/// Special-token markers such as `<|endoftext|>` are counted as ordinary text,
/// so any string is accepted.
#[derive(Clone, Copy)]
pub struct TokenCounter {
    bpe: &'static CoreBPE,
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenCounter(cl100k_base)")
    }
}

impl TokenCounter {
    /// # Errors
    ///
    /// Returns [`IndexError::Tokenizer`] if the encoding failed to load.
    pub fn cl100k() -> Result<Self> {
        CL100K
            .as_ref()
            .map(|bpe| Self { bpe })
            .map_err(|e| IndexError::Tokenizer(e.clone()))
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

/// Count tokens in `text`.
///
/// # Errors
///
/// Returns [`IndexError::Tokenizer`] if the encoding failed to load.
pub fn count_tokens(text: &str) -> Result<usize> {
    Ok(TokenCounter::cl100k()?.count(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_has_no_tokens() {
        assert_eq!(count_tokens("").unwrap(), 0);
    }

    #[test]
    fn counts_known_phrase() {
        // "hello world" is two tokens in cl100k_base.
        assert_eq!(count_tokens("hello world").unwrap(), 2);
    }

    #[test]
    fn special_token_markers_are_plain_text() {
        assert!(count_tokens("<|endoftext|>").unwrap() > 1);
    }

    #[test]
    fn counting_is_stable_across_calls() {
        let counter = TokenCounter::cl100k().unwrap();
        let text = "fn main() { println!(\"hi\"); }";
        assert_eq!(counter.count(text), counter.count(text));
        assert_eq!(counter.count(text), count_tokens(text).unwrap());
    }
}
