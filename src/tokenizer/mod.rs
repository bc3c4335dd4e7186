//! Text analysis
//!
//! A [`Tokenizer`] turns raw text into normalized terms carrying byte offsets
//! into the original text and a token position. The same tokenizer instance
//! is shared by indexing, query parsing, highlighting and similarity scoring.

mod cjk;
mod standard;

use std::fmt::Debug;
use std::sync::Arc;

pub use cjk::CjkTokenizer;
pub use standard::StandardTokenizer;

use crate::config::{TokenizerConfig, TokenizerKind};

/// A single normalized term occurrence
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Normalized term text
    pub term: String,
    /// Byte offset of the first byte in the source text
    pub start: usize,
    /// Byte offset one past the last byte in the source text
    pub end: usize,
    /// Token position; filtered tokens still consume a position
    pub position: u32,
}

/// Segments text into normalized terms
///
/// Implementations must be deterministic: the same input always yields the
/// same tokens.
pub trait Tokenizer: Send + Sync + Debug {
    /// Tokenize text into ordered term occurrences
    fn tokenize(&self, text: &str) -> Vec<Token>;

    /// Normalize a raw prefix the way indexed terms are normalized,
    /// without stemming or filtering
    fn normalize_prefix(&self, prefix: &str) -> String;

    /// Tokenize and keep only the term text
    fn terms(&self, text: &str) -> Vec<String> {
        self.tokenize(text).into_iter().map(|t| t.term).collect()
    }
}

/// Shared tokenizer handle
pub type TokenizerRef = Arc<dyn Tokenizer>;

/// Build the tokenizer described by a configuration
pub fn from_config(config: &TokenizerConfig) -> TokenizerRef {
    match config.kind {
        TokenizerKind::Standard => Arc::new(StandardTokenizer::new(config)),
        TokenizerKind::Cjk => Arc::new(CjkTokenizer::new(config)),
    }
}
