//! Lumen: an embeddable full-text search core
//!
//! Documents carry an id, text content and an opaque payload. Content is
//! tokenized into an inverted index of immutable, checksummed segments; a
//! JSON manifest renamed into place is the commit point.
//!
//! - Query strings use a Lucene-style syntax (terms, phrases with slop,
//!   prefixes, boolean operators, `id:` lookups) and rank with BM25+
//! - Hits come with a highlighted fragment of their content
//! - [`similarity`] scores two texts by cosine over term frequencies
//!
//! ```no_run
//! use lumen::{Document, WriteMode};
//!
//! let index = lumen::open_index("/tmp/lumen", "notes")?;
//! index.write(&[Document::new("n1", "Remember the milk")], WriteMode::Append)?;
//! let hits = index.search("milk", 5)?;
//! assert_eq!(hits[0].id, "n1");
//! # Ok::<(), lumen::LumenError>(())
//! ```

use std::path::Path;
use std::sync::LazyLock;

pub mod config;
pub mod error;
pub mod highlight;
pub mod index;
pub mod models;
pub mod query;
pub mod segment;
pub mod similarity;
pub mod tokenizer;

pub use config::{HighlightConfig, IndexConfig, TokenizerConfig, TokenizerKind};
pub use error::{LumenError, Result};
pub use index::{IndexHandle, IndexReader, IndexWriterSession};
pub use models::*;
pub use similarity::SimilarityScorer;
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

static DEFAULT_SIMILARITY: LazyLock<SimilarityScorer> =
    LazyLock::new(|| SimilarityScorer::new(tokenizer::from_config(&TokenizerConfig::default())));

/// Open (or create) the index `name` under `location` with the default configuration
pub fn open_index(location: impl AsRef<Path>, name: &str) -> Result<IndexHandle> {
    IndexHandle::open(location, name, IndexConfig::default())
}

/// Cosine similarity of two texts with the default tokenizer, in `[0, 1]`
pub fn similarity(a: &str, b: &str) -> f64 {
    DEFAULT_SIMILARITY.similarity(a, b)
}
