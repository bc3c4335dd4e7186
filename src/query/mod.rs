//! Query language and execution engine
//!
//! Query strings are parsed into a tree of [`QueryNode`]s:
//! - Term queries (one normalized term)
//! - Phrase queries (ordered terms with optional slop)
//! - Prefix queries (`prog*`)
//! - Boolean queries (AND, OR, NOT, `+`, `-`)
//! - Id queries (`id:...`, exact stored id)
//!
//! The executor runs a tree against every segment of a snapshot and keeps
//! the best hits by BM25+ score.

pub mod ast;
pub mod context;
pub mod executor;
pub mod nodes;
pub mod query_string;
pub mod types;

pub use ast::{MatchNoneQuery, QueryNode};
pub use context::QueryContext;
pub use executor::{QueryExecutor, QueryResult, ScoredDoc};
pub use nodes::{BoolQuery, IdQuery, PhraseQuery, PrefixQuery, TermQuery};
pub use query_string::QueryStringParser;
pub use types::*;
