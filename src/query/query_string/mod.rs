//! Lucene-style query string parser
//!
//! Supports syntax like:
//! - `rust AND (search OR index)`
//! - `+required -excluded optional`
//! - `"exact phrase"~2`
//! - `prog*`
//! - `content:engine^2 id:doc-42`
//!
//! # Example
//!
//! ```rust
//! use lumen::config::TokenizerConfig;
//! use lumen::query::query_string::QueryStringParser;
//! use lumen::tokenizer;
//!
//! let tokenizer = tokenizer::from_config(&TokenizerConfig::default());
//! let mut parser = QueryStringParser::new("rust AND \"search engine\"", tokenizer.as_ref()).unwrap();
//! let query = parser.parse().unwrap();
//! assert_eq!(query.query_type(), "bool");
//! ```

pub mod lexer;
pub mod parser;

pub use lexer::{Lexer, Token};
pub use parser::QueryStringParser;
