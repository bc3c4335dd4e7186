pub mod document;
pub mod search;

pub use document::{current_timestamp, Document, WriteMode};
pub use search::SearchHit;
