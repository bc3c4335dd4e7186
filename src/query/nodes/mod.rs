//! Concrete query node implementations

mod bool_query;
mod id_query;
mod phrase_query;
mod prefix_query;
mod term_query;

pub use bool_query::BoolQuery;
pub use id_query::IdQuery;
pub use phrase_query::PhraseQuery;
pub use prefix_query::PrefixQuery;
pub use term_query::TermQuery;
