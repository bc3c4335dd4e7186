//! Shared query types

use serde::{Deserialize, Serialize};

/// Operator used to combine adjacent clauses that carry no explicit operator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchOperator {
    /// All clauses must match
    And,
    /// At least one clause must match
    #[default]
    Or,
}

/// How a clause participates in a boolean query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

/// Field a query clause targets
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryField {
    /// The analyzed document body
    Content,
    /// The stored document id, matched verbatim
    Id,
    /// Any other name; such clauses match nothing
    Unknown(String),
}

impl QueryField {
    pub fn from_name(name: &str) -> Self {
        match name {
            "content" => QueryField::Content,
            "id" => QueryField::Id,
            other => QueryField::Unknown(other.to_string()),
        }
    }
}

/// Upper bound on the terms a prefix clause expands to, per segment
pub const MAX_PREFIX_EXPANSIONS: usize = 128;
