use serde::{Deserialize, Serialize};

/// One ranked search result
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    /// Best fragment of `content` with matched terms wrapped in the configured tags
    pub highlighted_content: String,
    pub payload: String,
    pub score: f32,
    /// Internal document slot; ties in `score` are broken by ascending slot
    pub slot: u64,
}
