use serde::{Deserialize, Serialize};

/// Document as supplied by the caller
///
/// `id` is not required to be unique. `content` is tokenized and indexed;
/// `payload` is stored verbatim and never matched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub payload: String,
}

impl Document {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            payload: String::new(),
        }
    }

    pub fn with_payload(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }
}

/// How a write batch relates to the existing index contents
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMode {
    /// Add the batch to the documents already committed
    #[default]
    Append,
    /// Replace everything committed so far with the batch
    Recreate,
}

/// Get current Unix timestamp in seconds
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_builder() {
        let doc = Document::new("42", "hello world").with_payload(r#"{"k":1}"#);
        assert_eq!(doc.id, "42");
        assert_eq!(doc.content, "hello world");
        assert_eq!(doc.payload, r#"{"k":1}"#);
    }

    #[test]
    fn test_default_write_mode_is_append() {
        assert_eq!(WriteMode::default(), WriteMode::Append);
    }
}
