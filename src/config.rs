use serde::{Deserialize, Serialize};

use crate::query::MatchOperator;
use crate::segment::Bm25Params;

/// Which segmentation strategy the tokenizer applies
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerKind {
    /// UAX-29 word boundaries
    #[default]
    Standard,
    /// Word boundaries plus overlapping bigrams over Han/Kana/Hangul runs
    Cjk,
}

/// Tokenizer configuration
///
/// The default `Standard` kind splits Chinese and Japanese text into one
/// term per character, which loses word order inside a run. Indexes holding
/// CJK content should use [`TokenizerConfig::cjk`]; it tokenizes alphabetic
/// text exactly like `Standard`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerConfig {
    pub kind: TokenizerKind,
    pub lowercase: bool,
    pub remove_stopwords: bool,
    pub stem: bool,
    pub min_token_length: usize,
    pub max_token_length: usize,
    pub language: String,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            kind: TokenizerKind::Standard,
            lowercase: true,
            remove_stopwords: false,
            stem: false,
            min_token_length: 1,
            max_token_length: 64,
            language: "english".to_string(),
        }
    }
}

impl TokenizerConfig {
    /// Configuration suited to Chinese/Japanese/Korean text
    pub fn cjk() -> Self {
        Self {
            kind: TokenizerKind::Cjk,
            ..Default::default()
        }
    }
}

/// Highlighter configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub pre_tag: String,
    pub post_tag: String,
    /// Upper bound on fragment length, in characters
    pub max_fragment_chars: usize,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            pre_tag: "<b>".to_string(),
            post_tag: "</b>".to_string(),
            max_fragment_chars: 100,
        }
    }
}

/// Configuration owned by an `IndexHandle`
///
/// The tokenizer defaults to [`TokenizerKind::Standard`]. Pass
/// `with_tokenizer(TokenizerConfig::cjk())` for Chinese, Japanese or Korean
/// content, and keep the same tokenizer for the life of the index.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub tokenizer: TokenizerConfig,
    pub bm25: Bm25Params,
    pub highlight: HighlightConfig,
    /// Operator joining adjacent clauses that carry no explicit operator
    pub default_operator: MatchOperator,
    /// How long a mutation waits for the writer lock; `None` fails fast
    pub writer_lock_timeout_ms: Option<u64>,
    /// Appends that leave more segments than this merge them into one
    pub max_segments: usize,
    /// fsync segment files, the manifest and the index directory on commit
    pub sync_on_commit: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            bm25: Bm25Params::default(),
            highlight: HighlightConfig::default(),
            default_operator: MatchOperator::Or,
            writer_lock_timeout_ms: None,
            max_segments: 16,
            sync_on_commit: true,
        }
    }
}

impl IndexConfig {
    pub fn with_tokenizer(mut self, tokenizer: TokenizerConfig) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_bm25(mut self, bm25: Bm25Params) -> Self {
        self.bm25 = bm25;
        self
    }

    pub fn with_highlight(mut self, highlight: HighlightConfig) -> Self {
        self.highlight = highlight;
        self
    }

    pub fn with_default_operator(mut self, operator: MatchOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Wait up to `timeout_ms` for the writer lock instead of failing fast
    pub fn with_writer_lock_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.writer_lock_timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_segments(mut self, max_segments: usize) -> Self {
        self.max_segments = max_segments.max(1);
        self
    }

    pub fn with_sync_on_commit(mut self, sync: bool) -> Self {
        self.sync_on_commit = sync;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = IndexConfig::default();
        assert_eq!(config.max_segments, 16);
        assert!(config.writer_lock_timeout_ms.is_none());
        assert!(config.sync_on_commit);
        assert_eq!(config.highlight.pre_tag, "<b>");

        let tokenizer_config = TokenizerConfig::default();
        assert!(tokenizer_config.lowercase);
        assert!(!tokenizer_config.remove_stopwords);
        assert_eq!(tokenizer_config.kind, TokenizerKind::Standard);
    }

    #[test]
    fn test_cjk_content_needs_cjk_tokenizer() {
        use crate::tokenizer::{self, Tokenizer};
        let terms = |config: &TokenizerConfig, text: &str| tokenizer::from_config(config).terms(text);

        let standard = TokenizerConfig::default();
        let cjk = TokenizerConfig::cjk();
        assert_eq!(terms(&standard, "全文检索"), vec!["全", "文", "检", "索"]);
        assert_eq!(terms(&cjk, "全文检索"), vec!["全文", "文检", "检索"]);
        assert_eq!(terms(&standard, "Quick brown-fox"), terms(&cjk, "Quick brown-fox"));
    }

    #[test]
    fn test_config_builder() {
        let config = IndexConfig::default()
            .with_tokenizer(TokenizerConfig::cjk())
            .with_writer_lock_timeout_ms(250)
            .with_max_segments(0)
            .with_default_operator(MatchOperator::And)
            .with_bm25(Bm25Params { k1: 2.0, ..Default::default() })
            .with_highlight(HighlightConfig {
                pre_tag: "<em>".to_string(),
                ..Default::default()
            });

        assert_eq!(config.tokenizer.kind, TokenizerKind::Cjk);
        assert_eq!(config.bm25.k1, 2.0);
        assert_eq!(config.highlight.pre_tag, "<em>");
        assert_eq!(config.highlight.post_tag, "</b>");
        assert_eq!(config.writer_lock_timeout_ms, Some(250));
        assert_eq!(config.max_segments, 1);
        assert_eq!(config.default_operator, MatchOperator::And);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IndexConfig =
            serde_json::from_str(r#"{"tokenizer": {"kind": "cjk"}, "max_segments": 4}"#).unwrap();
        assert_eq!(config.tokenizer.kind, TokenizerKind::Cjk);
        assert!(config.tokenizer.lowercase);
        assert_eq!(config.max_segments, 4);
        assert_eq!(config.highlight.max_fragment_chars, 100);
    }
}
