//! Cosine similarity between two texts over term-frequency vectors
//!
//! Independent of any index: the only shared piece is the tokenizer, so two
//! texts are compared with the same normalization the index applies.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::tokenizer::TokenizerRef;

static PARENS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[()]").expect("valid regex"));

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").expect("valid regex"));

/// Whitespace plus ASCII and full-width punctuation
static PUNCTUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"[\[\]{}\s,.?!？ —":@*'\-()\\/;%（）。，：“”；！？、《》【】｛｝～＠＃￥％…＆×÷－＋＝\u{3000}‘’·]+"#,
    )
    .expect("valid regex")
});

/// Scores pairwise text similarity in `[0, 1]`
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    tokenizer: TokenizerRef,
}

impl SimilarityScorer {
    pub fn new(tokenizer: TokenizerRef) -> Self {
        Self { tokenizer }
    }

    /// Terms of `text` after normalization, in order, duplicates kept
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let joined = self.tokenizer.terms(text).join(" ");
        let cleaned = PARENS.replace_all(&joined, "");
        let cleaned = DIGITS.replace_all(&cleaned, "");

        let kept: Vec<&str> = cleaned
            .split(' ')
            .filter(|token| !is_single_word_char(token))
            .collect();
        let lowered = kept.join(" ").to_lowercase();

        PUNCTUATION
            .split(&lowered)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Cosine similarity of the two texts' term-frequency vectors.
    ///
    /// `0.0` when either side normalizes to nothing. Symmetric, and exactly
    /// `1.0` for identical non-empty inputs.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let left = self.normalize(a);
        let right = self.normalize(b);
        if left.is_empty() || right.is_empty() {
            return 0.0;
        }

        let mut vectors: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
        for term in &left {
            vectors.entry(term.as_str()).or_default().0 += 1;
        }
        for term in &right {
            vectors.entry(term.as_str()).or_default().1 += 1;
        }

        let (mut dot, mut sum_a, mut sum_b) = (0u64, 0u64, 0u64);
        for (fa, fb) in vectors.values() {
            dot += fa * fb;
            sum_a += fa * fa;
            sum_b += fb * fb;
        }

        let denominator = ((sum_a as u128 * sum_b as u128) as f64).sqrt();
        if denominator == 0.0 {
            return 0.0;
        }
        (dot as f64 / denominator).clamp(0.0, 1.0)
    }
}

fn is_single_word_char(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenizerConfig;
    use crate::tokenizer;

    fn scorer() -> SimilarityScorer {
        SimilarityScorer::new(tokenizer::from_config(&TokenizerConfig::default()))
    }

    #[test]
    fn test_normalize_pipeline() {
        let terms = scorer().normalize("The (2024) Rust book, a v2 guide!");
        assert_eq!(terms, vec!["the", "rust", "book", "guide"]);
    }

    #[test]
    fn test_identity_is_exactly_one() {
        let s = scorer();
        for text in ["rust search engine", "fox fox fox dog", "全文检索 engine"] {
            assert_eq!(s.similarity(text, text), 1.0, "{text}");
        }
    }

    #[test]
    fn test_symmetry_and_bounds() {
        let s = scorer();
        let pairs = [
            ("rust search engine", "search engine in rust"),
            ("the quick brown fox", "the lazy dog"),
            ("alpha beta beta", "beta gamma"),
        ];
        for (a, b) in pairs {
            let ab = s.similarity(a, b);
            assert_eq!(ab, s.similarity(b, a));
            assert!((0.0..=1.0).contains(&ab));
        }
    }

    #[test]
    fn test_known_value() {
        // vectors over {alpha, beta, gamma}: (1, 2, 0) and (0, 1, 1)
        let value = scorer().similarity("alpha beta beta", "beta gamma");
        let expected = 2.0 / (5.0f64 * 2.0).sqrt();
        assert!((value - expected).abs() < 1e-12);
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        assert_eq!(scorer().similarity("rust engine", "python snake"), 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        let s = scorer();
        assert_eq!(s.similarity("", "anything"), 0.0);
        assert_eq!(s.similarity("anything", "   "), 0.0);
        // digits and single letters normalize away
        assert_eq!(s.similarity("12 34 a b", "12 34 a b"), 0.0);
    }

    #[test]
    fn test_cjk_unigrams_survive() {
        let s = SimilarityScorer::new(tokenizer::from_config(&TokenizerConfig::cjk()));
        assert_eq!(s.normalize("我"), vec!["我"]);
        assert!(s.similarity("全文检索", "全文检索系统") > 0.5);
    }
}
