use std::collections::HashSet;

use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};
use unicode_segmentation::UnicodeSegmentation;

use super::{Token, Tokenizer};
use crate::config::TokenizerConfig;

/// UAX-29 word tokenizer with optional lowercasing, stopword removal and stemming
pub struct StandardTokenizer {
    config: TokenizerConfig,
    stemmer: Option<Stemmer>,
    stopwords: HashSet<String>,
}

impl std::fmt::Debug for StandardTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StandardTokenizer")
            .field("config", &self.config)
            .field("stopwords", &self.stopwords.len())
            .finish()
    }
}

impl StandardTokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        let language = config.language.to_lowercase();

        let stemmer = if config.stem {
            Some(Stemmer::create(stemmer_algorithm(&language)))
        } else {
            None
        };

        let stopwords = if config.remove_stopwords {
            get(stopword_language(&language))
                .into_iter()
                .map(|s| s.to_lowercase())
                .collect()
        } else {
            HashSet::new()
        };

        Self {
            config: config.clone(),
            stemmer,
            stopwords,
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize `text`, which starts at byte `base` of the caller's text,
    /// continuing the position sequence from `position`.
    pub(crate) fn tokenize_span(
        &self,
        text: &str,
        base: usize,
        position: &mut u32,
        out: &mut Vec<Token>,
    ) {
        for (offset, word) in text.unicode_word_indices() {
            let pos = *position;
            *position += 1;

            if let Some(term) = self.normalize_word(word) {
                out.push(Token {
                    term,
                    start: base + offset,
                    end: base + offset + word.len(),
                    position: pos,
                });
            }
        }
    }

    /// Normalize a single word, or `None` when it is filtered out.
    /// Filtered words still consume a position.
    fn normalize_word(&self, word: &str) -> Option<String> {
        let mut token = if self.config.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };

        let char_len = token.chars().count();
        if char_len < self.config.min_token_length || char_len > self.config.max_token_length {
            return None;
        }

        if self.stopwords.contains(&token) {
            return None;
        }

        if let Some(stemmer) = &self.stemmer {
            token = stemmer.stem(&token).into_owned();
        }

        Some(token)
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;
        self.tokenize_span(text, 0, &mut position, &mut tokens);
        tokens
    }

    fn normalize_prefix(&self, prefix: &str) -> String {
        if self.config.lowercase {
            prefix.to_lowercase()
        } else {
            prefix.to_string()
        }
    }
}

fn stemmer_algorithm(language: &str) -> Algorithm {
    match language {
        "arabic" => Algorithm::Arabic,
        "danish" => Algorithm::Danish,
        "dutch" => Algorithm::Dutch,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "greek" => Algorithm::Greek,
        "hungarian" => Algorithm::Hungarian,
        "italian" => Algorithm::Italian,
        "norwegian" => Algorithm::Norwegian,
        "portuguese" => Algorithm::Portuguese,
        "romanian" => Algorithm::Romanian,
        "russian" => Algorithm::Russian,
        "spanish" => Algorithm::Spanish,
        "swedish" => Algorithm::Swedish,
        "turkish" => Algorithm::Turkish,
        _ => Algorithm::English,
    }
}

fn stopword_language(language: &str) -> LANGUAGE {
    match language {
        "french" => LANGUAGE::French,
        "german" => LANGUAGE::German,
        "italian" => LANGUAGE::Italian,
        "portuguese" => LANGUAGE::Portuguese,
        "russian" => LANGUAGE::Russian,
        "spanish" => LANGUAGE::Spanish,
        _ => LANGUAGE::English,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenizerConfig {
        TokenizerConfig::default()
    }

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = StandardTokenizer::new(&config());
        let tokens = tokenizer.terms("Hello World! This is a test.");
        assert_eq!(tokens, vec!["hello", "world", "this", "is", "a", "test"]);
    }

    #[test]
    fn test_offsets_point_into_source() {
        let text = "The Quick  brown";
        let tokenizer = StandardTokenizer::new(&config());
        let tokens = tokenizer.tokenize(text);

        assert_eq!(tokens.len(), 3);
        for token in &tokens {
            assert_eq!(text[token.start..token.end].to_lowercase(), token.term);
        }
        assert_eq!(tokens[1].start, 4);
        assert_eq!(tokens[2].position, 2);
    }

    #[test]
    fn test_stopword_removal_keeps_positions() {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig {
            remove_stopwords: true,
            ..config()
        });
        let tokens = tokenizer.tokenize("rust the programming");

        let terms: Vec<_> = tokens.iter().map(|t| (t.term.as_str(), t.position)).collect();
        assert_eq!(terms, vec![("rust", 0), ("programming", 2)]);
    }

    #[test]
    fn test_stemming() {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig {
            stem: true,
            ..config()
        });
        let tokens = tokenizer.terms("running runs");
        assert!(tokens.iter().all(|t| t == "run"));
    }

    #[test]
    fn test_min_max_token_length() {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig {
            min_token_length: 3,
            max_token_length: 5,
            ..config()
        });
        let tokens = tokenizer.terms("a ab abc abcd abcde abcdef");
        assert_eq!(tokens, vec!["abc", "abcd", "abcde"]);
    }

    #[test]
    fn test_length_counts_characters() {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig {
            max_token_length: 4,
            ..config()
        });
        // four characters, eight bytes
        assert_eq!(tokenizer.terms("éèêë"), vec!["éèêë"]);
    }

    #[test]
    fn test_case_preserved_when_lowercase_disabled() {
        let tokenizer = StandardTokenizer::new(&TokenizerConfig {
            lowercase: false,
            ..config()
        });
        assert_eq!(tokenizer.terms("Rust"), vec!["Rust"]);
        assert_eq!(tokenizer.normalize_prefix("Ru"), "Ru");
    }

    #[test]
    fn test_punctuation_only_yields_nothing() {
        let tokenizer = StandardTokenizer::new(&config());
        assert!(tokenizer.tokenize("?! -- ...").is_empty());
        assert!(tokenizer.tokenize("").is_empty());
    }
}
