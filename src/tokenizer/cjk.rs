use super::standard::StandardTokenizer;
use super::{Token, Tokenizer};
use crate::config::TokenizerConfig;

/// Tokenizer for mixed CJK and alphabetic text
///
/// Runs of Han, Kana and Hangul characters become overlapping bigrams
/// (a lone CJK character becomes a unigram). Everything between runs is
/// handed to the standard word tokenizer. Length and stopword filters only
/// apply to the non-CJK words.
#[derive(Debug)]
pub struct CjkTokenizer {
    words: StandardTokenizer,
}

impl CjkTokenizer {
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            words: StandardTokenizer::new(config),
        }
    }

    fn emit_run(run: &[(usize, char)], position: &mut u32, out: &mut Vec<Token>) {
        if let [(start, ch)] = run {
            out.push(Token {
                term: ch.to_string(),
                start: *start,
                end: start + ch.len_utf8(),
                position: *position,
            });
            *position += 1;
            return;
        }

        for pair in run.windows(2) {
            let (start, first) = pair[0];
            let (second_start, second) = pair[1];
            let mut term = String::with_capacity(first.len_utf8() + second.len_utf8());
            term.push(first);
            term.push(second);
            out.push(Token {
                term,
                start,
                end: second_start + second.len_utf8(),
                position: *position,
            });
            *position += 1;
        }
    }
}

impl Tokenizer for CjkTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;
        let mut run: Vec<(usize, char)> = Vec::new();
        let mut span_start = 0usize;

        for (offset, ch) in text.char_indices() {
            if is_cjk(ch) {
                if run.is_empty() && span_start < offset {
                    self.words
                        .tokenize_span(&text[span_start..offset], span_start, &mut position, &mut tokens);
                }
                run.push((offset, ch));
            } else if !run.is_empty() {
                Self::emit_run(&run, &mut position, &mut tokens);
                run.clear();
                span_start = offset;
            }
        }

        if !run.is_empty() {
            Self::emit_run(&run, &mut position, &mut tokens);
        } else if span_start < text.len() {
            self.words
                .tokenize_span(&text[span_start..], span_start, &mut position, &mut tokens);
        }

        tokens
    }

    fn normalize_prefix(&self, prefix: &str) -> String {
        self.words.normalize_prefix(prefix)
    }
}

/// Han ideographs, Kana and Hangul
pub(crate) fn is_cjk(ch: char) -> bool {
    matches!(ch,
        '\u{3040}'..='\u{309F}'     // Hiragana
        | '\u{30A0}'..='\u{30FF}'   // Katakana
        | '\u{3400}'..='\u{4DBF}'   // CJK extension A
        | '\u{4E00}'..='\u{9FFF}'   // CJK unified ideographs
        | '\u{F900}'..='\u{FAFF}'   // CJK compatibility ideographs
        | '\u{1100}'..='\u{11FF}'   // Hangul jamo
        | '\u{3130}'..='\u{318F}'   // Hangul compatibility jamo
        | '\u{AC00}'..='\u{D7AF}'   // Hangul syllables
        | '\u{20000}'..='\u{2A6DF}' // CJK extension B
    )
}
