use std::collections::HashMap;

use super::HighlightTerms;
use crate::config::HighlightConfig;
use crate::tokenizer::{Token, TokenizerRef};

/// Selects and marks the best fragment of a text for a set of query terms
///
/// Fragment length is bounded in characters, never split inside a token,
/// and every byte outside the inserted tags is copied from the input.
#[derive(Debug, Clone)]
pub struct Highlighter {
    tokenizer: TokenizerRef,
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(tokenizer: TokenizerRef, config: HighlightConfig) -> Self {
        Self { tokenizer, config }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Best fragment of `text` with matched tokens wrapped in the configured tags.
    ///
    /// Without any matching token this returns the leading fragment of `text`.
    pub fn highlight(&self, terms: &HighlightTerms, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        let max_chars = self.config.max_fragment_chars.max(1);
        let tokens = self.tokenizer.tokenize(text);
        let offsets = char_offsets(text);
        let span = Span {
            tokens: &tokens,
            offsets: &offsets,
            max_chars,
        };

        let matched: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, token)| terms.matches(&token.term))
            .map(|(idx, _)| idx)
            .collect();

        if matched.is_empty() {
            return leading_fragment(text, &span).to_string();
        }

        let (first, last) = best_window(&span, &matched);
        let (first, last) = grow_window(&span, first, last);

        let mut start = tokens[first].start;
        let mut end = tokens[last].end;
        if first == 0 && offsets[end] <= max_chars {
            start = 0;
        }
        if last + 1 == tokens.len() && offsets[text.len()] - offsets[start] <= max_chars {
            end = text.len();
        }

        let marks = merged_marks(&tokens, &matched, first, last);
        self.render(text, start, end, &marks)
    }

    fn render(&self, text: &str, start: usize, end: usize, marks: &[(usize, usize)]) -> String {
        let tags_len = marks.len() * (self.config.pre_tag.len() + self.config.post_tag.len());
        let mut out = String::with_capacity(end - start + tags_len);

        let mut cursor = start;
        for &(mark_start, mark_end) in marks {
            out.push_str(&text[cursor..mark_start]);
            out.push_str(&self.config.pre_tag);
            out.push_str(&text[mark_start..mark_end]);
            out.push_str(&self.config.post_tag);
            cursor = mark_end;
        }
        out.push_str(&text[cursor..end]);
        out
    }
}

/// Character count preceding each byte offset that starts a character, plus
/// the total at `text.len()`
fn char_offsets(text: &str) -> Vec<usize> {
    let mut offsets = vec![0; text.len() + 1];
    let mut count = 0;
    for (byte, _) in text.char_indices() {
        offsets[byte] = count;
        count += 1;
    }
    offsets[text.len()] = count;
    offsets
}

struct Span<'a> {
    tokens: &'a [Token],
    offsets: &'a [usize],
    max_chars: usize,
}

impl Span<'_> {
    /// Characters covered from the start of token `a` to the end of token `b`
    fn chars(&self, a: usize, b: usize) -> usize {
        self.offsets[self.tokens[b].end].saturating_sub(self.offsets[self.tokens[a].start])
    }

    fn fits(&self, a: usize, b: usize) -> bool {
        self.chars(a, b) <= self.max_chars
    }
}

/// Window over matched tokens maximizing (distinct terms, occurrences);
/// returns token indices of its first and last match. Earliest wins ties.
fn best_window(span: &Span<'_>, matched: &[usize]) -> (usize, usize) {
    let mut best = ((0, 0), matched[0], matched[0]);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut j = 0;

    for i in 0..matched.len() {
        if j == i {
            *counts.entry(span.tokens[matched[i]].term.as_str()).or_default() += 1;
            j = i + 1;
        }
        while j < matched.len() && span.fits(matched[i], matched[j]) {
            *counts.entry(span.tokens[matched[j]].term.as_str()).or_default() += 1;
            j += 1;
        }

        let score = (counts.len(), j - i);
        if score > best.0 {
            best = (score, matched[i], matched[j - 1]);
        }

        let term = span.tokens[matched[i]].term.as_str();
        if let Some(count) = counts.get_mut(term) {
            *count -= 1;
            if *count == 0 {
                counts.remove(term);
            }
        }
    }

    (best.1, best.2)
}

/// Extend the window one token at a time, alternating left and right
fn grow_window(span: &Span<'_>, mut first: usize, mut last: usize) -> (usize, usize) {
    loop {
        let mut grew = false;
        if first > 0 && span.fits(first - 1, last) {
            first -= 1;
            grew = true;
        }
        if last + 1 < span.tokens.len() && span.fits(first, last + 1) {
            last += 1;
            grew = true;
        }
        if !grew {
            return (first, last);
        }
    }
}

/// Byte spans of matched tokens inside the window, overlapping spans merged
fn merged_marks(tokens: &[Token], matched: &[usize], first: usize, last: usize) -> Vec<(usize, usize)> {
    let mut marks: Vec<(usize, usize)> = Vec::new();
    for &idx in matched.iter().filter(|&&idx| idx >= first && idx <= last) {
        let (start, end) = (tokens[idx].start, tokens[idx].end);
        match marks.last_mut() {
            Some(prev) if start < prev.1 => prev.1 = prev.1.max(end),
            _ => marks.push((start, end)),
        }
    }
    marks
}

/// Text start up to the last token end within the limit
fn leading_fragment<'t>(text: &'t str, span: &Span<'_>) -> &'t str {
    if span.offsets[text.len()] <= span.max_chars {
        return text;
    }

    let cut = span
        .tokens
        .iter()
        .take_while(|token| span.offsets[token.end] <= span.max_chars)
        .last()
        .map(|token| token.end);

    match cut {
        Some(end) => &text[..end],
        None => text
            .char_indices()
            .nth(span.max_chars)
            .map_or(text, |(byte, _)| &text[..byte]),
    }
}
