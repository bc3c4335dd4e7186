//! Lexer for query string syntax
//!
//! Tokenizes Lucene-style query strings into a stream of tokens. Operators
//! are recognized only in upper case (`AND`, `OR`, `NOT`) or in their symbolic
//! forms (`&&`, `||`, `!`). A backslash escapes the next character.

use crate::error::LumenError;
use crate::Result;

/// Characters that end an unquoted term
const TERM_DELIMITERS: &[char] = &[':', '(', ')', '"', '^', '~'];

/// Maximum characters of input quoted in parse errors
const FRAGMENT_CHARS: usize = 24;

/// Token types for query string parsing
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A term (unquoted word), escapes resolved
    Term(String),
    /// A term that ended in an unescaped `*`, without the `*`
    Prefix(String),
    /// A quoted string (phrase)
    QuotedString(String),

    /// AND / &&
    And,
    /// OR / ||
    Or,
    /// NOT / !
    Not,
    /// Colon separator (field:value)
    Colon,

    /// Tilde with optional distance
    Tilde(Option<u32>),
    /// Caret with optional boost value
    Caret(Option<f32>),

    /// Left parenthesis (grouping)
    LeftParen,
    /// Right parenthesis (grouping)
    RightParen,

    /// Plus sign (required clause)
    Plus,
    /// Minus sign (prohibited clause)
    Minus,

    /// End of input
    Eof,
}

impl Token {
    /// Whether this token can begin a clause
    pub fn starts_clause(&self) -> bool {
        matches!(
            self,
            Token::Term(_)
                | Token::Prefix(_)
                | Token::QuotedString(_)
                | Token::LeftParen
                | Token::Plus
                | Token::Minus
                | Token::Not
        )
    }
}

/// Lexer for tokenizing query strings
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace();
        self.token_start = self.position;

        if self.is_eof() {
            return Ok(Token::Eof);
        }

        let ch = self.current_char();
        match ch {
            ':' => {
                self.advance();
                Ok(Token::Colon)
            }
            '~' => {
                self.advance();
                Ok(Token::Tilde(self.read_unsigned_int()))
            }
            '^' => {
                self.advance();
                Ok(Token::Caret(self.read_float()))
            }
            '(' => {
                self.advance();
                Ok(Token::LeftParen)
            }
            ')' => {
                self.advance();
                Ok(Token::RightParen)
            }
            '+' => {
                self.advance();
                Ok(Token::Plus)
            }
            '-' => {
                self.advance();
                Ok(Token::Minus)
            }
            '!' => {
                self.advance();
                Ok(Token::Not)
            }
            '&' if self.peek() == Some('&') => {
                self.position += 2;
                Ok(Token::And)
            }
            '|' if self.peek() == Some('|') => {
                self.position += 2;
                Ok(Token::Or)
            }
            '"' => {
                self.advance();
                self.read_quoted_string()
            }
            _ => self.read_term(),
        }
    }

    /// Character offset where the last returned token starts
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    /// Input from `start` onwards, shortened for error messages
    pub fn fragment(&self, start: usize) -> String {
        let start = start.min(self.input.len());
        self.input[start..].iter().take(FRAGMENT_CHARS).collect()
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn read_term(&mut self) -> Result<Token> {
        let mut term = String::new();
        let mut escaped_any = false;
        let mut trailing_star = false;

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_whitespace() || TERM_DELIMITERS.contains(&ch) {
                break;
            }
            if ch == '\\' {
                self.advance();
                if self.is_eof() {
                    return Err(LumenError::query_parse(
                        self.fragment(self.token_start),
                        "dangling escape character",
                    ));
                }
                term.push(self.current_char());
                escaped_any = true;
                trailing_star = false;
                self.advance();
                continue;
            }
            term.push(ch);
            trailing_star = ch == '*';
            self.advance();
        }

        if trailing_star {
            term.pop();
            return Ok(Token::Prefix(term));
        }

        if !escaped_any {
            match term.as_str() {
                "AND" => return Ok(Token::And),
                "OR" => return Ok(Token::Or),
                "NOT" => return Ok(Token::Not),
                _ => {}
            }
        }
        Ok(Token::Term(term))
    }

    fn read_quoted_string(&mut self) -> Result<Token> {
        let mut s = String::new();

        while !self.is_eof() {
            let ch = self.current_char();
            if ch == '"' {
                self.advance();
                return Ok(Token::QuotedString(s));
            }
            if ch == '\\' {
                self.advance();
                if !self.is_eof() {
                    s.push(self.current_char());
                    self.advance();
                }
            } else {
                s.push(ch);
                self.advance();
            }
        }

        Err(LumenError::query_parse(
            self.fragment(self.token_start),
            "unterminated quoted string",
        ))
    }

    fn read_unsigned_int(&mut self) -> Option<u32> {
        let mut num_str = String::new();

        while !self.is_eof() && self.current_char().is_ascii_digit() {
            num_str.push(self.current_char());
            self.advance();
        }

        num_str.parse().ok()
    }

    fn read_float(&mut self) -> Option<f32> {
        let mut num_str = String::new();
        let mut has_dot = false;

        while !self.is_eof() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        num_str.parse().ok()
    }

    fn current_char(&self) -> char {
        self.input[self.position]
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return tokens;
            }
            tokens.push(token);
        }
    }

    fn term(s: &str) -> Token {
        Token::Term(s.to_string())
    }

    #[test]
    fn test_simple_term() {
        let mut lexer = Lexer::new("hello");
        assert_eq!(lexer.next_token().unwrap(), term("hello"));
        assert_eq!(lexer.next_token().unwrap(), Token::Eof);
    }

    #[test]
    fn test_field_value() {
        assert_eq!(
            all_tokens("content:rust"),
            vec![term("content"), Token::Colon, term("rust")]
        );
    }

    #[test]
    fn test_boolean_operators() {
        assert_eq!(
            all_tokens("a AND b OR c NOT d"),
            vec![
                term("a"),
                Token::And,
                term("b"),
                Token::Or,
                term("c"),
                Token::Not,
                term("d")
            ]
        );
    }

    #[test]
    fn test_symbolic_operators() {
        assert_eq!(
            all_tokens("a && b || !c"),
            vec![term("a"), Token::And, term("b"), Token::Or, Token::Not, term("c")]
        );
    }

    #[test]
    fn test_lowercase_operators_are_terms() {
        assert_eq!(
            all_tokens("rock and roll"),
            vec![term("rock"), term("and"), term("roll")]
        );
    }

    #[test]
    fn test_quoted_string() {
        assert_eq!(
            all_tokens("\"hello world\"~2"),
            vec![Token::QuotedString("hello world".to_string()), Token::Tilde(Some(2))]
        );
        assert_eq!(
            all_tokens("\"say \\\"hi\\\"\""),
            vec![Token::QuotedString("say \"hi\"".to_string())]
        );
    }

    #[test]
    fn test_prefix_term() {
        assert_eq!(all_tokens("prog*"), vec![Token::Prefix("prog".to_string())]);
        assert_eq!(all_tokens("prog\\*"), vec![term("prog*")]);
        assert_eq!(all_tokens("*"), vec![Token::Prefix(String::new())]);
    }

    #[test]
    fn test_escapes() {
        assert_eq!(all_tokens("a\\:b"), vec![term("a:b")]);
        assert_eq!(all_tokens("\\AND"), vec![term("AND")]);
        assert!(Lexer::new("abc\\").next_token().is_err());
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(all_tokens("rust~"), vec![term("rust"), Token::Tilde(None)]);
        assert_eq!(
            all_tokens("rust^2.5 go^"),
            vec![term("rust"), Token::Caret(Some(2.5)), term("go"), Token::Caret(None)]
        );
    }

    #[test]
    fn test_plus_minus_and_inner_hyphen() {
        assert_eq!(
            all_tokens("+required -excluded wi-fi"),
            vec![Token::Plus, term("required"), Token::Minus, term("excluded"), term("wi-fi")]
        );
    }

    #[test]
    fn test_grouping() {
        assert_eq!(
            all_tokens("(a OR b)"),
            vec![Token::LeftParen, term("a"), Token::Or, term("b"), Token::RightParen]
        );
    }

    #[test]
    fn test_unicode_terms() {
        assert_eq!(all_tokens("中文检索 café"), vec![term("中文检索"), term("café")]);
    }

    #[test]
    fn test_unterminated_string_reports_fragment() {
        let mut lexer = Lexer::new("a \"unterminated");
        assert_eq!(lexer.next_token().unwrap(), term("a"));
        match lexer.next_token() {
            Err(LumenError::QueryParse { fragment, .. }) => assert_eq!(fragment, "\"unterminated"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_token_start() {
        let mut lexer = Lexer::new("  foo bar");
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_start(), 2);
        lexer.next_token().unwrap();
        assert_eq!(lexer.token_start(), 6);
        assert_eq!(lexer.fragment(6), "bar");
    }
}
