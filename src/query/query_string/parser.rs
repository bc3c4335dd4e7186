//! Recursive descent parser for query strings
//!
//! # Grammar
//!
//! ```text
//! query       := or_expr | <empty>
//! or_expr     := and_expr (OR and_expr)*
//! and_expr    := clause ((AND)? clause)*
//! clause      := ('+' | '-' | NOT)? primary
//! primary     := field_query | grouped | term_expr | phrase_expr
//! field_query := TERM COLON (grouped | term_expr | phrase_expr)
//! term_expr   := (TERM | PREFIX) (CARET boost)?
//! phrase_expr := QUOTED (TILDE slop)? (CARET boost)?
//! grouped     := '(' or_expr ')' (CARET boost)?
//! ```
//!
//! Adjacent clauses without an operator are joined with the configured
//! default operator. `AND` makes the clauses on both sides required.
//! Unqualified clauses search `content`; `id:` matches stored ids verbatim
//! (`id:abc*` matches ids starting with `abc`) and any other field matches
//! nothing.

use super::lexer::{Lexer, Token};
use crate::error::LumenError;
use crate::query::ast::{MatchNoneQuery, QueryNode};
use crate::query::nodes::{BoolQuery, IdQuery, PhraseQuery, PrefixQuery, TermQuery};
use crate::query::types::{MatchOperator, Occur, QueryField};
use crate::tokenizer::Tokenizer;
use crate::Result;

/// Parser for Lucene-style query strings
///
/// Terms are analyzed with the index tokenizer while parsing, so the
/// resulting nodes hold normalized terms.
pub struct QueryStringParser<'a> {
    lexer: Lexer,
    current_token: Token,
    current_start: usize,
    tokenizer: &'a dyn Tokenizer,
    default_operator: MatchOperator,
}

impl<'a> QueryStringParser<'a> {
    pub fn new(input: &str, tokenizer: &'a dyn Tokenizer) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token()?;
        let current_start = lexer.token_start();

        Ok(Self {
            lexer,
            current_token,
            current_start,
            tokenizer,
            default_operator: MatchOperator::Or,
        })
    }

    /// Set the operator used between clauses that have none
    pub fn with_default_operator(mut self, operator: MatchOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Parse the query string into a query AST
    pub fn parse(&mut self) -> Result<Box<dyn QueryNode>> {
        if self.current_token == Token::Eof {
            return Ok(Box::new(MatchNoneQuery));
        }

        let query = self.parse_or_expr(&QueryField::Content)?;

        if self.current_token != Token::Eof {
            return Err(self.error(format!("unexpected {}", describe(&self.current_token))));
        }

        Ok(query)
    }

    /// or_expr := and_expr (OR and_expr)*
    fn parse_or_expr(&mut self, field: &QueryField) -> Result<Box<dyn QueryNode>> {
        let mut clauses = vec![self.parse_and_expr(field)?];

        while self.current_token == Token::Or {
            self.advance()?;
            if !self.current_token.starts_clause() {
                return Err(self.error("expected a clause after OR"));
            }
            clauses.push(self.parse_and_expr(field)?);
        }

        if clauses.len() == 1 {
            return Ok(clauses.remove(0));
        }
        Ok(Box::new(clauses.into_iter().fold(BoolQuery::new(), |q, c| {
            q.add_boxed(Occur::Should, c)
        })))
    }

    /// and_expr := clause ((AND)? clause)*
    fn parse_and_expr(&mut self, field: &QueryField) -> Result<Box<dyn QueryNode>> {
        let implicit = match self.default_operator {
            MatchOperator::And => Occur::Must,
            MatchOperator::Or => Occur::Should,
        };
        let mut clauses: Vec<(Occur, Box<dyn QueryNode>)> = Vec::new();

        loop {
            if self.current_token == Token::And {
                if clauses.is_empty() {
                    return Err(self.error("AND must follow a clause"));
                }
                self.advance()?;
                if !self.current_token.starts_clause() {
                    return Err(self.error("expected a clause after AND"));
                }
                if let Some(last) = clauses.last_mut() {
                    if last.0 == Occur::Should {
                        last.0 = Occur::Must;
                    }
                }
                let (occur, node) = self.parse_clause(field)?;
                clauses.push((occur.unwrap_or(Occur::Must), node));
            } else if self.current_token.starts_clause() {
                let (occur, node) = self.parse_clause(field)?;
                clauses.push((occur.unwrap_or(implicit), node));
            } else {
                break;
            }
        }

        match clauses.len() {
            0 => Err(self.error(format!("expected a clause, found {}", describe(&self.current_token)))),
            1 if clauses[0].0 != Occur::MustNot => Ok(clauses.remove(0).1),
            _ => Ok(Box::new(clauses.into_iter().fold(BoolQuery::new(), |q, (occur, c)| {
                q.add_boxed(occur, c)
            }))),
        }
    }

    /// clause := ('+' | '-' | NOT)? primary
    fn parse_clause(&mut self, field: &QueryField) -> Result<(Option<Occur>, Box<dyn QueryNode>)> {
        let occur = match self.current_token {
            Token::Plus => Some(Occur::Must),
            Token::Minus | Token::Not => Some(Occur::MustNot),
            _ => None,
        };
        if occur.is_some() {
            self.advance()?;
        }

        Ok((occur, self.parse_primary(field)?))
    }

    fn parse_primary(&mut self, field: &QueryField) -> Result<Box<dyn QueryNode>> {
        let start = self.current_start;
        match self.current_token.clone() {
            Token::Term(text) => {
                self.advance()?;
                if self.current_token == Token::Colon {
                    self.advance()?;
                    return self.parse_field_value(&QueryField::from_name(&text));
                }
                self.finish_term(field, text, false, start)
            }
            Token::Prefix(text) => {
                self.advance()?;
                self.finish_term(field, text, true, start)
            }
            Token::QuotedString(text) => {
                self.advance()?;
                self.finish_phrase(field, &text)
            }
            Token::LeftParen => {
                self.advance()?;
                if self.current_token == Token::RightParen {
                    return Err(self.error("empty group"));
                }
                let inner = self.parse_or_expr(field)?;
                if self.current_token != Token::RightParen {
                    return Err(self.error("expected ')'"));
                }
                self.advance()?;
                let boost = self.parse_boost()?;
                if boost == 1.0 {
                    return Ok(inner);
                }
                Ok(Box::new(
                    BoolQuery::new()
                        .add_boxed(Occur::Must, inner)
                        .with_boost(boost),
                ))
            }
            other => Err(self.error(format!(
                "expected a term, phrase or group, found {}",
                describe(&other)
            ))),
        }
    }

    fn parse_field_value(&mut self, field: &QueryField) -> Result<Box<dyn QueryNode>> {
        match self.current_token {
            Token::Term(_) | Token::Prefix(_) | Token::QuotedString(_) | Token::LeftParen => {
                self.parse_primary(field)
            }
            _ => Err(self.error("expected a value after ':'")),
        }
    }

    fn finish_term(
        &mut self,
        field: &QueryField,
        text: String,
        prefix: bool,
        start: usize,
    ) -> Result<Box<dyn QueryNode>> {
        if matches!(self.current_token, Token::Tilde(_)) {
            return Err(LumenError::query_parse(
                self.lexer.fragment(start),
                "fuzzy queries are not supported",
            ));
        }
        let boost = self.parse_boost()?;

        match field {
            QueryField::Unknown(_) => Ok(Box::new(MatchNoneQuery)),
            QueryField::Id if prefix => {
                if text.is_empty() {
                    return Err(LumenError::query_parse(
                        self.lexer.fragment(start),
                        "prefix queries need at least one character",
                    ));
                }
                Ok(Box::new(IdQuery::prefix(text).with_boost(boost)))
            }
            QueryField::Id => Ok(Box::new(IdQuery::new(text).with_boost(boost))),
            QueryField::Content if prefix => {
                let normalized = self.tokenizer.normalize_prefix(&text);
                if normalized.is_empty() {
                    return Err(LumenError::query_parse(
                        self.lexer.fragment(start),
                        "prefix queries need at least one character",
                    ));
                }
                Ok(Box::new(PrefixQuery::new(normalized).with_boost(boost)))
            }
            QueryField::Content => Ok(self.analyze_terms(&text, boost)),
        }
    }

    fn finish_phrase(&mut self, field: &QueryField, text: &str) -> Result<Box<dyn QueryNode>> {
        let slop = match self.current_token {
            Token::Tilde(Some(slop)) => {
                self.advance()?;
                slop
            }
            Token::Tilde(None) => return Err(self.error("expected a slop value after '~'")),
            _ => 0,
        };
        let boost = self.parse_boost()?;

        match field {
            QueryField::Unknown(_) => Ok(Box::new(MatchNoneQuery)),
            QueryField::Id => Ok(Box::new(IdQuery::new(text).with_boost(boost))),
            QueryField::Content => {
                let tokens = self.tokenizer.tokenize(text);
                match tokens.len() {
                    0 => Ok(Box::new(MatchNoneQuery)),
                    1 => Ok(Box::new(
                        TermQuery::new(tokens[0].term.clone()).with_boost(boost),
                    )),
                    _ => {
                        let base = tokens[0].position;
                        let terms = tokens
                            .into_iter()
                            .map(|t| (t.term, t.position - base))
                            .collect();
                        Ok(Box::new(
                            PhraseQuery::new(terms).with_slop(slop).with_boost(boost),
                        ))
                    }
                }
            }
        }
    }

    /// A bare word may analyze to zero, one or several terms
    fn analyze_terms(&self, text: &str, boost: f32) -> Box<dyn QueryNode> {
        let mut terms = self.tokenizer.terms(text);
        match terms.len() {
            0 => Box::new(MatchNoneQuery),
            1 => Box::new(TermQuery::new(terms.remove(0)).with_boost(boost)),
            _ => Box::new(
                terms
                    .into_iter()
                    .fold(BoolQuery::new(), |q, t| q.should(TermQuery::new(t)))
                    .with_boost(boost),
            ),
        }
    }

    fn parse_boost(&mut self) -> Result<f32> {
        match self.current_token {
            Token::Caret(Some(boost)) => {
                self.advance()?;
                Ok(boost)
            }
            Token::Caret(None) => Err(self.error("expected a number after '^'")),
            _ => Ok(1.0),
        }
    }

    fn advance(&mut self) -> Result<()> {
        self.current_token = self.lexer.next_token()?;
        self.current_start = self.lexer.token_start();
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> LumenError {
        LumenError::query_parse(self.lexer.fragment(self.current_start), message)
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Term(t) => format!("term '{t}'"),
        Token::Prefix(t) => format!("prefix '{t}*'"),
        Token::QuotedString(t) => format!("phrase \"{t}\""),
        Token::And => "AND".to_string(),
        Token::Or => "OR".to_string(),
        Token::Not => "NOT".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Tilde(_) => "'~'".to_string(),
        Token::Caret(_) => "'^'".to_string(),
        Token::LeftParen => "'('".to_string(),
        Token::RightParen => "')'".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Eof => "end of input".to_string(),
    }
}
