//! Query parser and tokenizer.
//!
//! Grammar, loosely:
//!
//! ```text
//! query      := conjunction?
//! conjunction:= term ("and"? term)*
//! term       := "(" conjunction ")" | name (operator value)?
//! ```
//!
//! `name = *` selects every value of a tag. Disjunction and negation are not
//! part of the language and are rejected as unsupported expressions.

use crate::error::{FiletagError, Result};

use super::comparison::ComparisonOp;
use super::expression::QueryExpression;

// ---------------------------------------------------------------------------
// Token types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct QueryToken {
    kind: QueryTokenKind,
    position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryTokenKind {
    Word(String),
    Phrase(String),
    Operator(ComparisonOp),
    LParen,
    RParen,
    Bang,
    And,
    Or,
    Not,
}

// ---------------------------------------------------------------------------
// Query parser
// ---------------------------------------------------------------------------

pub struct QueryParser {
    tokens: Vec<QueryToken>,
    index: usize,
}

impl QueryParser {
    pub fn parse(input: &str) -> Result<QueryExpression> {
        let tokens = tokenize_query_input(input)?;
        if tokens.is_empty() {
            return Ok(QueryExpression::Empty);
        }

        let mut parser = Self { tokens, index: 0 };
        let expression = parser.parse_conjunction(false)?;
        if let Some(token) = parser.peek() {
            return Err(FiletagError::QueryParse(format!(
                "unexpected ')' near byte {}",
                token.position
            )));
        }

        Ok(expression)
    }

    fn parse_conjunction(&mut self, grouped: bool) -> Result<QueryExpression> {
        let mut parts = Vec::new();

        while let Some(token) = self.peek() {
            match token.kind {
                QueryTokenKind::RParen => break,
                QueryTokenKind::And => {
                    if parts.is_empty() {
                        return Err(FiletagError::QueryParse(format!(
                            "'and' without left operand near byte {}",
                            token.position
                        )));
                    }
                    self.index += 1;
                    if self.is_end() || self.next_is_group_close() {
                        return Err(FiletagError::QueryParse(
                            "'and' without right operand".to_string(),
                        ));
                    }
                }
                _ => parts.push(self.parse_term()?),
            }
        }

        if grouped && parts.is_empty() {
            return Err(FiletagError::QueryParse("empty group".to_string()));
        }

        Ok(QueryExpression::and_all(parts))
    }

    fn parse_term(&mut self) -> Result<QueryExpression> {
        let token = self.next().ok_or_else(|| {
            FiletagError::QueryParse("expected query term but reached end of query".to_string())
        })?;

        match token.kind {
            QueryTokenKind::LParen => self.parse_group(token.position),
            QueryTokenKind::Word(name) | QueryTokenKind::Phrase(name) => self.parse_tag_term(name),
            QueryTokenKind::Or => Err(FiletagError::unsupported("or")),
            QueryTokenKind::Not | QueryTokenKind::Bang => Err(FiletagError::unsupported("not")),
            QueryTokenKind::Operator(op) => Err(FiletagError::QueryParse(format!(
                "operator '{op}' without tag name near byte {}",
                token.position
            ))),
            QueryTokenKind::RParen | QueryTokenKind::And => Err(FiletagError::QueryParse(
                format!("expected query term near byte {}", token.position),
            )),
        }
    }

    fn parse_group(&mut self, open_position: usize) -> Result<QueryExpression> {
        let expression = self.parse_conjunction(true)?;
        if self.next_is_group_close() {
            self.index += 1;
            return Ok(expression);
        }
        Err(FiletagError::QueryParse(format!(
            "missing closing ')' for group opened at byte {open_position}"
        )))
    }

    fn parse_tag_term(&mut self, name: String) -> Result<QueryExpression> {
        let Some(QueryTokenKind::Operator(op)) = self.peek().map(|token| token.kind.clone()) else {
            return Ok(QueryExpression::TagPresence { name });
        };
        self.index += 1;

        let value = self.next().ok_or_else(|| {
            FiletagError::QueryParse(format!("missing value after '{name} {op}'"))
        })?;
        match value.kind {
            QueryTokenKind::Word(raw) if raw == "*" && op == ComparisonOp::Eq => {
                Ok(QueryExpression::AllValues { name })
            }
            QueryTokenKind::Word(value) | QueryTokenKind::Phrase(value) => {
                Ok(QueryExpression::Comparison {
                    tag: name,
                    value,
                    op,
                })
            }
            _ => Err(FiletagError::QueryParse(format!(
                "expected value after '{name} {op}' near byte {}",
                value.position
            ))),
        }
    }

    fn next_is_group_close(&self) -> bool {
        matches!(
            self.peek().map(|token| &token.kind),
            Some(QueryTokenKind::RParen)
        )
    }

    fn is_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&QueryToken> {
        self.tokens.get(self.index)
    }

    fn next(&mut self) -> Option<QueryToken> {
        let token = self.tokens.get(self.index).cloned()?;
        self.index += 1;
        Some(token)
    }
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

fn tokenize_query_input(input: &str) -> Result<Vec<QueryToken>> {
    let mut tokens = Vec::new();
    let mut cursor = 0usize;

    while let Some(ch) = input[cursor..].chars().next() {
        if ch.is_whitespace() {
            cursor += ch.len_utf8();
            continue;
        }

        let position = cursor;
        match ch {
            '(' => {
                tokens.push(QueryToken {
                    kind: QueryTokenKind::LParen,
                    position,
                });
                cursor += 1;
            }
            ')' => {
                tokens.push(QueryToken {
                    kind: QueryTokenKind::RParen,
                    position,
                });
                cursor += 1;
            }
            '"' => {
                let (phrase, next_cursor) = consume_quoted_phrase(input, cursor)?;
                tokens.push(QueryToken {
                    kind: QueryTokenKind::Phrase(phrase),
                    position,
                });
                cursor = next_cursor;
            }
            '=' | '!' | '<' | '>' => {
                let rest = &input[cursor..];
                let (kind, width) = if rest.starts_with("!=") {
                    (QueryTokenKind::Operator(ComparisonOp::Ne), 2)
                } else if ch == '!' {
                    (QueryTokenKind::Bang, 1)
                } else {
                    let width = if rest[1..].starts_with('=') { 2 } else { 1 };
                    let op = ComparisonOp::parse(&rest[..width])?;
                    (QueryTokenKind::Operator(op), width)
                };
                tokens.push(QueryToken { kind, position });
                cursor += width;
            }
            _ => {
                let end = input[cursor..]
                    .find(|next: char| {
                        next.is_whitespace() || matches!(next, '(' | ')' | '"' | '=' | '!' | '<' | '>')
                    })
                    .map_or(input.len(), |offset| cursor + offset);

                let raw = &input[cursor..end];
                let kind = if raw.eq_ignore_ascii_case("and") {
                    QueryTokenKind::And
                } else if raw.eq_ignore_ascii_case("or") {
                    QueryTokenKind::Or
                } else if raw.eq_ignore_ascii_case("not") {
                    QueryTokenKind::Not
                } else {
                    QueryTokenKind::Word(raw.to_string())
                };
                tokens.push(QueryToken { kind, position });
                cursor = end;
            }
        }
    }

    Ok(tokens)
}

fn consume_quoted_phrase(input: &str, start: usize) -> Result<(String, usize)> {
    let mut phrase = String::new();
    let mut escaped = false;

    for (offset, ch) in input[start + 1..].char_indices() {
        if escaped {
            phrase.push(ch);
            escaped = false;
            continue;
        }
        if ch == '\\' {
            escaped = true;
            continue;
        }
        if ch == '"' {
            return Ok((phrase, start + 1 + offset + 1));
        }

        phrase.push(ch);
    }

    Err(FiletagError::QueryParse(format!(
        "missing closing quote near byte {start}"
    )))
}
