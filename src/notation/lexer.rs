//! Construction notation lexer. Tokenizes a simple DMRS string.

use crate::{Error, Result};

/// A token from the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub text: String,
}

/// Source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Keywords
    Dmrs,

    // Literals
    Integer, StringLiteral,

    // Predicates, roles, posts, sort values
    Identifier,

    // Punctuation
    LParen, RParen, LBracket, RBracket, LBrace, RBrace,
    Lt, Gt, Colon, Semicolon, Slash, Eq,
    Arrow,      // ->

    Eof,
}

/// Tokenize a construction string.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(pos, ch)) = chars.peek() {
        match ch {
            // Skip whitespace
            c if c.is_whitespace() => { chars.next(); }

            // Skip line comments
            '/' if matches!(chars.clone().nth(1), Some((_, '/'))) => {
                while chars.peek().map_or(false, |&(_, c)| c != '\n') {
                    chars.next();
                }
            }

            // Constant arguments
            '"' => {
                chars.next(); // consume opening quote
                let start = pos;
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some((_, '\\')) => {
                            if let Some((_, escaped)) = chars.next() {
                                match escaped {
                                    'n' => s.push('\n'),
                                    't' => s.push('\t'),
                                    '\\' => s.push('\\'),
                                    '"' => s.push('"'),
                                    c => { s.push('\\'); s.push(c); }
                                }
                            }
                        }
                        Some((end, '"')) => {
                            tokens.push(Token {
                                kind: TokenKind::StringLiteral,
                                span: Span { start, end: end + 1 },
                                text: s,
                            });
                            break;
                        }
                        Some((_, c)) => s.push(c),
                        None => return Err(Error::SyntaxError {
                            position: start,
                            message: "Unterminated string literal".into(),
                        }),
                    }
                }
            }

            // Node ids and span offsets
            c if c.is_ascii_digit() => {
                let start = pos;
                let mut num = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_ascii_digit() {
                        num.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token {
                    kind: TokenKind::Integer,
                    span: Span { start, end: start + num.len() },
                    text: num,
                });
            }

            // `->` wins over an identifier starting with '-'
            '-' if matches!(chars.clone().nth(1), Some((_, '>'))) => {
                chars.next();
                chars.next();
                tokens.push(punct(TokenKind::Arrow, pos, "->"));
            }

            // Predicates (`_guard+dog_n`), roles (`L-INDEX`), sort values (`+`, `-`)
            c if is_ident_char(c) => {
                let start = pos;
                let mut ident = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    let arrow_ahead = c == '-' && matches!(chars.clone().nth(1), Some((_, '>')));
                    if is_ident_char(c) && !arrow_ahead {
                        ident.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let kind = if ident == "dmrs" { TokenKind::Dmrs } else { TokenKind::Identifier };
                tokens.push(Token {
                    kind,
                    span: Span { start, end: start + ident.len() },
                    text: ident,
                });
            }

            // Punctuation
            '(' => { chars.next(); tokens.push(punct(TokenKind::LParen, pos, "(")); }
            ')' => { chars.next(); tokens.push(punct(TokenKind::RParen, pos, ")")); }
            '[' => { chars.next(); tokens.push(punct(TokenKind::LBracket, pos, "[")); }
            ']' => { chars.next(); tokens.push(punct(TokenKind::RBracket, pos, "]")); }
            '{' => { chars.next(); tokens.push(punct(TokenKind::LBrace, pos, "{")); }
            '}' => { chars.next(); tokens.push(punct(TokenKind::RBrace, pos, "}")); }
            '<' => { chars.next(); tokens.push(punct(TokenKind::Lt, pos, "<")); }
            '>' => { chars.next(); tokens.push(punct(TokenKind::Gt, pos, ">")); }
            ':' => { chars.next(); tokens.push(punct(TokenKind::Colon, pos, ":")); }
            ';' => { chars.next(); tokens.push(punct(TokenKind::Semicolon, pos, ";")); }
            '/' => { chars.next(); tokens.push(punct(TokenKind::Slash, pos, "/")); }
            '=' => { chars.next(); tokens.push(punct(TokenKind::Eq, pos, "=")); }

            other => {
                return Err(Error::SyntaxError {
                    position: pos,
                    message: format!("Unexpected character: '{other}'"),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span { start: input.len(), end: input.len() },
        text: String::new(),
    });

    Ok(tokens)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '+' | '-' | '.')
}

fn punct(kind: TokenKind, pos: usize, text: &str) -> Token {
    Token {
        kind,
        span: Span { start: pos, end: pos + text.len() },
        text: text.to_string(),
    }
}
