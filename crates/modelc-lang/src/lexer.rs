//! Lexer for model definition files using logos.

use crate::span::Span;
use logos::Logos;

/// Token types for model definition files.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // Top-level keywords
    #[token("uses")]
    Uses,
    #[token("domain")]
    Domain,
    #[token("class")]
    Class,

    // Domain items
    #[token("length")]
    Length,
    #[token("scale")]
    Scale,
    #[token("map")]
    Map,

    // Stereotypes
    #[token("enum")]
    Enum,
    #[token("reference")]
    Reference,
    #[token("plain")]
    Plain,

    // Class items
    #[token("trigram")]
    Trigram,
    #[token("label")]
    Label,
    #[token("key")]
    Key,
    #[token("abstract")]
    Abstract,
    #[token("dbonly")]
    DbOnly,
    #[token("values")]
    Values,

    // Property kinds
    #[token("field")]
    Field,
    #[token("ref")]
    Ref,
    #[token("compose")]
    Compose,
    #[token("alias")]
    Alias,

    // Property modifiers
    #[token("primary")]
    Primary,
    #[token("required")]
    Required,
    #[token("unique")]
    Unique,
    #[token("many")]
    Many,
    #[token("one")]
    One,
    #[token("default")]
    Default,
    #[token("column")]
    Column,
    #[token("role")]
    Role,

    // Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Identifier
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // String literal (double-quoted)
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len() - 1])
    })]
    String(String),

    // Integer literal
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    // Float literal
    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Punctuation
    #[token("->")]
    Arrow,
    #[token("::")]
    PathSep,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token("=")]
    Assign,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

impl Token {
    /// Human-readable description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{}'", name),
            Token::String(s) => format!("string \"{}\"", s),
            Token::Int(i) => format!("integer {}", i),
            Token::Float(f) => format!("number {}", f),
            Token::Arrow => "'->'".to_string(),
            Token::PathSep => "'::'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Semi => "';'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Assign => "'='".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            other => format!("keyword '{}'", format!("{:?}", other).to_lowercase()),
        }
    }
}

/// Unescape a string literal, handling common escape sequences.
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// A token with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Lexer that produces spanned tokens.
///
/// Characters that do not form a token are remembered rather than silently
/// dropped; the parser turns the first one into an error.
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<SpannedToken>>,
    invalid: Option<Span>,
}

impl<'source> Lexer<'source> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            inner: Token::lexer(source),
            peeked: None,
            invalid: None,
        }
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Option<&SpannedToken> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_inner());
        }
        self.peeked.as_ref().and_then(|o| o.as_ref())
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Option<SpannedToken> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.next_inner(),
        }
    }

    /// Take the span of the first unrecognised input, if any.
    pub fn take_invalid(&mut self) -> Option<Span> {
        self.invalid.take()
    }

    fn next_inner(&mut self) -> Option<SpannedToken> {
        loop {
            match self.inner.next() {
                Some(Ok(token)) => {
                    return Some(SpannedToken {
                        token,
                        span: self.inner.span().into(),
                    });
                }
                Some(Err(())) => {
                    if self.invalid.is_none() {
                        self.invalid = Some(self.inner.span().into());
                    }
                }
                None => return None,
            }
        }
    }

    /// Get the source string.
    pub fn source(&self) -> &'source str {
        self.inner.source()
    }
}

impl Iterator for Lexer<'_> {
    type Item = SpannedToken;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Tokenize a source string into a vector of spanned tokens.
pub fn tokenize(source: &str) -> Vec<SpannedToken> {
    Lexer::new(source).collect()
}
