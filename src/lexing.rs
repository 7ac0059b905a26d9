//! Tokenizer for the resume LaTeX dialect
//!
//! Tokenization is a single left-to-right scan handled by logos. This module wraps
//! the raw logos stream, attaching the token text and a line/column position to
//! every token. Nothing is filtered here: comments and whitespace are all kept,
//! and it is up to the parser to decide what to drop.
//!
//! The only failure mode is a trailing backslash with nothing after it. It is
//! reported as a [`TokenizeError`] and the token stream simply ends there.

pub mod location;
pub mod tokens;

use logos::Logos;
use serde::Serialize;
use std::fmt;

pub use location::SourceLocation;
pub use tokens::{Position, Token, TokenKind};

/// A non-fatal problem found while tokenizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenizeError {
    pub message: String,
    pub position: Position,
}

impl fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.message, self.position)
    }
}

/// Tokens together with any tokenizer errors
#[derive(Debug, Clone, Default)]
pub struct TokenizeOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<TokenizeError>,
}

/// Tokenize a source string
pub fn tokenize(source: &str) -> TokenizeOutput {
    let location = SourceLocation::new(source);
    let mut lexer = TokenKind::lexer(source);
    let mut output = TokenizeOutput::default();

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let position = location.byte_to_position(span.start);

        match result {
            Ok(kind) => {
                let slice = lexer.slice();
                let text = match kind {
                    TokenKind::Command => &slice[1..],
                    _ => slice,
                };
                output.tokens.push(Token::new(kind, text, position));
            }
            Err(()) => {
                // The regexes cover every character except a backslash with nothing after it
                output.errors.push(TokenizeError {
                    message: "Unexpected end of input after backslash".to_string(),
                    position,
                });
                break;
            }
        }
    }

    output
}
