//! Token definitions for the resume LaTeX dialect
//!
//! The raw token kinds are produced by a logos lexer. Command tokens cover both
//! control words (`\section`) and control symbols (`\%`, `\\`, `\ `); the two
//! regexes are disjoint so logos never has to arbitrate between them.
use logos::Logos;
use serde::Serialize;
use std::fmt;

/// All possible token kinds in the resume dialect
#[derive(Logos, Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub enum TokenKind {
    // Control word: backslash followed by ASCII letters only
    #[regex(r"\\[a-zA-Z]+")]
    // Control symbol: backslash followed by any single non-letter character
    #[regex(r"\\[^a-zA-Z]")]
    Command,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    // Runs to the next special character, internal spaces included
    #[regex(r"[^\\{}%\n \t][^\\{}%\n]*")]
    Text,

    #[regex(r"[ \t]+")]
    Whitespace,

    #[token("\n")]
    Newline,

    #[regex(r"%[^\n]*")]
    Comment,
}

impl TokenKind {
    /// Check if this token kind is whitespace (including newlines)
    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Newline)
    }

    /// Short lowercase label used by the token listing format
    pub fn label(&self) -> &'static str {
        match self {
            TokenKind::Command => "command",
            TokenKind::OpenBrace => "open-brace",
            TokenKind::CloseBrace => "close-brace",
            TokenKind::Text => "text",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Newline => "newline",
            TokenKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A location in the source text
///
/// `line` and `column` are 1-based; `column` counts characters, `offset` counts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A token with its text and source position
///
/// For [`TokenKind::Command`] the text is the command name without the leading
/// backslash; every other kind carries its verbatim source slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Check whether this is a command token with the given name
    pub fn is_command(&self, name: &str) -> bool {
        self.kind == TokenKind::Command && self.text == name
    }

    /// The source text this token was produced from
    pub fn source_text(&self) -> String {
        match self.kind {
            TokenKind::Command => format!("\\{}", self.text),
            _ => self.text.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:?}@{}", self.kind, self.text, self.position)
    }
}
