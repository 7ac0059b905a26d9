//! Recursive-descent parser from tokens to AST
//!
//! The parser is purely structural. It matches braces and `\begin`/`\end`
//! pairs and attaches brace groups to the command they follow, but never
//! interprets command names beyond `begin`, `end` and `documentclass`.
//!
//! Malformed input never aborts parsing:
//!
//!     - A stray `}` is dropped silently.
//!     - A `{` without its `}` closes at end of input and reports "Unclosed brace group".
//!     - An `\end{b}` inside `\begin{a}` reports "Mismatched environment", is consumed,
//!       and the parser keeps filling environment `a`.
//!     - An `\end` outside any environment is dropped together with its name group.
//!     - Groups and environments nested deeper than [`ParseOptions::max_nesting_depth`]
//!       report "Nesting too deep" and are skipped without building nodes.
//!
//! Argument collection follows TeX's habit of gobbling spaces after a control
//! word: `\section {X}` still takes `{X}` as its argument. Between two argument
//! groups only spaces and tabs are skipped, so a newline always ends the list.
//! Control symbols (`\%`, `\\`) never take arguments.

use crate::ast::{Command, Document, Environment, Group, Node, Text};
use crate::lexing::{Position, Token, TokenKind};
use serde::Serialize;
use std::fmt;

/// Class name used when no `\documentclass` is present
pub const UNKNOWN_DOCUMENT_CLASS: &str = "unknown";

/// Default bound on nested groups and environments
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 128;

/// Knobs for parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// How many groups and environments may be open at once
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// A non-fatal problem found while parsing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseDiagnostic {
    fn at(message: impl Into<String>, position: Position) -> Self {
        ParseDiagnostic {
            message: message.into(),
            line: position.line,
            column: position.column,
        }
    }
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.message, self.line, self.column)
    }
}

/// The parsed document and its diagnostics
#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub ast: Document,
    pub errors: Vec<ParseDiagnostic>,
}

/// Parse a token stream into a document
pub fn parse(tokens: &[Token]) -> ParseOutput {
    parse_with(tokens, ParseOptions::default())
}

/// Parse a token stream with explicit options
pub fn parse_with(tokens: &[Token], options: ParseOptions) -> ParseOutput {
    let mut parser = Parser::new(tokens, options.max_nesting_depth);
    let mut ast = Document {
        document_class: UNKNOWN_DOCUMENT_CLASS.to_string(),
        children: parser.parse_all(),
    };
    if let Some(class) = ast
        .find_command("documentclass")
        .and_then(|c| c.arg(0))
        .map(|g| g.raw_text().trim().to_string())
    {
        ast.document_class = class;
    }

    ParseOutput {
        ast,
        errors: parser.errors,
    }
}

struct Parser<'t> {
    tokens: Vec<&'t Token>,
    pos: usize,
    depth: usize,
    max_depth: usize,
    errors: Vec<ParseDiagnostic>,
}

impl<'t> Parser<'t> {
    fn new(tokens: &'t [Token], max_depth: usize) -> Self {
        Parser {
            tokens: tokens
                .iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .collect(),
            pos: 0,
            depth: 0,
            max_depth,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> Option<&'t Token> {
        self.tokens.get(self.pos).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.peek()?;
        self.pos += 1;
        Some(token)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn parse_all(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        while !self.at_end() {
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    /// Parse one node. Returns `None` when the consumed tokens produce nothing
    /// (a stray `}` or an orphan `\end`).
    fn parse_node(&mut self) -> Option<Node> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Command => self.parse_command(),
            TokenKind::OpenBrace => Some(Node::Group(self.parse_group())),
            TokenKind::CloseBrace => {
                self.advance();
                None
            }
            TokenKind::Whitespace | TokenKind::Newline => Some(self.parse_whitespace_run()),
            TokenKind::Text => {
                self.advance();
                Some(Node::Text(Text {
                    content: token.text.clone(),
                    position: token.position,
                }))
            }
            TokenKind::Comment => {
                // Filtered in `new`, kept for exhaustiveness
                self.advance();
                None
            }
        }
    }

    fn parse_command(&mut self) -> Option<Node> {
        let token = self.advance()?;
        match token.text.as_str() {
            "begin" if self.depth >= self.max_depth => {
                self.skip_nested(token.position);
                None
            }
            "begin" => Some(Node::Environment(self.parse_environment(token.position))),
            "end" => {
                // Environments consume their own `\end`; reaching one here means it is an orphan
                self.parse_name_group();
                None
            }
            name => {
                let args = if is_control_word(name) {
                    self.parse_arguments()
                } else {
                    Vec::new()
                };
                Some(Node::Command(Command {
                    name: name.to_string(),
                    args,
                    position: token.position,
                }))
            }
        }
    }

    fn parse_arguments(&mut self) -> Vec<Group> {
        let mut args = Vec::new();
        self.skip_spaces();

        while self.peek_kind() == Some(TokenKind::OpenBrace) {
            args.push(self.parse_group());

            let checkpoint = self.pos;
            self.skip_spaces();
            if self.peek_kind() != Some(TokenKind::OpenBrace) {
                self.pos = checkpoint;
                break;
            }
        }

        args
    }

    fn skip_spaces(&mut self) {
        while self.peek_kind() == Some(TokenKind::Whitespace) {
            self.pos += 1;
        }
    }

    fn parse_group(&mut self) -> Group {
        let open = match self.advance() {
            Some(token) => token,
            None => return Group::default(),
        };
        if self.depth >= self.max_depth {
            self.skip_nested(open.position);
            return Group::new(Vec::new(), open.position);
        }

        self.depth += 1;
        let mut children = Vec::new();

        loop {
            match self.peek_kind() {
                None => {
                    self.errors
                        .push(ParseDiagnostic::at("Unclosed brace group", open.position));
                    break;
                }
                Some(TokenKind::CloseBrace) => {
                    self.advance();
                    break;
                }
                Some(_) => {
                    if let Some(node) = self.parse_node() {
                        children.push(node);
                    }
                }
            }
        }

        self.depth -= 1;
        Group::new(children, open.position)
    }

    /// Consume the rest of a group or environment whose opening token was just
    /// read, without building nodes
    fn skip_nested(&mut self, position: Position) {
        self.errors
            .push(ParseDiagnostic::at("Nesting too deep", position));

        let mut open = 1usize;
        while open > 0 {
            let Some(token) = self.advance() else {
                break;
            };
            match token.kind {
                TokenKind::OpenBrace => open += 1,
                TokenKind::CloseBrace => open -= 1,
                TokenKind::Command if token.text == "begin" => open += 1,
                TokenKind::Command if token.text == "end" => {
                    open -= 1;
                    if open == 0 {
                        self.skip_name_group();
                    }
                }
                _ => {}
            }
        }
    }

    /// Consume a balanced `{...}` after `\end` without building nodes
    fn skip_name_group(&mut self) {
        self.skip_spaces();
        if self.peek_kind() != Some(TokenKind::OpenBrace) {
            return;
        }
        let mut open = 0usize;
        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::OpenBrace => open += 1,
                TokenKind::CloseBrace => open = open.saturating_sub(1),
                _ => {}
            }
            if open == 0 {
                break;
            }
        }
    }

    /// Parse the `{name}` group after `\begin` or `\end`, returning the flattened name
    fn parse_name_group(&mut self) -> String {
        self.skip_spaces();
        if self.peek_kind() == Some(TokenKind::OpenBrace) {
            self.parse_group().raw_text().trim().to_string()
        } else {
            String::new()
        }
    }

    fn parse_environment(&mut self, position: Position) -> Environment {
        let name = self.parse_name_group();
        self.depth += 1;
        let mut children = Vec::new();

        loop {
            let token = match self.peek() {
                Some(token) => token,
                None => {
                    self.errors.push(ParseDiagnostic::at(
                        format!("Unclosed environment: {name}"),
                        position,
                    ));
                    break;
                }
            };

            if token.is_command("end") {
                self.advance();
                let end_name = self.parse_name_group();
                if end_name == name {
                    break;
                }
                self.errors.push(ParseDiagnostic::at(
                    format!("Mismatched environment: expected \\end{{{name}}}, found \\end{{{end_name}}}"),
                    token.position,
                ));
                continue;
            }

            if let Some(node) = self.parse_node() {
                children.push(node);
            }
        }

        self.depth -= 1;
        Environment {
            name,
            children,
            position,
        }
    }

    fn parse_whitespace_run(&mut self) -> Node {
        let mut content = String::new();
        let mut position = None;

        while let Some(token) = self.peek() {
            if !token.kind.is_whitespace() {
                break;
            }
            position.get_or_insert(token.position);
            content.push_str(&token.text);
            self.pos += 1;
        }

        Node::Text(Text {
            content,
            position: position.unwrap_or_default(),
        })
    }
}

fn is_control_word(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic())
}
