//! # cvtex
//!
//! A parser for LaTeX resume documents.
//!
//! Sources written in a small LaTeX dialect (one resume document class with
//! metadata commands, skill groups and dated experience entries) are turned
//! into a [`ParsedResumeDocument`] that renderers consume as JSON.
//!
//! The pipeline has four stages, each usable on its own:
//!
//!     1. [`lexing::tokenize`]: source text to a flat token stream.
//!     2. [`parsing::parse`]: tokens to an AST of commands, groups, environments and text.
//!     3. [`commands`]: the handler registry and the per-document transform context.
//!     4. [`transform::transform`]: AST to structured document.
//!
//! None of the stages fail on malformed content. Problems are reported as
//! diagnostics next to a best-effort result.
//!
//! ```rust,ignore
//! let output = cvtex::process(source, "my-resume");
//! let json = serde_json::to_string(&output.document)?;
//! ```

pub mod ast;
pub mod commands;
pub mod config;
pub mod document;
pub mod extraction;
pub mod lexing;
pub mod parsing;
pub mod processor;
pub mod transform;

pub use document::ParsedResumeDocument;
pub use processor::{process, ProcessOutput};
pub use transform::{transform, TransformOutput};
