//! Text extraction from argument groups
//!
//! Handlers never walk the AST themselves; they flatten their arguments
//! through this module. Flattening produces typed [`Segment`]s:
//!
//!     - Text: literal text, with escapes such as `\%` already resolved.
//!     - MacroRef: an embedded command with no inline meaning (`\skillone`),
//!       left for the caller to resolve against the macro table.
//!     - Bullet: a `\coloredbullet` marker.
//!     - Separator: a `\cpshalf` separator.
//!
//! `\textit`, `\textbf` and `\emph` are transparent: their first argument is
//! flattened in place. Nested groups are flattened recursively.
//!
//! Two string renderings exist for callers that need strings. The plain
//! rendering drops macro references and bullets and prints separators as
//! `" | "`. The marked rendering emits the `|||...|||` markers renderers
//! historically split on.

use crate::ast::{Group, Node};
use once_cell::sync::Lazy;
use regex::Regex;

pub const SEPARATOR_MARKER: &str = "|||CPSHALF|||";
pub const BULLET_MARKER: &str = "|||BULLET|||";
const MACRO_MARKER_PREFIX: &str = "|||MACRO:";
const MARKER_SUFFIX: &str = "|||";

/// Plain-text rendering of a separator
pub const PLAIN_SEPARATOR: &str = " | ";

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// One piece of flattened argument content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    MacroRef(String),
    Bullet,
    Separator,
}

/// Map a control symbol to the literal character it escapes
pub fn escaped_char(name: &str) -> Option<&'static str> {
    let literal = match name {
        "%" => "%",
        "#" => "#",
        "$" => "$",
        "&" => "&",
        "_" => "_",
        "{" => "{",
        "}" => "}",
        "~" => "~",
        "^" => "^",
        "\\" => "\\",
        " " => " ",
        _ => return None,
    };
    Some(literal)
}

/// Flatten a group into segments. Adjacent text is merged.
pub fn extract_segments(group: &Group) -> Vec<Segment> {
    let mut segments = Vec::new();
    collect_segments(&group.children, &mut segments);
    segments
}

fn push_text(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Text(text.to_string()));
    }
}

fn collect_segments(nodes: &[Node], segments: &mut Vec<Segment>) {
    for node in nodes {
        match node {
            Node::Text(text) => push_text(segments, &text.content),
            Node::Group(group) => collect_segments(&group.children, segments),
            Node::Environment(env) => collect_segments(&env.children, segments),
            Node::Command(cmd) => {
                if let Some(literal) = escaped_char(&cmd.name) {
                    push_text(segments, literal);
                    continue;
                }
                match cmd.name.as_str() {
                    "cpshalf" => segments.push(Segment::Separator),
                    "coloredbullet" => segments.push(Segment::Bullet),
                    "textit" | "textbf" | "emph" => {
                        if let Some(arg) = cmd.arg(0) {
                            collect_segments(&arg.children, segments);
                        }
                    }
                    name => segments.push(Segment::MacroRef(name.to_string())),
                }
            }
        }
    }
}

/// Render segments as plain text
pub fn render_plain(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Separator => out.push_str(PLAIN_SEPARATOR),
            Segment::MacroRef(_) | Segment::Bullet => {}
        }
    }
    out
}

/// Render segments with string markers for macro references, bullets and separators
pub fn render_marked(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Separator => out.push_str(SEPARATOR_MARKER),
            Segment::Bullet => out.push_str(BULLET_MARKER),
            Segment::MacroRef(name) => {
                out.push_str(MACRO_MARKER_PREFIX);
                out.push_str(name);
                out.push_str(MARKER_SUFFIX);
            }
        }
    }
    out
}

/// Flatten a group to plain text. Unknown embedded commands contribute nothing.
pub fn extract_text(group: &Group) -> String {
    render_plain(&extract_segments(group))
}

/// Flatten a group to text with `|||...|||` markers left in place
pub fn extract_text_with_commands(group: &Group) -> String {
    render_marked(&extract_segments(group))
}

/// Split segments at separators (and optionally bullets), dropping the delimiters
pub fn split_segments(segments: &[Segment], split_on_bullets: bool) -> Vec<Vec<Segment>> {
    let mut parts = vec![Vec::new()];
    for segment in segments {
        let is_delimiter = match segment {
            Segment::Separator => true,
            Segment::Bullet => split_on_bullets,
            _ => false,
        };
        if is_delimiter {
            parts.push(Vec::new());
        } else if let Some(current) = parts.last_mut() {
            current.push(segment.clone());
        }
    }
    parts
}

/// Collapse whitespace runs to single spaces and trim
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text.trim(), " ").into_owned()
}

/// Lower-case a title and join its words with hyphens
pub fn slugify(title: &str) -> String {
    WHITESPACE_RUN
        .replace_all(title.trim(), "-")
        .to_lowercase()
}

/// Split a comma separated list, trimming entries and dropping empty ones
pub fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(normalize_whitespace)
        .filter(|item| !item.is_empty())
        .collect()
}
