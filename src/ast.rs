//! AST definitions for parsed resume sources
//!
//! The tree is deliberately generic: it knows about commands, brace groups,
//! environments and text, but nothing about what any particular command means.
//! Meaning is assigned later by the command handlers during transformation.
//!
//! Ownership is strictly hierarchical. The [`Document`] owns its top-level nodes,
//! commands own their argument groups and groups own their children.

use crate::lexing::Position;
use serde::Serialize;

/// Root of a parsed source
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub document_class: String,
    pub children: Vec<Node>,
}

/// Any node in the tree
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Command(Command),
    Group(Group),
    Environment(Environment),
    Text(Text),
}

/// A command such as `\section{Skills}` with its brace-group arguments
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub name: String,
    pub args: Vec<Group>,
    pub position: Position,
}

/// A `{ ... }` group
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Group {
    pub children: Vec<Node>,
    pub position: Position,
}

/// A `\begin{name} ... \end{name}` block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Environment {
    pub name: String,
    pub children: Vec<Node>,
    pub position: Position,
}

/// Literal text, including coalesced whitespace runs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Text {
    pub content: String,
    pub position: Position,
}

impl Node {
    pub fn as_command(&self) -> Option<&Command> {
        match self {
            Node::Command(c) => Some(c),
            _ => None,
        }
    }
}

impl Command {
    /// Get an argument group by index
    pub fn arg(&self, index: usize) -> Option<&Group> {
        self.args.get(index)
    }
}

impl Group {
    pub fn new(children: Vec<Node>, position: Position) -> Self {
        Group { children, position }
    }

    /// Concatenate the text content of this group, recursing into nested
    /// groups and command arguments but ignoring command names.
    ///
    /// This is the structural flattening the parser needs for environment and
    /// class names. Escape-aware extraction lives in [`crate::extraction`].
    pub fn raw_text(&self) -> String {
        let mut out = String::new();
        collect_raw_text(&self.children, &mut out);
        out
    }

    /// Find the first command node inside this group, searching depth first
    pub fn first_command(&self) -> Option<&Command> {
        find_first_command(&self.children)
    }
}

impl Document {
    /// Find the first top-level command with the given name
    pub fn find_command(&self, name: &str) -> Option<&Command> {
        self.children
            .iter()
            .filter_map(Node::as_command)
            .find(|c| c.name == name)
    }
}

fn collect_raw_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(&t.content),
            Node::Group(g) => collect_raw_text(&g.children, out),
            Node::Environment(e) => collect_raw_text(&e.children, out),
            Node::Command(c) => {
                for arg in &c.args {
                    collect_raw_text(&arg.children, out);
                }
            }
        }
    }
}

fn find_first_command(nodes: &[Node]) -> Option<&Command> {
    for node in nodes {
        match node {
            Node::Command(c) => return Some(c),
            Node::Group(g) => {
                if let Some(found) = find_first_command(&g.children) {
                    return Some(found);
                }
            }
            Node::Environment(e) => {
                if let Some(found) = find_first_command(&e.children) {
                    return Some(found);
                }
            }
            Node::Text(_) => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Node {
        Node::Text(Text {
            content: content.to_string(),
            position: Position::default(),
        })
    }

    fn command(name: &str, args: Vec<Group>) -> Node {
        Node::Command(Command {
            name: name.to_string(),
            args,
            position: Position::default(),
        })
    }

    #[test]
    fn test_raw_text_recurses_into_groups_and_args() {
        let inner = Group::new(vec![text("bold")], Position::default());
        let group = Group::new(
            vec![
                text("a "),
                command("textbf", vec![inner]),
                Node::Group(Group::new(vec![text(" c")], Position::default())),
            ],
            Position::default(),
        );
        assert_eq!(group.raw_text(), "a bold c");
    }

    #[test]
    fn test_first_command_searches_nested_groups() {
        let nested = Group::new(vec![command("skillone", vec![])], Position::default());
        let group = Group::new(
            vec![text(" "), Node::Group(nested)],
            Position::default(),
        );
        assert_eq!(group.first_command().map(|c| c.name.as_str()), Some("skillone"));
    }

    #[test]
    fn test_find_command_on_document() {
        let doc = Document {
            document_class: "unknown".to_string(),
            children: vec![text("x"), command("documentclass", vec![])],
        };
        assert!(doc.find_command("documentclass").is_some());
        assert!(doc.find_command("section").is_none());
    }

    #[test]
    fn test_node_serializes_with_type_tag() {
        let json = serde_json::to_value(text("hi")).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hi");
    }
}
