//! Base LaTeX commands: sections, macro definitions and structural no-ops

use super::context::TransformContext;
use super::registry::CommandHandler;
use crate::ast::Group;
use crate::document::{ResumeSection, SectionType};
use crate::extraction::{extract_text, normalize_whitespace, slugify};
use std::sync::Arc;

/// `\section{Title}`
pub struct SectionHandler;

impl CommandHandler for SectionHandler {
    fn name(&self) -> &str {
        "section"
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let title = args
            .first()
            .map(|g| normalize_whitespace(&extract_text(g)))
            .unwrap_or_default();

        // The pending entry belongs to the section being closed
        ctx.finalize_pending();

        let section = ResumeSection {
            id: slugify(&title),
            section_type: SectionType::classify(&title),
            title,
            items: Vec::new(),
        };
        tracing::debug!(id = %section.id, kind = %section.section_type, "section");
        ctx.push_section(section);
    }
}

/// `\newcommand{\name}{definition}`
///
/// Stores the definition's nodes, not its text, so expansion re-dispatches
/// them exactly as if they had been written inline.
pub struct NewCommandHandler;

impl CommandHandler for NewCommandHandler {
    fn name(&self) -> &str {
        "newcommand"
    }

    fn aliases(&self) -> &[&str] {
        &["renewcommand", "providecommand"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let (name_group, definition) = match args {
            [name_group, definition, ..] => (name_group, definition),
            _ => return,
        };
        let name = match name_group.first_command() {
            Some(cmd) => cmd.name.clone(),
            None => return,
        };

        tracing::debug!(%name, "macro defined");
        ctx.macros.insert(name, definition.children.clone());
    }
}

/// A command that is accepted but has no effect on the document
pub struct NoOpHandler {
    name: &'static str,
}

impl NoOpHandler {
    pub const fn new(name: &'static str) -> Self {
        NoOpHandler { name }
    }
}

impl CommandHandler for NoOpHandler {
    fn name(&self) -> &str {
        self.name
    }

    fn handle(&self, _args: &[Group], _ctx: &mut TransformContext) {}
}

/// Spacing, formatting and preamble commands. `\textbf` and friends only mean
/// something inside extracted arguments, so at tree level they do nothing.
pub const NO_OP_COMMANDS: &[&str] = &[
    "smallskip",
    "medskip",
    "bigskip",
    "vspace",
    "hspace",
    "textit",
    "textbf",
    "emph",
    "documentclass",
    "usepackage",
    "noindent",
    "hfill",
    "pagestyle",
    "cpshalf",
    "coloredbullet",
];

/// Escapes and control symbols appearing outside of any argument
pub const CONTROL_SYMBOLS: &[&str] = &["%", "#", "$", "&", "_", "{", "}", "~", "^", "\\", " ", ","];

pub fn handlers() -> Vec<Arc<dyn CommandHandler>> {
    let mut handlers: Vec<Arc<dyn CommandHandler>> =
        vec![Arc::new(SectionHandler), Arc::new(NewCommandHandler)];
    handlers.extend(
        NO_OP_COMMANDS
            .iter()
            .chain(CONTROL_SYMBOLS)
            .map(|name| Arc::new(NoOpHandler::new(*name)) as Arc<dyn CommandHandler>),
    );
    handlers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::document::{ExperienceEntry, ResumeItem};
    use crate::lexing::tokenize;
    use crate::parsing::parse;
    use crate::commands::context::ExperienceBuilder;

    /// Parse `\cmd{..}{..}` and return the argument groups
    fn args_of(source: &str) -> Vec<Group> {
        let output = parse(&tokenize(source).tokens);
        match output.ast.children.into_iter().next() {
            Some(Node::Command(cmd)) => cmd.args,
            other => panic!("expected command, got {other:?}"),
        }
    }

    #[test]
    fn test_section_creates_and_classifies() {
        let mut ctx = TransformContext::new();
        SectionHandler.handle(&args_of("\\section{Work Experience}"), &mut ctx);

        let section = &ctx.document.sections[0];
        assert_eq!(section.id, "work-experience");
        assert_eq!(section.title, "Work Experience");
        assert_eq!(section.section_type, SectionType::Experience);
        assert_eq!(ctx.current_section, Some(0));
    }

    #[test]
    fn test_section_without_argument_is_custom() {
        let mut ctx = TransformContext::new();
        SectionHandler.handle(&[], &mut ctx);
        assert_eq!(ctx.document.sections[0].section_type, SectionType::Custom);
        assert_eq!(ctx.document.sections[0].id, "");
    }

    #[test]
    fn test_section_finalizes_pending_into_previous_section() {
        let mut ctx = TransformContext::new();
        SectionHandler.handle(&args_of("\\section{Experience}"), &mut ctx);
        ctx.pending_experience = Some(ExperienceBuilder {
            company: Some("Acme".to_string()),
            ..Default::default()
        });
        SectionHandler.handle(&args_of("\\section{Education}"), &mut ctx);

        assert!(ctx.pending_experience.is_none());
        assert_eq!(
            ctx.document.sections[0].items,
            vec![ResumeItem::Experience(ExperienceEntry {
                company: "Acme".to_string(),
                ..Default::default()
            })]
        );
        assert!(ctx.document.sections[1].items.is_empty());
    }

    #[test]
    fn test_newcommand_stores_nodes() {
        let mut ctx = TransformContext::new();
        NewCommandHandler.handle(&args_of("\\newcommand{\\skillone}{\\textbf{Go}}"), &mut ctx);

        let nodes = ctx.macros.get("skillone").expect("macro stored");
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0], Node::Command(c) if c.name == "textbf"));
    }

    #[test]
    fn test_newcommand_needs_two_arguments() {
        let mut ctx = TransformContext::new();
        NewCommandHandler.handle(&args_of("\\newcommand{\\foo}"), &mut ctx);
        assert!(ctx.macros.is_empty());
        assert!(ctx.warnings.is_empty());
    }

    #[test]
    fn test_newcommand_without_command_name_is_ignored() {
        let mut ctx = TransformContext::new();
        NewCommandHandler.handle(&args_of("\\newcommand{foo}{bar}"), &mut ctx);
        assert!(ctx.macros.is_empty());
    }

    #[test]
    fn test_no_op_leaves_context_untouched() {
        let mut ctx = TransformContext::new();
        NoOpHandler::new("vspace").handle(&args_of("\\vspace{4pt}"), &mut ctx);
        assert!(ctx.document.sections.is_empty());
        assert!(ctx.warnings.is_empty());
    }
}
