//! AST to resume document transformation
//!
//! The transformer walks the tree and hands every command to its registered
//! handler. Commands without a handler are looked up in the macro table and,
//! if found, their stored nodes are walked in place of the command. Anything
//! else produces an "Unknown command" warning and is skipped together with its
//! arguments.
//!
//! Expansion fails closed: once a chain of macros grows past
//! [`TransformOptions::max_macro_depth`], one error is recorded and the
//! macros on that chain are not expanded again in this document.
//!
//! Groups and environments are transparent: their children are walked with
//! the same context, so they scope neither macros nor sections. Bare text at
//! this level is ignored; text only enters the document through handlers.

use crate::ast::{Command, Document, Node};
use crate::commands::{CommandRegistry, Expansion, TransformContext, DEFAULT_MAX_MACRO_DEPTH};
use crate::document::ParsedResumeDocument;

/// Knobs for a transformation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// How deeply macros may expand into other macros before giving up
    pub max_macro_depth: usize,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
        }
    }
}

/// The transformed document with its diagnostics
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub document: ParsedResumeDocument,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

pub struct Transformer {
    registry: CommandRegistry,
    options: TransformOptions,
}

impl Transformer {
    pub fn new(registry: CommandRegistry, options: TransformOptions) -> Self {
        Transformer { registry, options }
    }

    pub fn with_options(options: TransformOptions) -> Self {
        Self::new(CommandRegistry::with_defaults(), options)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Transform a parsed document. `raw` is stored verbatim on the result.
    pub fn transform(&self, ast: &Document, raw: &str, slug: &str) -> TransformOutput {
        let mut ctx = TransformContext::new().with_max_macro_depth(self.options.max_macro_depth);
        ctx.document.document_class = ast.document_class.clone();
        ctx.document.raw = raw.to_string();
        ctx.document.metadata.slug = slug.to_string();

        self.walk(&ast.children, &mut ctx);

        // Nothing else closes the last section's final entry
        ctx.finalize_pending();

        tracing::debug!(
            slug,
            sections = ctx.document.sections.len(),
            warnings = ctx.warnings.len(),
            errors = ctx.errors.len(),
            "transform finished"
        );

        TransformOutput {
            document: ctx.document,
            warnings: ctx.warnings,
            errors: ctx.errors,
        }
    }

    fn walk(&self, nodes: &[Node], ctx: &mut TransformContext) {
        for node in nodes {
            match node {
                Node::Command(cmd) => self.dispatch(cmd, ctx),
                Node::Group(group) => self.walk(&group.children, ctx),
                Node::Environment(env) => self.walk(&env.children, ctx),
                Node::Text(_) => {}
            }
        }
    }

    fn dispatch(&self, cmd: &Command, ctx: &mut TransformContext) {
        if let Some(handler) = self.registry.get(&cmd.name) {
            handler.handle(&cmd.args, ctx);
            return;
        }

        match ctx.begin_expansion(&cmd.name) {
            Expansion::Expand(nodes) => {
                self.walk(&nodes, ctx);
                ctx.end_expansion();
            }
            Expansion::Blocked => {}
            Expansion::Undefined => ctx.warn(format!("Unknown command: \\{}", cmd.name)),
        }
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::with_options(TransformOptions::default())
    }
}

/// Transform a parsed document with the default command set
pub fn transform(ast: &Document, raw: &str, slug: &str) -> TransformOutput {
    Transformer::default().transform(ast, raw, slug)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ResumeItem, SectionType};
    use crate::lexing::tokenize;
    use crate::parsing::parse;

    fn run(source: &str) -> TransformOutput {
        let parsed = parse(&tokenize(source).tokens);
        transform(&parsed.ast, source, "test")
    }

    #[test]
    fn test_sets_class_raw_and_slug() {
        let source = "\\documentclass{resume}";
        let output = run(source);
        assert_eq!(output.document.document_class, "resume");
        assert_eq!(output.document.raw, source);
        assert_eq!(output.document.metadata.slug, "test");
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_unknown_command_warns_and_skips_arguments() {
        let output = run("\\section{Skills}\n\\frobnicate{\\section{Hidden}}\n\\createskill{A}{b}");
        assert_eq!(output.warnings, vec!["Unknown command: \\frobnicate"]);
        assert_eq!(output.document.sections.len(), 1);
        assert_eq!(output.document.sections[0].items.len(), 1);
    }

    #[test]
    fn test_groups_and_environments_are_transparent() {
        let output = run("\\begin{document}{\\section{Skills}}\\createskill{A}{b}\\end{document}");
        assert_eq!(output.document.sections.len(), 1);
        assert_eq!(output.document.sections[0].section_type, SectionType::Skills);
        // The section opened inside the group stays current outside it
        assert_eq!(output.document.sections[0].items.len(), 1);
    }

    #[test]
    fn test_macro_expansion_redispatches_nodes() {
        let output = run(
            "\\newcommand{\\work}{\\section{Work}}\n\\work\n\\datedexperience{Acme}{2020}",
        );
        assert!(output.warnings.is_empty());
        assert_eq!(output.document.sections.len(), 1);
        assert_eq!(output.document.sections[0].section_type, SectionType::Experience);
        assert_eq!(output.document.sections[0].items.len(), 1);
    }

    #[test]
    fn test_nested_macros_expand() {
        let output = run(
            "\\newcommand{\\inner}{\\section{Skills}}\\newcommand{\\outer}{\\inner}\\outer",
        );
        assert_eq!(output.document.sections.len(), 1);
        assert!(output.errors.is_empty());
    }

    #[test]
    fn test_recursive_macro_fails_closed() {
        let parsed = parse(&tokenize("\\newcommand{\\loop}{\\loop}\\loop").tokens);
        let transformer = Transformer::with_options(TransformOptions { max_macro_depth: 8 });
        let output = transformer.transform(&parsed.ast, "", "loop");
        assert_eq!(
            output.errors,
            vec!["Macro expansion depth exceeded while expanding \\loop"]
        );
    }

    #[test]
    fn test_branching_macro_expands_once_per_level() {
        let output = run("\\newcommand{\\x}{\\x\\x}\\x\\section{After}\\x");
        assert_eq!(
            output.errors,
            vec!["Macro expansion depth exceeded while expanding \\x"]
        );
        assert!(output.warnings.is_empty());
        assert_eq!(output.document.sections.len(), 1);
    }

    #[test]
    fn test_branching_macro_in_handler_arguments() {
        let output = run(
            "\\newcommand{\\x}{\\x\\x}\\section{Skills}\\createskill{A}{Go, \\x}",
        );
        assert_eq!(output.errors.len(), 1);
        let group = output.document.sections[0].skill_groups().next().unwrap();
        assert_eq!(group.skills, vec!["Go"]);
    }

    #[test]
    fn test_pending_entry_committed_at_end() {
        let output = run("\\section{Experience}\\datedexperience{Acme}{2020}{Engineer}");
        let items = &output.document.sections[0].items;
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], ResumeItem::Experience(e) if e.title == "Engineer"));
    }

    #[test]
    fn test_text_outside_commands_is_ignored() {
        let output = run("Just some prose.\n\\section{Misc}");
        assert_eq!(output.document.sections.len(), 1);
        assert!(output.warnings.is_empty());
    }
}
