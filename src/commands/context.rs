//! Mutable state threaded through a transformation
//!
//! One context is created per document and dropped when the transform returns.
//! The current section is an index into `document.sections` rather than a
//! reference, so handlers can freely push new sections while it is set.
//!
//! Macro expansion, both in the tree walk and inside handler arguments, goes
//! through [`TransformContext::begin_expansion`]. The context keeps the chain
//! of macros currently being expanded. When that chain would grow past
//! `max_macro_depth`, one error is recorded and every macro on the chain is
//! disabled for the rest of the document, so runaway definitions such as
//! `\newcommand{\x}{\x\x}` stop after a single descent.

use crate::ast::{Group, Node};
use crate::document::{ExperienceEntry, ParsedResumeDocument, ResumeItem, ResumeSection};
use crate::extraction::{extract_segments, render_plain, Segment};
use crate::parsing::UNKNOWN_DOCUMENT_CLASS;
use std::collections::{HashMap, HashSet};

/// Default bound on nested macro expansion
pub const DEFAULT_MAX_MACRO_DEPTH: usize = 32;

/// An experience entry that is still collecting fields
///
/// Entries span several commands (`\datedexperience`, then any number of
/// `\explanation`s), so they stay pending until the next entry, the next
/// section or the end of the document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperienceBuilder {
    pub company: Option<String>,
    pub date_range: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub bullets: Vec<String>,
    pub technologies: Option<Vec<String>>,
}

impl ExperienceBuilder {
    /// Build the final entry, defaulting missing strings to empty
    pub fn finish(self) -> ExperienceEntry {
        ExperienceEntry {
            company: self.company.unwrap_or_default(),
            date_range: self.date_range.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            subtitle: self.subtitle,
            bullets: self.bullets,
            technologies: self.technologies,
        }
    }
}

/// Outcome of looking up a command in the macro table
#[derive(Debug, Clone, PartialEq)]
pub enum Expansion {
    /// No macro with this name exists
    Undefined,
    /// The macro exists but may not be expanded (depth exceeded now or earlier)
    Blocked,
    /// The macro's nodes, to be processed before calling [`TransformContext::end_expansion`]
    Expand(Vec<Node>),
}

#[derive(Debug, Clone)]
pub struct TransformContext {
    pub document: ParsedResumeDocument,
    pub current_section: Option<usize>,
    pub pending_experience: Option<ExperienceBuilder>,
    pub macros: HashMap<String, Vec<Node>>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub max_macro_depth: usize,
    expansion_chain: Vec<String>,
    disabled_macros: HashSet<String>,
}

impl TransformContext {
    /// Create a context with an empty document shell
    pub fn new() -> Self {
        let mut document = ParsedResumeDocument::default();
        document.document_class = UNKNOWN_DOCUMENT_CLASS.to_string();

        TransformContext {
            document,
            current_section: None,
            pending_experience: None,
            macros: HashMap::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            max_macro_depth: DEFAULT_MAX_MACRO_DEPTH,
            expansion_chain: Vec::new(),
            disabled_macros: HashSet::new(),
        }
    }

    pub fn with_max_macro_depth(mut self, depth: usize) -> Self {
        self.max_macro_depth = depth;
        self
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "transform warning");
        self.warnings.push(message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "transform error");
        self.errors.push(message);
    }

    pub fn current_section_mut(&mut self) -> Option<&mut ResumeSection> {
        let index = self.current_section?;
        self.document.sections.get_mut(index)
    }

    /// Append a section and make it current
    pub fn push_section(&mut self, section: ResumeSection) {
        self.document.sections.push(section);
        self.current_section = Some(self.document.sections.len() - 1);
    }

    /// Push an item into the current section. Returns false (with a warning)
    /// when no section has been started yet.
    pub fn push_item(&mut self, item: ResumeItem) -> bool {
        match self.current_section_mut() {
            Some(section) => {
                section.items.push(item);
                true
            }
            None => {
                let kind = match item {
                    ResumeItem::SkillGroup(_) => "Skill group",
                    ResumeItem::Experience(_) => "Experience entry",
                };
                self.warn(format!("{kind} outside of a section"));
                false
            }
        }
    }

    /// Commit the pending experience entry, if any, into the current section
    pub fn finalize_pending(&mut self) {
        if let Some(builder) = self.pending_experience.take() {
            self.push_item(ResumeItem::Experience(builder.finish()));
        }
    }

    /// Start expanding the macro `name`
    ///
    /// On [`Expansion::Expand`] the name is pushed onto the expansion chain and
    /// the caller must pair it with [`end_expansion`](Self::end_expansion).
    pub fn begin_expansion(&mut self, name: &str) -> Expansion {
        if !self.macros.contains_key(name) {
            return Expansion::Undefined;
        }
        if self.disabled_macros.contains(name) {
            return Expansion::Blocked;
        }
        if self.expansion_chain.len() >= self.max_macro_depth {
            self.error(format!(
                "Macro expansion depth exceeded while expanding \\{name}"
            ));
            self.disabled_macros
                .extend(self.expansion_chain.iter().cloned());
            self.disabled_macros.insert(name.to_string());
            return Expansion::Blocked;
        }

        let nodes = self.macros.get(name).cloned().unwrap_or_default();
        tracing::trace!(%name, depth = self.expansion_chain.len(), "expanding macro");
        self.expansion_chain.push(name.to_string());
        Expansion::Expand(nodes)
    }

    pub fn end_expansion(&mut self) {
        self.expansion_chain.pop();
    }

    /// Replace macro references by the segments of their definitions
    ///
    /// Separators and bullets inside a definition survive, so callers that
    /// split on them treat inlined and literal delimiters alike. Undefined and
    /// blocked macros contribute nothing.
    pub fn resolve_segments(&mut self, segments: &[Segment]) -> Vec<Segment> {
        let mut out = Vec::new();
        self.resolve_into(segments, &mut out);
        out
    }

    /// Render segments as plain text with macro references resolved
    pub fn resolve_text(&mut self, segments: &[Segment]) -> String {
        render_plain(&self.resolve_segments(segments))
    }

    /// Flatten a group with macro references resolved
    pub fn resolve_group_text(&mut self, group: &Group) -> String {
        self.resolve_text(&extract_segments(group))
    }

    fn resolve_into(&mut self, segments: &[Segment], out: &mut Vec<Segment>) {
        for segment in segments {
            let Segment::MacroRef(name) = segment else {
                out.push(segment.clone());
                continue;
            };
            if let Expansion::Expand(nodes) = self.begin_expansion(name) {
                let inner = extract_segments(&Group::new(nodes, Default::default()));
                self.resolve_into(&inner, out);
                self.end_expansion();
            }
        }
    }
}

impl Default for TransformContext {
    fn default() -> Self {
        Self::new()
    }
}
