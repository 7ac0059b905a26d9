//! Resume document class commands
//!
//! These handlers fill in metadata, skill groups and experience entries.
//! Argument text is always resolved through the context so that macros
//! defined with `\newcommand` (for example `\newcommand{\skillone}{Rust}`)
//! can be used inside skill lists, contact lines and bullets.

use super::context::{ExperienceBuilder, TransformContext};
use super::registry::CommandHandler;
use crate::ast::Group;
use crate::document::{ResumeItem, SkillGroup};
use crate::extraction::{
    extract_segments, normalize_whitespace, render_plain, split_list, split_segments, Segment,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static PHONE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9][0-9 ().\-]{5,}[0-9]$").expect("valid regex"));
static WEB_ADDRESS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(https?://)?[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)+(/\S*)?$").expect("valid regex")
});

/// Resolve an argument to normalized plain text
fn arg_text(ctx: &mut TransformContext, group: &Group) -> String {
    normalize_whitespace(&ctx.resolve_group_text(group))
}

/// Flatten an argument with macro references spliced in place
fn arg_segments(ctx: &mut TransformContext, group: &Group) -> Vec<Segment> {
    ctx.resolve_segments(&extract_segments(group))
}

/// Resolve a list argument: separators and commas both delimit entries
fn arg_list(ctx: &mut TransformContext, group: &Group) -> Vec<String> {
    split_segments(&arg_segments(ctx, group), false)
        .iter()
        .flat_map(|part| split_list(&render_plain(part)))
        .collect()
}

/// Sets one metadata field, e.g. `\email{ada@example.com}`
pub struct MetadataHandler {
    field: &'static str,
}

impl MetadataHandler {
    pub const fn new(field: &'static str) -> Self {
        MetadataHandler { field }
    }
}

/// Metadata commands, each named after the field it sets
pub const METADATA_FIELDS: &[&str] = &[
    "name", "email", "phone", "linkedin", "github", "website", "location",
];

impl CommandHandler for MetadataHandler {
    fn name(&self) -> &str {
        self.field
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let Some(group) = args.first() else {
            ctx.warn(format!("\\{} expects an argument", self.field));
            return;
        };
        let value = arg_text(ctx, group);
        if let Some(slot) = ctx.document.metadata.field_mut(self.field) {
            *slot = Some(value);
        }
    }
}

/// Which metadata field a piece of a contact line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Email,
    Phone,
    Linkedin,
    Github,
    Website,
    Location,
}

impl ContactKind {
    pub fn classify(piece: &str) -> Self {
        let lower = piece.to_lowercase();
        if lower.contains("linkedin") {
            ContactKind::Linkedin
        } else if lower.contains("github") {
            ContactKind::Github
        } else if piece.contains('@') {
            ContactKind::Email
        } else if PHONE.is_match(piece) {
            ContactKind::Phone
        } else if WEB_ADDRESS.is_match(piece) {
            ContactKind::Website
        } else {
            ContactKind::Location
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            ContactKind::Email => "email",
            ContactKind::Phone => "phone",
            ContactKind::Linkedin => "linkedin",
            ContactKind::Github => "github",
            ContactKind::Website => "website",
            ContactKind::Location => "location",
        }
    }
}

/// `\header{Name}{contact \cpshalf contact ...}`
///
/// The contact line is split on `\cpshalf` and each piece is routed to a
/// metadata field by its shape.
pub struct HeaderHandler;

impl CommandHandler for HeaderHandler {
    fn name(&self) -> &str {
        "header"
    }

    fn aliases(&self) -> &[&str] {
        &["makeheader"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let Some(name_group) = args.first() else {
            ctx.warn("\\header expects at least one argument");
            return;
        };
        let name = arg_text(ctx, name_group);
        if !name.is_empty() {
            ctx.document.metadata.name = Some(name);
        }

        let Some(contact_group) = args.get(1) else {
            return;
        };
        let segments = arg_segments(ctx, contact_group);
        for part in split_segments(&segments, true) {
            let piece = normalize_whitespace(&render_plain(&part));
            if piece.is_empty() {
                continue;
            }
            let kind = ContactKind::classify(&piece);
            if let Some(slot) = ctx.document.metadata.field_mut(kind.field()) {
                *slot = Some(piece);
            }
        }
    }
}

/// `\createskill{Category}{A, B, C}`
pub struct SkillGroupHandler;

impl CommandHandler for SkillGroupHandler {
    fn name(&self) -> &str {
        "createskill"
    }

    fn aliases(&self) -> &[&str] {
        &["skillgroup"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let [category, list, ..] = args else {
            ctx.warn("\\createskill expects 2 arguments");
            return;
        };
        let category = arg_text(ctx, category);
        let skills = arg_list(ctx, list);
        ctx.push_item(ResumeItem::SkillGroup(SkillGroup { category, skills }));
    }
}

/// `\datedexperience{Company}{Dates}{Title}{Subtitle}`
///
/// Title and subtitle are optional. The entry stays pending so that following
/// `\explanation` and `\technologies` commands can add to it. Starting a new
/// entry commits the previous one.
pub struct DatedExperienceHandler;

impl CommandHandler for DatedExperienceHandler {
    fn name(&self) -> &str {
        "datedexperience"
    }

    fn aliases(&self) -> &[&str] {
        &["datedproject", "dateditem"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        if args.len() < 2 {
            ctx.warn("\\datedexperience expects at least 2 arguments");
            return;
        }
        ctx.finalize_pending();

        let company = arg_text(ctx, &args[0]);
        let date_range = arg_text(ctx, &args[1]);
        let title = args.get(2).map(|g| arg_text(ctx, g));
        let subtitle = args
            .get(3)
            .map(|g| arg_text(ctx, g))
            .filter(|s| !s.is_empty());

        ctx.pending_experience = Some(ExperienceBuilder {
            company: Some(company),
            date_range: Some(date_range),
            title,
            subtitle,
            ..Default::default()
        });
    }
}

/// `\explanation{Text}` adds bullets to the pending entry
///
/// `\coloredbullet` inside the argument starts a new bullet.
pub struct ExplanationHandler;

impl CommandHandler for ExplanationHandler {
    fn name(&self) -> &str {
        "explanation"
    }

    fn aliases(&self) -> &[&str] {
        &["bullet"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let Some(group) = args.first() else {
            return;
        };
        if ctx.pending_experience.is_none() {
            ctx.warn("\\explanation outside of an experience entry");
            return;
        }

        let segments = arg_segments(ctx, group);
        let mut bullets = Vec::new();
        for part in split_segments(&segments, true) {
            let bullet = normalize_whitespace(&render_plain(&part));
            if !bullet.is_empty() {
                bullets.push(bullet);
            }
        }

        if let Some(pending) = ctx.pending_experience.as_mut() {
            pending.bullets.extend(bullets);
        }
    }
}

/// `\technologies{Rust, Postgres}` sets the pending entry's technology list
pub struct TechnologiesHandler;

impl CommandHandler for TechnologiesHandler {
    fn name(&self) -> &str {
        "technologies"
    }

    fn aliases(&self) -> &[&str] {
        &["techstack"]
    }

    fn handle(&self, args: &[Group], ctx: &mut TransformContext) {
        let Some(group) = args.first() else {
            return;
        };
        if ctx.pending_experience.is_none() {
            ctx.warn("\\technologies outside of an experience entry");
            return;
        }

        let technologies = arg_list(ctx, group);
        if let Some(pending) = ctx.pending_experience.as_mut() {
            pending.technologies = Some(technologies);
        }
    }
}

pub fn handlers() -> Vec<Arc<dyn CommandHandler>> {
    let mut handlers: Vec<Arc<dyn CommandHandler>> = METADATA_FIELDS
        .iter()
        .map(|field| Arc::new(MetadataHandler::new(*field)) as Arc<dyn CommandHandler>)
        .collect();
    handlers.push(Arc::new(HeaderHandler));
    handlers.push(Arc::new(SkillGroupHandler));
    handlers.push(Arc::new(DatedExperienceHandler));
    handlers.push(Arc::new(ExplanationHandler));
    handlers.push(Arc::new(TechnologiesHandler));
    handlers
}
