//! Processing API: pipeline façade, output formats, metadata overrides and builds
//!
//! The core pipeline (tokenize, parse, transform) never touches the file
//! system. This module is the boundary that does: it reads sources and
//! override files, writes JSON outputs and the listing index, and turns I/O
//! problems into [`ProcessingError`]s.
//!
//! Override files sit next to their source as `<stem>.meta.json`,
//! `<stem>.meta.yaml` or `<stem>.meta.yml`. A broken override file is logged
//! and ignored; it never prevents a document from being written.

use crate::ast::Document;
use crate::config::BuildConfig;
use crate::document::ParsedResumeDocument;
use crate::lexing::{tokenize, Token, TokenizeError};
use crate::parsing::{parse_with, ParseDiagnostic, ParseOptions};
use crate::transform::{TransformOptions, Transformer};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur during processing
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingError {
    IoError(String),
    InvalidFormat(String),
    SerializationError(String),
}

impl std::error::Error for ProcessingError {}

impl fmt::Display for ProcessingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingError::IoError(msg) => write!(f, "IO error: {msg}"),
            ProcessingError::InvalidFormat(format) => write!(f, "Invalid format: {format}"),
            ProcessingError::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
        }
    }
}

/// Everything the pipeline produced for one source
#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub tokens: Vec<Token>,
    pub ast: Document,
    pub document: ParsedResumeDocument,
    pub token_errors: Vec<TokenizeError>,
    pub parse_errors: Vec<ParseDiagnostic>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl ProcessOutput {
    /// All diagnostics rendered as messages, in pipeline order
    pub fn diagnostics(&self) -> Vec<String> {
        self.token_errors
            .iter()
            .map(ToString::to_string)
            .chain(self.parse_errors.iter().map(ToString::to_string))
            .chain(self.errors.iter().cloned())
            .chain(self.warnings.iter().cloned())
            .collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.token_errors.is_empty() || !self.parse_errors.is_empty() || !self.errors.is_empty()
    }
}

/// Limits applied by the parse and transform stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessOptions {
    pub parse: ParseOptions,
    pub transform: TransformOptions,
}

/// Run the full pipeline with default options
pub fn process(source: &str, slug: &str) -> ProcessOutput {
    process_with(source, slug, ProcessOptions::default())
}

/// Run the full pipeline with explicit options
pub fn process_with(source: &str, slug: &str, options: ProcessOptions) -> ProcessOutput {
    let tokenized = tokenize(source);
    let parsed = parse_with(&tokenized.tokens, options.parse);
    let transformed =
        Transformer::with_options(options.transform).transform(&parsed.ast, source, slug);

    ProcessOutput {
        tokens: tokenized.tokens,
        ast: parsed.ast,
        document: transformed.document,
        token_errors: tokenized.errors,
        parse_errors: parsed.errors,
        warnings: transformed.warnings,
        errors: transformed.errors,
    }
}

/// Output format selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// The structured document as JSON
    Json,
    /// The parsed AST as JSON
    AstJson,
    /// One token per line
    Tokens,
    /// The listing index record as JSON
    Index,
}

impl OutputFormat {
    pub fn from_string(format_str: &str) -> Result<Self, ProcessingError> {
        match format_str {
            "json" => Ok(OutputFormat::Json),
            "ast-json" => Ok(OutputFormat::AstJson),
            "tokens" => Ok(OutputFormat::Tokens),
            "index" => Ok(OutputFormat::Index),
            other => Err(ProcessingError::InvalidFormat(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::AstJson => "ast-json",
            OutputFormat::Tokens => "tokens",
            OutputFormat::Index => "index",
        }
    }
}

/// Get all available format strings
pub fn available_formats() -> Vec<&'static str> {
    [
        OutputFormat::Json,
        OutputFormat::AstJson,
        OutputFormat::Tokens,
        OutputFormat::Index,
    ]
    .iter()
    .map(OutputFormat::name)
    .collect()
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, ProcessingError> {
    let result = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    result.map_err(|e| ProcessingError::SerializationError(e.to_string()))
}

/// Render a processed source in the requested format
pub fn render(
    output: &ProcessOutput,
    format: OutputFormat,
    pretty: bool,
) -> Result<String, ProcessingError> {
    match format {
        OutputFormat::Json => to_json(&output.document, pretty),
        OutputFormat::AstJson => to_json(&output.ast, pretty),
        OutputFormat::Tokens => Ok(format_tokens(&output.tokens)),
        OutputFormat::Index => to_json(&IndexRecord::from_document(&output.document), pretty),
    }
}

/// Format tokens one per line as `kind:"text"@line:column`
pub fn format_tokens(tokens: &[Token]) -> String {
    let mut result = String::new();
    for token in tokens {
        result.push_str(&token.to_string());
        result.push('\n');
    }
    result
}

/// Merge override values into a document's metadata
///
/// Known string fields (and `slug`) replace the typed values; every other key
/// is stored as an extra metadata entry. A non-string value for a typed field
/// is ignored with a warning.
pub fn apply_overrides(document: &mut ParsedResumeDocument, overrides: &Map<String, Value>) {
    let metadata = &mut document.metadata;
    for (key, value) in overrides {
        if key == "slug" {
            match value.as_str() {
                Some(slug) => metadata.slug = slug.to_string(),
                None => tracing::warn!(%key, "ignoring non-string override"),
            }
            continue;
        }
        match metadata.field_mut(key) {
            Some(slot) => match value.as_str() {
                Some(text) => *slot = Some(text.to_string()),
                None => tracing::warn!(%key, "ignoring non-string override"),
            },
            None => {
                metadata.extra.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Read an override file (JSON, or YAML for `.yaml`/`.yml`)
///
/// Missing files, unreadable files and malformed content all yield an empty
/// map; only the latter two are logged as warnings.
pub fn load_overrides(path: &Path) -> Map<String, Value> {
    if !path.exists() {
        return Map::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not read metadata overrides");
            return Map::new();
        }
    };

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed: Result<Value, String> = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };

    match parsed {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "metadata overrides must be a mapping");
            Map::new()
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "invalid metadata overrides");
            Map::new()
        }
    }
}

/// Locate the override file for a source file, if one exists
pub fn find_overrides(source_path: &Path) -> Option<PathBuf> {
    let stem = source_path.file_stem()?.to_str()?;
    let dir = source_path.parent().unwrap_or_else(|| Path::new(""));
    ["json", "yaml", "yml"]
        .iter()
        .map(|ext| dir.join(format!("{stem}.meta.{ext}")))
        .find(|candidate| candidate.exists())
}

/// Lightweight listing record derived from a document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRecord {
    pub slug: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

impl IndexRecord {
    /// Project a document onto its index record
    ///
    /// The title comes from the `title` override, then the resume name, then the slug.
    pub fn from_document(document: &ParsedResumeDocument) -> Self {
        let metadata = &document.metadata;
        let extra_string = |key: &str| metadata.extra_str(key).map(str::to_string);

        let title = extra_string("title")
            .or_else(|| metadata.name.clone())
            .unwrap_or_else(|| metadata.slug.clone());
        let tags = metadata
            .extra
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        IndexRecord {
            slug: metadata.slug.clone(),
            title,
            description: extra_string("description"),
            tags,
            category: extra_string("category"),
            date: extra_string("date"),
            email: metadata.email.clone(),
            linkedin: metadata.linkedin.clone(),
            github: metadata.github.clone(),
        }
    }
}

/// One document written by a build
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltDocument {
    pub slug: String,
    pub output: PathBuf,
    pub warnings: usize,
    pub errors: usize,
}

/// Summary of a directory build
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildReport {
    pub documents: Vec<BuiltDocument>,
    pub index: PathBuf,
}

fn io_error(context: &str, path: &Path, e: std::io::Error) -> ProcessingError {
    ProcessingError::IoError(format!("{context} {}: {e}", path.display()))
}

/// Process every `.tex` file in `input` into `output`
///
/// Each source becomes `<stem>.json`, with the file stem as its slug and any
/// sibling override file merged in. The index of all documents is written to
/// `build.index_file` inside `output`.
pub fn build_directory(
    input: &Path,
    output: &Path,
    build: &BuildConfig,
    options: ProcessOptions,
) -> Result<BuildReport, ProcessingError> {
    let entries = fs::read_dir(input).map_err(|e| io_error("Failed to read", input, e))?;
    let mut sources: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("tex"))
        .collect();
    sources.sort();

    fs::create_dir_all(output).map_err(|e| io_error("Failed to create", output, e))?;

    let mut report = BuildReport::default();
    let mut index = Vec::new();

    for source_path in &sources {
        let slug = match source_path.file_stem().and_then(|s| s.to_str()) {
            Some(stem) => stem.to_string(),
            None => continue,
        };
        let source = fs::read_to_string(source_path)
            .map_err(|e| io_error("Failed to read", source_path, e))?;

        let mut processed = process_with(&source, &slug, options);
        for message in processed.diagnostics() {
            tracing::warn!(%slug, "{message}");
        }

        if let Some(overrides_path) = find_overrides(source_path) {
            let overrides = load_overrides(&overrides_path);
            apply_overrides(&mut processed.document, &overrides);
        }

        let target = output.join(format!("{slug}.json"));
        let json = to_json(&processed.document, build.pretty)?;
        fs::write(&target, json).map_err(|e| io_error("Failed to write", &target, e))?;
        tracing::info!(%slug, path = %target.display(), "document written");

        index.push(IndexRecord::from_document(&processed.document));
        report.documents.push(BuiltDocument {
            slug,
            output: target,
            warnings: processed.warnings.len(),
            errors: processed.errors.len()
                + processed.parse_errors.len()
                + processed.token_errors.len(),
        });
    }

    let index_path = output.join(&build.index_file);
    let json = to_json(&index, build.pretty)?;
    fs::write(&index_path, json).map_err(|e| io_error("Failed to write", &index_path, e))?;
    report.index = index_path;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_string("json").unwrap(), OutputFormat::Json);
        assert_eq!(
            OutputFormat::from_string("ast-json").unwrap(),
            OutputFormat::AstJson
        );
        assert_eq!(
            OutputFormat::from_string("xml"),
            Err(ProcessingError::InvalidFormat("xml".to_string()))
        );
    }

    #[test]
    fn test_available_formats() {
        assert_eq!(available_formats(), vec!["json", "ast-json", "tokens", "index"]);
    }

    #[test]
    fn test_process_collects_all_diagnostics() {
        let output = process("\\frob\n\\section{A\n\\", "x");
        assert_eq!(output.token_errors.len(), 1);
        assert_eq!(output.parse_errors.len(), 1);
        assert_eq!(output.warnings, vec!["Unknown command: \\frob"]);
        assert!(output.has_errors());
        assert_eq!(output.diagnostics().len(), 3);
    }

    #[test]
    fn test_deep_nesting_is_a_diagnostic() {
        let depth = 3000;
        let source = format!("{}{}", "{".repeat(depth), "}".repeat(depth));
        let output = process(&source, "deep");
        assert_eq!(output.parse_errors.len(), 1);
        assert_eq!(output.parse_errors[0].message, "Nesting too deep");
        assert!(output.document.sections.is_empty());
    }

    #[test]
    fn test_process_with_custom_limits() {
        let options = ProcessOptions {
            parse: ParseOptions {
                max_nesting_depth: 1,
            },
            transform: TransformOptions { max_macro_depth: 2 },
        };
        let output = process_with(
            "{{x}}\\newcommand{\\a}{\\b}\\newcommand{\\b}{\\c}\\newcommand{\\c}{x}\\a",
            "limits",
            options,
        );
        assert_eq!(output.parse_errors.len(), 1);
        assert_eq!(
            output.errors,
            vec!["Macro expansion depth exceeded while expanding \\c"]
        );
    }

    #[test]
    fn test_render_tokens() {
        let output = process("\\name{Ada}", "x");
        let listing = render(&output, OutputFormat::Tokens, false).unwrap();
        assert_eq!(
            listing,
            "command:\"name\"@1:1\nopen-brace:\"{\"@1:6\ntext:\"Ada\"@1:7\nclose-brace:\"}\"@1:10\n"
        );
    }

    #[test]
    fn test_apply_overrides() {
        let mut doc = process("\\name{Ada}", "ada").document;
        let overrides = json!({
            "name": "Ada Lovelace",
            "slug": "ada-cv",
            "title": "Resume",
            "tags": ["math", "engines"],
            "email": 42
        });
        apply_overrides(&mut doc, overrides.as_object().unwrap());

        assert_eq!(doc.metadata.name.as_deref(), Some("Ada Lovelace"));
        assert_eq!(doc.metadata.slug, "ada-cv");
        assert_eq!(doc.metadata.extra_str("title"), Some("Resume"));
        assert!(doc.metadata.email.is_none());
    }

    #[test]
    fn test_index_record_projection() {
        let mut doc = process("\\name{Ada}\\github{github.com/ada}", "ada").document;
        let record = IndexRecord::from_document(&doc);
        assert_eq!(record.title, "Ada");
        assert!(record.tags.is_empty());
        assert_eq!(record.github.as_deref(), Some("github.com/ada"));

        let overrides = json!({"title": "CV", "tags": ["a", 1, "b"], "date": "2024-01-01"});
        apply_overrides(&mut doc, overrides.as_object().unwrap());
        let record = IndexRecord::from_document(&doc);
        assert_eq!(record.title, "CV");
        assert_eq!(record.tags, vec!["a", "b"]);
        assert_eq!(record.date.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn test_load_overrides_json_and_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("cv.meta.json");
        fs::write(&json_path, r#"{"title": "From JSON"}"#).unwrap();
        assert_eq!(load_overrides(&json_path)["title"], "From JSON");

        let yaml_path = dir.path().join("cv.meta.yaml");
        fs::write(&yaml_path, "title: From YAML\ntags: [a, b]\n").unwrap();
        let overrides = load_overrides(&yaml_path);
        assert_eq!(overrides["title"], "From YAML");
        assert_eq!(overrides["tags"], json!(["a", "b"]));
    }

    #[test]
    fn test_load_overrides_tolerates_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_overrides(&dir.path().join("missing.json")).is_empty());

        let broken = dir.path().join("broken.meta.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(load_overrides(&broken).is_empty());

        let list = dir.path().join("list.meta.json");
        fs::write(&list, "[1, 2]").unwrap();
        assert!(load_overrides(&list).is_empty());
    }

    #[test]
    fn test_find_overrides_prefers_json() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cv.tex");
        assert!(find_overrides(&source).is_none());

        fs::write(dir.path().join("cv.meta.yml"), "title: x").unwrap();
        assert_eq!(
            find_overrides(&source),
            Some(dir.path().join("cv.meta.yml"))
        );

        fs::write(dir.path().join("cv.meta.json"), "{}").unwrap();
        assert_eq!(
            find_overrides(&source),
            Some(dir.path().join("cv.meta.json"))
        );
    }
}
