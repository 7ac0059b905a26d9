//! Command-line interface for cvtex
//! This binary converts LaTeX resume sources into structured JSON.
//!
//! Usage:
//!   cvtex parse `<path>` [--slug `<slug>`] [--format `<format>`] [--overrides `<file>`]
//!   cvtex build `<input-dir>` `<output-dir>`
//!   cvtex commands
//!
//! Global options: --config `<file>` layers a TOML file over the defaults,
//! --verbose enables debug logging. Logs go to stderr, output to stdout.

use clap::{Arg, ArgAction, ArgMatches, Command};
use cvtex::commands::CommandRegistry;
use cvtex::config::{CvtexConfig, Loader};
use cvtex::processor::{
    apply_overrides, available_formats, build_directory, load_overrides, process_with, render,
    OutputFormat,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("cvtex")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert LaTeX resume sources into structured JSON")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .help("TOML configuration file layered over the defaults"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("parse")
                .about("Process a single source and print the result")
                .arg(
                    Arg::new("path")
                        .help("Path to the .tex file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("slug")
                        .long("slug")
                        .short('s')
                        .help("Document slug (defaults to the file stem)"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help(format!("Output format ({})", available_formats().join(", ")))
                        .default_value("json"),
                )
                .arg(
                    Arg::new("overrides")
                        .long("overrides")
                        .short('o')
                        .help("JSON or YAML file whose keys overwrite document metadata"),
                ),
        )
        .subcommand(
            Command::new("build")
                .about("Process every .tex file in a directory")
                .arg(
                    Arg::new("input")
                        .help("Directory containing .tex sources")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("output")
                        .help("Directory to write JSON documents and the index to")
                        .required(true)
                        .index(2),
                ),
        )
        .subcommand(Command::new("commands").about("List all recognized command names"))
        .get_matches();

    let config = load_config(matches.get_one::<String>("config")).unwrap_or_else(|e| {
        eprintln!("Error loading configuration: {}", e);
        std::process::exit(1);
    });
    init_logging(&config, matches.get_flag("verbose"));

    match matches.subcommand() {
        Some(("parse", parse_matches)) => handle_parse_command(parse_matches, &config),
        Some(("build", build_matches)) => handle_build_command(build_matches, &config),
        Some(("commands", _)) => handle_commands_command(),
        _ => unreachable!(),
    }
}

fn load_config(path: Option<&String>) -> Result<CvtexConfig, config::ConfigError> {
    let loader = match path {
        Some(path) => Loader::new().with_file(path),
        None => Loader::new(),
    };
    loader.build()
}

fn init_logging(config: &CvtexConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.level))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Handle the parse command
fn handle_parse_command(matches: &ArgMatches, config: &CvtexConfig) {
    // Required and defaulted arguments are guaranteed present by clap
    let path = PathBuf::from(matches.get_one::<String>("path").unwrap());
    let format_str = matches.get_one::<String>("format").unwrap();

    let format = OutputFormat::from_string(format_str).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("Available formats: {}", available_formats().join(", "));
        std::process::exit(1);
    });

    let source = std::fs::read_to_string(&path).unwrap_or_else(|e| {
        eprintln!("Error reading file: {}", e);
        std::process::exit(1);
    });

    let slug = matches
        .get_one::<String>("slug")
        .cloned()
        .unwrap_or_else(|| slug_from_path(&path));

    let mut output = process_with(&source, &slug, config.process_options());
    for message in output.diagnostics() {
        tracing::warn!(%slug, "{message}");
    }

    if let Some(overrides_path) = matches.get_one::<String>("overrides") {
        let overrides = load_overrides(Path::new(overrides_path));
        apply_overrides(&mut output.document, &overrides);
    }

    let rendered = render(&output, format, config.build.pretty).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    println!("{}", rendered.trim_end());
}

/// Handle the build command
fn handle_build_command(matches: &ArgMatches, config: &CvtexConfig) {
    let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let output = PathBuf::from(matches.get_one::<String>("output").unwrap());

    let report = build_directory(&input, &output, &config.build, config.process_options())
        .unwrap_or_else(|e| {
            eprintln!("Build failed: {}", e);
            std::process::exit(1);
        });

    for doc in &report.documents {
        println!(
            "{} -> {} ({} warnings, {} errors)",
            doc.slug,
            doc.output.display(),
            doc.warnings,
            doc.errors
        );
    }
    println!("index -> {}", report.index.display());
}

/// Handle the commands command
fn handle_commands_command() {
    for name in CommandRegistry::with_defaults().names() {
        if name.chars().all(|c| c.is_ascii_alphabetic()) {
            println!("\\{}", name);
        }
    }
}

fn slug_from_path(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}
