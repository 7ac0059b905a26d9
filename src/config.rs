//! Configuration loading
//!
//! `defaults/cvtex.default.toml` is embedded into the binary so that docs and
//! runtime behavior stay in sync. User files are layered on top of those
//! defaults via [`Loader`] before deserializing into [`CvtexConfig`].

use crate::parsing::ParseOptions;
use crate::processor::ProcessOptions;
use crate::transform::TransformOptions;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/cvtex.default.toml");

/// Top-level configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CvtexConfig {
    pub parse: ParseConfig,
    pub transform: TransformConfig,
    pub build: BuildConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParseConfig {
    pub max_nesting_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformConfig {
    pub max_macro_depth: usize,
}

/// Output settings for directory builds
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildConfig {
    pub index_file: String,
    pub pretty: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    pub level: String,
}

impl CvtexConfig {
    /// Pipeline limits taken from the `parse` and `transform` tables
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            parse: ParseOptions {
                max_nesting_depth: self.parse.max_nesting_depth,
            },
            transform: TransformOptions {
                max_macro_depth: self.transform.max_macro_depth,
            },
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            index_file: "index.json".to_string(),
            pretty: true,
        }
    }
}

/// Builds a [`CvtexConfig`] from the embedded defaults plus user files
///
/// Later files win key by key; tables a file leaves out keep their defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    pub fn new() -> Self {
        Loader {
            builder: Config::builder()
                .add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
        }
    }

    /// Layer a TOML file, which must exist
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        let file = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        Loader {
            builder: self.builder.add_source(file),
        }
    }

    pub fn build(self) -> Result<CvtexConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone
pub fn load_defaults() -> Result<CvtexConfig, ConfigError> {
    Loader::new().build()
}
