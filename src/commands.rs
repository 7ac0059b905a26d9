//! Command handling
//!
//! Commands are dispatched by name through a [`CommandRegistry`]. The handler
//! sets are split in two:
//!
//!     - [`base`]: generic LaTeX structure (`\section`, `\newcommand`, no-ops).
//!     - [`resume`]: the resume document class (metadata, skills, experience).
//!
//! All handlers share one [`TransformContext`] per document.

pub mod base;
pub mod context;
pub mod registry;
pub mod resume;

pub use context::{Expansion, ExperienceBuilder, TransformContext, DEFAULT_MAX_MACRO_DEPTH};
pub use registry::{CommandHandler, CommandRegistry};
