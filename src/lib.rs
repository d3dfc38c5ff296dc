//! # atemplateb
//!
//! Renders text configuration files (Nginx configs and the like) from a
//! template and a JSON or YAML values document.
//!
//! The crate is integration glue around [`minijinja`]: values are loaded into
//! a generic mapping, exposed to the template as `Values`, and the template is
//! executed with a helper library that includes file-inclusion helpers whose
//! failures are collected instead of aborting the render.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use atemplateb::{ErrorCollector, HelperSet, RenderOptions, TemplateContext, TemplateSet};
//!
//! let values = atemplateb::values::load_values(Some("values.yaml".as_ref()))?;
//! let collector = Arc::new(ErrorCollector::new());
//! let helpers = HelperSet::new(Arc::clone(&collector));
//! let templates = TemplateSet::load("templates/nginx.conf.tmpl".as_ref(), &helpers, RenderOptions::default())?;
//! templates.render_to_file(&TemplateContext::new(&values), "nginx.conf".as_ref())?;
//! assert!(!collector.has_errors());
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]
// multiple_crate_versions is inherently crate-level (detects duplicate transitive dependencies).
#![allow(clippy::multiple_crate_versions)]

use std::path::PathBuf;

use thiserror::Error as ThisError;

// Module declarations
pub mod cli;
pub mod collector;
pub mod helpers;
pub mod observability;
pub mod rendering;
pub mod values;

// Re-exports for convenience
pub use collector::ErrorCollector;
pub use cli::{RenderCommand, RenderOutcome};
pub use helpers::HelperSet;
pub use rendering::{RenderOptions, TemplateContext, TemplateSet};
pub use values::{ValuesDocument, ValuesFormat};

/// Error type for fatal atemplateb failures.
///
/// Helper failures during template execution are not represented here; they
/// are recorded in an [`ErrorCollector`] and never abort a render.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Usage` | A required flag is missing |
/// | `ReadFile` | A template, template directory or values file cannot be read |
/// | `ParseValues` | The values document is malformed or its root is not a mapping |
/// | `TemplateParse` | Any template in the set fails to parse |
/// | `CreateOutput` | The destination file cannot be created |
/// | `WriteOutput` | Flushing rendered output fails |
/// | `TemplateExecution` | The engine raises an error outside the helper error path |
/// | `OperationFailed` | Logging initialization fails |
#[derive(Debug, ThisError)]
pub enum Error {
    /// The command line is missing a required flag.
    #[error("{0}")]
    Usage(String),

    /// A file could not be read.
    #[error("failed to read {kind} '{}': {source}", .path.display())]
    ReadFile {
        /// What was being read ("template", "values file", ...).
        kind: &'static str,
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The values document could not be parsed with the detected format.
    #[error("failed to parse values file '{}' as {format}: {cause}", .path.display())]
    ParseValues {
        /// The values file.
        path: PathBuf,
        /// The format selected by sniffing.
        format: ValuesFormat,
        /// The parser's message.
        cause: String,
    },

    /// A template in the set failed to parse.
    #[error("failed to parse template '{name}': {cause}")]
    TemplateParse {
        /// Template name (its file name).
        name: String,
        /// The engine's message.
        cause: String,
    },

    /// The output file could not be created.
    #[error("failed to create output file '{}': {source}", .path.display())]
    CreateOutput {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Rendered output could not be written.
    #[error("failed to write output file '{}': {source}", .path.display())]
    WriteOutput {
        /// The destination path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Template execution failed.
    #[error("failed to execute template '{name}': {cause}")]
    TemplateExecution {
        /// The template being executed.
        name: String,
        /// The engine's message.
        cause: String,
    },

    /// An operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: String,
        /// The underlying cause.
        cause: String,
    },
}

/// Result type alias for atemplateb operations.
pub type Result<T> = std::result::Result<T, Error>;
