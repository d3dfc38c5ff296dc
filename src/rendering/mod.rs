//! Template rendering.
//!
//! Parses a primary template together with its sibling templates and executes
//! it against a [`TemplateContext`], streaming output to a writer or file.

mod context;
mod template_set;

pub use context::TemplateContext;
pub use template_set::{RenderOptions, TEMPLATE_MARKER, TemplateSet, matches_template_pattern};
