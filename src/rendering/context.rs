//! The data object templates are executed against.

use serde::Serialize;

use crate::values::ValuesDocument;

/// Wraps the values document so templates reference it uniformly as `Values`.
///
/// The context borrows the document and is never mutated; build one per
/// render and pass it by reference.
///
/// # Examples
///
/// ```rust
/// use atemplateb::{TemplateContext, ValuesDocument};
///
/// let mut values = ValuesDocument::new();
/// values.insert("host".to_string(), "example.com".into());
///
/// let context = TemplateContext::new(&values);
/// assert_eq!(context.values()["host"], "example.com");
/// ```
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TemplateContext<'a> {
    #[serde(rename = "Values")]
    values: &'a ValuesDocument,
}

impl<'a> TemplateContext<'a> {
    /// Creates a context exposing `values`.
    #[must_use]
    pub const fn new(values: &'a ValuesDocument) -> Self {
        Self { values }
    }

    /// Returns the wrapped values document.
    #[must_use]
    pub const fn values(&self) -> &'a ValuesDocument {
        self.values
    }
}
