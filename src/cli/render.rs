//! Render command.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::instrument;

use crate::Result;
use crate::collector::ErrorCollector;
use crate::helpers::HelperSet;
use crate::rendering::{RenderOptions, TemplateContext, TemplateSet};
use crate::values::load_values;

/// A validated render invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommand {
    /// Primary template path.
    pub template: PathBuf,
    /// Values file; `None` renders against an empty mapping.
    pub values: Option<PathBuf>,
    /// Destination file, created or truncated.
    pub output: PathBuf,
    /// Execution options.
    pub options: RenderOptions,
}

/// Result of a render that produced output.
#[derive(Debug)]
pub struct RenderOutcome {
    /// The file that was written.
    pub output: PathBuf,
    /// Errors recorded by helpers during execution.
    pub collector: Arc<ErrorCollector>,
}

impl RenderOutcome {
    /// Returns `true` if no helper recorded an error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.collector.has_errors()
    }
}

impl RenderCommand {
    /// Loads values, parses the template set and renders to the output file.
    ///
    /// Helper failures do not make this fail; inspect
    /// [`RenderOutcome::is_clean`] afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the values or templates cannot be read or parsed,
    /// the output cannot be created, or template execution fails.
    #[instrument(skip(self), fields(template = %self.template.display(), output = %self.output.display()))]
    pub fn execute(&self) -> Result<RenderOutcome> {
        let values = load_values(self.values.as_deref())?;
        let context = TemplateContext::new(&values);

        let collector = Arc::new(ErrorCollector::new());
        let helpers = HelperSet::new(Arc::clone(&collector));
        let templates = TemplateSet::load(&self.template, &helpers, self.options)?;

        templates.render_to_file(&context, &self.output)?;

        tracing::info!(
            helper_errors = collector.len(),
            templates = templates.names().len(),
            "Render finished"
        );

        Ok(RenderOutcome {
            output: self.output.clone(),
            collector,
        })
    }
}
