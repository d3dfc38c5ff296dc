//! Multi-file template sets.
//!
//! The primary template is parsed together with every sibling file whose name
//! matches `*.tmpl*`, each registered under its file name. Templates compose
//! with `{% include %}`, `{% import %}` and `{% extends %}` by those names.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment, UndefinedBehavior};

use super::TemplateContext;
use crate::helpers::HelperSet;
use crate::{Error, Result};

/// Substring a sibling file name must contain to join the set (`*.tmpl*`).
pub const TEMPLATE_MARKER: &str = ".tmpl";

/// Returns whether `file_name` matches the sibling template pattern `*.tmpl*`.
#[must_use]
pub fn matches_template_pattern(file_name: &str) -> bool {
    file_name.contains(TEMPLATE_MARKER)
}

/// Options controlling template execution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Treat any undefined lookup as an execution error.
    ///
    /// When `false`, undefined values render as empty text.
    pub strict_undefined: bool,
}

/// A parsed primary template and its siblings.
pub struct TemplateSet {
    env: Environment<'static>,
    primary: String,
    names: Vec<String>,
}

impl TemplateSet {
    /// Parses `primary` and every sibling template in its directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReadFile`] if the directory or a template cannot be
    /// read and [`Error::TemplateParse`] if any template fails to parse.
    pub fn load(primary: &Path, helpers: &HelperSet, options: RenderOptions) -> Result<Self> {
        let primary_name = primary.file_name().map_or_else(
            || primary.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        );
        let dir = match primary.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut sources = discover_siblings(dir)?;
        sources.insert(primary_name.clone(), primary.to_path_buf());

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        if options.strict_undefined {
            env.set_undefined_behavior(UndefinedBehavior::Strict);
        }
        helpers.install(&mut env);

        for (name, path) in &sources {
            let source = fs::read_to_string(path).map_err(|source| Error::ReadFile {
                kind: "template",
                path: path.clone(),
                source,
            })?;
            env.add_template_owned(name.clone(), source)
                .map_err(|e| Error::TemplateParse {
                    name: name.clone(),
                    cause: describe(&e),
                })?;
        }

        tracing::debug!(
            primary = %primary_name,
            dir = %dir.display(),
            templates = sources.len(),
            "Parsed template set"
        );

        Ok(Self {
            env,
            primary: primary_name,
            names: sources.into_keys().collect(),
        })
    }

    /// Returns the name of the primary template.
    #[must_use]
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Returns the names of every parsed template, sorted.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Executes the primary template, streaming output into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateExecution`] if the engine raises an error.
    /// Helper failures are not errors here; they are collected.
    pub fn render_to<W: Write>(&self, context: &TemplateContext<'_>, out: W) -> Result<()> {
        let template = self
            .env
            .get_template(&self.primary)
            .map_err(|e| self.execution_error(&e))?;
        template
            .render_to_write(context, out)
            .map_err(|e| self.execution_error(&e))?;
        Ok(())
    }

    /// Executes the primary template into `output`, creating or truncating it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CreateOutput`] if the file cannot be created,
    /// [`Error::TemplateExecution`] if execution fails and
    /// [`Error::WriteOutput`] if the final flush fails.
    pub fn render_to_file(&self, context: &TemplateContext<'_>, output: &Path) -> Result<()> {
        let file = File::create(output).map_err(|source| Error::CreateOutput {
            path: output.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        self.render_to(context, &mut writer)?;
        writer.flush().map_err(|source| Error::WriteOutput {
            path: output.to_path_buf(),
            source,
        })?;

        tracing::debug!(template = %self.primary, output = %output.display(), "Rendered template");
        Ok(())
    }

    fn execution_error(&self, err: &minijinja::Error) -> Error {
        Error::TemplateExecution {
            name: self.primary.clone(),
            cause: describe(err),
        }
    }
}

impl fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateSet")
            .field("primary", &self.primary)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

/// Maps each `*.tmpl*` file in `dir` to its path, keyed by file name.
fn discover_siblings(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let read_error = |source| Error::ReadFile {
        kind: "template directory",
        path: dir.to_path_buf(),
        source,
    };

    let mut siblings = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if matches_template_pattern(name) && path.is_file() {
            siblings.insert(name.to_string(), path.clone());
        }
    }
    Ok(siblings)
}

/// Renders an engine error with its chain of causes.
fn describe(err: &minijinja::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        let _ = write!(message, ": {cause}");
        source = cause.source();
    }
    message
}
