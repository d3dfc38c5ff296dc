//! File inclusion for `getFile` and `getYaml`.

use std::fmt;
use std::io;

use super::{GET_FILE, GET_YAML};
use crate::values::first_yaml_document;

/// Step of an inclusion that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Step {
    Read,
    Parse,
    Serialize,
}

impl Step {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Parse => "parse",
            Self::Serialize => "serialize",
        }
    }
}

/// A failed inclusion, rendered as the message recorded in the collector.
#[derive(Debug)]
pub(super) enum IncludeFailure {
    /// `getFile` could not read the file.
    File { path: String, source: io::Error },
    /// A `getYaml` step failed.
    Yaml {
        step: Step,
        path: String,
        cause: String,
    },
}

impl fmt::Display for IncludeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File { path, source } => {
                write!(f, "{GET_FILE}: failed to read '{path}': {source}")
            },
            Self::Yaml { step, path, cause } => {
                write!(
                    f,
                    "{GET_YAML}: {} failed for '{path}': {cause}",
                    step.as_str()
                )
            },
        }
    }
}

/// Reads the file at `path` as text. Invalid UTF-8 is replaced, not rejected.
pub(super) fn read_text(path: &str) -> Result<String, IncludeFailure> {
    let bytes = std::fs::read(path).map_err(|source| IncludeFailure::File {
        path: path.to_string(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Re-serializes the first YAML document in the file at `path`.
///
/// Merge keys are resolved. Any later documents are dropped.
pub(super) fn reserialize_yaml(path: &str) -> Result<String, IncludeFailure> {
    let failure = |step: Step, cause: String| IncludeFailure::Yaml {
        step,
        path: path.to_string(),
        cause,
    };

    let text = std::fs::read_to_string(path).map_err(|e| failure(Step::Read, e.to_string()))?;
    let document =
        first_yaml_document(&text).map_err(|e| failure(Step::Parse, e.to_string()))?;
    serde_yaml_ng::to_string(&document).map_err(|e| failure(Step::Serialize, e.to_string()))
}
