//! Command-line interface.
//!
//! # Flags
//!
//! | Flag | Environment | Default |
//! |------|-------------|---------|
//! | `--template` | `ATEMPLATEB_TEMPLATE` | required |
//! | `--values` | `ATEMPLATEB_VALUES` | empty mapping |
//! | `--output` | `ATEMPLATEB_OUTPUT` | `nginx.conf` |
//! | `--strict` | `ATEMPLATEB_STRICT` | off |
//!
//! # Example Usage
//!
//! ```bash
//! atemplateb --template=templates/nginx.conf.tmpl --values=values.yaml --output=nginx.conf
//! ```

mod render;

use std::path::PathBuf;

use clap::Parser;

pub use render::{RenderCommand, RenderOutcome};

use crate::rendering::RenderOptions;
use crate::{Error, Result};

/// Default destination file.
pub const DEFAULT_OUTPUT: &str = "nginx.conf";

/// Usage line printed when the template flag is missing.
pub const USAGE: &str = "Usage: atemplateb --template=<template>.tmpl [--values=<values>.yaml|json] [--output=<output>.<extension>]";

/// Render a configuration file from a template and JSON/YAML values.
#[derive(Debug, Parser)]
#[command(name = "atemplateb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the primary template file; sibling `*.tmpl*` files are loaded too.
    #[arg(long, value_name = "FILE", env = "ATEMPLATEB_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Path to the JSON or YAML file with values.
    #[arg(long, value_name = "FILE", env = "ATEMPLATEB_VALUES")]
    pub values: Option<PathBuf>,

    /// Path to the output file.
    #[arg(long, value_name = "FILE", env = "ATEMPLATEB_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Fail on undefined template values instead of rendering them empty.
    #[arg(long, env = "ATEMPLATEB_STRICT")]
    pub strict: bool,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Validates the flags and builds the render command.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Usage`] if no template path was given.
    pub fn into_render_command(self) -> Result<RenderCommand> {
        let template = self
            .template
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or_else(|| Error::Usage(USAGE.to_string()))?;

        Ok(RenderCommand {
            template,
            values: self.values.filter(|path| !path.as_os_str().is_empty()),
            output: self.output,
            options: RenderOptions {
                strict_undefined: self.strict,
            },
        })
    }
}
