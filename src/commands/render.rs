//! Render command handler.

use std::io::{self, Write};
use std::process::ExitCode;

use atemplateb::{RenderCommand, RenderOutcome};

/// Render command.
///
/// Fatal errors are printed immediately. Helper errors are printed after the
/// output has been written, followed by a summary, and still fail the run.
pub fn cmd_render(command: &RenderCommand) -> ExitCode {
    if command.values.is_none() {
        tracing::debug!("No values file provided");
        println!("Warning: no values file provided, rendering with an empty values mapping");
    }

    match command.execute() {
        Ok(outcome) if outcome.is_clean() => {
            println!("Generated config saved to: {}", outcome.output.display());
            ExitCode::SUCCESS
        },
        Ok(outcome) => {
            report_helper_errors(&outcome);
            ExitCode::FAILURE
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

fn report_helper_errors(outcome: &RenderOutcome) {
    let stderr = io::stderr();
    let mut stderr = stderr.lock();
    let _ = outcome.collector.report(&mut stderr);
    let _ = writeln!(
        stderr,
        "Rendering completed with {} error(s); output written to {} may be incomplete",
        outcome.collector.len(),
        outcome.output.display()
    );
}
