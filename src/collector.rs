//! Deferred reporting of helper-function errors.
//!
//! Helpers such as `getFile` must not abort a render when an include is
//! missing. They record a message here instead, and the driver inspects the
//! collector once rendering has finished.

use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only list of human-readable error messages.
///
/// Messages keep their insertion order. There is no deduplication and no
/// severity: every message counts as an error.
///
/// The template engine requires helper functions to be `Send + Sync`, so the
/// list lives behind a mutex even though a render is single-threaded.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    messages: Mutex<Vec<String>>,
}

impl ErrorCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message.
    pub fn add(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%message, "Helper error recorded");
        self.lock().push(message);
    }

    /// Returns whether any message was recorded.
    pub fn has_errors(&self) -> bool {
        !self.lock().is_empty()
    }

    /// Returns the number of recorded messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        !self.has_errors()
    }

    /// Returns a snapshot of the recorded messages in insertion order.
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Writes every message to `writer`, one per line, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns any error raised by the writer.
    pub fn report<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for message in self.lock().iter() {
            writeln!(writer, "{message}")?;
        }
        writer.flush()
    }

    // A panic while holding the lock cannot leave the list half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
