//! Injectable diagnostics sink for the HTTP execution core.
//!
//! Clients default to [`NoopLogger`]; pass [`TracingLogger`] (or your own
//! implementation) through the client builder to see per-attempt and retry
//! diagnostics.

use std::fmt::{self, Display, Write as _};

/// Key/value pairs attached to a log line.
pub type Fields<'a> = &'a [(&'a str, &'a dyn Display)];

/// Structured logger accepting a message plus key/value pairs.
pub trait Logger: Send + Sync {
    /// Log at debug level.
    fn debug(&self, message: &str, fields: Fields<'_>);

    /// Log at info level.
    fn info(&self, message: &str, fields: Fields<'_>);

    /// Log at error level.
    fn error(&self, message: &str, fields: Fields<'_>);
}

/// Logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str, _fields: Fields<'_>) {}

    fn info(&self, _message: &str, _fields: Fields<'_>) {}

    fn error(&self, _message: &str, _fields: Fields<'_>) {}
}

/// Logger that forwards to the `tracing` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str, fields: Fields<'_>) {
        tracing::debug!(fields = %FieldList(fields), "{message}");
    }

    fn info(&self, message: &str, fields: Fields<'_>) {
        tracing::info!(fields = %FieldList(fields), "{message}");
    }

    fn error(&self, message: &str, fields: Fields<'_>) {
        tracing::error!(fields = %FieldList(fields), "{message}");
    }
}

/// Renders fields as `key=value` pairs separated by spaces.
pub struct FieldList<'a>(pub Fields<'a>);

impl Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (key, value)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_char(' ')?;
            }
            write!(f, "{key}={value}")?;
        }
        Ok(())
    }
}
