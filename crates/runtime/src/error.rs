//! Structured error chains: every error carries a message and an optional
//! link to a deeper cause, forming a singly linked list from outermost to
//! innermost. Mirrors the original C design's `zsql_error` linked list as a
//! safe owned sum type.

use std::fmt;

/// The kind of failure that produced an [`Error`], independent of its
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A syscall failed (I/O, permission, allocation).
    System,
    /// The embedded SQL engine reported a failure.
    Database,
    /// The database's schema version is newer than this build understands.
    Schema,
    /// The user supplied invalid input (missing query, conflicting flags).
    User,
    /// A search or forget produced zero matching rows.
    NotFound,
    /// Allocating a wrapping error itself failed.
    OutOfMemory,
}

/// A single link in an error chain.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    cause: Option<Box<Error>>,
}

static NOT_ENOUGH_MEMORY_MESSAGE: &str = "not enough memory to allocate error";

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(kind: ErrorKind, message: impl Into<String>, cause: Error) -> Self {
        Error {
            kind,
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    /// The statically allocated out-of-memory sentinel. The original design
    /// returns this in place of a wrapper when allocation itself fails; in
    /// safe Rust there is no allocation-failure path to hit in practice, but
    /// the constructor is kept so the shape of the design survives and can
    /// be exercised by tests.
    pub fn out_of_memory() -> Self {
        Error::new(ErrorKind::OutOfMemory, NOT_ENOUGH_MEMORY_MESSAGE)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::System, message)
    }

    pub fn system_from_io(err: &std::io::Error) -> Self {
        Error::system(err.to_string())
    }

    pub fn user(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::User, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::NotFound, message)
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Schema, message)
    }

    /// Builds a database-kind error from the SQL engine's last-error text,
    /// applying the de-duplication rule: if `cause` already carries this
    /// exact message as its own, the wrapper is skipped and `cause` is
    /// returned unchanged. This avoids a failing `step` and a subsequent
    /// failing `finalize` from stacking the identical message twice.
    pub fn from_database(message: impl Into<String>, cause: Option<Error>) -> Self {
        let message = message.into();

        if let Some(cause) = cause {
            if cause.message == message {
                return cause;
            }
            return Error::with_cause(ErrorKind::Database, message, cause);
        }

        Error::new(ErrorKind::Database, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&Error> {
        self.cause.as_deref()
    }

    /// Wraps `self` under a new outer message, becoming the `cause`.
    pub fn context(self, kind: ErrorKind, message: impl Into<String>) -> Self {
        Error::with_cause(kind, message, self)
    }

    /// Prints `argv[0]: <message>` followed by one tab-indented line per
    /// chained cause, matching the original `zsql_error_print` layout.
    pub fn print_chain(&self, program: &str, out: &mut impl std::io::Write) -> std::io::Result<()> {
        writeln!(out, "{program}: {}", self.message)?;
        let mut cursor = self.cause.as_deref();
        while let Some(err) = cursor {
            writeln!(out, "\t{}", err.message)?;
            cursor = err.cause.as_deref();
        }
        Ok(())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        let mut cursor = self.cause.as_deref();
        while let Some(err) = cursor {
            write!(f, ": {}", err.message)?;
            cursor = err.cause.as_deref();
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_deref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::system_from_io(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_prints_outermost_first_then_tab_indented_causes() {
        let innermost = Error::new(ErrorKind::Database, "no such table: dirs");
        let middle = Error::with_cause(ErrorKind::Database, "prepare failed", innermost);
        let outer = Error::with_cause(ErrorKind::User, "search failed", middle);

        let mut buf = Vec::new();
        outer.print_chain("zsql", &mut buf).unwrap();
        let printed = String::from_utf8(buf).unwrap();

        assert_eq!(
            printed,
            "zsql: search failed\n\tprepare failed\n\tno such table: dirs\n"
        );
    }

    #[test]
    fn from_database_dedupes_identical_innermost_message() {
        let cause = Error::new(ErrorKind::Database, "disk I/O error");
        let wrapped = Error::from_database("disk I/O error", Some(cause));

        // the wrapper was skipped: no double "disk I/O error: disk I/O error"
        assert_eq!(wrapped.message(), "disk I/O error");
        assert!(wrapped.cause().is_none());
    }

    #[test]
    fn from_database_keeps_distinct_messages_chained() {
        let cause = Error::new(ErrorKind::Database, "disk I/O error");
        let wrapped = Error::from_database("finalize failed", Some(cause));

        assert_eq!(wrapped.message(), "finalize failed");
        assert_eq!(wrapped.cause().unwrap().message(), "disk I/O error");
    }

    #[test]
    fn out_of_memory_sentinel_is_stable() {
        let a = Error::out_of_memory();
        let b = Error::out_of_memory();
        assert_eq!(a.kind(), ErrorKind::OutOfMemory);
        assert_eq!(a.message(), b.message());
    }

    #[test]
    fn display_matches_print_chain_message_order() {
        let inner = Error::new(ErrorKind::Database, "locked");
        let outer = Error::with_cause(ErrorKind::User, "add failed", inner);
        assert_eq!(outer.to_string(), "add failed: locked");
    }
}
