//! Error taxonomy for parse operations.
//!
//! Writers and the diff engine are infallible by contract and have no
//! error types; only parsing can fail, and callers must be able to tell
//! "no backend" apart from "bad header".

use crate::decls::SourceLocation;
use thiserror::Error;

/// Errors produced by a parser backend.
#[derive(Error, Debug)]
pub enum ParseError {
    /// The external parsing engine could not be loaded or initialized.
    /// Fatal to the calling operation; retrying requires a different
    /// backend or a fixed environment.
    #[error("parser backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The engine loaded but reported unrecoverable diagnostics for the
    /// given input.
    #[error("parse failure in {filename}{}: {message}", location_suffix(.location))]
    ParseFailure {
        filename: String,
        message: String,
        location: Option<SourceLocation>,
    },
}

fn location_suffix(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" at line {}", loc.line),
        None => String::new(),
    }
}

/// Result type for parse operations.
pub type ParseResult<T> = Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_display() {
        let err = ParseError::ParseFailure {
            filename: "bad.h".to_string(),
            message: "expected ';'".to_string(),
            location: Some(SourceLocation::new("bad.h", 3)),
        };
        assert_eq!(err.to_string(), "parse failure in bad.h at line 3: expected ';'");
    }

    #[test]
    fn test_backend_unavailable_display() {
        let err = ParseError::BackendUnavailable("grammar ABI mismatch".to_string());
        assert!(err.to_string().contains("unavailable"));
    }
}
