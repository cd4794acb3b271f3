//! Error types for the PJL ticket report library

use std::path::PathBuf;
use thiserror::Error;

use crate::pdl::BodyLanguage;
use crate::pjl::PrologueEvent;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Library error code signalling that the PJL prologue (or the stream) has
/// no further input. Not a failure.
pub const PROLOGUE_EXHAUSTED: u32 = 124;

/// Library error code for a stream that could not be opened
pub const STREAM_OPEN_FAILED: u32 = 2;

/// Library error code for a prologue event the caller cannot handle
pub const UNEXPECTED_PROLOGUE_EVENT: u32 = 3;

/// Library error code for generic I/O failures
pub const IO_FAILURE: u32 = 5;

/// Library error code for PDF writer failures
pub const PDF_FAILURE: u32 = 6;

/// Library error code for a path that should be a directory but isn't
pub const NOT_A_DIRECTORY: u32 = 20;

/// Library error code used by body parsers for malformed input
pub const SYNTAX_ERROR: u32 = 101;

/// Main error type for the PJL ticket report library
#[derive(Error, Debug)]
pub enum Error {
    /// No PJL prologue remains in the stream
    #[error("PJL prologue exhausted")]
    PrologueExhausted,

    /// The input stream could not be opened
    #[error("Could not open input stream {}: {source}", .path.display())]
    StreamOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A body parser rejected its input
    #[error("{language} parser error {code}: {description}")]
    Parser {
        language: BodyLanguage,
        code: u32,
        description: String,
    },

    /// The selector was handed an event that does not enter a body language
    #[error("Unexpected PJL result: {0:?}")]
    UnexpectedPrologueEvent(PrologueEvent),

    /// Input is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF writer error
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
}

impl Error {
    /// Build a syntax error for a body parser
    pub fn syntax(language: BodyLanguage, description: impl Into<String>) -> Self {
        Error::Parser {
            language,
            code: SYNTAX_ERROR,
            description: description.into(),
        }
    }

    /// Numeric library error code
    pub fn code(&self) -> u32 {
        match self {
            Error::PrologueExhausted => PROLOGUE_EXHAUSTED,
            Error::StreamOpen { .. } => STREAM_OPEN_FAILED,
            Error::Parser { code, .. } => *code,
            Error::UnexpectedPrologueEvent(_) => UNEXPECTED_PROLOGUE_EVENT,
            Error::NotADirectory(_) => NOT_A_DIRECTORY,
            Error::Io(_) => IO_FAILURE,
            Error::Pdf(_) => PDF_FAILURE,
        }
    }

    /// True for the "prologue exhausted" signal, which ends a file cleanly
    pub fn is_prologue_exhausted(&self) -> bool {
        self.code() == PROLOGUE_EXHAUSTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prologue_exhausted_code() {
        assert_eq!(Error::PrologueExhausted.code(), 124);
        assert!(Error::PrologueExhausted.is_prologue_exhausted());
    }

    #[test]
    fn test_parser_error_keeps_code() {
        let err = Error::syntax(BodyLanguage::PclXl, "bad tag 0xf0");
        assert_eq!(err.code(), SYNTAX_ERROR);
        assert!(!err.is_prologue_exhausted());
        assert_eq!(err.to_string(), "PCL/XL parser error 101: bad tag 0xf0");
    }
}
