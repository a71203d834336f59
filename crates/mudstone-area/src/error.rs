//! Area format error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for area loading and persistence.
pub type AreaResult<T> = Result<T, AreaError>;

/// Errors from the on-disk formats.
///
/// Format errors are boot-fatal by policy; recoverable inconsistencies
/// (an exit to a vnum that never loads, a reset naming a missing
/// prototype) are `bug` records inside the loader instead.
#[derive(Debug, Error)]
pub enum AreaError {
    /// I/O failure reading or writing a data file.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Area files must be UTF-8 (historically ASCII).
    #[error("file is not valid UTF-8")]
    NotUtf8,

    /// Ran out of input mid-record.
    #[error("unexpected end of file at line {line}")]
    UnexpectedEof { line: u32 },

    /// A tilde-terminated string never ended.
    #[error("unterminated string starting near line {line}")]
    UnterminatedString { line: u32 },

    /// Expected a decimal number.
    #[error("expected a number at line {line}, found '{found}'")]
    ExpectedNumber { line: u32, found: String },

    /// A flag word with characters outside the letter alphabet.
    #[error("bad flag word at line {line}: '{found}'")]
    BadFlag { line: u32, found: String },

    /// A dice token that is not `NdS+B`.
    #[error("bad dice expression at line {line}: '{found}'")]
    BadDice { line: u32, found: String },

    /// An unknown `#SECTION` header.
    #[error("unknown section '{section}' at line {line}")]
    UnknownSection { section: String, line: u32 },

    /// Structured data inside a section did not parse.
    #[error("malformed {section} section at line {line}: {detail}")]
    Malformed {
        section: &'static str,
        line: u32,
        detail: String,
    },

    /// JSON co-format failure.
    #[error("json area error: {0}")]
    Json(#[from] serde_json::Error),

    /// The area list never terminated with `$`.
    #[error("area list {path} missing '$' terminator")]
    UnterminatedList { path: PathBuf },
}

impl AreaError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AreaError::Io {
            path: path.into(),
            source,
        }
    }
}
