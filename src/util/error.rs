//! Error types for the GTO codec.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for GTO operations.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Leading 32-bit word matches the magic in neither byte order
    #[error("Invalid GTO data: magic 0x{0:08x} matches neither byte order")]
    InvalidMagic(u32),

    /// Content is neither binary GTO nor text GTO
    #[error("Unrecognized content: not a text or binary GTO stream")]
    UnrecognizedFormat,

    /// Unsupported file format version
    #[error("Unsupported GTO version: {0}")]
    UnsupportedVersion(u32),

    /// Data is truncated or a declared count points past the end
    #[error("Unexpected end of data at offset {pos} (needed {needed} bytes)")]
    UnexpectedEof { pos: usize, needed: usize },

    /// Text grammar violation
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// Type name in text that names no known type
    #[error("Unknown type '{name}' at line {line}")]
    UnknownType { name: String, line: usize },

    /// Unknown binary type tag
    #[error("Unknown type tag {0}")]
    UnknownTypeTag(u8),

    /// Gzip-framed input given to the synchronous entry point
    #[error("Input is gzip compressed; use the asynchronous entry point (open_async)")]
    Compressed,

    /// Content rejected by BINARY_ONLY / TEXT_ONLY
    #[error("Format not permitted by read mode: {0}")]
    FormatRestricted(&'static str),

    /// Operation not valid in the writer's current state
    #[error("Invalid writer state: cannot {op} while in {state} state")]
    InvalidState {
        op: &'static str,
        state: &'static str,
    },

    /// Data supplied for a property that was never declared
    #[error("No declared property left to receive data")]
    UndeclaredData,

    /// Declared property closed without data
    #[error("Property '{0}' was declared but never given data")]
    MissingData(String),

    /// Data does not fit the property's declared type or shape
    #[error("Data mismatch for property '{name}': {message}")]
    DataMismatch { name: String, message: String },

    /// String table lookup out of range
    #[error("String id {id} out of range (table size: {count})")]
    StringIdOutOfRange { id: u32, count: usize },

    /// String that cannot be stored in the binary string table
    #[error("String cannot be encoded: {0:?}")]
    InvalidString(String),

    /// Object index out of range for random access
    #[error("Object index {index} out of bounds (count: {count})")]
    ObjectOutOfBounds { index: usize, count: usize },

    /// Random access requested without RANDOM_ACCESS retention
    #[error("Random access is not available: open with ReadMode::RANDOM_ACCESS")]
    NoRandomAccess,

    /// Invalid data structure
    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    /// Decompression facility failed
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// UTF-8 conversion error
    #[error("Invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid structure error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidStructure(msg.into())
    }

    /// Create a syntax error at a source position.
    pub fn syntax(line: usize, column: usize, msg: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            column,
            message: msg.into(),
        }
    }

    /// Create a data mismatch error for a named property.
    pub fn mismatch(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::DataMismatch {
            name: name.into(),
            message: msg.into(),
        }
    }
}

/// Result type alias for GTO operations.
pub type Result<T> = std::result::Result<T, Error>;
