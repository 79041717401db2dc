//! BSON-local errors.

use dynval_buffers::BufferError;
use dynval_core::MapError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BsonError {
    /// A declared length or terminator runs past the end of the buffer.
    #[error("unterminated document: {0}")]
    Unterminated(&'static str),

    /// Key or string payload is not valid UTF-8.
    #[error("invalid utf-8 in {0}")]
    InvalidUtf8(&'static str),

    /// An element tag outside the known set.
    #[error("unknown element tag 0x{0:02x}")]
    UnknownTag(u8),

    /// A declared length is negative or otherwise nonsensical.
    #[error("invalid length field in {0}")]
    BadLength(&'static str),

    /// Wrong-tag access on a [`crate::Bson`] value.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// A dictionary key contains a NUL byte and cannot be a c-string.
    #[error("key `{0}` contains a NUL byte")]
    InvalidKey(String),
}

impl BsonError {
    pub(crate) fn in_context(err: BufferError, what: &'static str) -> BsonError {
        match err {
            BufferError::InvalidUtf8 => BsonError::InvalidUtf8(what),
            _ => BsonError::Unterminated(what),
        }
    }
}

impl From<BsonError> for MapError {
    fn from(err: BsonError) -> MapError {
        match err {
            BsonError::TypeMismatch { expected, found } => MapError::TypeMismatch {
                expected,
                found: found.to_owned(),
            },
            BsonError::Unterminated(_) | BsonError::BadLength(_) => {
                MapError::Unterminated(err.to_string())
            }
            other => MapError::Decode {
                path: String::new(),
                message: other.to_string(),
            },
        }
    }
}
