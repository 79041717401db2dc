//! JSON-local errors.

use dynval_core::MapError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum JsonError {
    /// Malformed JSON text; `line` is 1-based.
    #[error("parse error at line {line}: {message}")]
    Parse { message: String, line: usize },

    /// Wrong-variant access on a [`crate::JsonValue`].
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

impl From<JsonError> for MapError {
    fn from(err: JsonError) -> MapError {
        match err {
            JsonError::Parse { message, line } => MapError::Parse { message, line },
            JsonError::TypeMismatch { expected, found } => MapError::TypeMismatch {
                expected,
                found: found.to_owned(),
            },
        }
    }
}
