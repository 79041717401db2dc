//! Engine-level error taxonomy.

use thiserror::Error;

/// Error type shared by the mapping algorithm and every backend.
///
/// Value-model crates keep their own local error enums and convert into
/// `MapError` at the backend boundary.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
    /// Malformed text input; carries the source line.
    #[error("parse error at line {line}: {message}")]
    Parse { message: String, line: usize },

    /// Wrong-variant access or wrong wire kind for the requested type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Wire-shape mismatch or missing required field; carries the field
    /// path, built outward while the error propagates.
    #[error("decode error at `{path}`: {message}")]
    Decode { path: String, message: String },

    /// A wide integer does not fit the narrower target.
    #[error("value {value} does not fit into {target}")]
    Overflow {
        value: String,
        target: &'static str,
    },

    /// Declared length or c-string runs past the end of the buffer.
    #[error("unterminated data: {0}")]
    Unterminated(String),

    /// Unknown symbolic name or discriminant during decode.
    #[error("unknown {kind} `{name}`")]
    UnknownName { kind: &'static str, name: String },

    /// A positional sequence had the wrong number of elements.
    #[error("length mismatch: expected {expected} elements, found {found}")]
    LengthMismatch { expected: usize, found: usize },

    /// The operation is not representable on this backend.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl MapError {
    /// A missing required record member.
    pub fn missing_field(name: &str) -> MapError {
        MapError::Decode {
            path: name.to_owned(),
            message: "missing required field".to_owned(),
        }
    }

    /// Prepends a path segment, wrapping non-decode errors on the way out.
    pub fn at(self, segment: &str) -> MapError {
        match self {
            MapError::Decode { path, message } => {
                let path = if path.is_empty() {
                    segment.to_owned()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                MapError::Decode { path, message }
            }
            other => MapError::Decode {
                path: segment.to_owned(),
                message: other.to_string(),
            },
        }
    }

    /// Prepends an array index segment.
    pub fn at_index(self, index: usize) -> MapError {
        self.at(&format!("[{index}]"))
    }
}
