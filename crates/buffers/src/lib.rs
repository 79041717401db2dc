//! Byte buffer utilities for the dynval wire codecs.
//!
//! The binary value model is little-endian with length prefixes and
//! null-terminated keys, so both [`Reader`] and [`Writer`] are LE-centric.
//! All reads are fallible: short input surfaces as
//! [`BufferError::UnexpectedEof`] instead of a panic, because truncated
//! documents are an expected input class, not a bug.
//!
//! # Example
//!
//! ```
//! use dynval_buffers::{Reader, Writer};
//!
//! let mut writer = Writer::new();
//! writer.u8(0x10);
//! writer.i32_le(7);
//! writer.cstr("key");
//! let data = writer.flush();
//!
//! let mut reader = Reader::new(&data);
//! assert_eq!(reader.u8().unwrap(), 0x10);
//! assert_eq!(reader.i32_le().unwrap(), 7);
//! assert_eq!(reader.cstr().unwrap(), "key");
//! ```

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Error type for buffer operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof,
    /// Invalid UTF-8 sequence.
    InvalidUtf8,
    /// A null-terminated string ran past the end of the buffer.
    UnterminatedCString,
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::UnexpectedEof => write!(f, "unexpected end of buffer"),
            BufferError::InvalidUtf8 => write!(f, "invalid UTF-8 sequence"),
            BufferError::UnterminatedCString => write!(f, "unterminated c-string"),
        }
    }
}

impl std::error::Error for BufferError {}
