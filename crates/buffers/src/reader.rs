//! Binary buffer reader with cursor tracking.

use std::str;

use crate::BufferError;

/// A binary buffer reader that reads little-endian data from a byte slice.
///
/// The reader maintains a cursor position between `x` and `end` and never
/// reads outside that window; every read checks the remaining size first.
pub struct Reader<'a> {
    /// The underlying byte slice.
    pub bytes: &'a [u8],
    /// Current cursor position.
    pub x: usize,
    /// End position (exclusive).
    pub end: usize,
}

impl<'a> Reader<'a> {
    /// Creates a new reader for the given byte slice.
    pub fn new(bytes: &'a [u8]) -> Self {
        let end = bytes.len();
        Self { bytes, x: 0, end }
    }

    /// Creates a reader from a slice with custom start and end positions.
    pub fn from_slice(bytes: &'a [u8], x: usize, end: usize) -> Self {
        Self { bytes, x, end }
    }

    /// Returns the number of remaining bytes.
    pub fn size(&self) -> usize {
        self.end.saturating_sub(self.x)
    }

    /// Peeks at the current byte without advancing the cursor.
    pub fn peek(&self) -> Result<u8, BufferError> {
        if self.x >= self.end {
            return Err(BufferError::UnexpectedEof);
        }
        Ok(self.bytes[self.x])
    }

    /// Advances the cursor by the given number of bytes.
    pub fn skip(&mut self, length: usize) -> Result<(), BufferError> {
        self.check(length)?;
        self.x += length;
        Ok(())
    }

    fn check(&self, size: usize) -> Result<(), BufferError> {
        if self.size() < size {
            return Err(BufferError::UnexpectedEof);
        }
        Ok(())
    }

    /// Returns a subarray of the given size and advances the cursor.
    pub fn buf(&mut self, size: usize) -> Result<&'a [u8], BufferError> {
        self.check(size)?;
        let x = self.x;
        self.x += size;
        Ok(&self.bytes[x..x + size])
    }

    /// Reads an unsigned 8-bit integer.
    #[inline]
    pub fn u8(&mut self) -> Result<u8, BufferError> {
        self.check(1)?;
        let val = self.bytes[self.x];
        self.x += 1;
        Ok(val)
    }

    /// Reads a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32_le(&mut self) -> Result<i32, BufferError> {
        let b = self.buf(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads an unsigned 32-bit integer (little-endian).
    #[inline]
    pub fn u32_le(&mut self) -> Result<u32, BufferError> {
        let b = self.buf(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64_le(&mut self) -> Result<i64, BufferError> {
        let b = self.buf(8)?;
        Ok(i64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn u64_le(&mut self) -> Result<u64, BufferError> {
        let b = self.buf(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64_le(&mut self) -> Result<f64, BufferError> {
        let b = self.buf(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Reads a UTF-8 string of the given byte size.
    pub fn utf8(&mut self, size: usize) -> Result<&'a str, BufferError> {
        let b = self.buf(size)?;
        str::from_utf8(b).map_err(|_| BufferError::InvalidUtf8)
    }

    /// Reads a null-terminated UTF-8 string, consuming the terminator.
    pub fn cstr(&mut self) -> Result<&'a str, BufferError> {
        let start = self.x;
        let mut i = start;
        while i < self.end {
            if self.bytes[i] == 0 {
                let s = str::from_utf8(&self.bytes[start..i])
                    .map_err(|_| BufferError::InvalidUtf8)?;
                self.x = i + 1;
                return Ok(s);
            }
            i += 1;
        }
        Err(BufferError::UnterminatedCString)
    }
}
