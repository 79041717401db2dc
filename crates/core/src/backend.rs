//! The Backend Contract.
//!
//! A backend adapts one concrete representation (a value tree, a text
//! stream, a binary document) to the mapping engine. Writing uses
//! begin/end framing so streaming backends never have to buffer; reading
//! uses callbacks so the backend keeps control of its own cursor.
//!
//! Both traits are object-safe: the engine only ever sees `&mut dyn`.

use crate::error::MapError;
use crate::scalar::{Scalar, ScalarKind};

/// Writing half of the backend contract.
pub trait Serializer {
    /// Whether this backend natively carries the given scalar kind.
    ///
    /// The engine degrades unsupported kinds to their canonical textual
    /// form before calling [`Serializer::write_scalar`], so an
    /// implementation may assume it is only handed kinds it supports.
    fn supports(&self, kind: ScalarKind) -> bool;

    /// Writes one leaf value at the current position.
    fn write_scalar(&mut self, value: Scalar) -> Result<(), MapError>;

    /// Opens a dictionary. Entries follow as
    /// [`Serializer::begin_entry`]/value pairs.
    fn begin_dictionary(&mut self) -> Result<(), MapError>;

    /// Announces the key of the next dictionary entry; exactly one value
    /// write must follow.
    fn begin_entry(&mut self, key: &str) -> Result<(), MapError>;

    /// Closes the innermost open dictionary.
    fn end_dictionary(&mut self) -> Result<(), MapError>;

    /// Opens an array. `len` is exact when the producer knows it upfront.
    fn begin_array(&mut self, len: Option<usize>) -> Result<(), MapError>;

    /// Closes the innermost open array.
    fn end_array(&mut self) -> Result<(), MapError>;
}

/// Reading half of the backend contract.
pub trait Deserializer {
    /// Whether this backend natively carries the given scalar kind.
    fn supports(&self, kind: ScalarKind) -> bool;

    /// Reads the leaf value at the current position.
    fn read_scalar(&mut self) -> Result<Scalar, MapError>;

    /// Consumes a null if one is at the current position and reports
    /// whether it did. A `false` return must leave the cursor untouched.
    fn try_read_null(&mut self) -> Result<bool, MapError>;

    /// Reads a dictionary, invoking `entry` once per key with the cursor
    /// positioned on the entry's value. The callback must consume exactly
    /// that value.
    fn read_dictionary(
        &mut self,
        entry: &mut dyn FnMut(&mut dyn Deserializer, &str) -> Result<(), MapError>,
    ) -> Result<(), MapError>;

    /// Reads an array. `size_hint` fires once with the element count when
    /// the backend knows it upfront; `element` fires once per element with
    /// the cursor positioned on it.
    fn read_array(
        &mut self,
        size_hint: &mut dyn FnMut(usize),
        element: &mut dyn FnMut(&mut dyn Deserializer) -> Result<(), MapError>,
    ) -> Result<(), MapError>;

    /// Consumes the value at the current position without interpreting it.
    /// Used for unknown dictionary keys.
    fn skip_value(&mut self) -> Result<(), MapError>;
}
