//! BSON element tags.

use crate::error::BsonError;

/// Element type tag, the byte preceding each key on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    Double = 0x01,
    String = 0x02,
    Document = 0x03,
    Array = 0x04,
    Binary = 0x05,
    Undefined = 0x06,
    ObjectId = 0x07,
    Bool = 0x08,
    Date = 0x09,
    Null = 0x0a,
    Regex = 0x0b,
    DbPointer = 0x0c,
    Code = 0x0d,
    Symbol = 0x0e,
    CodeWithScope = 0x0f,
    Int32 = 0x10,
    Timestamp = 0x11,
    Int64 = 0x12,
    Decimal128 = 0x13,
    MaxKey = 0x7f,
    MinKey = 0xff,
}

impl Tag {
    pub fn from_u8(byte: u8) -> Result<Tag, BsonError> {
        Ok(match byte {
            0x01 => Tag::Double,
            0x02 => Tag::String,
            0x03 => Tag::Document,
            0x04 => Tag::Array,
            0x05 => Tag::Binary,
            0x06 => Tag::Undefined,
            0x07 => Tag::ObjectId,
            0x08 => Tag::Bool,
            0x09 => Tag::Date,
            0x0a => Tag::Null,
            0x0b => Tag::Regex,
            0x0c => Tag::DbPointer,
            0x0d => Tag::Code,
            0x0e => Tag::Symbol,
            0x0f => Tag::CodeWithScope,
            0x10 => Tag::Int32,
            0x11 => Tag::Timestamp,
            0x12 => Tag::Int64,
            0x13 => Tag::Decimal128,
            0x7f => Tag::MaxKey,
            0xff => Tag::MinKey,
            other => return Err(BsonError::UnknownTag(other)),
        })
    }

    /// Name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Tag::Double => "double",
            Tag::String => "string",
            Tag::Document => "document",
            Tag::Array => "array",
            Tag::Binary => "binary",
            Tag::Undefined => "undefined",
            Tag::ObjectId => "object-id",
            Tag::Bool => "bool",
            Tag::Date => "date",
            Tag::Null => "null",
            Tag::Regex => "regex",
            Tag::DbPointer => "db-pointer",
            Tag::Code => "code",
            Tag::Symbol => "symbol",
            Tag::CodeWithScope => "code-with-scope",
            Tag::Int32 => "int32",
            Tag::Timestamp => "timestamp",
            Tag::Int64 => "int64",
            Tag::Decimal128 => "decimal128",
            Tag::MaxKey => "max-key",
            Tag::MinKey => "min-key",
        }
    }
}
