//! Umbrella crate: dynamic JSON and BSON value models plus the
//! type-driven mapping engine that moves statically typed values through
//! either representation.
//!
//! The pieces live in their own crates and are re-exported here:
//!
//! - `dynval-core`: the [`Mappable`] engine, [`record!`]/[`enumeration!`]
//!   declarations, [`Policies`] and the backend contract.
//! - `dynval-json`: [`JsonValue`], text parsing and printing, JSON
//!   backends.
//! - `dynval-bson`: [`Bson`], the binary wire codec, BSON backends and
//!   direct tree conversion.
//!
//! ```
//! use dynval::{from_bson, from_json_str, record, to_bson, to_json_string};
//!
//! record! {
//!     struct Reading {
//!         sensor: String,
//!         value: f64,
//!     }
//! }
//!
//! let reading = Reading { sensor: "t0".to_owned(), value: 21.5 };
//! let text = to_json_string(&reading).unwrap();
//! let doc = to_bson(&reading).unwrap();
//! assert_eq!(from_json_str::<Reading>(&text).unwrap(), reading);
//! assert_eq!(from_bson::<Reading>(&doc).unwrap(), reading);
//! ```

pub use dynval_buffers::{BufferError, Reader, Writer};
pub use dynval_core::{
    enumeration, record, Bytes, DateTime, Deserializer, Enumerated, MapError, Mappable, ObjectId,
    Policies, Record, RegexValue, Scalar, ScalarKind, SequenceRecord, Serializer, Timestamp,
    map_value, unmap_value,
};
pub use dynval_json::{
    from_json, from_json_str, from_json_str_with, from_json_with, parse_json, to_json,
    to_json_string, to_json_string_with, to_json_text, to_json_with, to_pretty_json_text,
    JsonDeserializer, JsonError, JsonTextSerializer, JsonTreeSerializer, JsonValue,
};
pub use dynval_bson::{
    bson_to_json, from_bson, from_bson_with, json_to_bson, to_bson, to_bson_with, Bson,
    BsonDeserializer, BsonError, BsonSerializer, Tag,
};
