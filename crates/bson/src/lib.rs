//! BSON value model, wire codec and backends.
//!
//! [`Bson`] is a cheap handle into a shared document buffer;
//! [`Bson::from_document_bytes`] brings raw wire bytes in and
//! [`Bson::document_bytes`] takes them back out. The backend types plug
//! the model into the `dynval-core` mapping engine, and
//! [`bson_to_json`]/[`json_to_bson`] convert trees directly between the
//! two value models:
//!
//! ```
//! use dynval_core::record;
//! use dynval_bson::{from_bson, to_bson};
//!
//! record! {
//!     struct Point {
//!         x: i32,
//!         y: i32,
//!     }
//! }
//!
//! let doc = to_bson(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(
//!     doc.document_bytes().unwrap(),
//!     &[19, 0, 0, 0, 0x10, b'x', 0, 1, 0, 0, 0, 0x10, b'y', 0, 2, 0, 0, 0, 0],
//! );
//! let back: Point = from_bson(&doc).unwrap();
//! assert_eq!(back, Point { x: 1, y: 2 });
//! ```

pub mod convert;
pub mod de;
pub mod error;
pub mod ser;
pub mod tag;
pub mod value;

pub use convert::{bson_to_json, json_to_bson};
pub use de::BsonDeserializer;
pub use error::BsonError;
pub use ser::BsonSerializer;
pub use tag::Tag;
pub use value::{Bson, DocumentIter};

use dynval_core::{map_value, unmap_value, MapError, Mappable, Policies};

/// Maps a value to a [`Bson`] document.
pub fn to_bson<T: Mappable>(value: &T) -> Result<Bson, MapError> {
    to_bson_with(value, &Policies::new())
}

pub fn to_bson_with<T: Mappable>(value: &T, policies: &Policies) -> Result<Bson, MapError> {
    let mut ser = BsonSerializer::new();
    map_value(value, &mut ser, policies)?;
    ser.finish()
}

/// Reads a value back out of a [`Bson`] document.
pub fn from_bson<T: Mappable>(bson: &Bson) -> Result<T, MapError> {
    from_bson_with(bson, &Policies::new())
}

pub fn from_bson_with<T: Mappable>(bson: &Bson, policies: &Policies) -> Result<T, MapError> {
    let mut de = BsonDeserializer::new(bson);
    unmap_value(&mut de, policies)
}
