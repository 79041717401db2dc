//! JSON value model and backends.
//!
//! [`JsonValue`] is the dynamically typed tree; [`parse_json`] and
//! [`to_json_text`]/[`to_pretty_json_text`] move it through text. The
//! backend types plug the model into the `dynval-core` mapping engine;
//! the convenience functions below cover the common one-shot cases:
//!
//! ```
//! use dynval_core::record;
//! use dynval_json::{from_json_str, to_json_string};
//!
//! record! {
//!     struct Point {
//!         x: i32,
//!         y: i32,
//!     }
//! }
//!
//! let text = to_json_string(&Point { x: 1, y: 2 }).unwrap();
//! assert_eq!(text, r#"{"x":1,"y":2}"#);
//! let back: Point = from_json_str(&text).unwrap();
//! assert_eq!(back, Point { x: 1, y: 2 });
//! ```

pub mod de;
pub mod error;
pub mod parse;
pub mod print;
pub mod ser;
pub mod value;

pub use de::JsonDeserializer;
pub use error::JsonError;
pub use parse::parse_json;
pub use print::{to_json_text, to_pretty_json_text};
pub use ser::{JsonTextSerializer, JsonTreeSerializer};
pub use value::JsonValue;

use dynval_core::{map_value, unmap_value, MapError, Mappable, Policies};

/// Maps a value to a [`JsonValue`] tree.
pub fn to_json<T: Mappable>(value: &T) -> Result<JsonValue, MapError> {
    to_json_with(value, &Policies::new())
}

pub fn to_json_with<T: Mappable>(value: &T, policies: &Policies) -> Result<JsonValue, MapError> {
    let mut ser = JsonTreeSerializer::new();
    map_value(value, &mut ser, policies)?;
    ser.finish()
}

/// Reads a value back out of a [`JsonValue`] tree.
pub fn from_json<T: Mappable>(json: &JsonValue) -> Result<T, MapError> {
    from_json_with(json, &Policies::new())
}

pub fn from_json_with<T: Mappable>(json: &JsonValue, policies: &Policies) -> Result<T, MapError> {
    let mut de = JsonDeserializer::new(json);
    unmap_value(&mut de, policies)
}

/// Maps a value straight to compact JSON text without building a tree.
pub fn to_json_string<T: Mappable>(value: &T) -> Result<String, MapError> {
    to_json_string_with(value, &Policies::new())
}

pub fn to_json_string_with<T: Mappable>(
    value: &T,
    policies: &Policies,
) -> Result<String, MapError> {
    let mut ser = JsonTextSerializer::new();
    map_value(value, &mut ser, policies)?;
    Ok(ser.finish())
}

/// Parses JSON text and reads a value out of it.
pub fn from_json_str<T: Mappable>(text: &str) -> Result<T, MapError> {
    from_json_str_with(text, &Policies::new())
}

pub fn from_json_str_with<T: Mappable>(text: &str, policies: &Policies) -> Result<T, MapError> {
    let json = parse_json(text)?;
    from_json_with(&json, policies)
}
