//! The JSON value tree.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::JsonError;

static NULL: JsonValue = JsonValue::Null;

/// A dynamically typed JSON value.
///
/// Numbers keep three distinct representations: `Int` for anything that
/// fits an `i64`, `BigInt` for integer literals beyond that, and `Float`
/// for values with a fractional or exponent part. Object member order is
/// insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JsonValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Array(Vec<JsonValue>),
    Object(IndexMap<String, JsonValue>),
}

impl JsonValue {
    /// Name of the active variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            JsonValue::Null => "null",
            JsonValue::Bool(_) => "bool",
            JsonValue::Int(_) => "integer",
            JsonValue::BigInt(_) => "bigint",
            JsonValue::Float(_) => "float",
            JsonValue::Str(_) => "string",
            JsonValue::Array(_) => "array",
            JsonValue::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsonValue::Null)
    }

    fn mismatch(&self, expected: &'static str) -> JsonError {
        JsonError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    // Strict accessors: the variant must match exactly.

    pub fn as_bool(&self) -> Result<bool, JsonError> {
        match self {
            JsonValue::Bool(v) => Ok(*v),
            other => Err(other.mismatch("bool")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, JsonError> {
        match self {
            JsonValue::Int(v) => Ok(*v),
            other => Err(other.mismatch("integer")),
        }
    }

    pub fn as_f64(&self) -> Result<f64, JsonError> {
        match self {
            JsonValue::Float(v) => Ok(*v),
            other => Err(other.mismatch("float")),
        }
    }

    pub fn as_str(&self) -> Result<&str, JsonError> {
        match self {
            JsonValue::Str(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }

    pub fn as_array(&self) -> Result<&[JsonValue], JsonError> {
        match self {
            JsonValue::Array(v) => Ok(v),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_array_mut(&mut self) -> Result<&mut Vec<JsonValue>, JsonError> {
        match self {
            JsonValue::Array(v) => Ok(v),
            other => Err(other.mismatch("array")),
        }
    }

    pub fn as_object(&self) -> Result<&IndexMap<String, JsonValue>, JsonError> {
        match self {
            JsonValue::Object(v) => Ok(v),
            other => Err(other.mismatch("object")),
        }
    }

    pub fn as_object_mut(&mut self) -> Result<&mut IndexMap<String, JsonValue>, JsonError> {
        match self {
            JsonValue::Object(v) => Ok(v),
            other => Err(other.mismatch("object")),
        }
    }

    // Coercing accessors.

    /// Truthiness: null and empty containers are false, numbers compare
    /// against zero, strings against the empty string.
    pub fn to_bool(&self) -> bool {
        match self {
            JsonValue::Null => false,
            JsonValue::Bool(v) => *v,
            JsonValue::Int(v) => *v != 0,
            JsonValue::BigInt(v) => *v != BigInt::from(0),
            JsonValue::Float(v) => *v != 0.0,
            JsonValue::Str(v) => !v.is_empty(),
            JsonValue::Array(v) => !v.is_empty(),
            JsonValue::Object(v) => !v.is_empty(),
        }
    }

    /// Numeric coercion to `i64`; floats truncate, numeric strings parse.
    pub fn to_i64(&self) -> Result<i64, JsonError> {
        match self {
            JsonValue::Bool(v) => Ok(*v as i64),
            JsonValue::Int(v) => Ok(*v),
            JsonValue::BigInt(v) => {
                i64::try_from(v).map_err(|_| self.mismatch("64-bit integer"))
            }
            JsonValue::Float(v) => Ok(*v as i64),
            JsonValue::Str(v) => v.parse().map_err(|_| self.mismatch("numeric string")),
            other => Err(other.mismatch("number")),
        }
    }

    /// Numeric coercion to `f64`; wide integers go through their decimal
    /// form and may lose precision.
    pub fn to_f64(&self) -> Result<f64, JsonError> {
        match self {
            JsonValue::Int(v) => Ok(*v as f64),
            JsonValue::BigInt(v) => v
                .to_string()
                .parse()
                .map_err(|_| self.mismatch("number")),
            JsonValue::Float(v) => Ok(*v),
            JsonValue::Str(v) => v.parse().map_err(|_| self.mismatch("numeric string")),
            other => Err(other.mismatch("number")),
        }
    }

    /// Textual form: scalars render unquoted, containers as compact JSON.
    pub fn to_text(&self) -> String {
        match self {
            JsonValue::Str(v) => v.clone(),
            other => other.to_string(),
        }
    }

    /// Number of elements, members or string bytes; scalars have length 0.
    pub fn len(&self) -> usize {
        match self {
            JsonValue::Str(v) => v.len(),
            JsonValue::Array(v) => v.len(),
            JsonValue::Object(v) => v.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Member lookup without the indexing sugar.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        match self {
            JsonValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    /// Inserts or replaces an object member. Panics on non-objects, like
    /// the index operators.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        match self {
            JsonValue::Object(map) => {
                map.insert(key.into(), value.into());
            }
            other => panic!("cannot insert into {}", other.type_name()),
        }
    }

    /// Removes an object member; removing a missing key or from a
    /// non-object is a no-op.
    pub fn remove(&mut self, key: &str) {
        if let JsonValue::Object(map) = self {
            map.shift_remove(key);
        }
    }

    /// Appends to an array. Panics on non-arrays.
    pub fn push(&mut self, value: impl Into<JsonValue>) {
        match self {
            JsonValue::Array(items) => items.push(value.into()),
            other => panic!("cannot push onto {}", other.type_name()),
        }
    }

    /// Iterates object members; empty for non-objects.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        let map = match self {
            JsonValue::Object(map) => Some(map),
            _ => None,
        };
        map.into_iter().flatten().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates array elements; empty for non-arrays.
    pub fn elements(&self) -> impl Iterator<Item = &JsonValue> {
        let items = match self {
            JsonValue::Array(items) => Some(items.as_slice()),
            _ => None,
        };
        items.into_iter().flatten()
    }

    /// Empty object constructor.
    pub fn object() -> JsonValue {
        JsonValue::Object(IndexMap::new())
    }

    /// Empty array constructor.
    pub fn array() -> JsonValue {
        JsonValue::Array(Vec::new())
    }
}

/// Missing members read as null.
impl Index<&str> for JsonValue {
    type Output = JsonValue;

    fn index(&self, key: &str) -> &JsonValue {
        self.get(key).unwrap_or(&NULL)
    }
}

/// Writing to a missing member inserts it; the value must already be an
/// object.
impl IndexMut<&str> for JsonValue {
    fn index_mut(&mut self, key: &str) -> &mut JsonValue {
        match self {
            JsonValue::Object(map) => map.entry(key.to_owned()).or_insert(JsonValue::Null),
            other => panic!("cannot index {} by key", other.type_name()),
        }
    }
}

/// Out-of-range elements read as null.
impl Index<usize> for JsonValue {
    type Output = JsonValue;

    fn index(&self, index: usize) -> &JsonValue {
        match self {
            JsonValue::Array(items) => items.get(index).unwrap_or(&NULL),
            _ => &NULL,
        }
    }
}

/// Writing past the end grows the array, padding with nulls.
impl IndexMut<usize> for JsonValue {
    fn index_mut(&mut self, index: usize) -> &mut JsonValue {
        match self {
            JsonValue::Array(items) => {
                if index >= items.len() {
                    items.resize(index + 1, JsonValue::Null);
                }
                &mut items[index]
            }
            other => panic!("cannot index {} by position", other.type_name()),
        }
    }
}

impl From<()> for JsonValue {
    fn from(_: ()) -> JsonValue {
        JsonValue::Null
    }
}

impl From<bool> for JsonValue {
    fn from(v: bool) -> JsonValue {
        JsonValue::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),+) => {$(
        impl From<$ty> for JsonValue {
            fn from(v: $ty) -> JsonValue {
                JsonValue::Int(v as i64)
            }
        }
    )+};
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for JsonValue {
    fn from(v: u64) -> JsonValue {
        match i64::try_from(v) {
            Ok(v) => JsonValue::Int(v),
            Err(_) => JsonValue::BigInt(BigInt::from(v)),
        }
    }
}

impl From<BigInt> for JsonValue {
    fn from(v: BigInt) -> JsonValue {
        // Normalize: small big-ints collapse into the i64 form.
        match i64::try_from(&v) {
            Ok(small) => JsonValue::Int(small),
            Err(_) => JsonValue::BigInt(v),
        }
    }
}

impl From<f64> for JsonValue {
    fn from(v: f64) -> JsonValue {
        JsonValue::Float(v)
    }
}

impl From<f32> for JsonValue {
    fn from(v: f32) -> JsonValue {
        JsonValue::Float(v as f64)
    }
}

impl From<&str> for JsonValue {
    fn from(v: &str) -> JsonValue {
        JsonValue::Str(v.to_owned())
    }
}

impl From<String> for JsonValue {
    fn from(v: String) -> JsonValue {
        JsonValue::Str(v)
    }
}

impl<T: Into<JsonValue>> From<Vec<T>> for JsonValue {
    fn from(items: Vec<T>) -> JsonValue {
        JsonValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, JsonValue>> for JsonValue {
    fn from(map: IndexMap<String, JsonValue>) -> JsonValue {
        JsonValue::Object(map)
    }
}

impl<T: Into<JsonValue>> FromIterator<T> for JsonValue {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> JsonValue {
        JsonValue::Array(iter.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for JsonValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> JsonValue {
        JsonValue::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Compact textual form.
impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::print::to_json_text(self))
    }
}

impl FromStr for JsonValue {
    type Err = JsonError;

    fn from_str(text: &str) -> Result<JsonValue, JsonError> {
        crate::parse::parse_json(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_accessors_name_both_sides() {
        let v = JsonValue::Str("x".to_owned());
        assert_eq!(
            v.as_i64(),
            Err(JsonError::TypeMismatch {
                expected: "integer",
                found: "string"
            })
        );
        assert_eq!(v.as_str().unwrap(), "x");
    }

    #[test]
    fn missing_members_read_as_null() {
        let v: JsonValue = [("a", JsonValue::from(1))].into_iter().collect();
        assert_eq!(v["a"], JsonValue::Int(1));
        assert!(v["missing"].is_null());
        assert!(v["a"][5].is_null());
    }

    #[test]
    fn index_writes_grow_containers() {
        let mut v = JsonValue::object();
        v["a"] = JsonValue::from(true);
        assert_eq!(v["a"], JsonValue::Bool(true));

        let mut arr = JsonValue::array();
        arr[2] = JsonValue::from("z");
        assert_eq!(arr.len(), 3);
        assert!(arr[0].is_null());
        assert_eq!(arr[2], JsonValue::Str("z".to_owned()));
    }

    #[test]
    fn remove_is_a_no_op_on_missing_keys() {
        let mut v: JsonValue = [("a", 1i64), ("b", 2i64)].into_iter().collect();
        v.remove("missing");
        v.remove("a");
        assert_eq!(v.len(), 1);
        assert!(v.get("b").is_some());
    }

    #[test]
    fn coercions() {
        assert_eq!(JsonValue::Float(3.9).to_i64().unwrap(), 3);
        assert_eq!(JsonValue::Str("12".to_owned()).to_i64().unwrap(), 12);
        assert!(JsonValue::Str("x".to_owned()).to_i64().is_err());
        assert!(!JsonValue::Null.to_bool());
        assert!(JsonValue::Int(-1).to_bool());
        assert_eq!(JsonValue::Int(5).to_text(), "5");
        assert_eq!(JsonValue::Str("raw".to_owned()).to_text(), "raw");
    }

    #[test]
    fn u64_and_bigint_normalize() {
        assert_eq!(JsonValue::from(7u64), JsonValue::Int(7));
        let wide = JsonValue::from(u64::MAX);
        assert!(matches!(wide, JsonValue::BigInt(_)));
        assert_eq!(
            JsonValue::from(BigInt::from(42)),
            JsonValue::Int(42)
        );
    }
}
