//! JSON deserializer backend walking a [`JsonValue`] tree.
//!
//! Text input goes through the parser first; the tree walk is the single
//! decode path for both forms.

use dynval_core::{Deserializer, MapError, Scalar, ScalarKind};

use crate::value::JsonValue;

pub struct JsonDeserializer<'a> {
    current: &'a JsonValue,
}

impl<'a> JsonDeserializer<'a> {
    pub fn new(value: &'a JsonValue) -> JsonDeserializer<'a> {
        JsonDeserializer { current: value }
    }

    fn mismatch(&self, expected: &'static str) -> MapError {
        MapError::TypeMismatch {
            expected,
            found: self.current.type_name().to_owned(),
        }
    }
}

impl Deserializer for JsonDeserializer<'_> {
    fn supports(&self, kind: ScalarKind) -> bool {
        !matches!(
            kind,
            ScalarKind::Bytes
                | ScalarKind::ObjectId
                | ScalarKind::DateTime
                | ScalarKind::Timestamp
                | ScalarKind::Regex
        )
    }

    fn read_scalar(&mut self) -> Result<Scalar, MapError> {
        match self.current {
            JsonValue::Null => Ok(Scalar::Null),
            JsonValue::Bool(v) => Ok(Scalar::Bool(*v)),
            JsonValue::Int(v) => Ok(Scalar::Int64(*v)),
            JsonValue::BigInt(v) => Ok(Scalar::BigInt(v.clone())),
            JsonValue::Float(v) => Ok(Scalar::Float(*v)),
            JsonValue::Str(v) => Ok(Scalar::Str(v.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => Err(self.mismatch("scalar")),
        }
    }

    fn try_read_null(&mut self) -> Result<bool, MapError> {
        Ok(self.current.is_null())
    }

    fn read_dictionary(
        &mut self,
        entry: &mut dyn FnMut(&mut dyn Deserializer, &str) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        match self.current {
            JsonValue::Object(map) => {
                for (key, value) in map {
                    let mut child = JsonDeserializer::new(value);
                    entry(&mut child, key)?;
                }
                Ok(())
            }
            _ => Err(self.mismatch("dictionary")),
        }
    }

    fn read_array(
        &mut self,
        size_hint: &mut dyn FnMut(usize),
        element: &mut dyn FnMut(&mut dyn Deserializer) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        match self.current {
            JsonValue::Array(items) => {
                size_hint(items.len());
                for item in items {
                    let mut child = JsonDeserializer::new(item);
                    element(&mut child)?;
                }
                Ok(())
            }
            _ => Err(self.mismatch("array")),
        }
    }

    fn skip_value(&mut self) -> Result<(), MapError> {
        Ok(())
    }
}
