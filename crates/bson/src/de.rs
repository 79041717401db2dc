//! BSON deserializer backend.

use dynval_core::{Deserializer, MapError, Scalar, ScalarKind};

use crate::tag::Tag;
use crate::value::Bson;

/// Walks a parsed [`Bson`] value. Handles are cheap Arc-backed slices,
/// so descending clones no payload bytes.
pub struct BsonDeserializer {
    current: Bson,
}

impl BsonDeserializer {
    pub fn new(value: &Bson) -> BsonDeserializer {
        BsonDeserializer {
            current: value.clone(),
        }
    }
}

impl Deserializer for BsonDeserializer {
    fn supports(&self, kind: ScalarKind) -> bool {
        !matches!(kind, ScalarKind::BigInt)
    }

    fn read_scalar(&mut self) -> Result<Scalar, MapError> {
        let value = &self.current;
        Ok(match value.tag() {
            Tag::Double => Scalar::Float(value.as_f64()?),
            Tag::String | Tag::Code | Tag::Symbol => Scalar::Str(value.as_str()?.to_owned()),
            Tag::Bool => Scalar::Bool(value.as_bool()?),
            Tag::Int32 => Scalar::Int32(value.as_i32()?),
            Tag::Int64 => Scalar::Int64(value.as_i64()?),
            Tag::Date => Scalar::DateTime(value.as_date()?),
            Tag::Timestamp => Scalar::Timestamp(value.as_timestamp()?),
            Tag::ObjectId => Scalar::ObjectId(value.as_object_id()?),
            Tag::Binary => Scalar::Bytes(value.as_binary()?.1.to_vec()),
            Tag::Regex => Scalar::Regex(value.as_regex()?),
            Tag::Null | Tag::Undefined => Scalar::Null,
            Tag::Document | Tag::Array => {
                return Err(MapError::TypeMismatch {
                    expected: "scalar",
                    found: value.tag().type_name().to_owned(),
                })
            }
            other => {
                return Err(MapError::Unsupported(format!(
                    "cannot decode a {} element",
                    other.type_name()
                )))
            }
        })
    }

    fn try_read_null(&mut self) -> Result<bool, MapError> {
        Ok(self.current.is_null())
    }

    fn read_dictionary(
        &mut self,
        entry: &mut dyn FnMut(&mut dyn Deserializer, &str) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        for member in self.current.entries().map_err(MapError::from)? {
            let (key, value) = member?;
            let mut child = BsonDeserializer { current: value };
            entry(&mut child, &key)?;
        }
        Ok(())
    }

    fn read_array(
        &mut self,
        size_hint: &mut dyn FnMut(usize),
        element: &mut dyn FnMut(&mut dyn Deserializer) -> Result<(), MapError>,
    ) -> Result<(), MapError> {
        size_hint(self.current.element_count()?);
        for member in self.current.entries().map_err(MapError::from)? {
            let (_, value) = member?;
            let mut child = BsonDeserializer { current: value };
            element(&mut child)?;
        }
        Ok(())
    }

    fn skip_value(&mut self) -> Result<(), MapError> {
        // Elements are length-delimited; skipping is free.
        Ok(())
    }
}
