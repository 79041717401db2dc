//! JSON serializer backends: one building a [`JsonValue`] tree, one
//! streaming text.

use dynval_core::{MapError, Scalar, ScalarKind, Serializer};
use indexmap::IndexMap;

use crate::print::{write_escaped, write_float};
use crate::value::JsonValue;

fn supports_kind(kind: ScalarKind) -> bool {
    !matches!(
        kind,
        ScalarKind::Bytes
            | ScalarKind::ObjectId
            | ScalarKind::DateTime
            | ScalarKind::Timestamp
            | ScalarKind::Regex
    )
}

fn scalar_to_json(value: Scalar) -> Result<JsonValue, MapError> {
    match value {
        Scalar::Null => Ok(JsonValue::Null),
        Scalar::Bool(v) => Ok(JsonValue::Bool(v)),
        Scalar::Int32(v) => Ok(JsonValue::Int(v as i64)),
        Scalar::Int64(v) => Ok(JsonValue::Int(v)),
        Scalar::UInt64(v) => Ok(JsonValue::from(v)),
        Scalar::BigInt(v) => Ok(JsonValue::from(v)),
        Scalar::Float(v) => Ok(JsonValue::Float(v)),
        Scalar::Str(v) => Ok(JsonValue::Str(v)),
        other => Err(MapError::Unsupported(format!(
            "JSON cannot carry a {} natively",
            other.type_name()
        ))),
    }
}

enum Frame {
    Array(Vec<JsonValue>),
    Object(IndexMap<String, JsonValue>, Option<String>),
}

/// Serializer producing a [`JsonValue`].
#[derive(Default)]
pub struct JsonTreeSerializer {
    stack: Vec<Frame>,
    root: Option<JsonValue>,
}

impl JsonTreeSerializer {
    pub fn new() -> JsonTreeSerializer {
        JsonTreeSerializer::default()
    }

    pub fn finish(self) -> Result<JsonValue, MapError> {
        self.root
            .ok_or_else(|| MapError::Unsupported("no value was produced".to_owned()))
    }

    fn put(&mut self, value: JsonValue) -> Result<(), MapError> {
        match self.stack.last_mut() {
            None => self.root = Some(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object(map, pending)) => {
                let key = pending.take().ok_or_else(|| {
                    MapError::Unsupported("dictionary value without a key".to_owned())
                })?;
                map.insert(key, value);
            }
        }
        Ok(())
    }
}

impl Serializer for JsonTreeSerializer {
    fn supports(&self, kind: ScalarKind) -> bool {
        supports_kind(kind)
    }

    fn write_scalar(&mut self, value: Scalar) -> Result<(), MapError> {
        let value = scalar_to_json(value)?;
        self.put(value)
    }

    fn begin_dictionary(&mut self) -> Result<(), MapError> {
        self.stack.push(Frame::Object(IndexMap::new(), None));
        Ok(())
    }

    fn begin_entry(&mut self, key: &str) -> Result<(), MapError> {
        match self.stack.last_mut() {
            Some(Frame::Object(_, pending)) => {
                *pending = Some(key.to_owned());
                Ok(())
            }
            _ => Err(MapError::Unsupported(
                "entry outside a dictionary".to_owned(),
            )),
        }
    }

    fn end_dictionary(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(Frame::Object(map, _)) => self.put(JsonValue::Object(map)),
            _ => Err(MapError::Unsupported(
                "unbalanced end of dictionary".to_owned(),
            )),
        }
    }

    fn begin_array(&mut self, _len: Option<usize>) -> Result<(), MapError> {
        self.stack.push(Frame::Array(Vec::new()));
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(Frame::Array(items)) => self.put(JsonValue::Array(items)),
            _ => Err(MapError::Unsupported("unbalanced end of array".to_owned())),
        }
    }
}

enum TextFrame {
    Array { first: bool },
    Object { first: bool },
}

/// Serializer streaming compact JSON text, never materializing a tree.
#[derive(Default)]
pub struct JsonTextSerializer {
    out: String,
    stack: Vec<TextFrame>,
}

impl JsonTextSerializer {
    pub fn new() -> JsonTextSerializer {
        JsonTextSerializer::default()
    }

    pub fn finish(self) -> String {
        self.out
    }

    /// Separator handling for array elements; object values were already
    /// introduced by their key.
    fn before_value(&mut self) {
        if let Some(TextFrame::Array { first }) = self.stack.last_mut() {
            if *first {
                *first = false;
            } else {
                self.out.push(',');
            }
        }
    }
}

impl Serializer for JsonTextSerializer {
    fn supports(&self, kind: ScalarKind) -> bool {
        supports_kind(kind)
    }

    fn write_scalar(&mut self, value: Scalar) -> Result<(), MapError> {
        use std::fmt::Write;

        self.before_value();
        match value {
            Scalar::Null => self.out.push_str("null"),
            Scalar::Bool(true) => self.out.push_str("true"),
            Scalar::Bool(false) => self.out.push_str("false"),
            Scalar::Int32(v) => {
                let _ = write!(self.out, "{v}");
            }
            Scalar::Int64(v) => {
                let _ = write!(self.out, "{v}");
            }
            Scalar::UInt64(v) => {
                let _ = write!(self.out, "{v}");
            }
            Scalar::BigInt(v) => {
                let _ = write!(self.out, "{v}");
            }
            Scalar::Float(v) => write_float(&mut self.out, v),
            Scalar::Str(v) => write_escaped(&mut self.out, &v),
            other => {
                return Err(MapError::Unsupported(format!(
                    "JSON cannot carry a {} natively",
                    other.type_name()
                )))
            }
        }
        Ok(())
    }

    fn begin_dictionary(&mut self) -> Result<(), MapError> {
        self.before_value();
        self.out.push('{');
        self.stack.push(TextFrame::Object { first: true });
        Ok(())
    }

    fn begin_entry(&mut self, key: &str) -> Result<(), MapError> {
        match self.stack.last_mut() {
            Some(TextFrame::Object { first }) => {
                if *first {
                    *first = false;
                } else {
                    self.out.push(',');
                }
            }
            _ => {
                return Err(MapError::Unsupported(
                    "entry outside a dictionary".to_owned(),
                ))
            }
        }
        write_escaped(&mut self.out, key);
        self.out.push(':');
        Ok(())
    }

    fn end_dictionary(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(TextFrame::Object { .. }) => {
                self.out.push('}');
                Ok(())
            }
            _ => Err(MapError::Unsupported(
                "unbalanced end of dictionary".to_owned(),
            )),
        }
    }

    fn begin_array(&mut self, _len: Option<usize>) -> Result<(), MapError> {
        self.before_value();
        self.out.push('[');
        self.stack.push(TextFrame::Array { first: true });
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(TextFrame::Array { .. }) => {
                self.out.push(']');
                Ok(())
            }
            _ => Err(MapError::Unsupported("unbalanced end of array".to_owned())),
        }
    }
}
