//! BSON serializer backend.
//!
//! Elements are streamed into per-document body buffers; a document's
//! length prefix is only known once it closes, at which point the body
//! is sealed and written into its parent as a single element.

use dynval_buffers::Writer;
use dynval_core::{MapError, Scalar, ScalarKind, Serializer};

use crate::error::BsonError;
use crate::tag::Tag;
use crate::value::{seal_document, write_element, Bson};

enum Frame {
    Document { body: Writer, pending: Option<String> },
    Array { body: Writer, index: usize },
}

#[derive(Default)]
pub struct BsonSerializer {
    stack: Vec<Frame>,
    root: Option<Bson>,
}

impl BsonSerializer {
    pub fn new() -> BsonSerializer {
        BsonSerializer::default()
    }

    /// The finished value. A document root is the common case, but a
    /// scalar root is a valid outcome of mapping a scalar type.
    pub fn finish(self) -> Result<Bson, MapError> {
        self.root
            .ok_or_else(|| MapError::Unsupported("no value was produced".to_owned()))
    }

    fn place(&mut self, value: Bson) -> Result<(), MapError> {
        match self.stack.last_mut() {
            None => self.root = Some(value),
            Some(Frame::Document { body, pending }) => {
                let key = pending.take().ok_or_else(|| {
                    MapError::Unsupported("dictionary value without a key".to_owned())
                })?;
                write_element(body, &key, &value);
            }
            Some(Frame::Array { body, index }) => {
                // Array keys are decimal indices and the wire caps them
                // at i32 range.
                if *index > i32::MAX as usize {
                    return Err(MapError::Unsupported(
                        "array exceeds the index range".to_owned(),
                    ));
                }
                write_element(body, &index.to_string(), &value);
                *index += 1;
            }
        }
        Ok(())
    }
}

fn scalar_to_bson(value: Scalar) -> Result<Bson, MapError> {
    Ok(match value {
        Scalar::Null => Bson::null(),
        Scalar::Bool(v) => Bson::boolean(v),
        Scalar::Int32(v) => Bson::int32(v),
        Scalar::Int64(v) => Bson::int64(v),
        Scalar::UInt64(v) => match i64::try_from(v) {
            Ok(v) => Bson::int64(v),
            Err(_) => {
                return Err(MapError::Overflow {
                    value: v.to_string(),
                    target: "int64",
                })
            }
        },
        Scalar::Float(v) => Bson::double(v),
        Scalar::Str(v) => Bson::string(&v),
        Scalar::Bytes(v) => Bson::binary(0x00, &v),
        Scalar::ObjectId(v) => Bson::object_id(v),
        Scalar::DateTime(v) => Bson::date(v),
        Scalar::Timestamp(v) => Bson::timestamp(v),
        Scalar::Regex(v) => Bson::regex(&v),
        Scalar::BigInt(v) => {
            return Err(MapError::Unsupported(format!(
                "BSON cannot carry the arbitrary-precision integer {v} natively"
            )))
        }
    })
}

impl Serializer for BsonSerializer {
    fn supports(&self, kind: ScalarKind) -> bool {
        !matches!(kind, ScalarKind::BigInt)
    }

    fn write_scalar(&mut self, value: Scalar) -> Result<(), MapError> {
        let value = scalar_to_bson(value)?;
        self.place(value)
    }

    fn begin_dictionary(&mut self) -> Result<(), MapError> {
        self.stack.push(Frame::Document {
            body: Writer::new(),
            pending: None,
        });
        Ok(())
    }

    fn begin_entry(&mut self, key: &str) -> Result<(), MapError> {
        if key.as_bytes().contains(&0) {
            return Err(BsonError::InvalidKey(key.to_owned()).into());
        }
        match self.stack.last_mut() {
            Some(Frame::Document { pending, .. }) => {
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
            Some(Frame::Document { body, .. }) => {
                let doc = seal_document(Tag::Document, body);
                self.place(doc)
            }
            _ => Err(MapError::Unsupported(
                "unbalanced end of dictionary".to_owned(),
            )),
        }
    }

    fn begin_array(&mut self, _len: Option<usize>) -> Result<(), MapError> {
        self.stack.push(Frame::Array {
            body: Writer::new(),
            index: 0,
        });
        Ok(())
    }

    fn end_array(&mut self) -> Result<(), MapError> {
        match self.stack.pop() {
            Some(Frame::Array { body, .. }) => {
                let arr = seal_document(Tag::Array, body);
                self.place(arr)
            }
            _ => Err(MapError::Unsupported("unbalanced end of array".to_owned())),
        }
    }
}
