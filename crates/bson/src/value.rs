//! The BSON value handle.
//!
//! A [`Bson`] is a `(tag, buffer, range)` view into one immutable,
//! reference-counted byte buffer: navigating into a document or array
//! re-slices the shared buffer instead of copying, so walking a large
//! document allocates only for keys. Mutation is copy-on-write: `insert`
//! and `remove` produce a new document buffer with a recomputed length
//! prefix.

use std::fmt;
use std::sync::Arc;

use dynval_buffers::{Reader, Writer};
use dynval_core::{Bytes, DateTime, ObjectId, RegexValue, Timestamp};

use crate::error::BsonError;
use crate::tag::Tag;

#[derive(Clone)]
pub struct Bson {
    tag: Tag,
    buf: Arc<[u8]>,
    start: usize,
    end: usize,
}

impl Bson {
    /// Wraps a complete document. The length prefix and the trailing NUL
    /// are validated here; element payloads are validated lazily as they
    /// are visited.
    pub fn from_document_bytes(bytes: Vec<u8>) -> Result<Bson, BsonError> {
        let buf: Arc<[u8]> = bytes.into();
        validate_document(&buf, 0, buf.len())?;
        let end = buf.len();
        Ok(Bson {
            tag: Tag::Document,
            buf,
            start: 0,
            end,
        })
    }

    pub(crate) fn from_parts(tag: Tag, buf: Arc<[u8]>, start: usize, end: usize) -> Bson {
        Bson {
            tag,
            buf,
            start,
            end,
        }
    }

    /// Builds a standalone value from a tag and its wire bytes.
    pub(crate) fn from_value_bytes(tag: Tag, bytes: Vec<u8>) -> Bson {
        let end = bytes.len();
        Bson {
            tag,
            buf: bytes.into(),
            start: 0,
            end,
        }
    }

    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The value's wire bytes (tag and key excluded).
    pub fn value_bytes(&self) -> &[u8] {
        &self.buf[self.start..self.end]
    }

    fn reader(&self) -> Reader<'_> {
        Reader::from_slice(&self.buf, self.start, self.end)
    }

    fn mismatch(&self, expected: &'static str) -> BsonError {
        BsonError::TypeMismatch {
            expected,
            found: self.tag.type_name(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.tag, Tag::Null | Tag::Undefined)
    }

    pub fn as_f64(&self) -> Result<f64, BsonError> {
        match self.tag {
            Tag::Double => self
                .reader()
                .f64_le()
                .map_err(|e| BsonError::in_context(e, "double")),
            _ => Err(self.mismatch("double")),
        }
    }

    pub fn as_i32(&self) -> Result<i32, BsonError> {
        match self.tag {
            Tag::Int32 => self
                .reader()
                .i32_le()
                .map_err(|e| BsonError::in_context(e, "int32")),
            _ => Err(self.mismatch("int32")),
        }
    }

    pub fn as_i64(&self) -> Result<i64, BsonError> {
        match self.tag {
            Tag::Int64 => self
                .reader()
                .i64_le()
                .map_err(|e| BsonError::in_context(e, "int64")),
            _ => Err(self.mismatch("int64")),
        }
    }

    pub fn as_bool(&self) -> Result<bool, BsonError> {
        match self.tag {
            Tag::Bool => {
                let byte = self
                    .reader()
                    .u8()
                    .map_err(|e| BsonError::in_context(e, "bool"))?;
                Ok(byte != 0)
            }
            _ => Err(self.mismatch("bool")),
        }
    }

    /// String payload of string, code and symbol elements.
    pub fn as_str(&self) -> Result<&str, BsonError> {
        match self.tag {
            Tag::String | Tag::Code | Tag::Symbol => {
                let mut r = self.reader();
                let len = r
                    .i32_le()
                    .map_err(|e| BsonError::in_context(e, "string"))?;
                if len < 1 {
                    return Err(BsonError::BadLength("string"));
                }
                let text = r
                    .utf8(len as usize - 1)
                    .map_err(|e| BsonError::in_context(e, "string"))?;
                match r.u8() {
                    Ok(0) => Ok(text),
                    _ => Err(BsonError::Unterminated("string")),
                }
            }
            _ => Err(self.mismatch("string")),
        }
    }

    pub fn as_object_id(&self) -> Result<ObjectId, BsonError> {
        match self.tag {
            Tag::ObjectId => {
                let mut r = self.reader();
                let raw = r
                    .buf(12)
                    .map_err(|e| BsonError::in_context(e, "object-id"))?;
                let mut bytes = [0u8; 12];
                bytes.copy_from_slice(raw);
                Ok(ObjectId(bytes))
            }
            _ => Err(self.mismatch("object-id")),
        }
    }

    pub fn as_date(&self) -> Result<DateTime, BsonError> {
        match self.tag {
            Tag::Date => {
                let millis = self
                    .reader()
                    .i64_le()
                    .map_err(|e| BsonError::in_context(e, "date"))?;
                Ok(DateTime(millis))
            }
            _ => Err(self.mismatch("date")),
        }
    }

    pub fn as_timestamp(&self) -> Result<Timestamp, BsonError> {
        match self.tag {
            Tag::Timestamp => {
                let packed = self
                    .reader()
                    .u64_le()
                    .map_err(|e| BsonError::in_context(e, "timestamp"))?;
                Ok(Timestamp::from_packed(packed))
            }
            _ => Err(self.mismatch("timestamp")),
        }
    }

    /// Binary payload and its subtype byte.
    pub fn as_binary(&self) -> Result<(u8, &[u8]), BsonError> {
        match self.tag {
            Tag::Binary => {
                let mut r = self.reader();
                let len = r
                    .i32_le()
                    .map_err(|e| BsonError::in_context(e, "binary"))?;
                if len < 0 {
                    return Err(BsonError::BadLength("binary"));
                }
                let subtype = r.u8().map_err(|e| BsonError::in_context(e, "binary"))?;
                let data = r
                    .buf(len as usize)
                    .map_err(|e| BsonError::in_context(e, "binary"))?;
                Ok((subtype, data))
            }
            _ => Err(self.mismatch("binary")),
        }
    }

    pub fn as_regex(&self) -> Result<RegexValue, BsonError> {
        match self.tag {
            Tag::Regex => {
                let mut r = self.reader();
                let pattern = r.cstr().map_err(|e| BsonError::in_context(e, "regex"))?;
                let options = r.cstr().map_err(|e| BsonError::in_context(e, "regex"))?;
                Ok(RegexValue::new(pattern, options))
            }
            _ => Err(self.mismatch("regex")),
        }
    }

    // Best-effort coercions, for call sites that want conversion instead
    // of the strict `as_*` failure. `bson_to_json` remains the full
    // lossy-conversion path.

    /// Truthiness: null and undefined are false, numbers compare against
    /// zero, strings and containers against emptiness, anything else is
    /// present and true.
    pub fn to_bool(&self) -> bool {
        match self.tag {
            Tag::Null | Tag::Undefined => false,
            Tag::Bool => self.as_bool().unwrap_or(false),
            Tag::Int32 => self.as_i32().map(|v| v != 0).unwrap_or(false),
            Tag::Int64 => self.as_i64().map(|v| v != 0).unwrap_or(false),
            Tag::Double => self.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Tag::String | Tag::Code | Tag::Symbol => {
                self.as_str().map(|s| !s.is_empty()).unwrap_or(false)
            }
            Tag::Document | Tag::Array => {
                self.element_count().map(|n| n != 0).unwrap_or(false)
            }
            _ => true,
        }
    }

    /// Numeric coercion to `i64`; doubles truncate, numeric strings parse.
    pub fn to_i64(&self) -> Result<i64, BsonError> {
        match self.tag {
            Tag::Bool => Ok(self.as_bool()? as i64),
            Tag::Int32 => Ok(self.as_i32()? as i64),
            Tag::Int64 => self.as_i64(),
            Tag::Double => Ok(self.as_f64()? as i64),
            Tag::String | Tag::Code | Tag::Symbol => self
                .as_str()?
                .parse()
                .map_err(|_| self.mismatch("numeric string")),
            _ => Err(self.mismatch("number")),
        }
    }

    /// Numeric coercion to `f64`; numeric strings parse.
    pub fn to_f64(&self) -> Result<f64, BsonError> {
        match self.tag {
            Tag::Int32 => Ok(self.as_i32()? as f64),
            Tag::Int64 => Ok(self.as_i64()? as f64),
            Tag::Double => self.as_f64(),
            Tag::String | Tag::Code | Tag::Symbol => self
                .as_str()?
                .parse()
                .map_err(|_| self.mismatch("numeric string")),
            _ => Err(self.mismatch("number")),
        }
    }

    /// Textual form: strings render unquoted, the binary-only types in
    /// their canonical text form, everything else as compact JSON.
    /// Malformed payloads render empty.
    pub fn to_text(&self) -> String {
        match self.tag {
            Tag::String | Tag::Code | Tag::Symbol => {
                self.as_str().map(str::to_owned).unwrap_or_default()
            }
            Tag::ObjectId => self.as_object_id().map(|id| id.to_hex()).unwrap_or_default(),
            Tag::Date => self.as_date().map(|d| d.to_iso_string()).unwrap_or_default(),
            Tag::Regex => self.as_regex().map(|r| r.to_string()).unwrap_or_default(),
            Tag::Binary => self
                .as_binary()
                .map(|(_, data)| Bytes(data.to_vec()).to_base64())
                .unwrap_or_default(),
            _ => crate::convert::bson_to_json(self)
                .map(|json| json.to_string())
                .unwrap_or_default(),
        }
    }

    /// Iterates document or array members. Array keys are the decimal
    /// element indices, as stored on the wire.
    pub fn entries(&self) -> Result<DocumentIter, BsonError> {
        match self.tag {
            Tag::Document | Tag::Array => {
                let mut r = self.reader();
                let len = r
                    .i32_le()
                    .map_err(|e| BsonError::in_context(e, "document"))?;
                if len < 5 || self.start + len as usize > self.end {
                    return Err(BsonError::BadLength("document"));
                }
                Ok(DocumentIter {
                    buf: Arc::clone(&self.buf),
                    pos: self.start + 4,
                    end: self.start + len as usize,
                    done: false,
                })
            }
            _ => Err(self.mismatch("document")),
        }
    }

    /// Member lookup by key; `Ok(None)` when absent.
    pub fn get(&self, key: &str) -> Result<Option<Bson>, BsonError> {
        for entry in self.entries()? {
            let (k, v) = entry?;
            if k == key {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    /// Number of members; walks the document.
    pub fn element_count(&self) -> Result<usize, BsonError> {
        let mut n = 0;
        for entry in self.entries()? {
            entry?;
            n += 1;
        }
        Ok(n)
    }

    /// Full wire bytes of a document or array, length prefix included.
    pub fn document_bytes(&self) -> Result<&[u8], BsonError> {
        match self.tag {
            Tag::Document | Tag::Array => Ok(self.value_bytes()),
            _ => Err(self.mismatch("document")),
        }
    }

    /// Returns a new document with `key` set to `value`, replacing any
    /// existing member of that name in place (position preserved).
    pub fn insert(&self, key: &str, value: &Bson) -> Result<Bson, BsonError> {
        if key.as_bytes().contains(&0) {
            return Err(BsonError::InvalidKey(key.to_owned()));
        }
        let mut body = Writer::new();
        let mut replaced = false;
        for entry in self.entries()? {
            let (k, v) = entry?;
            if k == key {
                write_element(&mut body, key, value);
                replaced = true;
            } else {
                write_element(&mut body, &k, &v);
            }
        }
        if !replaced {
            write_element(&mut body, key, value);
        }
        Ok(seal_document(self.tag, body))
    }

    /// Returns a new document without `key`; a no-op copy if absent.
    pub fn remove(&self, key: &str) -> Result<Bson, BsonError> {
        let mut body = Writer::new();
        for entry in self.entries()? {
            let (k, v) = entry?;
            if k != key {
                write_element(&mut body, &k, &v);
            }
        }
        Ok(seal_document(self.tag, body))
    }

    // Standalone scalar constructors, mostly used to build values for
    // `insert`.

    pub fn null() -> Bson {
        Bson::from_value_bytes(Tag::Null, Vec::new())
    }

    pub fn boolean(v: bool) -> Bson {
        Bson::from_value_bytes(Tag::Bool, vec![v as u8])
    }

    pub fn int32(v: i32) -> Bson {
        Bson::from_value_bytes(Tag::Int32, v.to_le_bytes().to_vec())
    }

    pub fn int64(v: i64) -> Bson {
        Bson::from_value_bytes(Tag::Int64, v.to_le_bytes().to_vec())
    }

    pub fn double(v: f64) -> Bson {
        Bson::from_value_bytes(Tag::Double, v.to_le_bytes().to_vec())
    }

    pub fn string(v: &str) -> Bson {
        let mut w = Writer::with_capacity(v.len() + 5);
        w.i32_le(v.len() as i32 + 1);
        w.bytes(v.as_bytes());
        w.u8(0);
        Bson::from_value_bytes(Tag::String, w.flush())
    }

    pub fn binary(subtype: u8, data: &[u8]) -> Bson {
        let mut w = Writer::with_capacity(data.len() + 5);
        w.i32_le(data.len() as i32);
        w.u8(subtype);
        w.bytes(data);
        Bson::from_value_bytes(Tag::Binary, w.flush())
    }

    pub fn object_id(id: ObjectId) -> Bson {
        Bson::from_value_bytes(Tag::ObjectId, id.0.to_vec())
    }

    pub fn date(v: DateTime) -> Bson {
        Bson::from_value_bytes(Tag::Date, v.0.to_le_bytes().to_vec())
    }

    pub fn timestamp(v: Timestamp) -> Bson {
        Bson::from_value_bytes(Tag::Timestamp, v.packed().to_le_bytes().to_vec())
    }

    pub fn regex(v: &RegexValue) -> Bson {
        let mut w = Writer::new();
        w.cstr(&v.pattern);
        w.cstr(&v.options);
        Bson::from_value_bytes(Tag::Regex, w.flush())
    }
}

/// Appends one `tag key value` element to a document body.
pub(crate) fn write_element(body: &mut Writer, key: &str, value: &Bson) {
    body.u8(value.tag() as u8);
    body.cstr(key);
    body.bytes(value.value_bytes());
}

/// Wraps a finished element body into `[len][body][0]`.
pub(crate) fn seal_document(tag: Tag, body: Writer) -> Bson {
    let body = {
        let mut w = body;
        w.flush()
    };
    let mut w = Writer::with_capacity(body.len() + 5);
    w.i32_le(body.len() as i32 + 5);
    w.bytes(&body);
    w.u8(0);
    Bson::from_value_bytes(tag, w.flush())
}

fn validate_document(buf: &[u8], start: usize, end: usize) -> Result<(), BsonError> {
    let mut r = Reader::from_slice(buf, start, end);
    let len = r
        .i32_le()
        .map_err(|e| BsonError::in_context(e, "document"))?;
    if len < 5 || start + len as usize != end {
        return Err(BsonError::BadLength("document"));
    }
    if buf[end - 1] != 0 {
        return Err(BsonError::Unterminated("document"));
    }
    Ok(())
}

/// Computes the end offset of a value of the given tag starting at
/// `start`, without interpreting its payload.
pub(crate) fn value_end(
    tag: Tag,
    buf: &[u8],
    start: usize,
    limit: usize,
) -> Result<usize, BsonError> {
    let mut r = Reader::from_slice(buf, start, limit);
    let fixed = |size: usize| -> Result<usize, BsonError> {
        if start + size > limit {
            return Err(BsonError::Unterminated("element"));
        }
        Ok(start + size)
    };
    match tag {
        Tag::Null | Tag::Undefined | Tag::MinKey | Tag::MaxKey => Ok(start),
        Tag::Bool => fixed(1),
        Tag::Int32 => fixed(4),
        Tag::Double | Tag::Date | Tag::Int64 | Tag::Timestamp => fixed(8),
        Tag::ObjectId => fixed(12),
        Tag::Decimal128 => fixed(16),
        Tag::String | Tag::Code | Tag::Symbol => {
            let len = r
                .i32_le()
                .map_err(|e| BsonError::in_context(e, "string"))?;
            if len < 1 {
                return Err(BsonError::BadLength("string"));
            }
            fixed(4 + len as usize)
        }
        Tag::Binary => {
            let len = r
                .i32_le()
                .map_err(|e| BsonError::in_context(e, "binary"))?;
            if len < 0 {
                return Err(BsonError::BadLength("binary"));
            }
            fixed(5 + len as usize)
        }
        Tag::Document | Tag::Array | Tag::CodeWithScope => {
            let len = r
                .i32_le()
                .map_err(|e| BsonError::in_context(e, "document"))?;
            if len < 5 {
                return Err(BsonError::BadLength("document"));
            }
            fixed(len as usize)
        }
        Tag::Regex => {
            r.cstr().map_err(|e| BsonError::in_context(e, "regex"))?;
            r.cstr().map_err(|e| BsonError::in_context(e, "regex"))?;
            Ok(r.x)
        }
        Tag::DbPointer => {
            let len = r
                .i32_le()
                .map_err(|e| BsonError::in_context(e, "db-pointer"))?;
            if len < 1 {
                return Err(BsonError::BadLength("db-pointer"));
            }
            fixed(4 + len as usize + 12)
        }
    }
}

/// Iterator over document members; yields owned keys and re-sliced
/// value handles.
pub struct DocumentIter {
    buf: Arc<[u8]>,
    pos: usize,
    end: usize,
    done: bool,
}

impl Iterator for DocumentIter {
    type Item = Result<(String, Bson), BsonError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let mut r = Reader::from_slice(&self.buf, self.pos, self.end);
        let tag_byte = match r.u8() {
            Ok(b) => b,
            Err(_) => {
                self.done = true;
                return Some(Err(BsonError::Unterminated("document")));
            }
        };
        if tag_byte == 0 {
            self.done = true;
            if r.x != self.end {
                return Some(Err(BsonError::Unterminated("document")));
            }
            return None;
        }
        let tag = match Tag::from_u8(tag_byte) {
            Ok(tag) => tag,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        let key = match r.cstr() {
            Ok(key) => key.to_owned(),
            Err(e) => {
                self.done = true;
                return Some(Err(BsonError::in_context(e, "key")));
            }
        };
        let value_start = r.x;
        let end = match value_end(tag, &self.buf, value_start, self.end) {
            Ok(end) => end,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.pos = end;
        Some(Ok((
            key,
            Bson::from_parts(tag, Arc::clone(&self.buf), value_start, end),
        )))
    }
}

impl PartialEq for Bson {
    fn eq(&self, other: &Bson) -> bool {
        self.tag == other.tag && self.value_bytes() == other.value_bytes()
    }
}

impl fmt::Debug for Bson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bson")
            .field("tag", &self.tag)
            .field("bytes", &self.value_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // {"a": 1} in wire form.
    fn tiny_doc() -> Vec<u8> {
        vec![12, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0]
    }

    #[test]
    fn document_navigation_shares_the_buffer() {
        let doc = Bson::from_document_bytes(tiny_doc()).unwrap();
        let a = doc.get("a").unwrap().unwrap();
        assert_eq!(a.tag(), Tag::Int32);
        assert_eq!(a.as_i32().unwrap(), 1);
        assert_eq!(doc.element_count().unwrap(), 1);
        assert!(doc.get("b").unwrap().is_none());
    }

    #[test]
    fn prefix_and_terminator_are_validated() {
        assert!(Bson::from_document_bytes(vec![5, 0, 0, 0]).is_err());
        let mut wrong_len = tiny_doc();
        wrong_len[0] = 99;
        assert!(Bson::from_document_bytes(wrong_len).is_err());
        let mut no_nul = tiny_doc();
        no_nul[11] = 7;
        assert!(Bson::from_document_bytes(no_nul).is_err());
    }

    #[test]
    fn truncated_string_payload_is_caught_lazily() {
        // Declares a 10-byte string but the document ends first.
        let bytes = vec![
            14, 0, 0, 0, 0x02, b's', 0, 10, 0, 0, 0, b'h', b'i', 0,
        ];
        let doc = Bson::from_document_bytes(bytes).unwrap();
        let err = doc.get("s").unwrap_err();
        assert!(matches!(
            err,
            BsonError::Unterminated(_) | BsonError::BadLength(_)
        ));
    }

    #[test]
    fn insert_replaces_in_place_and_appends_otherwise() {
        let doc = Bson::from_document_bytes(tiny_doc()).unwrap();
        let doc = doc.insert("b", &Bson::string("x")).unwrap();
        let doc = doc.insert("a", &Bson::int64(9)).unwrap();

        let keys: Vec<String> = doc
            .entries()
            .unwrap()
            .map(|e| e.unwrap().0)
            .collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(doc.get("a").unwrap().unwrap().as_i64().unwrap(), 9);
        assert_eq!(doc.get("b").unwrap().unwrap().as_str().unwrap(), "x");

        // The rebuilt prefix must still parse from raw bytes.
        let reparsed = Bson::from_document_bytes(doc.document_bytes().unwrap().to_vec()).unwrap();
        assert_eq!(reparsed.element_count().unwrap(), 2);
    }

    #[test]
    fn remove_is_a_no_op_on_missing_keys() {
        let doc = Bson::from_document_bytes(tiny_doc()).unwrap();
        let same = doc.remove("zz").unwrap();
        assert_eq!(same, doc);
        let empty = doc.remove("a").unwrap();
        assert_eq!(empty.element_count().unwrap(), 0);
        assert_eq!(empty.document_bytes().unwrap(), &[5, 0, 0, 0, 0]);
    }

    #[test]
    fn scalar_constructors_roundtrip() {
        assert_eq!(Bson::string("hé").as_str().unwrap(), "hé");
        assert_eq!(Bson::int32(-5).as_i32().unwrap(), -5);
        assert_eq!(Bson::double(1.5).as_f64().unwrap(), 1.5);
        assert!(Bson::boolean(true).as_bool().unwrap());
        let (subtype, data) = Bson::binary(0, &[1, 2]).as_binary().map(|(s, d)| (s, d.to_vec())).unwrap();
        assert_eq!((subtype, data), (0u8, vec![1, 2]));
        let re = RegexValue::new("^a+", "i");
        assert_eq!(Bson::regex(&re).as_regex().unwrap(), re);
        let ts = Timestamp { time: 9, increment: 2 };
        assert_eq!(Bson::timestamp(ts).as_timestamp().unwrap(), ts);
    }

    #[test]
    fn coercing_accessors() {
        assert!(!Bson::null().to_bool());
        assert!(!Bson::string("").to_bool());
        assert!(Bson::string("x").to_bool());
        assert!(Bson::int32(7).to_bool());
        assert!(!Bson::double(0.0).to_bool());

        assert_eq!(Bson::int32(7).to_i64().unwrap(), 7);
        assert_eq!(Bson::boolean(true).to_i64().unwrap(), 1);
        assert_eq!(Bson::double(2.9).to_i64().unwrap(), 2);
        assert_eq!(Bson::string("8").to_i64().unwrap(), 8);
        assert!(Bson::string("eight").to_i64().is_err());
        assert!(Bson::null().to_i64().is_err());

        assert_eq!(Bson::int64(3).to_f64().unwrap(), 3.0);
        assert_eq!(Bson::string("1.5").to_f64().unwrap(), 1.5);
        assert!(Bson::boolean(true).to_f64().is_err());

        assert_eq!(Bson::string("plain").to_text(), "plain");
        assert_eq!(Bson::int32(42).to_text(), "42");
        let doc = Bson::from_document_bytes(tiny_doc()).unwrap();
        assert_eq!(doc.to_text(), r#"{"a":1}"#);
        assert!(doc.to_bool());
    }
}
