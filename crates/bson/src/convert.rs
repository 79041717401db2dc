//! Direct BSON / JSON value conversion.
//!
//! The binary model is richer than the text one, so `bson_to_json` is
//! lossy in the usual ways: object-ids become hex strings, binary
//! payloads become base64 strings, dates become ISO-8601 strings and
//! timestamps become their packed integer form.

use dynval_buffers::Writer;
use dynval_core::Bytes;
use dynval_json::JsonValue;
use indexmap::IndexMap;

use crate::error::BsonError;
use crate::tag::Tag;
use crate::value::{seal_document, write_element, Bson};

pub fn bson_to_json(value: &Bson) -> Result<JsonValue, BsonError> {
    Ok(match value.tag() {
        Tag::Double => JsonValue::Float(value.as_f64()?),
        Tag::String | Tag::Code | Tag::Symbol => JsonValue::Str(value.as_str()?.to_owned()),
        Tag::Document => {
            let mut members = IndexMap::new();
            for entry in value.entries()? {
                let (key, member) = entry?;
                members.insert(key, bson_to_json(&member)?);
            }
            JsonValue::Object(members)
        }
        Tag::Array => {
            let mut elements = Vec::new();
            for entry in value.entries()? {
                let (_, element) = entry?;
                elements.push(bson_to_json(&element)?);
            }
            JsonValue::Array(elements)
        }
        Tag::Binary => {
            let (_, data) = value.as_binary()?;
            JsonValue::Str(Bytes(data.to_vec()).to_base64())
        }
        Tag::ObjectId => JsonValue::Str(value.as_object_id()?.to_hex()),
        Tag::Bool => JsonValue::Bool(value.as_bool()?),
        Tag::Date => JsonValue::Str(value.as_date()?.to_iso_string()),
        Tag::Regex => JsonValue::Str(value.as_regex()?.to_string()),
        Tag::Int32 => JsonValue::Int(value.as_i32()? as i64),
        Tag::Int64 => JsonValue::Int(value.as_i64()?),
        Tag::Timestamp => JsonValue::from(value.as_timestamp()?.packed()),
        Tag::Null | Tag::Undefined | Tag::MinKey | Tag::MaxKey => JsonValue::Null,
        other => {
            return Err(BsonError::TypeMismatch {
                expected: "convertible element",
                found: other.type_name(),
            })
        }
    })
}

pub fn json_to_bson(value: &JsonValue) -> Result<Bson, BsonError> {
    Ok(match value {
        JsonValue::Null => Bson::null(),
        JsonValue::Bool(v) => Bson::boolean(*v),
        JsonValue::Int(v) => match i32::try_from(*v) {
            Ok(v) => Bson::int32(v),
            Err(_) => Bson::int64(*v),
        },
        // No native arbitrary-precision element; carried as decimal text.
        JsonValue::BigInt(v) => Bson::string(&v.to_string()),
        JsonValue::Float(v) => Bson::double(*v),
        JsonValue::Str(v) => Bson::string(v),
        JsonValue::Array(elements) => {
            let mut body = Writer::new();
            for (index, element) in elements.iter().enumerate() {
                write_element(&mut body, &index.to_string(), &json_to_bson(element)?);
            }
            seal_document(Tag::Array, body)
        }
        JsonValue::Object(members) => {
            let mut body = Writer::new();
            for (key, member) in members {
                if key.as_bytes().contains(&0) {
                    return Err(BsonError::InvalidKey(key.clone()));
                }
                write_element(&mut body, key, &json_to_bson(member)?);
            }
            seal_document(Tag::Document, body)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynval_json::parse_json;

    #[test]
    fn json_document_roundtrips_through_bson() {
        let json = parse_json(r#"{"name":"mir","hp":32,"mask":[1,2,{"deep":true}],"gone":null}"#)
            .unwrap();
        let bson = json_to_bson(&json).unwrap();
        assert_eq!(bson.tag(), Tag::Document);
        assert_eq!(bson_to_json(&bson).unwrap(), json);
    }

    #[test]
    fn integer_width_follows_magnitude() {
        let small = json_to_bson(&JsonValue::Int(7)).unwrap();
        assert_eq!(small.tag(), Tag::Int32);
        let wide = json_to_bson(&JsonValue::Int(1 << 40)).unwrap();
        assert_eq!(wide.tag(), Tag::Int64);
        assert_eq!(wide.as_i64().unwrap(), 1 << 40);
    }

    #[test]
    fn big_integers_become_decimal_text() {
        let json = parse_json("123456789012345678901234567").unwrap();
        assert!(matches!(json, JsonValue::BigInt(_)));
        let bson = json_to_bson(&json).unwrap();
        assert_eq!(bson.as_str().unwrap(), "123456789012345678901234567");
    }

    #[test]
    fn lossy_tags_collapse_to_text_or_null() {
        let oid = dynval_core::ObjectId([0xab; 12]);
        assert_eq!(
            bson_to_json(&Bson::object_id(oid)).unwrap(),
            JsonValue::Str("ab".repeat(12))
        );
        assert_eq!(
            bson_to_json(&Bson::binary(0, &[1, 2, 3])).unwrap(),
            JsonValue::Str("AQID".to_owned())
        );
        assert_eq!(bson_to_json(&Bson::null()).unwrap(), JsonValue::Null);
    }

    #[test]
    fn nul_bytes_in_keys_are_rejected() {
        let mut members = IndexMap::new();
        members.insert("a\0b".to_owned(), JsonValue::Int(1));
        let err = json_to_bson(&JsonValue::Object(members)).unwrap_err();
        assert!(matches!(err, BsonError::InvalidKey(_)));
    }
}
