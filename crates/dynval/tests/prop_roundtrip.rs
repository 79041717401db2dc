use dynval::{bson_to_json, json_to_bson, parse_json, to_json_text, JsonValue};
use proptest::prelude::*;

fn json_value() -> impl Strategy<Value = JsonValue> {
    let leaf = prop_oneof![
        Just(JsonValue::Null),
        any::<bool>().prop_map(JsonValue::Bool),
        any::<i64>().prop_map(JsonValue::Int),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(JsonValue::Float),
        ".{0,24}".prop_map(JsonValue::Str),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(JsonValue::Array),
            prop::collection::vec(("[a-zA-Z0-9_]{0,10}", inner), 0..6).prop_map(|members| {
                JsonValue::Object(members.into_iter().collect())
            }),
        ]
    })
}

proptest! {
    /// Printing and reparsing any finite value tree is lossless.
    #[test]
    fn text_roundtrip_is_lossless(value in json_value()) {
        let text = to_json_text(&value);
        let back = parse_json(&text)
            .unwrap_or_else(|e| panic!("reparse failed for {text}: {e}"));
        prop_assert_eq!(back, value);
    }

    /// Our output stays inside what serde_json accepts.
    #[test]
    fn printed_text_is_valid_json(value in json_value()) {
        let text = to_json_text(&value);
        serde_json::from_str::<serde_json::Value>(&text)
            .unwrap_or_else(|e| panic!("serde_json rejected {text}: {e}"));
    }

    /// The JSON-expressible subset converts to BSON and back untouched.
    #[test]
    fn bson_conversion_roundtrips(value in json_value()) {
        let doc = json_to_bson(&value).unwrap();
        let back = bson_to_json(&doc).unwrap();
        prop_assert_eq!(back, value);
    }
}

#[test]
fn huge_integers_keep_every_digit() {
    let text = "123456789012345678901234567";
    let value = parse_json(text).unwrap();
    assert!(matches!(value, JsonValue::BigInt(_)));
    assert_eq!(to_json_text(&value), text);
}
