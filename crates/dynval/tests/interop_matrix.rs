use dynval::{
    bson_to_json, enumeration, from_bson, from_bson_with, from_json_str, from_json_str_with,
    json_to_bson, parse_json, record, to_bson, to_bson_with, to_json_string, to_json_string_with,
    to_json_text, Bson, DateTime, JsonValue, Policies,
};

enumeration! {
    enum Channel: i32 { Email = 1, Sms, Push }
}

record! {
    struct Contact {
        handle: String,
        by_name channel: Channel,
        optional verified: bool = false,
        ignore("wire") session: String,
        optional last_seen: Option<DateTime>,
    }
}

fn contact() -> Contact {
    Contact {
        handle: "ada@example.org".to_owned(),
        channel: Channel::Email,
        verified: true,
        session: "s3cr3t".to_owned(),
        last_seen: Some(DateTime(1_000)),
    }
}

#[test]
fn text_and_binary_pipelines_agree() {
    let cases = [
        r#"{"a":1,"b":[true,null,"x"],"c":{"d":2.5}}"#,
        r#"{"empty":{},"list":[]}"#,
        r#"[1,[2,[3,[4]]]]"#,
        r#"{"unicode":"héllo 🎉","neg":-2147483649}"#,
    ];

    for case in cases {
        let json = parse_json(case).unwrap_or_else(|e| panic!("parse failed for {case}: {e}"));
        let doc = json_to_bson(&json).unwrap_or_else(|e| panic!("to bson failed for {case}: {e}"));
        let reparsed = Bson::from_document_bytes(doc.document_bytes().unwrap().to_vec())
            .unwrap_or_else(|e| panic!("own wire bytes rejected for {case}: {e}"));
        let back = bson_to_json(&reparsed).unwrap();
        assert_eq!(to_json_text(&back), to_json_text(&json), "mismatch for {case}");
    }
}

#[test]
fn records_decode_identically_from_both_backends() {
    let value = contact();
    let text = to_json_string(&value).unwrap();
    let doc = to_bson(&value).unwrap();

    let from_text: Contact = from_json_str(&text).unwrap();
    let from_doc: Contact = from_bson(&doc).unwrap();
    assert_eq!(from_text, value);
    assert_eq!(from_doc, value);
}

#[test]
fn named_policy_set_suppresses_the_same_fields_everywhere() {
    let value = contact();
    let wire = Policies::named("wire");

    let text = to_json_string_with(&value, &wire).unwrap();
    assert!(!text.contains("session"));
    let doc = to_bson_with(&value, &wire).unwrap();
    assert!(doc.get("session").unwrap().is_none());

    // Decoding under the same policy set leaves the field defaulted.
    let from_text: Contact = from_json_str_with(&text, &wire).unwrap();
    let from_doc: Contact = from_bson_with(&doc, &wire).unwrap();
    assert_eq!(from_text.session, "");
    assert_eq!(from_doc.session, "");
    assert_eq!(from_text, from_doc);
}

#[test]
fn representation_policy_applies_on_both_backends() {
    let policies = Policies::new().represent::<DateTime, i64>(|d| d.0, DateTime);

    let value = contact();
    let text = to_json_string_with(&value, &policies).unwrap();
    let json = parse_json(&text).unwrap();
    assert_eq!(json["last_seen"], JsonValue::Int(1_000));

    let doc = to_bson_with(&value, &policies).unwrap();
    let member = doc.get("last_seen").unwrap().unwrap();
    assert_eq!(member.as_i64().unwrap(), 1_000);

    let back: Contact = from_bson_with(&doc, &policies).unwrap();
    assert_eq!(back.last_seen, Some(DateTime(1_000)));
}

#[test]
fn enum_names_and_discriminants_both_cross_the_wire() {
    let value = contact();
    let json = parse_json(&to_json_string(&value).unwrap()).unwrap();
    assert_eq!(json["channel"], JsonValue::Str("Email".to_owned()));

    record! {
        struct Numeric {
            channel: Channel,
        }
    }
    let numeric = Numeric { channel: Channel::Push };
    let doc = to_bson(&numeric).unwrap();
    assert_eq!(doc.get("channel").unwrap().unwrap().as_i32().unwrap(), 3);
    let back: Numeric = from_bson(&doc).unwrap();
    assert_eq!(back, numeric);
}
