//! JSON printer.
//!
//! Floats print through Rust's shortest round-trippable form, so
//! `1.0` stays `1.0` and survives a reparse as a float; non-finite
//! floats have no JSON form and print as `null`. `</` is escaped to
//! `<\/` so output can be embedded in HTML script blocks.

use std::fmt::Write;

use crate::value::JsonValue;

/// Compact form, no insignificant whitespace.
pub fn to_json_text(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, None);
    out
}

/// Indented form, one tab per nesting level.
pub fn to_pretty_json_text(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value, Some(0));
    out
}

fn write_value(out: &mut String, value: &JsonValue, indent: Option<usize>) {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Int(v) => {
            let _ = write!(out, "{v}");
        }
        JsonValue::BigInt(v) => {
            let _ = write!(out, "{v}");
        }
        JsonValue::Float(v) => write_float(out, *v),
        JsonValue::Str(v) => write_escaped(out, v),
        JsonValue::Array(items) => {
            if items.is_empty() {
                out.push_str("[]");
                return;
            }
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_indent(out, indent.map(|n| n + 1));
                write_value(out, item, indent.map(|n| n + 1));
            }
            newline_indent(out, indent);
            out.push(']');
        }
        JsonValue::Object(map) => {
            if map.is_empty() {
                out.push_str("{}");
                return;
            }
            out.push('{');
            for (i, (key, member)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                newline_indent(out, indent.map(|n| n + 1));
                write_escaped(out, key);
                out.push(':');
                if indent.is_some() {
                    out.push(' ');
                }
                write_value(out, member, indent.map(|n| n + 1));
            }
            newline_indent(out, indent);
            out.push('}');
        }
    }
}

fn newline_indent(out: &mut String, indent: Option<usize>) {
    if let Some(level) = indent {
        out.push('\n');
        for _ in 0..level {
            out.push('\t');
        }
    }
}

pub(crate) fn write_float(out: &mut String, v: f64) {
    if v.is_finite() {
        let _ = write!(out, "{v:?}");
    } else {
        out.push_str("null");
    }
}

pub(crate) fn write_escaped(out: &mut String, text: &str) {
    out.push('"');
    let mut prev = '\0';
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '/' if prev == '<' => out.push_str("\\/"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
        prev = c;
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_json;

    #[test]
    fn compact_form() {
        let v = parse_json(r#"{ "a": [1, true, "x"], "b": {} }"#).unwrap();
        assert_eq!(to_json_text(&v), r#"{"a":[1,true,"x"],"b":{}}"#);
    }

    #[test]
    fn floats_reparse_as_floats() {
        assert_eq!(to_json_text(&JsonValue::Float(1.0)), "1.0");
        assert_eq!(to_json_text(&JsonValue::Float(0.1)), "0.1");
        assert_eq!(to_json_text(&JsonValue::Float(f64::NAN)), "null");
        assert_eq!(to_json_text(&JsonValue::Float(f64::INFINITY)), "null");
    }

    #[test]
    fn script_safe_escaping() {
        let v = JsonValue::Str("</script>".to_owned());
        assert_eq!(to_json_text(&v), r#""<\/script>""#);
        let plain = JsonValue::Str("a/b".to_owned());
        assert_eq!(to_json_text(&plain), r#""a/b""#);
        let ctrl = JsonValue::Str("\u{1}".to_owned());
        assert_eq!(to_json_text(&ctrl), "\"\\u0001\"");
    }

    #[test]
    fn pretty_form_uses_tabs() {
        let v = parse_json(r#"{"a":[1],"b":2}"#).unwrap();
        assert_eq!(
            to_pretty_json_text(&v),
            "{\n\t\"a\": [\n\t\t1\n\t],\n\t\"b\": 2\n}"
        );
    }

    #[test]
    fn print_parse_fixpoint() {
        let cases = [
            "null",
            "[1,2.5,\"x\\\"y\",null]",
            "{\"nested\":{\"deep\":[{}]}}",
            "123456789012345678901234567",
        ];
        for case in cases {
            let v = parse_json(case).unwrap();
            assert_eq!(to_json_text(&v), case);
            assert_eq!(parse_json(&to_json_text(&v)).unwrap(), v);
        }
    }
}
