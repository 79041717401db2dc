//! Reads JSON text on stdin and writes the equivalent BSON document to
//! stdout. The root must be an object or an array.

use std::io::{Read, Write};

use dynval::{json_to_bson, parse_json};

fn run() -> Result<(), String> {
    let mut text = String::new();
    std::io::stdin()
        .read_to_string(&mut text)
        .map_err(|e| e.to_string())?;

    let json = parse_json(&text).map_err(|e| e.to_string())?;
    let doc = json_to_bson(&json).map_err(|e| e.to_string())?;
    let bytes = doc
        .document_bytes()
        .map_err(|_| "root must be an object or an array".to_owned())?;

    let mut out = std::io::stdout();
    out.write_all(bytes).map_err(|e| e.to_string())?;
    out.flush().map_err(|e| e.to_string())
}

fn main() {
    if let Err(message) = run() {
        eprintln!("json2bson: {message}");
        std::process::exit(1);
    }
}
