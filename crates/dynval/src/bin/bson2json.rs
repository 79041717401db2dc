//! Reads one BSON document on stdin and writes it as pretty-printed
//! JSON text to stdout.

use std::io::Read;

use dynval::{bson_to_json, to_pretty_json_text, Bson};

fn run() -> Result<(), String> {
    let mut bytes = Vec::new();
    std::io::stdin()
        .read_to_end(&mut bytes)
        .map_err(|e| e.to_string())?;

    let doc = Bson::from_document_bytes(bytes).map_err(|e| e.to_string())?;
    let json = bson_to_json(&doc).map_err(|e| e.to_string())?;
    println!("{}", to_pretty_json_text(&json));
    Ok(())
}

fn main() {
    if let Err(message) = run() {
        eprintln!("bson2json: {message}");
        std::process::exit(1);
    }
}
