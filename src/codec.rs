//! Value codec for embedding values in generated programs
//!
//! Compressed text uses the wire format `hex(zlib(utf8(text)))`. It exists so
//! that binary compressed data survives being embedded in source text. It is
//! never used for transport.
//!
//! Structured values ([`Table`]) are serialized to their canonical JSON form
//! and compressed only when that makes the literal strictly shorter. Either
//! way the result is a quoted string literal, so the literal grammar treats
//! both forms uniformly.

use crate::error::{Result, ResultExt, WidgetError};
use crate::types::{Cell, Table, Value};
use flate2::read::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;
use std::fmt::Write as _;
use std::io::Read;

/// Compress UTF-8 text and hex-encode the compressed bytes
pub fn compress(text: &str) -> Result<String> {
    let mut encoder = ZlibEncoder::new(text.as_bytes(), Compression::default());
    let mut bytes = Vec::new();
    encoder.read_to_end(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Exact inverse of [`compress`]
pub fn decompress(text: &str) -> Result<String> {
    let bytes = hex::decode(text.trim()).map_err(|e| {
        WidgetError::Configuration(format!("Compressed text is not valid hex: {}", e))
    })?;

    let mut decoder = ZlibDecoder::new(bytes.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(|e| {
        WidgetError::Configuration(format!("Compressed text is not a valid zlib stream: {}", e))
    })?;

    String::from_utf8(out).map_err(|e| {
        WidgetError::Configuration(format!("Decompressed text is not valid UTF-8: {}", e))
    })
}

/// Encode a table as a quoted string literal, compressed if that is shorter
///
/// Non-finite float cells have no JSON form and are rejected.
pub fn encode_structured(table: &Table) -> Result<String> {
    for (name, cells) in table.columns() {
        let bad = cells
            .iter()
            .position(|c| matches!(c, Cell::Float(v) if !v.is_finite()));
        if let Some(row) = bad {
            return Err(WidgetError::Compiler(format!(
                "Cannot encode non-finite float in column {} row {}",
                name, row
            )));
        }
    }

    let json = serde_json::to_string(table)
        .map_err(|e| WidgetError::Serialization(format!("Failed to serialize table: {}", e)))?;
    let compressed = compress(&json)?;

    let body = if compressed.len() < json.len() {
        compressed
    } else {
        json
    };
    Ok(quote(&body))
}

/// Decode a structured value from what a node was constructed with
///
/// - `Null` yields an empty table
/// - a `Table` is passed through
/// - a string is decompressed then parsed, or parsed directly as JSON when
///   it was emitted uncompressed
pub fn decode_structured(value: &Value) -> Result<Table> {
    match value {
        Value::Null => Ok(Table::new()),
        Value::Table(table) => Ok(table.clone()),
        Value::String(text) => decode_text(text),
        other => Err(WidgetError::Configuration(format!(
            "Cannot decode a table from a {} value",
            other.type_name()
        ))),
    }
}

fn decode_text(text: &str) -> Result<Table> {
    match decompress(text) {
        Ok(json) => parse_table(&json).context("Failed to parse decompressed table"),
        Err(cause) => match serde_json::from_str::<Table>(text) {
            Ok(table) => Ok(table),
            Err(_) => Err(cause.with_context("Could not decode structured value")),
        },
    }
}

fn parse_table(json: &str) -> Result<Table> {
    serde_json::from_str(json)
        .map_err(|e| WidgetError::Configuration(format!("Invalid table JSON: {}", e)))
}

/// Quote text as a double-quoted Rhai string literal
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
