//! Percent-encoding and -decoding.
//!
//! Grounded on the shape of the `percent_encoding` crate (`utf8_percent_encode`
//! / `percent_decode_str`): an `AsciiSet`-style unreserved predicate plus a
//! byte-at-a-time `%HH` encoder. We don't need `percent_encoding`'s
//! `Cow`-based laziness here — every caller immediately needs an owned
//! `String` — so the set predicate and the loop are inlined rather than
//! pulling in the crate itself.

use crate::options::{Charset, Format};
use crate::value::Value;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

fn is_unreserved(b: u8, format: Format) -> bool {
    match b {
        b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => true,
        b'(' | b')' if format == Format::Rfc1738 => true,
        _ => false,
    }
}

fn push_percent_byte(out: &mut String, b: u8) {
    out.push('%');
    out.push(HEX_DIGITS[(b >> 4) as usize] as char);
    out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
}

/// Percent-encodes `s` as UTF-8 bytes, one `%HH` per byte for anything
/// outside the unreserved set. Under RFC1738, a literal space becomes `+`
/// instead of `%20`.
fn encode_utf8(s: &str, format: Format) -> String {
    let mut out = String::with_capacity(s.len());
    for &b in s.as_bytes() {
        if format == Format::Rfc1738 && b == b' ' {
            out.push('+');
        } else if is_unreserved(b, format) {
            out.push(b as char);
        } else {
            push_percent_byte(&mut out, b);
        }
    }
    out
}

/// Percent-encodes `s` one Unicode scalar value at a time. Code points in
/// 0x00..=0xFF are emitted as a single `%HH`; code points above that are
/// escaped as the percent-encoded HTML numeric entity `%26%23<n>%3B`,
/// since a Latin-1 byte stream cannot represent them directly.
fn encode_latin1(s: &str, format: Format) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        let cp = ch as u32;
        if cp <= 0xFF {
            let b = cp as u8;
            if format == Format::Rfc1738 && b == b' ' {
                out.push('+');
            } else if is_unreserved(b, format) {
                out.push(b as char);
            } else {
                push_percent_byte(&mut out, b);
            }
        } else {
            out.push_str(&format!("%26%23{}%3B", cp));
        }
    }
    out
}

/// Percent-encodes a string for the wire, per the configured charset and
/// format dialect.
#[must_use]
pub fn percent_encode_str(s: &str, charset: Charset, format: Format) -> String {
    match charset {
        Charset::Utf8 => encode_utf8(s, format),
        Charset::Latin1 => encode_latin1(s, format),
    }
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Percent-decodes `s`, never panicking. `+` is treated as a literal space
/// first, matching `application/x-www-form-urlencoded`.
///
/// Under Latin-1, each `%HH` becomes that raw byte reinterpreted as a
/// Latin-1 code point, and legacy `%uXXXX` is honored. Under UTF-8, the
/// percent-escaped byte runs are decoded as UTF-8; on failure the
/// plus-normalized input is returned verbatim rather than panicking or
/// producing replacement characters.
#[must_use]
pub fn percent_decode_str(s: &str, charset: Charset) -> String {
    let plussed = s.replace('+', " ");
    match charset {
        Charset::Latin1 => decode_latin1(&plussed),
        Charset::Utf8 => decode_utf8(&plussed),
    }
}

fn decode_latin1(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 1 < bytes.len() && (bytes[i + 1] == b'u' || bytes[i + 1] == b'U') && i + 5 < bytes.len() {
            if let (Some(a), Some(b), Some(c), Some(d)) = (
                hex_val(bytes[i + 2]),
                hex_val(bytes[i + 3]),
                hex_val(bytes[i + 4]),
                hex_val(bytes[i + 5]),
            ) {
                let cp = ((a as u32) << 12) | ((b as u32) << 8) | ((c as u32) << 4) | d as u32;
                if let Some(ch) = char::from_u32(cp) {
                    out.push(ch);
                    i += 6;
                    continue;
                }
            }
        }
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                let byte = (hi << 4) | lo;
                out.push(byte as char);
                i += 3;
                continue;
            }
        }
        // Not an escape; copy one UTF-8 scalar value through unchanged.
        let ch = s[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn decode_utf8(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut raw = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_val(bytes[i + 1]), hex_val(bytes[i + 2])) {
                raw.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        raw.push(bytes[i]);
        i += 1;
    }
    match String::from_utf8(raw) {
        Ok(decoded) => decoded,
        Err(_) => s.to_string(),
    }
}

fn bytes_to_string(bytes: &[u8], charset: Charset) -> String {
    match charset {
        Charset::Utf8 => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
        Charset::Latin1 => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Renders a scalar leaf value to the string that gets percent-encoded
/// `bool` → `true`/`false`, `bytes` decoded via `charset` with a UTF-8
/// fallback, containers and null-like values → empty string. Date values
/// are normalized to strings upstream, by the date serializer, and never
/// reach this function.
#[must_use]
pub fn scalar_to_wire_string(value: &Value, charset: Charset) -> String {
    match value {
        Value::Null | Value::Undefined | Value::Seq(_) | Value::Map(_) => String::new(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => s.clone(),
        Value::Bytes(b) => bytes_to_string(b, charset),
        Value::Date(ms) => ms.to_string(),
    }
}
