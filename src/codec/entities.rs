//! Numeric HTML entity reinterpretation.
//!
//! Only ever invoked on the Latin-1 + `interpret_numeric_entities` path, on
//! an already percent-decoded scalar.

/// Replaces `&#NNN;` and `&#xHH;` runs with the character they name, when
/// the digits parse and the code point is `<= 0x10FFFF`. Anything else is
/// left untouched, including invalid UTF-16 surrogate code points that
/// don't form a valid `char`.
#[must_use]
pub fn decode_numeric_entities(s: &str) -> String {
    if !s.contains("&#") {
        return s.to_string();
    }

    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        if let Some((cp, consumed)) = try_parse_entity(&bytes[i..]) {
            if let Some(ch) = char::from_u32(cp) {
                out.push(ch);
                i += consumed;
                continue;
            }
        }
        let ch = s[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Parses one `&#<digits>;` or `&#x<hex>;` entity at the start of `buf`,
/// returning its code point and byte length on success.
fn try_parse_entity(buf: &[u8]) -> Option<(u32, usize)> {
    if !buf.starts_with(b"&#") {
        return None;
    }
    let rest = &buf[2..];
    let (digits_start, radix) = if rest.first().map(|b| *b == b'x' || *b == b'X') == Some(true) {
        (1, 16)
    } else {
        (0, 10)
    };
    let digits = &rest[digits_start..];
    let end = digits.iter().position(|&b| b == b';')?;
    if end == 0 {
        return None;
    }
    let digit_str = std::str::from_utf8(&digits[..end]).ok()?;
    let cp = u32::from_str_radix(digit_str, radix).ok()?;
    if cp > 0x10FFFF {
        return None;
    }
    // consumed: "&#" + optional "x" + digits + ";"
    Some((cp, 2 + digits_start + end + 1))
}
