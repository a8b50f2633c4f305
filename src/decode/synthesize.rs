//! Object synthesizer (`parse_object`).
//!
//! Builds the single-branch nested value for one already-tokenized pair by
//! wrapping the leaf value right-to-left, one key-path segment at a time.

use crate::codec::key_path::{self, Segment};
use crate::decode::decode_piece;
use crate::error::QsError;
use crate::options::{Charset, DecodeKind, DecodeOptions};
use crate::value::{Entries, Value};

fn is_blank(value: &Value) -> bool {
    matches!(value, Value::Str(s) if s.is_empty()) || matches!(value, Value::Null)
}

fn undo_dot_escape(s: &str) -> String {
    // "%2E" is what a literal "." in a key name survives as after one
    // percent-decode pass; `decode_dot_in_keys` asks us to treat it as a
    // literal dot rather than leaving it percent-encoded.
    s.replace("%2E", ".").replace("%2e", ".")
}

fn decode_key_segment(raw: &str, opts: &DecodeOptions, charset: Charset) -> Result<String, QsError> {
    let text = if opts.decode_dot_in_keys {
        undo_dot_escape(raw)
    } else {
        raw.to_string()
    };
    match decode_piece(opts, charset, &text, DecodeKind::Key)? {
        Value::Str(s) => Ok(s),
        Value::Null => Ok(String::new()),
        _ => unreachable!("decode_piece enforces Str/Null for DecodeKind::Key"),
    }
}

fn parse_index(s: &str) -> Option<i64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i64>().ok()
}

fn positional_list(index: usize, leaf: Value) -> Value {
    let mut items = vec![Value::Undefined; index];
    items.push(leaf);
    Value::seq_from(items)
}

fn wrap_empty_bracket(leaf: Value, opts: &DecodeOptions, parse_lists: bool) -> Value {
    if !parse_lists {
        let mut entries = Entries::new();
        entries.insert("0".to_string(), leaf);
        return Value::map_from(entries);
    }
    if matches!(leaf, Value::Seq(_)) {
        // Already list-shaped (tokenizer's "[]=" forced-wrap, or a
        // duplicate-combine result); don't wrap it a second time.
        return leaf;
    }
    let want_empty = (is_blank(&leaf) && opts.allow_empty_lists)
        || (opts.strict_null_handling && leaf.is_null());
    if want_empty {
        Value::seq()
    } else {
        Value::seq_from(vec![leaf])
    }
}

fn wrap_bracket(
    inner: &str,
    leaf: Value,
    opts: &DecodeOptions,
    charset: Charset,
    parse_lists: bool,
) -> Result<Value, QsError> {
    if parse_lists {
        if let Some(n) = parse_index(inner) {
            if opts.list_limit < 0 || n <= opts.list_limit {
                return Ok(positional_list(n as usize, leaf));
            }
        }
    }
    let key = decode_key_segment(inner, opts, charset)?;
    let mut entries = Entries::new();
    entries.insert(key, leaf);
    Ok(Value::map_from(entries))
}

fn wrap_parent(text: &str, leaf: Value, opts: &DecodeOptions, charset: Charset) -> Result<Value, QsError> {
    let key = decode_key_segment(text, opts, charset)?;
    let mut entries = Entries::new();
    entries.insert(key, leaf);
    Ok(Value::map_from(entries))
}

/// Builds the single-branch tree for one raw key plus its already-decoded
/// value.
pub(crate) fn parse_object(
    raw_key: &str,
    value: Value,
    opts: &DecodeOptions,
    charset: Charset,
    parse_lists: bool,
) -> Result<Value, QsError> {
    let segments = key_path::split_key(raw_key, opts.effective_allow_dots(), opts.depth, opts.strict_depth)?;

    let mut leaf = value;
    for segment in segments.iter().rev() {
        leaf = match segment {
            Segment::EmptyBracket => wrap_empty_bracket(leaf, opts, parse_lists),
            Segment::Bracket(inner) => wrap_bracket(inner, leaf, opts, charset, parse_lists)?,
            Segment::Parent(text) => wrap_parent(text, leaf, opts, charset)?,
        };
    }
    Ok(leaf)
}
