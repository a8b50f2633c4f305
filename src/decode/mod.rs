//! The decode pipeline: tokenize → synthesize → merge → compact → normalize.

mod compact;
mod merge;
mod normalize;
mod synthesize;
mod tokenizer;

use indexmap::IndexMap;

use crate::codec::entities;
use crate::codec::percent;
use crate::error::QsError;
use crate::options::{Charset, DecodeKind, DecodeOptions};
use crate::value::{Entries, Value};

pub(crate) use merge::merge_into;

/// A raw query string, a pre-split sequence of key/value pairs, or an
/// already-shaped map whose keys may still carry bracket/dot notation to
/// re-parse (its values, unlike `Pairs`', are taken as-is rather than
/// percent-decoded).
pub enum Input<'a> {
    Query(&'a str),
    Pairs(&'a [(String, String)]),
    Map(&'a Entries),
}

impl<'a> From<&'a str> for Input<'a> {
    fn from(s: &'a str) -> Self {
        Input::Query(s)
    }
}

impl<'a> From<&'a [(String, String)]> for Input<'a> {
    fn from(pairs: &'a [(String, String)]) -> Self {
        Input::Pairs(pairs)
    }
}

impl<'a> From<&'a Entries> for Input<'a> {
    fn from(map: &'a Entries) -> Self {
        Input::Map(map)
    }
}

/// Runs a kind-aware decode of one raw token, falling back to plain
/// percent-decoding when no custom `decoder` is configured.
pub(crate) fn decode_piece(
    opts: &DecodeOptions,
    charset: Charset,
    raw: &str,
    kind: DecodeKind,
) -> Result<Value, QsError> {
    let decoded = match &opts.decoder {
        Some(d) => d(raw, charset, kind)?,
        None => Value::Str(percent::percent_decode_str(raw, charset)),
    };
    if kind == DecodeKind::Key {
        match &decoded {
            Value::Str(_) | Value::Null => {}
            _ => {
                return Err(QsError::KeyDecoderInvariant(
                    "key decoder must return a string or null".to_string(),
                ))
            }
        }
    }
    Ok(decoded)
}

pub(crate) fn apply_numeric_entities(value: Value, charset: Charset, opts: &DecodeOptions) -> Value {
    if charset != Charset::Latin1 || !opts.interpret_numeric_entities {
        return value;
    }
    match value {
        Value::Str(s) => Value::Str(entities::decode_numeric_entities(&s)),
        other => other,
    }
}

/// Decodes a query string or pair sequence into the public `Value` tree.
#[tracing::instrument(level = "debug", skip_all)]
pub fn decode(input: Input<'_>, opts: &DecodeOptions) -> Result<Value, QsError> {
    opts.validate()?;

    let (pairs, charset) = match input {
        Input::Query(s) => tokenizer::tokenize_query(s, opts)?,
        Input::Pairs(p) => tokenizer::tokenize_pairs(p, opts)?,
        Input::Map(m) => tokenizer::tokenize_map(m, opts)?,
    };
    tracing::debug!(pair_count = pairs.len(), ?charset, "tokenized query pairs");

    if pairs.is_empty() {
        return Ok(Value::map());
    }

    let root = run_synthesis_and_merge(&pairs, opts, charset, opts.parse_lists)?;

    // If parse_lists was true and the merged top-level map size exceeds
    // list_limit, re-run with list parsing disabled.
    let root = if opts.parse_lists && opts.list_limit >= 0 {
        let too_big = match &root {
            Value::Map(m) => m.borrow().entries.len() as i64 > opts.list_limit,
            _ => false,
        };
        if too_big {
            run_synthesis_and_merge(&pairs, opts, charset, false)?
        } else {
            root
        }
    } else {
        root
    };

    compact::compact(&root, opts.allow_sparse_lists);
    let normalized = normalize::to_string_key_deep(&root);
    Ok(normalized)
}

fn run_synthesis_and_merge(
    pairs: &[(String, Value)],
    opts: &DecodeOptions,
    charset: Charset,
    parse_lists: bool,
) -> Result<Value, QsError> {
    let root = Value::map();
    for (raw_key, value) in pairs {
        let branch = synthesize::parse_object(raw_key, value.clone(), opts, charset, parse_lists)?;
        merge::merge_into(&root, branch, opts.list_limit, opts.throw_on_limit_exceeded)?;
    }
    Ok(root)
}

/// Builds a fresh, empty entries map (used by a few call sites that need an
/// `Entries` rather than a boxed `Value::map()`).
#[allow(dead_code)]
pub(crate) fn empty_entries() -> Entries {
    IndexMap::new()
}
