//! Pair tokenizer (`parse_query_string_values`).

use indexmap::IndexMap;

use crate::decode::{apply_numeric_entities, decode_piece};
use crate::error::QsError;
use crate::options::{Charset, DecodeKind, DecodeOptions};
use crate::value::{Entries, Value};

const SENTINEL_UTF8: &str = "%E2%9C%93";
const SENTINEL_LATIN1: &str = "%26%2310003%3B";

/// Replaces `%5B`/`%5D` (either case) with literal brackets, for
/// key-splitting purposes only. Percent-encoded dots are left alone.
fn normalize_bracket_escapes(s: &str) -> String {
    // Single pass, case-insensitive, without pulling in a regex for two
    // fixed four-character needles.
    let mut out = String::with_capacity(s.len());
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let (a, b) = (bytes[i + 1].to_ascii_uppercase(), bytes[i + 2].to_ascii_uppercase());
            if a == b'5' && b == b'B' {
                out.push('[');
                i += 3;
                continue;
            }
            if a == b'5' && b == b'D' {
                out.push(']');
                i += 3;
                continue;
            }
        }
        let ch = s[i..].chars().next().unwrap();
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

/// Splits one `key[=value]` fragment. Looks for `]=` first (including the
/// `]` in the key half) so that a literal `=` inside a bracketed segment
/// doesn't get mistaken for the key/value separator; falls back to the
/// first plain `=`. `None` value half means "key only".
fn split_pair(fragment: &str) -> (&str, Option<&str>) {
    if let Some(idx) = fragment.find("]=") {
        return (&fragment[..=idx], Some(&fragment[idx + 2..]));
    }
    if let Some(idx) = fragment.find('=') {
        return (&fragment[..idx], Some(&fragment[idx + 1..]));
    }
    (fragment, None)
}

enum Duplicate {
    First,
    Last,
    Combine,
}

/// Decodes one already-split key/value fragment into `(raw_key, value)`,
/// applying comma-splitting, the kind-aware decoder, numeric-entity
/// reinterpretation, and the `[]=` forced-list rule.
fn finalize_pair(
    key_fragment: &str,
    value_fragment: Option<&str>,
    opts: &DecodeOptions,
    charset: Charset,
) -> Result<(String, Value), QsError> {
    let raw_key = normalize_bracket_escapes(key_fragment);

    let value = match value_fragment {
        None => {
            if opts.strict_null_handling {
                Value::Null
            } else {
                Value::Str(String::new())
            }
        }
        Some(raw_value) => {
            let mut decoded = if opts.comma && raw_value.contains(',') {
                let parts: Vec<&str> = raw_value.split(',').collect();
                if opts.list_limit >= 0
                    && parts.len() as i64 > opts.list_limit
                    && opts.throw_on_limit_exceeded
                {
                    tracing::warn!(limit = opts.list_limit, actual = parts.len(), "list limit exceeded");
                    return Err(QsError::ListLimitExceeded {
                        limit: opts.list_limit,
                        actual: parts.len(),
                    });
                }
                let mut items = Vec::with_capacity(parts.len());
                for part in parts {
                    let piece = decode_piece(opts, charset, part, DecodeKind::Value)?;
                    items.push(apply_numeric_entities(piece, charset, opts));
                }
                Value::seq_from(items)
            } else {
                let piece = decode_piece(opts, charset, raw_value, DecodeKind::Value)?;
                apply_numeric_entities(piece, charset, opts)
            };

            if raw_key.ends_with("[]") && !matches!(decoded, Value::Seq(_)) {
                decoded = Value::seq_from(vec![decoded]);
            }
            decoded
        }
    };

    Ok((raw_key, value))
}

/// Groups finalized pairs by raw key, applying the `duplicates` policy.
fn group_by_duplicates(
    finalized: Vec<(String, Value)>,
    duplicates: Duplicate,
) -> Vec<(String, Value)> {
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (key, value) in finalized {
        match duplicates {
            Duplicate::First => {
                groups.entry(key).or_insert_with(|| vec![value]);
            }
            Duplicate::Last => {
                groups.insert(key, vec![value]);
            }
            Duplicate::Combine => {
                groups.entry(key).or_default().push(value);
            }
        }
    }

    groups
        .into_iter()
        .map(|(key, mut values)| {
            let resolved = if values.len() == 1 {
                values.pop().unwrap()
            } else {
                let mut flat = Vec::new();
                for v in values {
                    match v {
                        Value::Seq(s) => flat.extend(s.borrow().iter().cloned()),
                        other => flat.push(other),
                    }
                }
                Value::seq_from(flat)
            };
            (key, resolved)
        })
        .collect()
}

fn duplicates_policy(opts: &DecodeOptions) -> Duplicate {
    match opts.duplicates {
        crate::options::Duplicates::First => Duplicate::First,
        crate::options::Duplicates::Last => Duplicate::Last,
        crate::options::Duplicates::Combine => Duplicate::Combine,
    }
}

/// Scans `fragments` for a leading `utf8=` sentinel pair, returning the
/// resolved charset and the index to skip, if any.
fn resolve_charset_sentinel(
    fragments: &[&str],
    configured: Charset,
    enabled: bool,
) -> (Charset, Option<usize>) {
    if !enabled {
        return (configured, None);
    }
    for (i, fragment) in fragments.iter().enumerate() {
        let (key, value) = split_pair(fragment);
        if key == "utf8" {
            let resolved = match value {
                Some(SENTINEL_UTF8) => Charset::Utf8,
                Some(SENTINEL_LATIN1) => Charset::Latin1,
                _ => configured,
            };
            return (resolved, Some(i));
        }
    }
    (configured, None)
}

pub(crate) fn tokenize_query(
    input: &str,
    opts: &DecodeOptions,
) -> Result<(Vec<(String, Value)>, Charset), QsError> {
    let stripped = if opts.ignore_query_prefix {
        input.strip_prefix('?').unwrap_or(input)
    } else {
        input
    };
    let normalized = normalize_bracket_escapes(stripped);

    let all_fragments = opts.delimiter.split(&normalized);
    let total = all_fragments.len();
    let limit = opts.parameter_limit as usize;
    let take_n = if opts.throw_on_limit_exceeded { limit.saturating_add(1) } else { limit };
    if opts.throw_on_limit_exceeded && total > limit {
        tracing::warn!(limit, total, "parameter limit exceeded");
        return Err(QsError::ParameterLimitExceeded { limit });
    }
    let fragments: Vec<&str> = all_fragments.into_iter().take(take_n.min(total)).collect();

    let (charset, sentinel_idx) = resolve_charset_sentinel(&fragments, opts.charset, opts.charset_sentinel);

    let mut finalized = Vec::with_capacity(fragments.len());
    for (i, fragment) in fragments.iter().enumerate() {
        if Some(i) == sentinel_idx {
            continue;
        }
        if fragment.is_empty() {
            continue;
        }
        let (key_fragment, value_fragment) = split_pair(fragment);
        finalized.push(finalize_pair(key_fragment, value_fragment, opts, charset)?);
    }

    Ok((group_by_duplicates(finalized, duplicates_policy(opts)), charset))
}

/// Takes an already-shaped map's entries as pairs, keeping each value as-is
/// (no percent-decoding) while still letting the key be re-split on
/// bracket/dot notation downstream.
pub(crate) fn tokenize_map(
    entries: &Entries,
    opts: &DecodeOptions,
) -> Result<(Vec<(String, Value)>, Charset), QsError> {
    let charset = opts.charset;
    let limit = opts.parameter_limit as usize;
    if opts.throw_on_limit_exceeded && entries.len() > limit {
        tracing::warn!(limit, total = entries.len(), "parameter limit exceeded");
        return Err(QsError::ParameterLimitExceeded { limit });
    }
    let take_n = limit.min(entries.len());
    let pairs = entries.iter().take(take_n).map(|(k, v)| (k.clone(), v.clone())).collect();
    Ok((pairs, charset))
}

pub(crate) fn tokenize_pairs(
    pairs: &[(String, String)],
    opts: &DecodeOptions,
) -> Result<(Vec<(String, Value)>, Charset), QsError> {
    let charset = opts.charset;
    let limit = opts.parameter_limit as usize;
    if opts.throw_on_limit_exceeded && pairs.len() > limit {
        return Err(QsError::ParameterLimitExceeded { limit });
    }
    let take_n = limit.min(pairs.len());

    let mut finalized = Vec::with_capacity(take_n);
    for (key, value) in pairs.iter().take(take_n) {
        finalized.push(finalize_pair(key, Some(value.as_str()), opts, charset)?);
    }

    Ok((group_by_duplicates(finalized, duplicates_policy(opts)), charset))
}
