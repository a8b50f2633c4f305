//! Key-path segmentation: splits a raw key like `a[b][c]` or (with
//! `allow_dots`) `a.b.c` into ordered path components.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::QsError;

fn dot_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.([^.\[]+)").unwrap())
}

/// One component of a split key path: a bare parent identifier (possibly
/// empty), or a bracketed form carrying its inner text without the
/// brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// The first parent segment, before any `[`.
    Parent(String),
    /// `[<inner>]`, inner text without the brackets.
    Bracket(String),
    /// The literal `[]`.
    EmptyBracket,
}

/// Splits a raw (still percent-encoded) key into an ordered list of
/// segments, honoring `allow_dots`, `depth` and `strict_depth`.
pub fn split_key(raw: &str, allow_dots: bool, depth: usize, strict_depth: bool) -> Result<Vec<Segment>, QsError> {
    let transformed;
    let key: &str = if allow_dots {
        transformed = dot_run_re().replace_all(raw, "[$1]").into_owned();
        &transformed
    } else {
        raw
    };

    if depth == 0 {
        // depth=0 returns the whole key as one segment, literally, even
        // under strict_depth. No throw.
        return Ok(vec![Segment::Parent(key.to_string())]);
    }

    let first_bracket = key.find('[');
    let (parent, mut rest) = match first_bracket {
        Some(idx) => (&key[..idx], &key[idx..]),
        None => (key, ""),
    };

    let mut segments = vec![Segment::Parent(parent.to_string())];
    let mut consumed = 0usize;
    while consumed < depth && !rest.is_empty() {
        if !rest.starts_with('[') {
            break;
        }
        let Some(close) = rest.find(']') else {
            break;
        };
        let inner = &rest[1..close];
        if inner.is_empty() {
            segments.push(Segment::EmptyBracket);
        } else {
            segments.push(Segment::Bracket(inner.to_string()));
        }
        rest = &rest[close + 1..];
        consumed += 1;
    }

    if !rest.is_empty() {
        if strict_depth {
            tracing::warn!(depth, remainder = rest, "depth exceeded");
            return Err(QsError::DepthExceeded {
                depth,
                remainder: rest.to_string(),
            });
        }
        segments.push(Segment::Bracket(rest.to_string()));
    }

    Ok(segments)
}
