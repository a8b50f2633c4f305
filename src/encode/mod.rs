//! The encode pipeline: per-root-key traversal, then fragment assembly.

mod key_path;
mod side_channel;
mod traversal;

use crate::error::QsError;
use crate::options::{Charset, EncodeFilter, EncodeOptions};
use crate::value::Value;

/// Encodes a value tree into a query string.
///
/// `data` is ordinarily a `Value::Map`; a top-level `Value::Seq` is also
/// accepted and encoded index by index, matching the wire-format
/// convention that a bare array stringifies as `0=...&1=...`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn encode(data: &Value, opts: &EncodeOptions) -> Result<String, QsError> {
    opts.validate()?;
    let charset = opts.charset;
    let format = opts.format;

    let mut root = data.clone();
    if let Some(EncodeFilter::Func(f)) = &opts.filter {
        root = f("", &root);
    }

    let mut top_level: Vec<(String, Value)> = match &root {
        Value::Map(m) => {
            let data = m.borrow();
            match &opts.filter {
                Some(EncodeFilter::Keys(keys)) => keys
                    .iter()
                    .filter_map(|k| data.entries.get(k).map(|v| (k.clone(), v.clone())))
                    .collect(),
                _ => data.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            }
        }
        Value::Seq(s) => s.borrow().iter().enumerate().map(|(i, v)| (i.to_string(), v.clone())).collect(),
        _ => {
            return Err(QsError::InvalidInput(
                "encode() input must be a map or a sequence of top-level entries".to_string(),
            ))
        }
    };

    if let Some(sorter) = &opts.sort {
        top_level.sort_by(|a, b| sorter(&a.0, &b.0));
    }

    let mut fragments = Vec::new();
    for (key, child_value) in top_level {
        if opts.skip_nulls && child_value.is_null() {
            continue;
        }
        let root_segment = traversal::encode_key_component(&key, opts, charset, format)?;
        let piece = traversal::encode_node(child_value, root_segment, opts, charset, format)?;
        fragments.extend(piece);
    }

    let mut out = String::new();
    if opts.charset_sentinel {
        out.push_str(match charset {
            Charset::Utf8 => "utf8=%E2%9C%93&",
            Charset::Latin1 => "utf8=%26%2310003%3B&",
        });
    }
    out.push_str(&fragments.join(opts.delimiter.join_str()));

    if opts.add_query_prefix {
        out = format!("?{out}");
    }
    Ok(out)
}
