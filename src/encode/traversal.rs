//! Encoder traversal.
//!
//! A state machine of one frame per node — `Start` (decide whether this
//! node is a leaf or a container) then `Iterating` (walk its children,
//! resumable one at a time) — driven by an explicit stack rather than
//! recursive calls, so an arbitrarily deep caller-supplied value tree
//! can't blow the Rust call stack. A completed frame's fragments are
//! appended onto its parent's fragment list in order; the root frame's
//! fragments are the function's result.

use std::rc::Rc;

use crate::codec::percent;
use crate::error::QsError;
use crate::options::{Charset, EncodeFilter, EncodeOptions, Format, ListFormat};
use crate::value::Value;

use super::key_path::KeyPathNode;
use super::side_channel::SideChannel;

#[derive(Clone)]
struct ChildSpec {
    value: Value,
    key_path: Rc<KeyPathNode>,
}

enum FrameState {
    Start,
    Iterating { children: Vec<ChildSpec>, next: usize },
}

struct Frame {
    value: Value,
    key_path: Rc<KeyPathNode>,
    state: FrameState,
    fragments: Vec<String>,
    container_id: Option<usize>,
}

enum StartOutcome {
    Leaf(Option<String>),
    NoEmit,
    Enter(Vec<ChildSpec>),
}

/// Runs a custom `encoder`, if one is set, on key text too — not just
/// values — unless `encode_values_only` exempts keys entirely.
pub(crate) fn encode_key(name: &str, opts: &EncodeOptions, charset: Charset, format: Format) -> Result<String, QsError> {
    if !opts.encode || opts.encode_values_only {
        return Ok(name.to_string());
    }
    if let Some(encoder) = &opts.encoder {
        return encoder(&Value::Str(name.to_string()), charset, format);
    }
    Ok(percent::percent_encode_str(name, charset, format))
}

fn encode_leaf_value(value: &Value, opts: &EncodeOptions, charset: Charset, format: Format) -> Result<String, QsError> {
    if !opts.encode {
        return Ok(percent::scalar_to_wire_string(value, charset));
    }
    if let Some(encoder) = &opts.encoder {
        return encoder(value, charset, format);
    }
    Ok(percent::percent_encode_str(&percent::scalar_to_wire_string(value, charset), charset, format))
}

/// Encodes one key's text, first turning a literal `.` into the escape
/// `%2E` when `encode_dot_in_keys` is set — which then itself gets
/// percent-encoded into `%252E` by the normal pass below, so a dot
/// surviving in a decoded key can never be mistaken for the dot-notation
/// path separator on the next round trip.
pub(crate) fn encode_key_component(
    name: &str,
    opts: &EncodeOptions,
    charset: Charset,
    format: Format,
) -> Result<String, QsError> {
    let name = if opts.encode_dot_in_keys { name.replace('.', "%2E") } else { name.to_string() };
    encode_key(&name, opts, charset, format)
}

/// The `[`/`]` that wrap a bracket-style key segment are themselves
/// reserved characters, so under the default `encode: true` they get
/// percent-encoded to `%5B`/`%5D` right along with the key name inside
/// them — this is what makes `qs.stringify({a: ['b']})` come out as
/// `a%5B0%5D=b` rather than the more readable but wire-ambiguous
/// `a[0]=b`. `encode_values_only` exempts keys from this the same way
/// it exempts the name text.
fn bracket_pair(opts: &EncodeOptions) -> (&'static str, &'static str) {
    if opts.encode && !opts.encode_values_only {
        ("%5B", "%5D")
    } else {
        ("[", "]")
    }
}

fn map_child_segment(key: &str, opts: &EncodeOptions, charset: Charset, format: Format) -> Result<String, QsError> {
    let encoded = encode_key_component(key, opts, charset, format)?;
    if opts.effective_allow_dots() {
        Ok(format!(".{encoded}"))
    } else {
        let (open, close) = bracket_pair(opts);
        Ok(format!("{open}{encoded}{close}"))
    }
}

fn collect_children(
    value: &Value,
    key_path: &Rc<KeyPathNode>,
    opts: &EncodeOptions,
    charset: Charset,
    format: Format,
) -> Result<Vec<ChildSpec>, QsError> {
    match value {
        Value::Map(m) => {
            let mut items: Vec<(String, Value)> = {
                let data = m.borrow();
                match &opts.filter {
                    Some(EncodeFilter::Keys(keys)) => keys
                        .iter()
                        .filter_map(|k| data.entries.get(k).map(|v| (k.clone(), v.clone())))
                        .collect(),
                    _ => data.entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                }
            };
            if let Some(sorter) = &opts.sort {
                items.sort_by(|a, b| sorter(&a.0, &b.0));
            }
            let mut children = Vec::with_capacity(items.len());
            for (key, child_value) in items {
                if opts.skip_nulls && child_value.is_null() {
                    continue;
                }
                let segment = map_child_segment(&key, opts, charset, format)?;
                children.push(ChildSpec { value: child_value, key_path: key_path.child(segment) });
            }
            Ok(children)
        }
        Value::Seq(s) => {
            let items: Vec<Value> = s.borrow().clone();
            if opts.list_format == ListFormat::Comma {
                let mut parts = Vec::with_capacity(items.len());
                for item in &items {
                    if opts.comma_compact_nulls && item.is_null() {
                        continue;
                    }
                    let wire = match item {
                        Value::Date(ms) => {
                            let s = opts.date_serializer.serialize(*ms)?;
                            percent::scalar_to_wire_string(&Value::Str(s), charset)
                        }
                        other => percent::scalar_to_wire_string(other, charset),
                    };
                    parts.push(wire);
                }
                let joined = parts.join(",");
                let child_path = if opts.effective_comma_round_trip() && items.len() == 1 {
                    let (open, close) = bracket_pair(opts);
                    key_path.child(format!("{open}{close}"))
                } else {
                    Rc::clone(key_path)
                };
                Ok(vec![ChildSpec { value: Value::Str(joined), key_path: child_path }])
            } else {
                let mut children = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    if opts.skip_nulls && item.is_null() {
                        continue;
                    }
                    let segment = match opts.list_format {
                        ListFormat::Indices => {
                            let (open, close) = bracket_pair(opts);
                            format!("{open}{}{close}", i)
                        }
                        ListFormat::Brackets => {
                            let (open, close) = bracket_pair(opts);
                            format!("{open}{close}")
                        }
                        ListFormat::Repeat => String::new(),
                        ListFormat::Comma => unreachable!(),
                    };
                    children.push(ChildSpec { value: item, key_path: key_path.child(segment) });
                }
                Ok(children)
            }
        }
        _ => Ok(Vec::new()),
    }
}

fn start_phase(
    raw_value: &Value,
    key_path: &Rc<KeyPathNode>,
    opts: &EncodeOptions,
    side_channel: &mut SideChannel,
    charset: Charset,
    format: Format,
) -> Result<(StartOutcome, Option<usize>), QsError> {
    let mut value = raw_value.clone();

    if let Some(EncodeFilter::Func(f)) = &opts.filter {
        value = f(&key_path.materialize(), &value);
    }

    if let Value::Date(ms) = value {
        value = Value::Str(opts.date_serializer.serialize(ms)?);
    }

    let container_id = value.identity();
    if let Some(id) = container_id {
        if !side_channel.enter(id) {
            let path = key_path.materialize();
            tracing::warn!(%path, "cyclic value detected during encode");
            return Err(QsError::CyclicValue { path });
        }
    }

    if value.is_null() {
        if opts.strict_null_handling {
            return Ok((StartOutcome::Leaf(Some(key_path.materialize())), container_id));
        }
        value = Value::Str(String::new());
    }

    if value.is_undefined() {
        return Ok((StartOutcome::NoEmit, container_id));
    }

    match &value {
        Value::Seq(s) if s.borrow().is_empty() => {
            if opts.allow_empty_lists {
                let (open, close) = bracket_pair(opts);
                let fragment = format!("{}{open}{close}", key_path.materialize());
                Ok((StartOutcome::Leaf(Some(fragment)), container_id))
            } else {
                Ok((StartOutcome::NoEmit, container_id))
            }
        }
        Value::Map(m) if m.borrow().entries.is_empty() => Ok((StartOutcome::NoEmit, container_id)),
        Value::Map(_) | Value::Seq(_) => {
            let children = collect_children(&value, key_path, opts, charset, format)?;
            Ok((StartOutcome::Enter(children), container_id))
        }
        _ => {
            let value_text = encode_leaf_value(&value, opts, charset, format)?;
            let fragment = format!("{}={}", key_path.materialize(), value_text);
            Ok((StartOutcome::Leaf(Some(fragment)), container_id))
        }
    }
}

fn finish_frame(stack: &mut [Frame], fragments: Vec<String>) -> Option<Vec<String>> {
    let len = stack.len();
    if len == 0 {
        Some(fragments)
    } else {
        stack[len - 1].fragments.extend(fragments);
        None
    }
}

/// Encodes one top-level key/value pair (or any subtree) into its
/// `key=value` fragments, in document order.
pub(crate) fn encode_node(
    value: Value,
    root_segment: String,
    opts: &EncodeOptions,
    charset: Charset,
    format: Format,
) -> Result<Vec<String>, QsError> {
    let mut side_channel = SideChannel::new();
    let root_key_path = KeyPathNode::root(root_segment);
    let mut stack: Vec<Frame> = vec![Frame {
        value,
        key_path: root_key_path,
        state: FrameState::Start,
        fragments: Vec::new(),
        container_id: None,
    }];

    loop {
        let is_start = matches!(stack.last().expect("non-empty stack").state, FrameState::Start);

        if is_start {
            let value = stack.last().unwrap().value.clone();
            let key_path = Rc::clone(&stack.last().unwrap().key_path);
            let (outcome, container_id) = start_phase(&value, &key_path, opts, &mut side_channel, charset, format)?;

            match outcome {
                StartOutcome::Leaf(fragment) => {
                    let mut finished = stack.pop().unwrap();
                    if let Some(id) = container_id {
                        side_channel.exit(id);
                    }
                    if let Some(f) = fragment {
                        finished.fragments.push(f);
                    }
                    if let Some(result) = finish_frame(&mut stack, finished.fragments) {
                        return Ok(result);
                    }
                }
                StartOutcome::NoEmit => {
                    let finished = stack.pop().unwrap();
                    if let Some(id) = container_id {
                        side_channel.exit(id);
                    }
                    if let Some(result) = finish_frame(&mut stack, finished.fragments) {
                        return Ok(result);
                    }
                }
                StartOutcome::Enter(children) => {
                    let frame = stack.last_mut().unwrap();
                    frame.container_id = container_id;
                    frame.state = FrameState::Iterating { children, next: 0 };
                }
            }
        } else {
            let next_child = {
                let frame = stack.last_mut().unwrap();
                match &mut frame.state {
                    FrameState::Iterating { children, next } if *next < children.len() => {
                        let c = children[*next].clone();
                        *next += 1;
                        Some(c)
                    }
                    _ => None,
                }
            };

            match next_child {
                Some(child) => {
                    stack.push(Frame {
                        value: child.value,
                        key_path: child.key_path,
                        state: FrameState::Start,
                        fragments: Vec::new(),
                        container_id: None,
                    });
                }
                None => {
                    let finished = stack.pop().unwrap();
                    if let Some(id) = finished.container_id {
                        side_channel.exit(id);
                    }
                    if let Some(result) = finish_frame(&mut stack, finished.fragments) {
                        return Ok(result);
                    }
                }
            }
        }
    }
}
