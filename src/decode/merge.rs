//! Iterative merger.
//!
//! Merges one freshly-synthesized pair branch into the growing accumulator,
//! using an explicit work-stack rather than call-stack recursion so that
//! deeply nested collisions can't blow the stack. Each stack frame names a
//! `Slot` (a map key or a sequence index) to write the merge result into,
//! rather than returning values up through recursive calls.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::QsError;
use crate::value::{Entries, MapData, SeqData, Value};

enum Slot {
    MapKey(Rc<RefCell<MapData>>, String),
    SeqIndex(Rc<RefCell<SeqData>>, usize),
}

impl Slot {
    fn read(&self) -> Value {
        match self {
            Slot::MapKey(m, k) => m.borrow().entries.get(k).cloned().unwrap_or(Value::Undefined),
            Slot::SeqIndex(s, i) => s.borrow().get(*i).cloned().unwrap_or(Value::Undefined),
        }
    }

    fn write(&self, value: Value) {
        match self {
            Slot::MapKey(m, k) => {
                m.borrow_mut().entries.insert(k.clone(), value);
            }
            Slot::SeqIndex(s, i) => {
                let mut s = s.borrow_mut();
                while s.len() <= *i {
                    s.push(Value::Undefined);
                }
                s[*i] = value;
            }
        }
    }
}

struct Task {
    slot: Slot,
    source: Value,
}

enum Kind {
    NullOrUndefined,
    Scalar,
    Seq,
    Map,
}

fn classify(v: &Value) -> Kind {
    match v {
        Value::Null | Value::Undefined => Kind::NullOrUndefined,
        Value::Seq(_) => Kind::Seq,
        Value::Map(_) => Kind::Map,
        _ => Kind::Scalar,
    }
}

/// Merges a single-branch pair tree (`branch`, always a one-entry map at
/// its root) into the accumulator `root` (always a map).
pub(crate) fn merge_into(
    root: &Value,
    branch: Value,
    list_limit: i64,
    throw_on_limit_exceeded: bool,
) -> Result<(), QsError> {
    let Value::Map(root_map) = root else {
        return Ok(());
    };
    let Value::Map(branch_map) = branch else {
        return Ok(());
    };

    let entries = {
        let mut b = branch_map.borrow_mut();
        std::mem::take(&mut b.entries)
    };

    let mut stack: Vec<Task> = entries
        .into_iter()
        .map(|(k, v)| Task {
            slot: Slot::MapKey(Rc::clone(root_map), k),
            source: v,
        })
        .collect();

    while let Some(Task { slot, source }) = stack.pop() {
        let existing = slot.read();
        let merged = combine(existing, source, &mut stack, list_limit, throw_on_limit_exceeded)?;
        slot.write(merged);
    }
    Ok(())
}

fn combine(
    target: Value,
    source: Value,
    stack: &mut Vec<Task>,
    list_limit: i64,
    throw_on_limit_exceeded: bool,
) -> Result<Value, QsError> {
    match classify(&target) {
        Kind::NullOrUndefined => Ok(source),
        Kind::Scalar => Ok(combine_from_scalar(target, source)),
        Kind::Seq => combine_from_seq(target, source, stack, list_limit, throw_on_limit_exceeded),
        Kind::Map => combine_from_map(target, source, stack, list_limit, throw_on_limit_exceeded),
    }
}

fn combine_from_scalar(target: Value, source: Value) -> Value {
    let mut items = vec![target];
    match source {
        Value::Seq(s) => items.extend(s.borrow().iter().cloned().filter(|v| !v.is_undefined())),
        other => items.push(other),
    }
    Value::seq_from(items)
}

fn seq_has_undefined(seq: &Rc<RefCell<SeqData>>) -> bool {
    seq.borrow().iter().any(Value::is_undefined)
}

fn all_maps_or_undefined(seq: &Rc<RefCell<SeqData>>) -> bool {
    seq.borrow()
        .iter()
        .all(|v| matches!(v, Value::Map(_)) || v.is_undefined())
}

fn promote_seq_to_map(seq: &Rc<RefCell<SeqData>>) -> Rc<RefCell<MapData>> {
    let items = std::mem::take(&mut *seq.borrow_mut());
    let max_index = if items.is_empty() { None } else { Some((items.len() - 1) as u64) };
    let mut entries = Entries::new();
    for (i, v) in items.into_iter().enumerate() {
        entries.insert(i.to_string(), v);
    }
    let mut data = MapData::from_entries(entries);
    data.max_index = max_index;
    Rc::new(RefCell::new(data))
}

/// Finishes building a plain sequence from `items`, converting it to an
/// overflow-tagged map if it grew past `list_limit`. A negative
/// `list_limit` means unlimited.
fn finish_seq(items: Vec<Value>, list_limit: i64, throw_on_limit_exceeded: bool) -> Result<Value, QsError> {
    if list_limit >= 0 && items.len() as i64 > list_limit {
        if throw_on_limit_exceeded {
            tracing::warn!(limit = list_limit, actual = items.len(), "list limit exceeded during merge");
            return Err(QsError::ListLimitExceeded {
                limit: list_limit,
                actual: items.len(),
            });
        }
        let max_index = (items.len() - 1) as u64;
        let mut entries = Entries::new();
        for (i, v) in items.into_iter().enumerate() {
            entries.insert(i.to_string(), v);
        }
        let mut data = MapData::from_entries(entries);
        data.max_index = Some(max_index);
        return Ok(Value::Map(Rc::new(RefCell::new(data))));
    }
    Ok(Value::seq_from(items))
}

fn combine_from_seq(
    target: Value,
    source: Value,
    stack: &mut Vec<Task>,
    list_limit: i64,
    throw_on_limit_exceeded: bool,
) -> Result<Value, QsError> {
    let Value::Seq(target_rc) = target else { unreachable!() };

    match classify(&source) {
        Kind::NullOrUndefined if matches!(source, Value::Undefined) => Ok(Value::Seq(target_rc)),
        Kind::Seq => {
            let Value::Seq(source_rc) = source else { unreachable!() };
            if all_maps_or_undefined(&target_rc) && all_maps_or_undefined(&source_rc) {
                let target_items = std::mem::take(&mut *target_rc.borrow_mut());
                let source_items = std::mem::take(&mut *source_rc.borrow_mut());
                let max_len = target_items.len().max(source_items.len());
                let new_seq = Rc::new(RefCell::new(vec![Value::Undefined; max_len]));
                {
                    let mut ns = new_seq.borrow_mut();
                    for (i, v) in target_items.into_iter().enumerate() {
                        ns[i] = v;
                    }
                }
                for (i, sv) in source_items.into_iter().enumerate() {
                    stack.push(Task {
                        slot: Slot::SeqIndex(Rc::clone(&new_seq), i),
                        source: sv,
                    });
                }
                Ok(Value::Seq(new_seq))
            } else {
                let mut items = std::mem::take(&mut *target_rc.borrow_mut());
                items.extend(
                    std::mem::take(&mut *source_rc.borrow_mut())
                        .into_iter()
                        .filter(|v| !v.is_undefined()),
                );
                finish_seq(items, list_limit, throw_on_limit_exceeded)
            }
        }
        Kind::Map => {
            let target_map = promote_seq_to_map(&target_rc);
            combine_from_map(Value::Map(target_map), source, stack, list_limit, throw_on_limit_exceeded)
        }
        _ => {
            // Scalar or a literal Null leaf: append, promoting to an
            // index-map first if the target is already sparse.
            if seq_has_undefined(&target_rc) {
                let map = promote_seq_to_map(&target_rc);
                map.borrow_mut().push_overflow(source);
                Ok(Value::Map(map))
            } else {
                let mut items = std::mem::take(&mut *target_rc.borrow_mut());
                items.push(source);
                finish_seq(items, list_limit, throw_on_limit_exceeded)
            }
        }
    }
}

fn combine_from_map(
    target: Value,
    source: Value,
    stack: &mut Vec<Task>,
    list_limit: i64,
    throw_on_limit_exceeded: bool,
) -> Result<Value, QsError> {
    let Value::Map(target_rc) = target else { unreachable!() };

    match classify(&source) {
        Kind::Map => {
            let Value::Map(source_rc) = source else { unreachable!() };
            let source_entries = {
                let mut s = source_rc.borrow_mut();
                std::mem::take(&mut s.entries)
            };
            for (k, v) in source_entries {
                let already_present = target_rc.borrow().entries.contains_key(&k);
                if already_present {
                    stack.push(Task {
                        slot: Slot::MapKey(Rc::clone(&target_rc), k),
                        source: v,
                    });
                } else {
                    target_rc.borrow_mut().entries.insert(k, v);
                }
            }
            Ok(Value::Map(target_rc))
        }
        Kind::Seq => {
            let Value::Seq(source_rc) = source else { unreachable!() };
            let items = std::mem::take(&mut *source_rc.borrow_mut());
            for v in items.into_iter().filter(|v| !v.is_undefined()) {
                target_rc.borrow_mut().push_overflow(v);
            }
            Ok(Value::Map(target_rc))
        }
        _ => {
            if !matches!(source, Value::Undefined) {
                target_rc.borrow_mut().push_overflow(source);
            }
            Ok(Value::Map(target_rc))
        }
    }
}
