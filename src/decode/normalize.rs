//! String-key normalizer (`to_string_key_deep`).
//!
//! Copies the working tree into a fresh, final tree using an explicit
//! work-stack and an identity-keyed memo from source container to
//! destination container, so shared or self-referential substructure is
//! preserved rather than duplicated or infinitely re-expanded.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::{MapData, SeqData, Value};

enum Slot {
    MapKey(Rc<RefCell<MapData>>, String),
    SeqIndex(Rc<RefCell<SeqData>>, usize),
}

fn write_slot(slot: &Slot, value: Value) {
    match slot {
        Slot::MapKey(m, k) => {
            m.borrow_mut().entries.insert(k.clone(), value);
        }
        Slot::SeqIndex(s, i) => {
            s.borrow_mut()[*i] = value;
        }
    }
}

/// Either returns the already-built destination value for a container seen
/// before (identity preserved), or allocates an empty destination shell,
/// registers it in `memo` before recursing so cycles terminate, and queues
/// its children for normalization.
fn visit(src: &Value, memo: &mut HashMap<usize, Value>, stack: &mut Vec<(Value, Slot)>) -> Value {
    match src {
        Value::Map(m) => {
            let id = src.identity().expect("map values carry an identity");
            if let Some(existing) = memo.get(&id) {
                return existing.clone();
            }
            let dest_rc = Rc::new(RefCell::new(MapData::new()));
            let dest = Value::Map(Rc::clone(&dest_rc));
            memo.insert(id, dest.clone());

            let max_index = m.borrow().max_index;
            let children: Vec<(String, Value)> =
                m.borrow().entries.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            {
                let mut data = dest_rc.borrow_mut();
                data.max_index = max_index;
                for (k, _) in &children {
                    data.entries.insert(k.clone(), Value::Undefined);
                }
            }
            for (k, child) in children {
                stack.push((child, Slot::MapKey(Rc::clone(&dest_rc), k)));
            }
            dest
        }
        Value::Seq(s) => {
            let id = src.identity().expect("seq values carry an identity");
            if let Some(existing) = memo.get(&id) {
                return existing.clone();
            }
            let children: Vec<Value> = s.borrow().clone();
            let dest_rc = Rc::new(RefCell::new(vec![Value::Undefined; children.len()]));
            let dest = Value::Seq(Rc::clone(&dest_rc));
            memo.insert(id, dest.clone());

            for (i, child) in children.into_iter().enumerate() {
                stack.push((child, Slot::SeqIndex(Rc::clone(&dest_rc), i)));
            }
            dest
        }
        other => other.clone(),
    }
}

pub(crate) fn to_string_key_deep(root: &Value) -> Value {
    let mut memo: HashMap<usize, Value> = HashMap::new();
    let mut stack: Vec<(Value, Slot)> = Vec::new();

    let root_dest = visit(root, &mut memo, &mut stack);
    while let Some((src, slot)) = stack.pop() {
        let dest_child = visit(&src, &mut memo, &mut stack);
        write_slot(&slot, dest_child);
    }
    root_dest
}
