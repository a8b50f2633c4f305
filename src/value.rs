//! The value tree shared by the decoder and the encoder.
//!
//! Containers are `Rc<RefCell<_>>` rather than plain owned collections so that
//! the merge, compaction and encoding phases can track container *identity*:
//! a map that is merged into itself, or an encoder input graph that cycles
//! back on itself, must be detected by reference rather than by deep
//! comparison. Plain owned `Vec`/`IndexMap` trees cannot express that sharing
//! at all; `Rc<RefCell<_>>` is the idiomatic way to model a JS-style mutable
//! object graph in Rust.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

/// An insertion-ordered string-keyed map.
pub type Entries = IndexMap<String, Value>;

/// A map value together with its overflow bookkeeping.
///
/// `max_index` is `Some(n)` when this map was promoted from a sequence that
/// exceeded `list_limit` (an "overflow map"). Appending to an overflow map
/// assigns the key `(max_index + 1).to_string()` and bumps the counter.
#[derive(Debug, Default, PartialEq)]
pub struct MapData {
    pub entries: Entries,
    pub max_index: Option<u64>,
}

impl MapData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: Entries) -> Self {
        Self { entries, max_index: None }
    }

    pub fn is_overflow(&self) -> bool {
        self.max_index.is_some()
    }

    /// Append `value` as the next synthetic numeric key, bumping `max_index`.
    /// Marks this map as an overflow map if it was not one already.
    pub fn push_overflow(&mut self, value: Value) {
        let next = self.max_index.map_or(0, |m| m + 1);
        self.entries.insert(next.to_string(), value);
        self.max_index = Some(next);
    }
}

pub type SeqData = Vec<Value>;

/// A value in the working tree.
///
/// `Undefined` is an internal sentinel for "this slot was omitted"; it must
/// never escape the public API. Compaction removes it from maps and
/// either removes it from sequences (dense mode) or replaces it with `Null`
/// (sparse mode, `allow_sparse_lists`).
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Undefined,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Milliseconds since the Unix epoch, UTC.
    Date(i64),
    Seq(Rc<RefCell<SeqData>>),
    Map(Rc<RefCell<MapData>>),
}

impl Value {
    pub fn map() -> Self {
        Value::Map(Rc::new(RefCell::new(MapData::new())))
    }

    pub fn map_from(entries: Entries) -> Self {
        Value::Map(Rc::new(RefCell::new(MapData::from_entries(entries))))
    }

    pub fn seq() -> Self {
        Value::Seq(Rc::new(RefCell::new(Vec::new())))
    }

    pub fn seq_from(items: SeqData) -> Self {
        Value::Seq(Rc::new(RefCell::new(items)))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    #[must_use]
    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(_))
    }

    /// True for the leaf kinds that the encoder emits as a single
    /// `key=value` fragment without further traversal.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(self, Value::Seq(_) | Value::Map(_))
    }

    /// Reference identity: used by the merger, compactor and encoder to
    /// recognize "this is literally the same container", not merely an
    /// equal one.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Seq(a), Value::Seq(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// A stable identity key for this container, for use in visited-sets.
    /// Returns `None` for non-container values.
    #[must_use]
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Map(m) => Some(Rc::as_ptr(m) as usize),
            Value::Seq(s) => Some(Rc::as_ptr(s) as usize),
            _ => None,
        }
    }

    /// Deep-clones the value, allocating fresh containers (breaking sharing).
    /// Used when the synthesizer or merger must copy a subtree rather than
    /// alias it (e.g. promoting a scalar to a one-element list).
    #[must_use]
    pub fn deep_clone(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Undefined => Value::Undefined,
            Value::Bool(b) => Value::Bool(*b),
            Value::Int(i) => Value::Int(*i),
            Value::Float(f) => Value::Float(*f),
            Value::Str(s) => Value::Str(s.clone()),
            Value::Bytes(b) => Value::Bytes(b.clone()),
            Value::Date(d) => Value::Date(*d),
            Value::Seq(s) => {
                let items = s.borrow().iter().map(Value::deep_clone).collect();
                Value::seq_from(items)
            }
            Value::Map(m) => {
                let m = m.borrow();
                let mut entries = Entries::with_capacity(m.entries.len());
                for (k, v) in &m.entries {
                    entries.insert(k.clone(), v.deep_clone());
                }
                let mut data = MapData::from_entries(entries);
                data.max_index = m.max_index;
                Value::Map(Rc::new(RefCell::new(data)))
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Undefined, Value::Undefined) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            (Value::Map(a), Value::Map(b)) => {
                Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow()
            }
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Undefined => write!(f, "undefined"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Date(ms) => write!(f, "Date({ms})"),
            Value::Seq(s) => write!(f, "[{} items]", s.borrow().len()),
            Value::Map(m) => write!(f, "{{{} entries}}", m.borrow().entries.len()),
        }
    }
}
