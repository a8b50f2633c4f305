//! Immutable linked key-path node.
//!
//! Each traversal frame carries one of these rather than a fully
//! materialized `String`, so that descending one more level is O(1)
//! instead of O(depth) string concatenation. The path is only joined into
//! a single string once, at leaf emission.

use std::rc::Rc;

pub(crate) struct KeyPathNode {
    parent: Option<Rc<KeyPathNode>>,
    segment: String,
    len: usize,
}

impl KeyPathNode {
    pub(crate) fn root(segment: String) -> Rc<Self> {
        let len = segment.len();
        Rc::new(KeyPathNode { parent: None, segment, len })
    }

    pub(crate) fn child(self: &Rc<Self>, segment: String) -> Rc<Self> {
        let len = self.len + segment.len();
        Rc::new(KeyPathNode { parent: Some(Rc::clone(self)), segment, len })
    }

    /// Concatenates every segment from the root down to this node.
    pub(crate) fn materialize(&self) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(self);
        while let Some(node) = cur {
            parts.push(node.segment.as_str());
            cur = node.parent.as_deref();
        }
        let mut out = String::with_capacity(self.len);
        for part in parts.into_iter().rev() {
            out.push_str(part);
        }
        out
    }
}
