//! The cover tree: a prefix trie over ascending attribute ids.
//!
//! A node stands for the attribute set spelled by the path from the root.
//! `is_fd` marks the RHS attributes for which that path is a recorded LHS;
//! `rhs_attrs` is the union of `is_fd` over the node's whole subtree and is
//! what makes generalization/specialization lookups cheap to prune.
//!
//! The same structure serves as both the negative cover (LHS-maximal
//! non-dependencies) and the positive cover (the minimal dependencies)
//! during mining; see [`crate::FDep`].

use fixedbitset::FixedBitSet;

use crate::bitset::{AttrSet, MAX_ATTRS};
use crate::common::AttrId;
use crate::storage::{FdSink, StrippedFd};

#[cfg(test)]
mod tests;

struct Node {
    children: Vec<Option<Box<Node>>>,
    rhs_attrs: AttrSet,
    is_fd: AttrSet,
}

/// A set of FDs indexed by their LHS, supporting subset ("generalization")
/// and superset ("specialization") queries.
pub struct FdTree {
    root: Node,
    num_attrs: usize,
}

impl FdTree {
    pub fn new(num_attrs: usize) -> FdTree {
        assert!(num_attrs <= MAX_ATTRS);
        FdTree {
            root: Node::new(num_attrs),
            num_attrs,
        }
    }

    pub fn num_attrs(&self) -> usize {
        self.num_attrs
    }

    /// Record `lhs -> rhs`. Idempotent.
    pub fn add(&mut self, lhs: &AttrSet, rhs: AttrId) {
        let mut node = &mut self.root;
        node.rhs_attrs.insert(rhs);
        for attr in lhs.iter() {
            let num_attrs = node.children.len();
            node = &mut **node.children[attr.index()]
                .get_or_insert_with(|| Box::new(Node::new(num_attrs)));
            node.rhs_attrs.insert(rhs);
        }
        node.is_fd.insert(rhs);
    }

    /// Record `{} -> a` for every attribute, the most general seed of a
    /// positive cover.
    pub fn add_most_general(&mut self) {
        for attr in 0..self.num_attrs {
            let attr = AttrId::from_usize(attr);
            self.root.rhs_attrs.insert(attr);
            self.root.is_fd.insert(attr);
        }
    }

    /// Is some `Y ⊆ lhs` recorded with RHS `rhs`?
    pub fn contains_generalization(&self, lhs: &AttrSet, rhs: AttrId) -> bool {
        self.root.contains_generalization(lhs, rhs, 0)
    }

    /// Remove one generalization `Y ⊆ lhs` of `lhs -> rhs`, writing `Y` into
    /// `out`. Returns false (leaving `out` empty) if none is recorded.
    pub fn take_generalization(&mut self, lhs: &AttrSet, rhs: AttrId, out: &mut AttrSet) -> bool {
        out.clear();
        self.root.take_generalization(lhs, rhs, 0, out)
    }

    /// Is some proper superset of `lhs` recorded with RHS `rhs`? On success
    /// `out` receives the attributes of one such superset.
    pub fn contains_specialization(&self, lhs: &AttrSet, rhs: AttrId, out: &mut AttrSet) -> bool {
        out.clear();
        self.root
            .contains_specialization(lhs, rhs, 0, false, out)
    }

    /// Drop every entry that has a specialization recorded for the same RHS,
    /// keeping only the LHS-maximal ones. Used on the negative cover, where a
    /// non-dependency witness subsumes all of its subsets.
    pub fn filter_specializations(&mut self) {
        let mut filtered = FdTree::new(self.num_attrs);
        let mut path = AttrSet::new();
        self.root.filter_into(&mut filtered, &mut path);
        *self = filtered;
    }

    /// Visit every recorded `(lhs, rhs)` pair: a node's own FDs first, then
    /// its children in ascending attribute order.
    pub fn for_each_fd(&self, mut f: impl FnMut(&AttrSet, AttrId)) {
        let mut path = AttrSet::new();
        self.root.for_each_fd(&mut path, &mut f);
    }

    /// Emit every recorded FD whose LHS has at most `max_lhs` attributes into
    /// `sink`, as one [`StrippedFd`] per node.
    pub fn emit(&self, sink: &mut dyn FdSink, max_lhs: usize) {
        let mut lhs = FixedBitSet::with_capacity(self.num_attrs);
        self.root.emit(&mut lhs, 0, max_lhs, self.num_attrs, sink);
    }
}

impl Node {
    fn new(num_attrs: usize) -> Node {
        let mut children = Vec::new();
        children.resize_with(num_attrs, || None);
        Node {
            children,
            rhs_attrs: AttrSet::new(),
            is_fd: AttrSet::new(),
        }
    }

    fn child(&self, attr: usize) -> Option<&Node> {
        self.children[attr].as_deref()
    }

    /// Does this node still witness `rhs` once its descendants are ignored?
    /// True exactly when no child subtree claims `rhs`.
    fn is_final(&self, rhs: AttrId) -> bool {
        if !self.rhs_attrs.contains(rhs) {
            return false;
        }
        !self
            .children
            .iter()
            .flatten()
            .any(|child| child.rhs_attrs.contains(rhs))
    }

    fn contains_generalization(&self, lhs: &AttrSet, rhs: AttrId, cursor: usize) -> bool {
        if self.is_fd.contains(rhs) {
            return true;
        }
        let mut next = lhs.next_set_at_or_after(cursor);
        while let Some(attr) = next {
            if let Some(child) = self.child(attr.index()) {
                if child.rhs_attrs.contains(rhs)
                    && child.contains_generalization(lhs, rhs, attr.index() + 1)
                {
                    return true;
                }
            }
            next = lhs.next_set_at_or_after(attr.index() + 1);
        }
        false
    }

    fn take_generalization(
        &mut self,
        lhs: &AttrSet,
        rhs: AttrId,
        cursor: usize,
        out: &mut AttrSet,
    ) -> bool {
        if self.is_fd.contains(rhs) {
            self.is_fd.remove(rhs);
            if self.is_final(rhs) {
                self.rhs_attrs.remove(rhs);
            }
            return true;
        }
        let mut next = lhs.next_set_at_or_after(cursor);
        while let Some(attr) = next {
            let found = match self.children[attr.index()].as_deref_mut() {
                Some(child) if child.rhs_attrs.contains(rhs) => {
                    child.take_generalization(lhs, rhs, attr.index() + 1, out)
                }
                _ => false,
            };
            if found {
                out.insert(attr);
                if self.is_final(rhs) {
                    self.rhs_attrs.remove(rhs);
                }
                return true;
            }
            next = lhs.next_set_at_or_after(attr.index() + 1);
        }
        false
    }

    /// `strict` records whether the path already contains an attribute
    /// outside `lhs`; only then may a node's own entry count as a proper
    /// superset.
    fn contains_specialization(
        &self,
        lhs: &AttrSet,
        rhs: AttrId,
        cursor: usize,
        strict: bool,
        out: &mut AttrSet,
    ) -> bool {
        if !self.rhs_attrs.contains(rhs) {
            return false;
        }
        let needed = lhs.next_set_at_or_after(cursor);
        if strict && needed.is_none() && self.is_fd.contains(rhs) {
            return true;
        }
        let stop = needed.map_or(self.children.len(), |attr| attr.index());
        // Branches below the next needed attribute add extra attributes; the
        // cursor stays put.
        for attr in cursor..stop {
            if let Some(child) = self.child(attr) {
                if child.rhs_attrs.contains(rhs)
                    && child.contains_specialization(lhs, rhs, cursor, true, out)
                {
                    out.insert(AttrId::from_usize(attr));
                    return true;
                }
            }
        }
        // The needed attribute itself, consuming it from the cursor.
        if let Some(attr) = needed {
            if let Some(child) = self.child(attr.index()) {
                if child.rhs_attrs.contains(rhs)
                    && child.contains_specialization(lhs, rhs, attr.index() + 1, strict, out)
                {
                    out.insert(attr);
                    return true;
                }
            }
        }
        false
    }

    fn filter_into(&self, filtered: &mut FdTree, path: &mut AttrSet) {
        // Children first, so the most specific entries are inserted before
        // any of their subsets come up for the containment check.
        for attr in 0..self.children.len() {
            if let Some(child) = self.child(attr) {
                let attr = AttrId::from_usize(attr);
                path.insert(attr);
                child.filter_into(filtered, path);
                path.remove(attr);
            }
        }
        let mut spec = AttrSet::new();
        for rhs in self.is_fd.iter() {
            if !filtered.contains_specialization(path, rhs, &mut spec) {
                filtered.add(path, rhs);
            }
        }
    }

    fn for_each_fd(&self, path: &mut AttrSet, f: &mut impl FnMut(&AttrSet, AttrId)) {
        for rhs in self.is_fd.iter() {
            f(path, rhs);
        }
        for attr in 0..self.children.len() {
            if let Some(child) = self.child(attr) {
                let attr = AttrId::from_usize(attr);
                path.insert(attr);
                child.for_each_fd(path, f);
                path.remove(attr);
            }
        }
    }

    fn emit(
        &self,
        lhs: &mut FixedBitSet,
        depth: usize,
        max_lhs: usize,
        num_attrs: usize,
        sink: &mut dyn FdSink,
    ) {
        if depth > max_lhs {
            return;
        }
        if self.is_fd.any() {
            let rhs = self.is_fd.to_fixed_bitset(num_attrs);
            debug_assert!(
                lhs.is_disjoint(&rhs),
                "a trivial dependency reached the emission pass"
            );
            sink.add_fd(StrippedFd {
                lhs: lhs.clone(),
                rhs,
            });
        }
        for attr in 0..self.children.len() {
            if let Some(child) = self.child(attr) {
                lhs.insert(attr);
                child.emit(lhs, depth + 1, max_lhs, num_attrs, sink);
                lhs.remove(attr);
            }
        }
    }
}
