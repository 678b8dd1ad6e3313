// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! An in-memory [`ViewHierarchy`] for tests and demos.
//!
//! [`MirrorHierarchy`] applies every call to plain child lists and frame
//! maps, so after a commit it should match the node tree exactly. It panics
//! on an index that does not fit the list it mirrors, which turns an
//! out-of-order commit into a test failure at the offending call.

use std::collections::BTreeMap;

use kurbo::Rect;
use weft_core::diagnostics::Diagnostic;
use weft_core::hierarchy::ViewHierarchy;
use weft_core::layout::Layout;
use weft_core::node::NodeId;

/// One call received by a [`MirrorHierarchy`].
#[derive(Clone, Debug, PartialEq)]
pub enum MirrorOp {
    /// [`ViewHierarchy::insert`].
    Insert {
        /// Parent view.
        parent: NodeId,
        /// Inserted view.
        child: NodeId,
        /// Position in the parent's list.
        index: usize,
    },
    /// [`ViewHierarchy::remove`].
    Remove {
        /// Parent view.
        parent: NodeId,
        /// Removed view.
        child: NodeId,
        /// Position it was removed from.
        index: usize,
    },
    /// [`ViewHierarchy::move_child`].
    Move {
        /// Parent view.
        parent: NodeId,
        /// Moved view.
        child: NodeId,
        /// Old position.
        from: usize,
        /// New position.
        to: usize,
    },
    /// [`ViewHierarchy::apply_frame`].
    Frame {
        /// The view.
        node: NodeId,
        /// New frame.
        frame: Rect,
    },
    /// [`ViewHierarchy::did_commit_layout`].
    Committed {
        /// The view.
        node: NodeId,
    },
}

/// A view tree kept as child lists and frames.
#[derive(Clone, Debug, Default)]
pub struct MirrorHierarchy {
    children: BTreeMap<NodeId, Vec<NodeId>>,
    frames: BTreeMap<NodeId, Rect>,
    layouts: BTreeMap<NodeId, Layout>,
    commits: BTreeMap<NodeId, usize>,
    diagnostics: Vec<(NodeId, Diagnostic)>,
    ops: Vec<MirrorOp>,
}

impl MirrorHierarchy {
    /// Creates an empty mirror.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Children of `parent` in view order.
    #[must_use]
    pub fn children(&self, parent: NodeId) -> &[NodeId] {
        self.children.get(&parent).map_or(&[], Vec::as_slice)
    }

    /// Last frame applied to `node`.
    #[must_use]
    pub fn frame(&self, node: NodeId) -> Option<Rect> {
        self.frames.get(&node).copied()
    }

    /// Last layout committed for `node`.
    #[must_use]
    pub fn layout(&self, node: NodeId) -> Option<&Layout> {
        self.layouts.get(&node)
    }

    /// Number of commits that delivered a layout for `node`.
    #[must_use]
    pub fn commit_count(&self, node: NodeId) -> usize {
        self.commits.get(&node).copied().unwrap_or(0)
    }

    /// Every diagnostic delivered so far, with the node it was delivered to.
    #[must_use]
    pub fn diagnostics(&self) -> &[(NodeId, Diagnostic)] {
        &self.diagnostics
    }

    /// Every call received so far, in order.
    #[must_use]
    pub fn ops(&self) -> &[MirrorOp] {
        &self.ops
    }

    /// Returns the recorded calls and clears the log.
    pub fn take_ops(&mut self) -> Vec<MirrorOp> {
        core::mem::take(&mut self.ops)
    }
}

impl ViewHierarchy for MirrorHierarchy {
    fn insert(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let list = self.children.entry(parent).or_default();
        assert!(
            index <= list.len(),
            "insert index {index} out of range for {} children",
            list.len()
        );
        list.insert(index, child);
        self.ops.push(MirrorOp::Insert {
            parent,
            child,
            index,
        });
    }

    fn remove(&mut self, parent: NodeId, child: NodeId, index: usize) {
        let list = self.children.entry(parent).or_default();
        assert_eq!(
            list.get(index),
            Some(&child),
            "remove index {index} does not hold the removed child"
        );
        list.remove(index);
        self.ops.push(MirrorOp::Remove {
            parent,
            child,
            index,
        });
    }

    fn move_child(&mut self, parent: NodeId, child: NodeId, from: usize, to: usize) {
        let list = self.children.entry(parent).or_default();
        assert_eq!(
            list.get(from),
            Some(&child),
            "move source {from} does not hold the moved child"
        );
        list.remove(from);
        assert!(to <= list.len(), "move target {to} out of range");
        list.insert(to, child);
        self.ops.push(MirrorOp::Move {
            parent,
            child,
            from,
            to,
        });
    }

    fn apply_frame(&mut self, node: NodeId, frame: Rect) {
        self.frames.insert(node, frame);
        self.ops.push(MirrorOp::Frame { node, frame });
    }

    fn did_commit_layout(&mut self, node: NodeId, layout: &Layout, diagnostics: &[Diagnostic]) {
        self.layouts.insert(node, layout.clone());
        *self.commits.entry(node).or_default() += 1;
        self.diagnostics
            .extend(diagnostics.iter().map(|d| (node, d.clone())));
        self.ops.push(MirrorOp::Committed { node });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::node::NodeTree;

    fn ids() -> (NodeId, NodeId, NodeId) {
        let mut tree = NodeTree::new();
        (tree.create_node(), tree.create_node(), tree.create_node())
    }

    #[test]
    fn structural_calls_keep_list_order() {
        let (p, a, b) = ids();
        let mut m = MirrorHierarchy::new();
        m.insert(p, a, 0);
        m.insert(p, b, 1);
        m.move_child(p, b, 1, 0);
        assert_eq!(m.children(p), [b, a]);
        m.remove(p, b, 0);
        assert_eq!(m.children(p), [a]);
        assert_eq!(m.ops().len(), 4);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn insert_past_end_panics() {
        let (p, a, _) = ids();
        MirrorHierarchy::new().insert(p, a, 1);
    }

    #[test]
    #[should_panic(expected = "does not hold the removed child")]
    fn remove_wrong_child_panics() {
        let (p, a, b) = ids();
        let mut m = MirrorHierarchy::new();
        m.insert(p, a, 0);
        m.remove(p, b, 0);
    }
}
