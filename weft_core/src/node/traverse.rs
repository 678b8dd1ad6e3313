// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Borrowing walks over a [`NodeTree`].

use alloc::vec::Vec;
use core::iter::FusedIterator;
use core::slice;

use super::id::{INVALID, NodeId};
use super::store::NodeTree;

/// A node's children in order. Created by [`NodeTree::children`].
#[derive(Clone, Debug)]
pub struct Children<'a> {
    tree: &'a NodeTree,
    slots: slice::Iter<'a, u32>,
}

impl<'a> Children<'a> {
    pub(crate) fn new(tree: &'a NodeTree, slots: &'a [u32]) -> Self {
        Self {
            tree,
            slots: slots.iter(),
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let &slot = self.slots.next()?;
        Some(self.tree.id_at(slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let &slot = self.slots.next_back()?;
        Some(self.tree.id_at(slot))
    }
}

impl ExactSizeIterator for Children<'_> {}
impl FusedIterator for Children<'_> {}

/// Parent, grandparent, and so on up to the root, excluding the start node.
/// Created by [`NodeTree::ancestors`].
#[derive(Clone, Debug)]
pub struct Ancestors<'a> {
    tree: &'a NodeTree,
    next: u32,
}

impl<'a> Ancestors<'a> {
    pub(crate) fn new(tree: &'a NodeTree, start: u32) -> Self {
        Self {
            tree,
            next: tree.parent_slot(start),
        }
    }
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        (self.next != INVALID).then(|| {
            let slot = self.next;
            self.next = self.tree.parent_slot(slot);
            self.tree.id_at(slot)
        })
    }
}

impl FusedIterator for Ancestors<'_> {}

/// Slots of a subtree in pre-order, the start node first.
#[derive(Debug)]
pub(crate) struct Subtree<'a> {
    tree: &'a NodeTree,
    pending: Vec<u32>,
}

impl<'a> Subtree<'a> {
    pub(crate) fn new(tree: &'a NodeTree, root: u32) -> Self {
        Self {
            tree,
            pending: alloc::vec![root],
        }
    }
}

impl Iterator for Subtree<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let slot = self.pending.pop()?;
        // Reversed so the first child is visited next.
        self.pending
            .extend(self.tree.child_slots(slot).iter().rev());
        Some(slot)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn subtree_is_pre_order() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let a = tree.create_node();
        let a1 = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, a).unwrap();
        tree.add_child(a, a1).unwrap();
        tree.add_child(root, b).unwrap();

        let order: Vec<NodeId> = Subtree::new(&tree, root.index())
            .map(|slot| tree.id_at(slot))
            .collect();
        assert_eq!(order, vec![root, a, a1, b]);
        assert_eq!(tree.children(root).rev().collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(tree.ancestors(a1).collect::<Vec<_>>(), vec![a, root]);
    }
}
