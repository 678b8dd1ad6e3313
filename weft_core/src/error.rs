// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural errors.
//!
//! Tree mutations validate their arguments up front and return a
//! [`StructuralError`] without touching the tree. A rejected mutation never
//! reaches a [`Transaction`](crate::transaction::Transaction).

use crate::node::NodeId;

/// A tree mutation that would break the tree's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StructuralError {
    /// The handle refers to a destroyed node.
    #[error("stale node handle {0:?}")]
    StaleNode(NodeId),
    /// A child index outside the valid range.
    #[error("index {index} out of range for {len} children")]
    InvalidIndex {
        /// The rejected index.
        index: usize,
        /// The parent's child count.
        len: usize,
    },
    /// Inserting `child` under `parent` would make a node its own ancestor.
    #[error("inserting {child:?} under {parent:?} would create a cycle")]
    Cycle {
        /// The would-be parent.
        parent: NodeId,
        /// The would-be child.
        child: NodeId,
    },
    /// The child already has a parent; remove it first.
    #[error("{child:?} is already a child of {parent:?}")]
    AlreadyAttached {
        /// The child being inserted.
        child: NodeId,
        /// Its current parent.
        parent: NodeId,
    },
    /// The node has no parent to be removed from.
    #[error("{0:?} has no parent")]
    NotAttached(NodeId),
    /// The node still has children; remove them first.
    #[error("{0:?} still has children")]
    HasChildren(NodeId),
}
