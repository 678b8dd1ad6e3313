// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transactions: the unit in which layout results reach the view hierarchy.
//!
//! A [`Transaction`] collects finished passes on the owning thread. Committing
//! it through [`NodeTree::commit`](crate::node::NodeTree::commit) first
//! replays pending child-list changes as a minimal sequence of structural
//! operations, then applies every layout record that is still current. The
//! applied operations are logged as [`TxEntry`] values in execution order.
//!
//! # Structural ordering
//!
//! Per parent, the old and new child lists are diffed with
//! [`diff_children`]. Across all parents the hierarchy then receives every
//! removal, then every move, then every insertion. Removals run from the
//! highest index down, insertions from the lowest index up, and moves keep
//! the longest run of children whose relative order did not change in place.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use crate::engine::PassOutput;
use crate::node::{Generation, NodeId};

/// Identity of a transaction within one tree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransactionId(pub u64);

/// One applied operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxEntry {
    /// The node the operation applies to.
    pub node: NodeId,
    /// What happened.
    pub op: TxOp,
}

/// Kinds of [`TxEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxOp {
    /// Inserted into `parent` at `index`.
    Insert {
        /// The parent.
        parent: NodeId,
        /// Index after insertion.
        index: usize,
    },
    /// Removed from `parent` at `index`.
    Remove {
        /// The parent.
        parent: NodeId,
        /// Index before removal.
        index: usize,
    },
    /// Moved within `parent`.
    Move {
        /// The parent.
        parent: NodeId,
        /// Index before the move.
        from: usize,
        /// Index after the move.
        to: usize,
    },
    /// A new layout was applied.
    Relayout {
        /// Generation of the applied layout.
        generation: Generation,
    },
}

/// A batch of finished passes waiting to be committed.
#[derive(Clone, Debug)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    pub(crate) passes: Vec<PassOutput>,
    pub(crate) entries: Vec<TxEntry>,
    pub(crate) committed: bool,
}

impl Transaction {
    pub(crate) fn new(id: TransactionId) -> Self {
        Self {
            id,
            passes: Vec::new(),
            entries: Vec::new(),
            committed: false,
        }
    }

    /// The transaction id.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Adds a finished pass.
    ///
    /// Passes added after the transaction committed are dropped.
    pub fn add_pass(&mut self, output: PassOutput) {
        if self.committed {
            log::warn!(
                "dropping pass {:?} added to committed transaction {:?}",
                output.pass,
                self.id
            );
            return;
        }
        self.passes.push(output);
    }

    /// Passes collected so far.
    #[must_use]
    pub fn passes(&self) -> &[PassOutput] {
        &self.passes
    }

    /// Operations applied by the commit, in execution order.
    #[must_use]
    pub fn entries(&self) -> &[TxEntry] {
        &self.entries
    }

    /// Returns `true` once the transaction has been committed.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
    }
}

/// Structural operations turning one child list into another.
///
/// Apply `removals`, then `moves`, then `inserts`, each in order; every index
/// refers to the list as it stands when the operation runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChildDiff {
    /// `(child, index)` in descending index order.
    pub removals: Vec<(NodeId, usize)>,
    /// `(child, from, to)`.
    pub moves: Vec<(NodeId, usize, usize)>,
    /// `(child, index)` in ascending index order.
    pub inserts: Vec<(NodeId, usize)>,
}

impl ChildDiff {
    /// Total number of operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.removals.len() + self.moves.len() + self.inserts.len()
    }

    /// Returns `true` if the lists were already equal.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Diffs two child lists. Each list must hold distinct ids.
#[must_use]
pub fn diff_children(old: &[NodeId], new: &[NodeId]) -> ChildDiff {
    let old_set: BTreeSet<NodeId> = old.iter().copied().collect();
    let new_set: BTreeSet<NodeId> = new.iter().copied().collect();
    let mut diff = ChildDiff::default();

    for (index, child) in old.iter().enumerate().rev() {
        if !new_set.contains(child) {
            diff.removals.push((*child, index));
        }
    }

    let mut current: Vec<NodeId> = old.iter().copied().filter(|c| new_set.contains(c)).collect();
    let target: Vec<NodeId> = new.iter().copied().filter(|c| old_set.contains(c)).collect();
    let positions: Vec<usize> = current
        .iter()
        .map(|c| target.iter().position(|t| t == c).unwrap_or(usize::MAX))
        .collect();
    let stable: BTreeSet<NodeId> = longest_increasing_run(&positions)
        .into_iter()
        .map(|i| current[i])
        .collect();

    // Each moved child goes right after its predecessor in the target list;
    // every predecessor is already in final relative order at that point.
    for (j, child) in target.iter().enumerate() {
        if stable.contains(child) {
            continue;
        }
        let Some(from) = current.iter().position(|c| c == child) else {
            continue;
        };
        current.remove(from);
        let to = match j.checked_sub(1) {
            Some(prev) => current
                .iter()
                .position(|c| *c == target[prev])
                .map_or(0, |p| p + 1),
            None => 0,
        };
        current.insert(to, *child);
        if from != to {
            diff.moves.push((*child, from, to));
        }
    }

    for (index, child) in new.iter().enumerate() {
        if !old_set.contains(child) {
            diff.inserts.push((*child, index));
        }
    }
    diff
}

/// Indices of one longest strictly increasing subsequence of `values`.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k] is the index of the smallest tail of an increasing run of
    // length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = alloc::vec![None; values.len()];
    for (i, &v) in values.iter().enumerate() {
        let k = tails.partition_point(|&t| values[t] < v);
        if k > 0 {
            prev[i] = Some(tails[k - 1]);
        }
        if k == tails.len() {
            tails.push(i);
        } else {
            tails[k] = i;
        }
    }
    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(i) = cursor {
        run.push(i);
        cursor = prev[i];
    }
    run.reverse();
    run
}
