// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying transactions to the tree and the view hierarchy.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::diagnostics::Diagnostic;
use crate::engine::{NodeLayoutRecord, PassOutput};
use crate::hierarchy::ViewHierarchy;
use crate::scheduler::PassId;
use crate::transaction::{Transaction, TransactionId, TxEntry, TxOp, diff_children};

use super::id::{INVALID, NodeId};
use super::store::{CommittedLayout, NodeState, NodeTree};
use super::traverse::Subtree;

/// What a commit did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// The committed transaction.
    pub transaction: TransactionId,
    /// The transaction had been committed before; nothing was applied.
    pub already_committed: bool,
    /// Structural operations sent to the hierarchy.
    pub structural: usize,
    /// Nodes whose layout was applied, in application order.
    pub applied: Vec<NodeId>,
    /// Records rejected because their node changed after the snapshot.
    pub stale: usize,
    /// Records no newer than what was already committed.
    pub duplicates: usize,
    /// Records for nodes destroyed since the snapshot.
    pub dropped: usize,
    /// Pass roots whose result was stale and that need a new pass.
    pub requeue: Vec<NodeId>,
}

enum Verdict {
    Accept(u32),
    Stale,
    Duplicate,
    Dead,
}

impl NodeTree {
    /// Starts a transaction.
    pub fn begin_transaction(&mut self) -> Transaction {
        self.next_transaction += 1;
        Transaction::new(TransactionId(self.next_transaction))
    }

    /// Returns `true` if child-list changes are waiting for a commit.
    #[must_use]
    pub fn has_pending_structure(&self) -> bool {
        !self.touched.is_empty()
    }

    /// Commits `tx`: replays pending child-list changes, then applies every
    /// layout record that is still current.
    ///
    /// A record is applied only if its node is alive, its generation is the
    /// node's current generation, it is newer than the committed layout
    /// (compared by generation, then pass), and the record of its parent in
    /// the same pass was applied. Committing the same transaction twice is a
    /// no-op.
    pub fn commit(&mut self, tx: &mut Transaction, hierarchy: &mut dyn ViewHierarchy) -> CommitReport {
        let mut report = CommitReport {
            transaction: tx.id,
            ..CommitReport::default()
        };
        if tx.committed {
            report.already_committed = true;
            return report;
        }

        report.structural = self.commit_structure(tx, hierarchy);

        let passes = core::mem::take(&mut tx.passes);
        let mut applied: Vec<(usize, usize)> = Vec::new();
        // Nodes of the current pass whose committed layout matches the pass.
        let mut settled: Vec<NodeId> = Vec::new();
        for (p, pass) in passes.iter().enumerate() {
            let mut root_stale = false;
            settled.clear();
            for (r, record) in pass.records.iter().enumerate() {
                let verdict = match record.parent {
                    // Positioned by a parent layout that did not apply.
                    Some(parent) if !settled.contains(&parent) && self.is_alive(record.node) => {
                        Verdict::Stale
                    }
                    _ => self.classify(record, pass.pass),
                };
                match verdict {
                    Verdict::Accept(idx) => {
                        self.accept(idx, record, pass);
                        settled.push(record.node);
                        applied.push((p, r));
                    }
                    Verdict::Stale => {
                        report.stale += 1;
                        root_stale |= record.node == pass.root;
                    }
                    Verdict::Duplicate => {
                        settled.push(record.node);
                        report.duplicates += 1;
                    }
                    Verdict::Dead => report.dropped += 1,
                }
            }
            if root_stale && self.is_alive(pass.root) && !report.requeue.contains(&pass.root) {
                report.requeue.push(pass.root);
            } else if settled.contains(&pass.root) {
                self.release_unreached(pass);
            }
        }

        for &(p, r) in &applied {
            let record = &passes[p].records[r];
            if let Some(frame) = self.committed_frame(record.node) {
                hierarchy.apply_frame(record.node, frame);
            }
            tx.entries.push(TxEntry {
                node: record.node,
                op: TxOp::Relayout {
                    generation: record.generation,
                },
            });
            report.applied.push(record.node);
        }

        for &(p, r) in &applied {
            let pass = &passes[p];
            let record = &pass.records[r];
            let diagnostics: Vec<Diagnostic> = pass
                .diagnostics
                .iter()
                .filter(|d| match d.owner() {
                    Some(owner) => owner == record.node,
                    None => record.node == pass.root,
                })
                .cloned()
                .collect();
            hierarchy.did_commit_layout(record.node, &record.layout, &diagnostics);
        }

        log::trace!(
            "commit {:?}: {} structural, {} applied, {} stale, {} duplicate",
            tx.id,
            report.structural,
            report.applied.len(),
            report.stale,
            report.duplicates
        );
        tx.passes = passes;
        tx.committed = true;
        report
    }

    fn commit_structure(&mut self, tx: &mut Transaction, hierarchy: &mut dyn ViewHierarchy) -> usize {
        let touched = core::mem::take(&mut self.touched);
        let mut removals = Vec::new();
        let mut moves = Vec::new();
        let mut inserts = Vec::new();
        for parent in touched {
            let old = self.view_children.remove(&parent).unwrap_or_default();
            let new: Vec<NodeId> = if self.is_alive(parent) {
                self.children(parent).collect()
            } else {
                Vec::new()
            };
            let diff = diff_children(&old, &new);
            removals.extend(diff.removals.into_iter().map(|(c, i)| (parent, c, i)));
            moves.extend(diff.moves.into_iter().map(|(c, f, t)| (parent, c, f, t)));
            inserts.extend(diff.inserts.into_iter().map(|(c, i)| (parent, c, i)));
            if !new.is_empty() {
                self.view_children.insert(parent, new);
            }
        }

        let count = removals.len() + moves.len() + inserts.len();
        for (parent, child, index) in removals {
            hierarchy.remove(parent, child, index);
            tx.entries.push(TxEntry {
                node: child,
                op: TxOp::Remove { parent, index },
            });
        }
        for (parent, child, from, to) in moves {
            hierarchy.move_child(parent, child, from, to);
            tx.entries.push(TxEntry {
                node: child,
                op: TxOp::Move { parent, from, to },
            });
        }
        for (parent, child, index) in inserts {
            hierarchy.insert(parent, child, index);
            tx.entries.push(TxEntry {
                node: child,
                op: TxOp::Insert { parent, index },
            });
        }
        count
    }

    /// Nodes under a committed pass root that the pass never laid out.
    fn release_unreached(&mut self, pass: &PassOutput) {
        let reached: BTreeSet<NodeId> = pass.records.iter().map(|r| r.node).collect();
        let unreached: Vec<u32> = Subtree::new(self, pass.root.idx)
            .filter(|&idx| {
                self.state[idx as usize] == NodeState::LayoutPending
                    && !reached.contains(&self.id_at(idx))
            })
            .collect();
        for idx in unreached {
            self.state[idx as usize] = NodeState::Dirty;
        }
    }

    fn classify(&self, record: &NodeLayoutRecord, pass: PassId) -> Verdict {
        if !self.is_alive(record.node) {
            return Verdict::Dead;
        }
        let idx = record.node.idx;
        if record.generation != self.generation[idx as usize] {
            return Verdict::Stale;
        }
        match &self.committed[idx as usize] {
            Some(c) if (c.generation, c.pass) >= (record.generation, pass) => Verdict::Duplicate,
            _ => Verdict::Accept(idx),
        }
    }

    fn accept(&mut self, idx: u32, record: &NodeLayoutRecord, pass: &PassOutput) {
        let i = idx as usize;
        // A pass root inside a larger tree keeps the origin its parent gave it.
        let frame = if record.node == pass.root && self.parent[i] != INVALID {
            let origin = self.committed[i].as_ref().map_or(Point::ORIGIN, |c| c.frame.origin());
            Rect::from_origin_size(origin, record.frame.size())
        } else {
            record.frame
        };
        self.committed[i] = Some(CommittedLayout {
            generation: record.generation,
            pass: pass.pass,
            layout: record.layout.clone(),
            frame,
        });
        self.state[i] = NodeState::Clean;
        self.cache[i].insert(record.generation, record.range, record.layout.clone());
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use alloc::vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use kurbo::Size;

    use crate::dimension::SizeRange;
    use crate::element::{Element, MeasureError, Stack};
    use crate::engine::compute_pass;
    use crate::layout::Layout;
    use crate::style::Style;

    use super::*;

    #[derive(Debug, Default)]
    struct Recording {
        ops: Vec<&'static str>,
        frames: Vec<(NodeId, Rect)>,
        callbacks: Vec<(NodeId, usize)>,
    }

    impl ViewHierarchy for Recording {
        fn insert(&mut self, _: NodeId, _: NodeId, _: usize) {
            self.ops.push("insert");
        }
        fn remove(&mut self, _: NodeId, _: NodeId, _: usize) {
            self.ops.push("remove");
        }
        fn move_child(&mut self, _: NodeId, _: NodeId, _: usize, _: usize) {
            self.ops.push("move");
        }
        fn apply_frame(&mut self, node: NodeId, frame: Rect) {
            self.ops.push("frame");
            self.frames.push((node, frame));
        }
        fn did_commit_layout(&mut self, node: NodeId, _: &Layout, diagnostics: &[Diagnostic]) {
            self.ops.push("callback");
            self.callbacks.push((node, diagnostics.len()));
        }
    }

    fn row(tree: &mut NodeTree, widths: &[f64]) -> (NodeId, Vec<NodeId>) {
        let root = tree.create_node();
        let mut kids = vec![];
        for &w in widths {
            let k = tree.create_node();
            tree.set_style(k, Style::preferred(Size::new(w, 10.0))).unwrap();
            tree.add_child(root, k).unwrap();
            kids.push(k);
        }
        tree.set_provider(root, |_: SizeRange, kids: &[NodeId]| {
            Element::from(Stack::horizontal().children(kids.iter().map(|&k| Element::node(k))))
        })
        .unwrap();
        (root, kids)
    }

    fn run_pass(tree: &mut NodeTree, root: NodeId, pass: u64) -> PassOutput {
        let range = SizeRange::up_to(Size::new(100.0, 100.0));
        let snapshot = tree.begin_pass(root, range).unwrap();
        compute_pass(&snapshot, range, PassId(pass))
    }

    #[test]
    fn structure_precedes_frames_and_callbacks_come_last() {
        let mut tree = NodeTree::new();
        let (root, kids) = row(&mut tree, &[10.0, 20.0]);
        let out = run_pass(&mut tree, root, 1);

        let mut tx = tree.begin_transaction();
        tx.add_pass(out);
        let mut views = Recording::default();
        let report = tree.commit(&mut tx, &mut views);

        assert_eq!(report.structural, 2);
        assert_eq!(report.applied, vec![root, kids[0], kids[1]]);
        assert_eq!(
            views.ops,
            vec!["insert", "insert", "frame", "frame", "frame", "callback", "callback", "callback"]
        );
        assert_eq!(views.frames[2], (kids[1], Rect::new(10.0, 0.0, 30.0, 10.0)));
        assert_eq!(tree.state(kids[1]), NodeState::Clean);
        assert_eq!(tree.committed_frame(kids[0]), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn committing_twice_is_a_no_op() {
        let mut tree = NodeTree::new();
        let (root, _) = row(&mut tree, &[10.0]);
        let out = run_pass(&mut tree, root, 1);
        let mut tx = tree.begin_transaction();
        tx.add_pass(out);

        let mut views = Recording::default();
        let first = tree.commit(&mut tx, &mut views);
        let ops_after_first = views.ops.len();
        let second = tree.commit(&mut tx, &mut views);

        assert!(!first.already_committed);
        assert!(second.already_committed);
        assert!(second.applied.is_empty());
        assert_eq!(views.ops.len(), ops_after_first);
    }

    #[test]
    fn replaying_a_cloned_transaction_applies_nothing_new() {
        let mut tree = NodeTree::new();
        let (root, _) = row(&mut tree, &[10.0]);
        let out = run_pass(&mut tree, root, 1);
        let mut tx = tree.begin_transaction();
        tx.add_pass(out.clone());
        let mut views = Recording::default();
        let _ = tree.commit(&mut tx, &mut views);

        let mut again = tree.begin_transaction();
        again.add_pass(out);
        let report = tree.commit(&mut again, &mut views);
        assert!(report.applied.is_empty());
        assert_eq!(report.duplicates, 2);
    }

    #[test]
    fn stale_pass_is_rejected_and_requeued() {
        let mut tree = NodeTree::new();
        let (root, kids) = row(&mut tree, &[10.0, 20.0]);
        let out = run_pass(&mut tree, root, 1);

        tree.set_style(kids[0], Style::preferred(Size::new(15.0, 10.0))).unwrap();

        let mut tx = tree.begin_transaction();
        tx.add_pass(out);
        let mut views = Recording::default();
        let report = tree.commit(&mut tx, &mut views);

        // The sibling did not change, but its position came from the stale
        // root layout.
        assert!(report.applied.is_empty());
        assert_eq!(report.stale, 3);
        assert_eq!(report.requeue, vec![root]);
        assert_eq!(tree.state(root), NodeState::Dirty);
        assert_eq!(tree.committed_layout(root), None);
    }

    #[test]
    fn destroyed_node_records_are_dropped() {
        let mut tree = NodeTree::new();
        let (root, kids) = row(&mut tree, &[10.0, 20.0]);
        let out = run_pass(&mut tree, root, 1);
        tree.remove_child(kids[1]).unwrap();
        tree.destroy_node(kids[1]).unwrap();

        let mut tx = tree.begin_transaction();
        tx.add_pass(out);
        let mut views = Recording::default();
        let report = tree.commit(&mut tx, &mut views);
        assert_eq!(report.dropped, 1);
        assert_eq!(report.stale, 2);
        assert!(report.applied.is_empty());
        assert_eq!(report.requeue, vec![root]);
        // Added and removed before the hierarchy ever saw it.
        assert_eq!(views.ops.iter().filter(|o| **o == "insert").count(), 1);
        assert_eq!(views.ops.iter().filter(|o| **o == "remove").count(), 0);
    }

    #[test]
    fn diagnostics_reach_their_owner() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let child = tree.create_node();
        tree.add_child(root, child).unwrap();
        tree.set_measure(child, |_: SizeRange| -> Result<Size, MeasureError> { Err(MeasureError::new("boom")) })
            .unwrap();
        tree.set_provider(root, |_: SizeRange, kids: &[NodeId]| {
            Element::from(Stack::vertical().children(kids.iter().map(|&k| Element::node(k))))
        })
        .unwrap();
        let out = run_pass(&mut tree, root, 1);

        let mut tx = tree.begin_transaction();
        tx.add_pass(out);
        let mut views = Recording::default();
        let _ = tree.commit(&mut tx, &mut views);
        assert_eq!(views.callbacks, vec![(root, 0), (child, 1)]);
    }

    #[test]
    fn cached_layout_recommits_its_descendants() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let kid = tree.create_node();
        tree.add_child(root, kid).unwrap();
        tree.set_style(kid, Style::DEFAULT.grow(1.0)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        tree.set_provider(root, move |_: SizeRange, kids: &[NodeId]| {
            counter.fetch_add(1, Ordering::Relaxed);
            Element::from(Stack::horizontal().children(kids.iter().map(|&k| Element::node(k))))
        })
        .unwrap();

        let mut views = Recording::default();
        for (pass, width) in [(1, 100.0), (2, 200.0), (3, 100.0)] {
            let range = SizeRange::exact(Size::new(width, 10.0));
            let snapshot = tree.begin_pass(root, range).unwrap();
            let out = compute_pass(&snapshot, range, PassId(pass));
            let mut tx = tree.begin_transaction();
            tx.add_pass(out);
            let report = tree.commit(&mut tx, &mut views);
            assert_eq!(report.applied, vec![root, kid], "pass {pass}");
        }

        // The third pass reused the first pass's layouts.
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        let expected = Rect::new(0.0, 0.0, 100.0, 10.0);
        assert_eq!(tree.committed_frame(root), Some(expected));
        assert_eq!(tree.committed_frame(kid), Some(expected));
        assert_eq!(views.frames.last(), Some(&(kid, expected)));
        assert_eq!(tree.committed(kid).map(|c| c.pass), Some(PassId(3)));
    }

    #[test]
    fn children_the_provider_skips_are_not_left_pending() {
        let mut tree = NodeTree::new();
        let (root, kids) = row(&mut tree, &[10.0, 20.0]);
        let shown = kids[0];
        tree.set_provider(root, move |_: SizeRange, _: &[NodeId]| Element::node(shown))
            .unwrap();
        let out = run_pass(&mut tree, root, 1);
        assert_eq!(tree.state(kids[1]), NodeState::LayoutPending);

        let mut tx = tree.begin_transaction();
        tx.add_pass(out);
        let report = tree.commit(&mut tx, &mut Recording::default());
        assert_eq!(report.applied, vec![root, shown]);
        assert_eq!(tree.state(shown), NodeState::Clean);
        assert_eq!(tree.state(kids[1]), NodeState::Dirty);
        assert_eq!(tree.committed(kids[1]), None);
    }

    #[test]
    fn moves_are_replayed_on_commit() {
        let mut tree = NodeTree::new();
        let (root, kids) = row(&mut tree, &[10.0, 20.0, 30.0]);
        let mut views = Recording::default();
        let mut tx = tree.begin_transaction();
        let _ = tree.commit(&mut tx, &mut views);

        tree.move_child(root, 2, 0).unwrap();
        assert!(tree.has_pending_structure());
        let mut tx = tree.begin_transaction();
        let report = tree.commit(&mut tx, &mut views);
        assert_eq!(report.structural, 1);
        assert_eq!(
            tx.entries(),
            &[TxEntry {
                node: kids[2],
                op: TxOp::Move {
                    parent: root,
                    from: 2,
                    to: 0
                }
            }]
        );
    }
}
