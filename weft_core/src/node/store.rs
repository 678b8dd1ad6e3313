// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and invalidation.

use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::dimension::SizeRange;
use crate::dirty;
use crate::element::{ElementProvider, Measure};
use crate::error::StructuralError;
use crate::layout::Layout;
use crate::scheduler::PassId;
use crate::style::Style;

use super::cache::LayoutCache;
use super::id::{Generation, INVALID, NodeId};
use super::snapshot::{NodeSnapshot, TreeSnapshot};
use super::traverse::{Ancestors, Children, Subtree};

/// Layout lifecycle of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// The committed layout matches the current generation.
    Clean,
    /// Changed since the last commit and not yet snapshotted, or left out
    /// of the pass that last included it.
    #[default]
    Dirty,
    /// Included in a pass that has not committed yet.
    LayoutPending,
}

/// The layout most recently committed for a node.
#[derive(Clone, Debug, PartialEq)]
pub struct CommittedLayout {
    /// Generation the layout was computed against.
    pub generation: Generation,
    /// Pass that produced it.
    pub pass: PassId,
    /// The node's layout, at the origin.
    pub layout: Arc<Layout>,
    /// Frame in the parent node's coordinates.
    pub frame: Rect,
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Each node occupies a slot in
/// parallel arrays; destroyed nodes are recycled via a free list, and slot
/// generations reject stale handles.
///
/// Every mutation that can change a layout bumps the [`Generation`] of the
/// node and of each ancestor, marks them dirty, and drops their cached
/// layouts. Child-list changes are not forwarded to the view hierarchy
/// immediately; they are diffed and applied at the next
/// [`commit`](Self::commit).
pub struct NodeTree {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) children: Vec<Vec<u32>>,

    // -- Content (set by callers) --
    pub(crate) style: Vec<Style>,
    pub(crate) provider: Vec<Option<Arc<dyn ElementProvider>>>,
    pub(crate) measure: Vec<Option<Arc<dyn Measure>>>,

    // -- Layout state --
    pub(crate) generation: Vec<Generation>,
    pub(crate) state: Vec<NodeState>,
    pub(crate) committed: Vec<Option<CommittedLayout>>,
    pub(crate) cache: Vec<LayoutCache>,
    pub(crate) last_range: Vec<Option<SizeRange>>,

    // -- Allocation --
    pub(crate) slot_generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- View mirror --
    //
    // The child lists the hierarchy last received, keyed by handle so a
    // reused slot cannot inherit them.
    pub(crate) view_children: BTreeMap<NodeId, Vec<NodeId>>,
    pub(crate) touched: BTreeSet<NodeId>,

    pub(crate) next_transaction: u64,
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeTree")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .field("touched", &self.touched.len())
            .finish_non_exhaustive()
    }
}

impl NodeTree {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            children: Vec::new(),
            style: Vec::new(),
            provider: Vec::new(),
            measure: Vec::new(),
            generation: Vec::new(),
            state: Vec::new(),
            committed: Vec::new(),
            cache: Vec::new(),
            last_range: Vec::new(),
            slot_generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            view_children: BTreeMap::new(),
            touched: BTreeSet::new(),
            next_transaction: 0,
        }
    }

    // -- Allocation API --

    /// Creates a detached, dirty node with the default style and no content.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.children[i].clear();
            self.style[i] = Style::DEFAULT;
            self.provider[i] = None;
            self.measure[i] = None;
            self.generation[i] = Generation::default();
            self.state[i] = NodeState::Dirty;
            self.committed[i] = None;
            self.cache[i].clear();
            self.last_range[i] = None;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.children.push(Vec::new());
            self.style.push(Style::DEFAULT);
            self.provider.push(None);
            self.measure.push(None);
            self.generation.push(Generation::default());
            self.state.push(NodeState::Dirty);
            self.committed.push(None);
            self.cache.push(LayoutCache::default());
            self.last_range.push(None);
            self.slot_generation.push(0);
            self.alive.push(true);
            idx
        };
        self.dirty.mark(idx, dirty::LAYOUT);
        self.id_at(idx)
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// The node must be detached and have no children.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        if !self.children[idx as usize].is_empty() {
            return Err(StructuralError::HasChildren(id));
        }
        let p = self.parent[idx as usize];
        if p != INVALID {
            return Err(StructuralError::AlreadyAttached {
                child: id,
                parent: self.id_at(p),
            });
        }

        self.dirty.remove_key(idx);
        self.slot_generation[idx as usize] = self.slot_generation[idx as usize].wrapping_add(1);
        self.alive[idx as usize] = false;
        self.provider[idx as usize] = None;
        self.measure[idx as usize] = None;
        self.committed[idx as usize] = None;
        self.cache[idx as usize].clear();
        self.free_list.push(idx);
        if self.view_children.contains_key(&id) {
            self.touched.insert(id);
        }
        Ok(())
    }

    /// Returns whether the handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.slot_generation[id.idx as usize] == id.slot_generation
    }

    // -- Topology API --

    /// Appends `child` to `parent`'s children.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), StructuralError> {
        let index = self.check(parent).map(|p| self.children[p as usize].len())?;
        self.insert_child(parent, child, index)
    }

    /// Inserts `child` into `parent`'s children at `index`.
    ///
    /// `child` must be detached, and inserting it must not create a cycle.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), StructuralError> {
        let p = self.check(parent)?;
        let c = self.check(child)?;
        if p == c || self.ancestors(parent).any(|a| a == child) {
            return Err(StructuralError::Cycle { parent, child });
        }
        let existing = self.parent[c as usize];
        if existing != INVALID {
            return Err(StructuralError::AlreadyAttached {
                child,
                parent: self.id_at(existing),
            });
        }
        let len = self.children[p as usize].len();
        if index > len {
            return Err(StructuralError::InvalidIndex { index, len });
        }

        self.children[p as usize].insert(index, c);
        self.parent[c as usize] = p;
        // The parent's layout depends on the child's.
        let linked = self.dirty.add_dependency(p, c, dirty::LAYOUT);
        debug_assert!(linked.is_ok(), "cycle slipped past the ancestor check");
        self.touched.insert(parent);
        self.invalidate_idx(c);
        Ok(())
    }

    /// Removes `child` from its parent and returns the index it occupied.
    pub fn remove_child(&mut self, child: NodeId) -> Result<usize, StructuralError> {
        let c = self.check(child)?;
        let p = self.parent[c as usize];
        if p == INVALID {
            return Err(StructuralError::NotAttached(child));
        }
        let siblings = &mut self.children[p as usize];
        let Some(index) = siblings.iter().position(|&s| s == c) else {
            return Err(StructuralError::NotAttached(child));
        };
        siblings.remove(index);
        // Invalidate while still attached so the old ancestors are bumped.
        self.invalidate_idx(c);
        self.parent[c as usize] = INVALID;
        self.dirty.remove_dependency(p, c, dirty::LAYOUT);
        self.touched.insert(self.id_at(p));
        Ok(index)
    }

    /// Moves the child at index `from` of `parent` to index `to`.
    pub fn move_child(&mut self, parent: NodeId, from: usize, to: usize) -> Result<(), StructuralError> {
        let p = self.check(parent)?;
        let len = self.children[p as usize].len();
        for index in [from, to] {
            if index >= len {
                return Err(StructuralError::InvalidIndex { index, len });
            }
        }
        if from == to {
            return Ok(());
        }
        let siblings = &mut self.children[p as usize];
        let c = siblings.remove(from);
        siblings.insert(to, c);
        self.touched.insert(parent);
        self.invalidate_idx(p);
        Ok(())
    }

    /// Returns the parent of a node, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.id_at(p))
    }

    /// Returns an iterator over the direct children of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, &self.children[id.idx as usize])
    }

    /// Returns the number of children of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.validate(id);
        self.children[id.idx as usize].len()
    }

    /// Returns an iterator from the parent of a node up to its root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        self.validate(id);
        Ancestors::new(self, id.idx)
    }

    /// Returns the live nodes with no parent.
    #[must_use]
    pub fn roots(&self) -> Vec<NodeId> {
        (0..self.len)
            .filter(|&idx| self.alive[idx as usize] && self.parent[idx as usize] == INVALID)
            .map(|idx| self.id_at(idx))
            .collect()
    }

    // -- Content API (invalidates) --

    /// Sets the style of a node.
    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        self.style[idx as usize] = style;
        self.invalidate_idx(idx);
        Ok(())
    }

    /// Sets the provider that builds the node's element tree.
    pub fn set_provider(
        &mut self,
        id: NodeId,
        provider: impl ElementProvider + 'static,
    ) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        self.provider[idx as usize] = Some(Arc::new(provider));
        self.invalidate_idx(idx);
        Ok(())
    }

    /// Removes the node's provider.
    pub fn clear_provider(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        self.provider[idx as usize] = None;
        self.invalidate_idx(idx);
        Ok(())
    }

    /// Sets the measure used when the node has no provider.
    pub fn set_measure(&mut self, id: NodeId, measure: impl Measure + 'static) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        self.measure[idx as usize] = Some(Arc::new(measure));
        self.invalidate_idx(idx);
        Ok(())
    }

    /// Marks a node's content as changed without altering anything the tree
    /// stores, for providers that read external state.
    pub fn invalidate(&mut self, id: NodeId) -> Result<(), StructuralError> {
        let idx = self.check(id)?;
        self.invalidate_idx(idx);
        Ok(())
    }

    // -- Layout state --

    /// Returns the style of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn style(&self, id: NodeId) -> Style {
        self.validate(id);
        self.style[id.idx as usize]
    }

    /// Returns the current layout generation of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn generation(&self, id: NodeId) -> Generation {
        self.validate(id);
        self.generation[id.idx as usize]
    }

    /// Returns the layout state of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn state(&self, id: NodeId) -> NodeState {
        self.validate(id);
        self.state[id.idx as usize]
    }

    /// Returns the committed layout of a node, or `None` if there is none or
    /// the handle is stale.
    #[must_use]
    pub fn committed(&self, id: NodeId) -> Option<&CommittedLayout> {
        if !self.is_alive(id) {
            return None;
        }
        self.committed[id.idx as usize].as_ref()
    }

    /// Shorthand for the committed layout tree.
    #[must_use]
    pub fn committed_layout(&self, id: NodeId) -> Option<&Arc<Layout>> {
        self.committed(id).map(|c| &c.layout)
    }

    /// Shorthand for the committed frame.
    #[must_use]
    pub fn committed_frame(&self, id: NodeId) -> Option<Rect> {
        self.committed(id).map(|c| c.frame)
    }

    /// The range the node was last laid out in as a pass root.
    #[must_use]
    pub fn last_range(&self, id: NodeId) -> Option<SizeRange> {
        if !self.is_alive(id) {
            return None;
        }
        self.last_range[id.idx as usize]
    }

    /// Drains the set of nodes invalidated since the last call.
    ///
    /// Because invalidation propagates upward, the result contains every
    /// dirty node's ancestors too.
    pub fn take_needs_layout(&mut self) -> Vec<NodeId> {
        let dirty: Vec<u32> = self
            .dirty
            .drain(dirty::LAYOUT)
            .affected()
            .deterministic()
            .run()
            .collect();
        dirty
            .into_iter()
            .filter(|&idx| idx < self.len && self.alive[idx as usize])
            .map(|idx| self.id_at(idx))
            .collect()
    }

    /// Copies the subtree under `root` for a pass.
    pub fn snapshot(&self, root: NodeId) -> Result<TreeSnapshot, StructuralError> {
        self.check(root)?;
        let mut nodes = BTreeMap::new();
        for idx in Subtree::new(self, root.idx) {
            let i = idx as usize;
            let id = self.id_at(idx);
            let generation = self.generation[i];
            nodes.insert(
                id,
                NodeSnapshot {
                    id,
                    generation,
                    style: self.style[i],
                    provider: self.provider[i].clone(),
                    measure: self.measure[i].clone(),
                    children: self.children[i].iter().map(|&c| self.id_at(c)).collect(),
                    cached: self.cache[i].entries_at(generation).to_vec(),
                },
            );
        }
        Ok(TreeSnapshot::new(root, nodes))
    }

    /// Snapshots `root` for a pass at `range` and moves the dirty nodes in it
    /// to [`NodeState::LayoutPending`].
    pub fn begin_pass(&mut self, root: NodeId, range: SizeRange) -> Result<TreeSnapshot, StructuralError> {
        let snapshot = self.snapshot(root)?;
        self.last_range[root.idx as usize] = Some(range);
        for node in snapshot.iter() {
            let state = &mut self.state[node.id.idx as usize];
            if *state == NodeState::Dirty {
                *state = NodeState::LayoutPending;
            }
        }
        Ok(snapshot)
    }

    // -- Internal helpers --

    pub(crate) fn id_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            slot_generation: self.slot_generation[idx as usize],
        }
    }

    pub(crate) fn parent_slot(&self, idx: u32) -> u32 {
        self.parent[idx as usize]
    }

    pub(crate) fn child_slots(&self, idx: u32) -> &[u32] {
        &self.children[idx as usize]
    }

    /// Returns the slot of a live handle.
    pub(crate) fn check(&self, id: NodeId) -> Result<u32, StructuralError> {
        if self.is_alive(id) {
            Ok(id.idx)
        } else {
            Err(StructuralError::StaleNode(id))
        }
    }

    /// Panics if the handle is stale.
    #[track_caller]
    fn validate(&self, id: NodeId) {
        assert!(self.is_alive(id), "stale NodeId: {id:?}");
    }

    /// Bumps the node at `idx` and every ancestor, and marks them dirty.
    fn invalidate_idx(&mut self, idx: u32) {
        let mut current = idx;
        while current != INVALID {
            let i = current as usize;
            self.generation[i] = self.generation[i].next();
            self.state[i] = NodeState::Dirty;
            self.cache[i].clear();
            current = self.parent[i];
        }
        self.dirty.mark_with(idx, dirty::LAYOUT, &EagerPolicy);
    }
}
