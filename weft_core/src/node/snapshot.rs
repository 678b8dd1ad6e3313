// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frozen copies of a subtree for off-thread layout.

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::element::{ElementProvider, Measure};
use crate::style::Style;

use super::cache::CachedLayout;
use super::id::{Generation, NodeId};

/// One node as seen by a pass.
#[derive(Clone)]
pub struct NodeSnapshot {
    /// The node.
    pub id: NodeId,
    /// Its generation when the snapshot was taken.
    pub generation: Generation,
    /// Its style.
    pub style: Style,
    /// Builds its element tree, if set.
    pub provider: Option<Arc<dyn ElementProvider>>,
    /// Measures it when it has no provider.
    pub measure: Option<Arc<dyn Measure>>,
    /// Its children in order.
    pub children: Vec<NodeId>,
    /// Committed layouts valid at `generation`.
    pub cached: Vec<CachedLayout>,
}

impl fmt::Debug for NodeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSnapshot")
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("has_provider", &self.provider.is_some())
            .field("has_measure", &self.measure.is_some())
            .field("children", &self.children)
            .field("cached", &self.cached.len())
            .finish_non_exhaustive()
    }
}

/// A subtree copied out of a [`NodeTree`](super::NodeTree).
///
/// Owns everything a pass reads, so it can be sent to a worker while the
/// tree keeps changing. It is `Send + Sync` because providers and measures
/// are.
#[derive(Clone, Debug)]
pub struct TreeSnapshot {
    root: NodeId,
    nodes: BTreeMap<NodeId, NodeSnapshot>,
}

impl TreeSnapshot {
    pub(crate) fn new(root: NodeId, nodes: BTreeMap<NodeId, NodeSnapshot>) -> Self {
        Self { root, nodes }
    }

    /// The subtree root.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The root's generation.
    #[must_use]
    pub fn root_generation(&self) -> Generation {
        self.nodes
            .get(&self.root)
            .map(|n| n.generation)
            .unwrap_or_default()
    }

    /// Looks up a node.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&NodeSnapshot> {
        self.nodes.get(&id)
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the snapshot holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeSnapshot> {
        self.nodes.values()
    }
}
