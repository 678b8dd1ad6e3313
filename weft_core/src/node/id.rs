// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity and layout generations.

use core::fmt;

/// Sentinel value indicating "no node" in index fields.
pub const INVALID: u32 = u32::MAX;

/// A handle to a node in a [`NodeTree`](super::NodeTree).
///
/// Contains both a slot index and a slot generation so that stale handles
/// are detected after a node is destroyed and its slot reused. The slot
/// generation is unrelated to the node's layout [`Generation`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) slot_generation: u32,
}

impl NodeId {
    /// Reassembles a handle from its parts, for example when decoding a
    /// trace recording. The tree still rejects it if the slot was reused.
    #[inline]
    #[must_use]
    pub const fn from_raw(index: u32, slot_generation: u32) -> Self {
        Self {
            idx: index,
            slot_generation,
        }
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the slot generation.
    #[inline]
    #[must_use]
    pub const fn slot_generation(self) -> u32 {
        self.slot_generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@slot{})", self.idx, self.slot_generation)
    }
}

/// A node's layout version.
///
/// Bumped on every style, content or child-list change of the node or of
/// any descendant. Layouts are stamped with the generation they were computed
/// against and only commit while it is still current.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// Returns the next generation.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}
