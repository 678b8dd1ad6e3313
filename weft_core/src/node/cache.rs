// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node layout cache.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::dimension::SizeRange;
use crate::layout::Layout;

use super::id::Generation;

/// A committed layout and the range it was computed for.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedLayout {
    /// The resolved range the layout answers.
    pub range: SizeRange,
    /// The layout, at the origin.
    pub layout: Arc<Layout>,
}

/// Layouts of one node keyed by range, valid for a single generation.
///
/// Holds at most [`CAPACITY`](Self::CAPACITY) entries; the oldest is evicted
/// first. Any entry stored under an older generation is discarded on insert.
#[derive(Clone, Debug, Default)]
pub(crate) struct LayoutCache {
    generation: Generation,
    entries: Vec<CachedLayout>,
}

impl LayoutCache {
    pub(crate) const CAPACITY: usize = 4;

    pub(crate) fn insert(&mut self, generation: Generation, range: SizeRange, layout: Arc<Layout>) {
        if generation != self.generation {
            self.entries.clear();
            self.generation = generation;
        }
        let key = range.key();
        self.entries.retain(|e| e.range.key() != key);
        if self.entries.len() == Self::CAPACITY {
            self.entries.remove(0);
        }
        self.entries.push(CachedLayout { range, layout });
    }

    /// Entries valid at `generation`.
    pub(crate) fn entries_at(&self, generation: Generation) -> &[CachedLayout] {
        if generation == self.generation {
            &self.entries
        } else {
            &[]
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Size;

    use crate::element::ElementRef;
    use crate::node::NodeTree;

    use super::*;

    fn layout(tree: &mut NodeTree, w: f64) -> Arc<Layout> {
        let id = tree.create_node();
        Arc::new(Layout::new(ElementRef::Node(id), Size::new(w, 1.0), Vec::new()))
    }

    #[test]
    fn generation_change_discards_entries() {
        let mut tree = NodeTree::new();
        let mut cache = LayoutCache::default();
        let g1 = Generation(1);
        cache.insert(g1, SizeRange::UNBOUNDED, layout(&mut tree, 1.0));
        assert_eq!(cache.entries_at(g1).len(), 1);
        assert!(cache.entries_at(Generation(2)).is_empty());

        cache.insert(Generation(2), SizeRange::UNBOUNDED, layout(&mut tree, 2.0));
        assert!(cache.entries_at(g1).is_empty());
        assert_eq!(cache.entries_at(Generation(2)).len(), 1);
    }

    #[test]
    fn same_range_replaces_and_oldest_is_evicted() {
        let mut tree = NodeTree::new();
        let mut cache = LayoutCache::default();
        let g = Generation(0);
        for w in 0..6 {
            let range = SizeRange::up_to(Size::new(f64::from(w), 10.0));
            cache.insert(g, range, layout(&mut tree, f64::from(w)));
        }
        cache.insert(g, SizeRange::up_to(Size::new(5.0, 10.0)), layout(&mut tree, 50.0));

        let widths: Vec<f64> = cache
            .entries_at(g)
            .iter()
            .map(|e| e.layout.size.width)
            .collect();
        assert_eq!(widths, vec![2.0, 3.0, 4.0, 50.0]);
    }
}
