// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Immutable layout results.
//!
//! A [`Layout`] is the geometry one element produced for one size range: its
//! size, its position within the parent layout, and the layouts of its
//! children in order. Layouts never change after the engine builds them; a
//! new range or a new style yields a new tree.

use alloc::vec::Vec;

use kurbo::{Point, Rect, Size, Vec2};

use crate::element::ElementRef;
use crate::node::NodeId;

/// Computed geometry of one element and its children.
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    /// The element that produced this layout.
    pub element: ElementRef,
    /// Resolved size.
    pub size: Size,
    /// Origin relative to the parent layout.
    pub position: Point,
    /// Child layouts in element order.
    pub children: Vec<Self>,
}

/// A node's frame in the node-only view of a layout tree.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeFrame {
    /// The node.
    pub node: NodeId,
    /// Nearest ancestor node in the same layout tree.
    pub parent: Option<NodeId>,
    /// Frame relative to `parent`'s layout, or to the tree root.
    pub frame: Rect,
}

impl Layout {
    /// A layout at the origin.
    #[must_use]
    pub fn new(element: ElementRef, size: Size, children: Vec<Self>) -> Self {
        Self {
            element,
            size,
            position: Point::ORIGIN,
            children,
        }
    }

    /// Returns the layout moved to `position`.
    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// The layout's rectangle in its parent's coordinates.
    ///
    /// A non-finite position component is treated as zero.
    #[must_use]
    pub fn frame(&self) -> Rect {
        let x = if self.position.x.is_finite() {
            self.position.x
        } else {
            0.0
        };
        let y = if self.position.y.is_finite() {
            self.position.y
        } else {
            0.0
        };
        Rect::from_origin_size((x, y), self.size)
    }

    /// Frame of the direct child produced by `element`.
    #[must_use]
    pub fn frame_for_element(&self, element: ElementRef) -> Option<Rect> {
        self.children
            .iter()
            .find(|c| c.element == element)
            .map(Self::frame)
    }

    /// First layout in depth-first order produced by `element`.
    #[must_use]
    pub fn find(&self, element: ElementRef) -> Option<&Self> {
        if self.element == element {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(element))
    }

    /// Calls `f` for every layout in depth-first pre-order with its depth.
    pub fn visit(&self, f: &mut impl FnMut(&Self, usize)) {
        self.visit_at(0, f);
    }

    fn visit_at(&self, depth: usize, f: &mut impl FnMut(&Self, usize)) {
        f(self, depth);
        for child in &self.children {
            child.visit_at(depth + 1, f);
        }
    }

    /// Flattens the tree to its nodes.
    ///
    /// Intermediate spec layouts are folded into the offsets, so each node's
    /// frame is relative to its nearest ancestor node. Pre-order.
    #[must_use]
    pub fn node_frames(&self) -> Vec<NodeFrame> {
        self.node_layouts().into_iter().map(|(frame, _)| frame).collect()
    }

    /// Like [`node_frames`](Self::node_frames), paired with each node's own
    /// layout.
    #[must_use]
    pub fn node_layouts(&self) -> Vec<(NodeFrame, &Self)> {
        let mut out = Vec::new();
        self.collect_nodes(None, Vec2::ZERO, &mut out);
        out
    }

    /// Returns `true` if `other` is this layout, ignoring both positions.
    #[must_use]
    pub fn same_shape(&self, other: &Self) -> bool {
        self.element == other.element && self.size == other.size && self.children == other.children
    }

    fn collect_nodes<'a>(&'a self, parent: Option<NodeId>, offset: Vec2, out: &mut Vec<(NodeFrame, &'a Self)>) {
        let frame = self.frame() + offset;
        match self.element.node() {
            Some(node) => {
                out.push((
                    NodeFrame {
                        node,
                        parent,
                        frame,
                    },
                    self,
                ));
                for child in &self.children {
                    child.collect_nodes(Some(node), Vec2::ZERO, out);
                }
            }
            None => {
                let origin = frame.origin().to_vec2();
                for child in &self.children {
                    child.collect_nodes(parent, origin, out);
                }
            }
        }
    }
}
