// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout engine.
//!
//! [`compute_layout`] lays out a bare element tree. [`compute_pass`] lays out
//! a frozen [`TreeSnapshot`], resolving [`ElementKind::Node`] references
//! through each node's provider, and reports one [`NodeLayoutRecord`] per
//! node stamped with the generation it was computed against. Both are pure:
//! they read only their arguments and may run on any thread.
//!
//! # Resolution
//!
//! Every element goes through the same steps:
//!
//! 1. its declared [`ElementSize`](crate::dimension::ElementSize) is resolved
//!    against the parent size and intersected with the incoming range (the
//!    incoming range wins where they disagree);
//! 2. the variant's compute function runs against the resolved range;
//! 3. the result is clamped into the resolved range, and a non-finite size
//!    falls back to a finite bound.
//!
//! # Memoization
//!
//! Node layouts are reused when the same node is laid out twice at the same
//! range within a pass, and across passes through the per-node cache carried
//! in the snapshot (keyed by generation and range). A reused layout brings
//! the layouts of its nested nodes with it, and each of them is recorded
//! again, so a commit never leaves descendants behind their ancestor.

mod absolute;
mod corner;
mod edge;
mod inset;
mod overlay;
mod ratio;
mod relative;
mod stack;

use alloc::collections::BTreeMap;
use alloc::sync::Arc;
use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::diagnostics::Diagnostic;
use crate::dimension::{Axis, RangeKey, SizeRange};
use crate::element::{Absolute, AbsoluteSizing, Element, ElementKind, ElementRef, Leaf};
use crate::layout::Layout;
use crate::node::{Generation, NodeId, TreeSnapshot};
use crate::scheduler::PassId;
use crate::style::Style;

/// Result of [`compute_layout`].
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutOutput {
    /// The layout tree.
    pub layout: Layout,
    /// Conditions encountered while computing it.
    pub diagnostics: Vec<Diagnostic>,
}

/// One node's layout from a pass.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeLayoutRecord {
    /// The node.
    pub node: NodeId,
    /// Nearest ancestor node in the pass; `None` for the pass root.
    pub parent: Option<NodeId>,
    /// The node's generation in the snapshot the pass read.
    pub generation: Generation,
    /// The resolved range the node was laid out in.
    pub range: SizeRange,
    /// The node's layout, at the origin.
    pub layout: Arc<Layout>,
    /// Frame relative to the nearest ancestor node in the pass.
    pub frame: Rect,
}

/// Result of [`compute_pass`].
#[derive(Clone, Debug, PartialEq)]
pub struct PassOutput {
    /// Identity of the pass.
    pub pass: PassId,
    /// Root node of the pass.
    pub root: NodeId,
    /// Range the pass was requested with.
    pub range: SizeRange,
    /// Per-node results in pre-order; the first is the root.
    pub records: Vec<NodeLayoutRecord>,
    /// Conditions encountered, each tagged with its owning node.
    pub diagnostics: Vec<Diagnostic>,
}

impl PassOutput {
    /// Generation of the root node the pass was computed against.
    #[must_use]
    pub fn root_generation(&self) -> Option<Generation> {
        self.records
            .iter()
            .find(|r| r.node == self.root)
            .map(|r| r.generation)
    }

    /// The root node's layout.
    #[must_use]
    pub fn root_layout(&self) -> Option<&Arc<Layout>> {
        self.records
            .iter()
            .find(|r| r.node == self.root)
            .map(|r| &r.layout)
    }
}

/// Lays out `element` within `range`.
///
/// Node references cannot be resolved without a snapshot; each one is laid
/// out as an empty leaf and reported as
/// [`Diagnostic::UnknownNode`].
#[must_use]
pub fn compute_layout(element: &Element, range: SizeRange) -> LayoutOutput {
    let mut cx = Cx::new(None);
    let layout = layout_child(&mut cx, element, range, range.max);
    LayoutOutput {
        layout,
        diagnostics: cx.diagnostics,
    }
}

/// Lays out the snapshot's root node within `range`.
#[must_use]
pub fn compute_pass(snapshot: &TreeSnapshot, range: SizeRange, pass: PassId) -> PassOutput {
    let mut cx = Cx::new(Some(snapshot));
    let root = snapshot.root();
    let layout = layout_child(&mut cx, &Element::node(root), range, range.max);

    let mut records = Vec::new();
    for (frame, reached) in layout.node_layouts() {
        let (Some(node), Some((node_range, node_layout))) =
            (snapshot.get(frame.node), cx.computed(frame.node, reached))
        else {
            continue;
        };
        records.push(NodeLayoutRecord {
            node: frame.node,
            parent: frame.parent,
            generation: node.generation,
            range: *node_range,
            layout: node_layout.clone(),
            frame: frame.frame,
        });
    }

    PassOutput {
        pass,
        root,
        range,
        records,
        diagnostics: cx.diagnostics,
    }
}

/// Per-pass state threaded through the compute functions.
pub(crate) struct Cx<'a> {
    snapshot: Option<&'a TreeSnapshot>,
    /// Nodes whose element trees are being laid out, innermost last.
    owners: Vec<NodeId>,
    diagnostics: Vec<Diagnostic>,
    /// Every node layout computed or reused so far, by node and range.
    memo: BTreeMap<(NodeId, RangeKey), (SizeRange, Arc<Layout>)>,
}

impl<'a> Cx<'a> {
    fn new(snapshot: Option<&'a TreeSnapshot>) -> Self {
        Self {
            snapshot,
            owners: Vec::new(),
            diagnostics: Vec::new(),
            memo: BTreeMap::new(),
        }
    }

    pub(crate) fn owner(&self) -> Option<NodeId> {
        self.owners.last().copied()
    }

    /// The memoized layout of `id` that `reached` was taken from.
    fn computed(&self, id: NodeId, reached: &Layout) -> Option<&(SizeRange, Arc<Layout>)> {
        self.memo
            .range((id, RangeKey::MIN)..=(id, RangeKey::MAX))
            .map(|(_, entry)| entry)
            .find(|(_, layout)| layout.same_shape(reached))
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        log::debug!("layout diagnostic: {diagnostic:?}");
        self.diagnostics.push(diagnostic);
    }

    /// The style that governs `element`: a node's own style for node
    /// references, the element's style otherwise.
    pub(crate) fn style_of(&self, element: &Element) -> Style {
        if let ElementKind::Node(id) = element.kind
            && let Some(node) = self.snapshot.and_then(|s| s.get(id))
        {
            return node.style;
        }
        element.style
    }
}

/// Lays out `element` within `range`, resolving its declared size against
/// `parent`. The result is at the origin.
pub(crate) fn layout_child(cx: &mut Cx<'_>, element: &Element, range: SizeRange, parent: Size) -> Layout {
    let style = cx.style_of(element);
    let resolved = range.intersect(&style.size.resolve(parent));
    let me = element.reference();

    let mut layout = match &element.kind {
        ElementKind::Leaf(leaf) => leaf_layout(cx, me, leaf, resolved),
        ElementKind::Node(id) => node_layout(cx, *id, resolved),
        ElementKind::Stack(s) => stack::layout(cx, me, s, resolved),
        ElementKind::Inset(s) => inset::layout(cx, me, s, resolved),
        ElementKind::Overlay(s) => overlay::layout_overlay(cx, me, s, resolved),
        ElementKind::Background(s) => overlay::layout_background(cx, me, s, resolved),
        ElementKind::Ratio(s) => ratio::layout(cx, me, s, resolved),
        ElementKind::Absolute(s) => absolute::layout(cx, me, s, resolved),
        ElementKind::Center(s) => relative::layout_center(cx, me, s, resolved),
        ElementKind::Relative(s) => relative::layout_relative(cx, me, s, resolved),
        ElementKind::Corner(s) => corner::layout(cx, me, s, resolved),
        ElementKind::Edge(s) => edge::layout(cx, me, s, resolved),
    };
    layout.size = finite_size(cx, me, resolved.clamp(layout.size), &resolved);
    layout
}

fn finite_size(cx: &mut Cx<'_>, me: ElementRef, size: Size, range: &SizeRange) -> Size {
    let fix = |cx: &mut Cx<'_>, v: f64, axis: Axis| {
        if v.is_finite() {
            return v;
        }
        cx.report(Diagnostic::UnboundedSize {
            owner: cx.owner(),
            element: me,
            axis,
        });
        let (min, max) = range.along(axis);
        if max.is_finite() {
            max
        } else if min.is_finite() {
            min
        } else {
            0.0
        }
    };
    let width = fix(cx, size.width, Axis::Horizontal);
    let height = fix(cx, size.height, Axis::Vertical);
    Size::new(width, height)
}

fn leaf_layout(cx: &mut Cx<'_>, me: ElementRef, leaf: &Leaf, range: SizeRange) -> Layout {
    let size = match &leaf.measure {
        None => range.min,
        Some(measure) => match measure.measure(range) {
            Ok(size) => size,
            Err(error) => {
                log::warn!("leaf {me:?} in {:?}: {error}", cx.owner());
                cx.report(Diagnostic::MeasurementFailed {
                    owner: cx.owner(),
                    element: me,
                    error,
                });
                Size::ZERO
            }
        },
    };
    Layout::new(me, range.clamp(size), Vec::new())
}

fn node_layout(cx: &mut Cx<'_>, id: NodeId, range: SizeRange) -> Layout {
    let me = ElementRef::Node(id);
    let Some(snapshot) = cx.snapshot else {
        return unknown_node(cx, id, range);
    };
    let reachable = match cx.owner() {
        Some(owner) => snapshot.get(owner).is_some_and(|o| o.children.contains(&id)),
        None => id == snapshot.root(),
    };
    let node = match snapshot.get(id) {
        Some(node) if reachable => node,
        _ => return unknown_node(cx, id, range),
    };

    let key = (id, range.key());
    if let Some((_, hit)) = cx.memo.get(&key) {
        return Layout::clone(hit);
    }
    if let Some(cached) = node.cached.iter().find(|c| c.range == range)
        && seed_nested(cx, snapshot, &cached.layout)
    {
        cx.memo.insert(key, (range, cached.layout.clone()));
        return Layout::clone(&cached.layout);
    }

    cx.owners.push(id);
    let mut layout = if let Some(provider) = &node.provider {
        let element = provider.element_for(range, &node.children);
        let inner = layout_child(cx, &element, range, range.max);
        Layout::new(me, inner.size, alloc::vec![inner])
    } else if let Some(measure) = &node.measure {
        let leaf = Leaf {
            measure: Some(measure.clone()),
        };
        let measured = leaf_layout(cx, me, &leaf, range);
        Layout::new(me, measured.size, Vec::new())
    } else if !node.children.is_empty() {
        let manual = Absolute::new(
            AbsoluteSizing::Default,
            node.children.iter().map(|&c| Element::node(c)),
        );
        let inner = layout_child(cx, &Element::from(manual), range, range.max);
        Layout::new(me, inner.size, alloc::vec![inner])
    } else {
        Layout::new(me, range.min, Vec::new())
    };
    cx.owners.pop();
    layout.size = finite_size(cx, me, range.clamp(layout.size), &range);

    cx.memo.insert(key, (range, Arc::new(layout.clone())));
    layout
}

/// Memoizes the cached layout of every node nested in `layout`, so a reused
/// layout still yields a record per node. Returns `false`, memoizing
/// nothing, if one of them has no matching cache entry.
fn seed_nested(cx: &mut Cx<'_>, snapshot: &TreeSnapshot, layout: &Layout) -> bool {
    let mut found = Vec::new();
    for (frame, nested) in layout.node_layouts().into_iter().skip(1) {
        let Some(entry) = snapshot
            .get(frame.node)
            .and_then(|n| n.cached.iter().find(|c| c.layout.same_shape(nested)))
        else {
            return false;
        };
        found.push(((frame.node, entry.range.key()), (entry.range, entry.layout.clone())));
    }
    for (key, entry) in found {
        cx.memo.entry(key).or_insert(entry);
    }
    true
}

fn unknown_node(cx: &mut Cx<'_>, id: NodeId, range: SizeRange) -> Layout {
    cx.report(Diagnostic::UnknownNode {
        owner: cx.owner(),
        referenced: id,
    });
    Layout::new(ElementRef::Node(id), range.clamp(Size::ZERO), Vec::new())
}

/// `|v|` without relying on float intrinsics being available in `core`.
pub(crate) fn abs(v: f64) -> f64 {
    if v < 0.0 { -v } else { v }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Point;

    use crate::dimension::ElementSize;
    use crate::element::{AlignItems, Center, IntrinsicSize, MeasureError, Stack};
    use crate::node::NodeTree;

    use super::*;

    fn bounded(w: f64, h: f64) -> SizeRange {
        SizeRange::up_to(Size::new(w, h))
    }

    #[test]
    fn leaf_without_measure_takes_range_min() {
        let out = compute_layout(
            &Element::from(Leaf::empty()),
            SizeRange::new(Size::new(3.0, 4.0), Size::new(10.0, 10.0)),
        );
        assert_eq!(out.layout.size, Size::new(3.0, 4.0));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn measured_leaf_is_clamped() {
        let out = compute_layout(
            &Element::leaf(IntrinsicSize(Size::new(500.0, 5.0))),
            bounded(100.0, 100.0),
        );
        assert_eq!(out.layout.size, Size::new(100.0, 5.0));
    }

    #[test]
    fn failing_measure_substitutes_zero_and_reports() {
        let failing = |_: SizeRange| -> Result<Size, MeasureError> { Err(MeasureError::new("font missing")) };
        let el = Element::from(
            Stack::vertical()
                .align_items(AlignItems::Start)
                .child(Element::leaf(failing).with_key(7))
                .child(Element::fixed(Size::new(10.0, 10.0))),
        );
        let out = compute_layout(&el, bounded(100.0, 100.0));
        assert_eq!(out.layout.children[0].size.height, 0.0);
        assert_eq!(out.layout.children[1].position, Point::new(0.0, 0.0));
        assert!(matches!(
            &out.diagnostics[..],
            [Diagnostic::MeasurementFailed { error, .. }] if error.message() == "font missing"
        ));
    }

    #[test]
    fn infinite_preferred_size_is_clamped_to_parent_max() {
        let el = Element::fixed(Size::new(f64::INFINITY, 10.0));
        let out = compute_layout(&el, bounded(120.0, 50.0));
        assert_eq!(out.layout.size, Size::new(120.0, 10.0));

        let out = compute_layout(&el, SizeRange::UNBOUNDED);
        assert_eq!(out.layout.size.width, 0.0);
        assert!(matches!(
            out.diagnostics[..],
            [Diagnostic::UnboundedSize { axis: Axis::Horizontal, .. }]
        ));
    }

    #[test]
    fn compute_layout_is_deterministic() {
        let el = Element::from(
            Stack::horizontal()
                .spacing(3.5)
                .child(Element::fixed(Size::new(10.0, 7.0)).with_style(Style::preferred(Size::new(10.0, 7.0)).grow(1.0)))
                .child(Element::from(Center::new(Element::fixed(Size::new(4.0, 4.0)))))
                .child(Element::leaf(IntrinsicSize(Size::new(33.3, 1.0))).with_style(Style::DEFAULT.shrink(2.0))),
        );
        let range = SizeRange::new(Size::new(97.0, 0.0), Size::new(97.0, 40.0));
        assert_eq!(compute_layout(&el, range), compute_layout(&el, range));
    }

    #[test]
    fn bare_node_reference_is_reported() {
        let mut tree = NodeTree::new();
        let n = tree.create_node();
        let out = compute_layout(&Element::node(n), bounded(10.0, 10.0));
        assert_eq!(out.layout.size, Size::ZERO);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::UnknownNode {
                owner: None,
                referenced: n
            }]
        );
    }

    #[test]
    fn pass_records_every_node_with_frames() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, a).unwrap();
        tree.add_child(root, b).unwrap();
        tree.set_style(a, Style::preferred(Size::new(30.0, 10.0))).unwrap();
        tree.set_style(b, Style::preferred(Size::new(20.0, 10.0))).unwrap();
        tree.set_provider(root, |_: SizeRange, kids: &[NodeId]| {
            Element::from(
                Stack::horizontal()
                    .spacing(5.0)
                    .children(kids.iter().map(|&k| Element::node(k))),
            )
        })
        .unwrap();

        let snapshot = tree.snapshot(root).unwrap();
        let out = compute_pass(&snapshot, SizeRange::exact(Size::new(100.0, 10.0)), PassId(1));

        let nodes: Vec<NodeId> = out.records.iter().map(|r| r.node).collect();
        assert_eq!(nodes, vec![root, a, b]);
        assert_eq!(out.records[0].frame, Rect::new(0.0, 0.0, 100.0, 10.0));
        assert_eq!(out.records[1].frame, Rect::new(0.0, 0.0, 30.0, 10.0));
        assert_eq!(out.records[2].frame, Rect::new(35.0, 0.0, 55.0, 10.0));
        assert_eq!(out.root_generation(), Some(tree.generation(root)));
    }

    #[test]
    fn provider_referencing_a_grandchild_is_rejected() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let child = tree.create_node();
        let grandchild = tree.create_node();
        tree.add_child(root, child).unwrap();
        tree.add_child(child, grandchild).unwrap();
        tree.set_provider(root, move |_: SizeRange, _: &[NodeId]| Element::node(grandchild))
            .unwrap();

        let snapshot = tree.snapshot(root).unwrap();
        let out = compute_pass(&snapshot, bounded(50.0, 50.0), PassId(1));
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::UnknownNode {
                owner: Some(root),
                referenced: grandchild
            }]
        );
        assert_eq!(out.records.len(), 1, "only the root is a reachable node");
    }

    #[test]
    fn node_without_provider_lays_children_out_absolutely() {
        let mut tree = NodeTree::new();
        let root = tree.create_node();
        let child = tree.create_node();
        tree.add_child(root, child).unwrap();
        tree.set_style(
            child,
            Style {
                size: ElementSize::preferred(Size::new(10.0, 10.0)),
                ..Style::DEFAULT.at(Point::new(5.0, 6.0))
            },
        )
        .unwrap();

        let snapshot = tree.snapshot(root).unwrap();
        let out = compute_pass(&snapshot, bounded(40.0, 30.0), PassId(1));
        assert_eq!(out.records[0].layout.size, Size::new(40.0, 30.0));
        assert_eq!(out.records[1].frame, Rect::new(5.0, 6.0, 15.0, 16.0));
    }
}
