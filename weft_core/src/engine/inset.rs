// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inset layout.
//!
//! An infinite inset on one side pins the child to the opposite side; infinite
//! insets on both sides of an axis center the child on it.

use alloc::vec;

use kurbo::{Point, Size};

use crate::dimension::SizeRange;
use crate::element::{ElementRef, Inset};
use crate::layout::Layout;

use super::{Cx, layout_child};

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

/// Child range along one axis, shrunk by the finite insets.
///
/// The child may be smaller than the container on an axis with an infinite
/// inset, so the minimum is dropped there.
fn inner_bounds(min: f64, max: f64, start: f64, end: f64) -> (f64, f64) {
    let insets = finite_or_zero(start) + finite_or_zero(end);
    let min = if start.is_finite() && end.is_finite() {
        min
    } else {
        0.0
    };
    ((min - insets).max(0.0), (max - insets).max(0.0))
}

/// Container extent along one axis.
fn outer_extent(child: f64, max: f64, start: f64, end: f64) -> f64 {
    if start.is_finite() && end.is_finite() {
        return child + start + end;
    }
    if max.is_finite() {
        max
    } else {
        child + finite_or_zero(start) + finite_or_zero(end)
    }
}

fn offset(extent: f64, child: f64, start: f64, end: f64) -> f64 {
    let v = if start.is_finite() {
        start
    } else if end.is_finite() {
        extent - end - child
    } else {
        (extent - child) / 2.0
    };
    finite_or_zero(v)
}

pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, inset: &Inset, range: SizeRange) -> Layout {
    // kurbo insets: x0 left, y0 top, x1 right, y1 bottom.
    let kurbo::Insets { x0, y0, x1, y1 } = inset.insets;
    let (min_w, max_w) = inner_bounds(range.min.width, range.max.width, x0, x1);
    let (min_h, max_h) = inner_bounds(range.min.height, range.max.height, y0, y1);
    let child_range = SizeRange::new(Size::new(min_w, min_h), Size::new(max_w, max_h));

    let child = layout_child(cx, &inset.child, child_range, child_range.max);
    let size = range.clamp(Size::new(
        outer_extent(child.size.width, range.max.width, x0, x1),
        outer_extent(child.size.height, range.max.height, y0, y1),
    ));
    let position = Point::new(
        offset(size.width, child.size.width, x0, x1),
        offset(size.height, child.size.height, y0, y1),
    );
    Layout::new(me, size, vec![child.at(position)])
}

#[cfg(test)]
mod tests {
    use kurbo::{Insets, Rect};

    use crate::element::{Element, IntrinsicSize};
    use crate::engine::compute_layout;

    use super::*;

    #[test]
    fn finite_insets_pad_the_child() {
        let el = Element::from(Inset::new(
            Insets::new(1.0, 2.0, 3.0, 4.0),
            Element::leaf(IntrinsicSize(Size::new(10.0, 10.0))),
        ));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(100.0, 100.0)));
        assert_eq!(out.layout.size, Size::new(14.0, 16.0));
        assert_eq!(out.layout.children[0].frame(), Rect::new(1.0, 2.0, 11.0, 12.0));
    }

    #[test]
    fn child_range_is_reduced_by_insets() {
        let el = Element::from(Inset::new(Insets::uniform(10.0), Element::fixed(Size::new(500.0, 5.0))));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(100.0, 100.0)));
        assert_eq!(out.layout.children[0].size, Size::new(80.0, 5.0));
        assert_eq!(out.layout.size, Size::new(100.0, 25.0));
    }

    #[test]
    fn infinite_inset_pins_to_the_opposite_edge() {
        let el = Element::from(Inset::new(
            Insets::new(f64::INFINITY, 0.0, 4.0, f64::INFINITY),
            Element::fixed(Size::new(10.0, 10.0)),
        ));
        let out = compute_layout(&el, SizeRange::exact(Size::new(50.0, 40.0)));
        assert_eq!(out.layout.size, Size::new(50.0, 40.0));
        assert_eq!(out.layout.children[0].frame(), Rect::new(36.0, 0.0, 46.0, 10.0));
    }

    #[test]
    fn infinite_insets_on_both_sides_center() {
        let el = Element::from(Inset::new(
            Insets::new(f64::INFINITY, 0.0, f64::INFINITY, 0.0),
            Element::fixed(Size::new(10.0, 10.0)),
        ));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(50.0, 40.0)));
        assert_eq!(out.layout.children[0].position, Point::new(20.0, 0.0));
    }
}
