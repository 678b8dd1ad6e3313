// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Absolute layout: children at their declared positions.

use alloc::vec::Vec;

use kurbo::Size;

use crate::dimension::SizeRange;
use crate::element::{Absolute, AbsoluteSizing, ElementRef};
use crate::layout::Layout;

use super::{Cx, layout_child};

pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, absolute: &Absolute, range: SizeRange) -> Layout {
    let parent = range.max;
    let mut children = Vec::with_capacity(absolute.children.len());
    for element in &absolute.children {
        let style = cx.style_of(element);
        let position = style.layout_position;
        // An auto-sized child may extend to the container's far edge.
        let room = Size::new(
            (parent.width - position.x).max(0.0),
            (parent.height - position.y).max(0.0),
        );
        let child_range = style.size.resolve_with_auto(parent, SizeRange::up_to(room));
        children.push(layout_child(cx, element, child_range, parent).at(position));
    }

    let extent = |axis_max: f64, far: fn(&Layout) -> f64, min: f64| {
        if absolute.sizing == AbsoluteSizing::Default && axis_max.is_finite() {
            axis_max
        } else {
            children.iter().map(far).fold(min, f64::max)
        }
    };
    let width = extent(range.max.width, |c| c.position.x + c.size.width, range.min.width);
    let height = extent(range.max.height, |c| c.position.y + c.size.height, range.min.height);
    Layout::new(me, range.clamp(Size::new(width, height)), children)
}
