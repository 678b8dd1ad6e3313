// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Relative and center layout.
//!
//! Center is relative layout with `Center` on the selected axes and `Start`
//! on the others.

use alloc::vec;

use kurbo::{Point, Size};

use crate::dimension::SizeRange;
use crate::element::{Center, Centering, Element, ElementRef, Relative, RelativePosition, SizingOptions};
use crate::layout::Layout;

use super::{Cx, layout_child};

pub(super) fn layout_center(cx: &mut Cx<'_>, me: ElementRef, center: &Center, range: SizeRange) -> Layout {
    let (h, v) = match center.centering {
        Centering::None => (RelativePosition::Start, RelativePosition::Start),
        Centering::X => (RelativePosition::Center, RelativePosition::Start),
        Centering::Y => (RelativePosition::Start, RelativePosition::Center),
        Centering::XY => (RelativePosition::Center, RelativePosition::Center),
    };
    place(cx, me, h, v, center.sizing, &center.child, range)
}

pub(super) fn layout_relative(cx: &mut Cx<'_>, me: ElementRef, relative: &Relative, range: SizeRange) -> Layout {
    place(
        cx,
        me,
        relative.horizontal,
        relative.vertical,
        relative.sizing,
        &relative.child,
        range,
    )
}

fn place(
    cx: &mut Cx<'_>,
    me: ElementRef,
    h: RelativePosition,
    v: RelativePosition,
    sizing: SizingOptions,
    child: &Element,
    range: SizeRange,
) -> Layout {
    // A child that is not at the start may be smaller than the container.
    let min = Size::new(
        if h == RelativePosition::Start { range.min.width } else { 0.0 },
        if v == RelativePosition::Start { range.min.height } else { 0.0 },
    );
    let child = layout_child(cx, child, SizeRange::new(min, range.max), range.max);

    let pick = |max: f64, child: f64, minimum: bool| {
        if minimum || !max.is_finite() { child } else { max }
    };
    let size = range.clamp(Size::new(
        pick(range.max.width, child.size.width, sizing.minimum_width),
        pick(range.max.height, child.size.height, sizing.minimum_height),
    ));
    let position = Point::new(
        (size.width - child.size.width) * h.proportion(),
        (size.height - child.size.height) * v.proportion(),
    );
    Layout::new(me, size, vec![child.at(position)])
}
