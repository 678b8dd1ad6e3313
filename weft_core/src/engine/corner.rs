// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Corner layout: an element centered on one corner of the child.

use alloc::vec;

use kurbo::{Point, Rect};

use crate::dimension::SizeRange;
use crate::element::{Corner, CornerLocation, ElementRef};
use crate::layout::Layout;

use super::{Cx, layout_child};

pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, corner: &Corner, range: SizeRange) -> Layout {
    let child = layout_child(cx, &corner.child, range, range.max);
    let base = child.size;
    let badge = layout_child(cx, &corner.corner, SizeRange::UNBOUNDED, base);

    let anchor = match corner.location {
        CornerLocation::TopLeft => Point::new(0.0, 0.0),
        CornerLocation::TopRight => Point::new(base.width, 0.0),
        CornerLocation::BottomLeft => Point::new(0.0, base.height),
        CornerLocation::BottomRight => Point::new(base.width, base.height),
    };
    let badge_origin = Point::new(
        anchor.x - badge.size.width / 2.0 + corner.offset.x,
        anchor.y - badge.size.height / 2.0 + corner.offset.y,
    );

    if !corner.wraps_corner {
        return Layout::new(me, base, vec![child, badge.at(badge_origin)]);
    }
    let bounds = Rect::from_origin_size(Point::ORIGIN, base)
        .union(Rect::from_origin_size(badge_origin, badge.size));
    let shift = -bounds.origin().to_vec2();
    let size = range.clamp(bounds.size());
    Layout::new(
        me,
        size,
        vec![child.at(Point::ORIGIN + shift), badge.at(badge_origin + shift)],
    )
}
