// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Edge layout: an element just outside one edge of the child.

use alloc::vec;

use kurbo::Point;

use crate::dimension::SizeRange;
use crate::element::{Edge, EdgeLocation, ElementRef};
use crate::layout::Layout;

use super::{Cx, layout_child};

pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, edge: &Edge, range: SizeRange) -> Layout {
    let child = layout_child(cx, &edge.child, range, range.max);
    let base = child.size;
    let placed = layout_child(cx, &edge.edge, SizeRange::UNBOUNDED, base);
    let size = placed.size;

    let origin = match edge.location {
        EdgeLocation::Top => Point::new((base.width - size.width) / 2.0, -size.height - edge.offset),
        EdgeLocation::Bottom => Point::new((base.width - size.width) / 2.0, base.height + edge.offset),
        EdgeLocation::Left => Point::new(-size.width - edge.offset, (base.height - size.height) / 2.0),
        EdgeLocation::Right => Point::new(base.width + edge.offset, (base.height - size.height) / 2.0),
    };
    Layout::new(me, base, vec![child, placed.at(origin)])
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use crate::element::Element;
    use crate::engine::compute_layout;

    use super::*;

    fn edged(location: EdgeLocation, offset: f64) -> Layout {
        let el = Element::from(
            Edge::new(
                Element::fixed(Size::new(40.0, 20.0)),
                Element::fixed(Size::new(10.0, 6.0)),
                location,
            )
            .offset(offset),
        );
        compute_layout(&el, SizeRange::UNBOUNDED).layout
    }

    #[test]
    fn edge_element_sits_outside_and_centered() {
        let top = edged(EdgeLocation::Top, 0.0);
        assert_eq!(top.size, Size::new(40.0, 20.0));
        assert_eq!(top.children[1].frame(), Rect::new(15.0, -6.0, 25.0, 0.0));

        let right = edged(EdgeLocation::Right, 0.0);
        assert_eq!(right.children[1].frame(), Rect::new(40.0, 7.0, 50.0, 13.0));
    }

    #[test]
    fn offset_pushes_away_from_the_child() {
        let bottom = edged(EdgeLocation::Bottom, 4.0);
        assert_eq!(bottom.children[1].frame(), Rect::new(15.0, 24.0, 25.0, 30.0));

        let left = edged(EdgeLocation::Left, 4.0);
        assert_eq!(left.children[1].frame(), Rect::new(-14.0, 7.0, -4.0, 13.0));
        assert_eq!(left.size, Size::new(40.0, 20.0));
    }
}
