// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overlay and background layout.
//!
//! The primary child decides the size; the decoration is laid out at exactly
//! that size. Children are emitted in paint order, so the background comes
//! before the child and the overlay after it.

use alloc::sync::Arc;
use alloc::vec;

use crate::dimension::SizeRange;
use crate::element::{Background, Element, ElementRef, Overlay};
use crate::layout::Layout;

use super::{Cx, layout_child};

fn decorated(cx: &mut Cx<'_>, child: &Element, decoration: &Arc<Element>, range: SizeRange) -> (Layout, Layout) {
    let primary = layout_child(cx, child, range, range.max);
    let size = primary.size;
    let decoration = layout_child(cx, decoration, SizeRange::exact(size), size);
    (primary, decoration)
}

pub(super) fn layout_overlay(cx: &mut Cx<'_>, me: ElementRef, overlay: &Overlay, range: SizeRange) -> Layout {
    let (child, over) = decorated(cx, &overlay.child, &overlay.overlay, range);
    Layout::new(me, child.size, vec![child, over])
}

pub(super) fn layout_background(
    cx: &mut Cx<'_>,
    me: ElementRef,
    background: &Background,
    range: SizeRange,
) -> Layout {
    let (child, back) = decorated(cx, &background.child, &background.background, range);
    Layout::new(me, child.size, vec![back, child])
}

#[cfg(test)]
mod tests {
    use kurbo::Size;

    use crate::element::{ElementType, IntrinsicSize, Leaf};
    use crate::engine::compute_layout;

    use super::*;

    #[test]
    fn overlay_matches_child_size_and_paints_last() {
        let el = Element::from(Overlay::new(
            Element::leaf(IntrinsicSize(Size::new(30.0, 12.0))),
            Element::fixed(Size::new(1.0, 1.0)).with_key(9),
        ));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(100.0, 100.0)));
        assert_eq!(out.layout.size, Size::new(30.0, 12.0));
        assert_eq!(out.layout.children[1].size, Size::new(30.0, 12.0));
        assert_eq!(
            out.layout.children[1].element,
            ElementRef::Spec {
                ty: ElementType::Leaf,
                key: Some(9)
            }
        );
    }

    #[test]
    fn background_paints_first() {
        let el = Element::from(Background::new(
            Element::fixed(Size::new(8.0, 4.0)).with_key(1),
            Element::from(Leaf::empty()).with_key(2),
        ));
        let out = compute_layout(&el, SizeRange::UNBOUNDED);
        let keys: alloc::vec::Vec<_> = out
            .layout
            .children
            .iter()
            .map(|c| match c.element {
                ElementRef::Spec { key, .. } => key,
                ElementRef::Node(_) => None,
            })
            .collect();
        assert_eq!(keys, vec![Some(2), Some(1)]);
        assert_eq!(out.layout.children[0].size, Size::new(8.0, 4.0));
    }
}
