// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ratio layout.

use alloc::vec;
use alloc::vec::Vec;

use kurbo::Size;

use crate::diagnostics::Diagnostic;
use crate::dimension::SizeRange;
use crate::element::{ElementRef, Ratio};
use crate::layout::Layout;

use super::{Cx, abs, layout_child};

/// Lays the child out at the size closest to `height / width == ratio`.
///
/// Candidates come from the finite maxima: full width with derived height,
/// and full height with derived width, each clamped into the range. The first
/// candidate wins ties. With no finite maximum the child gets the range
/// unchanged.
pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, ratio: &Ratio, range: SizeRange) -> Layout {
    let r = ratio.ratio;
    if !(r > 0.0 && r.is_finite()) {
        cx.report(Diagnostic::InvalidRatio {
            owner: cx.owner(),
            element: me,
            ratio: r,
        });
        let child = layout_child(cx, &ratio.child, range, range.max);
        return Layout::new(me, child.size, vec![child]);
    }

    let mut candidates = Vec::with_capacity(2);
    if range.max.width.is_finite() {
        let w = range.max.width;
        candidates.push(range.clamp(Size::new(w, r * w)));
    }
    if range.max.height.is_finite() {
        let h = range.max.height;
        candidates.push(range.clamp(Size::new(h / r, h)));
    }

    let deviation = |s: &Size| {
        let d = abs(s.height / s.width - r);
        if d.is_nan() { f64::INFINITY } else { d }
    };
    let mut best: Option<Size> = None;
    for candidate in candidates {
        if best.is_none_or(|b| deviation(&candidate) < deviation(&b)) {
            best = Some(candidate);
        }
    }

    let (child_range, parent) = match best {
        Some(size) => (range.intersect(&SizeRange::exact(size)), size),
        None => (range, range.max),
    };
    let child = layout_child(cx, &ratio.child, child_range, parent);
    Layout::new(me, child.size, vec![child])
}

#[cfg(test)]
mod tests {
    use crate::element::{Element, Leaf};
    use crate::engine::compute_layout;

    use super::*;

    #[test]
    fn width_bound_derives_height() {
        let el = Element::from(Ratio::new(0.5, Element::from(Leaf::empty())));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(100.0, f64::INFINITY)));
        assert_eq!(out.layout.size, Size::new(100.0, 50.0));
    }

    #[test]
    fn closest_candidate_wins() {
        // Full width would need height 200, clamped to 80; full height gives
        // width 40 at the exact ratio.
        let el = Element::from(Ratio::new(2.0, Element::from(Leaf::empty())));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(100.0, 80.0)));
        assert_eq!(out.layout.size, Size::new(40.0, 80.0));
    }

    #[test]
    fn non_positive_ratio_is_reported() {
        let el = Element::from(Ratio::new(0.0, Element::fixed(Size::new(3.0, 3.0))));
        let out = compute_layout(&el, SizeRange::up_to(Size::new(10.0, 10.0)));
        assert_eq!(out.layout.size, Size::new(3.0, 3.0));
        assert!(matches!(out.diagnostics[..], [Diagnostic::InvalidRatio { ratio, .. }] if ratio == 0.0));
    }
}
