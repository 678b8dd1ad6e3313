// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Stack layout: children along a main axis with flex distribution.
//!
//! Children are first measured with their basis (or unconstrained on the main
//! axis when the basis is `Auto`). Positive free space goes to growing
//! children in proportion to their grow factors; overflow is taken from
//! shrinking children in proportion to `shrink * basis`, never below zero.
//! The last flexible child absorbs the rounding remainder so the distributed
//! sizes sum to the target exactly.
//!
//! A wrapping stack first breaks its children into lines on their measured
//! main sizes, then flexes each line against the stack's main size. Lines are
//! as tall as their tallest child and are placed by `align_content`; a single
//! line always fills the stack's cross size.

use alloc::vec::Vec;
use core::ops::Range;

use kurbo::Point;

use crate::diagnostics::Diagnostic;
use crate::dimension::{Axis, SizeRange};
use crate::element::{AlignContent, AlignItems, Element, ElementRef, FlexWrap, Justify, Stack};
use crate::layout::Layout;
use crate::style::{AlignSelf, Style};

use super::{Cx, layout_child};

struct Item<'e> {
    element: &'e Element,
    style: Style,
    align: AlignItems,
    /// Main size after the first measurement; the shrink weight.
    basis: f64,
    main: f64,
    layout: Layout,
}

pub(super) fn layout(cx: &mut Cx<'_>, me: ElementRef, stack: &Stack, range: SizeRange) -> Layout {
    if stack.children.is_empty() {
        return Layout::new(me, range.min, Vec::new());
    }

    let axis = stack.direction;
    let cross_axis = axis.cross();
    let (main_min, main_max) = range.along(axis);
    let (cross_min, cross_max) = range.along(cross_axis);
    let parent = range.max;
    let wraps = stack.wrap == FlexWrap::Wrap;
    // Wrapped children stretch to their line, which is not known yet.
    let stretch_min = if wraps { 0.0 } else { cross_min };
    let cross_floor = |align: AlignItems| {
        if align == AlignItems::Stretch {
            stretch_min
        } else {
            0.0
        }
    };

    let mut items = Vec::with_capacity(stack.children.len());
    for element in &stack.children {
        let style = cx.style_of(element);
        let align = child_alignment(&style, stack.align_items, cross_axis);
        let main_bounds = match style.flex_basis.resolve_exact(axis.of(parent)) {
            Some(basis) => (basis, basis),
            None => (0.0, f64::INFINITY),
        };
        let child_range = SizeRange::from_axes(axis, main_bounds, (cross_floor(align), cross_max));
        let layout = layout_child(cx, element, child_range, parent);
        let main = axis.of(layout.size);
        items.push(Item {
            element,
            style,
            align,
            basis: main,
            main,
            layout,
        });
    }

    let lines: Vec<Range<usize>> = if wraps {
        break_lines(&items, stack.spacing, main_max)
    } else {
        core::iter::once(0..items.len()).collect()
    };

    let natural = lines
        .iter()
        .map(|line| extent(&items[line.clone()], stack.spacing))
        .fold(0.0, f64::max);
    let target = natural.min(main_max).max(main_min);

    for line in &lines {
        let line_items = &mut items[line.clone()];
        let gaps = gaps(line_items, stack.spacing);
        let content: f64 = line_items.iter().map(|i| i.main).sum();
        let violation = target - (content + gaps);
        if violation > 0.0 {
            grow(line_items, target - gaps, violation);
        } else if violation < 0.0 {
            let overflow = shrink(line_items, target - gaps);
            if overflow > 0.0 {
                log::debug!("stack {me:?} overflows its {axis:?} axis by {overflow}");
                cx.report(Diagnostic::Overflow {
                    owner: cx.owner(),
                    element: me,
                    axis,
                    amount: overflow,
                });
            }
        }
    }

    for item in &mut items {
        if item.main != item.basis {
            let child_range = SizeRange::from_axes(
                axis,
                (item.main, item.main),
                (cross_floor(item.align), cross_max),
            );
            item.layout = layout_child(cx, item.element, child_range, parent);
            item.main = axis.of(item.layout.size);
        }
    }

    let mut line_cross: Vec<f64> = lines
        .iter()
        .map(|line| {
            items[line.clone()]
                .iter()
                .map(|i| cross_axis.of(i.layout.size))
                .fold(0.0, f64::max)
        })
        .collect();
    let natural_cross =
        line_cross.iter().sum::<f64>() + stack.line_spacing * (lines.len() - 1) as f64;
    let cross = natural_cross.min(cross_max).max(cross_min);
    let free_cross = cross - natural_cross;
    let (mut line_cursor, line_between) = if let [only] = &mut line_cross[..] {
        *only = cross;
        (0.0, 0.0)
    } else if free_cross > 0.0 && stack.align_content == AlignContent::Stretch {
        let extra = free_cross / line_cross.len() as f64;
        for c in &mut line_cross {
            *c += extra;
        }
        (0.0, 0.0)
    } else if free_cross > 0.0 {
        content_offsets(stack.align_content, free_cross, lines.len())
    } else {
        (0.0, 0.0)
    };

    let mut used = Vec::with_capacity(lines.len());
    for (line, &line_size) in lines.iter().zip(&line_cross) {
        for item in &mut items[line.clone()] {
            if item.align == AlignItems::Stretch && cross_axis.of(item.layout.size) != line_size {
                let child_range =
                    SizeRange::from_axes(axis, (item.main, item.main), (line_size, line_size));
                item.layout = layout_child(cx, item.element, child_range, parent);
                item.main = axis.of(item.layout.size);
            }
        }
        let line_items = &items[line.clone()];
        used.push(line_items.iter().map(|i| i.main).sum::<f64>() + gaps(line_items, stack.spacing));
    }
    let main = used
        .iter()
        .map(|u| u.min(main_max).max(main_min))
        .fold(main_min, f64::max);

    let mut children = Vec::with_capacity(items.len());
    let mut items = items.into_iter();
    for ((line, &line_size), &line_used) in lines.iter().zip(&line_cross).zip(&used) {
        let free = main - line_used;
        let (mut cursor, between) = if free > 0.0 {
            justify_offsets(stack.justify, free, line.len())
        } else {
            (0.0, 0.0)
        };
        for item in items.by_ref().take(line.len()) {
            cursor += item.style.spacing_before;
            let child_cross_size = cross_axis.of(item.layout.size);
            let cross_offset = line_cursor
                + match item.align {
                    AlignItems::Start | AlignItems::Stretch => 0.0,
                    AlignItems::Center => (line_size - child_cross_size) / 2.0,
                    AlignItems::End => line_size - child_cross_size,
                };
            let origin = axis.pack(cursor, cross_offset);
            children.push(item.layout.at(Point::new(origin.width, origin.height)));
            cursor += item.main + item.style.spacing_after + stack.spacing + between;
        }
        line_cursor += line_size + stack.line_spacing + line_between;
    }

    Layout::new(me, axis.pack(main, cross), children)
}

/// Spacing along the main axis that is not child content.
fn gaps(items: &[Item<'_>], spacing: f64) -> f64 {
    spacing * (items.len().saturating_sub(1)) as f64
        + items
            .iter()
            .map(|i| i.style.spacing_before + i.style.spacing_after)
            .sum::<f64>()
}

fn extent(items: &[Item<'_>], spacing: f64) -> f64 {
    items.iter().map(|i| i.main).sum::<f64>() + gaps(items, spacing)
}

/// Greedy line breaking on measured main sizes. Every line holds at least
/// one child.
fn break_lines(items: &[Item<'_>], spacing: f64, limit: f64) -> Vec<Range<usize>> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut length = 0.0;
    for (index, item) in items.iter().enumerate() {
        let outer = item.style.spacing_before + item.main + item.style.spacing_after;
        let next = if index == start {
            outer
        } else {
            length + spacing + outer
        };
        if index > start && next > limit {
            lines.push(start..index);
            start = index;
            length = outer;
        } else {
            length = next;
        }
    }
    lines.push(start..items.len());
    lines
}

/// Leading offset and extra gap between lines.
fn content_offsets(align: AlignContent, free: f64, count: usize) -> (f64, f64) {
    let justify = match align {
        AlignContent::Start | AlignContent::Stretch => Justify::Start,
        AlignContent::Center => Justify::Center,
        AlignContent::End => Justify::End,
        AlignContent::SpaceBetween => Justify::SpaceBetween,
        AlignContent::SpaceAround => Justify::SpaceAround,
    };
    justify_offsets(justify, free, count)
}

/// A declared cross size pins the child, so it is not stretched.
fn child_alignment(style: &Style, items: AlignItems, cross_axis: Axis) -> AlignItems {
    let align = match style.align_self {
        AlignSelf::Auto => items,
        AlignSelf::Start => AlignItems::Start,
        AlignSelf::Center => AlignItems::Center,
        AlignSelf::End => AlignItems::End,
        AlignSelf::Stretch => AlignItems::Stretch,
    };
    let declared = match cross_axis {
        Axis::Horizontal => !style.size.width.is_auto(),
        Axis::Vertical => !style.size.height.is_auto(),
    };
    if align == AlignItems::Stretch && declared {
        AlignItems::Start
    } else {
        align
    }
}

fn grow(items: &mut [Item<'_>], target_content: f64, violation: f64) {
    let total: f64 = items
        .iter()
        .filter(|i| i.style.flex_grow > 0.0)
        .map(|i| i.style.flex_grow)
        .sum();
    let Some(last) = items.iter().rposition(|i| i.style.flex_grow > 0.0) else {
        return;
    };
    for (index, item) in items.iter_mut().enumerate() {
        if index != last && item.style.flex_grow > 0.0 {
            item.main += violation * item.style.flex_grow / total;
        }
    }
    let others = sum_except(items, last);
    items[last].main = target_content - others;
}

/// Returns the overflow that could not be absorbed.
fn shrink(items: &mut [Item<'_>], target_content: f64) -> f64 {
    let mut frozen: Vec<bool> = items
        .iter()
        .map(|i| i.style.flex_shrink <= 0.0 || i.basis <= 0.0)
        .collect();
    loop {
        let overflow = items.iter().map(|i| i.main).sum::<f64>() - target_content;
        if overflow <= 0.0 {
            return 0.0;
        }
        let weight: f64 = items
            .iter()
            .zip(&frozen)
            .filter(|(_, f)| !**f)
            .map(|(i, _)| i.style.flex_shrink * i.basis)
            .sum();
        if weight <= 0.0 {
            return overflow;
        }

        let mut froze_any = false;
        for (item, frozen) in items.iter_mut().zip(frozen.iter_mut()) {
            if *frozen {
                continue;
            }
            let cut = overflow * item.style.flex_shrink * item.basis / weight;
            if cut >= item.main {
                item.main = 0.0;
                *frozen = true;
                froze_any = true;
            }
        }
        if froze_any {
            continue;
        }

        let Some(last) = frozen.iter().rposition(|f| !*f) else {
            return overflow;
        };
        for (index, (item, frozen)) in items.iter_mut().zip(&frozen).enumerate() {
            if index != last && !*frozen {
                item.main -= overflow * item.style.flex_shrink * item.basis / weight;
            }
        }
        let others = sum_except(items, last);
        items[last].main = (target_content - others).max(0.0);
        return (others + items[last].main - target_content).max(0.0);
    }
}

fn sum_except(items: &[Item<'_>], skip: usize) -> f64 {
    items
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != skip)
        .map(|(_, i)| i.main)
        .sum()
}

/// Leading offset and extra gap between children.
fn justify_offsets(justify: Justify, free: f64, count: usize) -> (f64, f64) {
    let n = count as f64;
    match justify {
        Justify::Start => (0.0, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::End => (free, 0.0),
        Justify::SpaceBetween if count > 1 => (0.0, free / (n - 1.0)),
        Justify::SpaceBetween => (0.0, 0.0),
        Justify::SpaceAround => (free / n / 2.0, free / n),
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::{Rect, Size};

    use crate::diagnostics::Diagnostic;
    use crate::dimension::Dimension;
    use crate::element::IntrinsicSize;
    use crate::engine::compute_layout;

    use super::*;

    fn fixed(w: f64, h: f64, style: Style) -> Element {
        Element::fixed(Size::new(w, h)).with_style(Style {
            size: Style::preferred(Size::new(w, h)).size,
            ..style
        })
    }

    fn row_range(width: f64, height: f64) -> SizeRange {
        SizeRange::new(Size::new(width, 0.0), Size::new(width, height))
    }

    #[test]
    fn grow_fills_the_remaining_space() {
        let stack = Stack::horizontal()
            .spacing(10.0)
            .child(fixed(50.0, 20.0, Style::DEFAULT))
            .child(fixed(50.0, 20.0, Style::DEFAULT.grow(1.0)));
        let out = compute_layout(&Element::from(stack), row_range(200.0, 100.0));

        let [a, b] = &out.layout.children[..] else {
            panic!("expected two children");
        };
        assert_eq!(a.frame(), Rect::new(0.0, 0.0, 50.0, 20.0));
        assert_eq!(b.frame(), Rect::new(60.0, 0.0, 200.0, 20.0));
        assert_eq!(out.layout.size, Size::new(200.0, 20.0));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn grow_is_proportional_and_conserves_the_target() {
        let stack = Stack::horizontal()
            .child(fixed(10.0, 5.0, Style::DEFAULT.grow(1.0)))
            .child(fixed(10.0, 5.0, Style::DEFAULT.grow(3.0)))
            .child(fixed(10.0, 5.0, Style::DEFAULT.grow(2.0)));
        let out = compute_layout(&Element::from(stack), row_range(100.0, 50.0));

        let widths: Vec<f64> = out.layout.children.iter().map(|c| c.size.width).collect();
        assert_eq!(widths[0], 10.0 + 70.0 / 6.0);
        assert_eq!(widths[1], 10.0 + 70.0 * 3.0 / 6.0);
        assert_eq!(widths.iter().sum::<f64>(), 100.0);
    }

    #[test]
    fn shrink_is_weighted_by_basis() {
        let stack = Stack::horizontal()
            .child(fixed(100.0, 5.0, Style::DEFAULT.shrink(1.0)))
            .child(fixed(300.0, 5.0, Style::DEFAULT.shrink(1.0)));
        let out = compute_layout(&Element::from(stack), row_range(200.0, 50.0));

        let widths: Vec<f64> = out.layout.children.iter().map(|c| c.size.width).collect();
        assert_eq!(widths, vec![50.0, 150.0]);
    }

    #[test]
    fn shrink_never_goes_below_zero() {
        // The small child would need to give up more than it has; it is
        // frozen at zero and the rest comes from the large one.
        let stack = Stack::horizontal()
            .child(fixed(10.0, 5.0, Style::DEFAULT.shrink(100.0)))
            .child(fixed(100.0, 5.0, Style::DEFAULT.shrink(1.0)))
            .child(fixed(40.0, 5.0, Style::DEFAULT));
        let out = compute_layout(&Element::from(stack), row_range(90.0, 50.0));

        let widths: Vec<f64> = out.layout.children.iter().map(|c| c.size.width).collect();
        assert_eq!(widths, vec![0.0, 50.0, 40.0]);
        assert!(widths.iter().all(|w| *w >= 0.0));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn inflexible_overflow_is_reported() {
        let stack = Stack::horizontal()
            .child(fixed(80.0, 5.0, Style::DEFAULT))
            .child(fixed(80.0, 5.0, Style::DEFAULT));
        let out = compute_layout(&Element::from(stack), row_range(100.0, 50.0));

        let widths: Vec<f64> = out.layout.children.iter().map(|c| c.size.width).collect();
        assert_eq!(widths, vec![80.0, 80.0]);
        assert_eq!(out.layout.size.width, 100.0);
        assert!(matches!(
            out.diagnostics[..],
            [Diagnostic::Overflow { axis: Axis::Horizontal, amount, .. }] if amount == 60.0
        ));
    }

    #[test]
    fn justify_space_between_and_center() {
        let children = || {
            [
                fixed(10.0, 10.0, Style::DEFAULT),
                fixed(10.0, 10.0, Style::DEFAULT),
                fixed(10.0, 10.0, Style::DEFAULT),
            ]
        };
        let between = Stack::horizontal()
            .justify(Justify::SpaceBetween)
            .children(children());
        let out = compute_layout(&Element::from(between), row_range(70.0, 10.0));
        let xs: Vec<f64> = out.layout.children.iter().map(|c| c.position.x).collect();
        assert_eq!(xs, vec![0.0, 30.0, 60.0]);

        let center = Stack::horizontal().justify(Justify::Center).children(children());
        let out = compute_layout(&Element::from(center), row_range(70.0, 10.0));
        let xs: Vec<f64> = out.layout.children.iter().map(|c| c.position.x).collect();
        assert_eq!(xs, vec![20.0, 30.0, 40.0]);
    }

    #[test]
    fn cross_alignment_and_stretch() {
        let stack = Stack::vertical()
            .align_items(AlignItems::Center)
            .child(fixed(20.0, 10.0, Style::DEFAULT))
            .child(fixed(60.0, 10.0, Style::DEFAULT))
            .child(
                Element::leaf(IntrinsicSize(Size::new(5.0, 10.0)))
                    .with_style(Style::DEFAULT.align(AlignSelf::Stretch)),
            );
        let out = compute_layout(&Element::from(stack), SizeRange::up_to(Size::new(100.0, 100.0)));

        let frames: Vec<Rect> = out.layout.children.iter().map(Layout::frame).collect();
        assert_eq!(out.layout.size, Size::new(60.0, 30.0));
        assert_eq!(frames[0], Rect::new(20.0, 0.0, 40.0, 10.0));
        assert_eq!(frames[1], Rect::new(0.0, 10.0, 60.0, 20.0));
        assert_eq!(frames[2], Rect::new(0.0, 20.0, 60.0, 30.0));
    }

    #[test]
    fn per_child_spacing_and_percent_basis() {
        let stack = Stack::horizontal()
            .child(fixed(10.0, 10.0, Style::DEFAULT.spacing(0.0, 5.0)))
            .child(
                Element::fixed(Size::new(1.0, 10.0))
                    .with_style(Style::DEFAULT.basis(Dimension::Percent(25.0)).spacing(2.0, 0.0)),
            );
        let out = compute_layout(&Element::from(stack), row_range(200.0, 10.0));
        let frames: Vec<Rect> = out.layout.children.iter().map(Layout::frame).collect();
        assert_eq!(frames[0].x0, 0.0);
        assert_eq!(frames[1].x0, 17.0);
        assert_eq!(frames[1].width(), 50.0);
    }

    fn wrapped_row() -> Stack {
        Stack::horizontal()
            .wrap(FlexWrap::Wrap)
            .spacing(10.0)
            .line_spacing(5.0)
            .child(fixed(40.0, 10.0, Style::DEFAULT))
            .child(fixed(40.0, 20.0, Style::DEFAULT))
            .child(fixed(40.0, 10.0, Style::DEFAULT))
    }

    fn frames(layout: &Layout) -> Vec<Rect> {
        layout.children.iter().map(Layout::frame).collect()
    }

    #[test]
    fn wrap_breaks_lines_at_the_main_maximum() {
        let out = compute_layout(&Element::from(wrapped_row()), row_range(100.0, 100.0));
        assert_eq!(
            frames(&out.layout),
            vec![
                Rect::new(0.0, 0.0, 40.0, 10.0),
                Rect::new(50.0, 0.0, 90.0, 20.0),
                Rect::new(0.0, 25.0, 40.0, 35.0),
            ]
        );
        assert_eq!(out.layout.size, Size::new(100.0, 35.0));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn unbounded_wrap_stays_on_one_line() {
        let out = compute_layout(&Element::from(wrapped_row()), SizeRange::UNBOUNDED);
        let ys: Vec<f64> = out.layout.children.iter().map(|c| c.position.y).collect();
        assert_eq!(ys, vec![0.0, 0.0, 0.0]);
        assert_eq!(out.layout.size, Size::new(140.0, 20.0));
    }

    #[test]
    fn align_content_places_lines() {
        let tall = SizeRange::exact(Size::new(100.0, 100.0));
        let line_tops = |align: AlignContent| {
            let stack = wrapped_row().align_content(align);
            let out = compute_layout(&Element::from(stack), tall);
            (out.layout.children[0].position.y, out.layout.children[2].position.y)
        };
        // 65 of free cross space around lines of 20 and 10.
        assert_eq!(line_tops(AlignContent::Start), (0.0, 25.0));
        assert_eq!(line_tops(AlignContent::Center), (32.5, 57.5));
        assert_eq!(line_tops(AlignContent::End), (65.0, 90.0));
        assert_eq!(line_tops(AlignContent::SpaceBetween), (0.0, 90.0));
    }

    #[test]
    fn stretched_lines_stretch_their_children() {
        let stack = Stack::horizontal()
            .wrap(FlexWrap::Wrap)
            .spacing(10.0)
            .line_spacing(5.0)
            .align_content(AlignContent::Stretch)
            .child(Element::leaf(IntrinsicSize(Size::new(40.0, 10.0))))
            .child(fixed(40.0, 20.0, Style::DEFAULT))
            .child(fixed(40.0, 10.0, Style::DEFAULT));
        let out = compute_layout(&Element::from(stack), SizeRange::exact(Size::new(100.0, 100.0)));
        let frames = frames(&out.layout);
        assert_eq!(frames[0], Rect::new(0.0, 0.0, 40.0, 52.5));
        assert_eq!(frames[1].y0, 0.0, "a declared height is not stretched");
        assert_eq!(frames[2].y0, 57.5);
    }

    #[test]
    fn each_line_flexes_on_its_own() {
        let stack = Stack::horizontal()
            .wrap(FlexWrap::Wrap)
            .child(fixed(60.0, 10.0, Style::DEFAULT.grow(1.0)))
            .child(fixed(60.0, 10.0, Style::DEFAULT));
        let out = compute_layout(&Element::from(stack), row_range(100.0, 100.0));
        assert_eq!(
            frames(&out.layout),
            vec![Rect::new(0.0, 0.0, 100.0, 10.0), Rect::new(0.0, 10.0, 60.0, 20.0)]
        );
    }

    #[test]
    fn empty_stack_takes_range_min() {
        let out = compute_layout(
            &Element::from(Stack::vertical()),
            SizeRange::new(Size::new(4.0, 2.0), Size::new(10.0, 10.0)),
        );
        assert_eq!(out.layout.size, Size::new(4.0, 2.0));
        assert!(out.layout.children.is_empty());
    }
}
