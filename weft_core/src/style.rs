// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-element style.

use kurbo::{Point, Size};

use crate::dimension::{Dimension, ElementSize};

/// Cross-axis alignment of a single stack child.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlignSelf {
    /// Use the stack's `align_items`.
    #[default]
    Auto,
    /// Align to the cross-axis start.
    Start,
    /// Center on the cross axis.
    Center,
    /// Align to the cross-axis end.
    End,
    /// Fill the stack's cross size.
    Stretch,
}

/// Sizing and flex properties of an element.
///
/// The flex fields only matter when the element is a stack child, and
/// `layout_position` only when it is an absolute child.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    /// Declared size bounds.
    pub size: ElementSize,
    /// Extra main-axis space before this child in a stack.
    pub spacing_before: f64,
    /// Extra main-axis space after this child in a stack.
    pub spacing_after: f64,
    /// Share of positive free space this child absorbs.
    pub flex_grow: f64,
    /// Share of overflow this child gives up, weighted by its basis.
    pub flex_shrink: f64,
    /// Initial main-axis size; `Auto` measures the content.
    pub flex_basis: Dimension,
    /// Cross-axis alignment override.
    pub align_self: AlignSelf,
    /// Origin inside an absolute container.
    pub layout_position: Point,
}

impl Style {
    /// The default style: auto size, no flex, no spacing.
    pub const DEFAULT: Self = Self {
        size: ElementSize::AUTO,
        spacing_before: 0.0,
        spacing_after: 0.0,
        flex_grow: 0.0,
        flex_shrink: 0.0,
        flex_basis: Dimension::Auto,
        align_self: AlignSelf::Auto,
        layout_position: Point::ORIGIN,
    };

    /// A style with a preferred size in points.
    #[must_use]
    pub const fn preferred(size: Size) -> Self {
        Self {
            size: ElementSize::preferred(size),
            ..Self::DEFAULT
        }
    }

    /// Sets the grow factor.
    #[must_use]
    pub const fn grow(mut self, factor: f64) -> Self {
        self.flex_grow = factor;
        self
    }

    /// Sets the shrink factor.
    #[must_use]
    pub const fn shrink(mut self, factor: f64) -> Self {
        self.flex_shrink = factor;
        self
    }

    /// Sets the flex basis.
    #[must_use]
    pub const fn basis(mut self, basis: Dimension) -> Self {
        self.flex_basis = basis;
        self
    }

    /// Sets the cross-axis alignment override.
    #[must_use]
    pub const fn align(mut self, align: AlignSelf) -> Self {
        self.align_self = align;
        self
    }

    /// Sets the absolute-layout origin.
    #[must_use]
    pub const fn at(mut self, position: Point) -> Self {
        self.layout_position = position;
        self
    }

    /// Sets the spacing around this child in a stack.
    #[must_use]
    pub const fn spacing(mut self, before: f64, after: f64) -> Self {
        self.spacing_before = before;
        self.spacing_after = after;
        self
    }

    /// Returns `true` if the child participates in flex distribution.
    #[must_use]
    pub fn is_flexible(&self) -> bool {
        self.flex_grow > 0.0 || self.flex_shrink > 0.0
    }
}

impl Default for Style {
    fn default() -> Self {
        Self::DEFAULT
    }
}
