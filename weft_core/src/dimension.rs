// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Semantic units and size ranges.
//!
//! A [`Dimension`] is what a style declares: points, a percentage of the
//! parent, or `Auto`. A [`SizeRange`] is what layout works with: concrete
//! min/max bounds per axis, where a bound may be `f64::INFINITY`.
//! [`ElementSize`] bundles the six dimensions an element can declare and
//! resolves them into a range.

use kurbo::Size;

/// A layout axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The x axis.
    Horizontal,
    /// The y axis.
    Vertical,
}

impl Axis {
    /// Returns the other axis.
    #[inline]
    #[must_use]
    pub const fn cross(self) -> Self {
        match self {
            Self::Horizontal => Self::Vertical,
            Self::Vertical => Self::Horizontal,
        }
    }

    /// Returns the component of `size` along this axis.
    #[inline]
    #[must_use]
    pub const fn of(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }

    /// Builds a size from main and cross components, with `self` as main.
    #[inline]
    #[must_use]
    pub const fn pack(self, main: f64, cross: f64) -> Size {
        match self {
            Self::Horizontal => Size::new(main, cross),
            Self::Vertical => Size::new(cross, main),
        }
    }
}

/// A declared length.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Dimension {
    /// Determined by content or by the parent's algorithm.
    #[default]
    Auto,
    /// An absolute length in points.
    Points(f64),
    /// A percentage (0 to 100) of the parent's resolved size on the same axis.
    Percent(f64),
}

impl Dimension {
    /// Resolves against the parent's size on this axis.
    ///
    /// `Auto` yields `auto`. A percentage of a non-finite parent also yields
    /// `auto`, since there is nothing to take a fraction of.
    #[must_use]
    pub fn resolve(self, parent: f64, auto: f64) -> f64 {
        match self {
            Self::Auto => auto,
            Self::Points(v) => v,
            Self::Percent(p) if parent.is_finite() => parent * p / 100.0,
            Self::Percent(_) => auto,
        }
    }

    /// Resolves to a concrete length, or `None` for `Auto`.
    #[must_use]
    pub fn resolve_exact(self, parent: f64) -> Option<f64> {
        let v = self.resolve(parent, f64::NAN);
        (!v.is_nan()).then_some(v)
    }

    /// Returns `true` if this is [`Dimension::Auto`].
    #[inline]
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto)
    }
}

/// Min/max bounds on a concrete size.
///
/// Either bound may be infinite on either axis. Once resolved, `min <= max`
/// per axis; [`clamp`](Self::clamp) lets `min` win when that is violated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SizeRange {
    /// Smallest acceptable size.
    pub min: Size,
    /// Largest acceptable size.
    pub max: Size,
}

impl SizeRange {
    /// `[0, inf]` on both axes.
    pub const UNBOUNDED: Self = Self {
        min: Size::ZERO,
        max: Size::new(f64::INFINITY, f64::INFINITY),
    };

    /// Creates a range from explicit bounds.
    #[inline]
    #[must_use]
    pub const fn new(min: Size, max: Size) -> Self {
        Self { min, max }
    }

    /// A range that admits exactly `size`.
    #[inline]
    #[must_use]
    pub const fn exact(size: Size) -> Self {
        Self {
            min: size,
            max: size,
        }
    }

    /// `[0, max]` on both axes.
    #[inline]
    #[must_use]
    pub const fn up_to(max: Size) -> Self {
        Self {
            min: Size::ZERO,
            max,
        }
    }

    /// Returns `true` if min equals max on both axes.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.min == self.max
    }

    /// Clamps `size` into the range. `min` wins over `max` when they cross.
    #[must_use]
    pub fn clamp(&self, size: Size) -> Size {
        Size::new(
            size.width.min(self.max.width).max(self.min.width),
            size.height.min(self.max.height).max(self.min.height),
        )
    }

    /// Intersects two ranges per axis.
    ///
    /// When the ranges do not overlap on an axis, the result collapses to the
    /// bound of `self` nearest `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let (min_w, max_w) = intersect_axis(
            self.min.width,
            self.max.width,
            other.min.width,
            other.max.width,
        );
        let (min_h, max_h) = intersect_axis(
            self.min.height,
            self.max.height,
            other.min.height,
            other.max.height,
        );
        Self {
            min: Size::new(min_w, min_h),
            max: Size::new(max_w, max_h),
        }
    }

    /// Returns the `(min, max)` bounds along `axis`.
    #[inline]
    #[must_use]
    pub const fn along(&self, axis: Axis) -> (f64, f64) {
        (axis.of(self.min), axis.of(self.max))
    }

    /// Builds a range from main/cross bounds with `axis` as main.
    #[inline]
    #[must_use]
    pub const fn from_axes(axis: Axis, main: (f64, f64), cross: (f64, f64)) -> Self {
        Self {
            min: axis.pack(main.0, cross.0),
            max: axis.pack(main.1, cross.1),
        }
    }

    /// Bitwise identity of the range, usable as an ordered map key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> RangeKey {
        RangeKey([
            self.min.width.to_bits(),
            self.min.height.to_bits(),
            self.max.width.to_bits(),
            self.max.height.to_bits(),
        ])
    }
}

impl Default for SizeRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Bit pattern of a [`SizeRange`]; two ranges share a key only if they are
/// bit-identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RangeKey([u64; 4]);

impl RangeKey {
    pub(crate) const MIN: Self = Self([0; 4]);
    pub(crate) const MAX: Self = Self([u64::MAX; 4]);
}

fn intersect_axis(a_min: f64, a_max: f64, b_min: f64, b_max: f64) -> (f64, f64) {
    let lo = a_min.max(b_min);
    let hi = a_max.min(b_max);
    if lo <= hi {
        (lo, hi)
    } else if a_min < b_min {
        (a_max, a_max)
    } else {
        (a_min, a_min)
    }
}

/// The six sizing dimensions an element may declare.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ElementSize {
    /// Preferred width.
    pub width: Dimension,
    /// Preferred height.
    pub height: Dimension,
    /// Lower bound on width.
    pub min_width: Dimension,
    /// Upper bound on width.
    pub max_width: Dimension,
    /// Lower bound on height.
    pub min_height: Dimension,
    /// Upper bound on height.
    pub max_height: Dimension,
}

impl ElementSize {
    /// Everything `Auto`.
    pub const AUTO: Self = Self {
        width: Dimension::Auto,
        height: Dimension::Auto,
        min_width: Dimension::Auto,
        max_width: Dimension::Auto,
        min_height: Dimension::Auto,
        max_height: Dimension::Auto,
    };

    /// A preferred size in points.
    #[must_use]
    pub const fn preferred(size: Size) -> Self {
        Self {
            width: Dimension::Points(size.width),
            height: Dimension::Points(size.height),
            ..Self::AUTO
        }
    }

    /// Resolves against `parent` with an unbounded auto range.
    #[must_use]
    pub fn resolve(&self, parent: Size) -> SizeRange {
        self.resolve_with_auto(parent, SizeRange::UNBOUNDED)
    }

    /// Resolves against `parent`; `Auto` bounds take their value from `auto`.
    ///
    /// Min overrides max, and max overrides the preferred size.
    #[must_use]
    pub fn resolve_with_auto(&self, parent: Size, auto: SizeRange) -> SizeRange {
        let (min_w, max_w) = constrain(
            self.min_width.resolve(parent.width, auto.min.width),
            self.width.resolve_exact(parent.width),
            self.max_width.resolve(parent.width, auto.max.width),
        );
        let (min_h, max_h) = constrain(
            self.min_height.resolve(parent.height, auto.min.height),
            self.height.resolve_exact(parent.height),
            self.max_height.resolve(parent.height, auto.max.height),
        );
        SizeRange::new(Size::new(min_w, min_h), Size::new(max_w, max_h))
    }
}

fn constrain(min: f64, exact: Option<f64>, max: f64) -> (f64, f64) {
    if max <= min {
        return (min, min);
    }
    match exact {
        None => (min, max),
        Some(v) if v > max => (max, max),
        Some(v) if v < min => (min, min),
        Some(v) => (v, v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_resolves_against_finite_parent() {
        assert_eq!(Dimension::Percent(25.0).resolve(200.0, 0.0), 50.0);
        assert_eq!(Dimension::Percent(25.0).resolve(f64::INFINITY, 7.0), 7.0);
        assert_eq!(Dimension::Auto.resolve_exact(100.0), None);
        assert_eq!(Dimension::Points(3.0).resolve_exact(100.0), Some(3.0));
    }

    #[test]
    fn clamp_prefers_min_when_bounds_cross() {
        let r = SizeRange::new(Size::new(50.0, 0.0), Size::new(10.0, 5.0));
        assert_eq!(r.clamp(Size::new(30.0, 30.0)), Size::new(50.0, 5.0));
    }

    #[test]
    fn intersect_overlapping_and_disjoint() {
        let a = SizeRange::new(Size::new(0.0, 10.0), Size::new(100.0, 20.0));
        let b = SizeRange::new(Size::new(50.0, 30.0), Size::new(200.0, 40.0));
        let r = a.intersect(&b);
        // Width overlaps on [50, 100]; height is disjoint and `a` lies below.
        assert_eq!(r.min, Size::new(50.0, 20.0));
        assert_eq!(r.max, Size::new(100.0, 20.0));
    }

    #[test]
    fn element_size_min_overrides_max_overrides_exact() {
        let size = ElementSize {
            width: Dimension::Points(500.0),
            max_width: Dimension::Points(300.0),
            height: Dimension::Points(10.0),
            min_height: Dimension::Points(40.0),
            ..ElementSize::AUTO
        };
        let r = size.resolve(Size::new(1000.0, 1000.0));
        assert_eq!(r.min, Size::new(300.0, 40.0));
        assert_eq!(r.max, Size::new(300.0, 40.0));

        let crossed = ElementSize {
            min_width: Dimension::Points(80.0),
            max_width: Dimension::Points(20.0),
            ..ElementSize::AUTO
        };
        let r = crossed.resolve(Size::ZERO);
        assert_eq!((r.min.width, r.max.width), (80.0, 80.0));
    }

    #[test]
    fn auto_size_is_unbounded() {
        let r = ElementSize::AUTO.resolve(Size::new(10.0, 10.0));
        assert_eq!(r, SizeRange::UNBOUNDED);
    }

    #[test]
    fn range_keys_distinguish_bit_patterns() {
        let a = SizeRange::exact(Size::new(1.0, 2.0));
        let b = SizeRange::exact(Size::new(1.0, 2.0));
        let c = SizeRange::exact(Size::new(1.0, 2.5));
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }
}
