// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Timestamps for trace events and pass-cost accounting.
//!
//! The core never reads a clock. Whoever drives the tree stamps events with
//! [`HostTime`] ticks (the runtime uses nanoseconds since it started), and
//! the scheduler averages pass costs as [`Duration`]s in the same ticks.
//! Sinks that print or export times convert through a [`Timebase`].

use core::fmt;

/// A monotonic instant, in ticks chosen by the producer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HostTime(pub u64);

impl HostTime {
    /// The raw tick count.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// This instant in nanoseconds under `timebase`.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Time from `earlier` to `self`; zero when the stamps are out of order,
    /// as they can be across worker threads.
    #[inline]
    #[must_use]
    pub const fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration(self.0.saturating_sub(earlier.0))
    }
}

impl fmt::Debug for HostTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// A span between two [`HostTime`]s.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// The raw tick count.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ticks", self.0)
    }
}

/// Ticks-to-nanoseconds ratio: `nanos = ticks * numer / denom`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    numer: u32,
    denom: u32,
}

impl Timebase {
    /// Ticks are already nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Ticks are microseconds.
    pub const MICROS: Self = Self {
        numer: 1_000,
        denom: 1,
    };

    /// Creates a timebase from a ratio.
    ///
    /// # Panics
    ///
    /// Panics if `denom` is zero.
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count, saturating at `u64::MAX`.
    #[must_use]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        if wide > u64::MAX as u128 {
            u64::MAX
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "checked against u64::MAX above"
            )]
            let nanos = wide as u64;
            nanos
        }
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}
