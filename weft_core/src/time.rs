// Copyright 2026 the Weft Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slice budgets and timebase conversion.
//!
//! A [`Deadline`](crate::scheduler::Deadline) reports the time left in the
//! current cooperative slice as a [`Duration`] in host-native ticks. The
//! [`Timebase`] carried by each backend converts those ticks to nanoseconds
//! (`nanoseconds = ticks * numer / denom`), so configuration can be written in
//! wall-clock units and compared against whatever resolution the host clock
//! happens to have.

use core::fmt;
use core::ops::{Add, Sub};

/// Rational conversion factor from ticks to nanoseconds.
///
/// `nanoseconds = ticks * numer / denom`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timebase {
    /// Numerator of the ticks-to-nanoseconds ratio.
    pub numer: u32,
    /// Denominator of the ticks-to-nanoseconds ratio.
    pub denom: u32,
}

impl Timebase {
    /// Ticks are nanoseconds.
    pub const NANOS: Self = Self { numer: 1, denom: 1 };

    /// Ticks are microseconds (the browser `performance.now()` resolution
    /// used by the web backend).
    pub const MICROS: Self = Self {
        numer: 1_000,
        denom: 1,
    };

    /// Creates a new timebase with the given numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `numer` or `denom` is zero.
    #[inline]
    #[must_use]
    pub const fn new(numer: u32, denom: u32) -> Self {
        assert!(numer != 0, "timebase numerator must not be zero");
        assert!(denom != 0, "timebase denominator must not be zero");
        Self { numer, denom }
    }

    /// Converts a tick count to nanoseconds.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn ticks_to_nanos(self, ticks: u64) -> u64 {
        let wide = ticks as u128 * self.numer as u128 / self.denom as u128;
        wide as u64
    }

    /// Converts nanoseconds to a tick count.
    #[inline]
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "u128 intermediate avoids overflow; truncation back to u64 is intentional"
    )]
    pub const fn nanos_to_ticks(self, nanos: u64) -> u64 {
        let wide = nanos as u128 * self.denom as u128 / self.numer as u128;
        wide as u64
    }
}

impl fmt::Debug for Timebase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timebase({}/{})", self.numer, self.denom)
    }
}

/// A span of time in host-native ticks.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Duration(pub u64);

impl Duration {
    /// A zero-length duration. A deadline reporting this has no budget left.
    pub const ZERO: Self = Self(0);

    /// The largest representable duration, used by deadlines that never
    /// expire.
    pub const MAX: Self = Self(u64::MAX);

    /// Returns the raw tick value.
    #[inline]
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Converts this duration to nanoseconds using the given timebase.
    #[inline]
    #[must_use]
    pub const fn to_nanos(self, timebase: Timebase) -> u64 {
        timebase.ticks_to_nanos(self.0)
    }

    /// Creates a duration from a nanosecond value and timebase.
    #[inline]
    #[must_use]
    pub const fn from_nanos(nanos: u64, timebase: Timebase) -> Self {
        Self(timebase.nanos_to_ticks(nanos))
    }

    /// Creates a duration from whole milliseconds.
    #[inline]
    #[must_use]
    pub const fn from_millis(millis: u64, timebase: Timebase) -> Self {
        Self::from_nanos(millis.saturating_mul(1_000_000), timebase)
    }

    /// Creates a duration from fractional milliseconds, as reported by
    /// browser timing APIs. Negative and NaN inputs clamp to zero.
    #[inline]
    #[must_use]
    pub fn from_millis_f64(millis: f64, timebase: Timebase) -> Self {
        if millis.is_nan() || millis <= 0.0 {
            return Self::ZERO;
        }
        #[expect(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            reason = "value is positive; `as` saturates at u64::MAX"
        )]
        let nanos = (millis * 1_000_000.0) as u64;
        Self::from_nanos(nanos, timebase)
    }

    /// Returns this duration as fractional milliseconds.
    #[inline]
    #[must_use]
    pub fn as_millis_f64(self, timebase: Timebase) -> f64 {
        self.to_nanos(timebase) as f64 / 1_000_000.0
    }

    /// Saturating addition.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }

    /// Saturating subtraction.
    #[inline]
    #[must_use]
    pub const fn saturating_sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Add for Duration {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Duration {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Duration({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "timebase numerator must not be zero")]
    fn zero_numerator_is_rejected() {
        let _ = Timebase::new(0, 1);
    }

    #[test]
    #[should_panic(expected = "timebase denominator must not be zero")]
    fn zero_denominator_is_rejected() {
        let _ = Timebase::new(1, 0);
    }

    #[test]
    fn one_millisecond_in_microsecond_ticks() {
        assert_eq!(Duration::from_millis(1, Timebase::MICROS), Duration(1_000));
        assert_eq!(Duration::from_millis(1, Timebase::NANOS), Duration(1_000_000));
    }

    #[test]
    fn fractional_millis_from_idle_deadline() {
        let d = Duration::from_millis_f64(12.5, Timebase::MICROS);
        assert_eq!(d, Duration(12_500));
        assert!((d.as_millis_f64(Timebase::MICROS) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn negative_and_nan_millis_clamp_to_zero() {
        assert_eq!(Duration::from_millis_f64(-3.0, Timebase::MICROS), Duration::ZERO);
        assert_eq!(
            Duration::from_millis_f64(f64::NAN, Timebase::MICROS),
            Duration::ZERO
        );
    }

    #[test]
    fn overflow_safe_conversion() {
        let tb = Timebase::new(125, 3);
        // Should not panic; result is approximate but deterministic.
        let _nanos = Duration(u64::MAX / 2).to_nanos(tb);
    }

    #[test]
    fn duration_arithmetic() {
        let a = Duration(100);
        let b = Duration(30);
        assert_eq!((a + b).ticks(), 130);
        assert_eq!((a - b).ticks(), 70);
        assert_eq!(a.saturating_sub(Duration(200)), Duration::ZERO);
        assert_eq!(Duration::MAX.saturating_add(a), Duration::MAX);
    }
}
