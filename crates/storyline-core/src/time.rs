//! Time representation for frame-accurate timeline analysis
//!
//! Uses rational numbers to avoid floating-point accumulation errors.
//! All positions and durations are seconds stored as numerator/denominator
//! pairs, reduced on construction so equal values compare equal.

use num_rational::Rational64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};
use std::str::FromStr;

use crate::error::{Result, StorylineError};
use crate::rate::{FrameRate, Rate};

/// An exact rational number of seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fraction {
    /// Time value as a rational number (seconds)
    value: Rational64,
}

impl Fraction {
    /// Create a new Fraction from numerator and denominator.
    ///
    /// # Panics
    /// Panics if `denominator` is zero.
    #[inline]
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self {
            value: Rational64::new(numerator, denominator),
        }
    }

    /// Create a Fraction from whole seconds.
    #[inline]
    pub fn from_integer(seconds: i64) -> Self {
        Self {
            value: Rational64::from_integer(seconds),
        }
    }

    /// Create a Fraction from a frame number and frame rate.
    #[inline]
    pub fn from_frames(frames: i64, rate: FrameRate) -> Self {
        Self {
            value: Rational64::new(frames * rate.denominator as i64, rate.numerator as i64),
        }
    }

    /// Reduced numerator.
    #[inline]
    pub fn numer(self) -> i64 {
        *self.value.numer()
    }

    /// Reduced denominator (always positive).
    #[inline]
    pub fn denom(self) -> i64 {
        *self.value.denom()
    }

    /// Convert to seconds as f64. Display only; never feed back into arithmetic.
    #[inline]
    pub fn to_seconds_f64(self) -> f64 {
        *self.value.numer() as f64 / *self.value.denom() as f64
    }

    /// Convert to frame number at the given frame rate, flooring toward
    /// negative infinity.
    #[inline]
    pub fn to_frames(self, rate: FrameRate) -> i64 {
        let frames_rational =
            self.value * Rational64::new(rate.numerator as i64, rate.denominator as i64);
        frames_rational.floor().to_integer()
    }

    /// Zero time constant.
    pub const ZERO: Self = Self {
        value: Rational64::new_raw(0, 1),
    };

    /// Multiplicative identity, used as the neutral scaling factor.
    pub const ONE: Self = Self {
        value: Rational64::new_raw(1, 1),
    };

    /// Check if this time is zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        *self.value.numer() == 0
    }

    /// Check if this time is negative.
    #[inline]
    pub fn is_negative(self) -> bool {
        *self.value.numer() < 0
    }

    /// Get the absolute value of this time.
    #[inline]
    pub fn abs(self) -> Self {
        if self.is_negative() {
            Self { value: -self.value }
        } else {
            self
        }
    }

    /// Multiplicative inverse, or `None` for zero.
    pub fn recip(self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(Self {
                value: self.value.recip(),
            })
        }
    }

    /// Render in the FCPXML wire form: `"<n>/<d>s"`, or `"<n>s"` when the
    /// value is a whole number of seconds.
    pub fn to_fcpxml_string(self) -> String {
        if self.denom() == 1 {
            format!("{}s", self.numer())
        } else {
            format!("{}/{}s", self.numer(), self.denom())
        }
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Add for Fraction {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
        }
    }
}

impl AddAssign for Fraction {
    fn add_assign(&mut self, rhs: Self) {
        self.value = self.value + rhs.value;
    }
}

impl Sub for Fraction {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
        }
    }
}

impl Neg for Fraction {
    type Output = Self;
    fn neg(self) -> Self {
        Self { value: -self.value }
    }
}

impl Mul for Fraction {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            value: self.value * rhs.value,
        }
    }
}

impl Mul<i64> for Fraction {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self {
            value: self.value * rhs,
        }
    }
}

impl Div<i64> for Fraction {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self {
            value: self.value / rhs,
        }
    }
}

impl Sum for Fraction {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, f| acc + f)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fcpxml_string())
    }
}

impl FromStr for Fraction {
    type Err = StorylineError;

    /// Parse `"<n>/<d>s"` or `"<n>s"`. Frame counts need a rate and go
    /// through [`TimeValue`] instead.
    fn from_str(s: &str) -> Result<Self> {
        match s.parse::<TimeValue>()? {
            TimeValue::Seconds(value) => Ok(value),
            TimeValue::Frames(_) => Err(StorylineError::InvalidTime(format!(
                "`{}` is a frame count, not a time in seconds",
                s
            ))),
        }
    }
}

/// A timing attribute as written on the wire: either rational seconds or a
/// bare frame count that only means something against a governing rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeValue {
    Seconds(Fraction),
    Frames(i64),
}

impl TimeValue {
    /// Resolve to seconds. Frame counts need a rate.
    pub fn resolve(self, rate: Option<&Rate>) -> Result<Fraction> {
        match (self, rate) {
            (Self::Seconds(value), _) => Ok(value),
            (Self::Frames(frames), Some(rate)) => {
                Ok(Fraction::from_frames(frames, rate.frame_rate()))
            }
            (Self::Frames(frames), None) => Err(StorylineError::InvalidTime(format!(
                "frame count {} has no governing frame rate",
                frames
            ))),
        }
    }
}

impl FromStr for TimeValue {
    type Err = StorylineError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || StorylineError::InvalidTime(format!("`{}`", s));

        let Some(body) = trimmed.strip_suffix('s') else {
            return trimmed
                .parse::<i64>()
                .map(Self::Frames)
                .map_err(|_| invalid());
        };

        let (numerator, denominator) = match body.split_once('/') {
            Some((n, d)) => (
                n.parse::<i64>().map_err(|_| invalid())?,
                d.parse::<i64>().map_err(|_| invalid())?,
            ),
            None => (body.parse::<i64>().map_err(|_| invalid())?, 1),
        };
        if denominator <= 0 {
            return Err(invalid());
        }
        Ok(Self::Seconds(Fraction::new(numerator, denominator)))
    }
}

/// A time range with inclusive start and exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start time (inclusive)
    pub start: Fraction,
    /// Duration of the range
    pub duration: Fraction,
}

impl TimeRange {
    /// Create a new time range from start and duration.
    #[inline]
    pub fn new(start: Fraction, duration: Fraction) -> Self {
        Self { start, duration }
    }

    /// Create a time range from start and end times.
    #[inline]
    pub fn from_start_end(start: Fraction, end: Fraction) -> Self {
        Self {
            start,
            duration: end - start,
        }
    }

    /// End time (exclusive).
    #[inline]
    pub fn end(self) -> Fraction {
        self.start + self.duration
    }

    /// Check if a time is within this range.
    #[inline]
    pub fn contains(self, time: Fraction) -> bool {
        time >= self.start && time < self.end()
    }

    /// Check if `other` lies entirely within this range. An empty range
    /// is covered when its start point is contained.
    pub fn covers(self, other: Self) -> bool {
        if other.duration.is_zero() {
            return self.contains(other.start);
        }
        other.start >= self.start && other.end() <= self.end()
    }

    /// Check if two ranges overlap. An empty range overlaps a range that
    /// contains its start point.
    pub fn overlaps(self, other: Self) -> bool {
        if other.duration.is_zero() {
            return self.contains(other.start);
        }
        if self.duration.is_zero() {
            return other.contains(self.start);
        }
        self.start < other.end() && other.start < self.end()
    }

    /// Compute the intersection of two ranges, if any.
    pub fn intersection(self, other: Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let start = self.start.max(other.start);
        let end = self.end().min(other.end());
        Some(Self::from_start_end(start, end))
    }

    /// Empty range starting at zero.
    pub const EMPTY: Self = Self {
        start: Fraction::ZERO,
        duration: Fraction::ZERO,
    };
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::EMPTY
    }
}
