//! Frame rates and the conform scaling factor between nested timelines.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StorylineError};
use crate::time::Fraction;

/// Frame rate as a rational number (e.g., 24000/1001 for 23.976 fps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    /// Numerator (e.g., 24000)
    pub numerator: u32,
    /// Denominator (e.g., 1001)
    pub denominator: u32,
}

impl FrameRate {
    /// Create a new frame rate.
    #[inline]
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// Derive the frame rate from a frame duration such as `1001/24000s`.
    ///
    /// Returns `None` for zero, negative or out-of-range durations, and for
    /// rates too slow to count a whole frame per timecode second.
    pub fn from_frame_duration(frame_duration: Fraction) -> Option<Self> {
        if frame_duration.is_zero() || frame_duration.is_negative() {
            return None;
        }
        // Fraction is already reduced, so the reciprocal is too.
        let numerator = u32::try_from(frame_duration.denom()).ok()?;
        let denominator = u32::try_from(frame_duration.numer()).ok()?;
        let rate = Self::new(numerator, denominator);
        (rate.nominal() > 0).then_some(rate)
    }

    /// Convert to frames per second as f64.
    #[inline]
    pub fn to_fps_f64(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame.
    #[inline]
    pub fn frame_duration(self) -> Fraction {
        Fraction::new(self.denominator as i64, self.numerator as i64)
    }

    /// Whole frames counted per timecode second (24 for 23.976).
    #[inline]
    pub fn nominal(self) -> u32 {
        (self.numerator + self.denominator / 2) / self.denominator
    }

    /// Whether this is an NTSC pull-down rate (x/1001).
    #[inline]
    pub fn is_ntsc(self) -> bool {
        self.denominator == 1001
    }

    /// Common frame rates
    pub const FPS_23_976: Self = Self::new(24000, 1001);
    pub const FPS_24: Self = Self::new(24, 1);
    pub const FPS_25: Self = Self::new(25, 1);
    pub const FPS_29_97: Self = Self::new(30000, 1001);
    pub const FPS_30: Self = Self::new(30, 1);
    pub const FPS_50: Self = Self::new(50, 1);
    pub const FPS_59_94: Self = Self::new(60000, 1001);
    pub const FPS_60: Self = Self::new(60, 1);
}

impl Default for FrameRate {
    fn default() -> Self {
        Self::FPS_24
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fps = self.to_fps_f64();
        if (fps - fps.round()).abs() < 0.001 {
            write!(f, "{} fps", fps.round() as u32)
        } else {
            write!(f, "{:.3} fps", fps)
        }
    }
}

/// A timeline rate: frame rate plus timecode counting and scan mode.
///
/// Derived once from a `format` resource and never changed afterwards;
/// [`Rate::with_drop_frame`] returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rate {
    frame_rate: FrameRate,
    drop_frame: bool,
    interlaced: bool,
}

impl Rate {
    /// Progressive, non-drop rate.
    pub const fn new(frame_rate: FrameRate) -> Self {
        Self {
            frame_rate,
            drop_frame: false,
            interlaced: false,
        }
    }

    /// Derive from a `format` resource's `frameDuration` and optional
    /// `fieldOrder` attribute.
    pub fn from_format(frame_duration: Fraction, field_order: Option<&str>) -> Option<Self> {
        let frame_rate = FrameRate::from_frame_duration(frame_duration)?;
        let interlaced = field_order.is_some_and(|order| order != "progressive");
        Some(Self {
            frame_rate,
            drop_frame: false,
            interlaced,
        })
    }

    /// Copy of this rate with drop-frame timecode counting set. Only NTSC
    /// 30 and 60 based rates can count drop-frame; others ignore the flag.
    pub fn with_drop_frame(self, drop_frame: bool) -> Self {
        let supports_drop =
            self.frame_rate.is_ntsc() && matches!(self.frame_rate.nominal(), 30 | 60);
        Self {
            drop_frame: drop_frame && supports_drop,
            ..self
        }
    }

    #[inline]
    pub fn frame_rate(&self) -> FrameRate {
        self.frame_rate
    }

    #[inline]
    pub fn nominal(&self) -> u32 {
        self.frame_rate.nominal()
    }

    #[inline]
    pub fn is_ntsc(&self) -> bool {
        self.frame_rate.is_ntsc()
    }

    #[inline]
    pub fn is_drop_frame(&self) -> bool {
        self.drop_frame
    }

    #[inline]
    pub fn is_interlaced(&self) -> bool {
        self.interlaced
    }

    #[inline]
    pub fn frame_duration(&self) -> Fraction {
        self.frame_rate.frame_duration()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.frame_rate)?;
        if self.interlaced {
            f.write_str(" interlaced")?;
        }
        if self.drop_frame {
            f.write_str(" DF")?;
        }
        Ok(())
    }
}

/// Exact factor converting a duration expressed at `from` into the timeline
/// running at `to`.
///
/// Crossing an NTSC boundary at the same nominal rate (24 and 23.976, 30
/// and 29.97, 60 and 59.94) yields the ratio of frame durations: `1001/1000`
/// from the pull-down rate, `1000/1001` towards it. Equal rates, and whole
/// multiples sharing the same NTSC-ness (30 and 60), yield `1`. Anything
/// else, such as 24 against 25, is a [`StorylineError::RateMismatch`].
pub fn scaling_factor(from: &Rate, to: &Rate) -> Result<Fraction> {
    let (a, b) = (from.frame_rate, to.frame_rate);

    if a.nominal() == b.nominal() {
        if a.is_ntsc() == b.is_ntsc() {
            return Ok(Fraction::ONE);
        }
        return Ok(Fraction::new(
            a.denominator as i64 * b.numerator as i64,
            a.numerator as i64 * b.denominator as i64,
        ));
    }

    let (low, high) = (a.nominal().min(b.nominal()), a.nominal().max(b.nominal()));
    if a.is_ntsc() == b.is_ntsc() && low > 0 && high % low == 0 {
        return Ok(Fraction::ONE);
    }

    Err(StorylineError::RateMismatch {
        from: *from,
        to: *to,
    })
}
