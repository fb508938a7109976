//! Display timecode (`HH:MM:SS:FF`, drop-frame `HH:MM:SS;FF`).
//!
//! Timecode is a presentation of an absolute [`Fraction`] at a caller-chosen
//! [`Rate`]; nothing in the analysis itself is computed in timecode.

use crate::error::{Result, StorylineError};
use crate::rate::Rate;
use crate::time::Fraction;

/// Frames dropped per minute (except every tenth) for a drop-frame rate.
fn dropped_per_minute(rate: &Rate) -> Option<i64> {
    if rate.is_drop_frame() {
        Some(rate.nominal() as i64 / 15)
    } else {
        None
    }
}

impl Fraction {
    /// Format as timecode at `rate`, flooring to the containing frame.
    pub fn to_timecode(self, rate: &Rate) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let mut frames = self.abs().to_frames(rate.frame_rate());
        let fps = rate.nominal() as i64;

        let separator = match dropped_per_minute(rate) {
            Some(drop) => {
                let per_ten_minutes = fps * 600 - drop * 9;
                let per_minute = fps * 60 - drop;
                let tens = frames / per_ten_minutes;
                let rem = frames % per_ten_minutes;
                frames += drop * 9 * tens;
                if rem > drop {
                    frames += drop * ((rem - drop) / per_minute);
                }
                ';'
            }
            None => ':',
        };

        let ff = frames % fps;
        let ss = (frames / fps) % 60;
        let mm = (frames / (fps * 60)) % 60;
        let hh = frames / (fps * 3600);
        format!("{sign}{hh:02}:{mm:02}:{ss:02}{separator}{ff:02}")
    }

    /// Parse `HH:MM:SS:FF` (either separator before the frames field) at
    /// `rate`. Drop-frame counting follows the rate, not the separator.
    pub fn from_timecode(timecode: &str, rate: &Rate) -> Result<Self> {
        let invalid = |why: &str| StorylineError::InvalidTime(format!("`{}`: {}", timecode, why));

        let (negative, body) = match timecode.trim().strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, timecode.trim()),
        };

        let fields: Vec<i64> = body
            .split([':', ';'])
            .map(|part| part.parse::<i64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid("non-numeric field"))?;
        let [hh, mm, ss, ff] = fields[..] else {
            return Err(invalid("expected four fields"));
        };

        let fps = rate.nominal() as i64;
        if mm >= 60 || ss >= 60 || ff >= fps || hh < 0 || mm < 0 || ss < 0 || ff < 0 {
            return Err(invalid("field out of range"));
        }

        let mut frames = ((hh * 60 + mm) * 60 + ss) * fps + ff;
        if let Some(drop) = dropped_per_minute(rate) {
            if ss == 0 && ff < drop && mm % 10 != 0 {
                return Err(invalid("frame number dropped in drop-frame counting"));
            }
            let minutes = hh * 60 + mm;
            frames -= drop * (minutes - minutes / 10);
        }

        let value = Fraction::from_frames(frames, rate.frame_rate());
        Ok(if negative { -value } else { value })
    }
}
