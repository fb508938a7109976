//! Storyline Core - Foundation types for timeline interchange analysis
//!
//! This crate provides the fundamental types used throughout Storyline:
//! - Exact rational time (Fraction, TimeValue, TimeRange)
//! - Frame rates and the NTSC conform scaling factor (FrameRate, Rate)
//! - Display timecode formatting and parsing
//! - The shared error type

pub mod error;
pub mod rate;
pub mod time;
pub mod timecode;

pub use error::{Result, StorylineError};
pub use rate::{scaling_factor, FrameRate, Rate};
pub use time::{Fraction, TimeRange, TimeValue};
