//! Error types for Storyline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rate::Rate;

/// Main error type for Storyline operations.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorylineError {
    /// Malformed or unsupported document shape: unknown version, missing
    /// resources section, duplicate resource id, reference cycle.
    #[error("Structural error: {0}")]
    Structural(String),

    /// A `ref`/`format` attribute names a missing or wrong-kind resource.
    #[error("Unresolved reference: `{id}` does not name a {expected} resource")]
    UnresolvedReference { id: String, expected: String },

    /// Two nested timelines whose rates are not NTSC conjugates.
    #[error("Rate mismatch: {from} cannot be conformed to {to}")]
    RateMismatch { from: Rate, to: Rate },

    #[error("Invalid time value: {0}")]
    InvalidTime(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorylineError {
    /// Whether this error invalidates the whole document rather than a
    /// single element.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Structural(_) | Self::Xml(_))
    }

    /// Shorthand for [`StorylineError::UnresolvedReference`].
    pub fn unresolved(id: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            id: id.into(),
            expected: expected.into(),
        }
    }
}

/// Result type alias for Storyline operations.
pub type Result<T> = std::result::Result<T, StorylineError>;
