//! Extraction output records, per-element diagnostics and the JSON report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use storyline_core::{Fraction, Rate, Result, StorylineError};
use storyline_model::{ElementKind, Occlusion, RoleSet};

/// Marker completion state as shown in the editor's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarkerState {
    Standard,
    ToDo,
    Completed,
    Chapter,
}

/// One collected element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedElement {
    pub kind: ElementKind,
    /// `name`, or a marker's `value`.
    pub name: Option<String>,
    pub note: Option<String>,
    pub marker_state: Option<MarkerState>,
    /// Absolute start; `None` without a timeline origin or on a rate mismatch.
    pub start: Option<Fraction>,
    pub duration: Option<Fraction>,
    /// Rate of the timeline the start is measured in.
    pub timeline_rate: Option<Rate>,
    pub roles: RoleSet,
    pub occlusion: Occlusion,
    pub keywords: Vec<String>,
    pub metadata: BTreeMap<String, String>,
    /// Non-fatal problems found while computing this record.
    pub warnings: Vec<String>,
    /// Descriptions of the breadcrumb chain, document root first.
    pub path: Vec<String>,
}

impl ExtractedElement {
    /// Start as display timecode in the timeline's rate.
    pub fn timecode(&self) -> Option<String> {
        Some(self.start?.to_timecode(self.timeline_rate.as_ref()?))
    }

    /// Start as display timecode in a caller-chosen rate.
    pub fn timecode_at(&self, rate: &Rate) -> Option<String> {
        Some(self.start?.to_timecode(rate))
    }
}

/// A per-element problem. The offending subtree was skipped or the record
/// carries a warning; the rest of the document was still extracted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Description of the element the problem was found on.
    pub location: String,
    pub error: StorylineError,
}

impl Diagnostic {
    pub fn new(location: impl Into<String>, error: StorylineError) -> Self {
        Self {
            location: location.into(),
            error,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.error)
    }
}

/// Elements in document order plus everything that went wrong.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    /// Name of the project the report covers, if it was run per project.
    pub project: Option<String>,
    pub elements: Vec<ExtractedElement>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionReport {
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sort elements by absolute start. Unplaced elements go last; ties keep
    /// document order.
    pub fn sort_by_start(&mut self) {
        self.elements
            .sort_by_key(|element| (element.start.is_none(), element.start));
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            StorylineError::Serialization(format!("Failed to serialize report: {e}"))
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            StorylineError::Serialization(format!("Failed to deserialize report: {e}"))
        })
    }
}
