//! Storyline Extract - scoped extraction of timeline elements
//!
//! Walks an FCPXML document and yields markers, captions, keywords or clips
//! with their absolute position, roles, occlusion, keywords and metadata.
//! What is collected is chosen by an [`ExtractionPreset`]; how deep the walk
//! goes and which hidden elements survive by an [`ExtractionScope`].

pub mod metadata;
pub mod pipeline;
pub mod preset;
pub mod report;
pub mod scope;

pub use pipeline::{extract, extract_document, extract_projects, Extraction};
pub use preset::ExtractionPreset;
pub use report::{Diagnostic, ExtractedElement, ExtractionReport, MarkerState};
pub use scope::{AngleMask, AuditionMask, Depth, ExtractionScope};
