//! Which element kinds an extraction collects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use storyline_model::{AnnotationKind, ElementKind};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExtractionPreset {
    /// Markers and chapter markers.
    #[default]
    Markers,
    Captions,
    Keywords,
    /// Every annotation kind.
    Annotations,
    /// Every clip kind, gaps and transitions included.
    Clips,
    /// An explicit kind set.
    Custom(BTreeSet<ElementKind>),
}

impl ExtractionPreset {
    pub fn custom(kinds: impl IntoIterator<Item = ElementKind>) -> Self {
        Self::Custom(kinds.into_iter().collect())
    }

    pub fn matches(&self, kind: ElementKind) -> bool {
        match self {
            Self::Markers => matches!(
                kind.annotation_kind(),
                Some(AnnotationKind::Marker | AnnotationKind::ChapterMarker)
            ),
            Self::Captions => kind == ElementKind::CAPTION,
            Self::Keywords => kind == ElementKind::KEYWORD,
            Self::Annotations => kind.is_annotation(),
            Self::Clips => kind.is_clip(),
            Self::Custom(kinds) => kinds.contains(&kind),
        }
    }
}
