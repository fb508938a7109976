//! Element classification.
//!
//! Every component matches on [`ElementKind`] instead of comparing tag
//! strings. Classification looks only at the node's own tag and, for
//! `media`, at its immediate children.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::node::XmlNode;

/// Closed set of element kinds understood by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementKind {
    /// Timeline content: clips, annotations and their containers.
    Story(StoryKind),
    /// Library organisation: library, event, project.
    Structure(StructureKind),
    /// Entries of the `resources` section.
    Resource(ResourceKind),
    /// The `resources` section itself.
    Resources,
    /// The `fcpxml` document root.
    Root,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoryKind {
    Clip(ClipKind),
    Annotation(AnnotationKind),
    Container(ContainerKind),
}

/// Clip-like story elements. All of them can sit in a spine and carry
/// `offset`/`duration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClipKind {
    AssetClip,
    Clip,
    Gap,
    Video,
    Audio,
    Title,
    Transition,
    McClip,
    RefClip,
    SyncClip,
    Audition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnnotationKind {
    Marker,
    ChapterMarker,
    Keyword,
    Caption,
}

/// Timelines and the storylines inside them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ContainerKind {
    Sequence,
    Spine,
    Multicam,
    McAngle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    Library,
    Event,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Asset,
    Format,
    Media(MediaKind),
    Effect,
    Locator,
    ObjectTracker,
    TrackingShape,
}

/// Which container a `media` resource wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaKind {
    Sequence,
    Multicam,
}

impl ElementKind {
    pub const MARKER: Self = Self::Story(StoryKind::Annotation(AnnotationKind::Marker));
    pub const CHAPTER_MARKER: Self =
        Self::Story(StoryKind::Annotation(AnnotationKind::ChapterMarker));
    pub const KEYWORD: Self = Self::Story(StoryKind::Annotation(AnnotationKind::Keyword));
    pub const CAPTION: Self = Self::Story(StoryKind::Annotation(AnnotationKind::Caption));

    /// Shorthand for a clip kind.
    pub const fn clip(kind: ClipKind) -> Self {
        Self::Story(StoryKind::Clip(kind))
    }

    /// Shorthand for a container kind.
    pub const fn container(kind: ContainerKind) -> Self {
        Self::Story(StoryKind::Container(kind))
    }

    pub fn clip_kind(self) -> Option<ClipKind> {
        match self {
            Self::Story(StoryKind::Clip(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn annotation_kind(self) -> Option<AnnotationKind> {
        match self {
            Self::Story(StoryKind::Annotation(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn container_kind(self) -> Option<ContainerKind> {
        match self {
            Self::Story(StoryKind::Container(kind)) => Some(kind),
            _ => None,
        }
    }

    pub fn is_clip(self) -> bool {
        self.clip_kind().is_some()
    }

    pub fn is_annotation(self) -> bool {
        self.annotation_kind().is_some()
    }

    /// Annotations whose `start` is a point in the parent clip's local time
    /// (markers and keywords). Captions are positioned like clips.
    pub fn is_point_annotation(self) -> bool {
        matches!(
            self.annotation_kind(),
            Some(AnnotationKind::Marker | AnnotationKind::ChapterMarker | AnnotationKind::Keyword)
        )
    }

    /// Wire tag name for this kind.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Story(StoryKind::Clip(kind)) => match kind {
                ClipKind::AssetClip => "asset-clip",
                ClipKind::Clip => "clip",
                ClipKind::Gap => "gap",
                ClipKind::Video => "video",
                ClipKind::Audio => "audio",
                ClipKind::Title => "title",
                ClipKind::Transition => "transition",
                ClipKind::McClip => "mc-clip",
                ClipKind::RefClip => "ref-clip",
                ClipKind::SyncClip => "sync-clip",
                ClipKind::Audition => "audition",
            },
            Self::Story(StoryKind::Annotation(kind)) => match kind {
                AnnotationKind::Marker => "marker",
                AnnotationKind::ChapterMarker => "chapter-marker",
                AnnotationKind::Keyword => "keyword",
                AnnotationKind::Caption => "caption",
            },
            Self::Story(StoryKind::Container(kind)) => match kind {
                ContainerKind::Sequence => "sequence",
                ContainerKind::Spine => "spine",
                ContainerKind::Multicam => "multicam",
                ContainerKind::McAngle => "mc-angle",
            },
            Self::Structure(kind) => match kind {
                StructureKind::Library => "library",
                StructureKind::Event => "event",
                StructureKind::Project => "project",
            },
            Self::Resource(kind) => match kind {
                ResourceKind::Asset => "asset",
                ResourceKind::Format => "format",
                ResourceKind::Media(_) => "media",
                ResourceKind::Effect => "effect",
                ResourceKind::Locator => "locator",
                ResourceKind::ObjectTracker => "object-tracker",
                ResourceKind::TrackingShape => "tracking-shape",
            },
            Self::Resources => "resources",
            Self::Root => "fcpxml",
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resource(ResourceKind::Media(MediaKind::Sequence)) => f.write_str("media(sequence)"),
            Self::Resource(ResourceKind::Media(MediaKind::Multicam)) => f.write_str("media(multicam)"),
            other => f.write_str(other.tag()),
        }
    }
}

/// Classify a node. Returns `None` for tags outside the model (filters,
/// notes, metadata) and for `media` that does not hold exactly one of
/// `sequence`/`multicam`.
pub fn classify<N: XmlNode>(node: N) -> Option<ElementKind> {
    use ElementKind as E;

    let kind = match node.tag() {
        "asset-clip" => E::clip(ClipKind::AssetClip),
        "clip" => E::clip(ClipKind::Clip),
        "gap" => E::clip(ClipKind::Gap),
        "video" => E::clip(ClipKind::Video),
        "audio" => E::clip(ClipKind::Audio),
        "title" => E::clip(ClipKind::Title),
        "transition" => E::clip(ClipKind::Transition),
        "mc-clip" => E::clip(ClipKind::McClip),
        "ref-clip" => E::clip(ClipKind::RefClip),
        "sync-clip" => E::clip(ClipKind::SyncClip),
        "audition" => E::clip(ClipKind::Audition),

        "marker" => E::MARKER,
        "chapter-marker" => E::CHAPTER_MARKER,
        "keyword" => E::KEYWORD,
        "caption" => E::CAPTION,

        "sequence" => E::container(ContainerKind::Sequence),
        "spine" => E::container(ContainerKind::Spine),
        "multicam" => E::container(ContainerKind::Multicam),
        "mc-angle" => E::container(ContainerKind::McAngle),

        "library" => E::Structure(StructureKind::Library),
        "event" => E::Structure(StructureKind::Event),
        "project" => E::Structure(StructureKind::Project),

        "asset" => E::Resource(ResourceKind::Asset),
        "format" => E::Resource(ResourceKind::Format),
        "media" => E::Resource(ResourceKind::Media(media_kind(node)?)),
        "effect" => E::Resource(ResourceKind::Effect),
        "locator" => E::Resource(ResourceKind::Locator),
        "object-tracker" => E::Resource(ResourceKind::ObjectTracker),
        "tracking-shape" => E::Resource(ResourceKind::TrackingShape),

        "resources" => E::Resources,
        "fcpxml" => E::Root,
        _ => return None,
    };
    Some(kind)
}

fn media_kind<N: XmlNode>(node: N) -> Option<MediaKind> {
    let children = node.children();
    let sequence = children.iter().any(|c| c.tag() == "sequence");
    let multicam = children.iter().any(|c| c.tag() == "multicam");
    match (sequence, multicam) {
        (true, false) => Some(MediaKind::Sequence),
        (false, true) => Some(MediaKind::Multicam),
        _ => None,
    }
}
