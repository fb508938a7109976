//! Resource index: identifier → resource record, plus reference chasing.
//!
//! Built once from the document's `resources` section and read-only
//! afterwards, so it can be shared across extraction threads.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use storyline_core::{Fraction, Rate, Result, StorylineError, TimeValue};

use crate::attributes::{flag, metadata, time_attribute};
use crate::kind::{classify, ElementKind, MediaKind, ResourceKind};
use crate::node::XmlNode;

/// Format name Final Cut Pro writes for audio-only media with no frame rate.
pub const UNDEFINED_RATE_FORMAT: &str = "FFVideoFormatRateUndefined";

/// A resource record.
#[derive(Debug, Clone)]
pub struct Resource<N: XmlNode> {
    pub id: String,
    pub kind: ResourceKind,
    pub node: N,
    pub name: Option<String>,
    pub metadata: Vec<(String, String)>,
    pub payload: ResourcePayload<N>,
}

/// Kind-specific contents of a resource.
#[derive(Debug, Clone)]
pub enum ResourcePayload<N: XmlNode> {
    Asset(AssetInfo),
    Format(FormatInfo),
    Media(MediaContainer<N>),
    Effect { uid: Option<String> },
    Locator { url: Option<String> },
    ObjectTracker,
    TrackingShape,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetInfo {
    pub format: Option<String>,
    /// Source URL from the `media-rep` child, or the legacy `src` attribute.
    pub src: Option<String>,
    pub has_video: Option<bool>,
    pub has_audio: Option<bool>,
    pub start: Option<TimeValue>,
    pub duration: Option<TimeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatInfo {
    pub frame_duration: Option<Fraction>,
    pub field_order: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl FormatInfo {
    /// Rate described by this format, if it has a frame duration.
    pub fn rate(&self) -> Option<Rate> {
        Rate::from_format(self.frame_duration?, self.field_order.as_deref())
    }
}

/// The container wrapped by a `media` resource. Never both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MediaContainer<N: XmlNode> {
    Sequence(N),
    Multicam(N),
}

impl<N: XmlNode> MediaContainer<N> {
    pub fn node(&self) -> N {
        match self {
            Self::Sequence(node) | Self::Multicam(node) => *node,
        }
    }
}

impl<N: XmlNode> Resource<N> {
    /// The resource this record's `format` link points at, if any.
    pub fn format_ref(&self) -> Option<&str> {
        match &self.payload {
            ResourcePayload::Asset(asset) => asset.format.as_deref(),
            ResourcePayload::Media(
                MediaContainer::Sequence(container) | MediaContainer::Multicam(container),
            ) => container.attribute("format"),
            ResourcePayload::Format(_) => None,
            _ => self.node.attribute("format"),
        }
    }

    pub fn as_asset(&self) -> Option<&AssetInfo> {
        match &self.payload {
            ResourcePayload::Asset(asset) => Some(asset),
            _ => None,
        }
    }

    pub fn as_format(&self) -> Option<&FormatInfo> {
        match &self.payload {
            ResourcePayload::Format(format) => Some(format),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<MediaContainer<N>> {
        match &self.payload {
            ResourcePayload::Media(container) => Some(*container),
            _ => None,
        }
    }

    fn is_undefined_rate_placeholder(&self) -> bool {
        self.name.as_deref() == Some(UNDEFINED_RATE_FORMAT)
    }
}

/// Identifier → resource map for one document.
#[derive(Debug, Clone)]
pub struct ResourceIndex<N: XmlNode> {
    resources: HashMap<String, Resource<N>>,
}

impl<N: XmlNode> Default for ResourceIndex<N> {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
        }
    }
}

impl<N: XmlNode> ResourceIndex<N> {
    /// Build the index from a `resources` element.
    ///
    /// Fails on duplicate identifiers, malformed `media` and `format`
    /// chains that loop. Missing references are left for lookups to report.
    pub fn build(resources: N) -> Result<Self> {
        let mut index = Self::default();

        for node in resources.children() {
            index.insert(node)?;
            if node.tag() == "object-tracker" {
                for shape in node.children_named("tracking-shape") {
                    index.insert(shape)?;
                }
            }
        }

        index.validate_format_chains()?;
        info!(resources = index.len(), "Resource index built");
        Ok(index)
    }

    fn insert(&mut self, node: N) -> Result<()> {
        let kind = match classify(node) {
            Some(ElementKind::Resource(kind)) => kind,
            None if node.tag() == "media" => {
                return Err(StorylineError::Structural(format!(
                    "media {} must contain exactly one of sequence or multicam",
                    node.attribute("id").unwrap_or("<no id>")
                )));
            }
            _ => {
                debug!(tag = node.tag(), "Skipping non-resource element in resources");
                return Ok(());
            }
        };

        let Some(id) = node.attribute("id") else {
            warn!(tag = node.tag(), "Resource without id skipped");
            return Ok(());
        };

        if self.resources.contains_key(id) {
            return Err(StorylineError::Structural(format!(
                "duplicate resource id `{}`",
                id
            )));
        }

        let record = Resource {
            id: id.to_string(),
            kind,
            node,
            name: node.attribute("name").map(str::to_string),
            metadata: metadata(node),
            payload: read_payload(node, kind)?,
        };
        self.resources.insert(id.to_string(), record);
        Ok(())
    }

    fn validate_format_chains(&self) -> Result<()> {
        for record in self.resources.values() {
            match self.format_of(record) {
                Err(err @ StorylineError::Structural(_)) => return Err(err),
                Err(err) => debug!(resource = %record.id, error = %err, "Unresolved format link"),
                Ok(_) => {}
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource<N>> {
        self.resources.values()
    }

    /// Look up any resource by identifier.
    pub fn resolve(&self, id: &str) -> Result<&Resource<N>> {
        self.resources
            .get(id)
            .ok_or_else(|| StorylineError::unresolved(id, "known"))
    }

    fn resolve_kind(
        &self,
        id: &str,
        expected: &str,
        accept: impl Fn(ResourceKind) -> bool,
    ) -> Result<&Resource<N>> {
        match self.resources.get(id) {
            Some(record) if accept(record.kind) => Ok(record),
            _ => Err(StorylineError::unresolved(id, expected)),
        }
    }

    pub fn asset(&self, id: &str) -> Result<&Resource<N>> {
        self.resolve_kind(id, "asset", |kind| kind == ResourceKind::Asset)
    }

    pub fn format(&self, id: &str) -> Result<&Resource<N>> {
        self.resolve_kind(id, "format", |kind| kind == ResourceKind::Format)
    }

    pub fn media(&self, id: &str) -> Result<&Resource<N>> {
        self.resolve_kind(id, "media", |kind| matches!(kind, ResourceKind::Media(_)))
    }

    /// Resolve `id` to any resource a clip's `ref` may name: assets,
    /// effects and media.
    pub fn clip_source(&self, id: &str) -> Result<&Resource<N>> {
        self.resolve_kind(id, "asset, effect or media", |kind| {
            matches!(
                kind,
                ResourceKind::Asset | ResourceKind::Effect | ResourceKind::Media(_)
            )
        })
    }

    /// The sequence inside a media resource referenced by a `ref-clip`.
    pub fn sequence_of(&self, media_id: &str) -> Result<N> {
        match self.media(media_id)?.as_media() {
            Some(MediaContainer::Sequence(node)) => Ok(node),
            _ => Err(StorylineError::unresolved(media_id, "media(sequence)")),
        }
    }

    /// The multicam inside a media resource referenced by an `mc-clip`.
    pub fn multicam_of(&self, media_id: &str) -> Result<N> {
        match self.media(media_id)?.as_media() {
            Some(MediaContainer::Multicam(node)) => Ok(node),
            _ => Err(StorylineError::unresolved(media_id, "media(multicam)")),
        }
    }

    /// Container of a media record.
    pub fn container_of(&self, media: &Resource<N>) -> Result<MediaContainer<N>> {
        media
            .as_media()
            .ok_or_else(|| StorylineError::unresolved(media.id.clone(), "media"))
    }

    /// Follow `format` links from `record` to a format resource and derive
    /// its rate.
    ///
    /// Returns `Ok(None)` when the chain ends without a frame duration or
    /// reaches the undefined-rate placeholder. A chain that revisits a
    /// resource is a structural error.
    pub fn format_of(&self, record: &Resource<N>) -> Result<Option<Rate>> {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = record;

        loop {
            if !visited.insert(current.id.as_str()) {
                return Err(StorylineError::Structural(format!(
                    "format reference cycle through `{}`",
                    current.id
                )));
            }

            if let Some(format) = current.as_format() {
                if current.is_undefined_rate_placeholder() {
                    return Ok(None);
                }
                return Ok(format.rate());
            }

            match current.format_ref() {
                Some(next) => current = self.resolve(next)?,
                None => return Ok(None),
            }
        }
    }

    /// Rate named by a `format` attribute value.
    pub fn rate_of_format_ref(&self, id: &str) -> Result<Option<Rate>> {
        let record = self.resolve(id)?;
        self.format_of(record)
    }
}

fn read_payload<N: XmlNode>(node: N, kind: ResourceKind) -> Result<ResourcePayload<N>> {
    let payload = match kind {
        ResourceKind::Asset => ResourcePayload::Asset(AssetInfo {
            format: node.attribute("format").map(str::to_string),
            src: node
                .first_child("media-rep")
                .and_then(|rep| rep.attribute("src").map(str::to_string))
                .or_else(|| node.attribute("src").map(str::to_string)),
            has_video: flag(node, "hasVideo"),
            has_audio: flag(node, "hasAudio"),
            start: time_attribute(node, "start")?,
            duration: time_attribute(node, "duration")?,
        }),
        ResourceKind::Format => {
            let frame_duration = match time_attribute(node, "frameDuration")? {
                Some(TimeValue::Seconds(value)) => Some(value),
                Some(TimeValue::Frames(_)) => {
                    return Err(StorylineError::InvalidTime(format!(
                        "frameDuration of format `{}` must be in seconds",
                        node.attribute("id").unwrap_or_default()
                    )))
                }
                None => None,
            };
            ResourcePayload::Format(FormatInfo {
                frame_duration,
                field_order: node.attribute("fieldOrder").map(str::to_string),
                width: node.attribute("width").and_then(|v| v.parse().ok()),
                height: node.attribute("height").and_then(|v| v.parse().ok()),
            })
        }
        ResourceKind::Media(MediaKind::Sequence) => {
            media_payload(node, "sequence", MediaContainer::Sequence)?
        }
        ResourceKind::Media(MediaKind::Multicam) => {
            media_payload(node, "multicam", MediaContainer::Multicam)?
        }
        ResourceKind::Effect => ResourcePayload::Effect {
            uid: node.attribute("uid").map(str::to_string),
        },
        ResourceKind::Locator => ResourcePayload::Locator {
            url: node.attribute("url").map(str::to_string),
        },
        ResourceKind::ObjectTracker => ResourcePayload::ObjectTracker,
        ResourceKind::TrackingShape => ResourcePayload::TrackingShape,
    };
    Ok(payload)
}

fn media_payload<N: XmlNode>(
    node: N,
    tag: &str,
    wrap: fn(N) -> MediaContainer<N>,
) -> Result<ResourcePayload<N>> {
    node.first_child(tag)
        .map(|container| ResourcePayload::Media(wrap(container)))
        .ok_or_else(|| StorylineError::Structural(format!("media without {}", tag)))
}
