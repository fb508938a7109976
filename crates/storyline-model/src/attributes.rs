//! Attribute groups shared by story elements.
//!
//! Story elements compose these small records instead of each kind
//! re-reading its attributes by hand.

use serde::{Deserialize, Serialize};

use storyline_core::{Result, StorylineError, TimeValue};

use crate::node::XmlNode;

/// Timecode counting declared on a timeline (`tcFormat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TcFormat {
    DropFrame,
    NonDropFrame,
}

/// Timing attributes of a story element, unresolved: frame counts still
/// need the governing rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimingAttributes {
    pub offset: Option<TimeValue>,
    pub start: Option<TimeValue>,
    pub duration: Option<TimeValue>,
    pub tc_start: Option<TimeValue>,
    pub tc_format: Option<TcFormat>,
    pub audio_start: Option<TimeValue>,
    pub audio_duration: Option<TimeValue>,
}

impl TimingAttributes {
    pub fn read<N: XmlNode>(node: N) -> Result<Self> {
        let tc_format = match node.attribute("tcFormat") {
            Some("DF") => Some(TcFormat::DropFrame),
            Some("NDF") => Some(TcFormat::NonDropFrame),
            Some(other) => {
                return Err(StorylineError::InvalidTime(format!(
                    "unknown tcFormat `{}`",
                    other
                )))
            }
            None => None,
        };

        Ok(Self {
            offset: time_attribute(node, "offset")?,
            start: time_attribute(node, "start")?,
            duration: time_attribute(node, "duration")?,
            tc_start: time_attribute(node, "tcStart")?,
            tc_format,
            audio_start: time_attribute(node, "audioStart")?,
            audio_duration: time_attribute(node, "audioDuration")?,
        })
    }
}

/// Attributes common to clip-like story elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipAttributes {
    pub name: Option<String>,
    /// Vertical stacking relative to the storyline; 0 is the storyline itself.
    pub lane: i32,
    pub enabled: bool,
    /// `ref` attribute, naming a resource.
    pub reference: Option<String>,
    /// `format` attribute, naming a format resource.
    pub format: Option<String>,
    pub timing: TimingAttributes,
}

impl ClipAttributes {
    pub fn read<N: XmlNode>(node: N) -> Result<Self> {
        Ok(Self {
            name: node.attribute("name").map(str::to_string),
            lane: lane(node),
            enabled: flag(node, "enabled").unwrap_or(true),
            reference: node.attribute("ref").map(str::to_string),
            format: node.attribute("format").map(str::to_string),
            timing: TimingAttributes::read(node)?,
        })
    }
}

/// Which tracks an `mc-source` contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceEnable {
    All,
    Video,
    Audio,
    None,
}

impl SourceEnable {
    fn parse(value: Option<&str>) -> Self {
        match value {
            Some("video") => Self::Video,
            Some("audio") => Self::Audio,
            Some("none") => Self::None,
            _ => Self::All,
        }
    }

    pub fn has_video(self) -> bool {
        matches!(self, Self::All | Self::Video)
    }

    pub fn has_audio(self) -> bool {
        matches!(self, Self::All | Self::Audio)
    }
}

/// Active angle selection of an `mc-clip`, from its `mc-source` children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McSelection {
    pub video_angle: Option<String>,
    pub audio_angle: Option<String>,
}

impl McSelection {
    pub fn read<N: XmlNode>(mc_clip: N) -> Self {
        let mut selection = Self::default();
        for source in mc_clip.children_named("mc-source") {
            let Some(angle) = source.attribute("angleID") else {
                continue;
            };
            let enable = SourceEnable::parse(source.attribute("srcEnable"));
            if enable.has_video() && selection.video_angle.is_none() {
                selection.video_angle = Some(angle.to_string());
            }
            if enable.has_audio() && selection.audio_angle.is_none() {
                selection.audio_angle = Some(angle.to_string());
            }
        }
        selection
    }

    /// Whether the angle feeds either the video or the audio output.
    pub fn is_active(&self, angle_id: &str) -> bool {
        self.video_angle.as_deref() == Some(angle_id)
            || self.audio_angle.as_deref() == Some(angle_id)
    }
}

/// Parse a timing attribute.
pub fn time_attribute<N: XmlNode>(node: N, name: &str) -> Result<Option<TimeValue>> {
    node.attribute(name)
        .map(|value| {
            value.parse::<TimeValue>().map_err(|_| {
                StorylineError::InvalidTime(format!("{}=\"{}\" on <{}>", name, value, node.tag()))
            })
        })
        .transpose()
}

/// `"1"`/`"0"` boolean attribute.
pub fn flag<N: XmlNode>(node: N, name: &str) -> Option<bool> {
    match node.attribute(name)? {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// `lane` attribute, 0 when absent or malformed.
pub fn lane<N: XmlNode>(node: N) -> i32 {
    node.attribute("lane")
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

/// Whether a role source child (`audio-channel-source`, `audio-role-source`,
/// `sync-source`) is switched on.
pub fn is_active_source<N: XmlNode>(node: N) -> bool {
    flag(node, "active").unwrap_or(true) && flag(node, "enabled").unwrap_or(true)
}

/// `md` key/value pairs of the node's `metadata` child, in document order.
pub fn metadata<N: XmlNode>(node: N) -> Vec<(String, String)> {
    let Some(block) = node.first_child("metadata") else {
        return Vec::new();
    };
    block
        .children_named("md")
        .into_iter()
        .filter_map(|md| {
            let key = md.attribute("key")?;
            let value = md.attribute("value").unwrap_or_default();
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
