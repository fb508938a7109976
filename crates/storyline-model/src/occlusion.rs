//! Occlusion classification.
//!
//! Decides whether an element's interval is actually exposed in the
//! composited output. The answer depends only on the element's breadcrumb
//! chain and the siblings along it, so the same element reached through
//! different paths (a shared compound clip, say) can classify differently.

use serde::{Deserialize, Serialize};
use std::fmt;

use storyline_core::{Result, TimeRange};

use crate::attributes::{lane, ClipAttributes, McSelection};
use crate::kind::{classify, ClipKind, ContainerKind, ElementKind};
use crate::node::XmlNode;
use crate::position::absolute_range;
use crate::resources::ResourceIndex;
use crate::role::first_story_child;

/// How much of an element survives compositing. Ordered from visible to
/// hidden, so combining rules is `max`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Occlusion {
    #[default]
    NotOccluded,
    PartiallyOccluded,
    FullyOccluded,
}

impl Occlusion {
    pub fn is_occluded(self) -> bool {
        self != Self::NotOccluded
    }

    /// Classification of `range` against the exposed `window`.
    fn of_range(range: TimeRange, window: TimeRange) -> Self {
        if window.covers(range) {
            Self::NotOccluded
        } else if window.overlaps(range) {
            Self::PartiallyOccluded
        } else {
            Self::FullyOccluded
        }
    }
}

impl fmt::Display for Occlusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotOccluded => "not occluded",
            Self::PartiallyOccluded => "partially occluded",
            Self::FullyOccluded => "fully occluded",
        })
    }
}

/// Classify `element` given its `ancestors` (document root first).
pub fn occlusion<N: XmlNode>(
    element: N,
    ancestors: &[N],
    resources: &ResourceIndex<N>,
) -> Result<Occlusion> {
    let chain: Vec<N> = ancestors
        .iter()
        .copied()
        .chain(std::iter::once(element))
        .collect();

    if hidden_by_audition(&chain) || hidden_by_angle(&chain) {
        return Ok(Occlusion::FullyOccluded);
    }

    let Some(range) = absolute_range(element, ancestors, resources)? else {
        return Ok(Occlusion::NotOccluded);
    };

    let trimmed = container_trim(&chain, range, resources);
    if trimmed == Occlusion::FullyOccluded {
        return Ok(trimmed);
    }
    Ok(trimmed.max(lane_cover(&chain, range, resources)))
}

/// An audition plays only its first story child.
fn hidden_by_audition<N: XmlNode>(chain: &[N]) -> bool {
    chain.windows(2).any(|pair| {
        classify(pair[0]).and_then(ElementKind::clip_kind) == Some(ClipKind::Audition)
            && first_story_child(pair[0]) != Some(pair[1])
    })
}

/// An `mc-clip` only exposes its selected angles.
fn hidden_by_angle<N: XmlNode>(chain: &[N]) -> bool {
    chain.windows(3).any(|triple| {
        let [mc_clip, multicam, angle] = [triple[0], triple[1], triple[2]];
        if classify(mc_clip).and_then(ElementKind::clip_kind) != Some(ClipKind::McClip)
            || classify(multicam).and_then(ElementKind::container_kind)
                != Some(ContainerKind::Multicam)
            || classify(angle).and_then(ElementKind::container_kind)
                != Some(ContainerKind::McAngle)
        {
            return false;
        }
        let selection = McSelection::read(mc_clip);
        !angle
            .attribute("angleID")
            .is_some_and(|id| selection.is_active(id))
    })
}

/// Ancestor clips and timelines with a duration only expose that window.
///
/// A clip trims its primary-lane content and its own annotations. Connected
/// clips hanging off it stay exposed past its edges, except inside a
/// `ref-clip`/`mc-clip` media timeline, which is cut to the clip's window.
fn container_trim<N: XmlNode>(
    chain: &[N],
    range: TimeRange,
    resources: &ResourceIndex<N>,
) -> Occlusion {
    let mut worst = Occlusion::NotOccluded;
    for i in 0..chain.len() - 1 {
        let node = chain[i];
        let trims = match classify(node) {
            Some(kind) if kind.is_clip() => {
                enters_media(chain[i + 1]) || chain[i + 1..].iter().all(|&n| lane(n) == 0)
            }
            Some(kind) => kind.container_kind() == Some(ContainerKind::Sequence),
            None => false,
        };
        if !trims || node.attribute("duration").is_none() {
            continue;
        }
        // An ancestor that cannot be placed does not trim.
        let Ok(Some(window)) = absolute_range(node, &chain[..i], resources) else {
            continue;
        };
        worst = worst.max(Occlusion::of_range(range, window));
        if worst == Occlusion::FullyOccluded {
            break;
        }
    }
    worst
}

/// Whether the walk steps from a clip into its referenced media timeline.
fn enters_media<N: XmlNode>(next: N) -> bool {
    matches!(
        classify(next).and_then(ElementKind::container_kind),
        Some(ContainerKind::Sequence | ContainerKind::Multicam)
    )
}

/// Clips that carry sound but no picture.
fn is_audio_only<N: XmlNode>(node: N, clip: &ClipAttributes, resources: &ResourceIndex<N>) -> bool {
    match classify(node).and_then(ElementKind::clip_kind) {
        Some(ClipKind::Audio) => true,
        Some(ClipKind::AssetClip) => clip
            .reference
            .as_deref()
            .and_then(|id| resources.asset(id).ok())
            .and_then(|asset| asset.as_asset())
            .is_some_and(|info| info.has_video == Some(false)),
        _ => false,
    }
}

/// Whether a connected clip hides what lies under it.
fn covers_video<N: XmlNode>(node: N, resources: &ResourceIndex<N>) -> bool {
    let Ok(clip) = ClipAttributes::read(node) else {
        return false;
    };
    if !clip.enabled {
        return false;
    }
    match classify(node).and_then(ElementKind::clip_kind) {
        None | Some(ClipKind::Gap | ClipKind::Transition) => false,
        Some(_) => !is_audio_only(node, &clip, resources),
    }
}

/// Elements on the primary lane of their innermost spine are hidden by
/// connected clips on higher lanes of that spine's clips.
fn lane_cover<N: XmlNode>(chain: &[N], range: TimeRange, resources: &ResourceIndex<N>) -> Occlusion {
    let is_spine = |node: N| {
        classify(node).and_then(ElementKind::container_kind) == Some(ContainerKind::Spine)
    };
    let Some(spine_index) = chain[..chain.len() - 1].iter().rposition(|&n| is_spine(n)) else {
        return Occlusion::NotOccluded;
    };
    let below = &chain[spine_index + 1..];
    let Ok(attributes) = below
        .iter()
        .map(|&n| ClipAttributes::read(n))
        .collect::<Result<Vec<_>>>()
    else {
        return Occlusion::NotOccluded;
    };
    if attributes.iter().any(|clip| clip.lane != 0) {
        return Occlusion::NotOccluded;
    }
    // Sound is never hidden by picture above it.
    let nearest_clip = below
        .iter()
        .zip(&attributes)
        .rev()
        .find(|&(n, _)| classify(*n).is_some_and(ElementKind::is_clip));
    if nearest_clip.is_some_and(|(&n, clip)| is_audio_only(n, clip, resources)) {
        return Occlusion::NotOccluded;
    }

    let spine_path = &chain[..=spine_index];
    let mut covers: Vec<TimeRange> = Vec::new();
    let mut add_cover = |node: N, ancestors: &[N]| {
        if chain.contains(&node) || !covers_video(node, resources) {
            return;
        }
        if let Ok(Some(cover)) = absolute_range(node, ancestors, resources) {
            if !cover.duration.is_zero() {
                covers.push(cover);
            }
        }
    };

    for primary in chain[spine_index].children() {
        let mut path = spine_path.to_vec();
        path.push(primary);
        for connected in primary.children() {
            if lane(connected) <= 0 {
                continue;
            }
            if is_spine(connected) {
                let mut storyline_path = path.clone();
                storyline_path.push(connected);
                for clip in connected.children() {
                    add_cover(clip, &storyline_path);
                }
            } else {
                add_cover(connected, &path);
            }
        }
    }

    let merged = merge_ranges(covers);
    if merged.iter().any(|cover| cover.covers(range)) {
        Occlusion::FullyOccluded
    } else if merged.iter().any(|cover| cover.overlaps(range)) {
        Occlusion::PartiallyOccluded
    } else {
        Occlusion::NotOccluded
    }
}

/// Union of ranges as sorted, disjoint intervals. Touching ranges merge.
fn merge_ranges(mut ranges: Vec<TimeRange>) -> Vec<TimeRange> {
    ranges.sort_by_key(|r| r.start);
    let mut merged: Vec<TimeRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start <= last.end() => {
                if range.end() > last.end() {
                    *last = TimeRange::from_start_end(last.start, range.end());
                }
            }
            _ => merged.push(range),
        }
    }
    merged
}
