//! Keywords and metadata that apply to an extracted element.

use std::collections::BTreeMap;

use storyline_core::TimeRange;
use storyline_model::attributes::{metadata, McSelection};
use storyline_model::role::find_angle;
use storyline_model::{
    absolute_range, classify, ClipKind, ContainerKind, ElementKind, Resource, ResourceIndex,
    XmlNode,
};

fn is_timeline(kind: Option<ElementKind>) -> bool {
    matches!(
        kind.and_then(ElementKind::container_kind),
        Some(ContainerKind::Sequence | ContainerKind::Multicam)
    )
}

/// Keywords attached to `chain` (breadcrumbs plus the element, last) up to
/// the nearest timeline, keeping only keyword ranges that overlap `range`.
/// Unplaced elements take every keyword on the way.
pub fn keywords<N: XmlNode>(
    chain: &[N],
    range: Option<TimeRange>,
    resources: &ResourceIndex<N>,
) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();

    for j in (0..chain.len()).rev() {
        let holder = chain[j];
        if is_timeline(classify(holder)) {
            break;
        }
        for keyword in holder.children_named("keyword") {
            let applies = match (range, absolute_range(keyword, &chain[..=j], resources)) {
                (Some(element), Ok(Some(keyword_range))) => keyword_range.overlaps(element),
                _ => true,
            };
            if !applies {
                continue;
            }
            let Some(value) = keyword.attribute("value") else {
                continue;
            };
            for word in value.split(',').map(str::trim).filter(|w| !w.is_empty()) {
                if !found.iter().any(|existing| existing == word) {
                    found.push(word.to_string());
                }
            }
        }
    }
    found
}

/// Metadata of the nearest clip in `chain`, layered over its resource's.
/// An `mc-clip` reads the resource behind its active video angle.
pub fn element_metadata<N: XmlNode>(
    chain: &[N],
    resources: &ResourceIndex<N>,
) -> BTreeMap<String, String> {
    let mut merged = BTreeMap::new();
    let Some(clip) = chain
        .iter()
        .rev()
        .copied()
        .find(|&n| classify(n).is_some_and(ElementKind::is_clip))
    else {
        return merged;
    };

    if let Some(resource) = source_resource(clip, resources) {
        merged.extend(resource.metadata.iter().cloned());
    }
    merged.extend(metadata(clip));
    merged
}

/// The resource a clip draws its media from.
fn source_resource<'r, N: XmlNode>(
    clip: N,
    resources: &'r ResourceIndex<N>,
) -> Option<&'r Resource<N>> {
    let id = clip.attribute("ref")?;
    match classify(clip).and_then(ElementKind::clip_kind)? {
        ClipKind::AssetClip | ClipKind::RefClip | ClipKind::Video | ClipKind::Audio => {
            resources.resolve(id).ok()
        }
        ClipKind::McClip => {
            let multicam = resources.multicam_of(id).ok()?;
            let angle_id = McSelection::read(clip).video_angle?;
            let angle = find_angle(multicam, &angle_id).ok()?;
            let first = angle.children().into_iter().find(|child| {
                classify(*child).and_then(ElementKind::clip_kind) == Some(ClipKind::AssetClip)
            })?;
            resources.asset(first.attribute("ref")?).ok()
        }
        _ => None,
    }
}
