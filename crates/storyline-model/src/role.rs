//! Role resolution.
//!
//! A role is the audio/video/caption category an editor assigns to content
//! (`Dialogue`, `Music.Score-1`, `Titles`). Each story element kind has its
//! own rule for where its roles come from; [`with_defaults`] fills the gaps
//! from a fixed per-kind table.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;
use std::fmt;

use storyline_core::{Result, StorylineError};

use crate::attributes::{flag, is_active_source, McSelection};
use crate::kind::{classify, AnnotationKind, ClipKind, ContainerKind, ElementKind};
use crate::node::XmlNode;
use crate::resources::ResourceIndex;

/// Track category of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoleKind {
    Video,
    Audio,
    Caption,
}

/// A role name with its optional subrole (`Dialogue.Dialogue-1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    pub kind: RoleKind,
    pub name: String,
    pub subrole: Option<String>,
}

impl Role {
    /// Parse a role attribute value. Caption roles carry a format query
    /// (`iTT?captionFormat=ITT.en`) and are kept verbatim.
    pub fn parse(kind: RoleKind, raw: &str) -> Self {
        if kind == RoleKind::Caption {
            return Self {
                kind,
                name: raw.to_string(),
                subrole: None,
            };
        }
        match raw.split_once('.') {
            Some((name, sub)) if !sub.is_empty() => Self {
                kind,
                name: name.to_string(),
                subrole: Some(sub.to_string()),
            },
            Some((name, _)) => Self::new(kind, name),
            None => Self::new(kind, raw),
        }
    }

    pub fn new(kind: RoleKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            subrole: None,
        }
    }

    /// Trailing `-N` of the subrole, e.g. 2 for `Dialogue.Dialogue-2`.
    pub fn subrole_number(&self) -> Option<u32> {
        let (_, number) = self.subrole.as_deref()?.rsplit_once('-')?;
        number.parse().ok()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subrole {
            Some(sub) => write!(f, "{}.{}", self.name, sub),
            None => f.write_str(&self.name),
        }
    }
}

/// Where an interpreted role came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoleProvenance {
    /// Declared on the element itself.
    Assigned,
    /// Taken from a descendant, angle or ancestor.
    Inherited,
    /// Filled from the per-kind default table.
    Defaulted,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InterpretedRole {
    pub role: Role,
    pub provenance: RoleProvenance,
}

impl InterpretedRole {
    pub fn new(role: Role, provenance: RoleProvenance) -> Self {
        Self { role, provenance }
    }

    pub fn kind(&self) -> RoleKind {
        self.role.kind
    }
}

pub type RoleSet = SmallVec<[InterpretedRole; 4]>;

/// How far `clip`/`sync-clip` search their descendants for roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DescendantPolicy {
    /// Direct story children only (looking through spines and auditions).
    #[default]
    FirstGeneration,
    /// Any depth, depth-first in document order.
    Unrestricted,
}

/// Default roles for an element kind, one per track kind.
fn default_roles(kind: ElementKind) -> &'static [(RoleKind, &'static str)] {
    const VIDEO: (RoleKind, &str) = (RoleKind::Video, "Video");
    const TITLES: (RoleKind, &str) = (RoleKind::Video, "Titles");
    const DIALOGUE: (RoleKind, &str) = (RoleKind::Audio, "Dialogue");

    match kind.clip_kind() {
        Some(ClipKind::Video) => &[VIDEO],
        Some(ClipKind::Title) => &[TITLES],
        Some(ClipKind::Audio) => &[DIALOGUE],
        Some(ClipKind::AssetClip | ClipKind::Clip | ClipKind::SyncClip | ClipKind::McClip) => {
            &[VIDEO, DIALOGUE]
        }
        // Audio of a ref-clip lives on the referenced sequence and stays undefined.
        Some(ClipKind::RefClip) => &[VIDEO],
        _ => &[],
    }
}

/// Append one defaulted entry for every track kind `roles` lacks.
/// Existing entries are never replaced, so applying it twice is a no-op.
pub fn with_defaults(mut roles: RoleSet, kind: ElementKind) -> RoleSet {
    for &(track, name) in default_roles(kind) {
        if !roles.iter().any(|r| r.kind() == track) {
            roles.push(InterpretedRole::new(
                Role::new(track, name),
                RoleProvenance::Defaulted,
            ));
        }
    }
    roles
}

fn retag(roles: RoleSet, provenance: RoleProvenance) -> RoleSet {
    roles
        .into_iter()
        .map(|r| InterpretedRole::new(r.role, provenance))
        .collect()
}

fn push_unique(roles: &mut RoleSet, role: InterpretedRole) {
    if !roles.iter().any(|r| r.role == role.role) {
        roles.push(role);
    }
}

/// Active `audio-role-source` children of `node`, as audio roles.
fn audio_role_sources<N: XmlNode>(node: N, provenance: RoleProvenance) -> RoleSet {
    let mut roles = RoleSet::new();
    for source in node.children_named("audio-role-source") {
        if !is_active_source(source) {
            continue;
        }
        if let Some(raw) = source.attribute("role") {
            push_unique(
                &mut roles,
                InterpretedRole::new(Role::parse(RoleKind::Audio, raw), provenance),
            );
        }
    }
    roles
}

/// Resolves roles against a built resource index.
#[derive(Debug, Clone, Copy)]
pub struct RoleResolver<'a, N: XmlNode> {
    resources: &'a ResourceIndex<N>,
    policy: DescendantPolicy,
}

impl<'a, N: XmlNode> RoleResolver<'a, N> {
    pub fn new(resources: &'a ResourceIndex<N>) -> Self {
        Self {
            resources,
            policy: DescendantPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DescendantPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DescendantPolicy {
        self.policy
    }

    /// Roles the element's own kind rule yields, without defaults.
    pub fn local_roles(&self, element: N) -> Result<RoleSet> {
        self.local_roles_guarded(element, &mut HashSet::new())
    }

    /// Local roles completed from the default table.
    pub fn effective_roles(&self, element: N) -> Result<RoleSet> {
        let local = self.local_roles(element)?;
        Ok(match classify(element) {
            Some(kind) => with_defaults(local, kind),
            None => local,
        })
    }

    /// Roles of an annotation: the effective roles of the nearest clip in
    /// `ancestors` (document root first) that has any, re-tagged inherited.
    pub fn annotation_roles(&self, ancestors: &[N]) -> Result<RoleSet> {
        for &ancestor in ancestors.iter().rev() {
            if !classify(ancestor).is_some_and(ElementKind::is_clip) {
                continue;
            }
            let roles = self.effective_roles(ancestor)?;
            if !roles.is_empty() {
                return Ok(roles
                    .into_iter()
                    .map(|r| match r.provenance {
                        RoleProvenance::Assigned => {
                            InterpretedRole::new(r.role, RoleProvenance::Inherited)
                        }
                        _ => r,
                    })
                    .collect());
            }
        }
        Ok(RoleSet::new())
    }

    fn local_roles_guarded(&self, element: N, visited: &mut HashSet<String>) -> Result<RoleSet> {
        let Some(kind) = classify(element) else {
            return Ok(RoleSet::new());
        };

        if kind.annotation_kind() == Some(AnnotationKind::Caption) {
            return Ok(self.attribute_role(element, "role", RoleKind::Caption));
        }

        match kind.clip_kind() {
            Some(ClipKind::Video | ClipKind::Title) => {
                Ok(self.attribute_role(element, "role", RoleKind::Video))
            }
            Some(ClipKind::Audio) => Ok(self.attribute_role(element, "role", RoleKind::Audio)),
            Some(ClipKind::AssetClip) => Ok(self.asset_clip_roles(element)),
            Some(ClipKind::Clip) => self.descendant_roles(element, visited),
            Some(ClipKind::SyncClip) => {
                let mut roles = self.descendant_roles(element, visited)?;
                for source in element.children_named("sync-source") {
                    if let Some(raw) = source.attribute("role") {
                        push_unique(
                            &mut roles,
                            InterpretedRole::new(
                                Role::parse(RoleKind::Audio, raw),
                                RoleProvenance::Inherited,
                            ),
                        );
                    }
                    for role in audio_role_sources(source, RoleProvenance::Inherited) {
                        push_unique(&mut roles, role);
                    }
                }
                Ok(roles)
            }
            Some(ClipKind::McClip) => self.mc_clip_roles(element, visited),
            Some(ClipKind::RefClip) => {
                if flag(element, "useAudioSubroles") == Some(true) {
                    Ok(audio_role_sources(element, RoleProvenance::Assigned))
                } else {
                    Ok(RoleSet::new())
                }
            }
            _ => Ok(RoleSet::new()),
        }
    }

    fn attribute_role(&self, element: N, attribute: &str, kind: RoleKind) -> RoleSet {
        let mut roles = RoleSet::new();
        if let Some(raw) = element.attribute(attribute) {
            roles.push(InterpretedRole::new(
                Role::parse(kind, raw),
                RoleProvenance::Assigned,
            ));
        }
        roles
    }

    fn asset_clip_roles(&self, element: N) -> RoleSet {
        let mut roles = self.attribute_role(element, "videoRole", RoleKind::Video);

        let mut channel_roles = RoleSet::new();
        for source in element.children_named("audio-channel-source") {
            if !is_active_source(source) {
                continue;
            }
            if let Some(raw) = source.attribute("role") {
                push_unique(
                    &mut channel_roles,
                    InterpretedRole::new(
                        Role::parse(RoleKind::Audio, raw),
                        RoleProvenance::Assigned,
                    ),
                );
            }
        }

        if channel_roles.is_empty() {
            roles.extend(self.attribute_role(element, "audioRole", RoleKind::Audio));
        } else {
            roles.extend(channel_roles);
        }
        roles
    }

    /// First descendant with non-empty local roles, via an explicit
    /// worklist. Spines are transparent; an audition contributes only its
    /// active pick.
    fn descendant_roles(&self, element: N, visited: &mut HashSet<String>) -> Result<RoleSet> {
        let mut worklist: Vec<N> = element.children().into_iter().rev().collect();

        while let Some(node) = worklist.pop() {
            let Some(kind) = classify(node) else {
                continue;
            };
            if kind.container_kind() == Some(ContainerKind::Spine) {
                worklist.extend(node.children().into_iter().rev());
                continue;
            }
            if kind.clip_kind() == Some(ClipKind::Audition) {
                if let Some(active) = first_story_child(node) {
                    worklist.push(active);
                }
                continue;
            }
            if !kind.is_clip() {
                continue;
            }

            let roles = self.local_roles_guarded(node, visited)?;
            if !roles.is_empty() {
                return Ok(retag(roles, RoleProvenance::Inherited));
            }
            if self.policy == DescendantPolicy::Unrestricted {
                worklist.extend(node.children().into_iter().rev());
            }
        }
        Ok(RoleSet::new())
    }

    fn mc_clip_roles(&self, element: N, visited: &mut HashSet<String>) -> Result<RoleSet> {
        let Some(media_id) = element.attribute("ref") else {
            return Ok(RoleSet::new());
        };
        if !visited.insert(media_id.to_string()) {
            return Err(StorylineError::Structural(format!(
                "multicam `{}` references itself",
                media_id
            )));
        }

        let multicam = self.resources.multicam_of(media_id)?;
        let selection = McSelection::read(element);
        let mut roles = RoleSet::new();

        for (angle_id, track) in [
            (selection.video_angle.as_deref(), RoleKind::Video),
            (selection.audio_angle.as_deref(), RoleKind::Audio),
        ] {
            let Some(angle_id) = angle_id else {
                continue;
            };
            let angle = find_angle(multicam, angle_id)?;
            let Some(first) = first_content(angle) else {
                continue;
            };
            for role in self.local_roles_guarded(first, visited)? {
                if role.kind() == track {
                    push_unique(
                        &mut roles,
                        InterpretedRole::new(role.role, RoleProvenance::Inherited),
                    );
                }
            }
        }

        visited.remove(media_id);
        Ok(roles)
    }
}

/// `mc-angle` of a multicam by `angleID`.
pub fn find_angle<N: XmlNode>(multicam: N, angle_id: &str) -> Result<N> {
    multicam
        .children_named("mc-angle")
        .into_iter()
        .find(|angle| angle.attribute("angleID") == Some(angle_id))
        .ok_or_else(|| StorylineError::unresolved(angle_id, "mc-angle"))
}

/// First story child, the active pick of an audition.
pub fn first_story_child<N: XmlNode>(node: N) -> Option<N> {
    node.children()
        .into_iter()
        .find(|child| classify(*child).is_some_and(ElementKind::is_clip))
}

/// First clip of an angle that is neither a gap nor a transition.
fn first_content<N: XmlNode>(angle: N) -> Option<N> {
    angle.children().into_iter().find(|child| {
        matches!(
            classify(*child).and_then(ElementKind::clip_kind),
            Some(kind) if !matches!(kind, ClipKind::Gap | ClipKind::Transition)
        )
    })
}
