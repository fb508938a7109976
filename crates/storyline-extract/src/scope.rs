//! Extraction scope: how far the traversal reaches and which occluded
//! elements survive.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use storyline_core::{Result, StorylineError};
use storyline_model::{DescendantPolicy, Occlusion};

/// How far extraction descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Depth {
    /// Project timelines only: no browser clips, no referenced media.
    #[default]
    MainTimeline,
    /// Also browser clips and the contents of compound and multicam clips.
    Deep,
}

/// Which audition picks are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuditionMask {
    #[default]
    Active,
    All,
}

/// Which multicam angles are visited in deep scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AngleMask {
    #[default]
    Active,
    All,
}

/// Configuration for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionScope {
    /// Main timeline only, or deep into referenced media.
    pub depth: Depth,
    /// Audition picks to visit.
    pub auditions: AuditionMask,
    /// Multicam angles to visit when descending into `mc-clip`s.
    pub mc_angles: AngleMask,
    /// Occluded states kept in the result. Unoccluded elements are always kept.
    pub occlusions: BTreeSet<Occlusion>,
    /// Descendant search used for `clip`/`sync-clip` roles.
    pub role_policy: DescendantPolicy,
}

impl Default for ExtractionScope {
    fn default() -> Self {
        Self::main_timeline()
    }
}

impl ExtractionScope {
    /// What a viewer of the project sees: active picks and angles, partially
    /// hidden elements kept.
    pub fn main_timeline() -> Self {
        Self {
            depth: Depth::MainTimeline,
            auditions: AuditionMask::Active,
            mc_angles: AngleMask::Active,
            occlusions: BTreeSet::from([Occlusion::PartiallyOccluded]),
            role_policy: DescendantPolicy::FirstGeneration,
        }
    }

    /// Everything reachable, hidden or not.
    pub fn deep() -> Self {
        Self {
            depth: Depth::Deep,
            auditions: AuditionMask::All,
            mc_angles: AngleMask::All,
            occlusions: BTreeSet::from([Occlusion::PartiallyOccluded, Occlusion::FullyOccluded]),
            role_policy: DescendantPolicy::FirstGeneration,
        }
    }

    pub fn with_depth(mut self, depth: Depth) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_auditions(mut self, auditions: AuditionMask) -> Self {
        self.auditions = auditions;
        self
    }

    pub fn with_mc_angles(mut self, mc_angles: AngleMask) -> Self {
        self.mc_angles = mc_angles;
        self
    }

    /// Replace the accepted occlusion set.
    pub fn with_occlusions(mut self, occlusions: impl IntoIterator<Item = Occlusion>) -> Self {
        self.occlusions = occlusions.into_iter().collect();
        self
    }

    pub fn with_role_policy(mut self, policy: DescendantPolicy) -> Self {
        self.role_policy = policy;
        self
    }

    pub fn is_deep(&self) -> bool {
        self.depth == Depth::Deep
    }

    /// Whether an element with this occlusion is kept.
    pub fn accepts(&self, occlusion: Occlusion) -> bool {
        occlusion == Occlusion::NotOccluded || self.occlusions.contains(&occlusion)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            StorylineError::Serialization(format!("Failed to deserialize scope: {e}"))
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            StorylineError::Serialization(format!("Failed to serialize scope: {e}"))
        })
    }
}
