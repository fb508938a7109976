//! FCPXML document root: version check, resources and structure lookup.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use tracing::info;

use storyline_core::{Result, StorylineError};

use crate::kind::{classify, ElementKind, StructureKind};
use crate::node::XmlNode;
use crate::resources::ResourceIndex;

/// Oldest supported interchange version.
pub const MIN_VERSION: FcpxmlVersion = FcpxmlVersion::new(1, 8);
/// Newest supported interchange version.
pub const MAX_VERSION: FcpxmlVersion = FcpxmlVersion::new(1, 13);

/// `major.minor` document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FcpxmlVersion {
    pub major: u32,
    pub minor: u32,
}

impl FcpxmlVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub fn is_supported(self) -> bool {
        (MIN_VERSION..=MAX_VERSION).contains(&self)
    }
}

impl FromStr for FcpxmlVersion {
    type Err = StorylineError;

    fn from_str(s: &str) -> Result<Self> {
        let parsed = s
            .split_once('.')
            .and_then(|(major, minor)| Some(Self::new(major.parse().ok()?, minor.parse().ok()?)));
        parsed.ok_or_else(|| StorylineError::Structural(format!("malformed version `{}`", s)))
    }
}

impl fmt::Display for FcpxmlVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A validated FCPXML document with its resource index.
#[derive(Debug, Clone)]
pub struct FcpxmlDocument<N: XmlNode> {
    root: N,
    version: FcpxmlVersion,
    resources: ResourceIndex<N>,
}

impl<N: XmlNode> FcpxmlDocument<N> {
    /// Validate the root element and build the resource index.
    ///
    /// Every failure here is document-level and fatal.
    pub fn from_root(root: N) -> Result<Self> {
        if classify(root) != Some(ElementKind::Root) {
            return Err(StorylineError::Structural(format!(
                "expected <fcpxml> root, found <{}>",
                root.tag()
            )));
        }

        let version: FcpxmlVersion = root
            .attribute("version")
            .ok_or_else(|| StorylineError::Structural("missing version attribute".into()))?
            .parse()?;
        if !version.is_supported() {
            return Err(StorylineError::Structural(format!(
                "unsupported FCPXML version {} (supported {} to {})",
                version, MIN_VERSION, MAX_VERSION
            )));
        }

        let resources_node = root
            .first_child("resources")
            .ok_or_else(|| StorylineError::Structural("missing resources section".into()))?;

        let has_structure = root
            .children()
            .into_iter()
            .any(|child| matches!(classify(child), Some(ElementKind::Structure(_))));
        if !has_structure {
            return Err(StorylineError::Structural(
                "document has no library, event or project".into(),
            ));
        }

        let resources = ResourceIndex::build(resources_node)?;
        info!(%version, resources = resources.len(), "FCPXML document loaded");

        Ok(Self {
            root,
            version,
            resources,
        })
    }

    pub fn root(&self) -> N {
        self.root
    }

    pub fn version(&self) -> FcpxmlVersion {
        self.version
    }

    pub fn resources(&self) -> &ResourceIndex<N> {
        &self.resources
    }

    /// Events at the root and inside libraries, in document order.
    pub fn events(&self) -> Vec<N> {
        self.structure_nodes(StructureKind::Event)
    }

    /// Projects at the root, inside events and inside libraries' events.
    pub fn projects(&self) -> Vec<N> {
        self.structure_nodes(StructureKind::Project)
    }

    fn structure_nodes(&self, wanted: StructureKind) -> Vec<N> {
        let mut found = Vec::new();
        let mut stack: Vec<N> = self.root.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            match classify(node) {
                Some(ElementKind::Structure(kind)) if kind == wanted => found.push(node),
                Some(ElementKind::Structure(_)) => {
                    stack.extend(node.children().into_iter().rev());
                }
                _ => {}
            }
        }
        found
    }
}
