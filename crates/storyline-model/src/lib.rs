//! Storyline Model - FCPXML element model
//!
//! Answers three questions about any element of an FCPXML document:
//! - where it sits in absolute project time (`position`)
//! - which audio/video/caption roles it carries (`role`)
//! - whether it is actually exposed in the composited output (`occlusion`)
//!
//! The document is read through the [`XmlNode`] trait; a `roxmltree`
//! adapter is provided. Nothing here mutates the tree.

pub mod attributes;
pub mod document;
pub mod kind;
pub mod node;
pub mod occlusion;
pub mod position;
pub mod resources;
pub mod role;

pub use attributes::{ClipAttributes, McSelection, SourceEnable, TcFormat, TimingAttributes};
pub use document::{FcpxmlDocument, FcpxmlVersion};
pub use kind::{
    classify, AnnotationKind, ClipKind, ContainerKind, ElementKind, MediaKind, ResourceKind,
    StoryKind, StructureKind,
};
pub use node::{parse_xml, XmlNode};
pub use occlusion::{occlusion, Occlusion};
pub use position::{
    absolute_duration, absolute_range, absolute_start, absolute_start_bottom_up, governing_rate,
    place, Placement,
};
pub use resources::{MediaContainer, Resource, ResourceIndex, ResourcePayload};
pub use role::{
    with_defaults, DescendantPolicy, InterpretedRole, Role, RoleKind, RoleProvenance,
    RoleResolver, RoleSet,
};
