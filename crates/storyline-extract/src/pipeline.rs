//! Extraction pipeline.
//!
//! A lazy pre-order walk over a document subtree with an explicit stack.
//! Every stack frame carries its own breadcrumb chain, so content reached
//! through a `ref-clip` or `mc-clip` is positioned, role-resolved and
//! occlusion-classified relative to the clip that uses it.
//!
//! Per-element failures never stop the walk:
//! - unresolved references skip the offending subtree
//! - rate mismatches leave the element unplaced with a warning
//! - both are recorded as [`Diagnostic`]s

use rayon::prelude::*;
use tracing::{debug, info, warn};

use storyline_core::{Result, StorylineError};
use storyline_model::attributes::flag;
use storyline_model::node::describe;
use storyline_model::role::first_story_child;
use storyline_model::{
    classify, governing_rate, occlusion, place, AnnotationKind, ClipKind, ElementKind,
    FcpxmlDocument, McSelection, Occlusion, Placement, RoleResolver, RoleSet, StructureKind,
    XmlNode,
};

use crate::metadata::{element_metadata, keywords};
use crate::preset::ExtractionPreset;
use crate::report::{Diagnostic, ExtractedElement, ExtractionReport, MarkerState};
use crate::scope::{AngleMask, AuditionMask, ExtractionScope};

/// A node waiting to be visited, with its breadcrumbs.
struct Frame<N> {
    node: N,
    /// Ancestors, document root first.
    path: Vec<N>,
    /// Media resources entered on the way down.
    media: Vec<String>,
}

/// Lazy iterator over the elements a preset and scope select.
///
/// Not restartable: run [`extract`] again for a fresh walk.
pub struct Extraction<'d, N: XmlNode> {
    document: &'d FcpxmlDocument<N>,
    roles: RoleResolver<'d, N>,
    preset: ExtractionPreset,
    scope: ExtractionScope,
    stack: Vec<Frame<N>>,
    diagnostics: Vec<Diagnostic>,
}

/// Start an extraction over the subtree rooted at `root`.
pub fn extract<'d, N: XmlNode>(
    document: &'d FcpxmlDocument<N>,
    root: N,
    preset: &ExtractionPreset,
    scope: &ExtractionScope,
) -> Extraction<'d, N> {
    Extraction::new(document, root, preset.clone(), scope.clone())
}

/// Extract the whole document in one report.
pub fn extract_document<N: XmlNode>(
    document: &FcpxmlDocument<N>,
    preset: &ExtractionPreset,
    scope: &ExtractionScope,
) -> ExtractionReport {
    extract(document, document.root(), preset, scope).collect_report()
}

/// Extract every project in parallel, one report per project in document
/// order.
pub fn extract_projects<N: XmlNode>(
    document: &FcpxmlDocument<N>,
    preset: &ExtractionPreset,
    scope: &ExtractionScope,
) -> Vec<ExtractionReport> {
    let projects = document.projects();
    info!(projects = projects.len(), "Extracting projects");

    projects
        .par_iter()
        .map(|&project| {
            let mut report = extract(document, project, preset, scope).collect_report();
            report.project = project.attribute("name").map(str::to_string);
            debug!(
                project = report.project.as_deref().unwrap_or("<unnamed>"),
                elements = report.len(),
                diagnostics = report.diagnostics.len(),
                "Project extracted"
            );
            report
        })
        .collect()
}

impl<'d, N: XmlNode> Extraction<'d, N> {
    pub fn new(
        document: &'d FcpxmlDocument<N>,
        root: N,
        preset: ExtractionPreset,
        scope: ExtractionScope,
    ) -> Self {
        let roles = RoleResolver::new(document.resources()).with_policy(scope.role_policy);
        Self {
            document,
            roles,
            preset,
            scope,
            stack: vec![Frame {
                node: root,
                path: root.ancestors(),
                media: Vec::new(),
            }],
            diagnostics: Vec::new(),
        }
    }

    /// Problems found so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain the walk into a report.
    pub fn collect_report(mut self) -> ExtractionReport {
        let elements: Vec<ExtractedElement> = self.by_ref().collect();
        info!(
            elements = elements.len(),
            diagnostics = self.diagnostics.len(),
            "Extraction complete"
        );
        ExtractionReport {
            project: None,
            elements,
            diagnostics: self.diagnostics,
        }
    }

    fn diagnose(&mut self, node: N, error: StorylineError) {
        let location = describe(node);
        warn!(element = %location, error = %error, "Extraction problem");
        self.diagnostics.push(Diagnostic::new(location, error));
    }

    fn push_children(&mut self, children: Vec<N>, path: &[N], media: &[String]) {
        for child in children.into_iter().rev() {
            if classify(child).is_none() {
                continue;
            }
            self.stack.push(Frame {
                node: child,
                path: path.to_vec(),
                media: media.to_vec(),
            });
        }
    }

    fn visit(&mut self, frame: Frame<N>) -> Option<ExtractedElement> {
        let Frame { node, path, media } = frame;
        let kind = classify(node)?;

        match kind {
            ElementKind::Resources | ElementKind::Resource(_) => None,
            ElementKind::Story(_) => self.visit_story(node, kind, path, media),
            ElementKind::Structure(StructureKind::Event) if !self.scope.is_deep() => {
                // browser clips are not on any timeline
                let projects: Vec<N> = node
                    .children()
                    .into_iter()
                    .filter(|&child| matches!(classify(child), Some(ElementKind::Structure(_))))
                    .collect();
                let mut child_path = path;
                child_path.push(node);
                self.push_children(projects, &child_path, &media);
                None
            }
            ElementKind::Root | ElementKind::Structure(_) => {
                let mut child_path = path;
                child_path.push(node);
                self.push_children(node.children(), &child_path, &media);
                None
            }
        }
    }

    /// References the subtree depends on. Any failure skips the subtree.
    fn check_references(&self, node: N, kind: ElementKind) -> Result<()> {
        let resources = self.document.resources();
        if let Some(format) = node.attribute("format") {
            resources.format(format)?;
        }
        governing_rate(node, resources)?;

        let reference = node.attribute("ref");
        match (kind.clip_kind(), reference) {
            (Some(ClipKind::AssetClip), Some(id)) => {
                resources.asset(id)?;
            }
            (Some(ClipKind::RefClip), Some(id)) => {
                resources.sequence_of(id)?;
            }
            (Some(ClipKind::McClip), Some(id)) => {
                resources.multicam_of(id)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn visit_story(
        &mut self,
        node: N,
        kind: ElementKind,
        path: Vec<N>,
        media: Vec<String>,
    ) -> Option<ExtractedElement> {
        if let Err(error) = self.check_references(node, kind) {
            self.diagnose(node, error);
            return None;
        }

        let record = if self.preset.matches(kind) {
            self.record(node, kind, &path)
        } else {
            None
        };

        let mut child_path = path;
        child_path.push(node);
        self.descend(node, kind, child_path, media);
        record
    }

    fn descend(&mut self, node: N, kind: ElementKind, child_path: Vec<N>, media: Vec<String>) {
        let deep = self.scope.is_deep();
        match kind.clip_kind() {
            Some(ClipKind::Audition) if self.scope.auditions == AuditionMask::Active => {
                let active = first_story_child(node);
                let children: Vec<N> = node
                    .children()
                    .into_iter()
                    .filter(|&child| {
                        Some(child) == active || !classify(child).is_some_and(ElementKind::is_clip)
                    })
                    .collect();
                self.push_children(children, &child_path, &media);
            }
            Some(ClipKind::RefClip) if deep => {
                if let Some(media_id) = self.enter_media(node, &media) {
                    if let Ok(sequence) = self.document.resources().sequence_of(&media_id) {
                        let mut inner_media = media.clone();
                        inner_media.push(media_id);
                        self.push_children(vec![sequence], &child_path, &inner_media);
                    }
                }
                self.push_children(node.children(), &child_path, &media);
            }
            Some(ClipKind::McClip) if deep => {
                if let Some(media_id) = self.enter_media(node, &media) {
                    if let Ok(multicam) = self.document.resources().multicam_of(&media_id) {
                        let selection = McSelection::read(node);
                        let angles: Vec<N> = multicam
                            .children_named("mc-angle")
                            .into_iter()
                            .filter(|angle| {
                                self.scope.mc_angles == AngleMask::All
                                    || angle
                                        .attribute("angleID")
                                        .is_some_and(|id| selection.is_active(id))
                            })
                            .collect();
                        let mut angle_path = child_path.clone();
                        angle_path.push(multicam);
                        let mut inner_media = media.clone();
                        inner_media.push(media_id);
                        self.push_children(angles, &angle_path, &inner_media);
                    }
                }
                self.push_children(node.children(), &child_path, &media);
            }
            _ => self.push_children(node.children(), &child_path, &media),
        }
    }

    /// The media id a compound or multicam clip descends into, unless it is
    /// already being expanded further up this path.
    fn enter_media(&mut self, node: N, media: &[String]) -> Option<String> {
        let media_id = node.attribute("ref")?.to_string();
        if media.contains(&media_id) {
            self.diagnose(
                node,
                StorylineError::Structural(format!("media `{}` contains itself", media_id)),
            );
            return None;
        }
        Some(media_id)
    }

    fn record(&mut self, node: N, kind: ElementKind, path: &[N]) -> Option<ExtractedElement> {
        let document = self.document;
        let resources = document.resources();
        let mut warnings = Vec::new();

        let placement = match place(node, path, resources) {
            Ok(placement) => placement,
            Err(error @ StorylineError::RateMismatch { .. }) => {
                warnings.push(error.to_string());
                self.diagnose(node, error);
                Placement::default()
            }
            Err(error) => {
                self.diagnose(node, error);
                return None;
            }
        };

        // a failing walk was already reported with the placement
        let occlusion = occlusion(node, path, resources).unwrap_or(Occlusion::NotOccluded);
        if !self.scope.accepts(occlusion) {
            debug!(element = %describe(node), %occlusion, "Dropping occluded element");
            return None;
        }

        let roles = if kind.is_point_annotation() {
            self.roles.annotation_roles(path)
        } else {
            self.roles.effective_roles(node)
        };
        let roles = match roles {
            Ok(roles) => roles,
            Err(error) => {
                warnings.push(error.to_string());
                self.diagnose(node, error);
                RoleSet::new()
            }
        };

        let mut chain = path.to_vec();
        chain.push(node);

        let marker_state = match kind.annotation_kind() {
            Some(AnnotationKind::Marker) => Some(match flag(node, "completed") {
                None => MarkerState::Standard,
                Some(false) => MarkerState::ToDo,
                Some(true) => MarkerState::Completed,
            }),
            Some(AnnotationKind::ChapterMarker) => Some(MarkerState::Chapter),
            _ => None,
        };

        Some(ExtractedElement {
            kind,
            name: node
                .attribute("name")
                .or_else(|| node.attribute("value"))
                .map(str::to_string),
            note: node.attribute("note").map(str::to_string),
            marker_state,
            start: placement.start,
            duration: placement.duration,
            timeline_rate: placement.timeline_rate,
            roles,
            occlusion,
            keywords: keywords(&chain, placement.range(), resources),
            metadata: element_metadata(&chain, resources),
            warnings,
            path: path.iter().map(|&ancestor| describe(ancestor)).collect(),
        })
    }
}

impl<'d, N: XmlNode> Iterator for Extraction<'d, N> {
    type Item = ExtractedElement;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            if let Some(record) = self.visit(frame) {
                return Some(record);
            }
        }
        None
    }
}
