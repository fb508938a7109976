//! Integration tests for occlusion classification and how scopes filter it.

use storyline_core::Fraction;
use storyline_extract::{
    extract_document, ExtractedElement, ExtractionPreset, ExtractionReport, ExtractionScope,
};
use storyline_model::{occlusion, parse_xml, FcpxmlDocument, Occlusion};

use crate::fixtures::{breadcrumbs, init_tracing, named, COVERED_GAP};

fn classify_named(name: &str) -> Occlusion {
    let doc = parse_xml(COVERED_GAP).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let node = named(&doc, name);
    occlusion(node, &breadcrumbs(node), fcp.resources()).unwrap()
}

fn find<'r>(report: &'r ExtractionReport, name: &str) -> Option<&'r ExtractedElement> {
    report
        .elements
        .iter()
        .find(|e| e.name.as_deref() == Some(name))
}

// ── Classification ────────────────────────────────────────────────────

#[test]
fn marker_under_connected_video_is_hidden() {
    assert_eq!(classify_named("HiddenMarker"), Occlusion::FullyOccluded);
}

#[test]
fn audio_only_connected_clip_hides_nothing() {
    assert_eq!(classify_named("VisibleMarker"), Occlusion::NotOccluded);
}

#[test]
fn connected_clips_are_visible_themselves() {
    assert_eq!(classify_named("Overlay"), Occlusion::NotOccluded);
    assert_eq!(classify_named("Slug"), Occlusion::PartiallyOccluded);
}

#[test]
fn only_the_first_audition_pick_is_exposed() {
    assert_eq!(classify_named("Take1"), Occlusion::NotOccluded);
    assert_eq!(classify_named("Take1Marker"), Occlusion::NotOccluded);
    assert_eq!(classify_named("Take2"), Occlusion::FullyOccluded);
    assert_eq!(classify_named("Take2Marker"), Occlusion::FullyOccluded);
}

// ── Scope filtering ───────────────────────────────────────────────────

#[test]
fn main_timeline_drops_hidden_markers() {
    init_tracing();
    let doc = parse_xml(COVERED_GAP).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let report = extract_document(&fcp, &ExtractionPreset::Markers, &ExtractionScope::default());

    let names: Vec<_> = report.elements.iter().filter_map(|e| e.name.as_deref()).collect();
    assert_eq!(names, vec!["VisibleMarker", "Take1Marker"]);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn accepted_occlusion_set_is_honored() {
    let doc = parse_xml(COVERED_GAP).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();

    let strict = ExtractionScope::deep().with_occlusions([]);
    let report = extract_document(&fcp, &ExtractionPreset::Markers, &strict);
    assert!(find(&report, "HiddenMarker").is_none());
    assert!(find(&report, "Take2Marker").is_none());
    assert!(find(&report, "VisibleMarker").is_some());

    let hidden_too = ExtractionScope::deep().with_occlusions([Occlusion::FullyOccluded]);
    let report = extract_document(&fcp, &ExtractionPreset::Markers, &hidden_too);
    assert_eq!(
        find(&report, "HiddenMarker").map(|e| e.occlusion),
        Some(Occlusion::FullyOccluded)
    );
    assert_eq!(
        find(&report, "Take2Marker").map(|e| e.occlusion),
        Some(Occlusion::FullyOccluded)
    );
}

#[test]
fn partially_hidden_clips_survive_the_default_scope() {
    let doc = parse_xml(COVERED_GAP).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let report = extract_document(&fcp, &ExtractionPreset::Clips, &ExtractionScope::default());

    assert_eq!(
        find(&report, "Slug").map(|e| e.occlusion),
        Some(Occlusion::PartiallyOccluded)
    );
    assert!(find(&report, "Take2").is_none());
    assert!(report
        .elements
        .iter()
        .filter(|e| e.name.as_deref() != Some("Slug"))
        .all(|e| !e.occlusion.is_occluded()));
}

// ── Connected clips past their parent ─────────────────────────────────

const HANGING_TITLE: &str = r#"<fcpxml version="1.11">
    <resources>
        <format id="r1" frameDuration="1/25s"/>
        <asset id="a1" format="r1" hasVideo="1" hasAudio="1"/>
        <asset id="vo" hasAudio="1" hasVideo="0"/>
    </resources>
    <project name="Hanging">
        <sequence format="r1" duration="15s">
            <spine>
                <asset-clip name="A" ref="a1" offset="0s" start="0s" duration="5s">
                    <title name="Lower Third" lane="1" offset="3s" start="0s" duration="5s">
                        <marker start="4s" duration="1/25s" value="TailMarker"/>
                    </title>
                </asset-clip>
                <asset-clip name="B" ref="a1" offset="5s" start="0s" duration="5s"/>
                <asset-clip name="Narration" ref="vo" offset="10s" start="0s" duration="5s">
                    <marker start="2s" duration="1/25s" value="UnderPicture"/>
                    <asset-clip name="Cutaway" ref="a1" lane="1" offset="0s" start="0s" duration="5s"/>
                </asset-clip>
            </spine>
        </sequence>
    </project>
</fcpxml>"#;

#[test]
fn connected_title_stays_visible_past_its_parent() {
    let doc = parse_xml(HANGING_TITLE).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resources = fcp.resources();

    let title = named(&doc, "Lower Third");
    assert_eq!(
        occlusion(title, &breadcrumbs(title), resources).unwrap(),
        Occlusion::NotOccluded
    );

    let report = extract_document(&fcp, &ExtractionPreset::Markers, &ExtractionScope::default());
    let tail = find(&report, "TailMarker").unwrap();
    assert_eq!(tail.start, Some(Fraction::from_integer(7)));
    assert_eq!(tail.occlusion, Occlusion::NotOccluded);
}

#[test]
fn audio_only_clip_under_picture_stays_exposed() {
    let doc = parse_xml(HANGING_TITLE).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let report = extract_document(&fcp, &ExtractionPreset::Markers, &ExtractionScope::default());

    let names: Vec<_> = report.elements.iter().filter_map(|e| e.name.as_deref()).collect();
    assert_eq!(names, vec!["TailMarker", "UnderPicture"]);
    assert!(report.elements.iter().all(|e| !e.occlusion.is_occluded()));
}
