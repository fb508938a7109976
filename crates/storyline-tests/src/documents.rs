//! Integration tests for document loading and the resource index.

use storyline_core::{FrameRate, Rate, StorylineError};
use storyline_model::{parse_xml, FcpxmlDocument, FcpxmlVersion, ResourceKind};

use crate::fixtures::{init_tracing, MULTICAM, NTSC_CONFORM};

fn load_error(xml: &str) -> StorylineError {
    let doc = parse_xml(xml).unwrap();
    FcpxmlDocument::from_root(doc.root_element()).unwrap_err()
}

// ── Loading ───────────────────────────────────────────────────────────

#[test]
fn library_document_loads() {
    init_tracing();
    let doc = parse_xml(NTSC_CONFORM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();

    assert_eq!(fcp.version(), FcpxmlVersion::new(1, 10));
    assert_eq!(fcp.resources().len(), 5);
    assert_eq!(fcp.events().len(), 1);

    let projects = fcp.projects();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0].attribute("name"), Some("Conform"));
}

#[test]
fn malformed_xml_is_an_xml_error() {
    let err = parse_xml("<fcpxml version=\"1.11\"><resources>").unwrap_err();
    assert!(matches!(err, StorylineError::Xml(_)));
    assert!(err.is_fatal());
}

#[test]
fn unsupported_versions_are_rejected() {
    for version in ["1.5", "1.14", "2.0"] {
        let xml = format!(
            r#"<fcpxml version="{version}"><resources/><project name="P"/></fcpxml>"#
        );
        let err = load_error(&xml);
        assert!(
            matches!(err, StorylineError::Structural(_)),
            "version {version} gave {err}"
        );
    }
}

#[test]
fn missing_resources_or_structure_is_structural() {
    let err = load_error(r#"<fcpxml version="1.11"><project name="P"/></fcpxml>"#);
    assert!(matches!(err, StorylineError::Structural(_)));

    let err = load_error(r#"<fcpxml version="1.11"><resources/></fcpxml>"#);
    assert!(matches!(err, StorylineError::Structural(_)));

    let err = load_error(r#"<fcpxmlx version="1.11"><resources/><project/></fcpxmlx>"#);
    assert!(matches!(err, StorylineError::Structural(_)));
}

// ── Resource index ────────────────────────────────────────────────────

#[test]
fn duplicate_resource_ids_are_structural() {
    let err = load_error(
        r#"<fcpxml version="1.11">
            <resources>
                <format id="r1" frameDuration="1/24s"/>
                <asset id="r1" format="r1"/>
            </resources>
            <project name="P"/>
        </fcpxml>"#,
    );
    assert!(matches!(err, StorylineError::Structural(msg) if msg.contains("r1")));
}

#[test]
fn format_reference_cycle_is_structural() {
    let err = load_error(
        r#"<fcpxml version="1.11">
            <resources>
                <asset id="a1" format="a2"/>
                <asset id="a2" format="a1"/>
            </resources>
            <project name="P"/>
        </fcpxml>"#,
    );
    assert!(matches!(err, StorylineError::Structural(_)));
}

#[test]
fn dangling_format_link_is_left_for_lookups() {
    let doc = parse_xml(
        r#"<fcpxml version="1.11">
            <resources><asset id="a1" format="gone"/></resources>
            <project name="P"/>
        </fcpxml>"#,
    )
    .unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let asset = fcp.resources().asset("a1").unwrap();
    let err = fcp.resources().format_of(asset).unwrap_err();
    assert_eq!(err, StorylineError::unresolved("gone", "known"));
    assert!(!err.is_fatal());
}

#[test]
fn lookups_check_resource_kind() {
    let doc = parse_xml(NTSC_CONFORM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resources = fcp.resources();

    assert_eq!(resources.resolve("r24").unwrap().kind, ResourceKind::Format);
    assert!(matches!(
        resources.asset("r24"),
        Err(StorylineError::UnresolvedReference { id, .. }) if id == "r24"
    ));
    assert!(resources.format("nope").is_err());
    assert!(resources.multicam_of("comp").is_err());
    assert_eq!(resources.sequence_of("comp").unwrap().tag_name().name(), "sequence");
}

#[test]
fn rates_follow_format_links() {
    let doc = parse_xml(NTSC_CONFORM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resources = fcp.resources();

    let ntsc = Rate::new(FrameRate::FPS_23_976);
    assert_eq!(resources.rate_of_format_ref("r2398").unwrap(), Some(ntsc));
    assert_eq!(
        resources.format_of(resources.asset("a2398").unwrap()).unwrap(),
        Some(ntsc)
    );
    assert_eq!(
        resources.format_of(resources.media("comp").unwrap()).unwrap(),
        Some(ntsc)
    );
    assert_eq!(
        resources.format_of(resources.asset("a24").unwrap()).unwrap(),
        Some(Rate::new(FrameRate::FPS_24))
    );
}

#[test]
fn resource_metadata_is_indexed() {
    let doc = parse_xml(MULTICAM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let cam_a = fcp.resources().asset("camA").unwrap();

    assert_eq!(cam_a.name.as_deref(), Some("Cam A"));
    assert!(cam_a
        .metadata
        .iter()
        .any(|(key, value)| key == "com.apple.proapps.mio.cameraName" && value == "Camera A"));
    assert_eq!(cam_a.as_asset().and_then(|info| info.has_video), Some(true));
}
