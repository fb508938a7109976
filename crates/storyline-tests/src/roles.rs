//! Integration tests for role resolution.

use storyline_model::{
    parse_xml, DescendantPolicy, FcpxmlDocument, InterpretedRole, Role, RoleKind,
    RoleProvenance, RoleResolver,
};

use crate::fixtures::{breadcrumbs, named, ANNOTATED, MULTICAM, NTSC_CONFORM};

fn role(kind: RoleKind, raw: &str, provenance: RoleProvenance) -> InterpretedRole {
    InterpretedRole::new(Role::parse(kind, raw), provenance)
}

// ── Multicam ──────────────────────────────────────────────────────────

#[test]
fn mc_clip_takes_video_and_audio_from_different_angles() {
    let doc = parse_xml(MULTICAM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let roles = resolver.effective_roles(named(&doc, "Interview")).unwrap();
    assert_eq!(
        roles.to_vec(),
        vec![
            role(RoleKind::Video, "Wide", RoleProvenance::Inherited),
            role(RoleKind::Audio, "Dialogue.Lav-1", RoleProvenance::Inherited),
        ]
    );
    assert_eq!(roles[1].role.subrole_number(), Some(1));
    assert_eq!(roles[1].role.to_string(), "Dialogue.Lav-1");
}

#[test]
fn marker_on_mc_clip_inherits_its_roles() {
    let doc = parse_xml(MULTICAM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let marker = named(&doc, "OnInterview");
    assert!(resolver.local_roles(marker).unwrap().is_empty());

    let roles = resolver.annotation_roles(&breadcrumbs(marker)).unwrap();
    let names: Vec<String> = roles.iter().map(|r| r.role.to_string()).collect();
    assert_eq!(names, vec!["Wide", "Dialogue.Lav-1"]);
    assert!(roles
        .iter()
        .all(|r| r.provenance == RoleProvenance::Inherited));
}

// ── Defaults ──────────────────────────────────────────────────────────

#[test]
fn asset_clip_with_audio_role_gets_default_video() {
    let doc = parse_xml(ANNOTATED).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let roles = resolver.effective_roles(named(&doc, "Talk")).unwrap();
    assert_eq!(
        roles.to_vec(),
        vec![
            role(RoleKind::Audio, "Dialogue.Boom-1", RoleProvenance::Assigned),
            role(RoleKind::Video, "Video", RoleProvenance::Defaulted),
        ]
    );

    let marker = named(&doc, "Todo");
    let inherited = resolver.annotation_roles(&breadcrumbs(marker)).unwrap();
    assert_eq!(inherited[0].provenance, RoleProvenance::Inherited);
    assert_eq!(inherited[1].provenance, RoleProvenance::Defaulted);
}

#[test]
fn caption_keeps_its_format_role_verbatim() {
    let doc = parse_xml(ANNOTATED).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let roles = resolver.effective_roles(named(&doc, "Hello")).unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].kind(), RoleKind::Caption);
    assert_eq!(roles[0].role.name, "iTT?captionFormat=ITT.en");
    assert_eq!(roles[0].role.subrole, None);
}

#[test]
fn ref_clip_without_audio_subroles_defaults_video_only() {
    let doc = parse_xml(NTSC_CONFORM).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let roles = resolver.effective_roles(named(&doc, "CompoundUse")).unwrap();
    assert_eq!(
        roles.to_vec(),
        vec![role(RoleKind::Video, "Video", RoleProvenance::Defaulted)]
    );
}

// ── Descendant search ─────────────────────────────────────────────────

const NESTED_CLIPS: &str = r#"<fcpxml version="1.11">
    <resources>
        <format id="r1" frameDuration="1/24s"/>
        <asset id="a1" format="r1" hasVideo="1" hasAudio="1"/>
    </resources>
    <project name="P">
        <sequence format="r1">
            <spine>
                <clip name="Outer" offset="0s" duration="10s">
                    <spine>
                        <gap offset="0s" duration="10s">
                            <asset-clip ref="a1" lane="1" offset="0s" duration="5s" videoRole="Graphics"/>
                        </gap>
                    </spine>
                </clip>
                <clip name="WithTitle" offset="10s" duration="5s">
                    <title offset="0s" duration="5s" role="Titles.Lower Thirds"/>
                </clip>
            </spine>
        </sequence>
    </project>
</fcpxml>"#;

#[test]
fn clip_roles_depend_on_descendant_policy() {
    let doc = parse_xml(NESTED_CLIPS).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let outer = named(&doc, "Outer");

    let first_generation = RoleResolver::new(fcp.resources());
    assert!(first_generation.local_roles(outer).unwrap().is_empty());

    let unrestricted = first_generation.with_policy(DescendantPolicy::Unrestricted);
    assert_eq!(unrestricted.policy(), DescendantPolicy::Unrestricted);
    let roles = unrestricted.local_roles(outer).unwrap();
    assert_eq!(
        roles.to_vec(),
        vec![role(RoleKind::Video, "Graphics", RoleProvenance::Inherited)]
    );
}

#[test]
fn clip_inherits_title_role() {
    let doc = parse_xml(NESTED_CLIPS).unwrap();
    let fcp = FcpxmlDocument::from_root(doc.root_element()).unwrap();
    let resolver = RoleResolver::new(fcp.resources());

    let roles = resolver.effective_roles(named(&doc, "WithTitle")).unwrap();
    assert_eq!(roles[0], role(RoleKind::Video, "Titles.Lower Thirds", RoleProvenance::Inherited));
    assert_eq!(roles[0].role.subrole.as_deref(), Some("Lower Thirds"));
    assert_eq!(roles[1], role(RoleKind::Audio, "Dialogue", RoleProvenance::Defaulted));
}
