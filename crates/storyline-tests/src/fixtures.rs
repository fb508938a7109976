//! Shared FCPXML fixtures and lookup helpers.

use roxmltree::{Document, Node};
use storyline_model::XmlNode;
use tracing_subscriber::EnvFilter;

/// Route `tracing` output to the test harness. Set `RUST_LOG=debug` to see it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// First element whose `name` (or marker `value`) matches.
pub fn named<'a, 'i>(doc: &'a Document<'i>, name: &str) -> Node<'a, 'i> {
    doc.descendants()
        .find(|n| n.attribute("name") == Some(name) || n.attribute("value") == Some(name))
        .unwrap_or_else(|| panic!("fixture has no element named {name}"))
}

/// Parent-link breadcrumbs of a node, document root first.
pub fn breadcrumbs<'a, 'i>(node: Node<'a, 'i>) -> Vec<Node<'a, 'i>> {
    XmlNode::ancestors(&node)
}

/// A 24 fps sequence holding a `clip` with `tcStart` whose asset-clip is
/// 23.976 footage, plus a 23.976 compound clip.
pub const NTSC_CONFORM: &str = r#"<fcpxml version="1.10">
    <resources>
        <format id="r24" name="FFVideoFormat1080p24" frameDuration="1/24s" width="1920" height="1080"/>
        <format id="r2398" name="FFVideoFormat1080p2398" frameDuration="1001/24000s" width="1920" height="1080"/>
        <asset id="a2398" name="A001_C003" format="r2398" hasVideo="1" hasAudio="1" start="0s" duration="3600s">
            <media-rep kind="original-media" src="file:///Volumes/Media/A001_C003.mov"/>
        </asset>
        <asset id="a24" name="B002_C001" format="r24" hasVideo="1" start="0s" duration="600s"/>
        <media id="comp" name="Compound 1">
            <sequence format="r2398" tcStart="0s" duration="10010/1000s">
                <spine>
                    <asset-clip name="CompInner" ref="a2398" offset="0s" start="1001/1000s" duration="5005/1000s">
                        <marker start="2002/1000s" duration="1001/24000s" value="InCompound"/>
                    </asset-clip>
                </spine>
            </sequence>
        </media>
    </resources>
    <library>
        <event name="Day 1">
            <project name="Conform">
                <sequence format="r24" tcStart="0s" duration="60s" tcFormat="NDF">
                    <spine>
                        <clip name="Wrapper" offset="0s" tcStart="0s" duration="10s">
                            <asset-clip name="Ntsc" ref="a2398" start="1001/24000s" duration="5s">
                                <marker start="1001/12000s" duration="1001/24000s" value="NtscMarker"/>
                            </asset-clip>
                        </clip>
                        <asset-clip name="Plain" ref="a24" offset="10s" start="100s" duration="10s">
                            <marker start="101s" duration="1/24s" value="PlainMarker"/>
                            <asset-clip name="Connected" ref="a2398" lane="1" offset="105s" start="2002/1000s" duration="2s">
                                <marker start="3003/1000s" duration="1001/24000s" value="ConnectedMarker"/>
                            </asset-clip>
                        </asset-clip>
                        <ref-clip name="CompoundUse" ref="comp" offset="20s" start="1001/1000s" duration="5s"/>
                    </spine>
                </sequence>
            </project>
        </event>
    </library>
</fcpxml>"#;

/// An `mc-clip` whose video comes from angle A and audio from angle B.
pub const MULTICAM: &str = r#"<fcpxml version="1.11">
    <resources>
        <format id="r1" frameDuration="1/25s"/>
        <asset id="camA" name="Cam A" format="r1" hasVideo="1" hasAudio="1">
            <metadata><md key="com.apple.proapps.mio.cameraName" value="Camera A"/></metadata>
        </asset>
        <asset id="camB" name="Cam B" format="r1" hasVideo="1" hasAudio="1">
            <metadata><md key="com.apple.proapps.mio.cameraName" value="Camera B"/></metadata>
        </asset>
        <media id="mc" name="Interview Multicam">
            <multicam format="r1" tcStart="0s">
                <mc-angle name="A" angleID="angle-a">
                    <gap offset="0s" duration="2s"/>
                    <asset-clip name="AngleAClip" ref="camA" offset="2s" duration="58s" videoRole="Wide" audioRole="Ambience">
                        <marker start="10s" duration="1/25s" value="AngleAMarker"/>
                    </asset-clip>
                </mc-angle>
                <mc-angle name="B" angleID="angle-b">
                    <asset-clip name="AngleBClip" ref="camB" offset="0s" duration="60s" videoRole="Close" audioRole="Dialogue.Lav-1">
                        <marker start="12s" duration="1/25s" value="AngleBMarker"/>
                    </asset-clip>
                </mc-angle>
            </multicam>
        </media>
    </resources>
    <event name="Interviews">
        <project name="Edit">
            <sequence format="r1" tcStart="3600s" duration="60s">
                <spine>
                    <mc-clip name="Interview" ref="mc" offset="3600s" start="5s" duration="30s">
                        <mc-source angleID="angle-a" srcEnable="video"/>
                        <mc-source angleID="angle-b" srcEnable="audio"/>
                        <marker start="20s" duration="1/25s" value="OnInterview"/>
                    </mc-clip>
                </spine>
            </sequence>
        </project>
    </event>
</fcpxml>"#;

/// A marker inside a primary-lane gap, covered by a connected clip, and an
/// audition with an alternative pick.
pub const COVERED_GAP: &str = r#"<fcpxml version="1.11">
    <resources>
        <format id="r1" frameDuration="1/30s"/>
        <asset id="bg" name="Background" format="r1" hasVideo="1"/>
        <asset id="vo" name="Voice Over" hasAudio="1" hasVideo="0"/>
    </resources>
    <project name="Covered">
        <sequence format="r1" duration="30s">
            <spine>
                <gap name="Slug" offset="0s" start="0s" duration="10s">
                    <marker start="3s" duration="1/30s" value="HiddenMarker"/>
                    <marker start="8s" duration="1/30s" value="VisibleMarker"/>
                    <asset-clip name="Overlay" ref="bg" lane="1" offset="2s" duration="4s"/>
                    <asset-clip name="VO" ref="vo" lane="2" offset="7s" duration="3s"/>
                </gap>
                <audition name="Takes" offset="10s" duration="5s">
                    <asset-clip name="Take1" ref="bg" offset="10s" duration="5s">
                        <marker start="1s" duration="1/30s" value="Take1Marker"/>
                    </asset-clip>
                    <asset-clip name="Take2" ref="bg" offset="10s" duration="5s">
                        <marker start="1s" duration="1/30s" value="Take2Marker"/>
                    </asset-clip>
                </audition>
            </spine>
        </sequence>
    </project>
</fcpxml>"#;

/// A drop-frame 29.97 timeline with keywords, captions and every marker state.
pub const ANNOTATED: &str = r#"<fcpxml version="1.13">
    <resources>
        <format id="r2997" frameDuration="1001/30000s"/>
        <asset id="a1" name="Interview" format="r2997" hasVideo="1" hasAudio="1">
            <metadata><md key="com.apple.proapps.studio.reel" value="R1"/></metadata>
        </asset>
    </resources>
    <event name="Review">
        <project name="Cut A">
            <sequence format="r2997" tcStart="0s" tcFormat="DF" duration="120s">
                <spine>
                    <asset-clip name="Talk" ref="a1" offset="0s" start="0s" duration="120s" audioRole="Dialogue.Boom-1">
                        <keyword start="0s" duration="30s" value="Intro, Wide"/>
                        <keyword start="30s" duration="60s" value="Close"/>
                        <marker start="60060/1000s" duration="1001/30000s" value="Standard"/>
                        <marker start="10s" duration="1001/30000s" value="Todo" completed="0" note="check audio"/>
                        <marker start="40s" duration="1001/30000s" value="Done" completed="1"/>
                        <chapter-marker start="5s" duration="1001/30000s" value="Opening" posterOffset="0s"/>
                        <caption name="Hello" lane="1" offset="1s" duration="2s" role="iTT?captionFormat=ITT.en"/>
                    </asset-clip>
                </spine>
            </sequence>
        </project>
        <project name="Cut B">
            <sequence format="r2997" tcStart="0s" duration="10s">
                <spine>
                    <asset-clip name="Short" ref="a1" offset="0s" duration="10s">
                        <marker start="5s" duration="1001/30000s" value="CutBMarker"/>
                        <marker start="1s" duration="1001/30000s" value="CutBEarly"/>
                    </asset-clip>
                </spine>
            </sequence>
        </project>
    </event>
</fcpxml>"#;
