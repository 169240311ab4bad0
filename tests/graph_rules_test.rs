//! Link-creation rules and project persistence.

mod common;

use common::GraphBuilder;
use visionforge_rs::graph::{LinkRejection, ProjectFile};
use visionforge_rs::nodes::{
    self, BlurNode, CvtColorNode, MaskNode, ThresholdNode, VisionNode,
};

#[test]
fn test_connect_rejects_same_mode() {
    let mut b = GraphBuilder::new();
    let blur_a = b.add(VisionNode::Blur(BlurNode::default()));
    let blur_b = b.add(VisionNode::Blur(BlurNode::default()));

    let result = b.graph.connect(
        nodes::blur::output_attr(blur_a),
        nodes::blur::output_attr(blur_b),
    );
    assert_eq!(result.unwrap_err(), LinkRejection::SameMode);
    assert_eq!(b.graph.iter_links().count(), 0);
}

#[test]
fn test_connect_rejects_same_node() {
    let mut b = GraphBuilder::new();
    let blur = b.add(VisionNode::Blur(BlurNode::default()));

    let result = b.graph.connect(
        nodes::blur::output_attr(blur),
        nodes::blur::input_attr(blur),
    );
    assert_eq!(result.unwrap_err(), LinkRejection::SameNode);
    assert_eq!(b.graph.iter_links().count(), 0);
}

#[test]
fn test_connect_rejects_type_mismatch() {
    let mut b = GraphBuilder::new();
    let blur = b.add(VisionNode::Blur(BlurNode::default()));
    let filter = b.add(VisionNode::FilterContoursByArea(Default::default()));

    // Mat output into a contour-list input.
    let result = b.graph.connect(
        nodes::blur::output_attr(blur),
        nodes::filter_contours::input_attr(filter),
    );
    assert_eq!(result.unwrap_err(), LinkRejection::TypeMismatch);
    assert_eq!(b.graph.iter_links().count(), 0);
}

#[test]
fn test_connect_rejects_direct_back_edge() {
    let mut b = GraphBuilder::new();
    let mask = b.add(VisionNode::Mask(MaskNode::default()));
    let threshold = b.add(VisionNode::Threshold(ThresholdNode::default()));

    b.connect(
        nodes::mask::output_attr(mask),
        nodes::threshold::input_attr(threshold),
    );
    let links_before = b.graph.iter_links().count();

    // The opposite direction between the same pair must be rejected and
    // leave zero net new links.
    let result = b.graph.connect(
        nodes::threshold::output_attr(threshold),
        nodes::mask::mask_attr(mask),
    );
    assert_eq!(result.unwrap_err(), LinkRejection::WouldRecurse);
    assert_eq!(b.graph.iter_links().count(), links_before);
}

#[test]
fn test_input_holds_single_link() {
    let mut b = GraphBuilder::new();
    let blur = b.add(VisionNode::Blur(BlurNode::default()));
    let cvt = b.add(VisionNode::CvtColor(CvtColorNode::default()));

    b.connect(
        nodes::input_source::output_attr(b.input),
        nodes::blur::input_attr(blur),
    );
    // Relinking the same input replaces the previous link.
    b.connect(
        nodes::cvt_color::output_attr(cvt),
        nodes::blur::input_attr(blur),
    );

    let incoming = b.graph.linked_attributes(nodes::blur::input_attr(blur));
    assert_eq!(incoming, vec![nodes::cvt_color::output_attr(cvt)]);
}

#[test]
fn test_disconnect_detaches_both_ends() {
    let mut b = GraphBuilder::new();
    let blur = b.add(VisionNode::Blur(BlurNode::default()));

    let link = b
        .graph
        .connect(
            nodes::input_source::output_attr(b.input),
            nodes::blur::input_attr(blur),
        )
        .unwrap();
    b.graph.disconnect(link);

    assert_eq!(b.graph.iter_links().count(), 0);
    assert!(b
        .graph
        .linked_attributes(nodes::blur::input_attr(blur))
        .is_empty());
}

#[test]
fn test_delete_node_removes_incident_links() {
    let mut b = GraphBuilder::new();
    let blur = b.add(VisionNode::Blur(BlurNode::default()));

    b.connect(
        nodes::input_source::output_attr(b.input),
        nodes::blur::input_attr(blur),
    );
    b.connect(
        nodes::blur::output_attr(blur),
        nodes::pipeline_output::input_attr(b.output),
    );

    b.graph.delete_node(blur);
    assert!(b.graph.node(blur).is_none());
    assert_eq!(b.graph.iter_links().count(), 0);
}

#[test]
fn test_anchor_nodes_survive_delete() {
    let mut b = GraphBuilder::new();
    b.graph.delete_node(b.input);
    b.graph.delete_node(b.output);
    assert!(b.graph.input_source().is_some());
    assert!(b.graph.pipeline_output().is_some());
}

#[test]
fn test_project_round_trip_through_disk() {
    let mut b = GraphBuilder::new();
    let cvt = b.add(VisionNode::CvtColor(CvtColorNode {
        target: visionforge_rs::codegen::ColorSpace::Gray,
    }));
    b.connect(
        nodes::input_source::output_attr(b.input),
        nodes::cvt_color::input_attr(cvt),
    );
    b.connect(
        nodes::cvt_color::output_attr(cvt),
        nodes::pipeline_output::input_attr(b.output),
    );

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("project.json");
    ProjectFile::from_graph(&b.graph).save(&path).unwrap();

    let restored = ProjectFile::load(&path).unwrap().into_graph();

    let ids: Vec<u32> = b.graph.iter_nodes().map(|(id, _)| id.0).collect();
    let restored_ids: Vec<u32> = restored.iter_nodes().map(|(id, _)| id.0).collect();
    assert_eq!(ids, restored_ids);

    let endpoints: Vec<(u32, u32)> = b.graph.iter_links().map(|(_, l)| (l.a.0, l.b.0)).collect();
    let restored_endpoints: Vec<(u32, u32)> =
        restored.iter_links().map(|(_, l)| (l.a.0, l.b.0)).collect();
    assert_eq!(endpoints, restored_endpoints);

    // Node-specific fields survive too.
    match &restored.node(cvt).unwrap().node {
        VisionNode::CvtColor(n) => {
            assert_eq!(n.target, visionforge_rs::codegen::ColorSpace::Gray)
        }
        other => panic!("unexpected node {other:?}"),
    }
}
