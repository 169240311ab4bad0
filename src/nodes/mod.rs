//! Built-in vision node types.
//!
//! `VisionNode` is the enum-dispatch wrapper over all built-in nodes:
//! node-specific configuration lives in each variant's struct, attribute
//! layouts come from static descriptor tables, and every node carries one
//! generator per target language. The graph and the pass context only see
//! this enum.

pub mod blur;
pub mod canny_edge;
pub mod cvt_color;
pub mod filter_contours;
pub mod find_contours;
pub mod input_source;
pub mod mask;
pub mod pipeline_output;
pub mod threshold;

pub use blur::BlurNode;
pub use canny_edge::CannyEdgeNode;
pub use cvt_color::CvtColorNode;
pub use filter_contours::FilterContoursByAreaNode;
pub use find_contours::FindContoursNode;
pub use input_source::InputSourceNode;
pub use mask::MaskNode;
pub use pipeline_output::PipelineOutputNode;
pub use threshold::ThresholdNode;

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::ColorSpace;
use crate::codegen::languages::LanguageId;
use crate::codegen::resolvable::Resolvable;
use crate::codegen::scope::Scope;
use crate::codegen::value::{Expr, Value};
use crate::graph::attribute::AttributeDescriptor;
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};

/// Palette category of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Flow,
    ImageProc,
    FeatureDet,
    Classification,
}

/// Enum dispatch over all built-in node types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum VisionNode {
    #[serde(rename = "input_source")]
    InputSource(InputSourceNode),
    #[serde(rename = "pipeline_output")]
    PipelineOutput(PipelineOutputNode),
    #[serde(rename = "cvt_color")]
    CvtColor(CvtColorNode),
    #[serde(rename = "blur")]
    Blur(BlurNode),
    #[serde(rename = "threshold")]
    Threshold(ThresholdNode),
    #[serde(rename = "canny_edge")]
    CannyEdge(CannyEdgeNode),
    #[serde(rename = "mask")]
    Mask(MaskNode),
    #[serde(rename = "find_contours")]
    FindContours(FindContoursNode),
    #[serde(rename = "filter_contours_by_area")]
    FilterContoursByArea(FilterContoursByAreaNode),
}

impl VisionNode {
    /// Stable type tag, also used in the project-file format.
    pub fn type_tag(&self) -> &'static str {
        match self {
            VisionNode::InputSource(_) => "input_source",
            VisionNode::PipelineOutput(_) => "pipeline_output",
            VisionNode::CvtColor(_) => "cvt_color",
            VisionNode::Blur(_) => "blur",
            VisionNode::Threshold(_) => "threshold",
            VisionNode::CannyEdge(_) => "canny_edge",
            VisionNode::Mask(_) => "mask",
            VisionNode::FindContours(_) => "find_contours",
            VisionNode::FilterContoursByArea(_) => "filter_contours_by_area",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            VisionNode::InputSource(_) => "Pipeline Input",
            VisionNode::PipelineOutput(_) => "Pipeline Output",
            VisionNode::CvtColor(_) => "Convert Color",
            VisionNode::Blur(_) => "Blur",
            VisionNode::Threshold(_) => "Color Threshold",
            VisionNode::CannyEdge(_) => "Canny Edge",
            VisionNode::Mask(_) => "Binary Mask",
            VisionNode::FindContours(_) => "Find Contours",
            VisionNode::FilterContoursByArea(_) => "Filter Contours By Area",
        }
    }

    pub fn category(&self) -> Category {
        match self {
            VisionNode::InputSource(_) | VisionNode::PipelineOutput(_) => Category::Flow,
            VisionNode::CvtColor(_)
            | VisionNode::Blur(_)
            | VisionNode::Threshold(_)
            | VisionNode::CannyEdge(_)
            | VisionNode::Mask(_) => Category::ImageProc,
            VisionNode::FindContours(_) => Category::FeatureDet,
            VisionNode::FilterContoursByArea(_) => Category::Classification,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            VisionNode::InputSource(_) => "The camera frame entering the pipeline",
            VisionNode::PipelineOutput(_) => "The frame returned from the pipeline",
            VisionNode::CvtColor(_) => "Converts a Mat between color spaces",
            VisionNode::Blur(_) => "Gaussian-blurs a Mat",
            VisionNode::Threshold(_) => "Thresholds a Mat to a binary image by channel ranges",
            VisionNode::CannyEdge(_) => "Detects edges on a grayscale Mat",
            VisionNode::Mask(_) => "Applies a binary mask to a Mat",
            VisionNode::FindContours(_) => "Finds contours on a binary Mat",
            VisionNode::FilterContoursByArea(_) => "Keeps contours whose area is within bounds",
        }
    }

    /// Attribute layout of this node type, in declaration order.
    pub fn descriptors(&self) -> &'static [AttributeDescriptor] {
        match self {
            VisionNode::InputSource(_) => input_source::DESCRIPTORS,
            VisionNode::PipelineOutput(_) => pipeline_output::DESCRIPTORS,
            VisionNode::CvtColor(_) => cvt_color::DESCRIPTORS,
            VisionNode::Blur(_) => blur::DESCRIPTORS,
            VisionNode::Threshold(_) => threshold::DESCRIPTORS,
            VisionNode::CannyEdge(_) => canny_edge::DESCRIPTORS,
            VisionNode::Mask(_) => mask::DESCRIPTORS,
            VisionNode::FindContours(_) => find_contours::DESCRIPTORS,
            VisionNode::FilterContoursByArea(_) => filter_contours::DESCRIPTORS,
        }
    }

    /// Whether this node generates only at the end of the pass.
    pub fn gen_at_end(&self) -> bool {
        matches!(self, VisionNode::PipelineOutput(_))
    }

    /// Flow anchors exist once per graph and cannot be deleted by the user.
    pub fn user_deletable(&self) -> bool {
        !matches!(
            self,
            VisionNode::InputSource(_) | VisionNode::PipelineOutput(_)
        )
    }

    pub fn is_input_source(&self) -> bool {
        matches!(self, VisionNode::InputSource(_))
    }

    pub fn is_pipeline_output(&self) -> bool {
        matches!(self, VisionNode::PipelineOutput(_))
    }

    /// Run this node's generator for the pass's language.
    pub fn generate(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        match cg.language.id() {
            LanguageId::Java => match self {
                VisionNode::InputSource(n) => n.generate_java(graph, node, cg),
                VisionNode::PipelineOutput(n) => n.generate_java(graph, node, cg),
                VisionNode::CvtColor(n) => n.generate_java(graph, node, cg),
                VisionNode::Blur(n) => n.generate_java(graph, node, cg),
                VisionNode::Threshold(n) => n.generate_java(graph, node, cg),
                VisionNode::CannyEdge(n) => n.generate_java(graph, node, cg),
                VisionNode::Mask(n) => n.generate_java(graph, node, cg),
                VisionNode::FindContours(n) => n.generate_java(graph, node, cg),
                VisionNode::FilterContoursByArea(n) => n.generate_java(graph, node, cg),
            },
            LanguageId::Python => match self {
                VisionNode::InputSource(n) => n.generate_python(graph, node, cg),
                VisionNode::PipelineOutput(n) => n.generate_python(graph, node, cg),
                VisionNode::CvtColor(n) => n.generate_python(graph, node, cg),
                VisionNode::Blur(n) => n.generate_python(graph, node, cg),
                VisionNode::Threshold(n) => n.generate_python(graph, node, cg),
                VisionNode::CannyEdge(n) => n.generate_python(graph, node, cg),
                VisionNode::Mask(n) => n.generate_python(graph, node, cg),
                VisionNode::FindContours(n) => n.generate_python(graph, node, cg),
                VisionNode::FilterContoursByArea(n) => n.generate_python(graph, node, cg),
            },
        }
    }

    /// Factories for the registry; the flag marks palette visibility.
    pub fn builtin_factories() -> Vec<(fn() -> VisionNode, bool)> {
        vec![
            (|| VisionNode::InputSource(InputSourceNode::default()), false),
            (
                || VisionNode::PipelineOutput(PipelineOutputNode::default()),
                false,
            ),
            (|| VisionNode::CvtColor(CvtColorNode::default()), true),
            (|| VisionNode::Blur(BlurNode::default()), true),
            (|| VisionNode::Threshold(ThresholdNode::default()), true),
            (|| VisionNode::CannyEdge(CannyEdgeNode::default()), true),
            (|| VisionNode::Mask(MaskNode::default()), true),
            (|| VisionNode::FindContours(FindContoursNode::default()), true),
            (
                || VisionNode::FilterContoursByArea(FilterContoursByAreaNode::default()),
                true,
            ),
        ]
    }
}

/// Emit the live-stream call for an output attribute if the user enabled
/// streaming on it. No-op outside instrumented passes.
pub(crate) fn stream_if_enabled(
    previz: bool,
    graph: &Graph,
    attr: AttributeId,
    scope: &mut Scope,
    mat: Value,
    color: Resolvable<ColorSpace>,
) {
    let enabled = graph.attribute(attr).map(|a| a.streaming).unwrap_or(false);
    if enabled {
        scope.stream_frame(previz, attr.0, mat, color);
    }
}

/// Derive a variable-name stem from an upstream value, falling back when
/// the value is not a simple identifier.
pub(crate) fn name_hint(value: &Value, fallback: &str) -> String {
    match &value.expr {
        Expr::Raw(s) if s.chars().all(|c| c.is_alphanumeric() || c == '_') && !s.is_empty() => {
            s.clone()
        }
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tags_are_unique() {
        let factories = VisionNode::builtin_factories();
        let mut tags: Vec<&str> = factories.iter().map(|(f, _)| f().type_tag()).collect();
        let before = tags.len();
        tags.sort();
        tags.dedup();
        assert_eq!(tags.len(), before);
    }

    #[test]
    fn test_anchors_are_not_deletable() {
        assert!(!VisionNode::InputSource(InputSourceNode::default()).user_deletable());
        assert!(!VisionNode::PipelineOutput(PipelineOutputNode::default()).user_deletable());
        assert!(VisionNode::Blur(BlurNode::default()).user_deletable());
    }

    #[test]
    fn test_serde_tagging_round_trip() {
        let node = VisionNode::CvtColor(CvtColorNode {
            target: ColorSpace::Gray,
        });
        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"type\":\"cvt_color\""));

        let back: VisionNode = serde_json::from_str(&json).unwrap();
        match back {
            VisionNode::CvtColor(n) => assert_eq!(n.target, ColorSpace::Gray),
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn test_name_hint() {
        let raw = Value::raw(crate::codegen::types::jvm::mat(), "input");
        assert_eq!(name_hint(&raw, "mat"), "input");

        let call = Value::call_static(
            crate::codegen::types::jvm::imgproc(),
            "foo",
            crate::codegen::types::jvm::mat(),
            vec![],
        );
        assert_eq!(name_hint(&call, "mat"), "mat");
    }
}
