//! Pipeline output anchor.
//!
//! The designated root of a pass: its input is the frame the generated
//! pipeline returns. Generates at the end of the pass, after the main
//! walk, so every upstream statement is already in place.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::scope::Scope;
use crate::graph::attribute::{AttributeDescriptor, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] =
    &[AttributeDescriptor::input("frame", ValueKind::Mat)];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOutputNode {}

impl PipelineOutputNode {
    pub fn generate_java(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let input = input_attr(node);
        let mat = cg.mat_value(graph, input)?;

        let mut scope = Scope::new();
        scope.stream_frame(cg.previz, input.0, mat.value.clone(), mat.color);
        scope.ret(Some(mat.value));
        cg.append_process_frame(scope);

        Ok(Session::new())
    }

    pub fn generate_python(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let input = input_attr(node);
        let mat = cg.mat_value(graph, input)?;

        let mut scope = Scope::new();
        scope.ret(Some(mat.value));
        cg.append_process_frame(scope);

        Ok(Session::new())
    }
}
