//! Pipeline input anchor.
//!
//! The frame handed to the generated pipeline each iteration. Its output
//! resolves to the `input` parameter of the processing method, an RGBA
//! runtime mat; the generation pass starts here.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::{ColorSpace, GenValue, MatValue};
use crate::codegen::types::{jvm, py};
use crate::codegen::value::Value;
use crate::graph::attribute::{AttributeDescriptor, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] =
    &[AttributeDescriptor::output("frame", ValueKind::Mat)];

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputSourceNode {}

impl InputSourceNode {
    pub fn generate_java(
        &self,
        _graph: &Graph,
        node: NodeId,
        _cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        session.set_output(
            output_attr(node),
            GenValue::Mat(MatValue::new(Value::raw(jvm::mat(), "input"), ColorSpace::Rgba)),
        );
        Ok(session)
    }

    pub fn generate_python(
        &self,
        _graph: &Graph,
        node: NodeId,
        _cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        session.set_output(
            output_attr(node),
            GenValue::Mat(MatValue::new(Value::raw(py::none(), "input"), ColorSpace::Rgba)),
        );
        Ok(session)
    }
}
