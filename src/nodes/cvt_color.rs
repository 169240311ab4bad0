//! Color-space conversion node.
//!
//! When the incoming color is known and already matches the target, the
//! upstream mat is reused without emitting anything. When the incoming
//! color is still deferred, a convert-or-copy is emitted and the decision
//! falls to the resolution phase.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::{ColorSpace, GenValue, MatValue};
use crate::codegen::resolvable::Resolvable;
use crate::codegen::scope::{Scope, Visibility};
use crate::codegen::types::{jvm, py};
use crate::codegen::value::{Expr, Value};
use crate::graph::attribute::{AttributeDescriptor, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use crate::nodes::{name_hint, stream_if_enabled};
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] = &[
    AttributeDescriptor::input("input", ValueKind::Mat),
    AttributeDescriptor::output("output", ValueKind::Mat),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvtColorNode {
    pub target: ColorSpace,
}

impl Default for CvtColorNode {
    fn default() -> Self {
        Self {
            target: ColorSpace::Rgb,
        }
    }
}

impl CvtColorNode {
    pub fn generate_java(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        let input = input_attr(node);
        let output = output_attr(node);

        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        if input_mat.color.now() == Some(&self.target) {
            // Already the requested color, no processing needed.
            session.set_output(output, GenValue::Mat(input_mat));
            return Ok(session);
        }

        let mat = cg.unique_variable(
            &format!("{}Mat", self.target.variable_name()),
            Value::new_of(jvm::mat(), vec![]),
        );

        let mut group = Scope::new();
        group.instance(Visibility::Private, &mat, None);
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Convert Color");
        scope.convert_or_copy(input_mat.value.clone(), &mat, input_mat.color, self.target);
        stream_if_enabled(
            cg.previz,
            graph,
            output,
            &mut scope,
            mat.value(),
            Resolvable::Now(self.target),
        );
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue::new(mat.value(), self.target)),
        );
        Ok(session)
    }

    pub fn generate_python(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        let input = input_attr(node);
        let output = output_attr(node);

        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        if input_mat.color.now() == Some(&self.target) {
            session.set_output(output, GenValue::Mat(input_mat));
            return Ok(session);
        }

        let hint = name_hint(&input_mat.value, "mat");
        let converted = Value::new(
            py::none(),
            Expr::ConvertOrCopyValue {
                source: Box::new(input_mat.value.clone()),
                from: input_mat.color,
                to: self.target,
            },
        );
        let mat = cg.unique_variable(
            &format!("{}_{}", hint, self.target.variable_name()),
            converted,
        );

        let mut scope = Scope::new();
        scope.comment("Convert Color");
        scope.local(&mat);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue::new(mat.value(), self.target)),
        );
        Ok(session)
    }
}
