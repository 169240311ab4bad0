//! Canny edge detector node.
//!
//! Requires a non-binary grayscale input; feeding it anything else is a
//! graph error the user fixes by inserting a conversion upstream.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::{ColorSpace, GenValue, MatValue};
use crate::codegen::scope::{Scope, Visibility};
use crate::codegen::types::{jvm, py, std_types};
use crate::codegen::value::Value;
use crate::graph::attribute::{AttributeDescriptor, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use crate::nodes::{name_hint, stream_if_enabled};
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] = &[
    AttributeDescriptor::input("input", ValueKind::Mat),
    AttributeDescriptor::input("lower threshold", ValueKind::Int),
    AttributeDescriptor::input("upper threshold", ValueKind::Int),
    AttributeDescriptor::output("output", ValueKind::Mat),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn lower_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

pub fn upper_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 2)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 3)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannyEdgeNode {
    pub lower_threshold: i32,
    pub upper_threshold: i32,
}

impl Default for CannyEdgeNode {
    fn default() -> Self {
        Self {
            lower_threshold: 100,
            upper_threshold: 200,
        }
    }
}

impl CannyEdgeNode {
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
        cg.require_color(&input_mat, input, ColorSpace::Gray)?;

        let lower = cg.int_value_or(graph, lower_attr(node), self.lower_threshold)?;
        let upper = cg.int_value_or(graph, upper_attr(node), self.upper_threshold)?;

        let hint = name_hint(&input_mat.value, "mat");
        let mat = cg.unique_variable(&format!("{hint}Canny"), Value::new_of(jvm::mat(), vec![]));
        let lower_var = cg.unique_variable("cannyLowerThreshold", Value::int_of(lower));
        let upper_var = cg.unique_variable("cannyUpperThreshold", Value::int_of(upper));

        let mut group = Scope::new();
        group.instance(Visibility::Private, &mat, None);
        group.instance(
            Visibility::Public,
            &lower_var,
            Some(format!("{}:lower", node.0)),
        );
        group.instance(
            Visibility::Public,
            &upper_var,
            Some(format!("{}:upper", node.0)),
        );
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Canny Edge");
        scope.call(Value::call_static(
            jvm::imgproc(),
            "Canny",
            std_types::void(),
            vec![
                input_mat.value.clone(),
                mat.value(),
                lower_var.value(),
                upper_var.value(),
            ],
        ));
        stream_if_enabled(
            cg.previz,
            graph,
            output,
            &mut scope,
            mat.value(),
            input_mat.color,
        );
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue {
                value: mat.value(),
                color: input_mat.color,
                binary: input_mat.binary,
            }),
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
        cg.require_color(&input_mat, input, ColorSpace::Gray)?;

        let lower = cg.int_value_or(graph, lower_attr(node), self.lower_threshold)?;
        let upper = cg.int_value_or(graph, upper_attr(node), self.upper_threshold)?;

        let hint = name_hint(&input_mat.value, "mat");
        let mat = cg.unique_variable(
            &format!("{hint}_canny"),
            Value::call_static(
                py::cv2(),
                "Canny",
                py::none(),
                vec![
                    input_mat.value.clone(),
                    Value::int_of(lower),
                    Value::int_of(upper),
                ],
            ),
        );

        let mut scope = Scope::new();
        scope.comment("Canny Edge");
        scope.local(&mat);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue {
                value: mat.value(),
                color: input_mat.color,
                binary: input_mat.binary,
            }),
        );
        Ok(session)
    }
}
