//! Binary mask application node.
//!
//! Keeps the pixels of the input mat selected by a binary mask. The mask
//! input must be binary, the image input must not be.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::{GenValue, MatValue};
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
    AttributeDescriptor::input("binary mask", ValueKind::Mat),
    AttributeDescriptor::output("output", ValueKind::Mat),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn mask_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 2)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaskNode {}

impl MaskNode {
    pub fn generate_java(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        let input = input_attr(node);
        let mask = mask_attr(node);
        let output = output_attr(node);

        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        let mask_mat = cg.mat_value(graph, mask)?;
        cg.require_binary(&mask_mat, mask)?;

        let hint = name_hint(&input_mat.value, "mat");
        let out = cg.unique_variable(&format!("{hint}Mask"), Value::new_of(jvm::mat(), vec![]));

        let mut group = Scope::new();
        group.instance(Visibility::Private, &out, None);
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Binary Mask");
        scope.call(out.value().call_instance("release", std_types::void(), vec![]));
        scope.call(Value::call_static(
            jvm::core(),
            "bitwise_and",
            std_types::void(),
            vec![
                input_mat.value.clone(),
                input_mat.value.clone(),
                out.value(),
                mask_mat.value,
            ],
        ));
        stream_if_enabled(
            cg.previz,
            graph,
            output,
            &mut scope,
            out.value(),
            input_mat.color,
        );
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue {
                value: out.value(),
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
        let mask = mask_attr(node);
        let output = output_attr(node);

        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        let mask_mat = cg.mat_value(graph, mask)?;
        cg.require_binary(&mask_mat, mask)?;

        let hint = name_hint(&input_mat.value, "mat");
        let out = cg.unique_variable(
            &format!("{hint}_mask"),
            Value::call_static(
                py::cv2(),
                "bitwise_and",
                py::none(),
                vec![
                    input_mat.value.clone(),
                    input_mat.value.clone(),
                    Value::named_arg("mask", mask_mat.value),
                ],
            ),
        );

        let mut scope = Scope::new();
        scope.comment("Binary Mask");
        scope.local(&out);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue {
                value: out.value(),
                color: input_mat.color,
                binary: input_mat.binary,
            }),
        );
        Ok(session)
    }
}
