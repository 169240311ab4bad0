//! Gaussian blur node.

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
    AttributeDescriptor::input("kernel size", ValueKind::Int),
    AttributeDescriptor::output("output", ValueKind::Mat),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn kernel_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 2)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlurNode {
    /// Kernel side length; forced odd at generation time.
    pub kernel_size: i32,
}

impl Default for BlurNode {
    fn default() -> Self {
        Self { kernel_size: 5 }
    }
}

impl BlurNode {
    fn odd_kernel(&self, configured: i64) -> i64 {
        let k = configured.max(1);
        if k % 2 == 0 {
            k + 1
        } else {
            k
        }
    }

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

        let kernel = self.odd_kernel(cg.int_value_or(graph, kernel_attr(node), self.kernel_size)?);

        let hint = name_hint(&input_mat.value, "mat");
        let mat = cg.unique_variable(&format!("{hint}Blur"), Value::new_of(jvm::mat(), vec![]));

        let mut group = Scope::new();
        group.instance(Visibility::Private, &mat, None);
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Blur");
        scope.call(Value::call_static(
            jvm::imgproc(),
            "GaussianBlur",
            std_types::void(),
            vec![
                input_mat.value.clone(),
                mat.value(),
                Value::new_of(
                    jvm::size(),
                    vec![Value::double_of(kernel as f64), Value::double_of(kernel as f64)],
                ),
                Value::double_of(0.0),
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

        let kernel = self.odd_kernel(cg.int_value_or(graph, kernel_attr(node), self.kernel_size)?);

        let hint = name_hint(&input_mat.value, "mat");
        let blurred = Value::call_static(
            py::cv2(),
            "GaussianBlur",
            py::none(),
            vec![
                input_mat.value.clone(),
                Value::raw(py::none(), format!("({kernel}, {kernel})")),
                Value::int_of(0),
            ],
        );
        let mat = cg.unique_variable(&format!("{hint}_blur"), blurred);

        let mut scope = Scope::new();
        scope.comment("Blur");
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
