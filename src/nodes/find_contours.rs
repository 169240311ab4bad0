//! Contour detection node.
//!
//! Produces a runtime list of contours from a binary mat.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::GenValue;
use crate::codegen::scope::{Scope, Visibility};
use crate::codegen::types::{jvm, py, std_types};
use crate::codegen::value::Value;
use crate::graph::attribute::{AttributeDescriptor, ElementKind, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] = &[
    AttributeDescriptor::input("binary input", ValueKind::Mat),
    AttributeDescriptor::output("contours", ValueKind::List(ElementKind::Points)),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindContoursNode {}

impl FindContoursNode {
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
        cg.require_binary(&input_mat, input)?;

        let list = cg.unique_variable(
            "contours",
            Value::new_of(jvm::array_list(jvm::mat_of_point()), vec![]),
        );
        let hierarchy = cg.unique_variable("hierarchy", Value::new_of(jvm::mat(), vec![]));

        let mut group = Scope::new();
        group.instance(Visibility::Private, &list, None);
        group.instance(Visibility::Private, &hierarchy, None);
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Find Contours");
        scope.call(list.value().call_instance("clear", std_types::void(), vec![]));
        scope.call(
            hierarchy
                .value()
                .call_instance("release", std_types::void(), vec![]),
        );
        scope.call(Value::call_static(
            jvm::imgproc(),
            "findContours",
            std_types::void(),
            vec![
                input_mat.value,
                list.value(),
                hierarchy.value(),
                Value::raw(std_types::int(), "Imgproc.RETR_EXTERNAL"),
                Value::raw(std_types::int(), "Imgproc.CHAIN_APPROX_SIMPLE"),
            ],
        ));
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::RuntimeList {
                element: ElementKind::Points,
                value: list.value(),
            },
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
        cg.require_binary(&input_mat, input)?;

        let contours_name = cg.unique_name("contours");
        let hierarchy_name = cg.unique_name("hierarchy");

        // Tuple unpacking: `contours, hierarchy = cv2.findContours(...)`.
        let result = cg.unique_variable(
            &format!("{contours_name}, {hierarchy_name}"),
            Value::call_static(
                py::cv2(),
                "findContours",
                py::none(),
                vec![
                    input_mat.value,
                    Value::raw(py::none(), "cv2.RETR_EXTERNAL"),
                    Value::raw(py::none(), "cv2.CHAIN_APPROX_SIMPLE"),
                ],
            ),
        );

        let mut scope = Scope::new();
        scope.comment("Find Contours");
        scope.local(&result);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::RuntimeList {
                element: ElementKind::Points,
                value: Value::raw(py::none(), contours_name),
            },
        );
        Ok(session)
    }
}
