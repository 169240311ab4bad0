//! Contour area filter node.
//!
//! Emits a single loop over the input contour list, conditionally
//! appending survivors within [min, max] area to an output list. Input
//! order is preserved among survivors.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::GenValue;
use crate::codegen::scope::{Scope, Visibility};
use crate::codegen::types::{jvm, py, std_types};
use crate::codegen::value::{Value, Variable};
use crate::graph::attribute::{AttributeDescriptor, ElementKind, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use crate::nodes::name_hint;
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] = &[
    AttributeDescriptor::input("contours", ValueKind::List(ElementKind::Points)),
    AttributeDescriptor::input("min area", ValueKind::Int),
    AttributeDescriptor::input("max area", ValueKind::Int),
    AttributeDescriptor::output("filtered contours", ValueKind::List(ElementKind::Points)),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn min_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

pub fn max_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 2)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 3)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterContoursByAreaNode {
    pub min_area: i32,
    pub max_area: i32,
}

impl Default for FilterContoursByAreaNode {
    fn default() -> Self {
        Self {
            min_area: 0,
            max_area: 100,
        }
    }
}

impl FilterContoursByAreaNode {
    pub fn generate_java(
        &self,
        graph: &Graph,
        node: NodeId,
        cg: &mut CodeGen,
    ) -> Result<Session, GenError> {
        let mut session = Session::new();
        let input = input_attr(node);
        let output = output_attr(node);

        let (element, contours) = cg.runtime_list_value(graph, input)?;
        let min_area = cg.int_value_or(graph, min_attr(node), self.min_area)?;
        let max_area = cg.int_value_or(graph, max_attr(node), self.max_area)?;

        let min_var = cg.unique_variable("minArea", Value::int_of(min_area));
        let max_var = cg.unique_variable("maxArea", Value::int_of(max_area));
        let hint = name_hint(&contours, "contours");
        let out_list = cg.unique_variable(
            &format!("{hint}ByArea"),
            Value::new_of(jvm::array_list(jvm::mat_of_point()), vec![]),
        );

        let mut group = Scope::new();
        group.instance(
            Visibility::Public,
            &min_var,
            Some(format!("{}:min", node.0)),
        );
        group.instance(
            Visibility::Public,
            &max_var,
            Some(format!("{}:max", node.0)),
        );
        group.instance(Visibility::Private, &out_list, None);
        cg.append_class_start(group);

        let contour = Variable::accessor(jvm::mat_of_point(), cg.unique_name("contour"));
        let area = cg.unique_variable(
            "area",
            Value::call_static(
                jvm::imgproc(),
                "contourArea",
                std_types::double(),
                vec![contour.value()],
            ),
        );

        let mut loop_body = Scope::new();
        loop_body.local(&area);

        let mut if_body = Scope::new();
        if_body.call(
            out_list
                .value()
                .call_instance("add", std_types::void(), vec![contour.value()]),
        );
        loop_body.if_condition(
            area.value()
                .ge_than(min_var.value())
                .and_with(area.value().le_than(max_var.value())),
            if_body,
        );

        let mut scope = Scope::new();
        scope.comment("Filter Contours By Area");
        scope.call(
            out_list
                .value()
                .call_instance("clear", std_types::void(), vec![]),
        );
        scope.foreach(&contour, contours, loop_body);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::RuntimeList {
                element,
                value: out_list.value(),
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

        let (element, contours) = cg.runtime_list_value(graph, input)?;
        let min_area = cg.int_value_or(graph, min_attr(node), self.min_area)?;
        let max_area = cg.int_value_or(graph, max_attr(node), self.max_area)?;

        let out_list = cg.unique_variable("by_area_contours", Value::raw(py::none(), "[]"));
        let contour = Variable::accessor(py::none(), cg.unique_name("contour"));
        let area = cg.unique_variable(
            "area",
            Value::call_static(
                py::cv2(),
                "contourArea",
                py::none(),
                vec![contour.value()],
            ),
        );

        let mut loop_body = Scope::new();
        loop_body.local(&area);

        let mut if_body = Scope::new();
        if_body.call(
            out_list
                .value()
                .call_instance("append", py::none(), vec![contour.value()]),
        );
        loop_body.if_condition(
            area.value()
                .ge_than(Value::int_of(min_area))
                .and_with(area.value().le_than(Value::int_of(max_area))),
            if_body,
        );

        let mut scope = Scope::new();
        scope.comment("Filter Contours By Area");
        scope.local(&out_list);
        scope.foreach(&contour, contours, loop_body);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::RuntimeList {
                element,
                value: out_list.value(),
            },
        );
        Ok(session)
    }
}
