//! In-range color threshold node.
//!
//! Thresholds in a selectable color space, inserting its own conversion
//! when the incoming mat is not already in that space. The output is a
//! binary GRAY mat. Threshold bounds become public tunable variables so an
//! instrumented pass can adjust them live.

use crate::codegen::context::{CodeGen, Session};
use crate::codegen::error::GenError;
use crate::codegen::genvalue::{ColorSpace, GenValue, MatValue, Range, ScalarRange};
use crate::codegen::resolvable::Resolvable;
use crate::codegen::scope::{Scope, Visibility};
use crate::codegen::types::{jvm, py, std_types};
use crate::codegen::value::{Expr, Value};
use crate::graph::attribute::{AttributeDescriptor, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use crate::nodes::stream_if_enabled;
use serde::{Deserialize, Serialize};

pub static DESCRIPTORS: &[AttributeDescriptor] = &[
    AttributeDescriptor::input("input", ValueKind::Mat),
    AttributeDescriptor::input("threshold", ValueKind::ScalarRange),
    AttributeDescriptor::output("binary output", ValueKind::Mat),
];

pub fn input_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 0)
}

pub fn range_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 1)
}

pub fn output_attr(node: NodeId) -> AttributeId {
    AttributeId::new(node, 2)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdNode {
    pub color_space: ColorSpace,
    pub range: ScalarRange,
}

impl Default for ThresholdNode {
    fn default() -> Self {
        Self {
            color_space: ColorSpace::Hsv,
            range: ScalarRange {
                a: Range::new(0.0, 255.0),
                b: Range::new(0.0, 255.0),
                c: Range::new(0.0, 255.0),
                d: Range::new(0.0, 255.0),
            },
        }
    }
}

impl ThresholdNode {
    fn scalar_values(range: [Range; 4], pick_min: bool) -> Vec<Value> {
        range
            .iter()
            .map(|r| Value::double_of(if pick_min { r.min } else { r.max }))
            .collect()
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

        let range = cg.scalar_range_value_or(graph, range_attr(node), self.range)?;
        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        let target = self.color_space;
        let channels = [range.a, range.b, range.c, range.d];
        let needs_cvt = input_mat.color.now() != Some(&target);

        let cvt_mat = needs_cvt.then(|| {
            cg.unique_variable(
                &format!("{}Mat", target.variable_name()),
                Value::new_of(jvm::mat(), vec![]),
            )
        });
        let threshold_mat = cg.unique_variable(
            &format!("{}BinaryMat", target.variable_name()),
            Value::new_of(jvm::mat(), vec![]),
        );

        let lower = cg.unique_variable(
            &format!("lower{}", target.constant_name()),
            Value::new_of(jvm::scalar(), Self::scalar_values(channels, true)),
        );
        let upper = cg.unique_variable(
            &format!("upper{}", target.constant_name()),
            Value::new_of(jvm::scalar(), Self::scalar_values(channels, false)),
        );

        let mut group = Scope::new();
        group.instance(
            Visibility::Public,
            &lower,
            Some(format!("{}:lower", node.0)),
        );
        group.instance(
            Visibility::Public,
            &upper,
            Some(format!("{}:upper", node.0)),
        );
        if let Some(cvt_mat) = &cvt_mat {
            group.instance(Visibility::Private, cvt_mat, None);
        }
        group.instance(Visibility::Private, &threshold_mat, None);
        cg.append_class_start(group);

        let mut scope = Scope::new();
        scope.comment("Color Threshold");
        let source = match &cvt_mat {
            Some(cvt_mat) => {
                scope.convert_or_copy(input_mat.value.clone(), cvt_mat, input_mat.color, target);
                cvt_mat.value()
            }
            None => input_mat.value.clone(),
        };
        scope.call(Value::call_static(
            jvm::core(),
            "inRange",
            std_types::void(),
            vec![source, lower.value(), upper.value(), threshold_mat.value()],
        ));
        stream_if_enabled(
            cg.previz,
            graph,
            output,
            &mut scope,
            threshold_mat.value(),
            Resolvable::Now(ColorSpace::Gray),
        );
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue::binary_of(threshold_mat.value(), ColorSpace::Gray)),
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

        let range = cg.scalar_range_value_or(graph, range_attr(node), self.range)?;
        let input_mat = cg.mat_value(graph, input)?;
        cg.require_non_binary(&input_mat, input)?;

        let target = self.color_space;
        let channels = [range.a, range.b, range.c, range.d];
        let needs_cvt = input_mat.color.now() != Some(&target);

        let mut scope = Scope::new();
        scope.comment("Color Threshold");

        let source = if needs_cvt {
            let converted = Value::new(
                py::none(),
                Expr::ConvertOrCopyValue {
                    source: Box::new(input_mat.value.clone()),
                    from: input_mat.color,
                    to: target,
                },
            );
            let cvt_mat = cg.unique_variable(target.variable_name(), converted);
            scope.local(&cvt_mat);
            cvt_mat.value()
        } else {
            input_mat.value.clone()
        };

        let tuple_of = |pick_min: bool| {
            let parts: Vec<String> = channels
                .iter()
                .map(|r| {
                    let v = if pick_min { r.min } else { r.max };
                    if v.fract() == 0.0 {
                        format!("{v:.1}")
                    } else {
                        format!("{v}")
                    }
                })
                .collect();
            Value::raw(py::none(), format!("({})", parts.join(", ")))
        };

        let threshold_mat = cg.unique_variable(
            &format!("{}_thresh", target.variable_name()),
            Value::call_static(
                py::cv2(),
                "inRange",
                py::none(),
                vec![source, tuple_of(true), tuple_of(false)],
            ),
        );
        scope.local(&threshold_mat);
        cg.append_process_frame(scope);

        session.set_output(
            output,
            GenValue::Mat(MatValue::binary_of(threshold_mat.value(), ColorSpace::Gray)),
        );
        Ok(session)
    }
}
