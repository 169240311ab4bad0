//! Python backend targeting a flat `runPipeline` function.

use crate::codegen::context::CompiledUnit;
use crate::codegen::error::GenError;
use crate::codegen::genvalue::ColorSpace;
use crate::codegen::languages::{
    collect_scope_imports, cvt_color_pair, render_scope_lines, ImportBuilder, Language, LanguageId,
};
use crate::codegen::scope::Visibility;
use crate::codegen::types::Type;
use crate::codegen::value::{BinOp, Variable};
use std::collections::BTreeSet;

pub struct PythonLanguage;

impl Language for PythonLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Python
    }

    fn name(&self) -> &'static str {
        "Python"
    }

    fn file_extension(&self) -> &'static str {
        "py"
    }

    fn bool_literal(&self, v: bool) -> String {
        if v { "True" } else { "False" }.to_string()
    }

    fn long_literal(&self, v: i64) -> String {
        v.to_string()
    }

    fn float_literal(&self, v: f32) -> String {
        format!("{v}")
    }

    fn double_literal(&self, v: f64) -> String {
        if v.fract() == 0.0 && v.is_finite() {
            format!("{v:.1}")
        } else {
            format!("{v}")
        }
    }

    fn null_literal(&self) -> String {
        "None".to_string()
    }

    fn new_expr(&self, ty: &Type, args: &str) -> String {
        format!("{}({})", ty.name, args)
    }

    fn cast_expr(&self, _ty: &Type, inner: &str) -> String {
        inner.to_string()
    }

    fn array_literal(&self, _element: &Type, items: &str) -> String {
        format!("[{items}]")
    }

    fn named_arg(&self, name: &str, value: &str) -> String {
        format!("{name}={value}")
    }

    fn binop(&self, op: BinOp) -> &'static str {
        match op {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }

    fn not_expr(&self, inner: &str) -> String {
        format!("not ({inner})")
    }

    fn cvt_color_code(&self, from: ColorSpace, to: ColorSpace) -> String {
        let (a, b) = cvt_color_pair(from, to);
        format!("cv2.COLOR_{a}2{b}")
    }

    fn cvt_color_imports(&self) -> Vec<Type> {
        vec![crate::codegen::types::py::cv2()]
    }

    fn convert_or_copy_value(
        &self,
        source: &str,
        from: ColorSpace,
        to: ColorSpace,
    ) -> Result<String, GenError> {
        Ok(if from != to {
            format!("cv2.cvtColor({source}, {})", self.cvt_color_code(from, to))
        } else {
            format!("{source}.copy()")
        })
    }

    fn local_variable(&self, variable: &Variable, initial: Option<&str>) -> String {
        match initial {
            Some(init) => format!("{} = {}", variable.name, init),
            None => format!("{} = None", variable.name),
        }
    }

    fn instance_variable(
        &self,
        _vis: Visibility,
        variable: &Variable,
        initial: Option<&str>,
        _label: Option<&str>,
    ) -> Vec<String> {
        vec![self.local_variable(variable, initial)]
    }

    fn set_statement(&self, target: &str, value: &str) -> String {
        format!("{target} = {value}")
    }

    fn indexed_set_statement(&self, target: &str, index: &str, value: &str) -> String {
        format!("{target}[{index}] = {value}")
    }

    fn instance_set_statement(&self, target: &str, value: &str) -> String {
        format!("{target} = {value}")
    }

    fn expression_statement(&self, expr: &str) -> String {
        expr.to_string()
    }

    fn comment(&self, text: &str) -> Vec<String> {
        text.lines().map(|line| format!("# {line}")).collect()
    }

    fn return_statement(&self, value: Option<&str>) -> String {
        match value {
            Some(v) => format!("return {v}"),
            None => "return".to_string(),
        }
    }

    fn if_header(&self, condition: &str) -> String {
        format!("if {condition}")
    }

    fn while_header(&self, condition: &str) -> String {
        format!("while {condition}")
    }

    fn for_header(
        &self,
        variable: &Variable,
        start: &str,
        end: &str,
        step: Option<&str>,
    ) -> String {
        match step {
            Some(step) => format!(
                "for {} in range({}, {}, {})",
                variable.name, start, end, step
            ),
            None => format!("for {} in range({}, {})", variable.name, start, end),
        }
    }

    fn foreach_header(&self, variable: &Variable, iterable: &str) -> String {
        format!("for {} in {}", variable.name, iterable)
    }

    fn block_lines(&self, header: &str, body: Vec<String>, indent: usize) -> Vec<String> {
        let tabs = "\t".repeat(indent);
        let mut lines = Vec::with_capacity(body.len() + 1);
        lines.push(format!("{tabs}{}:", header.trim()));
        if body.iter().all(|line| line.trim().is_empty()) {
            lines.push(format!("{tabs}\tpass"));
        } else {
            lines.extend(body);
        }
        lines
    }

    fn wraps_bare_blocks(&self) -> bool {
        false
    }

    fn method_declaration(
        &self,
        _vis: Visibility,
        _return_type: &Type,
        name: &str,
        params: &[(Type, &str)],
        _is_override: bool,
    ) -> Vec<String> {
        let params: Vec<&str> = params.iter().map(|(_, name)| *name).collect();
        vec![format!("def {}({})", name, params.join(", "))]
    }

    fn class_declaration(
        &self,
        _vis: Visibility,
        _name: &str,
        _extends: Option<&Type>,
    ) -> Result<String, GenError> {
        // The pipeline renders as a flat function on this target.
        Err(GenError::Render(
            "class declarations are not supported in Python".to_string(),
        ))
    }

    fn enum_table_declaration(&self, name: &str, values: &[String]) -> String {
        let entries: Vec<String> = values.iter().map(|v| format!("\"{v}\": \"{v}\"")).collect();
        format!("{} = {{{}}}", name, entries.join(", "))
    }

    fn convert_or_copy_statement(
        &self,
        source: &str,
        dest: &str,
        from: ColorSpace,
        to: ColorSpace,
    ) -> String {
        // Expression form is always available here, so the statement form
        // reduces to an assignment.
        match self.convert_or_copy_value(source, from, to) {
            Ok(value) => format!("{dest} = {value}"),
            Err(_) => unreachable!(),
        }
    }

    fn stream_frame_statement(&self, _id: u32, _mat: &str, _cvt: Option<&str>) -> Option<String> {
        // No live-stream runtime on the Python target.
        None
    }

    fn new_import_builder(&self) -> Box<dyn ImportBuilder> {
        Box::new(PythonImportBuilder::default())
    }

    fn render_unit(&self, unit: &CompiledUnit) -> Result<String, GenError> {
        let mut imports = self.new_import_builder();
        for scope in [
            &unit.class_start,
            &unit.init,
            &unit.process_frame,
            &unit.viewport_tapped,
            &unit.class_end,
        ] {
            collect_scope_imports(self, scope, unit.previz, imports.as_mut());
        }

        let mut out = Vec::new();
        let import_lines = imports.build_lines();
        if !import_lines.is_empty() {
            out.extend(import_lines);
            out.push(String::new());
        }

        if !unit.class_start.is_empty() {
            out.extend(render_scope_lines(self, &unit.class_start, 0, unit.previz)?);
            out.push(String::new());
        }
        if !unit.init.is_empty() {
            out.extend(render_scope_lines(self, &unit.init, 0, unit.previz)?);
            out.push(String::new());
        }

        let process_body = render_scope_lines(self, &unit.process_frame, 1, unit.previz)?;
        let header = self
            .method_declaration(
                Visibility::Public,
                &crate::codegen::types::py::none(),
                "runPipeline",
                &[
                    (crate::codegen::types::py::none(), "input"),
                    (crate::codegen::types::py::none(), "llrobot"),
                ],
                false,
            )
            .pop()
            .unwrap_or_default();
        out.extend(self.block_lines(&header, process_body, 0));

        if !unit.class_end.is_empty() {
            out.push(String::new());
            out.extend(render_scope_lines(self, &unit.class_end, 0, unit.previz)?);
        }

        Ok(out.join("\n"))
    }
}

/// Python imports are whole modules; one line per distinct module.
#[derive(Default)]
struct PythonImportBuilder {
    modules: BTreeSet<String>,
}

impl ImportBuilder for PythonImportBuilder {
    fn add(&mut self, ty: &Type) {
        if !ty.module.is_empty() {
            self.modules.insert(ty.module.clone());
        }
    }

    fn build_lines(&self) -> Vec<String> {
        self.modules
            .iter()
            .map(|module| format!("import {module}"))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::py;
    use crate::codegen::value::Value;

    #[test]
    fn test_bool_literals() {
        let lang = PythonLanguage;
        assert_eq!(lang.bool_literal(true), "True");
        assert_eq!(lang.bool_literal(false), "False");
    }

    #[test]
    fn test_convert_or_copy_value() {
        let lang = PythonLanguage;
        assert_eq!(
            lang.convert_or_copy_value("frame", ColorSpace::Rgba, ColorSpace::Gray)
                .unwrap(),
            "cv2.cvtColor(frame, cv2.COLOR_RGB2GRAY)"
        );
        assert_eq!(
            lang.convert_or_copy_value("frame", ColorSpace::Gray, ColorSpace::Gray)
                .unwrap(),
            "frame.copy()"
        );
    }

    #[test]
    fn test_module_imports_deduplicated() {
        let mut builder = PythonImportBuilder::default();
        builder.add(&py::cv2());
        builder.add(&py::cv2());
        assert_eq!(builder.build_lines(), vec!["import cv2"]);
    }

    #[test]
    fn test_local_variable_is_plain_assignment() {
        let lang = PythonLanguage;
        let var = Variable::new("gray", Value::raw(py::none(), "x"));
        assert_eq!(lang.local_variable(&var, Some("x")), "gray = x");
    }

    #[test]
    fn test_method_declaration_ignores_types() {
        let lang = PythonLanguage;
        let lines = lang.method_declaration(
            Visibility::Public,
            &py::none(),
            "runPipeline",
            &[(py::none(), "input"), (py::none(), "llrobot")],
            false,
        );
        assert_eq!(lines, vec!["def runPipeline(input, llrobot)"]);
    }

    #[test]
    fn test_empty_block_gets_pass() {
        let lang = PythonLanguage;
        let lines = lang.block_lines("if x", vec![], 0);
        assert_eq!(lines, vec!["if x:", "\tpass"]);
    }
}
