//! Java backend targeting an `OpenCvPipeline` subclass.

use crate::codegen::context::CompiledUnit;
use crate::codegen::error::GenError;
use crate::codegen::genvalue::ColorSpace;
use crate::codegen::languages::{
    collect_scope_imports, cvt_color_pair, render_scope_lines, to_valid_identifier, ImportBuilder,
    Language, LanguageId,
};
use crate::codegen::scope::Visibility;
use crate::codegen::types::{jvm, Type};
use crate::codegen::value::{BinOp, Variable};
use std::collections::BTreeMap;

pub struct JavaLanguage;

impl Language for JavaLanguage {
    fn id(&self) -> LanguageId {
        LanguageId::Java
    }

    fn name(&self) -> &'static str {
        "Java"
    }

    fn file_extension(&self) -> &'static str {
        "java"
    }

    fn bool_literal(&self, v: bool) -> String {
        v.to_string()
    }

    fn long_literal(&self, v: i64) -> String {
        format!("{v}L")
    }

    fn float_literal(&self, v: f32) -> String {
        format!("{v}f")
    }

    fn double_literal(&self, v: f64) -> String {
        // Keep the decimal point so the literal stays a double.
        if v.fract() == 0.0 && v.is_finite() {
            format!("{v:.1}")
        } else {
            format!("{v}")
        }
    }

    fn null_literal(&self) -> String {
        "null".to_string()
    }

    fn new_expr(&self, ty: &Type, args: &str) -> String {
        let generics = if ty.generics.is_empty() { "" } else { "<>" };
        format!("new {}{}({})", ty.name, generics, args)
    }

    fn cast_expr(&self, ty: &Type, inner: &str) -> String {
        format!("(({}) ({}))", ty.display_name(), inner)
    }

    fn array_literal(&self, element: &Type, items: &str) -> String {
        format!("new {}[] {{ {} }}", element.name, items)
    }

    fn named_arg(&self, _name: &str, value: &str) -> String {
        value.to_string()
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
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    fn not_expr(&self, inner: &str) -> String {
        format!("!({inner})")
    }

    fn cvt_color_code(&self, from: ColorSpace, to: ColorSpace) -> String {
        let (a, b) = cvt_color_pair(from, to);
        format!("Imgproc.COLOR_{a}2{b}")
    }

    fn cvt_color_imports(&self) -> Vec<Type> {
        vec![jvm::imgproc()]
    }

    fn convert_or_copy_value(
        &self,
        _source: &str,
        _from: ColorSpace,
        _to: ColorSpace,
    ) -> Result<String, GenError> {
        // Java converts in place through Imgproc.cvtColor; a generator
        // asking for the expression form took a Python-only path.
        Err(GenError::Render(
            "conversion has no expression form in Java".to_string(),
        ))
    }

    fn local_variable(&self, variable: &Variable, initial: Option<&str>) -> String {
        match initial {
            Some(init) => format!(
                "{} {} = {};",
                variable.ty.display_name(),
                variable.name,
                init
            ),
            None => format!("{} {};", variable.ty.display_name(), variable.name),
        }
    }

    fn instance_variable(
        &self,
        vis: Visibility,
        variable: &Variable,
        initial: Option<&str>,
        label: Option<&str>,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(label) = label {
            lines.push(format!("@Label(name = \"{label}\")"));
        }
        let ending = match initial {
            Some(init) => format!(" = {init}"),
            None => String::new(),
        };
        lines.push(format!(
            "{} {} {}{};",
            vis.keyword(),
            variable.ty.display_name(),
            variable.name,
            ending
        ));
        lines
    }

    fn set_statement(&self, target: &str, value: &str) -> String {
        format!("{target} = {value};")
    }

    fn indexed_set_statement(&self, target: &str, index: &str, value: &str) -> String {
        format!("{target}[{index}] = {value};")
    }

    fn instance_set_statement(&self, target: &str, value: &str) -> String {
        format!("this.{target} = {value};")
    }

    fn expression_statement(&self, expr: &str) -> String {
        format!("{expr};")
    }

    fn comment(&self, text: &str) -> Vec<String> {
        text.lines().map(|line| format!("// {line}")).collect()
    }

    fn return_statement(&self, value: Option<&str>) -> String {
        match value {
            Some(v) => format!("return {v};"),
            None => "return;".to_string(),
        }
    }

    fn if_header(&self, condition: &str) -> String {
        format!("if({condition})")
    }

    fn while_header(&self, condition: &str) -> String {
        format!("while({condition})")
    }

    fn for_header(
        &self,
        variable: &Variable,
        start: &str,
        end: &str,
        step: Option<&str>,
    ) -> String {
        let step_str = match step {
            None | Some("1") => "++".to_string(),
            Some(s) => format!(" += {s}"),
        };
        format!(
            "for({} {} = {} ; {} < {} ; {}{})",
            variable.ty.display_name(),
            variable.name,
            start,
            variable.name,
            end,
            variable.name,
            step_str
        )
    }

    fn foreach_header(&self, variable: &Variable, iterable: &str) -> String {
        format!(
            "for({} {} : {})",
            variable.ty.display_name(),
            variable.name,
            iterable
        )
    }

    fn block_lines(&self, header: &str, body: Vec<String>, indent: usize) -> Vec<String> {
        let tabs = "\t".repeat(indent);
        let mut lines = Vec::with_capacity(body.len() + 2);
        if header.is_empty() {
            lines.push(format!("{tabs}{{"));
        } else {
            lines.push(format!("{tabs}{} {{", header.trim()));
        }
        lines.extend(body);
        lines.push(format!("{tabs}}}"));
        lines
    }

    fn wraps_bare_blocks(&self) -> bool {
        true
    }

    fn method_declaration(
        &self,
        vis: Visibility,
        return_type: &Type,
        name: &str,
        params: &[(Type, &str)],
        is_override: bool,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        if is_override {
            lines.push("@Override".to_string());
        }
        let params: Vec<String> = params
            .iter()
            .map(|(ty, name)| format!("{} {}", ty.display_name(), name))
            .collect();
        lines.push(format!(
            "{} {} {}({})",
            vis.keyword(),
            return_type.display_name(),
            name,
            params.join(", ")
        ));
        lines
    }

    fn class_declaration(
        &self,
        vis: Visibility,
        name: &str,
        extends: Option<&Type>,
    ) -> Result<String, GenError> {
        let extends = match extends {
            Some(ty) => format!(" extends {}", ty.display_name()),
            None => String::new(),
        };
        Ok(format!("{} class {}{}", vis.keyword(), name, extends))
    }

    fn enum_table_declaration(&self, name: &str, values: &[String]) -> String {
        format!("enum {} {{ {} }}", name, values.join(", "))
    }

    fn convert_or_copy_statement(
        &self,
        source: &str,
        dest: &str,
        from: ColorSpace,
        to: ColorSpace,
    ) -> String {
        if from != to {
            format!(
                "Imgproc.cvtColor({source}, {dest}, {});",
                self.cvt_color_code(from, to)
            )
        } else {
            format!("{source}.copyTo({dest});")
        }
    }

    fn stream_frame_statement(&self, id: u32, mat: &str, cvt: Option<&str>) -> Option<String> {
        Some(match cvt {
            Some(code) => format!("streamFrame({id}, {mat}, {code});"),
            None => format!("streamFrame({id}, {mat}, null);"),
        })
    }

    fn new_import_builder(&self) -> Box<dyn ImportBuilder> {
        Box::new(JavaImportBuilder::default())
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

        let pipeline_class = if unit.previz {
            jvm::streamable_pipeline()
        } else {
            jvm::opencv_pipeline()
        };
        imports.add(&pipeline_class);
        imports.add(&jvm::mat());

        let mut body = Vec::new();
        let push_method = |body: &mut Vec<String>,
                           lang: &JavaLanguage,
                           return_type: &Type,
                           name: &str,
                           params: &[(Type, &str)],
                           method_body: Vec<String>| {
            let mut header_lines = lang
                .method_declaration(Visibility::Public, return_type, name, params, true)
                .into_iter();
            let header = header_lines.next_back().unwrap_or_default();
            for annotation in header_lines {
                body.push(format!("\t{annotation}"));
            }
            body.extend(lang.block_lines(&header, method_body, 1));
        };

        if !unit.class_start.is_empty() {
            body.extend(render_scope_lines(self, &unit.class_start, 1, unit.previz)?);
            body.push(String::new());
        }

        if !unit.init.is_empty() {
            let init_body = render_scope_lines(self, &unit.init, 2, unit.previz)?;
            push_method(
                &mut body,
                self,
                &crate::codegen::types::std_types::void(),
                "init",
                &[(jvm::mat(), "input")],
                init_body,
            );
            body.push(String::new());
        }

        let process_body = render_scope_lines(self, &unit.process_frame, 2, unit.previz)?;
        push_method(
            &mut body,
            self,
            &jvm::mat(),
            "processFrame",
            &[(jvm::mat(), "input")],
            process_body,
        );

        if !unit.viewport_tapped.is_empty() {
            body.push(String::new());
            let tapped_body = render_scope_lines(self, &unit.viewport_tapped, 2, unit.previz)?;
            push_method(
                &mut body,
                self,
                &crate::codegen::types::std_types::void(),
                "onViewportTapped",
                &[],
                tapped_body,
            );
        }

        if !unit.class_end.is_empty() {
            body.push(String::new());
            body.extend(render_scope_lines(self, &unit.class_end, 1, unit.previz)?);
        }

        let mut out = Vec::new();
        let import_lines = imports.build_lines();
        if !import_lines.is_empty() {
            out.extend(import_lines);
            out.push(String::new());
        }

        let class_header = self.class_declaration(
            Visibility::Public,
            &to_valid_identifier(&unit.class_name),
            Some(&pipeline_class),
        )?;
        out.extend(self.block_lines(&class_header, body, 0));

        Ok(out.join("\n"))
    }
}

/// Java import accumulator. A module's imports collapse to a wildcard once
/// more than two distinct symbols are pulled from it.
#[derive(Default)]
struct JavaImportBuilder {
    imports: BTreeMap<String, Vec<String>>,
}

impl ImportBuilder for JavaImportBuilder {
    fn add(&mut self, ty: &Type) {
        if ty.module.is_empty() || ty.module == "java.lang" || ty.name == ty.module {
            return;
        }

        let names = self.imports.entry(ty.module.clone()).or_default();
        if names.len() == 1 && names[0] == "*" {
            return;
        }
        if !names.contains(&ty.name) {
            names.push(ty.name.clone());
        }
        if names.len() > 2 {
            names.clear();
            names.push("*".to_string());
        }
    }

    fn build_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for (module, names) in &self.imports {
            let mut sorted = names.clone();
            sorted.sort();
            for name in sorted {
                lines.push(format!("import {module}.{name};"));
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::value::Value;

    #[test]
    fn test_literals() {
        let lang = JavaLanguage;
        assert_eq!(lang.double_literal(255.0), "255.0");
        assert_eq!(lang.double_literal(0.5), "0.5");
        assert_eq!(lang.long_literal(7), "7L");
        assert_eq!(lang.float_literal(1.5), "1.5f");
    }

    #[test]
    fn test_cvt_color_code() {
        let lang = JavaLanguage;
        assert_eq!(
            lang.cvt_color_code(ColorSpace::Rgba, ColorSpace::Gray),
            "Imgproc.COLOR_RGB2GRAY"
        );
        assert_eq!(
            lang.cvt_color_code(ColorSpace::Rgb, ColorSpace::Hsv),
            "Imgproc.COLOR_RGB2HSV"
        );
    }

    #[test]
    fn test_local_variable_declaration() {
        let lang = JavaLanguage;
        let var = Variable::new("grayMat", Value::new_of(jvm::mat(), vec![]));
        assert_eq!(
            lang.local_variable(&var, Some("new Mat()")),
            "Mat grayMat = new Mat();"
        );
    }

    #[test]
    fn test_import_wildcard_collapse() {
        let mut builder = JavaImportBuilder::default();
        builder.add(&jvm::mat());
        builder.add(&jvm::scalar());
        assert_eq!(builder.build_lines().len(), 2);

        builder.add(&jvm::core());
        let lines = builder.build_lines();
        assert_eq!(lines, vec!["import org.opencv.core.*;"]);
    }

    #[test]
    fn test_method_declaration_with_override() {
        let lang = JavaLanguage;
        let lines = lang.method_declaration(
            Visibility::Public,
            &jvm::mat(),
            "processFrame",
            &[(jvm::mat(), "input")],
            true,
        );
        assert_eq!(lines, vec!["@Override", "public Mat processFrame(Mat input)"]);
    }

    #[test]
    fn test_enum_table_declaration() {
        let lang = JavaLanguage;
        assert_eq!(
            lang.enum_table_declaration("Mode", &["ON".to_string(), "OFF".to_string()]),
            "enum Mode { ON, OFF }"
        );
    }

    #[test]
    fn test_java_lang_never_imported() {
        let mut builder = JavaImportBuilder::default();
        builder.add(&crate::codegen::types::std_types::string());
        assert!(builder.build_lines().is_empty());
    }
}
