//! Language backends.
//!
//! The compiler's backend seam: a `Language` renders the backend-agnostic
//! IR (scopes, statements, values) into one target language's syntax.
//! Adding a new target language means implementing only this trait —
//! nothing in the graph, value-resolution, or propagation layers is
//! language-specific.
//!
//! The shared renderer in this module walks the IR and delegates every
//! syntax decision to the trait. Placeholders must have been resolved
//! before rendering; encountering one here is a defect.

mod java;
mod python;

pub use java::JavaLanguage;
pub use python::PythonLanguage;

use crate::codegen::context::CompiledUnit;
use crate::codegen::error::GenError;
use crate::codegen::genvalue::ColorSpace;
use crate::codegen::resolvable::Resolvable;
use crate::codegen::scope::{Scope, Statement, Visibility};
use crate::codegen::types::Type;
use crate::codegen::value::{BinOp, Expr, Value, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageId {
    Java,
    Python,
}

/// Accumulates the import statements a compiled unit needs. Each backend
/// decides its own statement shape and optimization policy.
pub trait ImportBuilder {
    fn add(&mut self, ty: &Type);
    fn build_lines(&self) -> Vec<String>;
}

/// One target language's concrete syntax.
pub trait Language {
    fn id(&self) -> LanguageId;
    fn name(&self) -> &'static str;
    /// File-extension hint for the generated source.
    fn file_extension(&self) -> &'static str;

    // -- literals --
    fn bool_literal(&self, v: bool) -> String;
    fn int_literal(&self, v: i64) -> String {
        v.to_string()
    }
    fn long_literal(&self, v: i64) -> String;
    fn float_literal(&self, v: f32) -> String;
    fn double_literal(&self, v: f64) -> String;
    fn string_literal(&self, v: &str) -> String {
        format!("\"{v}\"")
    }
    fn null_literal(&self) -> String;

    // -- expressions --
    fn new_expr(&self, ty: &Type, args: &str) -> String;
    fn cast_expr(&self, ty: &Type, inner: &str) -> String;
    fn array_literal(&self, element: &Type, items: &str) -> String;
    fn named_arg(&self, name: &str, value: &str) -> String;
    fn binop(&self, op: BinOp) -> &'static str;
    fn not_expr(&self, inner: &str) -> String;
    /// The conversion constant between two color spaces.
    fn cvt_color_code(&self, from: ColorSpace, to: ColorSpace) -> String;
    /// Types pulled in by a conversion constant.
    fn cvt_color_imports(&self) -> Vec<Type>;
    /// Conversion as an expression yielding the converted mat, used where
    /// the target language builds mats functionally.
    fn convert_or_copy_value(
        &self,
        source: &str,
        from: ColorSpace,
        to: ColorSpace,
    ) -> Result<String, GenError>;

    // -- statements --
    fn local_variable(&self, variable: &Variable, initial: Option<&str>) -> String;
    /// May span multiple lines (annotation + declaration).
    fn instance_variable(
        &self,
        vis: Visibility,
        variable: &Variable,
        initial: Option<&str>,
        label: Option<&str>,
    ) -> Vec<String>;
    fn set_statement(&self, target: &str, value: &str) -> String;
    fn indexed_set_statement(&self, target: &str, index: &str, value: &str) -> String;
    fn instance_set_statement(&self, target: &str, value: &str) -> String;
    fn expression_statement(&self, expr: &str) -> String;
    fn comment(&self, text: &str) -> Vec<String>;
    fn return_statement(&self, value: Option<&str>) -> String;
    fn if_header(&self, condition: &str) -> String;
    fn while_header(&self, condition: &str) -> String;
    fn for_header(&self, variable: &Variable, start: &str, end: &str, step: Option<&str>)
        -> String;
    fn foreach_header(&self, variable: &Variable, iterable: &str) -> String;
    /// Wrap already-indented body lines under a header at `indent`.
    fn block_lines(&self, header: &str, body: Vec<String>, indent: usize) -> Vec<String>;
    /// Whether a bare nested block gets its own delimiters.
    fn wraps_bare_blocks(&self) -> bool;
    /// Method/function header lines (annotations included), without the
    /// body.
    fn method_declaration(
        &self,
        vis: Visibility,
        return_type: &Type,
        name: &str,
        params: &[(Type, &str)],
        is_override: bool,
    ) -> Vec<String>;
    /// Enclosing-type header, for targets that wrap the pipeline in one.
    fn class_declaration(
        &self,
        vis: Visibility,
        name: &str,
        extends: Option<&Type>,
    ) -> Result<String, GenError>;
    /// Constant-table declaration.
    fn enum_table_declaration(&self, name: &str, values: &[String]) -> String;
    /// In-place conversion of `source` into `dest`, or a copy when the
    /// colors already match.
    fn convert_or_copy_statement(
        &self,
        source: &str,
        dest: &str,
        from: ColorSpace,
        to: ColorSpace,
    ) -> String;
    /// The live-stream call; `None` when the target has no stream runtime.
    fn stream_frame_statement(&self, id: u32, mat: &str, cvt: Option<&str>) -> Option<String>;

    // -- imports & assembly --
    fn new_import_builder(&self) -> Box<dyn ImportBuilder>;
    /// Assemble the named scopes into one source document.
    fn render_unit(&self, unit: &CompiledUnit) -> Result<String, GenError>;
}

/// Map a requested pipeline name onto a valid identifier.
pub fn to_valid_identifier(name: &str) -> String {
    let mut out = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else if c == ' ' || c == '-' {
            out.push('_');
        }
    }
    if out.is_empty() {
        return "Pipeline".to_string();
    }
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// The OpenCV conversion-constant name pair, with the RGBA and Lab
/// spelling adjustments the constants require.
pub(crate) fn cvt_color_pair(from: ColorSpace, to: ColorSpace) -> (String, String) {
    let mut a = from.constant_name().to_string();
    let mut b = to.constant_name().to_string();

    if from == ColorSpace::Rgba && to != ColorSpace::Rgb {
        a = "RGB".to_string();
    } else if from != ColorSpace::Rgb && to == ColorSpace::Rgba {
        b = "RGB".to_string();
    }

    if from == ColorSpace::Lab {
        a = "Lab".to_string();
    }
    if to == ColorSpace::Lab {
        b = "Lab".to_string();
    }

    (a, b)
}

fn csv(lang: &dyn Language, values: &[Value]) -> Result<String, GenError> {
    let parts: Result<Vec<String>, GenError> =
        values.iter().map(|v| render_value(lang, v)).collect();
    Ok(parts?.join(", "))
}

/// Render one value tree to source text.
pub fn render_value(lang: &dyn Language, value: &Value) -> Result<String, GenError> {
    Ok(match &value.expr {
        Expr::Raw(s) => s.clone(),
        Expr::Bool(v) => lang.bool_literal(*v),
        Expr::Int(v) => lang.int_literal(*v),
        Expr::Long(v) => lang.long_literal(*v),
        Expr::Float(v) => lang.float_literal(*v),
        Expr::Double(v) => lang.double_literal(*v),
        Expr::Str(v) => lang.string_literal(v),
        Expr::Null => lang.null_literal(),
        Expr::Placeholder(id) => return Err(GenError::UnresolvedPlaceholder(*id)),
        Expr::New { ty, args } => lang.new_expr(ty, &csv(lang, args)?),
        Expr::CallFree { name, args } => format!("{}({})", name, csv(lang, args)?),
        Expr::CallStatic { on, name, args } => {
            format!("{}.{}({})", on.name, name, csv(lang, args)?)
        }
        Expr::CallInstance { on, name, args } => {
            format!("{}.{}({})", render_value(lang, on)?, name, csv(lang, args)?)
        }
        Expr::Property { of, name } => format!("{}.{}", render_value(lang, of)?, name),
        Expr::Index { of, index } => format!(
            "{}[{}]",
            render_value(lang, of)?,
            render_value(lang, index)?
        ),
        Expr::Cast { to, of } => lang.cast_expr(to, &render_value(lang, of)?),
        Expr::Binary { op, lhs, rhs } => {
            let l = render_value(lang, lhs)?;
            let r = render_value(lang, rhs)?;
            let op_str = lang.binop(*op);
            if matches!(op, BinOp::And | BinOp::Or) {
                format!("({l}) {op_str} ({r})")
            } else {
                format!("{l} {op_str} {r}")
            }
        }
        Expr::Not(inner) => lang.not_expr(&render_value(lang, inner)?),
        Expr::ArrayLit { element, items } => lang.array_literal(element, &csv(lang, items)?),
        Expr::NamedArg { name, value } => lang.named_arg(name, &render_value(lang, value)?),
        Expr::CvtColorCode { from, to } => {
            let from = *from
                .now()
                .ok_or_else(|| unresolved_color_defect(from))?;
            lang.cvt_color_code(from, *to)
        }
        Expr::ConvertOrCopyValue { source, from, to } => {
            let from = *from
                .now()
                .ok_or_else(|| unresolved_color_defect(from))?;
            lang.convert_or_copy_value(&render_value(lang, source)?, from, *to)?
        }
    })
}

fn unresolved_color_defect(color: &Resolvable<ColorSpace>) -> GenError {
    match color {
        Resolvable::Deferred(id) => GenError::UnresolvedPlaceholder(*id),
        // Unreachable: Now colors never produce this defect.
        Resolvable::Now(_) => GenError::Render("color was already resolved".to_string()),
    }
}

fn indent_str(indent: usize) -> String {
    "\t".repeat(indent)
}

/// Render a scope as fully-indented source lines.
pub fn render_scope_lines(
    lang: &dyn Language,
    scope: &Scope,
    indent: usize,
    previz: bool,
) -> Result<Vec<String>, GenError> {
    let tabs = indent_str(indent);
    let mut lines = Vec::new();

    for statement in scope.statements() {
        match statement {
            Statement::LocalVariable(variable) => {
                let initial = match &variable.initial {
                    Some(v) => Some(render_value(lang, v)?),
                    None => None,
                };
                lines.push(format!(
                    "{tabs}{}",
                    lang.local_variable(variable, initial.as_deref())
                ));
            }
            Statement::InstanceVariable {
                vis,
                variable,
                label,
            } => {
                let initial = match &variable.initial {
                    Some(v) => Some(render_value(lang, v)?),
                    None => None,
                };
                let label = if previz { label.as_deref() } else { None };
                for line in lang.instance_variable(*vis, variable, initial.as_deref(), label) {
                    lines.push(format!("{tabs}{line}"));
                }
            }
            Statement::Set { target, value } => {
                lines.push(format!(
                    "{tabs}{}",
                    lang.set_statement(&target.name, &render_value(lang, value)?)
                ));
            }
            Statement::IndexedSet {
                target,
                index,
                value,
            } => {
                lines.push(format!(
                    "{tabs}{}",
                    lang.indexed_set_statement(
                        &target.name,
                        &render_value(lang, index)?,
                        &render_value(lang, value)?
                    )
                ));
            }
            Statement::InstanceSet { target, value } => {
                lines.push(format!(
                    "{tabs}{}",
                    lang.instance_set_statement(&target.name, &render_value(lang, value)?)
                ));
            }
            Statement::Call(value) => {
                lines.push(format!(
                    "{tabs}{}",
                    lang.expression_statement(&render_value(lang, value)?)
                ));
            }
            Statement::If { condition, body } => {
                let header = lang.if_header(&render_value(lang, condition)?);
                let body_lines = render_scope_lines(lang, body, indent + 1, previz)?;
                lines.extend(lang.block_lines(&header, body_lines, indent));
            }
            Statement::While { condition, body } => {
                let header = lang.while_header(&render_value(lang, condition)?);
                let body_lines = render_scope_lines(lang, body, indent + 1, previz)?;
                lines.extend(lang.block_lines(&header, body_lines, indent));
            }
            Statement::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let step = match step {
                    Some(s) => Some(render_value(lang, s)?),
                    None => None,
                };
                let header = lang.for_header(
                    variable,
                    &render_value(lang, start)?,
                    &render_value(lang, end)?,
                    step.as_deref(),
                );
                let body_lines = render_scope_lines(lang, body, indent + 1, previz)?;
                lines.extend(lang.block_lines(&header, body_lines, indent));
            }
            Statement::Foreach {
                variable,
                iterable,
                body,
            } => {
                let header = lang.foreach_header(variable, &render_value(lang, iterable)?);
                let body_lines = render_scope_lines(lang, body, indent + 1, previz)?;
                lines.extend(lang.block_lines(&header, body_lines, indent));
            }
            Statement::Block(body) => {
                if lang.wraps_bare_blocks() {
                    let body_lines = render_scope_lines(lang, body, indent + 1, previz)?;
                    lines.extend(lang.block_lines("", body_lines, indent));
                } else {
                    lines.extend(render_scope_lines(lang, body, indent, previz)?);
                }
            }
            Statement::Comment(text) => {
                for line in lang.comment(text) {
                    lines.push(format!("{tabs}{line}"));
                }
            }
            Statement::Return(value) => {
                let rendered = match value {
                    Some(v) => Some(render_value(lang, v)?),
                    None => None,
                };
                lines.push(format!("{tabs}{}", lang.return_statement(rendered.as_deref())));
            }
            Statement::Separator => lines.push(String::new()),
            Statement::EnumTable { name, values } => {
                lines.push(format!("{tabs}{}", lang.enum_table_declaration(name, values)));
            }
            Statement::StreamFrame { id, mat, color } => {
                let color = *color
                    .now()
                    .ok_or_else(|| unresolved_color_defect(color))?;
                let cvt = if color != ColorSpace::Rgb {
                    Some(lang.cvt_color_code(color, ColorSpace::Rgb))
                } else {
                    None
                };
                if let Some(line) =
                    lang.stream_frame_statement(*id, &render_value(lang, mat)?, cvt.as_deref())
                {
                    lines.push(format!("{tabs}{line}"));
                }
            }
            Statement::ConvertOrCopy {
                source,
                dest,
                from,
                to,
            } => {
                let from = *from
                    .now()
                    .ok_or_else(|| unresolved_color_defect(from))?;
                lines.push(format!(
                    "{tabs}{}",
                    lang.convert_or_copy_statement(
                        &render_value(lang, source)?,
                        &dest.name,
                        from,
                        *to
                    )
                ));
            }
        }
    }
    Ok(lines)
}

/// Register every import a scope requires with `builder`.
pub fn collect_scope_imports(
    lang: &dyn Language,
    scope: &Scope,
    previz: bool,
    builder: &mut dyn ImportBuilder,
) {
    fn add_type(ty: &Type, builder: &mut dyn ImportBuilder) {
        builder.add(ty);
        for generic in &ty.generics {
            add_type(generic, builder);
        }
    }

    fn walk_value(lang: &dyn Language, value: &Value, builder: &mut dyn ImportBuilder) {
        match &value.expr {
            Expr::New { ty, args } => {
                add_type(ty, builder);
                for arg in args {
                    walk_value(lang, arg, builder);
                }
            }
            Expr::CallStatic { on, args, .. } => {
                add_type(on, builder);
                for arg in args {
                    walk_value(lang, arg, builder);
                }
            }
            Expr::CallFree { args, .. } => {
                for arg in args {
                    walk_value(lang, arg, builder);
                }
            }
            Expr::CallInstance { on, args, .. } => {
                walk_value(lang, on, builder);
                for arg in args {
                    walk_value(lang, arg, builder);
                }
            }
            Expr::Property { of, .. } | Expr::Not(of) => walk_value(lang, of, builder),
            Expr::Cast { to, of } => {
                add_type(to, builder);
                walk_value(lang, of, builder);
            }
            Expr::Index { of, index } => {
                walk_value(lang, of, builder);
                walk_value(lang, index, builder);
            }
            Expr::Binary { lhs, rhs, .. } => {
                walk_value(lang, lhs, builder);
                walk_value(lang, rhs, builder);
            }
            Expr::ArrayLit { element, items } => {
                add_type(element, builder);
                for item in items {
                    walk_value(lang, item, builder);
                }
            }
            Expr::NamedArg { value, .. } => walk_value(lang, value, builder),
            Expr::CvtColorCode { .. } | Expr::ConvertOrCopyValue { .. } => {
                for ty in lang.cvt_color_imports() {
                    add_type(&ty, builder);
                }
                if let Expr::ConvertOrCopyValue { source, .. } = &value.expr {
                    walk_value(lang, source, builder);
                }
            }
            _ => {}
        }
    }

    let walk_variable = |variable: &Variable, builder: &mut dyn ImportBuilder| {
        add_type(&variable.ty, builder);
        if let Some(initial) = &variable.initial {
            walk_value(lang, initial, builder);
        }
    };

    for statement in scope.statements() {
        match statement {
            Statement::LocalVariable(variable) => walk_variable(variable, builder),
            Statement::InstanceVariable { variable, label, .. } => {
                walk_variable(variable, builder);
                if previz && label.is_some() {
                    add_type(&crate::codegen::types::jvm::label_annotation(), builder);
                }
            }
            Statement::Set { value, .. } | Statement::InstanceSet { value, .. } => {
                walk_value(lang, value, builder)
            }
            Statement::IndexedSet { index, value, .. } => {
                walk_value(lang, index, builder);
                walk_value(lang, value, builder);
            }
            Statement::Call(value) => walk_value(lang, value, builder),
            Statement::If { condition, body } | Statement::While { condition, body } => {
                walk_value(lang, condition, builder);
                collect_scope_imports(lang, body, previz, builder);
            }
            Statement::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                add_type(&variable.ty, builder);
                walk_value(lang, start, builder);
                walk_value(lang, end, builder);
                if let Some(step) = step {
                    walk_value(lang, step, builder);
                }
                collect_scope_imports(lang, body, previz, builder);
            }
            Statement::Foreach {
                variable,
                iterable,
                body,
            } => {
                add_type(&variable.ty, builder);
                walk_value(lang, iterable, builder);
                collect_scope_imports(lang, body, previz, builder);
            }
            Statement::Block(body) => collect_scope_imports(lang, body, previz, builder),
            Statement::Return(Some(value)) => walk_value(lang, value, builder),
            Statement::StreamFrame { mat, color, .. } => {
                walk_value(lang, mat, builder);
                if color.now() != Some(&ColorSpace::Rgb) {
                    for ty in lang.cvt_color_imports() {
                        add_type(&ty, builder);
                    }
                }
            }
            Statement::ConvertOrCopy {
                source,
                dest,
                from,
                to,
            } => {
                walk_value(lang, source, builder);
                add_type(&dest.ty, builder);
                if from.now() != Some(to) {
                    for ty in lang.cvt_color_imports() {
                        add_type(&ty, builder);
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_valid_identifier() {
        assert_eq!(to_valid_identifier("My Pipeline"), "My_Pipeline");
        assert_eq!(to_valid_identifier("3stage"), "_3stage");
        assert_eq!(to_valid_identifier("!!!"), "Pipeline");
    }

    #[test]
    fn test_cvt_color_pair_rgba_adjustment() {
        let (a, b) = cvt_color_pair(ColorSpace::Rgba, ColorSpace::Gray);
        assert_eq!((a.as_str(), b.as_str()), ("RGB", "GRAY"));

        let (a, b) = cvt_color_pair(ColorSpace::Rgba, ColorSpace::Rgb);
        assert_eq!((a.as_str(), b.as_str()), ("RGBA", "RGB"));
    }

    #[test]
    fn test_cvt_color_pair_lab_spelling() {
        let (a, b) = cvt_color_pair(ColorSpace::Lab, ColorSpace::Rgb);
        assert_eq!((a.as_str(), b.as_str()), ("Lab", "RGB"));
    }
}
