//! Backend-agnostic statement buffers.
//!
//! A `Scope` is the ordered, append-only list of structural operations for
//! one lexical block: a method body, a branch body, a loop body. Scopes
//! hold IR, never text; rendering happens once, after placeholder
//! resolution, through the selected language backend.

use crate::codegen::genvalue::ColorSpace;
use crate::codegen::resolvable::Resolvable;
use crate::codegen::value::{Value, Variable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

impl Visibility {
    pub fn keyword(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
            Visibility::Protected => "protected",
        }
    }
}

/// One structural operation inside a scope.
#[derive(Debug, Clone)]
pub enum Statement {
    LocalVariable(Variable),
    InstanceVariable {
        vis: Visibility,
        variable: Variable,
        /// Tuner label; only emitted on instrumented passes.
        label: Option<String>,
    },
    Set {
        target: Variable,
        value: Value,
    },
    IndexedSet {
        target: Variable,
        index: Value,
        value: Value,
    },
    InstanceSet {
        target: Variable,
        value: Value,
    },
    /// Expression statement (a call performed for its effect).
    Call(Value),
    If {
        condition: Value,
        body: Scope,
    },
    While {
        condition: Value,
        body: Scope,
    },
    For {
        variable: Variable,
        start: Value,
        end: Value,
        step: Option<Value>,
        body: Scope,
    },
    Foreach {
        variable: Variable,
        iterable: Value,
        body: Scope,
    },
    Block(Scope),
    Comment(String),
    Return(Option<Value>),
    /// Constant-table declaration (an enum in languages that have one).
    EnumTable {
        name: String,
        values: Vec<String>,
    },
    /// Blank line between logical groups.
    Separator,
    /// Stream a mat to the live display. Only present on instrumented
    /// passes; the backend converts to RGB first when the resolved color
    /// requires it.
    StreamFrame {
        id: u32,
        mat: Value,
        color: Resolvable<ColorSpace>,
    },
    /// In-place conversion of `source` into `dest`, or a plain copy when
    /// the resolved source color already matches `to`.
    ConvertOrCopy {
        source: Value,
        dest: Variable,
        from: Resolvable<ColorSpace>,
        to: ColorSpace,
    },
}

/// Ordered statement buffer for one lexical block.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    statements: Vec<Statement>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub(crate) fn statements_mut(&mut self) -> &mut Vec<Statement> {
        &mut self.statements
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn local(&mut self, variable: &Variable) {
        self.push(Statement::LocalVariable(variable.clone()));
    }

    pub fn instance(&mut self, vis: Visibility, variable: &Variable, label: Option<String>) {
        self.push(Statement::InstanceVariable {
            vis,
            variable: variable.clone(),
            label,
        });
    }

    pub fn set(&mut self, target: &Variable, value: Value) {
        self.push(Statement::Set {
            target: target.clone(),
            value,
        });
    }

    pub fn indexed_set(&mut self, target: &Variable, index: Value, value: Value) {
        self.push(Statement::IndexedSet {
            target: target.clone(),
            index,
            value,
        });
    }

    pub fn instance_set(&mut self, target: &Variable, value: Value) {
        self.push(Statement::InstanceSet {
            target: target.clone(),
            value,
        });
    }

    pub fn call(&mut self, value: Value) {
        self.push(Statement::Call(value));
    }

    pub fn if_condition(&mut self, condition: Value, body: Scope) {
        self.push(Statement::If { condition, body });
    }

    pub fn while_loop(&mut self, condition: Value, body: Scope) {
        self.push(Statement::While { condition, body });
    }

    pub fn for_loop(
        &mut self,
        variable: &Variable,
        start: Value,
        end: Value,
        step: Option<Value>,
        body: Scope,
    ) {
        self.push(Statement::For {
            variable: variable.clone(),
            start,
            end,
            step,
            body,
        });
    }

    pub fn foreach(&mut self, variable: &Variable, iterable: Value, body: Scope) {
        self.push(Statement::Foreach {
            variable: variable.clone(),
            iterable,
            body,
        });
    }

    pub fn block(&mut self, body: Scope) {
        self.push(Statement::Block(body));
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Statement::Comment(text.into()));
    }

    pub fn ret(&mut self, value: Option<Value>) {
        self.push(Statement::Return(value));
    }

    pub fn enum_table(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.push(Statement::EnumTable {
            name: name.into(),
            values,
        });
    }

    pub fn separate(&mut self) {
        self.push(Statement::Separator);
    }

    /// Emit the live-stream call for `mat`. No-op unless this is an
    /// instrumented pass.
    pub fn stream_frame(
        &mut self,
        previz: bool,
        id: u32,
        mat: Value,
        color: Resolvable<ColorSpace>,
    ) {
        if previz {
            self.push(Statement::StreamFrame { id, mat, color });
        }
    }

    pub fn convert_or_copy(
        &mut self,
        source: Value,
        dest: &Variable,
        from: Resolvable<ColorSpace>,
        to: ColorSpace,
    ) {
        self.push(Statement::ConvertOrCopy {
            source,
            dest: dest.clone(),
            from,
            to,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::jvm;

    #[test]
    fn test_statement_order_is_preserved() {
        let mut scope = Scope::new();
        scope.comment("first");
        scope.separate();
        scope.ret(None);

        assert_eq!(scope.statements().len(), 3);
        assert!(matches!(scope.statements()[0], Statement::Comment(_)));
        assert!(matches!(scope.statements()[2], Statement::Return(None)));
    }

    #[test]
    fn test_stream_frame_skipped_outside_previz() {
        let mut scope = Scope::new();
        let mat = Value::raw(jvm::mat(), "frame");
        scope.stream_frame(false, 1, mat.clone(), Resolvable::Now(ColorSpace::Rgb));
        assert!(scope.is_empty());

        scope.stream_frame(true, 1, mat, Resolvable::Now(ColorSpace::Rgb));
        assert_eq!(scope.statements().len(), 1);
    }
}
