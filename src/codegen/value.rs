//! Expression IR for generated code.
//!
//! Node generators build `Value`s — typed expression trees — instead of
//! strings. Backends render the tree into concrete syntax in a single
//! pass, after every placeholder has been resolved. This is what allows
//! deferred values to be ordinary IR nodes rather than text patches.

use crate::codegen::genvalue::ColorSpace;
use crate::codegen::resolvable::{PlaceholderId, Resolvable};
use crate::codegen::types::Type;

/// Binary operators usable in conditions and arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// One node of the expression tree.
#[derive(Debug, Clone)]
pub enum Expr {
    /// An identifier or other backend-neutral snippet.
    Raw(String),
    Bool(bool),
    Int(i64),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Null,
    /// Placeholder for an upstream value not yet generated. Must be
    /// rewritten during the resolution phase; reaching a backend is a
    /// defect.
    Placeholder(PlaceholderId),
    New {
        ty: Type,
        args: Vec<Value>,
    },
    CallFree {
        name: String,
        args: Vec<Value>,
    },
    CallStatic {
        on: Type,
        name: String,
        args: Vec<Value>,
    },
    CallInstance {
        on: Box<Value>,
        name: String,
        args: Vec<Value>,
    },
    Property {
        of: Box<Value>,
        name: String,
    },
    Index {
        of: Box<Value>,
        index: Box<Value>,
    },
    Cast {
        to: Type,
        of: Box<Value>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Value>,
        rhs: Box<Value>,
    },
    Not(Box<Value>),
    /// Array/list literal; renders as `new T[] {..}` or `[..]`.
    ArrayLit {
        element: Type,
        items: Vec<Value>,
    },
    /// Keyword argument (Python); Java renders the bare value.
    NamedArg {
        name: String,
        value: Box<Value>,
    },
    /// The color-conversion constant between two color spaces, e.g.
    /// `Imgproc.COLOR_RGBA2GRAY`. The source side may be deferred.
    CvtColorCode {
        from: Resolvable<ColorSpace>,
        to: ColorSpace,
    },
    /// `cv2.cvtColor(src, code)` when a conversion is needed once the
    /// source color resolves, `src.copy()` otherwise. Used where the
    /// converted value is consumed as an expression (Python backend).
    ConvertOrCopyValue {
        source: Box<Value>,
        from: Resolvable<ColorSpace>,
        to: ColorSpace,
    },
}

/// A typed expression.
#[derive(Debug, Clone)]
pub struct Value {
    pub ty: Type,
    pub expr: Expr,
}

impl Value {
    pub fn new(ty: Type, expr: Expr) -> Self {
        Self { ty, expr }
    }

    pub fn raw(ty: Type, text: impl Into<String>) -> Self {
        Self::new(ty, Expr::Raw(text.into()))
    }

    pub fn bool_of(v: bool) -> Self {
        Self::new(Type::plain("boolean"), Expr::Bool(v))
    }

    pub fn int_of(v: i64) -> Self {
        Self::new(Type::plain("int"), Expr::Int(v))
    }

    pub fn double_of(v: f64) -> Self {
        Self::new(Type::plain("double"), Expr::Double(v))
    }

    pub fn str_of(v: impl Into<String>) -> Self {
        Self::new(Type::plain("String"), Expr::Str(v.into()))
    }

    pub fn null_of(ty: Type) -> Self {
        Self::new(ty, Expr::Null)
    }

    pub fn placeholder(id: PlaceholderId) -> Self {
        Self::new(Type::plain(""), Expr::Placeholder(id))
    }

    pub fn new_of(ty: Type, args: Vec<Value>) -> Self {
        Self::new(ty.clone(), Expr::New { ty, args })
    }

    pub fn call_static(on: Type, name: impl Into<String>, ret: Type, args: Vec<Value>) -> Self {
        Self::new(
            ret,
            Expr::CallStatic {
                on,
                name: name.into(),
                args,
            },
        )
    }

    pub fn call_instance(self, name: impl Into<String>, ret: Type, args: Vec<Value>) -> Self {
        Self::new(
            ret,
            Expr::CallInstance {
                on: Box::new(self),
                name: name.into(),
                args,
            },
        )
    }

    pub fn property(self, name: impl Into<String>, ty: Type) -> Self {
        Self::new(
            ty,
            Expr::Property {
                of: Box::new(self),
                name: name.into(),
            },
        )
    }

    pub fn index(self, index: Value, ty: Type) -> Self {
        Self::new(
            ty,
            Expr::Index {
                of: Box::new(self),
                index: Box::new(index),
            },
        )
    }

    pub fn cast(self, to: Type) -> Self {
        Self::new(
            to.clone(),
            Expr::Cast {
                to,
                of: Box::new(self),
            },
        )
    }

    pub fn named_arg(name: impl Into<String>, value: Value) -> Self {
        Self::new(
            value.ty.clone(),
            Expr::NamedArg {
                name: name.into(),
                value: Box::new(value),
            },
        )
    }

    fn binary(op: BinOp, lhs: Value, rhs: Value) -> Value {
        Value::new(
            Type::plain("boolean"),
            Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn eq_to(self, rhs: Value) -> Value {
        Self::binary(BinOp::Eq, self, rhs)
    }

    pub fn ne_to(self, rhs: Value) -> Value {
        Self::binary(BinOp::Ne, self, rhs)
    }

    pub fn ge_than(self, rhs: Value) -> Value {
        Self::binary(BinOp::Ge, self, rhs)
    }

    pub fn le_than(self, rhs: Value) -> Value {
        Self::binary(BinOp::Le, self, rhs)
    }

    pub fn and_with(self, rhs: Value) -> Value {
        Self::binary(BinOp::And, self, rhs)
    }

    pub fn or_with(self, rhs: Value) -> Value {
        Self::binary(BinOp::Or, self, rhs)
    }

    /// Does any placeholder remain anywhere in this tree?
    pub fn has_placeholder(&self) -> bool {
        fn any(values: &[Value]) -> bool {
            values.iter().any(Value::has_placeholder)
        }

        match &self.expr {
            Expr::Placeholder(_) => true,
            Expr::ConvertOrCopyValue { source, from, .. } => {
                from.is_deferred() || source.has_placeholder()
            }
            Expr::CvtColorCode { from, .. } => from.is_deferred(),
            Expr::New { args, .. } | Expr::CallFree { args, .. } | Expr::CallStatic { args, .. } => {
                any(args)
            }
            Expr::CallInstance { on, args, .. } => on.has_placeholder() || any(args),
            Expr::Property { of, .. } | Expr::Cast { of, .. } => of.has_placeholder(),
            Expr::Index { of, index } => of.has_placeholder() || index.has_placeholder(),
            Expr::Binary { lhs, rhs, .. } => lhs.has_placeholder() || rhs.has_placeholder(),
            Expr::Not(v) => v.has_placeholder(),
            Expr::ArrayLit { items, .. } => any(items),
            Expr::NamedArg { value, .. } => value.has_placeholder(),
            _ => false,
        }
    }
}

/// A named variable. Usable both as a declaration (with an initial value)
/// and as an expression referring to the name.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Type,
    pub initial: Option<Value>,
}

impl Variable {
    pub fn new(name: impl Into<String>, initial: Value) -> Self {
        Self {
            name: name.into(),
            ty: initial.ty.clone(),
            initial: Some(initial),
        }
    }

    /// A variable that is only referenced, never declared here (loop
    /// variables, method parameters).
    pub fn accessor(ty: Type, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            initial: None,
        }
    }

    /// This variable as a use-site expression.
    pub fn value(&self) -> Value {
        Value::raw(self.ty.clone(), self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::types::jvm;

    #[test]
    fn test_variable_value_refers_by_name() {
        let v = Variable::new("grayMat", Value::new_of(jvm::mat(), vec![]));
        let value = v.value();
        assert_eq!(value.ty, jvm::mat());
        assert!(matches!(value.expr, Expr::Raw(ref s) if s == "grayMat"));
    }

    #[test]
    fn test_placeholder_detection_nested() {
        let ph = Value::placeholder(crate::codegen::resolvable::PlaceholderId(1));
        let call = Value::call_static(jvm::imgproc(), "Canny", Type::plain("void"), vec![ph]);
        assert!(call.has_placeholder());

        let clean = Value::call_static(jvm::imgproc(), "Canny", Type::plain("void"), vec![]);
        assert!(!clean.has_placeholder());
    }

    #[test]
    fn test_condition_builders() {
        let a = Value::int_of(1);
        let b = Value::int_of(2);
        let cond = a.clone().ge_than(b.clone()).and_with(a.le_than(b));
        assert!(matches!(
            cond.expr,
            Expr::Binary {
                op: BinOp::And,
                ..
            }
        ));
    }
}
