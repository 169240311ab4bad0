//! The graph-to-source compiler.
//!
//! A generation pass walks the link graph pull-based from the pipeline
//! anchors, memoizes each node's generation into a per-pass session,
//! builds a backend-agnostic statement IR, resolves deferred values in a
//! second phase, and renders the result once through a pluggable language
//! backend.
//!
//! # Architecture
//!
//! ```text
//! [Graph] ──pull──► [CodeGen context] ──IR──► [placeholder resolution] ──► [Language backend] ──► source text
//!                      │
//!                      └── per-node Session cache (one generator run per pass)
//! ```

pub mod context;
pub mod error;
pub mod genvalue;
pub mod languages;
pub mod manager;
pub mod resolvable;
pub mod scope;
pub mod types;
pub mod value;

pub use context::{CodeGen, CompiledUnit, Session, Stage};
pub use error::GenError;
pub use genvalue::{ColorSpace, GenValue, MatValue, Range, ScalarRange};
pub use languages::{JavaLanguage, Language, LanguageId, PythonLanguage};
pub use manager::CodeGenManager;
pub use resolvable::{PlaceholderId, Resolvable};
pub use scope::{Scope, Statement, Visibility};
pub use types::Type;
pub use value::{BinOp, Expr, Value, Variable};
