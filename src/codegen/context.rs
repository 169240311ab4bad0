//! The per-pass code-generation context.
//!
//! One `CodeGen` exists per compilation pass. It owns the named scopes the
//! backend later assembles, the per-node session cache (each node's
//! generator runs at most once per pass), the ending-nodes queue, and the
//! placeholder table for deferred values. Value resolution is pull-based:
//! querying an attribute triggers the owning node's generation on demand.
//!
//! Session states per node: absent (not generated) -> `Generating`
//! (transiently, during the recursive pull) -> `Cached` until pass end.
//! Pulling an output while its node is still `Generating` yields a
//! placeholder that is resolved against the completed session cache before
//! rendering.

use crate::codegen::error::GenError;
use crate::codegen::genvalue::{ColorSpace, GenValue, MatValue, ScalarRange};
use crate::codegen::languages::Language;
use crate::codegen::resolvable::{PlaceholderId, Resolvable};
use crate::codegen::scope::{Scope, Statement};
use crate::codegen::value::{Expr, Value, Variable};
use crate::graph::attribute::{AttributeMode, ElementKind, ValueKind};
use crate::graph::graph::Graph;
use crate::graph::id::{AttributeId, NodeId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Progress of a pass through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Creation,
    InitialGen,
    EndGen,
    EndedSuccess,
    EndedError,
}

/// Memoized generation result for one node within one pass: the dataflow
/// values its output attributes produce.
#[derive(Debug, Clone, Default)]
pub struct Session {
    outputs: HashMap<AttributeId, GenValue>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_output(&mut self, attr: AttributeId, value: GenValue) {
        self.outputs.insert(attr, value);
    }

    pub fn output(&self, attr: AttributeId) -> Option<&GenValue> {
        self.outputs.get(&attr)
    }
}

#[derive(Debug)]
enum SessionState {
    Generating,
    Cached(Session),
}

#[derive(Debug, Clone, Copy)]
enum CheckKind {
    Binary(bool),
    Color(ColorSpace),
}

#[derive(Debug, Clone, Copy)]
struct DeferredCheck {
    placeholder: PlaceholderId,
    attribute: AttributeId,
    kind: CheckKind,
}

/// The fully-resolved IR of one pass, ready for backend rendering.
#[derive(Debug)]
pub struct CompiledUnit {
    pub class_name: String,
    pub previz: bool,
    pub class_start: Scope,
    pub init: Scope,
    pub process_frame: Scope,
    pub viewport_tapped: Scope,
    pub class_end: Scope,
}

pub struct CodeGen<'a> {
    pub language: &'a dyn Language,
    pub previz: bool,
    pub class_name: String,
    pub stage: Stage,

    pub class_start: Scope,
    pub init: Scope,
    pub process_frame: Scope,
    pub viewport_tapped: Scope,
    pub class_end: Scope,

    sessions: HashMap<NodeId, SessionState>,
    ending_nodes: Vec<NodeId>,
    /// Placeholder table: index = `PlaceholderId`, entry = the output
    /// attribute the placeholder reads from.
    placeholders: Vec<AttributeId>,
    deferred_checks: Vec<DeferredCheck>,
    used_names: HashSet<String>,
}

impl<'a> CodeGen<'a> {
    pub fn new(class_name: impl Into<String>, language: &'a dyn Language, previz: bool) -> Self {
        Self {
            language,
            previz,
            class_name: class_name.into(),
            stage: Stage::Creation,
            class_start: Scope::new(),
            init: Scope::new(),
            process_frame: Scope::new(),
            viewport_tapped: Scope::new(),
            class_end: Scope::new(),
            sessions: HashMap::new(),
            ending_nodes: Vec::new(),
            placeholders: Vec::new(),
            deferred_checks: Vec::new(),
            used_names: HashSet::new(),
        }
    }

    /// Allocate a variable name unique within this pass.
    pub fn unique_name(&mut self, base: &str) -> String {
        if self.used_names.insert(base.to_string()) {
            return base.to_string();
        }
        let mut count = 1;
        loop {
            let candidate = format!("{base}{count}");
            if self.used_names.insert(candidate.clone()) {
                return candidate;
            }
            count += 1;
        }
    }

    pub fn unique_variable(&mut self, base: &str, value: Value) -> Variable {
        Variable::new(self.unique_name(base), value)
    }

    pub fn session(&self, node: NodeId) -> Option<&Session> {
        match self.sessions.get(&node) {
            Some(SessionState::Cached(s)) => Some(s),
            _ => None,
        }
    }

    pub fn append_class_start(&mut self, scope: Scope) {
        append(&mut self.class_start, scope);
    }

    pub fn append_init(&mut self, scope: Scope) {
        append(&mut self.init, scope);
    }

    pub fn append_process_frame(&mut self, scope: Scope) {
        append(&mut self.process_frame, scope);
    }

    pub fn append_viewport_tapped(&mut self, scope: Scope) {
        append(&mut self.viewport_tapped, scope);
    }

    /// Generate `node` unless a session already exists this pass, then
    /// propagate to the nodes attached to its outputs. Ending nodes are
    /// queued instead when the pass is not in its end stage.
    pub fn gen_code_if_necessary(&mut self, graph: &Graph, node: NodeId) -> Result<(), GenError> {
        let slot = graph
            .node(node)
            .ok_or_else(|| GenError::node(node, "node does not exist"))?;

        if slot.node.gen_at_end() && self.stage != Stage::EndGen {
            if !self.ending_nodes.contains(&node) {
                trace!(node = %node, "queued for end-of-pass generation");
                self.ending_nodes.push(node);
            }
            return Ok(());
        }

        if self.sessions.contains_key(&node) {
            // Cached, or currently generating further up the pull chain.
            return Ok(());
        }

        trace!(node = %node, "generating");
        self.sessions.insert(node, SessionState::Generating);
        let session = slot.node.generate(graph, node, self)?;
        self.sessions.insert(node, SessionState::Cached(session));

        self.propagate(graph, node)
    }

    /// Drive generation of the nodes attached to this node's outputs.
    /// Complete-path nodes (those that eventually reach the pipeline
    /// output) go first; dead-end branches are generated last so they
    /// cannot perturb main-path statement ordering.
    pub fn propagate(&mut self, graph: &Graph, node: NodeId) -> Result<(), GenError> {
        let linked = graph.downstream_nodes(node);

        let mut complete = Vec::new();
        let mut dead_ends = Vec::new();
        for downstream in linked {
            if graph.has_dead_end(downstream) {
                dead_ends.push(downstream);
            } else {
                complete.push(downstream);
            }
        }
        trace!(node = %node, complete = complete.len(), dead_ends = dead_ends.len(), "propagating");

        for downstream in complete.into_iter().chain(dead_ends) {
            self.gen_code_if_necessary(graph, downstream)?;
        }
        Ok(())
    }

    /// Resolve the dataflow value of an attribute. Inputs pull from their
    /// linked upstream output; outputs trigger the owning node's
    /// generation and read its session.
    pub fn value(&mut self, graph: &Graph, attr: AttributeId) -> Result<GenValue, GenError> {
        let a = graph
            .attribute(attr)
            .ok_or_else(|| GenError::attribute(attr, "attribute does not exist"))?;

        match a.mode {
            AttributeMode::Input => match graph.linked_output(attr) {
                Some(upstream) => self.output_value(graph, upstream),
                None => Err(GenError::attribute(
                    attr,
                    "this input must have an attached attribute",
                )),
            },
            AttributeMode::Output => self.output_value(graph, attr),
        }
    }

    /// Like `value`, but unlinked inputs fall back to a documented default
    /// instead of raising.
    pub fn value_or(
        &mut self,
        graph: &Graph,
        attr: AttributeId,
        default: GenValue,
    ) -> Result<GenValue, GenError> {
        if graph.linked_output(attr).is_some() {
            self.value(graph, attr)
        } else {
            Ok(default)
        }
    }

    fn output_value(&mut self, graph: &Graph, attr: AttributeId) -> Result<GenValue, GenError> {
        let node = attr.node();
        self.gen_code_if_necessary(graph, node)?;

        match self.sessions.get(&node) {
            Some(SessionState::Cached(session)) => session.output(attr).cloned().ok_or_else(|| {
                GenError::node(node, format!("node produced no value for {attr}"))
            }),
            // Mid-generation or queued for the end stage: hand out a
            // placeholder resolved once the session exists.
            _ => Ok(self.defer_output(graph, attr)),
        }
    }

    /// Build a placeholder value bound to an output attribute whose
    /// session does not exist yet.
    pub fn defer_output(&mut self, graph: &Graph, attr: AttributeId) -> GenValue {
        let id = PlaceholderId(self.placeholders.len() as u32);
        self.placeholders.push(attr);
        debug!(%attr, placeholder = ?id, "deferring upstream value");

        let kind = graph.attribute(attr).map(|a| a.kind);
        match kind {
            Some(ValueKind::Mat) => GenValue::Mat(MatValue {
                value: Value::placeholder(id),
                color: Resolvable::Deferred(id),
                binary: Resolvable::Deferred(id),
            }),
            Some(ValueKind::List(element)) => GenValue::RuntimeList {
                element,
                value: Value::placeholder(id),
            },
            Some(ValueKind::Rect) => GenValue::RuntimeRect(Value::placeholder(id)),
            Some(ValueKind::RotatedRect) => GenValue::RuntimeRotatedRect(Value::placeholder(id)),
            Some(ValueKind::KeyPoints) => GenValue::KeyPoints(Value::placeholder(id)),
            _ => GenValue::None,
        }
    }

    // ---- typed accessors -------------------------------------------------

    /// Pull an attribute value and require it to be a Mat.
    pub fn mat_value(&mut self, graph: &Graph, attr: AttributeId) -> Result<MatValue, GenError> {
        match self.value(graph, attr)? {
            GenValue::Mat(mat) => Ok(mat),
            _ => Err(GenError::attribute(attr, "the attached attribute is not a Mat")),
        }
    }

    /// Pull an int-valued attribute, falling back to `default` when the
    /// input is unlinked.
    pub fn int_value_or(
        &mut self,
        graph: &Graph,
        attr: AttributeId,
        default: i32,
    ) -> Result<i64, GenError> {
        match self.value_or(graph, attr, GenValue::Int(default))? {
            GenValue::Int(v) => Ok(v as i64),
            GenValue::Double(v) => Ok(v as i64),
            _ => Err(GenError::attribute(attr, "the attached attribute is not a number")),
        }
    }

    /// Pull a scalar-range attribute, falling back to `default` when the
    /// input is unlinked.
    pub fn scalar_range_value_or(
        &mut self,
        graph: &Graph,
        attr: AttributeId,
        default: ScalarRange,
    ) -> Result<ScalarRange, GenError> {
        match self.value_or(graph, attr, GenValue::ScalarRange(default))? {
            GenValue::ScalarRange(r) => Ok(r),
            _ => Err(GenError::attribute(
                attr,
                "the attached attribute is not a scalar range",
            )),
        }
    }

    /// Pull a list attribute and require a runtime list.
    pub fn runtime_list_value(
        &mut self,
        graph: &Graph,
        attr: AttributeId,
    ) -> Result<(ElementKind, Value), GenError> {
        match self.value(graph, attr)? {
            GenValue::RuntimeList { element, value } => Ok((element, value)),
            GenValue::List { .. } => Err(GenError::attribute(
                attr,
                "a runtime list is required here",
            )),
            _ => Err(GenError::attribute(attr, "the attached attribute is not a list")),
        }
    }

    // ---- constraint checks ----------------------------------------------

    /// Require a binary (thresholded) mat on `attribute`. Deferred mats
    /// are checked once their placeholder resolves.
    pub fn require_binary(
        &mut self,
        mat: &MatValue,
        attribute: AttributeId,
    ) -> Result<(), GenError> {
        match mat.binary {
            Resolvable::Now(true) => Ok(()),
            Resolvable::Now(false) => Err(GenError::attribute(
                attribute,
                "Mat is not binary as required, this causes runtime issues",
            )),
            Resolvable::Deferred(placeholder) => {
                self.deferred_checks.push(DeferredCheck {
                    placeholder,
                    attribute,
                    kind: CheckKind::Binary(true),
                });
                Ok(())
            }
        }
    }

    /// Require a non-binary mat on `attribute`.
    pub fn require_non_binary(
        &mut self,
        mat: &MatValue,
        attribute: AttributeId,
    ) -> Result<(), GenError> {
        match mat.binary {
            Resolvable::Now(false) => Ok(()),
            Resolvable::Now(true) => Err(GenError::attribute(
                attribute,
                "Mat is binary, but non-binary was required",
            )),
            Resolvable::Deferred(placeholder) => {
                self.deferred_checks.push(DeferredCheck {
                    placeholder,
                    attribute,
                    kind: CheckKind::Binary(false),
                });
                Ok(())
            }
        }
    }

    /// Require a specific color space on `attribute`.
    pub fn require_color(
        &mut self,
        mat: &MatValue,
        attribute: AttributeId,
        expected: ColorSpace,
    ) -> Result<(), GenError> {
        match mat.color {
            Resolvable::Now(color) if color == expected => Ok(()),
            Resolvable::Now(_) => Err(GenError::attribute(
                attribute,
                format!("a {} Mat is required here", expected.constant_name()),
            )),
            Resolvable::Deferred(placeholder) => {
                self.deferred_checks.push(DeferredCheck {
                    placeholder,
                    attribute,
                    kind: CheckKind::Color(expected),
                });
                Ok(())
            }
        }
    }

    // ---- end-of-pass -----------------------------------------------------

    /// Drain one queued ending node, if any.
    pub fn take_ending_node(&mut self) -> Option<NodeId> {
        if self.ending_nodes.is_empty() {
            None
        } else {
            Some(self.ending_nodes.remove(0))
        }
    }

    /// Resolution phase: every placeholder is replaced by the concrete
    /// value its upstream session produced, deferred constraint checks
    /// run, and the scopes are handed over for rendering. An entry that
    /// cannot be resolved is a defect and fails the pass.
    pub fn finish(mut self) -> Result<CompiledUnit, GenError> {
        let resolved = self.resolve_placeholder_table()?;
        self.run_deferred_checks(&resolved)?;

        let scopes = [
            &mut self.class_start,
            &mut self.init,
            &mut self.process_frame,
            &mut self.viewport_tapped,
            &mut self.class_end,
        ];
        for scope in scopes {
            resolve_scope(scope, &resolved)?;
        }

        Ok(CompiledUnit {
            class_name: self.class_name,
            previz: self.previz,
            class_start: self.class_start,
            init: self.init,
            process_frame: self.process_frame,
            viewport_tapped: self.viewport_tapped,
            class_end: self.class_end,
        })
    }

    fn resolve_placeholder_table(&self) -> Result<Vec<GenValue>, GenError> {
        #[derive(Clone)]
        enum Slot {
            Empty,
            InProgress,
            Done(GenValue),
        }

        fn resolve_entry(
            idx: usize,
            table: &[AttributeId],
            sessions: &HashMap<NodeId, SessionState>,
            slots: &mut Vec<Slot>,
        ) -> Result<GenValue, GenError> {
            match &slots[idx] {
                Slot::Done(v) => return Ok(v.clone()),
                // A placeholder chain that loops back on itself can never
                // produce a concrete value.
                Slot::InProgress => return Err(GenError::UnresolvedPlaceholder(PlaceholderId(idx as u32))),
                Slot::Empty => {}
            }
            slots[idx] = Slot::InProgress;

            let attr = table[idx];
            let session = match sessions.get(&attr.node()) {
                Some(SessionState::Cached(s)) => s,
                _ => return Err(GenError::UnresolvedPlaceholder(PlaceholderId(idx as u32))),
            };
            let raw = session
                .output(attr)
                .cloned()
                .ok_or(GenError::UnresolvedPlaceholder(PlaceholderId(idx as u32)))?;

            let concrete = deep_resolve_genvalue(raw, table, sessions, slots)?;
            slots[idx] = Slot::Done(concrete.clone());
            Ok(concrete)
        }

        fn deep_resolve_genvalue(
            value: GenValue,
            table: &[AttributeId],
            sessions: &HashMap<NodeId, SessionState>,
            slots: &mut Vec<Slot>,
        ) -> Result<GenValue, GenError> {
            let resolve_color = |color: Resolvable<ColorSpace>,
                                 table: &[AttributeId],
                                 sessions: &HashMap<NodeId, SessionState>,
                                 slots: &mut Vec<Slot>|
             -> Result<Resolvable<ColorSpace>, GenError> {
                match color {
                    Resolvable::Now(c) => Ok(Resolvable::Now(c)),
                    Resolvable::Deferred(id) => {
                        match resolve_entry(id.index(), table, sessions, slots)? {
                            GenValue::Mat(mat) => Ok(mat.color),
                            _ => Err(GenError::UnresolvedPlaceholder(id)),
                        }
                    }
                }
            };

            match value {
                GenValue::Mat(mat) => {
                    let color = resolve_color(mat.color, table, sessions, slots)?;
                    let binary = match mat.binary {
                        Resolvable::Now(b) => Resolvable::Now(b),
                        Resolvable::Deferred(id) => {
                            match resolve_entry(id.index(), table, sessions, slots)? {
                                GenValue::Mat(upstream) => upstream.binary,
                                _ => return Err(GenError::UnresolvedPlaceholder(id)),
                            }
                        }
                    };
                    let mut resolver = |id: PlaceholderId| -> Result<Value, GenError> {
                        let resolved = resolve_entry(id.index(), table, sessions, slots)?;
                        resolved
                            .runtime_value()
                            .cloned()
                            .ok_or(GenError::UnresolvedPlaceholder(id))
                    };
                    let value = substitute_value(&mat.value, &mut resolver)?;
                    Ok(GenValue::Mat(MatValue {
                        value,
                        color,
                        binary,
                    }))
                }
                GenValue::RuntimeList { element, value } => {
                    let mut resolver = |id: PlaceholderId| -> Result<Value, GenError> {
                        let resolved = resolve_entry(id.index(), table, sessions, slots)?;
                        resolved
                            .runtime_value()
                            .cloned()
                            .ok_or(GenError::UnresolvedPlaceholder(id))
                    };
                    Ok(GenValue::RuntimeList {
                        element,
                        value: substitute_value(&value, &mut resolver)?,
                    })
                }
                GenValue::RuntimeRect(value) => {
                    let mut resolver = |id: PlaceholderId| -> Result<Value, GenError> {
                        let resolved = resolve_entry(id.index(), table, sessions, slots)?;
                        resolved
                            .runtime_value()
                            .cloned()
                            .ok_or(GenError::UnresolvedPlaceholder(id))
                    };
                    Ok(GenValue::RuntimeRect(substitute_value(&value, &mut resolver)?))
                }
                other => Ok(other),
            }
        }

        let mut slots = vec![Slot::Empty; self.placeholders.len()];
        let mut resolved = Vec::with_capacity(self.placeholders.len());
        for idx in 0..self.placeholders.len() {
            resolved.push(resolve_entry(
                idx,
                &self.placeholders,
                &self.sessions,
                &mut slots,
            )?);
        }
        Ok(resolved)
    }

    fn run_deferred_checks(&self, resolved: &[GenValue]) -> Result<(), GenError> {
        for check in &self.deferred_checks {
            let value = resolved
                .get(check.placeholder.index())
                .ok_or(GenError::UnresolvedPlaceholder(check.placeholder))?;
            let mat = match value {
                GenValue::Mat(mat) => mat,
                _ => {
                    return Err(GenError::attribute(
                        check.attribute,
                        "placeholder value does not resolve to a Mat",
                    ))
                }
            };
            match check.kind {
                CheckKind::Binary(expect) => {
                    let is_binary = *mat.binary.now().ok_or(GenError::UnresolvedPlaceholder(
                        check.placeholder,
                    ))?;
                    if is_binary != expect {
                        let message = if expect {
                            "Mat is not binary as required, this causes runtime issues"
                        } else {
                            "Mat is binary, but non-binary was required"
                        };
                        return Err(GenError::attribute(check.attribute, message));
                    }
                }
                CheckKind::Color(expect) => {
                    let color = *mat.color.now().ok_or(GenError::UnresolvedPlaceholder(
                        check.placeholder,
                    ))?;
                    if color != expect {
                        return Err(GenError::attribute(
                            check.attribute,
                            format!("a {} Mat is required here", expect.constant_name()),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

fn append(target: &mut Scope, mut addition: Scope) {
    target.statements_mut().append(addition.statements_mut());
}

/// Rewrite every placeholder in a value tree via `resolver`.
fn substitute_value(
    value: &Value,
    resolver: &mut dyn FnMut(PlaceholderId) -> Result<Value, GenError>,
) -> Result<Value, GenError> {
    let sub_all = |args: &[Value],
                   resolver: &mut dyn FnMut(PlaceholderId) -> Result<Value, GenError>|
     -> Result<Vec<Value>, GenError> {
        args.iter().map(|v| substitute_value(v, resolver)).collect()
    };

    let expr = match &value.expr {
        Expr::Placeholder(id) => return resolver(*id),
        Expr::New { ty, args } => Expr::New {
            ty: ty.clone(),
            args: sub_all(args, resolver)?,
        },
        Expr::CallFree { name, args } => Expr::CallFree {
            name: name.clone(),
            args: sub_all(args, resolver)?,
        },
        Expr::CallStatic { on, name, args } => Expr::CallStatic {
            on: on.clone(),
            name: name.clone(),
            args: sub_all(args, resolver)?,
        },
        Expr::CallInstance { on, name, args } => Expr::CallInstance {
            on: Box::new(substitute_value(on, resolver)?),
            name: name.clone(),
            args: sub_all(args, resolver)?,
        },
        Expr::Property { of, name } => Expr::Property {
            of: Box::new(substitute_value(of, resolver)?),
            name: name.clone(),
        },
        Expr::Index { of, index } => Expr::Index {
            of: Box::new(substitute_value(of, resolver)?),
            index: Box::new(substitute_value(index, resolver)?),
        },
        Expr::Cast { to, of } => Expr::Cast {
            to: to.clone(),
            of: Box::new(substitute_value(of, resolver)?),
        },
        Expr::Binary { op, lhs, rhs } => Expr::Binary {
            op: *op,
            lhs: Box::new(substitute_value(lhs, resolver)?),
            rhs: Box::new(substitute_value(rhs, resolver)?),
        },
        Expr::Not(inner) => Expr::Not(Box::new(substitute_value(inner, resolver)?)),
        Expr::ArrayLit { element, items } => Expr::ArrayLit {
            element: element.clone(),
            items: sub_all(items, resolver)?,
        },
        Expr::NamedArg { name, value: inner } => Expr::NamedArg {
            name: name.clone(),
            value: Box::new(substitute_value(inner, resolver)?),
        },
        Expr::ConvertOrCopyValue { source, from, to } => Expr::ConvertOrCopyValue {
            source: Box::new(substitute_value(source, resolver)?),
            from: *from,
            to: *to,
        },
        other => other.clone(),
    };
    Ok(Value::new(value.ty.clone(), expr))
}

/// Resolve one scope in place against the resolved placeholder table:
/// value placeholders are substituted and deferred color decisions become
/// concrete.
fn resolve_scope(scope: &mut Scope, resolved: &[GenValue]) -> Result<(), GenError> {
    let mut resolver = |id: PlaceholderId| -> Result<Value, GenError> {
        resolved
            .get(id.index())
            .and_then(|gv| gv.runtime_value().cloned())
            .ok_or(GenError::UnresolvedPlaceholder(id))
    };
    let resolve_color = |color: &Resolvable<ColorSpace>| -> Result<ColorSpace, GenError> {
        match color {
            Resolvable::Now(c) => Ok(*c),
            Resolvable::Deferred(id) => match resolved.get(id.index()) {
                Some(GenValue::Mat(mat)) => mat
                    .color
                    .now()
                    .copied()
                    .ok_or(GenError::UnresolvedPlaceholder(*id)),
                _ => Err(GenError::UnresolvedPlaceholder(*id)),
            },
        }
    };

    let statements = std::mem::take(scope.statements_mut());
    for statement in statements {
        let rewritten = match statement {
            Statement::LocalVariable(mut variable) => {
                if let Some(initial) = variable.initial.take() {
                    variable.initial = Some(substitute_statement_value(&initial, resolved, &mut resolver)?);
                }
                Statement::LocalVariable(variable)
            }
            Statement::InstanceVariable {
                vis,
                mut variable,
                label,
            } => {
                if let Some(initial) = variable.initial.take() {
                    variable.initial = Some(substitute_statement_value(&initial, resolved, &mut resolver)?);
                }
                Statement::InstanceVariable {
                    vis,
                    variable,
                    label,
                }
            }
            Statement::Set { target, value } => Statement::Set {
                target,
                value: substitute_statement_value(&value, resolved, &mut resolver)?,
            },
            Statement::IndexedSet {
                target,
                index,
                value,
            } => Statement::IndexedSet {
                target,
                index: substitute_statement_value(&index, resolved, &mut resolver)?,
                value: substitute_statement_value(&value, resolved, &mut resolver)?,
            },
            Statement::InstanceSet { target, value } => Statement::InstanceSet {
                target,
                value: substitute_statement_value(&value, resolved, &mut resolver)?,
            },
            Statement::Call(value) => {
                Statement::Call(substitute_statement_value(&value, resolved, &mut resolver)?)
            }
            Statement::If {
                condition,
                mut body,
            } => {
                resolve_scope(&mut body, resolved)?;
                Statement::If {
                    condition: substitute_statement_value(&condition, resolved, &mut resolver)?,
                    body,
                }
            }
            Statement::While {
                condition,
                mut body,
            } => {
                resolve_scope(&mut body, resolved)?;
                Statement::While {
                    condition: substitute_statement_value(&condition, resolved, &mut resolver)?,
                    body,
                }
            }
            Statement::For {
                variable,
                start,
                end,
                step,
                mut body,
            } => {
                resolve_scope(&mut body, resolved)?;
                Statement::For {
                    variable,
                    start: substitute_statement_value(&start, resolved, &mut resolver)?,
                    end: substitute_statement_value(&end, resolved, &mut resolver)?,
                    step: match step {
                        Some(s) => Some(substitute_statement_value(&s, resolved, &mut resolver)?),
                        None => None,
                    },
                    body,
                }
            }
            Statement::Foreach {
                variable,
                iterable,
                mut body,
            } => {
                resolve_scope(&mut body, resolved)?;
                Statement::Foreach {
                    variable,
                    iterable: substitute_statement_value(&iterable, resolved, &mut resolver)?,
                    body,
                }
            }
            Statement::Block(mut body) => {
                resolve_scope(&mut body, resolved)?;
                Statement::Block(body)
            }
            Statement::Return(value) => Statement::Return(match value {
                Some(v) => Some(substitute_statement_value(&v, resolved, &mut resolver)?),
                None => None,
            }),
            Statement::StreamFrame { id, mat, color } => Statement::StreamFrame {
                id,
                mat: substitute_statement_value(&mat, resolved, &mut resolver)?,
                color: Resolvable::Now(resolve_color(&color)?),
            },
            Statement::ConvertOrCopy {
                source,
                dest,
                from,
                to,
            } => Statement::ConvertOrCopy {
                source: substitute_statement_value(&source, resolved, &mut resolver)?,
                dest,
                from: Resolvable::Now(resolve_color(&from)?),
                to,
            },
            other @ (Statement::Comment(_) | Statement::Separator | Statement::EnumTable { .. }) => {
                other
            }
        };
        scope.statements_mut().push(rewritten);
    }
    Ok(())
}

/// Substitute placeholders in a value and force its embedded deferred
/// colors (conversion codes, convert-or-copy expressions) to `Now`.
fn substitute_statement_value(
    value: &Value,
    resolved: &[GenValue],
    resolver: &mut dyn FnMut(PlaceholderId) -> Result<Value, GenError>,
) -> Result<Value, GenError> {
    let substituted = substitute_value(value, resolver)?;
    force_colors(substituted, resolved)
}

fn force_colors(value: Value, resolved: &[GenValue]) -> Result<Value, GenError> {
    let resolve_color = |color: Resolvable<ColorSpace>| -> Result<Resolvable<ColorSpace>, GenError> {
        match color {
            Resolvable::Now(c) => Ok(Resolvable::Now(c)),
            Resolvable::Deferred(id) => match resolved.get(id.index()) {
                Some(GenValue::Mat(mat)) => Ok(Resolvable::Now(
                    mat.color
                        .now()
                        .copied()
                        .ok_or(GenError::UnresolvedPlaceholder(id))?,
                )),
                _ => Err(GenError::UnresolvedPlaceholder(id)),
            },
        }
    };

    let force_all = |items: Vec<Value>, resolved: &[GenValue]| -> Result<Vec<Value>, GenError> {
        items.into_iter().map(|v| force_colors(v, resolved)).collect()
    };

    let expr = match value.expr {
        Expr::CvtColorCode { from, to } => Expr::CvtColorCode {
            from: resolve_color(from)?,
            to,
        },
        Expr::ConvertOrCopyValue { source, from, to } => Expr::ConvertOrCopyValue {
            source: Box::new(force_colors(*source, resolved)?),
            from: resolve_color(from)?,
            to,
        },
        Expr::New { ty, args } => Expr::New {
            ty,
            args: force_all(args, resolved)?,
        },
        Expr::CallFree { name, args } => Expr::CallFree {
            name,
            args: force_all(args, resolved)?,
        },
        Expr::CallStatic { on, name, args } => Expr::CallStatic {
            on,
            name,
            args: force_all(args, resolved)?,
        },
        Expr::CallInstance { on, name, args } => Expr::CallInstance {
            on: Box::new(force_colors(*on, resolved)?),
            name,
            args: force_all(args, resolved)?,
        },
        Expr::NamedArg { name, value: inner } => Expr::NamedArg {
            name,
            value: Box::new(force_colors(*inner, resolved)?),
        },
        other => other,
    };
    Ok(Value::new(value.ty, expr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::languages::JavaLanguage;

    #[test]
    fn test_unique_name_counts_up() {
        let lang = JavaLanguage;
        let mut cg = CodeGen::new("Test", &lang, false);
        assert_eq!(cg.unique_name("mat"), "mat");
        assert_eq!(cg.unique_name("mat"), "mat1");
        assert_eq!(cg.unique_name("mat"), "mat2");
        assert_eq!(cg.unique_name("other"), "other");
    }

    #[test]
    fn test_session_outputs() {
        let mut session = Session::new();
        let attr = AttributeId::new(NodeId(1), 0);
        session.set_output(attr, GenValue::Int(5));
        assert!(matches!(session.output(attr), Some(GenValue::Int(5))));
        assert!(session.output(AttributeId::new(NodeId(1), 1)).is_none());
    }

    #[test]
    fn test_stage_transitions() {
        let lang = JavaLanguage;
        let mut cg = CodeGen::new("Test", &lang, false);
        assert_eq!(cg.stage, Stage::Creation);
        cg.stage = Stage::InitialGen;
        assert_eq!(cg.stage, Stage::InitialGen);
    }
}
