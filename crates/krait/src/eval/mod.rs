//! The tree-walking evaluator.
//!
//! Statement execution lives here; expressions, operator dispatch,
//! comparisons, attribute access, calls, iteration, and repr each have their
//! own file. Control flow uses the [`Flow`] enum — `return`/`break`/
//! `continue` unwind through frames as ordinary `Ok` values, structurally
//! distinct from exceptions, so no user `except:` clause can ever observe
//! them. `finally` blocks and `__exit__` calls run on every exit path.

mod attrs;
mod binary;
mod call;
mod compare;
mod expr;
mod iter;
pub(crate) mod methods;
mod repr;

pub(crate) use repr::str_repr;

use std::rc::Rc;

use crate::{
    ast::{
        ExceptHandler, Expr, ExprKind, FunctionDef, MatchCase, Module, Pattern, Stmt, StmtKind,
        WithItem,
    },
    builtins::Builtins,
    exception_private::{ExcPayload, ExcType, RunError, RunResult, SimpleException},
    exception_public::Exception,
    heap::{Heap, HeapData, HeapId},
    io::PrintWriter,
    namespace::{GLOBAL_SCOPE, ScopeId, ScopeKind, Scopes},
    prepare,
    resource::ResourceLimits,
    types::{ClassObject, FunctionBody, FunctionObject, compute_c3_mro},
    value::{Value, py_truthy_structural},
};

/// Non-exception control-flow signals. They unwind through statement lists
/// and intervening frames but are not catchable by user code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Break,
    Continue,
    Return(Value),
}

pub(crate) type ExecResult = RunResult<Flow>;

/// Per-call frame context: what zero-argument `super()` and bare `raise`
/// need to know about the innermost user-function call.
#[derive(Debug, Clone, Copy)]
struct FrameCtx {
    defining_class: Option<HeapId>,
    first_arg: Option<Value>,
}

pub(crate) struct Evaluator<'a> {
    pub heap: &'a mut Heap,
    pub scopes: &'a mut Scopes,
    pub print: &'a mut dyn PrintWriter,
    limits: ResourceLimits,
    /// Depth of nested user-function frames, checked against the limit.
    depth: usize,
    frames: Vec<FrameCtx>,
    /// Exceptions whose handlers are currently executing (for bare `raise`).
    exc_stack: Vec<Value>,
    /// Whether `await`/`async for`/`async with` are currently legal.
    in_async: bool,
    /// Yield sinks of generator bodies currently being collected.
    yield_buffers: Vec<Vec<Value>>,
    /// Heap objects currently being repr'd (cycle guard).
    repr_seen: Vec<HeapId>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        heap: &'a mut Heap,
        scopes: &'a mut Scopes,
        print: &'a mut dyn PrintWriter,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            heap,
            scopes,
            print,
            limits,
            depth: 0,
            frames: Vec::new(),
            exc_stack: Vec::new(),
            in_async: false,
            yield_buffers: Vec::new(),
            repr_seen: Vec::new(),
        }
    }

    /// Runs a module; the result is the value of the last expression
    /// statement, or `None` if the module ends with something else.
    pub fn exec_module(&mut self, module: &Module, async_mode: bool) -> RunResult<Value> {
        self.in_async = async_mode;
        let mut last = Value::None;
        for stmt in &module.body {
            if let StmtKind::Expr(e) = &stmt.kind {
                last = self.eval_expr(e, GLOBAL_SCOPE).map_err(|err| err.at(stmt.loc))?;
            } else {
                last = Value::None;
                match self.exec_stmt(stmt, GLOBAL_SCOPE)? {
                    Flow::Normal => {}
                    Flow::Return(_) => {
                        return Err(ExcType::SyntaxError.msg("'return' outside function").at(stmt.loc));
                    }
                    Flow::Break => {
                        return Err(ExcType::SyntaxError.msg("'break' outside loop").at(stmt.loc));
                    }
                    Flow::Continue => {
                        return Err(ExcType::SyntaxError.msg("'continue' not properly in loop").at(stmt.loc));
                    }
                }
            }
        }
        Ok(last)
    }

    pub(crate) fn exec_block(&mut self, body: &[Stmt], scope: ScopeId) -> ExecResult {
        for stmt in body {
            match self.exec_stmt(stmt, scope)? {
                Flow::Normal => {}
                signal => return Ok(signal),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, scope: ScopeId) -> ExecResult {
        self.exec_stmt_inner(stmt, scope).map_err(|err| err.at(stmt.loc))
    }

    fn exec_stmt_inner(&mut self, stmt: &Stmt, scope: ScopeId) -> ExecResult {
        match &stmt.kind {
            StmtKind::Expr(e) => {
                self.eval_expr(e, scope)?;
                Ok(Flow::Normal)
            }
            StmtKind::Assign { targets, value } => {
                let value = self.eval_expr(value, scope)?;
                for target in targets {
                    self.assign_target(target, value, scope)?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::AugAssign { target, op, value } => {
                self.exec_aug_assign(target, *op, value, scope)?;
                Ok(Flow::Normal)
            }
            StmtKind::AnnAssign {
                target,
                annotation,
                value,
            } => {
                // Annotations are evaluated for effect only.
                self.eval_expr(annotation, scope)?;
                if let Some(value) = value {
                    let value = self.eval_expr(value, scope)?;
                    self.assign_target(target, value, scope)?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::Delete(targets) => {
                for target in targets {
                    self.delete_target(target, scope)?;
                }
                Ok(Flow::Normal)
            }
            StmtKind::Pass | StmtKind::Import => Ok(Flow::Normal),
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
            StmtKind::Return(value) => {
                let value = match value {
                    Some(e) => self.eval_expr(e, scope)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
            StmtKind::Raise { exc, cause } => {
                let err = self.exec_raise(exc.as_ref(), cause.as_ref(), scope)?;
                Err(err)
            }
            // Declarations were applied by the static pass at scope entry.
            StmtKind::Global(_) | StmtKind::Nonlocal(_) => Ok(Flow::Normal),
            StmtKind::If { test, body, orelse } => {
                let test = self.eval_expr(test, scope)?;
                if self.truthy(test)? {
                    self.exec_block(body, scope)
                } else {
                    self.exec_block(orelse, scope)
                }
            }
            StmtKind::While { test, body, orelse } => self.exec_while(test, body, orelse, scope),
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            } => self.exec_for(target, iter, body, orelse, *is_async, scope),
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            } => self.exec_try(body, handlers, orelse, finalbody, scope),
            StmtKind::With {
                items,
                body,
                is_async,
            } => self.exec_with(items, body, *is_async, scope),
            StmtKind::Match { subject, cases } => self.exec_match(subject, cases, scope),
            StmtKind::FunctionDef(def) => {
                let func = self.define_function(def, scope)?;
                self.scopes.set(scope, &def.name, func);
                Ok(Flow::Normal)
            }
            StmtKind::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            } => {
                let class = self.define_class(name, bases, keywords, body, decorators, scope)?;
                self.scopes.set(scope, name, class);
                Ok(Flow::Normal)
            }
            StmtKind::Assert { test, msg } => {
                let test = self.eval_expr(test, scope)?;
                if self.truthy(test)? {
                    return Ok(Flow::Normal);
                }
                let err = match msg {
                    Some(msg) => {
                        let value = self.eval_expr(msg, scope)?;
                        let text = self.py_str(value)?;
                        ExcType::AssertionError.msg(text)
                    }
                    None => RunError::simple(SimpleException::no_args(ExcType::AssertionError)),
                };
                Err(err)
            }
        }
    }

    // --- truthiness ---

    /// `bool(x)`: `__bool__` if defined, else `__len__() != 0`, else true
    /// for instances; structural for everything else.
    pub(crate) fn truthy(&mut self, value: Value) -> RunResult<bool> {
        if let Some(result) = py_truthy_structural(value, self.heap) {
            return Ok(result);
        }
        if let Some(result) = self.call_dunder(value, "__bool__", crate::args::ArgValues::Empty)? {
            return match result {
                Value::Bool(b) => Ok(b),
                other => Err(ExcType::type_error(format!(
                    "__bool__ should return bool, returned {}",
                    other.type_name(self.heap)
                ))),
            };
        }
        if let Some(result) = self.call_dunder(value, "__len__", crate::args::ArgValues::Empty)? {
            return Ok(crate::value::as_int(result, self.heap).is_some_and(|n| n != 0));
        }
        Ok(true)
    }

    // --- assignment targets ---

    pub(crate) fn assign_target(&mut self, target: &Expr, value: Value, scope: ScopeId) -> RunResult<()> {
        match &target.kind {
            ExprKind::Name(name) => {
                self.scopes.set(scope, name, value);
                Ok(())
            }
            ExprKind::Tuple(items) | ExprKind::List(items) => self.unpack_assign(items, value, scope),
            ExprKind::Subscript { value: obj, index } => {
                let obj = self.eval_expr(obj, scope)?;
                let index = self.eval_expr(index, scope)?;
                self.set_item(obj, index, value)
            }
            ExprKind::Attribute { value: obj, attr } => {
                let obj = self.eval_expr(obj, scope)?;
                self.set_attr(obj, attr, value)
            }
            ExprKind::Starred(_) => Err(ExcType::SyntaxError.msg("starred assignment target must be in a list or tuple")),
            _ => Err(ExcType::SyntaxError.msg("cannot assign to expression")),
        }
    }

    /// Tuple/list target unpacking, including a single starred slot.
    fn unpack_assign(&mut self, targets: &[Expr], value: Value, scope: ScopeId) -> RunResult<()> {
        let values = self.collect_iterable(value)?;
        let star_pos = targets
            .iter()
            .position(|t| matches!(t.kind, ExprKind::Starred(_)));

        match star_pos {
            None => {
                crate::types::list::check_unpack_arity(targets.len(), values.len())?;
                for (target, value) in targets.iter().zip(values) {
                    self.assign_target(target, value, scope)?;
                }
            }
            Some(star) => {
                let before = star;
                let after = targets.len() - star - 1;
                if values.len() < before + after {
                    return Err(ExcType::value_error(format!(
                        "not enough values to unpack (expected at least {}, got {})",
                        before + after,
                        values.len()
                    )));
                }
                for (target, value) in targets[..before].iter().zip(&values[..before]) {
                    self.assign_target(target, *value, scope)?;
                }
                let middle: Vec<Value> = values[before..values.len() - after].to_vec();
                let middle = self.heap.alloc_list(middle);
                let ExprKind::Starred(inner) = &targets[star].kind else {
                    unreachable!("position found above");
                };
                self.assign_target(inner, middle, scope)?;
                for (target, value) in targets[star + 1..].iter().zip(&values[values.len() - after..]) {
                    self.assign_target(target, *value, scope)?;
                }
            }
        }
        Ok(())
    }

    fn exec_aug_assign(
        &mut self,
        target: &Expr,
        op: crate::ast::BinOp,
        value: &Expr,
        scope: ScopeId,
    ) -> RunResult<()> {
        let rhs = self.eval_expr(value, scope)?;
        match &target.kind {
            ExprKind::Name(name) => {
                let current = self.scopes.get(scope, name)?;
                let result = self.inplace_binary_op(op, current, rhs)?;
                self.scopes.set(scope, name, result);
            }
            ExprKind::Subscript { value: obj, index } => {
                let obj = self.eval_expr(obj, scope)?;
                let index = self.eval_expr(index, scope)?;
                let current = self.get_item(obj, index)?;
                let result = self.inplace_binary_op(op, current, rhs)?;
                self.set_item(obj, index, result)?;
            }
            ExprKind::Attribute { value: obj, attr } => {
                let obj = self.eval_expr(obj, scope)?;
                let current = self.get_attr(obj, attr)?;
                let result = self.inplace_binary_op(op, current, rhs)?;
                self.set_attr(obj, attr, result)?;
            }
            _ => return Err(ExcType::SyntaxError.msg("illegal target for augmented assignment")),
        }
        Ok(())
    }

    fn delete_target(&mut self, target: &Expr, scope: ScopeId) -> RunResult<()> {
        match &target.kind {
            ExprKind::Name(name) => self.scopes.del(scope, name),
            ExprKind::Subscript { value, index } => {
                let obj = self.eval_expr(value, scope)?;
                let index = self.eval_expr(index, scope)?;
                self.del_item(obj, index)
            }
            ExprKind::Attribute { value, attr } => {
                let obj = self.eval_expr(value, scope)?;
                self.del_attr(obj, attr)
            }
            _ => Err(ExcType::SyntaxError.msg("cannot delete expression")),
        }
    }

    // --- loops ---

    fn exec_while(&mut self, test: &Expr, body: &[Stmt], orelse: &[Stmt], scope: ScopeId) -> ExecResult {
        loop {
            let test_value = self.eval_expr(test, scope)?;
            if !self.truthy(test_value)? {
                // Normal exit (condition false): the else clause runs.
                return self.exec_block(orelse, scope);
            }
            match self.exec_block(body, scope)? {
                Flow::Normal | Flow::Continue => {}
                Flow::Break => return Ok(Flow::Normal),
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
    }

    fn exec_for(
        &mut self,
        target: &Expr,
        iter: &Expr,
        body: &[Stmt],
        orelse: &[Stmt],
        is_async: bool,
        scope: ScopeId,
    ) -> ExecResult {
        if is_async && !self.in_async {
            return Err(ExcType::SyntaxError.msg("'async for' outside async function"));
        }
        let iterable = self.eval_expr(iter, scope)?;
        let iterator = if is_async {
            self.get_async_iter(iterable)?
        } else {
            self.get_iter(iterable)?
        };
        loop {
            let next = if is_async {
                self.async_iter_next(iterator)?
            } else {
                self.iter_next(iterator)?
            };
            let Some(item) = next else {
                // Exhausted without break: the else clause runs.
                return self.exec_block(orelse, scope);
            };
            self.assign_target(target, item, scope)?;
            match self.exec_block(body, scope)? {
                Flow::Normal | Flow::Continue => {}
                Flow::Break => return Ok(Flow::Normal),
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
    }

    // --- raise / try / with ---

    /// Builds the `RunError` for a `raise` statement.
    fn exec_raise(
        &mut self,
        exc: Option<&Expr>,
        cause: Option<&Expr>,
        scope: ScopeId,
    ) -> RunResult<RunError> {
        let Some(exc) = exc else {
            // Bare raise: re-raise the innermost active exception.
            return match self.exc_stack.last() {
                Some(active) => Ok(RunError::object(*active)),
                None => Ok(ExcType::runtime_error("No active exception to re-raise")),
            };
        };
        let value = self.eval_expr(exc, scope)?;
        if let Some(cause) = cause {
            // The cause is evaluated; explicit chaining is not modeled.
            self.eval_expr(cause, scope)?;
        }
        self.raise_value(value)
    }

    /// Raising accepts an exception class (instantiated with no arguments),
    /// an exception instance, or an already-raised exception object.
    pub(crate) fn raise_value(&mut self, value: Value) -> RunResult<RunError> {
        match value {
            Value::Builtin(Builtins::Exc(exc_type)) => {
                let obj = self
                    .heap
                    .alloc_value(HeapData::Exception(SimpleException::no_args(exc_type)));
                Ok(RunError::object(obj))
            }
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Exception(_) => Ok(RunError::object(value)),
                HeapData::Instance(instance) => {
                    if crate::types::class_exc_base(self.heap, instance.class_id).is_some() {
                        Ok(RunError::object(value))
                    } else {
                        Err(ExcType::type_error("exceptions must derive from BaseException"))
                    }
                }
                HeapData::ClassObject(cls) => {
                    if cls.exc_base.is_some() {
                        self.call_value(value, crate::args::ArgValues::Empty)
                            .map(RunError::object)
                    } else {
                        Err(ExcType::type_error("exceptions must derive from BaseException"))
                    }
                }
                _ => Err(ExcType::type_error("exceptions must derive from BaseException")),
            },
            _ => Err(ExcType::type_error("exceptions must derive from BaseException")),
        }
    }

    fn exec_try(
        &mut self,
        body: &[Stmt],
        handlers: &[ExceptHandler],
        orelse: &[Stmt],
        finalbody: &[Stmt],
        scope: ScopeId,
    ) -> ExecResult {
        let mut pending = self.exec_block(body, scope);

        match pending {
            Ok(Flow::Normal) => {
                // Body completed without raising: else runs, still under finally.
                pending = self.exec_block(orelse, scope);
            }
            Ok(_) => {}
            Err(err) => {
                pending = self.run_handlers(err, handlers, scope);
            }
        }

        // finally runs on every path; if it raises or diverts control flow,
        // that outcome wins over the pending one.
        match self.exec_block(finalbody, scope)? {
            Flow::Normal => pending,
            diverted => Ok(diverted),
        }
    }

    /// Iterates handlers in order looking for a match. A matching handler's
    /// outcome replaces the exception; with no match the original error is
    /// returned so `exec_try` can still run `finally` before re-raising.
    fn run_handlers(&mut self, err: RunError, handlers: &[ExceptHandler], scope: ScopeId) -> ExecResult {
        for handler in handlers {
            let matches = match &handler.filter {
                None => true,
                Some(filter) => {
                    let filter_value = self.eval_expr(filter, scope)?;
                    self.exception_matches(&err, filter_value)?
                }
            };
            if !matches {
                continue;
            }

            let exc_value = self.materialize_exception(&err);
            if let Some(name) = &handler.name {
                // Binding is in the enclosing scope and is not cleared after
                // the handler body.
                self.scopes.set(scope, name, exc_value);
            }
            self.exc_stack.push(exc_value);
            let outcome = self.exec_block(&handler.body, scope);
            self.exc_stack.pop();
            return outcome;
        }
        Err(err)
    }

    /// Tests an in-flight exception against an `except` filter: a single
    /// class or a tuple of classes.
    pub(crate) fn exception_matches(&mut self, err: &RunError, filter: Value) -> RunResult<bool> {
        if let Value::Ref(id) = filter
            && let HeapData::Tuple(items) = self.heap.get(id)
        {
            let items = items.clone();
            for item in items {
                if self.exception_matches(err, item)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        let (actual_builtin, actual_class) = self.error_exc_kind(err);
        match filter {
            Value::Builtin(Builtins::Exc(expected)) => Ok(actual_builtin
                .is_some_and(|actual| actual.is_subclass_of(expected))),
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::ClassObject(expected_cls) => {
                    if expected_cls.exc_base.is_none() {
                        return Err(ExcType::type_error(
                            "catching classes that do not inherit from BaseException is not allowed",
                        ));
                    }
                    Ok(actual_class.is_some_and(|actual_id| {
                        match self.heap.get(actual_id) {
                            HeapData::ClassObject(actual_cls) => actual_cls.is_subclass_of(actual_id, id),
                            _ => false,
                        }
                    }))
                }
                _ => Err(ExcType::type_error(
                    "catching classes that do not inherit from BaseException is not allowed",
                )),
            },
            _ => Err(ExcType::type_error(
                "catching classes that do not inherit from BaseException is not allowed",
            )),
        }
    }

    /// The builtin exception type and (for user exceptions) class of an
    /// in-flight error.
    fn error_exc_kind(&self, err: &RunError) -> (Option<ExcType>, Option<HeapId>) {
        match &err.payload {
            ExcPayload::Simple(exc) => (Some(exc.exc_type), None),
            ExcPayload::Object(value) => match value {
                Value::Ref(id) => match self.heap.get(*id) {
                    HeapData::Exception(exc) => (Some(exc.exc_type), None),
                    HeapData::Instance(instance) => (
                        crate::types::class_exc_base(self.heap, instance.class_id),
                        Some(instance.class_id),
                    ),
                    _ => (None, None),
                },
                _ => (None, None),
            },
        }
    }

    /// The exception object for handler binding, allocating lightweight
    /// payloads on first use.
    pub(crate) fn materialize_exception(&mut self, err: &RunError) -> Value {
        match &err.payload {
            ExcPayload::Simple(exc) => self.heap.alloc_value(HeapData::Exception(exc.clone())),
            ExcPayload::Object(value) => *value,
        }
    }

    fn exec_with(&mut self, items: &[WithItem], body: &[Stmt], is_async: bool, scope: ScopeId) -> ExecResult {
        if is_async && !self.in_async {
            return Err(ExcType::SyntaxError.msg("'async with' outside async function"));
        }
        self.exec_with_items(items, body, is_async, scope)
    }

    /// Enters items left to right, recursing so exits run right to left on
    /// every path.
    fn exec_with_items(
        &mut self,
        items: &[WithItem],
        body: &[Stmt],
        is_async: bool,
        scope: ScopeId,
    ) -> ExecResult {
        let Some((item, rest)) = items.split_first() else {
            return self.exec_block(body, scope);
        };

        let (enter_name, exit_name) = if is_async {
            ("__aenter__", "__aexit__")
        } else {
            ("__enter__", "__exit__")
        };

        let context = self.eval_expr(&item.context, scope)?;
        let type_name = context.type_name(self.heap).into_owned();
        // Look up __exit__ before entering, so a missing exit fails fast.
        let exit_method = self.get_attr(context, exit_name).map_err(|_| {
            ExcType::type_error(format!(
                "'{type_name}' object does not support the context manager protocol"
            ))
        })?;
        let entered = match self.call_dunder(context, enter_name, crate::args::ArgValues::Empty)? {
            Some(value) => value,
            None => {
                return Err(ExcType::type_error(format!(
                    "'{type_name}' object does not support the context manager protocol"
                )));
            }
        };
        let entered = if is_async { self.await_value(entered)? } else { entered };

        if let Some(target) = &item.target {
            self.assign_target(target, entered, scope)?;
        }

        let outcome = self.exec_with_items(rest, body, is_async, scope);

        match outcome {
            Err(err) => {
                // Exceptional exit: __exit__(type, value, tb); truthy swallows.
                let exc_value = self.materialize_exception(&err);
                let exc_class = self.exception_class_value(exc_value);
                let args = crate::args::ArgValues::Many {
                    args: vec![exc_class, exc_value, Value::None],
                    kwargs: Vec::new(),
                };
                let exit_result = self.call_value(exit_method, args)?;
                let exit_result = if is_async { self.await_value(exit_result)? } else { exit_result };
                if self.truthy(exit_result)? {
                    Ok(Flow::Normal)
                } else {
                    Err(err)
                }
            }
            ok => {
                // Normal or signal exit: __exit__(None, None, None), result
                // discarded. Signals keep propagating afterwards.
                let args = crate::args::ArgValues::Many {
                    args: vec![Value::None, Value::None, Value::None],
                    kwargs: Vec::new(),
                };
                let exit_result = self.call_value(exit_method, args)?;
                if is_async {
                    self.await_value(exit_result)?;
                }
                ok
            }
        }
    }

    /// The class value of an exception object (for `__exit__`'s first
    /// argument and `type(e)`).
    pub(crate) fn exception_class_value(&self, exc: Value) -> Value {
        match exc {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Exception(simple) => Value::Builtin(Builtins::Exc(simple.exc_type)),
                HeapData::Instance(instance) => Value::Ref(instance.class_id),
                _ => Value::None,
            },
            _ => Value::None,
        }
    }

    // --- match ---

    fn exec_match(&mut self, subject: &Expr, cases: &[MatchCase], scope: ScopeId) -> ExecResult {
        let subject = self.eval_expr(subject, scope)?;
        for case in cases {
            if !self.match_pattern(&case.pattern, subject, scope)? {
                continue;
            }
            if let Some(guard) = &case.guard {
                let guard_value = self.eval_expr(guard, scope)?;
                if !self.truthy(guard_value)? {
                    continue;
                }
            }
            return self.exec_block(&case.body, scope);
        }
        Ok(Flow::Normal)
    }

    fn match_pattern(&mut self, pattern: &Pattern, subject: Value, scope: ScopeId) -> RunResult<bool> {
        match pattern {
            Pattern::Wildcard => Ok(true),
            Pattern::Capture(name) => {
                self.scopes.set(scope, name, subject);
                Ok(true)
            }
            Pattern::Literal(expr) | Pattern::Value(expr) => {
                let expected = self.eval_expr(expr, scope)?;
                self.value_eq(subject, expected)
            }
            Pattern::Or(alternatives) => {
                for alt in alternatives {
                    if self.match_pattern(alt, subject, scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Pattern::Sequence(patterns) => {
                let items = match subject {
                    Value::Ref(id) => match self.heap.get(id) {
                        HeapData::List(items) | HeapData::Tuple(items) => items.clone(),
                        _ => return Ok(false),
                    },
                    _ => return Ok(false),
                };
                if items.len() != patterns.len() {
                    return Ok(false);
                }
                for (pattern, item) in patterns.iter().zip(items) {
                    if !self.match_pattern(pattern, item, scope)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    // --- definitions ---

    /// Creates a function object for a `def` statement and applies its
    /// decorators (evaluated in source order, applied in reverse).
    fn define_function(&mut self, def: &Rc<FunctionDef>, scope: ScopeId) -> RunResult<Value> {
        let mut defaults = Vec::new();
        for param in &def.params.args {
            if let Some(default) = &param.default {
                defaults.push(self.eval_expr(default, scope)?);
            }
        }
        let mut kw_defaults = Vec::new();
        for param in &def.params.kwonly {
            kw_defaults.push(match &param.default {
                Some(default) => Some(self.eval_expr(default, scope)?),
                None => None,
            });
        }
        if let Some(returns) = &def.returns {
            self.eval_expr(returns, scope)?;
        }

        // Methods capture the scope *around* the class body; class-body
        // names are not visible to them.
        let closure = if self.scopes.kind(scope) == ScopeKind::Class {
            self.scopes.parent(scope).unwrap_or(GLOBAL_SCOPE)
        } else {
            scope
        };

        let func = self.heap.alloc_value(HeapData::Function(FunctionObject {
            name: def.name.clone(),
            body: FunctionBody::Def(Rc::clone(def)),
            closure,
            defaults,
            kw_defaults,
            is_async: def.is_async,
            is_generator: def.is_generator,
            defining_class: None,
            attrs: ahash::AHashMap::new(),
        }));

        // @a @b def f -> f = a(b(f))
        let mut decorator_values = Vec::with_capacity(def.decorators.len());
        for decorator in &def.decorators {
            decorator_values.push(self.eval_expr(decorator, scope)?);
        }
        let mut result = func;
        for decorator in decorator_values.into_iter().rev() {
            result = self.call_value(decorator, crate::args::ArgValues::One(result))?;
        }
        Ok(result)
    }

    fn define_class(
        &mut self,
        name: &str,
        bases: &[Expr],
        keywords: &[(String, Expr)],
        body: &[Stmt],
        decorators: &[Expr],
        scope: ScopeId,
    ) -> RunResult<Value> {
        // Class keywords (metaclass=...) are evaluated for effect only.
        for (_, value) in keywords {
            self.eval_expr(value, scope)?;
        }

        let mut base_ids = Vec::new();
        let mut exc_base = None;
        for base in bases {
            let base_value = self.eval_expr(base, scope)?;
            match base_value {
                Value::Ref(id) if matches!(self.heap.get(id), HeapData::ClassObject(_)) => {
                    base_ids.push(id);
                }
                Value::Builtin(Builtins::Exc(exc_type)) => {
                    if exc_base.is_none() {
                        exc_base = Some(exc_type);
                    }
                }
                other => {
                    return Err(ExcType::type_error(format!(
                        "cannot inherit from '{}'",
                        other.type_name(self.heap)
                    )));
                }
            }
        }
        // Inherit exception-ness through user bases.
        if exc_base.is_none() {
            for &base_id in &base_ids {
                if let Some(base_exc) = crate::types::class_exc_base(self.heap, base_id) {
                    exc_base = Some(base_exc);
                    break;
                }
            }
        }

        // The class body runs in its own scope kind.
        let info = prepare::collect_body_locals(body);
        let class_scope = self.scopes.new_scope(scope, ScopeKind::Class, &info)?;
        match self.exec_block(body, class_scope)? {
            Flow::Normal => {}
            _ => return Err(ExcType::SyntaxError.msg("'return' outside function")),
        }

        let mut namespace: Vec<(String, Value)> = self
            .scopes
            .bindings(class_scope)
            .map(|(k, v)| (k.clone(), v))
            .collect();
        namespace.sort_by(|a, b| a.0.cmp(&b.0));

        let class_id = self.heap.allocate(HeapData::ClassObject(ClassObject {
            name: name.to_string(),
            bases: base_ids.clone(),
            exc_base,
            mro: Vec::new(),
            namespace: namespace.clone().into_iter().collect(),
        }));
        let mro = compute_c3_mro(class_id, &base_ids, self.heap)?;
        if let HeapData::ClassObject(cls) = self.heap.get_mut(class_id) {
            cls.mro = mro;
        }

        // Functions defined in the body get this class as their pivot for
        // zero-argument super(), including through descriptor wrappers.
        for (_, value) in &namespace {
            self.set_defining_class(*value, class_id);
        }

        let mut result = Value::Ref(class_id);
        let mut decorator_values = Vec::with_capacity(decorators.len());
        for decorator in decorators {
            decorator_values.push(self.eval_expr(decorator, scope)?);
        }
        for decorator in decorator_values.into_iter().rev() {
            result = self.call_value(decorator, crate::args::ArgValues::One(result))?;
        }
        Ok(result)
    }

    fn set_defining_class(&mut self, value: Value, class_id: HeapId) {
        let Value::Ref(id) = value else { return };
        match self.heap.get(id) {
            HeapData::Function(_) => {
                if let HeapData::Function(func) = self.heap.get_mut(id)
                    && func.defining_class.is_none()
                {
                    func.defining_class = Some(class_id);
                }
            }
            HeapData::ClassMethod(inner) | HeapData::StaticMethod(inner) => {
                let inner = *inner;
                self.set_defining_class(inner, class_id);
            }
            HeapData::Property(property) => {
                let (fget, fset, fdel) = (property.fget, property.fset, property.fdel);
                for accessor in [fget, fset, fdel].into_iter().flatten() {
                    self.set_defining_class(accessor, class_id);
                }
            }
            _ => {}
        }
    }

    // --- frames ---

    pub(crate) fn push_frame(
        &mut self,
        defining_class: Option<HeapId>,
        first_arg: Option<Value>,
    ) -> RunResult<()> {
        if self.depth >= self.limits.max_recursion_depth {
            return Err(ExcType::RecursionError.msg("maximum recursion depth exceeded"));
        }
        self.depth += 1;
        self.frames.push(FrameCtx {
            defining_class,
            first_arg,
        });
        Ok(())
    }

    pub(crate) fn pop_frame(&mut self) {
        self.depth -= 1;
        self.frames.pop();
    }

    /// The context zero-argument `super()` needs: the class the innermost
    /// executing function was defined on and its first positional argument.
    pub(crate) fn current_super_context(&self) -> Option<(HeapId, Value)> {
        let frame = self.frames.last()?;
        Some((frame.defining_class?, frame.first_arg?))
    }

    pub(crate) fn in_async_context(&self) -> bool {
        self.in_async
    }

    pub(crate) fn set_async_context(&mut self, value: bool) -> bool {
        std::mem::replace(&mut self.in_async, value)
    }

    // --- yield collection ---

    pub(crate) fn push_yield_buffer(&mut self) {
        self.yield_buffers.push(Vec::new());
    }

    pub(crate) fn pop_yield_buffer(&mut self) -> Vec<Value> {
        self.yield_buffers.pop().unwrap_or_default()
    }

    pub(crate) fn emit_yield(&mut self, value: Value) -> RunResult<()> {
        match self.yield_buffers.last_mut() {
            Some(buffer) => {
                buffer.push(value);
                Ok(())
            }
            None => Err(ExcType::SyntaxError.msg("'yield' outside function")),
        }
    }

    // --- error rendering ---

    /// Converts an uncaught error into the public exception type.
    pub(crate) fn to_exception(&mut self, err: RunError) -> Exception {
        let loc = err.loc;
        match err.payload {
            ExcPayload::Simple(exc) => {
                let message = self.simple_exception_message(&exc);
                Exception::new(exc.exc_type.to_string(), message, loc)
            }
            ExcPayload::Object(value) => {
                let kind = value.type_name(self.heap).into_owned();
                let message = self.exception_object_message(value);
                Exception::new(kind, message, loc)
            }
        }
    }

    pub(crate) fn simple_exception_message(&mut self, exc: &SimpleException) -> String {
        if let Some(message) = &exc.message {
            return message.clone();
        }
        match exc.args.len() {
            0 => String::new(),
            1 => {
                if exc.exc_type == ExcType::KeyError {
                    self.py_repr(exc.args[0]).unwrap_or_default()
                } else {
                    self.py_str(exc.args[0]).unwrap_or_default()
                }
            }
            _ => {
                let tuple = self.heap.alloc_tuple(exc.args.to_vec());
                self.py_repr(tuple).unwrap_or_default()
            }
        }
    }

    fn exception_object_message(&mut self, value: Value) -> String {
        match value {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Exception(exc) => {
                    let exc = exc.clone();
                    self.simple_exception_message(&exc)
                }
                HeapData::Instance(instance) => {
                    let args = instance.attrs.get("args").copied();
                    match args {
                        Some(Value::Ref(args_id)) => {
                            let items = match self.heap.get(args_id) {
                                HeapData::Tuple(items) => items.clone(),
                                _ => Vec::new(),
                            };
                            match items.len() {
                                0 => String::new(),
                                1 => self.py_str(items[0]).unwrap_or_default(),
                                _ => self.py_repr(Value::Ref(args_id)).unwrap_or_default(),
                            }
                        }
                        _ => String::new(),
                    }
                }
                _ => String::new(),
            },
            _ => String::new(),
        }
    }

}
