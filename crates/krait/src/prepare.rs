//! Static analysis run between parsing and execution.
//!
//! Two passes, both structural and both careful never to descend into nested
//! `def`/`class` bodies (each body gets its own pass):
//!
//! - the *locals pre-pass*: every name that any assignment-creating construct
//!   in a function body targets is local to that function, except names the
//!   body declares `global` or `nonlocal`. This is what makes
//!   `UnboundLocalError` observable before the first assignment.
//! - the *generator scan*: a function containing `yield`/`yield from` at its
//!   own level is a generator function.

use ahash::AHashSet;

use crate::ast::{Comprehension, Expr, ExprKind, Params, Pattern, Stmt, StmtKind};

/// Name classification for one function (or module/class) body.
#[derive(Debug, Default)]
pub(crate) struct LocalInfo {
    /// Names assigned somewhere in the body (minus declared global/nonlocal).
    pub locals: AHashSet<String>,
    /// Names declared `global` in the body.
    pub globals: AHashSet<String>,
    /// Names declared `nonlocal` in the body.
    pub nonlocals: AHashSet<String>,
}

/// Computes the local-name set for a function body with the given parameters.
///
/// Parameters are always local. Assignment targets of every kind count:
/// plain/chained/augmented/annotated assignment, tuple and list unpacking,
/// starred targets, `for` targets, `with … as` targets, exception handler
/// names, walrus targets, `match` captures, and nested `def`/`class` names.
pub(crate) fn collect_locals(params: &Params, body: &[Stmt]) -> LocalInfo {
    let mut info = LocalInfo::default();
    for name in params.names() {
        info.locals.insert(name.to_string());
    }
    scan_stmts(body, &mut info);
    for name in &info.globals {
        info.locals.remove(name);
    }
    for name in &info.nonlocals {
        info.locals.remove(name);
    }
    info
}

/// Locals pre-pass entry for bodies with no parameters (modules, class bodies).
pub(crate) fn collect_body_locals(body: &[Stmt]) -> LocalInfo {
    collect_locals(&Params::default(), body)
}

/// The local set of a comprehension scope: the targets of every `for`
/// clause. This is what keeps comprehension targets from leaking into the
/// enclosing scope.
pub(crate) fn comprehension_locals(generators: &[Comprehension]) -> LocalInfo {
    let mut info = LocalInfo::default();
    for generator in generators {
        bind_target(&generator.target, &mut info);
    }
    info
}

/// Returns true when the body yields at its own level, marking the enclosing
/// function as a generator. Nested functions and lambdas are not entered.
pub(crate) fn body_is_generator(body: &[Stmt]) -> bool {
    body.iter().any(stmt_yields)
}

fn scan_stmts(body: &[Stmt], info: &mut LocalInfo) {
    for stmt in body {
        scan_stmt(stmt, info);
    }
}

fn scan_stmt(stmt: &Stmt, info: &mut LocalInfo) {
    match &stmt.kind {
        StmtKind::Expr(e) => scan_expr(e, info),
        StmtKind::Assign { targets, value } => {
            for target in targets {
                bind_target(target, info);
            }
            scan_expr(value, info);
        }
        StmtKind::AugAssign { target, value, .. } => {
            bind_target(target, info);
            scan_expr(value, info);
        }
        StmtKind::AnnAssign { target, value, .. } => {
            bind_target(target, info);
            if let Some(value) = value {
                scan_expr(value, info);
            }
        }
        StmtKind::Delete(targets) => {
            // `del x` requires x to be local too.
            for target in targets {
                bind_target(target, info);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                scan_expr(value, info);
            }
        }
        StmtKind::Raise { exc, cause } => {
            if let Some(exc) = exc {
                scan_expr(exc, info);
            }
            if let Some(cause) = cause {
                scan_expr(cause, info);
            }
        }
        StmtKind::Global(names) => {
            for name in names {
                info.globals.insert(name.clone());
            }
        }
        StmtKind::Nonlocal(names) => {
            for name in names {
                info.nonlocals.insert(name.clone());
            }
        }
        StmtKind::If { test, body, orelse } => {
            scan_expr(test, info);
            scan_stmts(body, info);
            scan_stmts(orelse, info);
        }
        StmtKind::While { test, body, orelse } => {
            scan_expr(test, info);
            scan_stmts(body, info);
            scan_stmts(orelse, info);
        }
        StmtKind::For {
            target,
            iter,
            body,
            orelse,
            ..
        } => {
            bind_target(target, info);
            scan_expr(iter, info);
            scan_stmts(body, info);
            scan_stmts(orelse, info);
        }
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            scan_stmts(body, info);
            for handler in handlers {
                if let Some(filter) = &handler.filter {
                    scan_expr(filter, info);
                }
                if let Some(name) = &handler.name {
                    info.locals.insert(name.clone());
                }
                scan_stmts(&handler.body, info);
            }
            scan_stmts(orelse, info);
            scan_stmts(finalbody, info);
        }
        StmtKind::With { items, body, .. } => {
            for item in items {
                scan_expr(&item.context, info);
                if let Some(target) = &item.target {
                    bind_target(target, info);
                }
            }
            scan_stmts(body, info);
        }
        StmtKind::Match { subject, cases } => {
            scan_expr(subject, info);
            for case in cases {
                bind_pattern(&case.pattern, info);
                if let Some(guard) = &case.guard {
                    scan_expr(guard, info);
                }
                scan_stmts(&case.body, info);
            }
        }
        // The nested body is not descended; only the bound name counts here.
        StmtKind::FunctionDef(def) => {
            info.locals.insert(def.name.clone());
            for decorator in &def.decorators {
                scan_expr(decorator, info);
            }
            for param in def.params.args.iter().chain(&def.params.kwonly) {
                if let Some(default) = &param.default {
                    scan_expr(default, info);
                }
            }
        }
        StmtKind::ClassDef {
            name, bases, decorators, ..
        } => {
            info.locals.insert(name.clone());
            for base in bases {
                scan_expr(base, info);
            }
            for decorator in decorators {
                scan_expr(decorator, info);
            }
        }
        StmtKind::Assert { test, msg } => {
            scan_expr(test, info);
            if let Some(msg) = msg {
                scan_expr(msg, info);
            }
        }
        StmtKind::Pass | StmtKind::Break | StmtKind::Continue | StmtKind::Import => {}
    }
}

/// Records every plain name inside an assignment target.
fn bind_target(target: &Expr, info: &mut LocalInfo) {
    match &target.kind {
        ExprKind::Name(name) => {
            info.locals.insert(name.clone());
        }
        ExprKind::Tuple(items) | ExprKind::List(items) => {
            for item in items {
                bind_target(item, info);
            }
        }
        ExprKind::Starred(inner) => bind_target(inner, info),
        // Attribute/subscript targets bind nothing; their bases are reads.
        ExprKind::Attribute { value, .. } => scan_expr(value, info),
        ExprKind::Subscript { value, index } => {
            scan_expr(value, info);
            scan_expr(index, info);
        }
        _ => {}
    }
}

fn bind_pattern(pattern: &Pattern, info: &mut LocalInfo) {
    match pattern {
        Pattern::Capture(name) => {
            info.locals.insert(name.clone());
        }
        Pattern::Or(alternatives) => {
            for alt in alternatives {
                bind_pattern(alt, info);
            }
        }
        Pattern::Sequence(items) => {
            for item in items {
                bind_pattern(item, info);
            }
        }
        Pattern::Literal(_) | Pattern::Wildcard | Pattern::Value(_) => {}
    }
}

/// Scans an expression for walrus targets (which bind in the enclosing
/// function scope) and recurses into sub-expressions.
fn scan_expr(expr: &Expr, info: &mut LocalInfo) {
    match &expr.kind {
        ExprKind::Named { target, value } => {
            info.locals.insert(target.clone());
            scan_expr(value, info);
        }
        ExprKind::Tuple(items) | ExprKind::List(items) | ExprKind::Set(items) => {
            for item in items {
                scan_expr(item, info);
            }
        }
        ExprKind::Dict { keys, values } => {
            for key in keys.iter().flatten() {
                scan_expr(key, info);
            }
            for value in values {
                scan_expr(value, info);
            }
        }
        ExprKind::Binary { left, right, .. } => {
            scan_expr(left, info);
            scan_expr(right, info);
        }
        ExprKind::Unary { operand, .. } => scan_expr(operand, info),
        ExprKind::BoolOp { values, .. } => {
            for value in values {
                scan_expr(value, info);
            }
        }
        ExprKind::Compare {
            left, comparators, ..
        } => {
            scan_expr(left, info);
            for comparator in comparators {
                scan_expr(comparator, info);
            }
        }
        ExprKind::IfExp { test, body, orelse } => {
            scan_expr(test, info);
            scan_expr(body, info);
            scan_expr(orelse, info);
        }
        ExprKind::Call { func, args } => {
            scan_expr(func, info);
            for arg in args {
                match arg {
                    crate::ast::CallArg::Positional(e)
                    | crate::ast::CallArg::Starred(e)
                    | crate::ast::CallArg::Keyword(_, e)
                    | crate::ast::CallArg::DoubleStarred(e) => scan_expr(e, info),
                }
            }
        }
        ExprKind::Attribute { value, .. } => scan_expr(value, info),
        ExprKind::Subscript { value, index } => {
            scan_expr(value, info);
            scan_expr(index, info);
        }
        ExprKind::Slice { lower, upper, step } => {
            for part in [lower, upper, step].into_iter().flatten() {
                scan_expr(part, info);
            }
        }
        ExprKind::ListComp { elt, generators }
        | ExprKind::SetComp { elt, generators }
        | ExprKind::GeneratorExp { elt, generators } => {
            scan_expr(elt, info);
            scan_comprehensions(generators, info);
        }
        ExprKind::DictComp {
            key,
            value,
            generators,
        } => {
            scan_expr(key, info);
            scan_expr(value, info);
            scan_comprehensions(generators, info);
        }
        ExprKind::Await(inner) | ExprKind::YieldFrom(inner) | ExprKind::Starred(inner) => {
            scan_expr(inner, info);
        }
        ExprKind::Yield(value) => {
            if let Some(value) = value {
                scan_expr(value, info);
            }
        }
        ExprKind::FString(elems) => {
            for elem in elems {
                if let crate::ast::FStringElem::Expr { expr, .. } = elem {
                    scan_expr(expr, info);
                }
            }
        }
        // Lambdas get their own pass; literals and names bind nothing.
        ExprKind::Lambda(_)
        | ExprKind::Int(_)
        | ExprKind::LongInt(_)
        | ExprKind::Float(_)
        | ExprKind::Imaginary(_)
        | ExprKind::Str(_)
        | ExprKind::Bytes(_)
        | ExprKind::Bool(_)
        | ExprKind::None
        | ExprKind::Name(_) => {}
    }
}

/// Comprehension targets bind in the comprehension's own scope, not here;
/// only walrus targets inside the clause expressions leak out.
fn scan_comprehensions(generators: &[Comprehension], info: &mut LocalInfo) {
    for generator in generators {
        scan_expr(&generator.iter, info);
        for cond in &generator.ifs {
            scan_expr(cond, info);
        }
    }
}

fn stmt_yields(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Expr(e) => expr_yields(e),
        StmtKind::Assign { targets, value } => targets.iter().any(expr_yields) || expr_yields(value),
        StmtKind::AugAssign { target, value, .. } => expr_yields(target) || expr_yields(value),
        StmtKind::AnnAssign { value, .. } => value.as_ref().is_some_and(expr_yields),
        StmtKind::Return(value) => value.as_ref().is_some_and(expr_yields),
        StmtKind::If { test, body, orelse } | StmtKind::While { test, body, orelse } => {
            expr_yields(test) || body.iter().any(stmt_yields) || orelse.iter().any(stmt_yields)
        }
        StmtKind::For {
            iter, body, orelse, ..
        } => expr_yields(iter) || body.iter().any(stmt_yields) || orelse.iter().any(stmt_yields),
        StmtKind::Try {
            body,
            handlers,
            orelse,
            finalbody,
        } => {
            body.iter().any(stmt_yields)
                || handlers.iter().any(|h| h.body.iter().any(stmt_yields))
                || orelse.iter().any(stmt_yields)
                || finalbody.iter().any(stmt_yields)
        }
        StmtKind::With { items, body, .. } => {
            items.iter().any(|i| expr_yields(&i.context)) || body.iter().any(stmt_yields)
        }
        StmtKind::Match { subject, cases } => {
            expr_yields(subject) || cases.iter().any(|c| c.body.iter().any(stmt_yields))
        }
        StmtKind::Assert { test, msg } => expr_yields(test) || msg.as_ref().is_some_and(expr_yields),
        StmtKind::Raise { exc, cause } => {
            exc.as_ref().is_some_and(expr_yields) || cause.as_ref().is_some_and(expr_yields)
        }
        // Nested function/class bodies do not make *this* function a generator.
        StmtKind::FunctionDef(_)
        | StmtKind::ClassDef { .. }
        | StmtKind::Delete(_)
        | StmtKind::Pass
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Global(_)
        | StmtKind::Nonlocal(_)
        | StmtKind::Import => false,
    }
}

fn expr_yields(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Yield(_) | ExprKind::YieldFrom(_) => true,
        ExprKind::Tuple(items) | ExprKind::List(items) | ExprKind::Set(items) => {
            items.iter().any(expr_yields)
        }
        ExprKind::Dict { keys, values } => {
            keys.iter().flatten().any(expr_yields) || values.iter().any(expr_yields)
        }
        ExprKind::Binary { left, right, .. } => expr_yields(left) || expr_yields(right),
        ExprKind::Unary { operand, .. } => expr_yields(operand),
        ExprKind::BoolOp { values, .. } => values.iter().any(expr_yields),
        ExprKind::Compare {
            left, comparators, ..
        } => expr_yields(left) || comparators.iter().any(expr_yields),
        ExprKind::IfExp { test, body, orelse } => {
            expr_yields(test) || expr_yields(body) || expr_yields(orelse)
        }
        ExprKind::Call { func, args } => {
            expr_yields(func)
                || args.iter().any(|arg| match arg {
                    crate::ast::CallArg::Positional(e)
                    | crate::ast::CallArg::Starred(e)
                    | crate::ast::CallArg::Keyword(_, e)
                    | crate::ast::CallArg::DoubleStarred(e) => expr_yields(e),
                })
        }
        ExprKind::Attribute { value, .. } => expr_yields(value),
        ExprKind::Subscript { value, index } => expr_yields(value) || expr_yields(index),
        ExprKind::Await(inner) | ExprKind::Starred(inner) => expr_yields(inner),
        ExprKind::Named { value, .. } => expr_yields(value),
        ExprKind::FString(elems) => elems.iter().any(|elem| match elem {
            crate::ast::FStringElem::Expr { expr, .. } => expr_yields(expr),
            crate::ast::FStringElem::Literal(_) => false,
        }),
        _ => false,
    }
}
