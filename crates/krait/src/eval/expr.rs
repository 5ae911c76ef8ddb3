//! Expression evaluation: literals, displays, comprehensions, subscripts,
//! f-strings, and the dispatch into the operator/attribute/call machinery.

use std::rc::Rc;

use crate::{
    args::ArgValues,
    ast::{BoolOpKind, Comprehension, Expr, ExprKind, FStringElem, UnaryOp},
    exception_private::{ExcType, RunResult},
    fstring::{format_float, format_int, format_str, parse_format_spec},
    heap::{HeapData, HeapId},
    namespace::ScopeId,
    prepare,
    types::{
        FunctionBody, FunctionObject, KraitIter, RangeObject, SliceObject, Type,
        normalize_index, resolve_slice_indices, slice_index_iter,
    },
    value::{Value, as_int, is_int_like},
};

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: ScopeId) -> RunResult<Value> {
        self.eval_expr_inner(expr, scope).map_err(|err| err.at(expr.loc))
    }

    fn eval_expr_inner(&mut self, expr: &Expr, scope: ScopeId) -> RunResult<Value> {
        match &expr.kind {
            ExprKind::Int(value) => Ok(Value::Int(*value)),
            ExprKind::LongInt(big) => Ok(self.heap.alloc_int((**big).clone())),
            ExprKind::Float(value) => Ok(Value::Float(*value)),
            ExprKind::Imaginary(_) => {
                Err(ExcType::type_error("complex numbers are not supported"))
            }
            ExprKind::Str(text) => Ok(self.heap.alloc_str(&**text)),
            ExprKind::Bytes(bytes) => Ok(self.heap.alloc_value(HeapData::Bytes(bytes.to_vec()))),
            ExprKind::Bool(value) => Ok(Value::Bool(*value)),
            ExprKind::None => Ok(Value::None),
            ExprKind::Name(name) => self.scopes.get(scope, name),
            ExprKind::FString(elems) => self.eval_fstring(elems, scope),

            ExprKind::Tuple(items) => {
                let values = self.eval_display_items(items, scope)?;
                Ok(self.heap.alloc_tuple(values))
            }
            ExprKind::List(items) => {
                let values = self.eval_display_items(items, scope)?;
                Ok(self.heap.alloc_list(values))
            }
            ExprKind::Set(items) => {
                let values = self.eval_display_items(items, scope)?;
                self.set_from_values(values, false)
            }
            ExprKind::Dict { keys, values } => self.eval_dict_display(keys, values, scope),

            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_expr(left, scope)?;
                let rhs = self.eval_expr(right, scope)?;
                self.binary_op(*op, lhs, rhs)
            }
            ExprKind::Unary { op, operand } => {
                let operand_value = self.eval_expr(operand, scope)?;
                match op {
                    UnaryOp::Not => {
                        let b = self.truthy(operand_value)?;
                        Ok(Value::Bool(!b))
                    }
                    _ => self.unary_op(*op, operand_value),
                }
            }
            ExprKind::BoolOp { op, values } => {
                // Short-circuit: the deciding operand is returned unconverted.
                let (last, init) = values.split_last().expect("parser emits >= 2 operands");
                for value in init {
                    let evaluated = self.eval_expr(value, scope)?;
                    let truthy = self.truthy(evaluated)?;
                    match op {
                        BoolOpKind::And if !truthy => return Ok(evaluated),
                        BoolOpKind::Or if truthy => return Ok(evaluated),
                        _ => {}
                    }
                }
                self.eval_expr(last, scope)
            }
            ExprKind::Compare {
                left,
                ops,
                comparators,
            } => self.eval_compare_chain(left, ops, comparators, scope),
            ExprKind::IfExp { test, body, orelse } => {
                let test_value = self.eval_expr(test, scope)?;
                if self.truthy(test_value)? {
                    self.eval_expr(body, scope)
                } else {
                    self.eval_expr(orelse, scope)
                }
            }

            ExprKind::Call { func, args } => {
                let func_value = self.eval_expr(func, scope)?;
                let arg_values = self.eval_args(args, scope)?;
                self.call_value(func_value, arg_values)
            }
            ExprKind::Attribute { value, attr } => {
                let obj = self.eval_expr(value, scope)?;
                self.get_attr(obj, attr)
            }
            ExprKind::Subscript { value, index } => {
                let obj = self.eval_expr(value, scope)?;
                let index_value = self.eval_expr(index, scope)?;
                self.get_item(obj, index_value)
            }
            ExprKind::Slice { lower, upper, step } => {
                let start = self.eval_opt_boxed(lower.as_deref(), scope)?;
                let stop = self.eval_opt_boxed(upper.as_deref(), scope)?;
                let step = self.eval_opt_boxed(step.as_deref(), scope)?;
                Ok(self.heap.alloc_value(HeapData::Slice(SliceObject { start, stop, step })))
            }

            ExprKind::Lambda(def) => {
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
                Ok(self.heap.alloc_value(HeapData::Function(FunctionObject {
                    name: "<lambda>".to_string(),
                    body: FunctionBody::Lambda(Rc::clone(def)),
                    closure: scope,
                    defaults,
                    kw_defaults,
                    is_async: false,
                    is_generator: false,
                    defining_class: None,
                    attrs: ahash::AHashMap::new(),
                })))
            }

            ExprKind::ListComp { elt, generators } => {
                let mut items = Vec::new();
                self.eval_comprehension(generators, scope, &mut |ev, comp_scope| {
                    let value = ev.eval_expr(elt, comp_scope)?;
                    items.push(value);
                    Ok(())
                })?;
                Ok(self.heap.alloc_list(items))
            }
            ExprKind::SetComp { elt, generators } => {
                let mut items = Vec::new();
                self.eval_comprehension(generators, scope, &mut |ev, comp_scope| {
                    let value = ev.eval_expr(elt, comp_scope)?;
                    items.push(value);
                    Ok(())
                })?;
                self.set_from_values(items, false)
            }
            ExprKind::DictComp {
                key,
                value,
                generators,
            } => {
                let mut pairs = Vec::new();
                self.eval_comprehension(generators, scope, &mut |ev, comp_scope| {
                    let k = ev.eval_expr(key, comp_scope)?;
                    let v = ev.eval_expr(value, comp_scope)?;
                    pairs.push((k, v));
                    Ok(())
                })?;
                let dict = self.heap.alloc_value(HeapData::Dict(crate::types::Dict::new()));
                for (k, v) in pairs {
                    self.dict_set(dict, k, v)?;
                }
                Ok(dict)
            }
            ExprKind::GeneratorExp { elt, generators } => {
                // Collected eagerly, like generators (§ eager buffering).
                let mut items = Vec::new();
                self.eval_comprehension(generators, scope, &mut |ev, comp_scope| {
                    let value = ev.eval_expr(elt, comp_scope)?;
                    items.push(value);
                    Ok(())
                })?;
                Ok(self.heap.alloc_value(HeapData::Iter(KraitIter::Snapshot {
                    items,
                    pos: 0,
                    ty: Type::Generator,
                })))
            }

            ExprKind::Await(operand) => {
                if !self.in_async_context() {
                    return Err(ExcType::SyntaxError.msg("'await' outside async function"));
                }
                let value = self.eval_expr(operand, scope)?;
                self.await_value(value)
            }
            ExprKind::Yield(value) => {
                let yielded = match value {
                    Some(e) => self.eval_expr(e, scope)?,
                    None => Value::None,
                };
                self.emit_yield(yielded)?;
                // The sent value of an eager generator is always None.
                Ok(Value::None)
            }
            ExprKind::YieldFrom(iterable) => {
                let iterable = self.eval_expr(iterable, scope)?;
                let items = self.collect_iterable(iterable)?;
                for item in items {
                    self.emit_yield(item)?;
                }
                Ok(Value::None)
            }
            ExprKind::Starred(_) => {
                Err(ExcType::SyntaxError.msg("can't use starred expression here"))
            }
            ExprKind::Named { target, value } => {
                let result = self.eval_expr(value, scope)?;
                self.scopes.set(scope, target, result);
                Ok(result)
            }
        }
    }

    fn eval_opt_boxed(&mut self, expr: Option<&Expr>, scope: ScopeId) -> RunResult<Value> {
        match expr {
            Some(e) => self.eval_expr(e, scope),
            None => Ok(Value::None),
        }
    }

    /// Display items with `*iterable` expansion.
    fn eval_display_items(&mut self, items: &[Expr], scope: ScopeId) -> RunResult<Vec<Value>> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            if let ExprKind::Starred(inner) = &item.kind {
                let iterable = self.eval_expr(inner, scope)?;
                values.extend(self.collect_iterable(iterable)?);
            } else {
                values.push(self.eval_expr(item, scope)?);
            }
        }
        Ok(values)
    }

    fn eval_dict_display(
        &mut self,
        keys: &[Option<Expr>],
        values: &[Expr],
        scope: ScopeId,
    ) -> RunResult<Value> {
        let dict = self.heap.alloc_value(HeapData::Dict(crate::types::Dict::new()));
        for (key, value) in keys.iter().zip(values) {
            match key {
                Some(key) => {
                    let k = self.eval_expr(key, scope)?;
                    let v = self.eval_expr(value, scope)?;
                    self.dict_set(dict, k, v)?;
                }
                None => {
                    // `**mapping` spread.
                    let mapping = self.eval_expr(value, scope)?;
                    let pairs = self.dict_pairs(mapping)?;
                    for (k, v) in pairs {
                        self.dict_set(dict, k, v)?;
                    }
                }
            }
        }
        Ok(dict)
    }

    /// Runs the nested clause machinery of a comprehension.
    ///
    /// Comprehensions execute in a fresh scope so their targets never leak;
    /// the iterable of the *first* `for` clause is evaluated in the
    /// enclosing scope.
    pub(crate) fn eval_comprehension(
        &mut self,
        generators: &[Comprehension],
        scope: ScopeId,
        sink: &mut dyn FnMut(&mut Self, ScopeId) -> RunResult<()>,
    ) -> RunResult<()> {
        let info = prepare::comprehension_locals(generators);
        let comp_scope = self.scopes.new_scope(scope, crate::namespace::ScopeKind::Local, &info)?;
        self.run_comp_clause(generators, 0, comp_scope, scope, sink)
    }

    fn run_comp_clause(
        &mut self,
        generators: &[Comprehension],
        idx: usize,
        comp_scope: ScopeId,
        outer_scope: ScopeId,
        sink: &mut dyn FnMut(&mut Self, ScopeId) -> RunResult<()>,
    ) -> RunResult<()> {
        let Some(clause) = generators.get(idx) else {
            return sink(self, comp_scope);
        };
        if clause.is_async && !self.in_async_context() {
            return Err(ExcType::SyntaxError.msg("'async for' outside async function"));
        }
        let iter_scope = if idx == 0 { outer_scope } else { comp_scope };
        let iterable = self.eval_expr(&clause.iter, iter_scope)?;
        let iterator = if clause.is_async {
            self.get_async_iter(iterable)?
        } else {
            self.get_iter(iterable)?
        };
        loop {
            let next = if clause.is_async {
                self.async_iter_next(iterator)?
            } else {
                self.iter_next(iterator)?
            };
            let Some(item) = next else { break };
            self.assign_target(&clause.target, item, comp_scope)?;
            let mut keep = true;
            for cond in &clause.ifs {
                let cond_value = self.eval_expr(cond, comp_scope)?;
                if !self.truthy(cond_value)? {
                    keep = false;
                    break;
                }
            }
            if keep {
                self.run_comp_clause(generators, idx + 1, comp_scope, outer_scope, sink)?;
            }
        }
        Ok(())
    }

    // --- comparison chains ---

    fn eval_compare_chain(
        &mut self,
        left: &Expr,
        ops: &[crate::ast::CmpOp],
        comparators: &[Expr],
        scope: ScopeId,
    ) -> RunResult<Value> {
        let mut lhs = self.eval_expr(left, scope)?;
        // A single comparison surfaces the raw dunder result; chains
        // collapse each link to bool and short-circuit on the first failure
        // with the already-evaluated middle operand carried forward.
        if ops.len() == 1 {
            let rhs = self.eval_expr(&comparators[0], scope)?;
            return self.compare_op(ops[0], lhs, rhs);
        }
        for (op, rhs_expr) in ops.iter().zip(comparators) {
            let rhs = self.eval_expr(rhs_expr, scope)?;
            let result = self.compare_op(*op, lhs, rhs)?;
            if !self.truthy(result)? {
                return Ok(Value::Bool(false));
            }
            lhs = rhs;
        }
        Ok(Value::Bool(true))
    }

    // --- subscripts ---

    pub(crate) fn get_item(&mut self, obj: Value, index: Value) -> RunResult<Value> {
        if let Value::Ref(obj_id) = obj {
            match self.heap.get(obj_id) {
                HeapData::List(items) => {
                    let items = items.clone();
                    return self.seq_get(&items, index, "list", |ev, picked| Ok(ev.heap.alloc_list(picked)));
                }
                HeapData::Tuple(items) => {
                    let items = items.clone();
                    return self.seq_get(&items, index, "tuple", |ev, picked| Ok(ev.heap.alloc_tuple(picked)));
                }
                HeapData::Str(s) => {
                    let chars: Vec<char> = s.chars().collect();
                    return self.str_get(&chars, index);
                }
                HeapData::Bytes(bytes) => {
                    let bytes = bytes.clone();
                    return self.bytes_get(&bytes, index);
                }
                HeapData::Dict(_) => {
                    return match self.dict_get(obj, index)? {
                        Some(value) => Ok(value),
                        None => Err(ExcType::key_error(index)),
                    };
                }
                HeapData::Range(range) => {
                    let range = *range;
                    return self.range_get(range, index);
                }
                HeapData::Instance(_) => {
                    return match self.call_dunder(obj, "__getitem__", ArgValues::One(index))? {
                        Some(value) => Ok(value),
                        None => Err(ExcType::type_error(format!(
                            "'{}' object is not subscriptable",
                            obj.type_name(self.heap)
                        ))),
                    };
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "'{}' object is not subscriptable",
            obj.type_name(self.heap)
        )))
    }

    fn seq_get(
        &mut self,
        items: &[Value],
        index: Value,
        type_name: &str,
        wrap: impl FnOnce(&mut Self, Vec<Value>) -> RunResult<Value>,
    ) -> RunResult<Value> {
        if let Some((start, stop, step)) = self.slice_parts(index, items.len())? {
            let picked: Vec<Value> = slice_index_iter(start, stop, step)
                .into_iter()
                .map(|i| items[i])
                .collect();
            return wrap(self, picked);
        }
        let idx = self.index_value(index, type_name)?;
        let idx = normalize_index(idx, items.len(), type_name)?;
        Ok(items[idx])
    }

    fn str_get(&mut self, chars: &[char], index: Value) -> RunResult<Value> {
        if let Some((start, stop, step)) = self.slice_parts(index, chars.len())? {
            let picked: String = slice_index_iter(start, stop, step)
                .into_iter()
                .map(|i| chars[i])
                .collect();
            return Ok(self.heap.alloc_str(picked));
        }
        let idx = self.index_value(index, "string")?;
        let idx = normalize_index(idx, chars.len(), "string")?;
        Ok(self.heap.alloc_str(chars[idx].to_string()))
    }

    fn bytes_get(&mut self, bytes: &[u8], index: Value) -> RunResult<Value> {
        if let Some((start, stop, step)) = self.slice_parts(index, bytes.len())? {
            let picked: Vec<u8> = slice_index_iter(start, stop, step)
                .into_iter()
                .map(|i| bytes[i])
                .collect();
            return Ok(self.heap.alloc_value(HeapData::Bytes(picked)));
        }
        let idx = self.index_value(index, "bytes")?;
        let idx = normalize_index(idx, bytes.len(), "bytes")?;
        Ok(Value::Int(i64::from(bytes[idx])))
    }

    fn range_get(&mut self, range: RangeObject, index: Value) -> RunResult<Value> {
        let len = range.len();
        if let Some((start, stop, step)) = self.slice_parts(index, len as usize)? {
            // Map index-space bounds through the range; the exclusive stop
            // maps directly since the new step carries the direction.
            let new = RangeObject::new(
                range.start + start * range.step,
                range.start + stop * range.step,
                range.step * step,
            )?;
            return Ok(self.heap.alloc_value(HeapData::Range(new)));
        }
        let idx = self.index_value(index, "range")?;
        let idx = normalize_index(idx, len as usize, "range")?;
        Ok(Value::Int(range.get(idx as i64)))
    }

    /// Decodes a slice object index into resolved bounds, or `None` if the
    /// index is not a slice.
    #[expect(clippy::type_complexity)]
    pub(crate) fn slice_parts(&mut self, index: Value, len: usize) -> RunResult<Option<(i64, i64, i64)>> {
        let Value::Ref(id) = index else { return Ok(None) };
        let HeapData::Slice(slice) = self.heap.get(id) else {
            return Ok(None);
        };
        let slice = *slice;
        let start = self.opt_slice_bound(slice.start)?;
        let stop = self.opt_slice_bound(slice.stop)?;
        let step = self.opt_slice_bound(slice.step)?;
        Ok(Some(resolve_slice_indices(start, stop, step, len as i64)?))
    }

    fn opt_slice_bound(&mut self, value: Value) -> RunResult<Option<i64>> {
        if value.is_none() {
            return Ok(None);
        }
        match as_int(value, self.heap) {
            Some(i) => Ok(Some(i)),
            None => Err(ExcType::type_error(
                "slice indices must be integers or None",
            )),
        }
    }

    pub(crate) fn index_value(&mut self, index: Value, type_name: &str) -> RunResult<i64> {
        if !is_int_like(index, self.heap) {
            return Err(ExcType::type_error(format!(
                "{type_name} indices must be integers, not {}",
                index.type_name(self.heap)
            )));
        }
        as_int(index, self.heap)
            .ok_or_else(|| ExcType::index_error("cannot fit index into an index-sized integer"))
    }

    pub(crate) fn set_item(&mut self, obj: Value, index: Value, value: Value) -> RunResult<()> {
        if let Value::Ref(obj_id) = obj {
            match self.heap.get(obj_id) {
                HeapData::List(items) => {
                    let len = items.len();
                    if let Some((start, stop, step)) = self.slice_parts(index, len)? {
                        let replacement = self.collect_iterable(value)?;
                        return self.list_slice_assign(obj_id, start, stop, step, replacement);
                    }
                    let idx = self.index_value(index, "list")?;
                    let idx = normalize_index(idx, len, "list")?;
                    if let HeapData::List(items) = self.heap.get_mut(obj_id) {
                        items[idx] = value;
                    }
                    return Ok(());
                }
                HeapData::Dict(_) => {
                    self.dict_set(obj, index, value)?;
                    return Ok(());
                }
                HeapData::Instance(_) => {
                    return match self.call_dunder(obj, "__setitem__", ArgValues::Two(index, value))? {
                        Some(_) => Ok(()),
                        None => Err(ExcType::type_error(format!(
                            "'{}' object does not support item assignment",
                            obj.type_name(self.heap)
                        ))),
                    };
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "'{}' object does not support item assignment",
            obj.type_name(self.heap)
        )))
    }

    fn list_slice_assign(
        &mut self,
        list_id: HeapId,
        start: i64,
        stop: i64,
        step: i64,
        replacement: Vec<Value>,
    ) -> RunResult<()> {
        let indices = slice_index_iter(start, stop, step);
        if step == 1 {
            if let HeapData::List(items) = self.heap.get_mut(list_id) {
                let lo = start.max(0) as usize;
                let hi = (stop.max(start)) as usize;
                items.splice(lo..hi.min(items.len()), replacement);
            }
            return Ok(());
        }
        if indices.len() != replacement.len() {
            return Err(ExcType::value_error(format!(
                "attempt to assign sequence of size {} to extended slice of size {}",
                replacement.len(),
                indices.len()
            )));
        }
        if let HeapData::List(items) = self.heap.get_mut(list_id) {
            for (idx, value) in indices.into_iter().zip(replacement) {
                items[idx] = value;
            }
        }
        Ok(())
    }

    pub(crate) fn del_item(&mut self, obj: Value, index: Value) -> RunResult<()> {
        if let Value::Ref(obj_id) = obj {
            match self.heap.get(obj_id) {
                HeapData::List(items) => {
                    let len = items.len();
                    if let Some((start, stop, step)) = self.slice_parts(index, len)? {
                        let mut indices = slice_index_iter(start, stop, step);
                        indices.sort_unstable();
                        if let HeapData::List(items) = self.heap.get_mut(obj_id) {
                            for idx in indices.into_iter().rev() {
                                items.remove(idx);
                            }
                        }
                        return Ok(());
                    }
                    let idx = self.index_value(index, "list")?;
                    let idx = normalize_index(idx, len, "list")?;
                    if let HeapData::List(items) = self.heap.get_mut(obj_id) {
                        items.remove(idx);
                    }
                    return Ok(());
                }
                HeapData::Dict(_) => {
                    return match self.dict_remove(obj, index)? {
                        Some(_) => Ok(()),
                        None => Err(ExcType::key_error(index)),
                    };
                }
                HeapData::Instance(_) => {
                    return match self.call_dunder(obj, "__delitem__", ArgValues::One(index))? {
                        Some(_) => Ok(()),
                        None => Err(ExcType::type_error(format!(
                            "'{}' object does not support item deletion",
                            obj.type_name(self.heap)
                        ))),
                    };
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "'{}' object does not support item deletion",
            obj.type_name(self.heap)
        )))
    }

    // --- f-strings ---

    fn eval_fstring(&mut self, elems: &[FStringElem], scope: ScopeId) -> RunResult<Value> {
        let mut out = String::new();
        for elem in elems {
            match elem {
                FStringElem::Literal(text) => out.push_str(text),
                FStringElem::Expr {
                    expr,
                    conversion,
                    spec,
                } => {
                    let value = self.eval_expr(expr, scope)?;
                    let converted = match conversion {
                        Some('r' | 'a') => {
                            let text = self.py_repr(value)?;
                            Some(text)
                        }
                        Some('s') => Some(self.py_str(value)?),
                        _ => None,
                    };
                    match (converted, spec) {
                        (Some(text), Some(spec)) => {
                            let parsed = parse_format_spec(spec)?;
                            out.push_str(&format_str(&text, &parsed)?);
                        }
                        (Some(text), None) => out.push_str(&text),
                        (None, Some(spec)) => {
                            let formatted = self.format_value(value, spec)?;
                            out.push_str(&formatted);
                        }
                        (None, None) => out.push_str(&self.py_str(value)?),
                    }
                }
            }
        }
        Ok(self.heap.alloc_str(out))
    }

    /// `format(value, spec)`: numeric types route into the numeric
    /// formatters; everything else must accept a string spec.
    pub(crate) fn format_value(&mut self, value: Value, spec: &str) -> RunResult<String> {
        let parsed = parse_format_spec(spec)?;
        match value {
            Value::Bool(_) if parsed.spec_type.is_none() => {
                let text = self.py_str(value)?;
                format_str(&text, &parsed)
            }
            Value::Int(i) => format_int(&num_bigint::BigInt::from(i), &parsed),
            Value::Bool(b) => format_int(&num_bigint::BigInt::from(i64::from(b)), &parsed),
            Value::Float(f) => format_float(f, &parsed),
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::LongInt(big) => {
                    let big = big.clone();
                    format_int(&big, &parsed)
                }
                HeapData::Str(s) => {
                    let s = s.clone();
                    format_str(&s, &parsed)
                }
                _ => {
                    let text = self.py_str(value)?;
                    if parsed.spec_type.is_none() || parsed.spec_type == Some('s') {
                        format_str(&text, &parsed)
                    } else {
                        Err(ExcType::type_error(format!(
                            "unsupported format string passed to {}.__format__",
                            value.type_name(self.heap)
                        )))
                    }
                }
            },
            _ => {
                let text = self.py_str(value)?;
                if parsed.spec_type.is_none() || parsed.spec_type == Some('s') {
                    format_str(&text, &parsed)
                } else {
                    Err(ExcType::type_error(format!(
                        "unsupported format string passed to {}.__format__",
                        value.type_name(self.heap)
                    )))
                }
            }
        }
    }
}
