//! Comparisons, hashing, membership, and the hash-plus-equality probing that
//! dicts and sets are built on.
//!
//! Equality and ordering try the structural fast paths first and only
//! dispatch into user dunders when an instance is involved. Dict/set probes
//! collect candidate entries by hash, then confirm with full equality — so a
//! user `__eq__` participates in key lookup.

use std::cmp::Ordering;

use crate::{
    args::ArgValues,
    ast::CmpOp,
    exception_private::{ExcType, RunResult},
    heap::{HeapData, HeapId},
    py_hash,
    types::{Dict, Set, mro_lookup},
    value::{Num, Value, numeric_kind, py_eq_structural, ref_identity},
};

use super::Evaluator;

impl Evaluator<'_> {
    pub(crate) fn compare_op(&mut self, op: CmpOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        match op {
            CmpOp::Is => Ok(Value::Bool(ref_identity(lhs, rhs))),
            CmpOp::IsNot => Ok(Value::Bool(!ref_identity(lhs, rhs))),
            CmpOp::In => {
                let found = self.contains(lhs, rhs)?;
                Ok(Value::Bool(found))
            }
            CmpOp::NotIn => {
                let found = self.contains(lhs, rhs)?;
                Ok(Value::Bool(!found))
            }
            CmpOp::Eq | CmpOp::NotEq => self.eq_compare(op, lhs, rhs),
            CmpOp::Lt | CmpOp::Gt | CmpOp::LtE | CmpOp::GtE => self.order_compare(op, lhs, rhs),
        }
    }

    fn eq_compare(&mut self, op: CmpOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        let (forward, reflected) = if op == CmpOp::Eq {
            ("__eq__", "__eq__")
        } else {
            ("__ne__", "__ne__")
        };
        // Instance dunders may return arbitrary objects; surface them raw.
        if self.is_instance(lhs)
            && let Some(result) = self.call_dunder(lhs, forward, ArgValues::One(rhs))?
            && result != Value::NotImplemented
        {
            return Ok(result);
        }
        if self.is_instance(rhs)
            && let Some(result) = self.call_dunder(rhs, reflected, ArgValues::One(lhs))?
            && result != Value::NotImplemented
        {
            return Ok(result);
        }
        let eq = self.value_eq(lhs, rhs)?;
        Ok(Value::Bool(if op == CmpOp::Eq { eq } else { !eq }))
    }

    fn order_compare(&mut self, op: CmpOp, lhs: Value, rhs: Value) -> RunResult<Value> {
        let (forward, reflected) = match op {
            CmpOp::Lt => ("__lt__", "__gt__"),
            CmpOp::Gt => ("__gt__", "__lt__"),
            CmpOp::LtE => ("__le__", "__ge__"),
            CmpOp::GtE => ("__ge__", "__le__"),
            _ => unreachable!("ordering ops only"),
        };
        if self.is_instance(lhs)
            && let Some(result) = self.call_dunder(lhs, forward, ArgValues::One(rhs))?
            && result != Value::NotImplemented
        {
            return Ok(result);
        }
        if self.is_instance(rhs)
            && let Some(result) = self.call_dunder(rhs, reflected, ArgValues::One(lhs))?
            && result != Value::NotImplemented
        {
            return Ok(result);
        }

        // Set comparisons are subset tests, not a total order.
        if let (Some(a), Some(b)) = (self.set_items_of(lhs), self.set_items_of(rhs)) {
            let a_in_b = self.all_members(&a, &b)?;
            let b_in_a = self.all_members(&b, &a)?;
            let result = match op {
                CmpOp::Lt => a_in_b && !b_in_a,
                CmpOp::LtE => a_in_b,
                CmpOp::Gt => b_in_a && !a_in_b,
                CmpOp::GtE => b_in_a,
                _ => unreachable!(),
            };
            return Ok(Value::Bool(result));
        }

        match self.order_cmp(lhs, rhs)? {
            Some(ordering) => {
                let result = match op {
                    CmpOp::Lt => ordering == Ordering::Less,
                    CmpOp::Gt => ordering == Ordering::Greater,
                    CmpOp::LtE => ordering != Ordering::Greater,
                    CmpOp::GtE => ordering != Ordering::Less,
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
            None => Err(ExcType::type_error(format!(
                "'{}' not supported between instances of '{}' and '{}'",
                op.symbol(),
                lhs.type_name(self.heap),
                rhs.type_name(self.heap)
            ))),
        }
    }

    /// Full equality: structural where possible, `__eq__` (with reflected
    /// fallback) when instances are involved, identity as the last resort.
    pub(crate) fn value_eq(&mut self, lhs: Value, rhs: Value) -> RunResult<bool> {
        if let Some(result) = py_eq_structural(lhs, rhs, self.heap) {
            return Ok(result);
        }
        if self.is_instance(lhs)
            && let Some(result) = self.call_dunder(lhs, "__eq__", ArgValues::One(rhs))?
            && result != Value::NotImplemented
        {
            return self.truthy(result);
        }
        if self.is_instance(rhs)
            && let Some(result) = self.call_dunder(rhs, "__eq__", ArgValues::One(lhs))?
            && result != Value::NotImplemented
        {
            return self.truthy(result);
        }
        Ok(ref_identity(lhs, rhs))
    }

    /// `a < b` collapsed to bool; what `sorted`/`min`/`max` sort by.
    pub(crate) fn value_lt(&mut self, lhs: Value, rhs: Value) -> RunResult<bool> {
        let result = self.compare_op(CmpOp::Lt, lhs, rhs)?;
        self.truthy(result)
    }

    /// Structural ordering for primitives; `None` when the pair has no
    /// defined order.
    fn order_cmp(&mut self, lhs: Value, rhs: Value) -> RunResult<Option<Ordering>> {
        if let (Some(a), Some(b)) = (numeric_kind(lhs, self.heap), numeric_kind(rhs, self.heap)) {
            return Ok(num_cmp(&a, &b));
        }
        let (Value::Ref(id1), Value::Ref(id2)) = (lhs, rhs) else {
            return Ok(None);
        };
        match (self.heap.get(id1), self.heap.get(id2)) {
            (HeapData::Str(a), HeapData::Str(b)) => Ok(Some(a.cmp(b))),
            (HeapData::Bytes(a), HeapData::Bytes(b)) => Ok(Some(a.cmp(b))),
            (HeapData::List(a), HeapData::List(b)) | (HeapData::Tuple(a), HeapData::Tuple(b)) => {
                let (a, b) = (a.clone(), b.clone());
                self.seq_cmp(&a, &b)
            }
            _ => Ok(None),
        }
    }

    /// Lexicographic sequence comparison: first unequal pair decides.
    fn seq_cmp(&mut self, a: &[Value], b: &[Value]) -> RunResult<Option<Ordering>> {
        for (x, y) in a.iter().zip(b) {
            if self.value_eq(*x, *y)? {
                continue;
            }
            if self.value_lt(*x, *y)? {
                return Ok(Some(Ordering::Less));
            }
            return Ok(Some(Ordering::Greater));
        }
        Ok(Some(a.len().cmp(&b.len())))
    }

    pub(crate) fn is_instance(&self, value: Value) -> bool {
        matches!(value, Value::Ref(id) if matches!(self.heap.get(id), HeapData::Instance(_)))
    }

    // --- membership ---

    /// `needle in haystack`, consulting `__contains__` with MRO lookup for
    /// instances and falling back to iteration.
    pub(crate) fn contains(&mut self, needle: Value, haystack: Value) -> RunResult<bool> {
        if self.is_instance(haystack) {
            if let Some(result) = self.call_dunder(haystack, "__contains__", ArgValues::One(needle))? {
                return self.truthy(result);
            }
            // Fall through to the iteration protocol.
            let items = self.collect_iterable(haystack)?;
            for item in items {
                if self.value_eq(needle, item)? {
                    return Ok(true);
                }
            }
            return Ok(false);
        }

        if let Value::Ref(id) = haystack {
            match self.heap.get(id) {
                HeapData::Str(s) => {
                    let s = s.clone();
                    let Value::Ref(needle_id) = needle else {
                        return Err(ExcType::type_error(format!(
                            "'in <string>' requires string as left operand, not {}",
                            needle.type_name(self.heap)
                        )));
                    };
                    let HeapData::Str(sub) = self.heap.get(needle_id) else {
                        return Err(ExcType::type_error(format!(
                            "'in <string>' requires string as left operand, not {}",
                            needle.type_name(self.heap)
                        )));
                    };
                    return Ok(s.contains(sub.as_str()));
                }
                HeapData::List(items) | HeapData::Tuple(items) => {
                    let items = items.clone();
                    for item in items {
                        if self.value_eq(needle, item)? {
                            return Ok(true);
                        }
                    }
                    return Ok(false);
                }
                HeapData::Dict(_) => {
                    return Ok(self.dict_get(haystack, needle)?.is_some());
                }
                HeapData::Set(_) | HeapData::FrozenSet(_) => {
                    return self.set_contains(id, needle);
                }
                HeapData::Range(range) => {
                    let range = *range;
                    if let Some(i) = crate::value::as_int(needle, self.heap) {
                        return Ok(range.contains_int(i));
                    }
                    if matches!(needle, Value::Float(_)) {
                        let items = self.collect_iterable(haystack)?;
                        for item in items {
                            if self.value_eq(needle, item)? {
                                return Ok(true);
                            }
                        }
                        return Ok(false);
                    }
                    return Ok(false);
                }
                HeapData::DictView { items, .. } => {
                    let items = items.clone();
                    for item in items {
                        if self.value_eq(needle, item)? {
                            return Ok(true);
                        }
                    }
                    return Ok(false);
                }
                HeapData::Iter(_) | HeapData::Generator(_) => {
                    let items = self.collect_iterable(haystack)?;
                    for item in items {
                        if self.value_eq(needle, item)? {
                            return Ok(true);
                        }
                    }
                    return Ok(false);
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "argument of type '{}' is not iterable",
            haystack.type_name(self.heap)
        )))
    }

    // --- hashing ---

    /// The hash protocol. Mutable containers are unhashable; an instance
    /// whose class defines `__eq__` without `__hash__` is unhashable too.
    pub(crate) fn hash_value(&mut self, value: Value) -> RunResult<u64> {
        match value {
            Value::None => Ok(0x23d4_a4e1),
            Value::NotImplemented => Ok(0x23d4_a4e2),
            Value::Bool(b) => Ok(py_hash::hash_int(i64::from(b))),
            Value::Int(i) => Ok(py_hash::hash_int(i)),
            Value::Float(f) => Ok(py_hash::hash_float(f)),
            Value::Builtin(b) => Ok(py_hash::hash_str(&format!("{b:?}"))),
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Str(s) => Ok(py_hash::hash_str(s)),
                HeapData::Bytes(b) => Ok(py_hash::hash_bytes(b)),
                HeapData::LongInt(big) => Ok(py_hash::hash_bigint(big)),
                HeapData::Tuple(items) => {
                    let items = items.clone();
                    let mut acc = py_hash::TUPLE_HASH_SEED;
                    for item in items {
                        let h = self.hash_value(item)?;
                        acc = py_hash::hash_tuple_fold(acc, h);
                    }
                    Ok(acc)
                }
                HeapData::FrozenSet(set) => Ok(py_hash::hash_frozenset(set.hashes())),
                HeapData::Range(range) => {
                    let mut acc = py_hash::TUPLE_HASH_SEED;
                    for part in [range.start, range.stop, range.step] {
                        acc = py_hash::hash_tuple_fold(acc, py_hash::hash_int(part));
                    }
                    Ok(acc)
                }
                HeapData::List(_) | HeapData::Dict(_) | HeapData::Set(_) | HeapData::Slice(_) => {
                    Err(ExcType::type_error(format!(
                        "unhashable type: '{}'",
                        value.type_name(self.heap)
                    )))
                }
                HeapData::Instance(instance) => {
                    let class_id = instance.class_id;
                    self.hash_instance(value, id, class_id)
                }
                // Functions, classes, iterators: identity hash.
                _ => Ok(py_hash::hash_int(i64::from(id.raw()))),
            },
        }
    }

    fn hash_instance(&mut self, value: Value, id: HeapId, class_id: HeapId) -> RunResult<u64> {
        if mro_lookup(self.heap, class_id, "__hash__").is_some() {
            let result = self
                .call_dunder(value, "__hash__", ArgValues::Empty)?
                .expect("lookup succeeded above");
            return match crate::value::as_int(result, self.heap) {
                Some(i) => Ok(py_hash::hash_int(i)),
                None => Err(ExcType::type_error("__hash__ method should return an integer")),
            };
        }
        if mro_lookup(self.heap, class_id, "__eq__").is_some() {
            return Err(ExcType::type_error(format!(
                "unhashable type: '{}'",
                value.type_name(self.heap)
            )));
        }
        Ok(py_hash::hash_int(i64::from(id.raw())))
    }

    // --- dict probing ---

    /// Looks `key` up in a dict value, confirming candidates by equality.
    pub(crate) fn dict_get(&mut self, dict: Value, key: Value) -> RunResult<Option<Value>> {
        let Some(dict_id) = dict.ref_id() else {
            return Err(ExcType::type_error("expected a dict"));
        };
        let hash = self.hash_value(key)?;
        let candidates = match self.heap.get(dict_id) {
            HeapData::Dict(d) => d.candidates(hash),
            _ => return Err(ExcType::type_error("expected a dict")),
        };
        for idx in candidates {
            let candidate_key = match self.heap.get(dict_id) {
                HeapData::Dict(d) => d.entry_key(idx),
                _ => unreachable!("checked above"),
            };
            if self.value_eq(key, candidate_key)? {
                let value = match self.heap.get(dict_id) {
                    HeapData::Dict(d) => d.entry_value(idx),
                    _ => unreachable!("checked above"),
                };
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Inserts or overwrites `key` in a dict value.
    pub(crate) fn dict_set(&mut self, dict: Value, key: Value, value: Value) -> RunResult<()> {
        let Some(dict_id) = dict.ref_id() else {
            return Err(ExcType::type_error("expected a dict"));
        };
        let hash = self.hash_value(key)?;
        let candidates = match self.heap.get(dict_id) {
            HeapData::Dict(d) => d.candidates(hash),
            _ => return Err(ExcType::type_error("expected a dict")),
        };
        for idx in candidates {
            let candidate_key = match self.heap.get(dict_id) {
                HeapData::Dict(d) => d.entry_key(idx),
                _ => unreachable!("checked above"),
            };
            if self.value_eq(key, candidate_key)? {
                if let HeapData::Dict(d) = self.heap.get_mut(dict_id) {
                    d.set_entry_value(idx, value);
                }
                return Ok(());
            }
        }
        if let HeapData::Dict(d) = self.heap.get_mut(dict_id) {
            d.insert_new(hash, key, value);
        }
        Ok(())
    }

    /// Removes `key`, returning its value if present.
    pub(crate) fn dict_remove(&mut self, dict: Value, key: Value) -> RunResult<Option<Value>> {
        let Some(dict_id) = dict.ref_id() else {
            return Err(ExcType::type_error("expected a dict"));
        };
        let hash = self.hash_value(key)?;
        let candidates = match self.heap.get(dict_id) {
            HeapData::Dict(d) => d.candidates(hash),
            _ => return Err(ExcType::type_error("expected a dict")),
        };
        for idx in candidates {
            let candidate_key = match self.heap.get(dict_id) {
                HeapData::Dict(d) => d.entry_key(idx),
                _ => unreachable!("checked above"),
            };
            if self.value_eq(key, candidate_key)? {
                if let HeapData::Dict(d) = self.heap.get_mut(dict_id) {
                    let (_, value) = d.remove_entry(idx);
                    return Ok(Some(value));
                }
            }
        }
        Ok(None)
    }

    /// The `(key, value)` pairs of a dict value (for `**` spreads, `update`,
    /// `dict(other)`).
    pub(crate) fn dict_pairs(&mut self, value: Value) -> RunResult<Vec<(Value, Value)>> {
        match value {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Dict(d) => Ok(d.iter().collect()),
                _ => Err(ExcType::type_error(format!(
                    "argument must be a mapping, not {}",
                    value.type_name(self.heap)
                ))),
            },
            _ => Err(ExcType::type_error(format!(
                "argument must be a mapping, not {}",
                value.type_name(self.heap)
            ))),
        }
    }

    // --- set probing ---

    pub(crate) fn set_contains(&mut self, set_id: HeapId, value: Value) -> RunResult<bool> {
        let hash = self.hash_value(value)?;
        let candidates = match self.heap.get(set_id) {
            HeapData::Set(s) | HeapData::FrozenSet(s) => s.candidates(hash),
            _ => return Err(ExcType::type_error("expected a set")),
        };
        for idx in candidates {
            let candidate = match self.heap.get(set_id) {
                HeapData::Set(s) | HeapData::FrozenSet(s) => s.entry_value(idx),
                _ => unreachable!("checked above"),
            };
            if self.value_eq(value, candidate)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub(crate) fn set_insert(&mut self, set_id: HeapId, value: Value) -> RunResult<()> {
        if self.set_contains(set_id, value)? {
            return Ok(());
        }
        let hash = self.hash_value(value)?;
        if let HeapData::Set(s) = self.heap.get_mut(set_id) {
            s.insert_new(hash, value);
        }
        Ok(())
    }

    pub(crate) fn set_discard(&mut self, set_id: HeapId, value: Value) -> RunResult<bool> {
        let hash = self.hash_value(value)?;
        let candidates = match self.heap.get(set_id) {
            HeapData::Set(s) | HeapData::FrozenSet(s) => s.candidates(hash),
            _ => return Err(ExcType::type_error("expected a set")),
        };
        for idx in candidates {
            let candidate = match self.heap.get(set_id) {
                HeapData::Set(s) | HeapData::FrozenSet(s) => s.entry_value(idx),
                _ => unreachable!("checked above"),
            };
            if self.value_eq(value, candidate)? {
                if let HeapData::Set(s) = self.heap.get_mut(set_id) {
                    s.remove_entry(idx);
                }
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Builds a set (or frozenset) from values, deduplicating by the full
    /// hash/eq protocol.
    pub(crate) fn set_from_values(&mut self, values: Vec<Value>, frozen: bool) -> RunResult<Value> {
        let set_id = self.heap.allocate(if frozen {
            HeapData::FrozenSet(Set::new())
        } else {
            HeapData::Set(Set::new())
        });
        for value in values {
            let hash = self.hash_value(value)?;
            let mut present = false;
            let candidates = match self.heap.get(set_id) {
                HeapData::Set(s) | HeapData::FrozenSet(s) => s.candidates(hash),
                _ => unreachable!("allocated above"),
            };
            for idx in candidates {
                let candidate = match self.heap.get(set_id) {
                    HeapData::Set(s) | HeapData::FrozenSet(s) => s.entry_value(idx),
                    _ => unreachable!("allocated above"),
                };
                if self.value_eq(value, candidate)? {
                    present = true;
                    break;
                }
            }
            if !present {
                match self.heap.get_mut(set_id) {
                    HeapData::Set(s) | HeapData::FrozenSet(s) => s.insert_new(hash, value),
                    _ => unreachable!("allocated above"),
                }
            }
        }
        Ok(Value::Ref(set_id))
    }

    /// The elements of a set-like value, or `None` if it is not one.
    pub(crate) fn set_items_of(&self, value: Value) -> Option<Vec<Value>> {
        match value {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Set(s) | HeapData::FrozenSet(s) => Some(s.iter().collect()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether every element of `items` is a member of the set `of`.
    fn all_members(&mut self, items: &[Value], of: &[Value]) -> RunResult<bool> {
        for item in items {
            let mut found = false;
            for other in of {
                if self.value_eq(*item, *other)? {
                    found = true;
                    break;
                }
            }
            if !found {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Builds a dict from pairs (for `dict(...)`, `**kwargs`, `copy`).
    pub(crate) fn dict_from_pairs(&mut self, pairs: Vec<(Value, Value)>) -> RunResult<Value> {
        let dict = self.heap.alloc_value(HeapData::Dict(Dict::new()));
        for (key, value) in pairs {
            self.dict_set(dict, key, value)?;
        }
        Ok(dict)
    }

    // --- sorting ---

    /// Stable sort through the full comparison protocol (which can raise),
    /// with optional key function and reversal. Backs `sorted()` and
    /// `list.sort()`.
    pub(crate) fn sort_values(
        &mut self,
        items: Vec<Value>,
        key: Option<Value>,
        reverse: bool,
    ) -> RunResult<Vec<Value>> {
        // Decorate with sort keys up front so the key function runs once
        // per element.
        let mut decorated = Vec::with_capacity(items.len());
        for item in items {
            let sort_key = match key {
                Some(key_fn) => self.call_value(key_fn, ArgValues::One(item))?,
                None => item,
            };
            decorated.push((sort_key, item));
        }
        let mut sorted = self.merge_sort(decorated)?;
        if reverse {
            sorted.reverse();
        }
        Ok(sorted.into_iter().map(|(_, item)| item).collect())
    }

    /// Merge sort: stable, O(n log n), and able to propagate comparison
    /// errors (which `slice::sort_by` cannot).
    fn merge_sort(&mut self, items: Vec<(Value, Value)>) -> RunResult<Vec<(Value, Value)>> {
        if items.len() <= 1 {
            return Ok(items);
        }
        let mid = items.len() / 2;
        let mut right = items;
        let left = right.drain(..mid).collect::<Vec<_>>();
        let left = self.merge_sort(left)?;
        let right = self.merge_sort(right)?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left_iter = left.into_iter().peekable();
        let mut right_iter = right.into_iter().peekable();
        loop {
            match (left_iter.peek(), right_iter.peek()) {
                (Some(l), Some(r)) => {
                    // `right < left` decides, so equal keys keep left-first
                    // order (stability).
                    if self.value_lt(r.0, l.0)? {
                        merged.push(right_iter.next().expect("peeked"));
                    } else {
                        merged.push(left_iter.next().expect("peeked"));
                    }
                }
                (Some(_), None) => merged.push(left_iter.next().expect("peeked")),
                (None, Some(_)) => merged.push(right_iter.next().expect("peeked")),
                (None, None) => break,
            }
        }
        Ok(merged)
    }
}

/// Numeric ordering across int/big/float.
fn num_cmp(a: &Num, b: &Num) -> Option<Ordering> {
    use num_bigint::BigInt;
    use num_traits::ToPrimitive;
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Some(x.cmp(y)),
        (Num::Big(x), Num::Big(y)) => Some(x.cmp(y)),
        (Num::Int(x), Num::Big(y)) => Some(BigInt::from(*x).cmp(y)),
        (Num::Big(x), Num::Int(y)) => Some(x.cmp(&BigInt::from(*y))),
        (Num::Float(x), Num::Float(y)) => x.partial_cmp(y),
        (Num::Int(x), Num::Float(y)) => (*x as f64).partial_cmp(y),
        (Num::Float(x), Num::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Num::Big(x), Num::Float(y)) => x.to_f64().and_then(|fx| fx.partial_cmp(y)),
        (Num::Float(x), Num::Big(y)) => y.to_f64().and_then(|fy| x.partial_cmp(&fy)),
    }
}
