//! The iteration protocol: `iter`/`next` over builtin containers, user
//! iterators, and eager generators.
//!
//! `iter_next` returns `Ok(None)` on exhaustion; only an explicit `next()`
//! builtin converts that into a surfaced `StopIteration`. A `StopIteration`
//! raised by a user `__next__` terminates the consuming loop and never
//! escapes it.

use std::collections::VecDeque;

use crate::{
    args::ArgValues,
    exception_private::{ExcPayload, ExcType, RunError, RunResult},
    heap::{HeapData, HeapId},
    types::{GeneratorState, KraitIter, Type},
    value::Value,
};

use super::Evaluator;

impl Evaluator<'_> {
    /// The `iter(x)` protocol.
    pub(crate) fn get_iter(&mut self, value: Value) -> RunResult<Value> {
        if let Value::Ref(id) = value {
            let iter = match self.heap.get(id) {
                HeapData::List(_) => Some(KraitIter::List { id, pos: 0 }),
                HeapData::Tuple(_) => Some(KraitIter::Tuple { id, pos: 0 }),
                HeapData::Str(_) => Some(KraitIter::Str { id, pos: 0 }),
                HeapData::Bytes(_) => Some(KraitIter::Bytes { id, pos: 0 }),
                HeapData::Range(range) => Some(KraitIter::Range { range: *range, pos: 0 }),
                HeapData::Dict(dict) => Some(KraitIter::Snapshot {
                    items: dict.keys(),
                    pos: 0,
                    ty: Type::DictKeyIterator,
                }),
                HeapData::Set(set) | HeapData::FrozenSet(set) => Some(KraitIter::Snapshot {
                    items: set.iter().collect(),
                    pos: 0,
                    ty: Type::SetIterator,
                }),
                HeapData::DictView { items, .. } => Some(KraitIter::Snapshot {
                    items: items.clone(),
                    pos: 0,
                    ty: Type::DictKeyIterator,
                }),
                // Iterators and generators are their own iterators.
                HeapData::Iter(_) => return Ok(value),
                HeapData::Generator(generator) => {
                    if generator.is_async {
                        return Err(ExcType::type_error(
                            "'async_generator' object is not iterable",
                        ));
                    }
                    return Ok(value);
                }
                HeapData::Instance(_) => {
                    return match self.call_dunder(value, "__iter__", ArgValues::Empty)? {
                        Some(iterator) => Ok(iterator),
                        None => Err(ExcType::type_error(format!(
                            "'{}' object is not iterable",
                            value.type_name(self.heap)
                        ))),
                    };
                }
                _ => None,
            };
            if let Some(iter) = iter {
                return Ok(self.heap.alloc_value(HeapData::Iter(iter)));
            }
        }
        Err(ExcType::type_error(format!(
            "'{}' object is not iterable",
            value.type_name(self.heap)
        )))
    }

    /// The `next(it)` protocol; `Ok(None)` signals exhaustion.
    pub(crate) fn iter_next(&mut self, iterator: Value) -> RunResult<Option<Value>> {
        let Value::Ref(id) = iterator else {
            return Err(ExcType::type_error(format!(
                "'{}' object is not an iterator",
                iterator.type_name(self.heap)
            )));
        };
        match self.heap.get(id) {
            HeapData::Iter(_) => self.builtin_iter_next(id),
            HeapData::Generator(generator) => {
                if generator.is_async {
                    return Err(ExcType::type_error("'async_generator' object is not an iterator"));
                }
                self.generator_next(id)
            }
            HeapData::Instance(_) => {
                match self.call_dunder(iterator, "__next__", ArgValues::Empty) {
                    Ok(Some(value)) => Ok(Some(value)),
                    Ok(None) => Err(ExcType::type_error(format!(
                        "'{}' object is not an iterator",
                        iterator.type_name(self.heap)
                    ))),
                    Err(err) if self.is_stop_iteration(&err) => Ok(None),
                    Err(err) => Err(err),
                }
            }
            _ => Err(ExcType::type_error(format!(
                "'{}' object is not an iterator",
                iterator.type_name(self.heap)
            ))),
        }
    }

    /// Whether an in-flight error is a plain `StopIteration` (the for-loop
    /// termination signal).
    pub(crate) fn is_stop_iteration(&self, err: &RunError) -> bool {
        match &err.payload {
            ExcPayload::Simple(exc) => exc.exc_type == ExcType::StopIteration,
            ExcPayload::Object(value) => match value {
                Value::Ref(id) => match self.heap.get(*id) {
                    HeapData::Exception(exc) => exc.exc_type == ExcType::StopIteration,
                    HeapData::Instance(instance) => {
                        crate::types::class_exc_base(self.heap, instance.class_id)
                            == Some(ExcType::StopIteration)
                    }
                    _ => false,
                },
                _ => false,
            },
        }
    }

    fn is_stop_async_iteration(&self, err: &RunError) -> bool {
        match &err.payload {
            ExcPayload::Simple(exc) => exc.exc_type == ExcType::StopAsyncIteration,
            ExcPayload::Object(value) => match value {
                Value::Ref(id) => match self.heap.get(*id) {
                    HeapData::Exception(exc) => exc.exc_type == ExcType::StopAsyncIteration,
                    _ => false,
                },
                _ => false,
            },
        }
    }

    /// Advances a builtin iterator variant.
    fn builtin_iter_next(&mut self, iter_id: HeapId) -> RunResult<Option<Value>> {
        // Copy the small state out so the heap borrow can be released while
        // inner iterators and callables run.
        enum Step {
            Done(Option<Value>),
            /// Write the new cursor back, produce the value.
            Index(usize, Value),
            /// A string chunk still needs allocation after the borrow ends.
            StrChunk(usize, String),
            Enumerate(Value, i64),
            Zip(Vec<Value>),
            Map(Value, Vec<Value>),
            Filter(Value, Value),
        }

        let step = match self.heap.get(iter_id) {
            HeapData::Iter(KraitIter::List { id, pos }) => {
                let (id, pos) = (*id, *pos);
                match self.heap.get(id) {
                    HeapData::List(items) => match items.get(pos) {
                        Some(item) => Step::Index(pos + 1, *item),
                        None => Step::Done(None),
                    },
                    _ => Step::Done(None),
                }
            }
            HeapData::Iter(KraitIter::Tuple { id, pos }) => {
                let (id, pos) = (*id, *pos);
                match self.heap.get(id) {
                    HeapData::Tuple(items) => match items.get(pos) {
                        Some(item) => Step::Index(pos + 1, *item),
                        None => Step::Done(None),
                    },
                    _ => Step::Done(None),
                }
            }
            HeapData::Iter(KraitIter::Str { id, pos }) => {
                let (id, pos) = (*id, *pos);
                match self.heap.get(id) {
                    HeapData::Str(s) => match s[pos..].chars().next() {
                        Some(c) => Step::StrChunk(pos + c.len_utf8(), c.to_string()),
                        None => Step::Done(None),
                    },
                    _ => Step::Done(None),
                }
            }
            HeapData::Iter(KraitIter::Bytes { id, pos }) => {
                let (id, pos) = (*id, *pos);
                match self.heap.get(id) {
                    HeapData::Bytes(bytes) => match bytes.get(pos) {
                        Some(byte) => Step::Index(pos + 1, Value::Int(i64::from(*byte))),
                        None => Step::Done(None),
                    },
                    _ => Step::Done(None),
                }
            }
            HeapData::Iter(KraitIter::Range { range, pos }) => {
                let (range, pos) = (*range, *pos);
                if pos < range.len() {
                    Step::Index((pos + 1) as usize, Value::Int(range.get(pos)))
                } else {
                    Step::Done(None)
                }
            }
            HeapData::Iter(KraitIter::Snapshot { items, pos, .. }) => match items.get(*pos) {
                Some(item) => Step::Index(*pos + 1, *item),
                None => Step::Done(None),
            },
            HeapData::Iter(KraitIter::Enumerate { inner, count }) => Step::Enumerate(*inner, *count),
            HeapData::Iter(KraitIter::Zip { inners }) => Step::Zip(inners.clone()),
            HeapData::Iter(KraitIter::Map { func, inners }) => Step::Map(*func, inners.clone()),
            HeapData::Iter(KraitIter::Filter { func, inner }) => Step::Filter(*func, *inner),
            _ => return Err(ExcType::type_error("expected an iterator")),
        };

        match step {
            Step::Done(result) => Ok(result),
            Step::StrChunk(new_pos, text) => {
                let value = self.heap.alloc_str(text);
                if let HeapData::Iter(KraitIter::Str { pos, .. }) = self.heap.get_mut(iter_id) {
                    *pos = new_pos;
                }
                Ok(Some(value))
            }
            Step::Index(new_pos, value) => {
                if let HeapData::Iter(iter) = self.heap.get_mut(iter_id) {
                    match iter {
                        KraitIter::List { pos, .. }
                        | KraitIter::Tuple { pos, .. }
                        | KraitIter::Str { pos, .. }
                        | KraitIter::Bytes { pos, .. }
                        | KraitIter::Snapshot { pos, .. } => *pos = new_pos,
                        KraitIter::Range { pos, .. } => *pos = new_pos as i64,
                        _ => {}
                    }
                }
                Ok(Some(value))
            }
            Step::Enumerate(inner, count) => {
                let Some(item) = self.iter_next(inner)? else {
                    return Ok(None);
                };
                if let HeapData::Iter(KraitIter::Enumerate { count: c, .. }) = self.heap.get_mut(iter_id) {
                    *c = count + 1;
                }
                let pair = self.heap.alloc_tuple(vec![Value::Int(count), item]);
                Ok(Some(pair))
            }
            Step::Zip(inners) => {
                let mut items = Vec::with_capacity(inners.len());
                for inner in inners {
                    let Some(item) = self.iter_next(inner)? else {
                        return Ok(None);
                    };
                    items.push(item);
                }
                Ok(Some(self.heap.alloc_tuple(items)))
            }
            Step::Map(func, inners) => {
                let mut call_args = Vec::with_capacity(inners.len());
                for inner in inners {
                    let Some(item) = self.iter_next(inner)? else {
                        return Ok(None);
                    };
                    call_args.push(item);
                }
                let result = self.call_value(func, ArgValues::from_parts(call_args, Vec::new()))?;
                Ok(Some(result))
            }
            Step::Filter(func, inner) => loop {
                let Some(item) = self.iter_next(inner)? else {
                    return Ok(None);
                };
                let keep = if func.is_none() {
                    self.truthy(item)?
                } else {
                    let result = self.call_value(func, ArgValues::One(item))?;
                    self.truthy(result)?
                };
                if keep {
                    return Ok(Some(item));
                }
            },
        }
    }

    // --- generators ---

    /// Advances an eager generator, collecting its body on first use.
    pub(crate) fn generator_next(&mut self, gen_id: HeapId) -> RunResult<Option<Value>> {
        self.ensure_generator_collected(gen_id)?;
        let HeapData::Generator(generator) = self.heap.get_mut(gen_id) else {
            return Err(ExcType::type_error("expected a generator"));
        };
        match &mut generator.state {
            GeneratorState::Buffered { values, error } => {
                if let Some(value) = values.pop_front() {
                    return Ok(Some(value));
                }
                let error = error.take();
                generator.state = GeneratorState::Exhausted;
                match error {
                    // The terminal exception surfaces after the buffer drains.
                    Some(err) => Err(err),
                    None => Ok(None),
                }
            }
            GeneratorState::Exhausted => Ok(None),
            GeneratorState::Unstarted { .. } => unreachable!("collected above"),
        }
    }

    /// Runs the generator body to completion, buffering every yield.
    fn ensure_generator_collected(&mut self, gen_id: HeapId) -> RunResult<()> {
        let HeapData::Generator(generator) = self.heap.get_mut(gen_id) else {
            return Err(ExcType::type_error("expected a generator"));
        };
        if !matches!(generator.state, GeneratorState::Unstarted { .. }) {
            return Ok(());
        }
        let is_async = generator.is_async;
        let state = std::mem::replace(&mut generator.state, GeneratorState::Exhausted);
        let GeneratorState::Unstarted { func, args } = state else {
            unreachable!("checked above");
        };
        let Value::Ref(func_id) = func else {
            return Err(ExcType::type_error("corrupt generator"));
        };

        self.push_yield_buffer();
        let outcome = self.run_function_now(func_id, args, is_async);
        let collected: VecDeque<Value> = self.pop_yield_buffer().into();

        let error = match outcome {
            Ok(_) => None,
            Err(err) => Some(err),
        };
        if let HeapData::Generator(generator) = self.heap.get_mut(gen_id) {
            generator.state = GeneratorState::Buffered {
                values: collected,
                error,
            };
        }
        Ok(())
    }

    /// Marks a generator closed; buffered values are discarded.
    pub(crate) fn generator_close(&mut self, gen_id: HeapId) -> RunResult<()> {
        if let HeapData::Generator(generator) = self.heap.get_mut(gen_id) {
            generator.state = GeneratorState::Exhausted;
        }
        Ok(())
    }

    // --- async iteration ---

    pub(crate) fn get_async_iter(&mut self, value: Value) -> RunResult<Value> {
        if let Value::Ref(id) = value {
            match self.heap.get(id) {
                HeapData::Generator(generator) if generator.is_async => return Ok(value),
                HeapData::Instance(_) => {
                    return match self.call_dunder(value, "__aiter__", ArgValues::Empty)? {
                        Some(iterator) => Ok(iterator),
                        None => Err(ExcType::type_error(format!(
                            "'async for' requires an object with __aiter__ method, got {}",
                            value.type_name(self.heap)
                        ))),
                    };
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "'async for' requires an object with __aiter__ method, got {}",
            value.type_name(self.heap)
        )))
    }

    pub(crate) fn async_iter_next(&mut self, iterator: Value) -> RunResult<Option<Value>> {
        if let Value::Ref(id) = iterator {
            match self.heap.get(id) {
                HeapData::Generator(generator) if generator.is_async => {
                    return self.generator_next(id);
                }
                HeapData::Instance(_) => {
                    return match self.call_dunder(iterator, "__anext__", ArgValues::Empty) {
                        Ok(Some(awaitable)) => match self.await_value(awaitable) {
                            Ok(value) => Ok(Some(value)),
                            Err(err) if self.is_stop_async_iteration(&err) => Ok(None),
                            Err(err) => Err(err),
                        },
                        Ok(None) => Err(ExcType::type_error(format!(
                            "'async for' requires an iterator with __anext__ method, got {}",
                            iterator.type_name(self.heap)
                        ))),
                        Err(err) if self.is_stop_async_iteration(&err) => Ok(None),
                        Err(err) => Err(err),
                    };
                }
                _ => {}
            }
        }
        Err(ExcType::type_error(format!(
            "'async for' requires an iterator with __anext__ method, got {}",
            iterator.type_name(self.heap)
        )))
    }

    // --- collection ---

    /// Materializes any iterable into a vector (for unpacking, `list(…)`,
    /// `*args` expansion, `yield from`, …).
    pub(crate) fn collect_iterable(&mut self, value: Value) -> RunResult<Vec<Value>> {
        if let Value::Ref(id) = value {
            match self.heap.get(id) {
                HeapData::List(items) | HeapData::Tuple(items) => return Ok(items.clone()),
                HeapData::Dict(dict) => return Ok(dict.keys()),
                HeapData::Set(set) | HeapData::FrozenSet(set) => return Ok(set.iter().collect()),
                HeapData::DictView { items, .. } => return Ok(items.clone()),
                HeapData::Range(range) => {
                    let range = *range;
                    let mut items = Vec::with_capacity(range.len().max(0) as usize);
                    for i in 0..range.len() {
                        items.push(Value::Int(range.get(i)));
                    }
                    return Ok(items);
                }
                HeapData::Str(s) => {
                    let chars: Vec<String> = s.chars().map(|c| c.to_string()).collect();
                    return Ok(chars.into_iter().map(|c| self.heap.alloc_str(c)).collect());
                }
                _ => {}
            }
        }
        let iterator = self.get_iter(value)?;
        let mut items = Vec::new();
        while let Some(item) = self.iter_next(iterator)? {
            items.push(item);
        }
        Ok(items)
    }
}
