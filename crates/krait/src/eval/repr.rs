//! `repr()` and `str()` rendering.
//!
//! Instances dispatch through `__repr__`/`__str__` at every nesting level;
//! containers recurse with a cycle guard that prints `[...]`-style markers
//! instead of overflowing on self-referential structures.

use std::fmt::Write as _;

use crate::{
    args::ArgValues,
    builtins::Builtins,
    exception_private::{ExcType, RunResult},
    heap::{HeapData, HeapId},
    types::Type,
    value::{Value, float_repr},
};

use super::Evaluator;

impl Evaluator<'_> {
    /// `str(x)`: `__str__` if defined, else the repr.
    pub(crate) fn py_str(&mut self, value: Value) -> RunResult<String> {
        if let Value::Ref(id) = value {
            match self.heap.get(id) {
                HeapData::Str(s) => return Ok(s.clone()),
                HeapData::Exception(exc) => {
                    let exc = exc.clone();
                    return Ok(self.simple_exception_message(&exc));
                }
                HeapData::Instance(instance) => {
                    let exc_class = crate::types::class_exc_base(self.heap, instance.class_id);
                    if let Some(result) = self.call_dunder(value, "__str__", ArgValues::Empty)? {
                        return self.expect_str_result(result, "__str__");
                    }
                    // Exception instances stringify from their args tuple.
                    if exc_class.is_some() {
                        return Ok(self.exception_object_message(value));
                    }
                    return self.py_repr(value);
                }
                _ => {}
            }
        }
        match value {
            Value::None => Ok("None".to_string()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(float_repr(f)),
            _ => self.py_repr(value),
        }
    }

    /// `repr(x)`.
    pub(crate) fn py_repr(&mut self, value: Value) -> RunResult<String> {
        match value {
            Value::None => Ok("None".to_string()),
            Value::NotImplemented => Ok("NotImplemented".to_string()),
            Value::Bool(true) => Ok("True".to_string()),
            Value::Bool(false) => Ok("False".to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Float(f) => Ok(float_repr(f)),
            Value::Builtin(builtin) => Ok(builtin_repr(builtin)),
            Value::Ref(id) => self.heap_repr(value, id),
        }
    }

    fn expect_str_result(&mut self, result: Value, dunder: &str) -> RunResult<String> {
        match result {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Str(s) => Ok(s.clone()),
                _ => Err(ExcType::type_error(format!(
                    "{dunder} returned non-string (type {})",
                    result.type_name(self.heap)
                ))),
            },
            _ => Err(ExcType::type_error(format!(
                "{dunder} returned non-string (type {})",
                result.type_name(self.heap)
            ))),
        }
    }

    fn heap_repr(&mut self, value: Value, id: HeapId) -> RunResult<String> {
        // Cycle guard for containers.
        if self.repr_seen.contains(&id) {
            let marker = match self.heap.get(id) {
                HeapData::List(_) => "[...]",
                HeapData::Dict(_) => "{...}",
                HeapData::Set(_) => "{...}",
                HeapData::Tuple(_) => "(...)",
                _ => "...",
            };
            return Ok(marker.to_string());
        }

        match self.heap.get(id) {
            HeapData::Str(s) => Ok(str_repr(s)),
            HeapData::Bytes(bytes) => Ok(bytes_repr(bytes)),
            HeapData::LongInt(big) => Ok(big.to_string()),
            HeapData::List(items) => {
                let items = items.clone();
                self.repr_seen.push(id);
                let result = self.join_reprs(&items, "[", "]", false);
                self.repr_seen.pop();
                result
            }
            HeapData::Tuple(items) => {
                let items = items.clone();
                self.repr_seen.push(id);
                let result = self.join_reprs(&items, "(", ")", items.len() == 1);
                self.repr_seen.pop();
                result
            }
            HeapData::Dict(dict) => {
                let pairs: Vec<(Value, Value)> = dict.iter().collect();
                self.repr_seen.push(id);
                let mut out = String::from("{");
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let key_repr = self.py_repr(*key)?;
                    let value_repr = self.py_repr(*value)?;
                    let _ = write!(out, "{key_repr}: {value_repr}");
                }
                out.push('}');
                self.repr_seen.pop();
                Ok(out)
            }
            HeapData::Set(set) => {
                let items: Vec<Value> = set.iter().collect();
                if items.is_empty() {
                    return Ok("set()".to_string());
                }
                self.repr_seen.push(id);
                let result = self.join_reprs(&items, "{", "}", false);
                self.repr_seen.pop();
                result
            }
            HeapData::FrozenSet(set) => {
                let items: Vec<Value> = set.iter().collect();
                if items.is_empty() {
                    return Ok("frozenset()".to_string());
                }
                self.repr_seen.push(id);
                let inner = self.join_reprs(&items, "{", "}", false)?;
                self.repr_seen.pop();
                Ok(format!("frozenset({inner})"))
            }
            HeapData::Range(range) => {
                if range.step == 1 {
                    Ok(format!("range({}, {})", range.start, range.stop))
                } else {
                    Ok(format!("range({}, {}, {})", range.start, range.stop, range.step))
                }
            }
            HeapData::Slice(slice) => {
                let slice = *slice;
                let start = self.py_repr(slice.start)?;
                let stop = self.py_repr(slice.stop)?;
                let step = self.py_repr(slice.step)?;
                Ok(format!("slice({start}, {stop}, {step})"))
            }
            HeapData::Function(func) => Ok(format!(
                "<function {} at {:#x}>",
                func.name,
                id.raw()
            )),
            HeapData::BoundMethod(method) => {
                let func = method.func;
                let name = match func {
                    Value::Ref(func_id) => match self.heap.get(func_id) {
                        HeapData::Function(f) => f.name.clone(),
                        _ => "?".to_string(),
                    },
                    Value::Builtin(Builtins::TypeMethod { method, .. }) => method.to_string(),
                    _ => "?".to_string(),
                };
                Ok(format!("<bound method {name} at {:#x}>", id.raw()))
            }
            HeapData::Property(_) => Ok(format!("<property object at {:#x}>", id.raw())),
            HeapData::ClassMethod(_) => Ok(format!("<classmethod object at {:#x}>", id.raw())),
            HeapData::StaticMethod(_) => Ok(format!("<staticmethod object at {:#x}>", id.raw())),
            HeapData::ClassObject(cls) => Ok(format!("<class '{}'>", cls.name)),
            HeapData::Super(_) => Ok(format!("<super object at {:#x}>", id.raw())),
            HeapData::Exception(exc) => {
                let exc = exc.clone();
                let message = self.simple_exception_message(&exc);
                if message.is_empty() {
                    Ok(format!("{}()", exc.exc_type))
                } else if exc.exc_type == ExcType::KeyError {
                    // KeyError's message is already the key's repr.
                    Ok(format!("{}({message})", exc.exc_type))
                } else {
                    Ok(format!("{}({})", exc.exc_type, str_repr(&message)))
                }
            }
            HeapData::Instance(instance) => {
                let is_exception = crate::types::class_exc_base(self.heap, instance.class_id).is_some();
                if let Some(result) = self.call_dunder(value, "__repr__", ArgValues::Empty)? {
                    return self.expect_str_result(result, "__repr__");
                }
                let type_name = value.type_name(self.heap);
                if is_exception {
                    let message = self.exception_object_message(value);
                    if message.is_empty() {
                        return Ok(format!("{type_name}()"));
                    }
                    return Ok(format!("{type_name}({})", str_repr(&message)));
                }
                Ok(format!("<{type_name} object at {:#x}>", id.raw()))
            }
            HeapData::Iter(iter) => Ok(format!("<{} object at {:#x}>", iter.py_type(), id.raw())),
            HeapData::DictView { view_type, items } => {
                let (view_type, items) = (*view_type, items.clone());
                let inner = self.join_reprs(&items, "[", "]", false)?;
                let name = match view_type {
                    Type::DictValues => "dict_values",
                    Type::DictItems => "dict_items",
                    _ => "dict_keys",
                };
                Ok(format!("{name}({inner})"))
            }
            HeapData::Generator(generator) => {
                let kind = if generator.is_async { "async_generator" } else { "generator" };
                Ok(format!("<{kind} object at {:#x}>", id.raw()))
            }
            HeapData::Coroutine(_) => Ok(format!("<coroutine object at {:#x}>", id.raw())),
        }
    }

    fn join_reprs(
        &mut self,
        items: &[Value],
        open: &str,
        close: &str,
        trailing_comma: bool,
    ) -> RunResult<String> {
        let mut out = String::from(open);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let repr = self.py_repr(*item)?;
            out.push_str(&repr);
        }
        if trailing_comma {
            out.push(',');
        }
        out.push_str(close);
        Ok(out)
    }
}

/// Python-style string repr: single quotes preferred, double quotes when
/// the text contains a single quote and no double quote.
pub(crate) fn str_repr(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn bytes_repr(bytes: &[u8]) -> String {
    let mut out = String::from("b'");
    for &byte in bytes {
        match byte {
            b'\\' => out.push_str("\\\\"),
            b'\'' => out.push_str("\\'"),
            b'\n' => out.push_str("\\n"),
            b'\r' => out.push_str("\\r"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(byte as char),
            other => {
                let _ = write!(out, "\\x{other:02x}");
            }
        }
    }
    out.push('\'');
    out
}

fn builtin_repr(builtin: Builtins) -> String {
    match builtin {
        Builtins::Function(f) => format!("<built-in function {f}>"),
        Builtins::Type(t) => format!("<class '{t}'>"),
        Builtins::Exc(e) => format!("<class '{e}'>"),
        Builtins::TypeMethod { ty, method } => {
            format!("<method '{method}' of '{ty}' objects>")
        }
    }
}
