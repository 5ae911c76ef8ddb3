//! The owned, heap-independent value type used at the API boundary.
//!
//! `Object` mirrors `Value` without referencing the interpreter's arena, so
//! embedders can pass inputs in and carry results out. Values with no
//! structural mirror (functions, classes, instances) export as
//! `Object::Repr` carrying their rendered form.

use num_bigint::BigInt;

use crate::{
    eval::Evaluator,
    heap::{Heap, HeapData},
    py_hash,
    types::{Dict, Set},
    value::Value,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    None,
    Bool(bool),
    Int(i64),
    /// Integer beyond the i64 range.
    BigInt(BigInt),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Object>),
    Tuple(Vec<Object>),
    /// Key/value pairs in insertion order.
    Dict(Vec<(Object, Object)>),
    Set(Vec<Object>),
    /// A value with no structural mirror, rendered with `repr()`.
    Repr(String),
}

impl From<i64> for Object {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for Object {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for Object {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Object {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Object {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl Object {
    /// Imports an object into the arena, producing a `Value`.
    pub(crate) fn to_value(&self, heap: &mut Heap) -> Value {
        match self {
            Self::None => Value::None,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Int(*i),
            Self::BigInt(big) => heap.alloc_int(big.clone()),
            Self::Float(f) => Value::Float(*f),
            Self::Str(s) => heap.alloc_str(s.clone()),
            Self::Bytes(b) => heap.alloc_value(HeapData::Bytes(b.clone())),
            Self::List(items) => {
                let values: Vec<Value> = items.iter().map(|o| o.to_value(heap)).collect();
                heap.alloc_list(values)
            }
            Self::Tuple(items) => {
                let values: Vec<Value> = items.iter().map(|o| o.to_value(heap)).collect();
                heap.alloc_tuple(values)
            }
            Self::Dict(pairs) => {
                let mut dict = Dict::new();
                for (key, value) in pairs {
                    let key_value = key.to_value(heap);
                    let value_value = value.to_value(heap);
                    dict.insert_new(structural_hash(key_value, heap), key_value, value_value);
                }
                heap.alloc_value(HeapData::Dict(dict))
            }
            Self::Set(items) => {
                let mut set = Set::new();
                for item in items {
                    let value = item.to_value(heap);
                    set.insert_new(structural_hash(value, heap), value);
                }
                heap.alloc_value(HeapData::Set(set))
            }
            Self::Repr(text) => heap.alloc_str(text.clone()),
        }
    }
}

/// Hash for imported keys; only the primitive forms embedders can
/// meaningfully seed are hashed precisely.
fn structural_hash(value: Value, heap: &Heap) -> u64 {
    match value {
        Value::None => 0x23d4_a4e1,
        Value::NotImplemented => 0x23d4_a4e2,
        Value::Bool(b) => py_hash::hash_int(i64::from(b)),
        Value::Int(i) => py_hash::hash_int(i),
        Value::Float(f) => py_hash::hash_float(f),
        Value::Builtin(_) => 0,
        Value::Ref(id) => match heap.get(id) {
            HeapData::Str(s) => py_hash::hash_str(s),
            HeapData::Bytes(b) => py_hash::hash_bytes(b),
            HeapData::LongInt(big) => py_hash::hash_bigint(big),
            _ => 0,
        },
    }
}

impl Evaluator<'_> {
    /// Exports a runtime value as an owned `Object`.
    pub(crate) fn export_value(&mut self, value: Value) -> Object {
        match value {
            Value::None => Object::None,
            Value::Bool(b) => Object::Bool(b),
            Value::Int(i) => Object::Int(i),
            Value::Float(f) => Object::Float(f),
            Value::NotImplemented | Value::Builtin(_) => {
                Object::Repr(self.py_repr(value).unwrap_or_default())
            }
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Str(s) => Object::Str(s.clone()),
                HeapData::Bytes(b) => Object::Bytes(b.clone()),
                HeapData::LongInt(big) => Object::BigInt(big.clone()),
                HeapData::List(items) => {
                    let items = items.clone();
                    Object::List(items.into_iter().map(|v| self.export_value(v)).collect())
                }
                HeapData::Tuple(items) => {
                    let items = items.clone();
                    Object::Tuple(items.into_iter().map(|v| self.export_value(v)).collect())
                }
                HeapData::Dict(dict) => {
                    let pairs: Vec<(Value, Value)> = dict.iter().collect();
                    Object::Dict(
                        pairs
                            .into_iter()
                            .map(|(k, v)| (self.export_value(k), self.export_value(v)))
                            .collect(),
                    )
                }
                HeapData::Set(set) | HeapData::FrozenSet(set) => {
                    let items: Vec<Value> = set.iter().collect();
                    Object::Set(items.into_iter().map(|v| self.export_value(v)).collect())
                }
                HeapData::Range(_) => {
                    let items = self.collect_iterable(value).unwrap_or_default();
                    Object::List(items.into_iter().map(|v| self.export_value(v)).collect())
                }
                _ => Object::Repr(self.py_repr(value).unwrap_or_default()),
            },
        }
    }
}
