//! The runtime value representation.
//!
//! `Value` is a small `Copy` tagged union: immediates (`None`, bools, i64
//! ints, floats) are stored inline, everything compound lives in the arena
//! behind `Ref(HeapId)`. The helpers here are the *structural* parts of the
//! value protocol — the ones that never need to call user dunders. Anything
//! that can dispatch into user code (equality of instances, truthiness via
//! `__bool__`, repr via `__repr__`) has its entry point on the evaluator,
//! which falls back to these.

use std::borrow::Cow;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::{
    builtins::Builtins,
    heap::{Heap, HeapData, HeapId},
    types::Type,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Value {
    None,
    /// Returned by binary dunders to signal "not my operand types"; the
    /// evaluator then tries the reflected operation on the other operand.
    NotImplemented,
    Bool(bool),
    Int(i64),
    Float(f64),
    /// A builtin function, type constructor, or exception constructor.
    Builtin(Builtins),
    /// Handle to a heap-allocated object.
    Ref(HeapId),
}

impl Value {
    pub fn py_type(self, heap: &Heap) -> Type {
        match self {
            Self::None => Type::NoneType,
            Self::NotImplemented => Type::NotImplementedType,
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Builtin(b) => b.py_type(),
            Self::Ref(id) => heap.get(id).py_type(),
        }
    }

    /// The user-visible type name: the class name for instances, the `Type`
    /// display string otherwise.
    pub fn type_name(self, heap: &Heap) -> Cow<'static, str> {
        match self {
            Self::Ref(id) => match heap.get(id) {
                HeapData::Instance(instance) => match heap.get(instance.class_id) {
                    HeapData::ClassObject(cls) => Cow::Owned(cls.name.clone()),
                    _ => Cow::Borrowed("object"),
                },
                HeapData::Exception(exc) => {
                    Cow::Borrowed(<&'static str>::from(exc.exc_type))
                }
                data => Cow::Borrowed(data.py_type().into()),
            },
            other => Cow::Borrowed(other.py_type(heap).into()),
        }
    }

    pub fn ref_id(self) -> Option<HeapId> {
        match self {
            Self::Ref(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

/// Structural truthiness: `Some(b)` when no user dunder is involved, `None`
/// for instances (which may define `__bool__`/`__len__`).
pub(crate) fn py_truthy_structural(value: Value, heap: &Heap) -> Option<bool> {
    let result = match value {
        Value::None => false,
        Value::NotImplemented => true,
        Value::Bool(b) => b,
        Value::Int(i) => i != 0,
        Value::Float(f) => f != 0.0,
        Value::Builtin(_) => true,
        Value::Ref(id) => match heap.get(id) {
            HeapData::Str(s) => !s.is_empty(),
            HeapData::Bytes(b) => !b.is_empty(),
            // Normalized: a heap LongInt is never zero.
            HeapData::LongInt(_) => true,
            HeapData::List(items) | HeapData::Tuple(items) => !items.is_empty(),
            HeapData::Dict(d) => !d.is_empty(),
            HeapData::Set(s) | HeapData::FrozenSet(s) => !s.is_empty(),
            HeapData::Range(r) => r.len() > 0,
            HeapData::DictView { items, .. } => !items.is_empty(),
            HeapData::Instance(_) => return None,
            _ => true,
        },
    };
    Some(result)
}

/// Bound on structural equality recursion; deeper nesting falls back to
/// identity so cyclic containers cannot overflow the stack.
const MAX_EQ_DEPTH: u32 = 200;

/// Structural equality: `Some(b)` when decidable without user dunders,
/// `None` when an instance is involved (the evaluator dispatches `__eq__`).
pub(crate) fn py_eq_structural(a: Value, b: Value, heap: &Heap) -> Option<bool> {
    py_eq_depth(a, b, heap, 0)
}

fn py_eq_depth(a: Value, b: Value, heap: &Heap, depth: u32) -> Option<bool> {
    if depth > MAX_EQ_DEPTH {
        return Some(ref_identity(a, b));
    }

    // Same heap object is always equal to itself.
    if let (Value::Ref(id1), Value::Ref(id2)) = (a, b)
        && id1 == id2
        && !matches!(heap.get(id1), HeapData::Instance(_))
    {
        return Some(true);
    }

    // Numeric cross-type equality: bool ⊂ int ⊂ number.
    if let (Some(x), Some(y)) = (numeric_kind(a, heap), numeric_kind(b, heap)) {
        return Some(numeric_eq(x, y));
    }

    match (a, b) {
        (Value::None, Value::None) => Some(true),
        (Value::NotImplemented, Value::NotImplemented) => Some(true),
        (Value::Builtin(x), Value::Builtin(y)) => Some(x == y),
        (Value::Ref(id1), Value::Ref(id2)) => match (heap.get(id1), heap.get(id2)) {
            (HeapData::Str(s1), HeapData::Str(s2)) => Some(s1 == s2),
            (HeapData::Bytes(b1), HeapData::Bytes(b2)) => Some(b1 == b2),
            (HeapData::List(x), HeapData::List(y)) | (HeapData::Tuple(x), HeapData::Tuple(y)) => {
                seq_eq(x, y, heap, depth)
            }
            (HeapData::Range(r1), HeapData::Range(r2)) => {
                let len = r1.len();
                if len != r2.len() {
                    return Some(false);
                }
                if len == 0 {
                    return Some(true);
                }
                if r1.start != r2.start {
                    return Some(false);
                }
                Some(len == 1 || r1.step == r2.step)
            }
            (HeapData::Slice(s1), HeapData::Slice(s2)) => {
                let start = py_eq_depth(s1.start, s2.start, heap, depth + 1)?;
                let stop = py_eq_depth(s1.stop, s2.stop, heap, depth + 1)?;
                let step = py_eq_depth(s1.step, s2.step, heap, depth + 1)?;
                Some(start && stop && step)
            }
            (HeapData::Dict(d1), HeapData::Dict(d2)) => {
                if d1.len() != d2.len() {
                    return Some(false);
                }
                for (k1, v1) in d1.iter() {
                    let mut matched = false;
                    for (k2, v2) in d2.iter() {
                        if py_eq_depth(k1, k2, heap, depth + 1)? {
                            if !py_eq_depth(v1, v2, heap, depth + 1)? {
                                return Some(false);
                            }
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        return Some(false);
                    }
                }
                Some(true)
            }
            (HeapData::Set(s1), HeapData::Set(s2))
            | (HeapData::FrozenSet(s1), HeapData::FrozenSet(s2))
            | (HeapData::Set(s1), HeapData::FrozenSet(s2))
            | (HeapData::FrozenSet(s1), HeapData::Set(s2)) => {
                if s1.len() != s2.len() {
                    return Some(false);
                }
                for v1 in s1.iter() {
                    let mut matched = false;
                    for v2 in s2.iter() {
                        if py_eq_depth(v1, v2, heap, depth + 1)? {
                            matched = true;
                            break;
                        }
                    }
                    if !matched {
                        return Some(false);
                    }
                }
                Some(true)
            }
            (HeapData::Instance(_), _) | (_, HeapData::Instance(_)) => None,
            // Exceptions, functions, classes, iterators: identity.
            _ => Some(id1 == id2),
        },
        (Value::Ref(id), _) | (_, Value::Ref(id)) => {
            if matches!(heap.get(id), HeapData::Instance(_)) {
                None
            } else {
                Some(false)
            }
        }
        _ => Some(false),
    }
}

fn seq_eq(x: &[Value], y: &[Value], heap: &Heap, depth: u32) -> Option<bool> {
    if x.len() != y.len() {
        return Some(false);
    }
    for (a, b) in x.iter().zip(y) {
        if !py_eq_depth(*a, *b, heap, depth + 1)? {
            return Some(false);
        }
    }
    Some(true)
}

/// Identity as used by `is`: same heap handle, or equal immediates.
pub(crate) fn ref_identity(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Ref(id1), Value::Ref(id2)) => id1 == id2,
        (Value::None, Value::None) => true,
        (Value::NotImplemented, Value::NotImplemented) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        // Inline immediates have value identity, like interned small ints.
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Builtin(x), Value::Builtin(y)) => x == y,
        _ => false,
    }
}

/// A number for mixed-type arithmetic and comparison.
#[derive(Debug, Clone)]
pub(crate) enum Num {
    Int(i64),
    Big(BigInt),
    Float(f64),
}

/// Extracts the numeric view of a value (bool counts as int).
pub(crate) fn numeric_kind(value: Value, heap: &Heap) -> Option<Num> {
    match value {
        Value::Bool(b) => Some(Num::Int(i64::from(b))),
        Value::Int(i) => Some(Num::Int(i)),
        Value::Float(f) => Some(Num::Float(f)),
        Value::Ref(id) => match heap.get(id) {
            HeapData::LongInt(big) => Some(Num::Big(big.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn numeric_eq(a: Num, b: Num) -> bool {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => x == y,
        (Num::Float(x), Num::Float(y)) => x == y,
        (Num::Int(x), Num::Float(y)) | (Num::Float(y), Num::Int(x)) => x as f64 == y,
        (Num::Big(x), Num::Big(y)) => x == y,
        (Num::Int(x), Num::Big(y)) | (Num::Big(y), Num::Int(x)) => BigInt::from(x) == y,
        (Num::Big(x), Num::Float(y)) | (Num::Float(y), Num::Big(x)) => {
            x.to_f64().is_some_and(|fx| fx == y)
        }
    }
}

/// Integer view of a value if it is an int/bool (floats excluded).
pub(crate) fn as_int(value: Value, heap: &Heap) -> Option<i64> {
    match value {
        Value::Bool(b) => Some(i64::from(b)),
        Value::Int(i) => Some(i),
        Value::Ref(id) => match heap.get(id) {
            HeapData::LongInt(big) => big.to_i64(),
            _ => None,
        },
        _ => None,
    }
}

/// True when the value is an int or bool of any magnitude.
pub(crate) fn is_int_like(value: Value, heap: &Heap) -> bool {
    matches!(value, Value::Bool(_) | Value::Int(_))
        || matches!(value, Value::Ref(id) if matches!(heap.get(id), HeapData::LongInt(_)))
}

/// Float view: ints and bools promote.
pub(crate) fn as_f64(value: Value, heap: &Heap) -> Option<f64> {
    match value {
        Value::Bool(b) => Some(f64::from(u8::from(b))),
        Value::Int(i) => Some(i as f64),
        Value::Float(f) => Some(f),
        Value::Ref(id) => match heap.get(id) {
            HeapData::LongInt(big) => big.to_f64(),
            _ => None,
        },
        _ => None,
    }
}

/// Shortest-round-trip float formatting with Python's display conventions:
/// a bare integral float prints with a trailing `.0`, exponents print as
/// `e+NN`/`e-NN`, and the specials are `inf`/`-inf`/`nan`.
pub(crate) fn float_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    let printed = buffer.format(value);
    match printed.find(['e', 'E']) {
        Some(idx) => {
            // ryu prints "1e30"/"1.5e-10"; Python prints "1e+30"/"1.5e-10".
            let (mantissa, exponent) = printed.split_at(idx);
            let exponent = &exponent[1..];
            let mantissa = mantissa.strip_suffix(".0").unwrap_or(mantissa);
            if let Some(stripped) = exponent.strip_prefix('-') {
                if stripped.len() == 1 {
                    format!("{mantissa}e-0{stripped}")
                } else {
                    format!("{mantissa}e-{stripped}")
                }
            } else if exponent.len() == 1 {
                format!("{mantissa}e+0{exponent}")
            } else {
                format!("{mantissa}e+{exponent}")
            }
        }
        None => printed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_repr_matches_python_conventions() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(2.5), "2.5");
        assert_eq!(float_repr(1e30), "1e+30");
        assert_eq!(float_repr(1.5e-10), "1.5e-10");
        assert_eq!(float_repr(f64::INFINITY), "inf");
        assert_eq!(float_repr(f64::NAN), "nan");
        assert_eq!(float_repr(1e5), "100000.0");
    }

    #[test]
    fn numeric_equality_crosses_types() {
        let heap = Heap::new();
        assert_eq!(
            py_eq_structural(Value::Int(1), Value::Bool(true), &heap),
            Some(true)
        );
        assert_eq!(
            py_eq_structural(Value::Int(2), Value::Float(2.0), &heap),
            Some(true)
        );
        assert_eq!(
            py_eq_structural(Value::Float(0.5), Value::Int(0), &heap),
            Some(false)
        );
    }

    #[test]
    fn sequences_compare_elementwise() {
        let mut heap = Heap::new();
        let a = heap.alloc_list(vec![Value::Int(1), Value::Int(2)]);
        let b = heap.alloc_list(vec![Value::Int(1), Value::Int(2)]);
        let c = heap.alloc_list(vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(py_eq_structural(a, b, &heap), Some(true));
        assert_eq!(py_eq_structural(a, c, &heap), Some(false));
    }
}
