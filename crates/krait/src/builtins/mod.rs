//! Builtin functions, type constructors, and exception constructors.
//!
//! Everything bound into the root scope at interpreter start lives behind
//! the [`Builtins`] enum, so builtin values stay `Copy` and dispatch is a
//! single match. The larger builtins (`print`, `sorted`, `min`/`max`,
//! `isinstance`) have their own submodules.

mod isinstance;
mod min_max;
mod print;
mod sorted;

use num_bigint::BigInt;
use num_traits::FromPrimitive;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    args::ArgValues,
    eval::Evaluator,
    exception_private::{ExcType, RunResult},
    heap::HeapData,
    namespace::{GLOBAL_SCOPE, Scopes},
    types::{KraitIter, Property, RangeObject, Type},
    value::{Value, as_f64, as_int, is_int_like},
};

pub(crate) use isinstance::{isinstance_check, issubclass_check};

/// A callable bound into the root scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Builtins {
    /// A builtin function like `print`, `len`, `type`.
    Function(BuiltinFunction),
    /// An exception type constructor like `ValueError`.
    Exc(ExcType),
    /// A type constructor like `list`, `int`.
    Type(Type),
    /// An unbound method of a builtin type (`str.upper`, `list.append`),
    /// produced by attribute lookup and called through a bound method.
    TypeMethod { ty: Type, method: &'static str },
}

impl Builtins {
    pub fn py_type(self) -> Type {
        match self {
            Self::Function(_) | Self::TypeMethod { .. } => Type::BuiltinFunction,
            Self::Exc(_) | Self::Type(_) => Type::Type,
        }
    }
}

/// Builtin functions; the string form is the binding name (`Print` ->
/// "print").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum BuiltinFunction {
    Abs,
    All,
    Any,
    Callable,
    Chr,
    Classmethod,
    Delattr,
    Dir,
    Divmod,
    Enumerate,
    Filter,
    Format,
    Getattr,
    Hasattr,
    Hash,
    Id,
    Input,
    Isinstance,
    Issubclass,
    Iter,
    Len,
    Map,
    Max,
    Min,
    Next,
    Ord,
    Pow,
    Print,
    Property,
    Range,
    Repr,
    Reversed,
    Round,
    Setattr,
    Sorted,
    Staticmethod,
    Sum,
    Super,
    Type,
    Zip,
}

const ALL_FUNCTIONS: &[BuiltinFunction] = &[
    BuiltinFunction::Abs,
    BuiltinFunction::All,
    BuiltinFunction::Any,
    BuiltinFunction::Callable,
    BuiltinFunction::Chr,
    BuiltinFunction::Classmethod,
    BuiltinFunction::Delattr,
    BuiltinFunction::Dir,
    BuiltinFunction::Divmod,
    BuiltinFunction::Enumerate,
    BuiltinFunction::Filter,
    BuiltinFunction::Format,
    BuiltinFunction::Getattr,
    BuiltinFunction::Hasattr,
    BuiltinFunction::Hash,
    BuiltinFunction::Id,
    BuiltinFunction::Input,
    BuiltinFunction::Isinstance,
    BuiltinFunction::Issubclass,
    BuiltinFunction::Iter,
    BuiltinFunction::Len,
    BuiltinFunction::Map,
    BuiltinFunction::Max,
    BuiltinFunction::Min,
    BuiltinFunction::Next,
    BuiltinFunction::Ord,
    BuiltinFunction::Pow,
    BuiltinFunction::Print,
    BuiltinFunction::Property,
    BuiltinFunction::Range,
    BuiltinFunction::Repr,
    BuiltinFunction::Reversed,
    BuiltinFunction::Round,
    BuiltinFunction::Setattr,
    BuiltinFunction::Sorted,
    BuiltinFunction::Staticmethod,
    BuiltinFunction::Sum,
    BuiltinFunction::Super,
    BuiltinFunction::Type,
    BuiltinFunction::Zip,
];

const TYPE_CONSTRUCTORS: &[Type] = &[
    Type::Bool,
    Type::Int,
    Type::Float,
    Type::Str,
    Type::Bytes,
    Type::List,
    Type::Tuple,
    Type::Dict,
    Type::Set,
    Type::FrozenSet,
];

const EXCEPTION_TYPES: &[ExcType] = &[
    ExcType::BaseException,
    ExcType::Exception,
    ExcType::LookupError,
    ExcType::IndexError,
    ExcType::KeyError,
    ExcType::ArithmeticError,
    ExcType::ZeroDivisionError,
    ExcType::OverflowError,
    ExcType::FloatingPointError,
    ExcType::NameError,
    ExcType::UnboundLocalError,
    ExcType::RuntimeError,
    ExcType::RecursionError,
    ExcType::NotImplementedError,
    ExcType::AssertionError,
    ExcType::AttributeError,
    ExcType::SyntaxError,
    ExcType::TypeError,
    ExcType::ValueError,
    ExcType::StopIteration,
    ExcType::StopAsyncIteration,
    ExcType::GeneratorExit,
];

/// Binds every builtin identifier into the root scope.
pub(crate) fn seed_globals(scopes: &mut Scopes) {
    for &function in ALL_FUNCTIONS {
        scopes.set(
            GLOBAL_SCOPE,
            <&'static str>::from(function),
            Value::Builtin(Builtins::Function(function)),
        );
    }
    for &ty in TYPE_CONSTRUCTORS {
        scopes.set(GLOBAL_SCOPE, <&'static str>::from(ty), Value::Builtin(Builtins::Type(ty)));
    }
    for &exc in EXCEPTION_TYPES {
        scopes.set(GLOBAL_SCOPE, <&'static str>::from(exc), Value::Builtin(Builtins::Exc(exc)));
    }
    scopes.set(GLOBAL_SCOPE, "NotImplemented", Value::NotImplemented);
}

/// Dispatches a builtin function call.
pub(crate) fn call_function(
    ev: &mut Evaluator<'_>,
    function: BuiltinFunction,
    args: ArgValues,
) -> RunResult<Value> {
    match function {
        BuiltinFunction::Abs => builtin_abs(ev, args),
        BuiltinFunction::All => {
            let iterable = args.expect_one("all")?;
            let items = ev.collect_iterable(iterable)?;
            for item in items {
                if !ev.truthy(item)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        BuiltinFunction::Any => {
            let iterable = args.expect_one("any")?;
            let items = ev.collect_iterable(iterable)?;
            for item in items {
                if ev.truthy(item)? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        BuiltinFunction::Callable => {
            let value = args.expect_one("callable")?;
            Ok(Value::Bool(is_callable(ev, value)))
        }
        BuiltinFunction::Chr => {
            let code = args.expect_one("chr")?;
            let code = as_int(code, ev.heap)
                .ok_or_else(|| ExcType::type_error("an integer is required"))?;
            let c = u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .ok_or_else(|| ExcType::value_error("chr() arg not in range(0x110000)"))?;
            Ok(ev.heap.alloc_str(c.to_string()))
        }
        BuiltinFunction::Classmethod => {
            let func = args.expect_one("classmethod")?;
            Ok(ev.heap.alloc_value(HeapData::ClassMethod(func)))
        }
        BuiltinFunction::Staticmethod => {
            let func = args.expect_one("staticmethod")?;
            Ok(ev.heap.alloc_value(HeapData::StaticMethod(func)))
        }
        BuiltinFunction::Delattr => {
            let (obj, name) = args.expect_two("delattr")?;
            let name = expect_str(ev, name, "attribute name must be string")?;
            ev.del_attr(obj, &name)?;
            Ok(Value::None)
        }
        BuiltinFunction::Dir => builtin_dir(ev, args),
        BuiltinFunction::Divmod => {
            let (a, b) = args.expect_two("divmod")?;
            let (quotient, remainder) = ev.divmod_values(a, b)?;
            Ok(ev.heap.alloc_tuple(vec![quotient, remainder]))
        }
        BuiltinFunction::Enumerate => {
            let (iterable, start) = args.expect_one_or_two("enumerate")?;
            let count = match start {
                Some(v) => as_int(v, ev.heap)
                    .ok_or_else(|| ExcType::type_error("enumerate() start must be an integer"))?,
                None => 0,
            };
            let inner = ev.get_iter(iterable)?;
            Ok(ev.heap.alloc_value(HeapData::Iter(KraitIter::Enumerate { inner, count })))
        }
        BuiltinFunction::Filter => {
            let (func, iterable) = args.expect_two("filter")?;
            let inner = ev.get_iter(iterable)?;
            Ok(ev.heap.alloc_value(HeapData::Iter(KraitIter::Filter { func, inner })))
        }
        BuiltinFunction::Format => {
            let (value, spec) = args.expect_one_or_two("format")?;
            let spec = match spec {
                Some(spec) => expect_str(ev, spec, "format() spec must be a string")?,
                None => String::new(),
            };
            let formatted = ev.format_value(value, &spec)?;
            Ok(ev.heap.alloc_str(formatted))
        }
        BuiltinFunction::Getattr => {
            let (pos, _) = args.into_parts();
            if pos.len() < 2 || pos.len() > 3 {
                return Err(ExcType::type_error("getattr expected 2 or 3 arguments"));
            }
            let name = expect_str(ev, pos[1], "attribute name must be string")?;
            match ev.get_attr(pos[0], &name) {
                Ok(value) => Ok(value),
                Err(err) if is_attribute_error(ev, &err) => match pos.get(2) {
                    Some(default) => Ok(*default),
                    None => Err(err),
                },
                Err(err) => Err(err),
            }
        }
        BuiltinFunction::Hasattr => {
            let (obj, name) = args.expect_two("hasattr")?;
            let name = expect_str(ev, name, "attribute name must be string")?;
            match ev.get_attr(obj, &name) {
                Ok(_) => Ok(Value::Bool(true)),
                Err(err) if is_attribute_error(ev, &err) => Ok(Value::Bool(false)),
                Err(err) => Err(err),
            }
        }
        BuiltinFunction::Hash => {
            let value = args.expect_one("hash")?;
            let hash = ev.hash_value(value)?;
            Ok(Value::Int(i64::from_ne_bytes(hash.to_ne_bytes())))
        }
        BuiltinFunction::Id => {
            let value = args.expect_one("id")?;
            let id = match value {
                Value::Ref(heap_id) => i64::from(heap_id.raw()),
                // Immediates get a stable synthetic identity, consistent with
                // equal values sharing one (like interned small ints).
                immediate => {
                    let hash = ev.hash_value(immediate)?;
                    i64::from_ne_bytes(hash.to_ne_bytes()).wrapping_abs()
                }
            };
            Ok(Value::Int(id))
        }
        BuiltinFunction::Input => Err(ExcType::NotImplementedError.msg("input() is not supported")),
        BuiltinFunction::Isinstance => {
            let (obj, classinfo) = args.expect_two("isinstance")?;
            isinstance_check(ev, obj, classinfo).map(Value::Bool)
        }
        BuiltinFunction::Issubclass => {
            let (cls, classinfo) = args.expect_two("issubclass")?;
            issubclass_check(ev, cls, classinfo).map(Value::Bool)
        }
        BuiltinFunction::Iter => {
            let value = args.expect_one("iter")?;
            ev.get_iter(value)
        }
        BuiltinFunction::Len => builtin_len(ev, args),
        BuiltinFunction::Map => {
            let (pos, _) = args.into_parts();
            if pos.len() < 2 {
                return Err(ExcType::type_error("map() must have at least two arguments."));
            }
            let func = pos[0];
            let mut inners = Vec::with_capacity(pos.len() - 1);
            for iterable in &pos[1..] {
                inners.push(ev.get_iter(*iterable)?);
            }
            Ok(ev.heap.alloc_value(HeapData::Iter(KraitIter::Map { func, inners })))
        }
        BuiltinFunction::Max => min_max::call(ev, args, true),
        BuiltinFunction::Min => min_max::call(ev, args, false),
        BuiltinFunction::Next => {
            let (iterator, default) = args.expect_one_or_two("next")?;
            match ev.iter_next(iterator)? {
                Some(value) => Ok(value),
                None => match default {
                    Some(default) => Ok(default),
                    None => Err(ExcType::stop_iteration()),
                },
            }
        }
        BuiltinFunction::Ord => {
            let value = args.expect_one("ord")?;
            let s = expect_str(ev, value, "ord() expected string of length 1")?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Int(i64::from(c as u32))),
                _ => Err(ExcType::type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        BuiltinFunction::Pow => builtin_pow(ev, args),
        BuiltinFunction::Print => print::call(ev, args),
        BuiltinFunction::Property => builtin_property(ev, args),
        BuiltinFunction::Range => builtin_range(ev, args),
        BuiltinFunction::Repr => {
            let value = args.expect_one("repr")?;
            let repr = ev.py_repr(value)?;
            Ok(ev.heap.alloc_str(repr))
        }
        BuiltinFunction::Reversed => builtin_reversed(ev, args),
        BuiltinFunction::Round => builtin_round(ev, args),
        BuiltinFunction::Setattr => {
            let (pos, _) = args.into_parts();
            if pos.len() != 3 {
                return Err(ExcType::type_error("setattr expected 3 arguments"));
            }
            let name = expect_str(ev, pos[1], "attribute name must be string")?;
            ev.set_attr(pos[0], &name, pos[2])?;
            Ok(Value::None)
        }
        BuiltinFunction::Sorted => sorted::call(ev, args),
        BuiltinFunction::Sum => {
            let (iterable, start) = args.expect_one_or_two("sum")?;
            let mut acc = start.unwrap_or(Value::Int(0));
            let items = ev.collect_iterable(iterable)?;
            for item in items {
                acc = ev.binary_op(crate::ast::BinOp::Add, acc, item)?;
            }
            Ok(acc)
        }
        BuiltinFunction::Super => ev.make_super(args),
        BuiltinFunction::Type => {
            let value = args.expect_one("type")?;
            Ok(type_of(ev, value))
        }
        BuiltinFunction::Zip => {
            let (pos, _) = args.into_parts();
            let mut inners = Vec::with_capacity(pos.len());
            for iterable in pos {
                inners.push(ev.get_iter(iterable)?);
            }
            Ok(ev.heap.alloc_value(HeapData::Iter(KraitIter::Zip { inners })))
        }
    }
}

// --- the smaller builtins ---

fn builtin_abs(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let value = args.expect_one("abs")?;
    if ev.is_instance(value) {
        if let Some(result) = ev.call_dunder(value, "__abs__", ArgValues::Empty)? {
            return Ok(result);
        }
    }
    match value {
        Value::Int(i) => Ok(match i.checked_abs() {
            Some(a) => Value::Int(a),
            None => ev.heap.alloc_int(-BigInt::from(i)),
        }),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::LongInt(big) => {
                let abs = num_traits::Signed::abs(big);
                Ok(ev.heap.alloc_int(abs))
            }
            _ => Err(ExcType::type_error(format!(
                "bad operand type for abs(): '{}'",
                value.type_name(ev.heap)
            ))),
        },
        _ => Err(ExcType::type_error(format!(
            "bad operand type for abs(): '{}'",
            value.type_name(ev.heap)
        ))),
    }
}

fn builtin_len(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let value = args.expect_one("len")?;
    if let Value::Ref(id) = value {
        let len = match ev.heap.get(id) {
            HeapData::Str(s) => Some(s.chars().count()),
            HeapData::Bytes(b) => Some(b.len()),
            HeapData::List(items) | HeapData::Tuple(items) => Some(items.len()),
            HeapData::Dict(d) => Some(d.len()),
            HeapData::Set(s) | HeapData::FrozenSet(s) => Some(s.len()),
            HeapData::Range(r) => Some(r.len().max(0) as usize),
            HeapData::DictView { items, .. } => Some(items.len()),
            _ => None,
        };
        if let Some(len) = len {
            return Ok(Value::Int(len as i64));
        }
        if let Some(result) = ev.call_dunder(value, "__len__", ArgValues::Empty)? {
            return match as_int(result, ev.heap) {
                Some(len) if len >= 0 => Ok(Value::Int(len)),
                Some(_) => Err(ExcType::value_error("__len__() should return >= 0")),
                None => Err(ExcType::type_error("'__len__' should return an integer")),
            };
        }
    }
    Err(ExcType::type_error(format!(
        "object of type '{}' has no len()",
        value.type_name(ev.heap)
    )))
}

fn builtin_pow(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, _) = args.into_parts();
    match pos.len() {
        2 => ev.binary_op(crate::ast::BinOp::Pow, pos[0], pos[1]),
        3 => {
            let base = to_bigint(ev, pos[0])?;
            let exp = to_bigint(ev, pos[1])?;
            let modulus = to_bigint(ev, pos[2])?;
            ev.int_pow_mod(&base, &exp, &modulus)
        }
        n => Err(ExcType::type_error(format!("pow() expected 2 or 3 arguments, got {n}"))),
    }
}

fn to_bigint(ev: &Evaluator<'_>, value: Value) -> RunResult<BigInt> {
    match value {
        Value::Bool(b) => Ok(BigInt::from(i64::from(b))),
        Value::Int(i) => Ok(BigInt::from(i)),
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::LongInt(big) => Ok(big.clone()),
            _ => Err(ExcType::type_error(
                "pow() 3rd argument requires all arguments be integers",
            )),
        },
        _ => Err(ExcType::type_error(
            "pow() 3rd argument requires all arguments be integers",
        )),
    }
}

fn builtin_property(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, kwargs) = args.into_parts();
    if pos.len() > 3 {
        return Err(ExcType::type_error("property() takes at most 3 positional arguments"));
    }
    let mut fget = pos.first().copied().filter(|v| !v.is_none());
    let mut fset = pos.get(1).copied().filter(|v| !v.is_none());
    let mut fdel = pos.get(2).copied().filter(|v| !v.is_none());
    for (name, value) in kwargs {
        match name.as_str() {
            "fget" => fget = Some(value),
            "fset" => fset = Some(value),
            "fdel" => fdel = Some(value),
            // doc strings are accepted and ignored.
            "doc" => {}
            other => {
                return Err(ExcType::type_error(format!(
                    "'{other}' is an invalid keyword argument for property()"
                )));
            }
        }
    }
    Ok(ev.heap.alloc_value(HeapData::Property(Property { fget, fset, fdel })))
}

fn builtin_range(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, _) = args.into_parts();
    let ints: Vec<i64> = pos
        .iter()
        .map(|v| {
            as_int(*v, ev.heap).ok_or_else(|| {
                ExcType::type_error(format!(
                    "'{}' object cannot be interpreted as an integer",
                    v.type_name(ev.heap)
                ))
            })
        })
        .collect::<RunResult<_>>()?;
    let range = match ints.as_slice() {
        [stop] => RangeObject::new(0, *stop, 1)?,
        [start, stop] => RangeObject::new(*start, *stop, 1)?,
        [start, stop, step] => RangeObject::new(*start, *stop, *step)?,
        _ => {
            return Err(ExcType::type_error(format!(
                "range expected 1 to 3 arguments, got {}",
                ints.len()
            )));
        }
    };
    Ok(ev.heap.alloc_value(HeapData::Range(range)))
}

fn builtin_reversed(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let value = args.expect_one("reversed")?;
    if ev.is_instance(value) {
        if let Some(result) = ev.call_dunder(value, "__reversed__", ArgValues::Empty)? {
            return Ok(result);
        }
    }
    let mut items = match value {
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::List(items) | HeapData::Tuple(items) => items.clone(),
            HeapData::Str(_) | HeapData::Range(_) => ev.collect_iterable(value)?,
            _ => {
                return Err(ExcType::type_error(format!(
                    "argument to reversed() must be a sequence, not '{}'",
                    value.type_name(ev.heap)
                )));
            }
        },
        _ => {
            return Err(ExcType::type_error(format!(
                "argument to reversed() must be a sequence, not '{}'",
                value.type_name(ev.heap)
            )));
        }
    };
    items.reverse();
    Ok(ev.heap.alloc_value(HeapData::Iter(KraitIter::Snapshot {
        items,
        pos: 0,
        ty: Type::Reversed,
    })))
}

/// `round()`: banker's rounding (ties to even), like Python.
fn builtin_round(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (value, ndigits) = args.expect_one_or_two("round")?;
    let ndigits = match ndigits {
        None | Some(Value::None) => None,
        Some(v) => Some(
            as_int(v, ev.heap).ok_or_else(|| ExcType::type_error("round() ndigits must be an integer"))?,
        ),
    };
    if is_int_like(value, ev.heap) {
        // Rounding an int is the int itself (non-negative ndigits).
        if ndigits.is_none_or(|n| n >= 0) {
            return Ok(value);
        }
    }
    let Some(f) = as_f64(value, ev.heap) else {
        return Err(ExcType::type_error(format!(
            "type {} doesn't define __round__ method",
            value.type_name(ev.heap)
        )));
    };
    match ndigits {
        None => {
            let rounded = f.round_ties_even();
            if rounded.abs() < i64::MAX as f64 {
                Ok(Value::Int(rounded as i64))
            } else {
                let big = BigInt::from_f64(rounded)
                    .ok_or_else(|| ExcType::OverflowError.msg("cannot convert float infinity to integer"))?;
                Ok(ev.heap.alloc_int(big))
            }
        }
        Some(n) => {
            let scale = 10f64.powi(n.clamp(-320, 320) as i32);
            let scaled = f * scale;
            // Past the precision cliff scaling is meaningless; the value is
            // already its own rounding.
            if scaled.is_infinite() {
                return Ok(Value::Float(f));
            }
            Ok(Value::Float(scaled.round_ties_even() / scale))
        }
    }
}

fn builtin_dir(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let target = args.expect_at_most_one("dir")?;
    let mut names: Vec<String> = match target {
        None => ev.scopes.global_names(),
        Some(Value::Ref(id)) => match ev.heap.get(id) {
            HeapData::Instance(instance) => {
                let mut names: Vec<String> = instance.attrs.keys().cloned().collect();
                let class_id = instance.class_id;
                if let HeapData::ClassObject(cls) = ev.heap.get(class_id) {
                    for base_id in cls.mro.clone() {
                        if let HeapData::ClassObject(base) = ev.heap.get(base_id) {
                            names.extend(base.namespace.keys().cloned());
                        }
                    }
                }
                names
            }
            HeapData::ClassObject(cls) => {
                let mut names = Vec::new();
                for base_id in cls.mro.clone() {
                    if let HeapData::ClassObject(base) = ev.heap.get(base_id) {
                        names.extend(base.namespace.keys().cloned());
                    }
                }
                names
            }
            _ => type_method_names(Value::Ref(id).py_type(ev.heap)),
        },
        Some(other) => type_method_names(other.py_type(ev.heap)),
    };
    names.sort();
    names.dedup();
    let values: Vec<Value> = names.into_iter().map(|n| ev.heap.alloc_str(n)).collect();
    Ok(ev.heap.alloc_list(values))
}

fn type_method_names(ty: Type) -> Vec<String> {
    // A coarse surface: the method table for the type, if it has one.
    let mut names = Vec::new();
    for candidate in [
        "append", "capitalize", "clear", "copy", "count", "extend", "find", "format", "get",
        "index", "insert", "items", "join", "keys", "lower", "pop", "remove", "replace",
        "reverse", "sort", "split", "strip", "title", "update", "upper", "values",
    ] {
        if crate::eval::methods::lookup_type_method(ty, candidate).is_some() {
            names.push(candidate.to_string());
        }
    }
    names
}

fn is_callable(ev: &Evaluator<'_>, value: Value) -> bool {
    match value {
        Value::Builtin(_) => true,
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::Function(_)
            | HeapData::BoundMethod(_)
            | HeapData::ClassObject(_)
            | HeapData::StaticMethod(_) => true,
            HeapData::Instance(instance) => {
                crate::types::mro_lookup(ev.heap, instance.class_id, "__call__").is_some()
            }
            _ => false,
        },
        _ => false,
    }
}

fn is_attribute_error(ev: &Evaluator<'_>, err: &crate::exception_private::RunError) -> bool {
    use crate::exception_private::ExcPayload;
    match &err.payload {
        ExcPayload::Simple(exc) => exc.exc_type.is_subclass_of(ExcType::AttributeError),
        ExcPayload::Object(value) => match value {
            Value::Ref(id) => match ev.heap.get(*id) {
                HeapData::Exception(exc) => exc.exc_type.is_subclass_of(ExcType::AttributeError),
                _ => false,
            },
            _ => false,
        },
    }
}

/// `type(x)` as a value.
fn type_of(ev: &Evaluator<'_>, value: Value) -> Value {
    if let Value::Ref(id) = value {
        match ev.heap.get(id) {
            HeapData::Instance(instance) => return Value::Ref(instance.class_id),
            HeapData::Exception(exc) => return Value::Builtin(Builtins::Exc(exc.exc_type)),
            _ => {}
        }
    }
    Value::Builtin(Builtins::Type(value.py_type(ev.heap)))
}

fn expect_str(ev: &Evaluator<'_>, value: Value, message: &str) -> RunResult<String> {
    match value {
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::Str(s) => Ok(s.clone()),
            _ => Err(ExcType::type_error(message.to_string())),
        },
        _ => Err(ExcType::type_error(message.to_string())),
    }
}

// --- type constructors ---

/// Calls a type constructor (`int(…)`, `list(…)`, …).
pub(crate) fn call_type_constructor(ev: &mut Evaluator<'_>, ty: Type, args: ArgValues) -> RunResult<Value> {
    match ty {
        Type::Bool => {
            let value = args.expect_at_most_one("bool")?;
            match value {
                Some(v) => Ok(Value::Bool(ev.truthy(v)?)),
                None => Ok(Value::Bool(false)),
            }
        }
        Type::Int => construct_int(ev, args),
        Type::Float => construct_float(ev, args),
        Type::Str => {
            let value = args.expect_at_most_one("str")?;
            match value {
                Some(v) => {
                    let text = ev.py_str(v)?;
                    Ok(ev.heap.alloc_str(text))
                }
                None => Ok(ev.heap.alloc_str(String::new())),
            }
        }
        Type::Bytes => construct_bytes(ev, args),
        Type::List => {
            let value = args.expect_at_most_one("list")?;
            let items = match value {
                Some(v) => ev.collect_iterable(v)?,
                None => Vec::new(),
            };
            Ok(ev.heap.alloc_list(items))
        }
        Type::Tuple => {
            let value = args.expect_at_most_one("tuple")?;
            let items = match value {
                Some(v) => ev.collect_iterable(v)?,
                None => Vec::new(),
            };
            Ok(ev.heap.alloc_tuple(items))
        }
        Type::Dict => construct_dict(ev, args),
        Type::Set | Type::FrozenSet => {
            let name = if ty == Type::Set { "set" } else { "frozenset" };
            let value = args.expect_at_most_one(name)?;
            let items = match value {
                Some(v) => ev.collect_iterable(v)?,
                None => Vec::new(),
            };
            ev.set_from_values(items, ty == Type::FrozenSet)
        }
        other => Err(ExcType::type_error(format!("cannot create '{other}' instances"))),
    }
}

fn construct_int(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, _) = args.into_parts();
    if pos.len() > 2 {
        return Err(ExcType::type_error("int() takes at most 2 arguments"));
    }
    let Some(&value) = pos.first() else {
        return Ok(Value::Int(0));
    };
    let base = match pos.get(1) {
        Some(b) => {
            let base = as_int(*b, ev.heap).ok_or_else(|| ExcType::type_error("int() base must be an integer"))?;
            if base != 0 && !(2..=36).contains(&base) {
                return Err(ExcType::value_error("int() base must be >= 2 and <= 36, or 0"));
            }
            Some(base as u32)
        }
        None => None,
    };

    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Int(_) => Ok(value),
        Value::Float(f) => {
            if base.is_some() {
                return Err(ExcType::type_error("int() can't convert non-string with explicit base"));
            }
            if f.is_nan() {
                return Err(ExcType::value_error("cannot convert float NaN to integer"));
            }
            if f.is_infinite() {
                return Err(ExcType::OverflowError.msg("cannot convert float infinity to integer"));
            }
            let truncated = f.trunc();
            if truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
                Ok(Value::Int(truncated as i64))
            } else {
                let big = BigInt::from_f64(truncated)
                    .ok_or_else(|| ExcType::OverflowError.msg("cannot convert float infinity to integer"))?;
                Ok(ev.heap.alloc_int(big))
            }
        }
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::LongInt(_) => Ok(value),
            HeapData::Str(s) => {
                let text = s.trim().to_string();
                let base = base.unwrap_or(10);
                let cleaned: String = text.chars().filter(|c| *c != '_').collect();
                // At most one leading sign.
                let (negative, digits) = match cleaned.strip_prefix('-') {
                    Some(rest) => (true, rest),
                    None => (false, cleaned.strip_prefix('+').unwrap_or(cleaned.as_str())),
                };
                // Accept base prefixes for the matching explicit base.
                let digits = match base {
                    16 => digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")).unwrap_or(digits),
                    8 => digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")).unwrap_or(digits),
                    2 => digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")).unwrap_or(digits),
                    _ => digits,
                };
                match BigInt::parse_bytes(digits.as_bytes(), base) {
                    Some(big) if !digits.is_empty() => {
                        let big = if negative { -big } else { big };
                        Ok(ev.heap.alloc_int(big))
                    }
                    _ => Err(ExcType::value_error(format!(
                        "invalid literal for int() with base {base}: {}",
                        crate::eval::str_repr(&text)
                    ))),
                }
            }
            _ => Err(ExcType::type_error(format!(
                "int() argument must be a string or a number, not '{}'",
                value.type_name(ev.heap)
            ))),
        },
        _ => Err(ExcType::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            value.type_name(ev.heap)
        ))),
    }
}

fn construct_float(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let value = args.expect_at_most_one("float")?;
    let Some(value) = value else {
        return Ok(Value::Float(0.0));
    };
    if let Some(f) = as_f64(value, ev.heap) {
        return Ok(Value::Float(f));
    }
    if let Value::Ref(id) = value
        && let HeapData::Str(s) = ev.heap.get(id)
    {
        let text = s.trim();
        let parsed = match text.to_ascii_lowercase().as_str() {
            "inf" | "infinity" | "+inf" | "+infinity" => Some(f64::INFINITY),
            "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
            "nan" | "+nan" | "-nan" => Some(f64::NAN),
            _ => text.replace('_', "").parse::<f64>().ok(),
        };
        return match parsed {
            Some(f) => Ok(Value::Float(f)),
            None => Err(ExcType::value_error(format!(
                "could not convert string to float: {}",
                crate::eval::str_repr(text)
            ))),
        };
    }
    Err(ExcType::type_error(format!(
        "float() argument must be a string or a number, not '{}'",
        value.type_name(ev.heap)
    )))
}

fn construct_bytes(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let value = args.expect_at_most_one("bytes")?;
    let bytes = match value {
        None => Vec::new(),
        Some(Value::Int(n)) => {
            if n < 0 {
                return Err(ExcType::value_error("negative count"));
            }
            vec![0u8; n as usize]
        }
        Some(v @ Value::Ref(id)) => match ev.heap.get(id) {
            HeapData::Bytes(b) => b.clone(),
            HeapData::Str(_) => {
                return Err(ExcType::type_error("string argument without an encoding"));
            }
            HeapData::List(_) | HeapData::Tuple(_) | HeapData::Range(_) => {
                let items = ev.collect_iterable(v)?;
                let mut bytes = Vec::with_capacity(items.len());
                for item in items {
                    let Some(byte) = as_int(item, ev.heap) else {
                        return Err(ExcType::type_error(format!(
                            "'{}' object cannot be interpreted as an integer",
                            item.type_name(ev.heap)
                        )));
                    };
                    let byte = u8::try_from(byte)
                        .map_err(|_| ExcType::value_error("bytes must be in range(0, 256)"))?;
                    bytes.push(byte);
                }
                bytes
            }
            _ => {
                return Err(ExcType::type_error(format!(
                    "cannot convert '{}' object to bytes",
                    v.type_name(ev.heap)
                )));
            }
        },
        Some(other) => {
            return Err(ExcType::type_error(format!(
                "cannot convert '{}' object to bytes",
                other.type_name(ev.heap)
            )));
        }
    };
    Ok(ev.heap.alloc_value(HeapData::Bytes(bytes)))
}

fn construct_dict(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, kwargs) = args.into_parts();
    if pos.len() > 1 {
        return Err(ExcType::type_error("dict expected at most 1 argument"));
    }
    let mut pairs: Vec<(Value, Value)> = Vec::new();
    if let Some(&source) = pos.first() {
        let is_mapping =
            matches!(source, Value::Ref(id) if matches!(ev.heap.get(id), HeapData::Dict(_)));
        if is_mapping {
            pairs.extend(ev.dict_pairs(source)?);
        } else {
            // An iterable of key/value pairs.
            let items = ev.collect_iterable(source)?;
            for (i, item) in items.into_iter().enumerate() {
                let pair = ev.collect_iterable(item).map_err(|_| {
                    ExcType::type_error(format!(
                        "cannot convert dictionary update sequence element #{i} to a sequence"
                    ))
                })?;
                if pair.len() != 2 {
                    return Err(ExcType::value_error(format!(
                        "dictionary update sequence element #{i} has length {}; 2 is required",
                        pair.len()
                    )));
                }
                pairs.push((pair[0], pair[1]));
            }
        }
    }
    for (name, value) in kwargs {
        let key = ev.heap.alloc_str(name);
        pairs.push((key, value));
    }
    ev.dict_from_pairs(pairs)
}

