//! `isinstance` / `issubclass`.
//!
//! Class information may be a user class, a builtin type constructor, a
//! builtin exception type, or a tuple of any of those. The numeric-tower
//! containments hold: `isinstance(True, int)` is true, and exception
//! matching crosses from user classes into the builtin hierarchy through
//! the class's recorded exception base.

use crate::{
    eval::Evaluator,
    exception_private::{ExcType, RunResult},
    heap::HeapData,
    types::Type,
    value::Value,
};

use super::Builtins;

pub(crate) fn isinstance_check(ev: &mut Evaluator<'_>, obj: Value, classinfo: Value) -> RunResult<bool> {
    // Tuple of alternatives.
    if let Value::Ref(id) = classinfo
        && let HeapData::Tuple(items) = ev.heap.get(id)
    {
        let items = items.clone();
        for item in items {
            if isinstance_check(ev, obj, item)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    match classinfo {
        Value::Builtin(Builtins::Type(expected)) => Ok(type_matches(ev, obj, expected)),
        Value::Builtin(Builtins::Exc(expected)) => Ok(exception_instance_of(ev, obj, expected)),
        Value::Ref(id) if matches!(ev.heap.get(id), HeapData::ClassObject(_)) => {
            let Value::Ref(obj_id) = obj else { return Ok(false) };
            match ev.heap.get(obj_id) {
                HeapData::Instance(instance) => {
                    let class_id = instance.class_id;
                    match ev.heap.get(class_id) {
                        HeapData::ClassObject(cls) => Ok(cls.is_subclass_of(class_id, id)),
                        _ => Ok(false),
                    }
                }
                _ => Ok(false),
            }
        }
        _ => Err(ExcType::type_error(
            "isinstance() arg 2 must be a type or tuple of types",
        )),
    }
}

pub(crate) fn issubclass_check(ev: &mut Evaluator<'_>, cls: Value, classinfo: Value) -> RunResult<bool> {
    if let Value::Ref(id) = classinfo
        && let HeapData::Tuple(items) = ev.heap.get(id)
    {
        let items = items.clone();
        for item in items {
            if issubclass_check(ev, cls, item)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    match (cls, classinfo) {
        (Value::Builtin(Builtins::Exc(actual)), Value::Builtin(Builtins::Exc(expected))) => {
            Ok(actual.is_subclass_of(expected))
        }
        (Value::Builtin(Builtins::Type(actual)), Value::Builtin(Builtins::Type(expected))) => {
            // bool ⊂ int is the one builtin containment.
            Ok(actual == expected || (actual == Type::Bool && expected == Type::Int))
        }
        (Value::Ref(cls_id), Value::Ref(expected_id)) => {
            match (ev.heap.get(cls_id), ev.heap.get(expected_id)) {
                (HeapData::ClassObject(actual), HeapData::ClassObject(_)) => {
                    Ok(actual.is_subclass_of(cls_id, expected_id))
                }
                _ => Err(ExcType::type_error("issubclass() arg 1 must be a class")),
            }
        }
        (Value::Ref(cls_id), Value::Builtin(Builtins::Exc(expected))) => {
            match ev.heap.get(cls_id) {
                HeapData::ClassObject(cls) => {
                    Ok(cls.exc_base.is_some_and(|base| base.is_subclass_of(expected)))
                }
                _ => Err(ExcType::type_error("issubclass() arg 1 must be a class")),
            }
        }
        (Value::Builtin(Builtins::Exc(_)), Value::Ref(expected_id)) => {
            match ev.heap.get(expected_id) {
                // A builtin exception type is never a subclass of a user class.
                HeapData::ClassObject(_) => Ok(false),
                _ => Err(ExcType::type_error(
                    "issubclass() arg 2 must be a class or tuple of classes",
                )),
            }
        }
        _ => Err(ExcType::type_error("issubclass() arg 1 must be a class")),
    }
}

/// `isinstance(obj, builtin_type)` with the numeric-tower containment.
fn type_matches(ev: &Evaluator<'_>, obj: Value, expected: Type) -> bool {
    let actual = obj.py_type(ev.heap);
    if actual == expected {
        return true;
    }
    // bool ⊂ int for truthiness and arithmetic.
    actual == Type::Bool && expected == Type::Int
}

/// `isinstance(exc_obj, ValueError)`-style checks, for both lightweight
/// builtin exception objects and user exception instances.
fn exception_instance_of(ev: &Evaluator<'_>, obj: Value, expected: ExcType) -> bool {
    let Value::Ref(id) = obj else { return false };
    match ev.heap.get(id) {
        HeapData::Exception(exc) => exc.exc_type.is_subclass_of(expected),
        HeapData::Instance(instance) => crate::types::class_exc_base(ev.heap, instance.class_id)
            .is_some_and(|base| base.is_subclass_of(expected)),
        _ => false,
    }
}
