//! Methods on builtin types, dispatched by name.
//!
//! Attribute access resolves `obj.method` through [`lookup_type_method`]
//! into a bound `Builtins::TypeMethod`; calling it lands in
//! [`call_type_method`]. Pure string algorithms live in
//! `types::str_methods`; this file unpacks arguments, touches the heap, and
//! routes equality/ordering through the evaluator protocol.

use crate::{
    args::ArgValues,
    exception_private::{ExcType, RunResult},
    heap::{HeapData, HeapId},
    types::{Property, Type, normalize_index, str_methods},
    value::{Value, as_int},
};

use super::Evaluator;

const STR_METHODS: &[&str] = &[
    "upper", "lower", "strip", "lstrip", "rstrip", "split", "rsplit", "splitlines", "join",
    "startswith", "endswith", "find", "rfind", "index", "count", "replace", "format", "zfill",
    "isdigit", "isalpha", "isalnum", "isspace", "isupper", "islower", "title", "capitalize",
];

const LIST_METHODS: &[&str] = &[
    "append", "extend", "insert", "pop", "remove", "clear", "index", "count", "sort", "reverse",
    "copy",
];

const DICT_METHODS: &[&str] = &[
    "get", "setdefault", "keys", "values", "items", "pop", "popitem", "update", "clear", "copy",
    "fromkeys",
];

const SET_METHODS: &[&str] = &[
    "add", "remove", "discard", "pop", "clear", "union", "intersection", "difference",
    "symmetric_difference", "issubset", "issuperset", "update", "copy",
];

const FROZENSET_METHODS: &[&str] = &[
    "union", "intersection", "difference", "symmetric_difference", "issubset", "issuperset",
    "copy",
];

const TUPLE_METHODS: &[&str] = &["count", "index"];

const GENERATOR_METHODS: &[&str] = &["__next__", "send", "close"];

const ITERATOR_METHODS: &[&str] = &["__next__"];

const PROPERTY_METHODS: &[&str] = &["getter", "setter", "deleter"];

/// Maps a method name to its `'static` canonical spelling, if known.
pub(crate) fn canonical_method_name(name: &str) -> &'static str {
    for table in [
        STR_METHODS,
        LIST_METHODS,
        DICT_METHODS,
        SET_METHODS,
        TUPLE_METHODS,
        GENERATOR_METHODS,
        PROPERTY_METHODS,
    ] {
        if let Some(found) = table.iter().find(|m| **m == name) {
            return found;
        }
    }
    "__next__"
}

/// Whether `ty` has a builtin method called `name`.
pub(crate) fn lookup_type_method(ty: Type, name: &str) -> Option<&'static str> {
    let table: &[&str] = match ty {
        Type::Str => STR_METHODS,
        Type::List => LIST_METHODS,
        Type::Dict => DICT_METHODS,
        Type::Set => SET_METHODS,
        Type::FrozenSet => FROZENSET_METHODS,
        Type::Tuple => TUPLE_METHODS,
        Type::Generator => GENERATOR_METHODS,
        Type::ListIterator
        | Type::TupleIterator
        | Type::StrIterator
        | Type::BytesIterator
        | Type::RangeIterator
        | Type::SetIterator
        | Type::DictKeyIterator
        | Type::Enumerate
        | Type::Zip
        | Type::Map
        | Type::Filter
        | Type::Reversed => ITERATOR_METHODS,
        Type::Property => PROPERTY_METHODS,
        _ => return None,
    };
    table.iter().find(|m| **m == name).copied()
}

/// Calls `receiver.method(args)` for a builtin type.
pub(crate) fn call_type_method(
    ev: &mut Evaluator<'_>,
    ty: Type,
    method: &'static str,
    receiver: Value,
    args: ArgValues,
) -> RunResult<Value> {
    match ty {
        Type::Str => str_method(ev, receiver, method, args),
        Type::List => list_method(ev, receiver, method, args),
        Type::Dict => dict_method(ev, receiver, method, args),
        Type::Set | Type::FrozenSet => set_method(ev, receiver, method, args),
        Type::Tuple => tuple_method(ev, receiver, method, args),
        Type::Generator => generator_method(ev, receiver, method, args),
        Type::Property => property_method(ev, receiver, method, args),
        _ if method == "__next__" => {
            args.expect_none("__next__")?;
            match ev.iter_next(receiver)? {
                Some(value) => Ok(value),
                None => Err(ExcType::stop_iteration()),
            }
        }
        _ => Err(ExcType::attribute_error(&ty.to_string(), method)),
    }
}

// --- str ---

fn receiver_str(ev: &Evaluator<'_>, receiver: Value) -> RunResult<String> {
    match receiver {
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::Str(s) => Ok(s.clone()),
            _ => Err(ExcType::type_error("descriptor requires a 'str' object")),
        },
        _ => Err(ExcType::type_error("descriptor requires a 'str' object")),
    }
}

fn arg_str(ev: &Evaluator<'_>, value: Value, method: &str) -> RunResult<String> {
    match value {
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::Str(s) => Ok(s.clone()),
            _ => Err(ExcType::type_error(format!(
                "{method}() argument must be str, not {}",
                value.type_name(ev.heap)
            ))),
        },
        _ => Err(ExcType::type_error(format!(
            "{method}() argument must be str, not {}",
            value.type_name(ev.heap)
        ))),
    }
}

fn opt_int(ev: &Evaluator<'_>, value: Option<Value>) -> RunResult<Option<i64>> {
    match value {
        None | Some(Value::None) => Ok(None),
        Some(v) => match as_int(v, ev.heap) {
            Some(i) => Ok(Some(i)),
            None => Err(ExcType::type_error("argument must be an integer or None")),
        },
    }
}

fn str_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let s = receiver_str(ev, receiver)?;
    match method {
        "upper" => {
            args.expect_none("upper")?;
            Ok(ev.heap.alloc_str(s.to_uppercase()))
        }
        "lower" => {
            args.expect_none("lower")?;
            Ok(ev.heap.alloc_str(s.to_lowercase()))
        }
        "title" => {
            args.expect_none("title")?;
            Ok(ev.heap.alloc_str(str_methods::title(&s)))
        }
        "capitalize" => {
            args.expect_none("capitalize")?;
            Ok(ev.heap.alloc_str(str_methods::capitalize(&s)))
        }
        "strip" | "lstrip" | "rstrip" => {
            let mode = match method {
                "lstrip" => str_methods::StripMode::Left,
                "rstrip" => str_methods::StripMode::Right,
                _ => str_methods::StripMode::Both,
            };
            let chars = match args.expect_at_most_one(method)? {
                None | Some(Value::None) => None,
                Some(v) => Some(arg_str(ev, v, method)?),
            };
            Ok(ev.heap.alloc_str(str_methods::strip(&s, chars.as_deref(), mode)))
        }
        "split" | "rsplit" => {
            let (pos, kwargs) = args.into_parts();
            let mut sep = pos.first().copied();
            let mut maxsplit = pos.get(1).copied();
            for (name, value) in kwargs {
                match name.as_str() {
                    "sep" => sep = Some(value),
                    "maxsplit" => maxsplit = Some(value),
                    other => {
                        return Err(ExcType::type_error(format!(
                            "'{other}' is an invalid keyword argument for {method}()"
                        )));
                    }
                }
            }
            let maxsplit = opt_int(ev, maxsplit)?;
            let parts = match sep {
                None | Some(Value::None) => str_methods::split_whitespace(&s),
                Some(sep) => {
                    let sep = arg_str(ev, sep, method)?;
                    if method == "split" {
                        str_methods::split_sep(&s, &sep, maxsplit)?
                    } else {
                        str_methods::rsplit_sep(&s, &sep, maxsplit)?
                    }
                }
            };
            let values: Vec<Value> = parts.into_iter().map(|p| ev.heap.alloc_str(p)).collect();
            Ok(ev.heap.alloc_list(values))
        }
        "splitlines" => {
            args.expect_none("splitlines")?;
            let values: Vec<Value> = str_methods::splitlines(&s)
                .into_iter()
                .map(|p| ev.heap.alloc_str(p))
                .collect();
            Ok(ev.heap.alloc_list(values))
        }
        "join" => {
            let iterable = args.expect_one("join")?;
            let items = ev.collect_iterable(iterable)?;
            let mut out = String::new();
            for (i, item) in items.iter().enumerate() {
                let Value::Ref(id) = item else {
                    return Err(ExcType::type_error(format!(
                        "sequence item {i}: expected str instance, {} found",
                        item.type_name(ev.heap)
                    )));
                };
                let HeapData::Str(part) = ev.heap.get(*id) else {
                    return Err(ExcType::type_error(format!(
                        "sequence item {i}: expected str instance, {} found",
                        item.type_name(ev.heap)
                    )));
                };
                if i > 0 {
                    out.push_str(&s);
                }
                out.push_str(part);
            }
            Ok(ev.heap.alloc_str(out))
        }
        "startswith" | "endswith" => {
            let (prefix, _) = args.expect_one_or_two(method)?;
            // A tuple of candidates is accepted, like Python.
            let candidates = match prefix {
                Value::Ref(id) if matches!(ev.heap.get(id), HeapData::Tuple(_)) => {
                    let HeapData::Tuple(items) = ev.heap.get(id) else {
                        unreachable!("matched above");
                    };
                    items.clone()
                }
                single => vec![single],
            };
            for candidate in candidates {
                let needle = arg_str(ev, candidate, method)?;
                let matched = if method == "startswith" {
                    s.starts_with(&needle)
                } else {
                    s.ends_with(&needle)
                };
                if matched {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        "find" | "rfind" | "index" => {
            let (pos, _) = args.into_parts();
            let sub = pos
                .first()
                .copied()
                .ok_or_else(|| ExcType::type_error(format!("{method}() takes at least 1 argument")))?;
            let sub = arg_str(ev, sub, method)?;
            let start = opt_int(ev, pos.get(1).copied())?;
            let end = opt_int(ev, pos.get(2).copied())?;
            let found = str_methods::find(&s, &sub, start, end, method == "rfind");
            if method == "index" && found < 0 {
                return Err(ExcType::value_error("substring not found"));
            }
            Ok(Value::Int(found))
        }
        "count" => {
            let (pos, _) = args.into_parts();
            let sub = pos
                .first()
                .copied()
                .ok_or_else(|| ExcType::type_error("count() takes at least 1 argument"))?;
            let sub = arg_str(ev, sub, "count")?;
            let start = opt_int(ev, pos.get(1).copied())?;
            let end = opt_int(ev, pos.get(2).copied())?;
            Ok(Value::Int(str_methods::count(&s, &sub, start, end)))
        }
        "replace" => {
            let (pos, _) = args.into_parts();
            if pos.len() < 2 || pos.len() > 3 {
                return Err(ExcType::type_error("replace() takes 2 or 3 arguments"));
            }
            let old = arg_str(ev, pos[0], "replace")?;
            let new = arg_str(ev, pos[1], "replace")?;
            let max = opt_int(ev, pos.get(2).copied())?;
            Ok(ev.heap.alloc_str(str_methods::replace(&s, &old, &new, max)))
        }
        "zfill" => {
            let width = args.expect_one("zfill")?;
            let width = as_int(width, ev.heap)
                .ok_or_else(|| ExcType::type_error("zfill() argument must be an integer"))?;
            Ok(ev.heap.alloc_str(str_methods::zfill(&s, width)))
        }
        "format" => str_format(ev, &s, args),
        "isdigit" => Ok(Value::Bool(str_methods::is_digit(&s))),
        "isalpha" => Ok(Value::Bool(str_methods::is_alpha(&s))),
        "isalnum" => Ok(Value::Bool(str_methods::is_alnum(&s))),
        "isspace" => Ok(Value::Bool(str_methods::is_space(&s))),
        "isupper" => Ok(Value::Bool(str_methods::is_upper(&s))),
        "islower" => Ok(Value::Bool(str_methods::is_lower(&s))),
        _ => Err(ExcType::attribute_error("str", method)),
    }
}

/// `"template".format(...)`: `{}` auto-numbering, `{0}` manual indexing,
/// `{name}` keyword fields, `{{`/`}}` escapes, and `:spec` suffixes.
/// Auto-numbered and manually indexed fields cannot be mixed.
fn str_format(ev: &mut Evaluator<'_>, template: &str, args: ArgValues) -> RunResult<Value> {
    let (pos, kwargs) = args.into_parts();
    let mut out = String::new();
    let mut auto_index = 0usize;
    let mut used_auto = false;
    let mut used_manual = false;
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut field = String::new();
                for inner in chars.by_ref() {
                    if inner == '}' {
                        break;
                    }
                    field.push(inner);
                }
                let (name, spec) = match field.split_once(':') {
                    Some((n, s)) => (n, Some(s)),
                    None => (field.as_str(), None),
                };
                let value = if name.is_empty() {
                    if used_manual {
                        return Err(ExcType::value_error(
                            "cannot switch from manual field specification to automatic field numbering",
                        ));
                    }
                    used_auto = true;
                    let value = pos.get(auto_index).copied().ok_or_else(|| {
                        ExcType::IndexError.msg("Replacement index out of range for positional args tuple")
                    })?;
                    auto_index += 1;
                    value
                } else if let Ok(index) = name.parse::<usize>() {
                    if used_auto {
                        return Err(ExcType::value_error(
                            "cannot switch from automatic field numbering to manual field specification",
                        ));
                    }
                    used_manual = true;
                    pos.get(index).copied().ok_or_else(|| {
                        ExcType::IndexError.msg("Replacement index out of range for positional args tuple")
                    })?
                } else {
                    kwargs
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| ExcType::key_error(ev.heap.alloc_str(name.to_string())))?
                };
                let rendered = match spec {
                    Some(spec) => ev.format_value(value, spec)?,
                    None => ev.py_str(value)?,
                };
                out.push_str(&rendered);
            }
            '}' => {
                return Err(ExcType::value_error("Single '}' encountered in format string"));
            }
            other => out.push(other),
        }
    }
    Ok(ev.heap.alloc_str(out))
}

// --- list ---

fn receiver_list_id(ev: &Evaluator<'_>, receiver: Value) -> RunResult<HeapId> {
    match receiver {
        Value::Ref(id) if matches!(ev.heap.get(id), HeapData::List(_)) => Ok(id),
        _ => Err(ExcType::type_error("descriptor requires a 'list' object")),
    }
}

fn list_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let list_id = receiver_list_id(ev, receiver)?;
    match method {
        "append" => {
            let item = args.expect_one("append")?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                items.push(item);
            }
            Ok(Value::None)
        }
        "extend" => {
            let iterable = args.expect_one("extend")?;
            let added = ev.collect_iterable(iterable)?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                items.extend(added);
            }
            Ok(Value::None)
        }
        "insert" => {
            let (index, item) = args.expect_two("insert")?;
            let index = as_int(index, ev.heap)
                .ok_or_else(|| ExcType::type_error("insert() index must be an integer"))?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                let len = items.len() as i64;
                let idx = if index < 0 {
                    (index + len).max(0)
                } else {
                    index.min(len)
                } as usize;
                items.insert(idx, item);
            }
            Ok(Value::None)
        }
        "pop" => {
            let index = args.expect_at_most_one("pop")?;
            let index = opt_int(ev, index)?.unwrap_or(-1);
            let HeapData::List(items) = ev.heap.get(list_id) else {
                unreachable!("receiver checked");
            };
            if items.is_empty() {
                return Err(ExcType::index_error("pop from empty list"));
            }
            let idx = normalize_index(index, items.len(), "pop")
                .map_err(|_| ExcType::index_error("pop index out of range"))?;
            let HeapData::List(items) = ev.heap.get_mut(list_id) else {
                unreachable!("receiver checked");
            };
            Ok(items.remove(idx))
        }
        "remove" => {
            let needle = args.expect_one("remove")?;
            let items = match ev.heap.get(list_id) {
                HeapData::List(items) => items.clone(),
                _ => unreachable!("receiver checked"),
            };
            for (idx, item) in items.iter().enumerate() {
                if ev.value_eq(needle, *item)? {
                    if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                        items.remove(idx);
                    }
                    return Ok(Value::None);
                }
            }
            Err(ExcType::value_error("list.remove(x): x not in list"))
        }
        "clear" => {
            args.expect_none("clear")?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                items.clear();
            }
            Ok(Value::None)
        }
        "index" => {
            let (needle, _) = args.expect_one_or_two("index")?;
            let items = match ev.heap.get(list_id) {
                HeapData::List(items) => items.clone(),
                _ => unreachable!("receiver checked"),
            };
            for (idx, item) in items.iter().enumerate() {
                if ev.value_eq(needle, *item)? {
                    return Ok(Value::Int(idx as i64));
                }
            }
            let repr = ev.py_repr(needle)?;
            Err(ExcType::value_error(format!("{repr} is not in list")))
        }
        "count" => {
            let needle = args.expect_one("count")?;
            let items = match ev.heap.get(list_id) {
                HeapData::List(items) => items.clone(),
                _ => unreachable!("receiver checked"),
            };
            let mut n = 0i64;
            for item in items {
                if ev.value_eq(needle, item)? {
                    n += 1;
                }
            }
            Ok(Value::Int(n))
        }
        "sort" => {
            let (pos, kwargs) = args.into_parts();
            if !pos.is_empty() {
                return Err(ExcType::type_error("sort() takes no positional arguments"));
            }
            let mut key = None;
            let mut reverse = false;
            for (name, value) in kwargs {
                match name.as_str() {
                    "key" => key = if value.is_none() { None } else { Some(value) },
                    "reverse" => reverse = ev.truthy(value)?,
                    other => {
                        return Err(ExcType::type_error(format!(
                            "'{other}' is an invalid keyword argument for sort()"
                        )));
                    }
                }
            }
            let items = match ev.heap.get(list_id) {
                HeapData::List(items) => items.clone(),
                _ => unreachable!("receiver checked"),
            };
            let sorted = ev.sort_values(items, key, reverse)?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                *items = sorted;
            }
            Ok(Value::None)
        }
        "reverse" => {
            args.expect_none("reverse")?;
            if let HeapData::List(items) = ev.heap.get_mut(list_id) {
                items.reverse();
            }
            Ok(Value::None)
        }
        "copy" => {
            args.expect_none("copy")?;
            let items = match ev.heap.get(list_id) {
                HeapData::List(items) => items.clone(),
                _ => unreachable!("receiver checked"),
            };
            Ok(ev.heap.alloc_list(items))
        }
        _ => Err(ExcType::attribute_error("list", method)),
    }
}

// --- dict ---

fn receiver_dict(ev: &Evaluator<'_>, receiver: Value) -> RunResult<HeapId> {
    match receiver {
        Value::Ref(id) if matches!(ev.heap.get(id), HeapData::Dict(_)) => Ok(id),
        _ => Err(ExcType::type_error("descriptor requires a 'dict' object")),
    }
}

fn dict_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let dict_id = receiver_dict(ev, receiver)?;
    match method {
        "get" => {
            let (key, default) = args.expect_one_or_two("get")?;
            match ev.dict_get(receiver, key)? {
                Some(value) => Ok(value),
                None => Ok(default.unwrap_or(Value::None)),
            }
        }
        "setdefault" => {
            let (key, default) = args.expect_one_or_two("setdefault")?;
            // Returns the existing value when present; only a miss inserts.
            match ev.dict_get(receiver, key)? {
                Some(value) => Ok(value),
                None => {
                    let default = default.unwrap_or(Value::None);
                    ev.dict_set(receiver, key, default)?;
                    Ok(default)
                }
            }
        }
        "keys" | "values" | "items" => {
            args.expect_none(method)?;
            let HeapData::Dict(dict) = ev.heap.get(dict_id) else {
                unreachable!("receiver checked");
            };
            let (view_type, items) = match method {
                "keys" => (Type::DictKeys, dict.keys()),
                "values" => (Type::DictValues, dict.values()),
                _ => {
                    let pairs: Vec<(Value, Value)> = dict.iter().collect();
                    let tuples: Vec<Value> = pairs
                        .into_iter()
                        .map(|(k, v)| ev.heap.alloc_tuple(vec![k, v]))
                        .collect();
                    (Type::DictItems, tuples)
                }
            };
            Ok(ev.heap.alloc_value(HeapData::DictView { view_type, items }))
        }
        "pop" => {
            let (key, default) = args.expect_one_or_two("pop")?;
            match ev.dict_remove(receiver, key)? {
                Some(value) => Ok(value),
                None => default.ok_or_else(|| ExcType::key_error(key)),
            }
        }
        "popitem" => {
            args.expect_none("popitem")?;
            let popped = match ev.heap.get_mut(dict_id) {
                HeapData::Dict(dict) => dict.pop_last(),
                _ => unreachable!("receiver checked"),
            };
            match popped {
                Some((key, value)) => Ok(ev.heap.alloc_tuple(vec![key, value])),
                None => Err(ExcType::key_error(ev.heap.alloc_str("popitem(): dictionary is empty"))),
            }
        }
        "update" => {
            let other = args.expect_at_most_one("update")?;
            if let Some(other) = other {
                let pairs = ev.dict_pairs(other)?;
                for (key, value) in pairs {
                    ev.dict_set(receiver, key, value)?;
                }
            }
            Ok(Value::None)
        }
        "clear" => {
            args.expect_none("clear")?;
            if let HeapData::Dict(dict) = ev.heap.get_mut(dict_id) {
                dict.clear();
            }
            Ok(Value::None)
        }
        "copy" => {
            args.expect_none("copy")?;
            let pairs = ev.dict_pairs(receiver)?;
            ev.dict_from_pairs(pairs)
        }
        "fromkeys" => {
            let (keys, value) = args.expect_one_or_two("fromkeys")?;
            let value = value.unwrap_or(Value::None);
            let keys = ev.collect_iterable(keys)?;
            let pairs: Vec<(Value, Value)> = keys.into_iter().map(|k| (k, value)).collect();
            ev.dict_from_pairs(pairs)
        }
        _ => Err(ExcType::attribute_error("dict", method)),
    }
}

// --- set ---

fn receiver_set(ev: &Evaluator<'_>, receiver: Value) -> RunResult<HeapId> {
    match receiver {
        Value::Ref(id) if matches!(ev.heap.get(id), HeapData::Set(_) | HeapData::FrozenSet(_)) => Ok(id),
        _ => Err(ExcType::type_error("descriptor requires a 'set' object")),
    }
}

fn set_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let set_id = receiver_set(ev, receiver)?;
    let frozen = matches!(ev.heap.get(set_id), HeapData::FrozenSet(_));
    if frozen && matches!(method, "add" | "remove" | "discard" | "pop" | "clear" | "update") {
        return Err(ExcType::attribute_error("frozenset", method));
    }
    match method {
        "add" => {
            let item = args.expect_one("add")?;
            ev.set_insert(set_id, item)?;
            Ok(Value::None)
        }
        "remove" => {
            let item = args.expect_one("remove")?;
            if ev.set_discard(set_id, item)? {
                Ok(Value::None)
            } else {
                Err(ExcType::key_error(item))
            }
        }
        "discard" => {
            let item = args.expect_one("discard")?;
            ev.set_discard(set_id, item)?;
            Ok(Value::None)
        }
        "pop" => {
            args.expect_none("pop")?;
            let popped = match ev.heap.get_mut(set_id) {
                HeapData::Set(set) => set.pop_first(),
                _ => unreachable!("frozen rejected above"),
            };
            popped.ok_or_else(|| ExcType::key_error(ev.heap.alloc_str("pop from an empty set")))
        }
        "clear" => {
            args.expect_none("clear")?;
            if let HeapData::Set(set) = ev.heap.get_mut(set_id) {
                set.clear();
            }
            Ok(Value::None)
        }
        "union" | "intersection" | "difference" | "symmetric_difference" => {
            let other = args.expect_one(method)?;
            let other_items = ev.collect_iterable(other)?;
            let own: Vec<Value> = match ev.heap.get(set_id) {
                HeapData::Set(set) | HeapData::FrozenSet(set) => set.iter().collect(),
                _ => unreachable!("receiver checked"),
            };
            let result = match method {
                "union" => {
                    let mut all = own;
                    all.extend(other_items);
                    all
                }
                "intersection" => {
                    let mut kept = Vec::new();
                    for item in own {
                        if ev.vec_contains(&other_items, item)? {
                            kept.push(item);
                        }
                    }
                    kept
                }
                "difference" => {
                    let mut kept = Vec::new();
                    for item in own {
                        if !ev.vec_contains(&other_items, item)? {
                            kept.push(item);
                        }
                    }
                    kept
                }
                _ => {
                    let mut kept = Vec::new();
                    for item in &own {
                        if !ev.vec_contains(&other_items, *item)? {
                            kept.push(*item);
                        }
                    }
                    for item in &other_items {
                        if !ev.vec_contains(&own, *item)? {
                            kept.push(*item);
                        }
                    }
                    kept
                }
            };
            ev.set_from_values(result, frozen)
        }
        "issubset" | "issuperset" => {
            let other = args.expect_one(method)?;
            let other_items = ev.collect_iterable(other)?;
            let own: Vec<Value> = match ev.heap.get(set_id) {
                HeapData::Set(set) | HeapData::FrozenSet(set) => set.iter().collect(),
                _ => unreachable!("receiver checked"),
            };
            let (smaller, larger) = if method == "issubset" {
                (own, other_items)
            } else {
                (other_items, own)
            };
            for item in smaller {
                if !ev.vec_contains(&larger, item)? {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        "update" => {
            let other = args.expect_one("update")?;
            let items = ev.collect_iterable(other)?;
            for item in items {
                ev.set_insert(set_id, item)?;
            }
            Ok(Value::None)
        }
        "copy" => {
            args.expect_none("copy")?;
            let items: Vec<Value> = match ev.heap.get(set_id) {
                HeapData::Set(set) | HeapData::FrozenSet(set) => set.iter().collect(),
                _ => unreachable!("receiver checked"),
            };
            ev.set_from_values(items, frozen)
        }
        _ => Err(ExcType::attribute_error("set", method)),
    }
}

// --- tuple ---

fn tuple_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let items = match receiver {
        Value::Ref(id) => match ev.heap.get(id) {
            HeapData::Tuple(items) => items.clone(),
            _ => return Err(ExcType::type_error("descriptor requires a 'tuple' object")),
        },
        _ => return Err(ExcType::type_error("descriptor requires a 'tuple' object")),
    };
    match method {
        "count" => {
            let needle = args.expect_one("count")?;
            let mut n = 0i64;
            for item in items {
                if ev.value_eq(needle, item)? {
                    n += 1;
                }
            }
            Ok(Value::Int(n))
        }
        "index" => {
            let (needle, _) = args.expect_one_or_two("index")?;
            for (idx, item) in items.iter().enumerate() {
                if ev.value_eq(needle, *item)? {
                    return Ok(Value::Int(idx as i64));
                }
            }
            Err(ExcType::value_error("tuple.index(x): x not in tuple"))
        }
        _ => Err(ExcType::attribute_error("tuple", method)),
    }
}

// --- generator ---

fn generator_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let Value::Ref(gen_id) = receiver else {
        return Err(ExcType::type_error("descriptor requires a 'generator' object"));
    };
    match method {
        "__next__" => {
            args.expect_none("__next__")?;
            match ev.generator_next(gen_id)? {
                Some(value) => Ok(value),
                None => Err(ExcType::stop_iteration()),
            }
        }
        // Over an eager buffer a sent value cannot reach a suspended frame;
        // send() advances exactly like __next__ and the value is discarded.
        "send" => {
            let _sent = args.expect_one("send")?;
            match ev.generator_next(gen_id)? {
                Some(value) => Ok(value),
                None => Err(ExcType::stop_iteration()),
            }
        }
        "close" => {
            args.expect_none("close")?;
            ev.generator_close(gen_id)?;
            Ok(Value::None)
        }
        _ => Err(ExcType::attribute_error("generator", method)),
    }
}

// --- property decorators ---

fn property_method(
    ev: &mut Evaluator<'_>,
    receiver: Value,
    method: &'static str,
    args: ArgValues,
) -> RunResult<Value> {
    let Value::Ref(prop_id) = receiver else {
        return Err(ExcType::type_error("descriptor requires a 'property' object"));
    };
    let accessor = args.expect_one(method)?;
    let HeapData::Property(existing) = ev.heap.get(prop_id) else {
        return Err(ExcType::type_error("descriptor requires a 'property' object"));
    };
    let (mut fget, mut fset, mut fdel) = (existing.fget, existing.fset, existing.fdel);
    match method {
        "getter" => fget = Some(accessor),
        "setter" => fset = Some(accessor),
        "deleter" => fdel = Some(accessor),
        _ => return Err(ExcType::attribute_error("property", method)),
    }
    Ok(ev.heap.alloc_value(HeapData::Property(Property { fget, fset, fdel })))
}
