//! Argument binding: call-site values against a function's parameter spec.
//!
//! The algorithm, in order:
//! 1. positional arguments fill positional-or-keyword parameters left to
//!    right; the surplus goes to `*args` (or is a `TypeError`);
//! 2. keyword arguments match positional-or-keyword and keyword-only names;
//!    leftovers go to `**kwargs` (or are a `TypeError`);
//! 3. defaults fill any slot still empty;
//! 4. anything still missing is a `TypeError` naming the parameter.

use crate::{
    args::ArgValues,
    ast::Params,
    exception_private::{ExcType, RunResult},
    heap::{Heap, HeapData},
    py_hash::hash_str,
    types::Dict,
    value::Value,
};

/// One bound parameter, ready to be inserted into the call scope.
pub(crate) type Binding = (String, Value);

/// Binds `args` to `params`, producing name/value pairs in declaration
/// order. `defaults` is tail-aligned with `params.args`; `kw_defaults` is
/// index-aligned with `params.kwonly`.
pub(crate) fn bind_arguments(
    params: &Params,
    defaults: &[Value],
    kw_defaults: &[Option<Value>],
    args: ArgValues,
    func_name: &str,
    heap: &mut Heap,
) -> RunResult<Vec<Binding>> {
    let (pos, kw) = args.into_parts();
    let n_params = params.args.len();

    let mut slots: Vec<Option<Value>> = vec![None; n_params];
    let mut kwonly_slots: Vec<Option<Value>> = vec![None; params.kwonly.len()];

    // 1. Positional arguments, left to right.
    let mut pos_iter = pos.into_iter();
    for slot in &mut slots {
        match pos_iter.next() {
            Some(value) => *slot = Some(value),
            None => break,
        }
    }
    let surplus: Vec<Value> = pos_iter.collect();
    let vararg_value = if params.vararg.is_some() {
        Some(heap.alloc_tuple(surplus))
    } else if surplus.is_empty() {
        None
    } else {
        let given = n_params + surplus.len();
        return Err(ExcType::type_error(format!(
            "{func_name}() takes {n_params} positional argument{} but {given} were given",
            if n_params == 1 { "" } else { "s" },
        )));
    };

    // 2. Keyword arguments.
    let mut extra_kwargs: Vec<(String, Value)> = Vec::new();
    for (name, value) in kw {
        if let Some(idx) = params.args.iter().position(|p| p.name == name) {
            if slots[idx].is_some() {
                return Err(ExcType::type_error(format!(
                    "{func_name}() got multiple values for argument '{name}'"
                )));
            }
            slots[idx] = Some(value);
        } else if let Some(idx) = params.kwonly.iter().position(|p| p.name == name) {
            if kwonly_slots[idx].is_some() {
                return Err(ExcType::type_error(format!(
                    "{func_name}() got multiple values for argument '{name}'"
                )));
            }
            kwonly_slots[idx] = Some(value);
        } else if params.kwarg.is_some() {
            extra_kwargs.push((name, value));
        } else {
            return Err(ExcType::type_error(format!(
                "{func_name}() got an unexpected keyword argument '{name}'"
            )));
        }
    }

    // 3. Defaults for unfilled slots.
    let first_default = n_params - defaults.len();
    let mut missing: Vec<&str> = Vec::new();
    for (idx, slot) in slots.iter_mut().enumerate() {
        if slot.is_none() {
            if idx >= first_default {
                *slot = Some(defaults[idx - first_default]);
            } else {
                missing.push(&params.args[idx].name);
            }
        }
    }
    if !missing.is_empty() {
        let names = missing
            .iter()
            .map(|n| format!("'{n}'"))
            .collect::<Vec<_>>()
            .join(" and ");
        return Err(ExcType::type_error(format!(
            "{func_name}() missing {} required positional argument{}: {names}",
            missing.len(),
            if missing.len() == 1 { "" } else { "s" },
        )));
    }

    let mut missing_kw: Vec<&str> = Vec::new();
    for (idx, slot) in kwonly_slots.iter_mut().enumerate() {
        if slot.is_none() {
            match kw_defaults.get(idx).copied().flatten() {
                Some(default) => *slot = Some(default),
                None => missing_kw.push(&params.kwonly[idx].name),
            }
        }
    }
    if !missing_kw.is_empty() {
        let names = missing_kw
            .iter()
            .map(|n| format!("'{n}'"))
            .collect::<Vec<_>>()
            .join(" and ");
        return Err(ExcType::type_error(format!(
            "{func_name}() missing {} required keyword-only argument{}: {names}",
            missing_kw.len(),
            if missing_kw.len() == 1 { "" } else { "s" },
        )));
    }

    // 4. Assemble in declaration order.
    let mut bindings = Vec::with_capacity(n_params + 2 + params.kwonly.len());
    for (param, slot) in params.args.iter().zip(slots) {
        bindings.push((param.name.clone(), slot.expect("filled or reported missing")));
    }
    if let Some(vararg) = &params.vararg {
        bindings.push((
            vararg.clone(),
            vararg_value.expect("allocated when vararg present"),
        ));
    }
    for (param, slot) in params.kwonly.iter().zip(kwonly_slots) {
        bindings.push((param.name.clone(), slot.expect("filled or reported missing")));
    }
    if let Some(kwarg) = &params.kwarg {
        let mut dict = Dict::new();
        for (name, value) in extra_kwargs {
            let hash = hash_str(&name);
            let key = heap.alloc_str(name);
            dict.insert_new(hash, key, value);
        }
        let dict_value = heap.alloc_value(HeapData::Dict(dict));
        bindings.push((kwarg.clone(), dict_value));
    }
    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Param;
    use crate::exception_private::ExcPayload;

    fn params(names: &[&str], vararg: Option<&str>, kwonly: &[&str], kwarg: Option<&str>) -> Params {
        Params {
            args: names
                .iter()
                .map(|n| Param {
                    name: (*n).to_string(),
                    default: None,
                    annotation: None,
                })
                .collect(),
            vararg: vararg.map(str::to_string),
            kwonly: kwonly
                .iter()
                .map(|n| Param {
                    name: (*n).to_string(),
                    default: None,
                    annotation: None,
                })
                .collect(),
            kwarg: kwarg.map(str::to_string),
        }
    }

    fn message(err: crate::exception_private::RunError) -> String {
        match err.payload {
            ExcPayload::Simple(exc) => exc.message.unwrap_or_default(),
            ExcPayload::Object(_) => panic!("expected simple exception"),
        }
    }

    #[test]
    fn positional_fill_and_defaults() {
        let mut heap = Heap::new();
        let p = params(&["a", "b", "c"], None, &[], None);
        let bound = bind_arguments(
            &p,
            &[Value::Int(9)],
            &[],
            ArgValues::Two(Value::Int(1), Value::Int(2)),
            "f",
            &mut heap,
        )
        .unwrap();
        assert_eq!(bound[0], ("a".to_string(), Value::Int(1)));
        assert_eq!(bound[1], ("b".to_string(), Value::Int(2)));
        assert_eq!(bound[2], ("c".to_string(), Value::Int(9)));
    }

    #[test]
    fn surplus_goes_to_vararg() {
        let mut heap = Heap::new();
        let p = params(&["a"], Some("rest"), &[], None);
        let bound = bind_arguments(
            &p,
            &[],
            &[],
            ArgValues::Many {
                args: vec![Value::Int(1), Value::Int(2), Value::Int(3)],
                kwargs: vec![],
            },
            "f",
            &mut heap,
        )
        .unwrap();
        let Value::Ref(id) = bound[1].1 else {
            panic!("expected tuple");
        };
        let HeapData::Tuple(items) = heap.get(id) else {
            panic!("expected tuple");
        };
        assert_eq!(items, &vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn too_many_positionals_without_vararg() {
        let mut heap = Heap::new();
        let p = params(&["a"], None, &[], None);
        let err = bind_arguments(
            &p,
            &[],
            &[],
            ArgValues::Two(Value::Int(1), Value::Int(2)),
            "f",
            &mut heap,
        )
        .unwrap_err();
        assert!(message(err).contains("takes 1 positional argument but 2 were given"));
    }

    #[test]
    fn unknown_keyword_without_kwarg() {
        let mut heap = Heap::new();
        let p = params(&["a"], None, &[], None);
        let err = bind_arguments(
            &p,
            &[],
            &[],
            ArgValues::Many {
                args: vec![Value::Int(1)],
                kwargs: vec![("zzz".to_string(), Value::Int(2))],
            },
            "f",
            &mut heap,
        )
        .unwrap_err();
        assert!(message(err).contains("unexpected keyword argument 'zzz'"));
    }

    #[test]
    fn duplicate_argument_value() {
        let mut heap = Heap::new();
        let p = params(&["a"], None, &[], None);
        let err = bind_arguments(
            &p,
            &[],
            &[],
            ArgValues::Many {
                args: vec![Value::Int(1)],
                kwargs: vec![("a".to_string(), Value::Int(2))],
            },
            "f",
            &mut heap,
        )
        .unwrap_err();
        assert!(message(err).contains("multiple values for argument 'a'"));
    }

    #[test]
    fn missing_required_is_named() {
        let mut heap = Heap::new();
        let p = params(&["a", "b"], None, &[], None);
        let err = bind_arguments(&p, &[], &[], ArgValues::Empty, "f", &mut heap).unwrap_err();
        assert!(message(err).contains("missing 2 required positional arguments: 'a' and 'b'"));
    }

    #[test]
    fn keyword_only_requires_keyword() {
        let mut heap = Heap::new();
        let p = params(&[], Some("rest"), &["k"], None);
        // Positionals flow into *rest, never into k.
        let err = bind_arguments(&p, &[], &[None], ArgValues::One(Value::Int(5)), "f", &mut heap)
            .unwrap_err();
        assert!(message(err).contains("keyword-only argument"));
        let bound = bind_arguments(
            &p,
            &[],
            &[None],
            ArgValues::Many {
                args: vec![],
                kwargs: vec![("k".to_string(), Value::Int(5))],
            },
            "f",
            &mut heap,
        )
        .unwrap();
        assert_eq!(bound[1], ("k".to_string(), Value::Int(5)));
    }

    #[test]
    fn leftover_keywords_collect_into_kwarg_dict() {
        let mut heap = Heap::new();
        let p = params(&["a"], None, &[], Some("kw"));
        let bound = bind_arguments(
            &p,
            &[],
            &[],
            ArgValues::Many {
                args: vec![Value::Int(1)],
                kwargs: vec![("x".to_string(), Value::Int(2)), ("y".to_string(), Value::Int(3))],
            },
            "f",
            &mut heap,
        )
        .unwrap();
        let Value::Ref(id) = bound[1].1 else {
            panic!("expected dict");
        };
        let HeapData::Dict(dict) = heap.get(id) else {
            panic!("expected dict");
        };
        assert_eq!(dict.len(), 2);
    }
}
