//! `min` and `max` (shared implementation).

use crate::{
    args::ArgValues,
    eval::Evaluator,
    exception_private::{ExcType, RunResult},
    value::Value,
};

/// `min(iterable, *[, key, default])` / `min(a, b, *rest[, key])`, and the
/// `max` duals.
pub(super) fn call(ev: &mut Evaluator<'_>, args: ArgValues, is_max: bool) -> RunResult<Value> {
    let name = if is_max { "max" } else { "min" };
    let (pos, kwargs) = args.into_parts();
    let mut key = None;
    let mut default = None;
    for (kw_name, value) in kwargs {
        match kw_name.as_str() {
            "key" => key = if value.is_none() { None } else { Some(value) },
            "default" => default = Some(value),
            other => {
                return Err(ExcType::type_error(format!(
                    "'{other}' is an invalid keyword argument for {name}()"
                )));
            }
        }
    }

    let candidates = match pos.len() {
        0 => {
            return Err(ExcType::type_error(format!(
                "{name} expected at least 1 argument, got 0"
            )));
        }
        1 => ev.collect_iterable(pos[0])?,
        _ => {
            if default.is_some() {
                return Err(ExcType::type_error(format!(
                    "Cannot specify a default for {name}() with multiple positional arguments"
                )));
            }
            pos
        }
    };

    if candidates.is_empty() {
        return match default {
            Some(value) => Ok(value),
            None => Err(ExcType::value_error(format!("{name}() arg is an empty sequence"))),
        };
    }

    let mut best = candidates[0];
    let mut best_key = match key {
        Some(key_fn) => ev.call_value(key_fn, ArgValues::One(best))?,
        None => best,
    };
    for &candidate in &candidates[1..] {
        let candidate_key = match key {
            Some(key_fn) => ev.call_value(key_fn, ArgValues::One(candidate))?,
            None => candidate,
        };
        // For ties the first value wins, so strict comparison only.
        let replace = if is_max {
            ev.value_lt(best_key, candidate_key)?
        } else {
            ev.value_lt(candidate_key, best_key)?
        };
        if replace {
            best = candidate;
            best_key = candidate_key;
        }
    }
    Ok(best)
}
