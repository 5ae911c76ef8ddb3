//! The `sorted` builtin.

use crate::{
    args::ArgValues,
    eval::Evaluator,
    exception_private::{ExcType, RunResult},
    value::Value,
};

/// `sorted(iterable, *, key=None, reverse=False)` — always a new list,
/// stable, comparing through the full `<` protocol.
pub(super) fn call(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, kwargs) = args.into_parts();
    let [iterable] = pos.as_slice() else {
        return Err(ExcType::type_error(format!(
            "sorted expected 1 argument, got {}",
            pos.len()
        )));
    };
    let mut key = None;
    let mut reverse = false;
    for (name, value) in kwargs {
        match name.as_str() {
            "key" => key = if value.is_none() { None } else { Some(value) },
            "reverse" => reverse = ev.truthy(value)?,
            other => {
                return Err(ExcType::type_error(format!(
                    "'{other}' is an invalid keyword argument for sorted()"
                )));
            }
        }
    }
    let items = ev.collect_iterable(*iterable)?;
    let sorted = ev.sort_values(items, key, reverse)?;
    Ok(ev.heap.alloc_list(sorted))
}
