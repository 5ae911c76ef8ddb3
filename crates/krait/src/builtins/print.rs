//! The `print` builtin.

use crate::{
    args::ArgValues,
    eval::Evaluator,
    exception_private::{ExcType, RunResult},
    heap::HeapData,
    value::Value,
};

/// `print(*values, sep=' ', end='\n')`: space-joined `str()` conversions
/// followed by a newline, through the evaluator's `PrintWriter`.
pub(super) fn call(ev: &mut Evaluator<'_>, args: ArgValues) -> RunResult<Value> {
    let (pos, kwargs) = args.into_parts();
    let mut sep = " ".to_string();
    let mut end = "\n".to_string();
    for (name, value) in kwargs {
        let text = match value {
            Value::None => continue,
            Value::Ref(id) => match ev.heap.get(id) {
                HeapData::Str(s) => s.clone(),
                _ => {
                    return Err(ExcType::type_error(format!(
                        "{name} must be None or a string, not {}",
                        value.type_name(ev.heap)
                    )));
                }
            },
            _ => {
                return Err(ExcType::type_error(format!(
                    "{name} must be None or a string, not {}",
                    value.type_name(ev.heap)
                )));
            }
        };
        match name.as_str() {
            "sep" => sep = text,
            "end" => end = text,
            other => {
                return Err(ExcType::type_error(format!(
                    "'{other}' is an invalid keyword argument for print()"
                )));
            }
        }
    }

    for (i, value) in pos.iter().enumerate() {
        if i > 0 {
            for c in sep.chars() {
                ev.print.write_char(c);
            }
        }
        let text = ev.py_str(*value)?;
        ev.print.write_str(&text);
    }
    for c in end.chars() {
        ev.print.write_char(c);
    }
    Ok(Value::None)
}
