//! Sequence helpers shared by `list` and `tuple`.

use crate::{
    exception_private::{ExcType, RunResult},
    value::Value,
};

/// `seq * n`: Python repeats, with non-positive counts producing empty.
pub(crate) fn repeat_items(items: &[Value], count: i64) -> Vec<Value> {
    if count <= 0 {
        return Vec::new();
    }
    let count = count as usize;
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend_from_slice(items);
    }
    out
}

/// Validates the arity of a fixed-size unpacking (`a, b = seq`).
pub(crate) fn check_unpack_arity(expected: usize, actual: usize) -> RunResult<()> {
    if actual < expected {
        return Err(ExcType::value_error(format!(
            "not enough values to unpack (expected {expected}, got {actual})"
        )));
    }
    if actual > expected {
        return Err(ExcType::value_error(format!(
            "too many values to unpack (expected {expected})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeat_handles_non_positive_counts() {
        let items = [Value::Int(1), Value::Int(2)];
        assert_eq!(repeat_items(&items, 2).len(), 4);
        assert!(repeat_items(&items, 0).is_empty());
        assert!(repeat_items(&items, -3).is_empty());
    }

    #[test]
    fn unpack_arity_messages() {
        assert!(check_unpack_arity(2, 2).is_ok());
        assert!(check_unpack_arity(3, 2).is_err());
        assert!(check_unpack_arity(1, 2).is_err());
    }
}
