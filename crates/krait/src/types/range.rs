//! `range` and `slice` objects, plus the index-normalization rules shared by
//! every sequence subscript.

use crate::{
    exception_private::{ExcType, RunResult},
    value::Value,
};

/// A `range(start, stop, step)` value. Step is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RangeObject {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeObject {
    pub fn new(start: i64, stop: i64, step: i64) -> RunResult<Self> {
        if step == 0 {
            return Err(ExcType::value_error("range() arg 3 must not be zero"));
        }
        Ok(Self { start, stop, step })
    }

    /// Number of elements the range produces.
    pub fn len(&self) -> i64 {
        if self.step > 0 {
            if self.stop > self.start {
                (self.stop - self.start + self.step - 1) / self.step
            } else {
                0
            }
        } else if self.start > self.stop {
            (self.start - self.stop + (-self.step) - 1) / (-self.step)
        } else {
            0
        }
    }

    /// The element at `index` (already normalized to `0..len`).
    pub fn get(&self, index: i64) -> i64 {
        self.start + index * self.step
    }

    /// Exact membership test without iterating.
    pub fn contains_int(&self, value: i64) -> bool {
        if self.step > 0 {
            value >= self.start && value < self.stop && (value - self.start) % self.step == 0
        } else {
            value <= self.start && value > self.stop && (self.start - value) % (-self.step) == 0
        }
    }
}

/// A `slice` object; bounds are `None` or integer values.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SliceObject {
    pub start: Value,
    pub stop: Value,
    pub step: Value,
}

/// Resolves slice bounds against a sequence length, Python-style: negative
/// indices count from the end, out-of-range bounds clamp, and the returned
/// `(start, stop, step)` is ready for stepped traversal.
pub(crate) fn resolve_slice_indices(
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
    len: i64,
) -> RunResult<(i64, i64, i64)> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(ExcType::value_error("slice step cannot be zero"));
    }

    let (default_start, default_stop) = if step > 0 { (0, len) } else { (len - 1, -1) };

    let clamp = |index: i64, low: i64, high: i64| index.max(low).min(high);
    let normalize = |index: i64| if index < 0 { index + len } else { index };

    let start = match start {
        Some(i) => {
            let i = normalize(i);
            if step > 0 { clamp(i, 0, len) } else { clamp(i, -1, len - 1) }
        }
        None => default_start,
    };
    let stop = match stop {
        Some(i) => {
            let i = normalize(i);
            if step > 0 { clamp(i, 0, len) } else { clamp(i, -1, len - 1) }
        }
        None => default_stop,
    };
    Ok((start, stop, step))
}

/// The index sequence a resolved slice produces over a sequence.
pub(crate) fn slice_index_iter(start: i64, stop: i64, step: i64) -> Vec<usize> {
    let mut indices = Vec::new();
    let mut i = start;
    if step > 0 {
        while i < stop {
            indices.push(i as usize);
            i += step;
        }
    } else {
        while i > stop {
            indices.push(i as usize);
            i += step;
        }
    }
    indices
}

/// Normalizes a sequence index: negative counts from the end; out of range
/// is an `IndexError` with the given type name.
pub(crate) fn normalize_index(index: i64, len: usize, type_name: &str) -> RunResult<usize> {
    let len = len as i64;
    let normalized = if index < 0 { index + len } else { index };
    if normalized < 0 || normalized >= len {
        return Err(ExcType::index_error(format!("{type_name} index out of range")));
    }
    Ok(normalized as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_len_positive_and_negative_step() {
        assert_eq!(RangeObject::new(0, 5, 1).unwrap().len(), 5);
        assert_eq!(RangeObject::new(0, 5, 2).unwrap().len(), 3);
        assert_eq!(RangeObject::new(5, 0, -1).unwrap().len(), 5);
        assert_eq!(RangeObject::new(0, 5, -1).unwrap().len(), 0);
    }

    #[test]
    fn range_membership() {
        let r = RangeObject::new(0, 10, 3).unwrap();
        assert!(r.contains_int(0));
        assert!(r.contains_int(9));
        assert!(!r.contains_int(10));
        assert!(!r.contains_int(2));
        let r = RangeObject::new(10, 0, -2).unwrap();
        assert!(r.contains_int(10));
        assert!(r.contains_int(2));
        assert!(!r.contains_int(0));
    }

    #[test]
    fn slice_resolution_clamps_and_wraps() {
        // s[-2:] on a 5-element sequence
        let (start, stop, step) = resolve_slice_indices(Some(-2), None, None, 5).unwrap();
        assert_eq!(slice_index_iter(start, stop, step), vec![3, 4]);
        // s[::-1]
        let (start, stop, step) = resolve_slice_indices(None, None, Some(-1), 3).unwrap();
        assert_eq!(slice_index_iter(start, stop, step), vec![2, 1, 0]);
        // s[10:20] clamps to empty
        let (start, stop, step) = resolve_slice_indices(Some(10), Some(20), None, 3).unwrap();
        assert!(slice_index_iter(start, stop, step).is_empty());
    }

    #[test]
    fn zero_step_is_a_value_error() {
        assert!(resolve_slice_indices(None, None, Some(0), 5).is_err());
    }
}
