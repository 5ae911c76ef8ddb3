//! Set storage, shared by `set` and `frozenset`.
//!
//! Same design as the dict: tombstoned insertion-ordered entries plus a
//! hash-bucket index; equality confirmation happens in the evaluator.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::value::Value;

pub(crate) type SetEntryIdx = u32;

#[derive(Debug, Default)]
pub(crate) struct Set {
    entries: Vec<Option<(u64, Value)>>,
    index: AHashMap<u64, SmallVec<[SetEntryIdx; 1]>>,
    len: usize,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn candidates(&self, hash: u64) -> SmallVec<[SetEntryIdx; 1]> {
        self.index.get(&hash).cloned().unwrap_or_default()
    }

    pub fn entry_value(&self, idx: SetEntryIdx) -> Value {
        self.entries[idx as usize].expect("live entry").1
    }

    pub fn insert_new(&mut self, hash: u64, value: Value) {
        let idx = SetEntryIdx::try_from(self.entries.len()).expect("set too large");
        self.entries.push(Some((hash, value)));
        self.index.entry(hash).or_default().push(idx);
        self.len += 1;
    }

    pub fn remove_entry(&mut self, idx: SetEntryIdx) -> Value {
        let (hash, value) = self.entries[idx as usize].take().expect("live entry");
        if let Some(bucket) = self.index.get_mut(&hash) {
            bucket.retain(|i| *i != idx);
            if bucket.is_empty() {
                self.index.remove(&hash);
            }
        }
        self.len -= 1;
        value
    }

    /// Removes and returns the first live entry (set.pop's "arbitrary"
    /// element is the oldest one here, deterministically).
    pub fn pop_first(&mut self) -> Option<Value> {
        let idx = self
            .entries
            .iter()
            .position(Option::is_some)
            .map(|i| SetEntryIdx::try_from(i).expect("index fits"))?;
        Some(self.remove_entry(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.len = 0;
    }

    /// Live elements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        self.entries.iter().flatten().map(|&(_, v)| v)
    }

    pub fn iter_with_hash(&self) -> impl Iterator<Item = (u64, Value)> + '_ {
        self.entries.iter().flatten().copied()
    }

    /// All element hashes; used for the order-insensitive frozenset hash.
    pub fn hashes(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().flatten().map(|&(h, _)| h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iteration_is_insertion_ordered() {
        let mut s = Set::new();
        s.insert_new(3, Value::Int(3));
        s.insert_new(1, Value::Int(1));
        s.insert_new(2, Value::Int(2));
        let items: Vec<Value> = s.iter().collect();
        assert_eq!(items, vec![Value::Int(3), Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn pop_first_is_fifo() {
        let mut s = Set::new();
        s.insert_new(9, Value::Int(9));
        s.insert_new(4, Value::Int(4));
        assert_eq!(s.pop_first(), Some(Value::Int(9)));
        assert_eq!(s.len(), 1);
    }
}
