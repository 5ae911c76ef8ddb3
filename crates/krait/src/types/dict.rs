//! Insertion-ordered dict storage.
//!
//! Entries live in an append-only vector (tombstoned on deletion, so
//! insertion order survives arbitrary churn) with a hash-bucket side index
//! for O(1) average probing. Key *equality* is not decided here: two keys
//! with equal hashes are candidates, and the evaluator confirms equality
//! through the full protocol (which may call a user `__eq__`). The methods
//! here therefore deal in candidate indices, not keys.

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::value::Value;

/// Index of one entry in a [`Dict`] (stable across deletions).
pub(crate) type EntryIdx = u32;

#[derive(Debug, Default)]
pub(crate) struct Dict {
    entries: Vec<Option<(u64, Value, Value)>>,
    index: AHashMap<u64, SmallVec<[EntryIdx; 1]>>,
    len: usize,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entry indices whose stored hash equals `hash`; equality confirmation
    /// is the caller's job.
    pub fn candidates(&self, hash: u64) -> SmallVec<[EntryIdx; 1]> {
        self.index.get(&hash).cloned().unwrap_or_default()
    }

    pub fn entry_key(&self, idx: EntryIdx) -> Value {
        self.entries[idx as usize].expect("live entry").1
    }

    pub fn entry_value(&self, idx: EntryIdx) -> Value {
        self.entries[idx as usize].expect("live entry").2
    }

    pub fn set_entry_value(&mut self, idx: EntryIdx, value: Value) {
        self.entries[idx as usize].as_mut().expect("live entry").2 = value;
    }

    /// Appends a new entry. The caller must have established that no live
    /// entry has an equal key.
    pub fn insert_new(&mut self, hash: u64, key: Value, value: Value) {
        let idx = EntryIdx::try_from(self.entries.len()).expect("dict too large");
        self.entries.push(Some((hash, key, value)));
        self.index.entry(hash).or_default().push(idx);
        self.len += 1;
    }

    /// Tombstones an entry, returning its `(key, value)` pair.
    pub fn remove_entry(&mut self, idx: EntryIdx) -> (Value, Value) {
        let (hash, key, value) = self.entries[idx as usize].take().expect("live entry");
        if let Some(bucket) = self.index.get_mut(&hash) {
            bucket.retain(|i| *i != idx);
            if bucket.is_empty() {
                self.index.remove(&hash);
            }
        }
        self.len -= 1;
        (key, value)
    }

    /// Removes and returns the most recently inserted live entry.
    pub fn pop_last(&mut self) -> Option<(Value, Value)> {
        let idx = self
            .entries
            .iter()
            .rposition(Option::is_some)
            .map(|i| EntryIdx::try_from(i).expect("index fits"))?;
        Some(self.remove_entry(idx))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.len = 0;
    }

    /// Live `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Value, Value)> + '_ {
        self.entries.iter().flatten().map(|&(_, k, v)| (k, v))
    }

    /// Live `(hash, key, value)` triples in insertion order. Used when
    /// copying into another dict, where re-hashing would be wasteful.
    pub fn iter_with_hash(&self) -> impl Iterator<Item = (u64, Value, Value)> + '_ {
        self.entries.iter().flatten().copied()
    }

    pub fn keys(&self) -> Vec<Value> {
        self.iter().map(|(k, _)| k).collect()
    }

    pub fn values(&self) -> Vec<Value> {
        self.iter().map(|(_, v)| v).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_order_survives_removal() {
        let mut d = Dict::new();
        d.insert_new(1, Value::Int(1), Value::Int(10));
        d.insert_new(2, Value::Int(2), Value::Int(20));
        d.insert_new(3, Value::Int(3), Value::Int(30));
        let idx = d.candidates(2)[0];
        d.remove_entry(idx);
        let keys: Vec<Value> = d.keys();
        assert_eq!(keys, vec![Value::Int(1), Value::Int(3)]);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn colliding_hashes_share_a_bucket() {
        let mut d = Dict::new();
        d.insert_new(7, Value::Int(1), Value::Int(10));
        d.insert_new(7, Value::Int(2), Value::Int(20));
        assert_eq!(d.candidates(7).len(), 2);
    }

    #[test]
    fn pop_last_is_lifo_over_live_entries() {
        let mut d = Dict::new();
        d.insert_new(1, Value::Int(1), Value::Int(10));
        d.insert_new(2, Value::Int(2), Value::Int(20));
        let (k, v) = d.pop_last().unwrap();
        assert_eq!((k, v), (Value::Int(2), Value::Int(20)));
        assert_eq!(d.len(), 1);
    }
}
