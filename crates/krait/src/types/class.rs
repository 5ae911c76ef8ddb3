//! User classes and instances.
//!
//! `ClassObject` is created by executing a `class` statement; `Instance` by
//! calling the class. Attribute access walks the MRO computed here by C3
//! linearization. Classes may inherit from builtin exception types, which is
//! tracked separately (`exc_base`) so `except` matching can cross from user
//! classes into the builtin hierarchy.

use indexmap::IndexMap;

use crate::{
    exception_private::{ExcType, RunResult},
    heap::{Heap, HeapData, HeapId},
    value::Value,
};

/// A user-defined class.
#[derive(Debug)]
pub(crate) struct ClassObject {
    pub name: String,
    /// Direct user-class bases, in declaration order.
    pub bases: Vec<HeapId>,
    /// Nearest builtin exception ancestor, if this class is (transitively)
    /// an exception class.
    pub exc_base: Option<ExcType>,
    /// Method resolution order over user classes; `mro[0]` is this class.
    pub mro: Vec<HeapId>,
    /// Class namespace: attributes and methods, in definition order.
    pub namespace: IndexMap<String, Value>,
}

impl ClassObject {
    /// Checks whether this class (at `self_id`) is `other_id` or inherits
    /// from it.
    pub fn is_subclass_of(&self, self_id: HeapId, other_id: HeapId) -> bool {
        self_id == other_id || self.mro.contains(&other_id)
    }
}

/// An instance of a user-defined class.
#[derive(Debug)]
pub(crate) struct Instance {
    pub class_id: HeapId,
    /// Instance attribute map, in assignment order.
    pub attrs: IndexMap<String, Value>,
}

impl Instance {
    pub fn new(class_id: HeapId) -> Self {
        Self {
            class_id,
            attrs: IndexMap::new(),
        }
    }
}

/// A method fetched through an instance: `(function, receiver)` plus the
/// class the resolved function was found on, which is what makes chained
/// `super()` calls walk the MRO correctly.
#[derive(Debug)]
pub(crate) struct BoundMethod {
    pub func: Value,
    pub receiver: Value,
    pub defining_class: Option<HeapId>,
}

/// The object returned by `super()`: lookups search the instance's class MRO
/// starting *after* the pivot class.
#[derive(Debug)]
pub(crate) struct SuperProxy {
    pub pivot: HeapId,
    pub instance: Value,
}

/// A `property` descriptor.
#[derive(Debug)]
pub(crate) struct Property {
    pub fget: Option<Value>,
    pub fset: Option<Value>,
    pub fdel: Option<Value>,
}

/// Looks up `name` on the class at `class_id`, walking the MRO.
///
/// Returns the found value and the `HeapId` of the class it was found on.
pub(crate) fn mro_lookup(heap: &Heap, class_id: HeapId, name: &str) -> Option<(Value, HeapId)> {
    let HeapData::ClassObject(cls) = heap.get(class_id) else {
        return None;
    };
    if let Some(value) = cls.namespace.get(name) {
        return Some((*value, class_id));
    }
    for &base_id in &cls.mro[1..] {
        if let HeapData::ClassObject(base) = heap.get(base_id)
            && let Some(value) = base.namespace.get(name)
        {
            return Some((*value, base_id));
        }
    }
    None
}

/// Like [`mro_lookup`], but starts *after* `pivot` in the MRO of the class at
/// `class_id`. This is the `super()` search.
pub(crate) fn mro_lookup_after(
    heap: &Heap,
    class_id: HeapId,
    pivot: HeapId,
    name: &str,
) -> Option<(Value, HeapId)> {
    let HeapData::ClassObject(cls) = heap.get(class_id) else {
        return None;
    };
    let start = cls.mro.iter().position(|&id| id == pivot)? + 1;
    for &base_id in &cls.mro[start..] {
        if let HeapData::ClassObject(base) = heap.get(base_id)
            && let Some(value) = base.namespace.get(name)
        {
            return Some((*value, base_id));
        }
    }
    None
}

/// The nearest builtin exception ancestor of the class at `class_id`.
pub(crate) fn class_exc_base(heap: &Heap, class_id: HeapId) -> Option<ExcType> {
    match heap.get(class_id) {
        HeapData::ClassObject(cls) => cls.exc_base,
        _ => None,
    }
}

/// C3 linearization: `MRO(C) = [C] ++ merge(MRO(B1), …, MRO(Bn), [B1…Bn])`.
///
/// `merge` repeatedly picks a head that does not appear in the tail of any
/// remaining list; when no such head exists the inheritance graph is
/// inconsistent and class creation fails.
pub(crate) fn compute_c3_mro(self_id: HeapId, bases: &[HeapId], heap: &Heap) -> RunResult<Vec<HeapId>> {
    if bases.is_empty() {
        return Ok(vec![self_id]);
    }
    if bases.contains(&self_id) {
        return Err(ExcType::type_error("a class cannot inherit from itself"));
    }

    let mut sequences: Vec<Vec<HeapId>> = Vec::with_capacity(bases.len() + 1);
    for &base_id in bases {
        match heap.get(base_id) {
            HeapData::ClassObject(cls) => sequences.push(cls.mro.clone()),
            _ => return Err(ExcType::type_error("bases must be classes")),
        }
    }
    sequences.push(bases.to_vec());

    let mut result = vec![self_id];
    loop {
        sequences.retain(|s| !s.is_empty());
        if sequences.is_empty() {
            break;
        }

        // A good head never appears in the tail of any remaining sequence.
        let mut found = None;
        for seq in &sequences {
            let candidate = seq[0];
            let in_tail = sequences.iter().any(|other| other[1..].contains(&candidate));
            if !in_tail {
                found = Some(candidate);
                break;
            }
        }

        match found {
            Some(next) => {
                result.push(next);
                for seq in &mut sequences {
                    if seq.first() == Some(&next) {
                        seq.remove(0);
                    }
                }
            }
            None => {
                return Err(ExcType::type_error(
                    "Cannot create a consistent method resolution order (MRO)",
                ));
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_class(heap: &mut Heap, name: &str, bases: Vec<HeapId>) -> HeapId {
        let id = heap.allocate(HeapData::ClassObject(ClassObject {
            name: name.to_string(),
            bases: bases.clone(),
            exc_base: None,
            mro: Vec::new(),
            namespace: IndexMap::new(),
        }));
        let mro = compute_c3_mro(id, &bases, heap).unwrap();
        let HeapData::ClassObject(cls) = heap.get_mut(id) else {
            unreachable!();
        };
        cls.mro = mro;
        id
    }

    fn names(heap: &Heap, mro: &[HeapId]) -> Vec<String> {
        mro.iter()
            .map(|&id| match heap.get(id) {
                HeapData::ClassObject(c) => c.name.clone(),
                _ => unreachable!(),
            })
            .collect()
    }

    #[test]
    fn diamond_linearizes() {
        // class A; class B(A); class C(A); class D(B, C) -> [D, B, C, A]
        let mut heap = Heap::new();
        let a = make_class(&mut heap, "A", vec![]);
        let b = make_class(&mut heap, "B", vec![a]);
        let c = make_class(&mut heap, "C", vec![a]);
        let d = make_class(&mut heap, "D", vec![b, c]);
        let HeapData::ClassObject(cls) = heap.get(d) else {
            unreachable!();
        };
        assert_eq!(names(&heap, &cls.mro), vec!["D", "B", "C", "A"]);
    }

    #[test]
    fn mro_contains_each_ancestor_once() {
        let mut heap = Heap::new();
        let a = make_class(&mut heap, "A", vec![]);
        let b = make_class(&mut heap, "B", vec![a]);
        let c = make_class(&mut heap, "C", vec![b, a]);
        let HeapData::ClassObject(cls) = heap.get(c) else {
            unreachable!();
        };
        let mro = cls.mro.clone();
        for id in &mro {
            assert_eq!(mro.iter().filter(|x| *x == id).count(), 1);
        }
        assert_eq!(names(&heap, &mro), vec!["C", "B", "A"]);
    }

    #[test]
    fn inconsistent_hierarchy_fails() {
        // class A; class B(A); class C(A, B) has no consistent MRO.
        let mut heap = Heap::new();
        let a = make_class(&mut heap, "A", vec![]);
        let b = make_class(&mut heap, "B", vec![a]);
        let c = heap.allocate(HeapData::ClassObject(ClassObject {
            name: "C".to_string(),
            bases: vec![a, b],
            exc_base: None,
            mro: Vec::new(),
            namespace: IndexMap::new(),
        }));
        let err = compute_c3_mro(c, &[a, b], &heap).unwrap_err();
        let crate::exception_private::ExcPayload::Simple(exc) = &err.payload else {
            panic!("expected simple exception");
        };
        assert_eq!(exc.exc_type, ExcType::TypeError);
        assert!(exc.message.as_deref().unwrap().contains("method resolution order"));
    }
}
