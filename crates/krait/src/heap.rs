//! The object arena.
//!
//! All compound runtime objects live in a single `Heap` and are addressed by
//! `HeapId` handles, which keeps `Value` small and `Copy` and cuts the
//! ownership cycles in the runtime type graph (instance → class → MRO →
//! bases). Slots are never freed during a run: values are reclaimed when the
//! owning interpreter is dropped, so cyclic references cannot dangle — they
//! simply live until the arena goes away.

use num_bigint::BigInt;

use crate::{
    exception_private::SimpleException,
    types::{
        BoundMethod, ClassObject, Coroutine, Dict, FunctionObject, Generator, Instance, KraitIter,
        Property, RangeObject, Set, SliceObject, SuperProxy, Type,
    },
    value::Value,
};

/// Index of an object in the heap arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct HeapId(u32);

impl HeapId {
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The raw handle value, used by `id()` and identity-based hashing.
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// One heap-allocated object.
#[derive(Debug)]
pub(crate) enum HeapData {
    Str(String),
    Bytes(Vec<u8>),
    /// Integer outside the i64 fast path.
    LongInt(BigInt),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Dict),
    Set(Set),
    FrozenSet(Set),
    Range(RangeObject),
    Slice(SliceObject),
    Function(FunctionObject),
    BoundMethod(BoundMethod),
    Property(Property),
    /// `classmethod(f)` wrapper around the underlying callable.
    ClassMethod(Value),
    /// `staticmethod(f)` wrapper around the underlying callable.
    StaticMethod(Value),
    ClassObject(ClassObject),
    Instance(Instance),
    Super(SuperProxy),
    /// A builtin exception instance.
    Exception(SimpleException),
    Iter(KraitIter),
    /// A dict view (`keys()`/`values()`/`items()`): a snapshot plus the view
    /// type tag for repr.
    DictView { view_type: Type, items: Vec<Value> },
    Generator(Generator),
    Coroutine(Coroutine),
}

impl HeapData {
    /// The type tag for this object.
    pub fn py_type(&self) -> Type {
        match self {
            Self::Str(_) => Type::Str,
            Self::Bytes(_) => Type::Bytes,
            Self::LongInt(_) => Type::Int,
            Self::List(_) => Type::List,
            Self::Tuple(_) => Type::Tuple,
            Self::Dict(_) => Type::Dict,
            Self::Set(_) => Type::Set,
            Self::FrozenSet(_) => Type::FrozenSet,
            Self::Range(_) => Type::Range,
            Self::Slice(_) => Type::Slice,
            Self::Function(_) => Type::Function,
            Self::BoundMethod(_) => Type::Method,
            Self::Property(_) => Type::Property,
            Self::ClassMethod(_) => Type::ClassMethod,
            Self::StaticMethod(_) => Type::StaticMethod,
            Self::ClassObject(_) => Type::Type,
            Self::Instance(_) => Type::Object,
            Self::Super(_) => Type::Super,
            Self::Exception(_) => Type::Object,
            Self::Iter(iter) => iter.py_type(),
            Self::DictView { view_type, .. } => *view_type,
            Self::Generator(g) => {
                if g.is_async {
                    Type::AsyncGenerator
                } else {
                    Type::Generator
                }
            }
            Self::Coroutine(_) => Type::Coroutine,
        }
    }
}

/// The arena. Allocation only; see the module docs for the reclamation story.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    slots: Vec<HeapData>,
}

impl Heap {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn allocate(&mut self, data: HeapData) -> HeapId {
        let id = HeapId(u32::try_from(self.slots.len()).expect("heap exhausted"));
        self.slots.push(data);
        id
    }

    /// Allocates and wraps in a `Value::Ref` in one step.
    pub fn alloc_value(&mut self, data: HeapData) -> Value {
        Value::Ref(self.allocate(data))
    }

    pub fn get(&self, id: HeapId) -> &HeapData {
        &self.slots[id.index()]
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        &mut self.slots[id.index()]
    }

    /// Allocates a string, or returns the canonical empty-string-free Value
    /// path for small literals. Strings are not interned; callers that care
    /// about duplication keep their own handles.
    pub fn alloc_str(&mut self, s: impl Into<String>) -> Value {
        self.alloc_value(HeapData::Str(s.into()))
    }

    /// Normalizes a big integer back into the i64 fast path when it fits.
    pub fn alloc_int(&mut self, value: BigInt) -> Value {
        match num_traits::ToPrimitive::to_i64(&value) {
            Some(small) => Value::Int(small),
            None => self.alloc_value(HeapData::LongInt(value)),
        }
    }

    pub fn alloc_list(&mut self, items: Vec<Value>) -> Value {
        self.alloc_value(HeapData::List(items))
    }

    pub fn alloc_tuple(&mut self, items: Vec<Value>) -> Value {
        self.alloc_value(HeapData::Tuple(items))
    }

    /// Number of live slots (diagnostics and tests only).
    pub fn len(&self) -> usize {
        self.slots.len()
    }
}
