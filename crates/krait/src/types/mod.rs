//! Runtime object implementations.

pub(crate) mod class;
pub(crate) mod dict;
pub(crate) mod function;
pub(crate) mod generator;
pub(crate) mod iter;
pub(crate) mod list;
pub(crate) mod range;
pub(crate) mod set;
pub(crate) mod str_methods;
pub(crate) mod r#type;

pub(crate) use class::{
    BoundMethod, ClassObject, Instance, Property, SuperProxy, class_exc_base, compute_c3_mro,
    mro_lookup, mro_lookup_after,
};
pub(crate) use dict::Dict;
pub(crate) use function::{FunctionBody, FunctionObject};
pub(crate) use generator::{Coroutine, CoroutineState, Generator, GeneratorState};
pub(crate) use iter::KraitIter;
pub(crate) use range::{
    RangeObject, SliceObject, normalize_index, resolve_slice_indices, slice_index_iter,
};
pub(crate) use set::Set;
pub(crate) use r#type::Type;
