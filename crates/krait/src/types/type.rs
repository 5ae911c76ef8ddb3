//! The runtime type tag.
//!
//! Every value maps to exactly one `Type`. The `Display` strings match the
//! names Python's `type(x).__name__` reports, which keeps error messages like
//! `unsupported operand type(s) for +: 'int' and 'str'` byte-compatible.

use strum::{Display, EnumString, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub(crate) enum Type {
    #[strum(serialize = "NoneType")]
    NoneType,
    #[strum(serialize = "NotImplementedType")]
    NotImplementedType,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "str")]
    Str,
    #[strum(serialize = "bytes")]
    Bytes,
    #[strum(serialize = "list")]
    List,
    #[strum(serialize = "tuple")]
    Tuple,
    #[strum(serialize = "dict")]
    Dict,
    #[strum(serialize = "set")]
    Set,
    #[strum(serialize = "frozenset")]
    FrozenSet,
    #[strum(serialize = "range")]
    Range,
    #[strum(serialize = "slice")]
    Slice,
    #[strum(serialize = "function")]
    Function,
    #[strum(serialize = "builtin_function_or_method")]
    BuiltinFunction,
    #[strum(serialize = "method")]
    Method,
    #[strum(serialize = "type")]
    Type,
    /// User-class instances; the class name is reported separately.
    #[strum(serialize = "object")]
    Object,
    #[strum(serialize = "property")]
    Property,
    #[strum(serialize = "classmethod")]
    ClassMethod,
    #[strum(serialize = "staticmethod")]
    StaticMethod,
    #[strum(serialize = "super")]
    Super,
    #[strum(serialize = "generator")]
    Generator,
    #[strum(serialize = "async_generator")]
    AsyncGenerator,
    #[strum(serialize = "coroutine")]
    Coroutine,
    #[strum(serialize = "list_iterator")]
    ListIterator,
    #[strum(serialize = "tuple_iterator")]
    TupleIterator,
    #[strum(serialize = "str_iterator")]
    StrIterator,
    #[strum(serialize = "bytes_iterator")]
    BytesIterator,
    #[strum(serialize = "range_iterator")]
    RangeIterator,
    #[strum(serialize = "set_iterator")]
    SetIterator,
    #[strum(serialize = "dict_keyiterator")]
    DictKeyIterator,
    #[strum(serialize = "enumerate")]
    Enumerate,
    #[strum(serialize = "zip")]
    Zip,
    #[strum(serialize = "map")]
    Map,
    #[strum(serialize = "filter")]
    Filter,
    #[strum(serialize = "reversed")]
    Reversed,
    #[strum(serialize = "dict_keys")]
    DictKeys,
    #[strum(serialize = "dict_values")]
    DictValues,
    #[strum(serialize = "dict_items")]
    DictItems,
}

impl Type {
    /// The constructable subset (`int(…)`, `list(…)`, …). Other type tags
    /// exist only as the result of `type(x)` and are not callable.
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::Int
                | Self::Float
                | Self::Str
                | Self::Bytes
                | Self::List
                | Self::Tuple
                | Self::Dict
                | Self::Set
                | Self::FrozenSet
        )
    }
}
