//! User function objects.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    ast::{FunctionDef, LambdaDef, Params},
    heap::HeapId,
    namespace::ScopeId,
    value::Value,
};

/// The shared body of a function object: a `def` statement or a lambda.
#[derive(Debug, Clone)]
pub(crate) enum FunctionBody {
    Def(Rc<FunctionDef>),
    Lambda(Rc<LambdaDef>),
}

impl FunctionBody {
    pub fn params(&self) -> &Params {
        match self {
            Self::Def(def) => &def.params,
            Self::Lambda(def) => &def.params,
        }
    }
}

/// A function created by `def` or `lambda`.
///
/// Defaults are evaluated once, at definition time, and stored here;
/// `defaults` is tail-aligned with the positional-or-keyword parameters and
/// `kw_defaults` is index-aligned with the keyword-only parameters.
#[derive(Debug)]
pub(crate) struct FunctionObject {
    pub name: String,
    pub body: FunctionBody,
    /// The scope the function was defined in (its closure).
    pub closure: ScopeId,
    pub defaults: Vec<Value>,
    pub kw_defaults: Vec<Option<Value>>,
    pub is_async: bool,
    pub is_generator: bool,
    /// Set when the function was defined directly in a class body; this is
    /// the pivot for zero-argument `super()`.
    pub defining_class: Option<HeapId>,
    /// Arbitrary attributes (`f.attr = …`), rarely used but part of the
    /// function value surface.
    pub attrs: AHashMap<String, Value>,
}
