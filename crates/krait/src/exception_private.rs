//! Internal exception machinery: the builtin exception hierarchy, the
//! lightweight exception payload, and the `RunError` type threaded through
//! every fallible evaluator path.
//!
//! Control-flow signals (`return`/`break`/`continue`) are *not* errors and do
//! not travel through `RunError`; they use the evaluator's `Flow` enum and can
//! therefore never be caught by a user `except:` clause.

use smallvec::SmallVec;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{token::CodeLoc, value::Value};

/// Result type alias for operations that can raise.
pub(crate) type RunResult<T> = Result<T, RunError>;

/// Builtin exception types.
///
/// Uses strum derives for automatic `Display`/`FromStr`; the string form is
/// the variant name exactly (`ValueError` -> "ValueError").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    BaseException,
    /// Base class of every ordinary exception.
    Exception,

    // --- LookupError hierarchy ---
    LookupError,
    IndexError,
    KeyError,

    // --- ArithmeticError hierarchy ---
    ArithmeticError,
    ZeroDivisionError,
    OverflowError,
    FloatingPointError,

    // --- NameError hierarchy ---
    NameError,
    UnboundLocalError,

    // --- RuntimeError hierarchy ---
    RuntimeError,
    RecursionError,
    NotImplementedError,

    // --- Standalone types ---
    AssertionError,
    AttributeError,
    SyntaxError,
    TypeError,
    ValueError,
    StopIteration,
    StopAsyncIteration,
    GeneratorExit,
}

impl ExcType {
    /// The direct parent in the exception hierarchy, or `None` for
    /// `BaseException`.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        let parent = match self {
            Self::BaseException => return None,
            Self::Exception => Self::BaseException,
            Self::LookupError
            | Self::ArithmeticError
            | Self::NameError
            | Self::RuntimeError
            | Self::AssertionError
            | Self::AttributeError
            | Self::SyntaxError
            | Self::TypeError
            | Self::ValueError
            | Self::StopIteration
            | Self::StopAsyncIteration
            | Self::GeneratorExit => Self::Exception,
            Self::IndexError | Self::KeyError => Self::LookupError,
            Self::ZeroDivisionError | Self::OverflowError | Self::FloatingPointError => {
                Self::ArithmeticError
            }
            Self::UnboundLocalError => Self::NameError,
            Self::RecursionError | Self::NotImplementedError => Self::RuntimeError,
        };
        Some(parent)
    }

    /// Walks the parent chain of `self` looking for `handler_type`.
    /// Returns true if `self` would be caught by `except handler_type:`.
    #[must_use]
    pub fn is_subclass_of(self, handler_type: Self) -> bool {
        let mut current = Some(self);
        while let Some(exc) = current {
            if exc == handler_type {
                return true;
            }
            current = exc.parent();
        }
        false
    }

    /// Builds a `RunError` carrying this exception type and a message.
    pub(crate) fn msg(self, message: impl Into<String>) -> RunError {
        RunError::simple(SimpleException::new(self, message))
    }

    pub(crate) fn type_error(message: impl Into<String>) -> RunError {
        Self::TypeError.msg(message)
    }

    pub(crate) fn value_error(message: impl Into<String>) -> RunError {
        Self::ValueError.msg(message)
    }

    pub(crate) fn name_error(name: &str) -> RunError {
        Self::NameError.msg(format!("name '{name}' is not defined"))
    }

    pub(crate) fn unbound_local(name: &str) -> RunError {
        Self::UnboundLocalError.msg(format!("local variable '{name}' referenced before assignment"))
    }

    pub(crate) fn attribute_error(type_name: &str, attr: &str) -> RunError {
        Self::AttributeError.msg(format!("'{type_name}' object has no attribute '{attr}'"))
    }

    pub(crate) fn index_error(message: impl Into<String>) -> RunError {
        Self::IndexError.msg(message)
    }

    /// `KeyError` keeps the missing key as its argument so the rendered
    /// message is the key's repr.
    pub(crate) fn key_error(key: Value) -> RunError {
        RunError::simple(SimpleException::with_args(Self::KeyError, [key]))
    }

    pub(crate) fn zero_division(message: impl Into<String>) -> RunError {
        Self::ZeroDivisionError.msg(message)
    }

    pub(crate) fn stop_iteration() -> RunError {
        RunError::simple(SimpleException::with_args(Self::StopIteration, []))
    }

    pub(crate) fn runtime_error(message: impl Into<String>) -> RunError {
        Self::RuntimeError.msg(message)
    }
}

/// A builtin exception instance: type, optional pre-rendered message, and
/// the positional arguments tuple.
///
/// Most internally raised exceptions carry only a message string; arguments
/// are materialized into values on demand (the `args` attribute).
#[derive(Debug, Clone)]
pub(crate) struct SimpleException {
    pub exc_type: ExcType,
    pub message: Option<String>,
    pub args: SmallVec<[Value; 1]>,
}

impl SimpleException {
    pub fn new(exc_type: ExcType, message: impl Into<String>) -> Self {
        Self {
            exc_type,
            message: Some(message.into()),
            args: SmallVec::new(),
        }
    }

    pub fn with_args(exc_type: ExcType, args: impl IntoIterator<Item = Value>) -> Self {
        Self {
            exc_type,
            message: None,
            args: args.into_iter().collect(),
        }
    }

    pub fn no_args(exc_type: ExcType) -> Self {
        Self {
            exc_type,
            message: None,
            args: SmallVec::new(),
        }
    }
}

/// The raised payload: either a lightweight builtin exception (no heap
/// round-trip needed) or an already-constructed exception object.
#[derive(Debug, Clone)]
pub(crate) enum ExcPayload {
    Simple(SimpleException),
    /// A heap exception object or a user-class instance.
    Object(Value),
}

/// A raised exception in flight, with the location it was raised at (filled
/// in by the statement that observed it first).
#[derive(Debug, Clone)]
pub(crate) struct RunError {
    pub payload: ExcPayload,
    pub loc: Option<CodeLoc>,
}

impl RunError {
    pub fn simple(exc: SimpleException) -> Self {
        Self {
            payload: ExcPayload::Simple(exc),
            loc: None,
        }
    }

    pub fn object(value: Value) -> Self {
        Self {
            payload: ExcPayload::Object(value),
            loc: None,
        }
    }

    /// Attaches a source location if none is set yet. The innermost frame
    /// wins, matching where the exception was actually raised.
    #[must_use]
    pub fn at(mut self, loc: CodeLoc) -> Self {
        if self.loc.is_none() {
            self.loc = Some(loc);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subclass_test_walks_parent_chain() {
        assert!(ExcType::IndexError.is_subclass_of(ExcType::LookupError));
        assert!(ExcType::IndexError.is_subclass_of(ExcType::Exception));
        assert!(ExcType::IndexError.is_subclass_of(ExcType::BaseException));
        assert!(ExcType::UnboundLocalError.is_subclass_of(ExcType::NameError));
        assert!(ExcType::RecursionError.is_subclass_of(ExcType::RuntimeError));
        assert!(!ExcType::IndexError.is_subclass_of(ExcType::KeyError));
        assert!(!ExcType::Exception.is_subclass_of(ExcType::ValueError));
    }

    #[test]
    fn every_type_reaches_base_exception() {
        for exc in [
            ExcType::KeyError,
            ExcType::FloatingPointError,
            ExcType::GeneratorExit,
            ExcType::StopAsyncIteration,
            ExcType::NotImplementedError,
        ] {
            assert!(exc.is_subclass_of(ExcType::BaseException));
        }
    }

    #[test]
    fn display_matches_python_names() {
        assert_eq!(ExcType::ZeroDivisionError.to_string(), "ZeroDivisionError");
        assert_eq!(ExcType::UnboundLocalError.to_string(), "UnboundLocalError");
    }
}
