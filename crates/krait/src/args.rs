//! Evaluated call-site arguments.
//!
//! `ArgValues` is built by the evaluator after `*iterable` and `**mapping`
//! expansion, so consumers only ever see flat positional values plus named
//! keyword values. Small fixed arities avoid a `Vec` for the common cases.

use crate::{
    exception_private::{ExcType, RunResult},
    value::Value,
};

#[derive(Debug, Clone, Default)]
pub(crate) enum ArgValues {
    #[default]
    Empty,
    One(Value),
    Two(Value, Value),
    Many {
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    },
}

impl ArgValues {
    pub fn from_parts(args: Vec<Value>, kwargs: Vec<(String, Value)>) -> Self {
        if kwargs.is_empty() {
            match args.len() {
                0 => Self::Empty,
                1 => Self::One(args[0]),
                2 => Self::Two(args[0], args[1]),
                _ => Self::Many { args, kwargs },
            }
        } else {
            Self::Many { args, kwargs }
        }
    }

    /// Number of positional arguments.
    pub fn pos_len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::One(_) => 1,
            Self::Two(..) => 2,
            Self::Many { args, .. } => args.len(),
        }
    }

    pub fn has_kwargs(&self) -> bool {
        matches!(self, Self::Many { kwargs, .. } if !kwargs.is_empty())
    }

    /// Splits into positional and keyword parts.
    pub fn into_parts(self) -> (Vec<Value>, Vec<(String, Value)>) {
        match self {
            Self::Empty => (Vec::new(), Vec::new()),
            Self::One(a) => (vec![a], Vec::new()),
            Self::Two(a, b) => (vec![a, b], Vec::new()),
            Self::Many { args, kwargs } => (args, kwargs),
        }
    }

    /// Inserts a receiver in front of the positional arguments (bound-method
    /// and classmethod calls).
    #[must_use]
    pub fn prepend(self, receiver: Value) -> Self {
        match self {
            Self::Empty => Self::One(receiver),
            Self::One(a) => Self::Two(receiver, a),
            Self::Two(a, b) => Self::Many {
                args: vec![receiver, a, b],
                kwargs: Vec::new(),
            },
            Self::Many { mut args, kwargs } => {
                args.insert(0, receiver);
                Self::Many { args, kwargs }
            }
        }
    }

    pub fn first_pos(&self) -> Option<Value> {
        match self {
            Self::Empty => None,
            Self::One(a) | Self::Two(a, _) => Some(*a),
            Self::Many { args, .. } => args.first().copied(),
        }
    }

    fn reject_kwargs(&self, name: &str) -> RunResult<()> {
        if self.has_kwargs() {
            return Err(ExcType::type_error(format!("{name}() takes no keyword arguments")));
        }
        Ok(())
    }

    /// Exactly zero arguments.
    pub fn expect_none(self, name: &str) -> RunResult<()> {
        self.reject_kwargs(name)?;
        if self.pos_len() != 0 {
            return Err(ExcType::type_error(format!(
                "{name}() takes no arguments ({} given)",
                self.pos_len()
            )));
        }
        Ok(())
    }

    /// Exactly one positional argument.
    pub fn expect_one(self, name: &str) -> RunResult<Value> {
        self.reject_kwargs(name)?;
        match self {
            Self::One(a) => Ok(a),
            other => Err(ExcType::type_error(format!(
                "{name}() takes exactly one argument ({} given)",
                other.pos_len()
            ))),
        }
    }

    /// Exactly two positional arguments.
    pub fn expect_two(self, name: &str) -> RunResult<(Value, Value)> {
        self.reject_kwargs(name)?;
        match self {
            Self::Two(a, b) => Ok((a, b)),
            other => Err(ExcType::type_error(format!(
                "{name}() takes exactly 2 arguments ({} given)",
                other.pos_len()
            ))),
        }
    }

    /// One required plus one optional positional argument.
    pub fn expect_one_or_two(self, name: &str) -> RunResult<(Value, Option<Value>)> {
        self.reject_kwargs(name)?;
        match self {
            Self::One(a) => Ok((a, None)),
            Self::Two(a, b) => Ok((a, Some(b))),
            other => Err(ExcType::type_error(format!(
                "{name}() expected 1 or 2 arguments, got {}",
                other.pos_len()
            ))),
        }
    }

    /// At most one positional argument (type constructors like `int()`).
    pub fn expect_at_most_one(self, name: &str) -> RunResult<Option<Value>> {
        self.reject_kwargs(name)?;
        match self {
            Self::Empty => Ok(None),
            Self::One(a) => Ok(Some(a)),
            other => Err(ExcType::type_error(format!(
                "{name}() takes at most 1 argument ({} given)",
                other.pos_len()
            ))),
        }
    }
}
