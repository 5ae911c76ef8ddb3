//! The public exception type returned from the run entry points.

use crate::{lexer::LexError, parser::ParseError, token::CodeLoc};

/// An uncaught exception (or syntax error), rendered for the embedder.
///
/// `kind` is the exception class name (`"TypeError"`, `"ValueError"`, or a
/// user-defined class name); `message` is the rendered argument text, possibly
/// empty. Syntax errors from the lexer and parser surface here as
/// `SyntaxError` with the offending location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    kind: String,
    message: String,
    loc: Option<CodeLoc>,
}

impl Exception {
    pub(crate) fn new(kind: impl Into<String>, message: impl Into<String>, loc: Option<CodeLoc>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            loc,
        }
    }

    /// The exception class name.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The rendered exception message (may be empty).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Where the exception was raised, when known.
    #[must_use]
    pub fn location(&self) -> Option<CodeLoc> {
        self.loc
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}: {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for Exception {}

impl From<LexError> for Exception {
    fn from(err: LexError) -> Self {
        Self::new("SyntaxError", err.message, Some(err.loc))
    }
}

impl From<ParseError> for Exception {
    fn from(err: ParseError) -> Self {
        Self::new("SyntaxError", err.message, Some(err.loc))
    }
}
