//! krait — an embeddable tree-walking interpreter for a Python-subset
//! scripting language.
//!
//! Source text flows through three stages: an indentation-aware lexer
//! emitting explicit `Indent`/`Dedent` tokens, a recursive-descent parser
//! rebuilding the full expression precedence ladder, and a tree-walking
//! evaluator with lexical scoping, operator dispatch by dunder method with
//! reflected fallback, C3-linearized user classes, an exception hierarchy
//! with subclass matching, and eager generators/coroutines.
//!
//! ```
//! use krait::{Object, run};
//!
//! let result = run("sum(x * x for x in range(4))").unwrap();
//! assert_eq!(result, Object::Int(14));
//! ```

mod args;
mod ast;
mod builtins;
mod eval;
mod exception_private;
mod exception_public;
mod fstring;
mod heap;
mod io;
mod lexer;
mod namespace;
mod object;
mod parser;
mod prepare;
mod py_hash;
mod resource;
mod run;
mod signature;
mod token;
mod types;
mod value;

pub use crate::{
    exception_private::ExcType,
    exception_public::Exception,
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    object::Object,
    resource::{DEFAULT_MAX_RECURSION_DEPTH, ResourceLimits},
    run::{Interpreter, run, run_async},
    token::CodeLoc,
};
