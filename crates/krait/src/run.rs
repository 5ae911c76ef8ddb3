//! Public interface for running source code.
//!
//! Four entry points: the free functions [`run`] and [`run_async`] for
//! one-shot execution, and the [`Interpreter`] handle which owns the heap
//! and the root scope across calls, so globals persist between runs and can
//! be seeded or inspected from the host.

use crate::{
    builtins,
    eval::Evaluator,
    exception_public::Exception,
    heap::Heap,
    io::{PrintWriter, StdPrint},
    lexer,
    namespace::{GLOBAL_SCOPE, Scopes},
    object::Object,
    parser,
    resource::ResourceLimits,
};

/// Runs `source` to completion in a fresh interpreter and returns the value
/// of its final expression statement.
///
/// # Example
/// ```
/// use krait::{Object, run};
///
/// let result = run("x = 40\nx + 2\n").unwrap();
/// assert_eq!(result, Object::Int(42));
/// ```
pub fn run(source: &str) -> Result<Object, Exception> {
    Interpreter::new().run(source)
}

/// Like [`run`], but enables top-level `await` and the async execution mode.
///
/// The interpreter never blocks: coroutines resolve eagerly inside the
/// sandbox, so the returned future completes on first poll. The async
/// signature is what lets embedders drive it from their own executor.
pub async fn run_async(source: &str) -> Result<Object, Exception> {
    Interpreter::new().run_async(source).await
}

/// A persistent interpreter instance.
///
/// Owns all mutable state (heap, scopes, limits); multiple instances are
/// fully independent. The global scope is process-visible only through this
/// handle.
pub struct Interpreter {
    heap: Heap,
    scopes: Scopes,
    limits: ResourceLimits,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with the builtin surface bound into the root
    /// scope and default resource limits.
    #[must_use]
    pub fn new() -> Self {
        let heap = Heap::new();
        let mut scopes = Scopes::new();
        builtins::seed_globals(&mut scopes);
        Self {
            heap,
            scopes,
            limits: ResourceLimits::default(),
        }
    }

    /// Creates an interpreter with the root scope pre-seeded.
    #[must_use]
    pub fn with_globals(globals: Vec<(String, Object)>) -> Self {
        let mut interpreter = Self::new();
        for (name, value) in globals {
            interpreter.set_global(&name, value);
        }
        interpreter
    }

    /// Creates an interpreter with custom resource limits.
    #[must_use]
    pub fn with_limits(limits: ResourceLimits) -> Self {
        let mut interpreter = Self::new();
        interpreter.limits = limits;
        interpreter
    }

    /// Reads a global binding, exported as an owned [`Object`].
    pub fn global(&mut self, name: &str) -> Option<Object> {
        let value = self.scopes.get_local(GLOBAL_SCOPE, name)?;
        let mut print = StdPrint::new();
        let mut ev = Evaluator::new(&mut self.heap, &mut self.scopes, &mut print, self.limits);
        Some(ev.export_value(value))
    }

    /// Binds a global name.
    pub fn set_global(&mut self, name: &str, value: Object) {
        let imported = value.to_value(&mut self.heap);
        self.scopes.set(GLOBAL_SCOPE, name, imported);
    }

    /// Runs source synchronously, printing to stdout.
    pub fn run(&mut self, source: &str) -> Result<Object, Exception> {
        let mut print = StdPrint::new();
        self.execute(source, &mut print, false)
    }

    /// Runs source synchronously with a custom print sink.
    pub fn run_with(&mut self, source: &str, print: &mut impl PrintWriter) -> Result<Object, Exception> {
        self.execute(source, print, false)
    }

    /// Runs source with top-level `await` enabled.
    pub async fn run_async(&mut self, source: &str) -> Result<Object, Exception> {
        let mut print = StdPrint::new();
        self.execute(source, &mut print, true)
    }

    /// Async-mode execution with a custom print sink.
    pub async fn run_async_with(
        &mut self,
        source: &str,
        print: &mut impl PrintWriter,
    ) -> Result<Object, Exception> {
        self.execute(source, print, true)
    }

    fn execute(
        &mut self,
        source: &str,
        print: &mut dyn PrintWriter,
        async_mode: bool,
    ) -> Result<Object, Exception> {
        let tokens = lexer::tokenize(source)?;
        let module = parser::parse(tokens)?;
        let mut ev = Evaluator::new(&mut self.heap, &mut self.scopes, print, self.limits);
        match ev.exec_module(&module, async_mode) {
            Ok(value) => Ok(ev.export_value(value)),
            Err(err) => Err(ev.to_exception(err)),
        }
    }
}
