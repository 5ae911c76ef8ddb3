//! Generator, async-generator, and coroutine objects.
//!
//! Generators here are *eager buffers*: the function body runs to completion
//! on the first `__next__`, recording every yielded value, and the buffer is
//! then served one value at a time. An exception raised during collection is
//! stored and re-raised only after all buffered values have been delivered.
//! This trades true lazy suspension for portability; programs that rely on
//! side effects interleaved between `__next__` calls (or on infinite
//! generators) are outside the supported surface.

use std::collections::VecDeque;

use crate::{args::ArgValues, exception_private::RunError, value::Value};

#[derive(Debug)]
pub(crate) enum GeneratorState {
    /// Created but not yet started; holds the captured call.
    Unstarted { func: Value, args: ArgValues },
    /// Body has run; values are replayed from the buffer.
    Buffered {
        values: VecDeque<Value>,
        /// Terminal exception observed during collection, raised after the
        /// buffer drains.
        error: Option<RunError>,
    },
    /// Buffer drained (or `close()` called); every further `__next__`
    /// raises `StopIteration`.
    Exhausted,
}

#[derive(Debug)]
pub(crate) struct Generator {
    pub state: GeneratorState,
    pub is_async: bool,
}

impl Generator {
    pub fn new(func: Value, args: ArgValues, is_async: bool) -> Self {
        Self {
            state: GeneratorState::Unstarted { func, args },
            is_async,
        }
    }
}

#[derive(Debug)]
pub(crate) enum CoroutineState {
    /// Created but not awaited; holds the captured call.
    Pending { func: Value, args: ArgValues },
    /// Already awaited; coroutines are single-shot.
    Consumed,
}

/// The object returned by calling an `async def` function. Awaiting it runs
/// the body under the async execution mode and produces the return value.
#[derive(Debug)]
pub(crate) struct Coroutine {
    pub state: CoroutineState,
}

impl Coroutine {
    pub fn new(func: Value, args: ArgValues) -> Self {
        Self {
            state: CoroutineState::Pending { func, args },
        }
    }
}
