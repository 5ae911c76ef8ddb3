//! Output plumbing for the `print` builtin.
//!
//! `print` is the interpreter's only mandated output sink; everything it
//! emits flows through a `PrintWriter`, so embedders can capture or discard
//! output without touching process stdout.

use std::io::{self, Write as _};

/// Receives `print` output.
///
/// `write_str` is called once per formatted argument; separators and the
/// final terminator arrive through `write_char`, so implementations never
/// need to re-split the stream.
pub trait PrintWriter {
    fn write_str(&mut self, output: &str);
    fn write_char(&mut self, c: char);
}

/// Writes to process stdout, line-buffered.
#[derive(Debug, Default)]
pub struct StdPrint {
    buffer: String,
}

impl StdPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let _ = io::stdout().write_all(self.buffer.as_bytes());
        let _ = io::stdout().flush();
        self.buffer.clear();
    }
}

impl PrintWriter for StdPrint {
    fn write_str(&mut self, output: &str) {
        self.buffer.push_str(output);
    }

    fn write_char(&mut self, c: char) {
        self.buffer.push(c);
        if c == '\n' {
            self.flush_buffer();
        }
    }
}

impl Drop for StdPrint {
    fn drop(&mut self) {
        self.flush_buffer();
    }
}

/// Collects all output into a string. The standard writer for tests.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_str(&mut self, output: &str) {
        self.0.push_str(output);
    }

    fn write_char(&mut self, c: char) {
        self.0.push(c);
    }
}

/// Discards all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_str(&mut self, _output: &str) {}
    fn write_char(&mut self, _c: char) {}
}
