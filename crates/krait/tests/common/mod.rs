//! Shared helpers for the integration tests.

use krait::{CollectStringPrint, Exception, Interpreter, Object};

/// Runs source and returns the value of its final expression statement.
pub fn run_value(source: &str) -> Object {
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    interpreter
        .run_with(source, &mut print)
        .unwrap_or_else(|exc| panic!("unexpected exception: {exc}\nsource:\n{source}"))
}

/// Runs source and returns everything `print` wrote.
pub fn run_output(source: &str) -> String {
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    interpreter
        .run_with(source, &mut print)
        .unwrap_or_else(|exc| panic!("unexpected exception: {exc}\nsource:\n{source}"));
    print.into_output()
}

/// Runs source and returns the uncaught exception.
pub fn run_err(source: &str) -> Exception {
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    match interpreter.run_with(source, &mut print) {
        Ok(value) => panic!("expected an exception, got {value:?}\nsource:\n{source}"),
        Err(exc) => exc,
    }
}

/// Asserts the exception kind and that the message contains `fragment`.
pub fn assert_raises(source: &str, kind: &str, fragment: &str) {
    let exc = run_err(source);
    assert_eq!(exc.kind(), kind, "wrong exception kind: {exc}");
    assert!(
        exc.message().contains(fragment),
        "message {:?} does not contain {fragment:?}",
        exc.message()
    );
}
