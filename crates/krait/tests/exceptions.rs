//! Exception raising, matching, else/finally ordering, and context
//! managers.

mod common;

use common::{assert_raises, run_output, run_value};
use krait::Object;

#[test]
fn handler_order_first_match_wins() {
    let source = "\
try:
    raise KeyError('k')
except IndexError:
    r = 'index'
except LookupError:
    r = 'lookup'
except Exception:
    r = 'exception'
r
";
    assert_eq!(run_value(source), Object::Str("lookup".to_string()));
}

#[test]
fn tuple_filter_matches_any_member() {
    let source = "\
try:
    raise ValueError('v')
except (KeyError, ValueError) as e:
    str(e)
";
    assert_eq!(run_value(source), Object::Str("v".to_string()));
}

#[test]
fn bare_except_catches_everything() {
    let source = "\
try:
    raise RuntimeError('x')
except:
    'caught'
";
    assert_eq!(run_value(source), Object::Str("caught".to_string()));
}

#[test]
fn else_runs_only_without_exception() {
    let output = run_output(
        "\
try:
    print('body')
except ValueError:
    print('handler')
else:
    print('else')
finally:
    print('finally')
try:
    raise ValueError()
except ValueError:
    print('handler2')
else:
    print('else2')
finally:
    print('finally2')
",
    );
    assert_eq!(output, "body\nelse\nfinally\nhandler2\nfinally2\n");
}

#[test]
fn finally_runs_on_return_paths() {
    let output = run_output(
        "\
def f():
    try:
        return 'value'
    finally:
        print('cleanup')
print(f())
",
    );
    assert_eq!(output, "cleanup\nvalue\n");
}

#[test]
fn finally_runs_on_break_and_continue() {
    let output = run_output(
        "\
for i in range(3):
    try:
        if i == 1:
            continue
        if i == 2:
            break
        print('body', i)
    finally:
        print('fin', i)
",
    );
    assert_eq!(output, "body 0\nfin 0\nfin 1\nfin 2\n");
}

#[test]
fn unmatched_exception_reraises_after_finally() {
    let output = run_output(
        "\
try:
    try:
        raise KeyError('k')
    except IndexError:
        print('wrong')
    finally:
        print('inner-finally')
except KeyError:
    print('outer')
",
    );
    assert_eq!(output, "inner-finally\nouter\n");
}

#[test]
fn raise_forms() {
    // A class raises a fresh instance; an instance re-raises as-is.
    assert_raises("raise ValueError", "ValueError", "");
    assert_raises("raise ValueError('boom')", "ValueError", "boom");
    assert_raises("e = TypeError('t')\nraise e", "TypeError", "t");
    assert_raises("raise 42", "TypeError", "exceptions must derive from BaseException");
}

#[test]
fn bare_raise_reraises_active_exception() {
    let source = "\
try:
    try:
        raise ValueError('original')
    except ValueError:
        raise
except ValueError as e:
    str(e)
";
    assert_eq!(run_value(source), Object::Str("original".to_string()));
    assert_raises("raise", "RuntimeError", "No active exception to re-raise");
}

#[test]
fn user_exception_classes_match_builtin_ancestors() {
    let source = "\
class AppError(ValueError):
    pass
try:
    raise AppError('app')
except ValueError as e:
    str(e)
";
    assert_eq!(run_value(source), Object::Str("app".to_string()));
}

#[test]
fn user_exception_hierarchy() {
    let source = "\
class Base(Exception): pass
class Child(Base): pass
try:
    raise Child()
except Base:
    'caught'
";
    assert_eq!(run_value(source), Object::Str("caught".to_string()));
}

#[test]
fn user_exception_args_are_stored() {
    let source = "\
class E(Exception):
    pass
e = E(1, 'two')
e.args
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(1), Object::Str("two".to_string())])
    );
}

#[test]
fn exception_instance_exposes_args() {
    assert_eq!(
        run_value("e = ValueError('a', 2)\ne.args"),
        Object::Tuple(vec![Object::Str("a".to_string()), Object::Int(2)])
    );
}

#[test]
fn non_exception_class_cannot_be_raised_or_caught() {
    assert_raises(
        "class C: pass\nraise C()\n",
        "TypeError",
        "exceptions must derive from BaseException",
    );
    assert_raises(
        "class C: pass\ntry:\n    raise ValueError()\nexcept C:\n    pass\n",
        "TypeError",
        "catching classes that do not inherit from BaseException",
    );
}

#[test]
fn key_error_message_is_the_key_repr() {
    let exc = common::run_err("{}['missing']");
    assert_eq!(exc.kind(), "KeyError");
    assert_eq!(exc.message(), "'missing'");
}

#[test]
fn with_calls_exit_on_every_path() {
    let output = run_output(
        "\
class CM:
    def __init__(self, name):
        self.name = name
    def __enter__(self):
        print('enter', self.name)
        return self.name
    def __exit__(self, exc_type, exc, tb):
        print('exit', self.name)
        return False
with CM('a') as a, CM('b') as b:
    print('body', a, b)
def f():
    with CM('r'):
        return 1
f()
",
    );
    // Multiple items enter left-to-right and exit right-to-left; return
    // still runs __exit__.
    assert_eq!(output, "enter a\nenter b\nbody a b\nexit b\nexit a\nenter r\nexit r\n");
}

#[test]
fn with_swallows_when_exit_returns_truthy() {
    let source = "\
class Quiet:
    def __enter__(self):
        return self
    def __exit__(self, exc_type, exc, tb):
        return True
with Quiet():
    raise ValueError('swallowed')
'after'
";
    assert_eq!(run_value(source), Object::Str("after".to_string()));
}

#[test]
fn with_exit_sees_the_exception() {
    let output = run_output(
        "\
class Watcher:
    def __enter__(self):
        return self
    def __exit__(self, exc_type, exc, tb):
        print(exc_type is ValueError, str(exc))
        return True
with Watcher():
    raise ValueError('seen')
",
    );
    assert_eq!(output, "True seen\n");
}

#[test]
fn with_requires_the_protocol() {
    assert_raises(
        "with 42:\n    pass\n",
        "TypeError",
        "does not support the context manager protocol",
    );
}

#[test]
fn handler_name_stays_bound_after_body() {
    // The tight "clear after except body" rule is deliberately not
    // implemented; the binding persists in the enclosing scope.
    let source = "\
try:
    raise ValueError('kept')
except ValueError as e:
    pass
str(e)
";
    assert_eq!(run_value(source), Object::Str("kept".to_string()));
}

#[test]
fn assert_carries_its_message() {
    assert_raises("assert 1 == 2, 'math is broken'", "AssertionError", "math is broken");
    assert_raises("assert False", "AssertionError", "");
    assert_eq!(run_value("assert True\n'ok'"), Object::Str("ok".to_string()));
}

#[test]
fn uncaught_exceptions_carry_location() {
    let exc = common::run_err("x = 1\ny = 2\nz = unknown_name\n");
    assert_eq!(exc.kind(), "NameError");
    assert_eq!(exc.location().map(|l| l.line), Some(3));
}

#[test]
fn control_signals_are_not_catchable() {
    // return inside try/except must not be caught by the bare except.
    let output = run_output(
        "\
def f():
    try:
        return 'returned'
    except:
        return 'caught?!'
print(f())
",
    );
    assert_eq!(output, "returned\n");
}
