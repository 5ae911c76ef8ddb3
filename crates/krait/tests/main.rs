//! End-to-end scenarios over the public API, including every concrete
//! scenario from the language contract.

mod common;

use common::{assert_raises, run_output, run_value};
use krait::{Interpreter, Object};

#[test]
fn unbound_local_is_detected_before_assignment() {
    // The classic: `x` is local to f because it is assigned below, so the
    // read on the first line fails.
    assert_raises(
        "x = 10\ndef f():\n    y = x\n    x = 20\n    return y\nf()\n",
        "UnboundLocalError",
        "local variable 'x'",
    );
}

#[test]
fn comprehension_with_filter() {
    assert_eq!(
        run_value("[x*2 for x in range(5) if x%2==0]"),
        Object::List(vec![Object::Int(0), Object::Int(4), Object::Int(8)])
    );
}

#[test]
fn super_chains_through_mro() {
    let source = "\
class A:
    def f(self): return 'A'
class B(A):
    def f(self): return super().f()+'B'
B().f()
";
    assert_eq!(run_value(source), Object::Str("AB".to_string()));
}

#[test]
fn except_matches_parent_class() {
    let source = "\
try:
    raise IndexError('oob')
except LookupError as e:
    str(e)
";
    assert_eq!(run_value(source), Object::Str("oob".to_string()));
}

#[test]
fn generator_collects_yields() {
    let source = "\
def g():
    yield 1
    yield 2
    yield 3
list(g())
";
    assert_eq!(
        run_value(source),
        Object::List(vec![Object::Int(1), Object::Int(2), Object::Int(3)])
    );
}

#[test]
fn setdefault_returns_existing_value() {
    let source = "\
d = {}
d.setdefault('a', []).append(1)
d.setdefault('a', []).append(2)
d
";
    assert_eq!(
        run_value(source),
        Object::Dict(vec![(
            Object::Str("a".to_string()),
            Object::List(vec![Object::Int(1), Object::Int(2)])
        )])
    );
}

#[test]
fn module_result_is_last_expression() {
    assert_eq!(run_value("1\n2\n3\n"), Object::Int(3));
    assert_eq!(run_value("x = 5\n"), Object::None);
}

#[test]
fn print_writes_space_joined_lines() {
    assert_eq!(run_output("print(1, 'two', [3])\n"), "1 two [3]\n");
    assert_eq!(run_output("print('a', 'b', sep='-', end='!')\n"), "a-b!");
}

#[test]
fn fstring_formatting() {
    assert_eq!(
        run_value("x = 42\nf'{x:>6}|{x:<6}|{x:^6}'"),
        Object::Str("    42|42    |  42  ".to_string())
    );
    assert_eq!(
        run_value("pi = 3.14159\nf'{pi:.2f}'"),
        Object::Str("3.14".to_string())
    );
    assert_eq!(
        run_value("s = 'hi'\nf'{s!r}'"),
        Object::Str("'hi'".to_string())
    );
    assert_eq!(run_value("f'{{literal}}'"), Object::Str("{literal}".to_string()));
    assert_eq!(run_value("f'{1234567:,}'"), Object::Str("1,234,567".to_string()));
    // An absurd width is a ValueError, not a crash.
    assert_raises("f'{5:99999999999999999999d}'", "ValueError", "width too large");
    assert_raises("f'{5:.99999999999999999999f}'", "ValueError", "precision too large");
}

#[test]
fn str_format_method() {
    assert_eq!(
        run_value("'{} and {}'.format(1, 'two')"),
        Object::Str("1 and two".to_string())
    );
    assert_eq!(
        run_value("'{1}{0}'.format('a', 'b')"),
        Object::Str("ba".to_string())
    );
    assert_eq!(
        run_value("'{name:>4}'.format(name='x')"),
        Object::Str("   x".to_string())
    );
    // Keyword fields combine freely with either numbering style.
    assert_eq!(
        run_value("'{}-{k}'.format(1, k=2)"),
        Object::Str("1-2".to_string())
    );
    assert_raises(
        "'{} {0}'.format(1, 2)",
        "ValueError",
        "cannot switch from automatic field numbering to manual field specification",
    );
    assert_raises(
        "'{0} {}'.format(1, 2)",
        "ValueError",
        "cannot switch from manual field specification to automatic field numbering",
    );
}

#[test]
fn big_integer_arithmetic_promotes() {
    let Object::BigInt(big) = run_value("2 ** 100") else {
        panic!("expected a big integer");
    };
    assert_eq!(big.to_string(), "1267650600228229401496703205376");
    // And falls back to i64 when it fits.
    assert_eq!(run_value("(2 ** 100) // (2 ** 90)"), Object::Int(1024));
}

#[test]
fn integer_division_semantics() {
    assert_eq!(run_value("7 // 2"), Object::Int(3));
    assert_eq!(run_value("-7 // 2"), Object::Int(-4));
    assert_eq!(run_value("-7 % 3"), Object::Int(2));
    assert_eq!(run_value("7 / 2"), Object::Float(3.5));
    assert_raises("1 // 0", "ZeroDivisionError", "integer division or modulo by zero");
    assert_raises("1 / 0", "ZeroDivisionError", "division by zero");
}

#[test]
fn round_uses_ties_to_even() {
    assert_eq!(run_value("round(0.5)"), Object::Int(0));
    assert_eq!(run_value("round(1.5)"), Object::Int(2));
    assert_eq!(run_value("round(2.5)"), Object::Int(2));
    assert_eq!(run_value("round(2.675, 2)"), Object::Float(2.67));
    assert_eq!(run_value("round(2.55, 1)"), Object::Float(2.5));
}

#[test]
fn walrus_binds_in_enclosing_scope() {
    assert_eq!(run_value("y = (x := 10) + 5\nx + y"), Object::Int(25));
}

#[test]
fn match_statement_selects_first_matching_case() {
    let source = "\
def describe(x):
    match x:
        case 0:
            return 'zero'
        case 1 | 2:
            return 'small'
        case [a, b]:
            return a + b
        case n if n > 100:
            return 'big'
        case _:
            return 'other'
[describe(0), describe(2), describe([3, 4]), describe(200), describe(50)]
";
    assert_eq!(
        run_value(source),
        Object::List(vec![
            Object::Str("zero".to_string()),
            Object::Str("small".to_string()),
            Object::Int(7),
            Object::Str("big".to_string()),
            Object::Str("other".to_string()),
        ])
    );
}

#[test]
fn interpreter_globals_persist_across_runs() {
    let mut interp = Interpreter::new();
    interp.run("counter = 0\n").unwrap();
    interp.run("counter = counter + 1\n").unwrap();
    interp.run("counter = counter + 1\n").unwrap();
    assert_eq!(interp.global("counter"), Some(Object::Int(2)));
}

#[test]
fn interpreter_seeded_globals() {
    let mut interp = Interpreter::with_globals(vec![("x".to_string(), Object::Int(41))]);
    assert_eq!(interp.run("x + 1").unwrap(), Object::Int(42));
    interp.set_global("x", Object::Str("hello".to_string()));
    assert_eq!(interp.run("x.upper()").unwrap(), Object::Str("HELLO".to_string()));
}

#[test]
fn recursion_limit_raises_recursion_error() {
    let mut interp = Interpreter::with_limits(krait::ResourceLimits::with_max_recursion_depth(50));
    let mut print = krait::CollectStringPrint::new();
    let err = interp
        .run_with("def f():\n    return f()\nf()\n", &mut print)
        .unwrap_err();
    assert_eq!(err.kind(), "RecursionError");
}

#[test]
fn recursion_error_is_catchable() {
    let source = "\
def f():
    return f()
try:
    f()
except RecursionError:
    'caught'
";
    assert_eq!(run_value(source), Object::Str("caught".to_string()));
}

#[test]
fn syntax_errors_carry_location() {
    let exc = common::run_err("x = (1 +\n");
    assert_eq!(exc.kind(), "SyntaxError");
    let exc = common::run_err("if x:\n        a = 1\n    b = 2\n");
    assert_eq!(exc.kind(), "SyntaxError");
    assert!(exc.message().contains("unindent"));
    assert_eq!(exc.location().map(|l| l.line), Some(3));
}

#[test]
fn control_flow_outside_context_is_a_syntax_error() {
    assert_raises("return 1\n", "SyntaxError", "'return' outside function");
    assert_raises("break\n", "SyntaxError", "'break' outside loop");
}

#[test]
fn input_is_feature_gated() {
    assert_raises("input()", "NotImplementedError", "input()");
}

#[test]
fn imports_are_stubs() {
    assert_eq!(run_value("import os\nfrom sys import path\n1\n"), Object::Int(1));
}

#[test]
fn slicing_surface() {
    assert_eq!(
        run_value("'hello world'[::-1]"),
        Object::Str("dlrow olleh".to_string())
    );
    assert_eq!(
        run_value("[0, 1, 2, 3, 4, 5][1:5:2]"),
        Object::List(vec![Object::Int(1), Object::Int(3)])
    );
    assert_eq!(run_value("(1, 2, 3)[-1]"), Object::Int(3));
    assert_eq!(
        run_value("x = [1, 2, 3, 4]\nx[1:3] = [9]\nx"),
        Object::List(vec![Object::Int(1), Object::Int(9), Object::Int(4)])
    );
    assert_eq!(
        run_value("x = [1, 2, 3]\ndel x[0]\nx"),
        Object::List(vec![Object::Int(2), Object::Int(3)])
    );
    assert_eq!(run_value("list(range(10)[2:6:2])"), Object::List(vec![Object::Int(2), Object::Int(4)]));
    assert_raises("[1, 2][0:2:0]", "ValueError", "slice step cannot be zero");
}

#[test]
fn starred_unpacking() {
    assert_eq!(
        run_value("a, *b, c = [1, 2, 3, 4, 5]\n(a, b, c)"),
        Object::Tuple(vec![
            Object::Int(1),
            Object::List(vec![Object::Int(2), Object::Int(3), Object::Int(4)]),
            Object::Int(5),
        ])
    );
    assert_raises("a, b, c = [1, 2]", "ValueError", "not enough values to unpack");
    assert_raises("a, b = [1, 2, 3]", "ValueError", "too many values to unpack");
}

#[test]
fn chained_and_augmented_assignment() {
    assert_eq!(run_value("a = b = c = 2\na + b + c"), Object::Int(6));
    assert_eq!(run_value("x = 5\nx //= 2\nx"), Object::Int(2));
    assert_eq!(
        run_value("xs = [1]\nys = xs\nxs += [2]\nys"),
        Object::List(vec![Object::Int(1), Object::Int(2)])
    );
}

#[test]
fn bool_is_an_int_for_arithmetic_and_keys() {
    assert_eq!(run_value("True + True"), Object::Int(2));
    assert_eq!(run_value("True * 5"), Object::Int(5));
    // hash(True) == hash(1): the later binding wins, the first key survives.
    assert_eq!(
        run_value("d = {1: 'a'}\nd[True] = 'b'\nlen(d)"),
        Object::Int(1)
    );
    assert_eq!(run_value("d = {1: 'a'}\nd[True] = 'b'\nd[1]"), Object::Str("b".to_string()));
}
