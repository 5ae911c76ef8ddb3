//! Operator dispatch: dunder protocol, reflected fallback, in-place
//! variants, comparison chains, and truthiness.

mod common;

use common::{assert_raises, run_output, run_value};
use krait::Object;

#[test]
fn forward_dunder_wins() {
    let source = "\
class Vec:
    def __init__(self, x):
        self.x = x
    def __add__(self, other):
        return Vec(self.x + other.x)
(Vec(1) + Vec(2)).x
";
    assert_eq!(run_value(source), Object::Int(3));
}

#[test]
fn reflected_dunder_fires_when_forward_is_absent() {
    // B defines only __radd__; a + b must call B.__radd__(b, a).
    let source = "\
class A: pass
class B:
    def __radd__(self, other):
        return 'radd'
A() + B()
";
    assert_eq!(run_value(source), Object::Str("radd".to_string()));
}

#[test]
fn reflected_dunder_fires_on_not_implemented() {
    let source = "\
class A:
    def __add__(self, other):
        return NotImplemented
class B:
    def __radd__(self, other):
        return 'radd'
A() + B()
";
    assert_eq!(run_value(source), Object::Str("radd".to_string()));
}

#[test]
fn host_types_reflect_against_instances() {
    let source = "\
class Scale:
    def __rmul__(self, other):
        return other * 10
3 * Scale()
";
    assert_eq!(run_value(source), Object::Int(30));
}

#[test]
fn exhausted_dispatch_is_a_type_error() {
    assert_raises(
        "1 + 'a'",
        "TypeError",
        "unsupported operand type(s) for +: 'int' and 'str'",
    );
}

#[test]
fn inplace_dunder_preferred_then_binary_fallback() {
    let source = "\
class Acc:
    def __init__(self):
        self.total = 0
    def __iadd__(self, other):
        self.total += other
        return self
a = Acc()
a += 5
a += 7
a.total
";
    assert_eq!(run_value(source), Object::Int(12));
}

#[test]
fn comparison_chain_short_circuits() {
    let output = run_output(
        "\
def mid():
    print('mid')
    return 5
1 < mid() < 10
0 > mid() > -1
",
    );
    // Each chain evaluates the middle operand exactly once; the second
    // chain stops after its first false link.
    assert_eq!(output, "mid\nmid\n");
}

#[test]
fn chain_result_is_boolean() {
    assert_eq!(run_value("1 < 2 <= 2"), Object::Bool(true));
    assert_eq!(run_value("1 < 2 > 3"), Object::Bool(false));
    assert_eq!(run_value("'a' < 'b' < 'c'"), Object::Bool(true));
}

#[test]
fn identity_and_membership() {
    assert_eq!(run_value("x = [1]\ny = x\nx is y"), Object::Bool(true));
    assert_eq!(run_value("[1] is [1]"), Object::Bool(false));
    assert_eq!(run_value("None is None"), Object::Bool(true));
    assert_eq!(run_value("2 in [1, 2, 3]"), Object::Bool(true));
    assert_eq!(run_value("'ell' in 'hello'"), Object::Bool(true));
    assert_eq!(run_value("'k' not in {'a': 1}"), Object::Bool(true));
    assert_eq!(run_value("9 in range(0, 10, 3)"), Object::Bool(true));
    assert_eq!(run_value("10 in range(0, 10, 3)"), Object::Bool(false));
}

#[test]
fn contains_dunder_consulted() {
    let source = "\
class Box:
    def __contains__(self, item):
        return item == 'magic'
('magic' in Box(), 'other' in Box())
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Bool(true), Object::Bool(false)])
    );
}

#[test]
fn short_circuit_returns_operands() {
    assert_eq!(run_value("0 or 'fallback'"), Object::Str("fallback".to_string()));
    assert_eq!(run_value("'first' or 'second'"), Object::Str("first".to_string()));
    assert_eq!(run_value("0 and 1"), Object::Int(0));
    assert_eq!(run_value("1 and [] and 'x'"), Object::List(vec![]));
    // The right side never evaluates when the left decides.
    assert_eq!(run_output("def boom():\n    print('boom')\n    return 1\nFalse and boom()\n"), "");
}

#[test]
fn truthiness_ladder() {
    let source = "\
class Sized:
    def __init__(self, n):
        self.n = n
    def __len__(self):
        return self.n
class Always:
    pass
(bool(Sized(0)), bool(Sized(2)), bool(Always()))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Bool(false), Object::Bool(true), Object::Bool(true)])
    );
}

#[test]
fn bool_dunder_beats_len() {
    let source = "\
class Weird:
    def __bool__(self):
        return True
    def __len__(self):
        return 0
bool(Weird())
";
    assert_eq!(run_value(source), Object::Bool(true));
}

#[test]
fn builtin_falsiness() {
    assert_eq!(
        run_value("[bool(0), bool(0.0), bool(''), bool([]), bool({}), bool(set()), bool(None), bool(range(0))]"),
        Object::List(vec![Object::Bool(false); 8])
    );
}

#[test]
fn set_operators() {
    assert_eq!(
        run_value("sorted({1, 2} | {2, 3})"),
        Object::List(vec![Object::Int(1), Object::Int(2), Object::Int(3)])
    );
    assert_eq!(run_value("sorted({1, 2, 3} & {2, 3, 4})"), Object::List(vec![Object::Int(2), Object::Int(3)]));
    assert_eq!(run_value("sorted({1, 2, 3} - {2})"), Object::List(vec![Object::Int(1), Object::Int(3)]));
    assert_eq!(run_value("sorted({1, 2} ^ {2, 3})"), Object::List(vec![Object::Int(1), Object::Int(3)]));
    assert_eq!(run_value("{1, 2} <= {1, 2, 3}"), Object::Bool(true));
    assert_eq!(run_value("{1, 2} < {1, 2}"), Object::Bool(false));
}

#[test]
fn dict_merge_operator() {
    assert_eq!(
        run_value("{'a': 1, 'b': 2} | {'b': 3}"),
        Object::Dict(vec![
            (Object::Str("a".to_string()), Object::Int(1)),
            (Object::Str("b".to_string()), Object::Int(3)),
        ])
    );
}

#[test]
fn sequence_concat_and_repeat() {
    assert_eq!(run_value("'ab' * 3"), Object::Str("ababab".to_string()));
    assert_eq!(run_value("2 * 'ab'"), Object::Str("abab".to_string()));
    assert_eq!(
        run_value("[0] * 3"),
        Object::List(vec![Object::Int(0), Object::Int(0), Object::Int(0)])
    );
    assert_eq!(
        run_value("(1,) + (2,)"),
        Object::Tuple(vec![Object::Int(1), Object::Int(2)])
    );
    assert_eq!(run_value("'ab' * 0"), Object::Str(String::new()));
}

#[test]
fn power_with_negative_exponent() {
    assert_eq!(run_value("2 ** -1"), Object::Float(0.5));
    assert_eq!(run_value("4 ** -2"), Object::Float(0.0625));
    assert_eq!(run_value("pow(2, -2)"), Object::Float(0.25));
    assert_raises(
        "0 ** -1",
        "ZeroDivisionError",
        "0.0 cannot be raised to a negative power",
    );
    assert_raises(
        "0 ** -2",
        "ZeroDivisionError",
        "0.0 cannot be raised to a negative power",
    );
}

#[test]
fn shift_and_bitwise() {
    assert_eq!(run_value("1 << 10"), Object::Int(1024));
    assert_eq!(run_value("255 >> 4"), Object::Int(15));
    assert_eq!(run_value("0b1100 & 0b1010"), Object::Int(8));
    assert_eq!(run_value("0b1100 ^ 0b1010"), Object::Int(6));
    assert_eq!(run_value("~5"), Object::Int(-6));
    // Shifting past 63 bits promotes instead of truncating.
    let Object::BigInt(big) = run_value("1 << 80") else {
        panic!("expected a big integer");
    };
    assert_eq!(big.to_string(), "1208925819614629174706176");
}

#[test]
fn unary_dunders() {
    let source = "\
class N:
    def __init__(self, v):
        self.v = v
    def __neg__(self):
        return N(-self.v)
(-N(5)).v
";
    assert_eq!(run_value(source), Object::Int(-5));
}

#[test]
fn ordering_type_errors_name_both_types() {
    assert_raises(
        "1 < 'a'",
        "TypeError",
        "'<' not supported between instances of 'int' and 'str'",
    );
}

#[test]
fn lexicographic_sequence_comparison() {
    assert_eq!(run_value("[1, 2, 3] < [1, 2, 4]"), Object::Bool(true));
    assert_eq!(run_value("[1, 2] < [1, 2, 0]"), Object::Bool(true));
    assert_eq!(run_value("(2,) > (1, 9, 9)"), Object::Bool(true));
}

#[test]
fn matmul_dispatches_to_dunder_only() {
    let source = "\
class M:
    def __matmul__(self, other):
        return 'mat'
M() @ M()
";
    assert_eq!(run_value(source), Object::Str("mat".to_string()));
    assert_raises("1 @ 2", "TypeError", "unsupported operand type(s) for @");
}
