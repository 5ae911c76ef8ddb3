//! Name resolution: locals pre-pass, global/nonlocal declarations, closures,
//! and comprehension scoping.

mod common;

use common::{assert_raises, run_value};
use krait::Object;

#[test]
fn closure_reads_enclosing_scope() {
    let source = "\
def outer():
    x = 10
    def inner():
        return x + 1
    return inner()
outer()
";
    assert_eq!(run_value(source), Object::Int(11));
}

#[test]
fn nonlocal_counter() {
    let source = "\
def make_counter():
    count = 0
    def bump():
        nonlocal count
        count += 1
        return count
    return bump
c = make_counter()
c()
c()
c()
";
    assert_eq!(run_value(source), Object::Int(3));
}

#[test]
fn nonlocal_without_binding_fails() {
    assert_raises(
        "def f():\n    nonlocal q\n    q = 1\nf()\n",
        "SyntaxError",
        "no binding for nonlocal 'q'",
    );
}

#[test]
fn global_declaration_writes_module_scope() {
    let source = "\
x = 1
def f():
    global x
    x = 99
f()
x
";
    assert_eq!(run_value(source), Object::Int(99));
}

#[test]
fn assignment_makes_a_name_local_everywhere_in_the_body() {
    // Even a conditional assignment marks the whole body.
    assert_raises(
        "x = 1\ndef f():\n    if False:\n        x = 2\n    return x\nf()\n",
        "UnboundLocalError",
        "'x'",
    );
}

#[test]
fn del_makes_a_name_local() {
    assert_raises(
        "x = 1\ndef f():\n    del x\nf()\n",
        "UnboundLocalError",
        "'x'",
    );
}

#[test]
fn comprehension_target_does_not_leak() {
    assert_raises(
        "ys = [x for x in range(3)]\nx\n",
        "NameError",
        "name 'x' is not defined",
    );
}

#[test]
fn comprehension_first_iterable_uses_enclosing_scope() {
    // The outer `row` feeds the first clause; the inner clauses run in the
    // comprehension scope.
    let source = "\
rows = [[1, 2], [3, 4]]
[y for row in rows for y in row]
";
    assert_eq!(
        run_value(source),
        Object::List(vec![Object::Int(1), Object::Int(2), Object::Int(3), Object::Int(4)])
    );
}

#[test]
fn class_body_names_are_not_visible_to_methods() {
    assert_raises(
        "\
class C:
    n = 5
    def f(self):
        return n
C().f()
",
        "NameError",
        "name 'n' is not defined",
    );
}

#[test]
fn class_attributes_reachable_through_self() {
    let source = "\
class C:
    n = 5
    def f(self):
        return self.n
C().f()
";
    assert_eq!(run_value(source), Object::Int(5));
}

#[test]
fn default_values_evaluate_at_definition_time() {
    let source = "\
x = 1
def f(a=x):
    return a
x = 2
f()
";
    assert_eq!(run_value(source), Object::Int(1));
}

#[test]
fn nested_function_shadows_outer_binding() {
    let source = "\
x = 'global'
def f():
    x = 'local'
    return x
f() + ' ' + x
";
    assert_eq!(run_value(source), Object::Str("local global".to_string()));
}

#[test]
fn lambda_captures_its_scope() {
    let source = "\
def adder(n):
    return lambda x: x + n
add3 = adder(3)
add3(4)
";
    assert_eq!(run_value(source), Object::Int(7));
}
