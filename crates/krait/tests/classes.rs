//! Classes: MRO, descriptors, bound methods, super, and construction.

mod common;

use common::{assert_raises, run_value};
use krait::Object;

#[test]
fn diamond_mro_resolves_left_to_right() {
    let source = "\
class A:
    def who(self): return 'A'
class B(A):
    def who(self): return 'B'
class C(A):
    def who(self): return 'C'
class D(B, C):
    pass
D().who()
";
    assert_eq!(run_value(source), Object::Str("B".to_string()));
}

#[test]
fn inconsistent_mro_fails_at_class_creation() {
    assert_raises(
        "\
class A: pass
class B(A): pass
class C(A, B): pass
",
        "TypeError",
        "Cannot create a consistent method resolution order (MRO)",
    );
}

#[test]
fn cooperative_super_walks_the_full_mro() {
    let source = "\
class A:
    def f(self): return 'A'
class B(A):
    def f(self): return 'B' + super().f()
class C(A):
    def f(self): return 'C' + super().f()
class D(B, C):
    def f(self): return 'D' + super().f()
D().f()
";
    // MRO is D, B, C, A; each super() continues from where the method lives.
    assert_eq!(run_value(source), Object::Str("DBCA".to_string()));
}

#[test]
fn init_runs_on_construction() {
    let source = "\
class Point:
    def __init__(self, x, y):
        self.x = x
        self.y = y
    def dist2(self):
        return self.x * self.x + self.y * self.y
Point(3, 4).dist2()
";
    assert_eq!(run_value(source), Object::Int(25));
}

#[test]
fn constructor_arity_is_checked() {
    assert_raises("class C: pass\nC(1)\n", "TypeError", "takes no arguments");
    assert_raises(
        "class C:\n    def __init__(self, a): pass\nC()\n",
        "TypeError",
        "missing 1 required positional argument: 'a'",
    );
}

#[test]
fn property_getter_and_setter() {
    let source = "\
class Celsius:
    def __init__(self, degrees):
        self._degrees = degrees
    @property
    def degrees(self):
        return self._degrees
    @degrees.setter
    def degrees(self, value):
        self._degrees = value + 0.0
c = Celsius(20)
before = c.degrees
c.degrees = 25
(before, c.degrees)
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(20), Object::Float(25.0)])
    );
}

#[test]
fn read_only_property_rejects_assignment() {
    assert_raises(
        "\
class C:
    @property
    def x(self):
        return 1
c = C()
c.x = 2
",
        "AttributeError",
        "can't set attribute",
    );
}

#[test]
fn data_descriptor_wins_over_instance_dict() {
    // A property with a setter shadows the instance attribute of the same
    // name even after a direct dict write through another path.
    let source = "\
class C:
    def __init__(self):
        self._x = 1
    @property
    def x(self):
        return self._x
    @x.setter
    def x(self, v):
        self._x = v
c = C()
c.x = 42
c.x
";
    assert_eq!(run_value(source), Object::Int(42));
}

#[test]
fn property_deleter_runs_on_del() {
    let source = "\
class C:
    def __init__(self):
        self.deleted = False
    @property
    def x(self):
        return 1
    @x.deleter
    def x(self):
        self.deleted = True
c = C()
del c.x
c.deleted
";
    assert_eq!(run_value(source), Object::Bool(true));
}

#[test]
fn classmethod_binds_the_class() {
    let source = "\
class C:
    kind = 'base'
    @classmethod
    def describe(cls):
        return cls.kind
class D(C):
    kind = 'derived'
(C.describe(), D.describe(), D().describe())
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![
            Object::Str("base".to_string()),
            Object::Str("derived".to_string()),
            Object::Str("derived".to_string()),
        ])
    );
}

#[test]
fn staticmethod_takes_no_receiver() {
    let source = "\
class M:
    @staticmethod
    def add(a, b):
        return a + b
(M.add(1, 2), M().add(3, 4))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(3), Object::Int(7)])
    );
}

#[test]
fn bound_method_remembers_its_receiver() {
    let source = "\
class C:
    def __init__(self, tag):
        self.tag = tag
    def get(self):
        return self.tag
m = C('a').get
m()
";
    assert_eq!(run_value(source), Object::Str("a".to_string()));
}

#[test]
fn getattr_fallback_fires_after_full_search() {
    let source = "\
class Proxy:
    def __init__(self):
        self.real = 5
    def __getattr__(self, name):
        return 'missing:' + name
p = Proxy()
(p.real, p.whatever)
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![
            Object::Int(5),
            Object::Str("missing:whatever".to_string())
        ])
    );
}

#[test]
fn setattr_hook_intercepts_assignment() {
    let source = "\
class Logged:
    def __setattr__(self, name, value):
        pass
obj = Logged()
obj.x = 1
hasattr(obj, 'x')
";
    assert_eq!(run_value(source), Object::Bool(false));
}

#[test]
fn dunder_call_makes_instances_callable() {
    let source = "\
class Doubler:
    def __call__(self, x):
        return x * 2
Doubler()(21)
";
    assert_eq!(run_value(source), Object::Int(42));
}

#[test]
fn class_attributes_shared_until_shadowed() {
    let source = "\
class C:
    count = 0
a = C()
b = C()
C.count = 5
shadow = a.count
a.count = 10
(shadow, a.count, b.count)
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(5), Object::Int(10), Object::Int(5)])
    );
}

#[test]
fn isinstance_and_issubclass_over_user_classes() {
    let source = "\
class A: pass
class B(A): pass
b = B()
(isinstance(b, B), isinstance(b, A), isinstance(A(), B), issubclass(B, A), issubclass(A, B))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![
            Object::Bool(true),
            Object::Bool(true),
            Object::Bool(false),
            Object::Bool(true),
            Object::Bool(false),
        ])
    );
}

#[test]
fn class_decorator_applies() {
    let source = "\
def tag(cls):
    cls.tagged = True
    return cls
@tag
class C: pass
C.tagged
";
    assert_eq!(run_value(source), Object::Bool(true));
}

#[test]
fn repr_and_str_dunders() {
    let source = "\
class P:
    def __init__(self, x):
        self.x = x
    def __repr__(self):
        return 'P(' + str(self.x) + ')'
(repr(P(1)), str(P(2)), repr([P(3)]))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![
            Object::Str("P(1)".to_string()),
            Object::Str("P(2)".to_string()),
            Object::Str("[P(3)]".to_string()),
        ])
    );
}

#[test]
fn two_argument_super() {
    let source = "\
class A:
    def f(self): return 'A'
class B(A):
    def f(self): return 'B'
b = B()
super(B, b).f()
";
    assert_eq!(run_value(source), Object::Str("A".to_string()));
}
