//! Producers: generators, iterator builtins, for/else, and the async
//! surface under `run_async`.

mod common;

use common::{assert_raises, run_output, run_value};
use krait::{CollectStringPrint, Interpreter, Object};

fn run_async_value(source: &str) -> Object {
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    futures::executor::block_on(interpreter.run_async_with(source, &mut print))
        .unwrap_or_else(|exc| panic!("unexpected exception: {exc}\nsource:\n{source}"))
}

#[test]
fn generator_values_replay_once() {
    let source = "\
def g():
    yield 1
    yield 2
gen = g()
a = next(gen)
b = next(gen)
(a, b)
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(1), Object::Int(2)])
    );
    assert_raises(
        "def g():\n    yield 1\ngen = g()\nnext(gen)\nnext(gen)\n",
        "StopIteration",
        "",
    );
}

#[test]
fn next_with_default_swallows_exhaustion() {
    let source = "\
def g():
    yield 1
gen = g()
(next(gen, 'd'), next(gen, 'd'))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![Object::Int(1), Object::Str("d".to_string())])
    );
}

#[test]
fn yield_from_flattens() {
    let source = "\
def inner():
    yield 1
    yield 2
def outer():
    yield 0
    yield from inner()
    yield from [3, 4]
list(outer())
";
    assert_eq!(
        run_value(source),
        Object::List((0..5).map(Object::Int).collect())
    );
}

#[test]
fn generator_exception_surfaces_after_buffered_values() {
    let output = run_output(
        "\
def g():
    yield 1
    yield 2
    raise ValueError('late')
gen = g()
print(next(gen))
print(next(gen))
try:
    next(gen)
except ValueError as e:
    print('caught', str(e))
",
    );
    assert_eq!(output, "1\n2\ncaught late\n");
}

#[test]
fn generator_send_and_close() {
    let source = "\
def g():
    yield 1
    yield 2
gen = g()
first = next(gen)
second = gen.send(None)
gen.close()
(first, second, next(gen, 'done'))
";
    assert_eq!(
        run_value(source),
        Object::Tuple(vec![
            Object::Int(1),
            Object::Int(2),
            Object::Str("done".to_string())
        ])
    );
}

#[test]
fn for_else_runs_without_break() {
    let output = run_output(
        "\
for i in range(3):
    pass
else:
    print('else1')
for i in range(3):
    if i == 1:
        break
else:
    print('else2')
while False:
    pass
else:
    print('else3')
",
    );
    assert_eq!(output, "else1\nelse3\n");
}

#[test]
fn loop_sees_mutation_through_live_iterator() {
    // Index-based iterators observe appends mid-loop, like Python's.
    let source = "\
xs = [1, 2]
total = 0
for x in xs:
    total += x
    if x == 1:
        xs.append(10)
total
";
    assert_eq!(run_value(source), Object::Int(13));
}

#[test]
fn enumerate_zip_map_filter() {
    assert_eq!(
        run_value("list(enumerate('ab', 1))"),
        Object::List(vec![
            Object::Tuple(vec![Object::Int(1), Object::Str("a".to_string())]),
            Object::Tuple(vec![Object::Int(2), Object::Str("b".to_string())]),
        ])
    );
    assert_eq!(
        run_value("list(zip([1, 2, 3], 'xy'))"),
        Object::List(vec![
            Object::Tuple(vec![Object::Int(1), Object::Str("x".to_string())]),
            Object::Tuple(vec![Object::Int(2), Object::Str("y".to_string())]),
        ])
    );
    assert_eq!(
        run_value("list(map(lambda a, b: a + b, [1, 2], [10, 20]))"),
        Object::List(vec![Object::Int(11), Object::Int(22)])
    );
    assert_eq!(
        run_value("list(filter(lambda x: x % 2, range(6)))"),
        Object::List(vec![Object::Int(1), Object::Int(3), Object::Int(5)])
    );
    assert_eq!(
        run_value("list(filter(None, [0, 1, '', 'a', [], [2]]))"),
        Object::List(vec![
            Object::Int(1),
            Object::Str("a".to_string()),
            Object::List(vec![Object::Int(2)])
        ])
    );
}

#[test]
fn user_iterator_protocol() {
    let source = "\
class Countdown:
    def __init__(self, n):
        self.n = n
    def __iter__(self):
        return self
    def __next__(self):
        if self.n <= 0:
            raise StopIteration
        self.n -= 1
        return self.n + 1
list(Countdown(3))
";
    assert_eq!(
        run_value(source),
        Object::List(vec![Object::Int(3), Object::Int(2), Object::Int(1)])
    );
}

#[test]
fn stop_iteration_terminates_only_the_loop() {
    // The for loop absorbs StopIteration; code after the loop still runs.
    let output = run_output(
        "\
class Once:
    def __iter__(self):
        return self
    def __next__(self):
        raise StopIteration
for x in Once():
    print('never')
print('after')
",
    );
    assert_eq!(output, "after\n");
}

#[test]
fn sorted_with_key_and_reverse() {
    assert_eq!(
        run_value("sorted([3, 1, 2])"),
        Object::List(vec![Object::Int(1), Object::Int(2), Object::Int(3)])
    );
    assert_eq!(
        run_value("sorted(['bb', 'a', 'ccc'], key=len)"),
        Object::List(vec![
            Object::Str("a".to_string()),
            Object::Str("bb".to_string()),
            Object::Str("ccc".to_string()),
        ])
    );
    assert_eq!(
        run_value("sorted([1, 3, 2], reverse=True)"),
        Object::List(vec![Object::Int(3), Object::Int(2), Object::Int(1)])
    );
    // Stability: equal keys keep source order.
    assert_eq!(
        run_value("[p[1] for p in sorted([(1, 'a'), (0, 'b'), (1, 'c')], key=lambda p: p[0])]"),
        Object::List(vec![
            Object::Str("b".to_string()),
            Object::Str("a".to_string()),
            Object::Str("c".to_string()),
        ])
    );
    assert_raises("sorted([1, 'a'])", "TypeError", "'<' not supported");
}

#[test]
fn min_max_surface() {
    assert_eq!(run_value("max([3, 1, 4])"), Object::Int(4));
    assert_eq!(run_value("min(3, 1, 4)"), Object::Int(1));
    assert_eq!(run_value("max([], default=-1)"), Object::Int(-1));
    assert_eq!(
        run_value("max(['bb', 'a'], key=len)"),
        Object::Str("bb".to_string())
    );
    assert_raises("min([])", "ValueError", "empty sequence");
}

#[test]
fn generator_expression_feeds_aggregates() {
    assert_eq!(run_value("sum(x * x for x in range(5))"), Object::Int(30));
    assert_eq!(run_value("all(x > 0 for x in [1, 2])"), Object::Bool(true));
    assert_eq!(run_value("any(x > 5 for x in [1, 2])"), Object::Bool(false));
    assert_eq!(
        run_value("list(x + 1 for x in range(3))"),
        Object::List(vec![Object::Int(1), Object::Int(2), Object::Int(3)])
    );
}

#[test]
fn dict_views_iterate_in_insertion_order() {
    assert_eq!(
        run_value("d = {'b': 1, 'a': 2}\nlist(d.keys())"),
        Object::List(vec![Object::Str("b".to_string()), Object::Str("a".to_string())])
    );
    assert_eq!(
        run_value("d = {'b': 1, 'a': 2}\n[v for v in d.values()]"),
        Object::List(vec![Object::Int(1), Object::Int(2)])
    );
    assert_eq!(
        run_value("d = {'x': 1}\n[(k, v) for k, v in d.items()]"),
        Object::List(vec![Object::Tuple(vec![
            Object::Str("x".to_string()),
            Object::Int(1)
        ])])
    );
}

// --- async ---

#[test]
fn top_level_await_requires_async_mode() {
    assert_raises(
        "async def f():\n    return 1\nawait f()\n",
        "SyntaxError",
        "'await' outside async function",
    );
}

#[test]
fn coroutines_resolve_under_run_async() {
    let source = "\
async def double(x):
    return x * 2
async def quadruple(x):
    once = await double(x)
    return await double(once)
await quadruple(10)
";
    assert_eq!(run_async_value(source), Object::Int(40));
}

#[test]
fn coroutines_are_single_shot() {
    let source = "\
async def f():
    return 1
c = f()
await c
await c
";
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    let err = futures::executor::block_on(interpreter.run_async_with(source, &mut print)).unwrap_err();
    assert_eq!(err.kind(), "RuntimeError");
    assert!(err.message().contains("already awaited"));
}

#[test]
fn async_generator_buffers_eagerly() {
    let source = "\
async def agen():
    yield 1
    yield 2
async def consume():
    total = 0
    async for x in agen():
        total += x
    return total
await consume()
";
    assert_eq!(run_async_value(source), Object::Int(3));
}

#[test]
fn async_with_uses_aenter_and_aexit() {
    let source = "\
class ACM:
    async def __aenter__(self):
        return 'resource'
    async def __aexit__(self, exc_type, exc, tb):
        return False
async def use():
    async with ACM() as r:
        return r
await use()
";
    assert_eq!(run_async_value(source), Object::Str("resource".to_string()));
}

#[test]
fn plain_with_rejects_async_only_manager() {
    let source = "\
class ACM:
    async def __aenter__(self):
        return 1
    async def __aexit__(self, exc_type, exc, tb):
        return False
with ACM():
    pass
";
    assert_raises(source, "TypeError", "context manager");
}

#[test]
fn await_non_awaitable_is_a_type_error() {
    let mut interpreter = Interpreter::new();
    let mut print = CollectStringPrint::new();
    let err = futures::executor::block_on(interpreter.run_async_with("await 42\n", &mut print)).unwrap_err();
    assert_eq!(err.kind(), "TypeError");
    assert!(err.message().contains("can't be used in 'await' expression"));
}
