//! Abstract syntax tree produced by the parser.
//!
//! A uniform tagged-union design: every statement and expression node carries
//! the `CodeLoc` it started at, so runtime errors can point back into the
//! source. Function and lambda definitions are reference-counted because
//! function objects created at runtime keep their body alive independently of
//! the module tree.

use std::rc::Rc;

use num_bigint::BigInt;

use crate::token::CodeLoc;

/// A parsed module: the top-level statement list.
#[derive(Debug, Clone)]
pub(crate) struct Module {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone)]
pub(crate) struct Stmt {
    pub kind: StmtKind,
    pub loc: CodeLoc,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: CodeLoc) -> Self {
        Self { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum StmtKind {
    Expr(Expr),
    /// `a = b = c = value` keeps the target chain in source order.
    Assign {
        targets: Vec<Expr>,
        value: Expr,
    },
    AugAssign {
        target: Expr,
        op: BinOp,
        value: Expr,
    },
    /// `x: int = 5`. The annotation is evaluated for effect only.
    AnnAssign {
        target: Expr,
        annotation: Expr,
        value: Option<Expr>,
    },
    Delete(Vec<Expr>),
    Pass,
    Break,
    Continue,
    Return(Option<Expr>),
    Raise {
        exc: Option<Expr>,
        cause: Option<Expr>,
    },
    Global(Vec<String>),
    Nonlocal(Vec<String>),
    /// `import`/`from … import …` parse but bind nothing: imports are stubs.
    Import,
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    While {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
    },
    For {
        target: Expr,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        is_async: bool,
    },
    Try {
        body: Vec<Stmt>,
        handlers: Vec<ExceptHandler>,
        orelse: Vec<Stmt>,
        finalbody: Vec<Stmt>,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        is_async: bool,
    },
    Match {
        subject: Expr,
        cases: Vec<MatchCase>,
    },
    FunctionDef(Rc<FunctionDef>),
    ClassDef {
        name: String,
        bases: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
        body: Vec<Stmt>,
        decorators: Vec<Expr>,
    },
    Assert {
        test: Expr,
        msg: Option<Expr>,
    },
}

/// A `def` statement. Shared with the function object created at runtime.
#[derive(Debug)]
pub(crate) struct FunctionDef {
    pub name: String,
    pub params: Params,
    pub body: Vec<Stmt>,
    pub decorators: Vec<Expr>,
    pub returns: Option<Expr>,
    pub is_async: bool,
    /// Set when the body contains `yield`/`yield from` at this function's
    /// own level (nested functions do not count).
    pub is_generator: bool,
}

/// Parameter spec: positional-or-keyword entries, then `*args`, then
/// keyword-only entries, then `**kwargs`.
#[derive(Debug, Clone, Default)]
pub(crate) struct Params {
    pub args: Vec<Param>,
    pub vararg: Option<String>,
    pub kwonly: Vec<Param>,
    pub kwarg: Option<String>,
}

impl Params {
    /// Every parameter name in declaration order (for the locals pre-pass).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.vararg.as_deref())
            .chain(self.kwonly.iter().map(|p| p.name.as_str()))
            .chain(self.kwarg.as_deref())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Param {
    pub name: String,
    pub default: Option<Expr>,
    pub annotation: Option<Expr>,
}

#[derive(Debug, Clone)]
pub(crate) struct ExceptHandler {
    /// `None` for a bare `except:`.
    pub filter: Option<Expr>,
    /// The `as name` binding, if present.
    pub name: Option<String>,
    pub body: Vec<Stmt>,
    pub loc: CodeLoc,
}

#[derive(Debug, Clone)]
pub(crate) struct WithItem {
    pub context: Expr,
    pub target: Option<Expr>,
}

#[derive(Debug, Clone)]
pub(crate) struct MatchCase {
    pub pattern: Pattern,
    pub guard: Option<Expr>,
    pub body: Vec<Stmt>,
}

/// The pattern subset accepted by `match`.
#[derive(Debug, Clone)]
pub(crate) enum Pattern {
    /// A literal constant compared by equality.
    Literal(Expr),
    /// `case _:`
    Wildcard,
    /// `case name:` — matches anything and binds it.
    Capture(String),
    /// A dotted name compared by equality (`case Color.RED:`).
    Value(Expr),
    /// `case a | b | c:`
    Or(Vec<Pattern>),
    /// `case [a, b]:` / `case (a, b):` — fixed-length sequence match.
    Sequence(Vec<Pattern>),
}

#[derive(Debug, Clone)]
pub(crate) struct Expr {
    pub kind: ExprKind,
    pub loc: CodeLoc,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: CodeLoc) -> Self {
        Self { kind, loc }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ExprKind {
    Int(i64),
    LongInt(Rc<BigInt>),
    Float(f64),
    /// Imaginary literal. Evaluating one raises `TypeError`; parsing keeps
    /// the source surface complete.
    Imaginary(f64),
    Str(Rc<str>),
    Bytes(Rc<[u8]>),
    FString(Vec<FStringElem>),
    Bool(bool),
    None,
    Name(String),
    Tuple(Vec<Expr>),
    List(Vec<Expr>),
    /// `keys[i]` of `None` marks a `**mapping` spread at that position.
    Dict {
        keys: Vec<Option<Expr>>,
        values: Vec<Expr>,
    },
    Set(Vec<Expr>),
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// Short-circuit `and`/`or` over two or more operands.
    BoolOp {
        op: BoolOpKind,
        values: Vec<Expr>,
    },
    /// `a < b <= c`: left operand plus an (op, rhs) list.
    Compare {
        left: Box<Expr>,
        ops: Vec<CmpOp>,
        comparators: Vec<Expr>,
    },
    IfExp {
        test: Box<Expr>,
        body: Box<Expr>,
        orelse: Box<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<CallArg>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        lower: Option<Box<Expr>>,
        upper: Option<Box<Expr>>,
        step: Option<Box<Expr>>,
    },
    Lambda(Rc<LambdaDef>),
    ListComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    SetComp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    DictComp {
        key: Box<Expr>,
        value: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    /// Generator expressions are collected eagerly, like generators (§ eager
    /// buffering); the node is still distinct so `list(…)`, `sum(…)` and
    /// friends accept them.
    GeneratorExp {
        elt: Box<Expr>,
        generators: Vec<Comprehension>,
    },
    Await(Box<Expr>),
    Yield(Option<Box<Expr>>),
    YieldFrom(Box<Expr>),
    Starred(Box<Expr>),
    /// `(x := value)`
    Named {
        target: String,
        value: Box<Expr>,
    },
}

#[derive(Debug)]
pub(crate) struct LambdaDef {
    pub params: Params,
    pub body: Expr,
}

/// One `for TARGET in ITER (if COND)*` clause of a comprehension.
#[derive(Debug, Clone)]
pub(crate) struct Comprehension {
    pub target: Expr,
    pub iter: Expr,
    pub ifs: Vec<Expr>,
    pub is_async: bool,
}

/// One argument at a call site, in source order.
#[derive(Debug, Clone)]
pub(crate) enum CallArg {
    Positional(Expr),
    /// `*iterable`
    Starred(Expr),
    Keyword(String, Expr),
    /// `**mapping`
    DoubleStarred(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    FloorDiv,
    Mod,
    MatMult,
    Pow,
    LShift,
    RShift,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinOp {
    /// The operator's source spelling, used in `TypeError` messages.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mult => "*",
            Self::Div => "/",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::MatMult => "@",
            Self::Pow => "**",
            Self::LShift => "<<",
            Self::RShift => ">>",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
        }
    }

    /// Forward dunder method name (`__add__`, …).
    pub fn dunder(self) -> &'static str {
        match self {
            Self::Add => "__add__",
            Self::Sub => "__sub__",
            Self::Mult => "__mul__",
            Self::Div => "__truediv__",
            Self::FloorDiv => "__floordiv__",
            Self::Mod => "__mod__",
            Self::MatMult => "__matmul__",
            Self::Pow => "__pow__",
            Self::LShift => "__lshift__",
            Self::RShift => "__rshift__",
            Self::BitAnd => "__and__",
            Self::BitOr => "__or__",
            Self::BitXor => "__xor__",
        }
    }

    /// Reflected dunder method name (`__radd__`, …).
    pub fn reflected_dunder(self) -> &'static str {
        match self {
            Self::Add => "__radd__",
            Self::Sub => "__rsub__",
            Self::Mult => "__rmul__",
            Self::Div => "__rtruediv__",
            Self::FloorDiv => "__rfloordiv__",
            Self::Mod => "__rmod__",
            Self::MatMult => "__rmatmul__",
            Self::Pow => "__rpow__",
            Self::LShift => "__rlshift__",
            Self::RShift => "__rrshift__",
            Self::BitAnd => "__rand__",
            Self::BitOr => "__ror__",
            Self::BitXor => "__rxor__",
        }
    }

    /// In-place dunder method name (`__iadd__`, …).
    pub fn inplace_dunder(self) -> &'static str {
        match self {
            Self::Add => "__iadd__",
            Self::Sub => "__isub__",
            Self::Mult => "__imul__",
            Self::Div => "__itruediv__",
            Self::FloorDiv => "__ifloordiv__",
            Self::Mod => "__imod__",
            Self::MatMult => "__imatmul__",
            Self::Pow => "__ipow__",
            Self::LShift => "__ilshift__",
            Self::RShift => "__irshift__",
            Self::BitAnd => "__iand__",
            Self::BitOr => "__ior__",
            Self::BitXor => "__ixor__",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
    Neg,
    Pos,
    Invert,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOpKind {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Lt,
    Gt,
    LtE,
    GtE,
    Eq,
    NotEq,
    In,
    NotIn,
    Is,
    IsNot,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Gt => ">",
            Self::LtE => "<=",
            Self::GtE => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::In => "in",
            Self::NotIn => "not in",
            Self::Is => "is",
            Self::IsNot => "is not",
        }
    }
}

/// One piece of an f-string after parsing.
#[derive(Debug, Clone)]
pub(crate) enum FStringElem {
    Literal(Rc<str>),
    Expr {
        expr: Box<Expr>,
        /// `!s`, `!r` or `!a` conversion flag.
        conversion: Option<char>,
        /// Raw format spec text after `:`, if any.
        spec: Option<String>,
    },
}
