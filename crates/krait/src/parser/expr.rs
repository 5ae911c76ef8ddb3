//! Expression parsing: the precedence ladder, primary forms, displays,
//! comprehensions, call arguments, and f-string replacement fields.
//!
//! Ladder, lowest to highest binding:
//! named-expression → ternary → `or` → `and` → `not` → comparison chain →
//! `|` → `^` → `&` → shift → additive → multiplicative → unary → power
//! (right-associative) → `await` → postfix (call/subscript/attribute) →
//! primary.

use std::rc::Rc;

use crate::{
    ast::{
        BinOp, BoolOpKind, CallArg, CmpOp, Comprehension, Expr, ExprKind, FStringElem, LambdaDef,
        UnaryOp,
    },
    lexer,
    token::{CodeLoc, FStringPart, TokenKind},
};

use super::{ParseError, ParseResult, Parser};

/// Maps an augmented-assignment token to its binary operator.
pub(super) fn augmented_op(kind: &TokenKind) -> Option<BinOp> {
    let op = match kind {
        TokenKind::PlusEqual => BinOp::Add,
        TokenKind::MinusEqual => BinOp::Sub,
        TokenKind::StarEqual => BinOp::Mult,
        TokenKind::SlashEqual => BinOp::Div,
        TokenKind::DoubleSlashEqual => BinOp::FloorDiv,
        TokenKind::PercentEqual => BinOp::Mod,
        TokenKind::AtEqual => BinOp::MatMult,
        TokenKind::DoubleStarEqual => BinOp::Pow,
        TokenKind::LeftShiftEqual => BinOp::LShift,
        TokenKind::RightShiftEqual => BinOp::RShift,
        TokenKind::AmperEqual => BinOp::BitAnd,
        TokenKind::VBarEqual => BinOp::BitOr,
        TokenKind::CaretEqual => BinOp::BitXor,
        _ => return None,
    };
    Some(op)
}

/// Whether a token can begin an expression. Used to decide if a trailing
/// comma ends a tuple display.
fn starts_expression(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Int(_)
            | TokenKind::LongInt(_)
            | TokenKind::Float(_)
            | TokenKind::Imaginary(_)
            | TokenKind::Str(_)
            | TokenKind::Bytes(_)
            | TokenKind::FString(_)
            | TokenKind::Name(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None
            | TokenKind::Not
            | TokenKind::Lambda
            | TokenKind::Await
            | TokenKind::Yield
            | TokenKind::Lpar
            | TokenKind::Lsqb
            | TokenKind::Lbrace
            | TokenKind::Minus
            | TokenKind::Plus
            | TokenKind::Tilde
            | TokenKind::Star
    )
}

impl Parser {
    /// Expression with optional top-level commas: `a`, or `a, b, c` as a
    /// tuple. Starred elements are allowed.
    pub(super) fn parse_testlist(&mut self) -> ParseResult<Expr> {
        self.parse_testlist_star()
    }

    pub(super) fn parse_testlist_star(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let first = self.parse_star_or_named()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if !starts_expression(self.peek()) {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), loc))
    }

    fn parse_star_or_named(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Star) {
            let loc = self.loc();
            self.advance();
            let inner = self.parse_or()?;
            return Ok(Expr::new(ExprKind::Starred(Box::new(inner)), loc));
        }
        self.parse_namedexpr()
    }

    /// `name := value`, or the ternary level below it.
    pub(super) fn parse_namedexpr(&mut self) -> ParseResult<Expr> {
        if let TokenKind::Name(name) = self.peek()
            && matches!(self.peek_at(1), TokenKind::ColonEqual)
        {
            let target = name.clone();
            let loc = self.loc();
            self.advance();
            self.advance();
            let value = self.parse_ternary()?;
            return Ok(Expr::new(
                ExprKind::Named {
                    target,
                    value: Box::new(value),
                },
                loc,
            ));
        }
        self.parse_ternary()
    }

    /// `body if test else orelse` (right-associative in the else branch).
    pub(super) fn parse_ternary(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let body = self.parse_or()?;
        if !self.eat(&TokenKind::If) {
            return Ok(body);
        }
        let test = self.parse_or()?;
        self.expect(&TokenKind::Else, "in conditional expression")?;
        let orelse = self.parse_ternary()?;
        Ok(Expr::new(
            ExprKind::IfExp {
                test: Box::new(test),
                body: Box::new(body),
                orelse: Box::new(orelse),
            },
            loc,
        ))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let first = self.parse_and()?;
        if !self.check(&TokenKind::Or) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::Or) {
            values.push(self.parse_and()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOpKind::Or,
                values,
            },
            loc,
        ))
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let first = self.parse_not()?;
        if !self.check(&TokenKind::And) {
            return Ok(first);
        }
        let mut values = vec![first];
        while self.eat(&TokenKind::And) {
            values.push(self.parse_not()?);
        }
        Ok(Expr::new(
            ExprKind::BoolOp {
                op: BoolOpKind::And,
                values,
            },
            loc,
        ))
    }

    fn parse_not(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Not) {
            let loc = self.loc();
            self.advance();
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                loc,
            ));
        }
        self.parse_comparison()
    }

    /// Comparison chain: left operand plus an (op, rhs) list, so
    /// `a < b <= c` can short-circuit without re-evaluating `b`.
    fn parse_comparison(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let left = self.parse_bitor()?;
        let mut ops = Vec::new();
        let mut comparators = Vec::new();
        loop {
            let op = match self.peek() {
                TokenKind::Less => CmpOp::Lt,
                TokenKind::Greater => CmpOp::Gt,
                TokenKind::LessEqual => CmpOp::LtE,
                TokenKind::GreaterEqual => CmpOp::GtE,
                TokenKind::EqEqual => CmpOp::Eq,
                TokenKind::NotEqual => CmpOp::NotEq,
                TokenKind::In => CmpOp::In,
                TokenKind::Not if matches!(self.peek_at(1), TokenKind::In) => {
                    self.advance();
                    CmpOp::NotIn
                }
                TokenKind::Is => {
                    if matches!(self.peek_at(1), TokenKind::Not) {
                        self.advance();
                        CmpOp::IsNot
                    } else {
                        CmpOp::Is
                    }
                }
                _ => break,
            };
            self.advance();
            ops.push(op);
            comparators.push(self.parse_bitor()?);
        }
        if ops.is_empty() {
            return Ok(left);
        }
        Ok(Expr::new(
            ExprKind::Compare {
                left: Box::new(left),
                ops,
                comparators,
            },
            loc,
        ))
    }

    fn parse_bitor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitxor()?;
        while self.check(&TokenKind::VBar) {
            let loc = self.loc();
            self.advance();
            let right = self.parse_bitxor()?;
            left = binary(BinOp::BitOr, left, right, loc);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bitand()?;
        while self.check(&TokenKind::Caret) {
            let loc = self.loc();
            self.advance();
            let right = self.parse_bitand()?;
            left = binary(BinOp::BitXor, left, right, loc);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;
        while self.check(&TokenKind::Amper) {
            let loc = self.loc();
            self.advance();
            let right = self.parse_shift()?;
            left = binary(BinOp::BitAnd, left, right, loc);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                TokenKind::LeftShift => BinOp::LShift,
                TokenKind::RightShift => BinOp::RShift,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right, loc);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, loc);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mult,
                TokenKind::Slash => BinOp::Div,
                TokenKind::DoubleSlash => BinOp::FloorDiv,
                TokenKind::Percent => BinOp::Mod,
                TokenKind::At => BinOp::MatMult,
                _ => break,
            };
            let loc = self.loc();
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right, loc);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let op = match self.peek() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            TokenKind::Tilde => UnaryOp::Invert,
            _ => return self.parse_power(),
        };
        let loc = self.loc();
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            loc,
        ))
    }

    /// `**` is right-associative and its right operand re-admits unary
    /// prefixes: `2 ** -1` parses.
    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_await_expr()?;
        if self.check(&TokenKind::DoubleStar) {
            let loc = self.loc();
            self.advance();
            let exponent = self.parse_unary()?;
            return Ok(binary(BinOp::Pow, base, exponent, loc));
        }
        Ok(base)
    }

    fn parse_await_expr(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Await) {
            let loc = self.loc();
            self.advance();
            let operand = self.parse_await_expr()?;
            return Ok(Expr::new(ExprKind::Await(Box::new(operand)), loc));
        }
        self.parse_postfix()
    }

    /// Postfix trailers: calls, subscripts, attribute access.
    pub(super) fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                TokenKind::Lpar => {
                    let loc = self.loc();
                    self.advance();
                    let args = self.parse_call_args()?;
                    expr = Expr::new(
                        ExprKind::Call {
                            func: Box::new(expr),
                            args,
                        },
                        loc,
                    );
                }
                TokenKind::Lsqb => {
                    let loc = self.loc();
                    self.advance();
                    let index = self.parse_subscript()?;
                    self.expect(&TokenKind::Rsqb, "to close the subscript")?;
                    expr = Expr::new(
                        ExprKind::Subscript {
                            value: Box::new(expr),
                            index: Box::new(index),
                        },
                        loc,
                    );
                }
                TokenKind::Dot => {
                    let loc = self.loc();
                    self.advance();
                    let attr = self.expect_name("after '.'")?;
                    expr = Expr::new(
                        ExprKind::Attribute {
                            value: Box::new(expr),
                            attr,
                        },
                        loc,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// One subscript: a plain index, a slice, or a comma-separated tuple of
    /// either.
    fn parse_subscript(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let first = self.parse_slice_item()?;
        if !self.check(&TokenKind::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Rsqb) {
                break;
            }
            items.push(self.parse_slice_item()?);
        }
        Ok(Expr::new(ExprKind::Tuple(items), loc))
    }

    fn parse_slice_item(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let lower = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(self.parse_namedexpr()?)
        };
        if !self.eat(&TokenKind::Colon) {
            return lower.ok_or_else(|| self.error("expected an index or slice"));
        }
        let upper = if matches!(self.peek(), TokenKind::Colon | TokenKind::Rsqb | TokenKind::Comma) {
            None
        } else {
            Some(self.parse_ternary()?)
        };
        let step = if self.eat(&TokenKind::Colon) {
            if matches!(self.peek(), TokenKind::Rsqb | TokenKind::Comma) {
                None
            } else {
                Some(self.parse_ternary()?)
            }
        } else {
            None
        };
        Ok(Expr::new(
            ExprKind::Slice {
                lower: lower.map(Box::new),
                upper: upper.map(Box::new),
                step: step.map(Box::new),
            },
            loc,
        ))
    }

    /// Call arguments: positionals first, then keywords; `*iter` and
    /// `**mapping` markers; a bare genexp as the sole argument.
    fn parse_call_args(&mut self) -> ParseResult<Vec<CallArg>> {
        let mut args = Vec::new();
        let mut seen_keyword = false;
        while !self.check(&TokenKind::Rpar) {
            if self.eat(&TokenKind::DoubleStar) {
                seen_keyword = true;
                args.push(CallArg::DoubleStarred(self.parse_ternary()?));
            } else if self.eat(&TokenKind::Star) {
                if seen_keyword {
                    return Err(self.error("iterable argument unpacking follows keyword argument"));
                }
                args.push(CallArg::Starred(self.parse_ternary()?));
            } else if let TokenKind::Name(name) = self.peek()
                && matches!(self.peek_at(1), TokenKind::Equal)
            {
                let name = name.clone();
                self.advance();
                self.advance();
                seen_keyword = true;
                args.push(CallArg::Keyword(name, self.parse_ternary()?));
            } else {
                if seen_keyword {
                    return Err(self.error("positional argument follows keyword argument"));
                }
                let expr = self.parse_namedexpr()?;
                if args.is_empty() && self.check(&TokenKind::For) {
                    // `f(x for x in xs)` — a generator expression argument.
                    let generators = self.parse_comp_clauses()?;
                    let loc = expr.loc;
                    args.push(CallArg::Positional(Expr::new(
                        ExprKind::GeneratorExp {
                            elt: Box::new(expr),
                            generators,
                        },
                        loc,
                    )));
                    break;
                }
                args.push(CallArg::Positional(expr));
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Rpar, "to close the call")?;
        Ok(args)
    }

    // --- targets ---

    /// Comma-separated assignment targets (`for x, y in …`).
    pub(super) fn parse_target_list(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        let first = self.parse_target_atom()?;
        if !self.check(&TokenKind::Comma) {
            self.check_target(&first)?;
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if !starts_expression(self.peek()) {
                break;
            }
            items.push(self.parse_target_atom()?);
        }
        let tuple = Expr::new(ExprKind::Tuple(items), loc);
        self.check_target(&tuple)?;
        Ok(tuple)
    }

    /// One assignment target: name with trailers, starred target, or a
    /// parenthesized/bracketed target list.
    pub(super) fn parse_target_atom(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Star) {
            let loc = self.loc();
            self.advance();
            let inner = self.parse_target_atom()?;
            return Ok(Expr::new(ExprKind::Starred(Box::new(inner)), loc));
        }
        self.parse_postfix()
    }

    // --- primaries ---

    fn parse_atom(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        match self.peek().clone() {
            TokenKind::Int(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(value), loc))
            }
            TokenKind::LongInt(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::LongInt(Rc::new(value)), loc))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(value), loc))
            }
            TokenKind::Imaginary(value) => {
                self.advance();
                Ok(Expr::new(ExprKind::Imaginary(value), loc))
            }
            TokenKind::Str(first) => {
                self.advance();
                // Adjacent string literals concatenate.
                let mut text = first;
                while let TokenKind::Str(next) = self.peek() {
                    text.push_str(next);
                    self.advance();
                }
                Ok(Expr::new(ExprKind::Str(Rc::from(text.as_str())), loc))
            }
            TokenKind::Bytes(first) => {
                self.advance();
                let mut bytes = first;
                while let TokenKind::Bytes(next) = self.peek() {
                    bytes.extend_from_slice(next);
                    self.advance();
                }
                Ok(Expr::new(ExprKind::Bytes(Rc::from(bytes.as_slice())), loc))
            }
            TokenKind::FString(parts) => {
                self.advance();
                let elems = self.parse_fstring_elems(&parts, loc)?;
                Ok(Expr::new(ExprKind::FString(elems), loc))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), loc))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), loc))
            }
            TokenKind::None => {
                self.advance();
                Ok(Expr::new(ExprKind::None, loc))
            }
            TokenKind::Name(name) => {
                self.advance();
                Ok(Expr::new(ExprKind::Name(name), loc))
            }
            TokenKind::Lambda => self.parse_lambda(),
            TokenKind::Yield => self.parse_yield(),
            TokenKind::Lpar => self.parse_paren(),
            TokenKind::Lsqb => self.parse_list_display(),
            TokenKind::Lbrace => self.parse_brace_display(),
            other => Err(self.error(format!("unexpected {}", other.describe()))),
        }
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.advance(); // `lambda`
        let params = self.parse_params(&TokenKind::Colon)?;
        self.expect(&TokenKind::Colon, "after lambda parameters")?;
        let body = self.parse_ternary()?;
        Ok(Expr::new(
            ExprKind::Lambda(Rc::new(LambdaDef { params, body })),
            loc,
        ))
    }

    fn parse_yield(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.advance(); // `yield`
        if self.eat(&TokenKind::From) {
            let value = self.parse_ternary()?;
            return Ok(Expr::new(ExprKind::YieldFrom(Box::new(value)), loc));
        }
        if starts_expression(self.peek()) {
            let value = self.parse_testlist()?;
            Ok(Expr::new(ExprKind::Yield(Some(Box::new(value))), loc))
        } else {
            Ok(Expr::new(ExprKind::Yield(None), loc))
        }
    }

    /// `(…)`: the empty tuple, a parenthesized expression, a tuple display,
    /// or a generator expression.
    fn parse_paren(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.advance(); // `(`
        if self.eat(&TokenKind::Rpar) {
            return Ok(Expr::new(ExprKind::Tuple(Vec::new()), loc));
        }
        let first = if self.check(&TokenKind::Yield) {
            self.parse_yield()?
        } else {
            self.parse_star_or_named()?
        };
        if self.check(&TokenKind::For) {
            let generators = self.parse_comp_clauses()?;
            self.expect(&TokenKind::Rpar, "to close the generator expression")?;
            return Ok(Expr::new(
                ExprKind::GeneratorExp {
                    elt: Box::new(first),
                    generators,
                },
                loc,
            ));
        }
        if self.check(&TokenKind::Comma) {
            let mut items = vec![first];
            while self.eat(&TokenKind::Comma) {
                if self.check(&TokenKind::Rpar) {
                    break;
                }
                items.push(self.parse_star_or_named()?);
            }
            self.expect(&TokenKind::Rpar, "to close the tuple")?;
            return Ok(Expr::new(ExprKind::Tuple(items), loc));
        }
        self.expect(&TokenKind::Rpar, "to close the parenthesis")?;
        Ok(first)
    }

    /// `[…]`: list display or list comprehension.
    fn parse_list_display(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.advance(); // `[`
        if self.eat(&TokenKind::Rsqb) {
            return Ok(Expr::new(ExprKind::List(Vec::new()), loc));
        }
        let first = self.parse_star_or_named()?;
        if self.check(&TokenKind::For) {
            let generators = self.parse_comp_clauses()?;
            self.expect(&TokenKind::Rsqb, "to close the list comprehension")?;
            return Ok(Expr::new(
                ExprKind::ListComp {
                    elt: Box::new(first),
                    generators,
                },
                loc,
            ));
        }
        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Rsqb) {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect(&TokenKind::Rsqb, "to close the list")?;
        Ok(Expr::new(ExprKind::List(items), loc))
    }

    /// `{…}`: dict or set display, dict/set comprehension, or `**` spread.
    /// The first `:` outside a nested expression disambiguates dict from set.
    fn parse_brace_display(&mut self) -> ParseResult<Expr> {
        let loc = self.loc();
        self.advance(); // `{`
        if self.eat(&TokenKind::Rbrace) {
            return Ok(Expr::new(
                ExprKind::Dict {
                    keys: Vec::new(),
                    values: Vec::new(),
                },
                loc,
            ));
        }

        if self.eat(&TokenKind::DoubleStar) {
            // Dict display opening with a spread entry.
            let spread = self.parse_or()?;
            return self.parse_dict_rest(loc, vec![None], vec![spread]);
        }

        let first = self.parse_star_or_named()?;
        if self.eat(&TokenKind::Colon) {
            let value = self.parse_ternary()?;
            if self.check(&TokenKind::For) {
                let generators = self.parse_comp_clauses()?;
                self.expect(&TokenKind::Rbrace, "to close the dict comprehension")?;
                return Ok(Expr::new(
                    ExprKind::DictComp {
                        key: Box::new(first),
                        value: Box::new(value),
                        generators,
                    },
                    loc,
                ));
            }
            return self.parse_dict_rest(loc, vec![Some(first)], vec![value]);
        }

        if self.check(&TokenKind::For) {
            let generators = self.parse_comp_clauses()?;
            self.expect(&TokenKind::Rbrace, "to close the set comprehension")?;
            return Ok(Expr::new(
                ExprKind::SetComp {
                    elt: Box::new(first),
                    generators,
                },
                loc,
            ));
        }

        let mut items = vec![first];
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Rbrace) {
                break;
            }
            items.push(self.parse_star_or_named()?);
        }
        self.expect(&TokenKind::Rbrace, "to close the set")?;
        Ok(Expr::new(ExprKind::Set(items), loc))
    }

    fn parse_dict_rest(
        &mut self,
        loc: CodeLoc,
        mut keys: Vec<Option<Expr>>,
        mut values: Vec<Expr>,
    ) -> ParseResult<Expr> {
        while self.eat(&TokenKind::Comma) {
            if self.check(&TokenKind::Rbrace) {
                break;
            }
            if self.eat(&TokenKind::DoubleStar) {
                keys.push(None);
                values.push(self.parse_or()?);
                continue;
            }
            let key = self.parse_ternary()?;
            self.expect(&TokenKind::Colon, "between dict key and value")?;
            let value = self.parse_ternary()?;
            keys.push(Some(key));
            values.push(value);
        }
        self.expect(&TokenKind::Rbrace, "to close the dict")?;
        Ok(Expr::new(ExprKind::Dict { keys, values }, loc))
    }

    /// One or more `for TARGET in ITER (if COND)*` clauses.
    fn parse_comp_clauses(&mut self) -> ParseResult<Vec<Comprehension>> {
        let mut generators = Vec::new();
        loop {
            let is_async = if self.check(&TokenKind::Async)
                && matches!(self.peek_at(1), TokenKind::For)
            {
                self.advance();
                true
            } else {
                false
            };
            if !self.eat(&TokenKind::For) {
                break;
            }
            let target = self.parse_target_list()?;
            self.expect(&TokenKind::In, "in comprehension")?;
            let iter = self.parse_or()?;
            let mut ifs = Vec::new();
            while self.eat(&TokenKind::If) {
                ifs.push(self.parse_or()?);
            }
            generators.push(Comprehension {
                target,
                iter,
                ifs,
                is_async,
            });
            if !self.check(&TokenKind::For)
                && !(self.check(&TokenKind::Async) && matches!(self.peek_at(1), TokenKind::For))
            {
                break;
            }
        }
        if generators.is_empty() {
            return Err(self.error("expected 'for' in comprehension"));
        }
        Ok(generators)
    }

    // --- f-strings ---

    /// Splits each captured replacement field into expression source,
    /// conversion flag, and format spec, then parses the expression source
    /// with a fresh sub-parser.
    fn parse_fstring_elems(
        &mut self,
        parts: &[FStringPart],
        loc: CodeLoc,
    ) -> ParseResult<Vec<FStringElem>> {
        let mut elems = Vec::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => {
                    elems.push(FStringElem::Literal(Rc::from(text.as_str())));
                }
                FStringPart::Expr(source) => {
                    let (expr_src, conversion, spec) = split_replacement_field(source);
                    if expr_src.trim().is_empty() {
                        return Err(ParseError::new(loc, "f-string: empty expression not allowed"));
                    }
                    let expr = parse_fragment(expr_src, loc)?;
                    elems.push(FStringElem::Expr {
                        expr: Box::new(expr),
                        conversion,
                        spec,
                    });
                }
            }
        }
        Ok(elems)
    }

    // --- pattern helpers ---

    /// A literal constant for `match` patterns: a number (optionally
    /// negated), string, bytes, bool, or `None`. Stops below `|`.
    pub(super) fn parse_literal_pattern_expr(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::Minus) {
            let loc = self.loc();
            self.advance();
            let operand = self.parse_literal_pattern_expr()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                },
                loc,
            ));
        }
        let loc = self.loc();
        let kind = match self.peek().clone() {
            TokenKind::Int(value) => ExprKind::Int(value),
            TokenKind::LongInt(value) => ExprKind::LongInt(Rc::new(value)),
            TokenKind::Float(value) => ExprKind::Float(value),
            TokenKind::Str(text) => ExprKind::Str(Rc::from(text.as_str())),
            TokenKind::Bytes(bytes) => ExprKind::Bytes(Rc::from(bytes.as_slice())),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::None => ExprKind::None,
            other => {
                return Err(self.error(format!("expected a literal pattern, found {}", other.describe())));
            }
        };
        self.advance();
        Ok(Expr::new(kind, loc))
    }
}

/// Parses a standalone expression fragment (an f-string replacement field).
fn parse_fragment(source: &str, loc: CodeLoc) -> ParseResult<Expr> {
    let tokens = lexer::tokenize(source)
        .map_err(|e| ParseError::new(loc, format!("f-string: {}", e.message)))?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_testlist()?;
    parser.eat(&TokenKind::Newline);
    if !parser.check(&TokenKind::Eof) {
        return Err(ParseError::new(
            loc,
            "f-string: unexpected text after expression".to_string(),
        ));
    }
    Ok(expr)
}

/// Splits `EXPR[!conv][:spec]` at the top nesting level.
///
/// Conversion is `!s`/`!r`/`!a` not followed by `=` (which would be `!=`);
/// the spec starts at the first top-level `:` that is not part of `:=`.
fn split_replacement_field(source: &str) -> (&str, Option<char>, Option<String>) {
    let chars: Vec<char> = source.chars().collect();
    let mut depth = 0u32;
    let mut in_string: Option<char> = None;
    let mut conv: Option<(usize, char)> = None;
    let mut spec_start: Option<usize> = None;

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(quote) = in_string {
            if c == quote {
                in_string = None;
            } else if c == '\\' {
                i += 1;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => in_string = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                if let Some(flag @ ('s' | 'r' | 'a')) = chars.get(i + 1).copied() {
                    let after = chars.get(i + 2);
                    if after.is_none() || after == Some(&':') {
                        conv = Some((i, flag));
                    }
                }
            }
            ':' if depth == 0 && chars.get(i + 1) != Some(&'=') => {
                spec_start = Some(i);
                break;
            }
            _ => {}
        }
        i += 1;
    }

    let expr_end = conv.map_or_else(|| spec_start.unwrap_or(chars.len()), |(idx, _)| idx);
    let expr_len: usize = chars[..expr_end].iter().map(|c| c.len_utf8()).sum();
    let spec = spec_start.map(|idx| chars[idx + 1..].iter().collect::<String>());
    (&source[..expr_len], conv.map(|(_, flag)| flag), spec)
}

fn binary(op: BinOp, left: Expr, right: Expr, loc: CodeLoc) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        loc,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Module, StmtKind};
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Module {
        super::super::parse(tokenize(source).unwrap()).unwrap()
    }

    fn parse_expr(source: &str) -> Expr {
        let module = parse_source(&format!("{source}\n"));
        match module.body.into_iter().next().unwrap().kind {
            StmtKind::Expr(e) => e,
            other => panic!("expected expression statement, got {other:?}"),
        }
    }

    #[test]
    fn precedence_mul_over_add() {
        let e = parse_expr("1 + 2 * 3");
        let ExprKind::Binary { op: BinOp::Add, right, .. } = e.kind else {
            panic!("expected addition at the top");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Mult, .. }));
    }

    #[test]
    fn power_is_right_associative() {
        let e = parse_expr("2 ** 3 ** 2");
        let ExprKind::Binary { op: BinOp::Pow, right, .. } = e.kind else {
            panic!("expected power");
        };
        assert!(matches!(right.kind, ExprKind::Binary { op: BinOp::Pow, .. }));
    }

    #[test]
    fn unary_binds_below_power() {
        // -2 ** 2 parses as -(2 ** 2)
        let e = parse_expr("-2 ** 2");
        assert!(matches!(e.kind, ExprKind::Unary { op: UnaryOp::Neg, .. }));
    }

    #[test]
    fn comparison_chain() {
        let e = parse_expr("1 < x <= 10");
        let ExprKind::Compare { ops, comparators, .. } = e.kind else {
            panic!("expected comparison");
        };
        assert_eq!(ops, vec![CmpOp::Lt, CmpOp::LtE]);
        assert_eq!(comparators.len(), 2);
    }

    #[test]
    fn not_in_and_is_not() {
        let e = parse_expr("a not in b");
        let ExprKind::Compare { ops, .. } = e.kind else {
            panic!();
        };
        assert_eq!(ops, vec![CmpOp::NotIn]);
        let e = parse_expr("a is not b");
        let ExprKind::Compare { ops, .. } = e.kind else {
            panic!();
        };
        assert_eq!(ops, vec![CmpOp::IsNot]);
    }

    #[test]
    fn ternary_and_boolop() {
        let e = parse_expr("a if b or c else d");
        let ExprKind::IfExp { test, .. } = e.kind else {
            panic!("expected conditional expression");
        };
        assert!(matches!(
            test.kind,
            ExprKind::BoolOp {
                op: BoolOpKind::Or,
                ..
            }
        ));
    }

    #[test]
    fn tuple_by_trailing_comma() {
        let e = parse_expr("1,");
        let ExprKind::Tuple(items) = e.kind else {
            panic!("expected tuple");
        };
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn dict_vs_set_disambiguation() {
        assert!(matches!(parse_expr("{1: 2}").kind, ExprKind::Dict { .. }));
        assert!(matches!(parse_expr("{1, 2}").kind, ExprKind::Set(_)));
        assert!(matches!(parse_expr("{}").kind, ExprKind::Dict { .. }));
        assert!(matches!(parse_expr("{**a, 1: 2}").kind, ExprKind::Dict { .. }));
    }

    #[test]
    fn comprehension_clauses() {
        let e = parse_expr("[x * y for x in a if x for y in b]");
        let ExprKind::ListComp { generators, .. } = e.kind else {
            panic!("expected list comprehension");
        };
        assert_eq!(generators.len(), 2);
        assert_eq!(generators[0].ifs.len(), 1);
    }

    #[test]
    fn genexp_as_sole_call_argument() {
        let e = parse_expr("sum(x * x for x in a)");
        let ExprKind::Call { args, .. } = e.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        assert!(matches!(
            args[0],
            CallArg::Positional(Expr {
                kind: ExprKind::GeneratorExp { .. },
                ..
            })
        ));
    }

    #[test]
    fn call_argument_forms() {
        let e = parse_expr("f(1, *a, b=2, **kw)");
        let ExprKind::Call { args, .. } = e.kind else {
            panic!("expected call");
        };
        assert!(matches!(args[0], CallArg::Positional(_)));
        assert!(matches!(args[1], CallArg::Starred(_)));
        assert!(matches!(args[2], CallArg::Keyword(_, _)));
        assert!(matches!(args[3], CallArg::DoubleStarred(_)));
    }

    #[test]
    fn positional_after_keyword_fails() {
        let tokens = tokenize("f(a=1, 2)\n").unwrap();
        let err = super::super::parse(tokens).unwrap_err();
        assert!(err.message.contains("positional argument follows keyword"));
    }

    #[test]
    fn slices() {
        let e = parse_expr("a[1:10:2]");
        let ExprKind::Subscript { index, .. } = e.kind else {
            panic!("expected subscript");
        };
        assert!(matches!(
            index.kind,
            ExprKind::Slice {
                lower: Some(_),
                upper: Some(_),
                step: Some(_)
            }
        ));
        let e = parse_expr("a[:]");
        let ExprKind::Subscript { index, .. } = e.kind else {
            panic!();
        };
        assert!(matches!(
            index.kind,
            ExprKind::Slice {
                lower: None,
                upper: None,
                step: None
            }
        ));
    }

    #[test]
    fn walrus() {
        let e = parse_expr("(n := 10)");
        assert!(matches!(e.kind, ExprKind::Named { .. }));
    }

    #[test]
    fn lambda_with_defaults() {
        let e = parse_expr("lambda a, b=2: a + b");
        let ExprKind::Lambda(def) = e.kind else {
            panic!("expected lambda");
        };
        assert_eq!(def.params.args.len(), 2);
        assert!(def.params.args[1].default.is_some());
    }

    #[test]
    fn adjacent_string_concatenation() {
        let e = parse_expr("'ab' 'cd'");
        let ExprKind::Str(s) = e.kind else {
            panic!("expected string");
        };
        assert_eq!(&*s, "abcd");
    }

    #[test]
    fn fstring_field_with_conversion_and_spec() {
        let e = parse_expr("f'{x!r:>8}'");
        let ExprKind::FString(elems) = e.kind else {
            panic!("expected f-string");
        };
        let FStringElem::Expr {
            conversion, spec, ..
        } = &elems[0]
        else {
            panic!("expected replacement field");
        };
        assert_eq!(*conversion, Some('r'));
        assert_eq!(spec.as_deref(), Some(">8"));
    }

    #[test]
    fn split_replacement_field_ignores_nested_colons() {
        let (expr, conv, spec) = split_replacement_field("d['a:b']");
        assert_eq!(expr, "d['a:b']");
        assert_eq!(conv, None);
        assert_eq!(spec, None);

        let (expr, conv, spec) = split_replacement_field("x[1:2]:>10");
        assert_eq!(expr, "x[1:2]");
        assert_eq!(conv, None);
        assert_eq!(spec.as_deref(), Some(">10"));
    }

    #[test]
    fn await_parses_inside_async_shapes() {
        let module = parse_source("async def f():\n    return await g()\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected def");
        };
        assert!(def.is_async);
    }

    #[test]
    fn yield_forms() {
        assert!(matches!(
            parse_expr("(yield)").kind,
            ExprKind::Yield(None)
        ));
        assert!(matches!(
            parse_expr("(yield 1)").kind,
            ExprKind::Yield(Some(_))
        ));
        assert!(matches!(
            parse_expr("(yield from xs)").kind,
            ExprKind::YieldFrom(_)
        ));
    }
}
