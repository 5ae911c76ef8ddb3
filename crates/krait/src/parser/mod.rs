//! Recursive-descent parser.
//!
//! Statement dispatch lives here; the expression precedence ladder is in
//! [`expr`]. The parser consumes the token stream produced by the lexer and
//! never inspects whitespace itself — block structure arrives as
//! `Indent`/`Dedent` tokens.
//!
//! `elif` chains are desugared into nested `if` statements in the `orelse`
//! branch, and decorator lines are collected ahead of the `def`/`class` they
//! attach to. `match` is a soft keyword: a statement starting with the name
//! `match` is speculatively parsed as a match statement and rolled back to an
//! expression statement if the shape does not fit.

mod expr;

use std::rc::Rc;

use crate::{
    ast::{
        Expr, ExprKind, ExceptHandler, FunctionDef, MatchCase, Module, Param, Params, Pattern,
        Stmt, StmtKind, WithItem,
    },
    prepare,
    token::{CodeLoc, Token, TokenKind},
};

/// A parse error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub loc: CodeLoc,
    pub message: String,
}

impl ParseError {
    fn new(loc: CodeLoc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.loc)
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parses a token stream into a module AST.
pub(crate) fn parse(tokens: Vec<Token>) -> ParseResult<Module> {
    Parser::new(tokens).parse_module()
}

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    // --- token plumbing ---

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn loc(&self) -> CodeLoc {
        self.tokens[self.pos.min(self.tokens.len() - 1)].loc
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek() == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, context: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {} {}, found {}",
                kind.describe(),
                context,
                self.peek().describe()
            )))
        }
    }

    fn expect_name(&mut self, context: &str) -> ParseResult<String> {
        match self.peek() {
            TokenKind::Name(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            other => Err(self.error(format!("expected a name {context}, found {}", other.describe()))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.loc(), message)
    }

    fn snapshot(&self) -> usize {
        self.pos
    }

    fn rollback(&mut self, pos: usize) {
        self.pos = pos;
    }

    // --- module & blocks ---

    fn parse_module(&mut self) -> ParseResult<Module> {
        let mut body = Vec::new();
        while !self.check(&TokenKind::Eof) {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            self.parse_statement(&mut body)?;
        }
        Ok(Module { body })
    }

    /// Parses the suite after a `:`: either an indented block or simple
    /// statements on the same line (`if x: y = 1; z = 2`).
    fn parse_block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut body = Vec::new();
        if self.eat(&TokenKind::Newline) {
            self.expect(&TokenKind::Indent, "to start an indented block")?;
            while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::Eof) {
                if self.eat(&TokenKind::Newline) {
                    continue;
                }
                self.parse_statement(&mut body)?;
            }
            self.expect(&TokenKind::Dedent, "to end the block")?;
        } else {
            self.parse_simple_statement_line(&mut body)?;
        }
        if body.is_empty() {
            return Err(self.error("expected an indented block"));
        }
        Ok(body)
    }

    // --- statement dispatch ---

    fn parse_statement(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        match self.peek() {
            TokenKind::At => {
                let stmt = self.parse_decorated()?;
                out.push(stmt);
            }
            TokenKind::If => {
                let stmt = self.parse_if()?;
                out.push(stmt);
            }
            TokenKind::While => {
                let stmt = self.parse_while()?;
                out.push(stmt);
            }
            TokenKind::For => {
                let stmt = self.parse_for(false)?;
                out.push(stmt);
            }
            TokenKind::Try => {
                let stmt = self.parse_try()?;
                out.push(stmt);
            }
            TokenKind::With => {
                let stmt = self.parse_with(false)?;
                out.push(stmt);
            }
            TokenKind::Def => {
                let stmt = self.parse_function_def(Vec::new(), false)?;
                out.push(stmt);
            }
            TokenKind::Class => {
                let stmt = self.parse_class_def(Vec::new())?;
                out.push(stmt);
            }
            TokenKind::Async => {
                let stmt = self.parse_async()?;
                out.push(stmt);
            }
            TokenKind::Name(name) if name == "match" => {
                let checkpoint = self.snapshot();
                match self.try_parse_match() {
                    Ok(stmt) => out.push(stmt),
                    Err(_) => {
                        // Not a match statement after all; `match` was a name.
                        self.rollback(checkpoint);
                        self.parse_simple_statement_line(out)?;
                    }
                }
            }
            _ => self.parse_simple_statement_line(out)?,
        }
        Ok(())
    }

    /// Parses `;`-separated simple statements up to the terminating newline.
    fn parse_simple_statement_line(&mut self, out: &mut Vec<Stmt>) -> ParseResult<()> {
        loop {
            out.push(self.parse_simple_statement()?);
            if self.eat(&TokenKind::Semi) {
                if self.check(&TokenKind::Newline) || self.check(&TokenKind::Eof) {
                    break;
                }
                continue;
            }
            break;
        }
        if !self.eat(&TokenKind::Newline) && !self.check(&TokenKind::Eof) {
            return Err(self.error(format!(
                "unexpected {} after statement",
                self.peek().describe()
            )));
        }
        Ok(())
    }

    fn parse_simple_statement(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        let kind = match self.peek() {
            TokenKind::Pass => {
                self.advance();
                StmtKind::Pass
            }
            TokenKind::Break => {
                self.advance();
                StmtKind::Break
            }
            TokenKind::Continue => {
                self.advance();
                StmtKind::Continue
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(self.parse_testlist()?)
                };
                StmtKind::Return(value)
            }
            TokenKind::Raise => {
                self.advance();
                if self.at_statement_end() {
                    StmtKind::Raise { exc: None, cause: None }
                } else {
                    let exc = self.parse_ternary()?;
                    let cause = if self.eat(&TokenKind::From) {
                        Some(self.parse_ternary()?)
                    } else {
                        None
                    };
                    StmtKind::Raise {
                        exc: Some(exc),
                        cause,
                    }
                }
            }
            TokenKind::Global => {
                self.advance();
                StmtKind::Global(self.parse_name_list()?)
            }
            TokenKind::Nonlocal => {
                self.advance();
                StmtKind::Nonlocal(self.parse_name_list()?)
            }
            TokenKind::Import | TokenKind::From => {
                // Imports are stub no-ops: consume through the logical line.
                while !self.at_statement_end() {
                    self.advance();
                }
                StmtKind::Import
            }
            TokenKind::Del => {
                self.advance();
                let mut targets = vec![self.parse_ternary()?];
                while self.eat(&TokenKind::Comma) {
                    if self.at_statement_end() {
                        break;
                    }
                    targets.push(self.parse_ternary()?);
                }
                for target in &targets {
                    self.check_target(target)?;
                }
                StmtKind::Delete(targets)
            }
            TokenKind::Assert => {
                self.advance();
                let test = self.parse_ternary()?;
                let msg = if self.eat(&TokenKind::Comma) {
                    Some(self.parse_ternary()?)
                } else {
                    None
                };
                StmtKind::Assert { test, msg }
            }
            _ => return self.parse_expr_or_assignment(),
        };
        Ok(Stmt::new(kind, loc))
    }

    fn at_statement_end(&self) -> bool {
        matches!(self.peek(), TokenKind::Newline | TokenKind::Semi | TokenKind::Eof)
    }

    fn parse_name_list(&mut self) -> ParseResult<Vec<String>> {
        let mut names = vec![self.expect_name("in declaration")?];
        while self.eat(&TokenKind::Comma) {
            names.push(self.expect_name("in declaration")?);
        }
        Ok(names)
    }

    /// Expression statement, assignment chain, augmented assignment, or
    /// annotated assignment — distinguished after parsing the first
    /// starred-or-tuple expression, in that priority order.
    fn parse_expr_or_assignment(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        let first = self.parse_testlist_star()?;

        if self.check(&TokenKind::Equal) {
            let mut targets = vec![first];
            let mut value = None;
            while self.eat(&TokenKind::Equal) {
                let next = self.parse_testlist_star()?;
                if self.check(&TokenKind::Equal) {
                    targets.push(next);
                } else {
                    value = Some(next);
                }
            }
            for target in &targets {
                self.check_target(target)?;
            }
            return Ok(Stmt::new(
                StmtKind::Assign {
                    targets,
                    value: value.expect("loop always sets the final value"),
                },
                loc,
            ));
        }

        if let Some(op) = expr::augmented_op(self.peek()) {
            self.advance();
            self.check_single_target(&first)?;
            let value = self.parse_testlist()?;
            return Ok(Stmt::new(
                StmtKind::AugAssign {
                    target: first,
                    op,
                    value,
                },
                loc,
            ));
        }

        if self.eat(&TokenKind::Colon) {
            self.check_single_target(&first)?;
            let annotation = self.parse_ternary()?;
            let value = if self.eat(&TokenKind::Equal) {
                Some(self.parse_testlist_star()?)
            } else {
                None
            };
            return Ok(Stmt::new(
                StmtKind::AnnAssign {
                    target: first,
                    annotation,
                    value,
                },
                loc,
            ));
        }

        Ok(Stmt::new(StmtKind::Expr(first), loc))
    }

    /// Validates an assignment target form.
    fn check_target(&self, target: &Expr) -> ParseResult<()> {
        match &target.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
            ExprKind::Starred(inner) => self.check_target(inner),
            ExprKind::Tuple(items) | ExprKind::List(items) => {
                let mut starred = 0;
                for item in items {
                    self.check_target(item)?;
                    if matches!(item.kind, ExprKind::Starred(_)) {
                        starred += 1;
                    }
                }
                if starred > 1 {
                    Err(ParseError::new(
                        target.loc,
                        "multiple starred expressions in assignment",
                    ))
                } else {
                    Ok(())
                }
            }
            _ => Err(ParseError::new(target.loc, "cannot assign to expression")),
        }
    }

    fn check_single_target(&self, target: &Expr) -> ParseResult<()> {
        match &target.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => Ok(()),
            _ => Err(ParseError::new(
                target.loc,
                "illegal target for augmented or annotated assignment",
            )),
        }
    }

    // --- compound statements ---

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance(); // `if` / `elif`
        let test = self.parse_namedexpr()?;
        self.expect(&TokenKind::Colon, "after the condition")?;
        let body = self.parse_block()?;
        let orelse = if self.check(&TokenKind::Elif) {
            // `elif` desugars to a nested `if` in the else branch.
            vec![self.parse_if()?]
        } else if self.eat(&TokenKind::Else) {
            self.expect(&TokenKind::Colon, "after 'else'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::new(StmtKind::If { test, body, orelse }, loc))
    }

    fn parse_while(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance();
        let test = self.parse_namedexpr()?;
        self.expect(&TokenKind::Colon, "after the condition")?;
        let body = self.parse_block()?;
        let orelse = if self.eat(&TokenKind::Else) {
            self.expect(&TokenKind::Colon, "after 'else'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::new(StmtKind::While { test, body, orelse }, loc))
    }

    fn parse_for(&mut self, is_async: bool) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance();
        let target = self.parse_target_list()?;
        self.expect(&TokenKind::In, "in 'for' statement")?;
        let iter = self.parse_testlist()?;
        self.expect(&TokenKind::Colon, "after the 'for' iterable")?;
        let body = self.parse_block()?;
        let orelse = if self.eat(&TokenKind::Else) {
            self.expect(&TokenKind::Colon, "after 'else'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };
        Ok(Stmt::new(
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
                is_async,
            },
            loc,
        ))
    }

    fn parse_try(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance();
        self.expect(&TokenKind::Colon, "after 'try'")?;
        let body = self.parse_block()?;

        let mut handlers = Vec::new();
        while self.check(&TokenKind::Except) {
            let handler_loc = self.loc();
            self.advance();
            let (filter, name) = if self.check(&TokenKind::Colon) {
                (None, None)
            } else {
                let filter = self.parse_ternary()?;
                let name = if self.eat(&TokenKind::As) {
                    Some(self.expect_name("after 'as'")?)
                } else {
                    None
                };
                (Some(filter), name)
            };
            self.expect(&TokenKind::Colon, "after 'except'")?;
            let handler_body = self.parse_block()?;
            if filter.is_none() && self.check(&TokenKind::Except) {
                return Err(ParseError::new(handler_loc, "default 'except:' must be last"));
            }
            handlers.push(ExceptHandler {
                filter,
                name,
                body: handler_body,
                loc: handler_loc,
            });
        }

        let orelse = if self.eat(&TokenKind::Else) {
            self.expect(&TokenKind::Colon, "after 'else'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };
        let finalbody = if self.eat(&TokenKind::Finally) {
            self.expect(&TokenKind::Colon, "after 'finally'")?;
            self.parse_block()?
        } else {
            Vec::new()
        };

        if handlers.is_empty() && finalbody.is_empty() {
            return Err(ParseError::new(loc, "expected 'except' or 'finally' block"));
        }
        if !orelse.is_empty() && handlers.is_empty() {
            return Err(ParseError::new(loc, "'else' clause requires an 'except' clause"));
        }
        Ok(Stmt::new(
            StmtKind::Try {
                body,
                handlers,
                orelse,
                finalbody,
            },
            loc,
        ))
    }

    fn parse_with(&mut self, is_async: bool) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance();
        let mut items = Vec::new();
        loop {
            let context = self.parse_ternary()?;
            let target = if self.eat(&TokenKind::As) {
                let target = self.parse_target_atom()?;
                self.check_target(&target)?;
                Some(target)
            } else {
                None
            };
            items.push(WithItem { context, target });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Colon, "after 'with' items")?;
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::With {
                items,
                body,
                is_async,
            },
            loc,
        ))
    }

    fn parse_async(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance(); // `async`
        match self.peek() {
            TokenKind::Def => self.parse_function_def(Vec::new(), true),
            TokenKind::For => self.parse_for(true),
            TokenKind::With => self.parse_with(true),
            other => Err(ParseError::new(
                loc,
                format!("expected 'def', 'for' or 'with' after 'async', found {}", other.describe()),
            )),
        }
    }

    /// Collects `@decorator` lines, then parses the decorated definition.
    /// Decorators are recorded in source order; application order (reversed)
    /// is the evaluator's concern.
    fn parse_decorated(&mut self) -> ParseResult<Stmt> {
        let mut decorators = Vec::new();
        while self.eat(&TokenKind::At) {
            decorators.push(self.parse_namedexpr()?);
            self.expect(&TokenKind::Newline, "after decorator")?;
            while self.eat(&TokenKind::Newline) {}
        }
        match self.peek() {
            TokenKind::Def => self.parse_function_def(decorators, false),
            TokenKind::Class => self.parse_class_def(decorators),
            TokenKind::Async => {
                self.advance();
                if self.check(&TokenKind::Def) {
                    self.parse_function_def(decorators, true)
                } else {
                    Err(self.error("expected 'def' after 'async' in decorated statement"))
                }
            }
            other => Err(self.error(format!(
                "expected 'def' or 'class' after decorators, found {}",
                other.describe()
            ))),
        }
    }

    fn parse_function_def(&mut self, decorators: Vec<Expr>, is_async: bool) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance(); // `def`
        let name = self.expect_name("after 'def'")?;
        self.expect(&TokenKind::Lpar, "after the function name")?;
        let params = self.parse_params(&TokenKind::Rpar)?;
        self.expect(&TokenKind::Rpar, "after parameters")?;
        let returns = if self.eat(&TokenKind::Rarrow) {
            Some(self.parse_ternary()?)
        } else {
            None
        };
        self.expect(&TokenKind::Colon, "after the function signature")?;
        let body = self.parse_block()?;
        let is_generator = prepare::body_is_generator(&body);
        Ok(Stmt::new(
            StmtKind::FunctionDef(Rc::new(FunctionDef {
                name,
                params,
                body,
                decorators,
                returns,
                is_async,
                is_generator,
            })),
            loc,
        ))
    }

    fn parse_class_def(&mut self, decorators: Vec<Expr>) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance(); // `class`
        let name = self.expect_name("after 'class'")?;
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if self.eat(&TokenKind::Lpar) {
            while !self.check(&TokenKind::Rpar) {
                if let TokenKind::Name(kw) = self.peek()
                    && matches!(self.peek_at(1), TokenKind::Equal)
                {
                    let kw = kw.clone();
                    self.advance();
                    self.advance();
                    keywords.push((kw, self.parse_ternary()?));
                } else {
                    if !keywords.is_empty() {
                        return Err(self.error("positional base follows keyword argument"));
                    }
                    bases.push(self.parse_ternary()?);
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Rpar, "after class bases")?;
        }
        self.expect(&TokenKind::Colon, "after the class header")?;
        let body = self.parse_block()?;
        Ok(Stmt::new(
            StmtKind::ClassDef {
                name,
                bases,
                keywords,
                body,
                decorators,
            },
            loc,
        ))
    }

    // --- match statement (soft keyword) ---

    fn try_parse_match(&mut self) -> ParseResult<Stmt> {
        let loc = self.loc();
        self.advance(); // the `match` name
        let subject = self.parse_testlist()?;
        self.expect(&TokenKind::Colon, "after the match subject")?;
        self.expect(&TokenKind::Newline, "after the match header")?;
        self.expect(&TokenKind::Indent, "to start the case block")?;

        let mut cases = Vec::new();
        while !self.check(&TokenKind::Dedent) && !self.check(&TokenKind::Eof) {
            if self.eat(&TokenKind::Newline) {
                continue;
            }
            match self.peek() {
                TokenKind::Name(name) if name == "case" => {
                    self.advance();
                }
                other => {
                    return Err(self.error(format!("expected 'case', found {}", other.describe())));
                }
            }
            let pattern = self.parse_pattern()?;
            let guard = if self.eat(&TokenKind::If) {
                Some(self.parse_namedexpr()?)
            } else {
                None
            };
            self.expect(&TokenKind::Colon, "after the case pattern")?;
            let body = self.parse_block()?;
            cases.push(MatchCase {
                pattern,
                guard,
                body,
            });
        }
        self.expect(&TokenKind::Dedent, "to end the match block")?;
        if cases.is_empty() {
            return Err(ParseError::new(loc, "match statement must have at least one case"));
        }
        Ok(Stmt::new(StmtKind::Match { subject, cases }, loc))
    }

    fn parse_pattern(&mut self) -> ParseResult<Pattern> {
        let first = self.parse_pattern_atom()?;
        if !self.check(&TokenKind::VBar) {
            return Ok(first);
        }
        let mut alternatives = vec![first];
        while self.eat(&TokenKind::VBar) {
            alternatives.push(self.parse_pattern_atom()?);
        }
        Ok(Pattern::Or(alternatives))
    }

    fn parse_pattern_atom(&mut self) -> ParseResult<Pattern> {
        let loc = self.loc();
        match self.peek().clone() {
            TokenKind::Name(name) if name == "_" => {
                self.advance();
                Ok(Pattern::Wildcard)
            }
            TokenKind::Name(name) => {
                self.advance();
                if self.check(&TokenKind::Dot) {
                    // Dotted name: a value pattern compared by equality.
                    let mut value = Expr::new(ExprKind::Name(name), loc);
                    while self.eat(&TokenKind::Dot) {
                        let attr = self.expect_name("in value pattern")?;
                        value = Expr::new(
                            ExprKind::Attribute {
                                value: Box::new(value),
                                attr,
                            },
                            loc,
                        );
                    }
                    Ok(Pattern::Value(value))
                } else if self.check(&TokenKind::Lpar) {
                    Err(self.error("class patterns are not supported"))
                } else {
                    Ok(Pattern::Capture(name))
                }
            }
            TokenKind::Lsqb | TokenKind::Lpar => {
                let close = if matches!(self.peek(), TokenKind::Lsqb) {
                    TokenKind::Rsqb
                } else {
                    TokenKind::Rpar
                };
                self.advance();
                let mut items = Vec::new();
                while !self.check(&close) {
                    items.push(self.parse_pattern()?);
                    if !self.eat(&TokenKind::Comma) {
                        break;
                    }
                }
                self.expect(&close, "to close the sequence pattern")?;
                Ok(Pattern::Sequence(items))
            }
            TokenKind::Minus
            | TokenKind::Int(_)
            | TokenKind::LongInt(_)
            | TokenKind::Float(_)
            | TokenKind::Str(_)
            | TokenKind::Bytes(_)
            | TokenKind::True
            | TokenKind::False
            | TokenKind::None => {
                // Literal patterns stop below `|`, which separates alternatives.
                let literal = self.parse_literal_pattern_expr()?;
                Ok(Pattern::Literal(literal))
            }
            other => Err(self.error(format!("unsupported pattern starting with {}", other.describe()))),
        }
    }

    // --- parameter lists ---

    /// Parses a parameter list up to (not consuming) `end`.
    ///
    /// Accepted entry kinds, in order: positional-or-keyword (with optional
    /// annotation and default), `*args` or bare `*`, keyword-only entries,
    /// `**kwargs`.
    fn parse_params(&mut self, end: &TokenKind) -> ParseResult<Params> {
        let mut params = Params::default();
        let mut seen_star = false;
        let mut seen_default = false;

        while !self.check(end) {
            if self.eat(&TokenKind::DoubleStar) {
                params.kwarg = Some(self.expect_name("after '**'")?);
                // Optional annotation on **kwargs is parsed and dropped.
                if end == &TokenKind::Rpar && self.eat(&TokenKind::Colon) {
                    self.parse_ternary()?;
                }
                self.eat(&TokenKind::Comma);
                break;
            }
            if self.eat(&TokenKind::Star) {
                if seen_star {
                    return Err(self.error("only one '*' separator is allowed"));
                }
                seen_star = true;
                if let TokenKind::Name(_) = self.peek() {
                    params.vararg = Some(self.expect_name("after '*'")?);
                    if end == &TokenKind::Rpar && self.eat(&TokenKind::Colon) {
                        self.parse_ternary()?;
                    }
                }
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
                continue;
            }

            let name = self.expect_name("in parameter list")?;
            // Annotations only appear in `def` parameter lists, where the list
            // is parenthesized; a lambda's `:` terminates its parameters.
            let annotation = if end == &TokenKind::Rpar && self.eat(&TokenKind::Colon) {
                Some(self.parse_ternary()?)
            } else {
                None
            };
            let default = if self.eat(&TokenKind::Equal) {
                Some(self.parse_ternary()?)
            } else {
                None
            };

            if seen_star {
                params.kwonly.push(Param {
                    name,
                    default,
                    annotation,
                });
            } else {
                if default.is_some() {
                    seen_default = true;
                } else if seen_default {
                    return Err(self.error("parameter without a default follows parameter with a default"));
                }
                params.args.push(Param {
                    name,
                    default,
                    annotation,
                });
            }
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }

        let mut seen = ahash::AHashSet::new();
        for name in params.names() {
            if !seen.insert(name.to_string()) {
                return Err(self.error(format!("duplicate parameter '{name}'")));
            }
        }
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(source: &str) -> Module {
        parse(tokenize(source).unwrap()).unwrap()
    }

    fn parse_err(source: &str) -> ParseError {
        parse(tokenize(source).unwrap()).unwrap_err()
    }

    #[test]
    fn chained_assignment() {
        let module = parse_source("a = b = c = 1\n");
        let StmtKind::Assign { targets, .. } = &module.body[0].kind else {
            panic!("expected assignment");
        };
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn augmented_assignment() {
        let module = parse_source("x += 2\n");
        assert!(matches!(
            module.body[0].kind,
            StmtKind::AugAssign {
                op: crate::ast::BinOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn annotated_assignment() {
        let module = parse_source("x: int = 5\ny: str\n");
        assert!(matches!(module.body[0].kind, StmtKind::AnnAssign { value: Some(_), .. }));
        assert!(matches!(module.body[1].kind, StmtKind::AnnAssign { value: None, .. }));
    }

    #[test]
    fn elif_desugars_to_nested_if() {
        let module = parse_source("if a:\n    x = 1\nelif b:\n    x = 2\nelse:\n    x = 3\n");
        let StmtKind::If { orelse, .. } = &module.body[0].kind else {
            panic!("expected if");
        };
        assert_eq!(orelse.len(), 1);
        let StmtKind::If { orelse: inner_else, .. } = &orelse[0].kind else {
            panic!("expected nested if for elif");
        };
        assert_eq!(inner_else.len(), 1);
    }

    #[test]
    fn one_line_suite() {
        let module = parse_source("def f(self): return 'A'\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected def");
        };
        assert_eq!(def.body.len(), 1);
        assert!(matches!(def.body[0].kind, StmtKind::Return(Some(_))));
    }

    #[test]
    fn decorators_attach_in_source_order() {
        let module = parse_source("@a\n@b\ndef f():\n    pass\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected def");
        };
        assert_eq!(def.decorators.len(), 2);
    }

    #[test]
    fn generator_flag_is_structural() {
        let module = parse_source("def g():\n    yield 1\ndef f():\n    def inner():\n        yield 2\n    return inner\n");
        let StmtKind::FunctionDef(g) = &module.body[0].kind else {
            panic!()
        };
        let StmtKind::FunctionDef(f) = &module.body[1].kind else {
            panic!()
        };
        assert!(g.is_generator);
        assert!(!f.is_generator);
    }

    #[test]
    fn params_full_shape() {
        let module = parse_source("def f(a, b=1, *args, c, d=2, **kw):\n    pass\n");
        let StmtKind::FunctionDef(def) = &module.body[0].kind else {
            panic!("expected def");
        };
        assert_eq!(def.params.args.len(), 2);
        assert_eq!(def.params.vararg.as_deref(), Some("args"));
        assert_eq!(def.params.kwonly.len(), 2);
        assert_eq!(def.params.kwarg.as_deref(), Some("kw"));
    }

    #[test]
    fn default_before_required_fails() {
        let err = parse_err("def f(a=1, b):\n    pass\n");
        assert!(err.message.contains("default"));
    }

    #[test]
    fn bare_except_must_be_last() {
        let err = parse_err("try:\n    pass\nexcept:\n    pass\nexcept ValueError:\n    pass\n");
        assert!(err.message.contains("must be last"));
    }

    #[test]
    fn match_statement_parses() {
        let module = parse_source("match x:\n    case 1:\n        y = 1\n    case _:\n        y = 2\n");
        let StmtKind::Match { cases, .. } = &module.body[0].kind else {
            panic!("expected match");
        };
        assert_eq!(cases.len(), 2);
        assert!(matches!(cases[1].pattern, Pattern::Wildcard));
    }

    #[test]
    fn match_as_plain_name_still_works() {
        let module = parse_source("match = 5\nmatch + 1\n");
        assert!(matches!(module.body[0].kind, StmtKind::Assign { .. }));
        assert!(matches!(module.body[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn import_is_a_stub() {
        let module = parse_source("import os\nfrom sys import path\n");
        assert!(matches!(module.body[0].kind, StmtKind::Import));
        assert!(matches!(module.body[1].kind, StmtKind::Import));
    }

    #[test]
    fn cannot_assign_to_literal() {
        let err = parse_err("1 = x\n");
        assert!(err.message.contains("cannot assign"));
    }

    #[test]
    fn parse_is_deterministic() {
        let source = "def f(a):\n    return [x*a for x in range(3)]\n";
        let first = format!("{:?}", parse_source(source));
        let second = format!("{:?}", parse_source(source));
        assert_eq!(first, second);
    }
}
