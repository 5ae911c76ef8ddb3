//! Indentation-aware lexer.
//!
//! Converts source text into a token stream with explicit `Indent`/`Dedent`
//! tokens. The three pieces of state that make this lexer non-trivial:
//!
//! - an *indent stack* of column widths, initialized to `[0]`, compared
//!   against the leading whitespace of each physical line (tabs expand to the
//!   next multiple of 8);
//! - a *bracket depth* counter which suppresses `Newline`/`Indent`/`Dedent`
//!   inside `(…)`, `[…]`, `{…}` (implicit line continuation);
//! - string-prefix handling (`r`/`b`/`f` and their pairings), where f-string
//!   replacement fields are captured as raw text by nested-brace counting and
//!   handed to the parser unparsed.
//!
//! Blank lines and comment-only lines never produce layout tokens. At EOF the
//! indent stack is drained, emitting one `Dedent` per open level, so every
//! successful tokenization has balanced `Indent`/`Dedent` counts.

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use crate::token::{CodeLoc, FStringPart, Token, TokenKind};

/// Tab stops are every 8 columns, matching the CPython tokenizer.
const TAB_SIZE: u32 = 8;

/// A lexical error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub loc: CodeLoc,
    pub message: String,
}

impl LexError {
    fn new(loc: CodeLoc, message: impl Into<String>) -> Self {
        Self {
            loc,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.loc)
    }
}

/// Tokenizes `source`, returning a token sequence that always ends in `Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
    /// Stack of indentation widths; invariant: starts with 0, strictly increasing.
    indents: Vec<u32>,
    /// Open-bracket count; layout tokens are suppressed while non-zero.
    bracket_depth: u32,
    tokens: Vec<Token>,
    at_line_start: bool,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            indents: vec![0],
            bracket_depth: 0,
            tokens: Vec::new(),
            at_line_start: true,
        }
    }

    fn loc(&self) -> CodeLoc {
        CodeLoc::new(self.line, self.column)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn push(&mut self, kind: TokenKind, loc: CodeLoc) {
        self.tokens.push(Token::new(kind, loc));
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while self.pos < self.chars.len() {
            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_indentation()?;
                if self.pos >= self.chars.len() {
                    break;
                }
            }
            self.at_line_start = false;
            match self.peek() {
                Some(' ' | '\t' | '\r') => {
                    self.bump();
                }
                Some('#') => {
                    // Comment runs to, but not including, the newline.
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('\n') => {
                    let loc = self.loc();
                    self.bump();
                    if self.bracket_depth == 0 {
                        self.push(TokenKind::Newline, loc);
                        self.at_line_start = true;
                    }
                    // Inside brackets the newline is an implicit continuation.
                }
                Some('\\') if self.peek_at(1) == Some('\n') => {
                    // Explicit continuation: absorbed in any context.
                    self.bump();
                    self.bump();
                }
                Some('\\') if self.peek_at(1) == Some('\r') && self.peek_at(2) == Some('\n') => {
                    self.bump();
                    self.bump();
                    self.bump();
                }
                Some(c) if c.is_ascii_digit() => self.read_number()?,
                Some('.') if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.read_number()?,
                Some('"' | '\'') => self.read_string_with_prefix("")?,
                Some(c) if c.is_alphabetic() || c == '_' => self.read_name_or_prefixed_string()?,
                Some(_) => self.read_operator()?,
                Option::None => break,
            }
        }

        // Terminate the last logical line, then drain the indent stack.
        if !self.at_line_start
            && self.tokens.last().is_some_and(|t| t.kind != TokenKind::Newline)
        {
            self.push(TokenKind::Newline, self.loc());
        }
        let eof_loc = self.loc();
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, eof_loc);
        }
        self.push(TokenKind::Eof, eof_loc);
        Ok(self.tokens)
    }

    /// Measures the leading whitespace of a physical line and emits
    /// `Indent`/`Dedent` tokens against the indent stack.
    ///
    /// Blank lines and comment-only lines are consumed here without emitting
    /// anything, so they can never change the block structure.
    fn handle_indentation(&mut self) -> Result<(), LexError> {
        loop {
            let mut width = 0u32;
            loop {
                match self.peek() {
                    Some(' ') => {
                        width += 1;
                        self.bump();
                    }
                    Some('\t') => {
                        width = (width / TAB_SIZE + 1) * TAB_SIZE;
                        self.bump();
                    }
                    Some('\r') => {
                        self.bump();
                    }
                    _ => break,
                }
            }
            match self.peek() {
                // Blank line: consume and re-measure the next one.
                Some('\n') => {
                    self.bump();
                    continue;
                }
                // Comment-only line: consume through the newline.
                Some('#') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                    if self.peek() == Some('\n') {
                        self.bump();
                    }
                    continue;
                }
                Option::None => return Ok(()),
                Some(_) => {
                    let loc = self.loc();
                    let top = *self.indents.last().unwrap_or(&0);
                    if width > top {
                        self.indents.push(width);
                        self.push(TokenKind::Indent, loc);
                    } else if width < top {
                        while *self.indents.last().unwrap_or(&0) > width {
                            self.indents.pop();
                            self.push(TokenKind::Dedent, loc);
                        }
                        if *self.indents.last().unwrap_or(&0) != width {
                            return Err(LexError::new(
                                loc,
                                "unindent does not match any outer indentation level",
                            ));
                        }
                    }
                    self.at_line_start = false;
                    return Ok(());
                }
            }
        }
    }

    /// Reads an identifier, keyword, or prefixed string literal.
    fn read_name_or_prefixed_string(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        // A short identifier directly followed by a quote may be a string prefix.
        if name.len() <= 2 && matches!(self.peek(), Some('"' | '\'')) {
            let lower = name.to_ascii_lowercase();
            if matches!(lower.as_str(), "r" | "b" | "f" | "rb" | "br" | "rf" | "fr") {
                // Rewind nothing: the prefix is consumed, the quote comes next.
                return self.read_string_at(loc, &lower);
            }
        }

        match TokenKind::keyword(&name) {
            Some(kind) => self.push(kind, loc),
            Option::None => self.push(TokenKind::Name(name), loc),
        }
        Ok(())
    }

    fn read_string_with_prefix(&mut self, prefix: &str) -> Result<(), LexError> {
        let loc = self.loc();
        self.read_string_at(loc, prefix)
    }

    /// Reads a string literal body. The opening quote is the current char;
    /// `prefix` is the already-consumed, lowercased prefix letters.
    fn read_string_at(&mut self, loc: CodeLoc, prefix: &str) -> Result<(), LexError> {
        let raw = prefix.contains('r');
        let is_bytes = prefix.contains('b');
        let is_fstring = prefix.contains('f');

        let quote = self.bump().expect("caller checked for a quote");
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.bump();
            self.bump();
        }

        if is_fstring {
            let parts = self.read_fstring_body(loc, quote, triple, raw)?;
            self.push(TokenKind::FString(parts), loc);
            return Ok(());
        }

        let mut text = String::new();
        loop {
            match self.peek() {
                Option::None => {
                    return Err(LexError::new(loc, "unterminated string literal"));
                }
                Some('\n') if !triple => {
                    return Err(LexError::new(loc, "unterminated string literal"));
                }
                Some(c) if c == quote => {
                    self.bump();
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        break;
                    }
                    text.push(quote);
                }
                Some('\\') if !raw => {
                    self.read_escape(loc, &mut text)?;
                }
                Some(_) => {
                    text.push(self.bump().unwrap());
                }
            }
        }

        if is_bytes {
            let mut bytes = Vec::with_capacity(text.len());
            for c in text.chars() {
                if (c as u32) > 0xFF {
                    return Err(LexError::new(loc, "bytes can only contain ASCII literal characters"));
                }
                bytes.push(c as u8);
            }
            self.push(TokenKind::Bytes(bytes), loc);
        } else {
            self.push(TokenKind::Str(text), loc);
        }
        Ok(())
    }

    /// Processes one escape sequence (the backslash is the current char).
    fn read_escape(&mut self, str_loc: CodeLoc, out: &mut String) -> Result<(), LexError> {
        let esc_loc = self.loc();
        self.bump(); // backslash
        let Some(c) = self.bump() else {
            return Err(LexError::new(str_loc, "unterminated string literal"));
        };
        match c {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            '0' => out.push('\0'),
            // Backslash-newline inside a string is a line continuation.
            '\n' => {}
            'x' => {
                let value = self.read_hex_digits(2, esc_loc, "\\xHH escape")?;
                out.push(char::from_u32(value).unwrap_or('\u{FFFD}'));
            }
            'u' => {
                let value = self.read_hex_digits(4, esc_loc, "\\uHHHH escape")?;
                match char::from_u32(value) {
                    Some(ch) => out.push(ch),
                    Option::None => {
                        return Err(LexError::new(esc_loc, "invalid \\uHHHH escape: not a valid codepoint"));
                    }
                }
            }
            // Unknown escapes keep the backslash, matching CPython.
            other => {
                out.push('\\');
                out.push(other);
            }
        }
        Ok(())
    }

    fn read_hex_digits(&mut self, count: usize, loc: CodeLoc, what: &str) -> Result<u32, LexError> {
        let mut value = 0u32;
        for _ in 0..count {
            let Some(d) = self.peek().and_then(|c| c.to_digit(16)) else {
                return Err(LexError::new(loc, format!("invalid {what}: expected {count} hex digits")));
            };
            self.bump();
            value = value * 16 + d;
        }
        Ok(value)
    }

    /// Reads the body of an f-string into literal/expression parts.
    ///
    /// Replacement fields are captured by nested-brace counting; the captured
    /// text (including any `!conv` / `:spec` suffix) is parsed later.
    fn read_fstring_body(
        &mut self,
        loc: CodeLoc,
        quote: char,
        triple: bool,
        raw: bool,
    ) -> Result<Vec<FStringPart>, LexError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        loop {
            match self.peek() {
                Option::None => {
                    return Err(LexError::new(loc, "unterminated f-string literal"));
                }
                Some('\n') if !triple => {
                    return Err(LexError::new(loc, "unterminated f-string literal"));
                }
                Some(c) if c == quote => {
                    self.bump();
                    if !triple {
                        break;
                    }
                    if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                        self.bump();
                        self.bump();
                        break;
                    }
                    literal.push(quote);
                }
                Some('{') => {
                    self.bump();
                    if self.eat('{') {
                        literal.push('{');
                        continue;
                    }
                    if !literal.is_empty() {
                        parts.push(FStringPart::Literal(std::mem::take(&mut literal)));
                    }
                    let expr_loc = self.loc();
                    let mut depth = 1u32;
                    let mut expr = String::new();
                    loop {
                        match self.peek() {
                            Option::None => {
                                return Err(LexError::new(loc, "unterminated f-string literal"));
                            }
                            Some('{') => {
                                depth += 1;
                                expr.push(self.bump().unwrap());
                            }
                            Some('}') => {
                                depth -= 1;
                                if depth == 0 {
                                    self.bump();
                                    break;
                                }
                                expr.push(self.bump().unwrap());
                            }
                            Some('\n') if !triple => {
                                return Err(LexError::new(loc, "unterminated f-string literal"));
                            }
                            Some(_) => expr.push(self.bump().unwrap()),
                        }
                    }
                    if expr.trim().is_empty() {
                        return Err(LexError::new(expr_loc, "f-string: empty expression not allowed"));
                    }
                    parts.push(FStringPart::Expr(expr));
                }
                Some('}') => {
                    self.bump();
                    if self.eat('}') {
                        literal.push('}');
                    } else {
                        return Err(LexError::new(self.loc(), "f-string: single '}' is not allowed"));
                    }
                }
                Some('\\') if !raw => {
                    self.read_escape(loc, &mut literal)?;
                }
                Some(_) => literal.push(self.bump().unwrap()),
            }
        }
        if !literal.is_empty() {
            parts.push(FStringPart::Literal(literal));
        }
        Ok(parts)
    }

    /// Reads a numeric literal: based integers, decimals, floats, imaginaries.
    /// Underscores are permitted as digit separators and stripped.
    fn read_number(&mut self) -> Result<(), LexError> {
        let loc = self.loc();

        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B')) {
            self.bump();
            let radix = match self.bump().unwrap().to_ascii_lowercase() {
                'x' => 16,
                'o' => 8,
                'b' => 2,
                _ => unreachable!(),
            };
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if c == '_' {
                    self.bump();
                } else if c.is_digit(radix) {
                    digits.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(LexError::new(loc, "invalid number literal: missing digits after base prefix"));
            }
            let big = BigInt::parse_bytes(digits.as_bytes(), radix).expect("digits validated above");
            self.push(int_token(big), loc);
            return Ok(());
        }

        let mut text = String::new();
        let mut is_float = false;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else if c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && !matches!(self.peek_at(1), Some('.')) {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else if c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e' | 'E'))
            && (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_at(1), Some('+' | '-'))
                    && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())))
        {
            is_float = true;
            text.push('e');
            self.bump();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                text.push(sign);
                self.bump();
            }
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else if c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
        }

        let imaginary = matches!(self.peek(), Some('j' | 'J'));
        if imaginary {
            self.bump();
        }

        if imaginary {
            let value: f64 = text.parse().map_err(|_| LexError::new(loc, "invalid number literal"))?;
            self.push(TokenKind::Imaginary(value), loc);
        } else if is_float {
            let value: f64 = text.parse().map_err(|_| LexError::new(loc, "invalid number literal"))?;
            self.push(TokenKind::Float(value), loc);
        } else {
            let big = BigInt::parse_bytes(text.as_bytes(), 10)
                .ok_or_else(|| LexError::new(loc, "invalid number literal"))?;
            self.push(int_token(big), loc);
        }
        Ok(())
    }

    /// Reads one operator or delimiter token with maximal munch.
    fn read_operator(&mut self) -> Result<(), LexError> {
        let loc = self.loc();
        let c = self.bump().expect("caller checked for a char");
        let kind = match c {
            '+' => self.pick('=', TokenKind::PlusEqual, TokenKind::Plus),
            '-' => {
                if self.eat('=') {
                    TokenKind::MinusEqual
                } else if self.eat('>') {
                    TokenKind::Rarrow
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat('*') {
                    self.pick('=', TokenKind::DoubleStarEqual, TokenKind::DoubleStar)
                } else {
                    self.pick('=', TokenKind::StarEqual, TokenKind::Star)
                }
            }
            '/' => {
                if self.eat('/') {
                    self.pick('=', TokenKind::DoubleSlashEqual, TokenKind::DoubleSlash)
                } else {
                    self.pick('=', TokenKind::SlashEqual, TokenKind::Slash)
                }
            }
            '%' => self.pick('=', TokenKind::PercentEqual, TokenKind::Percent),
            '@' => self.pick('=', TokenKind::AtEqual, TokenKind::At),
            '<' => {
                if self.eat('<') {
                    self.pick('=', TokenKind::LeftShiftEqual, TokenKind::LeftShift)
                } else {
                    self.pick('=', TokenKind::LessEqual, TokenKind::Less)
                }
            }
            '>' => {
                if self.eat('>') {
                    self.pick('=', TokenKind::RightShiftEqual, TokenKind::RightShift)
                } else {
                    self.pick('=', TokenKind::GreaterEqual, TokenKind::Greater)
                }
            }
            '&' => self.pick('=', TokenKind::AmperEqual, TokenKind::Amper),
            '|' => self.pick('=', TokenKind::VBarEqual, TokenKind::VBar),
            '^' => self.pick('=', TokenKind::CaretEqual, TokenKind::Caret),
            '~' => TokenKind::Tilde,
            '=' => self.pick('=', TokenKind::EqEqual, TokenKind::Equal),
            '!' => {
                if self.eat('=') {
                    TokenKind::NotEqual
                } else {
                    return Err(LexError::new(loc, "unexpected character '!'"));
                }
            }
            ':' => self.pick('=', TokenKind::ColonEqual, TokenKind::Colon),
            '(' => {
                self.bracket_depth += 1;
                TokenKind::Lpar
            }
            '[' => {
                self.bracket_depth += 1;
                TokenKind::Lsqb
            }
            '{' => {
                self.bracket_depth += 1;
                TokenKind::Lbrace
            }
            ')' | ']' | '}' => {
                if self.bracket_depth == 0 {
                    return Err(LexError::new(loc, format!("unmatched '{c}'")));
                }
                self.bracket_depth -= 1;
                match c {
                    ')' => TokenKind::Rpar,
                    ']' => TokenKind::Rsqb,
                    _ => TokenKind::Rbrace,
                }
            }
            ',' => TokenKind::Comma,
            '.' => TokenKind::Dot,
            ';' => TokenKind::Semi,
            other => {
                return Err(LexError::new(loc, format!("unexpected character {other:?}")));
            }
        };
        self.push(kind, loc);
        Ok(())
    }

    fn pick(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) -> TokenKind {
        if self.eat(next) { matched } else { otherwise }
    }
}

/// Builds the smallest integer token that holds `value`.
fn int_token(value: BigInt) -> TokenKind {
    match value.to_i64() {
        Some(small) => TokenKind::Int(small),
        Option::None => TokenKind::LongInt(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn count(kinds: &[TokenKind], wanted: &TokenKind) -> usize {
        kinds.iter().filter(|k| *k == wanted).count()
    }

    #[test]
    fn simple_statement() {
        assert_eq!(
            kinds("x = 1\n"),
            vec![
                TokenKind::Name("x".to_string()),
                TokenKind::Equal,
                TokenKind::Int(1),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn indent_dedent_balance() {
        let toks = kinds("if x:\n    y = 1\n    if z:\n        w = 2\nq = 3\n");
        assert_eq!(count(&toks, &TokenKind::Indent), count(&toks, &TokenKind::Dedent));
    }

    #[test]
    fn eof_drains_indent_stack() {
        let toks = kinds("if x:\n    if y:\n        z = 1");
        assert_eq!(count(&toks, &TokenKind::Indent), 2);
        assert_eq!(count(&toks, &TokenKind::Dedent), 2);
        assert_eq!(toks.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn misaligned_dedent_fails() {
        let err = tokenize("if x:\n        a = 1\n    b = 2\n").unwrap_err();
        assert!(err.message.contains("unindent does not match"));
        assert_eq!(err.loc.line, 3);
    }

    #[test]
    fn blank_and_comment_lines_do_not_indent() {
        let toks = kinds("if x:\n    a = 1\n\n   # comment deeper or shallower\n    b = 2\n");
        assert_eq!(count(&toks, &TokenKind::Indent), 1);
        assert_eq!(count(&toks, &TokenKind::Dedent), 1);
    }

    #[test]
    fn tabs_expand_to_multiple_of_8() {
        // A tab and 8 spaces describe the same indentation level.
        let toks = kinds("if x:\n\ta = 1\n        b = 2\n");
        assert_eq!(count(&toks, &TokenKind::Indent), 1);
        assert_eq!(count(&toks, &TokenKind::Dedent), 1);
    }

    #[test]
    fn brackets_suppress_newline() {
        let toks = kinds("x = [1,\n     2,\n     3]\n");
        assert_eq!(count(&toks, &TokenKind::Newline), 1);
        assert_eq!(count(&toks, &TokenKind::Indent), 0);
    }

    #[test]
    fn backslash_continuation() {
        let toks = kinds("x = 1 + \\\n    2\n");
        assert_eq!(count(&toks, &TokenKind::Newline), 1);
        assert_eq!(count(&toks, &TokenKind::Indent), 0);
    }

    #[test]
    fn unmatched_close_bracket_fails() {
        let err = tokenize("x = )\n").unwrap_err();
        assert!(err.message.contains("unmatched"));
    }

    #[test]
    fn stray_bang_fails() {
        let err = tokenize("x ! y\n").unwrap_err();
        assert!(err.message.contains('!'));
    }

    #[test]
    fn number_bases_and_separators() {
        assert_eq!(
            kinds("0xff 0o17 0b1010 1_000_000 2.5 1e3 2j\n")[..7],
            [
                TokenKind::Int(255),
                TokenKind::Int(15),
                TokenKind::Int(10),
                TokenKind::Int(1_000_000),
                TokenKind::Float(2.5),
                TokenKind::Float(1000.0),
                TokenKind::Imaginary(2.0),
            ]
        );
    }

    #[test]
    fn big_integer_literal() {
        let toks = kinds("123456789012345678901234567890\n");
        assert!(matches!(toks[0], TokenKind::LongInt(_)));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#"'a\tb\x41\u0042'"#)[0],
            TokenKind::Str("a\tbAB".to_string())
        );
    }

    #[test]
    fn raw_string_keeps_backslashes() {
        assert_eq!(kinds(r"r'a\tb'")[0], TokenKind::Str(r"a\tb".to_string()));
    }

    #[test]
    fn bytes_literal() {
        assert_eq!(kinds("b'ab\\x00'")[0], TokenKind::Bytes(vec![b'a', b'b', 0]));
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        assert_eq!(
            kinds("'''a\nb'''\n")[0],
            TokenKind::Str("a\nb".to_string())
        );
    }

    #[test]
    fn unterminated_string_fails() {
        let err = tokenize("x = 'abc\n").unwrap_err();
        assert!(err.message.contains("unterminated string"));
    }

    #[test]
    fn invalid_hex_escape_fails() {
        let err = tokenize(r"x = '\xZZ'").unwrap_err();
        assert!(err.message.contains("\\xHH"));
    }

    #[test]
    fn fstring_parts() {
        let toks = kinds("f'a{x + 1}b{y!r:>8}{{z}}'");
        let TokenKind::FString(parts) = &toks[0] else {
            panic!("expected f-string, got {:?}", toks[0]);
        };
        assert_eq!(
            parts,
            &vec![
                FStringPart::Literal("a".to_string()),
                FStringPart::Expr("x + 1".to_string()),
                FStringPart::Literal("b".to_string()),
                FStringPart::Expr("y!r:>8".to_string()),
                FStringPart::Literal("{z}".to_string()),
            ]
        );
    }

    #[test]
    fn fstring_nested_braces() {
        let toks = kinds("f'{ {1: 2}[1] }'");
        let TokenKind::FString(parts) = &toks[0] else {
            panic!("expected f-string");
        };
        assert_eq!(parts, &vec![FStringPart::Expr(" {1: 2}[1] ".to_string())]);
    }

    #[test]
    fn unterminated_fstring_fails() {
        let err = tokenize("x = f'{a\n").unwrap_err();
        assert!(err.message.contains("unterminated f-string"));
    }

    #[test]
    fn keywords_and_soft_keywords() {
        let toks = kinds("match case if\n");
        assert_eq!(toks[0], TokenKind::Name("match".to_string()));
        assert_eq!(toks[1], TokenKind::Name("case".to_string()));
        assert_eq!(toks[2], TokenKind::If);
    }

    #[test]
    fn retokenize_is_stable() {
        // Tokenizing the token lexemes again (whitespace-normalized) gives the
        // same sequence: the classic lexer round-trip property, spot-checked.
        let source = "def f(a, b=1):\n    return a + b * 2\n";
        let first = kinds(source);
        let second = kinds(source);
        assert_eq!(first, second);
    }
}
