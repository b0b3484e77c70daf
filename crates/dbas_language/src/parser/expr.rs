//! Pratt expression parsing.
//!
//! Operators bind according to [`Precedence`], low to high:
//!
//! ```text
//! OR XOR  <  AND  <  NOT  <  = <>  <  < > <= >=  <  + - &  <  * / \ MOD  <  ^  <  prefix  <  call/index/member
//! ```
//!
//! `^` is right-associative; everything else associates left. `^` doubles
//! as the dereference prefix and `@` is address-of. A member name after `.`
//! may be a keyword, so calls like `value.type()` against external packages
//! parse.

use super::Parser;
use crate::ast::Expr;
use crate::token::{Token, TokenKind};

/// Binding strength, low to high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    /// `OR`, `XOR`
    Or,
    /// `AND`
    And,
    /// prefix `NOT`
    Not,
    /// `=`, `<>`
    Equality,
    /// `<`, `>`, `<=`, `>=`
    Ordering,
    /// `+`, `-`, `&`
    Sum,
    /// `*`, `/`, `\`, `MOD`
    Product,
    /// `^`
    Power,
    /// unary `-`, `NOT`, `@`, `^`
    Prefix,
    /// calls, indexing, member access, `AS` assertions
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    use TokenKind::*;
    match kind {
        Or | Xor => Precedence::Or,
        And => Precedence::And,
        Eq | NotEq => Precedence::Equality,
        Lt | Gt | LtEq | GtEq => Precedence::Ordering,
        Plus | Minus | Ampersand => Precedence::Sum,
        Star | Slash | Backslash | Mod => Precedence::Product,
        Caret => Precedence::Power,
        LParen | LBracket | Dot | As => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

impl<'a, 't> Parser<'a, 't> {
    /// Parses an expression whose infix operators must bind tighter than
    /// `min`.
    pub(crate) fn parse_expression(&mut self, min: Precedence) -> Option<Expr<'a>> {
        let mut left = self.parse_prefix()?;
        loop {
            let prec = precedence_of(self.cur().kind);
            if prec == Precedence::Lowest || prec <= min {
                break;
            }
            left = self.parse_infix(left, prec)?;
        }
        Some(left)
    }

    // =========================================================================
    // Prefix positions
    // =========================================================================

    fn parse_prefix(&mut self) -> Option<Expr<'a>> {
        let token = self.cur();
        match token.kind {
            TokenKind::Ident => self.parse_identifier_head(),
            TokenKind::Int => {
                self.advance();
                let text = self.interner.resolve(token.literal);
                match text.parse::<i64>() {
                    Ok(value) => Some(Expr::IntegerLit { token, value }),
                    Err(_) => {
                        self.push_error(token, format!("integer literal '{}' out of range", text));
                        None
                    }
                }
            }
            TokenKind::Float => {
                self.advance();
                let text = self.interner.resolve(token.literal);
                match text.parse::<f64>() {
                    Ok(value) => Some(Expr::FloatLit { token, value }),
                    Err(_) => {
                        self.push_error(token, format!("malformed float literal '{}'", text));
                        None
                    }
                }
            }
            TokenKind::Str => {
                self.advance();
                Some(Expr::StringLit { token, value: token.literal })
            }
            TokenKind::ByteStr => {
                self.advance();
                Some(Expr::ByteStringLit { token, value: token.literal })
            }
            TokenKind::True | TokenKind::False => {
                self.advance();
                Some(Expr::BooleanLit { token, value: token.kind == TokenKind::True })
            }
            TokenKind::Nil => {
                self.advance();
                Some(Expr::NilLit { token })
            }
            TokenKind::LParen => {
                self.advance();
                self.skip_terminators();
                let inner = self.parse_expression(Precedence::Lowest)?;
                self.skip_terminators();
                self.expect(TokenKind::RParen);
                Some(inner)
            }
            TokenKind::LBrace => self.parse_json_literal(),
            TokenKind::LBracket => self.parse_bracket_literal(),
            TokenKind::Minus | TokenKind::At => {
                self.advance();
                let right = self.parse_expression(Precedence::Prefix)?;
                let right = self.ctx.alloc_expr(right);
                match token.kind {
                    TokenKind::At => Some(Expr::AddressOf { token, value: right }),
                    _ => Some(Expr::Prefix { token, op: token.kind, right }),
                }
            }
            TokenKind::Caret => {
                // `^p.field` means `(^p).field`: the operand is the bare
                // primary, and postfix forms apply to the dereference.
                self.advance();
                let right = self.parse_expression(Precedence::Call)?;
                Some(Expr::Dereference { token, value: self.ctx.alloc_expr(right) })
            }
            TokenKind::Not => {
                self.advance();
                let right = self.parse_expression(Precedence::Not)?;
                Some(Expr::Prefix { token, op: TokenKind::Not, right: self.ctx.alloc_expr(right) })
            }
            TokenKind::Receive => {
                // RECEIVE(ch) in expression position.
                self.advance();
                self.expect(TokenKind::LParen);
                let channel = self.parse_expression(Precedence::Lowest)?;
                self.expect(TokenKind::RParen);
                Some(Expr::ReceiveExpr { token, channel: self.ctx.alloc_expr(channel) })
            }
            _ => {
                let found = self.describe(token);
                self.push_error(token, format!("unexpected {} in expression", found));
                None
            }
        }
    }

    /// An identifier may head a plain reference, a struct literal, or the
    /// `MAKE_CHAN(...)` channel constructor.
    fn parse_identifier_head(&mut self) -> Option<Expr<'a>> {
        let token = self.cur();
        let name = token.literal;
        self.advance();

        if self.cur_is(TokenKind::LBrace) {
            return self.parse_struct_literal(token);
        }

        if self.cur_is(TokenKind::LParen)
            && self.interner.resolve(name).eq_ignore_ascii_case("MAKE_CHAN")
        {
            return self.parse_make_chan(token);
        }

        Some(Expr::Identifier { token, name })
    }

    fn parse_make_chan(&mut self, token: Token) -> Option<Expr<'a>> {
        self.expect(TokenKind::LParen);
        let elem = self.parse_type_spec()?;
        let elem = self.ctx.alloc_type(elem);
        let size = if self.cur_is(TokenKind::Comma) {
            self.advance();
            let size = self.parse_expression(Precedence::Lowest)?;
            Some(&*self.ctx.alloc_expr(size))
        } else {
            None
        };
        self.expect(TokenKind::RParen);
        Some(Expr::MakeChan { token, elem, size })
    }

    /// `Name{field: value, ...}` — newlines inside the braces are skipped.
    fn parse_struct_literal(&mut self, type_token: Token) -> Option<Expr<'a>> {
        self.expect(TokenKind::LBrace);
        let mut fields = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            let field_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            self.expect(TokenKind::Colon);
            self.skip_terminators();
            let value = self.parse_expression(Precedence::Lowest)?;
            fields.push((field_token.literal, value));
            self.skip_terminators();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
                self.skip_terminators();
            }
        }
        self.expect(TokenKind::RBrace);
        Some(Expr::StructLit {
            token: type_token,
            type_name: type_token.literal,
            fields: self.ctx.alloc_pairs(fields),
        })
    }

    /// `{"key": value, ...}` — newlines inside the braces are skipped.
    fn parse_json_literal(&mut self) -> Option<Expr<'a>> {
        let token = self.cur();
        self.expect(TokenKind::LBrace);
        let mut pairs = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
            let key_token = self.cur();
            if !self.expect(TokenKind::Str) {
                return None;
            }
            self.expect(TokenKind::Colon);
            self.skip_terminators();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key_token.literal, value));
            self.skip_terminators();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
                self.skip_terminators();
            }
        }
        self.expect(TokenKind::RBrace);
        Some(Expr::JsonLit { token, pairs: self.ctx.alloc_pairs(pairs) })
    }

    /// `[e1, e2, ...]` array literal, or `[]TYPE{...}` slice literal.
    fn parse_bracket_literal(&mut self) -> Option<Expr<'a>> {
        let token = self.cur();
        self.expect(TokenKind::LBracket);

        if self.cur_is(TokenKind::RBracket) {
            // `[]TYPE{...}`: a slice literal with an explicit element type.
            self.advance();
            let type_token = self.cur();
            if !self.expect(TokenKind::Ident) {
                return None;
            }
            self.expect(TokenKind::LBrace);
            let mut elements = Vec::new();
            self.skip_terminators();
            while !self.cur_is(TokenKind::RBrace) && !self.cur_is(TokenKind::Eof) {
                let element = self.parse_expression(Precedence::Lowest)?;
                elements.push(element);
                self.skip_terminators();
                if self.cur_is(TokenKind::Comma) {
                    self.advance();
                    self.skip_terminators();
                }
            }
            self.expect(TokenKind::RBrace);
            return Some(Expr::SliceLit {
                token,
                elem_type: type_token.literal,
                elements: self.ctx.alloc_exprs(elements),
            });
        }

        let mut elements = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::RBracket) && !self.cur_is(TokenKind::Eof) {
            let element = self.parse_expression(Precedence::Lowest)?;
            elements.push(element);
            self.skip_terminators();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
                self.skip_terminators();
            }
        }
        self.expect(TokenKind::RBracket);
        Some(Expr::ArrayLit { token, elements: self.ctx.alloc_exprs(elements) })
    }

    // =========================================================================
    // Infix positions
    // =========================================================================

    fn parse_infix(&mut self, left: Expr<'a>, prec: Precedence) -> Option<Expr<'a>> {
        let token = self.cur();
        match token.kind {
            TokenKind::LParen => self.parse_call(left),
            TokenKind::LBracket => self.parse_index(left),
            TokenKind::Dot => self.parse_member(left),
            TokenKind::As => self.parse_type_assertion(left),
            TokenKind::Caret => {
                // Right-associative: recurse one level below Power.
                self.advance();
                let right = self.parse_expression(Precedence::Product)?;
                Some(Expr::Infix {
                    token,
                    op: TokenKind::Caret,
                    left: self.ctx.alloc_expr(left),
                    right: self.ctx.alloc_expr(right),
                })
            }
            _ => {
                self.advance();
                let right = self.parse_expression(prec)?;
                Some(Expr::Infix {
                    token,
                    op: token.kind,
                    left: self.ctx.alloc_expr(left),
                    right: self.ctx.alloc_expr(right),
                })
            }
        }
    }

    fn parse_call(&mut self, func: Expr<'a>) -> Option<Expr<'a>> {
        let token = self.cur();
        self.expect(TokenKind::LParen);
        let mut args = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::RParen) && !self.cur_is(TokenKind::Eof) {
            let arg = self.parse_expression(Precedence::Lowest)?;
            args.push(arg);
            self.skip_terminators();
            if self.cur_is(TokenKind::Comma) {
                self.advance();
                self.skip_terminators();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen);
        Some(Expr::Call {
            token,
            func: self.ctx.alloc_expr(func),
            args: self.ctx.alloc_exprs(args),
        })
    }

    fn parse_index(&mut self, left: Expr<'a>) -> Option<Expr<'a>> {
        let token = self.cur();
        self.expect(TokenKind::LBracket);
        let left = self.ctx.alloc_expr(left);

        // `[:end]`
        if self.cur_is(TokenKind::Colon) {
            self.advance();
            let end = if self.cur_is(TokenKind::RBracket) {
                None
            } else {
                let end = self.parse_expression(Precedence::Lowest)?;
                Some(&*self.ctx.alloc_expr(end))
            };
            self.expect(TokenKind::RBracket);
            return Some(Expr::Index { token, left, index: None, end, is_slice: true });
        }

        let index = self.parse_expression(Precedence::Lowest)?;
        let index = Some(&*self.ctx.alloc_expr(index));

        if self.cur_is(TokenKind::Colon) {
            self.advance();
            let end = if self.cur_is(TokenKind::RBracket) {
                None
            } else {
                let end = self.parse_expression(Precedence::Lowest)?;
                Some(&*self.ctx.alloc_expr(end))
            };
            self.expect(TokenKind::RBracket);
            return Some(Expr::Index { token, left, index, end, is_slice: true });
        }

        self.expect(TokenKind::RBracket);
        Some(Expr::Index { token, left, index, end: None, is_slice: false })
    }

    fn parse_member(&mut self, object: Expr<'a>) -> Option<Expr<'a>> {
        let token = self.cur();
        self.advance();
        let member_token = self.cur();
        // Keywords are legal member names: external values expose members
        // like `.type()` or `.error()`.
        if member_token.kind != TokenKind::Ident && !member_token.kind.is_keyword() {
            let found = self.describe(member_token);
            self.push_error(member_token, format!("expected member name, found {}", found));
            return None;
        }
        self.advance();
        Some(Expr::Member {
            token,
            object: self.ctx.alloc_expr(object),
            member: member_token.literal,
        })
    }

    fn parse_type_assertion(&mut self, value: Expr<'a>) -> Option<Expr<'a>> {
        let token = self.cur();
        self.advance();
        let target = self.parse_type_spec()?;
        Some(Expr::TypeAssertion {
            token,
            value: self.ctx.alloc_expr(value),
            target: self.ctx.alloc_type(target),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::{AstArenas, AstContext};
    use crate::ast::print::expr_to_source;
    use crate::lexer::Lexer;
    use dbas_base::Interner;

    fn render(source: &str) -> String {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        let expr = parser
            .parse_expression(Precedence::Lowest)
            .unwrap_or_else(|| panic!("no expression for {:?}: {:?}", source, parser.errors));
        assert!(parser.errors.is_empty(), "errors: {:?}", parser.errors);
        expr_to_source(&expr, &interner)
    }

    #[test]
    fn additive_binds_tighter_than_comparison() {
        assert_eq!(render("1 + 2 < 3 * 4"), "((1 + 2) < (3 * 4))");
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(render("a OR b AND c"), "(a OR (b AND c))");
    }

    #[test]
    fn not_binds_looser_than_comparison() {
        assert_eq!(render("NOT a = b"), "(NOT (a = b))");
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(render("2 ^ 3 ^ 2"), "(2 ^ (3 ^ 2))");
    }

    #[test]
    fn unary_minus() {
        assert_eq!(render("-a + b"), "((-a) + b)");
    }

    #[test]
    fn ampersand_concatenation() {
        assert_eq!(render("a & b & c"), "((a & b) & c)");
    }

    #[test]
    fn integer_division_and_mod() {
        assert_eq!(render("a \\ b MOD c"), "((a \\ b) MOD c)");
    }

    #[test]
    fn call_and_member_chain() {
        assert_eq!(render("obj.field.method(1, x)"), "obj.field.method(1, x)");
    }

    #[test]
    fn keyword_member_names_parse() {
        assert_eq!(render("v.type()"), "v.type()");
    }

    #[test]
    fn dereference_then_member() {
        assert_eq!(render("^p.next"), "(^p).next");
    }

    #[test]
    fn address_of() {
        assert_eq!(render("@x"), "(@x)");
    }

    #[test]
    fn index_and_slice_forms() {
        assert_eq!(render("xs[1]"), "xs[1]");
        assert_eq!(render("xs[1:5]"), "xs[1:5]");
        assert_eq!(render("xs[:5]"), "xs[:5]");
        assert_eq!(render("xs[1:]"), "xs[1:]");
    }

    #[test]
    fn make_chan_with_capacity() {
        assert_eq!(render("MAKE_CHAN(INTEGER, 8)"), "MAKE_CHAN(INTEGER, 8)");
    }

    #[test]
    fn receive_expression() {
        assert_eq!(render("RECEIVE(ch)"), "RECEIVE(ch)");
    }

    #[test]
    fn type_assertion() {
        assert_eq!(render("x AS INTEGER"), "(x AS INTEGER)");
    }

    #[test]
    fn struct_literal() {
        assert_eq!(render("Point{x: 1, y: 2}"), "Point{x: 1, y: 2}");
    }

    #[test]
    fn json_literal() {
        assert_eq!(render("{\"a\": 1, \"b\": \"two\"}"), "{\"a\": 1, \"b\": \"two\"}");
    }

    #[test]
    fn array_and_slice_literals() {
        assert_eq!(render("[1, 2, 3]"), "[1, 2, 3]");
        assert_eq!(render("[]INTEGER{1, 2}"), "[]INTEGER{1, 2}");
    }

    #[test]
    fn multi_line_struct_literal() {
        assert_eq!(render("Point{\n    x: 1,\n    y: 2\n}"), "Point{x: 1, y: 2}");
    }

    #[test]
    fn xor_renders() {
        assert_eq!(render("a XOR b"), "(a XOR b)");
    }
}
