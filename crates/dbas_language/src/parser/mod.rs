//! Recursive-descent parser for DBAS.
//!
//! Statements parse by recursive descent ([`stmt`]); expressions parse
//! Pratt-style over a precedence ladder ([`expr`]); type syntax parses in
//! [`typespec`]. The parser allocates every node through an
//! [`AstContext`](crate::arena_ctx::AstContext) and hands back a top-level
//! statement list.
//!
//! Errors never unwind. Each problem is recorded as a [`Diagnostic`] with
//! file position, a snippet, a caret column, and (when the expectation has
//! one) a hint; the parser then resynchronizes at the next line and keeps
//! going, so one typo does not hide the rest of the file's problems.
//!
//! `NEWLINE` and `COMMENT` tokens act as statement terminators and are
//! skipped freely at statement boundaries and inside brace/paren lists.

pub mod expr;
pub mod stmt;
pub mod typespec;

pub use expr::Precedence;

use dbas_base::Interner;

use crate::arena_ctx::AstContext;
use crate::ast::Stmt;
use crate::diagnostic::{Diagnostic, Phase};
use crate::token::{Token, TokenKind};

/// Token-stream parser producing arena-allocated AST nodes.
pub struct Parser<'a, 't> {
    tokens: &'t [Token],
    pos: usize,
    pub(crate) ctx: AstContext<'a>,
    pub(crate) interner: &'t Interner,
    source: &'t str,
    /// Accumulated parse diagnostics; parsing continues past each.
    pub errors: Vec<Diagnostic>,
}

impl<'a, 't> Parser<'a, 't> {
    /// Creates a parser over a lexed token stream.
    ///
    /// `source` is the preprocessed text the tokens came from; it is only
    /// used to attach snippets to diagnostics.
    pub fn new(
        tokens: &'t [Token],
        ctx: AstContext<'a>,
        interner: &'t Interner,
        source: &'t str,
    ) -> Self {
        Parser {
            tokens,
            pos: 0,
            ctx,
            interner,
            source,
            errors: Vec::new(),
        }
    }

    /// Parses the whole program into a top-level statement list.
    pub fn parse_program(&mut self) -> Vec<Stmt<'a>> {
        let mut stmts = Vec::new();
        self.skip_terminators();
        while !self.cur_is(TokenKind::Eof) {
            let before = self.pos;
            match self.parse_statement() {
                Some(stmt) => stmts.push(stmt),
                None => self.synchronize(),
            }
            if self.pos == before {
                // The statement parser made no progress; force it.
                self.advance();
            }
            self.skip_terminators();
        }
        stmts
    }

    // =========================================================================
    // Cursor primitives
    // =========================================================================

    pub(crate) fn cur(&self) -> Token {
        self.tokens
            .get(self.pos)
            .copied()
            .unwrap_or_else(|| Token::eof(Default::default()))
    }

    pub(crate) fn peek(&self) -> Token {
        self.tokens
            .get(self.pos + 1)
            .copied()
            .unwrap_or_else(|| Token::eof(Default::default()))
    }

    pub(crate) fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub(crate) fn cur_is(&self, kind: TokenKind) -> bool {
        self.cur().kind == kind
    }

    pub(crate) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Skips newline and comment tokens.
    pub(crate) fn skip_terminators(&mut self) {
        while self.cur().kind.is_terminator() {
            self.advance();
        }
    }

    /// Consumes the current token if it matches, else records an error.
    pub(crate) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.cur_is(kind) {
            self.advance();
            return true;
        }
        let found = self.describe(self.cur());
        let message = format!("expected {}, found {}", describe_kind(kind), found);
        let mut diag = self.error_at(self.cur(), message);
        if let Some(hint) = hint_for(kind) {
            diag = diag.with_hint(hint);
        }
        self.errors.push(diag);
        false
    }

    /// Builds (without pushing) a parse diagnostic anchored at a token.
    pub(crate) fn error_at(&self, token: Token, message: String) -> Diagnostic {
        let mut diag =
            Diagnostic::error(Phase::Parse, message).at(token.pos.line, Some(token.pos.col));
        if let Some(snippet) = self.source_line(token.pos.line) {
            diag = diag.with_snippet(snippet);
        }
        diag
    }

    /// Records a parse error anchored at a token.
    pub(crate) fn push_error(&mut self, token: Token, message: String) {
        let diag = self.error_at(token, message);
        self.errors.push(diag);
    }

    fn source_line(&self, line: u32) -> Option<String> {
        if line == 0 {
            return None;
        }
        self.source.lines().nth(line as usize - 1).map(str::to_string)
    }

    /// Human description of a token for error messages.
    pub(crate) fn describe(&self, token: Token) -> String {
        match token.kind {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::Ident => format!("identifier '{}'", self.interner.resolve(token.literal)),
            TokenKind::Int | TokenKind::Float => {
                format!("number '{}'", self.interner.resolve(token.literal))
            }
            TokenKind::Str => "string literal".to_string(),
            _ => format!("'{}'", self.interner.resolve(token.literal)),
        }
    }

    /// Skips forward to the next statement boundary after an error.
    pub(crate) fn synchronize(&mut self) {
        while !self.cur_is(TokenKind::Eof) && !self.cur().kind.is_terminator() {
            self.advance();
        }
    }
}

/// Display name of an expected token kind, for error messages.
fn describe_kind(kind: TokenKind) -> &'static str {
    use TokenKind::*;
    match kind {
        Ident => "an identifier",
        Int => "an integer",
        Str => "a string literal",
        Eq => "'='",
        LParen => "'('",
        RParen => "')'",
        LBracket => "'['",
        RBracket => "']'",
        LBrace => "'{'",
        RBrace => "'}'",
        Comma => "','",
        Colon => "':'",
        Semicolon => "';'",
        Then => "THEN",
        To => "TO",
        Of => "OF",
        As => "AS",
        End => "END",
        Next => "NEXT",
        Wend => "WEND",
        Loop => "LOOP",
        Select => "SELECT",
        Case => "CASE",
        Sub => "SUB",
        Function => "FUNCTION",
        If => "IF",
        Type => "TYPE",
        From => "FROM",
        Newline => "end of line",
        _ => "a token",
    }
}

/// Expectation-specific hints attached to "expected X" diagnostics.
fn hint_for(kind: TokenKind) -> Option<&'static str> {
    use TokenKind::*;
    match kind {
        Then => Some("IF statements require THEN"),
        To => Some("write FOR i = start TO end, or POINTER TO <type>"),
        Of => Some("channel types are written CHAN OF <type>"),
        As => Some("declarations are written DIM name AS <type>"),
        Next => Some("FOR blocks close with NEXT"),
        Wend => Some("WHILE blocks close with WEND"),
        Loop => Some("DO blocks close with LOOP"),
        Eq => Some("expected an assignment here"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena_ctx::AstArenas;
    use crate::lexer::Lexer;

    fn parse_count(source: &str) -> (usize, usize) {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        let stmts = parser.parse_program();
        (stmts.len(), parser.errors.len())
    }

    #[test]
    fn empty_program_parses_clean() {
        assert_eq!(parse_count("\n\n' only a comment\n"), (0, 0));
    }

    #[test]
    fn error_recovery_continues_to_next_line() {
        // First line is malformed; the two PRINT lines still parse.
        let (stmts, errors) = parse_count("DIM AS\nPRINT 1\nPRINT 2\n");
        assert_eq!(stmts, 2);
        assert!(errors >= 1);
    }

    #[test]
    fn expected_then_hint_is_attached() {
        let mut interner = Interner::new();
        let source = "IF x > 0\nPRINT 1\nEND IF\n";
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        parser.parse_program();
        assert!(parser
            .errors
            .iter()
            .any(|e| e.hint.as_deref() == Some("IF statements require THEN")));
    }
}
