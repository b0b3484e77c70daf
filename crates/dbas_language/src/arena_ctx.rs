//! Arena context for AST allocation.
//!
//! The parser allocates every node through an [`AstContext`], a bundle of
//! typed arenas with one `alloc_*` helper per node category. The `'a`
//! lifetime threads from here through the parser, the analyzer, and codegen;
//! the whole tree is released when the arenas drop.
//!
//! Construction follows the teacher pattern of one arena per node type:
//!
//! ```
//! use dbas_language::arena_ctx::{AstArenas, AstContext};
//!
//! let arenas = AstArenas::new();
//! let ctx = AstContext::new(&arenas);
//! ```

use dbas_base::{Arena, Symbol};

use crate::ast::expr::Expr;
use crate::ast::stmt::{CaseClause, ElseIf, FieldDecl, Param, PrintSep, Stmt};
use crate::ast::types::TypeSpec;

/// Owning storage for one compilation's AST.
pub struct AstArenas<'a> {
    pub stmts: Arena<Stmt<'a>>,
    pub exprs: Arena<Expr<'a>>,
    pub types: Arena<TypeSpec<'a>>,
    pub syms: Arena<Symbol>,
    pub pairs: Arena<(Symbol, Expr<'a>)>,
    pub params: Arena<Param<'a>>,
    pub fields: Arena<FieldDecl<'a>>,
    pub cases: Arena<CaseClause<'a>>,
    pub elseifs: Arena<ElseIf<'a>>,
    pub seps: Arena<PrintSep>,
}

impl<'a> AstArenas<'a> {
    pub fn new() -> Self {
        AstArenas {
            stmts: Arena::new(),
            exprs: Arena::new(),
            types: Arena::new(),
            syms: Arena::new(),
            pairs: Arena::new(),
            params: Arena::new(),
            fields: Arena::new(),
            cases: Arena::new(),
            elseifs: Arena::new(),
            seps: Arena::new(),
        }
    }
}

impl<'a> Default for AstArenas<'a> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view over [`AstArenas`] handed to the parser.
#[derive(Clone, Copy)]
pub struct AstContext<'a> {
    arenas: &'a AstArenas<'a>,
}

impl<'a> AstContext<'a> {
    pub fn new(arenas: &'a AstArenas<'a>) -> Self {
        AstContext { arenas }
    }

    pub fn alloc_stmt(&self, stmt: Stmt<'a>) -> &'a Stmt<'a> {
        self.arenas.stmts.alloc(stmt)
    }

    pub fn alloc_stmts<I>(&self, stmts: I) -> &'a [Stmt<'a>]
    where
        I: IntoIterator<Item = Stmt<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.stmts.alloc_slice(stmts)
    }

    pub fn alloc_expr(&self, expr: Expr<'a>) -> &'a Expr<'a> {
        self.arenas.exprs.alloc(expr)
    }

    pub fn alloc_exprs<I>(&self, exprs: I) -> &'a [Expr<'a>]
    where
        I: IntoIterator<Item = Expr<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.exprs.alloc_slice(exprs)
    }

    pub fn alloc_type(&self, ty: TypeSpec<'a>) -> &'a TypeSpec<'a> {
        self.arenas.types.alloc(ty)
    }

    pub fn alloc_types<I>(&self, types: I) -> &'a [TypeSpec<'a>]
    where
        I: IntoIterator<Item = TypeSpec<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.types.alloc_slice(types)
    }

    pub fn alloc_syms<I>(&self, syms: I) -> &'a [Symbol]
    where
        I: IntoIterator<Item = Symbol>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.syms.alloc_slice(syms)
    }

    pub fn alloc_pairs<I>(&self, pairs: I) -> &'a [(Symbol, Expr<'a>)]
    where
        I: IntoIterator<Item = (Symbol, Expr<'a>)>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.pairs.alloc_slice(pairs)
    }

    pub fn alloc_params<I>(&self, params: I) -> &'a [Param<'a>]
    where
        I: IntoIterator<Item = Param<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.params.alloc_slice(params)
    }

    pub fn alloc_fields<I>(&self, fields: I) -> &'a [FieldDecl<'a>]
    where
        I: IntoIterator<Item = FieldDecl<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.fields.alloc_slice(fields)
    }

    pub fn alloc_cases<I>(&self, cases: I) -> &'a [CaseClause<'a>]
    where
        I: IntoIterator<Item = CaseClause<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.cases.alloc_slice(cases)
    }

    pub fn alloc_elseifs<I>(&self, elseifs: I) -> &'a [ElseIf<'a>]
    where
        I: IntoIterator<Item = ElseIf<'a>>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.elseifs.alloc_slice(elseifs)
    }

    pub fn alloc_seps<I>(&self, seps: I) -> &'a [PrintSep]
    where
        I: IntoIterator<Item = PrintSep>,
        I::IntoIter: ExactSizeIterator,
    {
        self.arenas.seps.alloc_slice(seps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Token, TokenKind};
    use dbas_base::Pos;

    #[test]
    fn allocated_nodes_keep_their_payload() {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let token = Token::new(TokenKind::Int, Symbol::EMPTY, Pos::new(1, 1));
        let expr = ctx.alloc_expr(Expr::IntegerLit { token, value: 42 });
        assert!(matches!(expr, Expr::IntegerLit { value: 42, .. }));
    }

    #[test]
    fn slices_preserve_order() {
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let token = Token::new(TokenKind::Int, Symbol::EMPTY, Pos::new(1, 1));
        let exprs = ctx.alloc_exprs(vec![
            Expr::IntegerLit { token, value: 1 },
            Expr::IntegerLit { token, value: 2 },
        ]);
        assert_eq!(exprs.len(), 2);
        assert!(matches!(exprs[1], Expr::IntegerLit { value: 2, .. }));
    }
}
