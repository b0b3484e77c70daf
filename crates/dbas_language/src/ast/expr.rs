//! Expression nodes.

use dbas_base::Symbol;

use super::types::TypeSpec;
use crate::token::{Token, TokenKind};

/// An expression, tagged by form. Every variant carries its first token.
#[derive(Debug)]
pub enum Expr<'a> {
    Identifier {
        token: Token,
        name: Symbol,
    },
    IntegerLit {
        token: Token,
        value: i64,
    },
    FloatLit {
        token: Token,
        value: f64,
    },
    StringLit {
        token: Token,
        value: Symbol,
    },
    ByteStringLit {
        token: Token,
        value: Symbol,
    },
    BooleanLit {
        token: Token,
        value: bool,
    },
    NilLit {
        token: Token,
    },
    /// `{"key": value, ...}` — an untyped-key JSON object.
    JsonLit {
        token: Token,
        pairs: &'a [(Symbol, Expr<'a>)],
    },
    /// `[e1, e2, ...]`.
    ArrayLit {
        token: Token,
        elements: &'a [Expr<'a>],
    },
    /// `[]TYPE{e1, e2, ...}` — a slice literal with an explicit element type.
    SliceLit {
        token: Token,
        elem_type: Symbol,
        elements: &'a [Expr<'a>],
    },
    /// `Name{field: value, ...}`.
    StructLit {
        token: Token,
        type_name: Symbol,
        fields: &'a [(Symbol, Expr<'a>)],
    },
    Prefix {
        token: Token,
        op: TokenKind,
        right: &'a Expr<'a>,
    },
    Infix {
        token: Token,
        op: TokenKind,
        left: &'a Expr<'a>,
        right: &'a Expr<'a>,
    },
    Call {
        token: Token,
        func: &'a Expr<'a>,
        args: &'a [Expr<'a>],
    },
    /// `left[index]`, or the slice form `left[index:end]` where either
    /// bound may be absent.
    Index {
        token: Token,
        left: &'a Expr<'a>,
        index: Option<&'a Expr<'a>>,
        end: Option<&'a Expr<'a>>,
        is_slice: bool,
    },
    /// `object.member`; the analyzer decides whether this is a struct field
    /// or an external package reference.
    Member {
        token: Token,
        object: &'a Expr<'a>,
        member: Symbol,
    },
    /// `@value`.
    AddressOf {
        token: Token,
        value: &'a Expr<'a>,
    },
    /// `^value`.
    Dereference {
        token: Token,
        value: &'a Expr<'a>,
    },
    /// `MAKE_CHAN(TYPE[, size])`.
    MakeChan {
        token: Token,
        elem: &'a TypeSpec<'a>,
        size: Option<&'a Expr<'a>>,
    },
    /// `RECEIVE(channel)` in expression position.
    ReceiveExpr {
        token: Token,
        channel: &'a Expr<'a>,
    },
    /// `value AS Type` in expression position.
    TypeAssertion {
        token: Token,
        value: &'a Expr<'a>,
        target: &'a TypeSpec<'a>,
    },
}

impl<'a> Expr<'a> {
    /// The token the node originated from, for diagnostics.
    pub fn token(&self) -> Token {
        match self {
            Expr::Identifier { token, .. }
            | Expr::IntegerLit { token, .. }
            | Expr::FloatLit { token, .. }
            | Expr::StringLit { token, .. }
            | Expr::ByteStringLit { token, .. }
            | Expr::BooleanLit { token, .. }
            | Expr::NilLit { token }
            | Expr::JsonLit { token, .. }
            | Expr::ArrayLit { token, .. }
            | Expr::SliceLit { token, .. }
            | Expr::StructLit { token, .. }
            | Expr::Prefix { token, .. }
            | Expr::Infix { token, .. }
            | Expr::Call { token, .. }
            | Expr::Index { token, .. }
            | Expr::Member { token, .. }
            | Expr::AddressOf { token, .. }
            | Expr::Dereference { token, .. }
            | Expr::MakeChan { token, .. }
            | Expr::ReceiveExpr { token, .. }
            | Expr::TypeAssertion { token, .. } => *token,
        }
    }

    /// The leftmost identifier of a member chain, if the chain roots in one.
    ///
    /// `pkg.Sub.Fn` → `pkg`; used by the analyzer to classify member
    /// expressions whose root is an import alias.
    pub fn root_identifier(&self) -> Option<Symbol> {
        match self {
            Expr::Identifier { name, .. } => Some(*name),
            Expr::Member { object, .. } => object.root_identifier(),
            _ => None,
        }
    }
}
