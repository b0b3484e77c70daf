//! Statement nodes.

use dbas_base::Symbol;

use super::expr::Expr;
use super::types::TypeSpec;
use crate::token::Token;

/// A block is an arena slice of statements.
pub type Block<'a> = &'a [Stmt<'a>];

/// Which construct an `EXIT` statement leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    For,
    While,
    Do,
    Sub,
    Function,
}

/// Separator between (or after) `PRINT` arguments.
///
/// A comma prints a tab between values; a semicolon abuts them. A trailing
/// separator of either kind suppresses the final newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintSep {
    Comma,
    Semicolon,
}

/// `ELSEIF cond THEN block`.
#[derive(Debug)]
pub struct ElseIf<'a> {
    pub token: Token,
    pub cond: &'a Expr<'a>,
    pub block: Block<'a>,
}

/// `CASE v1, v2 : block`.
#[derive(Debug)]
pub struct CaseClause<'a> {
    pub token: Token,
    pub values: &'a [Expr<'a>],
    pub block: Block<'a>,
}

/// A field line inside a `TYPE` declaration.
#[derive(Debug)]
pub struct FieldDecl<'a> {
    pub token: Token,
    pub name: Symbol,
    pub ty: &'a TypeSpec<'a>,
}

/// A parameter of a sub, function, or method.
#[derive(Debug)]
pub struct Param<'a> {
    pub token: Token,
    pub name: Symbol,
    pub ty: &'a TypeSpec<'a>,
    pub by_ref: bool,
}

/// A statement, tagged by form. Every variant carries its leading token.
#[derive(Debug)]
pub enum Stmt<'a> {
    /// `IMPORT "path" [AS alias]`.
    Import {
        token: Token,
        path: Symbol,
        alias: Option<Symbol>,
    },
    /// `DIM name[(size)] AS type [= init]`.
    Dim {
        token: Token,
        name: Symbol,
        ty: &'a TypeSpec<'a>,
        array_size: Option<&'a Expr<'a>>,
        init: Option<&'a Expr<'a>>,
    },
    /// `LET name = value`.
    Let {
        token: Token,
        name: Symbol,
        value: &'a Expr<'a>,
    },
    /// `CONST name AS type = value`.
    Const {
        token: Token,
        name: Symbol,
        ty: &'a TypeSpec<'a>,
        value: &'a Expr<'a>,
    },
    /// `target = value` where target is any assignable expression.
    Assignment {
        token: Token,
        target: &'a Expr<'a>,
        value: &'a Expr<'a>,
    },
    /// `a, b = value` for multi-return calls and type assertions.
    MultiAssignment {
        token: Token,
        targets: &'a [Expr<'a>],
        value: &'a Expr<'a>,
    },
    /// `PRINT v1, v2; ...` — `separators` holds the separator after each
    /// value; a trailing entry suppresses the newline.
    Print {
        token: Token,
        values: &'a [Expr<'a>],
        separators: &'a [PrintSep],
    },
    /// `INPUT ["prompt";] var`.
    Input {
        token: Token,
        prompt: Option<&'a Expr<'a>>,
        var: Symbol,
        var_token: Token,
    },
    If {
        token: Token,
        cond: &'a Expr<'a>,
        then_block: Block<'a>,
        elseifs: &'a [ElseIf<'a>],
        else_block: Option<Block<'a>>,
    },
    /// `FOR var = start TO end [STEP step] ... NEXT`.
    For {
        token: Token,
        var: Symbol,
        start: &'a Expr<'a>,
        end: &'a Expr<'a>,
        step: Option<&'a Expr<'a>>,
        body: Block<'a>,
    },
    /// `WHILE cond ... WEND`.
    While {
        token: Token,
        cond: &'a Expr<'a>,
        body: Block<'a>,
    },
    /// `DO [WHILE|UNTIL cond] ... LOOP [WHILE|UNTIL cond]`.
    DoLoop {
        token: Token,
        cond: Option<&'a Expr<'a>>,
        body: Block<'a>,
        /// True for `WHILE`, false for `UNTIL`.
        is_while: bool,
        /// True when the condition sits on the `DO` line.
        pre_condition: bool,
    },
    /// `SELECT CASE test ... END SELECT`.
    Select {
        token: Token,
        test: &'a Expr<'a>,
        cases: &'a [CaseClause<'a>],
        default: Option<Block<'a>>,
    },
    /// `TYPE Name [IMPLEMENTS Iface] ... END TYPE` with `EMBED` lines and
    /// field declarations.
    TypeDecl {
        token: Token,
        name: Symbol,
        implements: Option<Symbol>,
        embedded: &'a [Symbol],
        fields: &'a [FieldDecl<'a>],
    },
    /// `SUB Name(params) ... END SUB`.
    Sub {
        token: Token,
        name: Symbol,
        params: &'a [Param<'a>],
        body: Block<'a>,
    },
    /// `FUNCTION Name(params) AS (returns) ... END FUNCTION`.
    Function {
        token: Token,
        name: Symbol,
        params: &'a [Param<'a>],
        returns: &'a [TypeSpec<'a>],
        body: Block<'a>,
    },
    /// `FUNCTION (recv AS T) Name(params) AS R` / `SUB (recv AS T) Name(...)`.
    ///
    /// An empty `returns` slice is the sub form.
    Method {
        token: Token,
        receiver_name: Symbol,
        receiver_type: &'a TypeSpec<'a>,
        name: Symbol,
        params: &'a [Param<'a>],
        returns: &'a [TypeSpec<'a>],
        body: Block<'a>,
    },
    Return {
        token: Token,
        values: &'a [Expr<'a>],
    },
    Exit {
        token: Token,
        kind: ExitKind,
    },
    Goto {
        token: Token,
        label: Symbol,
    },
    /// `name:` at the start of a line.
    Label {
        token: Token,
        name: Symbol,
    },
    /// `SPAWN call(...)`.
    Spawn {
        token: Token,
        call: &'a Expr<'a>,
    },
    /// `SEND value TO channel`.
    Send {
        token: Token,
        value: &'a Expr<'a>,
        channel: &'a Expr<'a>,
    },
    /// `RECEIVE var FROM channel`.
    Receive {
        token: Token,
        var: &'a Expr<'a>,
        channel: &'a Expr<'a>,
    },
    /// A bare expression in statement position.
    ExprStmt {
        token: Token,
        expr: &'a Expr<'a>,
    },
    /// A nested statement sequence.
    BlockStmt {
        token: Token,
        stmts: Block<'a>,
    },
}

impl<'a> Stmt<'a> {
    /// The token the statement originated from.
    pub fn token(&self) -> Token {
        match self {
            Stmt::Import { token, .. }
            | Stmt::Dim { token, .. }
            | Stmt::Let { token, .. }
            | Stmt::Const { token, .. }
            | Stmt::Assignment { token, .. }
            | Stmt::MultiAssignment { token, .. }
            | Stmt::Print { token, .. }
            | Stmt::Input { token, .. }
            | Stmt::If { token, .. }
            | Stmt::For { token, .. }
            | Stmt::While { token, .. }
            | Stmt::DoLoop { token, .. }
            | Stmt::Select { token, .. }
            | Stmt::TypeDecl { token, .. }
            | Stmt::Sub { token, .. }
            | Stmt::Function { token, .. }
            | Stmt::Method { token, .. }
            | Stmt::Return { token, .. }
            | Stmt::Exit { token, .. }
            | Stmt::Goto { token, .. }
            | Stmt::Label { token, .. }
            | Stmt::Spawn { token, .. }
            | Stmt::Send { token, .. }
            | Stmt::Receive { token, .. }
            | Stmt::ExprStmt { token, .. }
            | Stmt::BlockStmt { token, .. } => *token,
        }
    }
}
