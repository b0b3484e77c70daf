//! Parsed type syntax, before semantic resolution.

use dbas_base::Symbol;

use super::expr::Expr;
use crate::token::Token;

/// A type as written in source: `INTEGER`, `POINTER TO Node`,
/// `CHAN OF STRING`, `[]DOUBLE`, `fmt.Stringer`, `ANY`.
///
/// `TypeSpec` records only syntax. The analyzer resolves it against the
/// type registry and import table into a semantic type.
#[derive(Debug, Clone, Copy)]
pub struct TypeSpec<'a> {
    pub token: Token,
    /// Base type name; empty for the composite pointer/channel/slice forms.
    pub name: Symbol,
    /// Import alias for the `alias.Name` external form.
    pub package: Option<Symbol>,
    /// `POINTER TO elem`.
    pub is_pointer: bool,
    /// `CHAN OF elem`.
    pub is_channel: bool,
    /// `[]elem` (no size) or a sized array spec.
    pub is_array: bool,
    /// Element spec for pointer/channel/array forms.
    pub elem: Option<&'a TypeSpec<'a>>,
    /// Array size expression, when present.
    pub size: Option<&'a Expr<'a>>,
}

impl<'a> TypeSpec<'a> {
    /// A plain named type.
    pub fn named(token: Token, name: Symbol) -> Self {
        TypeSpec {
            token,
            name,
            package: None,
            is_pointer: false,
            is_channel: false,
            is_array: false,
            elem: None,
            size: None,
        }
    }

    /// True for `alias.Name` references into an imported package.
    pub fn is_external(&self) -> bool {
        self.package.is_some()
    }
}
