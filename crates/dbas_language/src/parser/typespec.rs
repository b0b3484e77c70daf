//! Type syntax parsing.
//!
//! Accepted forms, per the declaration grammar:
//!
//! ```text
//! INTEGER | LONG | SINGLE | DOUBLE | STRING | BOOLEAN | JSON | BYTES
//! ANY | ERROR
//! POINTER TO <type>
//! CHAN OF <type>
//! []<type>
//! UserType
//! alias.Name          (external, opaque to the analyzer)
//! ```
//!
//! Primitive names are ordinary identifiers; only `ANY` and `ERROR` are
//! keywords. Resolution happens later, in the analyzer.

use super::Parser;
use crate::ast::TypeSpec;
use crate::token::TokenKind;

impl<'a, 't> Parser<'a, 't> {
    /// Parses one type spec; records a diagnostic and returns `None` on
    /// malformed syntax.
    pub(crate) fn parse_type_spec(&mut self) -> Option<TypeSpec<'a>> {
        let token = self.cur();
        match token.kind {
            TokenKind::Pointer => {
                self.advance();
                self.expect(TokenKind::To);
                let elem = self.parse_type_spec()?;
                Some(TypeSpec {
                    is_pointer: true,
                    elem: Some(self.ctx.alloc_type(elem)),
                    ..TypeSpec::named(token, token.literal)
                })
            }
            TokenKind::Chan => {
                self.advance();
                self.expect(TokenKind::Of);
                let elem = self.parse_type_spec()?;
                Some(TypeSpec {
                    is_channel: true,
                    elem: Some(self.ctx.alloc_type(elem)),
                    ..TypeSpec::named(token, token.literal)
                })
            }
            TokenKind::LBracket => {
                self.advance();
                self.expect(TokenKind::RBracket);
                let elem = self.parse_type_spec()?;
                Some(TypeSpec {
                    is_array: true,
                    elem: Some(self.ctx.alloc_type(elem)),
                    ..TypeSpec::named(token, token.literal)
                })
            }
            TokenKind::Any | TokenKind::Error => {
                self.advance();
                Some(TypeSpec::named(token, token.literal))
            }
            TokenKind::Ident => {
                self.advance();
                if self.cur_is(TokenKind::Dot) {
                    // `alias.Name` — a type from an imported package.
                    self.advance();
                    let name_token = self.cur();
                    if !self.expect(TokenKind::Ident) {
                        return None;
                    }
                    return Some(TypeSpec {
                        package: Some(token.literal),
                        ..TypeSpec::named(name_token, name_token.literal)
                    });
                }
                Some(TypeSpec::named(token, token.literal))
            }
            _ => {
                let found = self.describe(token);
                let diag = self
                    .error_at(token, format!("expected a type, found {}", found))
                    .with_hint("types are INTEGER, LONG, SINGLE, DOUBLE, STRING, BOOLEAN, JSON, BYTES, ANY, ERROR, POINTER TO T, CHAN OF T, []T, or a TYPE name");
                self.errors.push(diag);
                None
            }
        }
    }
}
