//! # dbas-base
//!
//! Structural atoms for the dbas compiler.
//!
//! This crate provides the foundational types the rest of the pipeline is
//! built on:
//!
//! - [`Arena`] — bump allocation for stable AST references
//! - [`Interner`]/[`Symbol`] — string interning for O(1) identifier equality
//! - [`Pos`] — 1-based line/column source positions
//!
//! The crate knows nothing about BASIC syntax, Go, or I/O. Higher layers
//! (`dbas-language`, `dbas-compile`) build on these atoms.

pub mod arena;
pub mod intern;
pub mod pos;

pub use arena::Arena;
pub use intern::{Interner, Symbol, SymbolEq};
pub use pos::Pos;
