//! # dbas-language
//!
//! The DBAS front end: everything between raw source text and a checked AST.
//!
//! ```text
//! file.dbas
//!     │
//!     ▼
//! ┌──────────────┐    ┌─────────┐    ┌──────────┐
//! │ Preprocessor │ ─▶ │  Lexer  │ ─▶ │  Parser  │ ─▶ AST
//! └──────────────┘    └─────────┘    └──────────┘
//!   INCLUDE splicing    tokens +       arena-allocated
//!   + line map          positions      statements/exprs
//! ```
//!
//! Semantic analysis and code generation live in `dbas-compile`; this crate
//! has no knowledge of Go or of the type system beyond parsed syntax.

pub mod arena_ctx;
pub mod ast;
pub mod diagnostic;
pub mod lexer;
pub mod parser;
pub mod preprocess;
pub mod token;

pub use arena_ctx::{AstArenas, AstContext};
pub use diagnostic::{Diagnostic, Phase, Severity};
pub use lexer::Lexer;
pub use parser::Parser;
pub use preprocess::{LineMap, PreprocessError, PreprocessedSource, Preprocessor};
pub use token::{Token, TokenKind};
