//! Semantic analysis: the type algebra, the scope tree, the registry of
//! user types, builtin signatures, and the multi-pass checker itself.

pub mod builtins;
pub mod check;
pub mod registry;
pub mod symbols;
pub mod types;

pub use check::Analyzer;
pub use registry::TypeRegistry;
pub use symbols::{ImportInfo, ScopeId, SymbolInfo, SymbolKind, SymbolTable};
pub use types::{ExternalTy, FuncTy, StructField, StructTy, Ty};
