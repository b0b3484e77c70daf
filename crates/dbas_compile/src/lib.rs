//! # dbas-compile
//!
//! The DBAS compilation pipeline: semantic analysis of the parsed AST and
//! syntax-directed emission of a single Go compilation unit, plus the
//! embedded Go runtime helpers the emitted programs depend on.
//!
//! ## Architecture
//!
//! ```text
//! AST (dbas-language)
//!      │
//!      ▼
//! ┌──────────────────────────────────────┐
//! │           Analysis Passes            │
//! │  imports → types → signatures →      │
//! │  globals → bodies                    │
//! └──────────────┬───────────────────────┘
//!                ▼ symbol table + type registry
//! ┌──────────────────────────────────────┐
//! │              Codegen                 │
//! │  bodies → imports/runtime closure →  │
//! │  assembled Go unit                   │
//! └──────────────┬───────────────────────┘
//!                ▼
//!            Go source
//! ```
//!
//! ## Getting started
//!
//! ```
//! use dbas_compile::compile::{compile_source, CompileOptions};
//!
//! let source = "SUB Main()\n    PRINT \"hi\"\nEND SUB\n";
//! let output = compile_source(source, "hi.dbas", &CompileOptions::default());
//! assert!(output.succeeded());
//! assert!(output.go_source.contains("fmt.Printf"));
//! ```

pub mod analysis;
pub mod codegen;
pub mod compile;

pub use analysis::{Analyzer, SymbolTable, Ty, TypeRegistry};
pub use compile::{check_file, compile_file, compile_source, CompileOptions, CompileOutput};

// Re-export the front end so drivers depend on one crate.
pub use dbas_language::{Diagnostic, Phase, Severity};
