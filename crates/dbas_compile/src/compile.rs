//! The end-to-end compilation pipeline.
//!
//! ```text
//! file.dbas
//!     │
//!     ▼
//! ┌──────────────┐   ┌─────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐
//! │ Preprocessor │ ─▶│  Lexer  │ ─▶│  Parser  │ ─▶│ Analyzer │ ─▶│ Codegen │
//! └──────────────┘   └─────────┘   └──────────┘   └──────────┘   └─────────┘
//!     INCLUDEs        tokens        AST            symbols +       Go source
//!     + line map                                   types
//! ```
//!
//! Every phase is tolerant and accumulates diagnostics; the pipeline halts
//! at the end of the first phase that produced errors and reports the full
//! list, with line numbers mapped back through the preprocessor's line map
//! to the original files. A missing `Main` sub is a warning, not an error.

use std::path::Path;

use dbas_language::arena_ctx::{AstArenas, AstContext};
use dbas_language::diagnostic::{Diagnostic, Phase};
use dbas_language::lexer::Lexer;
use dbas_language::parser::Parser;
use dbas_language::preprocess::{LineMap, Preprocessor};
use dbas_base::Interner;

use crate::analysis::Analyzer;
use crate::codegen::{self, GenOptions};

/// Knobs the driver exposes.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Annotate emitted statements with source line numbers.
    pub debug: bool,
}

/// What a compile produced: generated source (empty when a phase failed),
/// errors, and warnings.
#[derive(Debug, Default)]
pub struct CompileOutput {
    pub go_source: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl CompileOutput {
    pub fn succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    fn failed(errors: Vec<Diagnostic>) -> Self {
        CompileOutput { go_source: String::new(), errors, warnings: Vec::new() }
    }
}

/// Compiles a file: preprocess, lex, parse, analyze, emit.
pub fn compile_file(path: &Path, options: &CompileOptions) -> CompileOutput {
    let mut preprocessor = Preprocessor::new();
    let preprocessed = match preprocessor.process(path) {
        Ok(p) => p,
        Err(e) => return CompileOutput::failed(vec![e.to_diagnostic()]),
    };
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    compile_text(&preprocessed.text, Some(&preprocessed.map), &file_name, options)
}

/// Compiles in-memory source with no preprocessing. Lines in diagnostics
/// refer directly to `source`; `file_name` labels them.
pub fn compile_source(source: &str, file_name: &str, options: &CompileOptions) -> CompileOutput {
    compile_text(source, None, file_name, options)
}

/// Runs the pipeline but discards the generated text.
pub fn check_file(path: &Path) -> CompileOutput {
    let mut output = compile_file(path, &CompileOptions::default());
    output.go_source.clear();
    output
}

fn compile_text(
    source: &str,
    line_map: Option<&LineMap>,
    file_name: &str,
    options: &CompileOptions,
) -> CompileOutput {
    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner).tokenize();

    let arenas = AstArenas::new();
    let ctx = AstContext::new(&arenas);
    let mut parser = Parser::new(&tokens, ctx, &interner, source);
    let program = parser.parse_program();
    if !parser.errors.is_empty() {
        let errors = remap(parser.errors, line_map, file_name);
        return CompileOutput::failed(errors);
    }

    let mut analyzer = Analyzer::new(&interner, source);
    analyzer.analyze(&program);
    let mut warnings = Vec::new();
    if !Analyzer::has_main(&program, &interner) {
        warnings.push(Diagnostic::warning(
            Phase::Semantic,
            "no Main sub defined; the generated program has an empty entry point",
        ));
    }
    if !analyzer.errors.is_empty() {
        let errors = remap(analyzer.errors, line_map, file_name);
        return CompileOutput { go_source: String::new(), errors, warnings };
    }

    let go_source = codegen::generate(
        &program,
        &analyzer.table,
        &analyzer.registry,
        &interner,
        line_map,
        file_name,
        &GenOptions { debug: options.debug },
    );

    CompileOutput { go_source, errors: Vec::new(), warnings: remap(warnings, line_map, file_name) }
}

/// Maps produced-line diagnostics back to original files and lines.
fn remap(diags: Vec<Diagnostic>, line_map: Option<&LineMap>, file_name: &str) -> Vec<Diagnostic> {
    diags
        .into_iter()
        .map(|mut diag| {
            if diag.file.is_none() {
                match line_map {
                    Some(map) if diag.line > 0 => {
                        if let Some((path, line)) = map.resolve(diag.line) {
                            diag.file = Some(
                                path.file_name()
                                    .map(|n| n.to_string_lossy().into_owned())
                                    .unwrap_or_else(|| path.display().to_string()),
                            );
                            diag.line = line;
                        }
                    }
                    _ => diag.file = Some(file_name.to_string()),
                }
            }
            diag
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_world_compiles() {
        let output = compile_source(
            "SUB Main()\nPRINT \"Hello, World!\"\nEND SUB\n",
            "main.dbas",
            &CompileOptions::default(),
        );
        assert!(output.succeeded(), "{:#?}", output.errors);
        assert!(output.go_source.contains("package main"));
        assert!(output.go_source.contains("func Main()"));
    }

    #[test]
    fn missing_main_is_a_warning_not_an_error() {
        let output = compile_source(
            "FUNCTION F() AS INTEGER\nRETURN 1\nEND FUNCTION\n",
            "lib.dbas",
            &CompileOptions::default(),
        );
        assert!(output.succeeded());
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].message.contains("Main"));
    }

    #[test]
    fn parse_errors_halt_before_analysis() {
        let output = compile_source("IF x > 0\nEND IF\n", "bad.dbas", &CompileOptions::default());
        assert!(!output.succeeded());
        assert!(output.go_source.is_empty());
        assert!(output.errors.iter().all(|e| e.phase == Phase::Parse));
    }

    #[test]
    fn semantic_errors_carry_the_file_name() {
        let output = compile_source(
            "DIM x AS INTEGER = \"hi\"\n",
            "typo.dbas",
            &CompileOptions::default(),
        );
        assert!(!output.succeeded());
        assert_eq!(output.errors[0].file.as_deref(), Some("typo.dbas"));
        assert_eq!(output.errors[0].phase, Phase::Semantic);
    }
}
