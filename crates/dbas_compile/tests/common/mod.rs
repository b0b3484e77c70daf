//! Shared helpers for the integration tests.

use dbas_compile::compile::{compile_source, CompileOptions, CompileOutput};

/// Compiles source text to Go, panicking on any diagnostic.
pub fn compile_to_go(source: &str) -> String {
    let output = compile_source(source, "test.dbas", &CompileOptions::default());
    assert!(
        output.errors.is_empty(),
        "unexpected errors:\n{:#?}\nsource:\n{}",
        output.errors,
        source
    );
    output.go_source
}

/// Compiles source text, returning the full output for diagnostic checks.
pub fn compile_raw(source: &str) -> CompileOutput {
    compile_source(source, "test.dbas", &CompileOptions::default())
}

/// Error messages produced for the given source.
#[allow(dead_code)]
pub fn compile_errors(source: &str) -> Vec<String> {
    compile_raw(source).errors.into_iter().map(|e| e.message).collect()
}
