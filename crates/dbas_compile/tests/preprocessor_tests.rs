//! Preprocessor behaviour over real files: splicing, line mapping, cycle
//! and depth failures, and diagnostics pointing into included files.

use std::fs;
use std::path::Path;

use dbas_compile::compile::{compile_file, CompileOptions};
use dbas_language::preprocess::{PreprocessError, Preprocessor, MAX_INCLUDE_DEPTH};

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn includes_splice_inline_with_sentinels() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "util.dbas", "FUNCTION Twice(n AS INTEGER) AS INTEGER\nRETURN n * 2\nEND FUNCTION\n");
    let root = write(
        dir.path(),
        "main.dbas",
        "INCLUDE \"util.dbas\"\nSUB Main()\nPRINT Twice(21)\nEND SUB\n",
    );

    let mut pre = Preprocessor::new();
    let result = pre.process(&root).expect("preprocess");
    assert!(result.text.contains("' ===== include: util.dbas ====="), "{}", result.text);
    assert!(result.text.contains("' ===== end include: util.dbas ====="), "{}", result.text);
    assert!(result.text.contains("FUNCTION Twice"), "{}", result.text);

    // Line 2 of the produced text is the first line of util.dbas.
    let (file, line) = result.map.resolve(2).expect("mapped line");
    assert!(file.ends_with("util.dbas"));
    assert_eq!(line, 1);
}

#[test]
fn included_program_compiles_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "util.dbas", "FUNCTION Twice(n AS INTEGER) AS INTEGER\nRETURN n * 2\nEND FUNCTION\n");
    let root = write(
        dir.path(),
        "main.dbas",
        "INCLUDE \"util.dbas\"\nSUB Main()\nPRINT Twice(21)\nEND SUB\n",
    );

    let output = compile_file(&root, &CompileOptions::default());
    assert!(output.succeeded(), "{:#?}", output.errors);
    assert!(output.go_source.contains("func Twice(n int32) int32"), "{}", output.go_source);
}

#[test]
fn nested_includes_resolve_relative_to_their_file() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("lib")).unwrap();
    write(dir.path(), "lib/inner.dbas", "CONST Answer AS INTEGER = 42\n");
    write(dir.path(), "lib/outer.dbas", "INCLUDE \"inner.dbas\"\n");
    let root = write(dir.path(), "main.dbas", "INCLUDE \"lib/outer.dbas\"\nSUB Main()\nPRINT Answer\nEND SUB\n");

    let output = compile_file(&root, &CompileOptions::default());
    assert!(output.succeeded(), "{:#?}", output.errors);
}

#[test]
fn include_cycle_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.dbas", "INCLUDE \"b.dbas\"\n");
    write(dir.path(), "b.dbas", "INCLUDE \"a.dbas\"\n");
    let root = dir.path().join("a.dbas");

    let mut pre = Preprocessor::new();
    let err = pre.process(&root).expect_err("cycle must fail");
    match &err {
        PreprocessError::Cycle { path, included_from } => {
            assert!(path.to_string_lossy().contains("a.dbas"));
            assert!(included_from.to_string_lossy().contains("b.dbas"));
        }
        other => panic!("expected a cycle, got {:?}", other),
    }

    // The driver surface: a preprocess-phase diagnostic naming both files.
    let output = compile_file(&root, &CompileOptions::default());
    assert!(!output.succeeded());
    let message = &output.errors[0].message;
    assert!(message.contains("circular include"), "{}", message);
    assert!(message.contains("a.dbas") && message.contains("b.dbas"), "{}", message);
}

#[test]
fn missing_include_reports_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let root = write(dir.path(), "main.dbas", "INCLUDE \"ghost.dbas\"\n");
    let output = compile_file(&root, &CompileOptions::default());
    assert!(!output.succeeded());
    let message = &output.errors[0].message;
    assert!(message.contains("ghost.dbas"), "{}", message);
    assert!(message.contains("main.dbas"), "{}", message);
}

#[test]
fn depth_limit_stops_runaway_chains() {
    let dir = tempfile::tempdir().unwrap();
    // Each file includes the next; the chain exceeds the cap.
    let last = MAX_INCLUDE_DEPTH + 2;
    for i in 0..last {
        let body = if i + 1 < last {
            format!("INCLUDE \"f{}.dbas\"\n", i + 1)
        } else {
            "PRINT 1\n".to_string()
        };
        write(dir.path(), &format!("f{}.dbas", i), &body);
    }
    let mut pre = Preprocessor::new();
    let err = pre.process(&dir.path().join("f0.dbas")).expect_err("depth must fail");
    assert!(matches!(err, PreprocessError::DepthExceeded { .. }), "{:?}", err);
}

#[test]
fn diagnostics_map_back_into_included_files() {
    let dir = tempfile::tempdir().unwrap();
    // The type error lives on line 1 of bad.dbas, not in main.dbas.
    write(dir.path(), "bad.dbas", "DIM oops AS INTEGER = \"hi\"\n");
    let root = write(dir.path(), "main.dbas", "INCLUDE \"bad.dbas\"\nSUB Main()\nEND SUB\n");

    let output = compile_file(&root, &CompileOptions::default());
    assert!(!output.succeeded());
    let diag = &output.errors[0];
    assert_eq!(diag.file.as_deref(), Some("bad.dbas"), "{:#?}", diag);
    assert_eq!(diag.line, 1);
}
