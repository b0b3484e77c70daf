//! End-to-end pipeline scenarios: source text in, Go text (or diagnostics)
//! out.

mod common;
use common::{compile_raw, compile_to_go};

// =============================================================================
// Hello world
// =============================================================================

#[test]
fn hello_world_emits_a_complete_unit() {
    let go = compile_to_go("SUB Main()\n    PRINT \"Hello, World!\"\nEND SUB\n");

    let package = go.find("package main").expect("package header");
    let import = go.find("\"fmt\"").expect("fmt import");
    let func = go.find("func Main() {").expect("Main function");
    let print = go.find("fmt.Printf(\"%v\\n\", \"Hello, World!\")").expect("print call");
    let entry = go.find("func main() {").expect("entry point");

    // Assembly order: header, imports, functions, entry point.
    assert!(package < import, "imports follow the package header");
    assert!(import < func, "functions follow the imports");
    assert!(func < print, "the body lives in Main");
    assert!(print < entry, "the entry point comes last");
    assert!(go.contains("    Main()\n"), "main() calls Main():\n{}", go);
}

// =============================================================================
// Arithmetic with promotion
// =============================================================================

#[test]
fn power_promotes_to_float64_via_math_pow() {
    let go = compile_to_go("DIM x AS DOUBLE = 2 ^ 3\nSUB Main()\nEND SUB\n");
    assert!(go.contains("var x float64"), "{}", go);
    assert!(
        go.contains("math.Pow(float64(2), float64(3))"),
        "power uses the library function with widened operands:\n{}",
        go
    );
    assert!(go.contains("\"math\""), "math is imported:\n{}", go);
}

// =============================================================================
// Type mismatch
// =============================================================================

#[test]
fn type_mismatch_produces_exactly_one_semantic_error() {
    let output = compile_raw("DIM x AS INTEGER = \"hi\"\n");
    assert!(output.go_source.is_empty());
    assert_eq!(output.errors.len(), 1, "{:#?}", output.errors);
    let message = &output.errors[0].message;
    assert!(message.contains("type mismatch"), "{}", message);
    assert!(message.contains("INTEGER"), "{}", message);
    assert!(message.contains("STRING"), "{}", message);
}

// =============================================================================
// Multi-return and tuple assignment
// =============================================================================

#[test]
fn multi_return_function_emits_a_tuple() {
    let source = "\
FUNCTION Divide(a AS INTEGER, b AS INTEGER) AS (INTEGER, BOOLEAN)
    IF b = 0 THEN RETURN 0, FALSE ENDIF
    RETURN a / b, TRUE
END FUNCTION
SUB Main()
    DIM q AS INTEGER, DIM ok AS BOOLEAN
    q, ok = Divide(10, 2)
END SUB
";
    let go = compile_to_go(source);
    assert!(
        go.contains("func Divide(a int32, b int32) (int32, bool) {"),
        "{}",
        go
    );
    assert!(go.contains("q, ok = Divide(10, 2)"), "{}", go);
    assert!(go.contains("return 0, false"), "{}", go);
}

// =============================================================================
// Channels
// =============================================================================

#[test]
fn channel_roundtrip_emits_make_send_and_receive() {
    let source = "\
SUB Main()
    DIM ch AS CHAN OF INTEGER = MAKE_CHAN(INTEGER, 1)
    SEND 42 TO ch
    DIM x AS INTEGER
    RECEIVE x FROM ch
    PRINT x
END SUB
";
    let go = compile_to_go(source);
    assert!(go.contains("var ch chan int32 = make(chan int32, 1)"), "{}", go);
    assert!(go.contains("ch <- 42"), "{}", go);
    assert!(go.contains("x = <-ch"), "{}", go);
}

#[test]
fn spawn_emits_a_goroutine() {
    let source = "\
SUB Worker(n AS INTEGER)
    PRINT n
END SUB
SUB Main()
    SPAWN Worker(1)
END SUB
";
    let go = compile_to_go(source);
    assert!(go.contains("go Worker(1)"), "{}", go);
}

// =============================================================================
// Warnings
// =============================================================================

#[test]
fn missing_main_warns_but_compiles() {
    let output = compile_raw("FUNCTION F() AS INTEGER\nRETURN 7\nEND FUNCTION\n");
    assert!(output.succeeded(), "{:#?}", output.errors);
    assert_eq!(output.warnings.len(), 1);
    assert!(output.warnings[0].message.contains("Main"));
    // The unit still has a (now empty) entry point.
    assert!(output.go_source.contains("func main() {\n}"), "{}", output.go_source);
}

// =============================================================================
// Error rendering
// =============================================================================

#[test]
fn semantic_errors_render_with_snippet_and_caret() {
    let output = compile_raw("SUB Main()\n    PRINT missing\nEND SUB\n");
    assert!(!output.succeeded());
    let rendered = output.errors[0].to_string();
    assert!(rendered.contains("semantic error at line 2"), "{}", rendered);
    assert!(rendered.contains("PRINT missing"), "{}", rendered);
    assert!(rendered.contains('^'), "{}", rendered);
}

#[test]
fn parse_error_hints_mention_then() {
    let output = compile_raw("SUB Main()\nIF 1 > 0\nPRINT 1\nEND IF\nEND SUB\n");
    assert!(!output.succeeded());
    assert!(
        output
            .errors
            .iter()
            .any(|e| e.hint.as_deref() == Some("IF statements require THEN")),
        "{:#?}",
        output.errors
    );
}

// =============================================================================
// Debug annotations
// =============================================================================

#[test]
fn debug_mode_annotates_statements_with_lines() {
    use dbas_compile::compile::{compile_source, CompileOptions};
    let output = compile_source(
        "SUB Main()\n    PRINT 1\nEND SUB\n",
        "main.dbas",
        &CompileOptions { debug: true },
    );
    assert!(output.succeeded());
    assert!(output.go_source.contains("// line 2"), "{}", output.go_source);
}
