//! Emission-shape tests: operators, control flow, types, runtime
//! embedding, and the minimal-import guarantee.

mod common;
use common::compile_to_go;

fn in_main(body: &str) -> String {
    format!("SUB Main()\n{}\nEND SUB\n", body)
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn comparison_and_logical_operators_map_to_go() {
    let go = compile_to_go(&in_main(
        "DIM a AS BOOLEAN = 1 < 2\nDIM b AS BOOLEAN = 1 <> 2\nDIM c AS BOOLEAN = a AND b\nDIM d AS BOOLEAN = a OR NOT b",
    ));
    assert!(go.contains("(1 < 2)"), "{}", go);
    assert!(go.contains("(1 != 2)"), "{}", go);
    assert!(go.contains("(a && b)"), "{}", go);
    assert!(go.contains("(a || !(b))"), "{}", go);
}

#[test]
fn xor_expands_to_its_boolean_form() {
    let go = compile_to_go(&in_main("DIM a AS BOOLEAN = TRUE\nDIM b AS BOOLEAN = FALSE\nDIM c AS BOOLEAN = a XOR b"));
    assert!(go.contains("((a || b) && !(a && b))"), "{}", go);
}

#[test]
fn integer_division_and_mod() {
    let go = compile_to_go(&in_main("DIM a AS INTEGER = 7 \\ 2\nDIM b AS INTEGER = 7 MOD 2"));
    assert!(go.contains("(7 / 2)"), "{}", go);
    assert!(go.contains("(7 % 2)"), "{}", go);
}

#[test]
fn ampersand_concatenates_strings() {
    let go = compile_to_go(&in_main("DIM s AS STRING = \"a\" & \"b\""));
    assert!(go.contains("(\"a\" + \"b\")"), "{}", go);
}

#[test]
fn equality_comparison_maps_to_double_equals() {
    let go = compile_to_go(&in_main("DIM e AS BOOLEAN = 1 = 1"));
    assert!(go.contains("(1 == 1)"), "{}", go);
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn if_elseif_else_cascade() {
    let source = in_main(
        "DIM n AS INTEGER = 2\nIF n = 1 THEN\nPRINT 1\nELSEIF n = 2 THEN\nPRINT 2\nELSE\nPRINT 3\nEND IF",
    );
    let go = compile_to_go(&source);
    assert!(go.contains("if (n == 1) {"), "{}", go);
    assert!(go.contains("} else if (n == 2) {"), "{}", go);
    assert!(go.contains("} else {"), "{}", go);
}

#[test]
fn for_loop_counts_with_a_prebound_counter() {
    let go = compile_to_go(&in_main("FOR i = 1 TO 10\nPRINT i\nNEXT"));
    assert!(go.contains("var i int32"), "{}", go);
    assert!(go.contains("for i = 1; i <= 10; i += 1 {"), "{}", go);
}

#[test]
fn negative_literal_step_flips_the_condition() {
    let go = compile_to_go(&in_main("FOR i = 10 TO 1 STEP -1\nPRINT i\nNEXT"));
    assert!(go.contains("for i = 10; i >= 1; i += (-1) {"), "{}", go);
}

#[test]
fn sibling_for_loops_reuse_the_counter_name() {
    // Each loop's counter lives in its own brace scope, so two loops over
    // `i` must not redeclare in the same Go scope.
    let go = compile_to_go(&in_main(
        "FOR i = 1 TO 3\nPRINT i\nNEXT\nFOR i = 1 TO 3\nPRINT i\nNEXT",
    ));
    assert_eq!(go.matches("var i int32").count(), 2, "{}", go);
}

#[test]
fn while_wend_is_a_go_for() {
    let go = compile_to_go(&in_main("DIM x AS INTEGER = 0\nWHILE x < 3\nx = x + 1\nWEND"));
    assert!(go.contains("for (x < 3) {"), "{}", go);
}

#[test]
fn do_loop_post_condition_breaks_inside() {
    let go = compile_to_go(&in_main("DIM x AS INTEGER = 0\nDO\nx = x + 1\nLOOP UNTIL x > 3"));
    assert!(go.contains("for {"), "{}", go);
    assert!(go.contains("if (x > 3) {"), "{}", go);
    assert!(go.contains("break"), "{}", go);
}

#[test]
fn do_while_pre_condition_is_a_plain_loop() {
    let go = compile_to_go(&in_main("DIM x AS INTEGER = 0\nDO WHILE x < 3\nx = x + 1\nLOOP"));
    assert!(go.contains("for (x < 3) {"), "{}", go);
}

#[test]
fn select_case_becomes_a_switch() {
    let source = in_main(
        "DIM n AS INTEGER = 2\nSELECT CASE n\nCASE 1, 2\nPRINT \"low\"\nCASE 3\nPRINT \"three\"\nCASE ELSE\nPRINT \"high\"\nEND SELECT",
    );
    let go = compile_to_go(&source);
    assert!(go.contains("switch n {"), "{}", go);
    assert!(go.contains("case 1, 2:"), "{}", go);
    assert!(go.contains("default:"), "{}", go);
}

#[test]
fn exit_kinds_do_not_mix() {
    let source = "\
FUNCTION Find(limit AS INTEGER) AS INTEGER
    FOR i = 1 TO limit
        IF i = 3 THEN
            EXIT FUNCTION
        END IF
        IF i = 2 THEN
            EXIT FOR
        END IF
    NEXT
    RETURN limit
END FUNCTION
SUB Main()
    PRINT Find(10)
END SUB
";
    let go = compile_to_go(source);
    // EXIT FUNCTION inside the loop returns (with the zero value); EXIT FOR
    // breaks. The two must not swap.
    assert!(go.contains("return 0"), "{}", go);
    assert!(go.contains("break"), "{}", go);
}

#[test]
fn goto_and_label_emit_case_consistently() {
    let go = compile_to_go(&in_main("DIM x AS INTEGER = 0\nagain:\nx = x + 1\nIF x < 3 THEN\nGOTO AGAIN\nEND IF"));
    assert!(go.contains("again:"), "{}", go);
    assert!(go.contains("goto again"), "{}", go);
}

// =============================================================================
// PRINT and INPUT
// =============================================================================

#[test]
fn print_separators_build_one_format_string() {
    let go = compile_to_go(&in_main("PRINT 1, 2; 3"));
    assert!(go.contains("fmt.Printf(\"%v\\t%v%v\\n\", 1, 2, 3)"), "{}", go);
}

#[test]
fn trailing_semicolon_suppresses_the_newline() {
    let go = compile_to_go(&in_main("PRINT \"no newline\";"));
    assert!(go.contains("fmt.Printf(\"%v\", \"no newline\")"), "{}", go);
}

#[test]
fn input_reads_a_line_with_prompt() {
    let go = compile_to_go(&in_main("DIM name AS STRING\nINPUT \"name? \"; name"));
    assert!(go.contains("fmt.Print(\"name? \")"), "{}", go);
    assert!(go.contains("name = basReadLine()"), "{}", go);
    assert!(go.contains("bufio.NewReader(os.Stdin)"), "{}", go);
    for import in ["\"bufio\"", "\"os\"", "\"strings\""] {
        assert!(go.contains(import), "missing {}:\n{}", import, go);
    }
}

#[test]
fn numeric_input_converts_through_val() {
    let go = compile_to_go(&in_main("DIM n AS INTEGER\nINPUT n"));
    assert!(go.contains("n = int32(basVal(basReadLine()))"), "{}", go);
    assert!(go.contains("func basVal"), "{}", go);
}

// =============================================================================
// Types, methods, embedding
// =============================================================================

#[test]
fn struct_declaration_places_embeds_first() {
    let source = "\
TYPE Base
    id AS INTEGER
END TYPE
TYPE Dog IMPLEMENTS Speaker
    EMBED Base
    name AS STRING
END TYPE
SUB Main()
    DIM d AS Dog
    PRINT d.name
END SUB
";
    let go = compile_to_go(source);
    let decl = go.find("type Dog struct {").expect("Dog struct");
    let base = go[decl..].find("Base").expect("embedded Base") + decl;
    let name = go[decl..].find("name string").expect("name field") + decl;
    assert!(base < name, "embedded types precede named fields:\n{}", go);
    // Value-typed struct fields force declaration order.
    assert!(go.find("type Base struct {").unwrap() < decl, "{}", go);
}

#[test]
fn methods_emit_with_receivers() {
    let source = "\
TYPE Dog
    name AS STRING
END TYPE
FUNCTION (d AS Dog) Speak() AS STRING
    RETURN d.name
END FUNCTION
SUB (d AS POINTER TO Dog) Rename(name AS STRING)
    d.name = name
END SUB
SUB Main()
    DIM d AS Dog
    PRINT d.Speak()
END SUB
";
    let go = compile_to_go(source);
    assert!(go.contains("func (d Dog) Speak() string {"), "{}", go);
    assert!(go.contains("func (d *Dog) Rename(name string) {"), "{}", go);
}

#[test]
fn pointers_and_dereference() {
    let go = compile_to_go(&in_main("DIM x AS INTEGER = 1\nDIM p AS POINTER TO INTEGER\np = @x\n^p = 5\nPRINT ^p"));
    assert!(go.contains("var p *int32"), "{}", go);
    assert!(go.contains("p = &x"), "{}", go);
    assert!(go.contains("(*p) = 5"), "{}", go);
}

#[test]
fn reserved_words_are_suffixed() {
    let go = compile_to_go(&in_main("DIM type AS INTEGER = 1\nPRINT type"));
    assert!(go.contains("var type_ int32"), "{}", go);
}

#[test]
fn byref_parameters_become_pointers() {
    let source = "\
SUB Bump(BYREF n AS INTEGER)
    n = n + 1
END SUB
SUB Main()
    DIM x AS INTEGER = 1
    Bump(x)
    PRINT x
END SUB
";
    let go = compile_to_go(source);
    assert!(go.contains("func Bump(n *int32) {"), "{}", go);
    assert!(go.contains("(*n) = int32(((*n) + 1))"), "{}", go);
    assert!(go.contains("Bump(&x)"), "{}", go);
}

#[test]
fn slice_and_array_literals() {
    let go = compile_to_go(&in_main(
        "DIM xs AS []INTEGER = [1, 2, 3]\nDIM ys AS []STRING = []STRING{\"a\"}\nDIM zs(4) AS INTEGER\nzs[0] = 1",
    ));
    assert!(go.contains("[]int32{1, 2, 3}"), "{}", go);
    assert!(go.contains("[]string{\"a\"}"), "{}", go);
    assert!(go.contains("var zs [4]int32"), "{}", go);
}

#[test]
fn json_literals_and_helpers() {
    let source = in_main(
        "DIM j AS JSON = {\"name\": \"ada\", \"age\": 36}\nPRINT JSONStringify(j)\nDIM v AS ANY = JSONGet(j, \"name\")\nPRINT v",
    );
    let go = compile_to_go(&source);
    assert!(go.contains("map[string]interface{}{\"name\": \"ada\", \"age\": 36}"), "{}", go);
    assert!(go.contains("basJSONStringify(j)"), "{}", go);
    assert!(go.contains("func basJSONGet"), "{}", go);
    assert!(go.contains("\"encoding/json\""), "{}", go);
}

#[test]
fn byte_strings_emit_byte_slices() {
    let go = compile_to_go(&in_main("DIM b AS BYTES = B\"raw\"\nPRINT LenBytes(b)"));
    assert!(go.contains("[]byte(\"raw\")"), "{}", go);
    assert!(go.contains("basLenBytes(b)"), "{}", go);
}

// =============================================================================
// Error helpers
// =============================================================================

#[test]
fn error_helpers_carry_file_line_and_function() {
    let source = "\
FUNCTION Fail() AS ERROR
    RETURN NewError(\"boom\")
END FUNCTION
SUB Main()
    PRINT Fail()
END SUB
";
    let go = compile_to_go(source);
    assert!(
        go.contains("basNewErrorAt(\"test.dbas\", 2, \"Fail\", \"boom\")"),
        "{}",
        go
    );
    assert!(go.contains("type BasError struct {"), "{}", go);
}

#[test]
fn wrap_error_chains_a_cause() {
    let source = "\
FUNCTION Outer(cause AS ERROR) AS ERROR
    RETURN WrapError(cause, \"context\")
END FUNCTION
SUB Main()
END SUB
";
    let go = compile_to_go(source);
    assert!(go.contains("basWrapErrorAt(\"test.dbas\", 2, \"Outer\", cause, \"context\")"), "{}", go);
    assert!(go.contains("func (e *BasError) Unwrap() error"), "{}", go);
}

// =============================================================================
// Imports stay minimal
// =============================================================================

#[test]
fn no_spurious_imports_for_pure_arithmetic() {
    let go = compile_to_go("SUB Main()\nDIM x AS INTEGER = 1 + 2\nEND SUB\n");
    assert!(!go.contains("import"), "nothing to import:\n{}", go);
    assert!(!go.contains("\"fmt\""), "{}", go);
    assert!(!go.contains("\"math\""), "{}", go);
}

#[test]
fn print_pulls_exactly_fmt() {
    let go = compile_to_go(&in_main("PRINT 1"));
    assert!(go.contains("\"fmt\""), "{}", go);
    assert!(!go.contains("\"math\""), "{}", go);
    assert!(!go.contains("\"strings\""), "{}", go);
}

#[test]
fn runtime_units_embed_on_demand_only() {
    let with_strings = compile_to_go(&in_main("PRINT UCase(\"x\")"));
    assert!(with_strings.contains("func basUCase"), "{}", with_strings);
    assert!(!with_strings.contains("func basJSONParse"), "{}", with_strings);

    let without = compile_to_go(&in_main("PRINT 1"));
    assert!(!without.contains("func basUCase"), "{}", without);
}

#[test]
fn user_imports_emit_with_aliases() {
    let source = "IMPORT \"net/http\" AS web\nSUB Main()\nPRINT web.Get(\"url\")\nEND SUB\n";
    let go = compile_to_go(source);
    assert!(go.contains("web \"net/http\""), "{}", go);
    assert!(go.contains("web.Get(\"url\")"), "{}", go);
}

#[test]
fn math_builtins_import_math_once() {
    let go = compile_to_go(&in_main("PRINT Abs(-1.5)\nPRINT Sqr(2.0)\nPRINT PI()"));
    assert_eq!(go.matches("\"math\"").count(), 1, "{}", go);
    assert!(go.contains("math.Abs(float64((-1.5)))"), "{}", go);
    assert!(go.contains("math.Sqrt(float64(2.0))"), "{}", go);
    assert!(go.contains("math.Pi"), "{}", go);
}

// =============================================================================
// Type assertions
// =============================================================================

#[test]
fn type_assertion_emits_comma_ok() {
    let source = in_main(
        "DIM v AS ANY = NIL\nDIM n AS INTEGER\nDIM ok AS BOOLEAN\nn, ok = v AS INTEGER\nPRINT n; ok",
    );
    let go = compile_to_go(&source);
    assert!(go.contains("n, ok = v.(int32)"), "{}", go);
}
