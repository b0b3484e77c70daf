//! The runtime helper catalog.
//!
//! Helpers are real Go source files under `runtime/`, embedded into the
//! compiler binary at build time. Each catalog entry declares the unit's
//! dependencies on other units and the Go standard-library imports its code
//! needs; codegen embeds the transitive closure of the units a program
//! touches and merges their import lists into the emitted import block.
//!
//! The embedded text is the file minus its `package` line and `import`
//! block; those belong to the generated compilation unit, not the helper.

use include_dir::{include_dir, Dir};

static RUNTIME_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/runtime");

/// One embeddable helper unit.
pub struct RuntimeUnit {
    pub name: &'static str,
    file: &'static str,
    /// Other units this unit's code calls into.
    pub deps: &'static [&'static str],
    /// Go standard-library imports the unit's code requires.
    pub imports: &'static [&'static str],
}

/// The fixed catalog, in emission order.
pub const RUNTIME_UNITS: &[RuntimeUnit] = &[
    RuntimeUnit { name: "strings", file: "strings.go", deps: &[], imports: &["strings"] },
    RuntimeUnit {
        name: "conv",
        file: "conv.go",
        deps: &[],
        imports: &["fmt", "strconv", "strings"],
    },
    RuntimeUnit { name: "mathx", file: "mathx.go", deps: &[], imports: &[] },
    RuntimeUnit {
        name: "random",
        file: "random.go",
        deps: &[],
        imports: &["math/rand", "time"],
    },
    RuntimeUnit { name: "timex", file: "timex.go", deps: &[], imports: &["time"] },
    RuntimeUnit { name: "fileio", file: "fileio.go", deps: &[], imports: &["os"] },
    RuntimeUnit {
        name: "inputx",
        file: "inputx.go",
        deps: &[],
        imports: &["bufio", "os", "strings"],
    },
    RuntimeUnit { name: "printf", file: "printf.go", deps: &[], imports: &["fmt"] },
    RuntimeUnit { name: "errorx", file: "errorx.go", deps: &[], imports: &["fmt"] },
    RuntimeUnit {
        name: "jsonx",
        file: "jsonx.go",
        deps: &[],
        imports: &["encoding/json", "strings"],
    },
];

pub fn unit(name: &str) -> Option<&'static RuntimeUnit> {
    RUNTIME_UNITS.iter().find(|u| u.name == name)
}

/// The helper body: embedded file minus package/import header.
pub fn unit_source(unit: &RuntimeUnit) -> String {
    let raw = RUNTIME_DIR
        .get_file(unit.file)
        .and_then(|f| f.contents_utf8())
        .unwrap_or_default();
    strip_header(raw)
}

fn strip_header(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_import_block = false;
    for line in source.lines() {
        let trimmed = line.trim_start();
        if in_import_block {
            if trimmed.starts_with(')') {
                in_import_block = false;
            }
            continue;
        }
        if trimmed.starts_with("package ") {
            continue;
        }
        if trimmed.starts_with("import (") {
            in_import_block = true;
            continue;
        }
        if trimmed.starts_with("import ") {
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    // Collapse the leading blank lines left by the stripped header.
    let body = out.trim_start_matches('\n');
    body.trim_end().to_string()
}

/// Maps an upper-cased builtin name to `(helper function, unit)` when the
/// builtin is implemented by an embedded helper. Builtins that map straight
/// onto the Go standard library (`Abs` → `math.Abs`) are not listed here;
/// see [`super::expr`] for those.
pub fn helper_for_builtin(upper: &str) -> Option<(&'static str, &'static str)> {
    let entry = match upper {
        // strings unit
        "LEFT" => ("basLeft", "strings"),
        "RIGHT" => ("basRight", "strings"),
        "MID" => ("basMid", "strings"),
        "INSTR" => ("basInstr", "strings"),
        "UCASE" => ("basUCase", "strings"),
        "LCASE" => ("basLCase", "strings"),
        "TRIM" => ("basTrim", "strings"),
        "LTRIM" => ("basLTrim", "strings"),
        "RTRIM" => ("basRTrim", "strings"),
        "REPLACE" => ("basReplace", "strings"),
        "SPACE" => ("basSpace", "strings"),
        "CHR" => ("basChr", "strings"),
        "ASC" => ("basAsc", "strings"),
        // conv unit
        "STR" => ("basStr", "conv"),
        "VAL" => ("basVal", "conv"),
        "INT" => ("basInt", "conv"),
        "LNG" => ("basLng", "conv"),
        "SNG" => ("basSng", "conv"),
        "DBL" => ("basDbl", "conv"),
        "BOOL" => ("basBool", "conv"),
        "ENCODE" => ("basEncode", "conv"),
        "DECODE" => ("basDecode", "conv"),
        "MAKEBYTES" => ("basMakeBytes", "conv"),
        "LENBYTES" => ("basLenBytes", "conv"),
        // mathx unit
        "SGN" => ("basSgn", "mathx"),
        "CLAMP" => ("basClamp", "mathx"),
        // random unit
        "RND" => ("basRnd", "random"),
        "RNDINT" => ("basRndInt", "random"),
        "RNDRANGE" => ("basRndRange", "random"),
        "RANDOMIZE" => ("basRandomize", "random"),
        // timex unit
        "TIMER" => ("basTimer", "timex"),
        "NOW" => ("basNow", "timex"),
        "DATE" => ("basDate", "timex"),
        "YEAR" => ("basYear", "timex"),
        "MONTH" => ("basMonth", "timex"),
        "DAY" => ("basDay", "timex"),
        "HOUR" => ("basHour", "timex"),
        "MINUTE" => ("basMinute", "timex"),
        "SECOND" => ("basSecond", "timex"),
        "SLEEP" => ("basSleep", "timex"),
        // fileio unit
        "FILEEXISTS" => ("basFileExists", "fileio"),
        "READFILE" => ("basReadFile", "fileio"),
        "WRITEFILE" => ("basWriteFile", "fileio"),
        "APPENDFILE" => ("basAppendFile", "fileio"),
        "DELETEFILE" => ("basDeleteFile", "fileio"),
        "MKDIR" => ("basMkDir", "fileio"),
        "RMDIR" => ("basRmDir", "fileio"),
        // printf unit
        "PRINTF" => ("basPrintf", "printf"),
        "SPRINTF" => ("basSprintf", "printf"),
        // errorx unit (site arguments injected by codegen)
        "NEWERROR" => ("basNewErrorAt", "errorx"),
        "ERRORF" => ("basErrorfAt", "errorx"),
        "WRAPERROR" => ("basWrapErrorAt", "errorx"),
        // jsonx unit
        "JSONPARSE" => ("basJSONParse", "jsonx"),
        "JSONSTRINGIFY" => ("basJSONStringify", "jsonx"),
        "JSONPRETTY" => ("basJSONPretty", "jsonx"),
        "JSONGET" => ("basJSONGet", "jsonx"),
        "JSONSET" => ("basJSONSet", "jsonx"),
        "STRUCTTOJSON" => ("basStructToJSON", "jsonx"),
        "JSONTOSTRUCT" => ("basJSONToStruct", "jsonx"),
        _ => return None,
    };
    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_unit_file_is_embedded() {
        for unit in RUNTIME_UNITS {
            let source = unit_source(unit);
            assert!(!source.is_empty(), "missing runtime file {}", unit.file);
        }
    }

    #[test]
    fn embedded_source_has_no_package_or_import_lines() {
        for unit in RUNTIME_UNITS {
            let source = unit_source(unit);
            for line in source.lines() {
                let trimmed = line.trim_start();
                assert!(!trimmed.starts_with("package "), "{}: {}", unit.name, line);
                assert!(!trimmed.starts_with("import"), "{}: {}", unit.name, line);
            }
        }
    }

    #[test]
    fn every_helper_maps_to_a_known_unit() {
        for name in ["LEFT", "VAL", "RND", "JSONGET", "NEWERROR", "SLEEP"] {
            let (_, unit_name) = helper_for_builtin(name).unwrap();
            assert!(unit(unit_name).is_some(), "unknown unit for {}", name);
        }
    }

    #[test]
    fn strings_unit_contains_left_helper() {
        let source = unit_source(unit("strings").unwrap());
        assert!(source.contains("func basLeft(s string, n int32) string"));
    }

    #[test]
    fn unknown_builtins_have_no_helper() {
        assert!(helper_for_builtin("ABS").is_none());
        assert!(helper_for_builtin("NOPE").is_none());
    }
}
