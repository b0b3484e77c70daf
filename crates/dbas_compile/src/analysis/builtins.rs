//! Builtin function signatures.
//!
//! Before analysis, every builtin is inserted into the global scope with an
//! explicit signature. User code may not redefine these names; the normal
//! duplicate-definition check enforces that for free.
//!
//! Variadic builtins (`Printf`, `Sprintf`, `Errorf`) require at least their
//! fixed parameters; extra arguments are analysed but not type-checked.
//!
//! The Go-builtin passthroughs (`LEN`, `CAP`, `MAKE`, ...) are *not*
//! registered here; the analyzer special-cases them by name.

use super::symbols::{SymbolInfo, SymbolKind, SymbolTable};
use super::types::{FuncTy, Ty};

fn func(table: &mut SymbolTable, name: &str, params: Vec<Ty>, returns: Vec<Ty>) {
    let info = SymbolInfo::new(name, SymbolKind::Function, Ty::Function(FuncTy::new(params, returns)));
    let _ = table.define_global(info);
}

fn variadic(table: &mut SymbolTable, name: &str, params: Vec<Ty>, returns: Vec<Ty>) {
    let info = SymbolInfo::new(
        name,
        SymbolKind::Function,
        Ty::Function(FuncTy::variadic(params, returns)),
    );
    let _ = table.define_global(info);
}

fn sub(table: &mut SymbolTable, name: &str, params: Vec<Ty>) {
    let info = SymbolInfo::new(name, SymbolKind::Sub, Ty::Sub(FuncTy::new(params, Vec::new())));
    let _ = table.define_global(info);
}

/// Inserts the fixed builtin catalog into the global scope.
pub fn register_builtins(table: &mut SymbolTable) {
    use Ty::*;

    // String manipulation
    func(table, "Len", vec![Str], vec![Integer]);
    func(table, "Left", vec![Str, Integer], vec![Str]);
    func(table, "Right", vec![Str, Integer], vec![Str]);
    func(table, "Mid", vec![Str, Integer, Integer], vec![Str]);
    func(table, "Instr", vec![Str, Str], vec![Integer]);
    func(table, "UCase", vec![Str], vec![Str]);
    func(table, "LCase", vec![Str], vec![Str]);
    func(table, "Trim", vec![Str], vec![Str]);
    func(table, "LTrim", vec![Str], vec![Str]);
    func(table, "RTrim", vec![Str], vec![Str]);
    func(table, "Replace", vec![Str, Str, Str], vec![Str]);
    func(table, "Space", vec![Integer], vec![Str]);
    func(table, "Chr", vec![Integer], vec![Str]);
    func(table, "Asc", vec![Str], vec![Integer]);
    func(table, "Str", vec![Any], vec![Str]);
    func(table, "Val", vec![Str], vec![Double]);

    // Type conversion
    func(table, "Int", vec![Any], vec![Integer]);
    func(table, "Lng", vec![Any], vec![Long]);
    func(table, "Sng", vec![Any], vec![Single]);
    func(table, "Dbl", vec![Any], vec![Double]);
    func(table, "Bool", vec![Any], vec![Boolean]);
    func(table, "Encode", vec![Str], vec![Bytes]);
    func(table, "Decode", vec![Bytes], vec![Str]);
    func(table, "MakeBytes", vec![Integer], vec![Bytes]);
    func(table, "LenBytes", vec![Bytes], vec![Integer]);

    // Math
    func(table, "Abs", vec![Double], vec![Double]);
    func(table, "Sqr", vec![Double], vec![Double]);
    func(table, "Sin", vec![Double], vec![Double]);
    func(table, "Cos", vec![Double], vec![Double]);
    func(table, "Tan", vec![Double], vec![Double]);
    func(table, "Atn", vec![Double], vec![Double]);
    func(table, "Atn2", vec![Double, Double], vec![Double]);
    func(table, "Log", vec![Double], vec![Double]);
    func(table, "Log10", vec![Double], vec![Double]);
    func(table, "Exp", vec![Double], vec![Double]);
    func(table, "Pow", vec![Double, Double], vec![Double]);
    func(table, "Sgn", vec![Double], vec![Integer]);
    func(table, "Fix", vec![Double], vec![Integer]);
    func(table, "Floor", vec![Double], vec![Double]);
    func(table, "Ceil", vec![Double], vec![Double]);
    func(table, "Round", vec![Double], vec![Double]);
    func(table, "Min", vec![Double, Double], vec![Double]);
    func(table, "Max", vec![Double, Double], vec![Double]);
    func(table, "Clamp", vec![Double, Double, Double], vec![Double]);
    func(table, "PI", vec![], vec![Double]);

    // Random
    func(table, "Rnd", vec![], vec![Double]);
    func(table, "RndInt", vec![Integer], vec![Integer]);
    func(table, "RndRange", vec![Integer, Integer], vec![Integer]);
    sub(table, "Randomize", vec![]);

    // Time
    func(table, "Timer", vec![], vec![Double]);
    func(table, "Now", vec![], vec![Str]);
    func(table, "Date", vec![], vec![Str]);
    func(table, "Year", vec![], vec![Integer]);
    func(table, "Month", vec![], vec![Integer]);
    func(table, "Day", vec![], vec![Integer]);
    func(table, "Hour", vec![], vec![Integer]);
    func(table, "Minute", vec![], vec![Integer]);
    func(table, "Second", vec![], vec![Integer]);
    sub(table, "Sleep", vec![Double]);

    // File I/O
    func(table, "FileExists", vec![Str], vec![Boolean]);
    func(table, "ReadFile", vec![Str], vec![Str, Error]);
    func(table, "WriteFile", vec![Str, Str], vec![Error]);
    func(table, "AppendFile", vec![Str, Str], vec![Error]);
    func(table, "DeleteFile", vec![Str], vec![Error]);
    func(table, "MkDir", vec![Str], vec![Error]);
    func(table, "RmDir", vec![Str], vec![Error]);

    // Variadic formatting
    {
        let info = SymbolInfo::new(
            "Printf",
            SymbolKind::Sub,
            Ty::Sub(FuncTy::variadic(vec![Str], Vec::new())),
        );
        let _ = table.define_global(info);
    }
    variadic(table, "Sprintf", vec![Str], vec![Str]);

    // Errors
    func(table, "NewError", vec![Str], vec![Error]);
    variadic(table, "Errorf", vec![Str], vec![Error]);
    func(table, "WrapError", vec![Error, Str], vec![Error]);

    // JSON
    func(table, "JSONParse", vec![Str], vec![Json, Error]);
    func(table, "JSONStringify", vec![Any], vec![Str]);
    func(table, "JSONPretty", vec![Any], vec![Str]);
    func(table, "JSONGet", vec![Json, Str], vec![Any]);
    sub(table, "JSONSet", vec![Json, Str, Any]);
    func(table, "StructToJSON", vec![Any], vec![Str]);
    func(table, "JSONToStruct", vec![Str, Any], vec![Error]);
}

/// Go builtins handled by name instead of signature.
pub fn is_passthrough_builtin(upper: &str) -> bool {
    matches!(
        upper,
        "LEN" | "CAP" | "MAKE" | "COPY" | "DELETE" | "CLOSE" | "PANIC" | "RECOVER" | "STRING"
            | "RUNE" | "BYTE" | "NEW" | "APPEND"
    )
}

/// Result type of a passthrough builtin call, given its argument types.
pub fn passthrough_result(upper: &str, args: &[Ty]) -> Ty {
    match upper {
        "LEN" | "CAP" | "COPY" => Ty::Integer,
        "DELETE" | "CLOSE" | "PANIC" => Ty::Void,
        "RECOVER" | "MAKE" | "NEW" => Ty::Any,
        "STRING" => Ty::Str,
        "RUNE" | "BYTE" => Ty::Integer,
        "APPEND" => args.first().cloned().unwrap_or(Ty::Any),
        _ => Ty::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_land_in_the_global_scope() {
        let mut table = SymbolTable::new();
        register_builtins(&mut table);
        assert!(table.resolve("Len").is_some());
        assert!(table.resolve("JSONPARSE").is_some());
        assert!(table.resolve("sleep").is_some());
    }

    #[test]
    fn printf_is_variadic() {
        let mut table = SymbolTable::new();
        register_builtins(&mut table);
        match &table.resolve("Printf").unwrap().ty {
            Ty::Sub(sig) => assert!(sig.variadic),
            other => panic!("expected sub, got {other}"),
        }
    }

    #[test]
    fn read_file_returns_value_and_error() {
        let mut table = SymbolTable::new();
        register_builtins(&mut table);
        match &table.resolve("ReadFile").unwrap().ty {
            Ty::Function(sig) => assert_eq!(sig.returns, vec![Ty::Str, Ty::Error]),
            other => panic!("expected function, got {other}"),
        }
    }

    #[test]
    fn passthrough_names_are_recognised() {
        assert!(is_passthrough_builtin("LEN"));
        assert!(is_passthrough_builtin("APPEND"));
        assert!(!is_passthrough_builtin("LEFT"));
    }

    #[test]
    fn append_returns_its_collection_type() {
        let slice = Ty::Slice(Box::new(Ty::Integer));
        assert_eq!(passthrough_result("APPEND", &[slice.clone(), Ty::Integer]), slice);
    }
}
