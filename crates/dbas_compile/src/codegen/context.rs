//! Emitter state shared across the code generator.
//!
//! [`GoContext`] carries the read side (interner, symbol table, type
//! registry, line map) and the write side: the set of Go standard-library
//! imports and runtime units the emitted program turned out to need.
//! Requirements are recorded while bodies are generated into a buffer; the
//! final unit is assembled afterwards, so the import block is exactly what
//! the program uses and nothing else.
//!
//! Variable kinds are tracked per subprogram (the way the analyzer's
//! scopes did, but flattened) because a few emissions (`INPUT`
//! conversions, `FOR` counters) depend on the declared type of a name.

use std::collections::{BTreeSet, HashMap, HashSet};

use dbas_base::Interner;
use dbas_language::ast::TypeSpec;
use dbas_language::preprocess::LineMap;

use super::runtime;
use crate::analysis::{SymbolTable, TypeRegistry};

/// Simplified declared type of a variable, for emissions that branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Integer,
    Long,
    Single,
    Double,
    Str,
    Boolean,
    Other,
}

impl VarKind {
    /// Classifies parsed type syntax.
    pub fn of_spec(spec: &TypeSpec<'_>, interner: &Interner) -> VarKind {
        if spec.is_pointer || spec.is_channel || spec.is_array || spec.package.is_some() {
            return VarKind::Other;
        }
        match interner.resolve(spec.name).to_ascii_uppercase().as_str() {
            "INTEGER" => VarKind::Integer,
            "LONG" => VarKind::Long,
            "SINGLE" => VarKind::Single,
            "DOUBLE" => VarKind::Double,
            "STRING" => VarKind::Str,
            "BOOLEAN" => VarKind::Boolean,
            _ => VarKind::Other,
        }
    }
}

/// Shared state for one emission run.
pub struct GoContext<'a> {
    pub interner: &'a Interner,
    pub table: &'a SymbolTable,
    pub registry: &'a TypeRegistry,
    pub line_map: Option<&'a LineMap>,
    /// Annotate emitted statements with source line comments.
    pub debug: bool,
    /// Root file name, used by error-helper rewriting when no line map
    /// entry covers a position.
    pub file_name: String,
    /// Go standard-library imports required so far (sorted, deduplicated).
    pub imports: BTreeSet<String>,
    /// Runtime units required so far.
    pub units: HashSet<&'static str>,
    /// Declared kinds of variables visible in the current subprogram.
    pub vars: HashMap<String, VarKind>,
    /// Upper-cased names of `BYREF` parameters of the current subprogram.
    pub byref: HashSet<String>,
    /// Enclosing subprogram name, for error-helper rewriting.
    pub current_fn: String,
    /// Declared return kinds of the current function, for widening wraps.
    pub current_returns: Vec<VarKind>,
    /// Zero values of the current function's returns, for `EXIT FUNCTION`.
    pub current_return_zeros: Vec<String>,
    /// Upper-cased `GOTO` targets in the current subprogram; labels not in
    /// this set are dropped (Go rejects unused labels).
    pub goto_targets: HashSet<String>,
    /// Upper-cased label name → declared casing, so `GOTO AGAIN` and
    /// `again:` agree in the emitted (case-sensitive) Go.
    pub label_names: HashMap<String, String>,
}

impl<'a> GoContext<'a> {
    pub fn new(
        interner: &'a Interner,
        table: &'a SymbolTable,
        registry: &'a TypeRegistry,
        line_map: Option<&'a LineMap>,
        file_name: &str,
        debug: bool,
    ) -> Self {
        GoContext {
            interner,
            table,
            registry,
            line_map,
            debug,
            file_name: file_name.to_string(),
            imports: BTreeSet::new(),
            units: HashSet::new(),
            vars: HashMap::new(),
            byref: HashSet::new(),
            current_fn: String::new(),
            current_returns: Vec::new(),
            current_return_zeros: Vec::new(),
            goto_targets: HashSet::new(),
            label_names: HashMap::new(),
        }
    }

    pub fn require_import(&mut self, import: &str) {
        self.imports.insert(import.to_string());
    }

    /// Requires a runtime unit, its transitive dependencies, and the Go
    /// imports they declare.
    pub fn require_unit(&mut self, name: &'static str) {
        if !self.units.insert(name) {
            return;
        }
        if let Some(unit) = runtime::unit(name) {
            for import in unit.imports {
                self.require_import(import);
            }
            for dep in unit.deps {
                self.require_unit(dep);
            }
        }
    }

    /// Records a variable's declared kind for the current subprogram.
    pub fn register_var(&mut self, name: &str, kind: VarKind) {
        self.vars.insert(name.to_ascii_uppercase(), kind);
    }

    pub fn var_kind(&self, name: &str) -> VarKind {
        self.vars
            .get(&name.to_ascii_uppercase())
            .copied()
            .unwrap_or(VarKind::Other)
    }

    pub fn is_byref(&self, name: &str) -> bool {
        self.byref.contains(&name.to_ascii_uppercase())
    }

    /// `(file, line)` a produced line maps back to, for error helpers and
    /// `-debug` annotations.
    pub fn resolve_line(&self, produced_line: u32) -> (String, u32) {
        if let Some(map) = self.line_map {
            if let Some((path, line)) = map.resolve(produced_line) {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                return (name, line);
            }
        }
        (self.file_name.clone(), produced_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_unit_pulls_declared_imports() {
        let interner = Interner::new();
        let table = SymbolTable::new();
        let registry = TypeRegistry::new();
        let mut ctx = GoContext::new(&interner, &table, &registry, None, "main.dbas", false);
        ctx.require_unit("inputx");
        assert!(ctx.units.contains("inputx"));
        for import in ["bufio", "os", "strings"] {
            assert!(ctx.imports.contains(import), "missing {}", import);
        }
    }

    #[test]
    fn var_kinds_are_case_insensitive() {
        let interner = Interner::new();
        let table = SymbolTable::new();
        let registry = TypeRegistry::new();
        let mut ctx = GoContext::new(&interner, &table, &registry, None, "main.dbas", false);
        ctx.register_var("Total", VarKind::Integer);
        assert_eq!(ctx.var_kind("TOTAL"), VarKind::Integer);
        assert_eq!(ctx.var_kind("other"), VarKind::Other);
    }

    #[test]
    fn resolve_line_falls_back_to_root_file() {
        let interner = Interner::new();
        let table = SymbolTable::new();
        let registry = TypeRegistry::new();
        let ctx = GoContext::new(&interner, &table, &registry, None, "main.dbas", false);
        assert_eq!(ctx.resolve_line(7), ("main.dbas".to_string(), 7));
    }
}
