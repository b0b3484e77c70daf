//! Scopes, symbols, and the import table.
//!
//! Scopes form a tree rooted at the global scope; the table keeps a cursor
//! into the tree and resolution walks parent links to the root. Symbol and
//! label keys fold to upper case at insert and lookup, the single place
//! identifier case-insensitivity is implemented.
//!
//! Scopes are stored in a flat `Vec` and addressed by [`ScopeId`]; popping
//! only moves the cursor, so symbols stay reachable through their owning
//! scope for the rest of the compile (codegen reads them back).

use rustc_hash::FxHashMap;

use super::types::Ty;

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Constant,
    Function,
    Sub,
    Parameter,
    Label,
    Import,
}

/// One resolved name.
#[derive(Debug, Clone)]
pub struct SymbolInfo {
    /// Name with its original casing, for emission.
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Ty,
    pub is_by_ref: bool,
}

impl SymbolInfo {
    pub fn new(name: &str, kind: SymbolKind, ty: Ty) -> Self {
        SymbolInfo { name: name.to_string(), kind, ty, is_by_ref: false }
    }
}

/// Index of a scope in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

/// A named frame in the scope tree.
#[derive(Debug)]
pub struct Scope {
    pub name: String,
    pub parent: Option<ScopeId>,
    symbols: FxHashMap<String, SymbolInfo>,
    labels: FxHashMap<String, String>,
}

impl Scope {
    fn new(name: &str, parent: Option<ScopeId>) -> Self {
        Scope {
            name: name.to_string(),
            parent,
            symbols: FxHashMap::default(),
            labels: FxHashMap::default(),
        }
    }
}

/// One imported package.
#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub path: String,
    /// Effective alias: explicit alias if given, else the last path segment.
    pub alias: String,
    /// True when the alias was written in source.
    pub explicit: bool,
}

/// The scope tree plus the import table.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
    imports: Vec<ImportInfo>,
    import_index: FxHashMap<String, usize>,
}

fn fold(name: &str) -> String {
    name.to_ascii_uppercase()
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new("global", None)],
            current: ScopeId::GLOBAL,
            imports: Vec::new(),
            import_index: FxHashMap::default(),
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn scope_name(&self, id: ScopeId) -> &str {
        &self.scopes[id.0].name
    }

    /// Enters a child scope of the current one.
    pub fn push_scope(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope::new(name, Some(self.current)));
        self.current = id;
        id
    }

    /// Returns to the parent scope. The popped scope's symbols persist.
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current.0].parent {
            self.current = parent;
        }
    }

    /// Defines a symbol in the current scope.
    ///
    /// Fails when the name is already bound *in this scope*; shadowing an
    /// outer binding is allowed.
    pub fn define(&mut self, info: SymbolInfo) -> Result<(), SymbolInfo> {
        let key = fold(&info.name);
        let scope = &mut self.scopes[self.current.0];
        if let Some(existing) = scope.symbols.get(&key) {
            return Err(existing.clone());
        }
        scope.symbols.insert(key, info);
        Ok(())
    }

    /// Defines a symbol directly in the global scope.
    pub fn define_global(&mut self, info: SymbolInfo) -> Result<(), SymbolInfo> {
        let key = fold(&info.name);
        let scope = &mut self.scopes[0];
        if let Some(existing) = scope.symbols.get(&key) {
            return Err(existing.clone());
        }
        scope.symbols.insert(key, info);
        Ok(())
    }

    /// Resolves a name from the current scope outward to the root.
    pub fn resolve(&self, name: &str) -> Option<&SymbolInfo> {
        let key = fold(name);
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(info) = self.scopes[id.0].symbols.get(&key) {
                return Some(info);
            }
            scope = self.scopes[id.0].parent;
        }
        None
    }

    /// Resolves in the global scope only.
    pub fn resolve_global(&self, name: &str) -> Option<&SymbolInfo> {
        self.scopes[0].symbols.get(&fold(name))
    }

    /// True if the name resolves to something in scope right now.
    pub fn is_defined(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// True when the name is bound in the current scope itself.
    pub fn defined_here(&self, name: &str) -> bool {
        self.scopes[self.current.0].symbols.contains_key(&fold(name))
    }

    // =========================================================================
    // Labels: local to their defining scope
    // =========================================================================

    /// Defines a label in the current scope; `false` on duplicates.
    pub fn define_label(&mut self, name: &str) -> bool {
        let scope = &mut self.scopes[self.current.0];
        scope.labels.insert(fold(name), name.to_string()).is_none()
    }

    /// Labels resolve only within the scope that defined them.
    pub fn resolve_label(&self, name: &str) -> Option<&str> {
        self.scopes[self.current.0]
            .labels
            .get(&fold(name))
            .map(String::as_str)
    }

    // =========================================================================
    // Imports
    // =========================================================================

    /// Registers an import; the effective alias is the explicit one or the
    /// last `/` segment of the path. Returns the effective alias, or `Err`
    /// with the alias when it is already taken.
    pub fn add_import(&mut self, path: &str, alias: Option<&str>) -> Result<String, String> {
        let effective = match alias {
            Some(a) => a.to_string(),
            None => path.rsplit('/').next().unwrap_or(path).to_string(),
        };
        let key = fold(&effective);
        if self.import_index.contains_key(&key) {
            return Err(effective);
        }
        self.import_index.insert(key, self.imports.len());
        self.imports.push(ImportInfo {
            path: path.to_string(),
            alias: effective.clone(),
            explicit: alias.is_some(),
        });
        Ok(effective)
    }

    /// Case-insensitive import lookup by effective alias.
    pub fn import_by_alias(&self, alias: &str) -> Option<&ImportInfo> {
        self.import_index.get(&fold(alias)).map(|&i| &self.imports[i])
    }

    /// Registration-ordered imports.
    pub fn imports(&self) -> &[ImportInfo] {
        &self.imports
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, ty: Ty) -> SymbolInfo {
        SymbolInfo::new(name, SymbolKind::Variable, ty)
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let mut table = SymbolTable::new();
        table.define(var("counter", Ty::Integer)).unwrap();
        assert!(table.resolve("COUNTER").is_some());
        assert!(table.resolve("Counter").is_some());
    }

    #[test]
    fn resolution_walks_to_the_root() {
        let mut table = SymbolTable::new();
        table.define(var("g", Ty::Str)).unwrap();
        table.push_scope("Inner");
        table.push_scope("Innermost");
        assert!(table.resolve("g").is_some());
    }

    #[test]
    fn inner_scopes_shadow_outer_ones() {
        let mut table = SymbolTable::new();
        table.define(var("x", Ty::Integer)).unwrap();
        table.push_scope("f");
        table.define(var("x", Ty::Str)).unwrap();
        assert_eq!(table.resolve("x").unwrap().ty, Ty::Str);
        table.pop_scope();
        assert_eq!(table.resolve("x").unwrap().ty, Ty::Integer);
    }

    #[test]
    fn duplicates_in_same_scope_are_rejected() {
        let mut table = SymbolTable::new();
        table.define(var("x", Ty::Integer)).unwrap();
        assert!(table.define(var("X", Ty::Integer)).is_err());
    }

    #[test]
    fn popped_scope_symbols_are_not_reachable() {
        let mut table = SymbolTable::new();
        table.push_scope("f");
        table.define(var("local", Ty::Integer)).unwrap();
        table.pop_scope();
        assert!(table.resolve("local").is_none());
    }

    #[test]
    fn labels_are_scope_local() {
        let mut table = SymbolTable::new();
        table.push_scope("f");
        assert!(table.define_label("again"));
        assert!(table.resolve_label("AGAIN").is_some());
        table.pop_scope();
        assert!(table.resolve_label("again").is_none());
    }

    #[test]
    fn import_alias_defaults_to_last_segment() {
        let mut table = SymbolTable::new();
        let alias = table.add_import("net/http", None).unwrap();
        assert_eq!(alias, "http");
        assert!(table.import_by_alias("HTTP").is_some());
    }

    #[test]
    fn explicit_alias_wins() {
        let mut table = SymbolTable::new();
        let alias = table.add_import("net/http", Some("web")).unwrap();
        assert_eq!(alias, "web");
        assert!(table.import_by_alias("web").is_some());
        assert!(table.import_by_alias("http").is_none());
    }

    #[test]
    fn duplicate_aliases_are_rejected() {
        let mut table = SymbolTable::new();
        table.add_import("net/http", None).unwrap();
        assert!(table.add_import("other/http", None).is_err());
    }
}
