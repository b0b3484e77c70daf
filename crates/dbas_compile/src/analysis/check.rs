//! The semantic analyzer.
//!
//! Analysis runs in ordered passes so forward references inside bodies
//! resolve without declaration-order gymnastics in user code:
//!
//! 1. **Imports** — `(path, effective alias)` into the import table.
//! 2. **Type declarations** — name shells first, then resolved field lists,
//!    so struct fields may reference structs declared later in the file.
//! 3. **Signatures** — functions, subs, and methods land in the global
//!    scope (methods keyed `ReceiverType.Name`).
//! 4. **Globals** — top-level `DIM` and `CONST`.
//! 5. **Bodies** — every statement, with scopes pushed for subprogram
//!    bodies and for `FOR`/`WHILE`/`DO` blocks.
//!
//! Errors accumulate; analysis continues whenever the state stays
//! recoverable, and expression checking returns [`Ty::Unknown`] after a
//! reported error so one mistake does not cascade.

use dbas_base::Interner;
use dbas_language::ast::{Block, Expr, Stmt, TypeSpec};
use dbas_language::diagnostic::{Diagnostic, Phase};
use dbas_language::token::{Token, TokenKind};

use super::builtins::{is_passthrough_builtin, passthrough_result, register_builtins};
use super::registry::TypeRegistry;
use super::symbols::{SymbolInfo, SymbolKind, SymbolTable};
use super::types::{ExternalTy, FuncTy, StructField, StructTy, Ty};

/// What kind of subprogram body is being analyzed.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    TopLevel,
    Sub,
    Function,
}

/// Result of resolving a call's target.
enum CallTarget {
    /// A resolved signature and the name it was found under.
    Sig(FuncTy, String),
    /// External or `ANY`: analyse arguments, assume nothing.
    Opaque,
    NotCallable(Ty),
    Undefined(String),
}

/// The three-structure semantic checker: scope tree, type registry,
/// accumulated diagnostics.
pub struct Analyzer<'i> {
    pub table: SymbolTable,
    pub registry: TypeRegistry,
    pub errors: Vec<Diagnostic>,
    interner: &'i Interner,
    source: &'i str,
    body_kind: BodyKind,
    current_returns: Vec<Ty>,
    loop_depth: usize,
}

impl<'i> Analyzer<'i> {
    pub fn new(interner: &'i Interner, source: &'i str) -> Self {
        let mut table = SymbolTable::new();
        register_builtins(&mut table);
        Analyzer {
            table,
            registry: TypeRegistry::new(),
            errors: Vec::new(),
            interner,
            source,
            body_kind: BodyKind::TopLevel,
            current_returns: Vec::new(),
            loop_depth: 0,
        }
    }

    /// Runs all passes over a parsed program.
    pub fn analyze(&mut self, program: &[Stmt<'_>]) {
        self.pass_imports(program);
        self.pass_types(program);
        self.pass_signatures(program);
        self.pass_globals(program);
        self.pass_bodies(program);
    }

    /// True when the program declares a `Main` sub (case-insensitive).
    pub fn has_main(program: &[Stmt<'_>], interner: &Interner) -> bool {
        program.iter().any(|stmt| match stmt {
            Stmt::Sub { name, .. } => interner.resolve(*name).eq_ignore_ascii_case("main"),
            _ => false,
        })
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn error(&mut self, token: Token, message: String) {
        let mut diag = Diagnostic::error(Phase::Semantic, message)
            .at(token.pos.line, Some(token.pos.col));
        if let Some(line) = self.source.lines().nth(token.pos.line as usize - 1) {
            diag = diag.with_snippet(line);
        }
        self.errors.push(diag);
    }

    fn error_hint(&mut self, token: Token, message: String, hint: &str) {
        let mut diag = Diagnostic::error(Phase::Semantic, message)
            .at(token.pos.line, Some(token.pos.col))
            .with_hint(hint);
        if let Some(line) = self.source.lines().nth(token.pos.line as usize - 1) {
            diag = diag.with_snippet(line);
        }
        self.errors.push(diag);
    }

    fn name(&self, sym: dbas_base::Symbol) -> &'i str {
        self.interner.resolve(sym)
    }

    // =========================================================================
    // Pass 1: imports
    // =========================================================================

    fn pass_imports(&mut self, program: &[Stmt<'_>]) {
        for stmt in program {
            if let Stmt::Import { token, path, alias } = stmt {
                let path = self.name(*path).to_string();
                let alias = alias.map(|a| self.name(a).to_string());
                match self.table.add_import(&path, alias.as_deref()) {
                    Ok(effective) => {
                        let info = SymbolInfo::new(&effective, SymbolKind::Import, Ty::Any);
                        if self.table.define_global(info).is_err() {
                            self.error(
                                *token,
                                format!("import alias '{}' collides with an existing name", effective),
                            );
                        }
                    }
                    Err(taken) => {
                        self.error(*token, format!("duplicate import alias '{}'", taken));
                    }
                }
            }
        }
    }

    // =========================================================================
    // Pass 2: type declarations
    // =========================================================================

    fn pass_types(&mut self, program: &[Stmt<'_>]) {
        // Phase A: shells, so fields can reference any declared type.
        for stmt in program {
            if let Stmt::TypeDecl { token, name, .. } = stmt {
                let name = self.name(*name).to_string();
                let shell = Ty::Struct(StructTy {
                    name: name.clone(),
                    implements: None,
                    embedded: Vec::new(),
                    fields: Vec::new(),
                });
                if !self.registry.insert(&name, shell) {
                    self.error(*token, format!("duplicate TYPE '{}'", name));
                }
            }
        }

        // Phase B: resolved field lists.
        for stmt in program {
            if let Stmt::TypeDecl { name, implements, embedded, fields, .. } = stmt {
                let name = self.name(*name).to_string();
                let implements = implements.map(|i| self.name(i).to_string());
                let embedded: Vec<String> =
                    embedded.iter().map(|e| self.name(*e).to_string()).collect();
                for base in &embedded {
                    if self.registry.get(base).is_none() {
                        self.error(
                            stmt.token(),
                            format!("unknown embedded type '{}' in TYPE '{}'", base, name),
                        );
                    }
                }
                let fields: Vec<StructField> = fields
                    .iter()
                    .map(|f| StructField {
                        name: self.name(f.name).to_string(),
                        ty: self.resolve_type_spec(f.ty),
                    })
                    .collect();
                let resolved = Ty::Struct(StructTy { name: name.clone(), implements, embedded, fields });
                self.registry.replace(&name, resolved);
            }
        }
    }

    // =========================================================================
    // Pass 3: signatures
    // =========================================================================

    fn pass_signatures(&mut self, program: &[Stmt<'_>]) {
        for stmt in program {
            match stmt {
                Stmt::Sub { token, name, params, .. } => {
                    let sig = self.resolve_signature(params, &[]);
                    let name = self.name(*name).to_string();
                    let info = SymbolInfo::new(&name, SymbolKind::Sub, Ty::Sub(sig));
                    if self.table.define_global(info).is_err() {
                        self.error(*token, format!("duplicate definition of '{}'", name));
                    }
                }
                Stmt::Function { token, name, params, returns, .. } => {
                    let sig = self.resolve_signature(params, returns);
                    let name = self.name(*name).to_string();
                    let info = SymbolInfo::new(&name, SymbolKind::Function, Ty::Function(sig));
                    if self.table.define_global(info).is_err() {
                        self.error(*token, format!("duplicate definition of '{}'", name));
                    }
                }
                Stmt::Method { token, receiver_type, name, params, returns, .. } => {
                    let sig = self.resolve_signature(params, returns);
                    let recv_name = self.receiver_type_name(receiver_type);
                    let key = format!("{}.{}", recv_name, self.name(*name));
                    let kind = if returns.is_empty() { SymbolKind::Sub } else { SymbolKind::Function };
                    let ty = if returns.is_empty() { Ty::Sub(sig) } else { Ty::Function(sig) };
                    let info = SymbolInfo::new(&key, kind, ty);
                    if self.table.define_global(info).is_err() {
                        self.error(*token, format!("duplicate definition of method '{}'", key));
                    }
                    if self.registry.get(&recv_name).is_none() {
                        self.error(
                            *token,
                            format!("method receiver names unknown TYPE '{}'", recv_name),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn resolve_signature(&mut self, params: &[dbas_language::ast::Param<'_>], returns: &[TypeSpec<'_>]) -> FuncTy {
        let mut sig = FuncTy::new(
            params.iter().map(|p| self.resolve_type_spec(p.ty)).collect(),
            returns.iter().map(|r| self.resolve_type_spec(r)).collect(),
        );
        sig.by_ref = params.iter().map(|p| p.by_ref).collect();
        sig
    }

    /// The registry key a method receiver refers to: the base struct name,
    /// through one level of pointer if present.
    fn receiver_type_name(&self, spec: &TypeSpec<'_>) -> String {
        if spec.is_pointer {
            if let Some(elem) = spec.elem {
                return self.name(elem.name).to_string();
            }
        }
        self.name(spec.name).to_string()
    }

    // =========================================================================
    // Pass 4: globals
    // =========================================================================

    fn pass_globals(&mut self, program: &[Stmt<'_>]) {
        for stmt in program {
            match stmt {
                Stmt::Dim { .. } | Stmt::Const { .. } => self.declare(stmt),
                Stmt::BlockStmt { stmts, .. } => {
                    for inner in stmts.iter() {
                        if matches!(inner, Stmt::Dim { .. } | Stmt::Const { .. }) {
                            self.declare(inner);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Pass 5: bodies
    // =========================================================================

    fn pass_bodies(&mut self, program: &[Stmt<'_>]) {
        for stmt in program {
            match stmt {
                // Handled in earlier passes.
                Stmt::Import { .. } | Stmt::TypeDecl { .. } | Stmt::Dim { .. } | Stmt::Const { .. } => {}
                Stmt::BlockStmt { stmts, .. }
                    if stmts.iter().all(|s| matches!(s, Stmt::Dim { .. } | Stmt::Const { .. })) => {}
                Stmt::Sub { name, params, body, .. } => {
                    let name = self.name(*name).to_string();
                    self.analyze_body(&name, None, params, &[], body, BodyKind::Sub);
                }
                Stmt::Function { name, params, returns, body, .. } => {
                    let name = self.name(*name).to_string();
                    self.analyze_body(&name, None, params, returns, body, BodyKind::Function);
                }
                Stmt::Method { receiver_name, receiver_type, name, params, returns, body, .. } => {
                    let recv = (self.name(*receiver_name).to_string(), *receiver_type);
                    let kind = if returns.is_empty() { BodyKind::Sub } else { BodyKind::Function };
                    let key = format!("{}.{}", self.receiver_type_name(receiver_type), self.name(*name));
                    self.analyze_body(&key, Some(recv), params, returns, body, kind);
                }
                other => self.analyze_stmt(other),
            }
        }
    }

    fn analyze_body(
        &mut self,
        scope_name: &str,
        receiver: Option<(String, &TypeSpec<'_>)>,
        params: &[dbas_language::ast::Param<'_>],
        returns: &[TypeSpec<'_>],
        body: Block<'_>,
        kind: BodyKind,
    ) {
        self.table.push_scope(scope_name);
        if let Some((recv_name, recv_spec)) = receiver {
            let ty = self.resolve_type_spec(recv_spec);
            let info = SymbolInfo::new(&recv_name, SymbolKind::Parameter, ty);
            let _ = self.table.define(info);
        }
        for param in params {
            let ty = self.resolve_type_spec(param.ty);
            let mut info = SymbolInfo::new(self.name(param.name), SymbolKind::Parameter, ty);
            info.is_by_ref = param.by_ref;
            if self.table.define(info).is_err() {
                self.error(param.token, format!("duplicate parameter '{}'", self.name(param.name)));
            }
        }

        let saved_returns = std::mem::take(&mut self.current_returns);
        let saved_kind = self.body_kind;
        self.current_returns = returns.iter().map(|r| self.resolve_type_spec(r)).collect();
        self.body_kind = kind;

        self.collect_labels(body);
        for stmt in body {
            self.analyze_stmt(stmt);
        }

        self.body_kind = saved_kind;
        self.current_returns = saved_returns;
        self.table.pop_scope();
    }

    /// Labels are visible to any `GOTO` in the same scope, including ones
    /// that appear earlier in the text, so collect them before analysis.
    /// `IF`/`SELECT` arms share the enclosing scope; loop bodies do not.
    fn collect_labels(&mut self, block: Block<'_>) {
        for stmt in block {
            match stmt {
                Stmt::Label { token, name } => {
                    let name = self.name(*name).to_string();
                    if !self.table.define_label(&name) {
                        self.error(*token, format!("duplicate label '{}'", name));
                    }
                }
                Stmt::If { then_block, elseifs, else_block, .. } => {
                    self.collect_labels(then_block);
                    for clause in elseifs.iter() {
                        self.collect_labels(clause.block);
                    }
                    if let Some(else_block) = else_block {
                        self.collect_labels(else_block);
                    }
                }
                Stmt::Select { cases, default, .. } => {
                    for case in cases.iter() {
                        self.collect_labels(case.block);
                    }
                    if let Some(default) = default {
                        self.collect_labels(default);
                    }
                }
                Stmt::BlockStmt { stmts, .. } => self.collect_labels(stmts),
                _ => {}
            }
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn declare(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Dim { token, name, ty, array_size, init } => {
                let mut resolved = self.resolve_type_spec(ty);
                if let Some(size) = array_size {
                    let size_ty = self.analyze_expr(size);
                    if !size_ty.is_integer() && !size_ty.is_opaque() {
                        self.error(size.token(), format!("array size must be INTEGER, got {}", size_ty));
                    }
                    resolved = Ty::Array(Box::new(resolved));
                }
                if let Some(init) = init {
                    let init_ty = self.analyze_expr(init);
                    if !resolved.accepts(&init_ty) {
                        self.error_hint(
                            *token,
                            format!(
                                "type mismatch: cannot initialise {} with {}",
                                resolved, init_ty
                            ),
                            "the declared type and the initializer type must be assignment-compatible",
                        );
                    }
                }
                let info = SymbolInfo::new(self.name(*name), SymbolKind::Variable, resolved);
                if self.table.define(info).is_err() {
                    self.error(*token, format!("duplicate definition of '{}'", self.name(*name)));
                }
            }
            Stmt::Const { token, name, ty, value } => {
                let resolved = self.resolve_type_spec(ty);
                let value_ty = self.analyze_expr(value);
                if !resolved.accepts(&value_ty) {
                    self.error(
                        *token,
                        format!("type mismatch: cannot initialise {} with {}", resolved, value_ty),
                    );
                }
                let info = SymbolInfo::new(self.name(*name), SymbolKind::Constant, resolved);
                if self.table.define(info).is_err() {
                    self.error(*token, format!("duplicate definition of '{}'", self.name(*name)));
                }
            }
            _ => {}
        }
    }

    fn analyze_stmt(&mut self, stmt: &Stmt<'_>) {
        match stmt {
            Stmt::Dim { .. } | Stmt::Const { .. } => self.declare(stmt),
            Stmt::Let { token, name, value } => {
                let value_ty = self.analyze_expr(value);
                match self.table.resolve(self.name(*name)) {
                    Some(info) => {
                        let target_ty = info.ty.clone();
                        if info.kind == SymbolKind::Constant {
                            self.error(*token, format!("cannot assign to constant '{}'", self.name(*name)));
                        } else if !target_ty.accepts(&value_ty) {
                            self.error(
                                *token,
                                format!("type mismatch: cannot assign {} to {}", value_ty, target_ty),
                            );
                        }
                    }
                    None => self.error_hint(
                        *token,
                        format!("undefined variable '{}'", self.name(*name)),
                        "declare it first with DIM",
                    ),
                }
            }
            Stmt::Assignment { token, target, value } => {
                let target_ty = self.analyze_assign_target(target);
                let value_ty = self.analyze_expr(value);
                if !target_ty.accepts(&value_ty) {
                    self.error(
                        *token,
                        format!("type mismatch: cannot assign {} to {}", value_ty, target_ty),
                    );
                }
            }
            Stmt::MultiAssignment { token, targets, value } => {
                self.analyze_multi_assignment(*token, targets, value)
            }
            Stmt::Print { values, .. } => {
                for value in values.iter() {
                    self.analyze_expr(value);
                }
            }
            Stmt::Input { var, var_token, .. } => match self.table.resolve(self.name(*var)) {
                Some(info) if matches!(info.kind, SymbolKind::Variable | SymbolKind::Parameter) => {}
                Some(_) => self.error(*var_token, format!("INPUT target '{}' is not a variable", self.name(*var))),
                None => self.error_hint(
                    *var_token,
                    format!("undefined variable '{}'", self.name(*var)),
                    "declare it first with DIM",
                ),
            },
            Stmt::If { cond, then_block, elseifs, else_block, .. } => {
                self.check_condition(cond, "IF");
                for inner in then_block.iter() {
                    self.analyze_stmt(inner);
                }
                for clause in elseifs.iter() {
                    self.check_condition(clause.cond, "ELSEIF");
                    for inner in clause.block.iter() {
                        self.analyze_stmt(inner);
                    }
                }
                if let Some(else_block) = else_block {
                    for inner in else_block.iter() {
                        self.analyze_stmt(inner);
                    }
                }
            }
            Stmt::For { var, start, end, step, body, .. } => {
                for bound in [*start, *end].into_iter().chain(step.iter().copied()) {
                    let ty = self.analyze_expr(bound);
                    if !ty.is_numeric() && !ty.is_opaque() {
                        self.error(bound.token(), format!("FOR bounds must be numeric, got {}", ty));
                    }
                }
                self.table.push_scope("for");
                let info = SymbolInfo::new(self.name(*var), SymbolKind::Variable, Ty::Integer);
                let _ = self.table.define(info);
                self.loop_depth += 1;
                self.collect_labels(body);
                for inner in body.iter() {
                    self.analyze_stmt(inner);
                }
                self.loop_depth -= 1;
                self.table.pop_scope();
            }
            Stmt::While { cond, body, .. } => {
                self.check_condition(cond, "WHILE");
                self.table.push_scope("while");
                self.loop_depth += 1;
                self.collect_labels(body);
                for inner in body.iter() {
                    self.analyze_stmt(inner);
                }
                self.loop_depth -= 1;
                self.table.pop_scope();
            }
            Stmt::DoLoop { cond, body, .. } => {
                if let Some(cond) = cond {
                    self.check_condition(cond, "DO");
                }
                self.table.push_scope("do");
                self.loop_depth += 1;
                self.collect_labels(body);
                for inner in body.iter() {
                    self.analyze_stmt(inner);
                }
                self.loop_depth -= 1;
                self.table.pop_scope();
            }
            Stmt::Select { test, cases, default, .. } => {
                let test_ty = self.analyze_expr(test);
                for case in cases.iter() {
                    for value in case.values.iter() {
                        let value_ty = self.analyze_expr(value);
                        if !test_ty.accepts(&value_ty) && !value_ty.accepts(&test_ty) {
                            self.error(
                                value.token(),
                                format!("CASE value type {} does not match SELECT test type {}", value_ty, test_ty),
                            );
                        }
                    }
                    for inner in case.block.iter() {
                        self.analyze_stmt(inner);
                    }
                }
                if let Some(default) = default {
                    for inner in default.iter() {
                        self.analyze_stmt(inner);
                    }
                }
            }
            Stmt::Return { token, values } => self.analyze_return(*token, values),
            Stmt::Exit { token, kind } => {
                use dbas_language::ast::ExitKind;
                match kind {
                    ExitKind::For | ExitKind::While | ExitKind::Do => {
                        if self.loop_depth == 0 {
                            self.error(*token, "EXIT outside of a loop".to_string());
                        }
                    }
                    ExitKind::Sub => {
                        if self.body_kind != BodyKind::Sub {
                            self.error(*token, "EXIT SUB outside of a SUB".to_string());
                        }
                    }
                    ExitKind::Function => {
                        if self.body_kind != BodyKind::Function {
                            self.error(*token, "EXIT FUNCTION outside of a FUNCTION".to_string());
                        }
                    }
                }
            }
            Stmt::Goto { token, label } => {
                let label = self.name(*label).to_string();
                if self.table.resolve_label(&label).is_none() {
                    self.error(*token, format!("undefined label '{}'", label));
                }
            }
            Stmt::Label { .. } => {}
            Stmt::Spawn { call, .. } => {
                self.analyze_expr(call);
            }
            Stmt::Send { token, value, channel } => {
                let value_ty = self.analyze_expr(value);
                let chan_ty = self.analyze_expr(channel);
                match chan_ty {
                    Ty::Channel(elem) => {
                        if !elem.accepts(&value_ty) {
                            self.error(
                                *token,
                                format!("type mismatch: cannot SEND {} over CHAN OF {}", value_ty, elem),
                            );
                        }
                    }
                    ty if ty.is_opaque() => {}
                    ty => self.error(*token, format!("SEND target must be a channel, got {}", ty)),
                }
            }
            Stmt::Receive { token, var, channel } => {
                let var_ty = self.analyze_assign_target(var);
                let chan_ty = self.analyze_expr(channel);
                match chan_ty {
                    Ty::Channel(elem) => {
                        if !var_ty.accepts(&elem) {
                            self.error(
                                *token,
                                format!("type mismatch: cannot RECEIVE {} into {}", elem, var_ty),
                            );
                        }
                    }
                    ty if ty.is_opaque() => {}
                    ty => self.error(*token, format!("RECEIVE source must be a channel, got {}", ty)),
                }
            }
            Stmt::ExprStmt { expr, .. } => {
                self.analyze_expr(expr);
            }
            Stmt::BlockStmt { stmts, .. } => {
                for inner in stmts.iter() {
                    self.analyze_stmt(inner);
                }
            }
            Stmt::Import { token, .. } => {
                self.error(*token, "IMPORT must appear at top level".to_string());
            }
            Stmt::TypeDecl { token, .. } => {
                self.error(*token, "TYPE declarations must appear at top level".to_string());
            }
            Stmt::Sub { token, .. } | Stmt::Function { token, .. } | Stmt::Method { token, .. } => {
                self.error(*token, "nested subprogram definitions are not allowed".to_string());
            }
        }
    }

    fn analyze_return(&mut self, token: Token, values: &[Expr<'_>]) {
        let value_tys: Vec<Ty> = values.iter().map(|v| self.analyze_expr(v)).collect();
        match self.body_kind {
            BodyKind::TopLevel => {
                self.error(token, "RETURN outside of a SUB or FUNCTION".to_string());
            }
            BodyKind::Sub => {
                if !values.is_empty() {
                    self.error(token, "a SUB cannot return values".to_string());
                }
            }
            BodyKind::Function => {
                let expected = self.current_returns.clone();
                if value_tys.len() != expected.len() {
                    self.error(
                        token,
                        format!(
                            "wrong number of return values: expected {}, got {}",
                            expected.len(),
                            value_tys.len()
                        ),
                    );
                    return;
                }
                for (i, (declared, got)) in expected.iter().zip(value_tys.iter()).enumerate() {
                    if !declared.accepts(got) {
                        self.error(
                            token,
                            format!(
                                "type mismatch in return value {}: expected {}, got {}",
                                i + 1,
                                declared,
                                got
                            ),
                        );
                    }
                }
            }
        }
    }

    fn analyze_multi_assignment(&mut self, token: Token, targets: &[Expr<'_>], value: &Expr<'_>) {
        let target_tys: Vec<Ty> = targets.iter().map(|t| self.analyze_assign_target(t)).collect();
        match value {
            Expr::TypeAssertion { value: asserted, target, .. } => {
                self.analyze_expr(asserted);
                let asserted_ty = self.resolve_type_spec(target);
                if target_tys.len() != 2 {
                    self.error(
                        token,
                        "a type assertion assigns exactly two values: the value and an ok flag".to_string(),
                    );
                    return;
                }
                if !target_tys[0].accepts(&asserted_ty) {
                    self.error(
                        token,
                        format!("type mismatch: cannot assign {} to {}", asserted_ty, target_tys[0]),
                    );
                }
                if !matches!(target_tys[1], Ty::Boolean) && !target_tys[1].is_opaque() {
                    self.error(token, format!("the ok flag must be BOOLEAN, got {}", target_tys[1]));
                }
            }
            Expr::Call { func, args, .. } => {
                for arg in args.iter() {
                    self.analyze_expr(arg);
                }
                match self.resolve_call_target(func) {
                    CallTarget::Sig(sig, name) => {
                        self.check_call_args(&sig, args, token, &name);
                        if sig.returns.len() != target_tys.len() {
                            self.error(
                                token,
                                format!(
                                    "'{}' returns {} values but {} targets are assigned",
                                    name,
                                    sig.returns.len(),
                                    target_tys.len()
                                ),
                            );
                            return;
                        }
                        for (i, (target, ret)) in target_tys.iter().zip(sig.returns.iter()).enumerate() {
                            if !target.accepts(ret) {
                                self.error(
                                    token,
                                    format!(
                                        "type mismatch in assignment {}: cannot assign {} to {}",
                                        i + 1,
                                        ret,
                                        target
                                    ),
                                );
                            }
                        }
                    }
                    // External calls are opaque: no return-count check.
                    CallTarget::Opaque => {}
                    CallTarget::NotCallable(ty) => {
                        self.error(token, format!("{} is not callable", ty));
                    }
                    CallTarget::Undefined(name) => {
                        self.error(token, format!("undefined function '{}'", name));
                    }
                }
            }
            other => {
                self.analyze_expr(other);
                self.error(
                    token,
                    "multi-assignment requires a call or a type assertion on the right-hand side"
                        .to_string(),
                );
            }
        }
    }

    /// Analyses an assignment target and reports non-assignable forms.
    fn analyze_assign_target(&mut self, target: &Expr<'_>) -> Ty {
        match target {
            Expr::Identifier { token, name } => {
                let name_str = self.name(*name);
                match self.table.resolve(name_str) {
                    Some(info) => {
                        if info.kind == SymbolKind::Constant {
                            let ty = info.ty.clone();
                            self.error(*token, format!("cannot assign to constant '{}'", name_str));
                            ty
                        } else {
                            info.ty.clone()
                        }
                    }
                    None => {
                        self.error_hint(
                            *token,
                            format!("undefined variable '{}'", name_str),
                            "declare it first with DIM",
                        );
                        Ty::Unknown
                    }
                }
            }
            Expr::Member { .. } | Expr::Index { .. } | Expr::Dereference { .. } => {
                self.analyze_expr(target)
            }
            other => {
                self.error(other.token(), "this expression cannot be assigned to".to_string());
                Ty::Unknown
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr<'_>, construct: &str) {
        let ty = self.analyze_expr(cond);
        if !matches!(ty, Ty::Boolean) && !ty.is_opaque() {
            self.error_hint(
                cond.token(),
                format!("{} condition must be BOOLEAN, got {}", construct, ty),
                "comparisons like x > 0 produce BOOLEAN values",
            );
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub fn analyze_expr(&mut self, expr: &Expr<'_>) -> Ty {
        match expr {
            Expr::Identifier { token, name } => {
                let name_str = self.name(*name);
                match self.table.resolve(name_str) {
                    Some(info) => info.ty.clone(),
                    None => {
                        self.error(*token, format!("undefined identifier '{}'", name_str));
                        Ty::Unknown
                    }
                }
            }
            Expr::IntegerLit { .. } => Ty::Integer,
            Expr::FloatLit { .. } => Ty::Double,
            Expr::StringLit { .. } => Ty::Str,
            Expr::ByteStringLit { .. } => Ty::Bytes,
            Expr::BooleanLit { .. } => Ty::Boolean,
            Expr::NilLit { .. } => Ty::Any,
            Expr::JsonLit { pairs, .. } => {
                for (_, value) in pairs.iter() {
                    self.analyze_expr(value);
                }
                Ty::Json
            }
            Expr::ArrayLit { elements, .. } => {
                let elem_ty = match elements.first() {
                    Some(first) => self.analyze_expr(first),
                    None => Ty::Any,
                };
                for element in elements.iter().skip(1) {
                    let ty = self.analyze_expr(element);
                    if !elem_ty.accepts(&ty) && !ty.accepts(&elem_ty) {
                        self.error(
                            element.token(),
                            format!("array element type {} does not match {}", ty, elem_ty),
                        );
                    }
                }
                Ty::Slice(Box::new(elem_ty))
            }
            Expr::SliceLit { token, elem_type, elements } => {
                let spec = TypeSpec::named(*token, *elem_type);
                let elem_ty = self.resolve_type_spec(&spec);
                for element in elements.iter() {
                    let ty = self.analyze_expr(element);
                    if !elem_ty.accepts(&ty) {
                        self.error(
                            element.token(),
                            format!("slice element type {} does not match {}", ty, elem_ty),
                        );
                    }
                }
                Ty::Slice(Box::new(elem_ty))
            }
            Expr::StructLit { token, type_name, fields } => {
                let name = self.name(*type_name).to_string();
                let struct_ty = match self.registry.get_struct(&name) {
                    Some(s) => s.clone(),
                    None => {
                        self.error(*token, format!("unknown TYPE '{}'", name));
                        for (_, value) in fields.iter() {
                            self.analyze_expr(value);
                        }
                        return Ty::Unknown;
                    }
                };
                for (field_name, value) in fields.iter() {
                    let value_ty = self.analyze_expr(value);
                    match struct_ty.field(self.name(*field_name)) {
                        Some(field) => {
                            if !field.ty.accepts(&value_ty) {
                                self.error(
                                    value.token(),
                                    format!(
                                        "type mismatch: field '{}' is {}, got {}",
                                        field.name, field.ty, value_ty
                                    ),
                                );
                            }
                        }
                        None => self.error(
                            value.token(),
                            format!("unknown field '{}' on TYPE '{}'", self.name(*field_name), name),
                        ),
                    }
                }
                Ty::Struct(struct_ty)
            }
            Expr::Prefix { token, op, right } => {
                let right_ty = self.analyze_expr(right);
                match op {
                    TokenKind::Minus => {
                        if right_ty.is_numeric() || right_ty.is_opaque() {
                            right_ty
                        } else {
                            self.error(*token, format!("unary '-' requires a numeric operand, got {}", right_ty));
                            Ty::Unknown
                        }
                    }
                    TokenKind::Not => {
                        if !matches!(right_ty, Ty::Boolean) && !right_ty.is_opaque() {
                            self.error(*token, format!("NOT requires a BOOLEAN operand, got {}", right_ty));
                        }
                        Ty::Boolean
                    }
                    _ => Ty::Unknown,
                }
            }
            Expr::Infix { token, op, left, right } => {
                let left_ty = self.analyze_expr(left);
                let right_ty = self.analyze_expr(right);
                self.infix_type(*token, *op, &left_ty, &right_ty)
            }
            Expr::Call { token, func, args } => self.analyze_call(*token, func, args),
            Expr::Index { token, left, index, end, is_slice } => {
                self.analyze_index(*token, left, index.as_deref(), end.as_deref(), *is_slice)
            }
            Expr::Member { token, object, member } => self.analyze_member(*token, object, *member),
            Expr::AddressOf { value, .. } => {
                let inner = self.analyze_expr(value);
                Ty::Pointer(Box::new(inner))
            }
            Expr::Dereference { token, value } => {
                let inner = self.analyze_expr(value);
                match inner {
                    Ty::Pointer(elem) => *elem,
                    ty if ty.is_opaque() => Ty::Any,
                    ty => {
                        self.error(*token, format!("cannot dereference {}", ty));
                        Ty::Unknown
                    }
                }
            }
            Expr::MakeChan { elem, size, .. } => {
                if let Some(size) = size {
                    let size_ty = self.analyze_expr(size);
                    if !size_ty.is_integer() && !size_ty.is_opaque() {
                        self.error(size.token(), format!("channel capacity must be INTEGER, got {}", size_ty));
                    }
                }
                Ty::Channel(Box::new(self.resolve_type_spec(elem)))
            }
            Expr::ReceiveExpr { token, channel } => {
                let chan_ty = self.analyze_expr(channel);
                match chan_ty {
                    Ty::Channel(elem) => *elem,
                    ty if ty.is_opaque() => Ty::Any,
                    ty => {
                        self.error(*token, format!("RECEIVE source must be a channel, got {}", ty));
                        Ty::Unknown
                    }
                }
            }
            Expr::TypeAssertion { value, target, .. } => {
                self.analyze_expr(value);
                self.resolve_type_spec(target)
            }
        }
    }

    fn infix_type(&mut self, token: Token, op: TokenKind, left: &Ty, right: &Ty) -> Ty {
        use TokenKind::*;
        let opaque = left.is_opaque() || right.is_opaque();
        match op {
            Plus => {
                if opaque {
                    return Ty::Any;
                }
                if left.is_numeric() && right.is_numeric() {
                    left.widen(right)
                } else if matches!((left, right), (Ty::Str, Ty::Str)) {
                    Ty::Str
                } else if matches!((left, right), (Ty::Bytes, Ty::Bytes)) {
                    Ty::Bytes
                } else {
                    self.error(token, format!("type mismatch: cannot add {} and {}", left, right));
                    Ty::Unknown
                }
            }
            Minus | Star | Slash => {
                if opaque {
                    return Ty::Any;
                }
                if left.is_numeric() && right.is_numeric() {
                    left.widen(right)
                } else {
                    self.error(
                        token,
                        format!("type mismatch: arithmetic requires numeric operands, got {} and {}", left, right),
                    );
                    Ty::Unknown
                }
            }
            Backslash | Mod => {
                if opaque {
                    return Ty::Any;
                }
                if left.is_integer() && right.is_integer() {
                    left.widen(right)
                } else {
                    self.error(
                        token,
                        format!(
                            "'{}' requires INTEGER operands, got {} and {}",
                            if op == Backslash { "\\" } else { "MOD" },
                            left,
                            right
                        ),
                    );
                    Ty::Unknown
                }
            }
            Caret => {
                if !opaque && (!left.is_numeric() || !right.is_numeric()) {
                    self.error(token, format!("'^' requires numeric operands, got {} and {}", left, right));
                }
                Ty::Double
            }
            Ampersand => {
                if !opaque && (!matches!(left, Ty::Str) || !matches!(right, Ty::Str)) {
                    self.error_hint(
                        token,
                        format!("'&' concatenates STRING values, got {} and {}", left, right),
                        "convert operands with Str(...)",
                    );
                }
                Ty::Str
            }
            Eq | NotEq => {
                if !opaque
                    && !left.accepts(right)
                    && !right.accepts(left)
                    && !(left.is_numeric() && right.is_numeric())
                {
                    self.error(token, format!("type mismatch: cannot compare {} and {}", left, right));
                }
                Ty::Boolean
            }
            Lt | Gt | LtEq | GtEq => {
                let ordered = (left.is_numeric() && right.is_numeric())
                    || matches!((left, right), (Ty::Str, Ty::Str));
                if !opaque && !ordered {
                    self.error(token, format!("type mismatch: cannot order {} and {}", left, right));
                }
                Ty::Boolean
            }
            And | Or | Xor => {
                let boolish = |ty: &Ty| matches!(ty, Ty::Boolean) || ty.is_opaque();
                if !boolish(left) || !boolish(right) {
                    self.error(
                        token,
                        format!("logical operators require BOOLEAN operands, got {} and {}", left, right),
                    );
                }
                Ty::Boolean
            }
            _ => {
                self.error(token, "unsupported operator".to_string());
                Ty::Unknown
            }
        }
    }

    fn resolve_call_target(&mut self, func: &Expr<'_>) -> CallTarget {
        match func {
            Expr::Identifier { name, .. } => {
                let name_str = self.name(*name).to_string();
                match self.table.resolve(&name_str) {
                    Some(info) => match &info.ty {
                        Ty::Function(sig) | Ty::Sub(sig) => CallTarget::Sig(sig.clone(), name_str),
                        ty if ty.is_opaque() => CallTarget::Opaque,
                        ty => CallTarget::NotCallable(ty.clone()),
                    },
                    None => CallTarget::Undefined(name_str),
                }
            }
            Expr::Member { object, member, .. } => {
                // A call through an import alias is opaque.
                if let Some(root) = func.root_identifier() {
                    if let Some(info) = self.table.resolve(self.name(root)) {
                        if info.kind == SymbolKind::Import {
                            return CallTarget::Opaque;
                        }
                    }
                }
                let object_ty = self.analyze_expr(object);
                let struct_name = match &object_ty {
                    Ty::Struct(s) => Some(s.name.clone()),
                    Ty::Pointer(inner) => match inner.as_ref() {
                        Ty::Struct(s) => Some(s.name.clone()),
                        _ => None,
                    },
                    _ => None,
                };
                match struct_name {
                    Some(type_name) => {
                        let key = format!("{}.{}", type_name, self.name(*member));
                        match self.table.resolve_global(&key) {
                            Some(info) => match &info.ty {
                                Ty::Function(sig) | Ty::Sub(sig) => CallTarget::Sig(sig.clone(), key),
                                _ => CallTarget::Opaque,
                            },
                            None => CallTarget::Undefined(key),
                        }
                    }
                    None if object_ty.is_opaque() || matches!(object_ty, Ty::Json) => CallTarget::Opaque,
                    None => CallTarget::NotCallable(object_ty),
                }
            }
            other => {
                let ty = self.analyze_expr(other);
                if ty.is_opaque() {
                    CallTarget::Opaque
                } else {
                    CallTarget::NotCallable(ty)
                }
            }
        }
    }

    fn analyze_call(&mut self, token: Token, func: &Expr<'_>, args: &[Expr<'_>]) -> Ty {
        // Go-builtin passthroughs are handled by name, before resolution.
        if let Expr::Identifier { name, .. } = func {
            let upper = self.name(*name).to_ascii_uppercase();
            if is_passthrough_builtin(&upper) {
                let arg_tys: Vec<Ty> = args.iter().map(|a| self.analyze_expr(a)).collect();
                if args.is_empty() && upper != "RECOVER" {
                    self.error(token, format!("{} requires at least one argument", upper));
                }
                return passthrough_result(&upper, &arg_tys);
            }
        }

        let target = self.resolve_call_target(func);
        let arg_tys: Vec<Ty> = args.iter().map(|a| self.analyze_expr(a)).collect();
        match target {
            CallTarget::Sig(sig, name) => {
                self.check_call_arg_types(&sig, &arg_tys, token, &name);
                match sig.returns.len() {
                    0 => Ty::Void,
                    _ => sig.returns[0].clone(),
                }
            }
            CallTarget::Opaque => Ty::Any,
            CallTarget::NotCallable(ty) => {
                self.error(token, format!("{} is not callable", ty));
                Ty::Unknown
            }
            CallTarget::Undefined(name) => {
                self.error(token, format!("undefined function '{}'", name));
                Ty::Unknown
            }
        }
    }

    fn check_call_args(&mut self, sig: &FuncTy, args: &[Expr<'_>], token: Token, name: &str) {
        let arg_tys: Vec<Ty> = args.iter().map(|a| self.analyze_expr(a)).collect();
        self.check_call_arg_types(sig, &arg_tys, token, name);
    }

    fn check_call_arg_types(&mut self, sig: &FuncTy, arg_tys: &[Ty], token: Token, name: &str) {
        let fixed = sig.params.len();
        let arity_ok = if sig.variadic { arg_tys.len() >= fixed } else { arg_tys.len() == fixed };
        if !arity_ok {
            let expected = if sig.variadic {
                format!("at least {}", fixed)
            } else {
                fixed.to_string()
            };
            self.error(
                token,
                format!("wrong number of arguments to '{}': expected {}, got {}", name, expected, arg_tys.len()),
            );
            return;
        }
        for (i, (param, arg)) in sig.params.iter().zip(arg_tys.iter()).enumerate() {
            if !param.accepts(arg) {
                self.error(
                    token,
                    format!(
                        "type mismatch in argument {} to '{}': expected {}, got {}",
                        i + 1,
                        name,
                        param,
                        arg
                    ),
                );
            }
        }
        // Variadic extras are analysed but not type-checked.
    }

    fn analyze_index(
        &mut self,
        token: Token,
        left: &Expr<'_>,
        index: Option<&Expr<'_>>,
        end: Option<&Expr<'_>>,
        is_slice: bool,
    ) -> Ty {
        let left_ty = self.analyze_expr(left);
        for bound in [index, end].into_iter().flatten() {
            let ty = self.analyze_expr(bound);
            let index_by_string = matches!(left_ty, Ty::Json);
            let ok = if index_by_string {
                matches!(ty, Ty::Str) || ty.is_opaque()
            } else {
                ty.is_integer() || ty.is_opaque()
            };
            if !ok {
                self.error(
                    bound.token(),
                    format!(
                        "index must be {}, got {}",
                        if index_by_string { "STRING" } else { "INTEGER" },
                        ty
                    ),
                );
            }
        }
        match &left_ty {
            Ty::Slice(elem) | Ty::Array(elem) => {
                if is_slice {
                    Ty::Slice(elem.clone())
                } else {
                    (**elem).clone()
                }
            }
            Ty::Bytes => {
                if is_slice {
                    Ty::Bytes
                } else {
                    Ty::Integer
                }
            }
            Ty::Str => {
                if is_slice {
                    Ty::Str
                } else {
                    Ty::Integer
                }
            }
            Ty::Json => Ty::Any,
            ty if ty.is_opaque() => Ty::Any,
            ty => {
                self.error(token, format!("{} cannot be indexed", ty));
                Ty::Unknown
            }
        }
    }

    fn analyze_member(&mut self, token: Token, object: &Expr<'_>, member: dbas_base::Symbol) -> Ty {
        // `alias.Name` where the chain roots in an import is external.
        if let Expr::Identifier { name, .. } = object {
            if let Some(info) = self.table.resolve(self.name(*name)) {
                if info.kind == SymbolKind::Import {
                    return Ty::Any;
                }
            }
        }

        let object_ty = self.analyze_expr(object);
        let member_str = self.name(member);
        let struct_ty = match &object_ty {
            Ty::Struct(s) => Some(s.clone()),
            Ty::Pointer(inner) => match inner.as_ref() {
                Ty::Struct(s) => Some(s.clone()),
                _ => None,
            },
            _ => None,
        };
        match struct_ty {
            Some(s) => {
                // Re-fetch from the registry: field lists resolved in pass 2
                // may be fresher than a shell captured inside another type.
                let fresh = self.registry.get_struct(&s.name).cloned().unwrap_or(s);
                match fresh.field(member_str) {
                    Some(field) => field.ty.clone(),
                    None => {
                        // Methods are first-class enough to reference later
                        // via calls; unknown plain members are errors.
                        let key = format!("{}.{}", fresh.name, member_str);
                        if let Some(info) = self.table.resolve_global(&key) {
                            return info.ty.clone();
                        }
                        self.error(
                            token,
                            format!("unknown field '{}' on TYPE '{}'", member_str, fresh.name),
                        );
                        Ty::Unknown
                    }
                }
            }
            None => match &object_ty {
                Ty::Json => Ty::Any,
                ty if ty.is_opaque() => Ty::Any,
                ty => {
                    self.error(token, format!("{} has no members", ty));
                    Ty::Unknown
                }
            },
        }
    }

    // =========================================================================
    // Type resolution
    // =========================================================================

    /// Resolves parsed type syntax against the registry and import table.
    pub fn resolve_type_spec(&mut self, spec: &TypeSpec<'_>) -> Ty {
        if spec.is_pointer {
            let elem = spec.elem.map(|e| self.resolve_type_spec(e)).unwrap_or(Ty::Unknown);
            return Ty::Pointer(Box::new(elem));
        }
        if spec.is_channel {
            let elem = spec.elem.map(|e| self.resolve_type_spec(e)).unwrap_or(Ty::Unknown);
            return Ty::Channel(Box::new(elem));
        }
        if spec.is_array {
            let elem = spec.elem.map(|e| self.resolve_type_spec(e)).unwrap_or(Ty::Unknown);
            return Ty::Slice(Box::new(elem));
        }
        if let Some(package) = spec.package {
            let alias = self.name(package);
            return match self.table.import_by_alias(alias) {
                Some(import) => Ty::External(ExternalTy {
                    alias: import.alias.clone(),
                    type_name: self.name(spec.name).to_string(),
                    import_path: import.path.clone(),
                }),
                None => {
                    self.error(spec.token, format!("unknown package '{}'", alias));
                    Ty::Unknown
                }
            };
        }

        let name = self.name(spec.name);
        match name.to_ascii_uppercase().as_str() {
            "INTEGER" => Ty::Integer,
            "LONG" => Ty::Long,
            "SINGLE" => Ty::Single,
            "DOUBLE" => Ty::Double,
            "STRING" => Ty::Str,
            "BOOLEAN" => Ty::Boolean,
            "JSON" => Ty::Json,
            "BYTES" => Ty::Bytes,
            "ANY" => Ty::Any,
            "ERROR" => Ty::Error,
            _ => match self.registry.get(name) {
                Some(ty) => ty.clone(),
                None => {
                    self.error(spec.token, format!("unknown type '{}'", name));
                    Ty::Unknown
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbas_language::arena_ctx::{AstArenas, AstContext};
    use dbas_language::lexer::Lexer;
    use dbas_language::parser::Parser;

    fn analyze(source: &str) -> Vec<String> {
        let mut interner = Interner::new();
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        let program = parser.parse_program();
        assert!(parser.errors.is_empty(), "parse errors: {:#?}", parser.errors);
        let mut analyzer = Analyzer::new(&interner, source);
        analyzer.analyze(&program);
        analyzer.errors.into_iter().map(|e| e.message).collect()
    }

    fn assert_clean(source: &str) {
        let errors = analyze(source);
        assert!(errors.is_empty(), "unexpected errors: {:#?}", errors);
    }

    fn assert_error(source: &str, needle: &str) {
        let errors = analyze(source);
        assert!(
            errors.iter().any(|e| e.contains(needle)),
            "expected an error containing {:?}, got {:#?}",
            needle,
            errors
        );
    }

    #[test]
    fn hello_world_is_clean() {
        assert_clean("SUB Main()\nPRINT \"Hello, World!\"\nEND SUB\n");
    }

    #[test]
    fn type_mismatch_in_dim() {
        let errors = analyze("DIM x AS INTEGER = \"hi\"\n");
        assert_eq!(errors.len(), 1, "exactly one error: {:#?}", errors);
        assert!(errors[0].contains("type mismatch"));
        assert!(errors[0].contains("INTEGER"));
        assert!(errors[0].contains("STRING"));
    }

    #[test]
    fn numeric_widening_is_accepted() {
        assert_clean("DIM d AS DOUBLE = 2\nDIM l AS LONG = 1\n");
    }

    #[test]
    fn narrowing_is_rejected() {
        assert_error("DIM i AS INTEGER = 2.5\n", "type mismatch");
    }

    #[test]
    fn case_insensitive_resolution() {
        assert_clean("DIM foo AS INTEGER = 1\nSUB Main()\nFOO = 2\nEND SUB\n");
    }

    #[test]
    fn duplicate_globals_are_reported() {
        assert_error("DIM x AS INTEGER\nDIM X AS STRING\n", "duplicate definition");
    }

    #[test]
    fn undefined_identifier_is_reported() {
        assert_error("SUB Main()\nPRINT missing\nEND SUB\n", "undefined identifier 'missing'");
    }

    #[test]
    fn forward_function_reference_resolves() {
        assert_clean(
            "SUB Main()\nPRINT Twice(21)\nEND SUB\nFUNCTION Twice(n AS INTEGER) AS INTEGER\nRETURN n * 2\nEND FUNCTION\n",
        );
    }

    #[test]
    fn global_dim_forward_type_reference() {
        assert_clean("DIM p AS Point\nTYPE Point\nx AS INTEGER\ny AS INTEGER\nEND TYPE\n");
    }

    #[test]
    fn struct_field_forward_reference() {
        assert_clean(
            "TYPE Node\nnext AS POINTER TO Node\npayload AS Leaf\nEND TYPE\nTYPE Leaf\nvalue AS INTEGER\nEND TYPE\n",
        );
    }

    #[test]
    fn if_condition_must_be_boolean() {
        assert_error("SUB Main()\nIF 1 THEN\nPRINT 1\nEND IF\nEND SUB\n", "must be BOOLEAN");
    }

    #[test]
    fn for_variable_is_implicitly_integer() {
        assert_clean("SUB Main()\nFOR i = 1 TO 10\nPRINT i\nNEXT\nEND SUB\n");
    }

    #[test]
    fn for_variable_does_not_leak() {
        assert_error(
            "SUB Main()\nFOR i = 1 TO 10\nPRINT i\nNEXT\nPRINT i\nEND SUB\n",
            "undefined identifier 'i'",
        );
    }

    #[test]
    fn mod_requires_integers() {
        assert_error("SUB Main()\nPRINT 1.5 MOD 2\nEND SUB\n", "INTEGER operands");
    }

    #[test]
    fn power_yields_double() {
        assert_clean("DIM x AS DOUBLE = 2 ^ 3\n");
        assert_error("DIM x AS INTEGER = 2 ^ 3\n", "type mismatch");
    }

    #[test]
    fn logical_ops_require_booleans() {
        assert_error("SUB Main()\nPRINT 1 AND 2\nEND SUB\n", "BOOLEAN operands");
    }

    #[test]
    fn wrong_arity_is_reported() {
        assert_error(
            "SUB Main()\nPRINT Left(\"abc\")\nEND SUB\n",
            "wrong number of arguments to 'Left'",
        );
    }

    #[test]
    fn variadic_builtins_accept_extras() {
        assert_clean("SUB Main()\nPrintf(\"%d %s\\n\", 1, \"two\")\nEND SUB\n");
    }

    #[test]
    fn variadic_requires_fixed_arguments() {
        assert_error("SUB Main()\nPrintf()\nEND SUB\n", "at least 1");
    }

    #[test]
    fn channel_send_element_types_check() {
        assert_error(
            "SUB Main()\nDIM ch AS CHAN OF INTEGER = MAKE_CHAN(INTEGER, 1)\nSEND \"hi\" TO ch\nEND SUB\n",
            "cannot SEND",
        );
    }

    #[test]
    fn channel_roundtrip_is_clean() {
        assert_clean(
            "SUB Main()\nDIM ch AS CHAN OF INTEGER = MAKE_CHAN(INTEGER, 1)\nSEND 42 TO ch\nDIM x AS INTEGER\nRECEIVE x FROM ch\nPRINT x\nEND SUB\n",
        );
    }

    #[test]
    fn multi_return_assignment_checks_count() {
        let source = "FUNCTION Two() AS (INTEGER, BOOLEAN)\nRETURN 1, TRUE\nEND FUNCTION\nSUB Main()\nDIM a AS INTEGER\na = 0\nDIM b AS BOOLEAN\nDIM c AS INTEGER\na, b, c = Two()\nEND SUB\n";
        let errors = analyze(source);
        assert!(errors.iter().any(|e| e.contains("returns 2 values but 3 targets")), "{:#?}", errors);
    }

    #[test]
    fn multi_return_assignment_is_clean() {
        assert_clean(
            "FUNCTION Divide(a AS INTEGER, b AS INTEGER) AS (INTEGER, BOOLEAN)\nIF b = 0 THEN RETURN 0, FALSE ENDIF\nRETURN a / b, TRUE\nEND FUNCTION\nSUB Main()\nDIM q AS INTEGER, DIM ok AS BOOLEAN\nq, ok = Divide(10, 2)\nEND SUB\n",
        );
    }

    #[test]
    fn type_assertion_assigns_value_and_ok() {
        assert_clean(
            "SUB Main()\nDIM v AS ANY = NIL\nDIM n AS INTEGER\nDIM ok AS BOOLEAN\nn, ok = v AS INTEGER\nEND SUB\n",
        );
    }

    #[test]
    fn return_type_checking() {
        assert_error(
            "FUNCTION F() AS INTEGER\nRETURN \"nope\"\nEND FUNCTION\n",
            "type mismatch in return value 1",
        );
        assert_error(
            "FUNCTION F() AS INTEGER\nRETURN 1, 2\nEND FUNCTION\n",
            "wrong number of return values",
        );
        assert_error("SUB S()\nRETURN 1\nEND SUB\n", "SUB cannot return values");
    }

    #[test]
    fn goto_checks_labels_in_scope() {
        assert_clean("SUB Main()\nagain:\nGOTO again\nEND SUB\n");
        assert_error("SUB Main()\nGOTO nowhere\nEND SUB\n", "undefined label 'nowhere'");
    }

    #[test]
    fn labels_do_not_cross_scopes() {
        assert_error(
            "SUB Main()\nFOR i = 1 TO 3\ntop:\nNEXT\nGOTO top\nEND SUB\n",
            "undefined label 'top'",
        );
    }

    #[test]
    fn member_access_on_struct() {
        assert_clean(
            "TYPE Point\nx AS INTEGER\nEND TYPE\nSUB Main()\nDIM p AS Point\nPRINT p.x\nEND SUB\n",
        );
        assert_error(
            "TYPE Point\nx AS INTEGER\nEND TYPE\nSUB Main()\nDIM p AS Point\nPRINT p.z\nEND SUB\n",
            "unknown field 'z'",
        );
    }

    #[test]
    fn member_access_through_pointer() {
        assert_clean(
            "TYPE Point\nx AS INTEGER\nEND TYPE\nSUB Main()\nDIM p AS Point\nDIM q AS POINTER TO Point\nq = @p\nPRINT q.x\nEND SUB\n",
        );
    }

    #[test]
    fn external_calls_are_opaque() {
        assert_clean(
            "IMPORT \"net/http\"\nSUB Main()\nPRINT http.Get(\"x\", 1, 2, 3)\nEND SUB\n",
        );
    }

    #[test]
    fn import_aliases_register() {
        assert_clean("IMPORT \"net/http\" AS web\nSUB Main()\nPRINT web.Get(\"x\")\nEND SUB\n");
        assert_error(
            "IMPORT \"net/http\"\nIMPORT \"other/http\"\nSUB Main()\nEND SUB\n",
            "duplicate import alias",
        );
    }

    #[test]
    fn methods_register_under_receiver_key() {
        assert_clean(
            "TYPE Dog\nname AS STRING\nEND TYPE\nFUNCTION (d AS Dog) Speak() AS STRING\nRETURN d.name\nEND FUNCTION\nSUB Main()\nDIM d AS Dog\nPRINT d.Speak()\nEND SUB\n",
        );
    }

    #[test]
    fn select_case_types_must_match() {
        assert_error(
            "SUB Main()\nDIM n AS INTEGER\nSELECT CASE n\nCASE \"one\"\nPRINT 1\nEND SELECT\nEND SUB\n",
            "CASE value type",
        );
    }

    #[test]
    fn passthrough_builtins_resolve() {
        assert_clean(
            "SUB Main()\nDIM xs AS []INTEGER = [1, 2, 3]\nPRINT Len(\"abc\")\nxs = Append(xs, 4)\nEND SUB\n",
        );
    }

    #[test]
    fn exit_outside_loop_is_reported() {
        assert_error("SUB Main()\nEXIT FOR\nEND SUB\n", "EXIT outside of a loop");
    }

    #[test]
    fn has_main_is_case_insensitive() {
        let mut interner = Interner::new();
        let source = "SUB main()\nEND SUB\n";
        let tokens = Lexer::new(source, &mut interner).tokenize();
        let arenas = AstArenas::new();
        let ctx = AstContext::new(&arenas);
        let mut parser = Parser::new(&tokens, ctx, &interner, source);
        let program = parser.parse_program();
        assert!(Analyzer::has_main(&program, &interner));
    }
}
