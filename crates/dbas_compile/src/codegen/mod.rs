//! Go code generation.
//!
//! One compilation unit is assembled in the §-order: package header,
//! imports, runtime helpers, type declarations, globals, subprograms,
//! entry point. Bodies are generated first into buffers, recording every
//! standard-library import and runtime unit they touch on the context;
//! the header is composed afterwards, so the emitted import block is
//! exactly the set the program needs.
//!
//! The generator trusts the analyzer: no type checking happens here, and
//! member accesses through `ANY`/external values pass straight through.

pub mod context;
pub mod expr;
pub mod runtime;
pub mod stmt;
pub mod types;

use std::collections::HashSet;
use std::fmt::Write;

use dbas_base::Interner;
use dbas_language::ast::Stmt;
use dbas_language::preprocess::LineMap;

use crate::analysis::{SymbolKind, SymbolTable, Ty, TypeRegistry};
use context::GoContext;
use stmt::{emit_global, emit_stmt, emit_subprogram};
use types::{escape_ident, go_func_name, go_ty};

/// Options the driver hands to the generator.
#[derive(Debug, Clone, Default)]
pub struct GenOptions {
    /// Annotate emitted statements with their source line numbers.
    pub debug: bool,
}

/// Generates the complete Go compilation unit for an analyzed program.
pub fn generate(
    program: &[Stmt<'_>],
    table: &SymbolTable,
    registry: &TypeRegistry,
    interner: &Interner,
    line_map: Option<&LineMap>,
    file_name: &str,
    options: &GenOptions,
) -> String {
    let mut ctx = GoContext::new(interner, table, registry, line_map, file_name, options.debug);

    // Globals first: their declared kinds stay visible in every body.
    let mut globals = String::new();
    for stmt in program {
        emit_global(&mut ctx, stmt, &mut globals);
    }

    let mut funcs = String::new();
    let mut top_level = String::new();
    for stmt in program {
        match stmt {
            Stmt::Sub { .. } | Stmt::Function { .. } | Stmt::Method { .. } => {
                emit_subprogram(&mut ctx, stmt, &mut funcs);
            }
            Stmt::Import { .. } | Stmt::TypeDecl { .. } | Stmt::Dim { .. } | Stmt::Const { .. } => {}
            Stmt::BlockStmt { stmts, .. }
                if stmts.iter().all(|s| matches!(s, Stmt::Dim { .. } | Stmt::Const { .. })) => {}
            other => emit_stmt(&mut ctx, other, 1, &mut top_level),
        }
    }

    let type_decls = emit_type_decls(&ctx);

    // ===== Assembly =====
    let mut out = String::with_capacity(4096);
    out.push_str("package main\n\n");

    let user_imports = table.imports();
    if !ctx.imports.is_empty() || !user_imports.is_empty() {
        out.push_str("import (\n");
        for import in &ctx.imports {
            writeln!(out, "    \"{}\"", import).unwrap();
        }
        if !ctx.imports.is_empty() && !user_imports.is_empty() {
            out.push('\n');
        }
        for import in user_imports {
            if import.explicit {
                writeln!(out, "    {} \"{}\"", escape_ident(&import.alias), import.path).unwrap();
            } else {
                writeln!(out, "    \"{}\"", import.path).unwrap();
            }
        }
        out.push_str(")\n\n");
    }

    for unit in runtime::RUNTIME_UNITS {
        if ctx.units.contains(unit.name) {
            out.push_str(&runtime::unit_source(unit));
            out.push_str("\n\n");
        }
    }

    if !type_decls.is_empty() {
        out.push_str(&type_decls);
        out.push('\n');
    }

    if !globals.is_empty() {
        out.push_str(&globals);
        out.push('\n');
    }

    out.push_str(&funcs);

    out.push_str("func main() {\n");
    out.push_str(&top_level);
    if let Some(info) = table.resolve_global("Main") {
        if info.kind == SymbolKind::Sub {
            writeln!(out, "    {}()", go_func_name(&info.name)).unwrap();
        }
    }
    out.push_str("}\n");

    out
}

/// Emits struct declarations in dependency order: a struct whose fields or
/// embeds mention another struct *by value* comes after it. Pointer fields
/// do not order (they may be recursive).
fn emit_type_decls(ctx: &GoContext<'_>) -> String {
    let mut out = String::new();

    let structs: Vec<&crate::analysis::StructTy> = ctx
        .registry
        .iter()
        .filter_map(|(_, ty)| match ty {
            Ty::Struct(s) => Some(s),
            _ => None,
        })
        .collect();

    let value_deps = |s: &crate::analysis::StructTy| -> Vec<String> {
        let mut deps: Vec<String> = s.embedded.iter().map(|e| e.to_ascii_uppercase()).collect();
        for field in &s.fields {
            if let Ty::Struct(inner) = &field.ty {
                deps.push(inner.name.to_ascii_uppercase());
            }
        }
        deps
    };

    // Iterative topological order; cycles fall out in declaration order.
    let mut emitted: HashSet<String> = HashSet::new();
    let mut remaining: Vec<&crate::analysis::StructTy> = structs;
    let mut ordered: Vec<&crate::analysis::StructTy> = Vec::new();
    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|s| {
            let ready = value_deps(s)
                .iter()
                .all(|d| emitted.contains(d) || d == &s.name.to_ascii_uppercase());
            if ready {
                emitted.insert(s.name.to_ascii_uppercase());
                ordered.push(*s);
            }
            !ready
        });
        if remaining.len() == before {
            ordered.extend(remaining.drain(..));
        }
    }

    for s in ordered {
        writeln!(out, "type {} struct {{", escape_ident(&s.name)).unwrap();
        // Embedded types come first, in declared order.
        for base in &s.embedded {
            let declared = ctx
                .registry
                .get_struct(base)
                .map(|b| b.name.clone())
                .unwrap_or_else(|| base.clone());
            writeln!(out, "    {}", escape_ident(&declared)).unwrap();
        }
        for field in &s.fields {
            writeln!(out, "    {} {}", escape_ident(&field.name), go_ty(&field.ty)).unwrap();
        }
        out.push_str("}\n\n");
    }

    out
}
