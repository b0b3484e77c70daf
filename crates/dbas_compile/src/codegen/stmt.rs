//! Statement emission.
//!
//! Each statement becomes one or more Go lines written into the output
//! buffer with four-space indentation. Local variable declarations get a
//! `_ = name` guard so a declared-but-unread DBAS variable cannot fail the
//! Go compile; package-level declarations do not need one.

use std::fmt::Write;

use dbas_language::ast::{Block, ExitKind, Expr, Param, PrintSep, Stmt, TypeSpec};

use super::context::{GoContext, VarKind};
use super::expr::go_expr;
use super::types::{
    escape_ident, go_dim_type, go_func_name, go_type, numeric_wrap, zero_value,
};

fn indent_str(indent: usize) -> String {
    "    ".repeat(indent)
}

/// Emits one statement. Multi-line constructs recurse through
/// [`emit_block`].
pub fn emit_stmt(ctx: &mut GoContext<'_>, stmt: &Stmt<'_>, indent: usize, out: &mut String) {
    let mut text = String::new();
    emit_stmt_inner(ctx, stmt, indent, &mut text);
    if ctx.debug && !text.is_empty() {
        let line = stmt.token().pos.line;
        if line > 0 {
            let (_, mapped) = ctx.resolve_line(line);
            if let Some(newline) = text.find('\n') {
                text.insert_str(newline, &format!(" // line {}", mapped));
            }
        }
    }
    out.push_str(&text);
}

/// Emits a block, guarding a trailing label with an empty statement (Go
/// labels must precede a statement).
pub fn emit_block(ctx: &mut GoContext<'_>, block: Block<'_>, indent: usize, out: &mut String) {
    for stmt in block {
        emit_stmt(ctx, stmt, indent, out);
    }
    if let Some(Stmt::Label { name, .. }) = block.last() {
        let upper = ctx.interner.resolve(*name).to_ascii_uppercase();
        if ctx.goto_targets.contains(&upper) {
            writeln!(out, "{}{{}}", indent_str(indent)).unwrap();
        }
    }
}

fn emit_stmt_inner(ctx: &mut GoContext<'_>, stmt: &Stmt<'_>, indent: usize, out: &mut String) {
    let pad = indent_str(indent);
    match stmt {
        // Top-level-only forms; the program assembler routes around these.
        Stmt::Import { .. } | Stmt::TypeDecl { .. } => {}
        Stmt::Sub { .. } | Stmt::Function { .. } | Stmt::Method { .. } => {}

        Stmt::Dim { name, ty, array_size, init, .. } => {
            let var_name = escape_ident(ctx.interner.resolve(*name));
            let kind = if array_size.is_some() {
                VarKind::Other
            } else {
                VarKind::of_spec(ty, ctx.interner)
            };
            ctx.register_var(ctx.interner.resolve(*name), kind);
            let go_ty = go_dim_type(ctx, ty, array_size.as_deref());
            match init {
                Some(init) => {
                    let value = wrap_numeric(ctx, kind, init);
                    writeln!(out, "{}var {} {} = {}", pad, var_name, go_ty, value).unwrap();
                }
                None => writeln!(out, "{}var {} {}", pad, var_name, go_ty).unwrap(),
            }
            writeln!(out, "{}_ = {}", pad, var_name).unwrap();
        }
        Stmt::Const { name, ty, value, .. } => {
            let const_name = escape_ident(ctx.interner.resolve(*name));
            let kind = VarKind::of_spec(ty, ctx.interner);
            ctx.register_var(ctx.interner.resolve(*name), kind);
            let go_ty = go_type(ctx, ty);
            if is_const_literal(value) {
                let rendered = go_expr(ctx, value);
                writeln!(out, "{}const {} {} = {}", pad, const_name, go_ty, rendered).unwrap();
            } else {
                let rendered = wrap_numeric(ctx, kind, value);
                writeln!(out, "{}var {} {} = {}", pad, const_name, go_ty, rendered).unwrap();
                writeln!(out, "{}_ = {}", pad, const_name).unwrap();
            }
        }
        Stmt::Let { name, value, .. } => {
            let text = ctx.interner.resolve(*name);
            let kind = ctx.var_kind(text);
            let target = if ctx.is_byref(text) {
                format!("(*{})", escape_ident(text))
            } else {
                escape_ident(text)
            };
            let rendered = wrap_numeric(ctx, kind, value);
            writeln!(out, "{}{} = {}", pad, target, rendered).unwrap();
        }
        Stmt::Assignment { target, value, .. } => {
            let kind = match target {
                Expr::Identifier { name, .. } => ctx.var_kind(ctx.interner.resolve(*name)),
                _ => VarKind::Other,
            };
            let target = go_expr(ctx, target);
            let rendered = wrap_numeric(ctx, kind, value);
            writeln!(out, "{}{} = {}", pad, target, rendered).unwrap();
        }
        Stmt::MultiAssignment { targets, value, .. } => {
            let rendered: Vec<String> = targets.iter().map(|t| go_expr(ctx, t)).collect();
            let value = go_expr(ctx, value);
            writeln!(out, "{}{} = {}", pad, rendered.join(", "), value).unwrap();
        }
        Stmt::Print { values, separators, .. } => {
            ctx.require_import("fmt");
            if values.is_empty() {
                writeln!(out, "{}fmt.Println()", pad).unwrap();
                return;
            }
            let mut format = String::new();
            for (i, _) in values.iter().enumerate() {
                format.push_str("%v");
                match separators.get(i) {
                    Some(PrintSep::Comma) if i + 1 < values.len() => format.push('\t'),
                    _ => {}
                }
            }
            // A trailing separator suppresses the newline.
            if separators.len() < values.len() {
                format.push_str("\\n");
            }
            let args: Vec<String> = values.iter().map(|v| go_expr(ctx, v)).collect();
            writeln!(out, "{}fmt.Printf(\"{}\", {})", pad, format, args.join(", ")).unwrap();
        }
        Stmt::Input { prompt, var, .. } => {
            if let Some(prompt) = prompt {
                ctx.require_import("fmt");
                let rendered = go_expr(ctx, prompt);
                writeln!(out, "{}fmt.Print({})", pad, rendered).unwrap();
            }
            ctx.require_unit("inputx");
            let text = ctx.interner.resolve(*var);
            let target = if ctx.is_byref(text) {
                format!("(*{})", escape_ident(text))
            } else {
                escape_ident(text)
            };
            let read = match ctx.var_kind(text) {
                VarKind::Str | VarKind::Other => "basReadLine()".to_string(),
                VarKind::Integer => {
                    ctx.require_unit("conv");
                    "int32(basVal(basReadLine()))".to_string()
                }
                VarKind::Long => {
                    ctx.require_unit("conv");
                    "int64(basVal(basReadLine()))".to_string()
                }
                VarKind::Single => {
                    ctx.require_unit("conv");
                    "float32(basVal(basReadLine()))".to_string()
                }
                VarKind::Double => {
                    ctx.require_unit("conv");
                    "basVal(basReadLine())".to_string()
                }
                VarKind::Boolean => {
                    ctx.require_unit("conv");
                    "basBool(basReadLine())".to_string()
                }
            };
            writeln!(out, "{}{} = {}", pad, target, read).unwrap();
        }
        Stmt::If { cond, then_block, elseifs, else_block, .. } => {
            let cond = go_expr(ctx, cond);
            writeln!(out, "{}if {} {{", pad, cond).unwrap();
            emit_block(ctx, then_block, indent + 1, out);
            for clause in elseifs.iter() {
                let cond = go_expr(ctx, clause.cond);
                writeln!(out, "{}}} else if {} {{", pad, cond).unwrap();
                emit_block(ctx, clause.block, indent + 1, out);
            }
            if let Some(else_block) = else_block {
                writeln!(out, "{}}} else {{", pad).unwrap();
                emit_block(ctx, else_block, indent + 1, out);
            }
            writeln!(out, "{}}}", pad).unwrap();
        }
        Stmt::For { var, start, end, step, body, .. } => {
            emit_for(ctx, var, start, end, step.as_deref(), body, indent, out);
        }
        Stmt::While { cond, body, .. } => {
            let cond = go_expr(ctx, cond);
            writeln!(out, "{}for {} {{", pad, cond).unwrap();
            emit_block(ctx, body, indent + 1, out);
            writeln!(out, "{}}}", pad).unwrap();
        }
        Stmt::DoLoop { cond, body, is_while, pre_condition, .. } => {
            match (cond, pre_condition) {
                (Some(cond), true) => {
                    let rendered = go_expr(ctx, cond);
                    let test = if *is_while { rendered } else { format!("!({})", rendered) };
                    writeln!(out, "{}for {} {{", pad, test).unwrap();
                    emit_block(ctx, body, indent + 1, out);
                    writeln!(out, "{}}}", pad).unwrap();
                }
                (Some(cond), false) => {
                    writeln!(out, "{}for {{", pad).unwrap();
                    emit_block(ctx, body, indent + 1, out);
                    let rendered = go_expr(ctx, cond);
                    let test = if *is_while { format!("!({})", rendered) } else { rendered };
                    writeln!(out, "{}    if {} {{", pad, test).unwrap();
                    writeln!(out, "{}        break", pad).unwrap();
                    writeln!(out, "{}    }}", pad).unwrap();
                    writeln!(out, "{}}}", pad).unwrap();
                }
                (None, _) => {
                    writeln!(out, "{}for {{", pad).unwrap();
                    emit_block(ctx, body, indent + 1, out);
                    writeln!(out, "{}}}", pad).unwrap();
                }
            }
        }
        Stmt::Select { test, cases, default, .. } => {
            let test = go_expr(ctx, test);
            writeln!(out, "{}switch {} {{", pad, test).unwrap();
            for case in cases.iter() {
                let values: Vec<String> =
                    case.values.iter().map(|v| go_expr(ctx, v)).collect();
                writeln!(out, "{}case {}:", pad, values.join(", ")).unwrap();
                emit_block(ctx, case.block, indent + 1, out);
            }
            if let Some(default) = default {
                writeln!(out, "{}default:", pad).unwrap();
                emit_block(ctx, default, indent + 1, out);
            }
            writeln!(out, "{}}}", pad).unwrap();
        }
        Stmt::Return { values, .. } => {
            if values.is_empty() {
                writeln!(out, "{}return", pad).unwrap();
            } else {
                let wraps: Vec<VarKind> = ctx.current_returns.clone();
                let rendered: Vec<String> = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let kind = wraps.get(i).copied().unwrap_or(VarKind::Other);
                        wrap_numeric(ctx, kind, v)
                    })
                    .collect();
                writeln!(out, "{}return {}", pad, rendered.join(", ")).unwrap();
            }
        }
        Stmt::Exit { kind, .. } => match kind {
            ExitKind::For | ExitKind::While | ExitKind::Do => {
                writeln!(out, "{}break", pad).unwrap();
            }
            ExitKind::Sub => writeln!(out, "{}return", pad).unwrap(),
            ExitKind::Function => {
                let zeros = ctx.current_return_zeros.join(", ");
                if zeros.is_empty() {
                    writeln!(out, "{}return", pad).unwrap();
                } else {
                    writeln!(out, "{}return {}", pad, zeros).unwrap();
                }
            }
        },
        Stmt::Goto { label, .. } => {
            let written = ctx.interner.resolve(*label);
            let declared = ctx
                .label_names
                .get(&written.to_ascii_uppercase())
                .cloned()
                .unwrap_or_else(|| written.to_string());
            writeln!(out, "{}goto {}", pad, escape_ident(&declared)).unwrap();
        }
        Stmt::Label { name, .. } => {
            let text = ctx.interner.resolve(*name);
            // Go rejects unused labels, so only targeted ones survive.
            if ctx.goto_targets.contains(&text.to_ascii_uppercase()) {
                writeln!(out, "{}{}:", pad, escape_ident(text)).unwrap();
            }
        }
        Stmt::Spawn { call, .. } => {
            let call = go_expr(ctx, call);
            writeln!(out, "{}go {}", pad, call).unwrap();
        }
        Stmt::Send { value, channel, .. } => {
            let channel = go_expr(ctx, channel);
            let value = go_expr(ctx, value);
            writeln!(out, "{}{} <- {}", pad, channel, value).unwrap();
        }
        Stmt::Receive { var, channel, .. } => {
            let target = go_expr(ctx, var);
            let channel = go_expr(ctx, channel);
            writeln!(out, "{}{} = <-{}", pad, target, channel).unwrap();
        }
        Stmt::ExprStmt { expr, .. } => {
            let rendered = go_expr(ctx, expr);
            if matches!(expr, Expr::Call { .. }) {
                writeln!(out, "{}{}", pad, rendered).unwrap();
            } else {
                writeln!(out, "{}_ = {}", pad, rendered).unwrap();
            }
        }
        Stmt::BlockStmt { stmts, .. } => {
            emit_block(ctx, stmts, indent, out);
        }
    }
}

/// `FOR` loops bind their counter in a fresh enclosing scope, so each loop
/// is wrapped in a brace block and the counter is declared with `var` and
/// assigned with `=` inside the header.
#[allow(clippy::too_many_arguments)]
fn emit_for(
    ctx: &mut GoContext<'_>,
    var: &dbas_base::Symbol,
    start: &Expr<'_>,
    end: &Expr<'_>,
    step: Option<&Expr<'_>>,
    body: Block<'_>,
    indent: usize,
    out: &mut String,
) {
    let pad = indent_str(indent);
    let name = escape_ident(ctx.interner.resolve(*var));
    ctx.register_var(ctx.interner.resolve(*var), VarKind::Integer);

    let start = go_expr(ctx, start);
    let end = go_expr(ctx, end);
    let descending = step.map(step_is_negative).unwrap_or(false);
    let step = step.map(|s| go_expr(ctx, s)).unwrap_or_else(|| "1".to_string());
    let compare = if descending { ">=" } else { "<=" };

    writeln!(out, "{}{{", pad).unwrap();
    writeln!(out, "{}    var {} int32", pad, name).unwrap();
    writeln!(out, "{}    _ = {}", pad, name).unwrap();
    writeln!(
        out,
        "{}    for {} = {}; {} {} {}; {} += {} {{",
        pad, name, start, name, compare, end, name, step
    )
    .unwrap();
    emit_block(ctx, body, indent + 2, out);
    writeln!(out, "{}    }}", pad).unwrap();
    writeln!(out, "{}}}", pad).unwrap();
}

/// A literal-negative `STEP` flips the loop condition; anything else is
/// assumed ascending.
fn step_is_negative(step: &Expr<'_>) -> bool {
    match step {
        Expr::Prefix { op, right, .. } => {
            *op == dbas_language::token::TokenKind::Minus
                && matches!(**right, Expr::IntegerLit { .. } | Expr::FloatLit { .. })
        }
        Expr::IntegerLit { value, .. } => *value < 0,
        Expr::FloatLit { value, .. } => *value < 0.0,
        _ => false,
    }
}

fn is_const_literal(value: &Expr<'_>) -> bool {
    matches!(
        value,
        Expr::IntegerLit { .. }
            | Expr::FloatLit { .. }
            | Expr::StringLit { .. }
            | Expr::BooleanLit { .. }
    )
}

/// Wraps an emitted value in the target slot's numeric conversion, except
/// for untyped literals, which Go converts implicitly.
fn wrap_numeric(ctx: &mut GoContext<'_>, kind: VarKind, value: &Expr<'_>) -> String {
    let rendered = go_expr(ctx, value);
    if matches!(
        value,
        Expr::IntegerLit { .. } | Expr::FloatLit { .. }
    ) {
        return rendered;
    }
    match numeric_wrap(kind) {
        Some(wrap) => format!("{}({})", wrap, rendered),
        None => rendered,
    }
}

// =============================================================================
// Subprograms
// =============================================================================

/// Emits a sub, function, or method definition.
pub fn emit_subprogram(ctx: &mut GoContext<'_>, stmt: &Stmt<'_>, out: &mut String) {
    match stmt {
        Stmt::Sub { name, params, body, .. } => {
            let declared = ctx.interner.resolve(*name);
            emit_func(ctx, None, declared, params, &[], body, out);
        }
        Stmt::Function { name, params, returns, body, .. } => {
            let declared = ctx.interner.resolve(*name);
            emit_func(ctx, None, declared, params, returns, body, out);
        }
        Stmt::Method { receiver_name, receiver_type, name, params, returns, body, .. } => {
            let declared = ctx.interner.resolve(*name);
            let receiver = (ctx.interner.resolve(*receiver_name).to_string(), *receiver_type);
            emit_func(ctx, Some(receiver), declared, params, returns, body, out);
        }
        _ => {}
    }
}

fn emit_func<'a>(
    ctx: &mut GoContext<'_>,
    receiver: Option<(String, &TypeSpec<'a>)>,
    declared: &str,
    params: &[Param<'_>],
    returns: &[TypeSpec<'_>],
    body: Block<'_>,
    out: &mut String,
) {
    let saved_vars = ctx.vars.clone();
    let saved_byref = std::mem::take(&mut ctx.byref);
    let saved_fn = std::mem::replace(&mut ctx.current_fn, declared.to_string());
    let saved_targets = std::mem::take(&mut ctx.goto_targets);
    let saved_labels = std::mem::take(&mut ctx.label_names);

    collect_goto_targets(ctx, body);

    let mut param_strs = Vec::new();
    for param in params {
        let param_name = ctx.interner.resolve(param.name);
        let kind = VarKind::of_spec(param.ty, ctx.interner);
        ctx.register_var(param_name, kind);
        let base = go_type(ctx, param.ty);
        if param.by_ref {
            ctx.byref.insert(param_name.to_ascii_uppercase());
            param_strs.push(format!("{} *{}", escape_ident(param_name), base));
        } else {
            param_strs.push(format!("{} {}", escape_ident(param_name), base));
        }
    }

    ctx.current_returns = returns
        .iter()
        .map(|r| VarKind::of_spec(r, ctx.interner))
        .collect();
    ctx.current_return_zeros = returns.iter().map(|r| zero_value(ctx, r)).collect();

    let ret = match returns.len() {
        0 => String::new(),
        1 => format!(" {}", go_type(ctx, &returns[0])),
        _ => {
            let rendered: Vec<String> = returns.iter().map(|r| go_type(ctx, r)).collect();
            format!(" ({})", rendered.join(", "))
        }
    };

    match receiver {
        Some((recv_name, recv_type)) => {
            let kind = VarKind::of_spec(recv_type, ctx.interner);
            ctx.register_var(&recv_name, kind);
            writeln!(
                out,
                "func ({} {}) {}({}){} {{",
                escape_ident(&recv_name),
                go_type(ctx, recv_type),
                escape_ident(declared),
                param_strs.join(", "),
                ret
            )
            .unwrap();
        }
        None => {
            writeln!(
                out,
                "func {}({}){} {{",
                go_func_name(declared),
                param_strs.join(", "),
                ret
            )
            .unwrap();
        }
    }

    emit_block(ctx, body, 1, out);
    writeln!(out, "}}\n").unwrap();

    ctx.vars = saved_vars;
    ctx.byref = saved_byref;
    ctx.current_fn = saved_fn;
    ctx.goto_targets = saved_targets;
    ctx.label_names = saved_labels;
    ctx.current_returns = Vec::new();
    ctx.current_return_zeros = Vec::new();
}

fn collect_goto_targets(ctx: &mut GoContext<'_>, block: Block<'_>) {
    for stmt in block {
        match stmt {
            Stmt::Goto { label, .. } => {
                let upper = ctx.interner.resolve(*label).to_ascii_uppercase();
                ctx.goto_targets.insert(upper);
            }
            Stmt::Label { name, .. } => {
                let text = ctx.interner.resolve(*name);
                ctx.label_names.insert(text.to_ascii_uppercase(), text.to_string());
            }
            Stmt::If { then_block, elseifs, else_block, .. } => {
                collect_goto_targets(ctx, then_block);
                for clause in elseifs.iter() {
                    collect_goto_targets(ctx, clause.block);
                }
                if let Some(else_block) = else_block {
                    collect_goto_targets(ctx, else_block);
                }
            }
            Stmt::For { body, .. } | Stmt::While { body, .. } | Stmt::DoLoop { body, .. } => {
                collect_goto_targets(ctx, body);
            }
            Stmt::Select { cases, default, .. } => {
                for case in cases.iter() {
                    collect_goto_targets(ctx, case.block);
                }
                if let Some(default) = default {
                    collect_goto_targets(ctx, default);
                }
            }
            Stmt::BlockStmt { stmts, .. } => collect_goto_targets(ctx, stmts),
            _ => {}
        }
    }
}

/// Emits a package-level `DIM`/`CONST`.
pub fn emit_global(ctx: &mut GoContext<'_>, stmt: &Stmt<'_>, out: &mut String) {
    match stmt {
        Stmt::Dim { name, ty, array_size, init, .. } => {
            let var_name = escape_ident(ctx.interner.resolve(*name));
            let kind = if array_size.is_some() {
                VarKind::Other
            } else {
                VarKind::of_spec(ty, ctx.interner)
            };
            ctx.register_var(ctx.interner.resolve(*name), kind);
            let go_ty = go_dim_type(ctx, ty, array_size.as_deref());
            match init {
                Some(init) => {
                    let value = wrap_numeric(ctx, kind, init);
                    writeln!(out, "var {} {} = {}", var_name, go_ty, value).unwrap();
                }
                None => writeln!(out, "var {} {}", var_name, go_ty).unwrap(),
            }
        }
        Stmt::Const { name, ty, value, .. } => {
            let const_name = escape_ident(ctx.interner.resolve(*name));
            let kind = VarKind::of_spec(ty, ctx.interner);
            ctx.register_var(ctx.interner.resolve(*name), kind);
            let go_ty = go_type(ctx, ty);
            if is_const_literal(value) {
                let rendered = go_expr(ctx, value);
                writeln!(out, "const {} {} = {}", const_name, go_ty, rendered).unwrap();
            } else {
                let rendered = wrap_numeric(ctx, kind, value);
                writeln!(out, "var {} {} = {}", const_name, go_ty, rendered).unwrap();
            }
        }
        Stmt::BlockStmt { stmts, .. } => {
            for inner in stmts.iter() {
                emit_global(ctx, inner, out);
            }
        }
        _ => {}
    }
}
