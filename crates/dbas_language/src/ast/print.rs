//! Canonical source rendering of the AST.
//!
//! Rendering an AST and re-parsing the result yields a structurally equal
//! tree; the printer exists for that round-trip property, for `-v`
//! debugging, and for tests that want to assert on parsed shapes without
//! walking nodes by hand.
//!
//! Expressions are rendered fully parenthesized, so operator precedence
//! survives the trip textually.

use dbas_base::{Interner, Symbol};

use super::expr::Expr;
use super::stmt::{Block, ExitKind, PrintSep, Stmt};
use super::types::TypeSpec;
use crate::token::TokenKind;

/// Renders a whole program.
pub fn program_to_source(stmts: &[Stmt<'_>], interner: &Interner) -> String {
    let mut out = String::new();
    for stmt in stmts {
        stmt_to_source(stmt, interner, 0, &mut out);
    }
    out
}

fn push_indent(out: &mut String, indent: usize) {
    for _ in 0..indent {
        out.push_str("    ");
    }
}

fn block_to_source(block: Block<'_>, interner: &Interner, indent: usize, out: &mut String) {
    for stmt in block {
        stmt_to_source(stmt, interner, indent, out);
    }
}

/// Renders one statement, with trailing newline.
pub fn stmt_to_source(stmt: &Stmt<'_>, interner: &Interner, indent: usize, out: &mut String) {
    push_indent(out, indent);
    match stmt {
        Stmt::Import { path, alias, .. } => {
            out.push_str("IMPORT \"");
            out.push_str(interner.resolve(*path));
            out.push('"');
            if let Some(alias) = alias {
                out.push_str(" AS ");
                out.push_str(interner.resolve(*alias));
            }
        }
        Stmt::Dim { name, ty, array_size, init, .. } => {
            out.push_str("DIM ");
            out.push_str(interner.resolve(*name));
            if let Some(size) = array_size {
                out.push('(');
                out.push_str(&expr_to_source(size, interner));
                out.push(')');
            }
            out.push_str(" AS ");
            out.push_str(&typespec_to_source(ty, interner));
            if let Some(init) = init {
                out.push_str(" = ");
                out.push_str(&expr_to_source(init, interner));
            }
        }
        Stmt::Let { name, value, .. } => {
            out.push_str("LET ");
            out.push_str(interner.resolve(*name));
            out.push_str(" = ");
            out.push_str(&expr_to_source(value, interner));
        }
        Stmt::Const { name, ty, value, .. } => {
            out.push_str("CONST ");
            out.push_str(interner.resolve(*name));
            out.push_str(" AS ");
            out.push_str(&typespec_to_source(ty, interner));
            out.push_str(" = ");
            out.push_str(&expr_to_source(value, interner));
        }
        Stmt::Assignment { target, value, .. } => {
            out.push_str(&expr_to_source(target, interner));
            out.push_str(" = ");
            out.push_str(&expr_to_source(value, interner));
        }
        Stmt::MultiAssignment { targets, value, .. } => {
            let rendered: Vec<String> =
                targets.iter().map(|t| expr_to_source(t, interner)).collect();
            out.push_str(&rendered.join(", "));
            out.push_str(" = ");
            out.push_str(&expr_to_source(value, interner));
        }
        Stmt::Print { values, separators, .. } => {
            out.push_str("PRINT");
            for (i, value) in values.iter().enumerate() {
                out.push(' ');
                out.push_str(&expr_to_source(value, interner));
                if let Some(sep) = separators.get(i) {
                    out.push(match sep {
                        PrintSep::Comma => ',',
                        PrintSep::Semicolon => ';',
                    });
                }
            }
        }
        Stmt::Input { prompt, var, .. } => {
            out.push_str("INPUT ");
            if let Some(prompt) = prompt {
                out.push_str(&expr_to_source(prompt, interner));
                out.push_str("; ");
            }
            out.push_str(interner.resolve(*var));
        }
        Stmt::If { cond, then_block, elseifs, else_block, .. } => {
            out.push_str("IF ");
            out.push_str(&expr_to_source(cond, interner));
            out.push_str(" THEN\n");
            block_to_source(then_block, interner, indent + 1, out);
            for clause in elseifs.iter() {
                push_indent(out, indent);
                out.push_str("ELSEIF ");
                out.push_str(&expr_to_source(clause.cond, interner));
                out.push_str(" THEN\n");
                block_to_source(clause.block, interner, indent + 1, out);
            }
            if let Some(else_block) = else_block {
                push_indent(out, indent);
                out.push_str("ELSE\n");
                block_to_source(else_block, interner, indent + 1, out);
            }
            push_indent(out, indent);
            out.push_str("END IF");
        }
        Stmt::For { var, start, end, step, body, .. } => {
            out.push_str("FOR ");
            out.push_str(interner.resolve(*var));
            out.push_str(" = ");
            out.push_str(&expr_to_source(start, interner));
            out.push_str(" TO ");
            out.push_str(&expr_to_source(end, interner));
            if let Some(step) = step {
                out.push_str(" STEP ");
                out.push_str(&expr_to_source(step, interner));
            }
            out.push('\n');
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str("NEXT");
        }
        Stmt::While { cond, body, .. } => {
            out.push_str("WHILE ");
            out.push_str(&expr_to_source(cond, interner));
            out.push('\n');
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str("WEND");
        }
        Stmt::DoLoop { cond, body, is_while, pre_condition, .. } => {
            out.push_str("DO");
            if *pre_condition {
                if let Some(cond) = cond {
                    out.push_str(if *is_while { " WHILE " } else { " UNTIL " });
                    out.push_str(&expr_to_source(cond, interner));
                }
            }
            out.push('\n');
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str("LOOP");
            if !*pre_condition {
                if let Some(cond) = cond {
                    out.push_str(if *is_while { " WHILE " } else { " UNTIL " });
                    out.push_str(&expr_to_source(cond, interner));
                }
            }
        }
        Stmt::Select { test, cases, default, .. } => {
            out.push_str("SELECT CASE ");
            out.push_str(&expr_to_source(test, interner));
            out.push('\n');
            for case in cases.iter() {
                push_indent(out, indent);
                out.push_str("CASE ");
                let values: Vec<String> =
                    case.values.iter().map(|v| expr_to_source(v, interner)).collect();
                out.push_str(&values.join(", "));
                out.push('\n');
                block_to_source(case.block, interner, indent + 1, out);
            }
            if let Some(default) = default {
                push_indent(out, indent);
                out.push_str("CASE ELSE\n");
                block_to_source(default, interner, indent + 1, out);
            }
            push_indent(out, indent);
            out.push_str("END SELECT");
        }
        Stmt::TypeDecl { name, implements, embedded, fields, .. } => {
            out.push_str("TYPE ");
            out.push_str(interner.resolve(*name));
            if let Some(iface) = implements {
                out.push_str(" IMPLEMENTS ");
                out.push_str(interner.resolve(*iface));
            }
            out.push('\n');
            for base in embedded.iter() {
                push_indent(out, indent + 1);
                out.push_str("EMBED ");
                out.push_str(interner.resolve(*base));
                out.push('\n');
            }
            for field in fields.iter() {
                push_indent(out, indent + 1);
                out.push_str(interner.resolve(field.name));
                out.push_str(" AS ");
                out.push_str(&typespec_to_source(field.ty, interner));
                out.push('\n');
            }
            push_indent(out, indent);
            out.push_str("END TYPE");
        }
        Stmt::Sub { name, params, body, .. } => {
            out.push_str("SUB ");
            out.push_str(interner.resolve(*name));
            out.push('(');
            out.push_str(&params_to_source(params, interner));
            out.push_str(")\n");
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str("END SUB");
        }
        Stmt::Function { name, params, returns, body, .. } => {
            out.push_str("FUNCTION ");
            out.push_str(interner.resolve(*name));
            out.push('(');
            out.push_str(&params_to_source(params, interner));
            out.push(')');
            out.push_str(&returns_to_source(returns, interner));
            out.push('\n');
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str("END FUNCTION");
        }
        Stmt::Method { receiver_name, receiver_type, name, params, returns, body, .. } => {
            let is_sub = returns.is_empty();
            out.push_str(if is_sub { "SUB (" } else { "FUNCTION (" });
            out.push_str(interner.resolve(*receiver_name));
            out.push_str(" AS ");
            out.push_str(&typespec_to_source(receiver_type, interner));
            out.push_str(") ");
            out.push_str(interner.resolve(*name));
            out.push('(');
            out.push_str(&params_to_source(params, interner));
            out.push(')');
            out.push_str(&returns_to_source(returns, interner));
            out.push('\n');
            block_to_source(body, interner, indent + 1, out);
            push_indent(out, indent);
            out.push_str(if is_sub { "END SUB" } else { "END FUNCTION" });
        }
        Stmt::Return { values, .. } => {
            out.push_str("RETURN");
            let rendered: Vec<String> =
                values.iter().map(|v| expr_to_source(v, interner)).collect();
            if !rendered.is_empty() {
                out.push(' ');
                out.push_str(&rendered.join(", "));
            }
        }
        Stmt::Exit { kind, .. } => {
            out.push_str("EXIT ");
            out.push_str(match kind {
                ExitKind::For => "FOR",
                ExitKind::While => "WHILE",
                ExitKind::Do => "DO",
                ExitKind::Sub => "SUB",
                ExitKind::Function => "FUNCTION",
            });
        }
        Stmt::Goto { label, .. } => {
            out.push_str("GOTO ");
            out.push_str(interner.resolve(*label));
        }
        Stmt::Label { name, .. } => {
            out.push_str(interner.resolve(*name));
            out.push(':');
        }
        Stmt::Spawn { call, .. } => {
            out.push_str("SPAWN ");
            out.push_str(&expr_to_source(call, interner));
        }
        Stmt::Send { value, channel, .. } => {
            out.push_str("SEND ");
            out.push_str(&expr_to_source(value, interner));
            out.push_str(" TO ");
            out.push_str(&expr_to_source(channel, interner));
        }
        Stmt::Receive { var, channel, .. } => {
            out.push_str("RECEIVE ");
            out.push_str(&expr_to_source(var, interner));
            out.push_str(" FROM ");
            out.push_str(&expr_to_source(channel, interner));
        }
        Stmt::ExprStmt { expr, .. } => {
            out.push_str(&expr_to_source(expr, interner));
        }
        Stmt::BlockStmt { stmts, .. } => {
            block_to_source(stmts, interner, indent, out);
            return;
        }
    }
    out.push('\n');
}

fn params_to_source(params: &[super::stmt::Param<'_>], interner: &Interner) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|p| {
            let mut s = String::new();
            if p.by_ref {
                s.push_str("BYREF ");
            }
            s.push_str(interner.resolve(p.name));
            s.push_str(" AS ");
            s.push_str(&typespec_to_source(p.ty, interner));
            s
        })
        .collect();
    rendered.join(", ")
}

fn returns_to_source(returns: &[TypeSpec<'_>], interner: &Interner) -> String {
    match returns.len() {
        0 => String::new(),
        1 => format!(" AS {}", typespec_to_source(&returns[0], interner)),
        _ => {
            let rendered: Vec<String> =
                returns.iter().map(|t| typespec_to_source(t, interner)).collect();
            format!(" AS ({})", rendered.join(", "))
        }
    }
}

/// Renders a type spec the way it is written in source.
pub fn typespec_to_source(ty: &TypeSpec<'_>, interner: &Interner) -> String {
    if ty.is_pointer {
        if let Some(elem) = ty.elem {
            return format!("POINTER TO {}", typespec_to_source(elem, interner));
        }
    }
    if ty.is_channel {
        if let Some(elem) = ty.elem {
            return format!("CHAN OF {}", typespec_to_source(elem, interner));
        }
    }
    if ty.is_array {
        if let Some(elem) = ty.elem {
            return format!("[]{}", typespec_to_source(elem, interner));
        }
    }
    match ty.package {
        Some(pkg) => format!(
            "{}.{}",
            interner.resolve(pkg),
            interner.resolve(ty.name)
        ),
        None => interner.resolve(ty.name).to_string(),
    }
}

fn escape_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

fn op_text(op: TokenKind) -> &'static str {
    match op {
        TokenKind::Eq => "=",
        TokenKind::NotEq => "<>",
        TokenKind::Lt => "<",
        TokenKind::Gt => ">",
        TokenKind::LtEq => "<=",
        TokenKind::GtEq => ">=",
        TokenKind::Plus => "+",
        TokenKind::Minus => "-",
        TokenKind::Star => "*",
        TokenKind::Slash => "/",
        TokenKind::Backslash => "\\",
        TokenKind::Caret => "^",
        TokenKind::Ampersand => "&",
        TokenKind::And => "AND",
        TokenKind::Or => "OR",
        TokenKind::Xor => "XOR",
        TokenKind::Not => "NOT",
        TokenKind::Mod => "MOD",
        TokenKind::At => "@",
        _ => "?",
    }
}

fn key_pairs_to_source(pairs: &[(Symbol, Expr<'_>)], interner: &Interner, quote: bool) -> String {
    let rendered: Vec<String> = pairs
        .iter()
        .map(|(key, value)| {
            if quote {
                format!(
                    "\"{}\": {}",
                    escape_string(interner.resolve(*key)),
                    expr_to_source(value, interner)
                )
            } else {
                format!(
                    "{}: {}",
                    interner.resolve(*key),
                    expr_to_source(value, interner)
                )
            }
        })
        .collect();
    rendered.join(", ")
}

/// Renders one expression, fully parenthesized.
pub fn expr_to_source(expr: &Expr<'_>, interner: &Interner) -> String {
    match expr {
        Expr::Identifier { name, .. } => interner.resolve(*name).to_string(),
        Expr::IntegerLit { value, .. } => value.to_string(),
        Expr::FloatLit { value, .. } => {
            let text = value.to_string();
            if text.contains('.') || text.contains('e') || text.contains("inf") {
                text
            } else {
                format!("{}.0", text)
            }
        }
        Expr::StringLit { value, .. } => {
            format!("\"{}\"", escape_string(interner.resolve(*value)))
        }
        Expr::ByteStringLit { value, .. } => {
            format!("B\"{}\"", escape_string(interner.resolve(*value)))
        }
        Expr::BooleanLit { value, .. } => if *value { "TRUE" } else { "FALSE" }.to_string(),
        Expr::NilLit { .. } => "NIL".to_string(),
        Expr::JsonLit { pairs, .. } => {
            format!("{{{}}}", key_pairs_to_source(pairs, interner, true))
        }
        Expr::ArrayLit { elements, .. } => {
            let rendered: Vec<String> =
                elements.iter().map(|e| expr_to_source(e, interner)).collect();
            format!("[{}]", rendered.join(", "))
        }
        Expr::SliceLit { elem_type, elements, .. } => {
            let rendered: Vec<String> =
                elements.iter().map(|e| expr_to_source(e, interner)).collect();
            format!(
                "[]{}{{{}}}",
                interner.resolve(*elem_type),
                rendered.join(", ")
            )
        }
        Expr::StructLit { type_name, fields, .. } => {
            format!(
                "{}{{{}}}",
                interner.resolve(*type_name),
                key_pairs_to_source(fields, interner, false)
            )
        }
        Expr::Prefix { op, right, .. } => match op {
            TokenKind::Not => format!("(NOT {})", expr_to_source(right, interner)),
            _ => format!("({}{})", op_text(*op), expr_to_source(right, interner)),
        },
        Expr::Infix { op, left, right, .. } => format!(
            "({} {} {})",
            expr_to_source(left, interner),
            op_text(*op),
            expr_to_source(right, interner)
        ),
        Expr::Call { func, args, .. } => {
            let rendered: Vec<String> =
                args.iter().map(|a| expr_to_source(a, interner)).collect();
            format!(
                "{}({})",
                expr_to_source(func, interner),
                rendered.join(", ")
            )
        }
        Expr::Index { left, index, end, is_slice, .. } => {
            let left = expr_to_source(left, interner);
            if *is_slice {
                format!(
                    "{}[{}:{}]",
                    left,
                    index.map(|e| expr_to_source(e, interner)).unwrap_or_default(),
                    end.map(|e| expr_to_source(e, interner)).unwrap_or_default()
                )
            } else {
                format!(
                    "{}[{}]",
                    left,
                    index.map(|e| expr_to_source(e, interner)).unwrap_or_default()
                )
            }
        }
        Expr::Member { object, member, .. } => format!(
            "{}.{}",
            expr_to_source(object, interner),
            interner.resolve(*member)
        ),
        Expr::AddressOf { value, .. } => format!("(@{})", expr_to_source(value, interner)),
        Expr::Dereference { value, .. } => format!("(^{})", expr_to_source(value, interner)),
        Expr::MakeChan { elem, size, .. } => match size {
            Some(size) => format!(
                "MAKE_CHAN({}, {})",
                typespec_to_source(elem, interner),
                expr_to_source(size, interner)
            ),
            None => format!("MAKE_CHAN({})", typespec_to_source(elem, interner)),
        },
        Expr::ReceiveExpr { channel, .. } => {
            format!("RECEIVE({})", expr_to_source(channel, interner))
        }
        Expr::TypeAssertion { value, target, .. } => format!(
            "({} AS {})",
            expr_to_source(value, interner),
            typespec_to_source(target, interner)
        ),
    }
}
