//! Expression emission.
//!
//! Every function returns Go source text; emission is syntax-directed and
//! trusts the analyzer: no type checking happens here. Standard-library
//! imports and runtime units get recorded on the context as expressions
//! require them, which is what keeps the final import block minimal.

use dbas_base::Interner;
use dbas_language::ast::Expr;
use dbas_language::token::TokenKind;

use super::context::GoContext;
use super::runtime::helper_for_builtin;
use super::types::{escape_ident, go_string_escape, go_type, go_type_name};

pub fn go_expr(ctx: &mut GoContext<'_>, expr: &Expr<'_>) -> String {
    match expr {
        Expr::Identifier { name, .. } => {
            let text = ctx.interner.resolve(*name);
            if ctx.is_byref(text) {
                format!("(*{})", escape_ident(text))
            } else {
                escape_ident(text)
            }
        }
        Expr::IntegerLit { token, .. } | Expr::FloatLit { token, .. } => {
            ctx.interner.resolve(token.literal).to_string()
        }
        Expr::StringLit { value, .. } => {
            format!("\"{}\"", go_string_escape(ctx.interner.resolve(*value)))
        }
        Expr::ByteStringLit { value, .. } => {
            format!("[]byte(\"{}\")", go_string_escape(ctx.interner.resolve(*value)))
        }
        Expr::BooleanLit { value, .. } => if *value { "true" } else { "false" }.to_string(),
        Expr::NilLit { .. } => "nil".to_string(),
        Expr::JsonLit { pairs, .. } => {
            let rendered: Vec<String> = pairs
                .iter()
                .map(|(key, value)| {
                    format!(
                        "\"{}\": {}",
                        go_string_escape(ctx.interner.resolve(*key)),
                        go_expr(ctx, value)
                    )
                })
                .collect();
            format!("map[string]interface{{}}{{{}}}", rendered.join(", "))
        }
        Expr::ArrayLit { elements, .. } => {
            let elem = elements
                .first()
                .map(|e| literal_elem_type(ctx.interner, e))
                .unwrap_or("interface{}");
            let rendered: Vec<String> =
                elements.iter().map(|e| go_expr(ctx, e)).collect();
            format!("[]{}{{{}}}", elem, rendered.join(", "))
        }
        Expr::SliceLit { elem_type, elements, .. } => {
            let elem = go_type_name(ctx, ctx.interner.resolve(*elem_type));
            let rendered: Vec<String> =
                elements.iter().map(|e| go_expr(ctx, e)).collect();
            format!("[]{}{{{}}}", elem, rendered.join(", "))
        }
        Expr::StructLit { type_name, fields, .. } => {
            let name = ctx.interner.resolve(*type_name);
            let declared = ctx
                .registry
                .get_struct(name)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| name.to_string());
            let rendered: Vec<String> = fields
                .iter()
                .map(|(field, value)| {
                    let field_name = declared_field_name(ctx, &declared, ctx.interner.resolve(*field));
                    format!("{}: {}", field_name, go_expr(ctx, value))
                })
                .collect();
            format!("{}{{{}}}", escape_ident(&declared), rendered.join(", "))
        }
        Expr::Prefix { op, right, .. } => {
            let inner = go_expr(ctx, right);
            match op {
                TokenKind::Not => format!("!({})", inner),
                _ => format!("(-{})", inner),
            }
        }
        Expr::Infix { op, left, right, .. } => go_infix(ctx, *op, left, right),
        Expr::Call { token, func, args } => go_call(ctx, token.pos.line, func, args),
        Expr::Index { left, index, end, is_slice, .. } => {
            let left = go_expr(ctx, left);
            if *is_slice {
                let lo = index.map(|e| go_expr(ctx, e)).unwrap_or_default();
                let hi = end.map(|e| go_expr(ctx, e)).unwrap_or_default();
                format!("{}[{}:{}]", left, lo, hi)
            } else {
                let idx = index.map(|e| go_expr(ctx, e)).unwrap_or_default();
                format!("{}[{}]", left, idx)
            }
        }
        Expr::Member { object, member, .. } => {
            format!(
                "{}.{}",
                go_expr(ctx, object),
                escape_ident(ctx.interner.resolve(*member))
            )
        }
        Expr::AddressOf { value, .. } => format!("&{}", go_expr(ctx, value)),
        Expr::Dereference { value, .. } => format!("(*{})", go_expr(ctx, value)),
        Expr::MakeChan { elem, size, .. } => {
            let elem = go_type(ctx, elem);
            match size {
                Some(size) => format!("make(chan {}, {})", elem, go_expr(ctx, size)),
                None => format!("make(chan {})", elem),
            }
        }
        Expr::ReceiveExpr { channel, .. } => format!("(<-{})", go_expr(ctx, channel)),
        Expr::TypeAssertion { value, target, .. } => {
            format!("{}.({})", go_expr(ctx, value), go_type(ctx, target))
        }
    }
}

/// The Go element type of an array literal, from its first element's
/// compile-time form.
fn literal_elem_type(_interner: &Interner, first: &Expr<'_>) -> &'static str {
    match first {
        Expr::IntegerLit { .. } => "int32",
        Expr::FloatLit { .. } => "float64",
        Expr::StringLit { .. } => "string",
        Expr::BooleanLit { .. } => "bool",
        Expr::ByteStringLit { .. } => "[]byte",
        _ => "interface{}",
    }
}

fn go_infix(ctx: &mut GoContext<'_>, op: TokenKind, left: &Expr<'_>, right: &Expr<'_>) -> String {
    let l = go_expr(ctx, left);
    let r = go_expr(ctx, right);
    match op {
        TokenKind::Caret => {
            ctx.require_import("math");
            format!("math.Pow(float64({}), float64({}))", l, r)
        }
        TokenKind::Xor => format!("(({} || {}) && !({} && {}))", l, r, l, r),
        TokenKind::Eq => format!("({} == {})", l, r),
        TokenKind::NotEq => format!("({} != {})", l, r),
        TokenKind::Lt => format!("({} < {})", l, r),
        TokenKind::Gt => format!("({} > {})", l, r),
        TokenKind::LtEq => format!("({} <= {})", l, r),
        TokenKind::GtEq => format!("({} >= {})", l, r),
        TokenKind::Plus | TokenKind::Ampersand => format!("({} + {})", l, r),
        TokenKind::Minus => format!("({} - {})", l, r),
        TokenKind::Star => format!("({} * {})", l, r),
        TokenKind::Slash | TokenKind::Backslash => format!("({} / {})", l, r),
        TokenKind::Mod => format!("({} % {})", l, r),
        TokenKind::And => format!("({} && {})", l, r),
        TokenKind::Or => format!("({} || {})", l, r),
        _ => format!("({} /*?*/ {})", l, r),
    }
}

fn go_call(ctx: &mut GoContext<'_>, line: u32, func: &Expr<'_>, args: &[Expr<'_>]) -> String {
    if let Expr::Identifier { name, .. } = func {
        let name_str = ctx.interner.resolve(*name).to_string();
        let upper = name_str.to_ascii_uppercase();

        if let Some(text) = go_passthrough(ctx, &upper, args) {
            return text;
        }
        if let Some(text) = go_math_builtin(ctx, &upper, args) {
            return text;
        }
        if let Some((helper, unit)) = helper_for_builtin(&upper) {
            ctx.require_unit(unit);
            let mut rendered: Vec<String> = Vec::new();
            if unit == "errorx" {
                // Error constructors get the source site spliced in.
                let (file, mapped) = ctx.resolve_line(line);
                rendered.push(format!("\"{}\"", go_string_escape(&file)));
                rendered.push(mapped.to_string());
                rendered.push(format!("\"{}\"", go_string_escape(&ctx.current_fn)));
            }
            rendered.extend(args.iter().map(|a| go_expr(ctx, a)));
            return format!("{}({})", helper, rendered.join(", "));
        }

        // A user function or sub: emit with its declared casing and wrap
        // BYREF arguments in an address-of.
        let (emitted_name, byref) = match ctx.table.resolve_global(&name_str) {
            Some(info) => {
                let flags = match &info.ty {
                    crate::analysis::Ty::Function(sig) | crate::analysis::Ty::Sub(sig) => {
                        sig.by_ref.clone()
                    }
                    _ => Vec::new(),
                };
                (info.name.clone(), flags)
            }
            None => (name_str.clone(), Vec::new()),
        };
        let rendered: Vec<String> = args
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let text = go_expr(ctx, arg);
                if byref.get(i).copied().unwrap_or(false) {
                    format!("&{}", text)
                } else {
                    text
                }
            })
            .collect();
        return format!("{}({})", escape_ident(&emitted_name), rendered.join(", "));
    }

    // Member calls: methods and external package functions emit the same way.
    let callee = go_expr(ctx, func);
    let rendered: Vec<String> = args.iter().map(|a| go_expr(ctx, a)).collect();
    format!("{}({})", callee, rendered.join(", "))
}

/// Go-builtin passthroughs (`LEN`, `APPEND`, ...), handled by name.
fn go_passthrough(ctx: &mut GoContext<'_>, upper: &str, args: &[Expr<'_>]) -> Option<String> {
    let rendered: Vec<String> = args.iter().map(|a| go_expr(ctx, a)).collect();
    let joined = rendered.join(", ");
    let text = match upper {
        "LEN" => format!("int32(len({}))", joined),
        "CAP" => format!("int32(cap({}))", joined),
        "MAKE" => format!("make({})", joined),
        "COPY" => format!("copy({})", joined),
        "DELETE" => format!("delete({})", joined),
        "CLOSE" => format!("close({})", joined),
        "PANIC" => format!("panic({})", joined),
        "RECOVER" => "recover()".to_string(),
        "STRING" => format!("string({})", joined),
        "RUNE" => format!("rune({})", joined),
        "BYTE" => format!("byte({})", joined),
        "NEW" => format!("new({})", joined),
        "APPEND" => format!("append({})", joined),
        _ => return None,
    };
    Some(text)
}

/// Math builtins mapping straight onto `math`; arguments widen to float64.
fn go_math_builtin(ctx: &mut GoContext<'_>, upper: &str, args: &[Expr<'_>]) -> Option<String> {
    let direct = match upper {
        "ABS" => "math.Abs",
        "SQR" => "math.Sqrt",
        "SIN" => "math.Sin",
        "COS" => "math.Cos",
        "TAN" => "math.Tan",
        "ATN" => "math.Atan",
        "ATN2" => "math.Atan2",
        "LOG" => "math.Log",
        "LOG10" => "math.Log10",
        "EXP" => "math.Exp",
        "POW" => "math.Pow",
        "FLOOR" => "math.Floor",
        "CEIL" => "math.Ceil",
        "ROUND" => "math.Round",
        "MIN" => "math.Min",
        "MAX" => "math.Max",
        "PI" => {
            ctx.require_import("math");
            return Some("math.Pi".to_string());
        }
        "FIX" => {
            let arg = args.first().map(|a| go_expr(ctx, a)).unwrap_or_default();
            return Some(format!("int32({})", arg));
        }
        _ => return None,
    };
    ctx.require_import("math");
    let rendered: Vec<String> = args
        .iter()
        .map(|a| format!("float64({})", go_expr(ctx, a)))
        .collect();
    Some(format!("{}({})", direct, rendered.join(", ")))
}

/// Declared casing of a struct field, falling back to the written form.
fn declared_field_name(ctx: &GoContext<'_>, type_name: &str, written: &str) -> String {
    if let Some(s) = ctx.registry.get_struct(type_name) {
        if let Some(field) = s.field(written) {
            return escape_ident(&field.name);
        }
    }
    escape_ident(written)
}
