//! Go type mapping and identifier policy.

use dbas_base::Interner;
use dbas_language::ast::TypeSpec;

use super::expr::go_expr;
use super::context::GoContext;

/// Go's reserved words. User identifiers matching one exactly are emitted
/// with a `_` suffix; everything else passes through verbatim.
const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

pub fn escape_ident(name: &str) -> String {
    if GO_KEYWORDS.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Go spelling of a primitive type name, or `None` for user/external types.
pub fn primitive_go_type(upper: &str) -> Option<&'static str> {
    let mapped = match upper {
        "INTEGER" => "int32",
        "LONG" => "int64",
        "SINGLE" => "float32",
        "DOUBLE" => "float64",
        "STRING" => "string",
        "BOOLEAN" => "bool",
        "JSON" => "map[string]interface{}",
        "BYTES" => "[]byte",
        "ANY" => "interface{}",
        "ERROR" => "error",
        _ => return None,
    };
    Some(mapped)
}

/// Go type text for parsed type syntax.
///
/// User type names are emitted with their declared casing (the registry
/// remembers it); unknown names pass through as written.
pub fn go_type(ctx: &GoContext<'_>, spec: &TypeSpec<'_>) -> String {
    if spec.is_pointer {
        let elem = spec.elem.map(|e| go_type(ctx, e)).unwrap_or_default();
        return format!("*{}", elem);
    }
    if spec.is_channel {
        let elem = spec.elem.map(|e| go_type(ctx, e)).unwrap_or_default();
        return format!("chan {}", elem);
    }
    if spec.is_array {
        let elem = spec.elem.map(|e| go_type(ctx, e)).unwrap_or_default();
        return format!("[]{}", elem);
    }
    if let Some(package) = spec.package {
        return format!(
            "{}.{}",
            ctx.interner.resolve(package),
            ctx.interner.resolve(spec.name)
        );
    }
    go_type_name(ctx, ctx.interner.resolve(spec.name))
}

/// Go type text for a bare type name (used by slice literals).
pub fn go_type_name(ctx: &GoContext<'_>, name: &str) -> String {
    if let Some(primitive) = primitive_go_type(&name.to_ascii_uppercase()) {
        return primitive.to_string();
    }
    match ctx.registry.get_struct(name) {
        Some(s) => escape_ident(&s.name),
        None => escape_ident(name),
    }
}

/// Go type for a `DIM` with an optional `name(size)` array form.
pub fn go_dim_type(
    ctx: &mut GoContext<'_>,
    spec: &TypeSpec<'_>,
    array_size: Option<&dbas_language::ast::Expr<'_>>,
) -> String {
    match array_size {
        Some(size) => format!("[{}]{}", go_expr(ctx, size), go_type_immutable(ctx, spec)),
        None => go_type_immutable(ctx, spec),
    }
}

fn go_type_immutable(ctx: &GoContext<'_>, spec: &TypeSpec<'_>) -> String {
    go_type(ctx, spec)
}

/// Zero value of a parsed type, for `EXIT FUNCTION` returns.
pub fn zero_value(ctx: &GoContext<'_>, spec: &TypeSpec<'_>) -> String {
    if spec.is_pointer || spec.is_channel || spec.is_array {
        return "nil".to_string();
    }
    if spec.package.is_some() {
        return format!("{}{{}}", go_type(ctx, spec));
    }
    let name = ctx.interner.resolve(spec.name);
    match name.to_ascii_uppercase().as_str() {
        "INTEGER" | "LONG" => "0".to_string(),
        "SINGLE" | "DOUBLE" => "0.0".to_string(),
        "STRING" => "\"\"".to_string(),
        "BOOLEAN" => "false".to_string(),
        "JSON" | "BYTES" | "ANY" | "ERROR" => "nil".to_string(),
        _ => match ctx.registry.get_struct(name) {
            Some(s) => format!("{}{{}}", escape_ident(&s.name)),
            None => "nil".to_string(),
        },
    }
}

/// Subprogram names emit with their declared casing, except a sub spelled
/// exactly `main`, which would collide with the generated entry point.
pub fn go_func_name(declared: &str) -> String {
    if declared == "main" {
        "main_".to_string()
    } else {
        escape_ident(declared)
    }
}

/// Go type text for an analyzer-resolved type (struct fields come from the
/// registry as [`Ty`] values rather than parsed syntax).
pub fn go_ty(ty: &crate::analysis::Ty) -> String {
    use crate::analysis::Ty;
    match ty {
        Ty::Integer => "int32".to_string(),
        Ty::Long => "int64".to_string(),
        Ty::Single => "float32".to_string(),
        Ty::Double => "float64".to_string(),
        Ty::Str => "string".to_string(),
        Ty::Boolean => "bool".to_string(),
        Ty::Json => "map[string]interface{}".to_string(),
        Ty::Bytes => "[]byte".to_string(),
        Ty::Error => "error".to_string(),
        Ty::Pointer(elem) => format!("*{}", go_ty(elem)),
        Ty::Channel(elem) => format!("chan {}", go_ty(elem)),
        Ty::Slice(elem) | Ty::Array(elem) => format!("[]{}", go_ty(elem)),
        Ty::Struct(s) => escape_ident(&s.name),
        Ty::External(e) => format!("{}.{}", e.alias, e.type_name),
        _ => "interface{}".to_string(),
    }
}

/// The widening conversion a numeric slot applies to its right-hand side.
///
/// BASIC lets an `INTEGER` flow into a `DOUBLE` slot; Go does not convert
/// between numeric types implicitly, so assignments into typed numeric
/// slots are wrapped explicitly.
pub fn numeric_wrap(kind: super::context::VarKind) -> Option<&'static str> {
    use super::context::VarKind;
    match kind {
        VarKind::Integer => Some("int32"),
        VarKind::Long => Some("int64"),
        VarKind::Single => Some("float32"),
        VarKind::Double => Some("float64"),
        _ => None,
    }
}

/// Escapes a DBAS string value into a Go double-quoted literal body.
pub fn go_string_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_keywords_get_suffixed() {
        assert_eq!(escape_ident("type"), "type_");
        assert_eq!(escape_ident("func"), "func_");
        assert_eq!(escape_ident("counter"), "counter");
        // Case matters: Go keywords are lowercase, so `Type` is untouched.
        assert_eq!(escape_ident("Type"), "Type");
    }

    #[test]
    fn primitive_mapping_matches_the_ladder() {
        assert_eq!(primitive_go_type("INTEGER"), Some("int32"));
        assert_eq!(primitive_go_type("LONG"), Some("int64"));
        assert_eq!(primitive_go_type("SINGLE"), Some("float32"));
        assert_eq!(primitive_go_type("DOUBLE"), Some("float64"));
        assert_eq!(primitive_go_type("JSON"), Some("map[string]interface{}"));
        assert_eq!(primitive_go_type("POINT"), None);
    }

    #[test]
    fn string_escaping_round_trips_specials() {
        assert_eq!(go_string_escape("a\tb\n\"c\"\\"), "a\\tb\\n\\\"c\\\"\\\\");
    }
}
