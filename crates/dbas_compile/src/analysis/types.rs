//! The semantic type algebra.
//!
//! [`Ty`] is what the analyzer resolves parsed
//! [`TypeSpec`](dbas_language::ast::TypeSpec) syntax into. The interesting
//! rules all live here:
//!
//! - the numeric ladder `INTEGER ⊆ LONG ⊆ SINGLE ⊆ DOUBLE`, widened by
//!   arithmetic and accepted by assignment in the widening direction only;
//! - `ANY`, which is assignment-compatible in both directions with every
//!   type, the escape hatch that keeps external calls and `NIL` loose
//!   without making the whole core dynamic;
//! - `EXTERNAL`, which behaves like `ANY` (the compiler cannot see across a
//!   package boundary, so it does not pretend to).

/// A resolved semantic type.
#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    /// Error-recovery type; compatible with everything to avoid cascades.
    Unknown,
    Integer,
    Long,
    Single,
    Double,
    Str,
    Boolean,
    Json,
    Bytes,
    Error,
    Any,
    Void,
    Pointer(Box<Ty>),
    Channel(Box<Ty>),
    Array(Box<Ty>),
    Slice(Box<Ty>),
    Struct(StructTy),
    External(ExternalTy),
    Function(FuncTy),
    Sub(FuncTy),
}

/// A user-declared record type.
#[derive(Debug, Clone, PartialEq)]
pub struct StructTy {
    /// Declared name, original casing.
    pub name: String,
    /// Optional interface tag from `IMPLEMENTS`.
    pub implements: Option<String>,
    /// Embedded type names, declaration order.
    pub embedded: Vec<String>,
    /// Named fields, declaration order.
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// Declared name, original casing.
    pub name: String,
    pub ty: Ty,
}

impl StructTy {
    /// Case-insensitive field lookup.
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }
}

/// A type referenced through an imported package; opaque to the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalTy {
    pub alias: String,
    pub type_name: String,
    pub import_path: String,
}

/// Signature of a function, sub, or method.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncTy {
    pub params: Vec<Ty>,
    pub returns: Vec<Ty>,
    pub variadic: bool,
    /// Per-parameter `BYREF` flags; empty means all by value.
    pub by_ref: Vec<bool>,
}

impl FuncTy {
    pub fn new(params: Vec<Ty>, returns: Vec<Ty>) -> Self {
        FuncTy { params, returns, variadic: false, by_ref: Vec::new() }
    }

    pub fn variadic(params: Vec<Ty>, returns: Vec<Ty>) -> Self {
        FuncTy { params, returns, variadic: true, by_ref: Vec::new() }
    }

    pub fn is_by_ref(&self, index: usize) -> bool {
        self.by_ref.get(index).copied().unwrap_or(false)
    }
}

impl Ty {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Integer | Ty::Long | Ty::Single | Ty::Double)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Ty::Integer | Ty::Long)
    }

    /// True for the types member access and calls pass through untyped.
    pub fn is_opaque(&self) -> bool {
        matches!(self, Ty::Any | Ty::Unknown | Ty::External(_))
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            Ty::Integer => Some(0),
            Ty::Long => Some(1),
            Ty::Single => Some(2),
            Ty::Double => Some(3),
            _ => None,
        }
    }

    /// The wider of two numeric types.
    pub fn widen(&self, other: &Ty) -> Ty {
        match (self.numeric_rank(), other.numeric_rank()) {
            (Some(a), Some(b)) => {
                if a >= b {
                    self.clone()
                } else {
                    other.clone()
                }
            }
            _ => Ty::Unknown,
        }
    }

    /// Whether a value of type `value` may be assigned to a slot of type
    /// `self`.
    pub fn accepts(&self, value: &Ty) -> bool {
        // ANY flows both ways; Unknown means an error was already reported.
        if self.is_opaque() || value.is_opaque() {
            return true;
        }
        match (self, value) {
            (a, b) if a == b => true,
            (target, value) if target.is_numeric() && value.is_numeric() => {
                value.numeric_rank() <= target.numeric_rank()
            }
            (Ty::Pointer(a), Ty::Pointer(b)) => a.accepts(b),
            (Ty::Channel(a), Ty::Channel(b)) => a.accepts(b),
            (Ty::Slice(a), Ty::Slice(b)) => a.accepts(b),
            (Ty::Array(a), Ty::Array(b)) => a.accepts(b),
            (Ty::Struct(a), Ty::Struct(b)) => a.name.eq_ignore_ascii_case(&b.name),
            _ => false,
        }
    }

    /// User-facing type name, spelled the way declarations spell it.
    pub fn name(&self) -> String {
        match self {
            Ty::Unknown => "UNKNOWN".to_string(),
            Ty::Integer => "INTEGER".to_string(),
            Ty::Long => "LONG".to_string(),
            Ty::Single => "SINGLE".to_string(),
            Ty::Double => "DOUBLE".to_string(),
            Ty::Str => "STRING".to_string(),
            Ty::Boolean => "BOOLEAN".to_string(),
            Ty::Json => "JSON".to_string(),
            Ty::Bytes => "BYTES".to_string(),
            Ty::Error => "ERROR".to_string(),
            Ty::Any => "ANY".to_string(),
            Ty::Void => "VOID".to_string(),
            Ty::Pointer(elem) => format!("POINTER TO {}", elem.name()),
            Ty::Channel(elem) => format!("CHAN OF {}", elem.name()),
            Ty::Array(elem) => format!("ARRAY OF {}", elem.name()),
            Ty::Slice(elem) => format!("[]{}", elem.name()),
            Ty::Struct(s) => s.name.clone(),
            Ty::External(e) => format!("{}.{}", e.alias, e.type_name),
            Ty::Function(_) => "FUNCTION".to_string(),
            Ty::Sub(_) => "SUB".to_string(),
        }
    }
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ladder_widens_upward() {
        assert_eq!(Ty::Integer.widen(&Ty::Double), Ty::Double);
        assert_eq!(Ty::Long.widen(&Ty::Integer), Ty::Long);
        assert_eq!(Ty::Single.widen(&Ty::Single), Ty::Single);
    }

    #[test]
    fn assignment_accepts_widening_only() {
        assert!(Ty::Double.accepts(&Ty::Integer));
        assert!(Ty::Long.accepts(&Ty::Integer));
        assert!(!Ty::Integer.accepts(&Ty::Double));
        assert!(!Ty::Single.accepts(&Ty::Double));
    }

    #[test]
    fn any_flows_both_directions() {
        assert!(Ty::Any.accepts(&Ty::Str));
        assert!(Ty::Str.accepts(&Ty::Any));
        assert!(Ty::Integer.accepts(&Ty::Any));
    }

    #[test]
    fn external_is_opaque() {
        let ext = Ty::External(ExternalTy {
            alias: "http".to_string(),
            type_name: "Request".to_string(),
            import_path: "net/http".to_string(),
        });
        assert!(ext.accepts(&Ty::Integer));
        assert!(Ty::Str.accepts(&ext));
    }

    #[test]
    fn string_and_integer_do_not_mix() {
        assert!(!Ty::Integer.accepts(&Ty::Str));
        assert!(!Ty::Str.accepts(&Ty::Integer));
    }

    #[test]
    fn channel_element_types_must_match() {
        let ints = Ty::Channel(Box::new(Ty::Integer));
        let strs = Ty::Channel(Box::new(Ty::Str));
        assert!(ints.accepts(&ints.clone()));
        assert!(!ints.accepts(&strs));
    }

    #[test]
    fn struct_compatibility_is_by_name_case_insensitive() {
        let a = Ty::Struct(StructTy {
            name: "Point".to_string(),
            implements: None,
            embedded: Vec::new(),
            fields: Vec::new(),
        });
        let b = Ty::Struct(StructTy {
            name: "POINT".to_string(),
            implements: None,
            embedded: Vec::new(),
            fields: Vec::new(),
        });
        assert!(a.accepts(&b));
    }

    #[test]
    fn field_lookup_is_case_insensitive() {
        let s = StructTy {
            name: "Point".to_string(),
            implements: None,
            embedded: Vec::new(),
            fields: vec![StructField { name: "x".to_string(), ty: Ty::Integer }],
        };
        assert!(s.field("X").is_some());
        assert!(s.field("y").is_none());
    }

    #[test]
    fn display_names_compose() {
        assert_eq!(Ty::Pointer(Box::new(Ty::Integer)).name(), "POINTER TO INTEGER");
        assert_eq!(Ty::Slice(Box::new(Ty::Str)).name(), "[]STRING");
        assert_eq!(Ty::Channel(Box::new(Ty::Double)).name(), "CHAN OF DOUBLE");
    }
}
