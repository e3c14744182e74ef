use crate::language::ast::{self, Expr, TypeExpr};
use crate::runtime::error::RuntimeError;
use crate::runtime::namespace::NameSpace;
use crate::runtime::value::FuncValue;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntKind {
    Int,
    I8,
    I16,
    I32,
    I64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UintKind {
    Uint,
    U8,
    U16,
    U32,
    U64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComplexKind {
    C64,
    C128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Type {
    Int(IntKind),
    Uint(UintKind),
    Float(FloatKind),
    Complex(ComplexKind),
    Bool,
    String,
    /// The `error` interface.
    Error,
    /// The empty interface; appears only in host function signatures.
    Any,
    Slice(Rc<Type>),
    Map(Rc<Type>, Rc<Type>),
    Chan(ChanDir, Rc<Type>),
    Pointer(Rc<Type>),
    Func(Rc<Signature>),
    Struct(Rc<StructType>),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signature {
    pub params: Vec<Type>,
    /// Element type of a trailing variadic parameter.
    pub variadic: Option<Type>,
    pub results: Vec<Type>,
}

#[derive(Clone, Debug)]
pub struct StructType {
    pub name: String,
    pub fields: Vec<StructField>,
    pub methods: Vec<StructMethod>,
}

impl PartialEq for StructType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

#[derive(Clone, Debug)]
pub struct StructField {
    pub name: String,
    pub ty: Type,
}

#[derive(Clone, Debug)]
pub struct StructMethod {
    pub name: String,
    pub func: FuncValue,
}

impl IntKind {
    pub fn name(self) -> &'static str {
        match self {
            IntKind::Int => "int",
            IntKind::I8 => "int8",
            IntKind::I16 => "int16",
            IntKind::I32 => "int32",
            IntKind::I64 => "int64",
        }
    }

    /// Wraps a value to the kind's width, as machine arithmetic would.
    pub fn truncate(self, v: i64) -> i64 {
        match self {
            IntKind::Int | IntKind::I64 => v,
            IntKind::I8 => v as i8 as i64,
            IntKind::I16 => v as i16 as i64,
            IntKind::I32 => v as i32 as i64,
        }
    }
}

impl UintKind {
    pub fn name(self) -> &'static str {
        match self {
            UintKind::Uint => "uint",
            UintKind::U8 => "uint8",
            UintKind::U16 => "uint16",
            UintKind::U32 => "uint32",
            UintKind::U64 => "uint64",
        }
    }

    pub fn truncate(self, v: u64) -> u64 {
        match self {
            UintKind::Uint | UintKind::U64 => v,
            UintKind::U8 => v as u8 as u64,
            UintKind::U16 => v as u16 as u64,
            UintKind::U32 => v as u32 as u64,
        }
    }
}

impl Type {
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Int(_) | Type::Uint(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Int(_) | Type::Uint(_) | Type::Float(_) | Type::Complex(_)
        )
    }

    /// Whether values of this type support `==` and map keying.
    pub fn is_comparable(&self) -> bool {
        match self {
            Type::Int(_)
            | Type::Uint(_)
            | Type::Float(_)
            | Type::Complex(_)
            | Type::Bool
            | Type::String
            | Type::Error
            | Type::Any
            | Type::Chan(_, _)
            | Type::Pointer(_) => true,
            Type::Struct(st) => st.fields.iter().all(|f| f.ty.is_comparable()),
            Type::Slice(_) | Type::Map(_, _) | Type::Func(_) => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(kind) => f.write_str(kind.name()),
            Type::Uint(kind) => f.write_str(kind.name()),
            Type::Float(FloatKind::F32) => f.write_str("float32"),
            Type::Float(FloatKind::F64) => f.write_str("float64"),
            Type::Complex(ComplexKind::C64) => f.write_str("complex64"),
            Type::Complex(ComplexKind::C128) => f.write_str("complex128"),
            Type::Bool => f.write_str("bool"),
            Type::String => f.write_str("string"),
            Type::Error => f.write_str("error"),
            Type::Any => f.write_str("interface {}"),
            Type::Slice(elem) => write!(f, "[]{elem}"),
            Type::Map(key, value) => write!(f, "map[{key}]{value}"),
            Type::Chan(ChanDir::Both, elem) => write!(f, "chan {elem}"),
            Type::Chan(ChanDir::Send, elem) => write!(f, "chan<- {elem}"),
            Type::Chan(ChanDir::Recv, elem) => write!(f, "<-chan {elem}"),
            Type::Pointer(elem) => write!(f, "*{elem}"),
            Type::Func(sig) => {
                f.write_str("func(")?;
                for (i, p) in sig.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{p}")?;
                }
                if let Some(variadic) = &sig.variadic {
                    if !sig.params.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...{variadic}")?;
                }
                f.write_str(")")?;
                match sig.results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", sig.results[0]),
                    _ => {
                        f.write_str(" (")?;
                        for (i, r) in sig.results.iter().enumerate() {
                            if i > 0 {
                                f.write_str(", ")?;
                            }
                            write!(f, "{r}")?;
                        }
                        f.write_str(")")
                    }
                }
            }
            Type::Struct(st) => f.write_str(&st.name),
        }
    }
}

/// The language's predeclared type identifiers.
pub fn lookup_primitive(name: &str) -> Option<Type> {
    Some(match name {
        "int" => Type::Int(IntKind::Int),
        "int8" => Type::Int(IntKind::I8),
        "int16" => Type::Int(IntKind::I16),
        "int32" | "rune" => Type::Int(IntKind::I32),
        "int64" => Type::Int(IntKind::I64),
        "uint" => Type::Uint(UintKind::Uint),
        "uint8" | "byte" => Type::Uint(UintKind::U8),
        "uint16" => Type::Uint(UintKind::U16),
        "uint32" => Type::Uint(UintKind::U32),
        "uint64" => Type::Uint(UintKind::U64),
        "float32" => Type::Float(FloatKind::F32),
        "float64" => Type::Float(FloatKind::F64),
        "complex64" => Type::Complex(ComplexKind::C64),
        "complex128" => Type::Complex(ComplexKind::C128),
        "string" => Type::String,
        "bool" => Type::Bool,
        "error" => Type::Error,
        _ => return None,
    })
}

/// Lowers an AST type expression to a runtime type handle.
pub fn eval_type(ns: &NameSpace, expr: &TypeExpr) -> Result<Type, RuntimeError> {
    match expr {
        TypeExpr::Name(ident) => {
            if let Some(ty) = lookup_primitive(&ident.name) {
                return Ok(ty);
            }
            if ns.find(&ident.name).is_some() {
                return Err(RuntimeError::NotAType {
                    name: ident.name.clone(),
                });
            }
            Err(RuntimeError::UnknownType {
                name: ident.name.clone(),
            })
        }
        TypeExpr::Qualified { pkg, name, .. } => {
            let package = ns.find_package(&pkg.name).ok_or(RuntimeError::Undefined {
                name: pkg.name.clone(),
            })?;
            match package.type_entry(&name.name) {
                Some(ty) => Ok(ty),
                None if package.has_entry(&name.name) => Err(RuntimeError::NotAType {
                    name: format!("{}.{}", pkg.name, name.name),
                }),
                None => Err(RuntimeError::Undefined {
                    name: format!("{}.{}", pkg.name, name.name),
                }),
            }
        }
        TypeExpr::Slice { elem, .. } => Ok(Type::Slice(Rc::new(eval_type(ns, elem)?))),
        TypeExpr::Array { .. } => Err(RuntimeError::Unsupported {
            message: "fixed-size arrays are not supported".into(),
        }),
        TypeExpr::Map { key, value, .. } => {
            let key_ty = eval_type(ns, key)?;
            if !key_ty.is_comparable() {
                return Err(RuntimeError::InvalidMapKey {
                    ty: key_ty.to_string(),
                });
            }
            Ok(Type::Map(Rc::new(key_ty), Rc::new(eval_type(ns, value)?)))
        }
        TypeExpr::Chan { dir, elem, .. } => {
            let dir = match dir {
                ast::ChanDir::Both => ChanDir::Both,
                ast::ChanDir::Send => ChanDir::Send,
                ast::ChanDir::Recv => ChanDir::Recv,
            };
            Ok(Type::Chan(dir, Rc::new(eval_type(ns, elem)?)))
        }
        TypeExpr::Pointer { elem, .. } => Ok(Type::Pointer(Rc::new(eval_type(ns, elem)?))),
        TypeExpr::Func { .. } => Err(RuntimeError::Unsupported {
            message: "function types are not supported".into(),
        }),
    }
}

/// Lowers an expression that appears where a type is expected, e.g. the
/// first argument of `make`.
pub fn type_expr_of(expr: &Expr) -> Option<TypeExpr> {
    match expr {
        Expr::TypeLit(ty) => Some(ty.clone()),
        Expr::Ident(ident) => Some(TypeExpr::Name(ident.clone())),
        Expr::Selector { x, name, span } => match x.as_ref() {
            Expr::Ident(pkg) => Some(TypeExpr::Qualified {
                pkg: pkg.clone(),
                name: name.clone(),
                span: *span,
            }),
            _ => None,
        },
        Expr::Paren { expr, .. } => type_expr_of(expr),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_aliases_resolve() {
        assert_eq!(lookup_primitive("byte"), Some(Type::Uint(UintKind::U8)));
        assert_eq!(lookup_primitive("rune"), Some(Type::Int(IntKind::I32)));
        assert_eq!(lookup_primitive("complex"), None);
    }

    #[test]
    fn type_display_is_source_syntax() {
        let ty = Type::Map(Rc::new(Type::String), Rc::new(Type::Int(IntKind::Int)));
        assert_eq!(ty.to_string(), "map[string]int");
        assert_eq!(
            Type::Slice(Rc::new(Type::Slice(Rc::new(Type::Bool)))).to_string(),
            "[][]bool"
        );
        assert_eq!(
            Type::Chan(ChanDir::Recv, Rc::new(Type::Int(IntKind::Int))).to_string(),
            "<-chan int"
        );
    }

    #[test]
    fn map_keys_must_be_comparable() {
        assert!(Type::String.is_comparable());
        assert!(!Type::Slice(Rc::new(Type::Int(IntKind::Int))).is_comparable());
        assert!(!Type::Map(Rc::new(Type::String), Rc::new(Type::Bool)).is_comparable());
    }
}
