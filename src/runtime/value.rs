use crate::language::ast::Block;
use crate::runtime::error::RuntimeError;
use crate::runtime::namespace::NameSpace;
use crate::runtime::types::{
    ChanDir, ComplexKind, FloatKind, IntKind, Signature, StructType, Type, UintKind,
};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

/// What a binding cell holds. Variables always hold a typed value;
/// constants may keep their untyped literal form so constant arithmetic
/// stays wide.
#[derive(Clone, Debug)]
pub enum Stored {
    Typed(Raw),
    Untyped(Literal),
}

pub type CellRef = Rc<RefCell<Stored>>;

pub fn new_cell(stored: Stored) -> CellRef {
    Rc::new(RefCell::new(stored))
}

/// An untyped constant produced by a source literal, carried at wider
/// precision than its default type.
#[derive(Clone, Debug)]
pub enum Literal {
    Int(i128),
    Float(f64),
    Complex(f64, f64),
    Rune(i32),
    Str(String),
}

impl Literal {
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Int(_) => "untyped int",
            Literal::Float(_) => "untyped float",
            Literal::Complex(_, _) => "untyped complex",
            Literal::Rune(_) => "untyped rune",
            Literal::Str(_) => "untyped string",
        }
    }

    /// The default-typed form a literal takes when stored with no other
    /// context.
    pub fn default_raw(&self) -> Raw {
        match self {
            Literal::Int(v) => Raw::Int(IntKind::Int, *v as i64),
            Literal::Float(v) => Raw::Float64(*v),
            Literal::Complex(re, im) => Raw::Complex128(*re, *im),
            Literal::Rune(v) => Raw::Int(IntKind::I32, *v as i64),
            Literal::Str(s) => Raw::Str(s.clone()),
        }
    }
}

/// A concrete typed runtime value.
#[derive(Clone, Debug)]
pub enum Raw {
    Int(IntKind, i64),
    Uint(UintKind, u64),
    Float32(f32),
    Float64(f64),
    Complex64(f32, f32),
    Complex128(f64, f64),
    Bool(bool),
    Str(String),
    Slice(SliceValue),
    Map(MapValue),
    Chan(ChanValue),
    Pointer(PointerValue),
    Func(FuncValue),
    Struct(StructValue),
    Error(ErrorValue),
}

impl Raw {
    pub fn type_of(&self) -> Type {
        match self {
            Raw::Int(kind, _) => Type::Int(*kind),
            Raw::Uint(kind, _) => Type::Uint(*kind),
            Raw::Float32(_) => Type::Float(FloatKind::F32),
            Raw::Float64(_) => Type::Float(FloatKind::F64),
            Raw::Complex64(_, _) => Type::Complex(ComplexKind::C64),
            Raw::Complex128(_, _) => Type::Complex(ComplexKind::C128),
            Raw::Bool(_) => Type::Bool,
            Raw::Str(_) => Type::String,
            Raw::Slice(s) => Type::Slice(Rc::new(s.elem.clone())),
            Raw::Map(m) => Type::Map(Rc::new(m.key.clone()), Rc::new(m.elem.clone())),
            Raw::Chan(c) => Type::Chan(c.dir, Rc::new(c.elem.clone())),
            Raw::Pointer(p) => Type::Pointer(Rc::new(p.ty.clone())),
            Raw::Func(f) => Type::Func(Rc::new(f.signature())),
            Raw::Struct(s) => Type::Struct(s.ty.clone()),
            Raw::Error(_) => Type::Error,
        }
    }

    /// The zero value of a type.
    pub fn zero(ty: &Type) -> Result<Raw, RuntimeError> {
        Ok(match ty {
            Type::Int(kind) => Raw::Int(*kind, 0),
            Type::Uint(kind) => Raw::Uint(*kind, 0),
            Type::Float(FloatKind::F32) => Raw::Float32(0.0),
            Type::Float(FloatKind::F64) => Raw::Float64(0.0),
            Type::Complex(ComplexKind::C64) => Raw::Complex64(0.0, 0.0),
            Type::Complex(ComplexKind::C128) => Raw::Complex128(0.0, 0.0),
            Type::Bool => Raw::Bool(false),
            Type::String => Raw::Str(String::new()),
            Type::Error => Raw::Error(ErrorValue::nil()),
            Type::Slice(elem) => Raw::Slice(SliceValue::empty((**elem).clone())),
            Type::Map(key, elem) => {
                Raw::Map(MapValue::new((**key).clone(), (**elem).clone()))
            }
            Type::Chan(dir, elem) => Raw::Chan(ChanValue::new(*dir, (**elem).clone(), 0)),
            Type::Struct(st) => {
                let mut fields = Vec::with_capacity(st.fields.len());
                for field in &st.fields {
                    fields.push(Raw::zero(&field.ty)?);
                }
                Raw::Struct(StructValue {
                    ty: st.clone(),
                    fields,
                })
            }
            Type::Pointer(_) | Type::Func(_) | Type::Any => {
                return Err(RuntimeError::Unsupported {
                    message: format!("type {ty} has no usable zero value"),
                });
            }
        })
    }

    /// Structural equality for comparable kinds; `None` when the operands
    /// do not support `==`.
    pub fn equals(&self, other: &Raw) -> Option<bool> {
        match (self, other) {
            (Raw::Int(_, a), Raw::Int(_, b)) => Some(a == b),
            (Raw::Uint(_, a), Raw::Uint(_, b)) => Some(a == b),
            (Raw::Float32(a), Raw::Float32(b)) => Some(a == b),
            (Raw::Float64(a), Raw::Float64(b)) => Some(a == b),
            (Raw::Complex64(ar, ai), Raw::Complex64(br, bi)) => Some(ar == br && ai == bi),
            (Raw::Complex128(ar, ai), Raw::Complex128(br, bi)) => Some(ar == br && ai == bi),
            (Raw::Bool(a), Raw::Bool(b)) => Some(a == b),
            (Raw::Str(a), Raw::Str(b)) => Some(a == b),
            (Raw::Pointer(a), Raw::Pointer(b)) => Some(a.target.same(&b.target)),
            (Raw::Chan(a), Raw::Chan(b)) => Some(Rc::ptr_eq(&a.queue, &b.queue)),
            (Raw::Error(a), Raw::Error(b)) => Some(a.message == b.message),
            (Raw::Struct(a), Raw::Struct(b)) => {
                if a.ty != b.ty || a.fields.len() != b.fields.len() {
                    return Some(false);
                }
                for (x, y) in a.fields.iter().zip(b.fields.iter()) {
                    match x.equals(y) {
                        Some(true) => {}
                        Some(false) => return Some(false),
                        None => return None,
                    }
                }
                Some(true)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SliceValue {
    pub elem: Type,
    pub buf: Rc<RefCell<Vec<Raw>>>,
    pub off: usize,
    pub len: usize,
    pub cap: usize,
}

impl SliceValue {
    pub fn empty(elem: Type) -> Self {
        Self {
            elem,
            buf: Rc::new(RefCell::new(Vec::new())),
            off: 0,
            len: 0,
            cap: 0,
        }
    }

    pub fn with_len(elem: Type, len: usize, cap: usize) -> Result<Self, RuntimeError> {
        let mut items = Vec::with_capacity(cap);
        for _ in 0..cap {
            items.push(Raw::zero(&elem)?);
        }
        Ok(Self {
            elem,
            buf: Rc::new(RefCell::new(items)),
            off: 0,
            len,
            cap,
        })
    }

    pub fn from_vec(elem: Type, items: Vec<Raw>) -> Self {
        let len = items.len();
        Self {
            elem,
            buf: Rc::new(RefCell::new(items)),
            off: 0,
            len,
            cap: len,
        }
    }

    pub fn get(&self, index: usize) -> Raw {
        self.buf.borrow()[self.off + index].clone()
    }

    pub fn place_of(&self, index: usize) -> Place {
        Place::Elem(self.buf.clone(), self.off + index)
    }
}

#[derive(Clone, Debug)]
pub struct MapValue {
    pub key: Type,
    pub elem: Type,
    entries: Rc<RefCell<HashMap<Key, (Raw, Raw)>>>,
}

impl MapValue {
    pub fn new(key: Type, elem: Type) -> Self {
        Self {
            key,
            elem,
            entries: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn get(&self, key: &Key) -> Option<Raw> {
        self.entries.borrow().get(key).map(|(_, v)| v.clone())
    }

    pub fn insert(&self, key: Key, raw_key: Raw, value: Raw) {
        self.entries.borrow_mut().insert(key, (raw_key, value));
    }

    pub fn remove(&self, key: &Key) {
        self.entries.borrow_mut().remove(key);
    }

    /// Snapshot of the entries; iteration order is unspecified.
    pub fn pairs(&self) -> Vec<(Raw, Raw)> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn same(&self, other: &MapValue) -> bool {
        Rc::ptr_eq(&self.entries, &other.entries)
    }
}

#[derive(Clone, Debug)]
pub struct ChanValue {
    pub dir: ChanDir,
    pub elem: Type,
    pub capacity: usize,
    pub queue: Rc<RefCell<VecDeque<Raw>>>,
}

impl ChanValue {
    pub fn new(dir: ChanDir, elem: Type, capacity: usize) -> Self {
        Self {
            dir,
            elem,
            capacity,
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }
}

#[derive(Clone, Debug)]
pub struct PointerValue {
    pub target: Place,
    /// Pointee type.
    pub ty: Type,
}

#[derive(Clone)]
pub enum FuncValue {
    Host(Rc<HostFn>),
    Closure(Rc<ClosureFn>),
}

impl FuncValue {
    pub fn signature(&self) -> Signature {
        match self {
            FuncValue::Host(host) => host.sig.clone(),
            FuncValue::Closure(_) => Signature {
                params: Vec::new(),
                variadic: None,
                results: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            FuncValue::Host(host) => &host.name,
            FuncValue::Closure(_) => "func literal",
        }
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FuncValue({})", self.name())
    }
}

pub type HostImpl = Box<dyn Fn(Vec<Raw>) -> Result<Vec<Raw>, RuntimeError>>;

pub struct HostFn {
    pub name: String,
    pub sig: Signature,
    pub func: HostImpl,
}

impl fmt::Debug for HostFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostFn({})", self.name)
    }
}

/// A parameterless closure over its lexical scope.
#[derive(Debug)]
pub struct ClosureFn {
    pub body: Block,
    pub scope: NameSpace,
}

#[derive(Clone, Debug)]
pub struct StructValue {
    pub ty: Rc<StructType>,
    pub fields: Vec<Raw>,
}

impl StructValue {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.ty.fields.iter().position(|f| f.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct ErrorValue {
    pub message: Option<Rc<str>>,
}

impl ErrorValue {
    pub fn nil() -> Self {
        Self { message: None }
    }

    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(Rc::from(message.into().as_str())),
        }
    }
}

/// Hashable mirror of the comparable `Raw` kinds, used for map keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Uint(u64),
    Float(u64),
    Complex(u64, u64),
    Bool(bool),
    Str(String),
    Error(Option<String>),
    Pointer(usize, Vec<usize>),
    Chan(usize),
    Struct(Vec<Key>),
}

impl Key {
    pub fn from_raw(raw: &Raw) -> Option<Key> {
        Some(match raw {
            Raw::Int(_, v) => Key::Int(*v),
            Raw::Uint(_, v) => Key::Uint(*v),
            Raw::Float32(v) => Key::Float((*v as f64).to_bits()),
            Raw::Float64(v) => Key::Float(v.to_bits()),
            Raw::Complex64(re, im) => {
                Key::Complex((*re as f64).to_bits(), (*im as f64).to_bits())
            }
            Raw::Complex128(re, im) => Key::Complex(re.to_bits(), im.to_bits()),
            Raw::Bool(v) => Key::Bool(*v),
            Raw::Str(s) => Key::Str(s.clone()),
            Raw::Error(e) => Key::Error(e.message.as_ref().map(|m| m.to_string())),
            Raw::Pointer(p) => {
                let (root, path) = p.target.identity();
                Key::Pointer(root, path)
            }
            Raw::Chan(c) => Key::Chan(Rc::as_ptr(&c.queue) as usize),
            Raw::Struct(s) => {
                let mut keys = Vec::with_capacity(s.fields.len());
                for field in &s.fields {
                    keys.push(Key::from_raw(field)?);
                }
                Key::Struct(keys)
            }
            Raw::Slice(_) | Raw::Map(_) | Raw::Func(_) => return None,
        })
    }
}

/// Addressable storage: the left side of an assignment that is not a map
/// slot, and the target of `&`.
#[derive(Clone, Debug)]
pub enum Place {
    Cell(CellRef),
    Elem(Rc<RefCell<Vec<Raw>>>, usize),
    Field(Box<Place>, usize),
}

impl Place {
    pub fn read(&self) -> Raw {
        match self {
            Place::Cell(cell) => match &*cell.borrow() {
                Stored::Typed(raw) => raw.clone(),
                Stored::Untyped(lit) => lit.default_raw(),
            },
            Place::Elem(buf, index) => buf.borrow()[*index].clone(),
            Place::Field(base, index) => {
                let index = *index;
                base.with_raw(|raw| match raw {
                    Raw::Struct(s) => s.fields[index].clone(),
                    other => other.clone(),
                })
            }
        }
    }

    pub fn write(&self, value: Raw) {
        match self {
            Place::Cell(cell) => *cell.borrow_mut() = Stored::Typed(value),
            Place::Elem(buf, index) => buf.borrow_mut()[*index] = value,
            Place::Field(base, index) => {
                let index = *index;
                base.with_raw_mut(|raw| {
                    if let Raw::Struct(s) = raw {
                        s.fields[index] = value;
                    }
                });
            }
        }
    }

    pub fn ty(&self) -> Type {
        self.read().type_of()
    }

    fn with_raw<R>(&self, f: impl FnOnce(&Raw) -> R) -> R {
        let mut indices: Vec<usize> = Vec::new();
        let mut cur: &Place = self;
        while let Place::Field(base, index) = cur {
            indices.push(*index);
            cur = base;
        }
        indices.reverse();

        fn navigate<'a>(raw: &'a Raw, indices: &[usize]) -> &'a Raw {
            let mut r = raw;
            for &i in indices {
                if let Raw::Struct(s) = r {
                    r = &s.fields[i];
                }
            }
            r
        }

        match cur {
            Place::Cell(cell) => match &*cell.borrow() {
                Stored::Typed(raw) => f(navigate(raw, &indices)),
                Stored::Untyped(lit) => f(navigate(&lit.default_raw(), &indices)),
            },
            Place::Elem(buf, index) => f(navigate(&buf.borrow()[*index], &indices)),
            Place::Field(..) => unreachable!(),
        }
    }

    fn with_raw_mut(&self, f: impl FnOnce(&mut Raw)) {
        let mut indices: Vec<usize> = Vec::new();
        let mut cur: &Place = self;
        while let Place::Field(base, index) = cur {
            indices.push(*index);
            cur = base;
        }
        indices.reverse();

        fn navigate_mut<'a>(raw: &'a mut Raw, indices: &[usize]) -> &'a mut Raw {
            let mut r = raw;
            for &i in indices {
                if let Raw::Struct(s) = r {
                    r = &mut s.fields[i];
                }
            }
            r
        }

        match cur {
            Place::Cell(cell) => {
                if let Stored::Typed(raw) = &mut *cell.borrow_mut() {
                    f(navigate_mut(raw, &indices));
                }
            }
            Place::Elem(buf, index) => f(navigate_mut(&mut buf.borrow_mut()[*index], &indices)),
            Place::Field(..) => unreachable!(),
        }
    }

    /// Stable identity for pointer comparison and map keying: the root
    /// allocation address plus the index path into it.
    pub fn identity(&self) -> (usize, Vec<usize>) {
        match self {
            Place::Cell(cell) => (Rc::as_ptr(cell) as usize, Vec::new()),
            Place::Elem(buf, index) => (Rc::as_ptr(buf) as usize, vec![*index]),
            Place::Field(base, index) => {
                let (root, mut path) = base.identity();
                path.push(*index);
                (root, path)
            }
        }
    }

    pub fn same(&self, other: &Place) -> bool {
        self.identity() == other.identity()
    }
}

/// A pending map read/write: `(map, key)` produced by indexing a map and
/// consumed by the enclosing assignment or read.
#[derive(Clone, Debug)]
pub struct MapSlot {
    pub map: MapValue,
    pub key: Key,
    pub raw_key: Raw,
}

impl MapSlot {
    /// The element for the key, or the element type's zero value.
    pub fn read(&self) -> Result<Raw, RuntimeError> {
        match self.map.get(&self.key) {
            Some(value) => Ok(value),
            None => Raw::zero(&self.map.elem),
        }
    }

    pub fn present(&self) -> bool {
        self.map.get(&self.key).is_some()
    }
}

/// Everything an expression can evaluate to.
#[derive(Clone, Debug)]
pub enum Value {
    /// The distinguished "no value" sentinel.
    Unit,
    Untyped(Literal),
    Raw(Raw),
    Place(Place),
    /// Constant marker: readable, never assignable.
    Const(Stored),
    Type(Type),
    Package(String),
    MapSlot(MapSlot),
}

impl Value {
    /// Collapses a value to the data it denotes: places are read, map
    /// slots yield the element or zero, constants unwrap.
    pub fn read(self) -> Result<Stored, RuntimeError> {
        match self {
            Value::Untyped(lit) => Ok(Stored::Untyped(lit)),
            Value::Raw(raw) => Ok(Stored::Typed(raw)),
            Value::Place(place) => Ok(Stored::Typed(place.read())),
            Value::Const(stored) => Ok(stored),
            Value::MapSlot(slot) => Ok(Stored::Typed(slot.read()?)),
            Value::Unit => Err(RuntimeError::Undefined {
                name: "value".into(),
            }),
            Value::Type(ty) => Err(RuntimeError::TypeNotExpr { ty: ty.to_string() }),
            Value::Package(name) => Err(RuntimeError::PackageNotExpr { name }),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Unit => "no value".into(),
            Value::Untyped(lit) => lit.type_name().into(),
            Value::Raw(raw) => raw.type_of().to_string(),
            Value::Place(place) => place.ty().to_string(),
            Value::Const(Stored::Typed(raw)) => raw.type_of().to_string(),
            Value::Const(Stored::Untyped(lit)) => lit.type_name().into(),
            Value::Type(_) => "type".into(),
            Value::Package(_) => "package".into(),
            Value::MapSlot(slot) => slot.map.elem.to_string(),
        }
    }
}

impl Stored {
    pub fn type_of(&self) -> crate::runtime::types::Type {
        match self {
            Stored::Typed(raw) => raw.type_of(),
            Stored::Untyped(lit) => lit.default_raw().type_of(),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Stored::Typed(raw) => raw.type_of().to_string(),
            Stored::Untyped(lit) => lit.type_name().into(),
        }
    }

    pub fn into_raw(self) -> Raw {
        match self {
            Stored::Typed(raw) => raw,
            Stored::Untyped(lit) => lit.default_raw(),
        }
    }
}

// ---- display, following the host language's `%v` conventions ----

pub fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".into();
    }
    if f.is_infinite() {
        return if f > 0.0 { "+Inf".into() } else { "-Inf".into() };
    }
    let abs = f.abs();
    if abs != 0.0 && !(1e-4..1e21).contains(&abs) {
        let s = format!("{f:e}");
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        }
    } else {
        format!("{f}")
    }
}

fn format_complex(re: String, im: f64, im_str: String) -> String {
    if im < 0.0 || im_str.starts_with('-') {
        format!("({re}{im_str}i)")
    } else {
        format!("({re}+{im_str}i)")
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::Int(_, v) => write!(f, "{v}"),
            Raw::Uint(_, v) => write!(f, "{v}"),
            Raw::Float32(v) => f.write_str(&format_float(*v as f64)),
            Raw::Float64(v) => f.write_str(&format_float(*v)),
            Raw::Complex64(re, im) => f.write_str(&format_complex(
                format_float(*re as f64),
                *im as f64,
                format_float(*im as f64),
            )),
            Raw::Complex128(re, im) => {
                f.write_str(&format_complex(format_float(*re), *im, format_float(*im)))
            }
            Raw::Bool(v) => write!(f, "{v}"),
            Raw::Str(s) => f.write_str(s),
            Raw::Slice(s) => {
                f.write_str("[")?;
                for i in 0..s.len {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", s.get(i))?;
                }
                f.write_str("]")
            }
            Raw::Map(m) => {
                let mut entries: Vec<(String, String)> = m
                    .pairs()
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                entries.sort();
                f.write_str("map[")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{k}:{v}")?;
                }
                f.write_str("]")
            }
            Raw::Chan(c) => write!(f, "0x{:x}", Rc::as_ptr(&c.queue) as usize),
            Raw::Pointer(p) => {
                if let Raw::Struct(_) = p.read() {
                    write!(f, "&{}", p.read())
                } else {
                    let (root, _) = p.target.identity();
                    write!(f, "0x{root:x}")
                }
            }
            Raw::Func(func) => match func {
                FuncValue::Host(host) => write!(f, "0x{:x}", Rc::as_ptr(host) as usize),
                FuncValue::Closure(c) => write!(f, "0x{:x}", Rc::as_ptr(c) as usize),
            },
            Raw::Struct(s) => {
                f.write_str("{")?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{field}")?;
                }
                f.write_str("}")
            }
            Raw::Error(e) => match &e.message {
                Some(message) => f.write_str(message),
                None => f.write_str("<nil>"),
            },
        }
    }
}

impl PointerValue {
    fn read(&self) -> Raw {
        self.target.read()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(v) => write!(f, "{v}"),
            Literal::Float(v) => f.write_str(&format_float(*v)),
            Literal::Complex(re, im) => {
                f.write_str(&format_complex(format_float(*re), *im, format_float(*im)))
            }
            Literal::Rune(v) => write!(f, "{v}"),
            Literal::Str(s) => f.write_str(s),
        }
    }
}

impl fmt::Display for Stored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stored::Typed(raw) => write!(f, "{raw}"),
            Stored::Untyped(lit) => write!(f, "{lit}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_formatting_matches_host_language() {
        assert_eq!(format_float(1.0), "1");
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(3e20), "3e+20");
        assert_eq!(format_float(-2.5e-7), "-2.5e-7");
        assert_eq!(format_float(0.0), "0");
    }

    #[test]
    fn slice_display_uses_brackets_and_spaces() {
        let s = SliceValue::from_vec(
            Type::String,
            vec![Raw::Str("abc".into()), Raw::Str("def".into())],
        );
        assert_eq!(Raw::Slice(s).to_string(), "[abc def]");
    }

    #[test]
    fn places_share_storage_through_slices() {
        let s = SliceValue::from_vec(
            Type::Int(IntKind::Int),
            vec![Raw::Int(IntKind::Int, 1), Raw::Int(IntKind::Int, 2)],
        );
        let alias = s.clone();
        s.place_of(0).write(Raw::Int(IntKind::Int, 9));
        assert!(matches!(alias.get(0), Raw::Int(_, 9)));
        assert!(s.place_of(1).same(&alias.place_of(1)));
        assert!(!s.place_of(0).same(&alias.place_of(1)));
    }

    #[test]
    fn complex_display_parenthesizes() {
        assert_eq!(Raw::Complex128(1.0, 0.0).to_string(), "(1+0i)");
        assert_eq!(Raw::Complex128(1.5, -2.0).to_string(), "(1.5-2i)");
    }

    #[test]
    fn map_slot_reads_zero_for_missing_key() {
        let m = MapValue::new(Type::String, Type::Int(IntKind::Int));
        let slot = MapSlot {
            map: m.clone(),
            key: Key::Str("a".into()),
            raw_key: Raw::Str("a".into()),
        };
        assert!(!slot.present());
        assert!(matches!(slot.read().unwrap(), Raw::Int(_, 0)));
        m.insert(Key::Str("a".into()), Raw::Str("a".into()), Raw::Int(IntKind::Int, 7));
        assert!(slot.present());
        assert!(matches!(slot.read().unwrap(), Raw::Int(_, 7)));
    }
}
