use crate::language::ast::{BinaryOp, CompositeElt, Expr, UnaryOp};
use crate::runtime::coerce::{coerce_to, literal_fits, match_type};
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::machine::Machine;
use crate::runtime::namespace::{NameSpace, PkgEntry};
use crate::runtime::types::{self, ComplexKind, FloatKind, IntKind, Type, UintKind};
use crate::runtime::value::{
    ClosureFn, FuncValue, HostFn, Key, Literal, MapSlot, MapValue, Place, PointerValue, Raw,
    SliceValue, Stored, StructValue, Value,
};
use std::rc::Rc;

const BUILTINS: [&str; 5] = ["make", "len", "append", "copy", "delete"];

impl Machine {
    /// Evaluates an expression to a value list. Most forms produce one
    /// value; calls of multi-return functions produce more.
    pub(crate) fn eval_expr(&mut self, ns: &NameSpace, expr: &Expr) -> RuntimeResult<Vec<Value>> {
        match expr {
            Expr::IntLit(v, _) => Ok(vec![Value::Untyped(Literal::Int(*v))]),
            Expr::FloatLit(v, _) => Ok(vec![Value::Untyped(Literal::Float(*v))]),
            Expr::ImagLit(v, _) => Ok(vec![Value::Untyped(Literal::Complex(0.0, *v))]),
            Expr::RuneLit(c, _) => Ok(vec![Value::Untyped(Literal::Rune(*c as i32))]),
            Expr::StringLit(s, _) => Ok(vec![Value::Untyped(Literal::Str(s.clone()))]),
            Expr::Paren { expr, .. } => self.eval_expr(ns, expr),
            Expr::Ident(ident) => Ok(vec![self.eval_ident(ns, &ident.name)?]),
            Expr::Unary { op, expr, .. } => Ok(vec![self.eval_unary(ns, *op, expr)?]),
            Expr::Binary {
                op, left, right, ..
            } => Ok(vec![self.eval_binary(ns, *op, left, right)?]),
            Expr::Call { callee, args, .. } => self.eval_call(ns, callee, args),
            Expr::Selector { x, name, .. } => Ok(vec![self.eval_selector(ns, x, &name.name)?]),
            Expr::Index { x, index, .. } => Ok(vec![self.eval_index(ns, x, index)?]),
            Expr::Slice {
                x, low, high, max, ..
            } => Ok(vec![self.eval_slice(
                ns,
                x,
                low.as_deref(),
                high.as_deref(),
                max.as_deref(),
            )?]),
            Expr::Composite { ty, elts, .. } => {
                let ty = types::eval_type(ns, ty)?;
                Ok(vec![self.eval_composite(ns, ty, elts)?])
            }
            Expr::FuncLit {
                params,
                results,
                body,
                ..
            } => {
                if *params > 0 || *results > 0 {
                    return Err(RuntimeError::Unsupported {
                        message: "function types are not supported".into(),
                    });
                }
                Ok(vec![Value::Raw(Raw::Func(FuncValue::Closure(Rc::new(
                    ClosureFn {
                        body: body.clone(),
                        scope: ns.clone(),
                    },
                ))))])
            }
            Expr::TypeAssert { x, ty, .. } => Ok(vec![self.eval_type_assert(ns, x, ty)?]),
            Expr::TypeLit(ty) => Ok(vec![Value::Type(types::eval_type(ns, ty)?)]),
        }
    }

    /// Evaluates to exactly one value.
    pub(crate) fn eval_single(&mut self, ns: &NameSpace, expr: &Expr) -> RuntimeResult<Value> {
        let mut values = self.eval_expr(ns, expr)?;
        if values.len() != 1 {
            return Err(RuntimeError::MultiValueContext {
                count: values.len(),
            });
        }
        Ok(values.pop().unwrap())
    }

    /// Evaluates to one value and collapses places, slots and constants.
    pub(crate) fn eval_stored(&mut self, ns: &NameSpace, expr: &Expr) -> RuntimeResult<Stored> {
        self.eval_single(ns, expr)?.read()
    }

    fn eval_ident(&mut self, ns: &NameSpace, name: &str) -> RuntimeResult<Value> {
        match name {
            "true" => return Ok(Value::Raw(Raw::Bool(true))),
            "false" => return Ok(Value::Raw(Raw::Bool(false))),
            "nil" => {
                return Err(RuntimeError::Unsupported {
                    message: "nil is only supported through zero values".into(),
                });
            }
            "_" => {
                return Err(RuntimeError::Unsupported {
                    message: "cannot use _ as value".into(),
                });
            }
            _ => {}
        }
        if let Some(binding) = ns.find(name) {
            if binding.is_const {
                return Ok(Value::Const(binding.cell.borrow().clone()));
            }
            return Ok(Value::Place(Place::Cell(binding.cell)));
        }
        if ns.find_package(name).is_some() {
            return Ok(Value::Package(name.to_string()));
        }
        if let Some(ty) = types::lookup_primitive(name) {
            return Ok(Value::Type(ty));
        }
        Err(RuntimeError::Undefined { name: name.into() })
    }

    fn eval_unary(&mut self, ns: &NameSpace, op: UnaryOp, expr: &Expr) -> RuntimeResult<Value> {
        if op == UnaryOp::Addr {
            return match self.eval_single(ns, expr)? {
                Value::Place(place) => {
                    let ty = place.ty();
                    Ok(Value::Raw(Raw::Pointer(PointerValue { target: place, ty })))
                }
                _ => Err(RuntimeError::CannotTakeAddress {
                    what: display_expr(expr),
                }),
            };
        }
        if op == UnaryOp::Deref {
            let stored = self.eval_stored(ns, expr)?;
            return match stored {
                Stored::Typed(Raw::Pointer(p)) => Ok(Value::Place(p.target)),
                other => Err(RuntimeError::InvalidIndirect {
                    value: other.to_string(),
                    ty: other.type_name(),
                }),
            };
        }
        if op == UnaryOp::Recv {
            return Err(RuntimeError::Unsupported {
                message: "channel receive is not supported".into(),
            });
        }

        let operand = self.eval_stored(ns, expr)?;
        let invalid = |op: &str, v: &Stored| RuntimeError::InvalidOperation {
            op: op.into(),
            ty: v.type_name(),
        };
        match op {
            UnaryOp::Pos => {
                let numeric = match &operand {
                    Stored::Untyped(
                        Literal::Int(_)
                        | Literal::Float(_)
                        | Literal::Complex(_, _)
                        | Literal::Rune(_),
                    ) => true,
                    Stored::Typed(raw) => raw.type_of().is_numeric(),
                    _ => false,
                };
                if numeric {
                    Ok(stored_value(operand))
                } else {
                    Err(invalid("+", &operand))
                }
            }
            UnaryOp::Neg => match operand {
                Stored::Untyped(Literal::Int(v)) => Ok(Value::Untyped(Literal::Int(-v))),
                Stored::Untyped(Literal::Rune(v)) => Ok(Value::Untyped(Literal::Int(-(v as i128)))),
                Stored::Untyped(Literal::Float(v)) => Ok(Value::Untyped(Literal::Float(-v))),
                Stored::Untyped(Literal::Complex(re, im)) => {
                    Ok(Value::Untyped(Literal::Complex(-re, -im)))
                }
                Stored::Typed(Raw::Int(kind, v)) => {
                    Ok(Value::Raw(Raw::Int(kind, kind.truncate(v.wrapping_neg()))))
                }
                Stored::Typed(Raw::Uint(kind, v)) => {
                    Ok(Value::Raw(Raw::Uint(kind, kind.truncate(v.wrapping_neg()))))
                }
                Stored::Typed(Raw::Float32(v)) => Ok(Value::Raw(Raw::Float32(-v))),
                Stored::Typed(Raw::Float64(v)) => Ok(Value::Raw(Raw::Float64(-v))),
                Stored::Typed(Raw::Complex64(re, im)) => Ok(Value::Raw(Raw::Complex64(-re, -im))),
                Stored::Typed(Raw::Complex128(re, im)) => {
                    Ok(Value::Raw(Raw::Complex128(-re, -im)))
                }
                other => Err(invalid("-", &other)),
            },
            UnaryOp::Not => match operand {
                Stored::Typed(Raw::Bool(v)) => Ok(Value::Raw(Raw::Bool(!v))),
                other => Err(invalid("!", &other)),
            },
            UnaryOp::BitNot => match operand {
                Stored::Untyped(Literal::Int(v)) => Ok(Value::Untyped(Literal::Int(!v))),
                Stored::Untyped(Literal::Rune(v)) => Ok(Value::Untyped(Literal::Rune(!v))),
                Stored::Typed(Raw::Int(kind, v)) => {
                    Ok(Value::Raw(Raw::Int(kind, kind.truncate(!v))))
                }
                Stored::Typed(Raw::Uint(kind, v)) => {
                    Ok(Value::Raw(Raw::Uint(kind, kind.truncate(!v))))
                }
                other => Err(invalid("^", &other)),
            },
            UnaryOp::Addr | UnaryOp::Deref | UnaryOp::Recv => unreachable!(),
        }
    }

    fn eval_binary(
        &mut self,
        ns: &NameSpace,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> RuntimeResult<Value> {
        if op == BinaryOp::LogAnd || op == BinaryOp::LogOr {
            let lhs = self.eval_stored(ns, left)?;
            let l = match &lhs {
                Stored::Typed(Raw::Bool(v)) => *v,
                other => {
                    return Err(RuntimeError::InvalidOperation {
                        op: op.symbol().into(),
                        ty: other.type_name(),
                    });
                }
            };
            if (op == BinaryOp::LogAnd && !l) || (op == BinaryOp::LogOr && l) {
                return Ok(Value::Raw(Raw::Bool(l)));
            }
            let rhs = self.eval_stored(ns, right)?;
            let r = match &rhs {
                Stored::Typed(Raw::Bool(v)) => *v,
                other => {
                    return Err(RuntimeError::InvalidOperation {
                        op: op.symbol().into(),
                        ty: other.type_name(),
                    });
                }
            };
            return Ok(Value::Raw(Raw::Bool(r)));
        }

        let lhs = self.eval_stored(ns, left)?;
        let rhs = self.eval_stored(ns, right)?;

        if op == BinaryOp::Shl || op == BinaryOp::Shr {
            return shift(op, lhs, rhs);
        }

        let (lhs, rhs) = match_type(lhs, rhs)?;
        binary_op(op, lhs, rhs)
    }

    fn eval_call(
        &mut self,
        ns: &NameSpace,
        callee: &Expr,
        args: &[Expr],
    ) -> RuntimeResult<Vec<Value>> {
        // An undefined identifier in call position may name a built-in.
        if let Expr::Ident(ident) = callee {
            if BUILTINS.contains(&ident.name.as_str()) && ns.find(&ident.name).is_none() {
                return self.eval_builtin(ns, &ident.name, args);
            }
        }

        let callee_val = self.eval_single(ns, callee)?;
        match callee_val {
            Value::Type(ty) => {
                if args.is_empty() {
                    return Err(RuntimeError::MissingConversionArg { ty: ty.to_string() });
                }
                if args.len() > 1 {
                    return Err(RuntimeError::TooManyConversionArgs { ty: ty.to_string() });
                }
                let operand = self.eval_stored(ns, &args[0])?;
                Ok(vec![Value::Raw(convert(operand, &ty)?)])
            }
            other => {
                let stored = other.read()?;
                match stored {
                    Stored::Typed(Raw::Func(func)) => {
                        let name = callee_name(callee, &func);
                        self.call_function(ns, &name, &func, args)
                    }
                    other => Err(RuntimeError::NotCallable {
                        value: other.to_string(),
                        ty: other.type_name(),
                    }),
                }
            }
        }
    }

    /// Evaluates call arguments and invokes a function value. A single
    /// argument expression producing multiple values spreads into the
    /// parameter list.
    pub(crate) fn call_function(
        &mut self,
        ns: &NameSpace,
        name: &str,
        func: &FuncValue,
        args: &[Expr],
    ) -> RuntimeResult<Vec<Value>> {
        let mut actuals: Vec<Stored> = Vec::with_capacity(args.len());
        if args.len() == 1 {
            let values = self.eval_expr(ns, &args[0])?;
            for value in values {
                actuals.push(value.read()?);
            }
        } else {
            for arg in args {
                actuals.push(self.eval_stored(ns, arg)?);
            }
        }

        let sig = func.signature();
        if actuals.len() < sig.params.len() {
            return Err(RuntimeError::NotEnoughArgs { name: name.into() });
        }
        if actuals.len() > sig.params.len() && sig.variadic.is_none() {
            return Err(RuntimeError::TooManyArgs { name: name.into() });
        }

        let context = format!("argument to {name}");
        let mut coerced = Vec::with_capacity(actuals.len());
        for (i, actual) in actuals.into_iter().enumerate() {
            let dst = if i < sig.params.len() {
                &sig.params[i]
            } else {
                sig.variadic.as_ref().unwrap()
            };
            coerced.push(coerce_to(actual, dst, &context)?);
        }

        match func {
            FuncValue::Host(host) => {
                let results = (host.func)(coerced)?;
                Ok(results.into_iter().map(Value::Raw).collect())
            }
            FuncValue::Closure(closure) => {
                let closure = closure.clone();
                self.call_closure(&closure)?;
                Ok(Vec::new())
            }
        }
    }

    fn eval_selector(&mut self, ns: &NameSpace, x: &Expr, name: &str) -> RuntimeResult<Value> {
        let xv = self.eval_single(ns, x)?;
        match xv {
            Value::Package(pkg_name) => {
                let package = ns.find_package(&pkg_name).ok_or(RuntimeError::Undefined {
                    name: pkg_name.clone(),
                })?;
                match package.entry(name) {
                    Some(PkgEntry::Var(cell)) => Ok(Value::Place(Place::Cell(cell.clone()))),
                    Some(PkgEntry::Func(func)) => Ok(Value::Raw(Raw::Func(func.clone()))),
                    Some(PkgEntry::Type(ty)) => Ok(Value::Type(ty.clone())),
                    Some(PkgEntry::Const(stored)) => Ok(Value::Const(stored.clone())),
                    None => Err(RuntimeError::Undefined {
                        name: format!("{pkg_name}.{name}"),
                    }),
                }
            }
            Value::Place(place) => self.select_place(place, name),
            other => {
                let stored = other.read()?;
                self.select_raw(stored.into_raw(), name)
            }
        }
    }

    /// Field lookup on an addressable struct, walking pointer
    /// indirections, yielding an addressable field.
    fn select_place(&mut self, place: Place, name: &str) -> RuntimeResult<Value> {
        let ty = place.ty();
        match ty {
            Type::Pointer(_) => match place.read() {
                Raw::Pointer(p) => self.select_place(p.target, name),
                _ => Err(RuntimeError::NoFieldOrMethod {
                    ty: ty.to_string(),
                    name: name.into(),
                }),
            },
            Type::Struct(st) => {
                if let Some(index) = st.fields.iter().position(|f| f.name == name) {
                    return Ok(Value::Place(Place::Field(Box::new(place), index)));
                }
                if let Some(method) = st.methods.iter().find(|m| m.name == name) {
                    return Ok(Value::Raw(bind_method(place.read(), &method.func)));
                }
                Err(RuntimeError::NoFieldOrMethod {
                    ty: st.name.clone(),
                    name: name.into(),
                })
            }
            _ => self.select_raw(place.read(), name),
        }
    }

    fn select_raw(&mut self, raw: Raw, name: &str) -> RuntimeResult<Value> {
        match raw {
            Raw::Pointer(p) => self.select_place(p.target, name),
            Raw::Struct(s) => {
                if let Some(index) = s.field_index(name) {
                    return Ok(Value::Raw(s.fields[index].clone()));
                }
                if let Some(method) = s.ty.methods.iter().find(|m| m.name == name).cloned() {
                    return Ok(Value::Raw(bind_method(Raw::Struct(s), &method.func)));
                }
                Err(RuntimeError::NoFieldOrMethod {
                    ty: s.ty.name.clone(),
                    name: name.into(),
                })
            }
            Raw::Error(e) if name == "Error" => {
                let message = e.message.clone();
                Ok(Value::Raw(Raw::Func(FuncValue::Host(Rc::new(HostFn {
                    name: "Error".into(),
                    sig: types::Signature {
                        params: Vec::new(),
                        variadic: None,
                        results: vec![Type::String],
                    },
                    func: Box::new(move |_| {
                        Ok(vec![Raw::Str(
                            message.as_deref().unwrap_or("<nil>").to_string(),
                        )])
                    }),
                })))))
            }
            other => Err(RuntimeError::NoFieldOrMethod {
                ty: other.type_of().to_string(),
                name: name.into(),
            }),
        }
    }

    fn eval_index(&mut self, ns: &NameSpace, x: &Expr, index: &Expr) -> RuntimeResult<Value> {
        let xv = self.eval_single(ns, x)?;
        let index_val = self.eval_stored(ns, index)?;
        let container = xv.read()?.into_raw();
        match container {
            Raw::Slice(s) => {
                let i = as_index(index_val)?;
                if i < 0 || i as usize >= s.len {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        len: s.len,
                    });
                }
                Ok(Value::Place(s.place_of(i as usize)))
            }
            Raw::Map(m) => {
                let key = coerce_to(index_val, &m.key.clone(), "map index")?;
                let hash_key = Key::from_raw(&key).ok_or(RuntimeError::InvalidMapKey {
                    ty: m.key.to_string(),
                })?;
                Ok(Value::MapSlot(MapSlot {
                    map: m,
                    key: hash_key,
                    raw_key: key,
                }))
            }
            Raw::Str(s) => {
                let i = as_index(index_val)?;
                let bytes = s.as_bytes();
                if i < 0 || i as usize >= bytes.len() {
                    return Err(RuntimeError::IndexOutOfRange {
                        index: i,
                        len: bytes.len(),
                    });
                }
                Ok(Value::Raw(Raw::Uint(UintKind::U8, bytes[i as usize] as u64)))
            }
            other => Err(RuntimeError::NotIndexable {
                ty: other.type_of().to_string(),
            }),
        }
    }

    fn eval_slice(
        &mut self,
        ns: &NameSpace,
        x: &Expr,
        low: Option<&Expr>,
        high: Option<&Expr>,
        max: Option<&Expr>,
    ) -> RuntimeResult<Value> {
        let container = self.eval_stored(ns, x)?.into_raw();
        let mut bound = |expr: Option<&Expr>| -> RuntimeResult<Option<i64>> {
            match expr {
                Some(expr) => {
                    let v = self.eval_stored(ns, expr)?;
                    Ok(Some(as_index(v)?))
                }
                None => Ok(None),
            }
        };
        let low_b = bound(low)?;
        let high_b = bound(high)?;
        let max_b = bound(max)?;

        match container {
            Raw::Slice(s) => {
                let i = low_b.unwrap_or(0);
                let j = high_b.unwrap_or(s.len as i64);
                let k = max_b.unwrap_or(s.cap as i64);
                if i < 0 || j < i || k < j || k as usize > s.cap {
                    let bad = [i, j, k]
                        .into_iter()
                        .find(|b| *b < 0 || *b as usize > s.cap)
                        .unwrap_or(j);
                    return Err(RuntimeError::SliceBounds {
                        bound: bad,
                        cap: s.cap,
                    });
                }
                Ok(Value::Raw(Raw::Slice(SliceValue {
                    elem: s.elem.clone(),
                    buf: s.buf.clone(),
                    off: s.off + i as usize,
                    len: (j - i) as usize,
                    cap: (k - i) as usize,
                })))
            }
            Raw::Str(s) => {
                if max.is_some() {
                    return Err(RuntimeError::CannotSlice {
                        value: s.clone(),
                        ty: "string".into(),
                    });
                }
                let bytes = s.as_bytes();
                let i = low_b.unwrap_or(0);
                let j = high_b.unwrap_or(bytes.len() as i64);
                if i < 0 || j < i || j as usize > bytes.len() {
                    return Err(RuntimeError::SliceBounds {
                        bound: j,
                        cap: bytes.len(),
                    });
                }
                let sub = String::from_utf8_lossy(&bytes[i as usize..j as usize]).into_owned();
                Ok(Value::Raw(Raw::Str(sub)))
            }
            other => Err(RuntimeError::CannotSlice {
                value: other.to_string(),
                ty: other.type_of().to_string(),
            }),
        }
    }

    fn eval_composite(
        &mut self,
        ns: &NameSpace,
        ty: Type,
        elts: &[CompositeElt],
    ) -> RuntimeResult<Value> {
        match &ty {
            Type::Slice(elem) => {
                let mut items = Vec::with_capacity(elts.len());
                for elt in elts {
                    if elt.key.is_some() {
                        return Err(RuntimeError::Unsupported {
                            message: "index keys in slice literals are not supported".into(),
                        });
                    }
                    let v = self.eval_stored(ns, &elt.value)?;
                    items.push(coerce_to(v, elem, "array element")?);
                }
                Ok(Value::Raw(Raw::Slice(SliceValue::from_vec(
                    (**elem).clone(),
                    items,
                ))))
            }
            Type::Map(key_ty, elem_ty) => {
                let map = MapValue::new((**key_ty).clone(), (**elem_ty).clone());
                for elt in elts {
                    let Some(key_expr) = &elt.key else {
                        return Err(RuntimeError::Unsupported {
                            message: "missing key in map literal".into(),
                        });
                    };
                    let key_val = self.eval_stored(ns, key_expr)?;
                    let raw_key = coerce_to(key_val, key_ty, "map key")?;
                    let value = self.eval_stored(ns, &elt.value)?;
                    let raw_value = coerce_to(value, elem_ty, "map value")?;
                    let hash_key =
                        Key::from_raw(&raw_key).ok_or(RuntimeError::InvalidMapKey {
                            ty: key_ty.to_string(),
                        })?;
                    map.insert(hash_key, raw_key, raw_value);
                }
                Ok(Value::Raw(Raw::Map(map)))
            }
            Type::Struct(st) => {
                let named = elts.first().is_some_and(|e| e.key.is_some());
                let mut fields: Vec<Raw> = Vec::with_capacity(st.fields.len());
                for field in &st.fields {
                    fields.push(Raw::zero(&field.ty)?);
                }
                if named {
                    for elt in elts {
                        let Some(Expr::Ident(field_ident)) = &elt.key else {
                            return Err(RuntimeError::Unsupported {
                                message: format!(
                                    "field names in {} literal must be identifiers",
                                    st.name
                                ),
                            });
                        };
                        let index = st
                            .fields
                            .iter()
                            .position(|f| f.name == field_ident.name)
                            .ok_or_else(|| RuntimeError::NoFieldOrMethod {
                                ty: st.name.clone(),
                                name: field_ident.name.clone(),
                            })?;
                        let v = self.eval_stored(ns, &elt.value)?;
                        fields[index] = coerce_to(v, &st.fields[index].ty, "field value")?;
                    }
                } else if !elts.is_empty() {
                    if elts.len() != st.fields.len() {
                        return Err(RuntimeError::Unsupported {
                            message: format!(
                                "wrong number of initializers in {} literal",
                                st.name
                            ),
                        });
                    }
                    for (index, elt) in elts.iter().enumerate() {
                        let v = self.eval_stored(ns, &elt.value)?;
                        fields[index] = coerce_to(v, &st.fields[index].ty, "field value")?;
                    }
                }
                Ok(Value::Raw(Raw::Struct(StructValue {
                    ty: st.clone(),
                    fields,
                })))
            }
            other => Err(RuntimeError::Unsupported {
                message: format!("cannot construct composite literal of type {other}"),
            }),
        }
    }

    fn eval_type_assert(
        &mut self,
        ns: &NameSpace,
        x: &Expr,
        ty: &crate::language::ast::TypeExpr,
    ) -> RuntimeResult<Value> {
        let operand = self.eval_stored(ns, x)?;
        let target = types::eval_type(ns, ty)?;
        match operand {
            Stored::Typed(Raw::Error(e)) => {
                if target == Type::Error {
                    return Ok(Value::Raw(Raw::Error(e)));
                }
                let from = match &e.message {
                    Some(_) => "error".to_string(),
                    None => "nil".to_string(),
                };
                Err(RuntimeError::InterfaceConversion {
                    from,
                    to: target.to_string(),
                })
            }
            other => Err(RuntimeError::InvalidTypeAssertion {
                value: other.to_string(),
                ty: other.type_name(),
            }),
        }
    }

    /// Runs a parameterless closure body in a child of its captured
    /// scope.
    pub(crate) fn call_closure(&mut self, closure: &ClosureFn) -> RuntimeResult<()> {
        let block_ns = closure.scope.new_block();
        for stmt in &closure.body.statements {
            match self.run_statement(&block_ns, stmt)? {
                crate::runtime::interpreter::Flow::Normal => {}
                crate::runtime::interpreter::Flow::Break => {
                    return Err(RuntimeError::Unsupported {
                        message: "break is not in a loop".into(),
                    });
                }
                crate::runtime::interpreter::Flow::Continue => {
                    return Err(RuntimeError::Unsupported {
                        message: "continue is not in a loop".into(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn stored_value(stored: Stored) -> Value {
    match stored {
        Stored::Typed(raw) => Value::Raw(raw),
        Stored::Untyped(lit) => Value::Untyped(lit),
    }
}

/// A method value with its receiver bound as the leading argument.
fn bind_method(receiver: Raw, func: &FuncValue) -> Raw {
    let FuncValue::Host(host) = func else {
        return Raw::Func(func.clone());
    };
    let host = host.clone();
    let mut sig = host.sig.clone();
    if !sig.params.is_empty() {
        sig.params.remove(0);
    }
    Raw::Func(FuncValue::Host(Rc::new(HostFn {
        name: host.name.clone(),
        sig,
        func: Box::new(move |mut args| {
            args.insert(0, receiver.clone());
            (host.func)(args)
        }),
    })))
}

pub(crate) fn as_index(stored: Stored) -> RuntimeResult<i64> {
    match stored {
        Stored::Untyped(Literal::Int(v)) => Ok(v as i64),
        Stored::Untyped(Literal::Rune(v)) => Ok(v as i64),
        Stored::Typed(Raw::Int(_, v)) => Ok(v),
        Stored::Typed(Raw::Uint(_, v)) => Ok(v as i64),
        other => Err(RuntimeError::CannotUseAs {
            value: other.to_string(),
            from: other.type_name(),
            to: "int".into(),
            context: "index".into(),
        }),
    }
}

pub(crate) fn shift(op: BinaryOp, lhs: Stored, rhs: Stored) -> RuntimeResult<Value> {
    let count = match &rhs {
        Stored::Typed(Raw::Uint(_, v)) => *v,
        Stored::Untyped(Literal::Int(v)) if *v >= 0 => *v as u64,
        Stored::Untyped(Literal::Rune(v)) if *v >= 0 => *v as u64,
        other => {
            return Err(RuntimeError::InvalidOperation {
                op: format!("{} (shift count)", op.symbol()),
                ty: other.type_name(),
            });
        }
    };

    let shl = op == BinaryOp::Shl;
    match lhs {
        Stored::Untyped(Literal::Int(v)) => {
            let result = if count >= 127 {
                if shl {
                    0
                } else if v < 0 {
                    -1
                } else {
                    0
                }
            } else if shl {
                v << count
            } else {
                v >> count
            };
            Ok(Value::Untyped(Literal::Int(result)))
        }
        Stored::Untyped(Literal::Rune(v)) => {
            shift(op, Stored::Untyped(Literal::Int(v as i128)), rhs)
        }
        Stored::Typed(Raw::Int(kind, v)) => {
            let result = if count >= 64 {
                if shl {
                    0
                } else if v < 0 {
                    -1
                } else {
                    0
                }
            } else if shl {
                v.wrapping_shl(count as u32)
            } else {
                v >> count
            };
            Ok(Value::Raw(Raw::Int(kind, kind.truncate(result))))
        }
        Stored::Typed(Raw::Uint(kind, v)) => {
            let result = if count >= 64 {
                0
            } else if shl {
                v.wrapping_shl(count as u32)
            } else {
                v >> count
            };
            Ok(Value::Raw(Raw::Uint(kind, kind.truncate(result))))
        }
        other => Err(RuntimeError::InvalidOperation {
            op: op.symbol().into(),
            ty: other.type_name(),
        }),
    }
}

/// Dispatches a non-shift binary operator over type-matched operands.
pub(crate) fn binary_op(op: BinaryOp, x: Stored, y: Stored) -> RuntimeResult<Value> {
    match (x, y) {
        (Stored::Untyped(a), Stored::Untyped(b)) => binary_untyped(op, a, b),
        (Stored::Typed(a), Stored::Typed(b)) => binary_typed(op, a, b),
        // match_type never yields a mixed pair.
        (x, y) => Err(RuntimeError::MismatchedTypes {
            left: x.type_name(),
            right: y.type_name(),
        }),
    }
}

fn binary_untyped(op: BinaryOp, a: Literal, b: Literal) -> RuntimeResult<Value> {
    use BinaryOp::*;

    let invalid = |a: &Literal| RuntimeError::InvalidOperation {
        op: op.symbol().into(),
        ty: a.type_name().into(),
    };

    match (&a, &b) {
        (Literal::Int(_), Literal::Int(_)) | (Literal::Rune(_), Literal::Rune(_)) => {
            let (x, y, rune) = match (&a, &b) {
                (Literal::Int(x), Literal::Int(y)) => (*x, *y, false),
                (Literal::Rune(x), Literal::Rune(y)) => (*x as i128, *y as i128, true),
                _ => unreachable!(),
            };
            let int_result = |v: i128| {
                if rune {
                    Value::Untyped(Literal::Rune(v as i32))
                } else {
                    Value::Untyped(Literal::Int(v))
                }
            };
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => int_result(x.wrapping_add(y)),
                Sub => int_result(x.wrapping_sub(y)),
                Mul => int_result(x.wrapping_mul(y)),
                Div => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    int_result(x.wrapping_div(y))
                }
                Rem => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    int_result(x.wrapping_rem(y))
                }
                And => int_result(x & y),
                Or => int_result(x | y),
                Xor => int_result(x ^ y),
                AndNot => int_result(x & !y),
                Shl | Shr | LogAnd | LogOr => return Err(invalid(&a)),
            })
        }
        (Literal::Float(x), Literal::Float(y)) => {
            let (x, y) = (*x, *y);
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => Value::Untyped(Literal::Float(x + y)),
                Sub => Value::Untyped(Literal::Float(x - y)),
                Mul => Value::Untyped(Literal::Float(x * y)),
                Div => Value::Untyped(Literal::Float(x / y)),
                _ => return Err(invalid(&a)),
            })
        }
        (Literal::Complex(xr, xi), Literal::Complex(yr, yi)) => {
            let (xr, xi, yr, yi) = (*xr, *xi, *yr, *yi);
            Ok(match op {
                Eq => Value::Raw(Raw::Bool(xr == yr && xi == yi)),
                NotEq => Value::Raw(Raw::Bool(xr != yr || xi != yi)),
                Add => Value::Untyped(Literal::Complex(xr + yr, xi + yi)),
                Sub => Value::Untyped(Literal::Complex(xr - yr, xi - yi)),
                Mul => {
                    let (re, im) = complex_mul((xr, xi), (yr, yi));
                    Value::Untyped(Literal::Complex(re, im))
                }
                Div => {
                    let (re, im) = complex_div((xr, xi), (yr, yi));
                    Value::Untyped(Literal::Complex(re, im))
                }
                _ => return Err(invalid(&a)),
            })
        }
        (Literal::Str(x), Literal::Str(y)) => Ok(match op {
            Lt => Value::Raw(Raw::Bool(x < y)),
            LtEq => Value::Raw(Raw::Bool(x <= y)),
            Gt => Value::Raw(Raw::Bool(x > y)),
            GtEq => Value::Raw(Raw::Bool(x >= y)),
            Eq => Value::Raw(Raw::Bool(x == y)),
            NotEq => Value::Raw(Raw::Bool(x != y)),
            Add => Value::Untyped(Literal::Str(format!("{x}{y}"))),
            _ => return Err(invalid(&a)),
        }),
        _ => Err(RuntimeError::MismatchedTypes {
            left: a.type_name().into(),
            right: b.type_name().into(),
        }),
    }
}

fn binary_typed(op: BinaryOp, a: Raw, b: Raw) -> RuntimeResult<Value> {
    use BinaryOp::*;

    let invalid = |a: &Raw| RuntimeError::InvalidOperation {
        op: op.symbol().into(),
        ty: a.type_of().to_string(),
    };

    match (&a, &b) {
        (Raw::Int(kind, x), Raw::Int(_, y)) => {
            let (kind, x, y) = (*kind, *x, *y);
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => Value::Raw(Raw::Int(kind, kind.truncate(x.wrapping_add(y)))),
                Sub => Value::Raw(Raw::Int(kind, kind.truncate(x.wrapping_sub(y)))),
                Mul => Value::Raw(Raw::Int(kind, kind.truncate(x.wrapping_mul(y)))),
                Div => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Raw(Raw::Int(kind, kind.truncate(x.wrapping_div(y))))
                }
                Rem => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Raw(Raw::Int(kind, kind.truncate(x.wrapping_rem(y))))
                }
                And => Value::Raw(Raw::Int(kind, x & y)),
                Or => Value::Raw(Raw::Int(kind, x | y)),
                Xor => Value::Raw(Raw::Int(kind, x ^ y)),
                AndNot => Value::Raw(Raw::Int(kind, x & !y)),
                Shl | Shr | LogAnd | LogOr => return Err(invalid(&a)),
            })
        }
        (Raw::Uint(kind, x), Raw::Uint(_, y)) => {
            let (kind, x, y) = (*kind, *x, *y);
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => Value::Raw(Raw::Uint(kind, kind.truncate(x.wrapping_add(y)))),
                Sub => Value::Raw(Raw::Uint(kind, kind.truncate(x.wrapping_sub(y)))),
                Mul => Value::Raw(Raw::Uint(kind, kind.truncate(x.wrapping_mul(y)))),
                Div => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Raw(Raw::Uint(kind, x / y))
                }
                Rem => {
                    if y == 0 {
                        return Err(RuntimeError::DivisionByZero);
                    }
                    Value::Raw(Raw::Uint(kind, x % y))
                }
                And => Value::Raw(Raw::Uint(kind, x & y)),
                Or => Value::Raw(Raw::Uint(kind, x | y)),
                Xor => Value::Raw(Raw::Uint(kind, x ^ y)),
                AndNot => Value::Raw(Raw::Uint(kind, x & !y)),
                Shl | Shr | LogAnd | LogOr => return Err(invalid(&a)),
            })
        }
        (Raw::Float32(x), Raw::Float32(y)) => {
            let (x, y) = (*x, *y);
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => Value::Raw(Raw::Float32(x + y)),
                Sub => Value::Raw(Raw::Float32(x - y)),
                Mul => Value::Raw(Raw::Float32(x * y)),
                Div => Value::Raw(Raw::Float32(x / y)),
                _ => return Err(invalid(&a)),
            })
        }
        (Raw::Float64(x), Raw::Float64(y)) => {
            let (x, y) = (*x, *y);
            Ok(match op {
                Lt => Value::Raw(Raw::Bool(x < y)),
                LtEq => Value::Raw(Raw::Bool(x <= y)),
                Gt => Value::Raw(Raw::Bool(x > y)),
                GtEq => Value::Raw(Raw::Bool(x >= y)),
                Eq => Value::Raw(Raw::Bool(x == y)),
                NotEq => Value::Raw(Raw::Bool(x != y)),
                Add => Value::Raw(Raw::Float64(x + y)),
                Sub => Value::Raw(Raw::Float64(x - y)),
                Mul => Value::Raw(Raw::Float64(x * y)),
                Div => Value::Raw(Raw::Float64(x / y)),
                _ => return Err(invalid(&a)),
            })
        }
        (Raw::Complex64(xr, xi), Raw::Complex64(yr, yi)) => {
            let (xr, xi, yr, yi) = (*xr as f64, *xi as f64, *yr as f64, *yi as f64);
            complex_op(op, (xr, xi), (yr, yi), true).ok_or(invalid(&a))
        }
        (Raw::Complex128(xr, xi), Raw::Complex128(yr, yi)) => {
            let (xr, xi, yr, yi) = (*xr, *xi, *yr, *yi);
            complex_op(op, (xr, xi), (yr, yi), false).ok_or(invalid(&a))
        }
        (Raw::Str(x), Raw::Str(y)) => Ok(match op {
            Lt => Value::Raw(Raw::Bool(x < y)),
            LtEq => Value::Raw(Raw::Bool(x <= y)),
            Gt => Value::Raw(Raw::Bool(x > y)),
            GtEq => Value::Raw(Raw::Bool(x >= y)),
            Eq => Value::Raw(Raw::Bool(x == y)),
            NotEq => Value::Raw(Raw::Bool(x != y)),
            Add => Value::Raw(Raw::Str(format!("{x}{y}"))),
            _ => return Err(invalid(&a)),
        }),
        (Raw::Bool(x), Raw::Bool(y)) => Ok(match op {
            Eq => Value::Raw(Raw::Bool(x == y)),
            NotEq => Value::Raw(Raw::Bool(x != y)),
            _ => return Err(invalid(&a)),
        }),
        _ => match op {
            Eq | NotEq => match a.equals(&b) {
                Some(eq) => Ok(Value::Raw(Raw::Bool(if op == Eq { eq } else { !eq }))),
                None => Err(invalid(&a)),
            },
            _ => Err(invalid(&a)),
        },
    }
}

fn complex_op(op: BinaryOp, x: (f64, f64), y: (f64, f64), narrow: bool) -> Option<Value> {
    use BinaryOp::*;
    let wrap = |re: f64, im: f64| {
        if narrow {
            Value::Raw(Raw::Complex64(re as f32, im as f32))
        } else {
            Value::Raw(Raw::Complex128(re, im))
        }
    };
    Some(match op {
        Eq => Value::Raw(Raw::Bool(x == y)),
        NotEq => Value::Raw(Raw::Bool(x != y)),
        Add => wrap(x.0 + y.0, x.1 + y.1),
        Sub => wrap(x.0 - y.0, x.1 - y.1),
        Mul => {
            let (re, im) = complex_mul(x, y);
            wrap(re, im)
        }
        Div => {
            let (re, im) = complex_div(x, y);
            wrap(re, im)
        }
        _ => return None,
    })
}

pub(crate) fn complex_mul(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    (a.0 * b.0 - a.1 * b.1, a.0 * b.1 + a.1 * b.0)
}

pub(crate) fn complex_div(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    let denom = b.0 * b.0 + b.1 * b.1;
    (
        (a.0 * b.0 + a.1 * b.1) / denom,
        (a.1 * b.0 - a.0 * b.1) / denom,
    )
}

/// Type conversion `T(x)`.
pub(crate) fn convert(operand: Stored, dst: &Type) -> RuntimeResult<Raw> {
    let cannot = |operand: &Stored| RuntimeError::CannotConvert {
        value: operand.to_string(),
        from: operand.type_name(),
        to: dst.to_string(),
    };

    if let Stored::Untyped(lit) = &operand {
        if let Some(raw) = literal_fits(lit, dst) {
            return Ok(raw);
        }
        // A code point converts to its string.
        if let (Literal::Int(_) | Literal::Rune(_), Type::String) = (lit, dst) {
            let v = match lit {
                Literal::Int(v) => *v,
                Literal::Rune(v) => *v as i128,
                _ => unreachable!(),
            };
            let c = u32::try_from(v)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            return Ok(Raw::Str(c.to_string()));
        }
        return Err(cannot(&operand));
    }

    let raw = operand.into_raw();
    if raw.type_of() == *dst {
        return Ok(raw);
    }

    match (&raw, dst) {
        (Raw::Int(_, v), _) if dst.is_numeric() => numeric_from_i64(*v, dst),
        (Raw::Uint(_, v), _) if dst.is_numeric() => numeric_from_u64(*v, dst),
        (Raw::Float32(v), _) if dst.is_numeric() => numeric_from_f64(*v as f64, dst),
        (Raw::Float64(v), _) if dst.is_numeric() => numeric_from_f64(*v, dst),
        (Raw::Complex64(re, im), Type::Complex(ComplexKind::C128)) => {
            Ok(Raw::Complex128(*re as f64, *im as f64))
        }
        (Raw::Complex128(re, im), Type::Complex(ComplexKind::C64)) => {
            Ok(Raw::Complex64(*re as f32, *im as f32))
        }
        (Raw::Int(_, v), Type::String) => {
            let c = u32::try_from(*v)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            Ok(Raw::Str(c.to_string()))
        }
        (Raw::Uint(_, v), Type::String) => {
            let c = u32::try_from(*v)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or('\u{FFFD}');
            Ok(Raw::Str(c.to_string()))
        }
        (Raw::Str(s), Type::Slice(elem)) => match **elem {
            Type::Uint(UintKind::U8) => Ok(Raw::Slice(SliceValue::from_vec(
                Type::Uint(UintKind::U8),
                s.bytes().map(|b| Raw::Uint(UintKind::U8, b as u64)).collect(),
            ))),
            Type::Int(IntKind::I32) => Ok(Raw::Slice(SliceValue::from_vec(
                Type::Int(IntKind::I32),
                s.chars()
                    .map(|c| Raw::Int(IntKind::I32, c as i64))
                    .collect(),
            ))),
            _ => Err(cannot(&Stored::Typed(raw.clone()))),
        },
        (Raw::Slice(s), Type::String) => match s.elem {
            Type::Uint(UintKind::U8) => {
                let bytes: Vec<u8> = (0..s.len)
                    .map(|i| match s.get(i) {
                        Raw::Uint(_, b) => b as u8,
                        _ => 0,
                    })
                    .collect();
                Ok(Raw::Str(String::from_utf8_lossy(&bytes).into_owned()))
            }
            Type::Int(IntKind::I32) => {
                let chars: String = (0..s.len)
                    .map(|i| match s.get(i) {
                        Raw::Int(_, v) => u32::try_from(v)
                            .ok()
                            .and_then(char::from_u32)
                            .unwrap_or('\u{FFFD}'),
                        _ => '\u{FFFD}',
                    })
                    .collect();
                Ok(Raw::Str(chars))
            }
            _ => Err(cannot(&Stored::Typed(raw.clone()))),
        },
        _ => Err(cannot(&Stored::Typed(raw.clone()))),
    }
}

fn numeric_from_i64(v: i64, dst: &Type) -> RuntimeResult<Raw> {
    Ok(match dst {
        Type::Int(kind) => Raw::Int(*kind, kind.truncate(v)),
        Type::Uint(kind) => Raw::Uint(*kind, kind.truncate(v as u64)),
        Type::Float(FloatKind::F32) => Raw::Float32(v as f32),
        Type::Float(FloatKind::F64) => Raw::Float64(v as f64),
        Type::Complex(_) => {
            return Err(RuntimeError::CannotConvert {
                value: v.to_string(),
                from: "integer".into(),
                to: dst.to_string(),
            });
        }
        _ => unreachable!(),
    })
}

fn numeric_from_u64(v: u64, dst: &Type) -> RuntimeResult<Raw> {
    Ok(match dst {
        Type::Int(kind) => Raw::Int(*kind, kind.truncate(v as i64)),
        Type::Uint(kind) => Raw::Uint(*kind, kind.truncate(v)),
        Type::Float(FloatKind::F32) => Raw::Float32(v as f32),
        Type::Float(FloatKind::F64) => Raw::Float64(v as f64),
        Type::Complex(_) => {
            return Err(RuntimeError::CannotConvert {
                value: v.to_string(),
                from: "integer".into(),
                to: dst.to_string(),
            });
        }
        _ => unreachable!(),
    })
}

fn numeric_from_f64(v: f64, dst: &Type) -> RuntimeResult<Raw> {
    Ok(match dst {
        Type::Int(kind) => Raw::Int(*kind, kind.truncate(v.trunc() as i64)),
        Type::Uint(kind) => Raw::Uint(*kind, kind.truncate(v.trunc() as u64)),
        Type::Float(FloatKind::F32) => Raw::Float32(v as f32),
        Type::Float(FloatKind::F64) => Raw::Float64(v),
        Type::Complex(_) => {
            return Err(RuntimeError::CannotConvert {
                value: format!("{v}"),
                from: "float".into(),
                to: dst.to_string(),
            });
        }
        _ => unreachable!(),
    })
}

fn callee_name(callee: &Expr, func: &FuncValue) -> String {
    match callee {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Selector { x, name, .. } => match x.as_ref() {
            Expr::Ident(pkg) => format!("{}.{}", pkg.name, name.name),
            _ => name.name.clone(),
        },
        _ => func.name().to_string(),
    }
}

/// Approximate source text for error messages.
pub(crate) fn display_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::IntLit(v, _) => v.to_string(),
        Expr::FloatLit(v, _) => v.to_string(),
        Expr::ImagLit(v, _) => format!("{v}i"),
        Expr::RuneLit(c, _) => format!("'{c}'"),
        Expr::StringLit(s, _) => format!("{s:?}"),
        Expr::Paren { expr, .. } => format!("({})", display_expr(expr)),
        Expr::Unary { op, expr, .. } => {
            let symbol = match op {
                UnaryOp::Pos => "+",
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
                UnaryOp::BitNot => "^",
                UnaryOp::Addr => "&",
                UnaryOp::Deref => "*",
                UnaryOp::Recv => "<-",
            };
            format!("{symbol}{}", display_expr(expr))
        }
        Expr::Binary {
            op, left, right, ..
        } => format!(
            "{} {} {}",
            display_expr(left),
            op.symbol(),
            display_expr(right)
        ),
        Expr::Call { callee, args, .. } => {
            let args: Vec<String> = args.iter().map(display_expr).collect();
            format!("{}({})", display_expr(callee), args.join(", "))
        }
        Expr::Selector { x, name, .. } => format!("{}.{}", display_expr(x), name.name),
        Expr::Index { x, index, .. } => {
            format!("{}[{}]", display_expr(x), display_expr(index))
        }
        Expr::Slice { x, .. } => format!("{}[...]", display_expr(x)),
        Expr::Composite { .. } => "composite literal".into(),
        Expr::FuncLit { .. } => "func literal".into(),
        Expr::TypeAssert { x, .. } => format!("{}.(type)", display_expr(x)),
        Expr::TypeLit(_) => "type".into(),
    }
}
