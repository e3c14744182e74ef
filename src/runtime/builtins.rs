use crate::language::ast::Expr;
use crate::runtime::coerce::coerce_to;
use crate::runtime::error::{RuntimeError, RuntimeResult};
use crate::runtime::eval::{as_index, display_expr};
use crate::runtime::machine::Machine;
use crate::runtime::namespace::NameSpace;
use crate::runtime::types::{self, Type};
use crate::runtime::value::{
    ChanValue, Key, Literal, MapValue, Raw, SliceValue, Stored, Value,
};
use std::rc::Rc;

impl Machine {
    /// The built-in functions reachable only by name: `make`, `len`,
    /// `append`, `copy`, `delete`.
    pub(crate) fn eval_builtin(
        &mut self,
        ns: &NameSpace,
        name: &str,
        args: &[Expr],
    ) -> RuntimeResult<Vec<Value>> {
        match name {
            "make" => self.builtin_make(ns, args),
            "len" => self.builtin_len(ns, args),
            "append" => self.builtin_append(ns, args),
            "copy" => self.builtin_copy(ns, args),
            "delete" => self.builtin_delete(ns, args),
            _ => Err(RuntimeError::Undefined { name: name.into() }),
        }
    }

    fn builtin_make(&mut self, ns: &NameSpace, args: &[Expr]) -> RuntimeResult<Vec<Value>> {
        let Some(first) = args.first() else {
            return Err(RuntimeError::NotEnoughArgs {
                name: "make".into(),
            });
        };
        let ty_expr = types::type_expr_of(first).ok_or_else(|| RuntimeError::CannotMake {
            ty: display_expr(first),
        })?;
        let ty = types::eval_type(ns, &ty_expr)?;

        match &ty {
            Type::Slice(elem) => {
                if args.len() < 2 {
                    return Err(RuntimeError::NotEnoughArgs {
                        name: "make".into(),
                    });
                }
                if args.len() > 3 {
                    return Err(RuntimeError::TooManyArgs {
                        name: "make".into(),
                    });
                }
                let len = self.index_arg(ns, &args[1])?;
                let cap = match args.get(2) {
                    Some(expr) => self.index_arg(ns, expr)?,
                    None => len,
                };
                if len < 0 || cap < len {
                    return Err(RuntimeError::InvalidArgument {
                        value: format!("{len}, {cap}"),
                        ty: "int".into(),
                        func: "make".into(),
                    });
                }
                Ok(vec![Value::Raw(Raw::Slice(SliceValue::with_len(
                    (**elem).clone(),
                    len as usize,
                    cap as usize,
                )?))])
            }
            Type::Map(key, elem) => {
                if args.len() > 1 {
                    return Err(RuntimeError::TooManyArgs {
                        name: "make".into(),
                    });
                }
                Ok(vec![Value::Raw(Raw::Map(MapValue::new(
                    (**key).clone(),
                    (**elem).clone(),
                )))])
            }
            Type::Chan(dir, elem) => {
                if args.len() > 2 {
                    return Err(RuntimeError::TooManyArgs {
                        name: "make".into(),
                    });
                }
                let buffer = match args.get(1) {
                    Some(expr) => self.index_arg(ns, expr)?.max(0) as usize,
                    None => 0,
                };
                Ok(vec![Value::Raw(Raw::Chan(ChanValue::new(
                    *dir,
                    (**elem).clone(),
                    buffer,
                )))])
            }
            other => Err(RuntimeError::CannotMake {
                ty: other.to_string(),
            }),
        }
    }

    fn builtin_len(&mut self, ns: &NameSpace, args: &[Expr]) -> RuntimeResult<Vec<Value>> {
        if args.is_empty() {
            return Err(RuntimeError::NotEnoughArgs { name: "len".into() });
        }
        if args.len() > 1 {
            return Err(RuntimeError::TooManyArgs { name: "len".into() });
        }
        let operand = self.eval_stored(ns, &args[0])?;
        let len = match &operand {
            Stored::Untyped(Literal::Str(s)) => s.len(),
            Stored::Typed(Raw::Str(s)) => s.len(),
            Stored::Typed(Raw::Slice(s)) => s.len,
            Stored::Typed(Raw::Map(m)) => m.len(),
            Stored::Typed(Raw::Chan(c)) => c.len(),
            other => {
                return Err(RuntimeError::InvalidArgument {
                    value: other.to_string(),
                    ty: other.type_name(),
                    func: "len".into(),
                });
            }
        };
        Ok(vec![Value::Untyped(Literal::Int(len as i128))])
    }

    fn builtin_append(&mut self, ns: &NameSpace, args: &[Expr]) -> RuntimeResult<Vec<Value>> {
        if args.is_empty() {
            return Err(RuntimeError::NotEnoughArgs {
                name: "append".into(),
            });
        }
        let slice = match self.eval_stored(ns, &args[0])? {
            Stored::Typed(Raw::Slice(slice)) => slice,
            other => {
                return Err(RuntimeError::ArgumentMustBe {
                    nth: "first",
                    func: "append",
                    expected: "slice".into(),
                    actual: other.type_name(),
                });
            }
        };

        let mut elts = Vec::with_capacity(args.len() - 1);
        for arg in &args[1..] {
            let v = self.eval_stored(ns, arg)?;
            elts.push(coerce_to(v, &slice.elem, "argument to append")?);
        }

        Ok(vec![Value::Raw(Raw::Slice(append_slice(slice, elts)))])
    }

    fn builtin_copy(&mut self, ns: &NameSpace, args: &[Expr]) -> RuntimeResult<Vec<Value>> {
        if args.len() < 2 {
            return Err(RuntimeError::NotEnoughArgs {
                name: "copy".into(),
            });
        }
        if args.len() > 2 {
            return Err(RuntimeError::TooManyArgs {
                name: "copy".into(),
            });
        }
        let dst = match self.eval_stored(ns, &args[0])? {
            Stored::Typed(Raw::Slice(slice)) => slice,
            other => {
                return Err(RuntimeError::ArgumentMustBe {
                    nth: "first",
                    func: "copy",
                    expected: "slice".into(),
                    actual: other.type_name(),
                });
            }
        };
        let src = match self.eval_stored(ns, &args[1])? {
            Stored::Typed(Raw::Slice(slice)) => slice,
            other => {
                return Err(RuntimeError::ArgumentMustBe {
                    nth: "second",
                    func: "copy",
                    expected: "slice".into(),
                    actual: other.type_name(),
                });
            }
        };
        if dst.elem != src.elem {
            return Err(RuntimeError::MismatchedTypes {
                left: Type::Slice(Rc::new(dst.elem.clone())).to_string(),
                right: Type::Slice(Rc::new(src.elem.clone())).to_string(),
            });
        }

        let n = dst.len.min(src.len);
        // Stage the source elements so overlapping buffers copy cleanly.
        let staged: Vec<Raw> = (0..n).map(|i| src.get(i)).collect();
        for (i, item) in staged.into_iter().enumerate() {
            dst.place_of(i).write(item);
        }
        Ok(vec![Value::Untyped(Literal::Int(n as i128))])
    }

    fn builtin_delete(&mut self, ns: &NameSpace, args: &[Expr]) -> RuntimeResult<Vec<Value>> {
        if args.len() < 2 {
            return Err(RuntimeError::NotEnoughArgs {
                name: "delete".into(),
            });
        }
        if args.len() > 2 {
            return Err(RuntimeError::TooManyArgs {
                name: "delete".into(),
            });
        }
        let m = match self.eval_stored(ns, &args[0])? {
            Stored::Typed(Raw::Map(m)) => m,
            other => {
                return Err(RuntimeError::ArgumentMustBe {
                    nth: "first",
                    func: "delete",
                    expected: "map".into(),
                    actual: other.type_name(),
                });
            }
        };
        let key = self.eval_stored(ns, &args[1])?;
        let key = coerce_to(key, &m.key.clone(), "argument to delete")?;
        let hash_key = Key::from_raw(&key).ok_or(RuntimeError::InvalidMapKey {
            ty: m.key.to_string(),
        })?;
        m.remove(&hash_key);
        Ok(Vec::new())
    }

    fn index_arg(&mut self, ns: &NameSpace, expr: &Expr) -> RuntimeResult<i64> {
        let v = self.eval_stored(ns, expr)?;
        as_index(v)
    }
}

/// Appends within capacity by writing through the shared buffer,
/// reallocating with amortized doubling otherwise.
fn append_slice(slice: SliceValue, elts: Vec<Raw>) -> SliceValue {
    let added = elts.len();
    if slice.len + added <= slice.cap {
        {
            let mut buf = slice.buf.borrow_mut();
            for (i, elt) in elts.into_iter().enumerate() {
                buf[slice.off + slice.len + i] = elt;
            }
        }
        return SliceValue {
            elem: slice.elem,
            buf: slice.buf,
            off: slice.off,
            len: slice.len + added,
            cap: slice.cap,
        };
    }

    let new_cap = (slice.cap * 2).max(slice.len + added).max(1);
    let mut items = Vec::with_capacity(new_cap);
    {
        let buf = slice.buf.borrow();
        items.extend_from_slice(&buf[slice.off..slice.off + slice.len]);
    }
    items.extend(elts);
    let len = items.len();
    // Zero-fill the spare capacity so later in-place appends and
    // reslices past len have cells to read.
    while items.len() < new_cap {
        match Raw::zero(&slice.elem) {
            Ok(zero) => items.push(zero),
            Err(_) => break,
        }
    }
    let cap = items.len();
    let mut out = SliceValue::from_vec(slice.elem, items);
    out.len = len;
    out.cap = cap;
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::IntKind;

    fn int_slice(values: &[i64]) -> SliceValue {
        SliceValue::from_vec(
            Type::Int(IntKind::Int),
            values.iter().map(|v| Raw::Int(IntKind::Int, *v)).collect(),
        )
    }

    #[test]
    fn append_within_capacity_shares_the_buffer() {
        let base = SliceValue::with_len(Type::Int(IntKind::Int), 1, 4).unwrap();
        let grown = append_slice(base.clone(), vec![Raw::Int(IntKind::Int, 7)]);
        assert_eq!(grown.len, 2);
        assert_eq!(grown.cap, 4);
        assert!(Rc::ptr_eq(&grown.buf, &base.buf));
        assert!(matches!(grown.get(1), Raw::Int(_, 7)));
    }

    #[test]
    fn append_beyond_capacity_reallocates() {
        let base = int_slice(&[1, 2]);
        let grown = append_slice(
            base.clone(),
            vec![Raw::Int(IntKind::Int, 3), Raw::Int(IntKind::Int, 4)],
        );
        assert_eq!(grown.len, 4);
        assert!(grown.cap >= 4);
        assert!(!Rc::ptr_eq(&grown.buf, &base.buf));
        // The original slice is untouched.
        assert_eq!(base.len, 2);
        assert!(matches!(base.get(1), Raw::Int(_, 2)));
    }
}
