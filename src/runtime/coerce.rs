use crate::runtime::error::RuntimeError;
use crate::runtime::types::{ComplexKind, FloatKind, Type};
use crate::runtime::value::{Literal, Raw, Stored};

/// Converts an untyped literal into `dst` when the language's
/// assignability rules allow it. Narrowing wraps the way a machine
/// conversion would.
pub fn literal_fits(lit: &Literal, dst: &Type) -> Option<Raw> {
    match lit {
        Literal::Int(_) | Literal::Rune(_) => {
            let v = match lit {
                Literal::Int(v) => *v,
                Literal::Rune(v) => *v as i128,
                _ => unreachable!(),
            };
            match dst {
                Type::Int(kind) => Some(Raw::Int(*kind, kind.truncate(v as i64))),
                Type::Uint(kind) => Some(Raw::Uint(*kind, kind.truncate(v as u64))),
                Type::Float(FloatKind::F32) => Some(Raw::Float32(v as f32)),
                Type::Float(FloatKind::F64) => Some(Raw::Float64(v as f64)),
                Type::Complex(ComplexKind::C64) => Some(Raw::Complex64(v as f32, 0.0)),
                Type::Complex(ComplexKind::C128) => Some(Raw::Complex128(v as f64, 0.0)),
                Type::Any => Some(lit.default_raw()),
                _ => None,
            }
        }
        Literal::Float(v) => match dst {
            Type::Float(FloatKind::F32) => Some(Raw::Float32(*v as f32)),
            Type::Float(FloatKind::F64) => Some(Raw::Float64(*v)),
            Type::Complex(ComplexKind::C64) => Some(Raw::Complex64(*v as f32, 0.0)),
            Type::Complex(ComplexKind::C128) => Some(Raw::Complex128(*v, 0.0)),
            Type::Any => Some(lit.default_raw()),
            _ => None,
        },
        Literal::Complex(re, im) => match dst {
            Type::Complex(ComplexKind::C64) => Some(Raw::Complex64(*re as f32, *im as f32)),
            Type::Complex(ComplexKind::C128) => Some(Raw::Complex128(*re, *im)),
            Type::Any => Some(lit.default_raw()),
            _ => None,
        },
        Literal::Str(s) => match dst {
            Type::String => Some(Raw::Str(s.clone())),
            Type::Any => Some(lit.default_raw()),
            _ => None,
        },
    }
}

/// Adapts a value toward a destination type. Untyped literals convert
/// where assignable; anything else passes through unchanged and the
/// caller reports the mismatch.
pub fn match_dest_type(v: Stored, dst: &Type) -> Stored {
    match v {
        Stored::Untyped(lit) => match literal_fits(&lit, dst) {
            Some(raw) => Stored::Typed(raw),
            None => Stored::Untyped(lit),
        },
        typed => typed,
    }
}

/// Coerces a value to `dst` or fails with the positional context of the
/// assignment-style error message.
pub fn coerce_to(v: Stored, dst: &Type, context: &str) -> Result<Raw, RuntimeError> {
    let v = match_dest_type(v, dst);
    match v {
        Stored::Typed(raw) if raw.type_of() == *dst || *dst == Type::Any => Ok(raw),
        other => Err(RuntimeError::CannotUseAs {
            value: other.to_string(),
            from: other.type_name(),
            to: dst.to_string(),
            context: context.into(),
        }),
    }
}

fn lit_float(lit: &Literal) -> Option<f64> {
    match lit {
        Literal::Int(v) => Some(*v as f64),
        Literal::Rune(v) => Some(*v as f64),
        Literal::Float(v) => Some(*v),
        _ => None,
    }
}

fn lit_complex(lit: &Literal) -> Option<(f64, f64)> {
    match lit {
        Literal::Complex(re, im) => Some((*re, *im)),
        other => lit_float(other).map(|re| (re, 0.0)),
    }
}

/// Reconciles the operands of a binary operator onto one type, per the
/// language's untyped-constant rules.
pub fn match_type(x: Stored, y: Stored) -> Result<(Stored, Stored), RuntimeError> {
    let mismatch = |x: &Stored, y: &Stored| RuntimeError::MismatchedTypes {
        left: x.type_name(),
        right: y.type_name(),
    };

    match (x, y) {
        (Stored::Typed(a), Stored::Typed(b)) => {
            if a.type_of() == b.type_of() {
                Ok((Stored::Typed(a), Stored::Typed(b)))
            } else {
                Err(mismatch(&Stored::Typed(a), &Stored::Typed(b)))
            }
        }
        (Stored::Typed(a), Stored::Untyped(lit)) => {
            match literal_fits(&lit, &a.type_of()) {
                Some(b) => Ok((Stored::Typed(a), Stored::Typed(b))),
                None => Err(mismatch(&Stored::Typed(a), &Stored::Untyped(lit))),
            }
        }
        (Stored::Untyped(lit), Stored::Typed(b)) => {
            match literal_fits(&lit, &b.type_of()) {
                Some(a) => Ok((Stored::Typed(a), Stored::Typed(b))),
                None => Err(mismatch(&Stored::Untyped(lit), &Stored::Typed(b))),
            }
        }
        (Stored::Untyped(a), Stored::Untyped(b)) => unify_literals(a, b),
    }
}

/// Two untyped operands settle on the wider numeric class; a rune
/// literal takes the other side's class.
fn unify_literals(a: Literal, b: Literal) -> Result<(Stored, Stored), RuntimeError> {
    use Literal::*;

    let pair = |a, b| Ok((Stored::Untyped(a), Stored::Untyped(b)));
    let mismatch = |a: &Literal, b: &Literal| RuntimeError::MismatchedTypes {
        left: a.type_name().into(),
        right: b.type_name().into(),
    };

    match (a, b) {
        (a @ Int(_), b @ Int(_))
        | (a @ Float(_), b @ Float(_))
        | (a @ Complex(_, _), b @ Complex(_, _))
        | (a @ Rune(_), b @ Rune(_))
        | (a @ Str(_), b @ Str(_)) => pair(a, b),

        (Rune(r), b @ Int(_)) => pair(Int(r as i128), b),
        (a @ Int(_), Rune(r)) => pair(a, Int(r as i128)),

        (a, b) if matches!(a, Complex(_, _)) || matches!(b, Complex(_, _)) => {
            match (lit_complex(&a), lit_complex(&b)) {
                (Some((ar, ai)), Some((br, bi))) => pair(Complex(ar, ai), Complex(br, bi)),
                _ => Err(mismatch(&a, &b)),
            }
        }
        (a, b) if matches!(a, Float(_)) || matches!(b, Float(_)) => {
            match (lit_float(&a), lit_float(&b)) {
                (Some(af), Some(bf)) => pair(Float(af), Float(bf)),
                _ => Err(mismatch(&a, &b)),
            }
        }
        (a, b) => Err(mismatch(&a, &b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::types::{IntKind, UintKind};

    #[test]
    fn int_literal_assigns_to_numeric_kinds() {
        let lit = Literal::Int(7);
        assert!(matches!(
            literal_fits(&lit, &Type::Int(IntKind::I8)),
            Some(Raw::Int(IntKind::I8, 7))
        ));
        assert!(matches!(
            literal_fits(&lit, &Type::Uint(UintKind::U16)),
            Some(Raw::Uint(UintKind::U16, 7))
        ));
        assert!(matches!(
            literal_fits(&lit, &Type::Float(FloatKind::F64)),
            Some(Raw::Float64(v)) if v == 7.0
        ));
        assert!(matches!(
            literal_fits(&lit, &Type::Complex(ComplexKind::C128)),
            Some(Raw::Complex128(re, im)) if re == 7.0 && im == 0.0
        ));
        assert!(literal_fits(&lit, &Type::String).is_none());
    }

    #[test]
    fn string_literal_only_fits_string_kind() {
        let lit = Literal::Str("abc".into());
        assert!(literal_fits(&lit, &Type::String).is_some());
        assert!(literal_fits(&lit, &Type::Int(IntKind::Int)).is_none());
    }

    #[test]
    fn wide_untyped_quotient_stays_untyped() {
        // 3e20 / 500000000 is representable even though 3e20 overflows
        // every integer kind.
        let (a, b) = match_type(
            Stored::Untyped(Literal::Float(3e20)),
            Stored::Untyped(Literal::Int(500000000)),
        )
        .unwrap();
        match (a, b) {
            (Stored::Untyped(Literal::Float(x)), Stored::Untyped(Literal::Float(y))) => {
                assert_eq!(x / y, 6e11);
            }
            other => panic!("expected float literals, got {other:?}"),
        }
    }

    #[test]
    fn rune_literal_adopts_the_other_operand_type() {
        let (a, _) = match_type(
            Stored::Untyped(Literal::Rune('g' as i32)),
            Stored::Typed(Raw::Int(IntKind::Int, 1)),
        )
        .unwrap();
        assert!(matches!(a, Stored::Typed(Raw::Int(IntKind::Int, 103))));
    }

    #[test]
    fn typed_operands_must_agree() {
        let err = match_type(
            Stored::Typed(Raw::Int(IntKind::Int, 1)),
            Stored::Typed(Raw::Str("x".into())),
        )
        .unwrap_err();
        assert!(matches!(err, RuntimeError::MismatchedTypes { .. }));
    }
}
