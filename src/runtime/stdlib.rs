use crate::runtime::error::RuntimeError;
use crate::runtime::namespace::{Package, PackageNameSpace};
use crate::runtime::types::{FloatKind, IntKind, Type};
use crate::runtime::value::{ErrorValue, Raw, Stored};

/// The host packages every machine starts with. Embedders can extend or
/// replace this catalog through `Machine::new`.
pub fn default_packages() -> PackageNameSpace {
    let mut packages = PackageNameSpace::new();
    packages.insert(fmt_package());
    packages.insert(math_package());
    packages.insert(strings_package());
    packages.insert(strconv_package());
    packages
}

fn arg_f64(args: &[Raw], i: usize, func: &str) -> Result<f64, RuntimeError> {
    match args.get(i) {
        Some(Raw::Float64(v)) => Ok(*v),
        Some(other) => Err(RuntimeError::InvalidArgument {
            value: other.to_string(),
            ty: other.type_of().to_string(),
            func: func.into(),
        }),
        None => Err(RuntimeError::NotEnoughArgs { name: func.into() }),
    }
}

fn arg_str(args: &[Raw], i: usize, func: &str) -> Result<String, RuntimeError> {
    match args.get(i) {
        Some(Raw::Str(s)) => Ok(s.clone()),
        Some(other) => Err(RuntimeError::InvalidArgument {
            value: other.to_string(),
            ty: other.type_of().to_string(),
            func: func.into(),
        }),
        None => Err(RuntimeError::NotEnoughArgs { name: func.into() }),
    }
}

fn arg_int(args: &[Raw], i: usize, func: &str) -> Result<i64, RuntimeError> {
    match args.get(i) {
        Some(Raw::Int(_, v)) => Ok(*v),
        Some(other) => Err(RuntimeError::InvalidArgument {
            value: other.to_string(),
            ty: other.type_of().to_string(),
            func: func.into(),
        }),
        None => Err(RuntimeError::NotEnoughArgs { name: func.into() }),
    }
}

fn written(s: &str) -> Vec<Raw> {
    vec![
        Raw::Int(IntKind::Int, s.len() as i64),
        Raw::Error(ErrorValue::nil()),
    ]
}

fn fmt_package() -> Package {
    let mut pkg = Package::new("fmt");

    pkg.add_func(
        "Println",
        Vec::new(),
        Some(Type::Any),
        vec![Type::Int(IntKind::Int), Type::Error],
        |args| {
            let line = sprintln(&args);
            print!("{line}");
            Ok(written(&line))
        },
    );
    pkg.add_func(
        "Print",
        Vec::new(),
        Some(Type::Any),
        vec![Type::Int(IntKind::Int), Type::Error],
        |args| {
            let text = sprint(&args);
            print!("{text}");
            Ok(written(&text))
        },
    );
    pkg.add_func(
        "Printf",
        vec![Type::String],
        Some(Type::Any),
        vec![Type::Int(IntKind::Int), Type::Error],
        |args| {
            let format = arg_str(&args, 0, "fmt.Printf")?;
            let text = sprintf(&format, &args[1..]);
            print!("{text}");
            Ok(written(&text))
        },
    );
    pkg.add_func(
        "Sprint",
        Vec::new(),
        Some(Type::Any),
        vec![Type::String],
        |args| Ok(vec![Raw::Str(sprint(&args))]),
    );
    pkg.add_func(
        "Sprintln",
        Vec::new(),
        Some(Type::Any),
        vec![Type::String],
        |args| Ok(vec![Raw::Str(sprintln(&args))]),
    );
    pkg.add_func(
        "Sprintf",
        vec![Type::String],
        Some(Type::Any),
        vec![Type::String],
        |args| {
            let format = arg_str(&args, 0, "fmt.Sprintf")?;
            Ok(vec![Raw::Str(sprintf(&format, &args[1..]))])
        },
    );

    pkg
}

fn math_package() -> Package {
    let mut pkg = Package::new("math");
    let f64_ty = Type::Float(FloatKind::F64);

    let unary: [(&str, fn(f64) -> f64); 8] = [
        ("Sin", f64::sin),
        ("Cos", f64::cos),
        ("Tan", f64::tan),
        ("Sqrt", f64::sqrt),
        ("Abs", f64::abs),
        ("Floor", f64::floor),
        ("Ceil", f64::ceil),
        ("Exp", f64::exp),
    ];
    for (name, func) in unary {
        let label = format!("math.{name}");
        pkg.add_func(name, vec![f64_ty.clone()], None, vec![f64_ty.clone()], {
            move |args| Ok(vec![Raw::Float64(func(arg_f64(&args, 0, &label)?))])
        });
    }

    let binary: [(&str, fn(f64, f64) -> f64); 4] = [
        ("Pow", f64::powf),
        ("Max", f64::max),
        ("Min", f64::min),
        ("Mod", |a, b| a % b),
    ];
    for (name, func) in binary {
        let label = format!("math.{name}");
        pkg.add_func(
            name,
            vec![f64_ty.clone(), f64_ty.clone()],
            None,
            vec![f64_ty.clone()],
            move |args| {
                Ok(vec![Raw::Float64(func(
                    arg_f64(&args, 0, &label)?,
                    arg_f64(&args, 1, &label)?,
                ))])
            },
        );
    }

    pkg.add_func(
        "Sincos",
        vec![f64_ty.clone()],
        None,
        vec![f64_ty.clone(), f64_ty.clone()],
        |args| {
            let x = arg_f64(&args, 0, "math.Sincos")?;
            let (sin, cos) = x.sin_cos();
            Ok(vec![Raw::Float64(sin), Raw::Float64(cos)])
        },
    );

    pkg.add_const("Pi", Stored::Typed(Raw::Float64(std::f64::consts::PI)));
    pkg.add_const("E", Stored::Typed(Raw::Float64(std::f64::consts::E)));
    pkg.add_const(
        "MaxInt64",
        Stored::Typed(Raw::Int(IntKind::I64, i64::MAX)),
    );

    pkg
}

fn strings_package() -> Package {
    let mut pkg = Package::new("strings");

    pkg.add_func(
        "ToUpper",
        vec![Type::String],
        None,
        vec![Type::String],
        |args| Ok(vec![Raw::Str(arg_str(&args, 0, "strings.ToUpper")?.to_uppercase())]),
    );
    pkg.add_func(
        "ToLower",
        vec![Type::String],
        None,
        vec![Type::String],
        |args| Ok(vec![Raw::Str(arg_str(&args, 0, "strings.ToLower")?.to_lowercase())]),
    );
    pkg.add_func(
        "Contains",
        vec![Type::String, Type::String],
        None,
        vec![Type::Bool],
        |args| {
            let haystack = arg_str(&args, 0, "strings.Contains")?;
            let needle = arg_str(&args, 1, "strings.Contains")?;
            Ok(vec![Raw::Bool(haystack.contains(&needle))])
        },
    );
    pkg.add_func(
        "Repeat",
        vec![Type::String, Type::Int(IntKind::Int)],
        None,
        vec![Type::String],
        |args| {
            let s = arg_str(&args, 0, "strings.Repeat")?;
            let count = arg_int(&args, 1, "strings.Repeat")?;
            if count < 0 {
                return Err(RuntimeError::InvalidArgument {
                    value: count.to_string(),
                    ty: "int".into(),
                    func: "strings.Repeat".into(),
                });
            }
            Ok(vec![Raw::Str(s.repeat(count as usize))])
        },
    );
    pkg.add_func(
        "Index",
        vec![Type::String, Type::String],
        None,
        vec![Type::Int(IntKind::Int)],
        |args| {
            let haystack = arg_str(&args, 0, "strings.Index")?;
            let needle = arg_str(&args, 1, "strings.Index")?;
            let index = haystack.find(&needle).map(|i| i as i64).unwrap_or(-1);
            Ok(vec![Raw::Int(IntKind::Int, index)])
        },
    );

    pkg
}

fn strconv_package() -> Package {
    let mut pkg = Package::new("strconv");

    pkg.add_func(
        "Itoa",
        vec![Type::Int(IntKind::Int)],
        None,
        vec![Type::String],
        |args| Ok(vec![Raw::Str(arg_int(&args, 0, "strconv.Itoa")?.to_string())]),
    );
    pkg.add_func(
        "Atoi",
        vec![Type::String],
        None,
        vec![Type::Int(IntKind::Int), Type::Error],
        |args| {
            let s = arg_str(&args, 0, "strconv.Atoi")?;
            Ok(match s.trim().parse::<i64>() {
                Ok(v) => vec![Raw::Int(IntKind::Int, v), Raw::Error(ErrorValue::nil())],
                Err(_) => vec![
                    Raw::Int(IntKind::Int, 0),
                    Raw::Error(ErrorValue::new(format!(
                        "strconv.Atoi: parsing {s:?}: invalid syntax"
                    ))),
                ],
            })
        },
    );
    pkg.add_func(
        "Quote",
        vec![Type::String],
        None,
        vec![Type::String],
        |args| Ok(vec![Raw::Str(format!("{:?}", arg_str(&args, 0, "strconv.Quote")?))]),
    );

    pkg
}

/// Default formatting with spaces between operands when neither is a
/// string.
pub fn sprint(args: &[Raw]) -> String {
    let mut out = String::new();
    let mut last_was_string = true;
    for (i, arg) in args.iter().enumerate() {
        let is_string = matches!(arg, Raw::Str(_));
        if i > 0 && !is_string && !last_was_string {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
        last_was_string = is_string;
    }
    out
}

/// Default formatting with spaces between all operands and a trailing
/// newline.
pub fn sprintln(args: &[Raw]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&arg.to_string());
    }
    out.push('\n');
    out
}

/// A small subset of the host language's printf verbs: `%v %d %s %f %g
/// %t %q %c %x %%`.
pub fn sprintf(format: &str, args: &[Raw]) -> String {
    let mut out = String::new();
    let mut chars = format.chars().peekable();
    let mut next = 0usize;

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        let Some(verb) = chars.next() else {
            out.push('%');
            break;
        };
        if verb == '%' {
            out.push('%');
            continue;
        }
        let Some(arg) = args.get(next) else {
            out.push_str(&format!("%!{verb}(MISSING)"));
            continue;
        };
        next += 1;
        match verb {
            'v' | 'd' | 's' | 'g' => out.push_str(&arg.to_string()),
            't' => out.push_str(&arg.to_string()),
            'f' => match arg {
                Raw::Float64(v) => out.push_str(&format!("{v:.6}")),
                Raw::Float32(v) => out.push_str(&format!("{v:.6}")),
                other => out.push_str(&other.to_string()),
            },
            'q' => match arg {
                Raw::Str(s) => out.push_str(&format!("{s:?}")),
                other => out.push_str(&other.to_string()),
            },
            'c' => match arg {
                Raw::Int(_, v) => {
                    let c = u32::try_from(*v)
                        .ok()
                        .and_then(char::from_u32)
                        .unwrap_or('\u{FFFD}');
                    out.push(c);
                }
                other => out.push_str(&other.to_string()),
            },
            'x' => match arg {
                Raw::Int(_, v) => out.push_str(&format!("{v:x}")),
                Raw::Uint(_, v) => out.push_str(&format!("{v:x}")),
                other => out.push_str(&other.to_string()),
            },
            other => {
                out.push_str(&format!("%!{other}({arg})"));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprint_spaces_only_between_non_strings() {
        assert_eq!(
            sprint(&[Raw::Str("go".into()), Raw::Str("lang".into())]),
            "golang"
        );
        assert_eq!(
            sprint(&[Raw::Int(IntKind::Int, 1), Raw::Int(IntKind::Int, 2)]),
            "1 2"
        );
        assert_eq!(
            sprint(&[Raw::Str("n=".into()), Raw::Int(IntKind::Int, 3)]),
            "n=3"
        );
    }

    #[test]
    fn sprintln_spaces_everything() {
        assert_eq!(
            sprintln(&[Raw::Str("a".into()), Raw::Str("b".into())]),
            "a b\n"
        );
    }

    #[test]
    fn sprintf_subset() {
        assert_eq!(
            sprintf("%s -> %d\n", &[Raw::Str("a".into()), Raw::Int(IntKind::Int, 1)]),
            "a -> 1\n"
        );
        assert_eq!(sprintf("%d%%", &[Raw::Int(IntKind::Int, 7)]), "7%");
        assert_eq!(sprintf("%v", &[Raw::Float64(1.5)]), "1.5");
        assert_eq!(sprintf("%d", &[]), "%!d(MISSING)");
    }

    #[test]
    fn default_catalog_exposes_the_expected_packages() {
        let packages = default_packages();
        for name in ["fmt", "math", "strings", "strconv"] {
            assert!(packages.package(name).is_some(), "missing package {name}");
        }
        assert!(packages.package("strconv").unwrap().has_entry("Atoi"));
        assert!(packages.package("math").unwrap().has_entry("Sincos"));
    }
}
