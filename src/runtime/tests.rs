use crate::runtime::error::EvalError;
use crate::runtime::machine::{Machine, RunStatus};
use crate::runtime::namespace::Package;
use crate::runtime::stdlib;
use crate::runtime::types::{ComplexKind, FloatKind, IntKind, StructField, StructType, Type, UintKind};
use crate::runtime::value::{Literal, Raw, Stored};
use pretty_assertions::assert_eq;
use std::rc::Rc;

fn new_machine() -> Machine {
    Machine::with_default_packages()
}

fn run(mch: &mut Machine, src: &str) {
    match mch.run(src) {
        Ok(RunStatus::Complete) => {}
        other => panic!("run({src:?}) = {other:?}"),
    }
}

fn run_err(mch: &mut Machine, src: &str) -> EvalError {
    match mch.run(src) {
        Err(err) => err,
        other => panic!("run({src:?}) unexpectedly returned {other:?}"),
    }
}

fn raw(mch: &Machine, name: &str) -> Raw {
    match mch.global(name) {
        Some(Stored::Typed(raw)) => raw,
        other => panic!("global {name} = {other:?}"),
    }
}

fn int(mch: &Machine, name: &str) -> i64 {
    match raw(mch, name) {
        Raw::Int(_, v) => v,
        other => panic!("global {name} is not an int: {other:?}"),
    }
}

fn float(mch: &Machine, name: &str) -> f64 {
    match raw(mch, name) {
        Raw::Float64(v) => v,
        other => panic!("global {name} is not a float64: {other:?}"),
    }
}

fn boolean(mch: &Machine, name: &str) -> bool {
    match raw(mch, name) {
        Raw::Bool(v) => v,
        other => panic!("global {name} is not a bool: {other:?}"),
    }
}

fn text(mch: &Machine, name: &str) -> String {
    match raw(mch, name) {
        Raw::Str(s) => s,
        other => panic!("global {name} is not a string: {other:?}"),
    }
}

fn ty(mch: &Machine, name: &str) -> Type {
    raw(mch, name).type_of()
}

#[test]
fn for_statement() {
    let mut mch = new_machine();

    run(&mut mch, "var sum, j int");
    assert!(mch.global("sum").is_some());
    assert!(mch.global("j").is_some());

    run(
        &mut mch,
        "sum = 0\nj = 10\nfor i := 0; i < 10; i++ {\n\tsum += i\n\tj--\n}",
    );
    assert_eq!(int(&mch, "sum"), 45);
    assert_eq!(int(&mch, "j"), 0);

    run(
        &mut mch,
        "sum, j = 0, 10\nfor i := 0; i < 10; i++ {\n\tsum += i\n\tj -= 1\n\tif i >= 5 {\n\t\tbreak\n\t} else {\n\t\tsum += 0\n\t}\n}",
    );
    assert_eq!(int(&mch, "sum"), 15);
    assert_eq!(int(&mch, "j"), 4);
}

#[test]
fn op_assign_statement() {
    let mut mch = new_machine();

    run(&mut mch, "s := \"abc\"");
    assert_eq!(text(&mch, "s"), "abc");
    run(&mut mch, "s += \"def\"");
    assert_eq!(text(&mch, "s"), "abcdef");

    run(&mut mch, "m := map[string]int{\"def\": 10}\nk, ok := m[\"abc\"]");
    assert_eq!(int(&mch, "k"), 0);
    assert!(!boolean(&mch, "ok"));
    run(&mut mch, "k, ok = m[\"def\"]");
    assert_eq!(int(&mch, "k"), 10);
    assert!(boolean(&mch, "ok"));
    run(&mut mch, "k, l := m[\"a\"], 15");
    assert_eq!(int(&mch, "k"), 0);
    assert_eq!(int(&mch, "l"), 15);
}

#[test]
fn switch_statement() {
    let mut mch = new_machine();

    run(&mut mch, "i, s := 2, \"\"");
    run(&mut mch, "switch i {\ncase 2:\n\ts = \"two\"\n}");
    assert_eq!(text(&mch, "s"), "two");

    // The default clause runs only when nothing matched.
    run(
        &mut mch,
        "j := 3\nswitch {\ncase j == 2:\n\tj = 4\ndefault:\n\tj = 5\n}",
    );
    assert_eq!(int(&mch, "j"), 5);

    run(
        &mut mch,
        "k := 0\nswitch x := 2; x {\ncase 1, 2:\n\tk = 10\ncase 3:\n\tk = 20\n}",
    );
    assert_eq!(int(&mch, "k"), 10);
}

#[test]
fn append_grows_a_slice() {
    let mut mch = new_machine();

    run(&mut mch, "s := []string{\"abc\"}\ns = append(s, \"def\")");
    match raw(&mch, "s") {
        Raw::Slice(s) => {
            assert_eq!(s.len, 2);
            assert_eq!(Raw::Slice(s).to_string(), "[abc def]");
        }
        other => panic!("s is not a slice: {other:?}"),
    }
}

#[test]
fn delete_from_map() {
    let mut mch = new_machine();

    run(
        &mut mch,
        "m := map[string]int{\n\t\"abc\": 1,\n\t\"def\": 2,\n}\nl := len(m)",
    );
    assert_eq!(int(&mch, "l"), 2);

    run(&mut mch, "delete(m, \"ghg\")\nl = len(m)");
    assert_eq!(int(&mch, "l"), 2);

    run(&mut mch, "delete(m, \"abc\")\nl = len(m)");
    assert_eq!(int(&mch, "l"), 1);
}

#[test]
fn range_statement() {
    let mut mch = new_machine();

    run(
        &mut mch,
        "nums := []int{2, 3, 4}\nsum := 0\nfor _, num := range nums {\n\tsum += num\n}",
    );
    assert_eq!(int(&mch, "sum"), 9);

    run(
        &mut mch,
        "kvs := map[string]int{\"a\": 1, \"b\": 2}\nsum = 0\nfor k, v := range kvs {\n\tsum += v\n\tsum += len(k) - 1\n}",
    );
    assert_eq!(int(&mch, "sum"), 3);

    // Byte offsets as keys, decoded code points as values.
    run(&mut mch, "sum = 0\nfor i, c := range \"go\" {\n\tsum += i + int(c)\n}");
    assert_eq!(int(&mch, "sum"), 215);
}

#[test]
fn range_over_multibyte_string_uses_byte_offsets() {
    let mut mch = new_machine();
    run(
        &mut mch,
        "last := 0\nn := 0\nfor i, c := range \"日本\" {\n\tlast = i + int(c) - int(c)\n\tn++\n}",
    );
    assert_eq!(int(&mch, "n"), 2);
    assert_eq!(int(&mch, "last"), 3);
}

#[test]
fn multi_return_func_call() {
    let mut mch = new_machine();

    run(&mut mch, "s, c := math.Sincos(0)");
    assert_eq!(float(&mch, "s"), 0.0);
    assert_eq!(float(&mch, "c"), 1.0);

    run(&mut mch, "s, c = math.Sincos(0.1)");
    let (sin, cos) = 0.1f64.sin_cos();
    assert_eq!(float(&mch, "s"), sin);
    assert_eq!(float(&mch, "c"), cos);
}

#[test]
fn literal_types_convert_on_store() {
    let mut mch = new_machine();

    run(&mut mch, "var j = 1.5");
    assert_eq!(ty(&mch, "j"), Type::Float(FloatKind::F64));
    assert_eq!(float(&mch, "j"), 1.5);

    run(&mut mch, "var k float32");
    assert_eq!(ty(&mch, "k"), Type::Float(FloatKind::F32));

    run(&mut mch, "var l complex128 = 1");
    assert!(matches!(raw(&mch, "l"), Raw::Complex128(re, im) if re == 1.0 && im == 0.0));

    // One new variable, one existing: the existing binding keeps its
    // type and the source coerces into it.
    run(&mut mch, "i, k := 1, 2");
    assert_eq!(ty(&mch, "i"), Type::Int(IntKind::Int));
    assert!(matches!(raw(&mch, "k"), Raw::Float32(v) if v == 2.0));

    run(&mut mch, "l = 3");
    assert!(matches!(raw(&mch, "l"), Raw::Complex128(re, im) if re == 3.0 && im == 0.0));
}

#[test]
fn constants_stay_wide_until_typed() {
    let mut mch = new_machine();

    run(&mut mch, "const n = 500000000");
    run(&mut mch, "const d = 3e20 / n");
    match mch.global("d") {
        Some(Stored::Untyped(Literal::Float(v))) => assert_eq!(v, 6e11),
        other => panic!("d = {other:?}"),
    }
}

#[test]
fn type_conversion() {
    let mut mch = new_machine();

    run(&mut mch, "i := 10\nj := int64(i)");
    assert_eq!(ty(&mch, "i"), Type::Int(IntKind::Int));
    assert_eq!(ty(&mch, "j"), Type::Int(IntKind::I64));

    run(&mut mch, "b := byte(300)");
    assert!(matches!(raw(&mch, "b"), Raw::Uint(UintKind::U8, 44)));

    run(&mut mch, "f := float64(3) / 2\ntruncated := int(f)");
    assert_eq!(float(&mch, "f"), 1.5);
    assert_eq!(int(&mch, "truncated"), 1);

    run(&mut mch, "s := string('g')");
    assert_eq!(text(&mch, "s"), "g");
}

#[test]
fn slicing_keeps_capacity() {
    let mut mch = new_machine();
    run(
        &mut mch,
        "s := []string{\"abc\", \"def\", \"ghi\", \"j\", \"k\"}\nl := s[2:5]\nm := s[:3]\nk := s[1:2:3]",
    );
    match raw(&mch, "l") {
        Raw::Slice(s) => {
            assert_eq!((s.len, s.cap), (3, 3));
            assert_eq!(Raw::Slice(s).to_string(), "[ghi j k]");
        }
        other => panic!("l: {other:?}"),
    }
    match raw(&mch, "m") {
        Raw::Slice(s) => assert_eq!((s.len, s.cap), (3, 5)),
        other => panic!("m: {other:?}"),
    }
    match raw(&mch, "k") {
        Raw::Slice(s) => {
            assert_eq!((s.len, s.cap), (1, 2));
            assert_eq!(Raw::Slice(s).to_string(), "[def]");
        }
        other => panic!("k: {other:?}"),
    }
}

#[test]
fn map_reads_and_presence() {
    let mut mch = new_machine();

    run(
        &mut mch,
        "m := map[string]int{\n\t\"k1\": 7,\n\t\"k2\": 13,\n}\nk := m[\"k1\"]",
    );
    assert_eq!(int(&mch, "k"), 7);

    run(&mut mch, "l, ok := m[\"k2\"]");
    assert_eq!(int(&mch, "l"), 13);
    assert!(boolean(&mch, "ok"));

    run(&mut mch, "l, ok = m[\"k3\"]");
    assert_eq!(int(&mch, "l"), 0);
    assert!(!boolean(&mch, "ok"));

    run(&mut mch, "l = m[\"k1\"]");
    assert_eq!(int(&mch, "l"), 7);
}

#[test]
fn make_slice_map_and_chan() {
    let mut mch = new_machine();

    run(&mut mch, "s := make([]string, 3)\nl := len(s)");
    assert_eq!(int(&mch, "l"), 3);

    run(&mut mch, "s2 := make([]int, 2, 8)");
    match raw(&mch, "s2") {
        Raw::Slice(s) => assert_eq!((s.len, s.cap), (2, 8)),
        other => panic!("s2: {other:?}"),
    }

    run(&mut mch, "m := make(map[string]int)\nm[\"k1\"] = 7\nv := m[\"k1\"]");
    assert_eq!(int(&mch, "v"), 7);

    run(&mut mch, "c := make(chan int, 4)\ncl := len(c)");
    assert_eq!(int(&mch, "cl"), 0);
}

#[test]
fn copy_between_slices() {
    let mut mch = new_machine();
    run(
        &mut mch,
        "s := []string{\"abc\", \"def\"}\nt := []string{\"\"}\nl := copy(t, s)",
    );
    assert_eq!(int(&mch, "l"), 1);
    assert_eq!(raw(&mch, "t").to_string(), "[abc]");
}

#[test]
fn slice_elements_are_addressable() {
    let mut mch = new_machine();
    run(&mut mch, "s := make([]string, 3)\ns[0] = \"abc\"\ne := s[0]");
    assert_eq!(ty(&mch, "e"), Type::String);
    assert_eq!(text(&mch, "e"), "abc");
}

#[test]
fn string_indexing_yields_bytes() {
    let mut mch = new_machine();
    run(&mut mch, "b := \"abc\"[0]\nl := len(\"日本\")");
    assert!(matches!(raw(&mch, "b"), Raw::Uint(UintKind::U8, 97)));
    assert_eq!(int(&mch, "l"), 6);
}

#[test]
fn unary_operators() {
    let mut mch = new_machine();

    run(&mut mch, "i := !true");
    assert_eq!(ty(&mch, "i"), Type::Bool);
    assert!(!boolean(&mch, "i"));

    run(&mut mch, "n := -5\nm := ^0\nf := -1.5");
    assert_eq!(int(&mch, "n"), -5);
    assert_eq!(int(&mch, "m"), -1);
    assert!(matches!(raw(&mch, "f"), Raw::Float64(v) if v == -1.5));
}

#[test]
fn pointers_and_indirection() {
    let mut mch = new_machine();

    run(&mut mch, "x := 1\np := &x\n*p = 2\ny := *p");
    assert_eq!(int(&mch, "x"), 2);
    assert_eq!(int(&mch, "y"), 2);
    assert_eq!(
        ty(&mch, "p"),
        Type::Pointer(Rc::new(Type::Int(IntKind::Int)))
    );

    let err = run_err(&mut mch, "q := &5");
    assert!(err.to_string().contains("cannot take the address of"));

    let err = run_err(&mut mch, "z := *x");
    assert!(err.to_string().contains("invalid indirect"));
}

#[test]
fn parallel_assignment_snapshots_sources() {
    let mut mch = new_machine();

    run(&mut mch, "a, b := 1, 2\na, b = b, a");
    assert_eq!(int(&mch, "a"), 2);
    assert_eq!(int(&mch, "b"), 1);

    // Aliased through a shared slice buffer.
    run(&mut mch, "s := []int{1, 2}\ns[0], s[1] = s[1], s[0]");
    assert_eq!(raw(&mch, "s").to_string(), "[2 1]");
}

#[test]
fn arithmetic_preserves_the_binding_type() {
    let mut mch = new_machine();
    run(&mut mch, "var x int8 = 100\nx = x + 0");
    assert_eq!(ty(&mch, "x"), Type::Int(IntKind::I8));
    assert_eq!(int(&mch, "x"), 100);

    // Arithmetic wraps at the kind's width.
    run(&mut mch, "x = x + 100");
    assert_eq!(int(&mch, "x"), -56);
}

#[test]
fn shifts_require_unsigned_counts() {
    let mut mch = new_machine();

    run(&mut mch, "x := 1 << 3\nvar u uint = 2\ny := 8 >> u");
    assert_eq!(int(&mch, "x"), 8);
    assert_eq!(int(&mch, "y"), 2);

    run(&mut mch, "var i8 int8 = 1\nz := i8 << 10");
    assert_eq!(int(&mch, "z"), 0);

    let err = run_err(&mut mch, "var s int = 1\nw := 1 << s");
    assert!(err.to_string().contains("shift count"));
}

#[test]
fn closures_capture_their_scope() {
    let mut mch = new_machine();
    run(&mut mch, "x := 0\ninc := func() {\n\tx++\n}\ninc()\ninc()");
    assert_eq!(int(&mch, "x"), 2);

    let err = run_err(&mut mch, "f := func(a int) {\n\tx = a\n}");
    assert!(err.to_string().contains("function types are not supported"));
}

#[test]
fn fragments_buffer_until_complete() {
    let mut mch = new_machine();

    assert!(matches!(
        mch.run("total := 0\nfor i := 0; i < 10; i++ {"),
        Ok(RunStatus::Incomplete)
    ));
    // Completing the same text runs as if entered at once.
    run(&mut mch, "total := 0\nfor i := 0; i < 10; i++ {\ntotal += i }");
    assert_eq!(int(&mch, "total"), 45);

    assert!(matches!(
        mch.run("m := map[string]int{"),
        Ok(RunStatus::Incomplete)
    ));
    run(&mut mch, "m := map[string]int{\n\"a\": 1,\n}");
    assert_eq!(raw(&mch, "m").to_string(), "map[a:1]");
}

#[test]
fn hard_syntax_errors_are_not_fragments() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "x := := 2\ny := 3");
    assert!(matches!(err, EvalError::Syntax { .. }));
}

#[test]
fn define_requires_a_new_variable() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "x := 1\nx := 2");
    assert!(err.to_string().contains("no new variables"));
    assert_eq!(int(&mch, "x"), 1);

    let err = run_err(&mut mch, "var y int\nvar y int");
    assert!(err.to_string().contains("redeclared in this block"));
}

#[test]
fn failed_assignment_preserves_the_binding() {
    let mut mch = new_machine();
    run(&mut mch, "i := 1");
    let err = run_err(&mut mch, "i = \"x\"");
    assert!(err.to_string().contains("cannot use"));
    assert_eq!(int(&mch, "i"), 1);
}

#[test]
fn constants_are_not_assignable() {
    let mut mch = new_machine();
    run(&mut mch, "const k = 5");
    let err = run_err(&mut mch, "k = 6");
    assert!(err.to_string().contains("cannot assign to"));
    let err = run_err(&mut mch, "k++");
    assert!(err.to_string().contains("cannot assign to"));
}

#[test]
fn block_scopes_do_not_leak() {
    let mut mch = new_machine();

    run(&mut mch, "outer := 0\nif true {\n\tinner := 1\n\touter = inner\n}");
    assert_eq!(int(&mch, "outer"), 1);
    assert!(mch.global("inner").is_none());

    run(&mut mch, "for i := 0; i < 3; i++ {\n}");
    assert!(mch.global("i").is_none());

    // Shadowing inside a block leaves the outer binding alone.
    run(&mut mch, "x := 1\n{\n\tx := 2\n\tx++\n}");
    assert_eq!(int(&mch, "x"), 1);
}

#[test]
fn statements_before_an_error_take_effect() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "a := 10\nb := undefinedName");
    assert!(err.to_string().contains("undefined"));
    assert_eq!(int(&mch, "a"), 10);
    assert!(mch.global("b").is_none());
}

#[test]
fn condition_must_be_bool() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "if 1 {\n}");
    assert!(err.to_string().contains("used as if condition"));

    let err = run_err(&mut mch, "x := 5\nfor x {\n}");
    assert!(err.to_string().contains("used as for condition"));
}

#[test]
fn cannot_range_over_non_sequences() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "for i := range 42 {\n\t_ = i\n}");
    assert!(err.to_string().contains("cannot range over"));
}

#[test]
fn assignment_count_must_match() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "a, b := 1, 2, 3");
    assert!(err.to_string().contains("assignment count mismatch"));
}

#[test]
fn division_by_zero_is_an_error() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "x := 1 / 0");
    assert!(err.to_string().contains("division by zero"));

    run(&mut mch, "y := 1.0 / 0.0");
    assert!(matches!(raw(&mch, "y"), Raw::Float64(v) if v.is_infinite()));
}

#[test]
fn incdec_supports_all_numeric_kinds() {
    let mut mch = new_machine();
    run(
        &mut mch,
        "i := 1\nf := 1.5\nvar c complex128 = 1\ni++\nf++\nc++\ni--",
    );
    assert_eq!(int(&mch, "i"), 1);
    assert!(matches!(raw(&mch, "f"), Raw::Float64(v) if v == 2.5));
    assert!(matches!(raw(&mch, "c"), Raw::Complex128(re, _) if re == 2.0));

    let err = run_err(&mut mch, "s := \"x\"\ns++");
    assert!(err.to_string().contains("not defined on"));
}

#[test]
fn host_functions_check_argument_types() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "math.Sin(\"x\")");
    assert!(err.to_string().contains("in argument to math.Sin"));

    let err = run_err(&mut mch, "math.Sincos()");
    assert!(err.to_string().contains("not enough arguments"));

    let err = run_err(&mut mch, "math.Sincos(1, 2)");
    assert!(err.to_string().contains("too many arguments"));
}

#[test]
fn error_values_flow_through_two_value_returns() {
    let mut mch = new_machine();

    run(&mut mch, "n, err := strconv.Atoi(\"42\")");
    assert_eq!(int(&mch, "n"), 42);
    assert!(matches!(raw(&mch, "err"), Raw::Error(e) if e.message.is_none()));

    run(&mut mch, "n, err = strconv.Atoi(\"oops\")\nmsg := err.Error()");
    assert_eq!(int(&mch, "n"), 0);
    assert!(text(&mch, "msg").contains("invalid syntax"));
}

#[test]
fn string_formatting_helpers() {
    let mut mch = new_machine();
    run(&mut mch, "s := fmt.Sprint([]string{\"abc\"})\nt := fmt.Sprintf(\"%s=%d\", \"n\", 3)");
    assert_eq!(text(&mch, "s"), "[abc]");
    assert_eq!(text(&mch, "t"), "n=3");

    run(&mut mch, "u := strings.ToUpper(\"go\") + strconv.Itoa(7)");
    assert_eq!(text(&mch, "u"), "GO7");
}

#[test]
fn var_declaration_groups() {
    let mut mch = new_machine();
    run(&mut mch, "var (\n\ta = 1\n\tb string\n\tc, d = 2.5, true\n)");
    assert_eq!(int(&mch, "a"), 1);
    assert_eq!(text(&mch, "b"), "");
    assert!(matches!(raw(&mch, "c"), Raw::Float64(v) if v == 2.5));
    assert!(boolean(&mch, "d"));
}

#[test]
fn var_without_type_or_value_is_rejected() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "var x");
    assert!(err.to_string().contains("missing type or initializer"));
}

fn machine_with_geom() -> Machine {
    let mut packages = stdlib::default_packages();
    let mut geom = Package::new("geom");
    geom.add_type(
        "Point",
        Type::Struct(Rc::new(StructType {
            name: "geom.Point".into(),
            fields: vec![
                StructField {
                    name: "X".into(),
                    ty: Type::Int(IntKind::Int),
                },
                StructField {
                    name: "Y".into(),
                    ty: Type::Int(IntKind::Int),
                },
            ],
            methods: Vec::new(),
        })),
    );
    packages.insert(geom);
    Machine::new(packages)
}

#[test]
fn struct_composite_literals_and_fields() {
    let mut mch = machine_with_geom();

    run(&mut mch, "a := geom.Point{X: 10, Y: 20}\nax := a.X");
    assert_eq!(int(&mch, "ax"), 10);

    run(&mut mch, "b := geom.Point{1, 2}\npb := &b\nby := pb.Y");
    assert_eq!(int(&mch, "by"), 2);

    run(&mut mch, "a.X = 7\nax = a.X");
    assert_eq!(int(&mch, "ax"), 7);

    // Struct assignment copies by value.
    run(&mut mch, "c := a\nc.X = 99\nax = a.X");
    assert_eq!(int(&mch, "ax"), 7);

    let err = run_err(&mut mch, "bad := geom.Point{X: \"no\"}");
    assert!(err.to_string().contains("in field value"));

    let err = run_err(&mut mch, "missing := a.Z");
    assert!(err.to_string().contains("no field or method"));
}

#[test]
fn var_with_declared_type_coerces_the_value() {
    let mut mch = new_machine();
    run(&mut mch, "var a int32 = 7\nvar b float64 = 2");
    assert_eq!(ty(&mch, "a"), Type::Int(IntKind::I32));
    assert_eq!(ty(&mch, "b"), Type::Float(FloatKind::F64));

    let err = run_err(&mut mch, "var c int = \"x\"");
    assert!(err.to_string().contains("in assignment"));
}

#[test]
fn complex_literals_and_arithmetic() {
    let mut mch = new_machine();
    run(&mut mch, "z := (1 + 2i) * (3 + 4i)");
    match mch.global("z") {
        Some(Stored::Untyped(Literal::Complex(re, im))) => {
            assert_eq!((re, im), (-5.0, 10.0));
        }
        other => panic!("z = {other:?}"),
    }

    run(&mut mch, "var w complex64 = 2i\nw = w * w");
    assert!(matches!(raw(&mch, "w"), Raw::Complex64(re, im) if re == -4.0 && im == 0.0));
    assert_eq!(ty(&mch, "w"), Type::Complex(ComplexKind::C64));
}

#[test]
fn switch_case_types_must_match_the_tag() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "switch 1 {\ncase \"x\":\n}");
    assert!(err.to_string().contains("mismatched types"));
}

#[test]
fn break_and_continue_nest_properly() {
    let mut mch = new_machine();
    run(
        &mut mch,
        "n := 0\nfor i := 0; i < 5; i++ {\n\tfor j := 0; j < 5; j++ {\n\t\tif j > i {\n\t\t\tbreak\n\t\t}\n\t\tif j == 2 {\n\t\t\tcontinue\n\t\t}\n\t\tn++\n\t}\n}",
    );
    // Inner loop visits j in 0..=i, skipping j == 2.
    assert_eq!(int(&mch, "n"), 1 + 2 + 2 + 3 + 4);

    // A switch consumes break; the loop continues.
    run(
        &mut mch,
        "m := 0\nfor i := 0; i < 3; i++ {\n\tswitch i {\n\tcase 1:\n\t\tbreak\n\t}\n\tm++\n}",
    );
    assert_eq!(int(&mch, "m"), 3);
}

#[test]
fn range_with_assignment_form_is_declined() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "var i int\nfor i = range []int{1, 2} {\n}");
    assert!(err.to_string().contains("not supported"));
}

#[test]
fn return_is_rejected_at_top_level() {
    let mut mch = new_machine();
    let err = run_err(&mut mch, "return");
    assert!(err.to_string().contains("return outside a function body"));
}
