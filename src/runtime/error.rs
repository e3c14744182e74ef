use crate::language::errors::SyntaxError;
use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// One variant per observable error category of the evaluator.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("undefined: {name}")]
    Undefined { name: String },
    #[error("{name} redeclared in this block")]
    Redeclared { name: String },
    #[error("cannot assign to {what}")]
    CannotAssign { what: String },
    #[error("no new variables on left side of :=")]
    NoNewVars,
    #[error("assignment count mismatch: {left} {op} {right}")]
    AssignCountMismatch {
        left: usize,
        op: String,
        right: usize,
    },
    #[error("mismatched types {left} and {right}")]
    MismatchedTypes { left: String, right: String },
    #[error("cannot use {value} (type {from}) as type {to} in {context}")]
    CannotUseAs {
        value: String,
        from: String,
        to: String,
        context: String,
    },
    #[error("invalid operation: operator {op} not defined on {ty}")]
    InvalidOperation { op: String, ty: String },
    #[error("invalid indirect of {value} (type {ty})")]
    InvalidIndirect { value: String, ty: String },
    #[error("cannot take the address of {what}")]
    CannotTakeAddress { what: String },
    #[error("multiple-value ({count}) in single-value context")]
    MultiValueContext { count: usize },
    #[error("not enough arguments in call to {name}")]
    NotEnoughArgs { name: String },
    #[error("too many arguments in call to {name}")]
    TooManyArgs { name: String },
    #[error("cannot call non-function {value} (type {ty})")]
    NotCallable { value: String, ty: String },
    #[error("cannot convert {value} (type {from}) to type {to}")]
    CannotConvert {
        value: String,
        from: String,
        to: String,
    },
    #[error("cannot make type {ty}")]
    CannotMake { ty: String },
    #[error("missing argument to conversion to {ty}")]
    MissingConversionArg { ty: String },
    #[error("too many arguments to conversion to {ty}")]
    TooManyConversionArgs { ty: String },
    #[error("{nth} argument to {func} must be {expected}; have {actual}")]
    ArgumentMustBe {
        nth: &'static str,
        func: &'static str,
        expected: String,
        actual: String,
    },
    #[error("invalid argument {value} (type {ty}) for {func}")]
    InvalidArgument {
        value: String,
        ty: String,
        func: String,
    },
    #[error("cannot range over {value} (type {ty})")]
    CannotRange { value: String, ty: String },
    #[error("non-bool {value} (type {ty}) used as {stmt} condition")]
    NonBoolCondition {
        value: String,
        ty: String,
        stmt: &'static str,
    },
    #[error("invalid type assertion: {value} (non-interface type {ty})")]
    InvalidTypeAssertion { value: String, ty: String },
    #[error("interface conversion: {from} is not {to}")]
    InterfaceConversion { from: String, to: String },
    #[error("unknown type {name}")]
    UnknownType { name: String },
    #[error("{name} is not a type")]
    NotAType { name: String },
    #[error("invalid map key type {ty}")]
    InvalidMapKey { ty: String },
    #[error("type {ty} has no field or method {name}")]
    NoFieldOrMethod { ty: String, name: String },
    #[error("invalid operation: type {ty} does not support indexing")]
    NotIndexable { ty: String },
    #[error("index out of range [{index}] with length {len}")]
    IndexOutOfRange { index: i64, len: usize },
    #[error("slice bounds out of range [{bound}] with capacity {cap}")]
    SliceBounds { bound: i64, cap: usize },
    #[error("cannot slice {value} (type {ty})")]
    CannotSlice { value: String, ty: String },
    #[error("division by zero")]
    DivisionByZero,
    #[error("type {ty} is not an expression")]
    TypeNotExpr { ty: String },
    #[error("use of package {name} without selector")]
    PackageNotExpr { name: String },
    #[error("{message}")]
    Unsupported { message: String },
}

/// What `Machine::run` surfaces to the front end. A fragment that merely
/// needs more input is not an error; it is the `Incomplete` run status.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("syntax error: {err}")]
    Syntax {
        err: SyntaxError,
        /// The wrapped source the error span refers to.
        src: String,
    },
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
