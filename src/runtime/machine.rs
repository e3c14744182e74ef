use crate::language::parser::parse_program;
use crate::language::span::line_of;
use crate::runtime::error::EvalError;
use crate::runtime::interpreter::Flow;
use crate::runtime::namespace::{NameSpace, PackageNameSpace};
use crate::runtime::stdlib;
use crate::runtime::value::Stored;
use std::rc::Rc;

const SRC_PREFIX: &str = "package main; func main() {\n";
const SRC_SUFFIX: &str = "\n}";

/// What a successful `run` reports back to the front end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// The fragment parsed and every statement ran.
    Complete,
    /// The fragment looks truncated; buffer more input and retry.
    Incomplete,
}

/// The interactive evaluator: a mutable global scope over an immutable
/// package namespace, fed one source fragment at a time.
pub struct Machine {
    globals: NameSpace,
}

impl Machine {
    pub fn new(packages: PackageNameSpace) -> Self {
        Self {
            globals: NameSpace::global(Rc::new(packages)),
        }
    }

    /// A machine with the standard host packages pre-bound.
    pub fn with_default_packages() -> Self {
        Self::new(stdlib::default_packages())
    }

    /// Wraps the fragment in a synthetic main shell, parses it, and runs
    /// the body statements against the global scope. A parse error at or
    /// past the last line means the input is merely unfinished.
    pub fn run(&mut self, fragment: &str) -> Result<RunStatus, EvalError> {
        let src = format!("{SRC_PREFIX}{fragment}{SRC_SUFFIX}");
        let last_line = src.split('\n').count();

        let statements = match parse_program(&src) {
            Ok(statements) => statements,
            Err(err) => {
                if line_of(&src, err.span.start) >= last_line {
                    return Ok(RunStatus::Incomplete);
                }
                return Err(EvalError::Syntax { err, src });
            }
        };

        let globals = self.globals.clone();
        for stmt in &statements {
            match self.run_statement(&globals, stmt)? {
                Flow::Normal => {}
                Flow::Break => {
                    return Err(EvalError::Runtime(
                        crate::runtime::error::RuntimeError::Unsupported {
                            message: "break is not in a loop".into(),
                        },
                    ));
                }
                Flow::Continue => {
                    return Err(EvalError::Runtime(
                        crate::runtime::error::RuntimeError::Unsupported {
                            message: "continue is not in a loop".into(),
                        },
                    ));
                }
            }
        }
        Ok(RunStatus::Complete)
    }

    /// Observes a binding in the global scope, mainly for embedders and
    /// tests.
    pub fn global(&self, name: &str) -> Option<Stored> {
        self.globals
            .find_local(name)
            .map(|binding| binding.cell.borrow().clone())
    }
}
