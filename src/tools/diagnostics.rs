use crate::language::errors::SyntaxError;
use crate::runtime::error::{EvalError, RuntimeError};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
        }
    }
}

pub fn emit_syntax_error(name: &str, source: &str, err: SyntaxError) {
    let src = NamedSource::new(name, source.to_string());
    let diagnostic = SyntaxDiagnostic::from_error(src, err);
    eprintln!("{:?}", Report::new(diagnostic));
}

pub fn report_runtime_error(error: &RuntimeError) {
    eprintln!("{error}");
}

pub fn report_eval_error(error: EvalError) {
    match error {
        EvalError::Syntax { err, src } => emit_syntax_error("fragment", &src, err),
        EvalError::Runtime(err) => report_runtime_error(&err),
    }
}

pub fn report_io_error(path: &Path, error: &std::io::Error) {
    eprintln!("Failed to access {}: {}", path.display(), error);
}
