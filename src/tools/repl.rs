use crate::runtime::{Machine, RunStatus};
use crate::tools::diagnostics;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub const DEFAULT_PROMPT: &str = "$ ";

/// The interactive loop: reads a line at a time, buffers unfinished
/// fragments, and reports evaluation errors to stderr without stopping.
pub fn run(machine: &mut Machine, prompt: &str) -> rustyline::Result<()> {
    println!("gosling {}", env!("CARGO_PKG_VERSION"));
    let mut editor = DefaultEditor::new()?;
    let mut buffered = String::new();

    loop {
        // An unfinished fragment continues without a new prompt.
        let line = match editor.readline(if buffered.is_empty() { prompt } else { "" }) {
            Ok(line) => line,
            Err(ReadlineError::Eof) => {
                println!();
                return Ok(());
            }
            Err(ReadlineError::Interrupted) => {
                buffered.clear();
                continue;
            }
            Err(err) => return Err(err),
        };

        let input = if buffered.is_empty() {
            line
        } else {
            format!("{buffered}\n{line}")
        };

        match machine.run(&input) {
            Ok(RunStatus::Incomplete) => {
                buffered = input;
            }
            Ok(RunStatus::Complete) => {
                let _ = editor.add_history_entry(&input);
                buffered.clear();
            }
            Err(err) => {
                let _ = editor.add_history_entry(&input);
                diagnostics::report_eval_error(err);
                buffered.clear();
            }
        }
    }
}
