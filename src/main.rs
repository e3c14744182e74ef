#[cfg(test)]
mod tests;

use clap::{Parser, Subcommand};
use gosling_lang::runtime::{Machine, RunStatus};
use gosling_lang::tools::{diagnostics, repl};
use std::path::PathBuf;
use std::{fs, process};

#[derive(Debug, Parser)]
#[command(name = "gosling-lang", version, about = "Gosling language REPL")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Start the interactive evaluator.
    Repl {
        /// Prompt printed before each new fragment.
        #[arg(long, default_value = repl::DEFAULT_PROMPT)]
        prompt: String,
    },
    /// Evaluate a script file as a single fragment.
    Run { file: PathBuf },
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Repl {
        prompt: repl::DEFAULT_PROMPT.to_string(),
    });
    let code = match command {
        Commands::Repl { prompt } => run_repl(&prompt),
        Commands::Run { file } => run_file(&file),
    };
    process::exit(code);
}

fn run_repl(prompt: &str) -> i32 {
    let mut machine = Machine::with_default_packages();
    match repl::run(&mut machine, prompt) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Read error: {err}");
            1
        }
    }
}

fn run_file(path: &PathBuf) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            diagnostics::report_io_error(path, &err);
            return 1;
        }
    };

    let mut machine = Machine::with_default_packages();
    match machine.run(&source) {
        Ok(RunStatus::Complete) => 0,
        Ok(RunStatus::Incomplete) => {
            eprintln!("{}: unexpected end of file", path.display());
            1
        }
        Err(err) => {
            diagnostics::report_eval_error(err);
            1
        }
    }
}
