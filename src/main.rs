mod ast;
mod builtins;
mod config;
mod env;
mod error;
mod eval;
mod lexer;
mod object;
mod parser;
mod token;

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

/// Runs a Lotus script file.
#[derive(Parser, Debug)]
#[command(name = "lotus")]
#[command(version = config::VERSION)]
#[command(about = config::WELCOME_MESSAGE)]
#[command(long_about = config::WELCOME_SUBTITLE)]
struct CliArgs {
    /// Script file to execute
    #[arg(value_name = "FILE")]
    script: PathBuf,

    /// Abort evaluation after this many milliseconds
    #[arg(long = "deadline-ms", value_name = "MILLIS")]
    deadline_ms: Option<u64>,
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let source = match std::fs::read_to_string(&args.script) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not read {}: {}", args.script.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let deadline = args.deadline_ms.map(|ms| Instant::now() + Duration::from_millis(ms));

    let (program, parse_errors) = parser::parse(&source);
    if !parse_errors.is_empty() {
        for e in &parse_errors {
            eprintln!("{}", e);
        }
        return ExitCode::FAILURE;
    }

    let result = eval::evaluate(&program, &env::Environment::new(), deadline);
    match result {
        object::Value::Error(_) => {
            eprintln!("{}", result);
            ExitCode::FAILURE
        }
        _ => {
            println!("{}", result);
            ExitCode::SUCCESS
        }
    }
}
