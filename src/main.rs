use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pseudo::error::{self, CliError};
use pseudo::{run, StdHostIo, SymbolTable};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .without_time()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = env::args();
    args.next();
    match args.next() {
        Some(path) => run_file(PathBuf::from(path)),
        None => {
            run_shell();
            ExitCode::SUCCESS
        }
    }
}

fn run_file(path: PathBuf) -> ExitCode {
    let file_name = path.display().to_string();
    let source = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) => {
            eprintln!(
                "{}",
                CliError::ReadFile {
                    path: file_name,
                    source
                }
            );
            return ExitCode::FAILURE;
        }
    };
    let source = match String::from_utf8(source) {
        Ok(s) => s,
        Err(_) => {
            eprintln!("{}", CliError::InvalidUtf8 { path: file_name });
            return ExitCode::FAILURE;
        }
    };

    let scope = SymbolTable::root();
    let mut io = StdHostIo::default();
    tracing::debug!(%file_name, "running file");
    match run(&source, &file_name, &scope, &mut io) {
        Ok(value) if value.is_error() => {
            eprintln!("{}", error::format_runtime_error(&value.display()));
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err((msg, span)) => {
            eprintln!("{}", error::format_parse_error(&source, &msg, &span));
            ExitCode::FAILURE
        }
    }
}

/// Mirrors the original interpreter's `run_shell`: one line of input per
/// prompt, evaluated against a symbol table that persists across lines, with
/// the elapsed wall-clock time for that line reported afterward.
fn run_shell() {
    let scope = SymbolTable::root();
    let mut io = StdHostIo::default();
    let (r, g, b) = error::PROMPT_COLOR;

    loop {
        print!("{}", "Pseudo >> ".truecolor(r, g, b));
        let _ = io::stdout().flush();

        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            return;
        }

        let start = Instant::now();
        match run(&line, "stdin", &scope, &mut io) {
            Ok(value) if value.is_error() => {
                println!("{}", error::format_runtime_error(&value.display()));
            }
            Ok(value) => println!("{}", value.display()),
            Err((msg, span)) => println!("{}", error::format_parse_error(&line, &msg, &span)),
        }
        let elapsed = start.elapsed().as_millis();
        println!("Execution time: {elapsed} ms");
    }
}
