use crate::error::TallyError;
use crate::interpreter::Interpreter;
use crate::lexer::Lexer;
use crate::parser::Parser;
use std::io::{self, Write};
use std::time::Instant;
use tracing::{debug, info};

/// Switches set by the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Log the token stream and the parsed tree.
    pub debug: bool,
    /// Log wall-clock time per stage.
    pub perf: bool,
}

/// Runs `source` with fresh pipeline instances, printing to `out`.
pub fn execute<W: Write>(source: &str, out: W) -> Result<(), TallyError> {
    run_pipeline(source, out, &RunOptions::default())
}

/// Runs `source` against stdout and reports any failure to stderr before
/// returning it.
pub fn run(source: &str, filename: Option<&str>, options: &RunOptions) -> Result<(), TallyError> {
    let result = run_pipeline(source, io::stdout().lock(), options);
    if let Err(ref error) = result {
        error.report(source, filename);
    }
    result
}

fn run_pipeline<W: Write>(source: &str, out: W, options: &RunOptions) -> Result<(), TallyError> {
    if options.debug {
        dump_tokens(source);
    }

    let started = Instant::now();
    let program = Parser::from_source(source)?.parse()?;
    if options.perf {
        info!(
            stage = "parse",
            elapsed_us = started.elapsed().as_micros() as u64,
            statements = program.statements.len(),
            "stage finished"
        );
    }
    if options.debug {
        debug!("ast:\n{}", program);
    }

    let started = Instant::now();
    let mut interpreter = Interpreter::with_output(out);
    let result = interpreter.interpret(&program);
    if options.perf {
        info!(
            stage = "interpret",
            elapsed_us = started.elapsed().as_micros() as u64,
            variables = interpreter.environment().len(),
            ok = result.is_ok(),
            "stage finished"
        );
    }
    result
}

/// Lex errors are left for the parser pass to surface.
fn dump_tokens(source: &str) {
    for token in Lexer::new(source) {
        match token {
            Ok(token) => debug!(%token, "token"),
            Err(_) => break,
        }
    }
}
