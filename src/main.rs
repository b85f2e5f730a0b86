//! mecha — syntax checker for the Mecha language.
//!
//! Reads a source file, checks it against the grammar and writes the token
//! dump to the output file.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde_json::json;

use mecha::config::load_config;
use mecha::frontend::error::NO_SOURCE_FILE;
use mecha::frontend::{CompileError, FrontEnd, Report};
use mecha::logger::Logger;

#[derive(Debug, Parser)]
#[command(name = "mecha", version, about = "Lexical and syntax analysis for Mecha sources")]
struct Cli {
    /// Source file to check.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Where the token dump goes [default: output]
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Trace recognized rules and log every token.
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = load_config();
    config.debug |= cli.debug;
    let logger = Logger::stderr(config.effective_level());

    let Some(input) = cli.input else {
        let err = CompileError::file("main", NO_SOURCE_FILE);
        logger.fatal(&err, json!(null));
        return ExitCode::FAILURE;
    };
    let output = cli.output.unwrap_or(config.output);

    match run(&input, &output, config.debug, &logger) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn run(input: &Path, output: &Path, debug: bool, logger: &Logger) -> Result<(), CompileError> {
    let source = File::open(input).map_err(|e| {
        let err = CompileError::io("main::open", e);
        logger.fatal(&err, json!({ "path": input.display().to_string() }));
        err
    })?;
    let mut destination = File::create(output).map_err(|e| {
        let err = CompileError::io("main::create", e);
        logger.fatal(&err, json!({ "path": output.display().to_string() }));
        err
    })?;

    logger.debug(
        "checking source",
        json!({ "input": input.display().to_string(), "output": output.display().to_string() }),
    );

    let front_end = FrontEnd::new(debug, logger.clone());
    let (report, result) = front_end.analyze(source, &mut destination);

    if result.is_ok() {
        logger.info("syntax analysis completed with no errors", json!(null));
    }
    if debug {
        print_trace(&report);
    }
    result
}

fn print_trace(report: &Report) {
    println!("Recognized rules:");
    for rule in &report.rules {
        println!("  {rule}");
    }
    println!("Tokens:");
    for token in &report.tokens {
        println!("  {token}");
    }
}
