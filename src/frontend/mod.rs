//! Mecha front end: source text → reversed token stream → grammar check.

pub mod catalog;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod source;
pub mod token;

pub use error::{CompileError, ErrorKind};
pub use token::{Position, Token, TokenKind};

use std::io::{self, Read, Write};

use serde_json::json;

use crate::logger::Logger;
use lexer::Lexer;
use parser::Parser;

/// What a run leaves behind, whether or not the source was accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Recognized productions, in the order they were entered. Empty unless
    /// the front end runs in debug mode.
    pub rules: Vec<String>,
    /// Token dump records, in scan order.
    pub tokens: Vec<String>,
}

/// Runs the lexer and parser over one source.
///
/// The caller opens the source and the destination and closes them; the front
/// end only reads from and writes to the handles it is given.
pub struct FrontEnd {
    debug: bool,
    logger: Logger,
}

impl FrontEnd {
    pub fn new(debug: bool, logger: Logger) -> Self {
        Self { debug, logger }
    }

    /// Check `source` against the grammar. The token dump is written to
    /// `output` unless the source failed to lex.
    pub fn check<R: Read>(&self, source: R, output: &mut dyn Write) -> Result<Report, CompileError> {
        let (report, result) = self.analyze(source, output);
        result.map(|()| report)
    }

    /// Like [`FrontEnd::check`], but hands back the rule trace and the token
    /// records gathered up to the point of failure as well.
    pub fn analyze<R: Read>(
        &self,
        source: R,
        output: &mut dyn Write,
    ) -> (Report, Result<(), CompileError>) {
        let lexer = match Lexer::with_logger(source, output, self.debug, self.logger.clone()) {
            Ok(lexer) => lexer,
            Err(err) => return (Report::default(), Err(err)),
        };
        let mut parser = Parser::new(lexer, self.debug, self.logger.clone());

        let result = parser.run();
        let rules = parser.rules().to_vec();
        let mut lexer = parser.into_lexer();

        let result = match result {
            Ok(()) => lexer.write_output().map(|()| {
                self.logger.debug(
                    "front end finished",
                    json!({ "tokens": lexer.records().len(), "rules": rules.len() }),
                );
            }),
            Err(err) => {
                // A failed dump is logged by `write_output`; the syntax error
                // stays the one reported.
                if err.kind != ErrorKind::Lexical && lexer.write_output().is_err() {
                    self.logger
                        .warning("token dump incomplete", json!({ "source": "FrontEnd::analyze" }));
                }
                Err(err)
            }
        };

        let report = Report {
            rules,
            tokens: lexer.records().to_vec(),
        };
        (report, result)
    }
}

/// Check a source held in memory, without logging or a dump file.
pub fn check_source(source: &str) -> Result<Report, CompileError> {
    FrontEnd::new(false, Logger::disabled()).check(source.as_bytes(), &mut io::sink())
}
