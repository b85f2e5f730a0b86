//! Error types for the Mecha front end.

use std::error::Error;
use std::fmt;
use std::io;
use std::sync::Arc;

use super::token::Position;

pub const NO_SOURCE_FILE: &str = "no source file was provided";
pub const EMPTY_FILE: &str = "empty file";
pub const INVALID_MONODRONE: &str = "Monodrone must be exactly one character";

/// An error raised while reading, lexing or parsing a source file.
#[derive(Debug, Clone)]
pub struct CompileError {
    pub kind: ErrorKind,
    /// Where the error was raised, e.g. `Lexer::next_token`.
    pub context: String,
    pub message: String,
    pub position: Option<Position>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    File,
    Lexical,
    Syntax,
    Token,
}

impl ErrorKind {
    fn label(self) -> &'static str {
        match self {
            ErrorKind::File => "file error",
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntax => "syntax error",
            ErrorKind::Token => "token error",
        }
    }
}

impl CompileError {
    fn new(kind: ErrorKind, context: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            context: context.into(),
            message: message.into(),
            position: None,
            source: None,
        }
    }

    pub fn file(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::File, context, message)
    }

    /// Wrap an I/O failure, keeping it as the cause.
    pub fn io(context: impl Into<String>, err: io::Error) -> Self {
        let mut error = Self::new(ErrorKind::File, context, err.to_string());
        error.source = Some(Arc::new(err));
        error
    }

    pub fn lex(context: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Lexical, context, message).at(position)
    }

    pub fn syntax(
        context: impl Into<String>,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        Self::new(ErrorKind::Syntax, context, message).at(position)
    }

    pub fn token(context: impl Into<String>, message: impl Into<String>, position: Position) -> Self {
        Self::new(ErrorKind::Token, context, message).at(position)
    }

    /// Re-tag `inner` at a component boundary. The message and position are
    /// carried up, `inner` becomes the cause.
    pub fn wrap(kind: ErrorKind, context: impl Into<String>, inner: CompileError) -> Self {
        Self {
            kind,
            context: context.into(),
            message: inner.message.clone(),
            position: inner.position,
            source: Some(Arc::new(inner)),
        }
    }

    fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// The innermost error of the same family, following `source()`.
    pub fn root(&self) -> &CompileError {
        let mut current = self;
        while let Some(inner) = current
            .source
            .as_deref()
            .and_then(|s| s.downcast_ref::<CompileError>())
        {
            current = inner;
        }
        current
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {} -> {}", self.kind.label(), self.context, self.message)?;
        if let Some(position) = self.position {
            write!(f, " at {position}")?;
        }
        Ok(())
    }
}

impl Error for CompileError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_deref().map(|s| s as &(dyn Error + 'static))
    }
}
