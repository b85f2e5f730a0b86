//! Parser for Mecha.
//!
//! Recursive descent over the token stream the lexer produces. The lexer
//! scans right to left, so each production is matched from its last token
//! (in source order) back to its first. Productions are written below in
//! source order; the code reads them backwards.
//!
//! ```text
//! G           ::= '{' BODY '}' ID 'Construct'
//! BODY        ::= ( '{' CMDS '}' [TYPE] '(' [PARAMS_DECL] ')' ID 'Architect' )*
//! PARAMS_DECL ::= ID ':' TYPE ( ',' ID ':' TYPE )*
//! CMDS        ::= CMD+
//! CMD         ::= CMD_IF | CMD_FOR | CMD_DECLARATION | CMD_ASSIGNMENT
//!               | CMD_RECEIVE | CMD_SEND | CMD_INTEGRATE | CMD_CALL | 'detach'
//! E           ::= T ( ('+' | '-') T )*
//! T           ::= F ( ('*' | '/' | '%') F )*
//! F           ::= '-' F | X
//! X           ::= '(' E ')' | literal | 'Nil' | VAR | [ID] '(' PARAMS_CALL ')'
//! ```

use serde_json::json;

use super::error::{CompileError, ErrorKind};
use super::lexer::Lexer;
use super::token::{Position, Token, TokenKind};
use crate::logger::Logger;

/// What an expression turned out to be, as far as statements care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    Variable,
    Literal,
    /// `ID '(' ... ')'`
    Call,
    /// `'(' E (',' E)* ')'` without a callee. `variable` is set when the
    /// group holds exactly one bare variable.
    Group { args: usize, variable: bool },
    /// Anything built with an operator.
    Compound,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    error: Option<CompileError>,
    /// Recognized productions, kept only in debug mode.
    rules: Option<Vec<String>>,
    logger: Logger,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer<'a>, debug: bool, logger: Logger) -> Self {
        let current = Token::end(lexer.position());
        Self {
            lexer,
            current,
            error: None,
            rules: debug.then(Vec::new),
            logger,
        }
    }

    /// Prime the first token and parse `G`. Returns the first error met, which
    /// stays latched: running again reports the same error.
    pub fn run(&mut self) -> Result<(), CompileError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        self.current = match self.lexer.next_token() {
            Ok(token) => token,
            Err(e) => return Err(self.latch(e)),
        };
        self.program()?;

        self.logger.debug(
            "grammar matched",
            json!({ "rules": self.rules.as_ref().map(Vec::len) }),
        );
        Ok(())
    }

    /// The first error of this parse, if any.
    pub fn error(&self) -> Option<&CompileError> {
        self.error.as_ref()
    }

    /// Productions recognized so far; empty unless debug mode is on.
    pub fn rules(&self) -> &[String] {
        self.rules.as_deref().unwrap_or(&[])
    }

    pub fn into_lexer(self) -> Lexer<'a> {
        self.lexer
    }

    // --- Grammar ---

    fn program(&mut self) -> Result<(), CompileError> {
        self.rule("<G> ::= '{' <BODY> '}' <ID> 'Construct'");
        self.expect(TokenKind::Construct, "'Construct'")?;
        self.expect(TokenKind::Identifier, "an identifier")?;
        self.expect(TokenKind::CloseBrace, "'}'")?;

        self.rule("<BODY> ::= ( <ARCHITECT> )*");
        while self.at(TokenKind::Architect) {
            self.architect()?;
        }

        // End of input here is the start of the source: the opening brace sat
        // on the first line, which is never scanned.
        match self.current.kind {
            TokenKind::InputEnd => Ok(()),
            TokenKind::OpenBrace => {
                self.advance()?;
                if self.at(TokenKind::InputEnd) {
                    Ok(())
                } else {
                    Err(self.fail("end of input"))
                }
            }
            _ => Err(self.fail("'Architect' or '{'")),
        }
    }

    fn architect(&mut self) -> Result<(), CompileError> {
        self.rule("<ARCHITECT> ::= '{' <CMDS> '}' [<TYPE>] '(' [<PARAMS_DECL>] ')' <ID> 'Architect'");
        self.expect(TokenKind::Architect, "'Architect'")?;
        self.expect(TokenKind::Identifier, "an identifier")?;
        self.expect(TokenKind::CloseParen, "')'")?;
        if !self.at(TokenKind::OpenParen) {
            self.params_decl()?;
        }
        self.expect(TokenKind::OpenParen, "'('")?;
        if self.current.kind.is_type() {
            self.type_name()?;
        }
        self.block()
    }

    fn params_decl(&mut self) -> Result<(), CompileError> {
        self.rule("<PARAMS_DECL> ::= <ID> ':' <TYPE> ( ',' <ID> ':' <TYPE> )*");
        loop {
            self.type_name()?;
            self.expect(TokenKind::Colon, "':'")?;
            self.expect(TokenKind::Identifier, "an identifier")?;
            if !self.at(TokenKind::Comma) {
                return Ok(());
            }
            self.advance()?;
        }
    }

    fn type_name(&mut self) -> Result<(), CompileError> {
        self.rule("<TYPE> ::= 'Nil' | 'Gear' | 'Tensor' | 'State' | 'Monodrone' | 'Omnidrone'");
        if self.current.kind.is_type() {
            self.advance()
        } else {
            Err(self.fail("a type"))
        }
    }

    /// `'{' CMDS '}'`
    fn block(&mut self) -> Result<(), CompileError> {
        self.expect(TokenKind::CloseBrace, "'}'")?;
        self.commands()?;
        self.expect(TokenKind::OpenBrace, "'{'")
    }

    fn commands(&mut self) -> Result<(), CompileError> {
        self.rule("<CMDS> ::= <CMD>+");
        loop {
            self.command()?;
            if self.at(TokenKind::OpenBrace) || self.at(TokenKind::InputEnd) {
                return Ok(());
            }
        }
    }

    fn command(&mut self) -> Result<(), CompileError> {
        self.rule("<CMD> ::= <CMD_IF> | <CMD_FOR> | <CMD_DECLARATION> | <CMD_ASSIGNMENT> | <CMD_RECEIVE> | <CMD_SEND> | <CMD_INTEGRATE> | <CMD_CALL> | <CMD_DETACH>");
        match self.current.kind {
            TokenKind::CloseBrace => self.branch(),
            TokenKind::Detach => {
                self.rule("<CMD_DETACH> ::= 'detach'");
                self.advance()
            }
            kind if kind.ends_operand() => self.expression_command(),
            _ => Err(self.fail("a command")),
        }
    }

    /// `if`, `elif`, `else` and `for` all end with a block, so they are told
    /// apart by the keyword met after the condition.
    fn branch(&mut self) -> Result<(), CompileError> {
        self.block()?;
        let mut chained = false;
        if self.at(TokenKind::Else) {
            self.advance()?;
            self.block()?;
            chained = true;
        }

        loop {
            self.condition()?;
            match self.current.kind {
                TokenKind::If => {
                    self.rule("<CMD_IF> ::= 'if' <CONDITION> '{' <CMDS> '}' ( 'elif' <CONDITION> '{' <CMDS> '}' )* [ 'else' '{' <CMDS> '}' ]");
                    return self.advance();
                }
                TokenKind::Elif => {
                    self.advance()?;
                    self.block()?;
                    chained = true;
                }
                TokenKind::For if !chained => {
                    self.rule("<CMD_FOR> ::= 'for' <CONDITION> '{' <CMDS> '}'");
                    return self.advance();
                }
                _ if chained => return Err(self.fail("'if' or 'elif'")),
                _ => return Err(self.fail("'if', 'elif' or 'for'")),
            }
        }
    }

    fn condition(&mut self) -> Result<(), CompileError> {
        self.rule("<CONDITION> ::= <E> ('>' | '>=' | '<' | '<=' | '==' | '!=') <E>");
        self.expression()?;
        if !self.current.kind.is_comparison() {
            return Err(self.fail("a comparison operator"));
        }
        self.advance()?;
        self.expression()?;
        Ok(())
    }

    /// Statements that end with an expression: the operator met after it
    /// decides which one.
    fn expression_command(&mut self) -> Result<(), CompileError> {
        let operand = self.expression()?;
        match self.current.kind {
            TokenKind::Declaration => {
                self.rule("<CMD_DECLARATION> ::= <VAR> ':' <TYPE> '=:' <E>");
                self.advance()?;
                self.type_name()?;
                self.expect(TokenKind::Colon, "':'")?;
                self.variable()
            }
            TokenKind::Assignment => {
                self.rule("<CMD_ASSIGNMENT> ::= <VAR> '=' <E>");
                self.advance()?;
                self.variable()
            }
            TokenKind::Receive => {
                if operand != (Operand::Group { args: 1, variable: true }) {
                    return Err(self.fail("a single variable before 'Receive'"));
                }
                self.rule("<CMD_RECEIVE> ::= 'Receive' '(' <VAR> ')'");
                self.advance()
            }
            TokenKind::Send => {
                if !matches!(operand, Operand::Group { args: 1, .. }) {
                    return Err(self.fail("a single argument before 'Send'"));
                }
                self.rule("<CMD_SEND> ::= 'Send' '(' <E> ')'");
                self.advance()
            }
            TokenKind::Integrate => {
                self.rule("<CMD_INTEGRATE> ::= 'Integrate' <E>");
                self.advance()
            }
            _ if matches!(operand, Operand::Call | Operand::Group { .. }) => {
                self.rule("<CMD_CALL> ::= [<ID>] '(' <PARAMS_CALL> ')'");
                Ok(())
            }
            _ => Err(self.fail("'=', '=:' or 'Integrate'")),
        }
    }

    fn variable(&mut self) -> Result<(), CompileError> {
        self.rule("<VAR> ::= <ID>");
        self.expect(TokenKind::Identifier, "an identifier")
    }

    // --- Expressions ---
    //
    // A run of '-' after an operand is resolved once it ends: if an operand
    // follows, the last '-' is binary and the rest are unary. Binary minus is
    // consumed by F, so F and T report it back ("joined") and E parses the
    // next term without looking for '+'.

    fn expression(&mut self) -> Result<Operand, CompileError> {
        self.rule("<E> ::= <T> ( ('+' | '-') <T> )*");
        let (mut operand, mut joined) = self.term()?;
        loop {
            if !joined {
                if !self.at(TokenKind::Add) {
                    return Ok(operand);
                }
                self.advance()?;
            }
            let (_, next) = self.term()?;
            operand = Operand::Compound;
            joined = next;
        }
    }

    fn term(&mut self) -> Result<(Operand, bool), CompileError> {
        self.rule("<T> ::= <F> ( ('*' | '/' | '%') <F> )*");
        let (mut operand, mut joined) = self.factor()?;
        while !joined
            && matches!(
                self.current.kind,
                TokenKind::Mul | TokenKind::Div | TokenKind::Mod
            )
        {
            self.advance()?;
            let (_, next) = self.factor()?;
            operand = Operand::Compound;
            joined = next;
        }
        Ok((operand, joined))
    }

    fn factor(&mut self) -> Result<(Operand, bool), CompileError> {
        self.rule("<F> ::= '-' <F> | <X>");
        let operand = self.operand()?;

        let mut minus = 0;
        while self.at(TokenKind::Sub) {
            self.advance()?;
            minus += 1;
        }
        if minus == 0 {
            return Ok((operand, false));
        }

        let joined = self.current.kind.ends_operand();
        let unary = if joined { minus - 1 } else { minus };
        if unary > 0 {
            Ok((Operand::Compound, joined))
        } else {
            Ok((operand, joined))
        }
    }

    fn operand(&mut self) -> Result<Operand, CompileError> {
        self.rule("<X> ::= '(' <E> ')' | <NUMBER> | <STRING> | 'Nil' | <VAR> | [<ID>] '(' <PARAMS_CALL> ')'");
        match self.current.kind {
            TokenKind::Identifier => {
                self.variable()?;
                Ok(Operand::Variable)
            }
            kind if kind.is_literal() => {
                self.advance()?;
                Ok(Operand::Literal)
            }
            TokenKind::CloseParen => {
                self.advance()?;
                let (args, variable) = if self.at(TokenKind::OpenParen) {
                    (0, false)
                } else {
                    self.params_call()?
                };
                self.expect(TokenKind::OpenParen, "'('")?;

                if self.at(TokenKind::Identifier) {
                    self.advance()?;
                    Ok(Operand::Call)
                } else if args == 0 {
                    Err(self.fail("a callee for '()'"))
                } else {
                    Ok(Operand::Group { args, variable })
                }
            }
            _ => Err(self.fail("an operand")),
        }
    }

    fn params_call(&mut self) -> Result<(usize, bool), CompileError> {
        self.rule("<PARAMS_CALL> ::= <E> ( ',' <E> )*");
        let mut args = 0;
        loop {
            let operand = self.expression()?;
            args += 1;
            if !self.at(TokenKind::Comma) {
                return Ok((args, args == 1 && operand == Operand::Variable));
            }
            self.advance()?;
        }
    }

    // --- Utility methods ---

    fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Move to the next token. Never reads past end of input.
    fn advance(&mut self) -> Result<(), CompileError> {
        if self.at(TokenKind::InputEnd) {
            return Ok(());
        }
        match self.lexer.next_token() {
            Ok(token) => {
                self.current = token;
                Ok(())
            }
            Err(e) => Err(self.latch(e)),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), CompileError> {
        if self.at(kind) {
            self.advance()
        } else {
            Err(self.fail(expected))
        }
    }

    fn fail(&mut self, expected: &str) -> CompileError {
        let err = CompileError::syntax(
            "Parser::run",
            format!("expected {expected}, got {}", self.current.describe()),
            self.position(),
        );
        self.latch(err)
    }

    fn position(&self) -> Position {
        self.current.position()
    }

    /// Keep the first error of the parse and hand it back.
    fn latch(&mut self, err: CompileError) -> CompileError {
        if let Some(first) = &self.error {
            return first.clone();
        }
        if err.kind == ErrorKind::Syntax {
            self.logger.error(
                &err,
                json!({
                    "source": "Parser::run",
                    "lexeme": self.current.text(),
                    "line": self.current.line,
                    "column": self.current.column,
                }),
            );
        }
        self.error = Some(err.clone());
        err
    }

    fn rule(&mut self, production: &str) {
        if let Some(rules) = self.rules.as_mut() {
            rules.push(production.to_string());
            self.logger
                .debug("rule recognized", json!({ "rule": production }));
        }
    }
}
