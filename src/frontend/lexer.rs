//! Lexer for Mecha.
//!
//! Pulls characters from a [`SourceBuffer`] (bottom-up, right-to-left) and
//! produces one [`Token`] per call to [`Lexer::next_token`]. Lexemes are
//! collected in scan order; they are un-reversed only for keyword and operator
//! comparison and for display.

use std::io::{Read, Write};

use serde_json::json;

use super::catalog::{self, DOUBLE_QUOTE, SINGLE_QUOTE};
use super::error::{CompileError, ErrorKind, INVALID_MONODRONE};
use super::source::{unreverse, SourceBuffer, LINE_BREAK};
use super::token::{Position, Token, TokenKind};
use crate::logger::{Level, Logger};

pub struct Lexer<'a> {
    buffer: SourceBuffer,
    output: &'a mut dyn Write,
    logger: Logger,
    debug: bool,
    /// Set between a `*/` and the `/*` that opens it.
    comment_block: bool,
    /// Position of the last character folded into a lexeme.
    start: Position,
    last: Option<Token>,
    error: Option<CompileError>,
    identified: Vec<String>,
}

impl<'a> Lexer<'a> {
    /// Load `source` and stage the first character. The handles stay owned by
    /// the caller; the lexer never closes them.
    pub fn new<R: Read>(
        source: R,
        output: &'a mut dyn Write,
        debug: bool,
    ) -> Result<Self, CompileError> {
        let level = if debug { Level::Debug } else { Level::Info };
        Self::with_logger(source, output, debug, Logger::stderr(level))
    }

    pub fn with_logger<R: Read>(
        source: R,
        output: &'a mut dyn Write,
        debug: bool,
        logger: Logger,
    ) -> Result<Self, CompileError> {
        let buffer = SourceBuffer::read(source).map_err(|e| {
            let err = CompileError::wrap(ErrorKind::File, "Lexer::new", e);
            logger.error(&err, json!({ "source": "Lexer::new" }));
            err
        })?;
        logger.debug("source loaded", json!({ "lines": buffer.line_count() }));

        Ok(Self {
            start: buffer.position(),
            buffer,
            output,
            logger,
            debug,
            comment_block: false,
            last: None,
            error: None,
            identified: Vec::new(),
        })
    }

    /// Produce the next token. Returns an `InputEnd` token once the source is
    /// exhausted, and keeps returning it. After a lexical error every further
    /// call returns the same error.
    pub fn next_token(&mut self) -> Result<Token, CompileError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }

        match self.scan() {
            Ok(token) => {
                if token.kind != TokenKind::InputEnd {
                    self.identified.push(token.record());
                    if self.debug {
                        self.logger.debug(
                            "token processed",
                            json!({
                                "token": token.record(),
                                "line": token.line,
                                "column": token.column,
                            }),
                        );
                    }
                }
                self.last = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                let err = CompileError::wrap(ErrorKind::Lexical, "Lexer::next_token", e);
                self.logger.error(
                    &err,
                    json!({
                        "source": "Lexer::next_token",
                        "line": self.buffer.line_text(),
                    }),
                );
                let position = err.position.unwrap_or(self.start);
                self.last = Some(Token::new(TokenKind::LexError, String::new(), position));
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// The most recently produced token.
    pub fn last_token(&self) -> Option<&Token> {
        self.last.as_ref()
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    /// Position of the lookahead character.
    pub fn position(&self) -> Position {
        self.buffer.position()
    }

    /// Every token produced so far, as dump records.
    pub fn records(&self) -> &[String] {
        &self.identified
    }

    /// Write the token dump to the output handle, one record per line.
    pub fn write_output(&mut self) -> Result<(), CompileError> {
        let mut dump = String::new();
        for record in &self.identified {
            dump.push_str(record);
            dump.push('\n');
        }
        self.output
            .write_all(dump.as_bytes())
            .and_then(|_| self.output.flush())
            .map_err(|e| {
                let err = CompileError::io("Lexer::write_output", e);
                self.logger.error(&err, json!(null));
                err
            })?;
        self.logger.debug(
            "token dump written",
            json!({ "tokens": self.identified.len() }),
        );
        Ok(())
    }

    // --- Scanning ---

    fn scan(&mut self) -> Result<Token, CompileError> {
        loop {
            if self.comment_block {
                self.skip_block_comment();
            }
            self.skip_separators();

            let Some(ch) = self.buffer.lookahead() else {
                return Ok(Token::end(self.buffer.position()));
            };

            let token = if ch.is_ascii_alphabetic() || ch == '_' {
                self.word(String::new())?
            } else if ch.is_ascii_digit() {
                self.number()?
            } else if ch == SINGLE_QUOTE || ch == DOUBLE_QUOTE {
                self.quoted(ch)?
            } else {
                self.symbol()?
            };

            match token.kind {
                TokenKind::LineComment => continue,
                TokenKind::BlockCommentClose => {
                    self.comment_block = true;
                    continue;
                }
                TokenKind::BlockCommentOpen => {
                    return Err(CompileError::lex(
                        "Lexer::symbol",
                        "'/*' is never closed",
                        token.position(),
                    ));
                }
                _ => return Ok(token),
            }
        }
    }

    /// Fold the lookahead into `lexeme` and move on.
    fn bump(&mut self, lexeme: &mut String) {
        if let Some(ch) = self.buffer.lookahead() {
            self.start = self.buffer.position();
            lexeme.push(ch);
            self.buffer.advance();
        }
    }

    fn skip_separators(&mut self) {
        while matches!(self.buffer.lookahead(), Some(' ' | '\t' | '\r' | LINE_BREAK)) {
            self.buffer.advance();
        }
    }

    /// Skip to the `/*` that opens the current comment, reached as `*` then `/`.
    fn skip_block_comment(&mut self) {
        while let Some(ch) = self.buffer.lookahead() {
            self.buffer.advance();
            if ch == '*' && self.buffer.lookahead() == Some('/') {
                self.buffer.advance();
                self.comment_block = false;
                return;
            }
        }
    }

    fn word(&mut self, mut lexeme: String) -> Result<Token, CompileError> {
        while let Some(ch) = self.buffer.lookahead() {
            if !(ch.is_ascii_alphanumeric() || ch == '_') {
                break;
            }
            self.bump(&mut lexeme);
        }

        let text = unreverse(&lexeme);
        if text.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CompileError::lex(
                "Lexer::word",
                format!("identifier '{text}' cannot start with a digit"),
                self.start,
            ));
        }
        let kind = catalog::keyword(&text.to_ascii_uppercase()).unwrap_or(TokenKind::Identifier);
        Ok(Token::new(kind, lexeme, self.start))
    }

    fn number(&mut self) -> Result<Token, CompileError> {
        let mut lexeme = String::new();
        self.digits(&mut lexeme);

        match self.buffer.lookahead() {
            // digits at the end of a name, e.g. `x1`
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => return self.word(lexeme),
            Some('.') => {}
            _ => return Ok(Token::new(TokenKind::GearLiteral, lexeme, self.start)),
        }

        self.bump(&mut lexeme);
        if !self.buffer.lookahead().is_some_and(|c| c.is_ascii_digit()) {
            return Err(CompileError::lex(
                "Lexer::number",
                format!("malformed Tensor literal '{}'", unreverse(&lexeme)),
                self.start,
            ));
        }
        self.digits(&mut lexeme);

        if self.buffer.lookahead() == Some('.') {
            let position = self.buffer.position();
            self.bump(&mut lexeme);
            self.digits(&mut lexeme);
            return Err(CompileError::lex(
                "Lexer::number",
                format!("malformed Tensor literal '{}': more than one '.'", unreverse(&lexeme)),
                position,
            ));
        }
        Ok(Token::new(TokenKind::TensorLiteral, lexeme, self.start))
    }

    fn digits(&mut self, lexeme: &mut String) {
        while self.buffer.lookahead().is_some_and(|c| c.is_ascii_digit()) {
            self.bump(lexeme);
        }
    }

    /// A quoted literal. The quote met first is the closing one in source.
    fn quoted(&mut self, quote: char) -> Result<Token, CompileError> {
        let opened_at = self.buffer.position();
        let mut lexeme = String::new();
        self.bump(&mut lexeme);

        let mut enclosed = 0usize;
        loop {
            match self.buffer.lookahead() {
                None => {
                    return Err(CompileError::lex(
                        "Lexer::quoted",
                        format!("unterminated literal, missing opening {quote}"),
                        opened_at,
                    ));
                }
                Some(ch) if ch == quote => {
                    self.bump(&mut lexeme);
                    break;
                }
                Some(ch) => {
                    if quote == SINGLE_QUOTE && (enclosed == 1 || ch == LINE_BREAK) {
                        return Err(CompileError::token(
                            "Lexer::quoted",
                            INVALID_MONODRONE,
                            self.buffer.position(),
                        ));
                    }
                    self.bump(&mut lexeme);
                    enclosed += 1;
                }
            }
        }

        if quote == SINGLE_QUOTE {
            if enclosed != 1 {
                return Err(CompileError::token("Lexer::quoted", INVALID_MONODRONE, self.start));
            }
            return Ok(Token::new(TokenKind::MonodroneLiteral, lexeme, self.start));
        }
        Ok(Token::new(TokenKind::OmnidroneLiteral, lexeme, self.start))
    }

    /// One- or two-character symbol. The second character is taken when the
    /// pair, read in source order, is a catalogued two-character symbol.
    fn symbol(&mut self) -> Result<Token, CompileError> {
        let mut lexeme = String::new();
        let Some(first) = self.buffer.lookahead() else {
            return Ok(Token::end(self.buffer.position()));
        };
        let position = self.buffer.position();
        self.bump(&mut lexeme);

        if let Some(second) = self.buffer.lookahead() {
            let pair = unreverse(&format!("{first}{second}"));
            if catalog::double_symbol(&pair).is_some() {
                self.bump(&mut lexeme);
            }
        }

        if let Some(kind) = catalog::double_symbol(&unreverse(&lexeme)) {
            return Ok(Token::new(kind, lexeme, self.start));
        }

        match catalog::single_symbol(first) {
            Some(kind) => Ok(Token::new(kind, lexeme, position)),
            None => Err(CompileError::lex(
                "Lexer::symbol",
                format!(
                    "unknown token '{first}' on line {}, column {}: <{}>",
                    position.line,
                    position.column,
                    self.buffer.line_text()
                ),
                position,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexer<'a>(src: &str, out: &'a mut Vec<u8>) -> Lexer<'a> {
        Lexer::with_logger(src.as_bytes(), out, false, Logger::disabled()).unwrap()
    }

    /// All tokens up to end of input, as (kind, source text).
    fn tokens(src: &str) -> Vec<(TokenKind, String)> {
        let mut out = Vec::new();
        let mut lex = lexer(src, &mut out);
        let mut result = Vec::new();
        loop {
            let token = lex.next_token().unwrap();
            if token.kind == TokenKind::InputEnd {
                break;
            }
            result.push((token.kind, token.text()));
        }
        result
    }

    fn lex_error(src: &str) -> CompileError {
        let mut out = Vec::new();
        let mut lex = lexer(src, &mut out);
        loop {
            match lex.next_token() {
                Ok(t) if t.kind == TokenKind::InputEnd => panic!("no error in {src:?}"),
                Ok(_) => {}
                Err(e) => return e,
            }
        }
    }

    #[test]
    fn every_keyword_round_trips() {
        for (spelling, kind) in catalog::KEYWORDS {
            assert_eq!(tokens(spelling), vec![(kind, spelling.to_string())]);
        }
    }

    #[test]
    fn keywords_ignore_case_but_keep_spelling() {
        assert_eq!(
            tokens("Construct"),
            vec![(TokenKind::Construct, "Construct".to_string())]
        );
        assert_eq!(tokens("gear"), vec![(TokenKind::GearType, "gear".to_string())]);
    }

    #[test]
    fn tokens_arrive_right_to_left() {
        let kinds: Vec<TokenKind> = tokens("x : Gear =: 5").into_iter().map(|t| t.0).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::GearLiteral,
                TokenKind::Declaration,
                TokenKind::GearType,
                TokenKind::Colon,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn identifiers_with_digits_and_underscores() {
        assert_eq!(tokens("x1"), vec![(TokenKind::Identifier, "x1".to_string())]);
        assert_eq!(
            tokens("_tmp_2"),
            vec![(TokenKind::Identifier, "_tmp_2".to_string())]
        );
        assert_eq!(tokens("a1b"), vec![(TokenKind::Identifier, "a1b".to_string())]);
    }

    #[test]
    fn identifier_starting_with_digit_is_rejected() {
        let err = lex_error("1abc");
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert!(err.message.contains("cannot start with a digit"));
    }

    #[test]
    fn integers_are_gears() {
        for digits in ["0", "7", "42", "1234567890"] {
            assert_eq!(tokens(digits), vec![(TokenKind::GearLiteral, digits.to_string())]);
        }
    }

    #[test]
    fn decimals_are_tensors() {
        for src in ["3.14", "0.5", "10.01"] {
            assert_eq!(tokens(src), vec![(TokenKind::TensorLiteral, src.to_string())]);
        }
    }

    #[test]
    fn second_dot_is_rejected() {
        let err = lex_error("1.2.3");
        assert!(err.message.contains("more than one '.'"));
    }

    #[test]
    fn dot_needs_digits_on_both_sides() {
        assert!(lex_error(".5").message.contains("malformed Tensor literal"));
        assert_eq!(lex_error("5.").kind, ErrorKind::Lexical);
    }

    #[test]
    fn monodrone_with_one_character() {
        assert_eq!(
            tokens("'a'"),
            vec![(TokenKind::MonodroneLiteral, "'a'".to_string())]
        );
    }

    #[test]
    fn monodrone_with_more_characters_fails() {
        let err = lex_error("'ab'");
        assert_eq!(err.message, INVALID_MONODRONE);
        assert_eq!(err.root().kind, ErrorKind::Token);
        assert_eq!(lex_error("''").message, INVALID_MONODRONE);
    }

    #[test]
    fn omnidrone_of_any_length() {
        for src in ["\"\"", "\"x\"", "\"hello, mecha world\"", "\"a'b // c\""] {
            assert_eq!(
                tokens(src),
                vec![(TokenKind::OmnidroneLiteral, src.to_string())]
            );
        }
    }

    #[test]
    fn unterminated_literal_fails() {
        let err = lex_error("x \"abc");
        assert!(err.message.contains("unterminated literal"));
    }

    #[test]
    fn every_two_character_symbol() {
        for (spelling, kind) in catalog::DOUBLE_SYMBOLS {
            if matches!(
                kind,
                TokenKind::LineComment | TokenKind::BlockCommentOpen | TokenKind::BlockCommentClose
            ) {
                continue;
            }
            let src = format!("a {spelling} b");
            assert_eq!(
                tokens(&src),
                vec![
                    (TokenKind::Identifier, "b".to_string()),
                    (kind, spelling.to_string()),
                    (TokenKind::Identifier, "a".to_string()),
                ],
                "operator {spelling}"
            );
        }
    }

    #[test]
    fn two_character_symbols_without_spaces() {
        assert_eq!(
            tokens("a>=b"),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::GreaterEqual, ">=".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
        assert_eq!(
            tokens("x=:1"),
            vec![
                (TokenKind::GearLiteral, "1".to_string()),
                (TokenKind::Declaration, "=:".to_string()),
                (TokenKind::Identifier, "x".to_string()),
            ]
        );
    }

    #[test]
    fn reversed_pairs_are_not_operators() {
        let kinds: Vec<TokenKind> = tokens("a =< b").into_iter().map(|t| t.0).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Assignment,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn single_character_symbols() {
        for (symbol, kind) in catalog::SINGLE_SYMBOLS {
            assert_eq!(tokens(&symbol.to_string()), vec![(kind, symbol.to_string())]);
        }
    }

    #[test]
    fn unknown_symbol_reports_position_and_line() {
        let err = lex_error("x = 1 @ 2");
        assert_eq!(err.kind, ErrorKind::Lexical);
        assert_eq!(err.position, Some(Position::new(1, 7)));
        assert!(err.message.contains("'@'"));
        assert!(err.message.contains("<x = 1 @ 2>"));
    }

    #[test]
    fn error_is_sticky() {
        let mut out = Vec::new();
        let mut lex = lexer("a $", &mut out);
        let first = lex.next_token().unwrap_err();
        let second = lex.next_token().unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
        assert!(lex.failed());
        assert_eq!(lex.last_token().map(|t| t.kind), Some(TokenKind::LexError));
    }

    #[test]
    fn line_comment_is_transparent() {
        let src = "skipped\nfirst\nx = 1 // trailing text, ignored\nlast";
        assert_eq!(
            tokens(src),
            vec![
                (TokenKind::Identifier, "last".to_string()),
                (TokenKind::GearLiteral, "1".to_string()),
                (TokenKind::Assignment, "=".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Identifier, "first".to_string()),
            ]
        );
    }

    #[test]
    fn comment_only_line_is_skipped() {
        let src = "skipped\nfirst\n// nothing here\nlast";
        assert_eq!(
            tokens(src),
            vec![
                (TokenKind::Identifier, "last".to_string()),
                (TokenKind::Identifier, "first".to_string()),
            ]
        );
    }

    #[test]
    fn block_comment_spanning_lines() {
        let src = "skipped\na /* one\ntwo\nthree */ b";
        assert_eq!(
            tokens(src),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
    }

    #[test]
    fn block_comment_with_stars() {
        assert_eq!(
            tokens("a /** note **/ b"),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
    }

    #[test]
    fn unclosed_block_comment_fails() {
        let err = lex_error("a /* b");
        assert!(err.message.contains("never closed"));
    }

    #[test]
    fn block_comment_may_hold_line_markers() {
        assert_eq!(
            tokens("a /* see http://example.com */ b"),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
    }

    #[test]
    fn block_comment_spanning_lines_may_hold_line_markers() {
        let src = "skipped\na /* one\ntwo // three\n*/ b";
        assert_eq!(
            tokens(src),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
    }

    #[test]
    fn apostrophe_in_block_comment_before_line_comment() {
        assert_eq!(
            tokens("a /* don't */ b // it's fine"),
            vec![
                (TokenKind::Identifier, "b".to_string()),
                (TokenKind::Identifier, "a".to_string()),
            ]
        );
    }

    #[test]
    fn omnidrone_spanning_lines_may_hold_line_markers() {
        let src = "skipped\nx = \"one\ntwo // three\" // note";
        let toks = tokens(src);
        assert_eq!(
            toks[0],
            (TokenKind::OmnidroneLiteral, "\"one\ntwo // three\"".to_string())
        );
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn lines_separate_tokens() {
        let src = "skipped\nabc\ndef";
        assert_eq!(
            tokens(src),
            vec![
                (TokenKind::Identifier, "def".to_string()),
                (TokenKind::Identifier, "abc".to_string()),
            ]
        );
    }

    #[test]
    fn omnidrone_may_span_lines() {
        let src = "skipped\nx = \"one\ntwo\"";
        let toks = tokens(src);
        assert_eq!(toks[0], (TokenKind::OmnidroneLiteral, "\"one\ntwo\"".to_string()));
        assert_eq!(toks.len(), 3);
    }

    #[test]
    fn token_positions_point_at_source_start() {
        let mut out = Vec::new();
        let mut lex = lexer("skip\n  count = 42", &mut out);
        let number = lex.next_token().unwrap();
        assert_eq!((number.line, number.column), (2, 11));
        let _assign = lex.next_token().unwrap();
        let name = lex.next_token().unwrap();
        assert_eq!((name.line, name.column), (2, 3));
    }

    #[test]
    fn end_of_input_repeats() {
        let mut out = Vec::new();
        let mut lex = lexer("x", &mut out);
        assert_eq!(lex.next_token().unwrap().kind, TokenKind::Identifier);
        assert_eq!(lex.next_token().unwrap().kind, TokenKind::InputEnd);
        assert_eq!(lex.next_token().unwrap().kind, TokenKind::InputEnd);
    }

    #[test]
    fn dump_records_are_unreversed() {
        let mut out = Vec::new();
        {
            let mut lex = lexer("count =: 3.5", &mut out);
            while lex.next_token().unwrap().kind != TokenKind::InputEnd {}
            assert_eq!(
                lex.records(),
                &[
                    "T_TENSOR ( 3.5 )".to_string(),
                    "T_DECLARATION_OPERATOR ( =: )".to_string(),
                    "T_ID ( count )".to_string(),
                ]
            );
            lex.write_output().unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "T_TENSOR ( 3.5 )\nT_DECLARATION_OPERATOR ( =: )\nT_ID ( count )\n"
        );
    }

    #[test]
    fn new_loads_source_and_writes_to_destination() {
        let mut out = Vec::new();
        {
            let mut lex = Lexer::new("x = 1".as_bytes(), &mut out, false).unwrap();
            assert_eq!(lex.next_token().unwrap().kind, TokenKind::GearLiteral);
            assert_eq!(lex.next_token().unwrap().kind, TokenKind::Assignment);
            assert_eq!(lex.next_token().unwrap().kind, TokenKind::Identifier);
            assert_eq!(lex.next_token().unwrap().kind, TokenKind::InputEnd);
            lex.write_output().unwrap();
        }
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "T_GEAR ( 1 )\nT_ATTRIBUTION_OPERATOR ( = )\nT_ID ( x )\n"
        );
    }

    #[test]
    fn new_rejects_an_empty_source() {
        let mut out = Vec::new();
        let err = Lexer::new("".as_bytes(), &mut out, false).err().expect("error");
        assert_eq!(err.kind, ErrorKind::File);
        assert_eq!(err.context, "Lexer::new");
        assert_eq!(err.message, crate::frontend::error::EMPTY_FILE);
    }

    #[test]
    fn empty_source_fails_construction() {
        let mut out = Vec::new();
        let result = Lexer::with_logger("".as_bytes(), &mut out, false, Logger::disabled());
        let err = result.err().expect("error");
        assert_eq!(err.kind, ErrorKind::File);
        assert_eq!(err.root().message, crate::frontend::error::EMPTY_FILE);
    }
}
