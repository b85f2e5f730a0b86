//! Token types for the Mecha front end.
//!
//! Token kinds carry explicit numeric values grouped in bands of one hundred.
//! The display classifier in [`super::catalog`] dispatches on band membership,
//! so new kinds must be added inside their band.

use std::fmt;

use super::catalog;
use super::source::unreverse;

/// A 1-based line/column pair in source coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// A token produced by the lexer.
///
/// `lexeme` is stored in scan order (right to left). Use [`Token::text`] for
/// anything a human reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: String, position: Position) -> Self {
        Self {
            kind,
            lexeme,
            line: position.line,
            column: position.column,
        }
    }

    /// The end-of-input marker.
    pub fn end(position: Position) -> Self {
        Self::new(TokenKind::InputEnd, String::new(), position)
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    /// The lexeme in source order.
    pub fn text(&self) -> String {
        unreverse(&self.lexeme)
    }

    /// How the token is named in diagnostics.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::InputEnd => "end of input".to_string(),
            _ => format!("'{}'", self.text()),
        }
    }

    /// One line of the token dump: `T_<KIND> ( <lexeme> )`.
    pub fn record(&self) -> String {
        format!("{} ( {} )", catalog::display_name(self.kind), self.text())
    }
}

/// Contiguous groups of token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBand {
    Construction,
    Control,
    Structure,
    Operator,
    Type,
    Builtin,
    Marker,
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TokenKind {
    // Construction
    Construct = 1,
    Architect = 2,
    Integrate = 3,
    Comma = 4,
    Colon = 5,
    MonodroneLiteral = 6, // 'c'
    OmnidroneLiteral = 7, // "text"

    // Conditional and repetition
    If = 101,
    Else = 102,
    Elif = 103,
    For = 104,
    Detach = 105,

    // Structure
    OpenParen = 201,
    CloseParen = 202,
    OpenBrace = 203,
    CloseBrace = 204,
    LineComment = 205,
    BlockCommentOpen = 206,
    BlockCommentClose = 207,

    // Operators
    Greater = 301,
    Less = 302,
    GreaterEqual = 303,
    LessEqual = 304,
    Equal = 305,
    NotEqual = 306,
    Add = 307,
    Sub = 308,
    Mul = 309,
    Div = 310,
    Mod = 311,
    And = 312,
    Or = 313,
    Not = 314,
    Declaration = 315, // =:
    Assignment = 316,  // =

    // Literals and types
    Nil = 401,
    GearLiteral = 402,
    TensorLiteral = 403,
    GearType = 404,
    TensorType = 405,
    StateType = 406,
    MonodroneType = 407,
    OmnidroneType = 408,
    Identifier = 409,

    // Built-in functions
    Send = 501,
    Receive = 502,

    // Control markers
    InputEnd = 601,
    LexError = 602,
}

impl TokenKind {
    pub fn value(self) -> u16 {
        self as u16
    }

    pub fn band(self) -> TokenBand {
        match self.value() {
            1..=100 => TokenBand::Construction,
            101..=200 => TokenBand::Control,
            201..=300 => TokenBand::Structure,
            301..=400 => TokenBand::Operator,
            401..=500 => TokenBand::Type,
            501..=600 => TokenBand::Builtin,
            _ => TokenBand::Marker,
        }
    }

    /// Kinds accepted by `<TYPE>`.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            TokenKind::Nil
                | TokenKind::GearType
                | TokenKind::TensorType
                | TokenKind::StateType
                | TokenKind::MonodroneType
                | TokenKind::OmnidroneType
        )
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            TokenKind::Greater
                | TokenKind::GreaterEqual
                | TokenKind::Less
                | TokenKind::LessEqual
                | TokenKind::Equal
                | TokenKind::NotEqual
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::GearLiteral
                | TokenKind::TensorLiteral
                | TokenKind::MonodroneLiteral
                | TokenKind::OmnidroneLiteral
                | TokenKind::Nil
        )
    }

    /// Whether a token of this kind can be the last token of an operand in
    /// source order, which makes it the first one the parser meets.
    pub fn ends_operand(self) -> bool {
        self.is_literal() || matches!(self, TokenKind::Identifier | TokenKind::CloseParen)
    }
}
