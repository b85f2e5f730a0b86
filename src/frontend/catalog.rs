//! Token catalog — the reserved words and symbols of Mecha.
//!
//! All tables are spelled in source order. Callers un-reverse scanned text
//! before looking anything up.

use super::token::{TokenBand, TokenKind};

/// Reserved words, upper-cased.
pub const KEYWORDS: [(&str, TokenKind); 16] = [
    ("CONSTRUCT", TokenKind::Construct),
    ("ARCHITECT", TokenKind::Architect),
    ("INTEGRATE", TokenKind::Integrate),
    ("IF", TokenKind::If),
    ("ELSE", TokenKind::Else),
    ("ELIF", TokenKind::Elif),
    ("FOR", TokenKind::For),
    ("DETACH", TokenKind::Detach),
    ("NIL", TokenKind::Nil),
    ("GEAR", TokenKind::GearType),
    ("TENSOR", TokenKind::TensorType),
    ("STATE", TokenKind::StateType),
    ("MONODRONE", TokenKind::MonodroneType),
    ("OMNIDRONE", TokenKind::OmnidroneType),
    ("SEND", TokenKind::Send),
    ("RECEIVE", TokenKind::Receive),
];

pub const SINGLE_SYMBOLS: [(char, TokenKind); 15] = [
    (',', TokenKind::Comma),
    (':', TokenKind::Colon),
    ('(', TokenKind::OpenParen),
    (')', TokenKind::CloseParen),
    ('{', TokenKind::OpenBrace),
    ('}', TokenKind::CloseBrace),
    ('>', TokenKind::Greater),
    ('<', TokenKind::Less),
    ('+', TokenKind::Add),
    ('-', TokenKind::Sub),
    ('*', TokenKind::Mul),
    ('/', TokenKind::Div),
    ('%', TokenKind::Mod),
    ('!', TokenKind::Not),
    ('=', TokenKind::Assignment),
];

pub const DOUBLE_SYMBOLS: [(&str, TokenKind); 10] = [
    ("//", TokenKind::LineComment),
    ("/*", TokenKind::BlockCommentOpen),
    ("*/", TokenKind::BlockCommentClose),
    (">=", TokenKind::GreaterEqual),
    ("<=", TokenKind::LessEqual),
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEqual),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("=:", TokenKind::Declaration),
];

pub const SINGLE_QUOTE: char = '\'';
pub const DOUBLE_QUOTE: char = '"';

/// Look up an upper-cased word.
pub fn keyword(word: &str) -> Option<TokenKind> {
    KEYWORDS
        .iter()
        .find(|(spelling, _)| *spelling == word)
        .map(|&(_, kind)| kind)
}

pub fn single_symbol(ch: char) -> Option<TokenKind> {
    SINGLE_SYMBOLS
        .iter()
        .find(|(symbol, _)| *symbol == ch)
        .map(|&(_, kind)| kind)
}

/// Look up a two-character operator or comment marker. Case-sensitive.
pub fn double_symbol(symbol: &str) -> Option<TokenKind> {
    DOUBLE_SYMBOLS
        .iter()
        .find(|(spelling, _)| *spelling == symbol)
        .map(|&(_, kind)| kind)
}

/// The `T_<KIND>` name used in the token dump.
pub fn display_name(kind: TokenKind) -> &'static str {
    match kind.band() {
        TokenBand::Construction => construction_name(kind),
        TokenBand::Control => control_name(kind),
        TokenBand::Structure => structure_name(kind),
        TokenBand::Operator => operator_name(kind),
        TokenBand::Type => type_name(kind),
        TokenBand::Builtin => builtin_name(kind),
        TokenBand::Marker => marker_name(kind),
    }
}

fn construction_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Construct => "T_CONSTRUCT",
        TokenKind::Architect => "T_ARCHITECT",
        TokenKind::Integrate => "T_INTEGRATE",
        TokenKind::Comma => "T_COMMA",
        TokenKind::Colon => "T_COLON",
        TokenKind::MonodroneLiteral => "T_MONODRONE",
        TokenKind::OmnidroneLiteral => "T_OMNIDRONE",
        _ => "N/A",
    }
}

fn control_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::If => "T_IF",
        TokenKind::Else => "T_ELSE",
        TokenKind::Elif => "T_ELIF",
        TokenKind::For => "T_FOR",
        TokenKind::Detach => "T_DETACH",
        _ => "N/A",
    }
}

fn structure_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::OpenParen => "T_OPEN_PARENTHESES",
        TokenKind::CloseParen => "T_CLOSE_PARENTHESES",
        TokenKind::OpenBrace => "T_OPEN_BRACES",
        TokenKind::CloseBrace => "T_CLOSE_BRACES",
        TokenKind::LineComment => "T_SINGLE_LINE_COMMENT",
        TokenKind::BlockCommentOpen => "T_OPEN_MULTILINE_COMMENT",
        TokenKind::BlockCommentClose => "T_CLOSE_MULTILINE_COMMENT",
        _ => "N/A",
    }
}

fn operator_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Greater => "T_GREATER_THAN_OPERATOR",
        TokenKind::GreaterEqual => "T_GREATER_EQUAL_OPERATOR",
        TokenKind::Less => "T_LESS_THAN_OPERATOR",
        TokenKind::LessEqual => "T_LESS_EQUAL_OPERATOR",
        TokenKind::Equal => "T_EQUAL_OPERATOR",
        TokenKind::NotEqual => "T_NOT_EQUAL_OPERATOR",
        TokenKind::Add => "T_ADDITION_OPERATOR",
        TokenKind::Sub => "T_SUBTRACTION_OPERATOR",
        TokenKind::Mul => "T_MULTIPLICATION_OPERATOR",
        TokenKind::Div => "T_DIVISION_OPERATOR",
        TokenKind::Mod => "T_MODULE_OPERATOR",
        TokenKind::And => "T_AND_OPERATOR",
        TokenKind::Or => "T_OR_OPERATOR",
        TokenKind::Not => "T_NOT_OPERATOR",
        TokenKind::Declaration => "T_DECLARATION_OPERATOR",
        TokenKind::Assignment => "T_ATTRIBUTION_OPERATOR",
        _ => "N/A",
    }
}

fn type_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Nil => "T_NIL",
        TokenKind::GearLiteral | TokenKind::GearType => "T_GEAR",
        TokenKind::TensorLiteral | TokenKind::TensorType => "T_TENSOR",
        TokenKind::StateType => "T_STATE",
        TokenKind::MonodroneType => "T_MONODRONE",
        TokenKind::OmnidroneType => "T_OMNIDRONE",
        TokenKind::Identifier => "T_ID",
        _ => "N/A",
    }
}

fn builtin_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::Send => "T_SEND",
        TokenKind::Receive => "T_RECEIVE",
        _ => "N/A",
    }
}

fn marker_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::InputEnd => "T_INPUT_END",
        TokenKind::LexError => "T_LEX_ERROR",
        _ => "N/A",
    }
}
