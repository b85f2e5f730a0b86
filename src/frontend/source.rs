//! Source buffer — holds the lines of a source file and a cursor that walks
//! them bottom to top, right to left.
//!
//! The cursor stages exactly one lookahead character. Moving from one line to
//! the one above it stages a `'\n'` first, so lexeme runs never merge across
//! lines by accident. Reaching the first line (index 0) from below ends the
//! input: that line is only ever scanned when it is also the last one.

use std::io::{BufRead, BufReader, Read};

use super::catalog::{DOUBLE_QUOTE, SINGLE_QUOTE};
use super::error::{CompileError, EMPTY_FILE};
use super::token::Position;

/// Put a scanned (right-to-left) string back in source order.
///
/// Every comparison against the catalog and every human-facing rendering goes
/// through here.
pub fn unreverse(scanned: &str) -> String {
    scanned.chars().rev().collect()
}

pub const LINE_BREAK: char = '\n';

pub struct SourceBuffer {
    lines: Vec<Vec<char>>,
    /// How much of each line the cursor scans; see [`code_lens`].
    ends: Vec<usize>,
    line: usize,
    /// Index of the lookahead inside `lines[line]`; -1 while the lookahead is
    /// the line break above the current line.
    pointer: isize,
    lookahead: Option<char>,
}

impl SourceBuffer {
    /// Read every line of `source`. Fails on read errors or when the source
    /// has no lines at all.
    pub fn read<R: Read>(source: R) -> Result<Self, CompileError> {
        let mut lines = Vec::new();
        for line in BufReader::new(source).lines() {
            let line = line.map_err(|e| CompileError::io("SourceBuffer::read", e))?;
            lines.push(line);
        }
        Self::from_lines(lines)
    }

    pub fn from_lines(lines: Vec<String>) -> Result<Self, CompileError> {
        if lines.is_empty() {
            return Err(CompileError::file("SourceBuffer::read", EMPTY_FILE));
        }
        let lines: Vec<Vec<char>> = lines.iter().map(|l| l.chars().collect()).collect();
        let ends = code_lens(&lines);
        let last = lines.len() - 1;
        let mut buffer = Self {
            pointer: ends[last] as isize,
            lines,
            ends,
            line: last,
            lookahead: None,
        };
        buffer.step();
        Ok(buffer)
    }

    /// The staged character, or `None` once the input is exhausted.
    pub fn lookahead(&self) -> Option<char> {
        self.lookahead
    }

    pub fn is_exhausted(&self) -> bool {
        self.lookahead.is_none()
    }

    /// Source position of the lookahead.
    pub fn position(&self) -> Position {
        Position::new(self.line + 1, (self.pointer.max(0) as usize) + 1)
    }

    /// Raw text of the line the cursor is on.
    pub fn line_text(&self) -> String {
        self.lines[self.line].iter().collect()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Consume the lookahead and stage the next character to the left.
    pub fn advance(&mut self) {
        if self.lookahead.is_none() {
            return;
        }
        if self.pointer < 0 {
            self.line -= 1;
            self.pointer = self.ends[self.line] as isize;
        }
        self.step();
    }

    fn step(&mut self) {
        self.pointer -= 1;
        if self.pointer >= 0 {
            self.lookahead = Some(self.lines[self.line][self.pointer as usize]);
        } else if self.line <= 1 {
            self.pointer = 0;
            self.lookahead = None;
        } else {
            self.lookahead = Some(LINE_BREAK);
        }
    }
}

/// For every line, the length of the part the cursor scans: everything up to
/// and including a `//` marker that sits outside quoted literals and block
/// comments. Comment text is never staged.
///
/// Computed in one forward pass, since block comments and Omnidrone literals
/// carry over line breaks. A Monodrone never does.
fn code_lens(lines: &[Vec<char>]) -> Vec<usize> {
    let mut ends = Vec::with_capacity(lines.len());
    let mut quote: Option<char> = None;
    let mut in_block = false;

    for line in lines {
        let mut end = line.len();
        let mut i = 0;
        while i < line.len() {
            let ch = line[i];
            let next = line.get(i + 1).copied();
            if in_block {
                if ch == '*' && next == Some('/') {
                    in_block = false;
                    i += 1;
                }
            } else if let Some(q) = quote {
                if ch == q {
                    quote = None;
                }
            } else if ch == SINGLE_QUOTE || ch == DOUBLE_QUOTE {
                quote = Some(ch);
            } else if ch == '/' && next == Some('/') {
                end = i + 2;
                break;
            } else if ch == '/' && next == Some('*') {
                in_block = true;
                i += 1;
            }
            i += 1;
        }
        if quote == Some(SINGLE_QUOTE) {
            quote = None;
        }
        ends.push(end);
    }
    ends
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(src: &str) -> SourceBuffer {
        SourceBuffer::read(src.as_bytes()).unwrap()
    }

    fn drain(buffer: &mut SourceBuffer) -> String {
        let mut out = String::new();
        while let Some(ch) = buffer.lookahead() {
            out.push(ch);
            buffer.advance();
        }
        out
    }

    #[test]
    fn unreverse_restores_source_order() {
        assert_eq!(unreverse("tcurtsnoC"), "Construct");
        assert_eq!(unreverse(""), "");
    }

    #[test]
    fn single_line_is_scanned_right_to_left() {
        let mut b = buffer("abc");
        assert_eq!(b.position(), Position::new(1, 3));
        assert_eq!(drain(&mut b), "cba");
        assert!(b.is_exhausted());
    }

    #[test]
    fn lines_are_scanned_bottom_up_and_first_line_is_unreachable() {
        let mut b = buffer("top\nab\ncd");
        assert_eq!(drain(&mut b), "dc\nba");
    }

    #[test]
    fn empty_lines_become_breaks() {
        let mut b = buffer("skip\nx\n\ny");
        assert_eq!(drain(&mut b), "y\n\nx");
    }

    #[test]
    fn empty_source_is_a_file_error() {
        let err = SourceBuffer::read("".as_bytes()).err().expect("error");
        assert_eq!(err.message, EMPTY_FILE);
    }

    #[test]
    fn blank_last_line_starts_on_a_break() {
        let mut b = buffer("skip\nab\n   ");
        assert_eq!(drain(&mut b), "   \nba");
    }

    #[test]
    fn comment_text_is_never_staged() {
        let mut b = buffer("x = 1 // note");
        assert_eq!(drain(&mut b), "// 1 = x");
    }

    fn ends(src: &str) -> Vec<usize> {
        let lines: Vec<Vec<char>> = src.lines().map(|l| l.chars().collect()).collect();
        code_lens(&lines)
    }

    #[test]
    fn comment_marker_inside_quotes_is_text() {
        assert_eq!(ends("\"a//b\" // c"), vec![9]);
        assert_eq!(ends("'/' x"), vec![5]);
    }

    #[test]
    fn comment_marker_inside_block_comment_is_text() {
        assert_eq!(ends("x /* see http://a.b */ y"), vec![24]);
        assert_eq!(ends("/* one\ntwo // three\n*/ x // note"), vec![6, 12, 7]);
    }

    #[test]
    fn quotes_inside_block_comments_do_not_open_literals() {
        assert_eq!(ends("a /* don't */ b // it's"), vec![18]);
    }

    #[test]
    fn omnidrone_carries_over_line_breaks() {
        assert_eq!(ends("x = \"one\ntwo // three\" // note"), vec![8, 16]);
    }

    #[test]
    fn monodrone_does_not_carry_over_line_breaks() {
        assert_eq!(ends("c = 'x\ny // note"), vec![6, 4]);
    }

    #[test]
    fn line_comment_hides_block_markers() {
        assert_eq!(ends("x // /* not a block\ny // note"), vec![4, 4]);
    }

    #[test]
    fn position_tracks_lookahead() {
        let mut b = buffer("skip\nab\ncd");
        assert_eq!(b.position(), Position::new(3, 2));
        b.advance();
        b.advance();
        assert_eq!(b.lookahead(), Some(LINE_BREAK));
        b.advance();
        assert_eq!(b.position(), Position::new(2, 2));
        assert_eq!(b.line_text(), "ab");
    }
}
