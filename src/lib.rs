//! Mecha — lexical and syntax analysis for the Mecha language.
//!
//! The source is scanned bottom to top, right to left; the parser matches the
//! grammar against that reversed stream.

pub mod config;
pub mod frontend;
pub mod logger;
