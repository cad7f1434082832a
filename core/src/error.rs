//! Error types for translation and execution.
//!
//! `HALT` is deliberately not a variant here: it is the normal termination
//! path of [`crate::control_unit::ControlUnit::run`], not a failure.

use std::fmt;

/// Failures raised while turning source text into a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// An unterminated `"..."` string literal.
    Lex { message: String },
    /// Unmatched `:`/`;`, `if`/`then`, `while`/`endwhile`, or
    /// `interrupt`/`;`.
    Parse { word_number: usize, message: String },
    /// A word that is neither a known variable, a known function, nor an
    /// integer literal.
    Link { word_number: usize, word: String },
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex { message } => write!(f, "lex error: {message}"),
            Self::Parse {
                word_number,
                message,
            } => write!(f, "parse error at word {word_number}: {message}"),
            Self::Link { word_number, word } => {
                write!(f, "unresolved word {word:?} at word {word_number}")
            }
        }
    }
}

impl std::error::Error for TranslateError {}

/// Failures raised while executing a linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A register, stack pointer, or memory address moved out of its valid
    /// range.
    OutOfRange {
        register: &'static str,
        index: i64,
        valid: std::ops::Range<i64>,
    },
    /// An opcode with no control-unit handler (should not occur for a
    /// program produced by this crate's own translator).
    UnknownOpcode { index: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                register,
                index,
                valid,
            } => write!(
                f,
                "{register} out of range: {index} not in [{}, {})",
                valid.start, valid.end
            ),
            Self::UnknownOpcode { index } => {
                write!(f, "unknown opcode at instruction {index}")
            }
        }
    }
}

impl std::error::Error for RunError {}
