//! Diagnostics produced while assembling a Pulsar source file.
//!
//! Every failure is fatal to the run. Leaf components report a bare
//! `ErrorKind`; the parser tags it with the line (and, where one exists,
//! the offending token) before handing it back to the caller.
use std::io;
use thiserror::Error;

use super::lexer::{Token, TokenKind};

#[derive(Error, Debug)]
pub enum ErrorKind {
    #[error("Malformed number")]
    MalformedNumber,

    #[error("{0} expression expected")]
    ExpressionExpected(&'static str),

    #[error("Comma followed by {0} expected")]
    CommaExpected(&'static str),

    #[error("{0} register must be 0, 1, 2, or 3")]
    InvalidRegister(&'static str),

    #[error("Index register must be 0, 1, 2, or 3")]
    InvalidIndexRegister,

    #[error("Displacement out of range ({0} is not within -128..=127)")]
    DisplacementOutOfRange(i64),

    #[error("Attempt to assemble more than {0} words")]
    ImageCapacityExceeded(usize),

    #[error("Forward reference patch at 0x{0:04X} lies outside the assembled image")]
    InvalidPatchLocation(usize),

    #[error("Unknown directive or opcode")]
    UnknownOpcodeOrDirective,

    #[error("Unresolved references: {}", .0.join(", "))]
    UnresolvedReferences(Vec<String>),

    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("Unable to read source: {0}")]
    Io(#[from] io::Error),
}

/// A fatal assembly error, tagged with the source line it was raised on.
#[derive(Error, Debug)]
#[error("{line}: {kind}{}", at_token(.token))]
pub struct Error {
    pub line: usize,
    pub token: Option<String>,
    pub kind: ErrorKind,
}

fn at_token(token: &Option<String>) -> String {
    match token {
        Some(text) => format!(" at \"{}\"", text),
        None => String::new(),
    }
}

impl Error {
    /// An error with no token context.
    pub fn on_line(line: usize, kind: ErrorKind) -> Self {
        Error { line, token: None, kind }
    }

    /// An error raised while looking at `token`. End-of-input has no text
    /// worth quoting, so it is reported without context.
    pub fn at(token: &Token, kind: ErrorKind) -> Self {
        let context = match token.kind {
            TokenKind::Eof => None,
            _ => Some(token.text.clone()),
        };
        Error { line: token.line, token: context, kind }
    }
}
