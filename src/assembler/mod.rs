//! The Assembler module is in charge of taking a Pulsar
//! assembly file and producing a binary Image from it.
//!
//! It does this in a single pass: a streaming tokenizer
//! feeds a recursive descent parser that encodes each
//! statement as soon as it is read, patching forward
//! label references once their definitions turn up.

pub mod error;
pub mod image;
pub mod isa;
pub mod lexer;
pub mod parser;
pub mod symbols;

use std::io::Read;

pub use self::error::{Error, ErrorKind};
pub use self::parser::{Assembly, ListingEntry};

/// Assembles everything `reader` yields into a single image.
pub fn assemble<R: Read>(reader: R) -> Result<Assembly, Error> {
    parser::Parser::new(reader)?.run()
}
