//! The Parser drives a single left-to-right pass over the token stream,
//! assembling each statement straight into the image.
//!
//! A statement is one of:
//!
//! * `NAME` or `NAME:` - defines a label at the current offset
//! * an opcode followed by its operands
//! * `DCW` followed by a comma-separated list of values
//!
//! The first error aborts the pass.
use std::convert::TryFrom;
use std::io::Read;

use super::error::{Error, ErrorKind};
use super::image::Image;
use super::isa::{Directive, EffectiveAddress, Instruction, Opcode, Register, PC};
use super::lexer::{Lexer, Token, TokenKind};
use super::symbols::SymbolTable;

type StatementHandler<R> = fn(&mut Parser<R>) -> Result<(), Error>;

/// One emitted word, as it appeared in the source.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ListingEntry {
    pub offset: usize,
    pub line: usize,
    pub text: String,
}

/// The product of a successful pass.
pub struct Assembly {
    pub image: Image,
    pub listing: Vec<ListingEntry>,
}

pub struct Parser<R: Read> {
    lexer: Lexer<R>,
    token: Token,
    symbols: SymbolTable,
    image: Image,
    listing: Vec<ListingEntry>,
}

impl<R: Read> Parser<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut lexer = Lexer::new(reader)?;
        let token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            token,
            symbols: SymbolTable::new(),
            image: Image::new(),
            listing: Vec::new(),
        })
    }

    /// Run the parser, consuming itself and returning the assembled image.
    pub fn run(mut self) -> Result<Assembly, Error> {
        while self.token.kind != TokenKind::Eof {
            let handler = match Self::statement_handler(&self.token.kind) {
                Some(handler) => handler,
                None => return Err(self.unexpected(ErrorKind::UnknownOpcodeOrDirective)),
            };
            handler(&mut self)?;
        }

        let unresolved = self.symbols.unresolved_names();
        if !unresolved.is_empty() {
            for name in &unresolved {
                info!("unresolved reference: {}", name);
            }
            return Err(Error::on_line(self.lexer.line(), ErrorKind::UnresolvedReferences(unresolved)));
        }

        Ok(Assembly { image: self.image, listing: self.listing })
    }

    /// Maps the kind of token heading a statement to its handler.
    /// Kinds that are recognised but cannot (yet) start a statement map to None.
    fn statement_handler(kind: &TokenKind) -> Option<StatementHandler<R>> {
        match kind {
            TokenKind::Name                      => Some(Self::label),
            TokenKind::Opcode(Opcode::LDA)       => Some(Self::load),
            TokenKind::Opcode(Opcode::STA)       => Some(Self::store),
            TokenKind::Opcode(Opcode::JMP)       => Some(Self::jump),
            TokenKind::Directive(Directive::DCW) => Some(Self::define_words),

            TokenKind::Opcode(Opcode::ISZ) |
            TokenKind::Opcode(Opcode::DSZ) |
            TokenKind::Opcode(Opcode::JSR) |
            TokenKind::Number(_)           |
            TokenKind::Char(_)             |
            TokenKind::Eof                       => None,
        }
    }

    /// `NAME` or `NAME:`
    fn label(&mut self) -> Result<(), Error> {
        let location = self.image.cursor();
        let line = self.token.line;
        self.symbols
            .define(&self.token.text, location, &mut self.image)
            .map_err(|kind| Error::on_line(line, kind))?;

        self.advance()?;
        if self.token.is_char(b':') {
            self.advance()?;
        }
        Ok(())
    }

    /// `LDA reg, ea`
    fn load(&mut self) -> Result<(), Error> {
        let line = self.token.line;
        self.advance()?;
        let (reg, ea) = self.register_and_address("Destination", "Destination register")?;
        self.emit(Instruction::LDA(reg, ea), line)
    }

    /// `STA reg, ea`
    fn store(&mut self) -> Result<(), Error> {
        let line = self.token.line;
        self.advance()?;
        let (reg, ea) = self.register_and_address("Source", "Source register")?;
        self.emit(Instruction::STA(reg, ea), line)
    }

    /// `JMP ea`
    fn jump(&mut self) -> Result<(), Error> {
        let line = self.token.line;
        self.advance()?;
        let ea = self.effective_address()?;
        self.emit(Instruction::JMP(ea), line)
    }

    /// `DCW value [, value]*`
    fn define_words(&mut self) -> Result<(), Error> {
        self.advance()?;
        loop {
            let line = self.token.line;
            let value = self.expression("Data word")?;
            if value < i64::from(i16::MIN) || value > i64::from(u16::MAX) {
                warn!("{}: data word {} truncated to 0x{:04X}", line, value, value as u16);
            }
            self.append(value as u16, line, format!("DCW {}", value))?;

            if !self.peek_comma()? {
                return Ok(());
            }
        }
    }

    fn register_and_address(
        &mut self,
        role: &'static str,
        what: &'static str,
    ) -> Result<(Register, EffectiveAddress), Error> {
        let line = self.token.line;
        let value = self.expression(what)?;
        let reg = Register::try_from(value)
            .map_err(|_| Error::on_line(line, ErrorKind::InvalidRegister(role)))?;

        self.require_comma("effective address expression")?;
        let ea = self.effective_address()?;
        Ok((reg, ea))
    }

    /// Parses `displacement [, index]`. Without an index register the
    /// displacement is taken as an absolute address and made PC-relative.
    fn effective_address(&mut self) -> Result<EffectiveAddress, Error> {
        let line = self.token.line;
        let mut displacement = self.expression("Effective address")?;

        let index = if self.peek_comma()? {
            self.expression("Index register")?
        } else {
            displacement -= self.image.cursor() as i64 + 1;
            i64::from(PC.to_u16())
        };
        let index = Register::try_from(index)
            .map_err(|_| Error::on_line(line, ErrorKind::InvalidIndexRegister))?;

        debug!("{}: effective address {}({})", line, displacement, index);
        Ok(EffectiveAddress { displacement, index })
    }

    /// A number, or a label reference. Undefined labels read as zero until
    /// their definition patches the word about to be written.
    fn expression(&mut self, what: &'static str) -> Result<i64, Error> {
        let value = match self.token.kind {
            TokenKind::Number(value) => value,
            TokenKind::Name => self.symbols.resolve(&self.token.text, self.image.cursor()),
            _ => return Err(self.unexpected(ErrorKind::ExpressionExpected(what))),
        };
        self.advance()?;
        Ok(value)
    }

    fn emit(&mut self, ins: Instruction, line: usize) -> Result<(), Error> {
        let word = ins.assemble().map_err(|kind| Error::on_line(line, kind))?;
        self.append(word, line, ins.to_string())
    }

    fn append(&mut self, word: u16, line: usize, text: String) -> Result<(), Error> {
        let offset = self.image.cursor();
        self.image.append(word).map_err(|kind| Error::on_line(line, kind))?;
        debug!("0x{:04X}: 0x{:04X}  {}", offset, word, text);
        self.listing.push(ListingEntry { offset, line, text });
        Ok(())
    }

    fn require_comma(&mut self, what: &'static str) -> Result<(), Error> {
        if !self.token.is_char(b',') {
            return Err(self.unexpected(ErrorKind::CommaExpected(what)));
        }
        self.advance()
    }

    /// Consumes a comma if one is next.
    fn peek_comma(&mut self) -> Result<bool, Error> {
        if self.token.is_char(b',') {
            self.advance()?;
            return Ok(true);
        }
        Ok(false)
    }

    #[inline]
    fn advance(&mut self) -> Result<(), Error> {
        self.token = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, kind: ErrorKind) -> Error {
        Error::at(&self.token, kind)
    }
}
