//! This lexer tokenizes Pulsar assembly.
//!
//! Tokens are produced one at a time on demand; the parser never sees more
//! than the current token. Whitespace is any byte below `!`, and comments
//! run from `;` to the end of the line.
use std::io::{BufReader, Bytes, Read};

use regex::Regex;

use super::error::{Error, ErrorKind};
use super::isa::{Directive, Keyword, Opcode};

/// Decimal, `0x` hex, `0b` binary or leading-zero octal.
const NUMBER_GRAMMAR: &str = r"^(?:0[xX]([0-9a-fA-F]+)|0[bB]([01]+)|0([0-7]+)|(0|[1-9][0-9]*))$";

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum TokenKind {
    Eof,
    Char(u8),
    Name,
    Number(i64),
    Opcode(Opcode),
    Directive(Directive),
}

// Tokens carry their source text and the line they appear on.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, line: usize) -> Self {
        Token { kind, text, line }
    }

    /// True for the single-character token `c`.
    pub fn is_char(&self, c: u8) -> bool {
        self.kind == TokenKind::Char(c)
    }
}

fn is_whitespace(b: u8) -> bool {
    b < 33
}

fn is_start_of_name(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    is_start_of_name(b) || b.is_ascii_digit()
}

fn is_number_char(b: u8) -> bool {
    b.is_ascii_hexdigit() || b == b'x' || b == b'X'
}

pub struct Lexer<R: Read> {
    source: Bytes<BufReader<R>>,
    lookahead: Option<u8>,
    line: usize,
    finished: bool,
    number_grammar: Regex,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Result<Self, Error> {
        let mut lexer = Lexer {
            source: BufReader::new(reader).bytes(),
            lookahead: None,
            line: 1,
            finished: false,
            number_grammar: Regex::new(NUMBER_GRAMMAR).expect("number grammar is a valid pattern"),
        };
        lexer.bump()?;
        Ok(lexer)
    }

    /// Current line number (1-based).
    pub fn line(&self) -> usize {
        self.line
    }

    /// Produces the next token. Asking again after end-of-input is an error.
    pub fn next_token(&mut self) -> Result<Token, Error> {
        if self.finished {
            return Err(Error::on_line(self.line, ErrorKind::UnexpectedEndOfInput));
        }
        self.skip_whitespace()?;

        let line = self.line;
        match self.lookahead {
            None => {
                self.finished = true;
                Ok(Token::new(TokenKind::Eof, String::new(), line))
            }
            Some(b) if is_start_of_name(b) => self.name(line),
            Some(b) if b.is_ascii_digit() => self.number(line),
            Some(b) => {
                self.bump()?;
                Ok(Token::new(TokenKind::Char(b), (b as char).to_string(), line))
            }
        }
    }

    /// Reads the next byte of input into the lookahead slot.
    fn bump(&mut self) -> Result<(), Error> {
        self.lookahead = match self.source.next() {
            Some(Ok(b)) => Some(b),
            Some(Err(err)) => return Err(Error::on_line(self.line, ErrorKind::Io(err))),
            None => None,
        };
        Ok(())
    }

    fn skip_whitespace(&mut self) -> Result<(), Error> {
        while let Some(b) = self.lookahead {
            match b {
                b';' => self.skip_comment()?,
                b'\n' => {
                    self.line += 1;
                    self.bump()?;
                }
                _ if is_whitespace(b) => self.bump()?,
                _ => break,
            }
        }
        Ok(())
    }

    // Stops in front of the newline so it still gets counted.
    fn skip_comment(&mut self) -> Result<(), Error> {
        while !matches!(self.lookahead, None | Some(b'\n')) {
            self.bump()?;
        }
        Ok(())
    }

    fn take_while(&mut self, accept: fn(u8) -> bool) -> Result<String, Error> {
        let mut text = String::new();
        while let Some(b) = self.lookahead {
            if !accept(b) {
                break;
            }
            text.push(b as char);
            self.bump()?;
        }
        Ok(text)
    }

    fn name(&mut self, line: usize) -> Result<Token, Error> {
        let text = self.take_while(is_name_char)?;
        let kind = match Keyword::classify(&text) {
            Some(Keyword::Opcode(op)) => TokenKind::Opcode(op),
            Some(Keyword::Directive(dir)) => TokenKind::Directive(dir),
            None => TokenKind::Name,
        };
        Ok(Token::new(kind, text, line))
    }

    fn number(&mut self, line: usize) -> Result<Token, Error> {
        let text = self.take_while(is_number_char)?;
        match self.parse_number(&text) {
            Some(value) => Ok(Token::new(TokenKind::Number(value), text, line)),
            None => Err(Error { line, token: Some(text), kind: ErrorKind::MalformedNumber }),
        }
    }

    fn parse_number(&self, text: &str) -> Option<i64> {
        let caps = self.number_grammar.captures(text)?;
        if let Some(digits) = caps.get(1) {
            i64::from_str_radix(digits.as_str(), 16).ok()
        } else if let Some(digits) = caps.get(2) {
            i64::from_str_radix(digits.as_str(), 2).ok()
        } else if let Some(digits) = caps.get(3) {
            i64::from_str_radix(digits.as_str(), 8).ok()
        } else {
            caps.get(4).and_then(|digits| digits.as_str().parse().ok())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Result<Vec<Token>, Error> {
        let mut lexer = Lexer::new(input.as_bytes())?;
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn number(input: &str) -> Option<i64> {
        match tokenize(input).ok()?.first()?.kind {
            TokenKind::Number(value) => Some(value),
            _ => None,
        }
    }

    #[test]
    fn test_keywords() {
        assert_eq!(kinds("LDA lda Lda"), vec![
            TokenKind::Opcode(Opcode::LDA),
            TokenKind::Opcode(Opcode::LDA),
            TokenKind::Opcode(Opcode::LDA),
            TokenKind::Eof,
        ]);
        assert_eq!(kinds("sta isz dsz jmp jsr dcw"), vec![
            TokenKind::Opcode(Opcode::STA),
            TokenKind::Opcode(Opcode::ISZ),
            TokenKind::Opcode(Opcode::DSZ),
            TokenKind::Opcode(Opcode::JMP),
            TokenKind::Opcode(Opcode::JSR),
            TokenKind::Directive(Directive::DCW),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn test_names() {
        let tokens = tokenize("start _loop2 JMPX").unwrap();
        assert_eq!(tokens[0], Token::new(TokenKind::Name, "start".to_string(), 1));
        assert_eq!(tokens[1], Token::new(TokenKind::Name, "_loop2".to_string(), 1));
        assert_eq!(tokens[2], Token::new(TokenKind::Name, "JMPX".to_string(), 1));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(number("0"), Some(0));
        assert_eq!(number("9"), Some(9));
        assert_eq!(number("146"), Some(146));
        assert_eq!(number("0x46"), Some(0x46));
        assert_eq!(number("0XfF"), Some(0xFF));
        assert_eq!(number("0b10010010"), Some(146));
        assert_eq!(number("0B1"), Some(1));
        assert_eq!(number("0146"), Some(0o146));
        assert_eq!(number("0x7FFFFFFFFFFFFFFF"), Some(i64::MAX));
    }

    #[test]
    fn test_malformed_numbers() {
        for bad in &["0x", "09", "0b102", "1A", "12x", "0x1x", "0x8000000000000000", "99999999999999999999"] {
            let err = tokenize(bad).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::MalformedNumber), "{} lexed", bad);
            assert_eq!(err.token.as_deref(), Some(*bad));
        }
    }

    #[test]
    fn test_number_stops_at_name_char() {
        // `g` is not a digit, so it starts a new name.
        let tokens = tokenize("0x1g").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Number(1));
        assert_eq!(tokens[1], Token::new(TokenKind::Name, "g".to_string(), 1));
    }

    #[test]
    fn test_chars() {
        assert_eq!(kinds("START: 1,2"), vec![
            TokenKind::Name,
            TokenKind::Char(b':'),
            TokenKind::Number(1),
            TokenKind::Char(b','),
            TokenKind::Number(2),
            TokenKind::Eof,
        ]);
        assert_eq!(kinds("-5"), vec![TokenKind::Char(b'-'), TokenKind::Number(5), TokenKind::Eof]);
    }

    #[test]
    fn test_comments_and_lines() {
        let input = "; header comment\n\
                     \tLDA 0, 5 ; trailing LDA 9\n\
                     \n\
                     \r\n\
                     DCW 1;no space\n";
        let tokens = tokenize(input).unwrap();
        let lines: Vec<(TokenKind, usize)> = tokens.into_iter().map(|t| (t.kind, t.line)).collect();
        assert_eq!(lines, vec![
            (TokenKind::Opcode(Opcode::LDA), 2),
            (TokenKind::Number(0), 2),
            (TokenKind::Char(b','), 2),
            (TokenKind::Number(5), 2),
            (TokenKind::Directive(Directive::DCW), 5),
            (TokenKind::Number(1), 5),
            (TokenKind::Eof, 6),
        ]);
    }

    #[test]
    fn test_comment_at_end_of_input() {
        assert_eq!(kinds("DCW 1 ; no newline"), vec![
            TokenKind::Directive(Directive::DCW),
            TokenKind::Number(1),
            TokenKind::Eof,
        ]);
        assert_eq!(kinds("; comment\n"), vec![TokenKind::Eof]);
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn test_next_after_eof() {
        let mut lexer = Lexer::new("".as_bytes()).unwrap();
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnexpectedEndOfInput));
    }
}
