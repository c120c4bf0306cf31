//! The Pulsar instruction set as far as plsasm understands it.
//!
//! Pulsar is a 16-bit accumulator machine with four registers. Register 1
//! doubles as the program counter, which is why an effective address with
//! no explicit index register is PC-relative.
//!
//! Supported statements:
//!
//! ```nasm
//! LDA R, D        ; R <= mem[PC + 1 + D]      (D given as an absolute address)
//! LDA R, D, X     ; R <= mem[X + D]
//! STA R, D        ; mem[PC + 1 + D] <= R
//! STA R, D, X     ; mem[X + D] <= R
//! JMP D           ; PC <= PC + 1 + D
//! JMP D, X        ; PC <= X + D
//! DCW V, V, ...   ; literal data words
//! ```
//!
//! Word layout for LDA/STA:
//!
//! ```text
//!  15 14 13 | 12 11 | 10  9 8 | 7 ........ 0
//!   opcode  |  reg  | 0 index |  displacement
//! ```
//!
//! JMP uses opcode 0, so only the index and displacement fields are set.
//! ISZ, DSZ and JSR are reserved mnemonics with no encoding yet.

use std::convert::TryFrom;
use std::fmt;

use super::error::ErrorKind;

/// Register 1 is the program counter.
pub const PC: Register = Register::R1;

/// Opcode mnemonics recognised by the lexer.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Opcode {
    LDA,
    STA,
    ISZ,
    DSZ,
    JMP,
    JSR,
}

/// Pseudo-opcodes that emit data rather than instructions.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Directive {
    DCW,
}

/// The result of classifying a name against the keyword table.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Keyword {
    Opcode(Opcode),
    Directive(Directive),
}

impl Keyword {
    /// Case-insensitive keyword lookup. Anything not in the table is
    /// an ordinary name (a label definition or reference).
    pub fn classify(name: &str) -> Option<Keyword> {
        match name.to_ascii_lowercase().as_str() {
            "lda" => Some(Keyword::Opcode(Opcode::LDA)),
            "sta" => Some(Keyword::Opcode(Opcode::STA)),
            "isz" => Some(Keyword::Opcode(Opcode::ISZ)),
            "dsz" => Some(Keyword::Opcode(Opcode::DSZ)),
            "jmp" => Some(Keyword::Opcode(Opcode::JMP)),
            "jsr" => Some(Keyword::Opcode(Opcode::JSR)),
            "dcw" => Some(Keyword::Directive(Directive::DCW)),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Register {
    R0,
    R1,
    R2,
    R3,
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

impl TryFrom<i64> for Register {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        use Register::*;
        match value {
            0 => Ok(R0),
            1 => Ok(R1),
            2 => Ok(R2),
            3 => Ok(R3),
            _ => Err(value),
        }
    }
}

impl Register {
    /// Convert the register to its two-bit field value.
    pub fn to_u16(self) -> u16 {
        self as u16
    }
}

/// A displacement relative to one of the four registers.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct EffectiveAddress {
    pub displacement: i64,
    pub index: Register,
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}({})", self.displacement, self.index)
    }
}

impl EffectiveAddress {
    /// The low byte of an instruction word: the displacement in
    /// two's complement. It must fit in a signed byte.
    fn displacement_field(&self) -> Result<u16, ErrorKind> {
        if self.displacement < -128 || self.displacement > 127 {
            return Err(ErrorKind::DisplacementOutOfRange(self.displacement));
        }
        Ok((self.displacement as u16) & 0x00FF)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Instruction {
    LDA(Register, EffectiveAddress),
    STA(Register, EffectiveAddress),
    JMP(EffectiveAddress),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Instruction::*;
        match self {
            LDA(reg, ea) => write!(f, "LDA {}, {}", reg, ea),
            STA(reg, ea) => write!(f, "STA {}, {}", reg, ea),
            JMP(ea) => write!(f, "JMP {}", ea),
        }
    }
}

impl Instruction {
    /// Assembles the instruction into a single machine word.
    pub fn assemble(&self) -> Result<u16, ErrorKind> {
        use Instruction::*;
        match self {
            LDA(reg, ea) |
            STA(reg, ea) => Ok((self.opcode() << 13)
                | (reg.to_u16() << 11)
                | (ea.index.to_u16() << 8)
                | ea.displacement_field()?),

            JMP(ea) => Ok((self.opcode() << 13)
                | (ea.index.to_u16() << 8)
                | ea.displacement_field()?),
        }
    }

    /// Returns the three opcode bits of the instruction.
    fn opcode(&self) -> u16 {
        use Instruction::*;
        match self {
            JMP(_)    => 0b000,
            LDA(_, _) => 0b001,
            STA(_, _) => 0b010,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ea(displacement: i64, index: Register) -> EffectiveAddress {
        EffectiveAddress { displacement, index }
    }

    #[test]
    fn test_classify() {
        assert_eq!(Keyword::classify("lda"), Some(Keyword::Opcode(Opcode::LDA)));
        assert_eq!(Keyword::classify("LDA"), Some(Keyword::Opcode(Opcode::LDA)));
        assert_eq!(Keyword::classify("Sta"), Some(Keyword::Opcode(Opcode::STA)));
        assert_eq!(Keyword::classify("isz"), Some(Keyword::Opcode(Opcode::ISZ)));
        assert_eq!(Keyword::classify("DSZ"), Some(Keyword::Opcode(Opcode::DSZ)));
        assert_eq!(Keyword::classify("jMp"), Some(Keyword::Opcode(Opcode::JMP)));
        assert_eq!(Keyword::classify("jsr"), Some(Keyword::Opcode(Opcode::JSR)));
        assert_eq!(Keyword::classify("dcw"), Some(Keyword::Directive(Directive::DCW)));

        assert_eq!(Keyword::classify("dcb"), None);
        assert_eq!(Keyword::classify("START"), None);
        assert_eq!(Keyword::classify("ldax"), None);
    }

    #[test]
    fn test_register() {
        for i in 0..=3i64 {
            assert_eq!(Register::try_from(i).map(Register::to_u16), Ok(i as u16));
        }
        assert_eq!(Register::try_from(4i64), Err(4));
        assert_eq!(Register::try_from(-1i64), Err(-1));
        assert_eq!(PC.to_u16(), 1);
    }

    #[test]
    fn test_assemble_lda_sta() {
        let ins = Instruction::LDA(Register::R0, ea(5, Register::R1));
        assert_eq!(ins.assemble().ok(), Some(0x2105));

        let ins = Instruction::LDA(Register::R3, ea(-1, Register::R2));
        assert_eq!(ins.assemble().ok(), Some(0x2000 | (3 << 11) | (2 << 8) | 0xFF));

        let ins = Instruction::STA(Register::R2, ea(0x10, Register::R0));
        assert_eq!(ins.assemble().ok(), Some(0x4000 | (2 << 11) | 0x10));
    }

    #[test]
    fn test_assemble_jmp() {
        // JMP shares the all-zero opcode field.
        assert_eq!(Instruction::JMP(ea(-2, PC)).assemble().ok(), Some(0x01FE));
        assert_eq!(Instruction::JMP(ea(0, Register::R0)).assemble().ok(), Some(0x0000));
        assert_eq!(Instruction::JMP(ea(127, Register::R3)).assemble().ok(), Some(0x037F));
    }

    #[test]
    fn test_displacement_range() {
        for d in -128..=127i64 {
            assert!(Instruction::JMP(ea(d, PC)).assemble().is_ok());
            assert!(Instruction::STA(Register::R1, ea(d, PC)).assemble().is_ok());
        }

        for &d in &[-129, 128, -1000, 1000, i64::MIN, i64::MAX] {
            assert!(matches!(
                Instruction::LDA(Register::R0, ea(d, PC)).assemble(),
                Err(ErrorKind::DisplacementOutOfRange(v)) if v == d
            ));
        }
    }

    #[test]
    fn test_display() {
        let ins = Instruction::LDA(Register::R2, ea(-3, PC));
        assert_eq!(ins.to_string(), "LDA 2, -3(1)");
        assert_eq!(Instruction::JMP(ea(4, Register::R0)).to_string(), "JMP 4(0)");
    }
}
