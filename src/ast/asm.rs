//! This module holds the source-level representation of E20 instructions.
//!
//! An [`AsmInstr`] is an instruction as the programmer wrote it, with its operands parsed
//! and its labels already looked up. It still includes the pseudo-instructions
//! (`movi`, `nop`, `halt`), which [`AsmInstr::expand`] rewrites into real instructions.
//! [`AsmInstr::into_sim_instr`] then range-checks the operands and produces a [`SimInstr`].

use crate::asm::{AsmErrKind, SymbolTable};
use crate::parse::{parse_imm, parse_mem_ref, parse_reg};

use super::reg_consts::R0;
use super::sim::SimInstr;
use super::{Addr13, Imm7, Reg};

macro_rules! opcode_enum {
    ($($op:ident => $text:literal: $arity:literal),+ $(,)?) => {
        /// A mnemonic of E20 assembly, including the pseudo-instructions.
        ///
        /// Mnemonics are case-insensitive.
        #[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
        pub enum Opcode {
            $(
                #[allow(missing_docs)]
                $op
            ),+
        }

        impl Opcode {
            /// The number of operands this mnemonic is written with.
            pub fn arity(self) -> usize {
                match self {
                    $(Self::$op => $arity),+
                }
            }
        }

        impl std::str::FromStr for Opcode {
            type Err = AsmErrKind;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_lowercase() {
                    $($text => Ok(Self::$op)),+,
                    _ => Err(AsmErrKind::UnknownOpcode(s.to_string()))
                }
            }
        }

        impl std::fmt::Display for Opcode {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$op => f.write_str($text)),+
                }
            }
        }
    };
}
opcode_enum! {
    ADD  => "add":  3,
    SUB  => "sub":  3,
    OR   => "or":   3,
    AND  => "and":  3,
    SLT  => "slt":  3,
    JR   => "jr":   1,
    ADDI => "addi": 3,
    SLTI => "slti": 3,
    LW   => "lw":   2,
    SW   => "sw":   2,
    JEQ  => "jeq":  3,
    J    => "j":    1,
    JAL  => "jal":  1,
    MOVI => "movi": 2,
    NOP  => "nop":  0,
    HALT => "halt": 0,
}

/// An assembly source code instruction.
///
/// Immediates are already resolved to integers here (labels have been replaced
/// by their addresses), but have not yet been checked against their field widths.
/// `JEQ` holds its *absolute* target.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AsmInstr {
    /// `add dst, srcA, srcB`
    ADD(Reg, Reg, Reg),
    /// `sub dst, srcA, srcB`
    SUB(Reg, Reg, Reg),
    /// `or dst, srcA, srcB`
    OR(Reg, Reg, Reg),
    /// `and dst, srcA, srcB`
    AND(Reg, Reg, Reg),
    /// `slt dst, srcA, srcB`
    SLT(Reg, Reg, Reg),
    /// `jr reg`
    JR(Reg),
    /// `addi dst, src, imm`
    ADDI(Reg, Reg, i32),
    /// `slti dst, src, imm`
    SLTI(Reg, Reg, i32),
    /// `lw data, offset(base)`
    LW(Reg, i32, Reg),
    /// `sw data, offset(base)`
    SW(Reg, i32, Reg),
    /// `jeq regA, regB, target`
    JEQ(Reg, Reg, i32),
    /// `j target`
    J(i32),
    /// `jal target`
    JAL(i32),
    /// `movi reg, imm` (pseudo-instruction)
    MOVI(Reg, i32),
    /// `nop` (pseudo-instruction)
    NOP,
    /// `halt` (pseudo-instruction)
    HALT,
}

impl AsmInstr {
    /// Parses an instruction from its mnemonic and operand words,
    /// resolving any labels through the symbol table.
    ///
    /// The operand count is checked before any operand is parsed,
    /// and operands are then parsed from left to right.
    ///
    /// # Example
    /// ```
    /// use e20_asm::asm::SymbolTable;
    /// use e20_asm::ast::asm::AsmInstr;
    /// use e20_asm::ast::reg_consts::{R1, R2};
    ///
    /// let sym = SymbolTable::default();
    /// let instr = AsmInstr::parse("LW", &["$1", "-2($2)"], &sym).unwrap();
    /// assert_eq!(instr, AsmInstr::LW(R1, -2, R2));
    /// ```
    pub fn parse(mnemonic: &str, operands: &[&str], sym: &SymbolTable) -> Result<Self, AsmErrKind> {
        let opcode: Opcode = mnemonic.parse()?;

        let expected = opcode.arity();
        if operands.len() != expected {
            return Err(AsmErrKind::BadOperandCount { expected, found: operands.len() });
        }

        let reg = |i: usize| parse_reg(operands[i]);
        let imm = |i: usize| parse_imm(operands[i], sym);

        let instr = match opcode {
            Opcode::ADD  => AsmInstr::ADD(reg(0)?, reg(1)?, reg(2)?),
            Opcode::SUB  => AsmInstr::SUB(reg(0)?, reg(1)?, reg(2)?),
            Opcode::OR   => AsmInstr::OR(reg(0)?, reg(1)?, reg(2)?),
            Opcode::AND  => AsmInstr::AND(reg(0)?, reg(1)?, reg(2)?),
            Opcode::SLT  => AsmInstr::SLT(reg(0)?, reg(1)?, reg(2)?),
            Opcode::JR   => AsmInstr::JR(reg(0)?),
            Opcode::ADDI => AsmInstr::ADDI(reg(0)?, reg(1)?, imm(2)?),
            Opcode::SLTI => AsmInstr::SLTI(reg(0)?, reg(1)?, imm(2)?),
            Opcode::LW   => {
                let data = reg(0)?;
                let (off, base) = parse_mem_ref(operands[1], sym)?;
                AsmInstr::LW(data, off, base)
            },
            Opcode::SW   => {
                let data = reg(0)?;
                let (off, base) = parse_mem_ref(operands[1], sym)?;
                AsmInstr::SW(data, off, base)
            },
            Opcode::JEQ  => AsmInstr::JEQ(reg(0)?, reg(1)?, imm(2)?),
            Opcode::J    => AsmInstr::J(imm(0)?),
            Opcode::JAL  => AsmInstr::JAL(imm(0)?),
            Opcode::MOVI => AsmInstr::MOVI(reg(0)?, imm(1)?),
            Opcode::NOP  => AsmInstr::NOP,
            Opcode::HALT => AsmInstr::HALT,
        };

        Ok(instr)
    }

    /// Rewrites a pseudo-instruction into the real instruction it stands for.
    ///
    /// Real instructions are returned unchanged.
    ///
    /// | pseudo          | expands to           |
    /// |-----------------|----------------------|
    /// | `movi reg, imm` | `addi reg, $0, imm`  |
    /// | `nop`           | `add $0, $0, $0`     |
    /// | `halt`          | `j pc`               |
    ///
    /// Parameters:
    /// - `pc`: the address of this instruction
    pub fn expand(self, pc: u16) -> AsmInstr {
        match self {
            AsmInstr::MOVI(reg, imm) => AsmInstr::ADDI(reg, R0, imm),
            AsmInstr::NOP => AsmInstr::ADD(R0, R0, R0),
            AsmInstr::HALT => AsmInstr::J(i32::from(pc)),
            instr => instr,
        }
    }

    /// Converts an ASM instruction into a machine instruction ([`SimInstr`])
    /// by expanding pseudo-instructions, range-checking immediates, and
    /// turning `jeq`'s target into an offset relative to the next instruction.
    ///
    /// Parameters:
    /// - `pc`: the address of this instruction
    ///
    /// # Example
    /// ```
    /// use e20_asm::ast::asm::AsmInstr;
    /// use e20_asm::ast::reg_consts::{R0, R1};
    ///
    /// // branch from address 10 back to address 4: 4 - (10 + 1) = -7
    /// let instr = AsmInstr::JEQ(R1, R0, 4).into_sim_instr(10).unwrap();
    /// assert_eq!(instr.to_string(), "jeq $1, $0, -7");
    ///
    /// assert!(AsmInstr::ADDI(R1, R0, 64).into_sim_instr(0).is_err());
    /// ```
    pub fn into_sim_instr(self, pc: u16) -> Result<SimInstr, AsmErrKind> {
        let imm7 = |n: i32| Imm7::from_i32(n).map_err(AsmErrKind::ImmediateOutOfRange);
        let addr13 = |n: i32| Addr13::from_i32(n).map_err(AsmErrKind::ImmediateOutOfRange);

        let sim = match self.expand(pc) {
            AsmInstr::ADD(dst, a, b)    => SimInstr::ADD(dst, a, b),
            AsmInstr::SUB(dst, a, b)    => SimInstr::SUB(dst, a, b),
            AsmInstr::OR(dst, a, b)     => SimInstr::OR(dst, a, b),
            AsmInstr::AND(dst, a, b)    => SimInstr::AND(dst, a, b),
            AsmInstr::SLT(dst, a, b)    => SimInstr::SLT(dst, a, b),
            AsmInstr::JR(reg)           => SimInstr::JR(reg),
            AsmInstr::ADDI(dst, src, n) => SimInstr::ADDI(dst, src, imm7(n)?),
            AsmInstr::SLTI(dst, src, n) => SimInstr::SLTI(dst, src, imm7(n)?),
            AsmInstr::LW(data, off, br) => SimInstr::LW(data, br, imm7(off)?),
            AsmInstr::SW(data, off, br) => SimInstr::SW(data, br, imm7(off)?),
            AsmInstr::JEQ(a, b, target) => {
                let rel = target.saturating_sub(i32::from(pc) + 1);
                SimInstr::JEQ(a, b, imm7(rel)?)
            },
            AsmInstr::J(target)   => SimInstr::J(addr13(target)?),
            AsmInstr::JAL(target) => SimInstr::JAL(addr13(target)?),
            AsmInstr::MOVI(..) | AsmInstr::NOP | AsmInstr::HALT => {
                unreachable!("pseudo-instructions should have been expanded")
            },
        };

        Ok(sim)
    }
}

#[cfg(test)]
mod tests {
    use crate::asm::{AsmErrKind, SymbolTable};
    use crate::ast::reg_consts::{R0, R1, R2, R3, R7};
    use crate::ast::RangeErr;
    use crate::parse::parse_source;

    use super::{AsmInstr, Opcode};

    #[test]
    fn test_opcode_case_insensitive() {
        for text in ["addi", "ADDI", "AddI", "aDDi"] {
            assert_eq!(text.parse::<Opcode>(), Ok(Opcode::ADDI));
        }
        assert_eq!("jal".parse::<Opcode>(), Ok(Opcode::JAL));
        assert_eq!("mov".parse::<Opcode>(), Err(AsmErrKind::UnknownOpcode("mov".to_string())));
        assert_eq!("".parse::<Opcode>(), Err(AsmErrKind::UnknownOpcode(String::new())));
        assert_eq!(Opcode::SLTI.to_string(), "slti");
    }

    #[test]
    fn test_parse_operands() {
        let sym = SymbolTable::new(&parse_source("nop\nnop\ntarget: halt")).unwrap();

        assert_eq!(AsmInstr::parse("add", &["$3", "$1", "$2"], &sym), Ok(AsmInstr::ADD(R3, R1, R2)));
        assert_eq!(AsmInstr::parse("jr", &["$7"], &sym), Ok(AsmInstr::JR(R7)));
        assert_eq!(AsmInstr::parse("jeq", &["$1", "$0", "target"], &sym), Ok(AsmInstr::JEQ(R1, R0, 2)));
        assert_eq!(AsmInstr::parse("jal", &["TARGET"], &sym), Ok(AsmInstr::JAL(2)));
        assert_eq!(AsmInstr::parse("sw", &["$1", "target($2)"], &sym), Ok(AsmInstr::SW(R1, 2, R2)));
        assert_eq!(AsmInstr::parse("movi", &["$1", "-5"], &sym), Ok(AsmInstr::MOVI(R1, -5)));
        assert_eq!(AsmInstr::parse("Halt", &[], &sym), Ok(AsmInstr::HALT));
    }

    #[test]
    fn test_parse_arity() {
        let sym = SymbolTable::default();
        let bad = |expected, found| Err(AsmErrKind::BadOperandCount { expected, found });

        assert_eq!(AsmInstr::parse("add", &["$1", "$2"], &sym), bad(3, 2));
        assert_eq!(AsmInstr::parse("jr", &[], &sym), bad(1, 0));
        assert_eq!(AsmInstr::parse("lw", &["$1", "0($2)", "$3"], &sym), bad(2, 3));
        assert_eq!(AsmInstr::parse("movi", &["$1"], &sym), bad(2, 1));
        assert_eq!(AsmInstr::parse("movi", &["$1", "2", "3"], &sym), bad(2, 3));
        assert_eq!(AsmInstr::parse("nop", &["$1"], &sym), bad(0, 1));
        assert_eq!(AsmInstr::parse("j", &[], &sym), bad(1, 0));

        // arity is checked before operands are looked at
        assert_eq!(AsmInstr::parse("add", &["$9"], &sym), bad(3, 1));
        // but an unknown mnemonic is reported regardless of arity
        assert_eq!(AsmInstr::parse("mul", &["$1"], &sym), Err(AsmErrKind::UnknownOpcode("mul".to_string())));
    }

    #[test]
    fn test_parse_left_to_right() {
        let sym = SymbolTable::default();
        assert_eq!(
            AsmInstr::parse("add", &["$8", "nope", "$9"], &sym),
            Err(AsmErrKind::InvalidRegister("$8".to_string()))
        );
        assert_eq!(
            AsmInstr::parse("addi", &["$1", "$1", "nope"], &sym),
            Err(AsmErrKind::UndefinedSymbolOrInvalidImmediate("nope".to_string()))
        );
        assert_eq!(
            AsmInstr::parse("lw", &["$1", "4"], &sym),
            Err(AsmErrKind::InvalidMemoryReference("4".to_string()))
        );
    }

    #[test]
    fn test_expand() {
        assert_eq!(AsmInstr::MOVI(R1, 5).expand(0), AsmInstr::ADDI(R1, R0, 5));
        assert_eq!(AsmInstr::NOP.expand(7), AsmInstr::ADD(R0, R0, R0));
        assert_eq!(AsmInstr::HALT.expand(42), AsmInstr::J(42));
        assert_eq!(AsmInstr::JR(R7).expand(3), AsmInstr::JR(R7));
    }

    #[test]
    fn test_range_checks() {
        let range7 = Err(AsmErrKind::ImmediateOutOfRange(RangeErr::CannotFitSigned(7)));
        let range13 = Err(AsmErrKind::ImmediateOutOfRange(RangeErr::CannotFitUnsigned(13)));

        assert!(AsmInstr::ADDI(R1, R0, 63).into_sim_instr(0).is_ok());
        assert!(AsmInstr::ADDI(R1, R0, -64).into_sim_instr(0).is_ok());
        assert_eq!(AsmInstr::ADDI(R1, R0, 64).into_sim_instr(0), range7);
        assert_eq!(AsmInstr::SLTI(R1, R0, -65).into_sim_instr(0), range7);
        assert_eq!(AsmInstr::LW(R1, 100, R2).into_sim_instr(0), range7);
        assert_eq!(AsmInstr::MOVI(R1, 1000).into_sim_instr(0), range7);

        assert!(AsmInstr::J(8191).into_sim_instr(0).is_ok());
        assert_eq!(AsmInstr::J(8192).into_sim_instr(0), range13);
        assert_eq!(AsmInstr::JAL(-1).into_sim_instr(0), range13);

        // jeq checks the relative distance, not the target
        assert!(AsmInstr::JEQ(R0, R0, 100).into_sim_instr(60).is_ok());
        assert_eq!(AsmInstr::JEQ(R0, R0, 100).into_sim_instr(0), range7);
        assert_eq!(AsmInstr::JEQ(R0, R0, i32::MIN).into_sim_instr(0), range7);
    }
}
