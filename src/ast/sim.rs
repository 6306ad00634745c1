//! This module holds machine-level E20 instructions.
//!
//! A [`SimInstr`] corresponds one-to-one to a 16-bit word:
//! [`SimInstr::encode`] produces the word and [`SimInstr::decode`] reads it back.
//!
//! Instructions fall into four formats (bit 15 is the most significant):
//!
//! ```text
//!              15  13 12  10 9    7 6    4 3    0
//! three-reg   | 000 | srcA | srcB | dst  | func |   add=0 sub=1 or=2 and=3 slt=4
//! jr          | 000 | reg  | 000    000  | 1000 |
//! reg-imm     | op  | rA   | rB   |    imm7     |   addi=1 lw=4 sw=5 jeq=6 slti=7
//! jump        | op  |         imm13             |   j=2 jal=3
//! ```

use super::{Addr13, Imm7, Reg};

const OP_REG: u16 = 0b000;
const OP_ADDI: u16 = 0b001;
const OP_J: u16 = 0b010;
const OP_JAL: u16 = 0b011;
const OP_LW: u16 = 0b100;
const OP_SW: u16 = 0b101;
const OP_JEQ: u16 = 0b110;
const OP_SLTI: u16 = 0b111;

const FN_ADD: u16 = 0;
const FN_SUB: u16 = 1;
const FN_OR: u16 = 2;
const FN_AND: u16 = 3;
const FN_SLT: u16 = 4;
const FN_JR: u16 = 8;

/// A machine instruction.
///
/// Unlike [`AsmInstr`], there are no pseudo-instructions and every
/// immediate is known to fit its field.
///
/// [`AsmInstr`]: super::asm::AsmInstr
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum SimInstr {
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
    /// `addi dst, src, imm7`
    ADDI(Reg, Reg, Imm7),
    /// `slti dst, src, imm7`
    SLTI(Reg, Reg, Imm7),
    /// `lw data, imm7(base)` (stored as data, base, offset)
    LW(Reg, Reg, Imm7),
    /// `sw data, imm7(base)` (stored as data, base, offset)
    SW(Reg, Reg, Imm7),
    /// `jeq regA, regB, rel7`, where the offset is relative to the next instruction
    JEQ(Reg, Reg, Imm7),
    /// `j imm13`
    J(Addr13),
    /// `jal imm13`
    JAL(Addr13),
}

fn three_reg(func: u16, dst: Reg, a: Reg, b: Reg) -> u16 {
    (OP_REG << 13) | (a.field() << 10) | (b.field() << 7) | (dst.field() << 4) | func
}
fn reg_imm(op: u16, ra: Reg, rb: Reg, imm: Imm7) -> u16 {
    (op << 13) | (ra.field() << 10) | (rb.field() << 7) | imm.bits()
}
fn jump(op: u16, target: Addr13) -> u16 {
    (op << 13) | target.bits()
}

impl SimInstr {
    /// Encodes this instruction into a word.
    ///
    /// ```
    /// use e20_asm::ast::{Imm7, Addr13};
    /// use e20_asm::ast::reg_consts::{R0, R1};
    /// use e20_asm::ast::sim::SimInstr;
    ///
    /// let addi = SimInstr::ADDI(R1, R0, Imm7::new(5).unwrap());
    /// assert_eq!(addi.encode(), 0x2085);
    ///
    /// let j = SimInstr::J(Addr13::new(0).unwrap());
    /// assert_eq!(j.encode(), 0x4000);
    /// ```
    pub fn encode(&self) -> u16 {
        match *self {
            SimInstr::ADD(dst, a, b) => three_reg(FN_ADD, dst, a, b),
            SimInstr::SUB(dst, a, b) => three_reg(FN_SUB, dst, a, b),
            SimInstr::OR(dst, a, b)  => three_reg(FN_OR, dst, a, b),
            SimInstr::AND(dst, a, b) => three_reg(FN_AND, dst, a, b),
            SimInstr::SLT(dst, a, b) => three_reg(FN_SLT, dst, a, b),
            SimInstr::JR(reg)        => (OP_REG << 13) | (reg.field() << 10) | FN_JR,
            SimInstr::ADDI(dst, src, imm)  => reg_imm(OP_ADDI, src, dst, imm),
            SimInstr::SLTI(dst, src, imm)  => reg_imm(OP_SLTI, src, dst, imm),
            SimInstr::LW(data, base, off)  => reg_imm(OP_LW, base, data, off),
            SimInstr::SW(data, base, off)  => reg_imm(OP_SW, base, data, off),
            SimInstr::JEQ(a, b, rel)       => reg_imm(OP_JEQ, a, b, rel),
            SimInstr::J(target)   => jump(OP_J, target),
            SimInstr::JAL(target) => jump(OP_JAL, target),
        }
    }

    /// Decodes a word into an instruction.
    ///
    /// This returns `None` if the word is not a valid instruction
    /// (an unassigned function code, or a `jr` with stray bits set).
    ///
    /// ```
    /// use e20_asm::ast::sim::SimInstr;
    ///
    /// assert_eq!(SimInstr::decode(0x2085).map(|i| i.to_string()).as_deref(), Some("addi $1, $0, 5"));
    /// assert_eq!(SimInstr::decode(0x0005), None);
    /// ```
    pub fn decode(word: u16) -> Option<Self> {
        let op = word >> 13;
        let reg = |shift: u16| Reg(((word >> shift) & 0b111) as u8);
        let (ra, rb, rc) = (reg(10), reg(7), reg(4));
        let imm7 = Imm7::from_bits(word);
        let imm13 = Addr13::from_bits(word);

        let instr = match op {
            OP_REG => match word & 0xF {
                FN_ADD => SimInstr::ADD(rc, ra, rb),
                FN_SUB => SimInstr::SUB(rc, ra, rb),
                FN_OR  => SimInstr::OR(rc, ra, rb),
                FN_AND => SimInstr::AND(rc, ra, rb),
                FN_SLT => SimInstr::SLT(rc, ra, rb),
                FN_JR if word & 0x03F0 == 0 => SimInstr::JR(ra),
                _ => return None,
            },
            OP_ADDI => SimInstr::ADDI(rb, ra, imm7),
            OP_SLTI => SimInstr::SLTI(rb, ra, imm7),
            OP_LW   => SimInstr::LW(rb, ra, imm7),
            OP_SW   => SimInstr::SW(rb, ra, imm7),
            OP_JEQ  => SimInstr::JEQ(ra, rb, imm7),
            OP_J    => SimInstr::J(imm13),
            OP_JAL  => SimInstr::JAL(imm13),
            _ => unreachable!("opcode is 3 bits"),
        };

        Some(instr)
    }
}

impl std::fmt::Display for SimInstr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimInstr::ADD(dst, a, b) => write!(f, "add {dst}, {a}, {b}"),
            SimInstr::SUB(dst, a, b) => write!(f, "sub {dst}, {a}, {b}"),
            SimInstr::OR(dst, a, b)  => write!(f, "or {dst}, {a}, {b}"),
            SimInstr::AND(dst, a, b) => write!(f, "and {dst}, {a}, {b}"),
            SimInstr::SLT(dst, a, b) => write!(f, "slt {dst}, {a}, {b}"),
            SimInstr::JR(reg)        => write!(f, "jr {reg}"),
            SimInstr::ADDI(dst, src, imm) => write!(f, "addi {dst}, {src}, {imm}"),
            SimInstr::SLTI(dst, src, imm) => write!(f, "slti {dst}, {src}, {imm}"),
            SimInstr::LW(data, base, off) => write!(f, "lw {data}, {off}({base})"),
            SimInstr::SW(data, base, off) => write!(f, "sw {data}, {off}({base})"),
            SimInstr::JEQ(a, b, rel)      => write!(f, "jeq {a}, {b}, {rel}"),
            SimInstr::J(target)   => write!(f, "j {target}"),
            SimInstr::JAL(target) => write!(f, "jal {target}"),
        }
    }
}
