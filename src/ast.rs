//! The operand types shared by both instruction representations.
//!
//! E20 instructions exist in two forms in this crate:
//! - [`asm::AsmInstr`], an instruction as written in source (pseudo-instructions included),
//! - [`sim::SimInstr`], an instruction the hardware can execute, with every field range-checked.
//!
//! This module holds what they have in common: registers ([`Reg`])
//! and fixed-width immediate fields ([`Field`]).

pub mod asm;
pub mod sim;

use field_repr::FieldRepr;

/// One of the eight general purpose registers, `$0` through `$7`.
///
/// Use [`Reg::new`] to build one from a number, or one of the constants in [`reg_consts`].
///
/// `$0` always reads as zero, which `movi` and `nop` rely on.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Reg(pub(crate) u8);

/// Every register, by name.
pub mod reg_consts {
    use super::Reg;

    /// `$0`, hardwired to zero.
    pub const R0: Reg = Reg(0);
    /// `$1`
    pub const R1: Reg = Reg(1);
    /// `$2`
    pub const R2: Reg = Reg(2);
    /// `$3`
    pub const R3: Reg = Reg(3);
    /// `$4`
    pub const R4: Reg = Reg(4);
    /// `$5`
    pub const R5: Reg = Reg(5);
    /// `$6`
    pub const R6: Reg = Reg(6);
    /// `$7`, the link register written by `jal`.
    pub const R7: Reg = Reg(7);
}
impl Reg {
    /// Creates a register from its number, returning `None` if it is not between 0 and 7.
    pub fn new(reg_no: u8) -> Option<Self> {
        (reg_no < 8).then_some(Reg(reg_no))
    }

    /// The number of this register (0 to 7).
    pub fn reg_no(self) -> u8 {
        self.0
    }

    /// The register number widened to a word, for placing into an encoded field.
    pub(crate) fn field(self) -> u16 {
        u16::from(self.0)
    }
}
impl std::fmt::Display for Reg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}", self.0)
    }
}

/// The signed 7-bit immediate of `addi`, `slti`, `lw`, `sw`, and `jeq`.
///
/// ```text
/// addi $1, $0, 5
///              ~
/// lw $2, -3($4)
///        ~~
/// jeq $1, $2, LOOP    (stored relative to the next instruction)
///             ~~~~
/// ```
pub type Imm7 = Field<i16, 7>;
/// The unsigned 13-bit absolute address of `j` and `jal`.
///
/// ```text
/// j 100
///   ~~~
/// jal FUNC
///     ~~~~
/// ```
pub type Addr13 = Field<u16, 13>;

/// An integer that is known to fit in an `N`-bit instruction field.
///
/// The field is signed (two's complement) if `B` is `i16`
/// and unsigned if `B` is `u16`. `N` must be between 1 and 16.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct Field<B, const N: u32>(B);

impl<B: std::fmt::Display, const N: u32> std::fmt::Display for Field<B, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value did not fit in an instruction field.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum RangeErr {
    /// The value is outside of the range of an unsigned integer of this many bits.
    CannotFitUnsigned(u32),
    /// The value is outside of the range of a signed integer of this many bits.
    CannotFitSigned(u32)
}

impl std::fmt::Display for RangeErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RangeErr::CannotFitUnsigned(n) => write!(f, "value is too big for unsigned {n}-bit integer"),
            RangeErr::CannotFitSigned(n)   => write!(f, "value is too big for signed {n}-bit integer"),
        }
    }
}
impl std::error::Error for RangeErr {}
impl crate::err::Error for RangeErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        let (lo, hi) = match *self {
            RangeErr::CannotFitUnsigned(n) => (0, (1i64 << n) - 1),
            RangeErr::CannotFitSigned(n)   => (-(1i64 << (n - 1)), (1i64 << (n - 1)) - 1),
        };
        let kind = match self {
            RangeErr::CannotFitUnsigned(n) => format!("an unsigned {n}-bit"),
            RangeErr::CannotFitSigned(n)   => format!("a signed {n}-bit"),
        };

        Some(format!("the range for {kind} integer is [{lo}, {hi}]").into())
    }
}

mod field_repr {
    /// The integer types a [`Field`] can hold its value in.
    ///
    /// [`Field`]: super::Field
    pub trait FieldRepr: Copy + Eq {
        /// Whether fields of this type are two's complement.
        const SIGNED: bool;

        /// Narrows a value which is already known to be in range.
        fn narrow(n: i32) -> Self;

        /// Widens this value without loss.
        fn widen(self) -> i32;
    }

    impl FieldRepr for u16 {
        const SIGNED: bool = false;

        fn narrow(n: i32) -> Self { n as u16 }
        fn widen(self) -> i32 { i32::from(self) }
    }
    impl FieldRepr for i16 {
        const SIGNED: bool = true;

        fn narrow(n: i32) -> Self { n as i16 }
        fn widen(self) -> i32 { i32::from(self) }
    }
}

impl<B: FieldRepr, const N: u32> Field<B, N> {
    const WIDTH_OK: () = assert!(1 <= N && N <= 16, "field width must be between 1 and 16 bits");

    /// The smallest value the field can hold.
    pub const MIN: i32 = if B::SIGNED { -(1 << (N - 1)) } else { 0 };
    /// The largest value the field can hold.
    pub const MAX: i32 = if B::SIGNED { (1 << (N - 1)) - 1 } else { (1 << N) - 1 };
    const MASK: u16 = ((1u32 << N) - 1) as u16;

    /// Creates a field, failing if `n` is out of the field's range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use e20_asm::ast::{Addr13, Imm7};
    /// #
    /// assert!(Imm7::new(63).is_ok());
    /// assert!(Imm7::new(-64).is_ok());
    /// assert!(Imm7::new(64).is_err());
    /// assert!(Imm7::new(-65).is_err());
    ///
    /// assert!(Addr13::new(8191).is_ok());
    /// assert!(Addr13::new(8192).is_err());
    /// ```
    ///
    /// Fields wider than a word are rejected at compile time:
    ///
    /// ```compile_fail
    /// # use e20_asm::ast::Field;
    /// #
    /// let oh_no = Field::<i16, 17>::new(18);
    /// ```
    pub fn new(n: B) -> Result<Self, RangeErr> {
        Self::from_i32(n.widen())
    }

    /// Creates a field from a full-width integer
    /// (such as a parsed immediate or a resolved label address).
    ///
    /// This fails with the same error as [`Field::new`] if the value is out of range.
    ///
    /// ```
    /// # use e20_asm::ast::{Addr13, Imm7, RangeErr};
    /// #
    /// assert_eq!(Imm7::from_i32(-5).map(|f| f.get()), Ok(-5));
    /// assert_eq!(Imm7::from_i32(100_000), Err(RangeErr::CannotFitSigned(7)));
    /// assert_eq!(Addr13::from_i32(-1), Err(RangeErr::CannotFitUnsigned(13)));
    /// ```
    pub fn from_i32(n: i32) -> Result<Self, RangeErr> {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH_OK;

        match (Self::MIN..=Self::MAX).contains(&n) {
            true  => Ok(Field(B::narrow(n))),
            false if B::SIGNED => Err(RangeErr::CannotFitSigned(N)),
            false => Err(RangeErr::CannotFitUnsigned(N)),
        }
    }

    /// Reads a field out of the low `N` bits of a word, ignoring the rest.
    ///
    /// Signed fields are sign-extended.
    ///
    /// ```
    /// # use e20_asm::ast::{Addr13, Imm7};
    /// #
    /// assert_eq!(Imm7::from_bits(0b111_1011).get(), -5);
    /// assert_eq!(Imm7::from_bits(0b011_1111).get(), 63);
    /// assert_eq!(Imm7::from_bits(0b100_0000).get(), -64);
    /// assert_eq!(Addr13::from_bits(0x2001).get(), 1);
    /// ```
    pub fn from_bits(word: u16) -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::WIDTH_OK;

        let raw = i32::from(word & Self::MASK);
        match B::SIGNED && raw > Self::MAX {
            true  => Field(B::narrow(raw - (1 << N))),
            false => Field(B::narrow(raw)),
        }
    }

    /// The value of the field.
    pub fn get(&self) -> B {
        self.0
    }

    /// The `N`-bit pattern of the field, right-aligned in a word.
    ///
    /// ```
    /// # use e20_asm::ast::Imm7;
    /// #
    /// assert_eq!(Imm7::from_bits(0xFFFF).bits(), 0b111_1111);
    /// assert_eq!(Imm7::new(5).unwrap().bits(), 0b000_0101);
    /// ```
    pub fn bits(&self) -> u16 {
        (self.0.widen() as u16) & Self::MASK
    }
}
