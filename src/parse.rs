//! Parsing E20 assembly.
//!
//! Parsing happens in two layers:
//! 1. [`parse_source`] splits the source into [`Stmt`]s, separating each line's
//!    leading labels from its nucleus (an instruction or a directive).
//!    This cannot fail; every line is split the same way.
//! 2. The operand parsers ([`parse_reg`], [`parse_imm`], [`parse_mem_ref`])
//!    interpret individual words once the symbol table exists.
//!    These are called while encoding (the second assembler pass).
//!
//! [`validate_label`] checks label names during the first assembler pass.
pub mod lex;

use std::num::IntErrorKind;

use crate::asm::{AsmErrKind, SymbolTable};
use crate::ast::{RangeErr, Reg};

use self::lex::LineTokens;

/// A single non-empty source line.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Stmt<'s> {
    /// The labels (without their colons) attached to this line.
    pub labels: Vec<&'s str>,
    /// The instruction or directive of this line (if there is one).
    pub nucleus: Option<StmtKind<'s>>,
    /// The 1-based line number of this statement.
    pub line: usize,
}

/// The part of a statement after its labels.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum StmtKind<'s> {
    /// An instruction (or pseudo-instruction).
    Instr {
        /// The mnemonic as written (e.g., `ADDI`, `movi`).
        mnemonic: &'s str,
        /// The operand words, in order.
        operands: Vec<&'s str>
    },
    /// A directive (a word starting with `.`).
    Directive {
        /// The directive name as written, without the leading `.` (e.g., `fill`).
        name: &'s str,
        /// The argument words, in order.
        args: Vec<&'s str>
    }
}
impl StmtKind<'_> {
    /// Whether this nucleus occupies a word in memory.
    ///
    /// Every instruction occupies a word. Of the directives, only `.fill` does;
    /// any other directive is ignored by the assembler.
    pub fn emits_word(&self) -> bool {
        match self {
            StmtKind::Instr { .. } => true,
            StmtKind::Directive { name, .. } => name.eq_ignore_ascii_case("fill"),
        }
    }
}

impl<'s> Stmt<'s> {
    /// Splits a single line into a statement.
    ///
    /// Returns `None` if the line has no words (blank or comment-only).
    ///
    /// # Example
    /// ```
    /// use e20_asm::parse::{Stmt, StmtKind};
    ///
    /// let stmt = Stmt::parse_line("top: loop: jeq $1, $0, done  # exit", 4).unwrap();
    /// assert_eq!(stmt.labels, ["top", "loop"]);
    /// assert_eq!(stmt.nucleus, Some(StmtKind::Instr { mnemonic: "jeq", operands: vec!["$1", "$0", "done"] }));
    /// assert_eq!(stmt.line, 4);
    ///
    /// assert_eq!(Stmt::parse_line("   # nothing here", 5), None);
    /// ```
    pub fn parse_line(line: &'s str, lno: usize) -> Option<Self> {
        let mut words = LineTokens::new(line).peekable();
        words.peek()?;

        let mut labels = vec![];
        while let Some(label) = words.next_if(|w| w.ends_with(':')) {
            labels.push(&label[..label.len() - 1]);
        }

        let nucleus = words.next().map(|head| {
            let rest = words.collect();
            match head.strip_prefix('.') {
                Some(name) => StmtKind::Directive { name, args: rest },
                None => StmtKind::Instr { mnemonic: head, operands: rest },
            }
        });

        Some(Stmt { labels, nucleus, line: lno })
    }
}

/// Splits source code into statements, skipping lines without any words.
///
/// Line numbers are 1-based.
///
/// # Example
/// ```
/// use e20_asm::parse::parse_source;
///
/// let src = "
///     # counts down from 5
///     movi $1, 5
/// loop:
///     addi $1, $1, -1
/// ";
/// let stmts = parse_source(src);
/// assert_eq!(stmts.len(), 3);
/// assert_eq!(stmts[0].line, 3);
/// assert_eq!(stmts[1].labels, ["loop"]);
/// assert_eq!(stmts[1].nucleus, None);
/// ```
pub fn parse_source(src: &str) -> Vec<Stmt<'_>> {
    src.lines()
        .enumerate()
        .filter_map(|(i, line)| Stmt::parse_line(line, i + 1))
        .collect()
}

/// Checks that a label name is an identifier
/// (a letter or underscore, followed by letters, digits, or underscores).
///
/// ```
/// use e20_asm::parse::validate_label;
///
/// assert!(validate_label("_loop2").is_ok());
/// assert!(validate_label("2loop").is_err());
/// assert!(validate_label("").is_err());
/// ```
pub fn validate_label(name: &str) -> Result<(), AsmErrKind> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    match valid {
        true  => Ok(()),
        false => Err(AsmErrKind::InvalidLabelName(name.to_string())),
    }
}

/// Parses a register word (`$0` through `$7`).
///
/// ```
/// use e20_asm::parse::parse_reg;
/// use e20_asm::ast::reg_consts::R5;
///
/// assert_eq!(parse_reg("$5"), Ok(R5));
/// assert!(parse_reg("$8").is_err());
/// assert!(parse_reg("r5").is_err());
/// ```
pub fn parse_reg(word: &str) -> Result<Reg, AsmErrKind> {
    word.strip_prefix('$')
        .filter(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|n| n.parse::<u8>().ok())
        .and_then(Reg::new)
        .ok_or_else(|| AsmErrKind::InvalidRegister(word.to_string()))
}

/// Parses an immediate word, which is either a label or a decimal integer.
///
/// Labels are looked up first, so a label that shadows a number wins.
/// Numbers may carry a leading `-` or `+`.
///
/// ```
/// use e20_asm::asm::SymbolTable;
/// use e20_asm::parse::{parse_imm, parse_source};
///
/// let sym = SymbolTable::new(&parse_source("halt\nEnd: halt")).unwrap();
/// assert_eq!(parse_imm("-12", &sym), Ok(-12));
/// assert_eq!(parse_imm("+7", &sym), Ok(7));
/// assert_eq!(parse_imm("end", &sym), Ok(1));
/// assert!(parse_imm("nowhere", &sym).is_err());
/// ```
pub fn parse_imm(word: &str, sym: &SymbolTable) -> Result<i32, AsmErrKind> {
    if let Some(addr) = sym.lookup_label(word) {
        return Ok(i32::from(addr));
    }

    let undefined = || AsmErrKind::UndefinedSymbolOrInvalidImmediate(word.to_string());
    if !word.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
        return Err(undefined());
    }

    word.parse::<i32>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            AsmErrKind::ImmediateOutOfRange(RangeErr::CannotFitSigned(i32::BITS))
        },
        _ => undefined(),
    })
}

/// Parses an indexed memory reference word (`offset(reg)`) into its offset and base register.
///
/// ```
/// use e20_asm::asm::SymbolTable;
/// use e20_asm::ast::reg_consts::R2;
/// use e20_asm::parse::parse_mem_ref;
///
/// let sym = SymbolTable::default();
/// assert_eq!(parse_mem_ref("-4($2)", &sym), Ok((-4, R2)));
/// assert!(parse_mem_ref("-4", &sym).is_err());
/// ```
pub fn parse_mem_ref(word: &str, sym: &SymbolTable) -> Result<(i32, Reg), AsmErrKind> {
    let invalid = || AsmErrKind::InvalidMemoryReference(word.to_string());

    let (offset, rest) = word.split_once('(').ok_or_else(invalid)?;
    let reg = match rest.split_once(')') {
        Some((reg, "")) => reg,
        Some(_) => return Err(invalid()),
        None => rest,
    };

    let offset = parse_imm(offset, sym)?;
    let reg = parse_reg(reg)?;
    Ok((offset, reg))
}
