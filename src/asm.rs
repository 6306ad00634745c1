//! Assembling E20 source code into memory images.
//!
//! This module is used to convert source code into the sequence of 16-bit words
//! that E20 memory is initialized with.
//!
//! The assembler module notably consists of:
//! - [`assemble`] and [`assemble_debug`]: The main functions which assemble source code into an image.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores the address of every label after the first assembler pass
//! - [`Image`]: a struct holding the assembled words, which can be written out with one of the formats in [`encoding`]
//!
//! Assembly runs in two passes over the statements produced by [`parse_source`]:
//! 1. [`SymbolTable::new`] assigns every line its address and records every label.
//! 2. The image is built by parsing operands, expanding pseudo-instructions, and encoding each
//!    instruction or `.fill` in source order.
//!
//! The first error stops assembly.

pub mod encoding;

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::ast::asm::AsmInstr;
use crate::ast::RangeErr;
use crate::parse::{parse_imm, parse_source, validate_label, Stmt, StmtKind};

/// The most words a program can assemble to.
///
/// This is the size of the space addressable by `j` and `jal` (13 bits).
pub const MAX_WORDS: usize = 1 << 13;
/// The most labels a program can define.
pub const MAX_LABELS: usize = 1 << 13;

/// Assembles E20 source code into an image.
///
/// This function assembles the source *without* keeping the symbol table
/// in the image. See [`assemble_debug`] to keep it.
///
/// # Example
/// ```
/// use e20_asm::asm::assemble;
///
/// let src = "
///     start: addi $1, $0, 5
///            j start
/// ";
///
/// let image = assemble(src).unwrap();
/// assert_eq!(image.words(), &[0x2085, 0x4000]);
///
/// // Symbol table doesn't exist in image:
/// assert!(image.symbol_table().is_none());
/// ```
pub fn assemble(src: &str) -> Result<Image, AsmErr> {
    let stmts = parse_source(src);
    let sym = SymbolTable::new(&stmts)?;
    Image::new(&stmts, sym, false)
}
/// Assembles E20 source code into an image.
///
/// This function assembles the source *and* keeps the symbol table in the image,
/// so labels and source lines can be mapped to addresses afterwards.
///
/// # Example
/// ```
/// use e20_asm::asm::assemble_debug;
///
/// let src = "
///     start: addi $1, $0, 5
///            j start
/// ";
///
/// let image = assemble_debug(src).unwrap();
/// let sym = image.symbol_table().unwrap();
/// assert_eq!(sym.lookup_label("START"), Some(0));
/// assert_eq!(sym.lookup_line(3), Some(1));
/// ```
pub fn assemble_debug(src: &str) -> Result<Image, AsmErr> {
    let stmts = parse_source(src);
    let sym = SymbolTable::new(&stmts)?;
    Image::new(&stmts, sym, true)
}

/// Kinds of errors that can occur from assembling given assembly code.
///
/// See [`AsmErr`] for this error type with line information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsmErrKind {
    /// There were multiple labels of the same (case-insensitive) name (pass 1).
    DuplicateLabel(String),
    /// Label is not an identifier (pass 1).
    InvalidLabelName(String),
    /// Register operand was malformed or not between `$0` and `$7` (pass 2).
    InvalidRegister(String),
    /// Operand is neither a known label nor a decimal integer (pass 2).
    UndefinedSymbolOrInvalidImmediate(String),
    /// Operand is not of the form `offset(reg)` (pass 2).
    InvalidMemoryReference(String),
    /// Instruction or directive has the wrong number of operands (pass 2).
    BadOperandCount {
        /// The number of operands the mnemonic takes.
        expected: usize,
        /// The number of operands written.
        found: usize
    },
    /// Immediate does not fit in its field (pass 2).
    ImmediateOutOfRange(RangeErr),
    /// Mnemonic is not an instruction or pseudo-instruction (pass 2).
    UnknownOpcode(String),
    /// More than [`MAX_LABELS`] labels were defined (pass 1).
    TooManyLabels,
    /// More than [`MAX_WORDS`] words would be assembled (pass 1).
    ProgramTooLarge,
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateLabel(l)         => write!(f, "label `{l}` was defined multiple times"),
            Self::InvalidLabelName(l)       => write!(f, "invalid label name `{l}`"),
            Self::InvalidRegister(r)        => write!(f, "invalid register `{r}`"),
            Self::UndefinedSymbolOrInvalidImmediate(w) => write!(f, "`{w}` is not a defined label or a decimal integer"),
            Self::InvalidMemoryReference(w) => write!(f, "invalid memory reference `{w}`"),
            Self::BadOperandCount { expected, found } => write!(f, "expected {expected} operand(s), found {found}"),
            Self::ImmediateOutOfRange(e)    => e.fmt(f),
            Self::UnknownOpcode(op)         => write!(f, "unknown instruction `{op}`"),
            Self::TooManyLabels             => write!(f, "too many labels (at most {MAX_LABELS})"),
            Self::ProgramTooLarge           => write!(f, "program is too large (at most {MAX_WORDS} words)"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct AsmErr {
    /// The kind of error.
    pub kind: AsmErrKind,
    /// The 1-based source line being assembled when this error occurred.
    pub line: usize
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new(kind: AsmErrKind, line: usize) -> Self {
        AsmErr { kind, line }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            AsmErrKind::ImmediateOutOfRange(e) => Some(e),
            _ => None
        }
    }
}
impl crate::err::Error for AsmErr {
    fn line(&self) -> Option<usize> {
        Some(self.line)
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::DuplicateLabel(_)         => Some("labels are case-insensitive and must be unique within a file, try renaming one of the labels".into()),
            AsmErrKind::InvalidLabelName(_)       => Some("a label starts with a letter or underscore, followed by letters, digits, or underscores".into()),
            AsmErrKind::InvalidRegister(r)        => match r.strip_prefix('$').map(str::parse::<u64>) {
                Some(Ok(_)) => Some("there are only 8 registers, $0 through $7".into()),
                _ => Some("a register is written as `$` followed by its number (e.g., `$3`)".into()),
            },
            AsmErrKind::UndefinedSymbolOrInvalidImmediate(_) => Some("try defining this label, or writing a decimal integer".into()),
            AsmErrKind::InvalidMemoryReference(_) => Some("a memory reference is written as `offset(register)` (e.g., `-2($3)`)".into()),
            AsmErrKind::BadOperandCount { .. }    => None,
            AsmErrKind::ImmediateOutOfRange(e)    => crate::err::Error::help(e),
            AsmErrKind::UnknownOpcode(_)          => Some("the instructions are add, sub, or, and, slt, jr, addi, slti, lw, sw, jeq, j, jal, movi, nop, and halt".into()),
            AsmErrKind::TooManyLabels             => None,
            AsmErrKind::ProgramTooLarge           => Some("j and jal can only reach the first 8192 words of memory".into()),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
struct SymbolData {
    addr: u16,
    line: usize
}

/// The symbol table created in the first assembler pass.
///
/// The symbol table consists of:
/// - A mapping from labels to the address of the word they are attached to.
/// - A mapping from each source line that emits a word to that word's address.
///
/// Labels are case-insensitive.
///
/// Here is a table of the mappings that the symbol table provides:
///
/// | from ↓, to →   | label                              | memory address                | source line                       |
/// |----------------|------------------------------------|-------------------------------|-----------------------------------|
/// | label          | -                                  | [`SymbolTable::lookup_label`] | [`SymbolTable::get_label_line`]   |
/// | memory address | [`SymbolTable::rev_lookup_labels`] | -                             | [`SymbolTable::rev_lookup_line`]  |
/// | source line    | none                               | [`SymbolTable::lookup_line`]  | -                                 |
///
/// After assembly, the table is dropped unless [`assemble_debug`] was used,
/// in which case it is kept in the resulting [`Image`].
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct SymbolTable {
    /// A mapping from (lowercase) label to address and definition line.
    label_map: HashMap<String, SymbolData>,

    /// A mapping from source line to the address of the word emitted by that line.
    line_map: BTreeMap<usize, u16>,
}

impl SymbolTable {
    /// Creates a new symbol table.
    ///
    /// This performs the first assembler pass, calculating the address of
    /// each label and each statement.
    ///
    /// ## Example
    /// ```
    /// use e20_asm::parse::parse_source;
    /// use e20_asm::asm::SymbolTable;
    ///
    /// let src = "
    ///     LOOP:
    ///         addi $1, $1, 1
    ///         j LOOP
    ///     LOOP2:
    ///         addi $1, $1, 2
    ///         j LOOP2
    /// ";
    /// let stmts = parse_source(src);
    ///
    /// let sym = SymbolTable::new(&stmts).unwrap();
    /// assert_eq!(sym.lookup_label("LOOP"), Some(0));
    /// assert_eq!(sym.lookup_label("loop2"), Some(2));
    /// assert_eq!(sym.lookup_label("LOOP_DE_LOOP"), None);
    /// ```
    pub fn new(stmts: &[Stmt<'_>]) -> Result<Self, AsmErr> {
        let mut sym = SymbolTable::default();
        // The location counter: the address of the next word.
        let mut lc: u16 = 0;

        for stmt in stmts {
            for &label in &stmt.labels {
                validate_label(label)
                    .and_then(|()| sym.insert(label, lc, stmt.line))
                    .map_err(|e| AsmErr::new(e, stmt.line))?;
            }

            if stmt.nucleus.as_ref().is_some_and(StmtKind::emits_word) {
                if usize::from(lc) >= MAX_WORDS {
                    return Err(AsmErr::new(AsmErrKind::ProgramTooLarge, stmt.line));
                }
                sym.line_map.insert(stmt.line, lc);
                lc += 1;
            }
        }

        log::debug!("pass 1: {} label(s), {} word(s)", sym.label_map.len(), lc);
        Ok(sym)
    }

    /// Adds a label at the given address.
    ///
    /// This fails if a label with the same (case-insensitive) name already exists,
    /// or if the table is full.
    pub fn insert(&mut self, label: &str, addr: u16, line: usize) -> Result<(), AsmErrKind> {
        let len = self.label_map.len();
        match self.label_map.entry(label.to_lowercase()) {
            Entry::Occupied(_) => Err(AsmErrKind::DuplicateLabel(label.to_string())),
            Entry::Vacant(_) if len >= MAX_LABELS => Err(AsmErrKind::TooManyLabels),
            Entry::Vacant(e) => {
                e.insert(SymbolData { addr, line });
                Ok(())
            }
        }
    }

    /// Gets the address of a given label (if it exists).
    pub fn lookup_label(&self, label: &str) -> Option<u16> {
        self.label_map.get(&label.to_lowercase()).map(|data| data.addr)
    }

    /// Gets the labels at a given address, in alphabetical order.
    ///
    /// ## Example
    /// ```
    /// use e20_asm::parse::parse_source;
    /// use e20_asm::asm::SymbolTable;
    ///
    /// let sym = SymbolTable::new(&parse_source("main: start: nop\nend: halt")).unwrap();
    /// assert_eq!(sym.rev_lookup_labels(0), ["main", "start"]);
    /// assert_eq!(sym.rev_lookup_labels(1), ["end"]);
    /// assert!(sym.rev_lookup_labels(2).is_empty());
    /// ```
    pub fn rev_lookup_labels(&self, addr: u16) -> Vec<&str> {
        let mut labels: Vec<_> = self.label_map.iter()
            .filter(|(_, data)| data.addr == addr)
            .map(|(label, _)| label.as_str())
            .collect();
        labels.sort_unstable();
        labels
    }

    /// Gets the 1-based source line where a given label was defined (if it exists).
    pub fn get_label_line(&self, label: &str) -> Option<usize> {
        self.label_map.get(&label.to_lowercase()).map(|data| data.line)
    }

    /// Gets the address of the word emitted by a given 1-based source line.
    ///
    /// Lines that don't emit a word (blank lines, comments, labels alone,
    /// and directives other than `.fill`) have no address.
    ///
    /// ## Example
    /// ```
    /// use e20_asm::parse::parse_source;
    /// use e20_asm::asm::SymbolTable;
    ///
    /// let src = "# line 1
    /// loop:             # 2
    ///     nop           # 3
    ///                   # 4
    ///     .fill 7       # 5
    ///     .align 4      # 6
    ///     j loop        # 7
    /// ";
    /// let sym = SymbolTable::new(&parse_source(src)).unwrap();
    /// assert_eq!(sym.lookup_line(1), None);
    /// assert_eq!(sym.lookup_line(2), None);
    /// assert_eq!(sym.lookup_line(3), Some(0));
    /// assert_eq!(sym.lookup_line(5), Some(1));
    /// assert_eq!(sym.lookup_line(6), None);
    /// assert_eq!(sym.lookup_line(7), Some(2));
    /// ```
    pub fn lookup_line(&self, line: usize) -> Option<u16> {
        self.line_map.get(&line).copied()
    }

    /// Gets the 1-based source line which emitted the word at a given address (if it exists).
    pub fn rev_lookup_line(&self, addr: u16) -> Option<usize> {
        self.line_map.iter()
            .find(|&(_, &a)| a == addr)
            .map(|(&line, _)| line)
    }

    /// Gets an iterable of the mapping from (lowercase) labels to addresses.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, u16)> + '_ {
        self.label_map.iter()
            .map(|(label, data)| (label.as_str(), data.addr))
    }

    /// Gets an iterable of the mapping from source lines to addresses.
    pub fn line_iter(&self) -> impl Iterator<Item=(usize, u16)> + '_ {
        self.line_map.iter()
            .map(|(&line, &addr)| (line, addr))
    }
}

/// Computes the word for a `.fill` directive.
///
/// Negative values are stored as their 16-bit two's complement pattern,
/// and anything wider than 16 bits is truncated.
fn fill_word(args: &[&str], sym: &SymbolTable) -> Result<u16, AsmErrKind> {
    let [value] = args else {
        return Err(AsmErrKind::BadOperandCount { expected: 1, found: args.len() });
    };

    parse_imm(value, sym).map(|v| v as u16)
}

/// An assembled memory image.
///
/// This is the final product after assembly source code is fully assembled.
/// Word `i` of the image is the word at address `i`.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Image {
    /// The words, in address order.
    words: Vec<u16>,

    /// Debug symbols.
    sym: Option<SymbolTable>
}
impl Image {
    /// Creates an image holding the given words (and no symbol table).
    pub fn from_words(words: Vec<u16>) -> Self {
        Image { words, sym: None }
    }

    /// Creates a new image from statements and a symbol table.
    ///
    /// This performs the second assembler pass.
    fn new(stmts: &[Stmt<'_>], sym: SymbolTable, debug: bool) -> Result<Self, AsmErr> {
        let mut words = Vec::with_capacity(sym.line_map.len());

        for stmt in stmts {
            let Some(nucleus) = &stmt.nucleus else { continue };

            // Pass 1 guarantees there are at most MAX_WORDS words.
            let pc = words.len() as u16;
            let word = match nucleus {
                StmtKind::Directive { name, args } if name.eq_ignore_ascii_case("fill") => fill_word(args, &sym),
                StmtKind::Directive { name, .. } => {
                    log::debug!("line {}: ignoring unsupported directive .{name}", stmt.line);
                    continue;
                },
                StmtKind::Instr { mnemonic, operands } => {
                    AsmInstr::parse(mnemonic, operands, &sym)
                        .and_then(|instr| instr.into_sim_instr(pc))
                        .map(|sim| sim.encode())
                },
            }.map_err(|e| AsmErr::new(e, stmt.line))?;

            debug_assert_eq!(sym.lookup_line(stmt.line), Some(pc), "pass 1 and pass 2 disagree on the address of line {}", stmt.line);
            log::trace!("x{pc:04X}: {word:016b} (line {})", stmt.line);
            words.push(word);
        }

        log::debug!("pass 2: {} word(s)", words.len());
        Ok(Self {
            words,
            sym: debug.then_some(sym),
        })
    }

    /// The assembled words, in address order.
    pub fn words(&self) -> &[u16] {
        &self.words
    }
    /// The number of words in the image.
    pub fn len(&self) -> usize {
        self.words.len()
    }
    /// Whether the image has no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
    /// Gets an iterator over every address in the image and the word there.
    pub fn addr_iter(&self) -> impl Iterator<Item=(u16, u16)> + '_ {
        self.words.iter()
            .enumerate()
            .map(|(i, &word)| (i as u16, word))
    }
    /// Gets the symbol table if it is present in the image.
    pub fn symbol_table(&self) -> Option<&SymbolTable> {
        self.sym.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::fmt::Write;

    use crate::ast::sim::SimInstr;
    use crate::ast::RangeErr;

    use super::encoding::{BinaryFormat, ImageFormat, MemFormat};
    use super::{assemble, assemble_debug, AsmErr, AsmErrKind, Image, MAX_LABELS, MAX_WORDS};

    fn assemble_src(src: &str) -> Result<Image, AsmErr> {
        assemble_debug(src)
    }
    fn assert_asm_fail<T: std::fmt::Debug>(r: Result<T, AsmErr>, kind: AsmErrKind, line: usize) {
        assert_eq!(r.unwrap_err(), AsmErr::new(kind, line));
    }
    fn word_of(src: &str) -> u16 {
        let image = assemble(src).unwrap();
        assert_eq!(image.len(), 1, "expected {src:?} to assemble to one word");
        image.words()[0]
    }

    #[test]
    fn test_end_to_end() {
        let src = "
            start: addi $1,$0,5
                   j start
        ";
        let image = assemble(src).unwrap();
        assert_eq!(image.words(), &[0x2085, 0x4000]);
        assert_eq!(image.addr_iter().collect::<Vec<_>>(), [(0, 0x2085), (1, 0x4000)]);
    }

    #[test]
    fn test_sym_basic() {
        let src = "
            a: add $1, $2, $3
            and $1, $1, $1

            c: add $1, $1, $1   # comment
            d: lw $1, -1($2)
            halt
            # only a comment
            b: e:
            .text
            halt
            f: jal a
            .fill 10
            g:
        ";

        let image = assemble_src(src).unwrap();
        let sym = image.symbol_table().unwrap();
        assert_eq!(sym.lookup_label("a"), Some(0));
        assert_eq!(sym.lookup_label("c"), Some(2));
        assert_eq!(sym.lookup_label("d"), Some(3));
        assert_eq!(sym.lookup_label("b"), Some(5));
        assert_eq!(sym.lookup_label("e"), Some(5));
        assert_eq!(sym.lookup_label("f"), Some(6));
        assert_eq!(sym.lookup_label("g"), Some(8));
        assert_eq!(image.len(), 8);

        let mut lines: Vec<_> = sym.line_iter().collect();
        lines.sort();
        assert_eq!(lines, [(2, 0), (3, 1), (5, 2), (6, 3), (7, 4), (11, 5), (12, 6), (13, 7)]);
        assert_eq!(sym.rev_lookup_line(5), Some(11));
        assert_eq!(sym.rev_lookup_line(8), None);
        assert_eq!(sym.get_label_line("G"), Some(14));
    }

    #[test]
    fn test_forward_references() {
        let src = "
                jeq $1, $0, done
                j done
                jal done
                lw $2, done($0)
                .fill done
            done:
                halt
        ";
        let image = assemble(src).unwrap();
        let listing: Vec<_> = image.words().iter()
            .map(|&w| SimInstr::decode(w).map(|i| i.to_string()))
            .collect();
        assert_eq!(listing[..4], [
            Some("jeq $1, $0, 4".to_string()),
            Some("j 5".to_string()),
            Some("jal 5".to_string()),
            Some("lw $2, 5($0)".to_string()),
        ]);
        assert_eq!(image.words()[4], 5);
        assert_eq!(listing[5].as_deref(), Some("j 5"));
    }

    #[test]
    fn test_label_round_trip() {
        let src = "
            nop
            nop
            target: nop
            nop
            j target
            jal TARGET
            jeq $0, $0, Target
            .fill target
            jeq $0, $0, early
            early: nop
        ";
        let image = assemble(src).unwrap();
        let words = image.words();

        let Some(SimInstr::J(t)) = SimInstr::decode(words[4]) else { panic!("expected j") };
        assert_eq!(t.get(), 2);
        let Some(SimInstr::JAL(t)) = SimInstr::decode(words[5]) else { panic!("expected jal") };
        assert_eq!(t.get(), 2);
        // jeq at address 6 stores 2 - (6 + 1)
        let Some(SimInstr::JEQ(_, _, rel)) = SimInstr::decode(words[6]) else { panic!("expected jeq") };
        assert_eq!(rel.get(), -5);
        assert_eq!(words[7], 2);
        // branch to the very next word is an offset of 0
        let Some(SimInstr::JEQ(_, _, rel)) = SimInstr::decode(words[8]) else { panic!("expected jeq") };
        assert_eq!(rel.get(), 0);
    }

    #[test]
    fn test_pseudo_equivalence() {
        assert_eq!(word_of("movi $1,5"), word_of("addi $1,$0,5"));
        assert_eq!(word_of("movi $7, -64"), word_of("addi $7, $0, -64"));
        assert_eq!(word_of("nop"), word_of("add $0,$0,$0"));
        assert_eq!(word_of("nop"), 0x0000);

        // halt jumps to its own address
        let image = assemble("nop\nnop\nnop\nhalt").unwrap();
        assert_eq!(image.words()[3], (2 << 13) | 3);
        assert_eq!(image.words()[3], assemble("nop\nnop\nnop\nj 3").unwrap().words()[3]);
    }

    #[test]
    fn test_every_instruction() {
        let src = "
            add $3, $1, $2
            sub $3, $1, $2
            or $3, $1, $2
            and $3, $1, $2
            slt $3, $1, $2
            jr $7
            addi $2, $3, -1
            slti $2, $3, 63
            lw $4, -64($5)
            sw $6, 0($1)
            jeq $1, $2, 0
            j 8191
            jal 0
        ";
        let image = assemble(src).unwrap();
        assert_eq!(image.words(), &[
            0b000_001_010_011_0000,
            0b000_001_010_011_0001,
            0b000_001_010_011_0010,
            0b000_001_010_011_0011,
            0b000_001_010_011_0100,
            0b000_111_000_000_1000,
            0b001_011_010_1111111,
            0b111_011_010_0111111,
            0b100_101_100_1000000,
            0b101_001_110_0000000,
            0b110_001_010_1110101, // 0 - (10 + 1) = -11
            0b010_1111111111111,
            0b011_0000000000000,
        ]);
    }

    #[test]
    fn test_case_insensitive() {
        let src = "
            Main: ADDI $1, $0, 1
            JEQ $1, $0, MAIN
            .FILL main
        ";
        let image = assemble(src).unwrap();
        assert_eq!(image.words(), assemble("main: addi $1, $0, 1\njeq $1, $0, main\n.fill main").unwrap().words());
    }

    #[test]
    fn test_fill() {
        let image = assemble(".fill 0\n.fill 65535\n.fill -1\n.fill -32768\n.fill 65536\n.fill +7").unwrap();
        assert_eq!(image.words(), &[0x0000, 0xFFFF, 0xFFFF, 0x8000, 0x0000, 0x0007]);

        assert_asm_fail(assemble(".fill"), AsmErrKind::BadOperandCount { expected: 1, found: 0 }, 1);
        assert_asm_fail(assemble("\n.fill 1 2"), AsmErrKind::BadOperandCount { expected: 1, found: 2 }, 2);
        assert_asm_fail(assemble(".fill nowhere"), AsmErrKind::UndefinedSymbolOrInvalidImmediate("nowhere".to_string()), 1);
    }

    #[test]
    fn test_unsupported_directives_skipped() {
        let image = assemble_src("
            .text
            a: .data 1 2 3
            halt
        ").unwrap();
        assert_eq!(image.words(), &[0x4000]);
        assert_eq!(image.symbol_table().unwrap().lookup_label("a"), Some(0));
    }

    #[test]
    fn test_empty() {
        let image = assemble("").unwrap();
        assert!(image.is_empty());
        let image = assemble("# nothing\n\n   \nonly_a_label:\n").unwrap();
        assert!(image.is_empty());
    }

    #[test]
    fn test_duplicate_labels() {
        let src = "
            Loop: nop
            loop: nop
        ";
        assert_asm_fail(assemble(src), AsmErrKind::DuplicateLabel("loop".to_string()), 3);

        // duplicates on the same line
        assert_asm_fail(assemble("x: X: nop"), AsmErrKind::DuplicateLabel("X".to_string()), 1);
    }

    #[test]
    fn test_pass_1_errors_come_first() {
        // the register error on line 1 is only found in pass 2,
        // after pass 1 has found the bad label on line 2
        let src = "
            add $9, $0, $0
            9lives: nop
        ";
        assert_asm_fail(assemble(src), AsmErrKind::InvalidLabelName("9lives".to_string()), 3);
    }

    #[test]
    fn test_error_lines() {
        assert_asm_fail(assemble("nop\n\nadd $1, $2"), AsmErrKind::BadOperandCount { expected: 3, found: 2 }, 3);
        assert_asm_fail(assemble("nop\nmul $1, $2, $3"), AsmErrKind::UnknownOpcode("mul".to_string()), 2);
        assert_asm_fail(assemble("jr $8"), AsmErrKind::InvalidRegister("$8".to_string()), 1);
        assert_asm_fail(assemble("jr r1"), AsmErrKind::InvalidRegister("r1".to_string()), 1);
        assert_asm_fail(assemble("j later"), AsmErrKind::UndefinedSymbolOrInvalidImmediate("later".to_string()), 1);
        assert_asm_fail(assemble("sw $1, $2"), AsmErrKind::InvalidMemoryReference("$2".to_string()), 1);
        assert_asm_fail(assemble("movi $1"), AsmErrKind::BadOperandCount { expected: 2, found: 1 }, 1);
        assert_asm_fail(assemble(": nop"), AsmErrKind::InvalidLabelName(String::new()), 1);
    }

    #[test]
    fn test_range_enforcement() {
        let range7 = AsmErrKind::ImmediateOutOfRange(RangeErr::CannotFitSigned(7));
        let range13 = AsmErrKind::ImmediateOutOfRange(RangeErr::CannotFitUnsigned(13));

        assert_eq!(word_of("addi $1, $0, 63") & 0x7F, 63);
        assert_eq!(word_of("addi $1, $0, -64") & 0x7F, 0b100_0000);
        assert_asm_fail(assemble("addi $1, $0, 64"), range7.clone(), 1);
        assert_asm_fail(assemble("addi $1, $0, -65"), range7.clone(), 1);
        assert_asm_fail(assemble("lw $1, 64($0)"), range7.clone(), 1);
        assert_asm_fail(assemble("movi $1, 100"), range7.clone(), 1);
        assert_asm_fail(assemble("j -1"), range13.clone(), 1);
        assert_asm_fail(assemble("jal 8192"), range13, 1);

        // a branch 64 words forward is out of range, 63 is not
        let mut src = String::from("jeq $0, $0, far\n");
        for _ in 0..63 {
            src.push_str("nop\n");
        }
        src.push_str("far: halt\n");
        assert!(assemble(&src).is_ok());
        src.insert_str(0, "jeq $0, $0, far\n");
        assert_asm_fail(assemble(&src), range7, 1);
    }

    #[test]
    fn test_program_too_large() {
        let src = "nop\n".repeat(MAX_WORDS);
        assert_eq!(assemble(&src).unwrap().len(), MAX_WORDS);

        let src = "nop\n".repeat(MAX_WORDS + 1);
        assert_asm_fail(assemble(&src), AsmErrKind::ProgramTooLarge, MAX_WORDS + 1);

        // trailing labels and ignored directives don't need room
        let src = "nop\n".repeat(MAX_WORDS) + "end:\n.text\n";
        assert!(assemble(&src).is_ok());
    }

    #[test]
    fn test_too_many_labels() {
        let mut src = String::new();
        for i in 0..MAX_LABELS {
            writeln!(src, "l{i}:").unwrap();
        }
        assert!(assemble(&src).is_ok());

        writeln!(src, "one_more: halt").unwrap();
        assert_asm_fail(assemble(&src), AsmErrKind::TooManyLabels, MAX_LABELS + 1);
    }

    #[test]
    fn test_deterministic() {
        let src = "
            main: movi $1, 10
            loop: jeq $1, $0, end
                  addi $1, $1, -1
                  j loop
            end:  halt
            data: .fill -2
        ";
        let a = assemble_src(src).unwrap();
        let b = assemble_src(src).unwrap();
        assert_eq!(a, b);
        assert_eq!(MemFormat::serialize(&a), MemFormat::serialize(&b));
    }

    #[test]
    fn test_ser_deser() {
        let src = "
            main: movi $1, 10
            loop: jeq $1, $0, end
                  addi $1, $1, -1
                  j loop
            end:  halt
            data: .fill -2
        ";
        let image = assemble(src).unwrap();

        // Binary format
        let ser = BinaryFormat::serialize(&image);
        let de = BinaryFormat::deserialize(&ser).expect("binary encoding should've been parseable");
        assert_eq!(de, image, "binary encoding could not be roundtripped");

        // Text format
        let ser = MemFormat::serialize(&image);
        let de = MemFormat::deserialize(&ser).expect("text encoding should've been parseable");
        assert_eq!(de, image, "text encoding could not be roundtripped");
    }

    #[test]
    fn test_err_help() {
        use crate::err::Error;

        let err = AsmErr::new(AsmErrKind::InvalidRegister("$9".to_string()), 1);
        assert_eq!(err.help().as_deref(), Some("there are only 8 registers, $0 through $7"));
        let err = AsmErr::new(AsmErrKind::InvalidRegister("%1".to_string()), 1);
        assert_eq!(err.help().as_deref(), Some("a register is written as `$` followed by its number (e.g., `$3`)"));

        let err = assemble("addi $1, $0, 99").unwrap_err();
        assert_eq!(err.line(), Some(1));
        assert_eq!(err.to_string(), "value is too big for signed 7-bit integer");
        assert_eq!(err.help().as_deref(), Some("the range for a signed 7-bit integer is [-64, 63]"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
