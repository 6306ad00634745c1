//! An E20 parser and assembler.
//!
//! E20 is a small 16-bit, 8-register instruction set used for teaching.
//! This crate turns E20 assembly text into the 16-bit machine words
//! that an E20 memory image is initialized with.
//!
//! # Usage
//!
//! Source code is split into statements and then assembled in two passes
//! (labels first, then encoding):
//! ```
//! use e20_asm::asm::{assemble, Image};
//!
//! let code = "
//!     start: addi $1, $0, 5   # r1 = 5
//!            j start
//! ";
//! let image: Image = assemble(code).unwrap();
//! assert_eq!(image.words(), &[0x2085, 0x4000]);
//! ```
//!
//! An image can then be written out in one of the formats in [`asm::encoding`]:
//! ```
//! # use e20_asm::asm::assemble;
//! use e20_asm::asm::encoding::{ImageFormat, MemFormat};
//!
//! let image = assemble("halt").unwrap();
//! assert_eq!(MemFormat::serialize(&image), "ram[0] = 16'b0100000000000000;\n");
//! ```
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod err;
