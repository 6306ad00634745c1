//! Formatters which can read and write memory images to disk.
//!
//! The [`ImageFormat`] trait describes an implementation of reading/writing memory images.
//! This module provides implementations of the trait:
//! - [`MemFormat`]: A text listing of each memory word, suitable for initializing simulated RAM
//! - [`BinaryFormat`]: A raw binary representation of the memory words
//!
//! Neither format carries the symbol table, so a deserialized image never has one.

use super::Image;

/// A trait defining memory image formats.
pub trait ImageFormat {
    /// Representation of the serialized format.
    ///
    /// For binary formats, `[u8]` should be used.
    /// For text-based formats,`str` should be used.
    type Stream: ToOwned + ?Sized;
    /// Serializes into the stream format.
    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned;
    /// Deserializes from the stream format, returning `None`
    /// if an error occurred during deserialization.
    fn deserialize(i: &Self::Stream) -> Option<Image>;
}

// TEXT!
/// A text listing of memory image data.
///
/// Each word is written on its own line, in address order:
///
/// ```text
/// ram[0] = 16'b0010000010000101;
/// ram[1] = 16'b0100000000000000;
/// ```
///
/// An empty image is an empty listing.
pub struct MemFormat;

const MFMT_PREFIX: &str = "ram[";
const MFMT_BITS: &str = "16'b";

impl ImageFormat for MemFormat {
    type Stream = str;

    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned {
        o.addr_iter()
            .map(|(addr, word)| format!("{MFMT_PREFIX}{addr}] = {MFMT_BITS}{word:016b};\n"))
            .collect()
    }

    fn deserialize(string: &Self::Stream) -> Option<Image> {
        let mut words = vec![];

        for line in string.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let (index, rest) = line.strip_prefix(MFMT_PREFIX)?.split_once(']')?;
            let bits = rest.trim_start()
                .strip_prefix('=')?
                .trim_start()
                .strip_prefix(MFMT_BITS)?
                .strip_suffix(';')?;

            // Words must be listed contiguously from address 0.
            if index.parse::<usize>().ok()? != words.len() { return None; }
            if bits.len() != 16 || !bits.bytes().all(|b| matches!(b, b'0' | b'1')) { return None; }

            words.push(u16::from_str_radix(bits, 2).ok()?);
        }

        Some(Image::from_words(words))
    }
}

// BINARY!
/// A binary format of memory image data.
///
/// The image is stored as its words in address order,
/// each written as two little-endian bytes. There is no header.
pub struct BinaryFormat;

impl ImageFormat for BinaryFormat {
    type Stream = [u8];

    fn serialize(o: &Image) -> <Self::Stream as ToOwned>::Owned {
        o.words()
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect()
    }

    fn deserialize(vec: &Self::Stream) -> Option<Image> {
        let chunks = vec.chunks_exact(2);
        if !chunks.remainder().is_empty() { return None; }

        let words = chunks
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        Some(Image::from_words(words))
    }
}
