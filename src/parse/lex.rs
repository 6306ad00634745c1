//! Tokenizing E20 assembly.
//!
//! This module holds the tokens that characterize E20 assembly ([`Token`]).
//! This module is used by the parser to split each source line into
//! the words that make up its labels, mnemonic, and operands.
//!
//! E20 assembly has a deliberately loose surface syntax: anything that isn't
//! whitespace, a comma, or the start of a comment is part of a word.
//! Working out what a word means (register, immediate, label, ...) is left
//! to the operand parsers in [`crate::parse`].

use logos::Logos;

/// A unit of information in E20 source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone, Copy)]
#[logos(skip r"[\s,]+")]
pub enum Token<'s> {
    /// A run of characters delimited by whitespace, commas, or a comment
    /// (e.g., `loop:`, `addi`, `$1`, `-5`, `8($2)`, `.fill`).
    #[regex(r"[^\s,#]+", |lx| lx.slice())]
    Word(&'s str),

    /// A comment, which starts with a `#` and spans the remaining part of the line.
    #[regex(r"#[^\r\n]*")]
    Comment,
}

/// An iterator over the words of a single line of source.
///
/// Anything after the first `#` is a comment and is not yielded.
/// The yielded words are never empty and contain no whitespace or commas.
///
/// # Example
/// ```
/// use e20_asm::parse::lex::LineTokens;
///
/// let words: Vec<_> = LineTokens::new("loop: addi $1,$1, -1  # count down").collect();
/// assert_eq!(words, ["loop:", "addi", "$1", "$1", "-1"]);
/// ```
pub struct LineTokens<'s> {
    inner: logos::Lexer<'s, Token<'s>>,
    done: bool,
}
impl<'s> LineTokens<'s> {
    /// Starts tokenizing a line.
    pub fn new(line: &'s str) -> Self {
        LineTokens { inner: Token::lexer(line), done: false }
    }
}
impl<'s> Iterator for LineTokens<'s> {
    type Item = &'s str;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done { return None; }

        match self.inner.next() {
            Some(Ok(Token::Word(word))) => Some(word),
            Some(Ok(Token::Comment)) | None => {
                self.done = true;
                None
            },
            Some(Err(())) => unreachable!("every character is part of a word, a comment, or a separator"),
        }
    }
}
impl std::iter::FusedIterator for LineTokens<'_> {}
