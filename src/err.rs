//! Error interface for this crate.
//!
//! Every error type raised while assembling implements [`Error`],
//! which lets a front end print the offending source line and a hint
//! without knowing which stage the error came from.

use std::borrow::Cow;

/// Unified error interface for all errors in this crate.
///
/// Note that the [`std::fmt::Display`] implementation is used for the brief message
/// of the error (e.g., "label was defined multiple times").
pub trait Error: std::error::Error {
    /// The 1-based source line this error is associated with (if there is one).
    ///
    /// File-level errors (such as failing to open the source) have no line.
    fn line(&self) -> Option<usize> {
        None
    }

    /// A clarifying message to help aid someone in how to fix the message.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}
