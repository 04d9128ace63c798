//! # Validation Errors
//!
//! Raised by the identifier validator before any network or disk access.

use thiserror::Error;

/// A client-supplied identifier failed the local syntactic check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing left after stripping the file suffix.
    #[error("asset id is empty")]
    Empty,

    /// Outside the accepted length window.
    #[error("asset id has {len} characters, expected between {min} and {max}")]
    Length {
        /// Length of the id after suffix stripping.
        len: usize,
        /// Inclusive lower bound.
        min: usize,
        /// Inclusive upper bound.
        max: usize,
    },

    /// A character outside `[A-Za-z0-9_-]`.
    #[error("asset id contains invalid character {ch:?} at position {position}")]
    InvalidCharacter {
        /// The offending character.
        ch: char,
        /// Zero-based character index.
        position: usize,
    },
}
