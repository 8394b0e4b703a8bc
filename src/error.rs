//! Error type shared by every codec and the burst framer.
//!
//! Per-record failures (`Parse`, `InputTooShort`, `Uncorrectable`,
//! `LocatorNotFound`, `UncorrectableMessage`) are local to one burst and never
//! abort a batch. `Config` is only produced while building fields, codes and
//! the registry, before any record is processed.

use thiserror::Error;

/// Errors produced while parsing, normalizing or correcting bursts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Arguments that do not fit the operation (lengths, symbol ranges, positions)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Capture record did not match the expected layout
    #[error("unable to parse line: {line}")]
    Parse { line: String },

    /// Bit vector shorter than the minimum a stream needs
    #[error("bitstream too short: need at least {required} bits, got {actual}")]
    InputTooShort { required: usize, actual: usize },

    /// Field inverse of zero requested
    #[error("division by zero in Galois field")]
    DivisionByZero,

    /// BCH brute-force search found no correction within capacity
    #[error("uncorrectable {bits}-bit BCH word")]
    Uncorrectable { bits: usize },

    /// Chien search root count disagrees with the locator degree
    #[error("could not locate errors: found {found} roots for a locator of degree {expected}")]
    LocatorNotFound { found: usize, expected: usize },

    /// Reed-Solomon decoding could not produce a consistent codeword
    #[error("uncorrectable message: {0}")]
    UncorrectableMessage(&'static str),

    /// Inconsistent field or code parameters
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::InputTooShort {
            required: 24,
            actual: 10,
        };
        assert_eq!(
            err.to_string(),
            "bitstream too short: need at least 24 bits, got 10"
        );

        let err = Error::LocatorNotFound {
            found: 1,
            expected: 3,
        };
        assert!(err.to_string().contains("degree 3"));
    }
}
