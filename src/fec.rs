//! Forward error correction for burst payloads.
//!
//! This module provides the codecs the burst framer hands its bits to:
//! - Galois field arithmetic over GF(2^m), m ≤ 8
//! - Binary BCH syndrome decoding for the short header codes
//! - Reed-Solomon encoding and errors-and-erasures decoding
//! - Rate-1/2 convolutional encoding with puncture schedules
//!
//! All tables (field logarithms, BCH syndromes, RS generator polynomials) are
//! built once and only read afterwards, so a single instance can be shared
//! between threads.

use crate::error::Result;

/// Trait for block codes that work on byte-per-symbol buffers
pub trait ErrorCorrection {
    /// Encode data with error correction symbols
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decode data and correct errors if possible
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Binary BCH codes
pub mod bch;
/// GF(2^m) arithmetic
pub mod galois;
/// Convolutional encoder and puncture schedules
pub mod puncture;
/// Reed-Solomon codes
pub mod reed_solomon;

#[cfg(test)]
mod tests;

pub use bch::{BchCode, Codeword, Repaired, UNCORRECTABLE};
pub use galois::GaloisField;
pub use puncture::{ConvolutionalEncoder, PunctureSchedule};
pub use reed_solomon::{Decoded, ReedSolomon, RsFrameCodec};
