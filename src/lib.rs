//! Error correction and framing for burst-mode satellite captures.
//!
//! * [`fec`]: Galois fields, binary BCH, Reed-Solomon errors-and-erasures
//!   decoding, convolutional encoding and puncturing
//! * [`burst`]: capture record parsing, bit order, de-interleaving, access
//!   codes, checksums and the channel plan
//! * [`registry`]: the code tables built once at start-up
//! * [`pipeline`]: per-record correction and batch decoding

pub mod burst;
pub mod config;
pub mod error;
pub mod fec;
pub mod pipeline;
pub mod registry;

pub use burst::{AccessCode, Frame};
pub use config::{BchConfig, DecoderConfig, RsConfig};
pub use error::{Error, Result};
pub use fec::{BchCode, Codeword, ErrorCorrection, GaloisField, ReedSolomon, RsFrameCodec};
pub use pipeline::{BatchReport, BatchStats, BurstDecoder, DecodedBurst};
pub use registry::{CodeRegistry, RsProfile};
