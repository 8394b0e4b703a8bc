//! Burst framing: capture record parsing and bit-level preparation.
//!
//! A demodulator emits one text record per received burst. This module turns
//! such a record into a [`Frame`], brings its bits into transmission order,
//! recognises the access code that opens every burst and splits the payload
//! into the interleaved streams the FEC layer decodes.
//!
//! - [`frame`]: record parser and the `Frame` type
//! - [`bits`]: bit reversal, de-interleaving and symbol packing
//! - [`checksum`]: 16-bit fold-and-complement checksum
//! - [`channel`]: frequency to channel conversions

use bitvec::prelude::*;
use std::fmt::{Display, Formatter};

/// Bit helpers
pub mod bits;
/// Frequency plan
pub mod channel;
/// 16-bit checksum
pub mod checksum;
/// Capture record parsing
pub mod frame;

pub use bits::{bit_distance, deinterleave, normalize_bit_order, pack_symbols, reverse_bits, unpack_symbols};
pub use checksum::checksum16;
pub use frame::{Frame, Link};

/// Access code opening every downlink burst
pub const IRIDIUM_ACCESS: &str = "001100000011000011110011";

/// Access code opening every uplink burst
pub const UPLINK_ACCESS: &str = "110011000011110011111100";

/// Length of either access code in bits
pub const ACCESS_BITS: usize = 24;

/// Which access code a burst starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessCode {
    /// Satellite to ground
    Downlink,
    /// Ground to satellite
    Uplink,
}

impl AccessCode {
    /// The access code as a bit string
    pub fn pattern(&self) -> &'static str {
        match self {
            AccessCode::Downlink => IRIDIUM_ACCESS,
            AccessCode::Uplink => UPLINK_ACCESS,
        }
    }

    /// The access code as bits
    pub fn bits(&self) -> BitVec<u8, Msb0> {
        self.pattern().chars().map(|c| c == '1').collect()
    }

    /// Access code at the start of `bits`, if any
    pub fn detect(bits: &BitSlice<u8, Msb0>) -> Option<AccessCode> {
        if bits.len() < ACCESS_BITS {
            return None;
        }
        let head = &bits[..ACCESS_BITS];
        [AccessCode::Downlink, AccessCode::Uplink]
            .into_iter()
            .find(|code| head == code.bits().as_bitslice())
    }
}

impl Display for AccessCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessCode::Downlink => write!(f, "DL"),
            AccessCode::Uplink => write!(f, "UL"),
        }
    }
}
