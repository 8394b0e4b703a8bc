//! Rate-1/2 convolutional encoding and puncturing.
//!
//! The encoder shifts each input bit into a 7-bit register and emits two
//! parity bits per input bit, one for each generator (tap) polynomial. A
//! puncture schedule then raises the rate by dropping selected output bits.
//! Punctured positions are kept as `None` placeholders so the stream stays
//! aligned with the frame clock; `compact` yields the bits actually sent and
//! `depuncture` rebuilds the aligned frame on the receive side.
//!
//! The fifteen schedules `d1a` to `d3f` all have period 6.

use crate::error::{Error, Result};
use bitvec::prelude::*;
use log::debug;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Length of the encoder shift register
pub const REGISTER_BITS: u32 = 7;

/// First generator polynomial
pub const DEFAULT_TAPS_A: u8 = 0x6D;

/// Second generator polynomial
pub const DEFAULT_TAPS_B: u8 = 0x4F;

const REGISTER_MASK: u8 = (1 << REGISTER_BITS) - 1;

/// Rate-1/2 feed-forward convolutional encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvolutionalEncoder {
    taps_a: u8,
    taps_b: u8,
    initial: u8,
}

impl ConvolutionalEncoder {
    /// Create an encoder
    ///
    /// # Arguments
    ///
    /// * `taps_a` - First generator polynomial, 7 bits, oldest register bit first
    /// * `taps_b` - Second generator polynomial
    /// * `initial` - Register contents before the first input bit
    pub fn new(taps_a: u8, taps_b: u8, initial: u8) -> Result<Self> {
        for taps in [taps_a, taps_b] {
            if taps == 0 || taps > REGISTER_MASK {
                return Err(Error::InvalidInput(format!(
                    "generator polynomial {:#x} must be a non-zero {}-bit value",
                    taps, REGISTER_BITS
                )));
            }
        }
        if initial > REGISTER_MASK {
            return Err(Error::InvalidInput(format!(
                "initial register {:#x} does not fit {} bits",
                initial, REGISTER_BITS
            )));
        }
        Ok(ConvolutionalEncoder {
            taps_a,
            taps_b,
            initial,
        })
    }

    /// Same generators, different starting register given as bits (oldest first)
    pub fn with_initial_register(self, register: &BitSlice<u8, Msb0>) -> Result<Self> {
        if register.len() != REGISTER_BITS as usize {
            return Err(Error::InvalidInput(format!(
                "initial register must have {} bits, got {}",
                REGISTER_BITS,
                register.len()
            )));
        }
        let initial = register
            .iter()
            .by_vals()
            .fold(0u8, |acc, bit| (acc << 1) | bit as u8);
        Self::new(self.taps_a, self.taps_b, initial)
    }

    /// Generator polynomials
    pub fn taps(&self) -> (u8, u8) {
        (self.taps_a, self.taps_b)
    }

    /// Encode `bits`; the output holds two bits per input bit
    pub fn encode(&self, bits: &BitSlice<u8, Msb0>) -> BitVec<u8, Msb0> {
        let mut register = self.initial;
        let mut out = BitVec::with_capacity(bits.len() * 2);

        for bit in bits.iter().by_vals() {
            register = ((register << 1) | bit as u8) & REGISTER_MASK;
            out.push((register & self.taps_a).count_ones() & 1 == 1);
            out.push((register & self.taps_b).count_ones() & 1 == 1);
        }

        out
    }
}

impl Default for ConvolutionalEncoder {
    fn default() -> Self {
        ConvolutionalEncoder {
            taps_a: DEFAULT_TAPS_A,
            taps_b: DEFAULT_TAPS_B,
            initial: 0,
        }
    }
}

/// Encode `bits` with the given generators and starting register
pub fn encode_convolutional(
    bits: &BitSlice<u8, Msb0>,
    taps_a: u8,
    taps_b: u8,
    initial: u8,
) -> Result<BitVec<u8, Msb0>> {
    Ok(ConvolutionalEncoder::new(taps_a, taps_b, initial)?.encode(bits))
}

/// Named schedules, `1` = transmitted, `0` = punctured
pub const SCHEDULES: [(&str, &str); 15] = [
    ("d1a", "101110"),
    ("d1b", "011101"),
    ("d1c", "111010"),
    ("d1d", "110101"),
    ("d1e", "101011"),
    ("d1f", "010111"),
    ("d2a", "110110"),
    ("d2b", "101101"),
    ("d2c", "011011"),
    ("d3a", "111001"),
    ("d3b", "110011"),
    ("d3c", "100111"),
    ("d3d", "001111"),
    ("d3e", "011110"),
    ("d3f", "111100"),
];

/// A periodic keep/drop pattern over the encoder output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PunctureSchedule {
    pattern: BitVec<u8, Msb0>,
}

impl PunctureSchedule {
    /// Create a schedule from its keep pattern
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for an empty pattern or one that keeps nothing
    pub fn new(pattern: BitVec<u8, Msb0>) -> Result<Self> {
        if pattern.not_any() {
            return Err(Error::InvalidInput(
                "puncture pattern must keep at least one bit".to_string(),
            ));
        }
        Ok(PunctureSchedule { pattern })
    }

    /// Look up one of the named schedules (`d1a` ... `d3f`)
    pub fn named(name: &str) -> Option<Self> {
        SCHEDULES
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, p)| p.parse().ok())
    }

    /// Keep pattern
    pub fn pattern(&self) -> &BitSlice<u8, Msb0> {
        &self.pattern
    }

    /// Pattern length
    pub fn period(&self) -> usize {
        self.pattern.len()
    }

    /// Whether position `i` of the encoder output is transmitted
    pub fn keeps(&self, i: usize) -> bool {
        self.pattern[i % self.pattern.len()]
    }

    /// Code rate after puncturing the rate-1/2 mother code
    pub fn code_rate(&self) -> f64 {
        self.period() as f64 / (2 * self.pattern.count_ones()) as f64
    }

    /// Replace punctured positions of `bits` with `None`
    pub fn puncture(&self, bits: &BitSlice<u8, Msb0>) -> Vec<Option<bool>> {
        bits.iter()
            .by_vals()
            .enumerate()
            .map(|(i, bit)| self.keeps(i).then_some(bit))
            .collect()
    }

    /// Rebuild an aligned frame of `len` positions from the transmitted bits
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` when `bits` does not hold exactly the
    /// number of bits the schedule keeps in `len` positions
    pub fn depuncture(&self, bits: &BitSlice<u8, Msb0>, len: usize) -> Result<Vec<Option<bool>>> {
        let kept = (0..len).filter(|&i| self.keeps(i)).count();
        if kept != bits.len() {
            return Err(Error::InvalidInput(format!(
                "{} positions keep {} bits, got {}",
                len,
                kept,
                bits.len()
            )));
        }

        let mut sent = bits.iter().by_vals();
        let frame = (0..len)
            .map(|i| if self.keeps(i) { sent.next() } else { None })
            .collect();

        debug!("depunctured {} bits into {} positions", kept, len);
        Ok(frame)
    }
}

impl FromStr for PunctureSchedule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let pattern = s
            .chars()
            .map(|c| match c {
                '1' => Ok(true),
                '0' => Ok(false),
                other => Err(Error::InvalidInput(format!(
                    "invalid puncture pattern character {:?}",
                    other
                ))),
            })
            .collect::<Result<BitVec<u8, Msb0>>>()?;
        Self::new(pattern)
    }
}

impl Display for PunctureSchedule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for bit in self.pattern.iter().by_vals() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Bits actually transmitted, in order
pub fn compact(punctured: &[Option<bool>]) -> BitVec<u8, Msb0> {
    punctured.iter().flatten().copied().collect()
}

/// Render a punctured stream with `.` for dropped positions
pub fn render(punctured: &[Option<bool>]) -> String {
    punctured
        .iter()
        .map(|b| match b {
            Some(true) => '1',
            Some(false) => '0',
            None => '.',
        })
        .collect()
}
