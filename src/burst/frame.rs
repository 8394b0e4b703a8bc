//! Capture record parsing.
//!
//! Each record is one line such as
//!
//! ```text
//! RAW: capture.bits 1234.5678 1626270833 N:32.10-85.20 I:00000000001 95% 0.01234 179 <001100000011000011110011>0011... extra
//! ```
//!
//! holding the bit-order tag, source label, timestamp (ms), frequency (Hz),
//! either an SNR/noise pair or an access flag, burst id, confidence, signal
//! level, declared bit count and the bits themselves, optionally decorated
//! with `[`, `]`, `<`, `>` and spaces, followed by a free-text annotation.

use crate::burst::bits::{bits_to_string, deinterleave, normalize_bit_order};
use crate::burst::{AccessCode, ACCESS_BITS};
use crate::error::{Error, Result};
use bitvec::prelude::*;
use regex::Regex;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::OnceLock;

/// Floor applied to the signal level before any logarithm
pub const MIN_LEVEL: f64 = 1e-6;

/// Signal level usable in a logarithm: `nan` and `inf` readings fall back to
/// [`MIN_LEVEL`], everything else is floored at it
fn floor_level(level: f64) -> f64 {
    if level.is_finite() {
        level.max(MIN_LEVEL)
    } else {
        MIN_LEVEL
    }
}

fn record_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(concat!(
            r"^(RAW|RWA): ([^ ]*) (-?[\d.]+) (\d+) ",
            r"(?:N:([+-]?\d+(?:\.\d+)?)([+-]\d+(?:\.\d+)?)|A:(\w+)) ",
            r"[IL]:(\w+) +(\d+)% ([\d.]+|inf|nan) +(\d+) ([\[\]<> 01]+)(.*)",
        ))
        .expect("capture record pattern is valid")
    })
}

/// Link information carried by a record
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Link {
    /// Signal-to-noise ratio and noise floor in dB
    Snr { snr: f64, noise: f64 },
    /// Whether the demodulator matched the access code
    Access { ok: bool },
}

/// One parsed capture record
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Bits were captured least significant bit first within each byte
    pub swapped: bool,
    /// Capture source label
    pub source: String,
    /// Timestamp in milliseconds
    pub timestamp: f64,
    /// Centre frequency in Hz
    pub frequency: u64,
    /// SNR pair or access flag
    pub link: Link,
    /// Burst identifier
    pub id: String,
    /// Demodulator confidence in percent
    pub confidence: u32,
    /// Signal level, finite and floored at [`MIN_LEVEL`]
    pub level: f64,
    /// Bit count announced by the demodulator
    pub declared_bits: usize,
    /// Burst bits
    pub bits: BitVec<u8, Msb0>,
    /// Trailing free text
    pub annotation: String,
    normalized: bool,
}

impl Frame {
    /// Parse one capture record
    ///
    /// # Errors
    ///
    /// Returns `Error::Parse` carrying the line when it does not match the
    /// record layout or a numeric field does not parse
    pub fn parse(line: &str) -> Result<Frame> {
        let parse_error = || Error::Parse {
            line: line.to_string(),
        };

        let caps = record_pattern().captures(line).ok_or_else(parse_error)?;
        let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let link = match (caps.get(5), caps.get(6)) {
            (Some(snr), Some(noise)) => Link::Snr {
                snr: snr.as_str().parse().map_err(|_| parse_error())?,
                noise: noise.as_str().parse().map_err(|_| parse_error())?,
            },
            _ => Link::Access {
                ok: group(7) == "OK",
            },
        };

        let level: f64 = group(10).parse().map_err(|_| parse_error())?;

        let bits = group(12)
            .chars()
            .filter_map(|c| match c {
                '0' => Some(false),
                '1' => Some(true),
                _ => None,
            })
            .collect();

        Ok(Frame {
            swapped: group(1) == "RAW",
            source: group(2).to_string(),
            timestamp: group(3).parse().map_err(|_| parse_error())?,
            frequency: group(4).parse().map_err(|_| parse_error())?,
            link,
            id: group(8).to_string(),
            confidence: group(9).parse().map_err(|_| parse_error())?,
            level: floor_level(level),
            declared_bits: group(11).parse().map_err(|_| parse_error())?,
            bits,
            annotation: group(13).trim().to_string(),
            normalized: false,
        })
    }

    /// Signal level in dB
    pub fn level_db(&self) -> f64 {
        20.0 * self.level.log10()
    }

    /// Access flag reported by the demodulator, when the record carries one
    pub fn access_ok(&self) -> Option<bool> {
        match self.link {
            Link::Access { ok } => Some(ok),
            Link::Snr { .. } => None,
        }
    }

    /// Bring swapped captures into transmission order.
    ///
    /// Only the first call on a swapped frame changes its bits.
    pub fn normalize_bit_order(&mut self) {
        if self.swapped && !self.normalized {
            self.bits = normalize_bit_order(&self.bits);
        }
        self.normalized = true;
    }

    /// Whether the bits are in transmission order
    pub fn is_normalized(&self) -> bool {
        self.normalized || !self.swapped
    }

    /// Access code the burst opens with, if recognised
    pub fn access_code(&self) -> Option<AccessCode> {
        AccessCode::detect(&self.bits)
    }

    /// Split the bits into their two interleaved streams
    ///
    /// # Errors
    ///
    /// Returns `Error::InputTooShort` for bursts shorter than an access code
    pub fn extract_symbols(&self) -> Result<(BitVec<u8, Msb0>, BitVec<u8, Msb0>)> {
        let mut streams = deinterleave(&self.bits, 2, ACCESS_BITS)?.into_iter();
        match (streams.next(), streams.next()) {
            (Some(first), Some(second)) => Ok((first, second)),
            _ => Err(Error::InvalidInput("de-interleave lost a stream".to_string())),
        }
    }

    /// Bits as a `0`/`1` string
    pub fn bit_string(&self) -> String {
        bits_to_string(&self.bits)
    }
}

impl FromStr for Frame {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Frame::parse(s)
    }
}

impl Display for Frame {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} ts={} freq={} id={} confidence={}%",
            if self.swapped { "RAW" } else { "RWA" },
            self.source,
            self.timestamp,
            self.frequency,
            self.id,
            self.confidence
        )
    }
}
