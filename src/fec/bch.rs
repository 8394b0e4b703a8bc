//! Binary BCH syndrome decoding for short burst header codes.
//!
//! The burst headers are protected by shortened binary BCH codes of 7 to 31
//! bits. Decoding works directly on the generator polynomial:
//!
//! - The syndrome of a received word is the remainder of GF(2) long division
//!   by the generator polynomial; it is zero exactly for valid codewords.
//! - Correction is a brute-force search over every 1-bit and then every 2-bit
//!   flip, taking the first candidate (ascending bit position) whose syndrome
//!   is zero.
//! - A syndrome table built once per code maps each syndrome reachable by up
//!   to `max_errors` flips to its error pattern, giving an O(1) fast path.
//!   Syndromes shared by two single-bit patterns are flagged while the table
//!   is built and always go through the brute-force search, so both paths
//!   return the same correction.
//!
//! Words are held as an integer plus an explicit bit length, since leading
//! zero bits are part of the codeword.

use crate::config::BchConfig;
use crate::error::{Error, Result};
use bitvec::prelude::*;
use log::{debug, trace};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Error count reported for a word the decoder could not repair.
pub const UNCORRECTABLE: i32 = -1;

/// Longest codeword that fits the integer representation
pub const MAX_CODEWORD_BITS: usize = 64;

/// Largest syndrome table the decoder will allocate (2^24 slots)
const MAX_SYNDROME_BITS: usize = 24;

/// Number of significant bits in `x`
fn bit_length(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

/// Remainder of the GF(2) division of `dividend` by `poly`.
///
/// Both operands are bit strings; the divisor is shifted to align with the
/// highest set bit of the running remainder until the remainder is shorter
/// than the divisor.
pub fn divide(poly: u64, dividend: u64) -> u64 {
    if poly == 0 {
        return dividend;
    }

    let poly_len = bit_length(poly);
    let mut rem = dividend;
    let mut rem_len = bit_length(rem);

    while rem_len >= poly_len {
        rem ^= poly << (rem_len - poly_len);
        rem_len = bit_length(rem);
    }

    rem
}

/// Carry-less product of two GF(2) polynomials.
///
/// The caller is responsible for keeping the product within 64 bits.
pub fn multiply(a: u64, b: u64) -> u64 {
    let mut result = 0u64;
    let mut b = b;
    let mut shift = 0;

    while b > 0 {
        if b & 1 != 0 {
            result ^= a << shift;
        }
        b >>= 1;
        shift += 1;
    }

    result
}

/// Render a GF(2) polynomial in `x^n + ... + x^0` notation.
pub fn poly_string(poly: u64) -> String {
    let len = bit_length(poly);
    (0..len)
        .rev()
        .filter(|&i| poly & (1 << i) != 0)
        .map(|i| format!("x^{}", i))
        .collect::<Vec<_>>()
        .join(" + ")
}

/// A received word: bit pattern plus explicit length in bits.
///
/// Bit 0 is the least significant (last transmitted) bit; the string form
/// lists bits most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Codeword {
    value: u64,
    len: usize,
}

impl Codeword {
    /// Create a word of `len` bits
    ///
    /// # Errors
    ///
    /// Returns an error if `len` is 0 or above 64, or `value` needs more than `len` bits
    pub fn new(value: u64, len: usize) -> Result<Self> {
        if len == 0 || len > MAX_CODEWORD_BITS {
            return Err(Error::InvalidInput(format!(
                "codeword length must be between 1 and {}, got {}",
                MAX_CODEWORD_BITS, len
            )));
        }
        if bit_length(value) as usize > len {
            return Err(Error::InvalidInput(format!(
                "value {:#x} does not fit in {} bits",
                value, len
            )));
        }
        Ok(Codeword { value, len })
    }

    /// Build a word from bits in transmission order (first bit most significant)
    pub fn from_bits(bits: &BitSlice<u8, Msb0>) -> Result<Self> {
        let value = bits
            .iter()
            .by_vals()
            .fold(0u64, |acc, bit| (acc << 1) | bit as u64);
        Self::new(value, bits.len())
    }

    /// Bits in transmission order
    pub fn to_bits(&self) -> BitVec<u8, Msb0> {
        (0..self.len)
            .rev()
            .map(|i| self.value & (1 << i) != 0)
            .collect()
    }

    /// Integer value of the word
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.len
    }

    /// Words always carry at least one bit
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy of this word with `bit` (0 = least significant) inverted
    pub fn flip(&self, bit: usize) -> Codeword {
        debug_assert!(bit < self.len);
        Codeword {
            value: self.value ^ (1 << bit),
            len: self.len,
        }
    }

    fn with_value(&self, value: u64) -> Codeword {
        Codeword {
            value,
            len: self.len,
        }
    }
}

impl FromStr for Codeword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || s.len() > MAX_CODEWORD_BITS {
            return Err(Error::InvalidInput(format!(
                "bit string length must be between 1 and {}, got {}",
                MAX_CODEWORD_BITS,
                s.len()
            )));
        }
        let mut value = 0u64;
        for c in s.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                other => {
                    return Err(Error::InvalidInput(format!(
                        "invalid bit character {:?}",
                        other
                    )))
                }
            };
            value = (value << 1) | bit;
        }
        Codeword::new(value, s.len())
    }
}

impl Display for Codeword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$b}", self.value, width = self.len)
    }
}

/// Outcome of a successful repair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repaired {
    /// Number of bits flipped (0, 1 or 2)
    pub errors: u32,
    /// Corrected word
    pub word: Codeword,
}

/// Syndrome of `word` under `poly`
pub fn syndrome(poly: u64, word: &Codeword) -> u64 {
    divide(poly, word.value)
}

/// Brute-force repair of up to two bit errors.
///
/// Tries every single-bit flip in ascending bit order, then every unordered
/// pair, and returns the first candidate with a zero syndrome.
///
/// # Errors
///
/// Returns `Error::Uncorrectable` when no flip of one or two bits yields a
/// valid codeword; the caller keeps the original word.
pub fn repair(poly: u64, word: &Codeword) -> Result<Repaired> {
    if syndrome(poly, word) == 0 {
        return Ok(Repaired {
            errors: 0,
            word: *word,
        });
    }

    let len = word.len();

    for b1 in 0..len {
        let candidate = word.flip(b1);
        if syndrome(poly, &candidate) == 0 {
            return Ok(Repaired {
                errors: 1,
                word: candidate,
            });
        }
    }

    for b1 in 0..len {
        for b2 in (b1 + 1)..len {
            let candidate = word.flip(b1).flip(b2);
            if syndrome(poly, &candidate) == 0 {
                return Ok(Repaired {
                    errors: 2,
                    word: candidate,
                });
            }
        }
    }

    Err(Error::Uncorrectable { bits: len })
}

/// Syndrome table slot: weight and bit pattern of the error that produces it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyndromeEntry {
    /// Number of flipped bits
    pub weight: u8,
    /// Error pattern (bit 0 = least significant)
    pub pattern: u64,
}

/// A shortened binary BCH code with its precomputed syndrome table
#[derive(Debug, Clone)]
pub struct BchCode {
    /// Generator polynomial as a bit mask
    poly: u64,
    /// Codeword length in bits
    codeword_bits: usize,
    /// Width of the syndrome table index
    syndrome_bits: usize,
    /// Errors covered by the table (1, 2 or 3; 3 enumerates like 2)
    max_errors: u8,
    /// Syndrome -> error pattern
    table: Vec<Option<SyndromeEntry>>,
    /// Syndromes produced by more than one single-bit pattern
    ambiguous: Vec<bool>,
}

impl BchCode {
    /// Create a code and build its syndrome table
    ///
    /// # Arguments
    ///
    /// * `poly` - Generator polynomial as a bit mask (e.g. 29 = x^4 + x^3 + x^2 + 1)
    /// * `codeword_bits` - Codeword length in bits
    /// * `syndrome_bits` - Width of the syndrome table; at least the generator degree
    /// * `max_errors` - Error patterns to tabulate, 1, 2 or 3
    ///
    /// # Returns
    ///
    /// A new `BchCode`, or `Error::Config` for inconsistent parameters
    pub fn new(
        poly: u64,
        codeword_bits: usize,
        syndrome_bits: usize,
        max_errors: u8,
    ) -> Result<Self> {
        if poly < 2 {
            return Err(Error::Config(format!(
                "generator polynomial {} has no positive degree",
                poly
            )));
        }

        let degree = bit_length(poly) as usize - 1;

        if codeword_bits <= degree || codeword_bits > MAX_CODEWORD_BITS {
            return Err(Error::Config(format!(
                "codeword length {} must exceed the generator degree {} and be at most {}",
                codeword_bits, degree, MAX_CODEWORD_BITS
            )));
        }

        if syndrome_bits < degree || syndrome_bits > MAX_SYNDROME_BITS {
            return Err(Error::Config(format!(
                "syndrome width {} must be between the generator degree {} and {}",
                syndrome_bits, degree, MAX_SYNDROME_BITS
            )));
        }

        if !(1..=3).contains(&max_errors) {
            return Err(Error::Config(format!(
                "max errors must be 1, 2 or 3, got {}",
                max_errors
            )));
        }

        let (table, ambiguous) =
            Self::build_syndrome_table(poly, codeword_bits, syndrome_bits, max_errors);

        debug!(
            "built BCH syndrome table: poly={} ({}) bits={} entries={}",
            poly,
            poly_string(poly),
            codeword_bits,
            table.iter().filter(|e| e.is_some()).count()
        );
        if ambiguous.iter().any(|&a| a) {
            debug!(
                "BCH poly={}: {} syndromes shared by single-bit errors",
                poly,
                ambiguous.iter().filter(|&&a| a).count()
            );
        }

        Ok(BchCode {
            poly,
            codeword_bits,
            syndrome_bits,
            max_errors,
            table,
            ambiguous,
        })
    }

    /// Create a code from one of the fixed configuration entries
    pub fn from_config(config: &BchConfig) -> Result<Self> {
        Self::new(
            config.poly,
            config.codeword_bits,
            config.syndrome_bits,
            config.max_errors,
        )
    }

    /// Enumerate every 1-bit and (when configured) every 2-bit error pattern.
    ///
    /// Single-bit patterns are written unconditionally (a later bit replaces an
    /// earlier one and the slot is flagged as ambiguous); a 2-bit pattern only
    /// fills an empty slot, so on a collision the first pattern enumerated
    /// keeps the slot.
    fn build_syndrome_table(
        poly: u64,
        codeword_bits: usize,
        syndrome_bits: usize,
        max_errors: u8,
    ) -> (Vec<Option<SyndromeEntry>>, Vec<bool>) {
        let mut table = vec![None; 1 << syndrome_bits];
        let mut ambiguous = vec![false; 1 << syndrome_bits];

        for n1 in 0..codeword_bits {
            let pattern = 1u64 << n1;
            let r = divide(poly, pattern) as usize;
            if table[r].is_some() {
                ambiguous[r] = true;
            }
            table[r] = Some(SyndromeEntry { weight: 1, pattern });
        }

        if max_errors >= 2 {
            for n1 in 0..codeword_bits {
                for n2 in (n1 + 1)..codeword_bits {
                    let pattern = (1u64 << n1) | (1u64 << n2);
                    let r = divide(poly, pattern) as usize;
                    match table[r] {
                        None => table[r] = Some(SyndromeEntry { weight: 2, pattern }),
                        Some(_) => trace!("syndrome collision: poly={} syndrome={}", poly, r),
                    }
                }
            }
        }

        (table, ambiguous)
    }

    /// Generator polynomial
    pub fn poly(&self) -> u64 {
        self.poly
    }

    /// Codeword length in bits
    pub fn codeword_bits(&self) -> usize {
        self.codeword_bits
    }

    /// Syndrome table width in bits
    pub fn syndrome_bits(&self) -> usize {
        self.syndrome_bits
    }

    /// Error weight covered by the syndrome table
    pub fn max_errors(&self) -> u8 {
        self.max_errors
    }

    /// Number of populated syndrome slots
    pub fn table_entries(&self) -> usize {
        self.table.iter().filter(|e| e.is_some()).count()
    }

    /// Syndrome of `word` under this code
    pub fn syndrome(&self, word: &Codeword) -> u64 {
        syndrome(self.poly, word)
    }

    /// Table entry for `syndrome`, if any error pattern produces it
    pub fn lookup(&self, syndrome: u64) -> Option<SyndromeEntry> {
        self.table.get(syndrome as usize).copied().flatten()
    }

    fn check_length(&self, word: &Codeword) -> Result<()> {
        if word.len() != self.codeword_bits {
            return Err(Error::InvalidInput(format!(
                "word has {} bits, code expects {}",
                word.len(),
                self.codeword_bits
            )));
        }
        Ok(())
    }

    /// Brute-force repair of `word`; see [`repair`]
    pub fn repair(&self, word: &Codeword) -> Result<Repaired> {
        self.check_length(word)?;
        repair(self.poly, word)
    }

    /// Whether two single-bit errors share `syndrome`
    pub fn is_ambiguous(&self, syndrome: u64) -> bool {
        self.ambiguous.get(syndrome as usize).copied().unwrap_or(false)
    }

    /// Repair using the syndrome table, falling back to the brute-force search
    /// for syndromes the table lacks or holds ambiguously
    pub fn correct(&self, word: &Codeword) -> Result<Repaired> {
        self.check_length(word)?;

        let s = self.syndrome(word);
        if s == 0 {
            return Ok(Repaired {
                errors: 0,
                word: *word,
            });
        }

        if self.is_ambiguous(s) {
            return repair(self.poly, word);
        }

        match self.lookup(s) {
            Some(entry) => Ok(Repaired {
                errors: entry.weight as u32,
                word: word.with_value(word.value() ^ entry.pattern),
            }),
            None => repair(self.poly, word),
        }
    }

    /// Repair `word`, keeping the original and reporting [`UNCORRECTABLE`] on failure
    pub fn correct_or_keep(&self, word: &Codeword) -> (i32, Codeword) {
        match self.correct(word) {
            Ok(repaired) => (repaired.errors as i32, repaired.word),
            Err(e) => {
                debug!("BCH poly={} left word {} as is: {}", self.poly, word, e);
                (UNCORRECTABLE, *word)
            }
        }
    }
}

impl Display for BchCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BCH poly={} ({}) n={} t={}",
            self.poly,
            poly_string(self.poly),
            self.codeword_bits,
            self.max_errors
        )
    }
}
