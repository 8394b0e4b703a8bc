//! Bit-level helpers for captured bursts.
//!
//! Bit vectors are `BitVec<u8, Msb0>`: index 0 is the first bit received.

use crate::error::{Error, Result};
use bitvec::prelude::*;
use log::trace;

const fn build_reversed_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut b = i as u8;
        let mut r = 0u8;
        let mut n = 0;
        while n < 8 {
            r = (r << 1) | (b & 1);
            b >>= 1;
            n += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
}

/// Every byte value mapped to its bit-reversed counterpart
pub static REVERSED_BITS: [u8; 256] = build_reversed_table();

/// Reverse the bit order of one byte
pub fn reverse_bits(byte: u8) -> u8 {
    REVERSED_BITS[byte as usize]
}

/// Value of up to 8 bits, first bit most significant
fn to_byte(bits: &BitSlice<u8, Msb0>) -> u8 {
    bits.iter().by_vals().fold(0u8, |acc, bit| (acc << 1) | bit as u8)
}

/// Reverse the bit order within each complete 8-bit group.
///
/// A trailing group of fewer than 8 bits is copied unchanged.
pub fn normalize_bit_order(bits: &BitSlice<u8, Msb0>) -> BitVec<u8, Msb0> {
    let (body, tail) = bits.split_at(bits.len() / 8 * 8);

    let mut out = BitVec::with_capacity(bits.len());
    for group in body.chunks_exact(8) {
        let reversed = reverse_bits(to_byte(group));
        out.extend_from_bitslice(reversed.view_bits::<Msb0>());
    }
    out.extend_from_bitslice(tail);

    if !tail.is_empty() {
        trace!("left {} trailing bits in capture order", tail.len());
    }
    out
}

/// Split `bits` into `streams` sub-sequences by striding.
///
/// Stream `k` holds bits `k, k + streams, k + 2·streams, ...`.
///
/// # Errors
///
/// * `Error::InvalidInput` for zero streams
/// * `Error::InputTooShort` when `bits` has fewer than `min_bits` bits
pub fn deinterleave(
    bits: &BitSlice<u8, Msb0>,
    streams: usize,
    min_bits: usize,
) -> Result<Vec<BitVec<u8, Msb0>>> {
    if streams == 0 {
        return Err(Error::InvalidInput(
            "cannot de-interleave into zero streams".to_string(),
        ));
    }
    if bits.len() < min_bits {
        return Err(Error::InputTooShort {
            required: min_bits,
            actual: bits.len(),
        });
    }

    let mut out: Vec<BitVec<u8, Msb0>> = (0..streams)
        .map(|_| BitVec::with_capacity(bits.len() / streams + 1))
        .collect();
    for (i, bit) in bits.iter().by_vals().enumerate() {
        out[i % streams].push(bit);
    }
    Ok(out)
}

/// Inverse of [`deinterleave`]: take one bit from each stream in turn.
///
/// Stops at the first stream that runs out.
pub fn interleave(streams: &[BitVec<u8, Msb0>]) -> BitVec<u8, Msb0> {
    let len = streams.iter().map(|s| s.len()).min().unwrap_or(0);
    let mut out = BitVec::with_capacity(len * streams.len());
    for i in 0..len {
        for stream in streams {
            out.push(stream[i]);
        }
    }
    out
}

fn check_width(width: u32) -> Result<()> {
    if width == 0 || width > 8 {
        return Err(Error::InvalidInput(format!(
            "symbol width must be between 1 and 8, got {}",
            width
        )));
    }
    Ok(())
}

/// Pack bits into `width`-bit symbols, first bit most significant.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for widths outside 1..=8 or a bit count that
/// is not a multiple of `width`
pub fn pack_symbols(bits: &BitSlice<u8, Msb0>, width: u32) -> Result<Vec<u8>> {
    check_width(width)?;
    let width = width as usize;
    if bits.len() % width != 0 {
        return Err(Error::InvalidInput(format!(
            "{} bits do not divide into {}-bit symbols",
            bits.len(),
            width
        )));
    }
    Ok(bits.chunks_exact(width).map(to_byte).collect())
}

/// Expand `width`-bit symbols back into bits.
///
/// # Errors
///
/// Returns `Error::InvalidInput` for widths outside 1..=8 or a symbol that
/// needs more than `width` bits
pub fn unpack_symbols(symbols: &[u8], width: u32) -> Result<BitVec<u8, Msb0>> {
    check_width(width)?;
    let mut out = BitVec::with_capacity(symbols.len() * width as usize);
    for &s in symbols {
        if width < 8 && s >> width != 0 {
            return Err(Error::InvalidInput(format!(
                "symbol {} does not fit in {} bits",
                s, width
            )));
        }
        out.extend_from_bitslice(&s.view_bits::<Msb0>()[8 - width as usize..]);
    }
    Ok(out)
}

/// Number of positions at which `a` and `b` differ, over their common length
pub fn bit_distance(a: &BitSlice<u8, Msb0>, b: &BitSlice<u8, Msb0>) -> usize {
    a.iter()
        .by_vals()
        .zip(b.iter().by_vals())
        .filter(|(x, y)| x != y)
        .count()
}

/// Parse a string of `0`/`1` characters
pub fn parse_bits(s: &str) -> Result<BitVec<u8, Msb0>> {
    s.chars()
        .map(|c| match c {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(Error::InvalidInput(format!(
                "invalid bit character {:?}",
                other
            ))),
        })
        .collect()
}

/// Render bits as a `0`/`1` string
pub fn bits_to_string(bits: &BitSlice<u8, Msb0>) -> String {
    bits.iter()
        .by_vals()
        .map(|b| if b { '1' } else { '0' })
        .collect()
}

/// Hex rendering of the bits, zero-padded to a whole byte
pub fn bits_to_hex(bits: &BitSlice<u8, Msb0>) -> String {
    let mut padded = bits.to_bitvec();
    padded.resize(bits.len().div_ceil(8) * 8, false);
    hex::encode(padded.as_raw_slice())
}
