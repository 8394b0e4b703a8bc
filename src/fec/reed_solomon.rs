//! Reed-Solomon error correction over GF(2^m).
//!
//! Reed-Solomon codes correct whole symbols rather than bits, which makes them
//! a good fit for frames where noise tends to corrupt several adjacent bits.
//! The burst payloads use two instances:
//!
//! - 8-bit symbols over `0x11D` with 8 transmitted parity bytes and an 8-byte
//!   erasure region (16 parity symbols in the underlying code)
//! - 6-bit symbols over `0x43` with a first consecutive root of 54 and 10
//!   parity symbols
//!
//! This implementation provides:
//! - Systematic encoding by polynomial division with the generator polynomial
//! - Syndrome computation
//! - Berlekamp-Massey error locator search, seeded with the erasure locator
//! - Chien root search and Forney error magnitudes
//! - A fixed-frame wrapper (`check` / `fix`) that supplies the erasure region
//!
//! Decoding fails closed: a result is only returned when the corrected
//! codeword has all-zero syndromes.

use crate::config::RsConfig;
use crate::error::{Error, Result};
use crate::fec::galois::GaloisField;
use crate::fec::ErrorCorrection;
use log::{debug, warn};
use std::sync::Arc;

/// Product of `(x - generator^(fcr + i))` for `i` in `0..nsym`.
///
/// # Arguments
///
/// * `field` - Field the code is defined over
/// * `nsym` - Number of parity symbols
/// * `fcr` - First consecutive root
///
/// # Returns
///
/// Monic generator polynomial of degree `nsym`, most significant coefficient first
pub fn generator_polynomial(field: &GaloisField, nsym: usize, fcr: usize) -> Vec<u8> {
    (0..nsym).fold(vec![1u8], |g, i| {
        field.poly_multiply(&g, &[1, field.exp(i + fcr)])
    })
}

/// Result of a successful decode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    /// Corrected message symbols
    pub message: Vec<u8>,
    /// Corrected parity symbols
    pub parity: Vec<u8>,
    /// Positions treated as errata (located errors and erasures), ascending
    pub errata: Vec<usize>,
    /// Number of symbols whose value changed
    pub corrected: usize,
}

/// Reed-Solomon codec for one field and parity count
#[derive(Debug, Clone)]
pub struct ReedSolomon {
    field: Arc<GaloisField>,
    nsym: usize,
    fcr: usize,
    generator_poly: Vec<u8>,
}

impl ReedSolomon {
    /// Create a codec
    ///
    /// # Arguments
    ///
    /// * `field` - Shared field tables
    /// * `nsym` - Parity symbols per codeword
    /// * `fcr` - First consecutive root of the generator polynomial
    ///
    /// # Returns
    ///
    /// The codec, or `Error::Config` if `nsym` leaves no room for a message
    pub fn new(field: Arc<GaloisField>, nsym: usize, fcr: usize) -> Result<Self> {
        if nsym == 0 || nsym >= field.order() {
            return Err(Error::Config(format!(
                "parity count must be between 1 and {}, got {}",
                field.order() - 1,
                nsym
            )));
        }

        let generator_poly = generator_polynomial(&field, nsym, fcr);
        debug!(
            "built RS generator: width={} nsym={} fcr={} g={:?}",
            field.width(),
            nsym,
            fcr,
            generator_poly
        );

        Ok(ReedSolomon {
            field,
            nsym,
            fcr,
            generator_poly,
        })
    }

    /// Build the field and codec described by `config`, using all of its
    /// parity symbols (transmitted and erased)
    pub fn from_config(config: &RsConfig) -> Result<Self> {
        let field = GaloisField::new(config.primitive, config.generator, config.symbol_width)?;
        Self::new(Arc::new(field), config.nsym(), config.fcr)
    }

    /// Field the code works over
    pub fn field(&self) -> &GaloisField {
        &self.field
    }

    /// Parity symbols per codeword
    pub fn nsym(&self) -> usize {
        self.nsym
    }

    /// First consecutive root
    pub fn fcr(&self) -> usize {
        self.fcr
    }

    /// Generator polynomial, most significant coefficient first
    pub fn generator_poly(&self) -> &[u8] {
        &self.generator_poly
    }

    /// Longest codeword, 2^m - 1 symbols
    pub fn max_length(&self) -> usize {
        self.field.order()
    }

    fn check_symbols(&self, symbols: &[u8]) -> Result<()> {
        match symbols.iter().position(|&s| !self.field.contains(s)) {
            Some(i) => Err(Error::InvalidInput(format!(
                "symbol {} at position {} is outside GF(2^{})",
                symbols[i],
                i,
                self.field.width()
            ))),
            None => Ok(()),
        }
    }

    /// Systematic encoding: `message` followed by `nsym` parity symbols
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the codeword would exceed 2^m - 1
    /// symbols or a symbol does not fit the field
    pub fn encode(&self, message: &[u8]) -> Result<Vec<u8>> {
        if message.len() + self.nsym > self.max_length() {
            return Err(Error::InvalidInput(format!(
                "message of {} symbols plus {} parity exceeds the codeword limit of {}",
                message.len(),
                self.nsym,
                self.max_length()
            )));
        }
        self.check_symbols(message)?;

        let mut out = message.to_vec();
        out.resize(message.len() + self.nsym, 0);

        for i in 0..message.len() {
            let coef = out[i];
            if coef != 0 {
                for (j, &g) in self.generator_poly.iter().enumerate().skip(1) {
                    out[i + j] ^= self.field.multiply(g, coef);
                }
            }
        }

        // the division overwrote the message part with the quotient
        out[..message.len()].copy_from_slice(message);
        Ok(out)
    }

    /// Parity symbols `encode` would append to `message`
    pub fn parity(&self, message: &[u8]) -> Result<Vec<u8>> {
        let mut codeword = self.encode(message)?;
        Ok(codeword.split_off(message.len()))
    }

    /// Evaluate `received` at `generator^(fcr + i)` for `i` in `0..nsym`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if a symbol does not fit the field
    pub fn syndromes(&self, received: &[u8]) -> Result<Vec<u8>> {
        self.check_symbols(received)?;
        Ok(self.field_syndromes(received))
    }

    fn field_syndromes(&self, received: &[u8]) -> Vec<u8> {
        (0..self.nsym)
            .map(|i| self.field.poly_eval(received, self.field.exp(i + self.fcr)))
            .collect()
    }

    /// Locator polynomial with a root at `generator^-c` for each coefficient index `c`
    fn errata_locator(&self, coef_positions: &[usize]) -> Vec<u8> {
        coef_positions.iter().fold(vec![1u8], |loc, &p| {
            self.field.poly_multiply(&loc, &[self.field.exp(p), 1])
        })
    }

    /// Berlekamp-Massey search for the errata locator polynomial.
    ///
    /// # Arguments
    ///
    /// * `syndromes` - Output of [`ReedSolomon::syndromes`]
    /// * `erasures` - Known erasure positions in the received word
    /// * `len` - Length of the received word
    ///
    /// # Returns
    ///
    /// The locator, or `Error::UncorrectableMessage` when it implies more
    /// errata than the parity can resolve
    pub fn error_locator(&self, syndromes: &[u8], erasures: &[usize], len: usize) -> Result<Vec<u8>> {
        let field = &self.field;

        let mut padded = Vec::with_capacity(syndromes.len() + 1);
        padded.push(0);
        padded.extend_from_slice(syndromes);

        let (mut err_loc, mut old_loc) = if erasures.is_empty() {
            (vec![1u8], vec![1u8])
        } else {
            let coefs: Vec<usize> = erasures.iter().map(|&p| len - 1 - p).collect();
            let loc = self.errata_locator(&coefs);
            (loc.clone(), loc)
        };

        let erased = erasures.len();
        for i in 0..self.nsym.saturating_sub(erased) {
            let k = erased + i + 1;

            let mut delta = padded[k];
            for j in 1..err_loc.len() {
                delta ^= field.multiply(err_loc[err_loc.len() - 1 - j], padded[k - j]);
            }

            old_loc.push(0);

            if delta != 0 {
                if old_loc.len() > err_loc.len() {
                    let new_loc = field.poly_scale(&old_loc, delta);
                    old_loc = field.poly_scale(&err_loc, field.inverse(delta)?);
                    err_loc = new_loc;
                }
                err_loc = field.poly_add(&err_loc, &field.poly_scale(&old_loc, delta));
            }
        }

        let leading = err_loc.iter().take_while(|&&c| c == 0).count();
        err_loc.drain(..leading);

        if err_loc.is_empty() {
            return Err(Error::UncorrectableMessage("error locator vanished"));
        }

        let errors = (err_loc.len() - 1).saturating_sub(erased);
        if errors * 2 + erased > self.nsym {
            return Err(Error::UncorrectableMessage("too many errors to correct"));
        }

        Ok(err_loc)
    }

    /// Chien search: positions in a word of `len` symbols where the locator has a root.
    ///
    /// # Errors
    ///
    /// Returns `Error::LocatorNotFound` when the number of roots differs from
    /// the locator degree
    pub fn error_positions(&self, locator: &[u8], len: usize) -> Result<Vec<usize>> {
        let expected = locator.len().saturating_sub(1);
        let reversed: Vec<u8> = locator.iter().rev().copied().collect();

        let positions: Vec<usize> = (0..len)
            .filter(|&i| self.field.poly_eval(&reversed, self.field.exp(i)) == 0)
            .map(|i| len - 1 - i)
            .collect();

        if positions.len() != expected {
            return Err(Error::LocatorNotFound {
                found: positions.len(),
                expected,
            });
        }

        Ok(positions)
    }

    /// Forney algorithm: compute and apply the magnitude at each errata position
    pub fn correct_errata(
        &self,
        received: &[u8],
        syndromes: &[u8],
        positions: &[usize],
    ) -> Result<Vec<u8>> {
        self.check_symbols(received)?;
        self.check_symbols(syndromes)?;
        let len = received.len();
        if let Some(&p) = positions.iter().find(|&&p| p >= len) {
            return Err(Error::InvalidInput(format!(
                "errata position {} outside a word of {} symbols",
                p, len
            )));
        }

        let field = &self.field;
        let coefs: Vec<usize> = positions.iter().map(|&p| len - 1 - p).collect();
        let locator = self.errata_locator(&coefs);

        // error evaluator: (S(x) * locator(x)) mod x^(degree + 1)
        let mut reversed_syndromes = Vec::with_capacity(syndromes.len() + 1);
        reversed_syndromes.extend(syndromes.iter().rev());
        reversed_syndromes.push(0);
        let product = field.poly_multiply(&reversed_syndromes, &locator);
        let evaluator = &product[product.len().saturating_sub(locator.len())..];

        let x: Vec<u8> = coefs.iter().map(|&c| field.exp(c)).collect();

        let mut out = received.to_vec();
        for (i, &xi) in x.iter().enumerate() {
            let xi_inv = field.inverse(xi)?;

            let locator_prime = x
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .fold(1u8, |acc, (_, &xj)| {
                    field.multiply(acc, 1 ^ field.multiply(xi_inv, xj))
                });

            let y = field.poly_eval(evaluator, xi_inv);
            let y = field.multiply(field.pow(xi, 1 - self.fcr as i64), y);

            out[positions[i]] ^= field.divide(y, locator_prime)?;
        }

        Ok(out)
    }

    fn check_erasures(&self, erasures: &[usize], len: usize) -> Result<()> {
        if erasures.len() > self.nsym {
            return Err(Error::UncorrectableMessage("too many erasures to correct"));
        }
        for (i, &p) in erasures.iter().enumerate() {
            if p >= len {
                return Err(Error::InvalidInput(format!(
                    "erasure position {} outside a word of {} symbols",
                    p, len
                )));
            }
            if erasures[..i].contains(&p) {
                return Err(Error::InvalidInput(format!(
                    "erasure position {} given twice",
                    p
                )));
            }
        }
        Ok(())
    }

    /// Decode a received word, optionally with known erasure positions.
    ///
    /// Erased symbols are zeroed before decoding. Up to `2·errors + erasures ≤ nsym`
    /// is guaranteed to decode; beyond that the decoder reports failure or, rarely,
    /// a different valid codeword.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidInput` for malformed words or erasure lists
    /// * `Error::UncorrectableMessage` for too many errata or non-zero
    ///   syndromes after correction
    /// * `Error::LocatorNotFound` when the root search disagrees with the locator
    pub fn decode(&self, received: &[u8], erasures: &[usize]) -> Result<Decoded> {
        let len = received.len();
        if len <= self.nsym || len > self.max_length() {
            return Err(Error::InvalidInput(format!(
                "received word of {} symbols must be longer than {} and at most {}",
                len,
                self.nsym,
                self.max_length()
            )));
        }
        self.check_symbols(received)?;
        self.check_erasures(erasures, len)?;

        let mut word = received.to_vec();
        for &p in erasures {
            word[p] = 0;
        }

        let syndromes = self.field_syndromes(&word);
        let mut errata = Vec::new();

        if syndromes.iter().any(|&s| s != 0) {
            let locator = self.error_locator(&syndromes, erasures, len)?;
            errata = self.error_positions(&locator, len)?;
            word = self.correct_errata(&word, &syndromes, &errata)?;

            if self.field_syndromes(&word).iter().any(|&s| s != 0) {
                return Err(Error::UncorrectableMessage(
                    "syndromes non-zero after correction",
                ));
            }
            errata.sort_unstable();
        }

        let corrected = word
            .iter()
            .zip(received)
            .filter(|(a, b)| a != b)
            .count();

        let parity = word.split_off(len - self.nsym);
        Ok(Decoded {
            message: word,
            parity,
            errata,
            corrected,
        })
    }
}

impl ErrorCorrection for ReedSolomon {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        ReedSolomon::encode(self, data)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        ReedSolomon::decode(self, data, &[]).map(|d| d.message)
    }
}

/// Fixed-frame wrapper: a frame carries the message and the first `parity`
/// parity symbols; the remaining `erasures` parity symbols are never sent and
/// are decoded as erasures.
#[derive(Debug, Clone)]
pub struct RsFrameCodec {
    codec: ReedSolomon,
    parity: usize,
    erasures: usize,
}

impl RsFrameCodec {
    /// Create a frame codec from a configuration entry
    pub fn from_config(config: &RsConfig) -> Result<Self> {
        Ok(RsFrameCodec {
            codec: ReedSolomon::from_config(config)?,
            parity: config.parity,
            erasures: config.erasures,
        })
    }

    /// Underlying codec over all parity symbols
    pub fn codec(&self) -> &ReedSolomon {
        &self.codec
    }

    /// Parity symbols carried in a frame
    pub fn parity(&self) -> usize {
        self.parity
    }

    /// Parity symbols in the erasure region
    pub fn erasures(&self) -> usize {
        self.erasures
    }

    /// Bits per symbol
    pub fn symbol_width(&self) -> u32 {
        self.codec.field().width()
    }

    fn message_len(&self, frame: &[u8]) -> Result<usize> {
        frame
            .len()
            .checked_sub(self.parity)
            .filter(|&m| m > 0)
            .ok_or_else(|| {
                Error::InvalidInput(format!(
                    "frame of {} symbols is too short for {} parity",
                    frame.len(),
                    self.parity
                ))
            })
    }

    /// Re-encode the message part and compare with the transmitted parity.
    ///
    /// Malformed frames are reported as invalid rather than as errors.
    pub fn check(&self, frame: &[u8]) -> bool {
        let Ok(message_len) = self.message_len(frame) else {
            return false;
        };
        match self.codec.encode(&frame[..message_len]) {
            Ok(codeword) => codeword[message_len..frame.len()] == frame[message_len..],
            Err(e) => {
                debug!("RS check rejected frame: {}", e);
                false
            }
        }
    }

    /// Correct a frame, filling the erasure region with zero placeholders.
    ///
    /// The returned parity is truncated to the transmitted parity and the
    /// errata list and change count cover transmitted symbols only.
    pub fn fix(&self, frame: &[u8]) -> Result<Decoded> {
        self.message_len(frame)?;

        let len = frame.len();
        let mut word = frame.to_vec();
        word.resize(len + self.erasures, 0);
        let erasures: Vec<usize> = (len..len + self.erasures).collect();

        let mut decoded = self.codec.decode(&word, &erasures).map_err(|e| {
            warn!("RS frame repair failed: {}", e);
            e
        })?;

        decoded.parity.truncate(self.parity);
        decoded.errata.retain(|&p| p < len);
        decoded.corrected = decoded
            .message
            .iter()
            .chain(&decoded.parity)
            .zip(frame)
            .filter(|(a, b)| a != b)
            .count();

        Ok(decoded)
    }
}

impl ErrorCorrection for RsFrameCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut codeword = self.codec.encode(data)?;
        codeword.truncate(data.len() + self.parity);
        Ok(codeword)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.fix(data).map(|d| d.message)
    }
}
