//! Galois field arithmetic over GF(2^m) for symbol widths up to 8 bits.
//!
//! The field is described by a primitive polynomial, a generator element and
//! the symbol width `m`. Construction walks the powers of the generator once
//! and records them in an anti-log (exponent) table of `2·(2^m − 1)` entries
//! and a logarithm table of `2^m` entries. After that every multiplication,
//! division and exponentiation is a table lookup, and the tables are never
//! written again, so one field can be shared by reference across threads.
//!
//! Polynomials are slices of field elements, most significant coefficient
//! first.

use crate::error::{Error, Result};
use log::debug;

/// Widest symbol the tables support (symbols are stored as `u8`).
pub const MAX_SYMBOL_WIDTH: u32 = 8;

/// Multiply two field elements without lookup tables.
///
/// Carry-less shift-and-add multiplication, reducing by `primitive` whenever
/// the running value grows past `width` bits. Used to build the tables.
pub fn multiply_no_table(x: u16, y: u16, primitive: u16, width: u32) -> u16 {
    let overflow = 1u16 << width;
    let mut a = x;
    let mut b = y;
    let mut result = 0u16;

    while b > 0 {
        if b & 1 != 0 {
            result ^= a;
        }
        b >>= 1;
        a <<= 1;
        if a & overflow != 0 {
            a ^= primitive;
        }
    }

    result
}

/// Precomputed exponent/logarithm tables for one GF(2^m).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GaloisField {
    /// Symbol width m
    width: u32,
    /// Primitive polynomial including the x^m term
    primitive: u16,
    /// Generator element whose powers enumerate the multiplicative group
    generator: u8,
    /// Size of the multiplicative group, 2^m - 1
    order: usize,
    /// generator^i for i in 0..2*order
    exp: Vec<u8>,
    /// Discrete log of each non-zero element; entry 0 is unused
    log: Vec<u8>,
}

impl GaloisField {
    /// Build the tables for GF(2^`width`).
    ///
    /// # Arguments
    ///
    /// * `primitive` - Primitive polynomial, including the leading x^m bit (e.g. `0x11D`)
    /// * `generator` - Generator element, usually 2
    /// * `width` - Symbol width m in bits, 1..=8
    ///
    /// # Returns
    ///
    /// The field, or `Error::Config` when the parameters do not describe a
    /// field in which `generator` is primitive
    pub fn new(primitive: u16, generator: u8, width: u32) -> Result<Self> {
        if width == 0 || width > MAX_SYMBOL_WIDTH {
            return Err(Error::Config(format!(
                "symbol width must be between 1 and {}, got {}",
                MAX_SYMBOL_WIDTH, width
            )));
        }

        if primitive == 0 || 15 - primitive.leading_zeros() != width {
            return Err(Error::Config(format!(
                "primitive polynomial {:#x} does not have degree {}",
                primitive, width
            )));
        }

        let size = 1usize << width;
        if generator == 0 || generator as usize >= size {
            return Err(Error::Config(format!(
                "generator {} is not a non-zero element of GF(2^{})",
                generator, width
            )));
        }

        let order = size - 1;
        let mut exp = vec![0u8; order * 2];
        let mut log = vec![0u8; size];

        let mut x = 1u16;
        for i in 0..order {
            if x == 0 || (i > 0 && x == 1) {
                return Err(Error::Config(format!(
                    "generator {} is not primitive for polynomial {:#x}",
                    generator, primitive
                )));
            }
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x = multiply_no_table(x, generator as u16, primitive, width);
        }

        if x != 1 {
            return Err(Error::Config(format!(
                "polynomial {:#x} does not generate GF(2^{})",
                primitive, width
            )));
        }

        exp.copy_within(0..order, order);

        debug!(
            "built GF(2^{}) tables: primitive={:#x} generator={}",
            width, primitive, generator
        );

        Ok(GaloisField {
            width,
            primitive,
            generator,
            order,
            exp,
            log,
        })
    }

    /// Symbol width m
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Primitive polynomial the field was built from
    pub fn primitive(&self) -> u16 {
        self.primitive
    }

    /// Generator element
    pub fn generator(&self) -> u8 {
        self.generator
    }

    /// Number of non-zero elements, 2^m - 1
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of elements, 2^m
    pub fn size(&self) -> usize {
        self.order + 1
    }

    /// Whether `symbol` is an element of this field
    pub fn contains(&self, symbol: u8) -> bool {
        (symbol as usize) < self.size()
    }

    /// generator^`power`
    pub fn exp(&self, power: usize) -> u8 {
        self.exp[power % self.order]
    }

    /// Discrete logarithm base generator; `None` for zero
    pub fn log(&self, x: u8) -> Option<usize> {
        if x == 0 {
            None
        } else {
            Some(self.log[x as usize] as usize)
        }
    }

    /// Field addition (XOR)
    pub fn add(&self, x: u8, y: u8) -> u8 {
        x ^ y
    }

    /// Field multiplication
    ///
    /// # Panics
    ///
    /// Both operands must be field elements (see [`GaloisField::contains`])
    pub fn multiply(&self, x: u8, y: u8) -> u8 {
        if x == 0 || y == 0 {
            return 0;
        }
        self.exp[self.log[x as usize] as usize + self.log[y as usize] as usize]
    }

    /// Field division
    ///
    /// # Errors
    ///
    /// Returns `Error::DivisionByZero` when `y` is zero
    pub fn divide(&self, x: u8, y: u8) -> Result<u8> {
        if y == 0 {
            return Err(Error::DivisionByZero);
        }
        if x == 0 {
            return Ok(0);
        }
        let index =
            (self.log[x as usize] as usize + self.order - self.log[y as usize] as usize) % self.order;
        Ok(self.exp[index])
    }

    /// `x` raised to `power`; negative powers give inverses
    pub fn pow(&self, x: u8, power: i64) -> u8 {
        if x == 0 {
            return if power == 0 { 1 } else { 0 };
        }
        let index = (self.log[x as usize] as i64 * power).rem_euclid(self.order as i64);
        self.exp[index as usize]
    }

    /// Multiplicative inverse
    ///
    /// # Errors
    ///
    /// Returns `Error::DivisionByZero` for zero
    pub fn inverse(&self, x: u8) -> Result<u8> {
        self.divide(1, x)
    }

    /// Multiply every coefficient of `p` by `x`
    pub fn poly_scale(&self, p: &[u8], x: u8) -> Vec<u8> {
        p.iter().map(|&c| self.multiply(c, x)).collect()
    }

    /// Add two polynomials, aligning their lowest-order coefficients
    pub fn poly_add(&self, p: &[u8], q: &[u8]) -> Vec<u8> {
        let len = p.len().max(q.len());
        let mut r = vec![0u8; len];
        for (i, &c) in p.iter().enumerate() {
            r[i + len - p.len()] = c;
        }
        for (i, &c) in q.iter().enumerate() {
            r[i + len - q.len()] ^= c;
        }
        r
    }

    /// Multiply two polynomials
    pub fn poly_multiply(&self, p: &[u8], q: &[u8]) -> Vec<u8> {
        if p.is_empty() || q.is_empty() {
            return Vec::new();
        }
        let mut r = vec![0u8; p.len() + q.len() - 1];
        for (j, &b) in q.iter().enumerate() {
            if b == 0 {
                continue;
            }
            for (i, &a) in p.iter().enumerate() {
                r[i + j] ^= self.multiply(a, b);
            }
        }
        r
    }

    /// Evaluate `p` at `x` with Horner's scheme
    ///
    /// # Panics
    ///
    /// Every coefficient and `x` must be field elements
    pub fn poly_eval(&self, p: &[u8], x: u8) -> u8 {
        p.iter().fold(0u8, |acc, &c| self.multiply(acc, x) ^ c)
    }
}
