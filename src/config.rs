//! Fixed code parameters and decoder options.
//!
//! The BCH and Reed-Solomon parameter sets below must match the transmitter
//! exactly; they are built once into a [`CodeRegistry`](crate::registry::CodeRegistry).

/// Parameters of one binary BCH code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BchConfig {
    /// Generator polynomial as a bit mask
    pub poly: u64,
    /// Codeword length in bits
    pub codeword_bits: usize,
    /// Syndrome table width in bits
    pub syndrome_bits: usize,
    /// Error weight tabulated (1 or 2)
    pub max_errors: u8,
}

/// Generator used for the 7-bit header code
pub const HEADER_BCH_POLY: u64 = 29;

/// Generator used for the 14-bit link control words
pub const LCW_BCH_POLY: u64 = 465;

/// Generator used for the 26-bit link control words
pub const LCW_SHORT_BCH_POLY: u64 = 41;

/// Generator used for messaging payload blocks
pub const MESSAGING_BCH_POLY: u64 = 1897;

/// Generator used for ring alert payload blocks
pub const RINGALERT_BCH_POLY: u64 = 1207;

/// Generator used for acquisition/synchronisation blocks
pub const ACQUISITION_BCH_POLY: u64 = 3545;

/// The six BCH codes initialized at start-up.
pub const BCH_CONFIGS: [BchConfig; 6] = [
    BchConfig {
        poly: HEADER_BCH_POLY,
        codeword_bits: 7,
        syndrome_bits: 4,
        max_errors: 1,
    },
    BchConfig {
        poly: LCW_BCH_POLY,
        codeword_bits: 14,
        syndrome_bits: 8,
        max_errors: 2,
    },
    BchConfig {
        poly: LCW_SHORT_BCH_POLY,
        codeword_bits: 26,
        syndrome_bits: 5,
        max_errors: 1,
    },
    BchConfig {
        poly: MESSAGING_BCH_POLY,
        codeword_bits: 31,
        syndrome_bits: 10,
        max_errors: 2,
    },
    BchConfig {
        poly: RINGALERT_BCH_POLY,
        codeword_bits: 31,
        syndrome_bits: 10,
        max_errors: 2,
    },
    BchConfig {
        poly: ACQUISITION_BCH_POLY,
        codeword_bits: 31,
        syndrome_bits: 11,
        max_errors: 2,
    },
];

/// Parameters of one Reed-Solomon frame code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RsConfig {
    /// Bits per symbol
    pub symbol_width: u32,
    /// Primitive polynomial of the field
    pub primitive: u16,
    /// Generator element
    pub generator: u8,
    /// First consecutive root of the generator polynomial
    pub fcr: usize,
    /// Parity symbols carried in the frame
    pub parity: usize,
    /// Trailing parity symbols never transmitted, decoded as erasures
    pub erasures: usize,
}

impl RsConfig {
    /// Parity symbols of the underlying code (transmitted plus erased)
    pub fn nsym(&self) -> usize {
        self.parity + self.erasures
    }
}

/// 8-bit symbol code: 8 transmitted parity bytes plus an 8-byte erasure region.
pub const RS8: RsConfig = RsConfig {
    symbol_width: 8,
    primitive: 0x11D,
    generator: 2,
    fcr: 0,
    parity: 8,
    erasures: 8,
};

/// 6-bit symbol code: 10 parity symbols, no erasure region.
pub const RS6: RsConfig = RsConfig {
    symbol_width: 6,
    primitive: 0x43,
    generator: 2,
    fcr: 54,
    parity: 10,
    erasures: 0,
};

/// Options for the per-record decoding pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoderConfig {
    /// Drop records whose confidence is below this percentage
    pub min_confidence: Option<u32>,
    /// Drop records that needed any correction or had an uncorrectable block
    pub perfect_only: bool,
    /// BCH code applied to the de-interleaved payload blocks
    pub bch_poly: u64,
    /// Interleave depth of the payload
    pub streams: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            min_confidence: None,
            perfect_only: false,
            bch_poly: MESSAGING_BCH_POLY,
            streams: 2,
        }
    }
}

impl DecoderConfig {
    /// Keep only records with at least 90% confidence
    pub fn good() -> Self {
        Self {
            min_confidence: Some(90),
            ..Self::default()
        }
    }
}
