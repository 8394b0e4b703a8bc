//! Per-record correction pipeline and batch driver.
//!
//! Each capture record flows through:
//!
//! 1. parse into a [`Frame`]
//! 2. confidence filter
//! 3. bit-order normalization
//! 4. access code check and strip
//! 5. de-interleave into the configured number of streams
//! 6. BCH correction of every complete codeword block in each stream
//! 7. optional "perfect only" filter
//!
//! Records are independent. A batch never stops on a bad record; each one
//! gets its own outcome and the batch is summarised in [`BatchStats`]. With
//! the `parallel` feature the batch is spread over the rayon thread pool.

use crate::burst::bits::{deinterleave, pack_symbols};
use crate::burst::{AccessCode, Frame, ACCESS_BITS};
use crate::config::DecoderConfig;
use crate::error::{Error, Result};
use crate::fec::bch::{BchCode, Codeword, UNCORRECTABLE};
use crate::fec::reed_solomon::Decoded;
use crate::registry::{CodeRegistry, RsProfile};
use bitvec::prelude::*;
use log::{debug, info, warn};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// One BCH block after correction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectedBlock {
    /// Corrected word, or the received word when uncorrectable
    pub word: Codeword,
    /// Bits flipped, or [`UNCORRECTABLE`]
    pub errors: i32,
}

impl CorrectedBlock {
    /// Whether the block was repaired (or needed no repair)
    pub fn is_ok(&self) -> bool {
        self.errors != UNCORRECTABLE
    }
}

/// A record that made it through the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedBurst {
    /// The parsed record, bits in transmission order
    pub frame: Frame,
    /// Access code found at the start of the burst
    pub access: Option<AccessCode>,
    /// Corrected blocks per de-interleaved stream
    pub streams: Vec<Vec<CorrectedBlock>>,
}

impl DecodedBurst {
    /// Total bits flipped over all correctable blocks
    pub fn fixed_errors(&self) -> u32 {
        self.blocks()
            .filter(|b| b.is_ok())
            .map(|b| b.errors as u32)
            .sum()
    }

    /// Number of blocks left uncorrected
    pub fn uncorrectable(&self) -> usize {
        self.blocks().filter(|b| !b.is_ok()).count()
    }

    /// No corrections were needed and every block is valid
    pub fn is_perfect(&self) -> bool {
        self.blocks().all(|b| b.errors == 0)
    }

    /// All blocks, stream by stream
    pub fn blocks(&self) -> impl Iterator<Item = &CorrectedBlock> {
        self.streams.iter().flatten()
    }

    /// Corrected bits, taking block `i` of every stream before block `i + 1`
    pub fn corrected_bits(&self) -> BitVec<u8, Msb0> {
        let depth = self.streams.iter().map(|s| s.len()).max().unwrap_or(0);
        let mut out = BitVec::new();
        for i in 0..depth {
            for stream in &self.streams {
                if let Some(block) = stream.get(i) {
                    out.extend_from_bitslice(&block.word.to_bits());
                }
            }
        }
        out
    }
}

/// Outcome of one record in a batch
pub type LineOutcome = Result<Option<DecodedBurst>>;

/// Counters over one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Records seen
    pub lines: usize,
    /// Records decoded
    pub decoded: usize,
    /// Records dropped by a filter
    pub filtered: usize,
    /// Records that failed to parse or decode
    pub failed: usize,
    /// Bits corrected over all decoded records
    pub fixed_errors: u64,
    /// Blocks left uncorrected over all decoded records
    pub uncorrectable_blocks: usize,
}

impl BatchStats {
    fn record(&mut self, outcome: &LineOutcome) {
        self.lines += 1;
        match outcome {
            Ok(Some(burst)) => {
                self.decoded += 1;
                self.fixed_errors += burst.fixed_errors() as u64;
                self.uncorrectable_blocks += burst.uncorrectable();
            }
            Ok(None) => self.filtered += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// Per-record outcomes in input order plus their summary
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per input line
    pub outcomes: Vec<LineOutcome>,
    /// Counters over `outcomes`
    pub stats: BatchStats,
}

/// Runs capture records through parsing and correction
#[derive(Debug, Clone)]
pub struct BurstDecoder {
    registry: Arc<CodeRegistry>,
    config: DecoderConfig,
}

impl BurstDecoder {
    /// Create a decoder over a shared registry
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the configured BCH code is not in the
    /// registry or the stream count is zero
    pub fn new(registry: Arc<CodeRegistry>, config: DecoderConfig) -> Result<Self> {
        registry.require_bch(config.bch_poly)?;
        if config.streams == 0 {
            return Err(Error::Config("stream count must be at least 1".to_string()));
        }
        Ok(BurstDecoder { registry, config })
    }

    /// Decoder over the standard registry with default options
    pub fn with_defaults() -> Result<Self> {
        Self::new(CodeRegistry::shared()?, DecoderConfig::default())
    }

    /// Shared code registry
    pub fn registry(&self) -> &Arc<CodeRegistry> {
        &self.registry
    }

    /// Active options
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    fn bch(&self) -> Result<&BchCode> {
        self.registry.require_bch(self.config.bch_poly)
    }

    /// BCH-correct every complete block of `stream`; trailing bits are ignored
    pub fn correct_stream(&self, stream: &BitSlice<u8, Msb0>) -> Result<Vec<CorrectedBlock>> {
        let code = self.bch()?;
        stream
            .chunks_exact(code.codeword_bits())
            .map(|chunk| {
                let received = Codeword::from_bits(chunk)?;
                let (errors, word) = code.correct_or_keep(&received);
                Ok(CorrectedBlock { word, errors })
            })
            .collect()
    }

    /// Run one record through the pipeline.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(burst))` for a decoded record
    /// * `Ok(None)` when a filter dropped the record
    /// * `Err(Error::Parse)` or `Err(Error::InputTooShort)` for records that
    ///   cannot be decoded
    pub fn decode_line(&self, line: &str) -> LineOutcome {
        let mut frame = Frame::parse(line)?;

        if let Some(min) = self.config.min_confidence {
            if frame.confidence < min {
                debug!("dropping {}: confidence below {}%", frame.id, min);
                return Ok(None);
            }
        }

        frame.normalize_bit_order();

        if frame.bits.len() < ACCESS_BITS {
            return Err(Error::InputTooShort {
                required: ACCESS_BITS,
                actual: frame.bits.len(),
            });
        }

        let access = frame.access_code();
        if access.is_none() {
            debug!("{}: no access code at burst start", frame.id);
        }

        let payload = &frame.bits[ACCESS_BITS..];
        let streams = deinterleave(payload, self.config.streams, 0)?
            .iter()
            .map(|stream| self.correct_stream(stream))
            .collect::<Result<Vec<_>>>()?;

        let burst = DecodedBurst {
            frame,
            access,
            streams,
        };

        if self.config.perfect_only && !burst.is_perfect() {
            debug!(
                "dropping {}: {} bits fixed, {} blocks uncorrectable",
                burst.frame.id,
                burst.fixed_errors(),
                burst.uncorrectable()
            );
            return Ok(None);
        }

        Ok(Some(burst))
    }

    /// Pack `bits` into symbols for `profile` and repair them as one RS frame
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the bits do not fill whole symbols,
    /// or the decoder's error when the frame cannot be repaired
    pub fn correct_symbols(&self, bits: &BitSlice<u8, Msb0>, profile: RsProfile) -> Result<Decoded> {
        let codec = self.registry.rs(profile);
        let mut symbols = pack_symbols(bits, codec.symbol_width())?;
        if codec.check(&symbols) {
            debug!("{} frame of {} symbols passed check", profile, symbols.len());
            let parity = symbols.split_off(symbols.len() - codec.parity());
            return Ok(Decoded {
                message: symbols,
                parity,
                errata: Vec::new(),
                corrected: 0,
            });
        }
        codec.fix(&symbols)
    }

    fn decode_all<S: AsRef<str> + Sync>(&self, lines: &[S]) -> Vec<LineOutcome> {
        #[cfg(feature = "parallel")]
        let outcomes = lines
            .par_iter()
            .map(|line| self.decode_line(line.as_ref()))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let outcomes = lines
            .iter()
            .map(|line| self.decode_line(line.as_ref()))
            .collect();

        outcomes
    }

    /// Decode independent records, keeping their order in the report
    pub fn decode_batch<S: AsRef<str> + Sync>(&self, lines: &[S]) -> BatchReport {
        let outcomes = self.decode_all(lines);

        let mut stats = BatchStats::default();
        for (i, outcome) in outcomes.iter().enumerate() {
            if let Err(e) = outcome {
                warn!("skipping record {}: {}", i, e);
            }
            stats.record(outcome);
        }

        info!(
            "decoded {} of {} records ({} filtered, {} failed, {} bits fixed)",
            stats.decoded, stats.lines, stats.filtered, stats.failed, stats.fixed_errors
        );

        BatchReport { outcomes, stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::burst::bits::{bits_to_string, interleave, parse_bits, unpack_symbols};
    use crate::burst::IRIDIUM_ACCESS;
    use crate::config::MESSAGING_BCH_POLY;
    use crate::fec::bch::multiply;
    use crate::fec::ErrorCorrection;

    fn codeword(q: u64) -> BitVec<u8, Msb0> {
        Codeword::new(multiply(MESSAGING_BCH_POLY, q), 31)
            .unwrap()
            .to_bits()
    }

    /// Access code followed by two interleaved streams of one block each
    fn burst_bits(first: &BitSlice<u8, Msb0>, second: &BitSlice<u8, Msb0>) -> String {
        let mut bits = parse_bits(IRIDIUM_ACCESS).unwrap();
        bits.extend_from_bitslice(&interleave(&[first.to_bitvec(), second.to_bitvec()]));
        bits_to_string(&bits)
    }

    fn record(tag: &str, confidence: u32, bits: &str) -> String {
        format!(
            "{}: test.bits 1000.0 1626270833 A:OK I:00000000001 {}% 0.5 {} {}",
            tag,
            confidence,
            bits.len(),
            bits
        )
    }

    #[test]
    fn test_decode_clean_burst() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        let (a, b) = (codeword(0x1234), codeword(0x0F0F));
        let line = record("RWA", 99, &burst_bits(&a, &b));

        let burst = decoder.decode_line(&line).unwrap().unwrap();
        assert_eq!(burst.access, Some(AccessCode::Downlink));
        assert_eq!(burst.streams.len(), 2);
        assert_eq!(burst.streams[0][0].word.to_bits(), a);
        assert_eq!(burst.streams[1][0].word.to_bits(), b);
        assert!(burst.is_perfect());
        assert_eq!(burst.fixed_errors(), 0);
        assert_eq!(burst.corrected_bits().len(), 62);
    }

    #[test]
    fn test_decode_corrects_errors() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        let (a, b) = (codeword(0x1234), codeword(0x0F0F));
        let mut noisy_a = a.clone();
        let bit = noisy_a[3];
        noisy_a.set(3, !bit);
        let mut noisy_b = b.clone();
        for i in [0, 30] {
            let bit = noisy_b[i];
            noisy_b.set(i, !bit);
        }

        let line = record("RWA", 99, &burst_bits(&noisy_a, &noisy_b));
        let burst = decoder.decode_line(&line).unwrap().unwrap();
        assert_eq!(burst.streams[0][0].errors, 1);
        assert_eq!(burst.streams[1][0].errors, 2);
        assert_eq!(burst.streams[0][0].word.to_bits(), a);
        assert_eq!(burst.streams[1][0].word.to_bits(), b);
        assert_eq!(burst.fixed_errors(), 3);
        assert!(!burst.is_perfect());
    }

    #[test]
    fn test_swapped_capture() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        let clean = burst_bits(&codeword(7), &codeword(9));
        // capture the same bits least significant bit first
        let swapped = bits_to_string(&crate::burst::normalize_bit_order(&parse_bits(&clean).unwrap()));

        let line = record("RAW", 99, &swapped);
        let burst = decoder.decode_line(&line).unwrap().unwrap();
        assert_eq!(burst.access, Some(AccessCode::Downlink));
        assert!(burst.is_perfect());
    }

    #[test]
    fn test_filters() {
        let config = DecoderConfig {
            min_confidence: Some(90),
            perfect_only: true,
            ..DecoderConfig::default()
        };
        let decoder = BurstDecoder::new(CodeRegistry::shared().unwrap(), config).unwrap();

        let clean = burst_bits(&codeword(1), &codeword(2));
        assert!(decoder.decode_line(&record("RWA", 95, &clean)).unwrap().is_some());
        assert!(decoder.decode_line(&record("RWA", 80, &clean)).unwrap().is_none());

        let mut noisy = codeword(1);
        let bit = noisy[0];
        noisy.set(0, !bit);
        let line = record("RWA", 95, &burst_bits(&noisy, &codeword(2)));
        assert!(decoder.decode_line(&line).unwrap().is_none());
    }

    #[test]
    fn test_short_and_bad_records() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        assert_eq!(
            decoder.decode_line(&record("RWA", 99, "0011")),
            Err(Error::InputTooShort {
                required: ACCESS_BITS,
                actual: 4
            })
        );
        assert!(matches!(decoder.decode_line("not a record"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_invalid_decoder_config() {
        let registry = CodeRegistry::shared().unwrap();
        let config = DecoderConfig {
            bch_poly: 12345,
            ..DecoderConfig::default()
        };
        assert!(matches!(BurstDecoder::new(registry.clone(), config), Err(Error::Config(_))));

        let config = DecoderConfig {
            streams: 0,
            ..DecoderConfig::default()
        };
        assert!(matches!(BurstDecoder::new(registry, config), Err(Error::Config(_))));
    }

    #[test]
    fn test_batch() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        let mut noisy = codeword(5);
        let bit = noisy[10];
        noisy.set(10, !bit);

        let lines = vec![
            record("RWA", 99, &burst_bits(&codeword(1), &codeword(2))),
            "garbage".to_string(),
            record("RWA", 99, &burst_bits(&noisy, &codeword(6))),
            record("RWA", 99, "01"),
        ];

        let report = decoder.decode_batch(lines.as_slice());
        assert_eq!(report.outcomes.len(), 4);
        assert!(matches!(report.outcomes[0], Ok(Some(_))));
        assert!(matches!(report.outcomes[1], Err(Error::Parse { .. })));
        assert!(matches!(report.outcomes[2], Ok(Some(_))));
        assert!(matches!(report.outcomes[3], Err(Error::InputTooShort { .. })));
        assert_eq!(
            report.stats,
            BatchStats {
                lines: 4,
                decoded: 2,
                filtered: 0,
                failed: 2,
                fixed_errors: 1,
                uncorrectable_blocks: 0,
            }
        );
    }

    #[test]
    fn test_correct_symbols() {
        let decoder = BurstDecoder::with_defaults().unwrap();
        let codec = decoder.registry().rs(RsProfile::Rs8);
        let message: Vec<u8> = (0..31).map(|i| (i * 7 + 3) as u8).collect();
        let mut frame = ErrorCorrection::encode(codec, &message).unwrap();
        frame[4] ^= 0x81;
        frame[33] ^= 0x10;

        let bits = unpack_symbols(&frame, 8).unwrap();
        let fixed = decoder.correct_symbols(&bits, RsProfile::Rs8).unwrap();
        assert_eq!(fixed.message, message);
        assert_eq!(fixed.errata, vec![4, 33]);

        let codec6 = decoder.registry().rs(RsProfile::Rs6);
        let message6: Vec<u8> = (0..42).map(|i| ((i * 5 + 1) % 64) as u8).collect();
        let frame6 = ErrorCorrection::encode(codec6, &message6).unwrap();
        let bits6 = unpack_symbols(&frame6, 6).unwrap();
        let fixed6 = decoder.correct_symbols(&bits6, RsProfile::Rs6).unwrap();
        assert_eq!(fixed6.message, message6);
        assert_eq!(fixed6.parity, frame6[42..].to_vec());
        assert_eq!(fixed6.corrected, 0);
        assert!(fixed6.errata.is_empty());
        assert_eq!(Ok(fixed6), codec6.fix(&frame6));

        assert!(matches!(
            decoder.correct_symbols(&bits6[..10], RsProfile::Rs6),
            Err(Error::InvalidInput(_))
        ));
    }
}
