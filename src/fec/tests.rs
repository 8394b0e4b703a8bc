//! Property tests across every configured BCH and Reed-Solomon code.

use super::bch::{multiply, repair, BchCode, Codeword, UNCORRECTABLE};
use super::reed_solomon::ReedSolomon;
use crate::config::{BCH_CONFIGS, RS6, RS8};
use crate::error::Error;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};

/// A few valid codewords: multiples of the generator that fit the word length
fn sample_codewords(code: &BchCode) -> Vec<Codeword> {
    let degree = 63 - code.poly().leading_zeros() as usize;
    let quotients = 1u64 << (code.codeword_bits() - degree);
    [0, 1, quotients / 3, quotients - 1]
        .into_iter()
        .map(|q| Codeword::new(multiply(code.poly(), q), code.codeword_bits()).unwrap())
        .collect()
}

#[test]
fn test_bch_valid_codewords_need_no_repair() {
    for config in BCH_CONFIGS {
        let code = BchCode::from_config(&config).unwrap();
        for word in sample_codewords(&code) {
            assert_eq!(code.syndrome(&word), 0);
            let r = code.repair(&word).unwrap();
            assert_eq!((r.errors, r.word), (0, word), "poly {}", config.poly);
        }
    }
}

#[test]
fn test_bch_single_errors() {
    for config in BCH_CONFIGS {
        let code = BchCode::from_config(&config).unwrap();
        for word in sample_codewords(&code) {
            for i in 0..code.codeword_bits() {
                let noisy = word.flip(i);
                let r = code.repair(&noisy).unwrap();
                assert_eq!((r.errors, r.word), (1, word), "poly {} bit {}", config.poly, i);
                assert_eq!(code.correct(&noisy).unwrap(), r);
            }
        }
    }
}

#[test]
fn test_bch_double_errors() {
    for config in BCH_CONFIGS.iter().filter(|c| c.max_errors >= 2) {
        let code = BchCode::from_config(config).unwrap();
        for word in sample_codewords(&code) {
            for i in 0..code.codeword_bits() {
                for j in (i + 1)..code.codeword_bits() {
                    let noisy = word.flip(i).flip(j);
                    let r = code.repair(&noisy).unwrap();
                    assert_eq!(
                        (r.errors, r.word),
                        (2, word),
                        "poly {} bits {} {}",
                        config.poly,
                        i,
                        j
                    );
                    assert_eq!(code.correct(&noisy).unwrap(), r);
                }
            }
        }
    }
}

#[test]
fn test_bch_triple_errors_detected() {
    // 3545 = (x + 1) * 1207 has minimum distance 6, so no weight-3 error
    // lands within two flips of another codeword
    let config = BCH_CONFIGS[5];
    assert_eq!(config.poly, 3545);
    let code = BchCode::from_config(&config).unwrap();
    let n = code.codeword_bits();

    for a in 0..n {
        for b in (a + 1)..n {
            for c in (b + 1)..n {
                let word = Codeword::new(0, n).unwrap().flip(a).flip(b).flip(c);
                assert_eq!(
                    repair(code.poly(), &word),
                    Err(Error::Uncorrectable { bits: n })
                );
                assert_eq!(code.correct_or_keep(&word), (UNCORRECTABLE, word));
            }
        }
    }
}

fn random_message(rng: &mut StdRng, len: usize, size: usize) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..size) as u8).collect()
}

fn codecs() -> Vec<ReedSolomon> {
    let rs8 = ReedSolomon::from_config(&RS8).unwrap();
    let rs6 = ReedSolomon::from_config(&RS6).unwrap();
    let rs8_short = ReedSolomon::new(
        std::sync::Arc::new(rs8.field().clone()),
        RS8.parity,
        RS8.fcr,
    )
    .unwrap();
    vec![rs8, rs8_short, rs6]
}

#[test]
fn test_rs_roundtrip_every_length() {
    let mut rng = StdRng::seed_from_u64(0x1D);
    for rs in codecs() {
        let size = rs.field().size();
        for len in 1..=(rs.max_length() - rs.nsym()) {
            let message = random_message(&mut rng, len, size);
            let codeword = rs.encode(&message).unwrap();
            let decoded = rs.decode(&codeword, &[]).unwrap();
            assert_eq!(decoded.message, message);
            assert_eq!(decoded.parity, codeword[len..].to_vec());
            assert_eq!(decoded.corrected, 0);
        }
    }
}

#[test]
fn test_rs_random_errors() {
    let mut rng = StdRng::seed_from_u64(2024);
    for rs in codecs() {
        let size = rs.field().size();
        for _ in 0..200 {
            let len = rng.gen_range(1..=(rs.max_length() - rs.nsym()));
            let message = random_message(&mut rng, len, size);
            let codeword = rs.encode(&message).unwrap();

            let errors = rng.gen_range(0..=rs.nsym() / 2);
            let mut received = codeword.clone();
            let mut positions = sample(&mut rng, codeword.len(), errors).into_vec();
            for &p in &positions {
                received[p] ^= rng.gen_range(1..size) as u8;
            }

            let decoded = rs.decode(&received, &[]).unwrap();
            assert_eq!(decoded.message, message);
            assert_eq!(decoded.corrected, errors);
            positions.sort_unstable();
            assert_eq!(decoded.errata, positions);
        }
    }
}

#[test]
fn test_rs_random_errors_and_erasures() {
    let mut rng = StdRng::seed_from_u64(7);
    for rs in codecs() {
        let size = rs.field().size();
        for _ in 0..200 {
            let len = rng.gen_range(1..=(rs.max_length() - rs.nsym()));
            let message = random_message(&mut rng, len, size);
            let codeword = rs.encode(&message).unwrap();

            let erased = rng.gen_range(0..=rs.nsym());
            let errors = (rs.nsym() - erased) / 2;
            let chosen = sample(&mut rng, codeword.len(), erased + errors).into_vec();
            let (erasures, error_positions) = chosen.split_at(erased);

            let mut received = codeword.clone();
            for &p in erasures {
                received[p] = rng.gen_range(0..size) as u8;
            }
            for &p in error_positions {
                received[p] ^= rng.gen_range(1..size) as u8;
            }

            let decoded = rs.decode(&received, erasures).unwrap();
            assert_eq!(decoded.message, message);
            assert_eq!(decoded.parity, codeword[len..].to_vec());
        }
    }
}
