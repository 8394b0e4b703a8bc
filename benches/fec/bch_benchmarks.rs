//! BCH correction and batch decoding benchmarks.
//!
//! Run with: cargo bench --bench bch (add `--features parallel` for rayon)

use burstfec::burst::bits::{bits_to_string, interleave, parse_bits};
use burstfec::burst::IRIDIUM_ACCESS;
use burstfec::config::MESSAGING_BCH_POLY;
use burstfec::fec::bch::multiply;
use burstfec::{BurstDecoder, CodeRegistry, Codeword};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

fn bench_correct(c: &mut Criterion) {
    let registry = CodeRegistry::new().unwrap();
    let code = registry.bch(MESSAGING_BCH_POLY).unwrap();
    let clean = Codeword::new(multiply(MESSAGING_BCH_POLY, 0x1F0F0), 31).unwrap();

    let mut group = c.benchmark_group("bch_correct");
    for errors in [0usize, 1, 2] {
        let word = (0..errors).fold(clean, |w, i| w.flip(i * 11));
        group.bench_with_input(BenchmarkId::new("table", errors), &word, |b, word| {
            b.iter(|| code.correct(black_box(word)))
        });
        group.bench_with_input(BenchmarkId::new("brute_force", errors), &word, |b, word| {
            b.iter(|| code.repair(black_box(word)))
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let decoder = BurstDecoder::with_defaults().unwrap();
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [16usize, 256] {
        let lines: Vec<String> = (0..batch_size)
            .map(|i| {
                let streams: Vec<_> = (0..2u64)
                    .map(|k| {
                        let q = (i as u64 * 2 + k) % (1 << 21);
                        Codeword::new(multiply(MESSAGING_BCH_POLY, q), 31)
                            .unwrap()
                            .flip(i % 31)
                            .to_bits()
                    })
                    .collect();
                let mut bits = parse_bits(IRIDIUM_ACCESS).unwrap();
                bits.extend_from_bitslice(&interleave(&streams));
                format!(
                    "RWA: bench 0 1626270833 A:OK I:{:011} 99% 0.5 {} {}",
                    i,
                    bits.len(),
                    bits_to_string(&bits)
                )
            })
            .collect();

        group.throughput(Throughput::Elements(batch_size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &lines, |b, lines| {
            b.iter(|| decoder.decode_batch(black_box(lines.as_slice())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_correct, bench_batch);
criterion_main!(benches);
