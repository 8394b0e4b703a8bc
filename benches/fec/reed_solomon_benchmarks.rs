//! Reed-Solomon encode and decode benchmarks.

use burstfec::config::{RS6, RS8};
use burstfec::{ErrorCorrection, RsFrameCodec};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs_encode");
    for (name, config, len) in [("rs8", RS8, 223usize), ("rs6", RS6, 42)] {
        let codec = RsFrameCodec::from_config(&config).unwrap();
        let mask = (1u16 << config.symbol_width) - 1;
        let message: Vec<u8> = (0..len).map(|i| (i as u16 * 37 & mask) as u8).collect();
        group.bench_with_input(BenchmarkId::new(name, len), &message, |b, message| {
            b.iter(|| codec.encode(black_box(message)))
        });
    }
    group.finish();
}

fn bench_fix(c: &mut Criterion) {
    let codec = RsFrameCodec::from_config(&RS8).unwrap();
    let message: Vec<u8> = (0..223).map(|i| (i * 7 + 3) as u8).collect();
    let frame = codec.encode(&message).unwrap();

    let mut group = c.benchmark_group("rs8_fix");
    for errors in [0usize, 2, 4] {
        let mut received = frame.clone();
        for i in 0..errors {
            received[i * 50] ^= 0x5A;
        }
        group.bench_with_input(BenchmarkId::from_parameter(errors), &received, |b, received| {
            b.iter(|| codec.fix(black_box(received)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_fix);
criterion_main!(benches);
