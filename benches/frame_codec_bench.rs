//! Criterion benchmark untuk framing + codec
//!
//! Run dengan: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use termchat_bench::protocol::{decode_frame, encode_frame, BincodeCodec, Envelope, RawCodec};

fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_frame");
    group.throughput(Throughput::Elements(1));

    let env = Envelope::p2p_message(1, 2, b"Benchmark Payload Data");

    group.bench_function("encode", |b| {
        let mut out = Vec::with_capacity(256);
        b.iter(|| {
            out.clear();
            encode_frame(&BincodeCodec, black_box(&env), &mut out).unwrap();
        });
    });

    let mut wire = Vec::new();
    encode_frame(&BincodeCodec, &env, &mut wire).unwrap();

    group.bench_function("decode", |b| {
        b.iter(|| {
            black_box(decode_frame(&BincodeCodec, black_box(&wire)).unwrap());
        });
    });

    group.finish();
}

fn bench_body_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_frame");

    for size in [64usize, 4096, 64 * 1024].iter() {
        group.throughput(Throughput::Bytes(*size as u64));
        let body = vec![0u8; *size];
        let mut wire = Vec::new();
        encode_frame(&RawCodec, &body, &mut wire).unwrap();

        group.bench_function(format!("decode_{}", size), |b| {
            b.iter(|| {
                black_box(decode_frame(&RawCodec, black_box(&wire)).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_envelope, bench_body_sizes);
criterion_main!(benches);
