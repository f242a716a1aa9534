//! Benchmarks for hybrid encryption and OTP signing
//!
//! Measures per-file cost across payload sizes and the fixed cost of RSA
//! wrap/unwrap and Ed25519 signing.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sealdrop_core::crypto::{
    decrypt, encrypt, generate_encryption_keypair, sign_otp, verify_otp, SigningKeyPair,
    DEFAULT_RSA_BITS,
};

fn bench_hybrid(c: &mut Criterion) {
    let pair = generate_encryption_keypair(DEFAULT_RSA_BITS).expect("keygen");
    let mut group = c.benchmark_group("hybrid");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let payload = vec![0x5au8; size];
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("encrypt", size), &payload, |b, data| {
            b.iter(|| encrypt(black_box(data), &pair.public).expect("encrypt"))
        });

        let bundle = encrypt(&payload, &pair.public).expect("encrypt");
        group.bench_with_input(BenchmarkId::new("decrypt", size), &bundle, |b, bundle| {
            b.iter(|| decrypt(black_box(bundle), &pair.private).expect("decrypt"))
        });
    }

    group.finish();
}

fn bench_otp(c: &mut Criterion) {
    let signing_key = SigningKeyPair::generate();
    let verify_key = signing_key.verify_key();
    let signature = sign_otp("482913", &signing_key);

    c.bench_function("otp_sign", |b| {
        b.iter(|| sign_otp(black_box("482913"), &signing_key))
    });
    c.bench_function("otp_verify", |b| {
        b.iter(|| verify_otp(black_box("482913"), &signature, &verify_key))
    });
}

criterion_group!(benches, bench_hybrid, bench_otp);
criterion_main!(benches);
