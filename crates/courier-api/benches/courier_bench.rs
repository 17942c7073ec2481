//! Criterion microbenchmarks for the interaction hot path.
//!
//! Run with:
//!   cargo bench -p courier-api
//!
//! HTML reports are written to `target/criterion/`.

use axum::body::Bytes;
use courier_api::protocol::{classify, compose};
use courier_common::models::Interaction;
use courier_signing::{InteractionSigner, verify_key};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

const TS: &str = "1700000000";

fn command_body(option_len: usize) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "id": "1198765432109876543",
        "application_id": "1098765432109876543",
        "type": 2,
        "token": "aW50ZXJhY3Rpb246MTE5ODc2NTQzMjEwOTg3NjU0Mzp0b2tlbg",
        "version": 1,
        "guild_id": "998765432109876543",
        "channel_id": "1008765432109876543",
        "member": { "user": { "id": "80351110224678912", "username": "nelly" } },
        "data": {
            "id": "1111111111111111111",
            "name": "ask",
            "type": 1,
            "options": [{ "name": "prompt", "type": 3, "value": "x".repeat(option_len) }]
        }
    }))
    .unwrap()
}

// ── Signature verification ───────────────────────────────────────────────────

fn bench_verify(c: &mut Criterion) {
    let signer = InteractionSigner::generate();
    let verifier = signer.verifier();
    let key_hex = signer.public_key_hex();
    let body = command_body(64);
    let sig = signer.sign(TS, &body);

    c.bench_function("verify/parsed_key", |b| {
        b.iter(|| verifier.verify(Some(black_box(body.as_slice())), Some(sig.as_str()), Some(TS)))
    });

    c.bench_function("verify/hex_key", |b| {
        b.iter(|| verify_key(black_box(&body), &sig, TS, &key_hex))
    });
}

/// How verification cost scales with body size (the message is hashed in full).
fn bench_verify_size_scaling(c: &mut Criterion) {
    let signer = InteractionSigner::generate();
    let verifier = signer.verifier();
    let mut group = c.benchmark_group("verify/body_size");

    for len in [16usize, 1024, 16 * 1024] {
        let body = command_body(len);
        let sig = signer.sign(TS, &body);
        group.bench_with_input(BenchmarkId::from_parameter(body.len()), &body, |b, body| {
            b.iter(|| verifier.verify(Some(body.as_slice()), Some(sig.as_str()), Some(TS)))
        });
    }

    group.finish();
}

// ── Parse + classify + compose ───────────────────────────────────────────────

fn bench_classify(c: &mut Criterion) {
    let body = Bytes::from(command_body(64));

    c.bench_function("protocol/parse_classify_compose", |b| {
        b.iter(|| {
            let interaction = Interaction::parse(black_box(body.clone())).unwrap();
            compose(classify(&interaction))
        })
    });
}

// ── criterion entrypoints ─────────────────────────────────────────────────────

criterion_group!(signing, bench_verify, bench_verify_size_scaling);

criterion_group!(protocol, bench_classify);

criterion_main!(signing, protocol);
