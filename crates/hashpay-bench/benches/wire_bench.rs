use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hashpay_crypto::{generate_identity, Address, Signature};
use hashpay_locksroot::compute_locksroot;
use hashpay_types::{Lock, Secret};
use hashpay_wire::{decode, encode, Message, Transfer, TransferHeader, TransferKind};

fn sample_transfer(kind: TransferKind) -> Transfer {
    let (private_key, _) = generate_identity();
    let mut transfer = Transfer::new(
        TransferHeader {
            identifier: 7,
            nonce: 42,
            asset: Address([0x11; 20]),
            recipient: Address([0x22; 20]),
            transferred_amount: 1_000,
            locksroot: Default::default(),
            signature: Signature::EMPTY,
        },
        kind,
    );
    transfer.sign(&private_key).unwrap();
    transfer
}

fn sample_kinds() -> Vec<(&'static str, TransferKind)> {
    let lock = Lock::new(50, 100, Secret::from("bench").hashlock());
    vec![
        ("direct", TransferKind::Direct),
        ("locked", TransferKind::Locked { lock }),
        (
            "mediated",
            TransferKind::Mediated {
                lock,
                target: Address([0x33; 20]),
                initiator: Address([0x44; 20]),
                fee: 0,
            },
        ),
        ("refund", TransferKind::Refund { lock }),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_encode");
    for (name, kind) in sample_kinds() {
        let message = Message::from(sample_transfer(kind));
        group.bench_with_input(BenchmarkId::from_parameter(name), &message, |b, message| {
            b.iter(|| black_box(encode(black_box(message))));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_decode");
    for (name, kind) in sample_kinds() {
        let bytes = encode(&Message::from(sample_transfer(kind)));
        group.bench_with_input(BenchmarkId::from_parameter(name), &bytes, |b, bytes| {
            b.iter(|| black_box(decode(black_box(bytes))));
        });
    }
    group.finish();
}

fn bench_decode_and_recover(c: &mut Criterion) {
    let (_, kind) = sample_kinds().swap_remove(2);
    let bytes = encode(&Message::from(sample_transfer(kind)));

    c.bench_function("mediated_decode_and_recover", |b| {
        b.iter(|| {
            let message = decode(black_box(&bytes)).unwrap();
            black_box(message.recover_signer())
        });
    });
}

fn bench_locksroot(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_locksroot");
    for count in [1usize, 10, 100, 1000].iter() {
        let locks: Vec<Lock> = (0..*count)
            .map(|i| Lock::new(i as u64 + 1, 100, Secret::from(i.to_string().as_str()).hashlock()))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &locks, |b, locks| {
            b.iter(|| black_box(compute_locksroot(black_box(locks.iter()))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_encode,
    bench_decode,
    bench_decode_and_recover,
    bench_locksroot
);

criterion_main!(benches);
