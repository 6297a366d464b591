//! Concurrent use of a channel manager.

use std::sync::Arc;
use std::thread;

use hashpay_channel::{ChannelConfig, ChannelError};
use hashpay_test_utils::{manager_pair, test_identity};
use hashpay_types::Secret;

#[test]
fn concurrent_sends_are_serialized_per_channel() {
    let pair = Arc::new(manager_pair(10_000, ChannelConfig::default()));
    let threads = 8;
    let per_thread = 25;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let pair = Arc::clone(&pair);
            thread::spawn(move || {
                let mut sent = Vec::new();
                for i in 0..per_thread {
                    let secret = Secret::from(format!("{t}:{i}").as_str());
                    let transfer = pair
                        .alice_manager
                        .send_locked_transfer(&pair.bob.address, 1, 20, secret.hashlock(), i)
                        .unwrap();
                    sent.push(transfer);
                }
                sent
            })
        })
        .collect();

    let mut transfers: Vec<_> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    // Nonces are gap-free regardless of thread interleaving
    transfers.sort_by_key(|t| t.header.nonce);
    let nonces: Vec<u64> = transfers.iter().map(|t| t.header.nonce).collect();
    let expected: Vec<u64> = (1..=(threads * per_thread)).collect();
    assert_eq!(nonces, expected);

    // Delivered in nonce order, the partner accepts every one
    for transfer in transfers {
        pair.deliver_to_bob(transfer).unwrap();
    }
    let alice_view = pair.alice_manager.snapshot(&pair.bob.address).unwrap();
    let bob_view = pair.bob_manager.snapshot(&pair.alice.address).unwrap();
    assert_eq!(alice_view.ours, bob_view.partner);
    assert_eq!(alice_view.ours.locked, threads * per_thread);
}

#[test]
fn channels_are_independent() {
    let pair = manager_pair(100, ChannelConfig::default());
    let carol = test_identity("carol");
    pair.alice_manager.open_channel(carol.address, 50, 50).unwrap();

    pair.alice_manager.send_direct_transfer(&carol.address, 50, 1).unwrap();
    assert!(matches!(
        pair.alice_manager.send_direct_transfer(&carol.address, 1, 2),
        Err(ChannelError::InsufficientCapacity { .. })
    ));

    // The channel with bob is untouched
    let transfer = pair
        .alice_manager
        .send_direct_transfer(&pair.bob.address, 100, 1)
        .unwrap();
    assert_eq!(transfer.header.nonce, 1);
    pair.deliver_to_bob(transfer).unwrap();
}

#[test]
fn snapshots_read_while_writing() {
    let pair = Arc::new(manager_pair(1_000, ChannelConfig::default()));

    let writer = {
        let pair = Arc::clone(&pair);
        thread::spawn(move || {
            for i in 0..100 {
                pair.alice_manager
                    .send_direct_transfer(&pair.bob.address, 1, i)
                    .unwrap();
            }
        })
    };

    for _ in 0..100 {
        let snapshot = pair.alice_manager.snapshot(&pair.bob.address).unwrap();
        assert_eq!(snapshot.ours.transferred_amount, snapshot.ours.nonce);
        assert_eq!(snapshot.total_value(), 2_000);
    }
    writer.join().unwrap();
}
