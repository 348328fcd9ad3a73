//! Integration tests for concurrent use of one registry.

use local_addr_registry::{
    decode_snapshot, DeviceNumber, LocalAddressRegistry, RegistryError, SvcAddress,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

fn addr(thread: usize, n: usize) -> SvcAddress {
    SvcAddress::from_public(&format!("{thread}{n:04}"))
}

#[test]
fn test_concurrent_adds_of_distinct_addresses() {
    let registry = Arc::new(LocalAddressRegistry::new(DeviceNumber(0)));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for n in 0..PER_THREAD {
                    registry.add(&addr(t, n)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let snapshot = registry.snapshot().unwrap();
    assert_eq!(snapshot.len(), THREADS * PER_THREAD);
    let unique: HashSet<_> = snapshot.iter().map(|a| a.public_text().unwrap()).collect();
    assert_eq!(unique.len(), THREADS * PER_THREAD);

    // Each thread's addresses keep their relative insertion order.
    for t in 0..THREADS {
        let mine: Vec<_> = snapshot
            .iter()
            .filter(|a| a.public_text().unwrap()[0] == b'0' + t as u8)
            .copied()
            .collect();
        let expected: Vec<_> = (0..PER_THREAD).map(|n| addr(t, n)).collect();
        assert_eq!(mine, expected);
    }
}

#[test]
fn test_racing_adds_of_one_address_admit_exactly_one() {
    let registry = Arc::new(LocalAddressRegistry::new(DeviceNumber(0)));
    let barrier = Arc::new(Barrier::new(THREADS));
    let wins = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            let wins = wins.clone();
            thread::spawn(move || {
                barrier.wait();
                match registry.add(&SvcAddress::from_public("12345")) {
                    Ok(()) => {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    Err(err) => assert_eq!(err, RegistryError::DuplicateAddress),
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(wins.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_enumerate_sees_whole_states_only() {
    let registry = Arc::new(LocalAddressRegistry::new(DeviceNumber(0)));
    let pair = [SvcAddress::from_public("1"), SvcAddress::from_public("2")];

    let writer = {
        let registry = registry.clone();
        thread::spawn(move || {
            for _ in 0..500 {
                registry.add(&pair[0]).unwrap();
                registry.add(&pair[1]).unwrap();
                registry.reset();
            }
        })
    };

    for _ in 0..500 {
        let mut out = Vec::new();
        let written = registry.enumerate(&mut out).unwrap();
        assert_eq!(written % SvcAddress::SIZE, 0);
        let seen = decode_snapshot(&out);
        assert!(seen.len() <= 2);
        assert_eq!(&seen[..], &pair[..seen.len()]);
    }

    writer.join().unwrap();
}

#[test]
fn test_registry_survives_panicking_notifier() {
    let registry = Arc::new(LocalAddressRegistry::new(DeviceNumber(0)));
    registry.set_notifier(|_: DeviceNumber| panic!("signaling crashed"));

    let crashing = {
        let registry = registry.clone();
        thread::spawn(move || registry.add(&SvcAddress::from_public("1")))
    };
    assert!(crashing.join().is_err());

    registry.clear_notifier();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.add(&SvcAddress::from_public("2")), Ok(()));
}
