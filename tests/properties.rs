use local_addr_registry::{
    AddressFamily, DeviceNumber, LocalAddressRegistry, RegistryError, SvcAddress, PRIVATE_LEN,
    PUBLIC_LEN,
};
use proptest::prelude::*;

/// Public text drawn from a tiny alphabet so that collisions are common.
fn public_text() -> impl Strategy<Value = Vec<u8>> {
    prop_oneof![
        Just(Vec::new()),
        proptest::collection::vec(prop_oneof![Just(b'1'), Just(b'2'), Just(0u8)], 1..=20),
    ]
}

fn private_part() -> impl Strategy<Value = [u8; PRIVATE_LEN]> {
    prop_oneof![Just([0u8; PRIVATE_LEN]), (1u8..4).prop_map(|seed| {
        let mut prv = [0u8; PRIVATE_LEN];
        prv[PRIVATE_LEN - 1] = seed;
        prv
    })]
}

fn any_address() -> impl Strategy<Value = SvcAddress> {
    (
        public_text(),
        private_part(),
        prop_oneof![Just(AddressFamily::SVC), Just(AddressFamily::PVC)],
    )
        .prop_map(|(public, private, family)| {
            SvcAddress::new(&public, private).with_family(family)
        })
}

#[derive(Debug, Clone)]
enum Op {
    Add(SvcAddress),
    Delete(SvcAddress),
    Reset,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => any_address().prop_map(Op::Add),
        3 => any_address().prop_map(Op::Delete),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn validation_accepts_exactly_well_formed_addresses(addr in any_address()) {
        let public_ok = addr.public_text().is_some()
            && addr.to_bytes()[3..3 + PUBLIC_LEN].contains(&0);
        let expected = addr.family() == AddressFamily::SVC
            && (public_ok || (addr.public_text().is_none() && addr.private_part().is_some()));
        prop_assert_eq!(addr.validate().is_ok(), expected);
    }

    #[test]
    fn stored_entries_are_pairwise_distinct(ops in proptest::collection::vec(op(), 0..40)) {
        let registry = LocalAddressRegistry::new(DeviceNumber(0));
        for op in ops {
            match op {
                Op::Add(addr) => { let _ = registry.add(&addr); }
                Op::Delete(addr) => { let _ = registry.delete(&addr); }
                Op::Reset => registry.reset(),
            }
        }

        let stored = registry.snapshot().unwrap();
        for (i, a) in stored.iter().enumerate() {
            prop_assert!(a.validate().is_ok());
            for b in &stored[i + 1..] {
                prop_assert!(!a.identical(b));
                prop_assert_eq!(a.identical(b), b.identical(a));
            }
        }
    }

    #[test]
    fn add_then_delete_restores_count(
        existing in proptest::collection::vec(any_address(), 0..10),
        addr in any_address(),
    ) {
        let registry = LocalAddressRegistry::new(DeviceNumber(0));
        for a in &existing {
            let _ = registry.add(a);
        }
        let before = registry.snapshot().unwrap();

        match registry.add(&addr) {
            Ok(()) => {
                prop_assert_eq!(registry.delete(&addr), Ok(()));
                prop_assert_eq!(registry.snapshot().unwrap(), before);
            }
            Err(RegistryError::InvalidAddress(_)) | Err(RegistryError::DuplicateAddress) => {
                prop_assert_eq!(registry.len(), before.len());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
