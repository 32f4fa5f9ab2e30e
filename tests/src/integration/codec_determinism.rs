//! # Codec Determinism
//!
//! Property tests over the canonical codec and the encumbrance engine.
//!
//! - Packing is a pure function of the logical value: unpacking and
//!   repacking reproduces the same bytes, and two ledgers built by the same
//!   operations pack identically.
//! - After any sequence of adds and depletions the cached total equals the
//!   sum of the remaining fragments and no zero fragment survives.

#[cfg(test)]
mod tests {
    use ledger_state::{
        AddressEncumbrances, AddressEntry, AssetEncumbrances, EncumbranceDetail,
        EncumbranceEntry, EntryDecoder, Packable, StateEntry,
    };
    use proptest::prelude::*;
    use shared_types::codec::{value_from_bytes, value_to_bytes};
    use shared_types::{Balance, Packer, Unpacker};

    const ASSET: &str = "NS|Bond";
    const REFERENCES: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

    #[derive(Clone, Debug)]
    enum Op {
        Add {
            reference: usize,
            amount: i64,
            cumulative: bool,
            high_priority: bool,
        },
        Consume { reference: usize, amount: i64 },
        Reduce { reference: usize, amount: i64 },
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0..REFERENCES.len(), 1i64..1_000, any::<bool>(), any::<bool>()).prop_map(
                |(reference, amount, cumulative, high_priority)| Op::Add {
                    reference,
                    amount,
                    cumulative,
                    high_priority,
                }
            ),
            1 => (0..REFERENCES.len(), 0i64..500)
                .prop_map(|(reference, amount)| Op::Consume { reference, amount }),
            1 => (0..REFERENCES.len(), 0i64..500)
                .prop_map(|(reference, amount)| Op::Reduce { reference, amount }),
        ]
    }

    fn entry(reference: &str, amount: i64) -> EncumbranceEntry {
        EncumbranceEntry::new(
            reference,
            amount,
            vec![EncumbranceDetail::new("beneficiary", 0, 0)],
            vec![EncumbranceDetail::new("admin", 0, 0)],
        )
    }

    fn apply(ledger: &mut AddressEncumbrances, op: &Op) {
        match *op {
            Op::Add {
                reference,
                amount,
                cumulative,
                high_priority,
            } => {
                ledger.set_encumbrance_entry(
                    ASSET,
                    Some(&entry(REFERENCES[reference], amount)),
                    cumulative,
                    high_priority,
                );
            }
            Op::Consume { reference, amount } => {
                ledger.consume_encumbrance(ASSET, REFERENCES[reference], &Balance::from(amount));
            }
            Op::Reduce { reference, amount } => {
                ledger.reduce_encumbrance(ASSET, REFERENCES[reference], &Balance::from(amount));
            }
        }
    }

    fn build(ops: &[Op]) -> AddressEncumbrances {
        let mut ledger = AddressEncumbrances::new("addr");
        for op in ops {
            apply(&mut ledger, op);
        }
        ledger
    }

    fn assert_total_invariant(asset: &AssetEncumbrances) {
        let sum: Balance = asset.iter().map(|e| e.amount()).sum();
        assert_eq!(asset.encumbrance_total(), &sum);
        assert!(asset.iter().all(|e| e.amount().is_positive()));
    }

    proptest! {
        #[test]
        fn test_total_matches_fragments(ops in prop::collection::vec(op(), 1..40)) {
            let ledger = build(&ops);
            if let Some(asset) = ledger.asset_encumbrance(ASSET) {
                assert_total_invariant(asset);
            }
        }

        #[test]
        fn test_priorities_step_by_ten_after_add(ops in prop::collection::vec(op(), 1..40)) {
            let mut ledger = build(&ops);
            // A final add always renumbers the whole collection.
            ledger.set_encumbrance_entry(ASSET, Some(&entry("omega", 1)), false, false);
            let asset = ledger.asset_encumbrance(ASSET).unwrap();
            for (i, e) in asset.iter().enumerate() {
                prop_assert_eq!(e.priority(), Some(i as i32 * 10));
            }
            for pair in asset.entries().windows(2) {
                prop_assert!(!pair[0].reference().eq_ignore_ascii_case(pair[1].reference()));
            }
        }

        #[test]
        fn test_packed_bytes_are_canonical(ops in prop::collection::vec(op(), 0..40), height in -1i64..1_000) {
            let mut ledger = build(&ops);
            ledger.set_block_update_height(height);
            let bytes = ledger.to_packed_bytes().unwrap();

            let unpacked = AddressEncumbrances::from_packed_bytes(&bytes).unwrap();
            prop_assert_eq!(&unpacked, &ledger);
            prop_assert_eq!(unpacked.to_packed_bytes().unwrap(), bytes.clone());

            let mut rebuilt = build(&ops);
            rebuilt.set_block_update_height(height);
            prop_assert_eq!(rebuilt.to_packed_bytes().unwrap(), bytes);
        }

        #[test]
        fn test_legacy_value_is_canonical(ops in prop::collection::vec(op(), 0..40)) {
            let ledger = build(&ops);
            let bytes = value_to_bytes(&ledger.encode(0)).unwrap();
            let decoded = AddressEncumbrances::decode(&value_from_bytes(&bytes).unwrap()).unwrap();
            prop_assert_eq!(&decoded, &ledger);
            prop_assert_eq!(value_to_bytes(&decoded.encode(0)).unwrap(), bytes);
        }

        #[test]
        fn test_drained_ledger_packs_like_fresh(amounts in prop::collection::vec(1i64..1_000, 1..8)) {
            let mut ledger = AddressEncumbrances::new("addr");
            for (i, amount) in amounts.iter().enumerate() {
                let reference = REFERENCES[i % REFERENCES.len()];
                ledger.set_encumbrance_entry(ASSET, Some(&entry(reference, *amount)), true, false);
            }
            for reference in REFERENCES {
                ledger.consume_encumbrance(ASSET, reference, &Balance::from(1_000_000));
            }
            prop_assert!(ledger.is_empty());
            prop_assert_eq!(
                ledger.to_packed_bytes().unwrap(),
                AddressEncumbrances::new("addr").to_packed_bytes().unwrap()
            );
        }

        #[test]
        fn test_balance_wire_form(n in any::<i128>()) {
            let balance: Balance = n.to_string().parse().unwrap();
            let mut packer = Packer::new();
            balance.pack(&mut packer).unwrap();
            let bytes = packer.into_bytes();

            let mut unpacker = Unpacker::new(&bytes);
            prop_assert_eq!(Balance::unpack(&mut unpacker).unwrap(), balance.clone());
            unpacker.finish("balance").unwrap();

            // Values that fit in i64 always use the plain integer form.
            if let Ok(small) = i64::try_from(n) {
                prop_assert_eq!(balance.to_value(), shared_types::Value::from(small));
            }
            prop_assert_eq!(Balance::from_value(&balance.to_value()).unwrap(), balance);
        }

        #[test]
        fn test_address_balances_pack_in_key_order(
            balances in prop::collection::btree_map("[A-Z]{1,4}\\|[a-z]{1,6}", 1i64..1_000_000, 0..12),
            nonce in 0i64..1_000,
        ) {
            let mut forward = AddressEntry::new("addr");
            let mut backward = AddressEntry::new("addr");
            for (asset, amount) in &balances {
                forward.set_asset_balance(asset, Balance::from(*amount));
            }
            for (asset, amount) in balances.iter().rev() {
                backward.set_asset_balance(asset, Balance::from(*amount));
            }
            forward.set_nonce(nonce);
            backward.set_nonce(nonce);

            let bytes = forward.to_packed_bytes().unwrap();
            prop_assert_eq!(backward.to_packed_bytes().unwrap(), bytes.clone());
            prop_assert_eq!(AddressEntry::from_packed_bytes(&bytes).unwrap(), forward);
        }
    }
}
