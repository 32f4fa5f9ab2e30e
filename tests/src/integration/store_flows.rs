//! # Store Flows
//!
//! Entries loaded from, mutated and committed back to the in-memory entry
//! store, the way the ledger engine drives a block:
//!
//! ```text
//! get(key) ──→ typed entry ──mutate──→ set_block_update_height(h) ──→ commit
//! ```
//!
//! Root hashes must agree between independent stores that applied the same
//! logical changes, whatever the order of commits.

#[cfg(test)]
mod tests {
    use ledger_state::{
        AddressEncumbrances, AddressEntry, ContractData, ContractEntry, ContractHeader,
        EncumbranceDetail, EncumbranceEntry, EntryStore, InMemoryEntryStore, NamespaceAsset,
        NamespaceEntry, PoaDetail, PoaEntry, PoaItem, SignNodeEntry, StateConfig, StateEntry,
        StateError, XChainDetails,
    };
    use ledger_state::domain::contract_data::{ExchangeContract, NominateAsset};
    use shared_types::{Balance, TxType};
    use std::collections::BTreeMap;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn funded_address(address: &str, amount: i64) -> AddressEntry {
        let mut entry = AddressEntry::established(address);
        entry.set_asset_balance("NS|Bond", Balance::from(amount));
        entry
    }

    fn exchange_contract(address: &str) -> ContractEntry {
        let mut contract = ExchangeContract::new(ContractHeader {
            address: address.to_string(),
            issuing_address: "issuer".into(),
            auto_sign: true,
            expiry: Some(5_000),
            ..Default::default()
        });
        contract
            .assets_in
            .push(NominateAsset::new("NS", "Bond", Balance::from(10)));
        contract
            .assets_out
            .push(NominateAsset::new("NS", "Cash", Balance::from(1_000)));
        contract.max_blocks = Balance::from(5);
        ContractEntry::new(0, address, ContractData::Exchange(contract))
    }

    // =============================================================================
    // BLOCK APPLICATION
    // =============================================================================

    #[test]
    fn test_mutate_and_commit_across_blocks() {
        crate::init_tracing();
        let store = InMemoryEntryStore::<AddressEntry>::new();
        store.commit(&funded_address("alice", 100)).unwrap();

        // Block 7: pay 40 out.
        let mut alice = store.require("alice").unwrap();
        let remaining = alice.asset_balance("NS|Bond") - Balance::from(40);
        alice.set_asset_balance("NS|Bond", remaining);
        alice.set_nonce(1);
        alice.set_block_update_height(7);
        store.commit(&alice).unwrap();

        // Block 8: drain the rest; the balance key disappears.
        let mut alice = store.require("alice").unwrap();
        assert_eq!(alice.asset_balance("NS|Bond"), Balance::from(60));
        alice.set_asset_balance("NS|Bond", Balance::zero());
        alice.set_block_update_height(8);
        store.commit(&alice).unwrap();

        let alice = store.require("alice").unwrap();
        assert_eq!(alice.asset_balance("NS|Bond"), Balance::zero());
        assert!(alice.class_balance().map_or(true, BTreeMap::is_empty));
        assert_eq!(alice.nonce(), 1);
        assert_eq!(alice.block_update_height(), 8);
    }

    #[test]
    fn test_root_hash_agrees_across_commit_order() {
        let left = InMemoryEntryStore::<AddressEntry>::new();
        let right = InMemoryEntryStore::<AddressEntry>::new();
        let entries: Vec<_> = (0..5)
            .map(|i| funded_address(&format!("addr{i}"), 100 + i))
            .collect();

        for entry in &entries {
            left.commit(entry).unwrap();
        }
        for entry in entries.iter().rev() {
            right.commit(entry).unwrap();
        }
        assert_eq!(left.root_hash().unwrap(), right.root_hash().unwrap());

        // A no-op reload and recommit leaves the root alone.
        let before = left.root_hash().unwrap();
        let reloaded = left.require("addr3").unwrap();
        left.commit(&reloaded).unwrap();
        assert_eq!(left.root_hash().unwrap(), before);

        assert!(right.remove("addr3").unwrap());
        assert_ne!(left.root_hash().unwrap(), right.root_hash().unwrap());
    }

    #[test]
    fn test_encumbrances_commit_after_sweep() {
        let store = InMemoryEntryStore::<AddressEncumbrances>::new();
        let mut ledger = AddressEncumbrances::new("alice");
        let hold = EncumbranceEntry::new(
            "escrow",
            25,
            vec![EncumbranceDetail::new("bob", 0, 0)],
            vec![EncumbranceDetail::new("alice", 0, 0)],
        );
        assert!(ledger.set_encumbrance_entry("NS|Bond", Some(&hold), false, false));
        ledger.set_block_update_height(3);
        store.commit(&ledger).unwrap();

        let mut ledger = store.require("alice").unwrap();
        let remaining = ledger.consume_encumbrance("NS|Bond", "escrow", &Balance::from(25));
        assert_eq!(remaining, Balance::zero());
        assert!(ledger.asset_encumbrance("NS|Bond").is_none());
        ledger.set_block_update_height(4);
        store.commit(&ledger).unwrap();

        let reloaded = store.require("alice").unwrap();
        assert!(reloaded.is_empty());
        assert_eq!(reloaded.block_update_height(), 4);
    }

    #[test]
    fn test_drained_asset_does_not_change_root() {
        let hold = EncumbranceEntry::new(
            "escrow",
            10,
            vec![EncumbranceDetail::new("bob", 0, 0)],
            vec![EncumbranceDetail::new("alice", 0, 0)],
        );
        let mut drained = AddressEncumbrances::new("alice");
        assert!(drained.set_encumbrance_entry("NS|A", Some(&hold), false, false));
        // Depleted in place, bypassing the address-level pass-through.
        drained
            .asset_encumbrance_mut("NS|A")
            .unwrap()
            .consume_encumbrance("escrow", &Balance::from(10));

        let left = InMemoryEntryStore::<AddressEncumbrances>::new();
        let right = InMemoryEntryStore::<AddressEncumbrances>::new();
        left.commit(&drained).unwrap();
        right.commit(&AddressEncumbrances::new("alice")).unwrap();

        assert!(left.require("alice").unwrap().is_empty());
        assert_eq!(left.root_hash().unwrap(), right.root_hash().unwrap());
    }

    #[test]
    fn test_module_paths_resolve() {
        let _: Option<ledger_state::encumbrance::address::AddressEncumbrances> = None;
        let _: Option<ledger_state::entries::address::AddressEntry> = None;
        fn assert_entry<E: ledger_state::entry::StateEntry>() {}
        assert_entry::<ledger_state::domain::entries::LockedAsset>();
    }

    // =============================================================================
    // ENTRY KINDS
    // =============================================================================

    #[test]
    fn test_contract_round_trip_through_store() {
        let store = InMemoryEntryStore::<ContractEntry>::new();
        let contract = exchange_contract("contract1");
        store.commit(&contract).unwrap();

        let loaded = store.require("contract1").unwrap();
        assert_eq!(loaded, contract);
        assert_eq!(loaded.function(), Some("exchange"));
        assert_eq!(loaded.data().contract_address(), Some("contract1"));
    }

    #[test]
    fn test_namespace_classes_through_store() {
        let store = InMemoryEntryStore::<NamespaceEntry>::new();
        let mut namespace = NamespaceEntry::new("NS", "owner", None);
        namespace.set_asset(NamespaceAsset::new("Bond", Some("coupon 5%".into())));
        namespace.set_asset(NamespaceAsset::new("Cash", None));
        store.commit(&namespace).unwrap();

        let mut loaded = store.require("NS").unwrap();
        assert_eq!(loaded.class_metadata("Bond"), Some("coupon 5%"));
        assert!(loaded.remove_asset("Cash"));
        loaded.set_block_update_height(9);
        store.commit(&loaded).unwrap();

        let names: Vec<_> = store.require("NS").unwrap().all_asset_names().into_iter().collect();
        assert_eq!(names, vec!["Bond".to_string()]);
    }

    #[test]
    fn test_poa_header_and_detail_entries() {
        let store = InMemoryEntryStore::<PoaEntry>::new();
        let mut header = PoaEntry::new(0, "alice");
        header.set_reference("poa1", 100, 200);
        store.commit(&header).unwrap();

        let mut detail = PoaEntry::new(1, header.full_reference("poa1"));
        detail.set_detail(PoaDetail {
            reference: "poa1".into(),
            issuer_address: "alice".into(),
            attorney_address: "bob".into(),
            start_time: 100,
            end_time: 200,
            items: vec![PoaItem::new(TxType(1), Balance::from(50), ["NS|Bond"])],
        });
        store.commit(&detail).unwrap();

        assert!(store.require("alice").unwrap().has_reference("poa1"));
        let loaded = store.require("alice|poa1").unwrap();
        assert_eq!(loaded.reference_count(), 0);
        assert_eq!(loaded.detail().unwrap().sum_amounts(), Balance::from(50));
    }

    #[test]
    fn test_sign_node_and_xchain_entries() {
        let nodes = InMemoryEntryStore::<SignNodeEntry>::new();
        let mut node = SignNodeEntry::new("02abcdef", "alice", Balance::from(10), 0);
        node.increment_balance(&Balance::from(5));
        node.decrement_balance(&Balance::from(100));
        node.increment_nonce();
        nodes.commit(&node).unwrap();
        let loaded = nodes.require("02abcdef").unwrap();
        assert_eq!(loaded.balance(), &Balance::zero());
        assert_eq!(loaded.nonce(), 1);

        let chains = InMemoryEntryStore::<XChainDetails>::new();
        let chain = XChainDetails::new(16, 0, BTreeMap::new(), 0, 1)
            .with_block_height(500)
            .with_block_height(400);
        chains.commit(&chain).unwrap();
        assert_eq!(chains.require("16").unwrap().block_height(), 500);
    }

    #[test]
    fn test_store_limits_reject_oversized_entries() {
        let config = StateConfig {
            max_collection_len: 2,
            ..Default::default()
        };
        let store = InMemoryEntryStore::<NamespaceEntry>::with_config(&config);
        let mut namespace = NamespaceEntry::new("NS", "owner", None);
        for class in ["A", "B", "C"] {
            namespace.set_asset(NamespaceAsset::new(class, None));
        }
        store.commit(&namespace).unwrap();
        assert!(matches!(store.get("NS"), Err(StateError::Codec(_))));
        assert!(matches!(
            store.require("other"),
            Err(StateError::EntryNotFound { .. })
        ));
    }
}
