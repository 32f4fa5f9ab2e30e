//! # Encumbrance Flows
//!
//! Multi-step scenarios over `AddressEncumbrances`, checking totals and
//! claim resolution after each step the way a block of transactions would
//! drive them.
//!
//! ## Scenarios
//!
//! 1. **Cumulative holds**: the same reference added in non-adjacent
//!    positions, then consumed from the front and reduced from the back
//! 2. **Interleaved references**: availability of a reference whose
//!    fragments sit between another reference's fragments
//! 3. **Expiry and persistence**: expired holds drop out of totals, and the
//!    ledger survives both encode paths unchanged

#[cfg(test)]
mod tests {
    use ledger_state::{
        AddressEncumbrances, AssetEncumbrances, EncumbranceDetail, EncumbranceEntry,
        EntryDecoder, Packable, StateEntry,
    };
    use shared_types::Balance;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const ASSET: &str = "AB|C";
    const ADDRESS: &str = "testaddress";

    fn beneficiaries() -> Vec<EncumbranceDetail> {
        vec![
            EncumbranceDetail::new("ben1", 12345, 56789),
            EncumbranceDetail::new("ben2", 23456, 67890),
        ]
    }

    fn administrators() -> Vec<EncumbranceDetail> {
        vec![
            EncumbranceDetail::new("admin1", 3425, 77135),
            EncumbranceDetail::new("admin2", 4321, 87890),
        ]
    }

    fn hold(reference: &str, amount: i64) -> EncumbranceEntry {
        EncumbranceEntry::new(reference, amount, beneficiaries(), administrators())
    }

    fn total(ledger: &AddressEncumbrances) -> Balance {
        ledger.encumbrance_total(ADDRESS, ASSET, 0)
    }

    fn asset(ledger: &mut AddressEncumbrances) -> &mut AssetEncumbrances {
        ledger
            .asset_encumbrance_mut(ASSET)
            .expect("asset collection exists")
    }

    // =============================================================================
    // SCENARIO 1: CUMULATIVE HOLDS
    // =============================================================================

    #[test]
    fn test_consume_and_reduce_track_totals() {
        crate::init_tracing();
        let mut ledger = AddressEncumbrances::new(ADDRESS);

        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 1)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("dross", 1)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 99)), true, false));
        assert_eq!(total(&ledger), Balance::from(101));
        // The second fragment sorts after "dross", so it is not merged.
        assert_eq!(asset(&mut ledger).len(), 3);

        asset(&mut ledger).consume_encumbrance("thisReference", &Balance::from(10));
        assert_eq!(total(&ledger), Balance::from(91));
        assert_eq!(asset(&mut ledger).len(), 2);

        asset(&mut ledger).reduce_encumbrance("thisReference", &Balance::from(10));
        assert_eq!(total(&ledger), Balance::from(81));

        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 100)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference2", 100)), true, false));
        assert_eq!(total(&ledger), Balance::from(281));

        asset(&mut ledger).reduce_encumbrance("thisReference", &Balance::from(10));
        assert_eq!(total(&ledger), Balance::from(271));

        let asset = ledger.asset_encumbrance(ASSET).unwrap();
        assert_eq!(
            asset.encumbrance_amount_by_reference("thisReference"),
            Balance::from(170)
        );
        assert_eq!(asset.encumbrance_total(), &Balance::from(271));
        let priorities: Vec<_> = asset.iter().map(|e| e.priority()).collect();
        assert_eq!(priorities, vec![Some(0), Some(10), Some(20)]);
    }

    #[test]
    fn test_non_cumulative_duplicate_is_ignored() {
        let mut ledger = AddressEncumbrances::new(ADDRESS);

        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 1)), false, true));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("dross", 1)), false, true));
        assert!(!ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 99)), false, true));

        assert_eq!(total(&ledger), Balance::from(2));
        // The later high-priority hold is placed ahead of the earlier one.
        let order: Vec<_> = ledger
            .asset_encumbrance(ASSET)
            .unwrap()
            .iter()
            .map(|e| e.reference().to_string())
            .collect();
        assert_eq!(order, vec!["dross", "thisReference"]);
    }

    #[test]
    fn test_rejected_first_hold_creates_nothing() {
        let mut ledger = AddressEncumbrances::new(ADDRESS);
        assert!(!ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", -1)), false, false));
        assert!(!ledger.set_encumbrance_entry(ASSET, None, false, false));
        assert!(ledger.asset_encumbrance(ASSET).is_none());
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_incompatible_parties_block_accumulation() {
        let mut ledger = AddressEncumbrances::new(ADDRESS);
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("ref", 50)), true, false));

        let other_admins = EncumbranceEntry::new(
            "ref",
            50,
            beneficiaries(),
            vec![EncumbranceDetail::new("admin9", 0, 0)],
        );
        assert!(!ledger.set_encumbrance_entry(ASSET, Some(&other_admins), true, false));

        // Detail order does not matter.
        let mut reordered = beneficiaries();
        reordered.reverse();
        let same_parties = EncumbranceEntry::new("REF", 25, reordered, administrators());
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&same_parties), true, false));
        assert_eq!(total(&ledger), Balance::from(75));
    }

    // =============================================================================
    // SCENARIO 2: INTERLEAVED REFERENCES
    // =============================================================================

    fn interleaved() -> AddressEncumbrances {
        let mut ledger = AddressEncumbrances::new(ADDRESS);
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 100)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("reference2", 100)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("thisReference", 100)), true, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&hold("reference2", 100)), true, false));
        ledger
    }

    #[test]
    fn test_interleaved_fragments_stay_separate() {
        let ledger = interleaved();
        let asset = ledger.asset_encumbrance(ASSET).unwrap();
        let layout: Vec<_> = asset
            .iter()
            .map(|e| (e.reference().to_string(), e.amount().clone()))
            .collect();
        assert_eq!(
            layout,
            vec![
                ("thisReference".to_string(), Balance::from(100)),
                ("reference2".to_string(), Balance::from(100)),
                ("thisReference".to_string(), Balance::from(100)),
                ("reference2".to_string(), Balance::from(100)),
            ]
        );

        let aggregate = ledger.aggregate_by_reference(ASSET, "reference2").unwrap();
        assert_eq!(aggregate.amount(), &Balance::from(200));
        assert_eq!(aggregate.priority(), Some(10));
        assert!(ledger.aggregate_by_reference("AB|Missing", "reference2").is_none());
    }

    #[test]
    fn test_availability_follows_priority_order() {
        let ledger = interleaved();
        let asset = ledger.asset_encumbrance(ASSET).unwrap();
        let available = |balance: i64| {
            asset.available_to_encumbrance(&Balance::from(balance), "reference2", 0)
        };

        assert_eq!(available(0), Balance::from(0));
        assert_eq!(available(100), Balance::from(0));
        assert_eq!(available(200), Balance::from(100));
        assert_eq!(available(250), Balance::from(100));
        assert_eq!(available(300), Balance::from(100));
        assert_eq!(available(350), Balance::from(150));
        assert_eq!(available(500), Balance::from(200));
        assert_eq!(
            asset.available_to_encumbrance(&Balance::from(500), "nobody", 0),
            Balance::from(0)
        );
    }

    #[test]
    fn test_aggregate_available_by_reference() {
        let ledger = interleaved();
        let available = |holding: i64| {
            ledger
                .aggregate_available_by_reference(ASSET, "reference2", &Balance::from(holding))
                .map(|e| e.amount().clone())
        };

        assert!(ledger
            .aggregate_available_by_reference(ASSET, "xxx", &Balance::from(0))
            .is_none());
        assert_eq!(available(0), Some(Balance::from(0)));
        assert_eq!(available(250), Some(Balance::from(100)));
        assert_eq!(available(300), Some(Balance::from(100)));
        assert_eq!(available(350), Some(Balance::from(150)));
    }

    #[test]
    fn test_consumed_reference_frees_balance_for_others() {
        let mut ledger = interleaved();
        asset(&mut ledger).consume_encumbrance("thisReference", &Balance::from(200));

        let asset = ledger.asset_encumbrance(ASSET).unwrap();
        assert_eq!(asset.len(), 2);
        assert_eq!(
            asset.available_to_encumbrance(&Balance::from(150), "reference2", 0),
            Balance::from(150)
        );
    }

    // =============================================================================
    // SCENARIO 3: EXPIRY AND PERSISTENCE
    // =============================================================================

    #[test]
    fn test_expired_holds_leave_the_total() {
        let mut ledger = AddressEncumbrances::new(ADDRESS);
        let short = EncumbranceEntry::new(
            "short",
            40,
            vec![],
            vec![EncumbranceDetail::new("admin", 0, 1_000)],
        );
        let open = EncumbranceEntry::new(
            "open",
            60,
            vec![],
            vec![EncumbranceDetail::new("admin", 0, 0)],
        );
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&short), false, false));
        assert!(ledger.set_encumbrance_entry(ASSET, Some(&open), false, false));

        assert_eq!(ledger.encumbrance_total(ADDRESS, ASSET, 1_000), Balance::from(100));
        assert_eq!(ledger.encumbrance_total(ADDRESS, ASSET, 1_001), Balance::from(60));
        assert_eq!(ledger.encumbrance_total("someoneelse", ASSET, 0), Balance::from(0));
        assert_eq!(
            ledger.encumbrance_total_for_class("TESTADDRESS", "AB", "C", 0),
            Balance::from(100)
        );

        // An expired hold no longer claims any of the balance.
        let asset = ledger.asset_encumbrance(ASSET).unwrap();
        assert_eq!(
            asset.available_to_encumbrance(&Balance::from(60), "open", 2_000),
            Balance::from(60)
        );
    }

    #[test]
    fn test_fully_consumed_asset_is_swept_before_commit() {
        let mut ledger = interleaved();
        assert!(ledger.set_encumbrance_entry("AB|D", Some(&hold("keep", 5)), false, false));

        asset(&mut ledger).consume_encumbrance("thisReference", &Balance::from(200));
        asset(&mut ledger).consume_encumbrance("reference2", &Balance::from(-200));
        assert!(asset(&mut ledger).is_empty());
        let unswept = ledger.to_packed_bytes().unwrap();

        assert_eq!(ledger.remove_empty_assets(), 1);
        assert_eq!(ledger.to_packed_bytes().unwrap(), unswept);
        assert!(ledger.asset_encumbrance(ASSET).is_none());
        assert!(ledger.asset_encumbrance("AB|D").is_some());
    }

    #[test]
    fn test_ledger_survives_both_encodings() {
        let mut ledger = interleaved();
        ledger.set_block_update_height(42);
        ledger.set_block_update_height(7);
        assert_eq!(ledger.block_update_height(), 42);

        let bytes = ledger.to_packed_bytes().unwrap();
        let unpacked = AddressEncumbrances::from_packed_bytes(&bytes).unwrap();
        assert_eq!(unpacked, ledger);
        assert_eq!(unpacked.to_packed_bytes().unwrap(), bytes);

        let decoded = AddressEncumbrances::decode(&ledger.encode(3)).unwrap();
        assert_eq!(decoded, ledger);
        assert_eq!(decoded.block_update_height(), 42);

        let mut copy = ledger.copy();
        copy.asset_encumbrance_mut(ASSET)
            .unwrap()
            .consume_encumbrance("reference2", &Balance::from(1));
        assert_eq!(total(&ledger), Balance::from(400));
        assert_eq!(total(&copy), Balance::from(399));
    }
}
