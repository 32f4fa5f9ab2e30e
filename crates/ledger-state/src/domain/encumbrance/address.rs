use super::asset::AssetEncumbrances;
use super::entry::EncumbranceEntry;
use crate::domain::entries::unset_height;
use crate::domain::{EncumbranceError, StateConfig};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{map_value, read_version, value_str, LegacyArray, Packer, Unpacker};
use shared_types::{
    eq_ignore_case, full_asset_id, Balance, BlockHeight, CodecError, Timestamp, Value, UNSET_HEIGHT,
};
use std::collections::BTreeMap;
use tracing::{debug, error};

const ENTRY: &str = "AddressEncumbrances";
const VERSION: u8 = 1;

/// Every encumbrance held against one address, keyed by full asset id.
///
/// This is the unit persisted in state. Empty per-asset collections are
/// never written: the depleting pass-throughs drop them, and both encodings
/// skip any left behind by direct mutation through
/// [`asset_encumbrance_mut`](Self::asset_encumbrance_mut).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEncumbrances {
    address: String,
    encumbrances: BTreeMap<String, AssetEncumbrances>,
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl AddressEncumbrances {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            encumbrances: BTreeMap::new(),
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    pub fn encumbrance_list(&self) -> &BTreeMap<String, AssetEncumbrances> {
        &self.encumbrances
    }

    pub fn is_empty(&self) -> bool {
        self.encumbrances.is_empty()
    }

    pub fn asset_encumbrance(&self, asset_id: &str) -> Option<&AssetEncumbrances> {
        self.encumbrances.get(asset_id)
    }

    pub fn asset_encumbrance_mut(&mut self, asset_id: &str) -> Option<&mut AssetEncumbrances> {
        self.encumbrances.get_mut(asset_id)
    }

    pub fn asset_encumbrance_for_class(
        &self,
        namespace: &str,
        class_id: &str,
    ) -> Option<&AssetEncumbrances> {
        self.asset_encumbrance(&full_asset_id(namespace, class_id))
    }

    /// Store `asset` under `asset_id`. A collection whose total is negative
    /// is refused.
    pub fn set_asset_encumbrance(&mut self, asset_id: &str, asset: AssetEncumbrances) -> bool {
        if asset.total_amount_at(0).is_negative() {
            return false;
        }
        self.encumbrances.insert(asset_id.to_string(), asset);
        true
    }

    /// Remove the collection for `asset_id`, returning whether one existed.
    pub fn remove_asset_encumbrance(&mut self, asset_id: &str) -> bool {
        self.encumbrances.remove(asset_id).is_some()
    }

    pub fn remove_asset_encumbrance_for_class(&mut self, namespace: &str, class_id: &str) -> bool {
        self.remove_asset_encumbrance(&full_asset_id(namespace, class_id))
    }

    /// Drop every per-asset collection with no fragments left.
    pub fn remove_empty_assets(&mut self) -> usize {
        let before = self.encumbrances.len();
        self.encumbrances.retain(|_, asset| !asset.is_empty());
        before - self.encumbrances.len()
    }

    /// Consume `amount` of `reference` on `asset_id`, highest priority first.
    /// Returns the asset's new total; the collection is dropped once empty.
    pub fn consume_encumbrance(
        &mut self,
        asset_id: &str,
        reference: &str,
        amount: &Balance,
    ) -> Balance {
        self.deplete_asset(asset_id, |asset| asset.consume_encumbrance(reference, amount))
    }

    /// Release `amount` of `reference` on `asset_id`, lowest priority first.
    pub fn reduce_encumbrance(
        &mut self,
        asset_id: &str,
        reference: &str,
        amount: &Balance,
    ) -> Balance {
        self.deplete_asset(asset_id, |asset| asset.reduce_encumbrance(reference, amount))
    }

    /// Remove every fragment of `reference` on `asset_id`.
    pub fn remove_encumbrance(&mut self, asset_id: &str, reference: &str) -> Vec<EncumbranceEntry> {
        let Some(asset) = self.encumbrances.get_mut(asset_id) else {
            return Vec::new();
        };
        let removed = asset.remove_encumbrance(reference);
        if asset.is_empty() {
            self.encumbrances.remove(asset_id);
        }
        removed
    }

    fn deplete_asset(
        &mut self,
        asset_id: &str,
        deplete: impl FnOnce(&mut AssetEncumbrances) -> Balance,
    ) -> Balance {
        let Some(asset) = self.encumbrances.get_mut(asset_id) else {
            return Balance::zero();
        };
        let total = deplete(asset);
        if asset.is_empty() {
            debug!(address = %self.address, asset_id, "Dropping depleted asset encumbrances");
            self.encumbrances.remove(asset_id);
        }
        total
    }

    /// Collections that are written by either encoding.
    fn persisted_assets(&self) -> impl Iterator<Item = (&String, &AssetEncumbrances)> {
        self.encumbrances.iter().filter(|(_, asset)| !asset.is_empty())
    }

    pub fn encumbrance_amount_by_reference(&self, asset_id: &str, reference: &str) -> Balance {
        self.asset_encumbrance(asset_id)
            .map(|asset| asset.encumbrance_amount_by_reference(reference))
            .unwrap_or_default()
    }

    pub fn encumbrance_amount_by_reference_for_class(
        &self,
        namespace: &str,
        class_id: &str,
        reference: &str,
    ) -> Balance {
        self.encumbrance_amount_by_reference(&full_asset_id(namespace, class_id), reference)
    }

    /// All fragments of `reference` for `asset_id`; empty if the asset has
    /// no encumbrances.
    pub fn encumbrance_by_reference(&self, asset_id: &str, reference: &str) -> Vec<&EncumbranceEntry> {
        self.asset_encumbrance(asset_id)
            .map(|asset| asset.by_reference(reference))
            .unwrap_or_default()
    }

    pub fn encumbrance_by_reference_for_class(
        &self,
        namespace: &str,
        class_id: &str,
        reference: &str,
    ) -> Vec<&EncumbranceEntry> {
        self.encumbrance_by_reference(&full_asset_id(namespace, class_id), reference)
    }

    pub fn any_encumbrance_by_reference(
        &self,
        asset_id: &str,
        reference: &str,
    ) -> Option<&EncumbranceEntry> {
        self.asset_encumbrance(asset_id)?.any_by_reference(reference)
    }

    pub fn aggregate_by_reference(&self, asset_id: &str, reference: &str) -> Option<EncumbranceEntry> {
        self.asset_encumbrance(asset_id)?
            .aggregate_by_reference(reference)
    }

    pub fn aggregate_available_by_reference(
        &self,
        asset_id: &str,
        reference: &str,
        holding: &Balance,
    ) -> Option<EncumbranceEntry> {
        self.asset_encumbrance(asset_id)?
            .aggregate_available_by_reference(reference, holding)
    }

    /// Non-expired encumbrance total for `asset_id`. Zero when `address` is
    /// not this entry's address.
    pub fn encumbrance_total(&self, address: &str, asset_id: &str, time_now: Timestamp) -> Balance {
        if !eq_ignore_case(&self.address, address) {
            return Balance::zero();
        }
        self.asset_encumbrance(asset_id)
            .map(|asset| asset.total_amount_at(time_now))
            .unwrap_or_default()
    }

    pub fn encumbrance_total_for_class(
        &self,
        address: &str,
        namespace: &str,
        class_id: &str,
        time_now: Timestamp,
    ) -> Balance {
        self.encumbrance_total(address, &full_asset_id(namespace, class_id), time_now)
    }

    /// Add `entry` to the collection for `asset_id` under default limits.
    ///
    /// See [`set_encumbrance_entry_with_config`](Self::set_encumbrance_entry_with_config).
    pub fn set_encumbrance_entry(
        &mut self,
        asset_id: &str,
        entry: Option<&EncumbranceEntry>,
        cumulative: bool,
        high_priority: bool,
    ) -> bool {
        self.set_encumbrance_entry_with_config(
            &StateConfig::default(),
            asset_id,
            entry,
            cumulative,
            high_priority,
        )
    }

    /// Add `entry` to the collection for `asset_id`, creating the collection
    /// only for a valid entry.
    ///
    /// Never fails loudly: a rejected or failed mutation returns `false` and
    /// leaves this value unchanged.
    pub fn set_encumbrance_entry_with_config(
        &mut self,
        config: &StateConfig,
        asset_id: &str,
        entry: Option<&EncumbranceEntry>,
        cumulative: bool,
        high_priority: bool,
    ) -> bool {
        match self.try_set_encumbrance_entry(config, asset_id, entry, cumulative, high_priority) {
            Ok(true) => true,
            Ok(false) => {
                debug!(
                    address = %self.address,
                    asset_id,
                    reference = ?entry.map(|e| e.reference()),
                    "Encumbrance rejected"
                );
                false
            }
            Err(e) => {
                error!(error = %e, address = %self.address, asset_id, "Error in set_encumbrance_entry");
                false
            }
        }
    }

    fn try_set_encumbrance_entry(
        &mut self,
        config: &StateConfig,
        asset_id: &str,
        entry: Option<&EncumbranceEntry>,
        cumulative: bool,
        high_priority: bool,
    ) -> Result<bool, EncumbranceError> {
        let mut working = match self.encumbrances.get(asset_id) {
            Some(existing) => existing.clone(),
            None => match entry {
                Some(e) if e.amount().is_positive() => AssetEncumbrances::new(),
                _ => return Ok(false),
            },
        };
        let Some(entry) = entry else {
            return Ok(false);
        };

        if !working.add_encumbrance(entry, cumulative, high_priority) {
            return Ok(false);
        }

        // Merges into an existing fragment do not count against the cap.
        if working.len() > config.max_encumbrances_per_asset {
            return Err(EncumbranceError::TooManyEntries {
                asset_id: asset_id.to_string(),
                count: working.len(),
                max: config.max_encumbrances_per_asset,
            });
        }

        if working.encumbrance_total().is_negative() {
            return Err(EncumbranceError::NegativeTotal {
                asset_id: asset_id.to_string(),
            });
        }

        self.encumbrances.insert(asset_id.to_string(), working);
        Ok(true)
    }
}

impl StateEntry for AddressEncumbrances {
    fn key(&self) -> String {
        self.address.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[index, address, [{asset_id: asset}, nil]]`, plus the update height
    /// once it has been set.
    fn encode(&self, index: i64) -> Value {
        let assets = map_value(
            self.persisted_assets()
                .map(|(id, asset)| (id.clone(), asset.to_value())),
        );
        let mut items = vec![
            Value::from(index.max(0)),
            Value::from(self.address.as_str()),
            Value::Array(vec![assets, Value::Nil]),
        ];
        if self.update_height >= 0 {
            items.push(Value::from(self.update_height));
        }
        Value::Array(items)
    }
}

impl EntryDecoder for AddressEncumbrances {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let mut entry = AddressEncumbrances::new(array.string(1)?);

        let data = array.array(2)?;
        if let Some(pairs) = data.opt_map(0)? {
            for (key, asset) in pairs {
                let asset_id = value_str(key)?;
                let asset = AssetEncumbrances::from_legacy(&LegacyArray::new(asset, ENTRY)?)?;
                entry.encumbrances.insert(asset_id.to_string(), asset);
            }
        }

        if let Some(height) = array.opt_i64(3)? {
            entry.update_height = height;
        }
        Ok(entry)
    }
}

impl Packable for AddressEncumbrances {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.address)?;
        packer.pack_map_len(self.persisted_assets().count())?;
        for (asset_id, asset) in self.persisted_assets() {
            packer.pack_str(asset_id)?;
            asset.pack(packer)?;
        }
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = read_version(unpacker, ENTRY, 0..=1)?;
        let mut entry = AddressEncumbrances::new(unpacker.unpack_string()?);
        let len = unpacker.unpack_map_len()?;
        for _ in 0..len {
            let asset_id = unpacker.unpack_string()?;
            let asset = AssetEncumbrances::unpack(unpacker)?;
            entry.encumbrances.insert(asset_id, asset);
        }
        if version >= 1 {
            entry.update_height = unpacker.unpack_i64()?;
        }
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::encumbrance::EncumbranceDetail;

    const ASSET: &str = "NS1|Class1";

    fn entry(reference: &str, amount: i64) -> EncumbranceEntry {
        EncumbranceEntry::new(
            reference,
            amount,
            vec![EncumbranceDetail::new("ben1", 0, 0)],
            vec![EncumbranceDetail::new("admin1", 0, 0)],
        )
    }

    fn populated() -> AddressEncumbrances {
        let mut enc = AddressEncumbrances::new("Address1");
        assert!(enc.set_encumbrance_entry(ASSET, Some(&entry("ref1", 100)), false, false));
        assert!(enc.set_encumbrance_entry(ASSET, Some(&entry("ref2", 1)), false, false));
        assert!(enc.set_encumbrance_entry("NS2|Other", Some(&entry("ref1", 7)), false, false));
        enc
    }

    #[test]
    fn test_set_entry_creates_collection_only_when_valid() {
        let mut enc = AddressEncumbrances::new("Address1");
        assert!(!enc.set_encumbrance_entry(ASSET, None, false, false));
        assert!(!enc.set_encumbrance_entry(ASSET, Some(&entry("r", 0)), false, false));
        assert!(enc.is_empty());

        assert!(!enc.set_encumbrance_entry(ASSET, Some(&entry("", 5)), false, false));
        assert!(enc.is_empty());

        assert!(enc.set_encumbrance_entry(ASSET, Some(&entry("r", 5)), false, false));
        assert_eq!(enc.encumbrance_amount_by_reference(ASSET, "R"), Balance::from(5));
    }

    #[test]
    fn test_rejected_mutation_leaves_value_unchanged() {
        let mut enc = populated();
        let before = enc.clone();
        assert!(!enc.set_encumbrance_entry(ASSET, Some(&entry("ref1", 5)), false, false));
        assert_eq!(enc, before);
    }

    #[test]
    fn test_limit_reported_as_failure() {
        let config = StateConfig {
            max_encumbrances_per_asset: 2,
            ..StateConfig::default()
        };
        let mut enc = populated();
        let before = enc.clone();
        assert!(!enc.set_encumbrance_entry_with_config(
            &config,
            ASSET,
            Some(&entry("ref3", 1)),
            false,
            false
        ));
        assert_eq!(enc, before);
    }

    #[test]
    fn test_negative_total_collection_refused() {
        let mut enc = AddressEncumbrances::new("Address1");
        let negative = AssetEncumbrances::from_entries(vec![entry("r", -10)]);
        assert!(!enc.set_asset_encumbrance(ASSET, negative));
        assert!(enc.asset_encumbrance(ASSET).is_none());

        assert!(enc.set_asset_encumbrance(ASSET, AssetEncumbrances::new()));
        assert_eq!(enc.remove_empty_assets(), 1);
    }

    #[test]
    fn test_queries_default_for_missing_asset() {
        let enc = populated();
        assert_eq!(enc.encumbrance_amount_by_reference("X|Y", "ref1"), Balance::zero());
        assert!(enc.encumbrance_by_reference("X|Y", "ref1").is_empty());
        assert!(enc.aggregate_by_reference("X|Y", "ref1").is_none());
        assert!(enc.any_encumbrance_by_reference("X|Y", "ref1").is_none());
        assert!(enc
            .aggregate_available_by_reference("X|Y", "ref1", &Balance::from(10))
            .is_none());
    }

    #[test]
    fn test_encumbrance_total_checks_address() {
        let enc = populated();
        assert_eq!(enc.encumbrance_total("address1", ASSET, 0), Balance::from(101));
        assert_eq!(
            enc.encumbrance_total_for_class("ADDRESS1", "NS1", "Class1", 0),
            Balance::from(101)
        );
        assert_eq!(enc.encumbrance_total("Address2", ASSET, 0), Balance::zero());
        assert_eq!(enc.encumbrance_total("Address1", "X|Y", 0), Balance::zero());
    }

    #[test]
    fn test_class_helpers_use_composite_key() {
        let mut enc = populated();
        assert!(enc.asset_encumbrance_for_class("NS1", "Class1").is_some());
        assert_eq!(
            enc.encumbrance_by_reference_for_class("NS1", "Class1", "ref2").len(),
            1
        );
        assert_eq!(
            enc.encumbrance_amount_by_reference_for_class("NS2", "Other", "ref1"),
            Balance::from(7)
        );
        assert!(enc.remove_asset_encumbrance_for_class("NS2", "Other"));
        assert!(!enc.remove_asset_encumbrance("NS2|Other"));
    }

    #[test]
    fn test_update_height_is_monotonic() {
        let mut enc = populated();
        assert_eq!(enc.block_update_height(), -1);
        enc.set_block_update_height(10);
        enc.set_block_update_height(5);
        assert_eq!(enc.block_update_height(), 10);
    }

    #[test]
    fn test_legacy_height_slot_only_when_set() {
        let mut enc = populated();
        let Value::Array(items) = enc.encode(-3) else {
            panic!("address encumbrances must encode as an array");
        };
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Value::from(0));

        enc.set_block_update_height(12);
        let v = enc.encode(4);
        let decoded = AddressEncumbrances::decode(&v).unwrap();
        assert_eq!(decoded, enc);
        assert_eq!(decoded.block_update_height(), 12);
    }

    #[test]
    fn test_packed_round_trip_and_version() {
        let mut enc = populated();
        enc.set_block_update_height(3);
        let bytes = enc.to_packed_bytes().unwrap();
        assert_eq!(bytes[0], VERSION);
        assert_eq!(AddressEncumbrances::from_packed_bytes(&bytes).unwrap(), enc);
    }

    #[test]
    fn test_version_zero_has_no_height() {
        let enc = populated();
        let mut p = Packer::new();
        p.pack_version(0).unwrap();
        p.pack_str(enc.address()).unwrap();
        p.pack_map_len(enc.encumbrance_list().len()).unwrap();
        for (id, asset) in enc.encumbrance_list() {
            p.pack_str(id).unwrap();
            asset.pack(&mut p).unwrap();
        }
        let decoded = AddressEncumbrances::from_packed_bytes(p.as_bytes()).unwrap();
        assert_eq!(decoded, enc);
        assert_eq!(decoded.block_update_height(), UNSET_HEIGHT);
    }

    #[test]
    fn test_unknown_version_fails() {
        let mut p = Packer::new();
        p.pack_version(2).unwrap();
        p.pack_str("Address1").unwrap();
        assert_eq!(
            AddressEncumbrances::from_packed_bytes(p.as_bytes()),
            Err(CodecError::UnrecognisedVersion {
                entry: ENTRY,
                version: 2
            })
        );
    }

    #[test]
    fn test_cumulative_merge_allowed_at_cap() {
        let config = StateConfig {
            max_encumbrances_per_asset: 1,
            ..StateConfig::default()
        };
        let mut enc = AddressEncumbrances::new("Address1");
        let mut add = |reference: &str, amount: i64, cumulative: bool| {
            enc.set_encumbrance_entry_with_config(
                &config,
                ASSET,
                Some(&entry(reference, amount)),
                cumulative,
                false,
            )
        };
        assert!(add("r", 10, false));
        assert!(add("r", 5, true));
        assert!(!add("s", 5, false));
        assert_eq!(enc.encumbrance_amount_by_reference(ASSET, "r"), Balance::from(15));
        assert_eq!(enc.asset_encumbrance(ASSET).unwrap().len(), 1);
    }

    #[test]
    fn test_depleting_pass_throughs_drop_empty_asset() {
        let mut enc = populated();
        assert_eq!(enc.consume_encumbrance("NS2|Other", "ref1", &Balance::from(7)), Balance::zero());
        assert!(enc.asset_encumbrance("NS2|Other").is_none());

        assert_eq!(enc.reduce_encumbrance(ASSET, "ref1", &Balance::from(40)), Balance::from(61));
        assert_eq!(enc.remove_encumbrance(ASSET, "ref2").len(), 1);
        assert!(enc.asset_encumbrance(ASSET).is_some());
        assert_eq!(enc.remove_encumbrance(ASSET, "ref1").len(), 1);
        assert!(enc.is_empty());

        assert_eq!(enc.consume_encumbrance("X|Y", "ref1", &Balance::from(1)), Balance::zero());
        assert!(enc.remove_encumbrance("X|Y", "ref1").is_empty());
    }

    #[test]
    fn test_empty_collections_never_encoded() {
        let fresh = AddressEncumbrances::new("Address1");
        let mut drained = AddressEncumbrances::new("Address1");
        assert!(drained.set_encumbrance_entry(ASSET, Some(&entry("r", 10)), false, false));
        drained
            .asset_encumbrance_mut(ASSET)
            .unwrap()
            .consume_encumbrance("r", &Balance::from(10));
        assert!(drained.asset_encumbrance(ASSET).is_some());

        assert_eq!(drained.to_packed_bytes().unwrap(), fresh.to_packed_bytes().unwrap());
        assert_eq!(drained.encode(0), fresh.encode(0));
        assert_eq!(
            AddressEncumbrances::from_packed_bytes(&drained.to_packed_bytes().unwrap()).unwrap(),
            fresh
        );
    }

    #[test]
    fn test_copy_is_independent() {
        let original = populated();
        let mut copy = original.copy();
        copy.asset_encumbrance_mut(ASSET)
            .unwrap()
            .consume_encumbrance("ref1", &Balance::from(10));
        assert_eq!(original.encumbrance_amount_by_reference(ASSET, "ref1"), Balance::from(100));
        assert_eq!(copy.encumbrance_amount_by_reference(ASSET, "ref1"), Balance::from(90));
    }
}
