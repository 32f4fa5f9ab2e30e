//! # Asset Encumbrances
//!
//! The ordered set of encumbrance fragments held against one asset of one
//! address, and the priority engine that keeps it canonical.
//!
//! ## Invariants
//!
//! - After every structural change the fragments are sorted by
//!   [`EncumbranceEntry::cmp_high_to_low`] and carry priorities 0, 10, 20...
//! - `total_amount` equals the sum of all fragment amounts, and no fragment
//!   with a zero amount is kept.
//! - Consolidation only merges a fragment into its immediately preceding
//!   neighbour in sort order. Same-reference fragments separated by another
//!   reference stay separate.

use super::entry::{EncumbranceEntry, HIGH_PRIORITY};
use shared_types::codec::{LegacyArray, Packer, Unpacker};
use shared_types::{Balance, CodecError, Timestamp, Value};
use std::cmp::Ordering;

/// Encumbrance fragments for one (address, asset) pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(from = "Vec<EncumbranceEntry>", into = "Vec<EncumbranceEntry>")]
pub struct AssetEncumbrances {
    encumbrances: Vec<EncumbranceEntry>,
    total_amount: Balance,
    expiry_date: Timestamp,
}

impl From<Vec<EncumbranceEntry>> for AssetEncumbrances {
    fn from(entries: Vec<EncumbranceEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<AssetEncumbrances> for Vec<EncumbranceEntry> {
    fn from(asset: AssetEncumbrances) -> Self {
        asset.encumbrances
    }
}

impl AssetEncumbrances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing fragments as-is, recomputing the total.
    ///
    /// No reordering or consolidation happens here; the fragments are taken
    /// in the order given.
    pub fn from_entries(entries: Vec<EncumbranceEntry>) -> Self {
        let mut asset = Self {
            encumbrances: entries,
            total_amount: Balance::zero(),
            expiry_date: 0,
        };
        asset.recalculate_total();
        asset
    }

    pub fn entries(&self) -> &[EncumbranceEntry] {
        &self.encumbrances
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EncumbranceEntry> {
        self.encumbrances.iter()
    }

    pub fn len(&self) -> usize {
        self.encumbrances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encumbrances.is_empty()
    }

    /// Cached total of all fragments.
    pub fn encumbrance_total(&self) -> &Balance {
        &self.total_amount
    }

    /// Latest expiry date over all fragments.
    pub fn expiry_date(&self) -> Timestamp {
        self.expiry_date
    }

    /// Add a fragment.
    ///
    /// Rejected (returns `false`, nothing changes) when the amount is not
    /// positive, the reference is empty, or the reference is already in use
    /// and the add is either not cumulative or not compatible with the
    /// existing fragment.
    pub fn add_encumbrance(
        &mut self,
        new_entry: &EncumbranceEntry,
        cumulative: bool,
        high_priority: bool,
    ) -> bool {
        if !new_entry.amount().is_positive() || new_entry.reference().is_empty() {
            return false;
        }

        if let Some(existing) = self.any_by_reference(new_entry.reference()) {
            if !cumulative || !existing.can_accumulate(Some(new_entry)) {
                return false;
            }
        }

        let mut entry = new_entry.clone();
        if high_priority {
            entry.set_priority(Some(HIGH_PRIORITY));
        }

        self.encumbrances.push(entry);
        self.recalculate_priorities();
        true
    }

    /// Sort, renumber in steps of 10 and fold each fragment into its
    /// predecessor when both share a reference.
    fn recalculate_priorities(&mut self) {
        let mut sorted = std::mem::take(&mut self.encumbrances);
        sorted.sort_by(EncumbranceEntry::cmp_high_to_low);

        let mut kept: Vec<EncumbranceEntry> = Vec::with_capacity(sorted.len());
        let mut priority = 0i32;
        for mut entry in sorted {
            match kept.last_mut() {
                Some(last) if last.matches(entry.reference()) => {
                    last.add_amount(entry.amount());
                }
                _ => {
                    entry.set_priority(Some(priority));
                    priority = priority.saturating_add(10);
                    kept.push(entry);
                }
            }
        }

        self.encumbrances = kept;
        self.recalculate_total();
    }

    /// Drop zero fragments and recompute the cached total and expiry date.
    pub fn recalculate_total(&mut self) -> Balance {
        self.encumbrances.retain(|e| !e.amount().is_zero());
        self.total_amount = self.encumbrances.iter().map(|e| e.amount()).sum();
        self.expiry_date = self
            .encumbrances
            .iter()
            .map(|e| e.expiry_date())
            .max()
            .unwrap_or(0);
        self.total_amount.clone()
    }

    /// Sum of the fragments that have not expired at `time_now`.
    pub fn total_amount_at(&self, time_now: Timestamp) -> Balance {
        self.encumbrances
            .iter()
            .filter(|e| !e.has_expired(time_now))
            .map(|e| e.amount())
            .sum()
    }

    /// Portion of `account_balance` that `reference` can actually claim.
    ///
    /// Walks the fragments in priority order, letting each non-expired
    /// fragment take what is left of the balance. Only the fragments of
    /// `reference` count towards the answer.
    pub fn available_to_encumbrance(
        &self,
        account_balance: &Balance,
        reference: &str,
        time_now: Timestamp,
    ) -> Balance {
        if account_balance.is_negative() {
            return Balance::zero();
        }

        let mut available = Balance::zero();
        let mut remaining = account_balance.clone();

        for entry in self.encumbrances.iter().filter(|e| !e.has_expired(time_now)) {
            if !remaining.is_positive() {
                break;
            }
            if entry.matches(reference) {
                available += std::cmp::min(&remaining, entry.amount());
            }
            remaining -= entry.amount();
        }

        available
    }

    /// Like [`available_to_encumbrance`](Self::available_to_encumbrance) but
    /// returns a synthetic fragment carrying the metadata of the first match.
    ///
    /// `None` when no fragment has this reference. Expiry is not considered.
    pub fn aggregate_available_by_reference(
        &self,
        reference: &str,
        holding: &Balance,
    ) -> Option<EncumbranceEntry> {
        let mut remaining = holding.clamp_non_negative();
        let mut result: Option<EncumbranceEntry> = None;

        for entry in &self.encumbrances {
            if entry.matches(reference) {
                match result.as_mut() {
                    None => {
                        let mut first = entry.clone();
                        let floor = remaining.clamp_non_negative();
                        first.set_amount(std::cmp::min(entry.amount(), &floor).clone());
                        result = Some(first);
                    }
                    Some(aggregate) => {
                        let share = std::cmp::min(entry.amount(), &remaining).clone();
                        aggregate.add_amount(&share);
                    }
                }
            }

            remaining -= entry.amount();

            if result.is_some() && !remaining.is_positive() {
                break;
            }
        }

        result
    }

    /// Nominal total of `reference`, ignoring balance and expiry.
    pub fn aggregate_by_reference(&self, reference: &str) -> Option<EncumbranceEntry> {
        let mut result: Option<EncumbranceEntry> = None;
        for entry in self.encumbrances.iter().filter(|e| e.matches(reference)) {
            match result.as_mut() {
                None => result = Some(entry.clone()),
                Some(aggregate) => aggregate.add_amount(entry.amount()),
            }
        }
        result
    }

    pub fn any_by_reference(&self, reference: &str) -> Option<&EncumbranceEntry> {
        self.encumbrances.iter().find(|e| e.matches(reference))
    }

    pub fn by_reference(&self, reference: &str) -> Vec<&EncumbranceEntry> {
        self.encumbrances
            .iter()
            .filter(|e| e.matches(reference))
            .collect()
    }

    pub fn encumbrance_amount_by_reference(&self, reference: &str) -> Balance {
        self.by_reference(reference)
            .into_iter()
            .map(|e| e.amount())
            .sum()
    }

    /// Use `amount` of `reference`, highest priority fragment first.
    /// Returns the new total.
    pub fn consume_encumbrance(&mut self, reference: &str, amount: &Balance) -> Balance {
        self.deplete(reference, amount, EncumbranceEntry::cmp_high_to_low)
    }

    /// Release `amount` of `reference`, lowest priority fragment first.
    /// Returns the new total.
    pub fn reduce_encumbrance(&mut self, reference: &str, amount: &Balance) -> Balance {
        self.deplete(reference, amount, EncumbranceEntry::cmp_low_to_high)
    }

    fn deplete(
        &mut self,
        reference: &str,
        amount: &Balance,
        order: fn(&EncumbranceEntry, &EncumbranceEntry) -> Ordering,
    ) -> Balance {
        let mut matching: Vec<usize> = self
            .encumbrances
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(reference))
            .map(|(i, _)| i)
            .collect();
        matching.sort_by(|a, b| order(&self.encumbrances[*a], &self.encumbrances[*b]));

        let mut remaining = amount.abs();
        for index in matching {
            if !remaining.is_positive() {
                break;
            }
            let entry = &mut self.encumbrances[index];
            let delta = std::cmp::min(&remaining, entry.amount()).clone();
            entry.sub_amount(&delta);
            remaining -= &delta;
        }

        self.recalculate_total()
    }

    /// Delete every fragment of `reference` and return them.
    pub fn remove_encumbrance(&mut self, reference: &str) -> Vec<EncumbranceEntry> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.encumbrances)
            .into_iter()
            .partition(|e| e.matches(reference));
        self.encumbrances = kept;
        if !removed.is_empty() {
            self.recalculate_total();
        }
        removed
    }

    /// `[[total], fragment, fragment, ...]`
    pub fn to_value(&self) -> Value {
        let mut items = Vec::with_capacity(self.encumbrances.len() + 1);
        items.push(Value::Array(vec![self.total_amount.to_value()]));
        items.extend(self.encumbrances.iter().map(|e| e.to_value()));
        Value::Array(items)
    }

    /// Decode the legacy form. The stored total is kept as written.
    pub fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        let total_amount = match array.opt_array(0)? {
            Some(total) if !total.is_empty() => total.balance(0)?,
            _ => Balance::zero(),
        };

        let mut encumbrances = Vec::with_capacity(array.len().saturating_sub(1));
        for index in 1..array.len() {
            encumbrances.push(EncumbranceEntry::from_legacy(&array.array(index)?)?);
        }

        let expiry_date = encumbrances
            .iter()
            .map(|e| e.expiry_date())
            .max()
            .unwrap_or(0);

        Ok(Self {
            encumbrances,
            total_amount,
            expiry_date,
        })
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_array_len(self.encumbrances.len())?;
        for entry in &self.encumbrances {
            entry.pack(packer)?;
        }
        Ok(())
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let len = unpacker.unpack_array_len()?;
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            entries.push(EncumbranceEntry::unpack(unpacker)?);
        }
        Ok(Self::from_entries(entries))
    }
}
