use super::detail::EncumbranceDetail;
use serde::{Deserialize, Serialize};
use shared_types::codec::{LegacyArray, Packer, Unpacker};
use shared_types::{eq_ignore_case, Balance, CodecError, Timestamp, Value};
use std::cmp::Ordering;

/// Priority forced onto entries added as high priority. Sorts first.
pub const HIGH_PRIORITY: i32 = -1;

/// Wire value of an unassigned priority.
pub const DEFAULT_PRIORITY: i32 = i32::MAX;

/// One encumbrance fragment: a hold of `amount` under `reference`.
///
/// ## Fields
///
/// - `priority`: `None` until the owning collection assigns one. Lower
///   values are consumed first.
/// - `expiry_date`: derived from the administrators. `i64::MAX` when any
///   administrator window is open-ended, 0 when there are none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEntry")]
pub struct EncumbranceEntry {
    reference: String,
    amount: Balance,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<i32>,
    beneficiaries: Vec<EncumbranceDetail>,
    administrators: Vec<EncumbranceDetail>,
    expiry_date: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    reference: String,
    amount: Balance,
    #[serde(default)]
    priority: Option<i32>,
    #[serde(default)]
    beneficiaries: Vec<EncumbranceDetail>,
    #[serde(default)]
    administrators: Vec<EncumbranceDetail>,
}

impl From<RawEntry> for EncumbranceEntry {
    fn from(raw: RawEntry) -> Self {
        let mut entry = EncumbranceEntry::new(
            raw.reference,
            raw.amount,
            raw.beneficiaries,
            raw.administrators,
        );
        entry.priority = raw.priority;
        entry
    }
}

fn expiry_of(administrators: &[EncumbranceDetail]) -> Timestamp {
    let mut expiry = 0;
    for admin in administrators {
        if admin.is_open_ended() {
            return i64::MAX;
        }
        expiry = expiry.max(admin.end_time());
    }
    expiry
}

fn same_details(a: &[EncumbranceDetail], b: &[EncumbranceDetail]) -> bool {
    if a.is_empty() || b.is_empty() {
        return a.is_empty() && b.is_empty();
    }
    a.len() == b.len() && b.iter().all(|d| a.contains(d))
}

impl EncumbranceEntry {
    pub fn new(
        reference: impl Into<String>,
        amount: impl Into<Balance>,
        beneficiaries: Vec<EncumbranceDetail>,
        administrators: Vec<EncumbranceDetail>,
    ) -> Self {
        let expiry_date = expiry_of(&administrators);
        Self {
            reference: reference.into(),
            amount: amount.into(),
            priority: None,
            beneficiaries,
            administrators,
            expiry_date,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn amount(&self) -> &Balance {
        &self.amount
    }

    pub fn priority(&self) -> Option<i32> {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Option<i32>) {
        self.priority = priority;
    }

    pub fn beneficiaries(&self) -> &[EncumbranceDetail] {
        &self.beneficiaries
    }

    pub fn administrators(&self) -> &[EncumbranceDetail] {
        &self.administrators
    }

    pub fn expiry_date(&self) -> Timestamp {
        self.expiry_date
    }

    pub fn set_beneficiaries(&mut self, beneficiaries: Vec<EncumbranceDetail>) {
        self.beneficiaries = beneficiaries;
    }

    pub fn set_administrators(&mut self, administrators: Vec<EncumbranceDetail>) {
        self.expiry_date = expiry_of(&administrators);
        self.administrators = administrators;
    }

    pub(crate) fn set_amount(&mut self, amount: Balance) {
        self.amount = amount;
    }

    pub(crate) fn add_amount(&mut self, amount: &Balance) {
        self.amount += amount;
    }

    pub(crate) fn sub_amount(&mut self, amount: &Balance) {
        self.amount -= amount;
    }

    pub(crate) fn matches(&self, reference: &str) -> bool {
        eq_ignore_case(&self.reference, reference)
    }

    /// Effective sort priority; unassigned sorts last.
    pub fn sort_priority(&self) -> i32 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// Canonical order: priority ascending, then reference, then amount.
    pub fn cmp_high_to_low(a: &Self, b: &Self) -> Ordering {
        a.sort_priority()
            .cmp(&b.sort_priority())
            .then_with(|| a.reference.cmp(&b.reference))
            .then_with(|| a.amount.cmp(&b.amount))
    }

    /// Exact reverse of [`EncumbranceEntry::cmp_high_to_low`].
    pub fn cmp_low_to_high(a: &Self, b: &Self) -> Ordering {
        Self::cmp_high_to_low(b, a)
    }

    /// True once `time_now` is past the expiry date and no administrator can
    /// act any more.
    pub fn has_expired(&self, time_now: Timestamp) -> bool {
        if time_now <= self.expiry_date {
            return false;
        }
        !self
            .administrators
            .iter()
            .any(|admin| admin.is_reachable_after(time_now))
    }

    pub fn is_administrator_valid(&self, address: &str, time_now: Timestamp) -> bool {
        self.administrators
            .iter()
            .any(|d| d.is_valid_for(address, time_now))
    }

    pub fn is_beneficiary_valid(&self, address: &str, time_now: Timestamp) -> bool {
        self.beneficiaries
            .iter()
            .any(|d| d.is_valid_for(address, time_now))
    }

    /// Whether `other` may be merged into this entry by a cumulative add.
    ///
    /// Requires the same reference (ignoring case) and set-equal beneficiary
    /// and administrator lists. Nothing to merge with is always allowed.
    pub fn can_accumulate(&self, other: Option<&EncumbranceEntry>) -> bool {
        let Some(other) = other else {
            return true;
        };
        if self.reference.is_empty() || !self.matches(&other.reference) {
            return false;
        }
        same_details(&self.beneficiaries, &other.beneficiaries)
            && same_details(&self.administrators, &other.administrators)
    }

    /// `[reference, amount, [beneficiaries], [administrators]]`, plus the
    /// priority when one is assigned.
    pub fn to_value(&self) -> Value {
        let mut items = vec![
            Value::from(self.reference.as_str()),
            self.amount.to_value(),
            Value::Array(self.beneficiaries.iter().map(|d| d.to_value()).collect()),
            Value::Array(self.administrators.iter().map(|d| d.to_value()).collect()),
        ];
        if let Some(priority) = self.priority {
            items.push(Value::from(priority));
        }
        Value::Array(items)
    }

    pub fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        let reference = array.string(0)?;
        let amount = array.balance(1)?;
        let beneficiaries = details_from_legacy(array.array(2)?)?;
        let administrators = details_from_legacy(array.array(3)?)?;
        let mut entry = Self::new(reference, amount, beneficiaries, administrators);
        if array.len() > 4 {
            entry.priority = Some(array.i32(4)?);
        }
        Ok(entry)
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_str(&self.reference)?;
        packer.pack_i32(self.sort_priority())?;
        self.amount.pack(packer)?;
        packer.pack_array_len(self.beneficiaries.len())?;
        for detail in &self.beneficiaries {
            detail.pack(packer)?;
        }
        packer.pack_array_len(self.administrators.len())?;
        for detail in &self.administrators {
            detail.pack(packer)?;
        }
        Ok(())
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let reference = unpacker.unpack_string()?;
        let priority = unpacker.unpack_i32()?;
        let amount = Balance::unpack(unpacker)?;
        let beneficiaries = unpack_details(unpacker)?;
        let administrators = unpack_details(unpacker)?;
        let mut entry = Self::new(reference, amount, beneficiaries, administrators);
        entry.priority = (priority != DEFAULT_PRIORITY).then_some(priority);
        Ok(entry)
    }
}

fn details_from_legacy(array: LegacyArray<'_>) -> Result<Vec<EncumbranceDetail>, CodecError> {
    array
        .arrays()?
        .iter()
        .map(EncumbranceDetail::from_legacy)
        .collect()
}

fn unpack_details(unpacker: &mut Unpacker<'_>) -> Result<Vec<EncumbranceDetail>, CodecError> {
    let len = unpacker.unpack_array_len()?;
    let mut details = Vec::with_capacity(len);
    for _ in 0..len {
        details.push(EncumbranceDetail::unpack(unpacker)?);
    }
    Ok(details)
}
