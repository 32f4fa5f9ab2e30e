use super::dictionary::{
    ContractDictionary, ContractHeader, DictReader, DictWriter, CANCEL, CANCEL_TIME, COMPLETED,
    FUNCTION, PARTY,
};
use shared_types::{CodecError, Timestamp, Value};

pub const DVP_UK: &str = "dvp_uk";
pub const DVP_UK_COMMIT: &str = "dvp_uk_commit";

/// A delivery-versus-payment contract.
///
/// Parties, authorisations, parameters, events and encumbrance requests are
/// held in `extra` in their dictionary form.
#[derive(Clone, Debug, PartialEq)]
pub struct DvpUkContract {
    pub header: ContractHeader,
    pub completed: i32,
    /// Written only when positive.
    pub cancel_time: Timestamp,
    pub extra: ContractDictionary,
}

impl DvpUkContract {
    pub fn new(header: ContractHeader) -> Self {
        Self {
            header,
            completed: 0,
            cancel_time: 0,
            extra: ContractDictionary::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed != 0
    }

    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        let header = ContractHeader::read(&mut reader)?;
        let completed = reader.take_i64(COMPLETED)?.unwrap_or(0);
        let completed = i32::try_from(completed)
            .map_err(|_| CodecError::Malformed(format!("{COMPLETED} = {completed}")))?;
        let cancel_time = reader.take_i64(CANCEL_TIME)?.unwrap_or(0);
        Ok(Self {
            header,
            completed,
            cancel_time,
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        let mut writer = DictWriter::with_rest(&self.extra);
        self.header.write(&mut writer, true);
        writer
            .put_str(FUNCTION, DVP_UK)
            .put(COMPLETED, Value::from(self.completed));
        if self.cancel_time > 0 {
            writer.put(CANCEL_TIME, Value::from(self.cancel_time));
        }
        writer.finish()
    }
}

/// A party's commitment to a DvP contract.
///
/// A commitment carrying a signed `cancel` block is a cancellation; all
/// other commitment parts are then dropped on encode.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DvpUkCommit {
    pub cancel: Option<Value>,
    pub party: Option<Value>,
    pub extra: ContractDictionary,
}

impl DvpUkCommit {
    /// True if the cancel block holds a non-empty public key and signature.
    pub fn is_cancellation(&self) -> bool {
        match &self.cancel {
            Some(Value::Array(items)) => {
                let non_empty = |i: usize| {
                    items
                        .get(i)
                        .and_then(Value::as_str)
                        .is_some_and(|s| !s.is_empty())
                };
                non_empty(1) && non_empty(2)
            }
            _ => false,
        }
    }

    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        Ok(Self {
            cancel: reader.take(CANCEL),
            party: reader.take(PARTY),
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        let mut writer = match (&self.cancel, self.is_cancellation()) {
            (Some(cancel), true) => {
                let mut writer = DictWriter::with_rest(&ContractDictionary::new());
                writer.put(CANCEL, cancel.clone());
                writer
            }
            _ => {
                let mut writer = DictWriter::with_rest(&self.extra);
                if let Some(party) = &self.party {
                    writer.put(PARTY, party.clone());
                }
                writer
            }
        };
        writer.put_str(FUNCTION, DVP_UK_COMMIT);
        writer.finish()
    }
}
