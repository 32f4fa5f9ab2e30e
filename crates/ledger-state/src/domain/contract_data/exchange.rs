use super::dictionary::{
    ContractDictionary, ContractHeader, DictReader, DictWriter, ADDRESS, ASSETS_IN, ASSETS_OUT,
    FUNCTION, MAX_BLOCKS, METADATA, MIN_BLOCKS, PROTOCOL, TO_ADDRESS,
};
use super::nominate_asset::NominateAsset;
use shared_types::{Balance, CodecError};

pub const EXCHANGE: &str = "exchange";
pub const EXCHANGE_COMMIT: &str = "exchange_commit";

/// Standing offer to swap the `assets_in` legs for the `assets_out` legs.
#[derive(Clone, Debug, PartialEq)]
pub struct ExchangeContract {
    pub header: ContractHeader,
    pub assets_in: Vec<NominateAsset>,
    pub assets_out: Vec<NominateAsset>,
    pub min_blocks: Balance,
    pub max_blocks: Balance,
    pub extra: ContractDictionary,
}

impl ExchangeContract {
    pub fn new(header: ContractHeader) -> Self {
        Self {
            header,
            assets_in: Vec::new(),
            assets_out: Vec::new(),
            min_blocks: Balance::zero(),
            max_blocks: Balance::zero(),
            extra: ContractDictionary::new(),
        }
    }

    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        Ok(Self {
            header: ContractHeader::read(&mut reader)?,
            assets_in: reader.take_assets(ASSETS_IN)?.unwrap_or_default(),
            assets_out: reader.take_assets(ASSETS_OUT)?.unwrap_or_default(),
            min_blocks: reader.take_balance(MIN_BLOCKS)?.unwrap_or_default(),
            max_blocks: reader.take_balance(MAX_BLOCKS)?.unwrap_or_default(),
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        let mut writer = DictWriter::with_rest(&self.extra);
        self.header.write(&mut writer, true);
        writer
            .put_str(FUNCTION, EXCHANGE)
            .put_assets(ASSETS_IN, Some(&self.assets_in))
            .put_assets(ASSETS_OUT, Some(&self.assets_out))
            .put(MIN_BLOCKS, self.min_blocks.to_value())
            .put(MAX_BLOCKS, self.max_blocks.to_value());
        writer.finish()
    }
}

/// A counterparty's acceptance of an exchange contract.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExchangeCommit {
    pub contract_address: Option<String>,
    pub protocol: Option<String>,
    pub to_address: Option<String>,
    pub metadata: Option<String>,
    pub assets_in: Option<Vec<NominateAsset>>,
    pub extra: ContractDictionary,
}

impl ExchangeCommit {
    pub(crate) fn read(mut reader: DictReader) -> Result<Self, CodecError> {
        Ok(Self {
            contract_address: reader.take_string(ADDRESS)?,
            protocol: reader.take_string(PROTOCOL)?,
            to_address: reader.take_string(TO_ADDRESS)?,
            metadata: reader.take_string(METADATA)?,
            assets_in: reader.take_assets(ASSETS_IN)?,
            extra: reader.into_rest(),
        })
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        DictWriter::with_rest(&self.extra)
            .put_str(FUNCTION, EXCHANGE_COMMIT)
            .put_opt_str(ADDRESS, self.contract_address.as_deref())
            .put_opt_str(PROTOCOL, self.protocol.as_deref())
            .put_opt_str(TO_ADDRESS, self.to_address.as_deref())
            .put_opt_str(METADATA, self.metadata.as_deref())
            .put_assets(ASSETS_IN, self.assets_in.as_deref())
            .finish()
    }
}
